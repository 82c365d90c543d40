//! Load and save [`DeviceConfig`] through a [`KeyValueStore`].
//!
//! One primitive value per key, under the same names the device has always
//! used so existing settings survive a firmware update.
//!
//! | Key | Type | Field |
//! |-----|------|-------|
//! | `ssid`, `pass` | str | Wi-Fi credentials |
//! | `mqttHost`, `mqttPort`, `mqttUser`, `mqttPwd` | str / u16 | Broker |
//! | `mqttCid`, `mqttKa` | str / u16 | Client id, keep-alive |
//! | `baseTopic` | str | Topic prefix |
//! | `wsPin`, `wsCnt`, `wsTopic`, `wsBright` | u8 / u16 / str / u8 | LED strip |
//! | `i2cSda`, `i2cScl` | u8 | Default bus pins |
//! | `sunTopic`, `sunCnt` | str / u8 | Sensor telemetry |
//! | `sun<i>En`, `sun<i>Ad`, `sun<i>Sda`, `sun<i>Scl` | bool / u8 | Slot `i` |
//!
//! # Example
//!
//! ```rust
//! use sunstrip::config::{store, DeviceConfig, WifiConfig};
//! use sunstrip::hal::MemoryStore;
//!
//! let mut nvs = MemoryStore::new();
//! let config = DeviceConfig::default().with_wifi(WifiConfig::default().with_ssid("garden"));
//! store::save(&mut nvs, &config).unwrap();
//!
//! assert_eq!(store::load(&nvs), config);
//! ```

use core::fmt;

use heapless::String as HString;

use super::{
    clamp_count, short_string, BusConfig, DeviceConfig, SensorSlotConfig, ShortString,
    DEFAULT_SENSOR_ADDRESS, MAX_SENSORS,
};
use crate::traits::KeyValueStore;

/// NVS namespace the keys live in.
pub const NAMESPACE: &str = "cfg";

/// Failure writing a setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// Key that failed.
    pub key: String,
    /// Backend error, formatted.
    pub reason: String,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to store '{}': {}", self.key, self.reason)
    }
}

impl std::error::Error for StoreError {}

fn slot_key(index: usize, field: &str) -> HString<16> {
    let mut key = HString::new();
    let _ = fmt::write(&mut key, format_args!("sun{}{}", index, field));
    key
}

// ============================================================================
// Load
// ============================================================================

/// Read the configuration, substituting defaults for missing keys.
///
/// A key that fails to read is logged and treated as missing.
pub fn load<S: KeyValueStore>(store: &S) -> DeviceConfig {
    let mut cfg = DeviceConfig::default();

    read_str(store, "ssid", &mut cfg.wifi.ssid);
    read_str(store, "pass", &mut cfg.wifi.password);
    read_str(store, "mqttHost", &mut cfg.mqtt.host);
    read_str(store, "mqttUser", &mut cfg.mqtt.username);
    read_str(store, "mqttPwd", &mut cfg.mqtt.password);
    read_str(store, "mqttCid", &mut cfg.mqtt.client_id);
    read_str(store, "baseTopic", &mut cfg.mqtt.base_topic);
    read_str(store, "wsTopic", &mut cfg.led.topic);
    read_str(store, "sunTopic", &mut cfg.sensors.topic);

    if let Some(v) = read(store, "mqttPort", S::get_u16) {
        cfg.mqtt.port = v;
    }
    if let Some(v) = read(store, "mqttKa", S::get_u16) {
        cfg.mqtt.keep_alive_secs = v;
    }
    if let Some(v) = read(store, "wsPin", S::get_u8) {
        cfg.led.pin = v;
    }
    if let Some(v) = read(store, "wsCnt", S::get_u16) {
        cfg.led.count = v;
    }
    if let Some(v) = read(store, "wsBright", S::get_u8) {
        cfg.led.brightness = v;
    }
    if let Some(v) = read(store, "i2cSda", S::get_u8) {
        cfg.bus.sda = v;
    }
    if let Some(v) = read(store, "i2cScl", S::get_u8) {
        cfg.bus.scl = v;
    }
    if let Some(v) = read(store, "sunCnt", S::get_u8) {
        cfg.sensors.count = clamp_count(i64::from(v));
    }

    let bus: BusConfig = cfg.bus;
    for (i, slot) in cfg.sensors.slots.iter_mut().enumerate() {
        *slot = SensorSlotConfig {
            enabled: read(store, &slot_key(i, "En"), S::get_bool).unwrap_or(i == 0),
            address: read(store, &slot_key(i, "Ad"), S::get_u8).unwrap_or(DEFAULT_SENSOR_ADDRESS),
            sda: read(store, &slot_key(i, "Sda"), S::get_u8).unwrap_or(bus.sda),
            scl: read(store, &slot_key(i, "Scl"), S::get_u8).unwrap_or(bus.scl),
        };
    }

    cfg
}

fn read<S, T, F>(store: &S, key: &str, get: F) -> Option<T>
where
    S: KeyValueStore,
    F: Fn(&S, &str) -> Result<Option<T>, S::Error>,
{
    match get(store, key) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("config: failed to read '{}': {:?}", key, e);
            None
        }
    }
}

fn read_str<S: KeyValueStore>(store: &S, key: &str, target: &mut ShortString) {
    if let Some(v) = read(store, key, S::get_str) {
        *target = short_string(&v);
    }
}

// ============================================================================
// Save
// ============================================================================

/// Write every field of `config`, all slots included.
pub fn save<S: KeyValueStore>(store: &mut S, config: &DeviceConfig) -> Result<(), StoreError> {
    write(store, "ssid", |s, k| s.set_str(k, &config.wifi.ssid))?;
    write(store, "pass", |s, k| s.set_str(k, &config.wifi.password))?;
    write(store, "mqttHost", |s, k| s.set_str(k, &config.mqtt.host))?;
    write(store, "mqttPort", |s, k| s.set_u16(k, config.mqtt.port))?;
    write(store, "mqttUser", |s, k| s.set_str(k, &config.mqtt.username))?;
    write(store, "mqttPwd", |s, k| s.set_str(k, &config.mqtt.password))?;
    write(store, "mqttCid", |s, k| s.set_str(k, &config.mqtt.client_id))?;
    write(store, "mqttKa", |s, k| s.set_u16(k, config.mqtt.keep_alive_secs))?;
    write(store, "baseTopic", |s, k| s.set_str(k, &config.mqtt.base_topic))?;
    write(store, "wsPin", |s, k| s.set_u8(k, config.led.pin))?;
    write(store, "wsCnt", |s, k| s.set_u16(k, config.led.count))?;
    write(store, "wsTopic", |s, k| s.set_str(k, &config.led.topic))?;
    write(store, "wsBright", |s, k| s.set_u8(k, config.led.brightness))?;
    write(store, "i2cSda", |s, k| s.set_u8(k, config.bus.sda))?;
    write(store, "i2cScl", |s, k| s.set_u8(k, config.bus.scl))?;
    write(store, "sunTopic", |s, k| s.set_str(k, &config.sensors.topic))?;
    write(store, "sunCnt", |s, k| s.set_u8(k, clamp_count(i64::from(config.sensors.count))))?;

    for (i, slot) in config.sensors.slots.iter().enumerate().take(MAX_SENSORS) {
        write(store, &slot_key(i, "En"), |s, k| s.set_bool(k, slot.enabled))?;
        write(store, &slot_key(i, "Ad"), |s, k| s.set_u8(k, slot.address))?;
        write(store, &slot_key(i, "Sda"), |s, k| s.set_u8(k, slot.sda))?;
        write(store, &slot_key(i, "Scl"), |s, k| s.set_u8(k, slot.scl))?;
    }

    log::info!("config: saved to '{}'", NAMESPACE);
    Ok(())
}

fn write<S, F>(store: &mut S, key: &str, set: F) -> Result<(), StoreError>
where
    S: KeyValueStore,
    F: FnOnce(&mut S, &str) -> Result<(), S::Error>,
{
    set(store, key).map_err(|e| StoreError {
        key: key.into(),
        reason: format!("{:?}", e),
    })
}
