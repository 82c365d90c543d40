//! Device configuration shared by desktop and ESP32.
//!
//! Uses `heapless::String` so the whole configuration is a plain value with
//! no heap allocation, cheap to snapshot for the web surface.
//!
//! # Example
//!
//! ```rust
//! use sunstrip::config::{DeviceConfig, MqttConfig, SensorsConfig, WifiConfig};
//!
//! // Use defaults
//! let config = DeviceConfig::default();
//! assert_eq!(config.mqtt.port, 1883);
//!
//! // Or customize
//! let config = DeviceConfig::default()
//!     .with_wifi(WifiConfig::default().with_ssid("garden"))
//!     .with_mqtt(MqttConfig::default().with_host("192.168.1.100"))
//!     .with_sensors(SensorsConfig::default().with_count(9));
//! assert_eq!(config.sensors.count, 4); // clamped
//! ```

use heapless::String as HString;

pub mod store;

/// Maximum length for short config strings (hostnames, credentials)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (topic paths)
pub const MAX_LONG_STRING: usize = 128;

/// Number of sensor slots the device supports.
pub const MAX_SENSORS: usize = 4;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

fn truncate_to(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let _ = hs.push_str(truncate_to(s, MAX_SHORT_STRING));
    hs
}

/// Create a LongString from a &str, truncating if too long
pub fn long_string(s: &str) -> LongString {
    let mut hs = LongString::new();
    let _ = hs.push_str(truncate_to(s, MAX_LONG_STRING));
    hs
}

fn join_topic(parts: &[&str]) -> LongString {
    let mut topic = LongString::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            let _ = topic.push('/');
        }
        let _ = topic.push_str(part);
    }
    topic
}

// ============================================================================
// Device Config
// ============================================================================

/// Complete persisted device configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// WiFi connection configuration
    pub wifi: WifiConfig,
    /// MQTT client configuration
    pub mqtt: MqttConfig,
    /// LED strip configuration
    pub led: LedConfig,
    /// Default sensor bus pins
    pub bus: BusConfig,
    /// Sensor slots
    pub sensors: SensorsConfig,
}

impl DeviceConfig {
    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set MQTT configuration
    pub fn with_mqtt(mut self, mqtt: MqttConfig) -> Self {
        self.mqtt = mqtt;
        self
    }

    /// Set LED configuration
    pub fn with_led(mut self, led: LedConfig) -> Self {
        self.led = led;
        self
    }

    /// Set default bus pins
    pub fn with_bus(mut self, bus: BusConfig) -> Self {
        self.bus = bus;
        self
    }

    /// Set sensor configuration
    pub fn with_sensors(mut self, sensors: SensorsConfig) -> Self {
        self.sensors = sensors;
        self
    }

    /// Topic the LED command text arrives on: `<base>/<ledTopic>/set`.
    pub fn command_topic(&self) -> LongString {
        join_topic(&[
            self.mqtt.base_topic.as_str(),
            self.led.topic.as_str(),
            "set",
        ])
    }

    /// Retained presence topic: `<base>/status`.
    pub fn status_topic(&self) -> LongString {
        self.mqtt.topic("status")
    }

    /// Telemetry topic for 1-based slot `number` and a channel suffix
    /// (`visible`, `ir`, `uv`).
    pub fn telemetry_topic(&self, number: usize, channel: &str) -> LongString {
        let mut n: HString<4> = HString::new();
        let _ = core::fmt::write(&mut n, format_args!("{}", number));
        join_topic(&[
            self.mqtt.base_topic.as_str(),
            self.sensors.topic.as_str(),
            n.as_str(),
            channel,
        ])
    }

    /// Build a new configuration from submitted form fields.
    ///
    /// `field` looks up a submitted value by name. Missing fields keep the
    /// current value; present numeric fields that do not parse become 0. The
    /// sensor count is clamped to `1..=MAX_SENSORS`. A slot whose address and
    /// pin fields are all missing is left untouched; otherwise its enable flag
    /// is set only by a `sun_en<i>` field with value `on`.
    ///
    /// ```rust
    /// use std::collections::HashMap;
    /// use sunstrip::config::DeviceConfig;
    ///
    /// let mut form = HashMap::new();
    /// form.insert("ssid", "garden");
    /// form.insert("sun_count", "7");
    /// form.insert("sun_addr1", "97");
    /// form.insert("sun_en1", "on");
    ///
    /// let config = DeviceConfig::default().apply_form(|k| form.get(k).copied());
    /// assert_eq!(config.wifi.ssid.as_str(), "garden");
    /// assert_eq!(config.sensors.count, 4);
    /// assert!(config.sensors.slots[1].enabled);
    /// assert_eq!(config.sensors.slots[1].address, 97);
    /// ```
    pub fn apply_form<'a, F>(&self, field: F) -> DeviceConfig
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let mut cfg = self.clone();

        let text = |name: &str, target: &mut ShortString| {
            if let Some(v) = field(name) {
                *target = short_string(v);
            }
        };
        text("ssid", &mut cfg.wifi.ssid);
        text("wifipw", &mut cfg.wifi.password);
        text("mqhost", &mut cfg.mqtt.host);
        text("mquser", &mut cfg.mqtt.username);
        text("mqpw", &mut cfg.mqtt.password);
        text("baset", &mut cfg.mqtt.base_topic);
        text("wstopic", &mut cfg.led.topic);
        text("suntopic", &mut cfg.sensors.topic);

        if let Some(v) = field("mqport") {
            cfg.mqtt.port = form_number(v);
        }
        if let Some(v) = field("wspin") {
            cfg.led.pin = form_number(v);
        }
        if let Some(v) = field("wscount") {
            cfg.led.count = form_number(v);
        }
        if let Some(v) = field("sdapin") {
            cfg.bus.sda = form_number(v);
        }
        if let Some(v) = field("sclpin") {
            cfg.bus.scl = form_number(v);
        }
        if let Some(v) = field("sun_count") {
            cfg.sensors.count = clamp_count(v.trim().parse::<i64>().unwrap_or(0));
        }

        for (i, slot) in cfg.sensors.slots.iter_mut().enumerate() {
            let key = |suffix: &str| {
                let mut k: HString<16> = HString::new();
                let _ = core::fmt::write(&mut k, format_args!("{}{}", suffix, i));
                k
            };
            let addr = field(key("sun_addr").as_str());
            let sda = field(key("sun_sda").as_str());
            let scl = field(key("sun_scl").as_str());
            if addr.is_none() && sda.is_none() && scl.is_none() {
                continue;
            }
            slot.enabled = field(key("sun_en").as_str()).map(str::trim) == Some("on");
            if let Some(v) = addr {
                slot.address = form_number(v);
            }
            if let Some(v) = sda {
                slot.sda = form_number(v);
            }
            if let Some(v) = scl {
                slot.scl = form_number(v);
            }
        }

        cfg
    }
}

fn form_number<T: core::str::FromStr + Default>(v: &str) -> T {
    v.trim().parse().unwrap_or_default()
}

fn clamp_count(n: i64) -> u8 {
    n.clamp(1, MAX_SENSORS as i64) as u8
}

// ============================================================================
// WiFi Config
// ============================================================================

/// WiFi connection configuration
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiConfig {
    /// WiFi network SSID
    pub ssid: ShortString,
    /// WiFi password
    pub password: ShortString,
}

impl WifiConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Check if WiFi credentials are configured
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

// ============================================================================
// MQTT Config
// ============================================================================

/// MQTT client configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MqttConfig {
    /// Broker hostname or IP (empty = MQTT disabled)
    pub host: ShortString,
    /// Broker port
    pub port: u16,
    /// Username for authentication (empty = no auth)
    pub username: ShortString,
    /// Password for authentication
    pub password: ShortString,
    /// Prefix for every topic (e.g., "esp/sensors" -> "esp/sensors/status")
    pub base_topic: ShortString,
    /// Client ID (should be unique per device)
    pub client_id: ShortString,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: ShortString::new(),
            port: 1883,
            username: ShortString::new(),
            password: ShortString::new(),
            base_topic: short_string("esp/sensors"),
            client_id: short_string("sunstrip"),
            keep_alive_secs: 30,
        }
    }
}

impl MqttConfig {
    /// Set the broker host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the broker port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the client ID
    pub fn with_client_id(mut self, id: &str) -> Self {
        self.client_id = short_string(id);
        self
    }

    /// Set the keep-alive interval
    pub fn with_keep_alive(mut self, secs: u16) -> Self {
        self.keep_alive_secs = secs;
        self
    }

    /// Set the base topic
    pub fn with_base_topic(mut self, base: &str) -> Self {
        self.base_topic = short_string(base);
        self
    }

    /// Set authentication credentials
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.username = short_string(username);
        self.password = short_string(password);
        self
    }

    /// Build a topic string under the base topic
    pub fn topic(&self, suffix: &str) -> LongString {
        join_topic(&[self.base_topic.as_str(), suffix])
    }

    /// Check if a broker is configured
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty()
    }

    /// Check if authentication is configured
    pub fn has_auth(&self) -> bool {
        !self.username.is_empty()
    }
}

// ============================================================================
// LED Config
// ============================================================================

/// Addressable LED strip configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LedConfig {
    /// Data pin
    pub pin: u8,
    /// Number of pixels
    pub count: u16,
    /// Command topic below the base topic
    pub topic: ShortString,
    /// Global output brightness (0-255)
    pub brightness: u8,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            pin: 10,
            count: 1,
            topic: short_string("light/ws2812"),
            brightness: 64,
        }
    }
}

impl LedConfig {
    /// Set the data pin
    pub fn with_pin(mut self, pin: u8) -> Self {
        self.pin = pin;
        self
    }

    /// Set the pixel count
    pub fn with_count(mut self, count: u16) -> Self {
        self.count = count;
        self
    }

    /// Set the command topic
    pub fn with_topic(mut self, topic: &str) -> Self {
        self.topic = short_string(topic);
        self
    }

    /// Set the output brightness
    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = brightness;
        self
    }
}

// ============================================================================
// Bus + Sensor Config
// ============================================================================

/// Default sensor bus pin pair
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BusConfig {
    /// Data pin
    pub sda: u8,
    /// Clock pin
    pub scl: u8,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { sda: 3, scl: 2 }
    }
}

/// One sensor slot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorSlotConfig {
    /// Whether the slot is probed and read
    pub enabled: bool,
    /// 7-bit bus address
    pub address: u8,
    /// Data pin for this slot
    pub sda: u8,
    /// Clock pin for this slot
    pub scl: u8,
}

/// Default sensor address.
pub const DEFAULT_SENSOR_ADDRESS: u8 = 0x60;

impl SensorSlotConfig {
    /// Slot defaults: disabled, default address, pins from `bus`.
    pub fn on_bus(bus: BusConfig) -> Self {
        Self {
            enabled: false,
            address: DEFAULT_SENSOR_ADDRESS,
            sda: bus.sda,
            scl: bus.scl,
        }
    }

    /// Set enabled
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set address
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Set the pin pair
    pub fn with_pins(mut self, sda: u8, scl: u8) -> Self {
        self.sda = sda;
        self.scl = scl;
        self
    }
}

impl Default for SensorSlotConfig {
    fn default() -> Self {
        Self::on_bus(BusConfig::default())
    }
}

/// Sensor array configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorsConfig {
    /// Telemetry topic below the base topic
    pub topic: ShortString,
    /// Number of active slots, `1..=MAX_SENSORS`
    pub count: u8,
    /// All slots; entries at or beyond `count` are kept but ignored
    pub slots: [SensorSlotConfig; MAX_SENSORS],
}

impl Default for SensorsConfig {
    fn default() -> Self {
        let mut slots = [SensorSlotConfig::default(); MAX_SENSORS];
        slots[0].enabled = true;
        Self {
            topic: short_string("sunlight"),
            count: 1,
            slots,
        }
    }
}

impl SensorsConfig {
    /// Set the telemetry topic
    pub fn with_topic(mut self, topic: &str) -> Self {
        self.topic = short_string(topic);
        self
    }

    /// Set the active slot count (clamped to `1..=MAX_SENSORS`)
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = clamp_count(count.min(i64::MAX as usize) as i64);
        self
    }

    /// Replace slot `index` (ignored when out of range)
    pub fn with_slot(mut self, index: usize, slot: SensorSlotConfig) -> Self {
        if let Some(s) = self.slots.get_mut(index) {
            *s = slot;
        }
        self
    }

    /// Active slot count as an index bound.
    #[inline]
    pub fn active_count(&self) -> usize {
        (self.count as usize).clamp(1, MAX_SENSORS)
    }

    /// The active slots, in index order.
    pub fn active_slots(&self) -> &[SensorSlotConfig] {
        &self.slots[..self.active_count()]
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// Web server configuration (not persisted)
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WebConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_permissive: true,
        }
    }
}

impl WebConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn form<'a>(pairs: &'a [(&'a str, &'a str)]) -> HashMap<&'a str, &'a str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn default_config() {
        let config = DeviceConfig::default();
        assert!(!config.wifi.is_configured());
        assert!(!config.mqtt.is_configured());
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.base_topic.as_str(), "esp/sensors");
        assert_eq!(config.led.pin, 10);
        assert_eq!(config.led.count, 1);
        assert_eq!(config.led.topic.as_str(), "light/ws2812");
        assert_eq!(config.led.brightness, 64);
        assert_eq!(config.bus, BusConfig { sda: 3, scl: 2 });
        assert_eq!(config.sensors.topic.as_str(), "sunlight");
        assert_eq!(config.sensors.count, 1);
    }

    #[test]
    fn default_slots() {
        let sensors = SensorsConfig::default();
        assert!(sensors.slots[0].enabled);
        for (i, slot) in sensors.slots.iter().enumerate() {
            assert_eq!(slot.enabled, i == 0);
            assert_eq!(slot.address, 0x60);
            assert_eq!((slot.sda, slot.scl), (3, 2));
        }
    }

    // =========================================================================
    // Topic Tests
    // =========================================================================

    #[test]
    fn topic_building() {
        let config = DeviceConfig::default();
        assert_eq!(config.command_topic().as_str(), "esp/sensors/light/ws2812/set");
        assert_eq!(config.status_topic().as_str(), "esp/sensors/status");
        assert_eq!(
            config.telemetry_topic(2, "uv").as_str(),
            "esp/sensors/sunlight/2/uv"
        );
    }

    #[test]
    fn mqtt_auth_detection() {
        assert!(!MqttConfig::default().has_auth());
        assert!(MqttConfig::default().with_auth("user", "pass").has_auth());
    }

    // =========================================================================
    // Count Clamping Tests
    // =========================================================================

    #[test]
    fn sensor_count_clamped() {
        assert_eq!(SensorsConfig::default().with_count(0).count, 1);
        assert_eq!(SensorsConfig::default().with_count(3).count, 3);
        assert_eq!(SensorsConfig::default().with_count(99).count, 4);
    }

    #[test]
    fn active_slots_follow_count() {
        let sensors = SensorsConfig::default().with_count(2);
        assert_eq!(sensors.active_slots().len(), 2);
        assert_eq!(sensors.slots.len(), MAX_SENSORS);
    }

    #[test]
    fn with_slot_out_of_range_is_ignored() {
        let sensors = SensorsConfig::default().with_slot(9, SensorSlotConfig::default());
        assert_eq!(sensors, SensorsConfig::default());
    }

    // =========================================================================
    // Form Tests
    // =========================================================================

    #[test]
    fn form_sets_all_fields() {
        let f = form(&[
            ("ssid", "net"),
            ("wifipw", "pw"),
            ("mqhost", "broker"),
            ("mqport", "1884"),
            ("mquser", "u"),
            ("mqpw", "p"),
            ("baset", "home/dev"),
            ("wspin", "8"),
            ("wscount", "30"),
            ("wstopic", "strip"),
            ("sdapin", "5"),
            ("sclpin", "6"),
            ("suntopic", "sun"),
            ("sun_count", "2"),
            ("sun_en0", "on"),
            ("sun_addr0", "96"),
            ("sun_sda0", "5"),
            ("sun_scl0", "6"),
            ("sun_addr1", "97"),
            ("sun_sda1", "7"),
            ("sun_scl1", "8"),
        ]);
        let cfg = DeviceConfig::default().apply_form(|k| f.get(k).copied());

        assert_eq!(cfg.wifi.ssid.as_str(), "net");
        assert_eq!(cfg.wifi.password.as_str(), "pw");
        assert_eq!(cfg.mqtt.host.as_str(), "broker");
        assert_eq!(cfg.mqtt.port, 1884);
        assert_eq!(cfg.mqtt.username.as_str(), "u");
        assert_eq!(cfg.mqtt.password.as_str(), "p");
        assert_eq!(cfg.mqtt.base_topic.as_str(), "home/dev");
        assert_eq!(cfg.led.pin, 8);
        assert_eq!(cfg.led.count, 30);
        assert_eq!(cfg.led.topic.as_str(), "strip");
        assert_eq!(cfg.bus, BusConfig { sda: 5, scl: 6 });
        assert_eq!(cfg.sensors.topic.as_str(), "sun");
        assert_eq!(cfg.sensors.count, 2);
        assert_eq!(
            cfg.sensors.slots[0],
            SensorSlotConfig { enabled: true, address: 96, sda: 5, scl: 6 }
        );
        assert_eq!(
            cfg.sensors.slots[1],
            SensorSlotConfig { enabled: false, address: 97, sda: 7, scl: 8 }
        );
    }

    #[test]
    fn form_bad_numbers_become_zero() {
        let f = form(&[("mqport", "abc"), ("wspin", "-3"), ("sun_addr0", "0x60")]);
        let cfg = DeviceConfig::default().apply_form(|k| f.get(k).copied());
        assert_eq!(cfg.mqtt.port, 0);
        assert_eq!(cfg.led.pin, 0);
        assert_eq!(cfg.sensors.slots[0].address, 0);
        assert!(!cfg.sensors.slots[0].enabled);
    }

    #[test]
    fn form_count_clamped() {
        let low = form(&[("sun_count", "0")]);
        let high = form(&[("sun_count", "12")]);
        let junk = form(&[("sun_count", "many")]);
        let base = DeviceConfig::default();
        assert_eq!(base.apply_form(|k| low.get(k).copied()).sensors.count, 1);
        assert_eq!(base.apply_form(|k| high.get(k).copied()).sensors.count, 4);
        assert_eq!(base.apply_form(|k| junk.get(k).copied()).sensors.count, 1);
    }

    #[test]
    fn form_missing_slots_are_kept() {
        let base = DeviceConfig::default().with_sensors(
            SensorsConfig::default()
                .with_slot(3, SensorSlotConfig::default().with_enabled(true).with_address(0x61)),
        );
        let f = form(&[("sun_count", "1")]);
        let cfg = base.apply_form(|k| f.get(k).copied());
        assert_eq!(cfg.sensors.slots[3], base.sensors.slots[3]);
        assert_eq!(cfg.sensors.slots[0], base.sensors.slots[0]);
    }

    #[test]
    fn form_checkbox_requires_on() {
        let f = form(&[("sun_addr0", "96"), ("sun_en0", "yes")]);
        let cfg = DeviceConfig::default().apply_form(|k| f.get(k).copied());
        assert!(!cfg.sensors.slots[0].enabled);
    }

    // =========================================================================
    // String Helper Tests
    // =========================================================================

    #[test]
    fn short_string_truncation() {
        let long_input = "a".repeat(100);
        let s = short_string(&long_input);
        assert_eq!(s.len(), MAX_SHORT_STRING);
    }

    #[test]
    fn long_string_truncation() {
        let long_input = "b".repeat(200);
        let s = long_string(&long_input);
        assert_eq!(s.len(), MAX_LONG_STRING);
    }

    #[test]
    fn string_helpers_utf8_boundary() {
        // 3-byte chars: 64 is not a multiple of 3
        let input = "☀".repeat(30);
        let s = short_string(&input);
        assert_eq!(s.len(), 63);
        assert!(core::str::from_utf8(s.as_bytes()).is_ok());
    }
}
