//! Integration tests for configuration forms and persistence.

use std::collections::HashMap;

use sunstrip::config::{store, DeviceConfig, MAX_SENSORS};
use sunstrip::hal::MemoryStore;
use sunstrip::parsing::FormFields;
use sunstrip::traits::KeyValueStore;

fn form(pairs: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
    pairs.iter().copied().collect()
}

// ============================================================================
// Form Merge
// ============================================================================

#[test]
fn empty_form_changes_nothing() {
    let current = DeviceConfig::default();
    let fields = form(&[]);
    assert_eq!(current.apply_form(|k| fields.get(k).copied()), current);
}

#[test]
fn partial_form_keeps_other_fields() {
    let current = DeviceConfig::default();
    let fields = form(&[("mqhost", "10.0.0.2"), ("wscount", "30")]);
    let updated = current.apply_form(|k| fields.get(k).copied());

    assert_eq!(updated.mqtt.host.as_str(), "10.0.0.2");
    assert_eq!(updated.led.count, 30);
    assert_eq!(updated.mqtt.port, current.mqtt.port);
    assert_eq!(updated.led.topic, current.led.topic);
    assert_eq!(updated.sensors, current.sensors);
}

#[test]
fn bad_numbers_become_zero() {
    let fields = form(&[("mqport", "eighty"), ("wspin", "-1"), ("sun_count", "many")]);
    let updated = DeviceConfig::default().apply_form(|k| fields.get(k).copied());

    assert_eq!(updated.mqtt.port, 0);
    assert_eq!(updated.led.pin, 0);
    // count is clamped after parsing
    assert_eq!(updated.sensors.count, 1);
}

#[test]
fn unchecked_enable_box_disables_slot() {
    let fields = form(&[("sun_addr0", "96"), ("sun_sda0", "3"), ("sun_scl0", "2")]);
    let updated = DeviceConfig::default().apply_form(|k| fields.get(k).copied());
    assert!(!updated.sensors.slots[0].enabled);
}

#[test]
fn slot_fields_use_zero_based_names() {
    let fields = form(&[
        ("sun_count", "4"),
        ("sun_en3", "on"),
        ("sun_addr3", "97"),
        ("sun_sda3", "6"),
        ("sun_scl3", "7"),
    ]);
    let updated = DeviceConfig::default().apply_form(|k| fields.get(k).copied());

    let slot = updated.sensors.slots[MAX_SENSORS - 1];
    assert!(slot.enabled);
    assert_eq!((slot.address, slot.sda, slot.scl), (97, 6, 7));
    // untouched slot keeps its flag
    assert!(updated.sensors.slots[0].enabled);
}

#[test]
fn urlencoded_body_round_trip() {
    let body = "ssid=My+Net&wifipw=p%40ss&baset=home%2Fsun&sun_count=2";
    let fields = FormFields::parse(body);
    let updated = DeviceConfig::default().apply_form(|k| fields.get(k));

    assert_eq!(updated.wifi.ssid.as_str(), "My Net");
    assert_eq!(updated.wifi.password.as_str(), "p@ss");
    assert_eq!(updated.mqtt.base_topic.as_str(), "home/sun");
    assert_eq!(updated.command_topic().as_str(), "home/sun/light/ws2812/set");
    assert_eq!(updated.sensors.count, 2);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn form_result_survives_restart() {
    let fields = form(&[("ssid", "garden"), ("mqhost", "broker"), ("suntopic", "uv")]);
    let updated = DeviceConfig::default().apply_form(|k| fields.get(k).copied());

    let mut nvs = MemoryStore::new();
    store::save(&mut nvs, &updated).unwrap();
    let reloaded = store::load(&nvs);

    assert_eq!(reloaded, updated);
    assert_eq!(reloaded.telemetry_topic(1, "uv").as_str(), "esp/sensors/uv/1/uv");
}

#[test]
fn wrongly_typed_key_uses_default() {
    let mut nvs = MemoryStore::new();
    nvs.set_str("mqttPort", "1883").unwrap();
    nvs.set_str("ssid", "garden").unwrap();

    let cfg = store::load(&nvs);
    assert_eq!(cfg.mqtt.port, DeviceConfig::default().mqtt.port);
    assert_eq!(cfg.wifi.ssid.as_str(), "garden");
}

#[test]
fn overlong_values_truncated_on_load() {
    let mut nvs = MemoryStore::new();
    nvs.set_str("ssid", &"x".repeat(200)).unwrap();
    let cfg = store::load(&nvs);
    assert!(!cfg.wifi.ssid.is_empty());
    assert!(cfg.wifi.ssid.len() < 200);
}
