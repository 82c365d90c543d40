//! Shared message types for the web and MQTT surfaces.
//!
//! These types use `heapless` collections so they serialize the same way
//! with `serde_json` (desktop) and `serde-json-core` (ESP32).
//!
//! # Example
//!
//! ```
//! use sunstrip::messages::TelemetryReport;
//! use sunstrip::sensors::SlotState;
//!
//! let report = TelemetryReport::from_slots(&[SlotState::default()]);
//! assert_eq!(report.sensors[0].index, 1);
//! assert_eq!(report.sensors[0].visible, None);
//! ```

use heapless::Vec as HVec;
use serde::{Deserialize, Serialize};

use crate::config::{MAX_SENSORS, MAX_SHORT_STRING};
use crate::sensors::SlotState;

/// Buffer size for the rendered telemetry document.
pub const TELEMETRY_JSON_CAPACITY: usize = 1024;

/// String fields in a configuration document.
const CONFIG_STRING_FIELDS: usize = 9;

/// Longest JSON escape of one byte (`\u00XX`).
const MAX_ESCAPE_LEN: usize = 6;

/// Buffer size for the rendered configuration document: every string field
/// at capacity and fully escaped, plus keys and numbers.
pub const CONFIG_JSON_CAPACITY: usize =
    CONFIG_STRING_FIELDS * MAX_SHORT_STRING * MAX_ESCAPE_LEN + 1024;

// ============================================================================
// Telemetry
// ============================================================================

/// One slot in the telemetry read.
///
/// Channel values and the timestamp are `null` unless the slot is enabled,
/// ready, and has been read at least once.
///
/// ```json
/// {"index":1,"enabled":true,"ready":true,"visible":260.0,"ir":410.0,"uv":0.12,"timestamp":4000}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorTelemetry {
    /// Slot number, starting at 1.
    pub index: usize,
    /// Slot enable flag.
    pub enabled: bool,
    /// Detection result.
    pub ready: bool,
    /// Visible light.
    pub visible: Option<f32>,
    /// Infrared.
    pub ir: Option<f32>,
    /// UV index.
    pub uv: Option<f32>,
    /// Time of the reading in milliseconds since boot.
    pub timestamp: Option<u64>,
}

impl SensorTelemetry {
    /// Build the entry for slot `index` (0-based).
    pub fn from_slot(index: usize, slot: &SlotState) -> Self {
        let live = slot.live_reading();
        Self {
            index: index + 1,
            enabled: slot.config.enabled,
            ready: slot.ready,
            visible: live.and_then(|r| finite(r.visible)),
            ir: live.and_then(|r| finite(r.infrared)),
            uv: live.and_then(|r| finite(r.uv_index)),
            timestamp: live.map(|r| r.timestamp_ms),
        }
    }
}

fn finite(v: f32) -> Option<f32> {
    v.is_finite().then_some(v)
}

/// Response body of the telemetry read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetryReport {
    /// One entry per active slot, in index order.
    pub sensors: HVec<SensorTelemetry, MAX_SENSORS>,
}

impl TelemetryReport {
    /// Build a report from the active slots.
    pub fn from_slots(slots: &[SlotState]) -> Self {
        let mut sensors = HVec::new();
        for (i, slot) in slots.iter().enumerate().take(MAX_SENSORS) {
            let _ = sensors.push(SensorTelemetry::from_slot(i, slot));
        }
        Self { sensors }
    }
}

/// Acknowledgement returned by the light endpoint: `{"ok":true}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Always true; malformed input is normalized, not rejected.
    pub ok: bool,
}

impl Ack {
    /// The acknowledgement.
    pub const OK: Ack = Ack { ok: true };
}

// ============================================================================
// JSON Rendering (serde-json-core)
// ============================================================================

/// Render the telemetry document without allocating.
///
/// ```
/// use sunstrip::messages::{render_telemetry_json, TelemetryReport};
///
/// let json = render_telemetry_json(&TelemetryReport::default()).unwrap();
/// assert_eq!(json.as_str(), r#"{"sensors":[]}"#);
/// ```
#[cfg(feature = "serde-json-core")]
pub fn render_telemetry_json(
    report: &TelemetryReport,
) -> Option<heapless::String<TELEMETRY_JSON_CAPACITY>> {
    serde_json_core::to_string(report).ok()
}

/// Render the configuration document without allocating.
#[cfg(feature = "serde-json-core")]
pub fn render_config_json(
    config: &crate::config::DeviceConfig,
) -> Option<heapless::String<CONFIG_JSON_CAPACITY>> {
    serde_json_core::to_string(config).ok()
}

/// Render the light acknowledgement.
#[cfg(feature = "serde-json-core")]
pub fn render_ack_json() -> Option<heapless::String<16>> {
    serde_json_core::to_string(&Ack::OK).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SensorSlotConfig;
    use crate::sensors::SensorReading;

    fn live_slot() -> SlotState {
        SlotState {
            config: SensorSlotConfig::default().with_enabled(true),
            ready: true,
            reading: Some(SensorReading {
                visible: 260.0,
                infrared: 410.0,
                uv_index: 0.5,
                timestamp_ms: 4_000,
            }),
        }
    }

    // =========================================================================
    // Telemetry Tests
    // =========================================================================

    #[test]
    fn live_slot_reports_values() {
        let t = SensorTelemetry::from_slot(0, &live_slot());
        assert_eq!(t.index, 1);
        assert_eq!(t.visible, Some(260.0));
        assert_eq!(t.ir, Some(410.0));
        assert_eq!(t.uv, Some(0.5));
        assert_eq!(t.timestamp, Some(4_000));
    }

    #[test]
    fn not_ready_slot_hides_values() {
        let mut slot = live_slot();
        slot.ready = false;
        let t = SensorTelemetry::from_slot(2, &slot);
        assert_eq!(t.index, 3);
        assert!(t.enabled);
        assert!(!t.ready);
        assert_eq!((t.visible, t.ir, t.uv, t.timestamp), (None, None, None, None));
    }

    #[test]
    fn disabled_slot_hides_values() {
        let mut slot = live_slot();
        slot.config.enabled = false;
        assert_eq!(SensorTelemetry::from_slot(0, &slot).visible, None);
    }

    #[test]
    fn non_finite_values_become_null() {
        let mut slot = live_slot();
        if let Some(r) = slot.reading.as_mut() {
            r.visible = f32::NAN;
            r.infrared = f32::INFINITY;
        }
        let t = SensorTelemetry::from_slot(0, &slot);
        assert_eq!(t.visible, None);
        assert_eq!(t.ir, None);
        assert_eq!(t.uv, Some(0.5));
    }

    #[test]
    fn report_indexes_are_one_based() {
        let report = TelemetryReport::from_slots(&[live_slot(), SlotState::default()]);
        let indexes: std::vec::Vec<_> = report.sensors.iter().map(|s| s.index).collect();
        assert_eq!(indexes, [1, 2]);
    }

    // =========================================================================
    // JSON Tests
    // =========================================================================

    #[cfg(feature = "serde-json-core")]
    #[test]
    fn telemetry_json_uses_null_placeholders() {
        let report = TelemetryReport::from_slots(&[SlotState::default()]);
        let json = render_telemetry_json(&report).unwrap();
        assert!(json.contains("\"index\":1"));
        assert!(json.contains("\"visible\":null"));
        assert!(json.contains("\"timestamp\":null"));
    }

    #[cfg(feature = "serde-json-core")]
    #[test]
    fn ack_json() {
        assert_eq!(render_ack_json().unwrap().as_str(), r#"{"ok":true}"#);
    }

    #[cfg(feature = "serde-json-core")]
    #[test]
    fn config_json_fits() {
        let config = crate::config::DeviceConfig::default();
        let json = render_config_json(&config).unwrap();
        assert!(json.contains("\"base_topic\":\"esp/sensors\""));
    }

    #[cfg(feature = "serde-json-core")]
    #[test]
    fn config_json_fits_fully_escaped_strings() {
        use crate::config::{DeviceConfig, LedConfig, MqttConfig, SensorsConfig, WifiConfig};

        let s = "\u{1}".repeat(MAX_SHORT_STRING);
        let config = DeviceConfig::default()
            .with_wifi(WifiConfig::default().with_ssid(&s).with_password(&s))
            .with_mqtt(
                MqttConfig::default()
                    .with_host(&s)
                    .with_auth(&s, &s)
                    .with_base_topic(&s)
                    .with_client_id(&s)
                    .with_port(u16::MAX)
                    .with_keep_alive(u16::MAX),
            )
            .with_led(LedConfig::default().with_topic(&s).with_count(u16::MAX))
            .with_sensors(SensorsConfig::default().with_topic(&s));
        assert_eq!(config.wifi.ssid.len(), MAX_SHORT_STRING);

        let json = render_config_json(&config).unwrap();
        assert!(json.contains("\\u0001"));
    }

    #[cfg(feature = "web")]
    #[test]
    fn telemetry_serde_json_matches() {
        let report = TelemetryReport::from_slots(&[live_slot()]);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"ready\":true"));
        assert!(json.contains("\"timestamp\":4000"));
    }
}
