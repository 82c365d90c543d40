//! Network abstraction traits for Wi-Fi association and the MQTT session.
//!
//! # Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`WifiLink`] | Station association plus fallback access point |
//! | [`MqttClient`] | Pub/sub session for commands and telemetry |
//!
//! # MQTT Topics
//!
//! With the default base topic `esp/sensors`:
//!
//! ```text
//! esp/sensors/status                  - "online" (retained, on connect)
//! esp/sensors/light/ws2812/set        - LED command text
//! esp/sensors/sunlight/1/visible      - Visible reading (retained)
//! esp/sensors/sunlight/1/ir           - Infrared reading (retained)
//! esp/sensors/sunlight/1/uv           - UV index (retained)
//! ```

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

// ============================================================================
// Wi-Fi Link Trait
// ============================================================================

/// Wi-Fi link used by the connectivity supervisor.
///
/// Station mode and access-point mode may run at the same time: once the
/// fallback access point is started, station association keeps being
/// retried by the driver in the background.
///
/// # Implementation Notes
///
/// - `begin_station` must return immediately; association completes later
/// - `is_associated` is polled and must never block
/// - `start_access_point` keeps any configured station credentials active
/// - `begin_station` may stop a running access point; callers restart it
///   with `start_access_point` if association then fails
pub trait WifiLink {
    /// Error type for Wi-Fi operations.
    type Error: core::fmt::Debug;

    /// Start associating with the given network (non-blocking).
    fn begin_station(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error>;

    /// Returns true while the station is associated and has an address.
    fn is_associated(&self) -> bool;

    /// Start the local configuration access point.
    fn start_access_point(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error>;
}

// ============================================================================
// MQTT Client Trait (Sync-First Design)
// ============================================================================

/// Broker connection parameters handed to [`MqttClient::connect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MqttConnectOptions<'a> {
    /// Broker hostname or IP.
    pub host: &'a str,
    /// Broker port.
    pub port: u16,
    /// Client identifier.
    pub client_id: &'a str,
    /// Username, if authentication is configured.
    pub username: Option<&'a str>,
    /// Password (ignored without a username).
    pub password: Option<&'a str>,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
}

/// MQTT client trait for pub/sub messaging.
///
/// This trait uses a **sync-first design** that works on both ESP32 (blocking I/O)
/// and desktop (background thread).
///
/// # Implementation Notes
///
/// - `connect` may complete asynchronously; callers re-check `is_connected`
/// - `connect` on an existing session must be cheap and idempotent
/// - `try_recv` is non-blocking for polling patterns
///
/// # Example
///
/// ```rust,ignore
/// use sunstrip::traits::MqttClient;
///
/// fn publish_uv<M: MqttClient>(client: &mut M, uv: f32) {
///     let payload = format!("{:.2}", uv);
///     client.publish("esp/sensors/sunlight/1/uv", payload.as_bytes(), true).unwrap();
/// }
/// ```
pub trait MqttClient {
    /// Error type for MQTT operations.
    type Error: core::fmt::Debug;

    /// Open (or re-open) the session to the broker.
    fn connect(&mut self, options: &MqttConnectOptions<'_>) -> Result<(), Self::Error>;

    /// Publish a message to a topic (blocking).
    ///
    /// # Arguments
    /// - `topic`: MQTT topic path
    /// - `payload`: Message bytes
    /// - `retain`: If true, broker keeps message for new subscribers
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    /// Subscribe to a topic (blocking).
    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Try to receive the next message (non-blocking).
    ///
    /// Returns `None` if no message is available. This should never block.
    fn try_recv(&mut self) -> Option<MqttMessage>;

    /// Check if connected to broker.
    fn is_connected(&self) -> bool;
}

/// An MQTT message received from a subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MqttMessage {
    /// Topic the message was published to.
    pub topic: String,
    /// Message payload as raw bytes.
    pub payload: Vec<u8>,
}

impl MqttMessage {
    /// Create a new MQTT message.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Returns the payload as a UTF-8 string, if valid.
    pub fn payload_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.payload).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_str_valid_utf8() {
        let msg = MqttMessage::new("a/b", b"rainbow".to_vec());
        assert_eq!(msg.payload_str(), Some("rainbow"));
    }

    #[test]
    fn payload_str_invalid_utf8() {
        let msg = MqttMessage::new("a/b", vec![0xff, 0xfe]);
        assert_eq!(msg.payload_str(), None);
    }
}
