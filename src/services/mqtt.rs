//! Desktop MQTT client built on `rumqttc`.
//!
//! [`RumqttClient`] implements [`MqttClient`] with the synchronous `rumqttc`
//! client. The event loop runs on a background thread that:
//!
//! - tracks the connection state from `ConnAck` and connection errors
//! - forwards incoming publishes to a channel drained by `try_recv`
//! - re-subscribes to every known topic after each reconnect
//!
//! `rumqttc` reconnects on its own as the event loop keeps being polled, so
//! [`connect`](MqttClient::connect) only builds the session once.
//!
//! # Example
//!
//! ```ignore
//! use sunstrip::services::RumqttClient;
//! use sunstrip::ConnectivitySupervisor;
//!
//! let supervisor = ConnectivitySupervisor::new(wifi, RumqttClient::new(), &config);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};

use crate::traits::{MqttClient, MqttConnectOptions, MqttMessage};

/// Request channel capacity between the client and its event loop.
pub const REQUEST_CAPACITY: usize = 16;

/// Pause after a connection error before the event loop retries.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Smallest keep-alive `rumqttc` accepts.
const MIN_KEEP_ALIVE_SECS: u16 = 5;

// ============================================================================
// Client
// ============================================================================

/// `rumqttc`-backed [`MqttClient`].
pub struct RumqttClient {
    client: Option<Client>,
    incoming: Option<Receiver<MqttMessage>>,
    connected: Arc<AtomicBool>,
    topics: Arc<Mutex<Vec<String>>>,
}

impl Default for RumqttClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RumqttClient {
    /// Client with no session yet.
    pub fn new() -> Self {
        Self {
            client: None,
            incoming: None,
            connected: Arc::new(AtomicBool::new(false)),
            topics: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn session(&mut self) -> Result<&mut Client, MqttError> {
        self.client.as_mut().ok_or(MqttError::NotConnected)
    }
}

/// Build `rumqttc` options from the connect parameters.
pub fn mqtt_options(options: &MqttConnectOptions<'_>) -> MqttOptions {
    let mut mqtt = MqttOptions::new(options.client_id, options.host, options.port);
    mqtt.set_keep_alive(Duration::from_secs(u64::from(
        options.keep_alive_secs.max(MIN_KEEP_ALIVE_SECS),
    )));
    if let Some(username) = options.username {
        mqtt.set_credentials(username, options.password.unwrap_or_default());
    }
    mqtt
}

impl MqttClient for RumqttClient {
    type Error = MqttError;

    fn connect(&mut self, options: &MqttConnectOptions<'_>) -> Result<(), Self::Error> {
        if self.client.is_some() {
            return Ok(());
        }

        let (client, connection) = Client::new(mqtt_options(options), REQUEST_CAPACITY);
        let (tx, rx) = mpsc::channel();
        let events = EventLoopTask {
            client: client.clone(),
            connected: Arc::clone(&self.connected),
            topics: Arc::clone(&self.topics),
            tx,
        };

        thread::Builder::new()
            .name("mqtt-events".into())
            .spawn(move || events.run(connection))
            .map_err(|e| MqttError::Connect(e.to_string()))?;

        log::info!("MQTT connecting to {}:{}", options.host, options.port);
        self.client = Some(client);
        self.incoming = Some(rx);
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error> {
        if !self.is_connected() {
            return Err(MqttError::NotConnected);
        }
        self.session()?
            .publish(topic, QoS::AtMostOnce, retain, payload.to_vec())
            .map_err(|e| MqttError::Publish(e.to_string()))
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error> {
        {
            let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
            if !topics.iter().any(|t| t == topic) {
                topics.push(topic.to_string());
            }
        }
        self.session()?
            .subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| MqttError::Subscribe(e.to_string()))
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        self.incoming.as_ref()?.try_recv().ok()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

// ============================================================================
// Event Loop
// ============================================================================

struct EventLoopTask {
    client: Client,
    connected: Arc<AtomicBool>,
    topics: Arc<Mutex<Vec<String>>>,
    tx: Sender<MqttMessage>,
}

impl EventLoopTask {
    fn run(self, mut connection: Connection) {
        for notification in connection.iter() {
            match notification {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    log::info!("MQTT session established");
                    self.resubscribe();
                    self.connected.store(true, Ordering::Release);
                }
                Ok(Event::Incoming(Packet::Publish(p))) => {
                    let msg = MqttMessage::new(p.topic, p.payload.to_vec());
                    if self.tx.send(msg).is_err() {
                        // Client dropped
                        break;
                    }
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    self.connected.store(false, Ordering::Release);
                }
                Ok(_) => {}
                Err(e) => {
                    if self.connected.swap(false, Ordering::AcqRel) {
                        log::warn!("MQTT connection lost: {}", e);
                    } else {
                        log::debug!("MQTT connection error: {}", e);
                    }
                    thread::sleep(RETRY_DELAY);
                }
            }
        }
    }

    fn resubscribe(&self) {
        let topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        for topic in topics.iter() {
            if let Err(e) = self.client.try_subscribe(topic.as_str(), QoS::AtMostOnce) {
                log::warn!("MQTT resubscribe to {} failed: {}", topic, e);
            }
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// MQTT-related errors
#[derive(Debug)]
pub enum MqttError {
    /// Failed to start the session
    Connect(String),
    /// Failed to subscribe to topic
    Subscribe(String),
    /// Failed to publish message
    Publish(String),
    /// No session with the broker
    NotConnected,
}

impl std::fmt::Display for MqttError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect(e) => write!(f, "MQTT connect error: {}", e),
            Self::Subscribe(e) => write!(f, "MQTT subscribe error: {}", e),
            Self::Publish(e) => write!(f, "MQTT publish error: {}", e),
            Self::NotConnected => write!(f, "MQTT not connected"),
        }
    }
}

impl std::error::Error for MqttError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn options<'a>() -> MqttConnectOptions<'a> {
        MqttConnectOptions {
            host: "broker.lan",
            port: 1884,
            client_id: "sunstrip-test",
            username: None,
            password: None,
            keep_alive_secs: 30,
        }
    }

    // ========================================================================
    // Options tests
    // ========================================================================

    #[test]
    fn options_copy_broker_address() {
        let mqtt = mqtt_options(&options());
        assert_eq!(mqtt.broker_address(), ("broker.lan".to_string(), 1884));
        assert_eq!(mqtt.client_id(), "sunstrip-test");
        assert_eq!(mqtt.keep_alive(), Duration::from_secs(30));
        assert!(mqtt.credentials().is_none());
    }

    #[test]
    fn options_clamp_keep_alive() {
        let opts = MqttConnectOptions {
            keep_alive_secs: 0,
            ..options()
        };
        assert_eq!(mqtt_options(&opts).keep_alive(), Duration::from_secs(5));
    }

    #[test]
    fn options_with_credentials() {
        let opts = MqttConnectOptions {
            username: Some("user"),
            password: Some("pw"),
            ..options()
        };
        assert_eq!(
            mqtt_options(&opts).credentials(),
            Some(("user".to_string(), "pw".to_string()))
        );
    }

    // ========================================================================
    // Client tests
    // ========================================================================

    #[test]
    fn new_client_is_disconnected() {
        let mut client = RumqttClient::new();
        assert!(!client.is_connected());
        assert!(client.try_recv().is_none());
        assert!(matches!(
            client.publish("a/b", b"x", false),
            Err(MqttError::NotConnected)
        ));
    }

    #[test]
    fn subscribe_without_session_remembers_topic() {
        let mut client = RumqttClient::new();
        assert!(client.subscribe("esp/sensors/light/ws2812/set").is_err());
        assert_eq!(client.topics.lock().unwrap().len(), 1);
        assert!(client.subscribe("esp/sensors/light/ws2812/set").is_err());
        assert_eq!(client.topics.lock().unwrap().len(), 1);
    }

    // ========================================================================
    // MqttError tests
    // ========================================================================

    #[test]
    fn mqtt_error_display() {
        let error = MqttError::Connect("connection refused".to_string());
        let display = format!("{}", error);
        assert!(display.contains("MQTT connect error"));
        assert!(display.contains("connection refused"));
        assert_eq!(MqttError::NotConnected.to_string(), "MQTT not connected");
    }

    #[test]
    fn mqtt_error_is_error() {
        let error = MqttError::Publish("timeout".to_string());
        let _: &dyn std::error::Error = &error;
    }
}
