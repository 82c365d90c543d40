//! MQTT client for ESP32-C3.
//!
//! Implements [`MqttClient`] on top of the esp-idf-svc client. The ESP-IDF
//! client reconnects on its own; a background thread follows its events to
//! keep the connected flag current and queues received messages for
//! `try_recv()`.
//!
//! # Example
//!
//! ```ignore
//! use sunstrip::hal::esp32::Esp32Mqtt;
//! use sunstrip::ConnectivitySupervisor;
//!
//! let supervisor = ConnectivitySupervisor::new(wifi, Esp32Mqtt::new(), &config);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use esp_idf_svc::mqtt::client::{
    EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
};

use crate::traits::{MqttClient, MqttConnectOptions, MqttMessage};

/// Stack size for the event thread.
const EVENT_THREAD_STACK: usize = 6 * 1024;

/// MQTT client backed by the ESP-IDF MQTT component.
pub struct Esp32Mqtt {
    client: Option<EspMqttClient<'static>>,
    message_rx: Option<Receiver<MqttMessage>>,
    connected: Arc<AtomicBool>,
}

impl Default for Esp32Mqtt {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32Mqtt {
    /// Client with no session yet; the broker is chosen on `connect`.
    pub fn new() -> Self {
        Self {
            client: None,
            message_rx: None,
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    fn session(&mut self) -> Result<&mut EspMqttClient<'static>, Esp32MqttError> {
        self.client
            .as_mut()
            .ok_or_else(|| Esp32MqttError("not connected".into()))
    }
}

// ============================================================================
// MqttClient Trait Implementation
// ============================================================================

/// Error type for ESP32 MQTT operations.
#[derive(Debug)]
pub struct Esp32MqttError(pub String);

impl core::fmt::Display for Esp32MqttError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "MQTT error: {}", self.0)
    }
}

impl std::error::Error for Esp32MqttError {}

impl MqttClient for Esp32Mqtt {
    type Error = Esp32MqttError;

    fn connect(&mut self, options: &MqttConnectOptions<'_>) -> Result<(), Self::Error> {
        if self.client.is_some() {
            return Ok(());
        }

        let broker_url = format!("mqtt://{}:{}", options.host, options.port);
        let mqtt_config = MqttClientConfiguration {
            client_id: Some(options.client_id),
            username: options.username,
            password: options.password,
            keep_alive_interval: Some(Duration::from_secs(u64::from(options.keep_alive_secs))),
            ..Default::default()
        };

        let (client, mut connection) = EspMqttClient::new(&broker_url, &mqtt_config)
            .map_err(|e| Esp32MqttError(format!("{:?}", e)))?;

        let (message_tx, message_rx) = channel();
        let connected = Arc::clone(&self.connected);
        thread::Builder::new()
            .stack_size(EVENT_THREAD_STACK)
            .spawn(move || handle_mqtt_events(&mut connection, message_tx, connected))
            .map_err(|e| Esp32MqttError(e.to_string()))?;

        log::info!("[MQTT] Connecting to {}", broker_url);
        self.client = Some(client);
        self.message_rx = Some(message_rx);
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error> {
        let qos = if retain {
            QoS::AtLeastOnce
        } else {
            QoS::AtMostOnce
        };
        self.session()?
            .publish(topic, qos, retain, payload)
            .map_err(|e| Esp32MqttError(format!("{:?}", e)))?;
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error> {
        self.session()?
            .subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| Esp32MqttError(format!("{:?}", e)))?;
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        self.message_rx.as_ref()?.try_recv().ok()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

// ============================================================================
// Event Thread
// ============================================================================

fn handle_mqtt_events(
    connection: &mut EspMqttConnection,
    message_tx: Sender<MqttMessage>,
    connected: Arc<AtomicBool>,
) {
    loop {
        match connection.next() {
            Err(e) => {
                log::warn!("[MQTT] Error: {:?}", e);
                connected.store(false, Ordering::Release);
                thread::sleep(Duration::from_secs(1));
            }
            Ok(event) => match event.payload() {
                EventPayload::Connected(_) => {
                    log::info!("[MQTT] Connected");
                    connected.store(true, Ordering::Release);
                }
                EventPayload::Disconnected => {
                    log::warn!("[MQTT] Disconnected");
                    connected.store(false, Ordering::Release);
                }
                EventPayload::Received {
                    topic: Some(topic),
                    data,
                    ..
                } => {
                    let _ = message_tx.send(MqttMessage::new(topic, data.to_vec()));
                }
                _ => {}
            },
        }
    }
}
