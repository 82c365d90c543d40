//! Network association and message-bus session supervision.
//!
//! Two independent state machines, advanced once per tick by
//! [`ConnectivitySupervisor::ensure`]:
//!
//! ```text
//! Association:  Disconnected ──(ssid set)──> wait ≤ 15 s ──> Connected
//!                    │                          │
//!                    └──(no ssid)──> FallbackAP <┘ (timeout)
//!
//!               Connected ──(link lost)──> wait ≤ 15 s ──> Connected | FallbackAP
//!               FallbackAP ──(station associates in background)──> Connected
//!
//! Session:      Disconnected ──(host set, not Disconnected)──> connect ──> Connected
//!               Connected ──(client reports loss)──> Disconnected, retried next tick
//! ```
//!
//! The only blocking part is the association wait. The fallback access
//! point runs alongside station mode, so a device in FallbackAP keeps
//! retrying the configured network and is promoted to Connected as soon as
//! the link comes up. Session reconnects are attempted on every tick with no
//! backoff and no failure limit.

use core::fmt;

use smart_leds::RGB8;

use crate::config::{DeviceConfig, LongString, MqttConfig, WifiConfig};
use crate::traits::{Clock, Delay, MqttClient, MqttConnectOptions, MqttMessage, WifiLink};

/// Fallback access point name.
pub const AP_SSID: &str = "ESP-Sensor-UI";

/// Fallback access point passphrase.
pub const AP_PASSWORD: &str = "configureme";

/// Upper bound on one association wait.
pub const ASSOCIATION_TIMEOUT_MS: u64 = 15_000;

/// Poll interval during the association wait.
pub const ASSOCIATION_POLL_MS: u32 = 250;

/// Presence payload published on session connect.
pub const ONLINE_PAYLOAD: &[u8] = b"online";

/// Status pixel before association completes.
pub const STATUS_BOOT: RGB8 = RGB8 { r: 16, g: 0, b: 16 };

/// Status pixel in fallback access-point mode.
pub const STATUS_FALLBACK_AP: RGB8 = RGB8 { r: 0, g: 0, b: 32 };

/// Status pixel once associated.
pub const STATUS_CONNECTED: RGB8 = RGB8 { r: 0, g: 32, b: 0 };

// ============================================================================
// State
// ============================================================================

/// Wireless association state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AssociationStatus {
    /// Not attempted yet.
    #[default]
    Disconnected,
    /// Joined the configured network.
    Connected,
    /// Serving the local configuration access point.
    FallbackAP,
}

impl AssociationStatus {
    /// Color of the status pixel for this state.
    pub const fn status_color(&self) -> RGB8 {
        match self {
            AssociationStatus::Disconnected => STATUS_BOOT,
            AssociationStatus::Connected => STATUS_CONNECTED,
            AssociationStatus::FallbackAP => STATUS_FALLBACK_AP,
        }
    }
}

/// Message-bus session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No session.
    #[default]
    Disconnected,
    /// Subscribed and announced.
    Connected,
}

/// Combined connectivity snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ConnectivityState {
    /// Wireless association.
    pub association: AssociationStatus,
    /// Message-bus session.
    pub session: SessionStatus,
}

// ============================================================================
// Errors
// ============================================================================

/// Message-bus session failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No session is established.
    NotConnected,
    /// Subscribing to the command topic failed.
    Subscribe(String),
    /// Publishing failed.
    Publish(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotConnected => write!(f, "session not connected"),
            SessionError::Subscribe(e) => write!(f, "subscribe failed: {}", e),
            SessionError::Publish(e) => write!(f, "publish failed: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

// ============================================================================
// Supervisor
// ============================================================================

/// Owns the Wi-Fi link and the MQTT client and keeps both up.
#[derive(Debug)]
pub struct ConnectivitySupervisor<W, M> {
    wifi: W,
    mqtt: M,
    wifi_config: WifiConfig,
    mqtt_config: MqttConfig,
    command_topic: LongString,
    status_topic: LongString,
    state: ConnectivityState,
    ap_started: bool,
}

impl<W: WifiLink, M: MqttClient> ConnectivitySupervisor<W, M> {
    /// Create a supervisor for `config`. Nothing is started until the first
    /// [`ensure`](Self::ensure).
    pub fn new(wifi: W, mqtt: M, config: &DeviceConfig) -> Self {
        Self {
            wifi,
            mqtt,
            wifi_config: config.wifi.clone(),
            mqtt_config: config.mqtt.clone(),
            command_topic: config.command_topic(),
            status_topic: config.status_topic(),
            state: ConnectivityState::default(),
            ap_started: false,
        }
    }

    /// Advance both state machines once.
    ///
    /// Blocks only when an association wait is needed, for at most
    /// [`ASSOCIATION_TIMEOUT_MS`].
    pub fn ensure<D: Clock + Delay>(&mut self, clock: &mut D) -> ConnectivityState {
        match self.state.association {
            AssociationStatus::Disconnected => self.associate(clock),
            AssociationStatus::Connected => {
                if !self.wifi.is_associated() {
                    log::warn!("wifi: link lost, re-associating");
                    self.associate(clock);
                }
            }
            AssociationStatus::FallbackAP => {
                if !self.ap_started {
                    self.start_access_point();
                }
                if self.wifi_config.is_configured() && self.wifi.is_associated() {
                    log::info!("wifi: associated with '{}' while in AP mode", self.wifi_config.ssid);
                    self.state.association = AssociationStatus::Connected;
                }
            }
        }
        self.supervise_session();
        self.state
    }

    fn associate<D: Clock + Delay>(&mut self, clock: &mut D) {
        if !self.wifi_config.is_configured() {
            log::info!("wifi: no credentials configured");
            self.enter_fallback();
            return;
        }

        log::info!("wifi: connecting to '{}'", self.wifi_config.ssid);
        // The link may take the access point down while reconfiguring
        self.ap_started = false;
        if let Err(e) = self
            .wifi
            .begin_station(&self.wifi_config.ssid, &self.wifi_config.password)
        {
            log::warn!("wifi: station start failed: {:?}", e);
            self.enter_fallback();
            return;
        }

        let started = clock.now_ms();
        loop {
            if self.wifi.is_associated() {
                log::info!("wifi: connected");
                self.state.association = AssociationStatus::Connected;
                return;
            }
            if clock.now_ms().saturating_sub(started) >= ASSOCIATION_TIMEOUT_MS {
                break;
            }
            clock.delay_ms(ASSOCIATION_POLL_MS);
        }

        log::warn!("wifi: association timed out after {} ms", ASSOCIATION_TIMEOUT_MS);
        self.enter_fallback();
    }

    fn enter_fallback(&mut self) {
        if !self.ap_started {
            self.start_access_point();
        }
        self.state.association = AssociationStatus::FallbackAP;
    }

    fn start_access_point(&mut self) {
        match self.wifi.start_access_point(AP_SSID, AP_PASSWORD) {
            Ok(()) => {
                log::info!("wifi: access point '{}' started", AP_SSID);
                self.ap_started = true;
            }
            Err(e) => log::warn!("wifi: access point start failed: {:?}", e),
        }
    }

    fn supervise_session(&mut self) {
        if !self.mqtt_config.is_configured()
            || self.state.association == AssociationStatus::Disconnected
        {
            self.state.session = SessionStatus::Disconnected;
            return;
        }

        if self.mqtt.is_connected() {
            if self.state.session != SessionStatus::Connected {
                self.on_session_connect();
            }
            return;
        }

        if self.state.session == SessionStatus::Connected {
            log::warn!("mqtt: session lost");
            self.state.session = SessionStatus::Disconnected;
        }

        let username = self
            .mqtt_config
            .has_auth()
            .then_some(self.mqtt_config.username.as_str());
        let password = self
            .mqtt_config
            .has_auth()
            .then_some(self.mqtt_config.password.as_str());
        let options = MqttConnectOptions {
            host: &self.mqtt_config.host,
            port: self.mqtt_config.port,
            client_id: &self.mqtt_config.client_id,
            username,
            password,
            keep_alive_secs: self.mqtt_config.keep_alive_secs,
        };

        match self.mqtt.connect(&options) {
            Ok(()) if self.mqtt.is_connected() => self.on_session_connect(),
            Ok(()) => log::debug!("mqtt: connection pending"),
            Err(e) => log::debug!("mqtt: connect to {}:{} failed: {:?}", options.host, options.port, e),
        }
    }

    fn on_session_connect(&mut self) {
        let result = self
            .mqtt
            .subscribe(&self.command_topic)
            .map_err(|e| SessionError::Subscribe(format!("{:?}", e)))
            .and_then(|_| {
                self.mqtt
                    .publish(&self.status_topic, ONLINE_PAYLOAD, true)
                    .map_err(|e| SessionError::Publish(format!("{:?}", e)))
            });

        match result {
            Ok(()) => {
                log::info!("mqtt: connected, listening on {}", self.command_topic);
                self.state.session = SessionStatus::Connected;
            }
            Err(e) => log::warn!("mqtt: session setup failed: {}", e),
        }
    }

    /// Publish on the current session.
    pub fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), SessionError> {
        if self.state.session != SessionStatus::Connected {
            return Err(SessionError::NotConnected);
        }
        self.mqtt
            .publish(topic, payload, retain)
            .map_err(|e| SessionError::Publish(format!("{:?}", e)))
    }

    /// Next pending message, if any.
    pub fn try_recv(&mut self) -> Option<MqttMessage> {
        self.mqtt.try_recv()
    }

    /// Topic LED commands arrive on.
    pub fn command_topic(&self) -> &str {
        &self.command_topic
    }

    /// Current snapshot.
    #[inline]
    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// True while the session is established.
    #[inline]
    pub fn session_connected(&self) -> bool {
        self.state.session == SessionStatus::Connected
    }

    /// The Wi-Fi link.
    pub fn wifi(&self) -> &W {
        &self.wifi
    }

    /// The Wi-Fi link, mutably.
    pub fn wifi_mut(&mut self) -> &mut W {
        &mut self.wifi
    }

    /// The MQTT client.
    pub fn mqtt(&self) -> &M {
        &self.mqtt
    }

    /// The MQTT client, mutably.
    pub fn mqtt_mut(&mut self) -> &mut M {
        &mut self.mqtt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MqttConfig;
    use crate::hal::{MockClock, MockMqtt, MockWifi};

    fn config(ssid: &str, host: &str) -> DeviceConfig {
        DeviceConfig::default()
            .with_wifi(WifiConfig::default().with_ssid(ssid).with_password("pw"))
            .with_mqtt(MqttConfig::default().with_host(host))
    }

    #[test]
    fn status_colors() {
        assert_eq!(AssociationStatus::Disconnected.status_color(), STATUS_BOOT);
        assert_eq!(AssociationStatus::FallbackAP.status_color(), RGB8::new(0, 0, 32));
        assert_eq!(AssociationStatus::Connected.status_color(), RGB8::new(0, 32, 0));
    }

    #[test]
    fn association_waits_in_poll_steps() {
        let mut clock = MockClock::new();
        let mut wifi = MockWifi::new();
        wifi.associate_after_polls = Some(5);
        let mut sup = ConnectivitySupervisor::new(wifi, MockMqtt::new(), &config("net", ""));

        let state = sup.ensure(&mut clock);
        assert_eq!(state.association, AssociationStatus::Connected);
        assert_eq!(clock.now_ms(), 4 * u64::from(ASSOCIATION_POLL_MS));
        assert!(sup.wifi().access_point.is_none());
    }

    #[test]
    fn no_host_means_no_session() {
        let mut clock = MockClock::new();
        let mut sup = ConnectivitySupervisor::new(MockWifi::new(), MockMqtt::new(), &config("net", ""));
        sup.ensure(&mut clock);
        assert!(sup.mqtt().connect_attempts.is_empty());
        assert_eq!(sup.publish("t", b"x", false), Err(SessionError::NotConnected));
    }

    #[test]
    fn auth_only_with_username() {
        let mut clock = MockClock::new();
        let cfg = config("net", "broker").with_mqtt(
            MqttConfig::default().with_host("broker").with_auth("user", "pass"),
        );
        let mut sup = ConnectivitySupervisor::new(MockWifi::new(), MockMqtt::new(), &cfg);
        sup.ensure(&mut clock);
        assert_eq!(sup.mqtt().last_username.as_deref(), Some("user"));
    }

    #[test]
    fn session_error_display() {
        assert_eq!(SessionError::NotConnected.to_string(), "session not connected");
        assert!(SessionError::Publish("()".into()).to_string().contains("publish"));
    }
}
