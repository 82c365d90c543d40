//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware and network traits,
//! enabling development and testing on desktop without physical hardware.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockClock`] | [`Clock`] + [`Delay`] | Shared controllable time source |
//! | [`MockSensorBus`] | [`SensorBus`] | Devices keyed by pin pair and address |
//! | [`MockPixels`] | [`SmartLedsWrite`] | Records written frames |
//! | [`MockWifi`] | [`WifiLink`] | Scripted association |
//! | [`MockMqtt`] | [`MqttClient`] | Captures pub/sub operations |
//! | [`MemoryStore`] | [`KeyValueStore`] | In-memory settings |
//!
//! # Example
//!
//! ```rust
//! use sunstrip::{AnimationEngine, LedMode};
//! use sunstrip::hal::{MockClock, MockPixels};
//! use sunstrip::traits::Clock;
//! use smart_leds::{SmartLedsWrite, RGB8};
//!
//! let clock = MockClock::new();
//! let mut pixels = MockPixels::new();
//! let mut engine = AnimationEngine::new(2);
//!
//! engine.set_mode(LedMode::Solid, RGB8::new(0, 0, 200), clock.now_ms());
//! clock.advance(10);
//! pixels.write(engine.render(clock.now_ms())).unwrap();
//!
//! assert_eq!(pixels.last_frame(), Some(&[RGB8::new(0, 0, 200); 2][..]));
//! ```
//!
//! [`Clock`]: crate::traits::Clock
//! [`Delay`]: crate::traits::Delay
//! [`SensorBus`]: crate::traits::SensorBus
//! [`SmartLedsWrite`]: smart_leds::SmartLedsWrite
//! [`WifiLink`]: crate::traits::WifiLink
//! [`MqttClient`]: crate::traits::MqttClient
//! [`KeyValueStore`]: crate::traits::KeyValueStore

use core::cell::Cell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use smart_leds::{SmartLedsWrite, RGB8};

use crate::traits::{
    Clock, Delay, KeyValueStore, MqttClient, MqttConnectOptions, MqttMessage, SensorBus, WifiLink,
};

// ============================================================================
// Time Mocks
// ============================================================================

/// Mock clock for testing.
///
/// Clones share the same time, so a test can keep one handle while the code
/// under test owns another. [`Delay`] advances the shared time instead of
/// sleeping.
///
/// # Example
///
/// ```rust
/// use sunstrip::hal::MockClock;
/// use sunstrip::traits::{Clock, Delay};
///
/// let clock = MockClock::new();
/// let mut owned = clock.clone();
///
/// clock.set(1000);
/// assert_eq!(owned.now_ms(), 1000);
///
/// owned.delay_ms(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    current_ms: Arc<AtomicU64>,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current time in milliseconds.
    pub fn set(&self, ms: u64) {
        self.current_ms.store(ms, Ordering::SeqCst);
    }

    /// Advances the clock by the given duration.
    pub fn advance(&self, ms: u64) {
        self.current_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }
}

impl Delay for MockClock {
    fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

// ============================================================================
// Sensor Bus Mock
// ============================================================================

/// One simulated sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSensor {
    /// Visible channel.
    pub visible: u16,
    /// Infrared channel.
    pub infrared: u16,
    /// Raw UV (index × 100).
    pub uv_raw: u16,
}

/// Mock sensor bus.
///
/// Devices live at a `(sda, scl, address)` triple and only answer while the
/// bus is bound to their pin pair, the same way a real device on another pair
/// of wires would stay silent.
///
/// # Example
///
/// ```rust
/// use sunstrip::hal::MockSensorBus;
/// use sunstrip::traits::SensorBus;
///
/// let mut bus = MockSensorBus::new();
/// bus.add_device(3, 2, 0x60, 100, 200, 150);
///
/// bus.bind(5, 6).unwrap();
/// assert!(!bus.detect(0x60).unwrap());
///
/// bus.bind(3, 2).unwrap();
/// assert!(bus.detect(0x60).unwrap());
/// assert_eq!(bus.read_uv_raw(0x60).unwrap(), 150);
/// ```
#[derive(Debug, Default)]
pub struct MockSensorBus {
    devices: HashMap<(u8, u8, u8), MockSensor>,
    /// Current pin binding.
    pub bound: Option<(u8, u8)>,
    /// Every `bind` call, in order.
    pub bind_log: Vec<(u8, u8)>,
    /// Number of `detect` calls.
    pub detect_calls: usize,
    /// When set, every read fails.
    pub fail_reads: bool,
}

impl MockSensorBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a sensor on the given pins and address.
    pub fn add_device(&mut self, sda: u8, scl: u8, address: u8, visible: u16, infrared: u16, uv_raw: u16) {
        self.devices.insert(
            (sda, scl, address),
            MockSensor {
                visible,
                infrared,
                uv_raw,
            },
        );
    }

    /// Update the readings of an existing sensor (adds it if missing).
    pub fn set_readings(&mut self, sda: u8, scl: u8, address: u8, visible: u16, infrared: u16, uv_raw: u16) {
        self.add_device(sda, scl, address, visible, infrared, uv_raw);
    }

    /// Remove a sensor.
    pub fn remove_device(&mut self, sda: u8, scl: u8, address: u8) {
        self.devices.remove(&(sda, scl, address));
    }

    fn device(&self, address: u8) -> Option<&MockSensor> {
        let (sda, scl) = self.bound?;
        self.devices.get(&(sda, scl, address))
    }

    fn read_with(&self, address: u8, f: impl Fn(&MockSensor) -> u16) -> Result<u16, ()> {
        if self.fail_reads {
            return Err(());
        }
        self.device(address).map(f).ok_or(())
    }
}

impl SensorBus for MockSensorBus {
    type Error = ();

    fn bind(&mut self, sda: u8, scl: u8) -> Result<(), ()> {
        self.bound = Some((sda, scl));
        self.bind_log.push((sda, scl));
        Ok(())
    }

    fn detect(&mut self, address: u8) -> Result<bool, ()> {
        self.detect_calls += 1;
        Ok(self.device(address).is_some())
    }

    fn read_visible(&mut self, address: u8) -> Result<u16, ()> {
        self.read_with(address, |d| d.visible)
    }

    fn read_infrared(&mut self, address: u8) -> Result<u16, ()> {
        self.read_with(address, |d| d.infrared)
    }

    fn read_uv_raw(&mut self, address: u8) -> Result<u16, ()> {
        self.read_with(address, |d| d.uv_raw)
    }
}

// ============================================================================
// Pixel Mock
// ============================================================================

/// Mock LED strip.
///
/// Records every frame written through [`SmartLedsWrite`].
#[derive(Debug, Default)]
pub struct MockPixels {
    /// Frames in write order.
    pub frames: Vec<Vec<RGB8>>,
    /// When set, writes fail.
    pub fail_writes: bool,
}

impl MockPixels {
    /// Creates a strip with no frames written.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent frame.
    pub fn last_frame(&self) -> Option<&[RGB8]> {
        self.frames.last().map(Vec::as_slice)
    }
}

impl SmartLedsWrite for MockPixels {
    type Error = ();
    type Color = RGB8;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), ()>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        if self.fail_writes {
            return Err(());
        }
        self.frames.push(iterator.into_iter().map(Into::into).collect());
        Ok(())
    }
}

// ============================================================================
// Network Mocks
// ============================================================================

/// Mock Wi-Fi link.
///
/// By default `begin_station` associates immediately. Set `join_succeeds`
/// to false to simulate an unreachable network, or `associate_after_polls`
/// to make association complete after a number of `is_associated` calls.
///
/// # Example
///
/// ```rust
/// use sunstrip::hal::MockWifi;
/// use sunstrip::traits::WifiLink;
///
/// let mut wifi = MockWifi::new();
/// wifi.associate_after_polls = Some(2);
/// wifi.begin_station("garden", "secret").unwrap();
///
/// assert!(!wifi.is_associated());
/// assert!(wifi.is_associated());
/// ```
#[derive(Debug)]
pub struct MockWifi {
    /// Whether `begin_station` associates at once.
    pub join_succeeds: bool,
    /// Associate after this many polls following `begin_station`.
    pub associate_after_polls: Option<u32>,
    /// Current association.
    pub associated: bool,
    /// Last station credentials.
    pub station: Option<(String, String)>,
    /// Number of `begin_station` calls.
    pub station_attempts: usize,
    /// Access point credentials while it is running.
    pub access_point: Option<(String, String)>,
    /// Number of `start_access_point` calls.
    pub ap_starts: usize,
    polls: Cell<u32>,
}

impl Default for MockWifi {
    fn default() -> Self {
        Self {
            join_succeeds: true,
            associate_after_polls: None,
            associated: false,
            station: None,
            station_attempts: 0,
            access_point: None,
            ap_starts: 0,
            polls: Cell::new(0),
        }
    }
}

impl MockWifi {
    /// Creates a link that associates immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a link that never associates.
    pub fn unreachable() -> Self {
        Self {
            join_succeeds: false,
            ..Self::default()
        }
    }

    /// Drop the association.
    pub fn drop_link(&mut self) {
        self.associated = false;
    }
}

impl WifiLink for MockWifi {
    type Error = ();

    fn begin_station(&mut self, ssid: &str, password: &str) -> Result<(), ()> {
        self.station = Some((ssid.into(), password.into()));
        self.station_attempts += 1;
        // station-only reconfiguration stops the access point
        self.access_point = None;
        self.polls.set(0);
        self.associated = self.join_succeeds && self.associate_after_polls.is_none();
        Ok(())
    }

    fn is_associated(&self) -> bool {
        if self.associated {
            return true;
        }
        match self.associate_after_polls {
            Some(n) if self.station.is_some() => {
                let polls = self.polls.get() + 1;
                self.polls.set(polls);
                polls >= n
            }
            _ => false,
        }
    }

    fn start_access_point(&mut self, ssid: &str, password: &str) -> Result<(), ()> {
        self.access_point = Some((ssid.into(), password.into()));
        self.ap_starts += 1;
        Ok(())
    }
}

/// Mock MQTT client for testing.
///
/// Records all publish/subscribe operations and allows injecting
/// incoming messages for testing message handling.
///
/// # Example
///
/// ```rust
/// use sunstrip::hal::MockMqtt;
///
/// let mut mqtt = MockMqtt::new();
///
/// // Queue incoming message
/// mqtt.queue_message("esp/sensors/light/ws2812/set", b"rainbow".to_vec());
///
/// // Check subscriptions
/// mqtt.subscriptions.push("esp/sensors/#".into());
/// assert!(mqtt.is_subscribed("esp/sensors/#"));
///
/// // Check published messages
/// mqtt.published.push(("esp/sensors/status".into(), b"online".to_vec(), true));
/// assert_eq!(mqtt.published_to("esp/sensors/status").len(), 1);
/// ```
#[derive(Debug)]
pub struct MockMqtt {
    /// Messages that have been published (topic, payload, retain).
    pub published: Vec<(String, Vec<u8>, bool)>,
    /// Topics that have been subscribed to.
    pub subscriptions: Vec<String>,
    /// Queue of incoming messages to be returned by `try_recv()`.
    pub incoming: Vec<MqttMessage>,
    /// Whether the client is connected.
    pub connected: bool,
    /// Whether `connect` succeeds.
    pub accept_connect: bool,
    /// Client ids passed to `connect`, in order.
    pub connect_attempts: Vec<String>,
    /// Username of the last `connect`.
    pub last_username: Option<String>,
    /// Publishing to these topics fails.
    pub rejected_topics: Vec<String>,
}

impl Default for MockMqtt {
    fn default() -> Self {
        Self {
            published: Vec::new(),
            subscriptions: Vec::new(),
            incoming: Vec::new(),
            connected: false,
            accept_connect: true,
            connect_attempts: Vec::new(),
            last_username: None,
            rejected_topics: Vec::new(),
        }
    }
}

impl MockMqtt {
    /// Creates a disconnected client that accepts connections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client whose broker refuses connections.
    pub fn refusing() -> Self {
        Self {
            accept_connect: false,
            ..Self::default()
        }
    }

    /// Queue an incoming message
    pub fn queue_message(&mut self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) {
        self.incoming.push(MqttMessage::new(topic, payload));
    }

    /// Check if a topic was subscribed to
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.iter().any(|t| t == topic)
    }

    /// Get published messages for a topic
    pub fn published_to(&self, topic: &str) -> Vec<&(String, Vec<u8>, bool)> {
        self.published
            .iter()
            .filter(|(t, _, _)| t == topic)
            .collect()
    }
}

impl MqttClient for MockMqtt {
    type Error = ();

    fn connect(&mut self, options: &MqttConnectOptions<'_>) -> Result<(), ()> {
        self.connect_attempts.push(options.client_id.into());
        self.last_username = options.username.map(Into::into);
        if self.accept_connect {
            self.connected = true;
            Ok(())
        } else {
            Err(())
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), ()> {
        if !self.connected || self.rejected_topics.iter().any(|t| t == topic) {
            return Err(());
        }
        self.published.push((topic.into(), payload.to_vec(), retain));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), ()> {
        if !self.connected {
            return Err(());
        }
        self.subscriptions.push(topic.into());
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        if self.incoming.is_empty() {
            None
        } else {
            Some(self.incoming.remove(0))
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ============================================================================
// Storage Mock
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Stored {
    Str(String),
    U8(u8),
    U16(u16),
}

/// In-memory key-value store.
///
/// Like NVS, reading a key with the wrong type is an error.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, Stored>,
    /// When set, writes fail.
    pub fail_writes: bool,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` has been written.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of keys written.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn put(&mut self, key: &str, value: Stored) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        self.values.insert(key.into(), value);
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    type Error = ();

    fn get_str(&self, key: &str) -> Result<Option<String>, ()> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Stored::Str(s)) => Ok(Some(s.clone())),
            Some(_) => Err(()),
        }
    }

    fn set_str(&mut self, key: &str, value: &str) -> Result<(), ()> {
        self.put(key, Stored::Str(value.into()))
    }

    fn get_u8(&self, key: &str) -> Result<Option<u8>, ()> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Stored::U8(v)) => Ok(Some(*v)),
            Some(_) => Err(()),
        }
    }

    fn set_u8(&mut self, key: &str, value: u8) -> Result<(), ()> {
        self.put(key, Stored::U8(value))
    }

    fn get_u16(&self, key: &str) -> Result<Option<u16>, ()> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Stored::U16(v)) => Ok(Some(*v)),
            Some(_) => Err(()),
        }
    }

    fn set_u16(&mut self, key: &str, value: u16) -> Result<(), ()> {
        self.put(key, Stored::U16(value))
    }
}

// ============================================================================
// Tests
// ============================================================================
