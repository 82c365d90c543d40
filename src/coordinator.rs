//! Device coordinator: the single owner of all device state.
//!
//! [`DeviceCoordinator`] owns the configuration, the animation engine, the
//! sensor array (and with it the bus), the connectivity supervisor, the pixel
//! sink, the settings store, and the clock. Nothing else mutates any of
//! them; network services reach the device only through
//! [`SharedDeviceState`].
//!
//! # Tick
//!
//! Each [`tick`](DeviceCoordinator::tick) runs to completion:
//!
//! 1. Supervise connectivity (may block in the bounded association wait)
//! 2. Apply pending commands from the command topic and the shared inbox
//! 3. Refresh sensors every [`SENSOR_REFRESH_INTERVAL_MS`]
//! 4. Publish telemetry every [`TELEMETRY_PUBLISH_INTERVAL_MS`] when the
//!    session is up (skipped, not queued, otherwise)
//! 5. Render the animation and write it to the strip
//! 6. Publish a snapshot for the services
//!
//! # Example
//!
//! ```rust
//! use sunstrip::{DeviceCoordinator, DeviceConfig, LightCommand, CommandSource};
//! use sunstrip::hal::{MemoryStore, MockClock, MockMqtt, MockPixels, MockSensorBus, MockWifi};
//! use smart_leds::RGB8;
//!
//! let clock = MockClock::new();
//! let mut device = DeviceCoordinator::new(
//!     DeviceConfig::default(),
//!     MockSensorBus::new(),
//!     MockWifi::new(),
//!     MockMqtt::new(),
//!     MockPixels::new(),
//!     MemoryStore::new(),
//!     clock.clone(),
//! );
//! device.start();
//!
//! device.apply_command(LightCommand::solid(RGB8::new(255, 0, 0)).into(), CommandSource::WebApi);
//! device.tick().unwrap();
//! assert!(device.pixels().last_frame().is_some());
//! ```

use std::sync::Arc;

use smart_leds::{brightness, SmartLedsWrite, RGB8};

use crate::animation::AnimationEngine;
use crate::color::BLACK;
use crate::commands::{CommandOutcome, CommandSource, DeviceCommand, LightCommand};
use crate::config::{store, DeviceConfig};
use crate::connectivity::{AssociationStatus, ConnectivitySupervisor, SessionError};
use crate::sensors::BusSensorArray;
use crate::services::{DeviceSnapshot, SharedDeviceState};
use crate::traits::{Clock, Delay, KeyValueStore, MqttClient, SensorBus, WifiLink};

/// Sensor refresh period.
pub const SENSOR_REFRESH_INTERVAL_MS: u64 = 2_000;

/// Telemetry publish period.
pub const TELEMETRY_PUBLISH_INTERVAL_MS: u64 = 10_000;

/// Pause between ticks so the network stack can run.
pub const LOOP_DELAY_MS: u32 = 10;

/// Telemetry topic suffixes, in publish order.
const CHANNELS: [&str; 3] = ["visible", "ir", "uv"];

// ============================================================================
// Interval
// ============================================================================

/// Fires once more than `period_ms` has passed since it last fired.
///
/// Starts as if it last fired at time zero.
#[derive(Debug, Clone, Copy)]
struct Interval {
    period_ms: u64,
    last_ms: u64,
}

impl Interval {
    const fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            last_ms: 0,
        }
    }

    fn due(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_ms) > self.period_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }
}

// ============================================================================
// Coordinator
// ============================================================================

/// Device orchestrator.
///
/// # Type Parameters
///
/// - `B`: sensor bus ([`SensorBus`])
/// - `W`: Wi-Fi link ([`WifiLink`])
/// - `M`: MQTT client ([`MqttClient`])
/// - `P`: LED strip ([`SmartLedsWrite`] of [`RGB8`])
/// - `S`: settings store ([`KeyValueStore`])
/// - `K`: time source ([`Clock`] + [`Delay`])
pub struct DeviceCoordinator<B, W, M, P, S, K> {
    config: DeviceConfig,
    animation: AnimationEngine,
    sensors: BusSensorArray<B>,
    connectivity: ConnectivitySupervisor<W, M>,
    pixels: P,
    store: S,
    clock: K,
    refresh: Interval,
    publish: Interval,
    shared: Option<Arc<SharedDeviceState>>,
    restart_requested: bool,
}

impl<B, W, M, P, S, K> DeviceCoordinator<B, W, M, P, S, K>
where
    B: SensorBus,
    W: WifiLink,
    M: MqttClient,
    P: SmartLedsWrite<Color = RGB8>,
    P::Error: core::fmt::Debug,
    S: KeyValueStore,
    K: Clock + Delay,
{
    /// Assemble a coordinator. Hardware is not touched until
    /// [`start`](Self::start).
    pub fn new(config: DeviceConfig, bus: B, wifi: W, mqtt: M, pixels: P, store: S, clock: K) -> Self {
        Self {
            animation: AnimationEngine::new(usize::from(config.led.count)),
            sensors: BusSensorArray::new(bus),
            connectivity: ConnectivitySupervisor::new(wifi, mqtt, &config),
            config,
            pixels,
            store,
            clock,
            refresh: Interval::new(SENSOR_REFRESH_INTERVAL_MS),
            publish: Interval::new(TELEMETRY_PUBLISH_INTERVAL_MS),
            shared: None,
            restart_requested: false,
        }
    }

    /// Attach the state shared with network services.
    pub fn with_shared_state(mut self, shared: Arc<SharedDeviceState>) -> Self {
        self.shared = Some(shared);
        self
    }

    /// Boot sequence: status pixel, association, sensor detection.
    ///
    /// May block for the bounded association wait.
    pub fn start(&mut self) {
        self.write_status(AssociationStatus::Disconnected);
        self.supervise();
        self.sensors.initialize(self.config.sensors.active_slots());
        self.publish_snapshot();
    }

    /// Run one loop iteration.
    ///
    /// Returns the pixel sink's error if the frame could not be written; all
    /// other failures are handled internally.
    pub fn tick(&mut self) -> Result<(), P::Error> {
        self.supervise();
        self.drain_commands();

        let now = self.clock.now_ms();
        if self.refresh.due(now) {
            self.sensors.refresh(now);
        }
        if self.publish.due(now) {
            self.publish_telemetry();
        }

        let result = self.render(now);
        self.publish_snapshot();
        result
    }

    /// Yield to the network stack between ticks.
    pub fn idle(&mut self) {
        self.clock.delay_ms(LOOP_DELAY_MS);
    }

    /// Apply a command immediately.
    pub fn apply_command(&mut self, cmd: DeviceCommand, source: CommandSource) -> CommandOutcome {
        match cmd {
            DeviceCommand::Light(light) => {
                self.apply_light(light, source);
                CommandOutcome::Applied
            }
            DeviceCommand::ApplyConfig(config) => {
                self.apply_config(*config, source);
                CommandOutcome::RestartRequired
            }
        }
    }

    fn apply_light(&mut self, light: LightCommand, source: CommandSource) {
        log::info!(
            "light: {} #{} ({})",
            light.mode.as_str(),
            crate::color::to_hex(light.color),
            source.as_str()
        );
        self.animation.set_mode(light.mode, light.color, self.clock.now_ms());
    }

    fn apply_config(&mut self, config: DeviceConfig, source: CommandSource) {
        log::info!("config: applying from {}", source.as_str());
        if let Err(e) = store::save(&mut self.store, &config) {
            log::error!("config: {}", e);
        }

        self.config = config;
        let state = self.animation.state();
        self.animation = AnimationEngine::new(usize::from(self.config.led.count));
        self.animation.set_mode(state.mode, state.color, state.effect_start_ms);
        self.sensors.initialize(self.config.sensors.active_slots());
        self.restart_requested = true;
    }

    fn supervise(&mut self) {
        let before = self.connectivity.state().association;
        let after = self.connectivity.ensure(&mut self.clock).association;
        if after != before {
            self.write_status(after);
        }
    }

    fn drain_commands(&mut self) {
        while let Some(msg) = self.connectivity.try_recv() {
            if msg.topic != self.connectivity.command_topic() {
                log::debug!("mqtt: ignoring message on {}", msg.topic);
                continue;
            }
            let text = String::from_utf8_lossy(&msg.payload);
            self.apply_light(LightCommand::parse_text(&text), CommandSource::Mqtt);
        }

        if let Some(shared) = self.shared.clone() {
            for (cmd, source) in shared.take_commands() {
                self.apply_command(cmd, source);
            }
        }
    }

    fn publish_telemetry(&mut self) {
        if !self.connectivity.session_connected() {
            return;
        }
        for (i, slot) in self.sensors.slots().iter().enumerate() {
            let Some(reading) = slot.live_reading() else {
                continue;
            };
            let values = [reading.visible, reading.infrared, reading.uv_index];
            for (channel, value) in CHANNELS.iter().zip(values) {
                let topic = self.config.telemetry_topic(i + 1, channel);
                let payload = format!("{:.2}", value);
                match self.connectivity.publish(&topic, payload.as_bytes(), true) {
                    Ok(()) => {}
                    Err(SessionError::NotConnected) => return,
                    Err(e) => log::warn!("telemetry {}: {}", topic, e),
                }
            }
        }
    }

    fn render(&mut self, now_ms: u64) -> Result<(), P::Error> {
        let frame = self.animation.render(now_ms);
        self.pixels
            .write(brightness(frame.into_iter(), self.config.led.brightness))
    }

    fn write_status(&mut self, status: AssociationStatus) {
        let count = usize::from(self.config.led.count);
        let frame = (0..count).map(|i| if i == 0 { status.status_color() } else { BLACK });
        if let Err(e) = self.pixels.write(brightness(frame, self.config.led.brightness)) {
            log::warn!("status pixel write failed: {:?}", e);
        }
    }

    fn publish_snapshot(&self) {
        if let Some(shared) = &self.shared {
            shared.publish(self.snapshot());
        }
    }

    /// Current device snapshot.
    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            slots: self.sensors.slots().to_vec(),
            config: self.config.clone(),
            animation: self.animation.state(),
            connectivity: self.connectivity.state(),
            restart_pending: self.restart_requested,
        }
    }

    /// True once a configuration has been applied; the caller restarts.
    #[inline]
    pub fn restart_requested(&self) -> bool {
        self.restart_requested
    }

    /// Configuration in effect.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Animation engine.
    pub fn animation(&self) -> &AnimationEngine {
        &self.animation
    }

    /// Sensor array.
    pub fn sensors(&self) -> &BusSensorArray<B> {
        &self.sensors
    }

    /// Sensor array, mutably.
    pub fn sensors_mut(&mut self) -> &mut BusSensorArray<B> {
        &mut self.sensors
    }

    /// Connectivity supervisor.
    pub fn connectivity(&self) -> &ConnectivitySupervisor<W, M> {
        &self.connectivity
    }

    /// Connectivity supervisor, mutably.
    pub fn connectivity_mut(&mut self) -> &mut ConnectivitySupervisor<W, M> {
        &mut self.connectivity
    }

    /// Pixel sink.
    pub fn pixels(&self) -> &P {
        &self.pixels
    }

    /// Settings store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_fires_after_period() {
        let mut interval = Interval::new(2_000);
        assert!(!interval.due(0));
        assert!(!interval.due(2_000));
        assert!(interval.due(2_001));
        assert!(!interval.due(4_001));
        assert!(interval.due(4_002));
    }

    #[test]
    fn interval_handles_clock_before_last() {
        let mut interval = Interval::new(10);
        assert!(interval.due(50));
        assert!(!interval.due(40));
    }
}
