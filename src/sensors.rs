//! Sensor slots sharing one bus.
//!
//! [`BusSensorArray`] exclusively owns the [`SensorBus`] and a fixed array of
//! [`MAX_SENSORS`] slots. Every transaction re-binds the bus to the slot's pin
//! pair first; the binding is never assumed to carry over from the previous
//! slot.
//!
//! A slot is read only while it is enabled and `ready`. Readings are kept
//! until a later successful read replaces them or the array is
//! re-initialized, so a slot that stops being read (disabled, failing bus)
//! keeps its last value and timestamp. Consumers check `enabled && ready`
//! before treating a reading as live.
//!
//! # Example
//!
//! ```rust
//! use sunstrip::config::SensorSlotConfig;
//! use sunstrip::hal::MockSensorBus;
//! use sunstrip::sensors::BusSensorArray;
//!
//! let mut bus = MockSensorBus::new();
//! bus.add_device(3, 2, 0x60, 120, 300, 250);
//!
//! let mut sensors = BusSensorArray::new(bus);
//! sensors.initialize(&[SensorSlotConfig::default().with_enabled(true)]);
//! assert_eq!(sensors.refresh(2_000), 1);
//!
//! let reading = sensors.slot(0).unwrap().reading.unwrap();
//! assert_eq!(reading.uv_index, 2.5);
//! assert_eq!(reading.timestamp_ms, 2_000);
//! ```

use crate::config::{SensorSlotConfig, MAX_SENSORS};
use crate::traits::SensorBus;

/// Divisor turning the raw UV register into a UV index.
pub const UV_SCALE: f32 = 100.0;

/// One set of readings from a slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorReading {
    /// Visible light.
    pub visible: f32,
    /// Infrared.
    pub infrared: f32,
    /// UV index.
    pub uv_index: f32,
    /// Time of the read.
    pub timestamp_ms: u64,
}

/// Runtime state of one slot.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SlotState {
    /// Slot configuration in effect.
    pub config: SensorSlotConfig,
    /// Set by a successful detection; cleared only by re-initialization or
    /// disabling.
    pub ready: bool,
    /// Last good reading, `None` until the first one.
    pub reading: Option<SensorReading>,
}

impl SlotState {
    /// Enabled, ready, and holding a reading.
    pub fn live_reading(&self) -> Option<&SensorReading> {
        if self.config.enabled && self.ready {
            self.reading.as_ref()
        } else {
            None
        }
    }
}

/// Fixed-capacity sensor array that owns the shared bus.
#[derive(Debug)]
pub struct BusSensorArray<B> {
    bus: B,
    slots: [SlotState; MAX_SENSORS],
    count: usize,
}

impl<B: SensorBus> BusSensorArray<B> {
    /// Take ownership of the bus. No slot is active until
    /// [`initialize`](Self::initialize).
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            slots: [SlotState::default(); MAX_SENSORS],
            count: 0,
        }
    }

    /// Apply slot configuration and probe every enabled slot.
    ///
    /// At most [`MAX_SENSORS`] entries are used. Every slot starts over:
    /// `ready` is recomputed and stored readings are discarded.
    pub fn initialize(&mut self, configs: &[SensorSlotConfig]) {
        self.count = configs.len().min(MAX_SENSORS);
        for slot in &mut self.slots {
            slot.ready = false;
            slot.reading = None;
        }
        for (i, config) in configs.iter().take(MAX_SENSORS).enumerate() {
            self.slots[i].config = *config;
            if config.enabled {
                self.probe(i);
            }
        }
    }

    /// Enable or disable one active slot.
    ///
    /// Disabling freezes the slot's last reading. Enabling probes the slot.
    /// Returns false if `index` is not an active slot.
    pub fn set_slot_enabled(&mut self, index: usize, enabled: bool) -> bool {
        if index >= self.count {
            return false;
        }
        self.slots[index].config.enabled = enabled;
        self.slots[index].ready = false;
        if enabled {
            self.probe(index);
        }
        true
    }

    fn probe(&mut self, index: usize) {
        let cfg = self.slots[index].config;
        let detected = self
            .bus
            .bind(cfg.sda, cfg.scl)
            .and_then(|_| self.bus.detect(cfg.address));

        self.slots[index].ready = match detected {
            Ok(true) => {
                log::info!(
                    "sensor {}: ready at 0x{:02X} (SDA {}, SCL {})",
                    index + 1,
                    cfg.address,
                    cfg.sda,
                    cfg.scl
                );
                true
            }
            Ok(false) => {
                log::warn!(
                    "sensor {}: not detected at 0x{:02X} (SDA {}, SCL {})",
                    index + 1,
                    cfg.address,
                    cfg.sda,
                    cfg.scl
                );
                false
            }
            Err(e) => {
                log::warn!("sensor {}: bus error during detection: {:?}", index + 1, e);
                false
            }
        };
    }

    /// Read every enabled, ready slot in index order.
    ///
    /// Returns the number of slots whose reading was replaced. A slot where
    /// any of the three reads fails keeps its previous reading.
    pub fn refresh(&mut self, now_ms: u64) -> usize {
        let mut updated = 0;
        for i in 0..self.count {
            let slot = self.slots[i];
            if !slot.config.enabled || !slot.ready {
                continue;
            }
            match self.read_slot(&slot.config) {
                Ok((visible, infrared, uv_raw)) => {
                    self.slots[i].reading = Some(SensorReading {
                        visible: f32::from(visible),
                        infrared: f32::from(infrared),
                        uv_index: f32::from(uv_raw) / UV_SCALE,
                        timestamp_ms: now_ms,
                    });
                    updated += 1;
                }
                Err(e) => log::debug!("sensor {}: read failed: {:?}", i + 1, e),
            }
        }
        updated
    }

    fn read_slot(&mut self, cfg: &SensorSlotConfig) -> Result<(u16, u16, u16), B::Error> {
        self.bus.bind(cfg.sda, cfg.scl)?;
        let visible = self.bus.read_visible(cfg.address)?;
        let infrared = self.bus.read_infrared(cfg.address)?;
        let uv_raw = self.bus.read_uv_raw(cfg.address)?;
        Ok((visible, infrared, uv_raw))
    }

    /// State of slot `index`, if it is within the active count.
    pub fn slot(&self, index: usize) -> Option<&SlotState> {
        self.slots[..self.count].get(index)
    }

    /// Active slots in index order.
    pub fn slots(&self) -> &[SlotState] {
        &self.slots[..self.count]
    }

    /// Number of active slots.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// The owned bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// The owned bus, mutably.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}
