//! Hardware abstraction traits for the sensor bus, time, and delays.
//!
//! This module defines the core hardware interfaces that allow sunstrip to
//! work across different platforms (ESP32, desktop mocks, etc.).
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`SensorBus`] | Shared I2C bus with per-transaction pin rebinding |
//! | [`Clock`] | Monotonic millisecond time source |
//! | [`Delay`] | Blocking delay used by bounded waits and the tick loop |
//!
//! The LED strip is driven through [`smart_leds::SmartLedsWrite`] rather than
//! a crate-local trait, so any smart-leds compatible driver can be used as the
//! pixel sink.
//!
//! # Example
//!
//! ```rust
//! use sunstrip::traits::SensorBus;
//! use sunstrip::hal::MockSensorBus;
//!
//! let mut bus = MockSensorBus::new();
//! bus.add_device(3, 2, 0x60, 120, 300, 250);
//!
//! bus.bind(3, 2).unwrap();
//! assert!(bus.detect(0x60).unwrap());
//! assert_eq!(bus.read_visible(0x60).unwrap(), 120);
//! ```

/// Shared sensor bus.
///
/// The bus is a single physical controller whose pins are re-assigned per
/// slot. Callers must [`bind`](Self::bind) the bus to the slot's pin pair
/// before every transaction; implementations must not assume a previous
/// binding is still in effect.
///
/// # Implementation Notes
///
/// - `detect` both probes the device and puts it into measurement mode
/// - A `false` from `detect` means "nothing recognisable answered", while an
///   `Err` means the transaction itself failed; callers treat both as not ready
/// - `read_uv_raw` returns the device's fixed-point UV value (index × 100)
pub trait SensorBus {
    /// Error type for bus operations.
    type Error: core::fmt::Debug;

    /// Re-bind the bus controller to the given data/clock pin pair.
    fn bind(&mut self, sda: u8, scl: u8) -> Result<(), Self::Error>;

    /// Probe for a sensor at `address` and configure it for measurement.
    fn detect(&mut self, address: u8) -> Result<bool, Self::Error>;

    /// Read the visible-light channel.
    fn read_visible(&mut self, address: u8) -> Result<u16, Self::Error>;

    /// Read the infrared channel.
    fn read_infrared(&mut self, address: u8) -> Result<u16, Self::Error>;

    /// Read the raw ultraviolet value (UV index × 100).
    fn read_uv_raw(&mut self, address: u8) -> Result<u16, Self::Error>;
}

/// Time source.
///
/// Provides monotonic time in milliseconds for animation phase and tick
/// scheduling. On desktop, this can wrap `std::time::Instant`. On embedded,
/// use a hardware timer.
///
/// # Example
///
/// ```rust
/// use sunstrip::traits::Clock;
/// use sunstrip::hal::MockClock;
///
/// let clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

/// Blocking delay.
///
/// Used for the bounded association wait and for yielding to the network
/// stack between ticks.
pub trait Delay {
    /// Block for the specified number of milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingDelay {
        total: u64,
    }

    impl Delay for CountingDelay {
        fn delay_ms(&mut self, ms: u32) {
            self.total += u64::from(ms);
        }
    }

    impl Clock for CountingDelay {
        fn now_ms(&self) -> u64 {
            self.total
        }
    }

    #[test]
    fn delay_feeds_clock() {
        let mut d = CountingDelay { total: 0 };
        d.delay_ms(250);
        d.delay_ms(250);
        assert_eq!(d.now_ms(), 500);
    }
}
