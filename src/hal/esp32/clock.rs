//! ESP32 clock implementation using the ESP-IDF timer.

use esp_idf_hal::delay::FreeRtos;

use crate::traits::{Clock, Delay};

/// ESP32 clock using the hardware timer.
///
/// Provides millisecond-resolution timing using the ESP-IDF `esp_timer_get_time()`
/// function, which returns microseconds since boot. Delays go through FreeRTOS
/// so the Wi-Fi and MQTT tasks keep running.
///
/// # Example
///
/// ```ignore
/// use sunstrip::hal::esp32::Esp32Clock;
/// use sunstrip::traits::{Clock, Delay};
///
/// let mut clock = Esp32Clock::new();
/// let start = clock.now_ms();
/// clock.delay_ms(10);
/// let elapsed = clock.now_ms() - start;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Esp32Clock;

impl Esp32Clock {
    /// Creates a new ESP32 clock instance.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Default for Esp32Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u64 {
        // Safe: this is a simple read of the hardware timer, no side effects
        let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        (micros / 1000) as u64
    }
}

impl Delay for Esp32Clock {
    #[inline]
    fn delay_ms(&mut self, ms: u32) {
        FreeRtos::delay_ms(ms);
    }
}
