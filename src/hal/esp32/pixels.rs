//! WS2812 strip on an RMT channel.
//!
//! The RMT driver already implements [`smart_leds::SmartLedsWrite`], so it
//! is used directly as the coordinator's pixel sink.

use esp_idf_hal::gpio::AnyOutputPin;
use esp_idf_hal::rmt::CHANNEL0;
use ws2812_esp32_rmt_driver::{Ws2812Esp32Rmt, Ws2812Esp32RmtDriverError};

/// Pixel sink type for the strip.
pub type Esp32Pixels = Ws2812Esp32Rmt<'static>;

/// Open the strip on a configured GPIO number.
pub fn pixels_on_pin(channel: CHANNEL0, pin: u8) -> Result<Esp32Pixels, Ws2812Esp32RmtDriverError> {
    // Safety: the data pin comes from configuration and is used by nothing else.
    let pin = unsafe { AnyOutputPin::new(i32::from(pin)) };
    Ws2812Esp32Rmt::new(channel, pin)
}
