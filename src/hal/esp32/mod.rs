//! ESP32-C3 hardware abstraction layer for the light station.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 (RISC-V 160MHz)
//! - **Sensors**: Up to four SI1145 UV/IR/visible sensors on I2C0, each on
//!   its own pin pair
//! - **LEDs**: WS2812 strip driven by RMT channel 0
//!
//! All pin numbers come from [`DeviceConfig`](crate::DeviceConfig), so none
//! are fixed here.

mod clock;
mod nvs;
mod pixels;
mod sensor_bus;

pub use clock::Esp32Clock;
pub use nvs::Esp32Store;
pub use pixels::{pixels_on_pin, Esp32Pixels};
pub use sensor_bus::{Esp32BusError, Esp32SensorBus};

#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use wifi::Esp32Wifi;

#[cfg(feature = "esp32-http")]
mod http;
#[cfg(feature = "esp32-http")]
pub use http::{Esp32HttpServer, MAX_BODY_LEN};

#[cfg(feature = "esp32-mqtt")]
mod mqtt;
#[cfg(feature = "esp32-mqtt")]
pub use mqtt::{Esp32Mqtt, Esp32MqttError};
