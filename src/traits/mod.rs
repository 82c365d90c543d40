//! Trait definitions for hardware, networking, and persistence.
//!
//! This module defines the core abstractions that allow sunstrip to:
//! - Run on different hardware (ESP32, desktop mock)
//! - Use different network implementations
//! - Persist settings in any key-value backend
//!
//! # Submodules
//!
//! - `hardware`: Sensor bus, clock, delay
//! - `network`: Wi-Fi link and MQTT client traits
//! - `storage`: Key-value settings store

pub mod hardware;
pub mod network;
pub mod storage;

pub use hardware::*;
pub use network::*;
pub use storage::*;
