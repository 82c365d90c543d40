//! # sunstrip
//!
//! Firmware core for a networked ambient-light station: an array of SI1145
//! light sensors on an I2C bus and a WS2812 LED strip, controlled from a web
//! page and over MQTT.
//!
//! ## Features
//!
//! - **Sensor array**: Up to four sensors, each on its own pins and address,
//!   polled on a fixed interval and published as retained MQTT telemetry
//! - **LED animation**: Off, solid, rainbow, and breathe modes rendered from
//!   elapsed time, never from frame counts
//! - **Connectivity supervision**: Bounded station association with a
//!   fallback configuration access point and automatic broker reconnection
//! - **Persistent configuration**: Settings in a key-value store, edited from
//!   the web form and applied on restart
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware, network, and storage abstractions
//! - `color` / `animation` - Pure color math and the animation engine
//! - `sensors` - Sensor slots over a shared bus
//! - `connectivity` - Wi-Fi and MQTT state machines
//! - `coordinator` - The device loop that owns everything
//! - `services` - Shared state, HTTP surfaces, desktop MQTT client
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use sunstrip::{DeviceCoordinator, DeviceConfig, LightCommand, CommandSource, LedMode};
//! use sunstrip::hal::{MemoryStore, MockClock, MockMqtt, MockPixels, MockSensorBus, MockWifi};
//!
//! let clock = MockClock::new();
//! let config = DeviceConfig::default();
//! let mut device = DeviceCoordinator::new(
//!     config,
//!     MockSensorBus::new(),
//!     MockWifi::new(),
//!     MockMqtt::new(),
//!     MockPixels::new(),
//!     MemoryStore::new(),
//!     clock.clone(),
//! );
//! device.start();
//!
//! device.apply_command(LightCommand::rainbow().into(), CommandSource::Mqtt);
//! clock.advance(20);
//! device.tick().unwrap();
//! assert_eq!(device.animation().mode(), LedMode::Rainbow);
//! ```

#![warn(missing_docs)]

/// Animation engine: LED modes rendered from elapsed time.
pub mod animation;
/// Color math: wheel, breathe envelope, hex parsing.
pub mod color;
/// Command types and their sources.
pub mod commands;
/// Shared configuration system for desktop and ESP32.
pub mod config;
/// Wi-Fi association and MQTT session supervision.
pub mod connectivity;
/// Device loop that owns configuration, hardware, and animation state.
pub mod coordinator;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// URL-encoded form parsing.
pub mod parsing;
/// Sensor array over a shared, rebindable bus.
pub mod sensors;
/// Core traits for hardware, network, and storage abstraction.
pub mod traits;

/// Shared message types for HTTP/MQTT communication (serde-based).
#[cfg(feature = "serde")]
pub mod messages;

/// Shared state and network services.
pub mod services;

// Re-exports for convenience
pub use animation::{AnimationEngine, AnimationState, LedMode};
pub use commands::{CommandOutcome, CommandSource, DeviceCommand, LightCommand};
pub use connectivity::{
    AssociationStatus, ConnectivityState, ConnectivitySupervisor, SessionError, SessionStatus,
};
pub use coordinator::DeviceCoordinator;
pub use sensors::{BusSensorArray, SensorReading, SlotState};
pub use traits::{
    // Hardware
    Clock,
    Delay,
    // Storage
    KeyValueStore,
    // Network
    MqttClient,
    MqttConnectOptions,
    MqttMessage,
    SensorBus,
    WifiLink,
};

// Config re-exports
pub use config::{
    BusConfig, DeviceConfig, LedConfig, MqttConfig, SensorSlotConfig, SensorsConfig, WebConfig,
    WifiConfig,
};

// Message re-exports (for HTTP/MQTT APIs)
#[cfg(feature = "serde")]
pub use messages::{Ack, SensorTelemetry, TelemetryReport};
