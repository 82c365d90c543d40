//! Network services: shared state, HTTP surfaces, and the desktop MQTT client.
//!
//! - `shared` (always): [`SharedDeviceState`], the command inbox and snapshot
//!   that connect services to the device loop
//! - `serde-json-core` feature: [`HttpApiHandler`] for servers that pass raw
//!   bodies (ESP-IDF)
//! - `web` feature: Axum router with the control page and JSON API
//! - `mqtt` feature: `rumqttc` client implementing [`MqttClient`](crate::traits::MqttClient)
//!
//! # Shared State Pattern
//!
//! ```ignore
//! use std::sync::Arc;
//! use sunstrip::services::{build_router, SharedDeviceState, WebServerConfig};
//!
//! let shared = Arc::new(SharedDeviceState::new());
//! let device = DeviceCoordinator::new(...).with_shared_state(Arc::clone(&shared));
//! let router = build_router(Arc::clone(&shared), &WebServerConfig::default());
//! ```

pub mod shared;

#[cfg(feature = "serde-json-core")]
pub mod http_handler;

#[cfg(feature = "web")]
pub mod api;

#[cfg(feature = "web")]
pub mod web;

#[cfg(feature = "mqtt")]
pub mod mqtt;

// Re-exports
pub use shared::*;

#[cfg(feature = "serde-json-core")]
pub use http_handler::*;

#[cfg(feature = "web")]
pub use api::*;

#[cfg(feature = "web")]
pub use web::*;

#[cfg(feature = "mqtt")]
pub use mqtt::*;
