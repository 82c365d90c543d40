//! Shared HTTP request handling for servers that hand over raw bodies.
//!
//! The ESP-IDF server has no extractors, so its routes call
//! [`HttpApiHandler`] with the request body and translate the [`ApiResult`]
//! into a native response. Nothing here touches the device directly: reads
//! come from the published snapshot and writes go through the inbox.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sunstrip::services::{HttpApiHandler, SharedDeviceState};
//!
//! let shared = Arc::new(SharedDeviceState::new());
//! let handler = HttpApiHandler::new(Arc::clone(&shared));
//!
//! let result = handler.handle_set_light("mode=rainbow");
//! assert_eq!(result.body(), r#"{"ok":true}"#);
//! assert_eq!(shared.take_commands().len(), 1);
//! ```

use std::sync::Arc;

use crate::commands::{CommandSource, LightCommand};
use crate::messages::{render_ack_json, render_config_json, render_telemetry_json, TelemetryReport};
use crate::parsing::FormFields;

use super::shared::SharedDeviceState;

/// Page returned after a configuration form is accepted.
pub const SAVED_PAGE: &str = "<html><body><h2>Saved!</h2><p>Rebooting...</p></body></html>";

/// Control page.
pub const INDEX_PAGE: &str = include_str!("../../www/index.html");

// ============================================================================
// API Result
// ============================================================================

/// Result of an API operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResult {
    /// JSON body.
    Json(String),
    /// HTML body.
    Html(String),
    /// Error with status code and JSON message.
    Error(u16, String),
}

impl ApiResult {
    /// Create an internal error (500).
    pub fn internal(message: &str) -> Self {
        Self::Error(500, format!(r#"{{"error":"{}"}}"#, message))
    }

    /// Check if this is a success response.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Error(..))
    }

    /// Response body.
    pub fn body(&self) -> &str {
        match self {
            Self::Json(body) | Self::Html(body) | Self::Error(_, body) => body,
        }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        match self {
            Self::Json(_) | Self::Html(_) => 200,
            Self::Error(status, _) => *status,
        }
    }

    /// `Content-Type` header value.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Html(_) => "text/html",
            Self::Json(_) | Self::Error(..) => "application/json",
        }
    }
}

// ============================================================================
// HTTP API Handler
// ============================================================================

/// Request handling over [`SharedDeviceState`].
#[derive(Debug, Clone)]
pub struct HttpApiHandler {
    state: Arc<SharedDeviceState>,
}

impl HttpApiHandler {
    /// Create a handler over the shared state.
    pub fn new(state: Arc<SharedDeviceState>) -> Self {
        Self { state }
    }

    /// GET / - Control page.
    pub fn handle_index(&self) -> &'static str {
        INDEX_PAGE
    }

    /// GET /api/sensors - Telemetry for every active slot.
    pub fn handle_get_sensors(&self) -> ApiResult {
        let report = self.state.with_snapshot(|s| TelemetryReport::from_slots(&s.slots));
        match render_telemetry_json(&report) {
            Some(json) => ApiResult::Json(json.as_str().into()),
            None => ApiResult::internal("telemetry too large"),
        }
    }

    /// POST /api/light - Queue a light command from a form body.
    ///
    /// Never rejects input: unknown modes mean off and bad colors mean black.
    pub fn handle_set_light(&self, body: &str) -> ApiResult {
        let form = FormFields::parse(body);
        let cmd = LightCommand::from_form(
            form.get("mode").unwrap_or_default(),
            form.get("color").unwrap_or_default(),
        );
        self.state.submit(cmd.into(), CommandSource::WebApi);
        match render_ack_json() {
            Some(json) => ApiResult::Json(json.as_str().into()),
            None => ApiResult::internal("ack"),
        }
    }

    /// GET /api/config - Configuration in effect.
    pub fn handle_get_config(&self) -> ApiResult {
        let json = self.state.with_snapshot(|s| render_config_json(&s.config));
        match json {
            Some(json) => ApiResult::Json(json.as_str().into()),
            None => ApiResult::internal("config too large"),
        }
    }

    /// POST /config - Merge the form into the current configuration and queue
    /// it for saving. The device restarts once it has been applied.
    pub fn handle_save_config(&self, body: &str) -> ApiResult {
        let form = FormFields::parse(body);
        let config = self
            .state
            .with_snapshot(|s| s.config.apply_form(|k| form.get(k)));
        self.state.submit(config.into(), CommandSource::WebLocal);
        ApiResult::Html(SAVED_PAGE.into())
    }
}
