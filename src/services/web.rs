//! Axum-based HTTP server for the control page and JSON API.
//!
//! Provides:
//! - GET `/` - Control page (serves index.html)
//! - GET `/api/sensors` - Telemetry for every active sensor slot
//! - POST `/api/light` - Set the LED mode from a form (`mode`, `color`)
//! - GET `/api/config` - Configuration in effect
//! - POST `/config` - Save a configuration form and restart
//!
//! Handlers never block on the device loop: they read the published
//! [`DeviceSnapshot`](super::DeviceSnapshot) and queue commands into
//! [`SharedDeviceState`].

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Form, Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::commands::{CommandSource, LightCommand};
use crate::config::{DeviceConfig, WebConfig};
use crate::messages::{Ack, TelemetryReport};

use super::api::{ApiResponse, LightForm};
use super::http_handler::{INDEX_PAGE, SAVED_PAGE};
use super::shared::SharedDeviceState;

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /api/sensors
async fn get_sensors(State(state): State<Arc<SharedDeviceState>>) -> Json<TelemetryReport> {
    Json(state.with_snapshot(|s| TelemetryReport::from_slots(&s.slots)))
}

/// POST /api/light
///
/// Accepts `mode=solid&color=%23ff8800`. Never rejects input.
async fn set_light(
    State(state): State<Arc<SharedDeviceState>>,
    Form(form): Form<LightForm>,
) -> Json<Ack> {
    state.submit(LightCommand::from(&form).into(), CommandSource::WebApi);
    Json(Ack::OK)
}

/// GET /api/config
async fn get_config(State(state): State<Arc<SharedDeviceState>>) -> Json<DeviceConfig> {
    Json(state.with_snapshot(|s| s.config.clone()))
}

/// POST /config
///
/// Fields missing from the form keep their current value.
async fn save_config(
    State(state): State<Arc<SharedDeviceState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Html<&'static str> {
    let config = state.with_snapshot(|s| s.config.apply_form(|k| form.get(k).map(String::as_str)));
    state.submit(config.into(), CommandSource::WebLocal);
    Html(SAVED_PAGE)
}

/// GET / - Serve the control page
async fn index() -> impl IntoResponse {
    Html(INDEX_PAGE)
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err("Not found")),
    )
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self::from_config(&WebConfig::default())
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

/// Build the Axum router with all routes
pub fn build_router(state: Arc<SharedDeviceState>, config: &WebServerConfig) -> Router {
    let mut router = Router::new()
        // API routes
        .route("/api/sensors", get(get_sensors))
        .route("/api/light", post(set_light))
        .route("/api/config", get(get_config))
        // Configuration form
        .route("/config", post(save_config))
        // Control page
        .route("/", get(index))
        // Fallback
        .fallback(not_found)
        .with_state(state);

    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

/// Start the web server with shared state
///
/// This function blocks until the server is shut down. The device loop runs
/// elsewhere and drains the commands queued here.
///
/// # Example
///
/// ```ignore
/// let shared = Arc::new(SharedDeviceState::new());
/// let device = DeviceCoordinator::new(...).with_shared_state(Arc::clone(&shared));
///
/// std::thread::spawn(move || loop { device.tick(); device.idle(); });
/// run_server_with_state(shared, WebServerConfig::default()).await?;
/// ```
pub async fn run_server_with_state(
    state: Arc<SharedDeviceState>,
    config: WebServerConfig,
) -> Result<(), std::io::Error> {
    let router = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    log::info!("Web server listening on http://{}", config.addr);

    axum::serve(listener, router).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_server_config_default() {
        let config = WebServerConfig::default();
        assert_eq!(config.addr.port(), 8080);
        assert!(config.cors_permissive);
    }

    #[test]
    fn web_server_config_from_config() {
        let web = WebConfig::default().with_port(9000).with_cors(false);
        let config = WebServerConfig::from_config(&web);
        assert_eq!(config.addr, SocketAddr::from(([0, 0, 0, 0], 9000)));
        assert!(!config.cors_permissive);
    }

    #[test]
    fn web_server_config_builder() {
        let config = WebServerConfig::new(([127, 0, 0, 1], 3000)).cors(false);
        assert_eq!(config.addr.port(), 3000);
        assert!(!config.cors_permissive);
    }
}
