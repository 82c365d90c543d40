//! HTTP server for ESP32-C3.
//!
//! Serves the control page and JSON API with esp-idf-svc. Every route
//! delegates to [`HttpApiHandler`], so responses match the desktop server.
//!
//! # Endpoints
//!
//! - `GET /` - Control page
//! - `GET /api/sensors` - Telemetry for every active slot
//! - `POST /api/light` - Set the LED mode (`mode`, `color` form fields)
//! - `GET /api/config` - Configuration in effect
//! - `POST /config` - Save the configuration form and restart
//!
//! # Example
//!
//! ```ignore
//! use sunstrip::hal::esp32::Esp32HttpServer;
//! use sunstrip::services::SharedDeviceState;
//!
//! let shared = Arc::new(SharedDeviceState::new());
//! let server = Esp32HttpServer::new(80, Arc::clone(&shared))?;
//! ```

use std::sync::Arc;

use esp_idf_svc::http::server::{Configuration, EspHttpConnection, EspHttpServer, Request};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::{EspIOError, Read, Write};

use crate::services::{ApiResult, HttpApiHandler, SharedDeviceState};

/// Largest request body accepted; the rest is ignored.
pub const MAX_BODY_LEN: usize = 2048;

/// HTTP server handle; routes stay registered while it lives.
pub struct Esp32HttpServer {
    _server: EspHttpServer<'static>,
}

impl Esp32HttpServer {
    /// Start the server on `port`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP server fails to start.
    pub fn new(port: u16, shared: Arc<SharedDeviceState>) -> anyhow::Result<Self> {
        let server_config = Configuration {
            http_port: port,
            ..Default::default()
        };
        let mut server = EspHttpServer::new(&server_config)?;
        let handler = HttpApiHandler::new(shared);

        let h = handler.clone();
        server.fn_handler("/", Method::Get, move |req| {
            send(req, ApiResult::Html(h.handle_index().into()))
        })?;

        let h = handler.clone();
        server.fn_handler("/api/sensors", Method::Get, move |req| {
            send(req, h.handle_get_sensors())
        })?;

        let h = handler.clone();
        server.fn_handler("/api/light", Method::Post, move |mut req| {
            let body = read_body(&mut req)?;
            send(req, h.handle_set_light(&body))
        })?;

        let h = handler.clone();
        server.fn_handler("/api/config", Method::Get, move |req| {
            send(req, h.handle_get_config())
        })?;

        let h = handler;
        server.fn_handler("/config", Method::Post, move |mut req| {
            let body = read_body(&mut req)?;
            send(req, h.handle_save_config(&body))
        })?;

        log::info!("[HTTP] Server started on port {}", port);

        Ok(Self { _server: server })
    }
}

fn read_body(req: &mut Request<&mut EspHttpConnection<'_>>) -> Result<String, EspIOError> {
    let mut body = Vec::new();
    let mut buf = [0u8; 256];
    loop {
        let n = req.read(&mut buf)?;
        if n == 0 {
            break;
        }
        let room = MAX_BODY_LEN - body.len();
        body.extend_from_slice(&buf[..n.min(room)]);
        if body.len() >= MAX_BODY_LEN {
            log::warn!("[HTTP] Request body truncated at {} bytes", MAX_BODY_LEN);
            break;
        }
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

fn send(req: Request<&mut EspHttpConnection<'_>>, result: ApiResult) -> Result<(), EspIOError> {
    let mut resp = req.into_response(
        result.status(),
        None,
        &[("Content-Type", result.content_type())],
    )?;
    resp.write_all(result.body().as_bytes())?;
    Ok(())
}
