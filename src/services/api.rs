//! API request and response types for the HTTP surface.

use serde::{Deserialize, Serialize};

use crate::commands::LightCommand;

// ============================================================================
// Response Types
// ============================================================================

/// API response wrapper for error bodies and future endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present when success=true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present when success=false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// ============================================================================
// Request Types
// ============================================================================

/// Light control form: `mode=solid&color=%23ff8800`.
///
/// Both fields may be missing; a missing mode means off and a missing color
/// means black.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LightForm {
    /// `off`, `solid`, `rainbow` or `breathe`.
    #[serde(default)]
    pub mode: String,
    /// `#RRGGBB` or `RRGGBB`.
    #[serde(default)]
    pub color: String,
}

impl From<&LightForm> for LightCommand {
    fn from(form: &LightForm) -> Self {
        LightCommand::from_form(&form.mode, &form.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smart_leds::RGB8;

    #[test]
    fn api_response_ok_omits_error() {
        let json = serde_json::to_string(&ApiResponse::ok(3)).unwrap();
        assert_eq!(json, r#"{"success":true,"data":3}"#);
    }

    #[test]
    fn api_response_err_omits_data() {
        let json = serde_json::to_string(&ApiResponse::<()>::err("Not found")).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"Not found"}"#);
    }

    #[test]
    fn light_form_defaults_to_off() {
        let form: LightForm = serde_json::from_str("{}").unwrap();
        assert_eq!(LightCommand::from(&form), LightCommand::off());
    }

    #[test]
    fn light_form_solid() {
        let form = LightForm {
            mode: "solid".into(),
            color: "#ff8800".into(),
        };
        assert_eq!(LightCommand::from(&form), LightCommand::solid(RGB8::new(255, 136, 0)));
    }
}
