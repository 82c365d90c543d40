//! Command types accepted by the device coordinator.
//!
//! Commands arrive from two boundaries and converge on the same handlers:
//!
//! - MQTT text messages on `<base>/<ledTopic>/set`, parsed with
//!   [`LightCommand::parse_text`]
//! - Web requests, built from explicit `mode` + `color` form fields with
//!   [`LightCommand::from_form`], or a full configuration form
//!
//! Malformed input never produces an error: unknown commands turn the strip
//! off and bad colors become black.
//!
//! # Text Protocol
//!
//! | Payload | Result |
//! |---------|--------|
//! | `color:RRGGBB` | Solid color |
//! | `rainbow` | Rainbow |
//! | `breathe:RRGGBB` | Breathe in the given color |
//! | `off`, anything else | Off |
//!
//! ```rust
//! use sunstrip::{LightCommand, LedMode};
//! use smart_leds::RGB8;
//!
//! let cmd = LightCommand::parse_text("COLOR:#ff8000");
//! assert_eq!(cmd.mode, LedMode::Solid);
//! assert_eq!(cmd.color, RGB8::new(255, 128, 0));
//! ```

extern crate alloc;
use alloc::boxed::Box;

use smart_leds::RGB8;

use crate::animation::LedMode;
use crate::color::{parse_hex_color, BLACK};
use crate::config::DeviceConfig;

// ============================================================================
// Command Source
// ============================================================================

/// Boundary a command arrived from.
///
/// Only used for logging; all sources are treated equally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CommandSource {
    /// MQTT command topic.
    Mqtt,
    /// Web API endpoint (`/api/light`).
    WebApi,
    /// Configuration page form.
    WebLocal,
}

impl CommandSource {
    /// Short name used in log lines.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CommandSource::Mqtt => "mqtt",
            CommandSource::WebApi => "web-api",
            CommandSource::WebLocal => "web-local",
        }
    }
}

// ============================================================================
// Light Command
// ============================================================================

/// Request to change the LED animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightCommand {
    /// Target mode.
    pub mode: LedMode,
    /// Target color (ignored by Off and Rainbow).
    pub color: RGB8,
}

impl LightCommand {
    /// Turn the strip off.
    pub const fn off() -> Self {
        Self {
            mode: LedMode::Off,
            color: BLACK,
        }
    }

    /// Show a solid color.
    pub const fn solid(color: RGB8) -> Self {
        Self {
            mode: LedMode::Solid,
            color,
        }
    }

    /// Start the rainbow effect.
    pub const fn rainbow() -> Self {
        Self {
            mode: LedMode::Rainbow,
            color: BLACK,
        }
    }

    /// Start breathing in `color`.
    pub const fn breathe(color: RGB8) -> Self {
        Self {
            mode: LedMode::Breathe,
            color,
        }
    }

    /// Parse an MQTT text command.
    ///
    /// Prefix matching is case-insensitive; anything unrecognised is Off.
    ///
    /// ```
    /// use sunstrip::{LightCommand, LedMode};
    ///
    /// assert_eq!(LightCommand::parse_text("rainbow").mode, LedMode::Rainbow);
    /// assert_eq!(LightCommand::parse_text("breathe:00ff00").mode, LedMode::Breathe);
    /// assert_eq!(LightCommand::parse_text("sparkle"), LightCommand::off());
    /// ```
    pub fn parse_text(payload: &str) -> Self {
        let text = payload.trim();
        if let Some(hex) = strip_prefix_ignore_case(text, "color:") {
            Self::solid(parse_hex_color(hex))
        } else if strip_prefix_ignore_case(text, "rainbow").is_some() {
            Self::rainbow()
        } else if let Some(hex) = strip_prefix_ignore_case(text, "breathe:") {
            Self::breathe(parse_hex_color(hex))
        } else {
            Self::off()
        }
    }

    /// Build from the web form's `mode` and `color` fields.
    ///
    /// ```
    /// use sunstrip::{LightCommand, LedMode};
    /// use smart_leds::RGB8;
    ///
    /// let cmd = LightCommand::from_form("breathe", "#0000ff");
    /// assert_eq!(cmd, LightCommand::breathe(RGB8::new(0, 0, 255)));
    /// ```
    pub fn from_form(mode: &str, color: &str) -> Self {
        match LedMode::from_text(mode) {
            LedMode::Off => Self::off(),
            LedMode::Solid => Self::solid(parse_hex_color(color)),
            LedMode::Rainbow => Self::rainbow(),
            LedMode::Breathe => Self::breathe(parse_hex_color(color)),
        }
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

// ============================================================================
// Device Command
// ============================================================================

/// Any command the coordinator applies.
#[derive(Clone, Debug)]
pub enum DeviceCommand {
    /// Change the LED animation.
    Light(LightCommand),
    /// Persist a new configuration and request a restart.
    ApplyConfig(Box<DeviceConfig>),
}

impl From<LightCommand> for DeviceCommand {
    fn from(cmd: LightCommand) -> Self {
        DeviceCommand::Light(cmd)
    }
}

impl From<DeviceConfig> for DeviceCommand {
    fn from(config: DeviceConfig) -> Self {
        DeviceCommand::ApplyConfig(Box::new(config))
    }
}

/// Result of applying a [`DeviceCommand`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command took effect immediately.
    Applied,
    /// Configuration was persisted; the device must restart to use it.
    RestartRequired,
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Text Protocol Tests
    // =========================================================================

    #[test]
    fn parse_color_command() {
        let cmd = LightCommand::parse_text("color:6bffdf");
        assert_eq!(cmd, LightCommand::solid(RGB8::new(107, 255, 223)));
    }

    #[test]
    fn parse_color_with_hash() {
        let cmd = LightCommand::parse_text("color:#6BFFDF");
        assert_eq!(cmd.color, RGB8::new(107, 255, 223));
    }

    #[test]
    fn parse_prefix_case_insensitive() {
        assert_eq!(LightCommand::parse_text("RAINBOW").mode, LedMode::Rainbow);
        assert_eq!(LightCommand::parse_text("Color:ff0000").mode, LedMode::Solid);
        assert_eq!(LightCommand::parse_text("BREATHE:ff0000").mode, LedMode::Breathe);
        assert_eq!(LightCommand::parse_text("OFF"), LightCommand::off());
    }

    #[test]
    fn parse_rainbow_accepts_trailing_text() {
        assert_eq!(LightCommand::parse_text("rainbow:fast").mode, LedMode::Rainbow);
    }

    #[test]
    fn parse_bad_hex_is_black() {
        assert_eq!(LightCommand::parse_text("color:xyz"), LightCommand::solid(BLACK));
        assert_eq!(LightCommand::parse_text("breathe:12345"), LightCommand::breathe(BLACK));
    }

    #[test]
    fn parse_unknown_is_off() {
        assert_eq!(LightCommand::parse_text(""), LightCommand::off());
        assert_eq!(LightCommand::parse_text("colour:ff0000"), LightCommand::off());
        assert_eq!(LightCommand::parse_text("strobe"), LightCommand::off());
    }

    #[test]
    fn parse_multibyte_input_does_not_panic() {
        assert_eq!(LightCommand::parse_text("cölor:ff0000"), LightCommand::off());
        assert_eq!(LightCommand::parse_text("é"), LightCommand::off());
    }

    // =========================================================================
    // Form Tests
    // =========================================================================

    #[test]
    fn form_modes() {
        let red = RGB8::new(255, 0, 0);
        assert_eq!(LightCommand::from_form("solid", "#ff0000"), LightCommand::solid(red));
        assert_eq!(LightCommand::from_form("rainbow", "#ff0000"), LightCommand::rainbow());
        assert_eq!(LightCommand::from_form("off", "#ff0000"), LightCommand::off());
        assert_eq!(LightCommand::from_form("nope", "#ff0000"), LightCommand::off());
    }

    #[test]
    fn device_command_from_light() {
        let cmd: DeviceCommand = LightCommand::rainbow().into();
        assert!(matches!(cmd, DeviceCommand::Light(c) if c.mode == LedMode::Rainbow));
    }
}
