//! LED animation state machine.
//!
//! [`AnimationEngine`] owns the current [`LedMode`], its color, and the time
//! the effect started. Every [`set_mode`](AnimationEngine::set_mode) call
//! restarts the effect clock, even when the mode and color are unchanged, so
//! the phase of Rainbow and Breathe always follows the most recent command.
//!
//! # Example
//!
//! ```rust
//! use sunstrip::animation::{AnimationEngine, LedMode};
//! use smart_leds::RGB8;
//!
//! let mut engine = AnimationEngine::new(3);
//! engine.set_mode(LedMode::Solid, RGB8::new(10, 20, 30), 0);
//!
//! let frame = engine.render(1_000);
//! assert_eq!(frame.len(), 3);
//! assert!(frame.iter().all(|p| *p == RGB8::new(10, 20, 30)));
//! ```

extern crate alloc;
use alloc::vec::Vec;

use smart_leds::RGB8;

use crate::color::{self, BLACK};

/// LED strip mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LedMode {
    /// All pixels black.
    #[default]
    Off,
    /// All pixels the configured color.
    Solid,
    /// Color wheel cycling along the strip.
    Rainbow,
    /// Configured color pulsing in brightness.
    Breathe,
}

impl LedMode {
    /// Returns the mode as a lowercase string.
    ///
    /// ```
    /// use sunstrip::animation::LedMode;
    ///
    /// assert_eq!(LedMode::Rainbow.as_str(), "rainbow");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LedMode::Off => "off",
            LedMode::Solid => "solid",
            LedMode::Rainbow => "rainbow",
            LedMode::Breathe => "breathe",
        }
    }

    /// Parse a mode name from the web form.
    ///
    /// Input is trimmed and case-insensitive. Unknown names map to
    /// [`Off`](Self::Off).
    ///
    /// ```
    /// use sunstrip::animation::LedMode;
    ///
    /// assert_eq!(LedMode::from_text("Solid"), LedMode::Solid);
    /// assert_eq!(LedMode::from_text(" breathe "), LedMode::Breathe);
    /// assert_eq!(LedMode::from_text("disco"), LedMode::Off);
    /// ```
    pub fn from_text(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "solid" => LedMode::Solid,
            "rainbow" => LedMode::Rainbow,
            "breathe" => LedMode::Breathe,
            _ => LedMode::Off,
        }
    }
}

/// Snapshot of the animation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationState {
    /// Current mode.
    pub mode: LedMode,
    /// Base color (black while Off).
    pub color: RGB8,
    /// Timestamp of the last mode change.
    pub effect_start_ms: u64,
}

/// Animation engine for a fixed-length pixel strip.
#[derive(Debug, Clone)]
pub struct AnimationEngine {
    state: AnimationState,
    pixel_count: usize,
}

impl AnimationEngine {
    /// Create an engine for `pixel_count` pixels, starting Off.
    pub fn new(pixel_count: usize) -> Self {
        Self {
            state: AnimationState {
                mode: LedMode::Off,
                color: BLACK,
                effect_start_ms: 0,
            },
            pixel_count,
        }
    }

    /// Switch mode and restart the effect clock at `now_ms`.
    ///
    /// The color is ignored (stored as black) for [`LedMode::Off`] and by
    /// [`LedMode::Rainbow`] rendering.
    pub fn set_mode(&mut self, mode: LedMode, color: RGB8, now_ms: u64) {
        self.state = AnimationState {
            mode,
            color: if mode == LedMode::Off { BLACK } else { color },
            effect_start_ms: now_ms,
        };
    }

    /// Current state snapshot.
    #[inline]
    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Current mode.
    #[inline]
    pub fn mode(&self) -> LedMode {
        self.state.mode
    }

    /// Number of pixels rendered per frame.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    /// Compute the frame for `now_ms`.
    ///
    /// Pure with respect to the engine: rendering never changes state. A
    /// clock that reads earlier than the effect start renders as elapsed 0.
    pub fn render(&self, now_ms: u64) -> Vec<RGB8> {
        let elapsed = now_ms.saturating_sub(self.state.effect_start_ms);
        let n = self.pixel_count;
        match self.state.mode {
            LedMode::Off => alloc::vec![BLACK; n],
            LedMode::Solid => alloc::vec![self.state.color; n],
            LedMode::Rainbow => (0..n).map(|i| color::rainbow_pixel(i, n, elapsed)).collect(),
            LedMode::Breathe => {
                let pixel = color::breathe(self.state.color, elapsed);
                alloc::vec![pixel; n]
            }
        }
    }
}
