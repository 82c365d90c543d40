//! Color math for the LED effects.
//!
//! Pure functions mapping time and pixel position to [`RGB8`] values. Nothing
//! in here reads a clock; callers pass elapsed milliseconds explicitly so the
//! results are reproducible in tests.
//!
//! # Rainbow
//!
//! The rainbow effect walks a 256-step color wheel, one step every 10 ms, so
//! the whole strip repeats every 2560 ms.
//!
//! ```rust
//! use sunstrip::color::{rainbow_pixel, RAINBOW_PERIOD_MS};
//!
//! let a = rainbow_pixel(0, 8, 1234);
//! let b = rainbow_pixel(0, 8, 1234 + RAINBOW_PERIOD_MS);
//! assert_eq!(a, b);
//! ```

use smart_leds::RGB8;

/// Milliseconds per color-wheel step in the rainbow effect.
pub const RAINBOW_STEP_MS: u64 = 10;

/// Full rainbow cycle: 256 wheel positions at [`RAINBOW_STEP_MS`] each.
pub const RAINBOW_PERIOD_MS: u64 = 256 * RAINBOW_STEP_MS;

/// Hue spread across the strip, in wheel units per full strip length.
const RAINBOW_SPREAD: u64 = 360;

/// Full breathe cycle (dark → full → dark).
pub const BREATHE_PERIOD_MS: u64 = 2000;

/// All channels off.
pub const BLACK: RGB8 = RGB8 { r: 0, g: 0, b: 0 };

/// Map a wheel position to a color.
///
/// Three linear segments of 85 steps, each scaling its rising channel by 3
/// per step.
///
/// ```rust
/// use sunstrip::color::wheel;
/// use smart_leds::RGB8;
///
/// assert_eq!(wheel(0), RGB8::new(0, 255, 0));
/// assert_eq!(wheel(85), RGB8::new(255, 0, 0));
/// assert_eq!(wheel(170), RGB8::new(0, 0, 255));
/// ```
pub fn wheel(pos: u8) -> RGB8 {
    if pos < 85 {
        RGB8::new(pos * 3, 255 - pos * 3, 0)
    } else if pos < 170 {
        let p = pos - 85;
        RGB8::new(255 - p * 3, 0, p * 3)
    } else {
        let p = pos - 170;
        RGB8::new(0, p * 3, 255 - p * 3)
    }
}

/// Wheel position for pixel `index` of `pixel_count` after `elapsed_ms`.
///
/// `pixel_count` of zero is treated as one.
#[inline]
pub fn rainbow_position(index: usize, pixel_count: usize, elapsed_ms: u64) -> u8 {
    let count = pixel_count.max(1) as u64;
    let spread = index as u64 * RAINBOW_SPREAD / count;
    let offset = spread.wrapping_add(elapsed_ms / RAINBOW_STEP_MS);
    (offset & 0xFF) as u8
}

/// Rainbow color for one pixel.
#[inline]
pub fn rainbow_pixel(index: usize, pixel_count: usize, elapsed_ms: u64) -> RGB8 {
    wheel(rainbow_position(index, pixel_count, elapsed_ms))
}

/// Brightness multiplier for the breathe effect, in `0.0..=1.0`.
///
/// `(sin(elapsed_seconds × π) + 1) / 2`: half brightness at every whole
/// second, full at x.5 s when x is even, dark at x.5 s when x is odd.
pub fn breathe_level(elapsed_ms: u64) -> f32 {
    let seconds = elapsed_ms as f64 / 1000.0;
    (((seconds * core::f64::consts::PI).sin() + 1.0) / 2.0) as f32
}

/// Scale every channel of `color` by `level` (truncating).
pub fn scale(color: RGB8, level: f32) -> RGB8 {
    let level = level.clamp(0.0, 1.0);
    RGB8::new(
        (color.r as f32 * level) as u8,
        (color.g as f32 * level) as u8,
        (color.b as f32 * level) as u8,
    )
}

/// Breathe color at `elapsed_ms`.
#[inline]
pub fn breathe(color: RGB8, elapsed_ms: u64) -> RGB8 {
    scale(color, breathe_level(elapsed_ms))
}

/// Parse a six-digit hex color, with an optional leading `#`.
///
/// Anything that is not exactly six hex digits yields black.
///
/// ```rust
/// use sunstrip::color::parse_hex_color;
/// use smart_leds::RGB8;
///
/// assert_eq!(parse_hex_color("#6bffdf"), RGB8::new(107, 255, 223));
/// assert_eq!(parse_hex_color("6BFFDF"), RGB8::new(107, 255, 223));
/// assert_eq!(parse_hex_color("bad"), RGB8::new(0, 0, 0));
/// ```
pub fn parse_hex_color(text: &str) -> RGB8 {
    let hex = text.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return BLACK;
    }
    match u32::from_str_radix(hex, 16) {
        Ok(value) => RGB8::new((value >> 16) as u8, (value >> 8) as u8, value as u8),
        Err(_) => BLACK,
    }
}

/// Format a color as six lowercase hex digits (no `#`).
pub fn to_hex(color: RGB8) -> heapless::String<6> {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = heapless::String::new();
    for byte in [color.r, color.g, color.b] {
        let _ = out.push(DIGITS[(byte >> 4) as usize] as char);
        let _ = out.push(DIGITS[(byte & 0x0F) as usize] as char);
    }
    out
}
