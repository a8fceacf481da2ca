//! Contrast - WCAG 2.1 contrast checks.
//!
//! Ratio math lives on [`Rgba`]; this module adds the AA thresholds and
//! hex-string conveniences. Malformed hex input reports `None`, never a
//! panic, so user-supplied colors can be checked directly.

use crate::types::Rgba;

/// Minimum AA ratio for normal text.
pub const AA_NORMAL_TEXT: f32 = 4.5;

/// Minimum AA ratio for large text (18pt+, or 14pt bold).
pub const AA_LARGE_TEXT: f32 = 3.0;

/// WCAG 2.1 contrast ratio between foreground and background, 1.0..=21.0.
pub fn contrast_ratio(fg: Rgba, bg: Rgba) -> f32 {
    Rgba::contrast_ratio(fg, bg)
}

/// True when the pair passes AA for normal text.
pub fn meets_aa(fg: Rgba, bg: Rgba) -> bool {
    contrast_ratio(fg, bg) >= AA_NORMAL_TEXT
}

/// True when the pair passes AA for large text.
pub fn meets_aa_large_text(fg: Rgba, bg: Rgba) -> bool {
    contrast_ratio(fg, bg) >= AA_LARGE_TEXT
}

/// Contrast ratio for hex color strings (`#RGB`, `#RRGGBB`, `#RRGGBBAA`).
pub fn contrast_ratio_hex(fg: &str, bg: &str) -> Option<f32> {
    Some(contrast_ratio(Rgba::from_hex(fg)?, Rgba::from_hex(bg)?))
}

/// AA check for hex color strings.
pub fn meets_aa_hex(fg: &str, bg: &str) -> Option<bool> {
    Some(contrast_ratio_hex(fg, bg)? >= AA_NORMAL_TEXT)
}

// =============================================================================
// Tests
// =============================================================================
