//! Theme Module - Light/dark mode and effect palettes
//!
//! A small injected provider instead of global scheme sniffing: services that
//! care about the color scheme hold a `ThemeProvider` and read it when they
//! need it. Ambient simulations re-read the mode every frame, so toggling
//! dark mode mid-run restyles the canvas without restarting anything.
//!
//! `Palette` bundles the resolved per-mode colors for the ambient effects
//! and the page itself. The two palettes are fixed; pick one with
//! [`Palette::for_mode`].
//!
//! # Example
//!
//! ```ignore
//! use glimmer_tui::theme::{ThemeMode, ThemeProvider};
//!
//! let theme = ThemeProvider::system();
//! let palette = theme.palette();
//!
//! theme.toggle();
//! assert_ne!(theme.mode(), ThemeMode::default());
//! ```

use spark_signals::{peek, signal, Signal};

use crate::types::Rgba;

// =============================================================================
// ThemeMode
// =============================================================================

/// The two color schemes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

// =============================================================================
// Palette
// =============================================================================

/// Resolved colors for one theme mode.
///
/// The ambient effects draw from here rather than hard-coding colors, so a
/// mode flip restyles every running simulation on its next frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    /// Page background the presenter clears to.
    pub background: Rgba,
    /// Body text over `background`.
    pub text: Rgba,
    /// Particle fill color.
    pub particle: Rgba,
    /// Peak opacity of particle connection lines at distance zero.
    pub link_opacity: f32,
    /// Stroke width of connection lines, in pixels.
    pub link_width: f32,
    /// First drifting blob center (indigo).
    pub drift_a: Rgba,
    /// Second drifting blob center (teal).
    pub drift_b: Rgba,
    /// Blob center opacity; both blobs fade to transparent at their radius.
    pub drift_opacity: f32,
    /// Shimmer streak color at the mid-stroke peak.
    pub shimmer: Rgba,
    /// Multiplier on per-streak opacity. Light mode doubles it to stay
    /// visible against white.
    pub shimmer_opacity_scale: f32,
}

const DARK: Palette = Palette {
    background: Rgba::rgb(15, 23, 42),
    text: Rgba::rgb(248, 250, 252),
    particle: Rgba::rgb(99, 162, 255),
    link_opacity: 0.2,
    link_width: 1.0,
    drift_a: Rgba::rgb(79, 70, 229),
    drift_b: Rgba::rgb(20, 184, 166),
    drift_opacity: 0.08,
    shimmer: Rgba::rgb(200, 225, 255),
    shimmer_opacity_scale: 1.0,
};

const LIGHT: Palette = Palette {
    background: Rgba::rgb(255, 255, 255),
    text: Rgba::rgb(15, 23, 42),
    particle: Rgba::rgb(30, 64, 175),
    link_opacity: 0.4,
    link_width: 1.5,
    drift_a: Rgba::rgb(79, 70, 229),
    drift_b: Rgba::rgb(20, 184, 166),
    drift_opacity: 0.05,
    shimmer: Rgba::rgb(17, 24, 39),
    shimmer_opacity_scale: 2.0,
};

impl Palette {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => DARK,
            ThemeMode::Light => LIGHT,
        }
    }
}

// =============================================================================
// ThemeProvider
// =============================================================================

/// Shared handle to the active theme mode.
///
/// Clones observe the same underlying signal, so any handle can flip the
/// mode for everyone.
#[derive(Clone)]
pub struct ThemeProvider {
    mode: Signal<ThemeMode>,
}

impl ThemeProvider {
    pub fn new(mode: ThemeMode) -> Self {
        Self { mode: signal(mode) }
    }

    /// Start from the OS color scheme, defaulting to dark when the platform
    /// gives no answer.
    pub fn system() -> Self {
        let mode = match dark_light::detect() {
            dark_light::Mode::Light => ThemeMode::Light,
            dark_light::Mode::Dark | dark_light::Mode::Default => ThemeMode::Dark,
        };
        Self::new(mode)
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode.get()
    }

    pub fn is_dark(&self) -> bool {
        self.mode().is_dark()
    }

    pub fn set_mode(&self, mode: ThemeMode) {
        self.mode.set(mode);
    }

    pub fn toggle(&self) {
        self.mode.set(peek(|| self.mode.get()).toggled());
    }

    /// Reactive handle for effects and deriveds.
    pub fn signal(&self) -> Signal<ThemeMode> {
        self.mode.clone()
    }

    /// The palette for the current mode.
    pub fn palette(&self) -> Palette {
        Palette::for_mode(self.mode())
    }
}

impl Default for ThemeProvider {
    fn default() -> Self {
        Self::new(ThemeMode::default())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_toggled() {
        assert_eq!(ThemeMode::Dark.toggled(), ThemeMode::Light);
        assert_eq!(ThemeMode::Light.toggled(), ThemeMode::Dark);
        assert!(ThemeMode::default().is_dark());
    }

    #[test]
    fn test_palettes_differ_by_mode() {
        let dark = Palette::for_mode(ThemeMode::Dark);
        let light = Palette::for_mode(ThemeMode::Light);
        assert_ne!(dark.background, light.background);
        assert_ne!(dark.particle, light.particle);
        // The drifting blobs keep their hues; only their opacity changes.
        assert_eq!(dark.drift_a, light.drift_a);
        assert!(dark.drift_opacity > light.drift_opacity);
    }

    #[test]
    fn test_provider_clones_share_mode() {
        let theme = ThemeProvider::new(ThemeMode::Dark);
        let other = theme.clone();

        other.toggle();
        assert_eq!(theme.mode(), ThemeMode::Light);

        theme.set_mode(ThemeMode::Dark);
        assert!(other.is_dark());
    }

    #[test]
    fn test_palette_follows_mode() {
        let theme = ThemeProvider::new(ThemeMode::Dark);
        assert_eq!(theme.palette(), Palette::for_mode(ThemeMode::Dark));
        theme.toggle();
        assert_eq!(theme.palette(), Palette::for_mode(ThemeMode::Light));
    }

    #[test]
    fn test_text_is_readable_in_both_modes() {
        for mode in [ThemeMode::Dark, ThemeMode::Light] {
            let palette = Palette::for_mode(mode);
            let ratio = palette.text.contrast_ratio(palette.background);
            assert!(ratio >= 4.5, "{mode:?} text contrast {ratio} below AA");
        }
    }
}
