//! Core types for glimmer-tui.
//!
//! Colors, document-space geometry, and keyboard events. Everything else in
//! the crate is built in terms of these: surfaces blend `Rgba` pixels, the
//! viewport tracks `Rect` regions, the observer compares intersection
//! fractions, the runtime dispatches `KeyboardEvent`s.

// =============================================================================
// Color
// =============================================================================

/// RGBA color with 8-bit channels (0-255).
///
/// Using integers for exact comparison - no floating point epsilon needed.
/// Alpha 255 = fully opaque, 0 = fully transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Create a new RGBA color.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Transparent color.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Check if color is fully opaque.
    #[inline]
    pub const fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// Check if color is fully transparent.
    #[inline]
    pub const fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Same color with a different alpha channel.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Same color with alpha set from a 0.0-1.0 opacity fraction.
    #[inline]
    pub fn with_opacity(self, opacity: f32) -> Self {
        self.with_alpha((opacity.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    /// Alpha blend src over dst (Porter-Duff "over" operation).
    #[inline]
    pub fn blend(src: Self, dst: Self) -> Self {
        // Fast path: fully opaque source
        if src.is_opaque() {
            return src;
        }

        // Fast path: fully transparent source
        if src.is_transparent() {
            return dst;
        }

        let sa = src.a as u32;
        let da = dst.a as u32;
        let inv_sa = 255 - sa;

        // out_a = src_a + dst_a * (1 - src_a)
        let out_a = sa + (da * inv_sa) / 255;

        if out_a == 0 {
            return Self::TRANSPARENT;
        }

        // out_rgb = (src_rgb * src_a + dst_rgb * dst_a * (1 - src_a)) / out_a
        let out_r = ((src.r as u32 * sa) + (dst.r as u32 * da * inv_sa / 255)) / out_a;
        let out_g = ((src.g as u32 * sa) + (dst.g as u32 * da * inv_sa / 255)) / out_a;
        let out_b = ((src.b as u32 * sa) + (dst.b as u32 * da * inv_sa / 255)) / out_a;

        Self {
            r: out_r.min(255) as u8,
            g: out_g.min(255) as u8,
            b: out_b.min(255) as u8,
            a: out_a.min(255) as u8,
        }
    }

    /// Saturating per-channel addition (additive light compositing).
    #[inline]
    pub fn accumulate(src: Self, dst: Self) -> Self {
        // Source channels weighted by their own alpha, then added onto dst.
        let sa = src.a as u32;
        Self {
            r: (dst.r as u32 + src.r as u32 * sa / 255).min(255) as u8,
            g: (dst.g as u32 + src.g as u32 * sa / 255).min(255) as u8,
            b: (dst.b as u32 + src.b as u32 * sa / 255).min(255) as u8,
            a: (dst.a as u32 + sa).min(255) as u8,
        }
    }

    /// Keep the darker of each channel, weighted by source alpha.
    #[inline]
    pub fn darken(src: Self, dst: Self) -> Self {
        let sa = src.a as f32 / 255.0;
        let ch = |s: u8, d: u8| -> u8 {
            let darker = s.min(d) as f32;
            (d as f32 * (1.0 - sa) + darker * sa) as u8
        };
        Self {
            r: ch(src.r, dst.r),
            g: ch(src.g, dst.g),
            b: ch(src.b, dst.b),
            a: (dst.a as u32 + src.a as u32).min(255) as u8,
        }
    }

    /// Linear interpolation between two colors.
    #[inline]
    pub fn lerp(a: Self, b: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let inv_t = 1.0 - t;

        Self {
            r: ((a.r as f32 * inv_t) + (b.r as f32 * t)) as u8,
            g: ((a.g as f32 * inv_t) + (b.g as f32 * t)) as u8,
            b: ((a.b as f32 * inv_t) + (b.b as f32 * t)) as u8,
            a: ((a.a as f32 * inv_t) + (b.a as f32 * t)) as u8,
        }
    }

    /// Calculate relative luminance for WCAG contrast calculations.
    pub fn relative_luminance(&self) -> f32 {
        fn channel_luminance(c: u8) -> f32 {
            let c = c as f32 / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }

        0.2126 * channel_luminance(self.r)
            + 0.7152 * channel_luminance(self.g)
            + 0.0722 * channel_luminance(self.b)
    }

    /// Calculate WCAG 2.1 contrast ratio between two colors.
    ///
    /// Returns a value between 1.0 and 21.0.
    /// WCAG AA requires 4.5:1 for normal text, 3:1 for large text.
    pub fn contrast_ratio(c1: Self, c2: Self) -> f32 {
        let l1 = c1.relative_luminance();
        let l2 = c2.relative_luminance();
        let lighter = l1.max(l2);
        let darker = l1.min(l2);
        (lighter + 0.05) / (darker + 0.05)
    }

    /// Create from 0xRRGGBB integer format.
    ///
    /// # Examples
    ///
    /// ```
    /// use glimmer_tui::types::Rgba;
    ///
    /// let red = Rgba::from_rgb_int(0xff0000);
    /// assert_eq!(red, Rgba::rgb(255, 0, 0));
    /// ```
    pub const fn from_rgb_int(rgb: u32) -> Self {
        Self::rgb(
            ((rgb >> 16) & 0xFF) as u8,
            ((rgb >> 8) & 0xFF) as u8,
            (rgb & 0xFF) as u8,
        )
    }

    /// Parse hex color string (#RGB, #RRGGBB, #RRGGBBAA).
    ///
    /// Returns None for invalid format.
    ///
    /// # Examples
    ///
    /// ```
    /// use glimmer_tui::types::Rgba;
    ///
    /// let red = Rgba::from_hex("#ff0000").unwrap();
    /// assert_eq!(red, Rgba::rgb(255, 0, 0));
    ///
    /// // #RGB shorthand (expands each digit)
    /// let white = Rgba::from_hex("#fff").unwrap();
    /// assert_eq!(white, Rgba::rgb(255, 255, 255));
    ///
    /// // Without # prefix also works
    /// let blue = Rgba::from_hex("0000ff").unwrap();
    /// assert_eq!(blue, Rgba::rgb(0, 0, 255));
    ///
    /// // Invalid returns None
    /// assert!(Rgba::from_hex("#gg0000").is_none());
    /// ```
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');

        fn hex_digit(c: u8) -> Option<u8> {
            match c {
                b'0'..=b'9' => Some(c - b'0'),
                b'a'..=b'f' => Some(c - b'a' + 10),
                b'A'..=b'F' => Some(c - b'A' + 10),
                _ => None,
            }
        }

        fn hex_byte(s: &[u8], i: usize) -> Option<u8> {
            let high = hex_digit(s[i])?;
            let low = hex_digit(s[i + 1])?;
            Some((high << 4) | low)
        }

        let bytes = hex.as_bytes();
        match bytes.len() {
            // #RGB -> expand to #RRGGBB
            3 => {
                let r = hex_digit(bytes[0])?;
                let g = hex_digit(bytes[1])?;
                let b = hex_digit(bytes[2])?;
                Some(Self::rgb((r << 4) | r, (g << 4) | g, (b << 4) | b))
            }
            // #RRGGBB
            6 => {
                let r = hex_byte(bytes, 0)?;
                let g = hex_byte(bytes, 2)?;
                let b = hex_byte(bytes, 4)?;
                Some(Self::rgb(r, g, b))
            }
            // #RRGGBBAA
            8 => {
                let r = hex_byte(bytes, 0)?;
                let g = hex_byte(bytes, 2)?;
                let b = hex_byte(bytes, 4)?;
                let a = hex_byte(bytes, 6)?;
                Some(Self::new(r, g, b, a))
            }
            _ => None,
        }
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// An axis-aligned rectangle in document space.
///
/// Document space is measured in terminal cells, but fractional positions are
/// allowed: smooth scrolling and parallax produce non-integral offsets.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rect.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Grow the rect by `margin` on every side (negative shrinks).
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            width: (self.width + margin * 2.0).max(0.0),
            height: (self.height + margin * 2.0).max(0.0),
        }
    }

    /// Compute the overlapping rect, or None when disjoint.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        if x2 > x1 && y2 > y1 {
            Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
        } else {
            None
        }
    }

    /// Fraction of this rect's area that lies inside `bounds` (0.0-1.0).
    ///
    /// Degenerate rects (zero area) report 0.0.
    pub fn coverage_within(&self, bounds: &Rect) -> f32 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        match self.intersect(bounds) {
            Some(overlap) => (overlap.area() / area).clamp(0.0, 1.0),
            None => 0.0,
        }
    }
}

// =============================================================================
// Input
// =============================================================================

/// Keyboard modifier state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Create empty modifiers
    pub fn none() -> Self {
        Self::default()
    }

    /// Create modifiers with ctrl
    pub fn ctrl() -> Self {
        Self { ctrl: true, ..Self::default() }
    }

    /// Create modifiers with alt
    pub fn alt() -> Self {
        Self { alt: true, ..Self::default() }
    }

    /// Create modifiers with shift
    pub fn shift() -> Self {
        Self { shift: true, ..Self::default() }
    }
}

/// Key event state (press, repeat, release)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyState {
    #[default]
    Press,
    Repeat,
    Release,
}

/// Keyboard event
#[derive(Clone, Debug, PartialEq)]
pub struct KeyboardEvent {
    /// The key that was pressed (e.g., "a", "Enter", "ArrowUp")
    pub key: String,
    /// Modifier keys state
    pub modifiers: Modifiers,
    /// Press/repeat/release state
    pub state: KeyState,
}

impl KeyboardEvent {
    /// Create a simple key press event
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::default(),
            state: KeyState::Press,
        }
    }

    /// Create a key press with modifiers
    pub fn with_modifiers(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
            state: KeyState::Press,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
