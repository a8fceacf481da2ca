//! Surface - off-screen RGBA pixel grid the ambient effects paint into.
//!
//! A surface is measured in half-block pixels: one terminal cell holds two
//! vertically stacked pixels, so a viewport of `cols x rows` cells backs a
//! surface of `cols x rows * 2` pixels. Effects draw in this pixel space
//! with f32 coordinates; the presenter folds pixel pairs back into `▀`
//! cells.
//!
//! # Design Decisions
//!
//! - **Flat storage**: `Vec<Rgba>` with row-major indexing.
//! - **Compositing**: every primitive takes a [`Blend`] op, mirroring the
//!   canvas composite modes the effects need (source-over, lighter, darken).
//! - **Soft edges**: circles and strokes feather their rim by one pixel so
//!   shapes don't alias into hard terminal blocks.

use crate::types::Rgba;

// =============================================================================
// Blend
// =============================================================================

/// How a painted color combines with what is already on the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blend {
    /// Porter-Duff source-over.
    Alpha,
    /// Saturating per-channel addition, for glows on dark backgrounds.
    Additive,
    /// Keep the darker channel, for streaks on light backgrounds.
    Darken,
}

impl Blend {
    #[inline]
    fn compose(self, src: Rgba, dst: Rgba) -> Rgba {
        match self {
            Blend::Alpha => Rgba::blend(src, dst),
            Blend::Additive => Rgba::accumulate(src, dst),
            Blend::Darken => Rgba::darken(src, dst),
        }
    }
}

// =============================================================================
// Surface
// =============================================================================

/// A 2D pixel buffer.
///
/// Uses flat storage with row-major indexing: `index = y * width + x`
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u16,
    height: u16,
    pixels: Vec<Rgba>,
}

impl Surface {
    /// Create a transparent surface.
    pub fn new(width: u16, height: u16) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: vec![Rgba::TRANSPARENT; size],
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Convert (x, y) to flat index.
    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u16) < self.width && (y as u16) < self.height
    }

    /// Get a pixel (None if out of bounds).
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        if self.in_bounds(x, y) {
            Some(self.pixels[self.index(x as u16, y as u16)])
        } else {
            None
        }
    }

    /// Raw pixel slice, row-major.
    #[inline]
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        for px in &mut self.pixels {
            *px = Rgba::TRANSPARENT;
        }
    }

    /// Fill the whole surface with one color.
    pub fn fill(&mut self, color: Rgba) {
        for px in &mut self.pixels {
            *px = color;
        }
    }

    /// Resize the surface (clears content).
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let size = width as usize * height as usize;
        self.pixels.resize(size, Rgba::TRANSPARENT);
        self.clear();
    }

    // =========================================================================
    // Painting Primitives
    // =========================================================================

    /// Composite one pixel. Returns false when out of bounds.
    pub fn plot(&mut self, x: i32, y: i32, color: Rgba, blend: Blend) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = self.index(x as u16, y as u16);
        self.pixels[idx] = blend.compose(color, self.pixels[idx]);
        true
    }

    /// Fill a disk centered at (cx, cy) with a one-pixel feathered rim.
    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba, blend: Blend) {
        if radius <= 0.0 || color.is_transparent() {
            return;
        }
        let (x0, y0, x1, y1) = self.clip_box(cx - radius, cy - radius, cx + radius, cy + radius);
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                let coverage = (radius - dist + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    let src = scale_alpha(color, coverage);
                    let idx = self.index(x, y);
                    self.pixels[idx] = blend.compose(src, self.pixels[idx]);
                }
            }
        }
    }

    /// Radial falloff fill: `center` at full strength at (cx, cy), fading
    /// linearly to transparent at `radius`.
    pub fn fill_radial(&mut self, cx: f32, cy: f32, radius: f32, center: Rgba, blend: Blend) {
        if radius <= 0.0 || center.is_transparent() {
            return;
        }
        let (x0, y0, x1, y1) = self.clip_box(cx - radius, cy - radius, cx + radius, cy + radius);
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist < radius {
                    let src = scale_alpha(center, 1.0 - dist / radius);
                    let idx = self.index(x, y);
                    self.pixels[idx] = blend.compose(src, self.pixels[idx]);
                }
            }
        }
    }

    /// Stroke a line of the given width whose opacity is constant along its
    /// length.
    pub fn stroke_line(
        &mut self,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        width: f32,
        color: Rgba,
        blend: Blend,
    ) {
        self.stroke_segment(x0, y0, x1, y1, width, color, blend, |_| 1.0);
    }

    /// Stroke a line whose opacity ramps from zero at both endpoints to a
    /// peak at the midpoint.
    pub fn stroke_faded(
        &mut self,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        width: f32,
        color: Rgba,
        blend: Blend,
    ) {
        self.stroke_segment(x0, y0, x1, y1, width, color, blend, |t| 1.0 - (2.0 * t - 1.0).abs());
    }

    /// Shared segment rasterizer. Each covered pixel is touched exactly once;
    /// `profile(t)` scales opacity by position along the segment (t in 0..1).
    #[allow(clippy::too_many_arguments)]
    fn stroke_segment(
        &mut self,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        width: f32,
        color: Rgba,
        blend: Blend,
        profile: impl Fn(f32) -> f32,
    ) {
        if color.is_transparent() || width <= 0.0 {
            return;
        }
        let dx = x1 - x0;
        let dy = y1 - y0;
        let len2 = dx * dx + dy * dy;
        if len2 == 0.0 {
            self.fill_circle(x0, y0, width / 2.0, color, blend);
            return;
        }

        let half = width / 2.0;
        let pad = half + 1.0;
        let (bx0, by0, bx1, by1) = self.clip_box(
            x0.min(x1) - pad,
            y0.min(y1) - pad,
            x0.max(x1) + pad,
            y0.max(y1) + pad,
        );

        for y in by0..by1 {
            for x in bx0..bx1 {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;
                let t = (((px - x0) * dx + (py - y0) * dy) / len2).clamp(0.0, 1.0);
                let nx = x0 + t * dx;
                let ny = y0 + t * dy;
                let ddx = px - nx;
                let ddy = py - ny;
                let dist = (ddx * ddx + ddy * ddy).sqrt();
                let coverage = (half - dist + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    let strength = profile(t) * coverage;
                    if strength > 0.0 {
                        let src = scale_alpha(color, strength);
                        let idx = self.index(x, y);
                        self.pixels[idx] = blend.compose(src, self.pixels[idx]);
                    }
                }
            }
        }
    }

    /// Clamp a float box to surface bounds, returning half-open pixel ranges.
    fn clip_box(&self, x0: f32, y0: f32, x1: f32, y1: f32) -> (u16, u16, u16, u16) {
        let cx0 = x0.floor().max(0.0) as u16;
        let cy0 = y0.floor().max(0.0) as u16;
        let cx1 = (x1.ceil().max(0.0) as u32).min(self.width as u32) as u16;
        let cy1 = (y1.ceil().max(0.0) as u32).min(self.height as u32) as u16;
        (cx0, cy0, cx1, cy1)
    }
}

#[inline]
fn scale_alpha(color: Rgba, factor: f32) -> Rgba {
    let a = (color.a as f32 * factor.clamp(0.0, 1.0)).round() as u8;
    color.with_alpha(a)
}

// =============================================================================
// Tests
// =============================================================================
