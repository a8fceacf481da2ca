//! Two soft radial blobs drifting and bouncing across the canvas.

use rand::rngs::StdRng;
use rand::Rng;

use crate::theme::{Palette, ThemeMode};

use super::{AmbientEffect, Blend, Surface};

/// Blob radius as a fraction of the larger canvas dimension.
pub const RADIUS_FACTOR: f32 = 0.3;

#[derive(Debug, Clone, Copy)]
struct Blob {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    radius: f32,
}

impl Blob {
    fn step(&mut self, width: f32, height: f32) {
        self.x += self.vx;
        self.y += self.vy;

        // Reflect at the edges.
        if self.x < 0.0 || self.x > width {
            self.vx = -self.vx;
        }
        if self.y < 0.0 || self.y > height {
            self.vy = -self.vy;
        }
    }
}

/// Slow color wash: an indigo blob and a teal blob, each a radial falloff
/// from a low-opacity center to transparent.
#[derive(Default)]
pub struct GradientDrift {
    blobs: Vec<Blob>,
}

impl GradientDrift {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AmbientEffect for GradientDrift {
    fn populate(&mut self, width: f32, height: f32, rng: &mut StdRng) {
        let radius = width.max(height) * RADIUS_FACTOR;
        self.blobs = vec![
            Blob {
                x: rng.r#gen::<f32>() * width,
                y: rng.r#gen::<f32>() * height,
                vx: 0.2,
                vy: 0.1,
                radius,
            },
            Blob {
                x: rng.r#gen::<f32>() * width,
                y: rng.r#gen::<f32>() * height,
                vx: -0.1,
                vy: 0.2,
                radius,
            },
        ];
    }

    fn step(&mut self, width: f32, height: f32, _rng: &mut StdRng) {
        for blob in &mut self.blobs {
            blob.step(width, height);
        }
    }

    fn paint(&self, surface: &mut Surface, palette: &Palette, _mode: ThemeMode) {
        let colors = [palette.drift_a, palette.drift_b];
        for (blob, color) in self.blobs.iter().zip(colors) {
            let center = color.with_opacity(palette.drift_opacity);
            surface.fill_radial(blob.x, blob.y, blob.radius, center, Blend::Alpha);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
