//! Diagonal light streaks that sweep across the canvas.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::Rng;

use crate::theme::{Palette, ThemeMode};

use super::{AmbientEffect, Blend, Surface};

/// Number of streaks regardless of canvas size.
pub const STREAK_COUNT: usize = 15;

#[derive(Debug, Clone, Copy)]
struct Streak {
    x: f32,
    y: f32,
    angle: f32,
    length: f32,
    speed: f32,
    width: f32,
    opacity: f32,
}

impl Streak {
    fn spawn(width: f32, height: f32, rng: &mut StdRng) -> Self {
        Self {
            x: rng.r#gen::<f32>() * width,
            y: rng.r#gen::<f32>() * height,
            angle: rng.r#gen::<f32>() * TAU,
            length: 150.0 + rng.r#gen::<f32>() * 200.0,
            speed: 0.3 + rng.r#gen::<f32>() * 0.8,
            width: 1.5 + rng.r#gen::<f32>() * 2.5,
            opacity: 0.08 + rng.r#gen::<f32>() * 0.12,
        }
    }

    /// Off-canvas test with the streak's own length as margin, so a streak
    /// only respawns once no part of it can still be visible.
    fn is_gone(&self, width: f32, height: f32) -> bool {
        self.x < -self.length
            || self.x > width + self.length
            || self.y < -self.length
            || self.y > height + self.length
    }
}

/// Holographic shimmer: thin streaks gliding along their own angle, drawn
/// as faded strokes that peak mid-segment. Dark mode accumulates them as
/// light; light mode darkens the background instead.
#[derive(Default)]
pub struct ShimmerField {
    streaks: Vec<Streak>,
}

impl ShimmerField {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AmbientEffect for ShimmerField {
    fn populate(&mut self, width: f32, height: f32, rng: &mut StdRng) {
        self.streaks = (0..STREAK_COUNT)
            .map(|_| Streak::spawn(width, height, rng))
            .collect();
    }

    fn step(&mut self, width: f32, height: f32, rng: &mut StdRng) {
        for streak in &mut self.streaks {
            streak.x += streak.angle.cos() * streak.speed;
            streak.y += streak.angle.sin() * streak.speed;

            if streak.is_gone(width, height) {
                // Fresh position and heading; pacing attributes survive.
                streak.x = rng.r#gen::<f32>() * width;
                streak.y = rng.r#gen::<f32>() * height;
                streak.angle = rng.r#gen::<f32>() * TAU;
            }
        }
    }

    fn paint(&self, surface: &mut Surface, palette: &Palette, mode: ThemeMode) {
        let blend = match mode {
            ThemeMode::Dark => Blend::Additive,
            ThemeMode::Light => Blend::Darken,
        };
        for streak in &self.streaks {
            let ex = streak.x + streak.angle.cos() * streak.length;
            let ey = streak.y + streak.angle.sin() * streak.length;
            let opacity = streak.opacity * palette.shimmer_opacity_scale;
            let color = palette.shimmer.with_opacity(opacity);
            surface.stroke_faded(streak.x, streak.y, ex, ey, streak.width, color, blend);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
