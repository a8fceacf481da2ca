//! Particle constellation: drifting dots joined by distance-faded lines.

use rand::rngs::StdRng;
use rand::Rng;

use crate::theme::{Palette, ThemeMode};

use super::{AmbientEffect, Blend, Surface};

/// Hard cap on the particle count regardless of canvas width.
pub const PARTICLE_CAP: usize = 50;
/// One particle per this many pixels of canvas width.
pub const PARTICLE_SPACING: f32 = 20.0;
/// Pairs closer than this get a connection line.
pub const LINK_DISTANCE: f32 = 100.0;

#[derive(Debug, Clone, Copy)]
struct Particle {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    size: f32,
    opacity: f32,
}

/// A field of slow-drifting particles with pairwise connection lines.
///
/// Particles wrap around the canvas edges. Light mode draws them fully
/// opaque; dark mode keeps each particle's own opacity.
#[derive(Default)]
pub struct ParticleField {
    particles: Vec<Particle>,
}

impl ParticleField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.particles.len()
    }
}

impl AmbientEffect for ParticleField {
    fn populate(&mut self, width: f32, height: f32, rng: &mut StdRng) {
        let count = PARTICLE_CAP.min((width / PARTICLE_SPACING) as usize);
        self.particles = (0..count)
            .map(|_| Particle {
                x: rng.r#gen::<f32>() * width,
                y: rng.r#gen::<f32>() * height,
                vx: (rng.r#gen::<f32>() - 0.5) * 0.5,
                vy: (rng.r#gen::<f32>() - 0.5) * 0.5,
                size: rng.r#gen::<f32>() * 3.5 + 2.5,
                opacity: rng.r#gen::<f32>() * 0.4 + 0.6,
            })
            .collect();
    }

    fn step(&mut self, width: f32, height: f32, _rng: &mut StdRng) {
        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;

            // Wrap around the canvas.
            if p.x < 0.0 {
                p.x = width;
            }
            if p.x > width {
                p.x = 0.0;
            }
            if p.y < 0.0 {
                p.y = height;
            }
            if p.y > height {
                p.y = 0.0;
            }
        }
    }

    fn paint(&self, surface: &mut Surface, palette: &Palette, mode: ThemeMode) {
        for p in &self.particles {
            let color = match mode {
                ThemeMode::Dark => palette.particle.with_opacity(p.opacity),
                // Solid fill reads better against a white background.
                ThemeMode::Light => palette.particle,
            };
            surface.fill_circle(p.x, p.y, p.size, color, Blend::Alpha);
        }

        for (i, a) in self.particles.iter().enumerate() {
            for b in &self.particles[i + 1..] {
                let dx = a.x - b.x;
                let dy = a.y - b.y;
                let distance = (dx * dx + dy * dy).sqrt();
                if distance < LINK_DISTANCE {
                    let opacity = palette.link_opacity * (1.0 - distance / LINK_DISTANCE);
                    let color = palette.particle.with_opacity(opacity);
                    surface.stroke_line(a.x, a.y, b.x, b.y, palette.link_width, color, Blend::Alpha);
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_count_scales_with_width_up_to_cap() {
        let mut field = ParticleField::new();
        let mut rng = rng();

        field.populate(200.0, 48.0, &mut rng);
        assert_eq!(field.count(), 10);

        field.populate(2000.0, 48.0, &mut rng);
        assert_eq!(field.count(), PARTICLE_CAP);

        field.populate(10.0, 48.0, &mut rng);
        assert_eq!(field.count(), 0);
    }

    #[test]
    fn test_populate_bounds_and_attributes() {
        let mut field = ParticleField::new();
        field.populate(120.0, 60.0, &mut rng());

        for p in &field.particles {
            assert!((0.0..=120.0).contains(&p.x));
            assert!((0.0..=60.0).contains(&p.y));
            assert!(p.vx.abs() <= 0.25);
            assert!(p.vy.abs() <= 0.25);
            assert!((2.5..6.0).contains(&p.size));
            assert!((0.6..1.0).contains(&p.opacity));
        }
    }

    #[test]
    fn test_step_wraps_at_edges() {
        let mut field = ParticleField::new();
        field.particles = vec![
            Particle {
                x: 99.9,
                y: 10.0,
                vx: 0.25,
                vy: 0.0,
                size: 3.0,
                opacity: 0.8,
            },
            Particle {
                x: 0.05,
                y: 10.0,
                vx: -0.25,
                vy: 0.0,
                size: 3.0,
                opacity: 0.8,
            },
        ];

        field.step(100.0, 50.0, &mut rng());
        assert_eq!(field.particles[0].x, 0.0, "right edge wraps to left");
        assert_eq!(field.particles[1].x, 100.0, "left edge wraps to right");
    }

    #[test]
    fn test_paint_draws_particles_and_links() {
        let mut field = ParticleField::new();
        field.particles = vec![
            Particle {
                x: 10.0,
                y: 10.0,
                vx: 0.0,
                vy: 0.0,
                size: 3.0,
                opacity: 1.0,
            },
            Particle {
                x: 40.0,
                y: 10.0,
                vx: 0.0,
                vy: 0.0,
                size: 3.0,
                opacity: 1.0,
            },
        ];

        let mut surface = Surface::new(60, 20);
        let palette = Palette::for_mode(ThemeMode::Dark);
        field.paint(&mut surface, &palette, ThemeMode::Dark);

        // Particle bodies.
        assert!(surface.pixel(10, 10).unwrap().a > 0);
        assert!(surface.pixel(40, 10).unwrap().a > 0);
        // Connection line between them (distance 30 < LINK_DISTANCE).
        assert!(surface.pixel(25, 10).unwrap().a > 0);
    }

    #[test]
    fn test_distant_pairs_are_not_linked() {
        let mut field = ParticleField::new();
        field.particles = vec![
            Particle {
                x: 5.0,
                y: 100.0,
                vx: 0.0,
                vy: 0.0,
                size: 1.0,
                opacity: 1.0,
            },
            Particle {
                x: 155.0,
                y: 100.0,
                vx: 0.0,
                vy: 0.0,
                size: 1.0,
                opacity: 1.0,
            },
        ];

        let mut surface = Surface::new(160, 200);
        let palette = Palette::for_mode(ThemeMode::Dark);
        field.paint(&mut surface, &palette, ThemeMode::Dark);

        // Midpoint untouched: the pair is 150 apart, beyond LINK_DISTANCE.
        assert_eq!(surface.pixel(80, 100).unwrap().a, 0);
    }

    #[test]
    fn test_light_mode_particles_are_opaque() {
        let mut field = ParticleField::new();
        field.particles = vec![Particle {
            x: 10.0,
            y: 10.0,
            vx: 0.0,
            vy: 0.0,
            size: 3.0,
            opacity: 0.6,
        }];

        let palette_light = Palette::for_mode(ThemeMode::Light);
        let mut surface = Surface::new(20, 20);
        field.paint(&mut surface, &palette_light, ThemeMode::Light);
        assert_eq!(surface.pixel(10, 10).unwrap().a, 255);

        let palette_dark = Palette::for_mode(ThemeMode::Dark);
        let mut dark_surface = Surface::new(20, 20);
        field.paint(&mut dark_surface, &palette_dark, ThemeMode::Dark);
        let a = dark_surface.pixel(10, 10).unwrap().a;
        assert!(a < 255 && a > 100, "dark mode keeps per-particle opacity, got {a}");
    }
}
