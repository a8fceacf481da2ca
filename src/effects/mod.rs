//! Effects Module - Ambient canvas simulations
//!
//! Continuous background visuals: a particle constellation, two drifting
//! radial gradient blobs, and diagonal shimmer streaks. Each effect is an
//! entity collection behind the [`AmbientEffect`] trait; [`Simulation`]
//! drives one or more of them against a shared [`Surface`] at the frame
//! clock's cadence.
//!
//! The loop re-reads the theme every frame instead of caching it, so
//! flipping dark mode restyles the canvas on the very next frame. Resizes
//! repopulate the entity collections (throttled), keeping density
//! proportional to the canvas area.
//!
//! Stopping is unconditional and idempotent: `stop()` (or dropping the
//! simulation) cancels the pending frame request and removes the resize
//! listener. A frame callback scheduled before `stop()` never runs after it.
//!
//! # Example
//!
//! ```ignore
//! use glimmer_tui::effects::{ParticleField, Simulation};
//!
//! let mut sim = Simulation::new(&frames, &timers, &viewport, &theme);
//! sim.add_effect(ParticleField::new());
//! sim.start();
//! // each runtime tick advances the animation
//! sim.with_surface(|surface| presenter.present(surface));
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::theme::{Palette, ThemeMode, ThemeProvider};
use crate::timing::{FrameClock, FrameId, Throttled, Timers};
use crate::viewport::{Viewport, ViewportChange};

mod gradient;
mod particles;
mod shimmer;
mod surface;

pub use gradient::GradientDrift;
pub use particles::ParticleField;
pub use shimmer::ShimmerField;
pub use surface::{Blend, Surface};

/// How often resize events may trigger a surface rebuild.
pub const RESIZE_THROTTLE: Duration = Duration::from_millis(100);

// =============================================================================
// AmbientEffect
// =============================================================================

/// One simulated entity collection.
///
/// Sizes are in surface pixels (half-block space: canvas height is twice the
/// viewport rows). `populate` rebuilds the collection for a new canvas size;
/// `step` advances every entity one frame and applies the effect's boundary
/// policy; `paint` draws the current state.
pub trait AmbientEffect {
    fn populate(&mut self, width: f32, height: f32, rng: &mut StdRng);
    fn step(&mut self, width: f32, height: f32, rng: &mut StdRng);
    fn paint(&self, surface: &mut Surface, palette: &Palette, mode: ThemeMode);
}

// =============================================================================
// Simulation
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Running,
    Stopped,
}

struct SimState {
    phase: Phase,
    surface: Surface,
    effects: Vec<Box<dyn AmbientEffect>>,
    rng: StdRng,
    frames: FrameClock,
    timers: Timers,
    viewport: Viewport,
    theme: ThemeProvider,
    pending_frame: Option<FrameId>,
    resize_cleanup: Option<Box<dyn FnOnce()>>,
    frame_count: u64,
}

/// The animation loop driver.
///
/// Single-owner: whoever holds the `Simulation` controls its lifecycle, and
/// dropping it stops the loop.
pub struct Simulation {
    inner: Rc<RefCell<SimState>>,
}

impl Simulation {
    pub fn new(
        frames: &FrameClock,
        timers: &Timers,
        viewport: &Viewport,
        theme: &ThemeProvider,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SimState {
                phase: Phase::Uninitialized,
                surface: Surface::new(0, 0),
                effects: Vec::new(),
                rng: StdRng::from_entropy(),
                frames: frames.clone(),
                timers: timers.clone(),
                viewport: viewport.clone(),
                theme: theme.clone(),
                pending_frame: None,
                resize_cleanup: None,
                frame_count: 0,
            })),
        }
    }

    /// Fix the random sequence, for reproducible runs.
    pub fn with_seed(self, seed: u64) -> Self {
        self.inner.borrow_mut().rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Add an effect layer. Layers step and paint in insertion order, so
    /// later layers composite over earlier ones.
    pub fn add_effect(&mut self, effect: impl AmbientEffect + 'static) {
        self.inner.borrow_mut().effects.push(Box::new(effect));
    }

    /// Size the surface to the viewport, populate every effect, and request
    /// the first frame. Only valid once; restarting a stopped simulation is
    /// a no-op.
    pub fn start(&self) {
        let timers = {
            let mut st = self.inner.borrow_mut();
            if st.phase != Phase::Uninitialized {
                log::debug!("simulation start ignored in phase {:?}", st.phase);
                return;
            }
            st.phase = Phase::Running;

            let (cols, rows) = st.viewport.size();
            st.surface.resize(cols, rows.saturating_mul(2));
            let w = st.surface.width() as f32;
            let h = st.surface.height() as f32;
            let SimState { effects, rng, .. } = &mut *st;
            for effect in effects.iter_mut() {
                effect.populate(w, h, rng);
            }
            st.timers.clone()
        };

        let weak = Rc::downgrade(&self.inner);
        let throttled = Throttled::new(&timers, RESIZE_THROTTLE, move |_: ()| {
            rebuild_for_resize(&weak);
        });
        let viewport = self.inner.borrow().viewport.clone();
        let cleanup = viewport.on_change(move |change| {
            if matches!(change, ViewportChange::Resize { .. }) {
                throttled.call(());
            }
        });
        self.inner.borrow_mut().resize_cleanup = Some(Box::new(cleanup));

        schedule_frame(&self.inner);
    }

    /// Cancel the pending frame and remove the resize listener. Idempotent
    /// and final.
    pub fn stop(&self) {
        let (frame, cleanup, frames) = {
            let mut st = self.inner.borrow_mut();
            if st.phase == Phase::Stopped {
                return;
            }
            st.phase = Phase::Stopped;
            (
                st.pending_frame.take(),
                st.resize_cleanup.take(),
                st.frames.clone(),
            )
        };
        if let Some(id) = frame {
            frames.cancel(id);
        }
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.borrow().phase == Phase::Running
    }

    /// Frames painted since start.
    pub fn frame_count(&self) -> u64 {
        self.inner.borrow().frame_count
    }

    /// Read the painted surface.
    pub fn with_surface<R>(&self, f: impl FnOnce(&Surface) -> R) -> R {
        f(&self.inner.borrow().surface)
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.stop();
    }
}

fn schedule_frame(state: &Rc<RefCell<SimState>>) {
    let frames = state.borrow().frames.clone();
    let weak = Rc::downgrade(state);
    let id = frames.request(move |now| run_frame(&weak, now));
    state.borrow_mut().pending_frame = Some(id);
}

fn run_frame(weak: &Weak<RefCell<SimState>>, _now: Instant) {
    let Some(state) = weak.upgrade() else {
        return;
    };
    {
        let mut st = state.borrow_mut();
        if st.phase != Phase::Running {
            return;
        }
        st.pending_frame = None;
        st.frame_count += 1;

        // Theme is read fresh every frame so a live toggle restyles the
        // canvas without a restart.
        let mode = st.theme.mode();
        let palette = Palette::for_mode(mode);
        let w = st.surface.width() as f32;
        let h = st.surface.height() as f32;

        st.surface.clear();
        let SimState {
            surface,
            effects,
            rng,
            ..
        } = &mut *st;
        for effect in effects.iter_mut() {
            effect.step(w, h, rng);
            effect.paint(surface, &palette, mode);
        }
    }
    schedule_frame(&state);
}

fn rebuild_for_resize(weak: &Weak<RefCell<SimState>>) {
    let Some(state) = weak.upgrade() else {
        return;
    };
    let mut st = state.borrow_mut();
    if st.phase != Phase::Running {
        return;
    }
    let (cols, rows) = st.viewport.size();
    st.surface.resize(cols, rows.saturating_mul(2));
    let w = st.surface.width() as f32;
    let h = st.surface.height() as f32;
    let SimState { effects, rng, .. } = &mut *st;
    for effect in effects.iter_mut() {
        effect.populate(w, h, rng);
    }
}

// =============================================================================
// Tests
// =============================================================================
