//! # glimmer-tui
//!
//! Scroll-reveal triggers, ambient canvas effects and keyboard accessibility
//! for terminal applications.
//!
//! Built on [spark-signals](https://crates.io/crates/spark-signals) for
//! fine-grained reactivity.
//!
//! ## Architecture
//!
//! A [`runtime::Runtime`] value owns the whole service graph; nothing lives
//! in globals. The application drives it cooperatively:
//!
//! ```text
//! terminal events → dispatch_* → services → signals
//! tick(now)       → timers → frame clock → simulations
//! ```
//!
//! Everything time-based takes the clock as an argument, so tests run the
//! runtime at any speed without sleeping.
//!
//! ## Modules
//!
//! - [`types`] - Core types (Rgba, Rect, KeyboardEvent)
//! - [`timing`] - Timeout queue, frame clock, throttle/debounce
//! - [`viewport`] - Document geometry, visibility observer, reveal triggers
//! - [`effects`] - Ambient surface simulations (particles, drift, shimmer)
//! - [`theme`] - Light/dark mode signal and effect palettes
//! - [`a11y`] - Focus ring, dialogs, announcements, contrast checks
//! - [`runtime`] - Service container and crossterm driver
//! - [`render`] - Half-block presenter

pub mod a11y;
pub mod effects;
pub mod render;
pub mod runtime;
pub mod theme;
pub mod timing;
pub mod types;
pub mod viewport;

// Re-export commonly used items
pub use types::*;

pub use timing::{
    Debounce, Debounced, FrameClock, FrameId, Throttle, Throttled, TimerId, Timers,
};

pub use viewport::{
    ObserverOptions, RegionId, Reveal, RevealOptions, Viewport, ViewportChange,
    VisibilityObserver,
};

pub use effects::{
    AmbientEffect, Blend, GradientDrift, ParticleField, ShimmerField, Simulation, Surface,
};

pub use theme::{Palette, ThemeMode, ThemeProvider};

pub use a11y::{
    Accessibility, AccessibilityHandle, AccessibilityOptions, Announcer, ControlId, DialogBus,
    DialogId, DialogRegistry, DialogSignal, EntryFlags, FocusEntry, FocusRing, FocusScope,
};

pub use render::Presenter;

pub use runtime::{Runtime, RuntimeOptions};
