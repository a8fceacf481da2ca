//! Timing Module - Deadline-driven time sources
//!
//! Everything time-related enters the runtime through this module:
//!
//! - **Timers** - One-shot timeouts with cancellation (the runtime clock)
//! - **FrameClock** - Frame-synchronized callbacks at a fixed cadence
//! - **Limiter** - Throttle/debounce state machines and bound wrappers
//!
//! Nothing here reads the wall clock on its own. The event loop passes
//! `Instant`s in through `tick`, so tests drive time explicitly.

mod frames;
mod limiter;
mod timers;

pub use frames::*;
pub use limiter::*;
pub use timers::*;
