//! Runtime Module - Service container and cooperative loop
//!
//! One `Runtime` value owns the whole service graph: timers, frame clock,
//! viewport, shared visibility observer, theme provider, focus ring, dialog
//! registry, announcer. Nothing lives in module-level statics; tests build
//! isolated runtimes freely, and an application builds exactly one at
//! startup and drops it at exit.
//!
//! The runtime is driven from outside: `tick(now)` advances the clock and
//! runs due work, `next_deadline(now)` tells the event loop how long it may
//! sleep, and the `dispatch_*` methods feed terminal events in. Time is
//! always passed in, never read ambiently, so tests control it completely.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Instant;
//! use glimmer_tui::runtime::{Runtime, RuntimeOptions};
//! use glimmer_tui::types::Rect;
//! use glimmer_tui::viewport::RevealOptions;
//!
//! let runtime = Runtime::new(RuntimeOptions::default());
//! let hero = runtime.viewport().insert_region(Rect::new(0.0, 40.0, 80.0, 20.0));
//! let reveal = runtime.reveal(hero, RevealOptions::default());
//!
//! runtime.dispatch_scroll(30.0);
//! runtime.tick(Instant::now());
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use spark_signals::{signal, Signal};

use crate::a11y::{Announcer, DialogRegistry, FocusRing};
use crate::effects::Simulation;
use crate::theme::{ThemeMode, ThemeProvider};
use crate::timing::{FrameClock, Throttled, Timers};
use crate::types::KeyboardEvent;
use crate::viewport::{
    ObserverOptions, RegionId, Reveal, RevealOptions, Viewport, VisibilityObserver,
    NARROW_BREAKPOINT,
};

pub mod driver;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default frame cadence (~60 Hz).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Pointer position updates are throttled to roughly one per frame.
pub const POINTER_THROTTLE: Duration = Duration::from_millis(16);

// =============================================================================
// OPTIONS
// =============================================================================

/// Construction-time configuration. Every field has a sensible default.
#[derive(Clone, Copy, Debug)]
pub struct RuntimeOptions {
    /// Initial viewport size; the driver replaces it with the real terminal
    /// size on startup.
    pub cols: u16,
    pub rows: u16,
    /// Frame clock cadence.
    pub frame_interval: Duration,
    /// Width below which the viewport counts as narrow.
    pub narrow_breakpoint: u16,
    /// How long announcements stay up.
    pub announce_clear_after: Duration,
    /// Defaults for visibility observations.
    pub observer: ObserverOptions,
    /// Initial theme. Pass `ThemeProvider::system().mode()` to follow the OS.
    pub theme: ThemeMode,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 24,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            narrow_breakpoint: NARROW_BREAKPOINT,
            announce_clear_after: crate::a11y::DEFAULT_CLEAR_AFTER,
            observer: ObserverOptions::default(),
            theme: ThemeMode::Dark,
        }
    }
}

// =============================================================================
// KEY HANDLERS
// =============================================================================

type KeyHandler = Rc<dyn Fn(&KeyboardEvent) -> bool>;

struct KeyHandlers {
    /// Capture handlers run before the ordinary chain (accessibility layer).
    capture: Vec<(u64, KeyHandler)>,
    bubble: Vec<(u64, KeyHandler)>,
    next_id: u64,
}

impl KeyHandlers {
    fn snapshot(&self) -> Vec<KeyHandler> {
        self.capture
            .iter()
            .chain(self.bubble.iter())
            .map(|(_, h)| h.clone())
            .collect()
    }
}

// =============================================================================
// RUNTIME
// =============================================================================

/// The service container. Owns the graph; accessors hand out cheap
/// cloneable handles to individual services.
pub struct Runtime {
    timers: Timers,
    frames: FrameClock,
    viewport: Viewport,
    observer: VisibilityObserver,
    theme: ThemeProvider,
    focus: FocusRing,
    dialogs: DialogRegistry,
    announcer: Announcer,
    key_handlers: Rc<RefCell<KeyHandlers>>,
    pointer: Signal<(u16, u16)>,
    pointer_throttle: Throttled<(u16, u16)>,
}

impl Runtime {
    pub fn new(options: RuntimeOptions) -> Self {
        let timers = Timers::new(Instant::now());
        let frames = FrameClock::new(options.frame_interval);
        let viewport = Viewport::new(options.cols, options.rows);
        viewport.set_narrow_breakpoint(options.narrow_breakpoint);
        let observer = VisibilityObserver::new(&viewport, options.observer);
        let theme = ThemeProvider::new(options.theme);
        let announcer = Announcer::with_clear_after(&timers, options.announce_clear_after);

        let pointer = signal((0, 0));
        let target = pointer.clone();
        let pointer_throttle = Throttled::new(&timers, POINTER_THROTTLE, move |pos| {
            target.set(pos);
        });

        Self {
            timers,
            frames,
            viewport,
            observer,
            theme,
            focus: FocusRing::new(),
            dialogs: DialogRegistry::new(),
            announcer,
            key_handlers: Rc::new(RefCell::new(KeyHandlers {
                capture: Vec::new(),
                bubble: Vec::new(),
                next_id: 0,
            })),
            pointer,
            pointer_throttle,
        }
    }

    // =========================================================================
    // SERVICES
    // =========================================================================

    pub fn timers(&self) -> Timers {
        self.timers.clone()
    }

    pub fn frames(&self) -> FrameClock {
        self.frames.clone()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.clone()
    }

    pub fn observer(&self) -> VisibilityObserver {
        self.observer.clone()
    }

    pub fn theme(&self) -> ThemeProvider {
        self.theme.clone()
    }

    pub fn focus(&self) -> FocusRing {
        self.focus.clone()
    }

    pub fn dialogs(&self) -> DialogRegistry {
        self.dialogs.clone()
    }

    pub fn announcer(&self) -> Announcer {
        self.announcer.clone()
    }

    /// Attach a reveal trigger for a registered region.
    pub fn reveal(&self, region: RegionId, options: RevealOptions) -> Reveal {
        Reveal::attach(&self.observer, &self.viewport, &self.timers, region, options)
    }

    /// Build an ambient simulation wired to this runtime's clocks, viewport
    /// and theme.
    pub fn simulation(&self) -> Simulation {
        Simulation::new(&self.frames, &self.timers, &self.viewport, &self.theme)
    }

    // =========================================================================
    // CLOCK
    // =========================================================================

    /// The runtime clock's current high-water mark.
    pub fn now(&self) -> Instant {
        self.timers.now()
    }

    /// Advance the clock: fire due timeouts, then run a due frame.
    ///
    /// Returns whether a frame ran (callers redraw on frames).
    pub fn tick(&self, now: Instant) -> bool {
        self.timers.tick(now);
        self.frames.run_if_due(now)
    }

    /// How long the event loop may sleep before something is due.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        match (
            self.timers.next_deadline(now),
            self.frames.next_deadline(now),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    // =========================================================================
    // EVENT INTAKE
    // =========================================================================

    /// Subscribe to key events. Handlers run in registration order after the
    /// capture chain; returning `true` consumes the event.
    pub fn on_key(&self, handler: impl Fn(&KeyboardEvent) -> bool + 'static) -> impl FnOnce() {
        self.add_key_handler(handler, false)
    }

    /// Subscribe ahead of the ordinary chain. The accessibility layer uses
    /// this so Escape and Tab are seen before application handlers.
    pub fn on_key_capture(
        &self,
        handler: impl Fn(&KeyboardEvent) -> bool + 'static,
    ) -> impl FnOnce() {
        self.add_key_handler(handler, true)
    }

    fn add_key_handler(
        &self,
        handler: impl Fn(&KeyboardEvent) -> bool + 'static,
        capture: bool,
    ) -> impl FnOnce() {
        let id = {
            let mut st = self.key_handlers.borrow_mut();
            let id = st.next_id;
            st.next_id += 1;
            let list = if capture { &mut st.capture } else { &mut st.bubble };
            list.push((id, Rc::new(handler)));
            id
        };

        let weak: Weak<RefCell<KeyHandlers>> = Rc::downgrade(&self.key_handlers);
        move || {
            if let Some(handlers) = weak.upgrade() {
                let mut st = handlers.borrow_mut();
                st.capture.retain(|(i, _)| *i != id);
                st.bubble.retain(|(i, _)| *i != id);
            }
        }
    }

    /// Walk the handler chain; the first handler returning `true` consumes
    /// the event. Handlers may subscribe or unsubscribe re-entrantly.
    pub fn dispatch_key(&self, event: &KeyboardEvent) -> bool {
        let handlers = self.key_handlers.borrow().snapshot();
        for handler in handlers {
            if handler(event) {
                return true;
            }
        }
        false
    }

    /// Scroll the document. Returns whether the offset moved.
    pub fn dispatch_scroll(&self, delta: f32) -> bool {
        self.viewport.scroll_by(delta)
    }

    /// Resize the viewport to the new terminal size.
    pub fn dispatch_resize(&self, cols: u16, rows: u16) {
        self.viewport.set_size(cols, rows);
    }

    /// Update the pointer position signal (throttled to the frame cadence).
    pub fn dispatch_pointer(&self, x: u16, y: u16) {
        self.pointer_throttle.call((x, y));
    }

    /// Last pointer position, column and row.
    pub fn pointer(&self) -> (u16, u16) {
        self.pointer.get()
    }

    pub fn pointer_signal(&self) -> Signal<(u16, u16)> {
        self.pointer.clone()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeOptions::default())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn setup() -> (Runtime, Instant) {
        let runtime = Runtime::new(RuntimeOptions::default());
        let t0 = runtime.now();
        (runtime, t0)
    }

    #[test]
    fn test_options_reach_services() {
        let runtime = Runtime::new(RuntimeOptions {
            cols: 100,
            rows: 30,
            narrow_breakpoint: 120,
            theme: ThemeMode::Light,
            ..RuntimeOptions::default()
        });

        assert_eq!(runtime.viewport().size(), (100, 30));
        assert!(runtime.viewport().is_narrow(), "100 < breakpoint 120");
        assert_eq!(runtime.theme().mode(), ThemeMode::Light);
    }

    #[test]
    fn test_tick_runs_timers_then_frames() {
        let (runtime, t0) = setup();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = order.clone();
        let frames = runtime.frames();
        runtime.timers().set_timeout(Duration::from_millis(10), move || {
            o.borrow_mut().push("timer");
            let o = o.clone();
            frames.request(move |_| o.borrow_mut().push("frame"));
        });

        // The frame requested by the timer runs in the same tick.
        assert!(runtime.tick(t0 + Duration::from_millis(16)));
        assert_eq!(*order.borrow(), vec!["timer", "frame"]);
    }

    #[test]
    fn test_next_deadline_is_min_of_clocks() {
        let (runtime, t0) = setup();
        assert_eq!(runtime.next_deadline(t0), None);

        runtime.timers().set_timeout(Duration::from_millis(100), || {});
        assert_eq!(runtime.next_deadline(t0), Some(Duration::from_millis(100)));

        // A pending frame request is due immediately on a fresh clock.
        runtime.frames().request(|_| {});
        assert_eq!(runtime.next_deadline(t0), Some(Duration::ZERO));
    }

    #[test]
    fn test_key_chain_first_consumer_wins() {
        let (runtime, _) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        let _a = runtime.on_key(move |_| {
            l.borrow_mut().push("pass");
            false
        });
        let l = log.clone();
        let _b = runtime.on_key(move |event| {
            l.borrow_mut().push("consume");
            event.key == "Enter"
        });
        let l = log.clone();
        let _c = runtime.on_key(move |_| {
            l.borrow_mut().push("never on enter");
            false
        });

        assert!(runtime.dispatch_key(&KeyboardEvent::new("Enter")));
        assert_eq!(*log.borrow(), vec!["pass", "consume"]);

        log.borrow_mut().clear();
        assert!(!runtime.dispatch_key(&KeyboardEvent::new("x")));
        assert_eq!(*log.borrow(), vec!["pass", "consume", "never on enter"]);
    }

    #[test]
    fn test_capture_handlers_run_first() {
        let (runtime, _) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        let _app = runtime.on_key(move |_| {
            l.borrow_mut().push("app");
            false
        });
        // Registered later, still runs first.
        let l = log.clone();
        let _a11y = runtime.on_key_capture(move |_| {
            l.borrow_mut().push("a11y");
            false
        });

        runtime.dispatch_key(&KeyboardEvent::new("Tab"));
        assert_eq!(*log.borrow(), vec!["a11y", "app"]);
    }

    #[test]
    fn test_key_cleanup_unsubscribes() {
        let (runtime, _) = setup();
        let count = Rc::new(Cell::new(0));

        let c = count.clone();
        let cleanup = runtime.on_key(move |_| {
            c.set(c.get() + 1);
            false
        });

        runtime.dispatch_key(&KeyboardEvent::new("a"));
        cleanup();
        runtime.dispatch_key(&KeyboardEvent::new("a"));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_scroll_and_resize_reach_viewport() {
        let (runtime, _) = setup();
        runtime.viewport().set_doc_height(200.0);

        assert!(runtime.dispatch_scroll(5.0));
        assert_eq!(runtime.viewport().scroll_y(), 5.0);

        runtime.dispatch_resize(120, 40);
        assert_eq!(runtime.viewport().size(), (120, 40));
    }

    #[test]
    fn test_pointer_is_throttled() {
        let (runtime, t0) = setup();

        runtime.dispatch_pointer(10, 5);
        assert_eq!(runtime.pointer(), (10, 5), "leading edge applies");

        runtime.dispatch_pointer(11, 5);
        runtime.dispatch_pointer(12, 6);
        assert_eq!(runtime.pointer(), (10, 5), "burst coalesces");

        runtime.tick(t0 + Duration::from_millis(16));
        assert_eq!(runtime.pointer(), (12, 6), "trailing edge keeps the last");
    }

    #[test]
    fn test_reveal_convenience_fires_on_scroll() {
        let (runtime, _) = setup();
        let viewport = runtime.viewport();
        viewport.set_doc_height(300.0);
        let region = viewport.insert_region(crate::types::Rect::new(0.0, 100.0, 80.0, 20.0));

        let reveal = runtime.reveal(region, RevealOptions::default());
        assert!(!reveal.is_visible());

        runtime.dispatch_scroll(90.0);
        assert!(reveal.is_visible());
    }

    #[test]
    fn test_simulation_convenience_runs_frames() {
        let (runtime, t0) = setup();
        let mut sim = runtime.simulation().with_seed(7);
        sim.add_effect(crate::effects::ParticleField::new());
        sim.start();

        assert!(runtime.tick(t0 + Duration::from_millis(16)));
        assert_eq!(sim.frame_count(), 1);

        assert!(runtime.tick(t0 + Duration::from_millis(32)));
        assert_eq!(sim.frame_count(), 2);
    }
}
