//! Reveal Module - Visibility-gated activation
//!
//! The scroll-reveal building block: attach one to a region and read
//! `is_visible` to decide when to start entrance animations or mount
//! expensive content. The flag flips to true when the region crosses the
//! configured threshold; with `trigger_once` (the default) nothing ever
//! flips it back.
//!
//! On narrow viewports the whole mechanism can be bypassed
//! (`disable_when_narrow`): the flag is forced true and no observer
//! registration happens, so small screens show content without scroll
//! gating. A throttled resize listener re-evaluates that policy when the
//! terminal crosses the breakpoint in either direction.
//!
//! # Example
//!
//! ```ignore
//! use glimmer_tui::viewport::{Reveal, RevealOptions};
//!
//! let reveal = Reveal::attach(&observer, &viewport, &timers, region, RevealOptions {
//!     threshold: 0.3,
//!     ..RevealOptions::default()
//! });
//!
//! if reveal.is_visible() {
//!     // run the entrance animation
//! }
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use spark_signals::{signal, Signal};

use crate::timing::{Throttled, Timers};

use super::{ObserverOptions, RegionId, Viewport, ViewportChange, VisibilityObserver};

/// How often viewport resizes re-evaluate the narrow-screen policy.
pub const RESIZE_REEVAL_THROTTLE: Duration = Duration::from_millis(100);

// =============================================================================
// OPTIONS
// =============================================================================

/// Options for a reveal trigger.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealOptions {
    /// Visible fraction at which the trigger fires.
    pub threshold: f32,
    /// Rows added around the window before intersecting.
    pub root_margin: f32,
    /// Fire once and stay visible forever (the default).
    pub trigger_once: bool,
    /// On narrow viewports, skip observation and report visible right away.
    pub disable_when_narrow: bool,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: 2.0,
            trigger_once: true,
            disable_when_narrow: false,
        }
    }
}

impl RevealOptions {
    fn observer_options(&self) -> ObserverOptions {
        ObserverOptions {
            threshold: self.threshold,
            root_margin: self.root_margin,
            trigger_once: self.trigger_once,
        }
    }
}

// =============================================================================
// REVEAL
// =============================================================================

struct RevealState {
    region: RegionId,
    options: RevealOptions,
    observer: VisibilityObserver,
    viewport: Viewport,
    visible: Signal<bool>,
    /// The observer callback has run at least once.
    fired: bool,
    /// An observer registration is currently active.
    registered: bool,
    was_narrow: bool,
    resize_cleanup: Option<Box<dyn FnOnce()>>,
    detached: bool,
}

/// A visibility trigger bound to one region.
///
/// Detaches on drop: the observer registration and the resize listener are
/// always released, fired or not.
pub struct Reveal {
    visible: Signal<bool>,
    state: Rc<RefCell<RevealState>>,
}

impl Reveal {
    pub fn attach(
        observer: &VisibilityObserver,
        viewport: &Viewport,
        timers: &Timers,
        region: RegionId,
        options: RevealOptions,
    ) -> Self {
        let visible = signal(false);
        let state = Rc::new(RefCell::new(RevealState {
            region,
            options,
            observer: observer.clone(),
            viewport: viewport.clone(),
            visible: visible.clone(),
            fired: false,
            registered: false,
            was_narrow: viewport.is_narrow(),
            resize_cleanup: None,
            detached: false,
        }));

        if options.disable_when_narrow && viewport.is_narrow() {
            visible.set(true);
        } else {
            register(&state);
        }

        // The policy listener always runs, throttled; it only acts when the
        // narrow flag actually flips.
        let weak = Rc::downgrade(&state);
        let throttled = Throttled::new(timers, RESIZE_REEVAL_THROTTLE, move |_: ()| {
            re_evaluate(&weak);
        });
        let cleanup = viewport.on_change(move |change| {
            if matches!(change, ViewportChange::Resize { .. }) {
                throttled.call(());
            }
        });
        state.borrow_mut().resize_cleanup = Some(Box::new(cleanup));

        Self { visible, state }
    }

    /// Whether the region has been revealed.
    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    /// Reactive handle to the visibility flag.
    pub fn visible_signal(&self) -> Signal<bool> {
        self.visible.clone()
    }

    /// The region this trigger watches.
    pub fn region(&self) -> RegionId {
        self.state.borrow().region
    }

    /// Release the observer registration and resize listener now.
    pub fn detach(self) {
        teardown(&self.state);
    }
}

impl Drop for Reveal {
    fn drop(&mut self) {
        teardown(&self.state);
    }
}

/// Register with the observer. The `registered` flag is raised first:
/// observe may fire synchronously and the callback lowers it again for
/// trigger-once registrations.
fn register(state: &Rc<RefCell<RevealState>>) {
    let (observer, region, options) = {
        let mut st = state.borrow_mut();
        st.registered = true;
        (st.observer.clone(), st.region, st.options)
    };

    let weak = Rc::downgrade(state);
    observer.observe_with(region, options.observer_options(), move || {
        let Some(state) = weak.upgrade() else {
            return;
        };
        let visible = {
            let mut st = state.borrow_mut();
            st.fired = true;
            if st.options.trigger_once {
                st.registered = false;
            }
            st.visible.clone()
        };
        visible.set(true);
    });
}

fn re_evaluate(weak: &Weak<RefCell<RevealState>>) {
    let Some(state) = weak.upgrade() else {
        return;
    };

    enum Action {
        Nothing,
        ForceVisible,
        Register,
    }

    let action = {
        let mut st = state.borrow_mut();
        if st.detached {
            return;
        }
        let narrow = st.viewport.is_narrow();
        if narrow == st.was_narrow {
            Action::Nothing
        } else {
            st.was_narrow = narrow;
            if !st.options.disable_when_narrow {
                Action::Nothing
            } else if narrow {
                st.registered = false;
                Action::ForceVisible
            } else if st.fired && st.options.trigger_once {
                // Already revealed for good; nothing left to watch.
                Action::Nothing
            } else {
                Action::Register
            }
        }
    };

    match action {
        Action::Nothing => {}
        Action::ForceVisible => {
            let (visible, observer, region) = {
                let st = state.borrow();
                (st.visible.clone(), st.observer.clone(), st.region)
            };
            visible.set(true);
            observer.unobserve(region);
        }
        Action::Register => register(&state),
    }
}

fn teardown(state: &Rc<RefCell<RevealState>>) {
    let (cleanup, observer, region) = {
        let mut st = state.borrow_mut();
        if st.detached {
            return;
        }
        st.detached = true;
        st.registered = false;
        (st.resize_cleanup.take(), st.observer.clone(), st.region)
    };
    observer.unobserve(region);
    if let Some(cleanup) = cleanup {
        cleanup();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rect;
    use std::time::Instant;

    struct Fixture {
        viewport: Viewport,
        observer: VisibilityObserver,
        timers: Timers,
        start: Instant,
    }

    fn setup(cols: u16) -> Fixture {
        let viewport = Viewport::new(cols, 24);
        viewport.set_doc_height(400.0);
        let observer = VisibilityObserver::new(
            &viewport,
            ObserverOptions {
                root_margin: 0.0,
                ..ObserverOptions::default()
            },
        );
        let start = Instant::now();
        Fixture {
            viewport,
            observer,
            timers: Timers::new(start),
            start,
        }
    }

    fn attach(fx: &Fixture, region: RegionId, options: RevealOptions) -> Reveal {
        Reveal::attach(&fx.observer, &fx.viewport, &fx.timers, region, options)
    }

    #[test]
    fn test_reveal_fires_once_and_sticks() {
        let fx = setup(100);
        // Region spans rows 200-240, far below the 24-row window.
        let region = fx.viewport.insert_region(Rect::new(0.0, 200.0, 100.0, 40.0));
        let reveal = attach(
            &fx,
            region,
            RevealOptions {
                threshold: 0.3,
                root_margin: 0.0,
                ..RevealOptions::default()
            },
        );
        assert!(!reveal.is_visible());

        // 10% visible: under the threshold.
        fx.viewport.scroll_to(180.0);
        assert!(!reveal.is_visible());

        // 35% visible: crossed.
        fx.viewport.scroll_to(190.0);
        assert!(reveal.is_visible());
        assert!(!fx.observer.is_observing(region), "trigger-once unregisters");

        // Scrolling away never un-reveals.
        fx.viewport.scroll_to(0.0);
        assert!(reveal.is_visible());
    }

    #[test]
    fn test_already_visible_at_attach() {
        let fx = setup(100);
        let region = fx.viewport.insert_region(Rect::new(0.0, 4.0, 100.0, 10.0));
        let reveal = attach(&fx, region, RevealOptions::default());
        assert!(reveal.is_visible(), "in-view regions reveal synchronously");
    }

    #[test]
    fn test_narrow_viewport_bypasses_observation() {
        let fx = setup(60);
        let region = fx.viewport.insert_region(Rect::new(0.0, 200.0, 60.0, 40.0));
        let reveal = attach(
            &fx,
            region,
            RevealOptions {
                disable_when_narrow: true,
                ..RevealOptions::default()
            },
        );

        assert!(reveal.is_visible());
        assert!(!fx.observer.is_observing(region));
    }

    #[test]
    fn test_narrow_without_policy_still_observes() {
        let fx = setup(60);
        let region = fx.viewport.insert_region(Rect::new(0.0, 200.0, 60.0, 40.0));
        let reveal = attach(&fx, region, RevealOptions::default());

        assert!(!reveal.is_visible());
        assert!(fx.observer.is_observing(region));

        fx.viewport.scroll_to(200.0);
        assert!(reveal.is_visible());
    }

    #[test]
    fn test_resize_to_narrow_forces_visible() {
        let fx = setup(100);
        let region = fx.viewport.insert_region(Rect::new(0.0, 200.0, 100.0, 40.0));
        let reveal = attach(
            &fx,
            region,
            RevealOptions {
                disable_when_narrow: true,
                ..RevealOptions::default()
            },
        );
        assert!(!reveal.is_visible());

        // Leading edge of the throttle reacts to the first resize at once.
        fx.viewport.set_size(60, 24);
        assert!(reveal.is_visible());
        assert!(!fx.observer.is_observing(region));
    }

    #[test]
    fn test_resize_reeval_is_throttled() {
        let fx = setup(100);
        let region = fx.viewport.insert_region(Rect::new(0.0, 200.0, 100.0, 40.0));
        let _reveal = attach(
            &fx,
            region,
            RevealOptions {
                disable_when_narrow: true,
                ..RevealOptions::default()
            },
        );

        // First resize: leading edge, handled immediately.
        fx.viewport.set_size(60, 24);
        assert!(!fx.observer.is_observing(region));

        // Second resize inside the throttle window: parked for the
        // trailing edge.
        fx.viewport.set_size(100, 24);
        assert!(!fx.observer.is_observing(region), "re-registration waits");

        fx.timers.tick(fx.start + Duration::from_millis(100));
        assert!(fx.observer.is_observing(region), "trailing edge re-registers");
    }

    #[test]
    fn test_widen_after_fired_does_not_reregister() {
        let fx = setup(60);
        let region = fx.viewport.insert_region(Rect::new(0.0, 4.0, 60.0, 10.0));
        // Narrow start with policy: forced visible, fired stays false.
        let reveal = attach(
            &fx,
            region,
            RevealOptions {
                disable_when_narrow: true,
                ..RevealOptions::default()
            },
        );
        assert!(reveal.is_visible());

        // Widen: not fired yet, so the trigger re-registers; the region is
        // in view, so it fires synchronously and unregisters again.
        fx.viewport.set_size(100, 24);
        assert!(reveal.is_visible());
        assert!(!fx.observer.is_observing(region));

        // Narrow and widen once more: fired now, nothing re-registers.
        fx.timers.tick(fx.start + Duration::from_millis(200));
        fx.viewport.set_size(60, 24);
        fx.timers.tick(fx.start + Duration::from_millis(400));
        fx.viewport.set_size(100, 24);
        fx.timers.tick(fx.start + Duration::from_millis(600));
        assert!(!fx.observer.is_observing(region));
    }

    #[test]
    fn test_detach_releases_everything() {
        let fx = setup(100);
        let region = fx.viewport.insert_region(Rect::new(0.0, 200.0, 100.0, 40.0));
        let reveal = attach(
            &fx,
            region,
            RevealOptions {
                disable_when_narrow: true,
                ..RevealOptions::default()
            },
        );
        assert!(fx.observer.is_observing(region));

        let visible = reveal.visible_signal();
        reveal.detach();
        assert!(!fx.observer.is_observing(region));

        // The resize listener is gone too: narrowing no longer forces
        // visibility.
        fx.viewport.set_size(60, 24);
        fx.timers.tick(fx.start + Duration::from_millis(500));
        assert!(!visible.get());
        assert!(!fx.observer.is_observing(region));
    }

    #[test]
    fn test_drop_detaches() {
        let fx = setup(100);
        let region = fx.viewport.insert_region(Rect::new(0.0, 200.0, 100.0, 40.0));
        let reveal = attach(&fx, region, RevealOptions::default());
        assert!(fx.observer.is_observing(region));

        drop(reveal);
        assert!(!fx.observer.is_observing(region));
        assert!(!fx.timers.has_pending(), "no stray throttle timers");
    }
}
