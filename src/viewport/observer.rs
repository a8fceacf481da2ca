//! Observer Module - Shared visibility observer
//!
//! One viewport subscription multiplexed over many region registrations,
//! so N reveal triggers cost one change listener instead of N. Each
//! registration tracks its own threshold crossing: the callback fires when
//! the region's visible fraction crosses the threshold from below.
//!
//! Trigger-once registrations are removed *before* their callback is
//! invoked, so nothing observed during the callback (or later in the same
//! batch) can see a stale registration.
//!
//! When no viewport exists to watch (detached mode), every registration
//! fires immediately on `observe`: pages stay functional, animations just
//! lose their gating.
//!
//! # Example
//!
//! ```ignore
//! use glimmer_tui::viewport::{ObserverOptions, VisibilityObserver, Viewport};
//!
//! let viewport = Viewport::new(80, 24);
//! let observer = VisibilityObserver::new(&viewport, ObserverOptions::default());
//!
//! observer.observe(region, move || {
//!     // region crossed into view
//! });
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::{RegionId, Viewport};

// =============================================================================
// OPTIONS
// =============================================================================

/// Per-registration visibility options; also the observer-wide defaults
/// applied by [`VisibilityObserver::observe`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObserverOptions {
    /// Visible fraction (0.0-1.0) at which a registration fires.
    /// A threshold of 0.0 fires on any overlap.
    pub threshold: f32,
    /// Rows added around the visible window before intersecting, so
    /// registrations fire slightly before their region scrolls in.
    pub root_margin: f32,
    /// Remove the registration when it first fires.
    pub trigger_once: bool,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: 2.0,
            trigger_once: true,
        }
    }
}

// =============================================================================
// OBSERVER
// =============================================================================

struct ObserveEntry {
    region: RegionId,
    options: ObserverOptions,
    /// Whether the region was past the threshold at the last evaluation.
    /// Callbacks fire only on the false -> true edge.
    was_past: bool,
    callback: Rc<dyn Fn()>,
}

impl ObserveEntry {
    fn is_past(&self, ratio: f32) -> bool {
        if self.options.threshold <= 0.0 {
            ratio > 0.0
        } else {
            ratio >= self.options.threshold
        }
    }
}

struct ObserverState {
    defaults: ObserverOptions,
    entries: Vec<ObserveEntry>,
    viewport: Option<Viewport>,
    viewport_cleanup: Option<Box<dyn FnOnce()>>,
    connected: bool,
}

impl Drop for ObserverState {
    fn drop(&mut self) {
        // Dropping all handles without disconnect() still detaches the
        // viewport listener.
        if let Some(cleanup) = self.viewport_cleanup.take() {
            cleanup();
        }
    }
}

/// Shared visibility observer.
///
/// Cheap to clone; all clones share the same registrations.
#[derive(Clone)]
pub struct VisibilityObserver {
    inner: Rc<RefCell<ObserverState>>,
}

impl VisibilityObserver {
    /// Create an observer watching `viewport`.
    pub fn new(viewport: &Viewport, defaults: ObserverOptions) -> Self {
        let observer = Self {
            inner: Rc::new(RefCell::new(ObserverState {
                defaults,
                entries: Vec::new(),
                viewport: Some(viewport.clone()),
                viewport_cleanup: None,
                connected: true,
            })),
        };

        let weak = Rc::downgrade(&observer.inner);
        let cleanup = viewport.on_change(move |_| {
            if let Some(inner) = weak.upgrade() {
                Self { inner }.process_batch();
            }
        });
        observer.inner.borrow_mut().viewport_cleanup = Some(Box::new(cleanup));

        observer
    }

    /// Create an observer with no viewport to watch.
    ///
    /// Every `observe` call fires its callback immediately: content gated on
    /// visibility stays reachable, it just stops being deferred.
    pub fn detached(defaults: ObserverOptions) -> Self {
        log::warn!("no viewport available; visibility observer treats all regions as visible");
        Self {
            inner: Rc::new(RefCell::new(ObserverState {
                defaults,
                entries: Vec::new(),
                viewport: None,
                viewport_cleanup: None,
                connected: true,
            })),
        }
    }

    /// Register a callback for `region` using the observer defaults.
    pub fn observe(&self, region: RegionId, callback: impl Fn() + 'static) {
        let defaults = self.inner.borrow().defaults;
        self.observe_with(region, defaults, callback);
    }

    /// Register a callback for `region` with explicit options.
    ///
    /// Re-observing an already-registered region replaces its callback and
    /// options in place (last write wins) and re-arms its crossing state.
    /// If the region is already past the threshold, the callback fires
    /// synchronously before this returns. Observing on a disconnected
    /// observer is a no-op.
    pub fn observe_with(
        &self,
        region: RegionId,
        options: ObserverOptions,
        callback: impl Fn() + 'static,
    ) {
        enum Mode {
            Watching,
            Detached(Rc<dyn Fn()>),
            Dead,
        }

        let mode = {
            let mut state = self.inner.borrow_mut();
            if !state.connected {
                Mode::Dead
            } else if state.viewport.is_none() {
                Mode::Detached(Rc::new(callback))
            } else {
                let entry = ObserveEntry {
                    region,
                    options,
                    was_past: false,
                    callback: Rc::new(callback),
                };
                match state.entries.iter_mut().find(|e| e.region == region) {
                    Some(existing) => *existing = entry,
                    None => state.entries.push(entry),
                }
                Mode::Watching
            }
        };

        match mode {
            Mode::Watching => {
                // Already-visible regions fire right away.
                if let Some(cb) = self.evaluate_entry(region) {
                    cb();
                }
            }
            Mode::Detached(cb) => cb(),
            Mode::Dead => log::debug!("observe on disconnected observer ignored"),
        }
    }

    /// Remove the registration for `region`. Unknown regions are a no-op.
    pub fn unobserve(&self, region: RegionId) {
        self.inner
            .borrow_mut()
            .entries
            .retain(|e| e.region != region);
    }

    /// Whether `region` currently has a registration.
    pub fn is_observing(&self, region: RegionId) -> bool {
        self.inner
            .borrow()
            .entries
            .iter()
            .any(|e| e.region == region)
    }

    /// Drop all registrations and stop watching the viewport. Idempotent;
    /// afterwards the observer is inert.
    pub fn disconnect(&self) {
        let cleanup = {
            let mut state = self.inner.borrow_mut();
            state.entries.clear();
            state.connected = false;
            state.viewport = None;
            state.viewport_cleanup.take()
        };
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }

    /// Evaluate every registration against the current viewport, firing
    /// callbacks for regions that crossed their threshold since the last
    /// evaluation. Registrations fire in registration order; trigger-once
    /// entries are removed before their callback runs.
    fn process_batch(&self) {
        let snapshot: Vec<RegionId> = {
            let state = self.inner.borrow();
            state.entries.iter().map(|e| e.region).collect()
        };
        for region in snapshot {
            if let Some(cb) = self.evaluate_entry(region) {
                cb();
            }
        }
    }

    /// Update one registration's crossing state. Returns its callback when
    /// it fired; the caller invokes it outside the state borrow so the
    /// callback can re-enter the observer.
    fn evaluate_entry(&self, region: RegionId) -> Option<Rc<dyn Fn()>> {
        let mut state = self.inner.borrow_mut();
        let viewport = state.viewport.clone()?;
        let entry = state.entries.iter_mut().find(|e| e.region == region)?;

        // A region removed from the viewport scores zero until it returns.
        let ratio = viewport.intersection_ratio(region, entry.options.root_margin);

        let past = entry.is_past(ratio);
        let fired = past && !entry.was_past;
        entry.was_past = past;

        if !fired {
            return None;
        }
        let callback = entry.callback.clone();
        if entry.options.trigger_once {
            state.entries.retain(|e| e.region != region);
        }
        Some(callback)
    }
}

// =============================================================================
// Tests
// =============================================================================
