//! Live Announcer - polite status messages with timed clearing.
//!
//! Screen-reader style announcements: `announce` publishes a message on a
//! reactive signal, and a timeout wipes it after a short dwell so stale
//! status text never lingers. Re-announcing (same text or not) restarts the
//! dwell, which keeps rapid-fire updates readable.
//!
//! # Example
//!
//! ```ignore
//! use std::time::{Duration, Instant};
//! use glimmer_tui::a11y::Announcer;
//! use glimmer_tui::timing::Timers;
//!
//! let t0 = Instant::now();
//! let timers = Timers::new(t0);
//! let announcer = Announcer::new(&timers);
//!
//! announcer.announce("Saved");
//! assert_eq!(announcer.message(), "Saved");
//!
//! timers.tick(t0 + Duration::from_millis(1000));
//! assert_eq!(announcer.message(), "");
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use spark_signals::{signal, Signal};

use crate::timing::{TimerId, Timers};

/// How long a message stays up before the automatic clear.
pub const DEFAULT_CLEAR_AFTER: Duration = Duration::from_millis(1000);

struct AnnouncerState {
    message: Signal<String>,
    pending_clear: Option<TimerId>,
    clear_after: Duration,
}

/// Shared announcement channel. Clones publish to the same signal.
#[derive(Clone)]
pub struct Announcer {
    inner: Rc<RefCell<AnnouncerState>>,
    timers: Timers,
}

impl Announcer {
    pub fn new(timers: &Timers) -> Self {
        Self::with_clear_after(timers, DEFAULT_CLEAR_AFTER)
    }

    pub fn with_clear_after(timers: &Timers, clear_after: Duration) -> Self {
        Self {
            inner: Rc::new(RefCell::new(AnnouncerState {
                message: signal(String::new()),
                pending_clear: None,
                clear_after,
            })),
            timers: timers.clone(),
        }
    }

    /// Publish a message and restart the clear timer.
    pub fn announce(&self, message: impl Into<String>) {
        let (signal, delay) = {
            let mut st = self.inner.borrow_mut();
            if let Some(id) = st.pending_clear.take() {
                self.timers.clear_timeout(id);
            }
            (st.message.clone(), st.clear_after)
        };
        signal.set(message.into());

        let weak = Rc::downgrade(&self.inner);
        let id = self.timers.set_timeout(delay, move || {
            if let Some(inner) = weak.upgrade() {
                let signal = {
                    let mut st = inner.borrow_mut();
                    st.pending_clear = None;
                    st.message.clone()
                };
                signal.set(String::new());
            }
        });
        self.inner.borrow_mut().pending_clear = Some(id);
    }

    /// Wipe the current message immediately.
    pub fn clear(&self) {
        let signal = {
            let mut st = self.inner.borrow_mut();
            if let Some(id) = st.pending_clear.take() {
                self.timers.clear_timeout(id);
            }
            st.message.clone()
        };
        signal.set(String::new());
    }

    /// Current message; empty when nothing is up.
    pub fn message(&self) -> String {
        let signal = self.inner.borrow().message.clone();
        signal.get()
    }

    /// The message signal, for wiring into effects or rendering.
    pub fn message_signal(&self) -> Signal<String> {
        self.inner.borrow().message.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
