//! Timers Module - One-shot timeout queue
//!
//! The queue owns the runtime clock: `tick(now)` advances it and fires due
//! entries, `next_deadline(now)` feeds the event-loop poll timeout. Handlers
//! installed with `set_timeout` run at most once; `clear_timeout` before the
//! deadline guarantees they never run.
//!
//! # Example
//!
//! ```ignore
//! use std::time::{Duration, Instant};
//! use glimmer_tui::timing::Timers;
//!
//! let timers = Timers::new(Instant::now());
//! let id = timers.set_timeout(Duration::from_millis(100), || {
//!     println!("fired");
//! });
//! timers.clear_timeout(id); // never fires
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

// =============================================================================
// TYPES
// =============================================================================

/// Identifies a scheduled timeout for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

struct TimerEntry {
    id: u64,
    deadline: Instant,
    callback: Box<dyn FnOnce()>,
}

struct TimerState {
    entries: Vec<TimerEntry>,
    next_id: u64,
    /// High-water mark of observed time. Never moves backwards.
    now: Instant,
}

// =============================================================================
// TIMERS
// =============================================================================

/// Shared one-shot timeout queue.
///
/// Cheap to clone; all clones share the same queue and clock.
#[derive(Clone)]
pub struct Timers {
    inner: Rc<RefCell<TimerState>>,
}

impl Timers {
    pub fn new(start: Instant) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TimerState {
                entries: Vec::new(),
                next_id: 0,
                now: start,
            })),
        }
    }

    /// Current runtime clock (the latest instant passed to `tick`).
    pub fn now(&self) -> Instant {
        self.inner.borrow().now
    }

    /// Schedule `callback` to run once `delay` has elapsed.
    pub fn set_timeout(&self, delay: Duration, callback: impl FnOnce() + 'static) -> TimerId {
        let mut state = self.inner.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        let deadline = state.now + delay;
        state.entries.push(TimerEntry {
            id,
            deadline,
            callback: Box::new(callback),
        });
        TimerId(id)
    }

    /// Cancel a scheduled timeout. Unknown ids are a no-op.
    pub fn clear_timeout(&self, id: TimerId) {
        self.inner.borrow_mut().entries.retain(|e| e.id != id.0);
    }

    /// Advance the clock and fire every entry whose deadline has passed.
    ///
    /// Entries fire in deadline order (insertion order on ties), one at a
    /// time: a handler that clears a later due entry prevents it from
    /// running, and a handler may schedule new timeouts freely.
    pub fn tick(&self, now: Instant) -> usize {
        {
            let mut state = self.inner.borrow_mut();
            if now > state.now {
                state.now = now;
            }
        }

        let mut fired = 0;
        loop {
            let callback = {
                let mut state = self.inner.borrow_mut();
                let now = state.now;
                let due = state
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.deadline <= now)
                    .min_by_key(|(_, e)| (e.deadline, e.id))
                    .map(|(i, _)| i);
                match due {
                    Some(i) => state.entries.remove(i).callback,
                    None => break,
                }
            };
            callback();
            fired += 1;
        }
        fired
    }

    /// Time until the earliest deadline: `Some(ZERO)` when already due,
    /// `None` when the queue is empty.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        let state = self.inner.borrow();
        let earliest = state.entries.iter().map(|e| e.deadline).min()?;
        if earliest <= now {
            return Some(Duration::ZERO);
        }
        Some(earliest - now)
    }

    /// Check if any timeouts are scheduled.
    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().entries.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
