//! Limiter Module - Throttle and debounce
//!
//! Call-rate limiting in two layers. `Throttle` and `Debounce` are pure
//! state machines driven by explicit instants, so their edge behavior is
//! testable without a clock. `Throttled` and `Debounced` bind a state
//! machine and a callback to a [`Timers`] queue, giving the familiar
//! fire-and-forget wrappers used by resize and pointer handlers.
//!
//! Throttling runs the leading edge immediately and guarantees a trailing
//! run with the most recent arguments, never more than one run per
//! interval. Debouncing waits for a full quiet window and runs only the
//! last call of a burst.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use super::timers::{TimerId, Timers};

// =============================================================================
// STATE MACHINES
// =============================================================================

/// Throttle state machine: at most one run per interval, leading + trailing.
#[derive(Debug)]
pub struct Throttle<T> {
    interval: Duration,
    last_run: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            pending: None,
        }
    }

    /// Offer a value. Returns it back when the leading edge may run now;
    /// otherwise the value is parked for the trailing run, replacing any
    /// previously parked value.
    pub fn offer(&mut self, value: T, now: Instant) -> Option<T> {
        let open = match self.last_run {
            Some(last) => now.duration_since(last) >= self.interval,
            None => true,
        };
        if open && self.pending.is_none() {
            self.last_run = Some(now);
            return Some(value);
        }
        self.pending = Some(value);
        None
    }

    /// Take the parked value once the interval boundary has been reached.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }
        self.last_run = Some(now);
        self.pending.take()
    }

    /// When the parked trailing value becomes runnable, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        self.last_run.map(|last| last + self.interval)
    }
}

/// Debounce state machine: runs only after a full quiet window.
#[derive(Debug)]
pub struct Debounce<T> {
    delay: Duration,
    parked: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            parked: None,
        }
    }

    /// Park a value and restart the quiet window.
    pub fn offer(&mut self, value: T, now: Instant) {
        self.parked = Some((value, now + self.delay));
    }

    /// Take the parked value once the quiet window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.parked {
            Some((_, deadline)) if *deadline <= now => self.parked.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// When the parked value becomes runnable, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.parked.as_ref().map(|(_, d)| *d)
    }
}

// =============================================================================
// TIMER-BOUND WRAPPERS
// =============================================================================

struct BoundState<T> {
    machine: Throttle<T>,
    callback: Rc<dyn Fn(T)>,
    scheduled: Option<TimerId>,
}

/// A callback wrapped in a [`Throttle`], scheduled through a [`Timers`]
/// queue. Dropping the wrapper cancels any pending trailing run.
pub struct Throttled<T> {
    state: Rc<RefCell<BoundState<T>>>,
    timers: Timers,
}

impl<T: 'static> Throttled<T> {
    pub fn new(timers: &Timers, interval: Duration, callback: impl Fn(T) + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(BoundState {
                machine: Throttle::new(interval),
                callback: Rc::new(callback),
                scheduled: None,
            })),
            timers: timers.clone(),
        }
    }

    /// Invoke the callback, rate-limited. Leading calls run synchronously;
    /// the trailing run is scheduled on the timer queue.
    pub fn call(&self, value: T) {
        let now = self.timers.now();
        let immediate = {
            let mut state = self.state.borrow_mut();
            match state.machine.offer(value, now) {
                Some(v) => Some((v, state.callback.clone())),
                None => {
                    if state.scheduled.is_none() {
                        let deadline = state
                            .machine
                            .deadline()
                            .map(|d| d.saturating_duration_since(now))
                            .unwrap_or(Duration::ZERO);
                        let weak = Rc::downgrade(&self.state);
                        let timers = self.timers.clone();
                        state.scheduled =
                            Some(self.timers.set_timeout(deadline, move || {
                                trailing_run(&weak, &timers);
                            }));
                    }
                    None
                }
            }
        };
        if let Some((v, cb)) = immediate {
            cb(v);
        }
    }
}

fn trailing_run<T>(weak: &Weak<RefCell<BoundState<T>>>, timers: &Timers) {
    let Some(state) = weak.upgrade() else {
        return;
    };
    let run = {
        let mut state = state.borrow_mut();
        state.scheduled = None;
        state
            .machine
            .poll(timers.now())
            .map(|v| (v, state.callback.clone()))
    };
    if let Some((v, cb)) = run {
        cb(v);
    }
}

impl<T> Drop for Throttled<T> {
    fn drop(&mut self) {
        if let Some(id) = self.state.borrow_mut().scheduled.take() {
            self.timers.clear_timeout(id);
        }
    }
}

struct DebouncedState<T> {
    machine: Debounce<T>,
    callback: Rc<dyn Fn(T)>,
    scheduled: Option<TimerId>,
}

/// A callback wrapped in a [`Debounce`], scheduled through a [`Timers`]
/// queue. Dropping the wrapper cancels any pending run.
pub struct Debounced<T> {
    state: Rc<RefCell<DebouncedState<T>>>,
    timers: Timers,
    delay: Duration,
}

impl<T: 'static> Debounced<T> {
    pub fn new(timers: &Timers, delay: Duration, callback: impl Fn(T) + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(DebouncedState {
                machine: Debounce::new(delay),
                callback: Rc::new(callback),
                scheduled: None,
            })),
            timers: timers.clone(),
            delay,
        }
    }

    /// Park the value and restart the quiet window.
    pub fn call(&self, value: T) {
        let mut state = self.state.borrow_mut();
        state.machine.offer(value, self.timers.now());
        if let Some(id) = state.scheduled.take() {
            self.timers.clear_timeout(id);
        }
        let weak = Rc::downgrade(&self.state);
        let timers = self.timers.clone();
        state.scheduled = Some(self.timers.set_timeout(self.delay, move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let run = {
                let mut state = state.borrow_mut();
                state.scheduled = None;
                state
                    .machine
                    .poll(timers.now())
                    .map(|v| (v, state.callback.clone()))
            };
            if let Some((v, cb)) = run {
                cb(v);
            }
        }));
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        if let Some(id) = self.state.borrow_mut().scheduled.take() {
            self.timers.clear_timeout(id);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
