//! FrameClock Module - Frame-synchronized callbacks
//!
//! The terminal counterpart of an animation-frame scheduler. Consumers
//! request a callback for the next frame and get an id they can cancel with.
//! Frames run at a fixed cadence (16ms by default) and never overlap:
//! `run_if_due` executes at most one frame, and requests made from inside a
//! frame callback land in the frame after it.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Identifies a pending frame request for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

/// Callback invoked with the frame timestamp.
pub type FrameCallback = Box<dyn FnOnce(Instant)>;

struct FrameState {
    interval: Duration,
    last_frame: Option<Instant>,
    /// Requests waiting for the next frame.
    pending: Vec<(u64, FrameCallback)>,
    /// The batch currently being executed. Slots are taken one at a time so
    /// a callback can cancel a later request in the same frame.
    in_flight: Vec<(u64, Option<FrameCallback>)>,
    next_id: u64,
}

/// Shared frame scheduler.
///
/// Cheap to clone; all clones share the same queue.
#[derive(Clone)]
pub struct FrameClock {
    inner: Rc<RefCell<FrameState>>,
}

impl FrameClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            inner: Rc::new(RefCell::new(FrameState {
                interval,
                last_frame: None,
                pending: Vec::new(),
                in_flight: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Request a callback on the next frame.
    pub fn request(&self, callback: impl FnOnce(Instant) + 'static) -> FrameId {
        let mut state = self.inner.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.pending.push((id, Box::new(callback)));
        FrameId(id)
    }

    /// Cancel a pending request. After this returns the callback will not
    /// run, even when cancelled from another callback in the same frame.
    /// Unknown ids are a no-op.
    pub fn cancel(&self, id: FrameId) {
        let mut state = self.inner.borrow_mut();
        state.pending.retain(|(i, _)| *i != id.0);
        for slot in state.in_flight.iter_mut() {
            if slot.0 == id.0 {
                slot.1 = None;
            }
        }
    }

    /// Run one frame if the cadence allows and requests are waiting.
    ///
    /// Returns true when a frame ran. All callbacks requested before the
    /// frame receive the same timestamp; requests made during the frame are
    /// deferred to the next one.
    pub fn run_if_due(&self, now: Instant) -> bool {
        {
            let mut state = self.inner.borrow_mut();
            if state.pending.is_empty() {
                return false;
            }
            if let Some(last) = state.last_frame {
                if now < last + state.interval {
                    return false;
                }
            }
            state.last_frame = Some(now);
            let batch = std::mem::take(&mut state.pending);
            state.in_flight = batch.into_iter().map(|(id, cb)| (id, Some(cb))).collect();
        }

        let mut index = 0;
        loop {
            let callback = {
                let mut state = self.inner.borrow_mut();
                if index >= state.in_flight.len() {
                    state.in_flight.clear();
                    break;
                }
                let slot = state.in_flight[index].1.take();
                index += 1;
                slot
            };
            if let Some(cb) = callback {
                cb(now);
            }
        }
        true
    }

    /// Time until the next frame may run: `Some(ZERO)` when already due,
    /// `None` when nothing is requested.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        let state = self.inner.borrow();
        if state.pending.is_empty() {
            return None;
        }
        match state.last_frame {
            Some(last) => {
                let due_at = last + state.interval;
                if due_at <= now {
                    Some(Duration::ZERO)
                } else {
                    Some(due_at - now)
                }
            }
            None => Some(Duration::ZERO),
        }
    }

    /// Check if any frame requests are waiting.
    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().pending.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn setup() -> (FrameClock, Instant) {
        (FrameClock::new(Duration::from_millis(16)), Instant::now())
    }

    #[test]
    fn test_request_runs_with_timestamp() {
        let (clock, t0) = setup();
        let seen = Rc::new(RefCell::new(None));

        let s = seen.clone();
        clock.request(move |ts| *s.borrow_mut() = Some(ts));

        assert!(clock.run_if_due(t0));
        assert_eq!(*seen.borrow(), Some(t0));
    }

    #[test]
    fn test_no_frame_without_requests() {
        let (clock, t0) = setup();
        assert!(!clock.run_if_due(t0));
        assert!(clock.next_deadline(t0).is_none());
    }

    #[test]
    fn test_cadence_spaces_frames() {
        let (clock, t0) = setup();
        let count = Rc::new(Cell::new(0));

        let c = count.clone();
        clock.request(move |_| c.set(c.get() + 1));
        assert!(clock.run_if_due(t0));

        let c = count.clone();
        clock.request(move |_| c.set(c.get() + 1));

        // Too soon: the second frame waits for the interval boundary.
        assert!(!clock.run_if_due(t0 + Duration::from_millis(5)));
        assert_eq!(count.get(), 1);

        assert!(clock.run_if_due(t0 + Duration::from_millis(16)));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_request_during_frame_lands_next_frame() {
        let (clock, t0) = setup();
        let count = Rc::new(Cell::new(0));

        let inner_clock = clock.clone();
        let c = count.clone();
        clock.request(move |_| {
            c.set(c.get() + 1);
            let c2 = c.clone();
            inner_clock.request(move |_| c2.set(c2.get() + 1));
        });

        assert!(clock.run_if_due(t0));
        assert_eq!(count.get(), 1, "nested request must not run in same frame");
        assert!(clock.has_pending());

        assert!(clock.run_if_due(t0 + Duration::from_millis(16)));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_cancel_prevents_run() {
        let (clock, t0) = setup();
        let count = Rc::new(Cell::new(0));

        let c = count.clone();
        let id = clock.request(move |_| c.set(c.get() + 1));
        clock.cancel(id);

        assert!(!clock.run_if_due(t0));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_cancel_from_earlier_callback_in_same_frame() {
        let (clock, t0) = setup();
        let count = Rc::new(Cell::new(0));

        let c = count.clone();
        let victim_cell: Rc<Cell<Option<FrameId>>> = Rc::new(Cell::new(None));

        let inner_clock = clock.clone();
        let vc = victim_cell.clone();
        clock.request(move |_| {
            if let Some(id) = vc.get() {
                inner_clock.cancel(id);
            }
        });
        let victim = clock.request(move |_| c.set(c.get() + 1));
        victim_cell.set(Some(victim));

        assert!(clock.run_if_due(t0));
        assert_eq!(count.get(), 0, "cancelled callback must not run");
    }

    #[test]
    fn test_callbacks_share_one_timestamp() {
        let (clock, t0) = setup();
        let stamps = Rc::new(RefCell::new(Vec::new()));

        for _ in 0..3 {
            let s = stamps.clone();
            clock.request(move |ts| s.borrow_mut().push(ts));
        }
        let later = t0 + Duration::from_millis(40);
        assert!(clock.run_if_due(later));

        let stamps = stamps.borrow();
        assert_eq!(stamps.len(), 3);
        assert!(stamps.iter().all(|&ts| ts == later));
    }

    #[test]
    fn test_next_deadline_respects_cadence() {
        let (clock, t0) = setup();
        clock.request(|_| {});
        // First frame is immediately due.
        assert_eq!(clock.next_deadline(t0), Some(Duration::ZERO));

        assert!(clock.run_if_due(t0));
        clock.request(|_| {});
        assert_eq!(
            clock.next_deadline(t0 + Duration::from_millis(6)),
            Some(Duration::from_millis(10))
        );
    }
}
