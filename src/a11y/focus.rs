//! Focus Ring - explicit registry of focusable controls.
//!
//! Terminals have no DOM to query for `button, [href], input...`, so
//! focusability is declared: every control registers a [`FocusEntry`] and
//! receives a [`ControlId`]. Navigation walks the ring in (tab index,
//! registration order), optionally restricted to one dialog's descendants.
//!
//! A focus stack backs dialog save/restore: opening a dialog pushes the
//! current focus, closing pops it. Each frame restores independently, so
//! nested dialogs unwind correctly instead of sharing a single saved slot.
//!
//! # Example
//!
//! ```ignore
//! use glimmer_tui::a11y::{FocusEntry, FocusRing};
//!
//! let ring = FocusRing::new();
//! let ok = ring.register(FocusEntry::new("OK"));
//! let cancel = ring.register(FocusEntry::new("Cancel"));
//!
//! ring.focus(ok);
//! ring.focus_next(FocusScope::Ring);
//! assert_eq!(ring.focused(), Some(cancel));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use spark_signals::{peek, signal, Signal};

use super::dialog::DialogId;

// =============================================================================
// TYPES
// =============================================================================

bitflags::bitflags! {
    /// Roles a focusable control can carry, so the global key handler can
    /// find special controls without holding direct references.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EntryFlags: u8 {
        const NONE = 0;
        /// Activating this control closes its dialog.
        const CLOSE_CONTROL = 1 << 0;
        /// The skip-to-content link.
        const SKIP_LINK = 1 << 1;
        /// The dialog's root control (usually its heading).
        const DIALOG_ROOT = 1 << 2;
    }
}

/// Identifies one registered control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(u64);

/// Declaration of one focusable control.
#[derive(Clone, Debug, PartialEq)]
pub struct FocusEntry {
    /// Human-readable name, used for announcements and debugging.
    pub label: String,
    /// Lower tab indices come first; ties keep registration order.
    pub tab_index: i32,
    /// Dialog this control belongs to, if any.
    pub container: Option<DialogId>,
    pub flags: EntryFlags,
}

impl FocusEntry {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tab_index: 0,
            container: None,
            flags: EntryFlags::NONE,
        }
    }

    pub fn with_tab_index(mut self, tab_index: i32) -> Self {
        self.tab_index = tab_index;
        self
    }

    pub fn in_container(mut self, dialog: DialogId) -> Self {
        self.container = Some(dialog);
        self
    }

    pub fn with_flags(mut self, flags: EntryFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Which part of the ring navigation moves over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusScope {
    /// Every visible control.
    Ring,
    /// Only controls registered to one dialog.
    Within(DialogId),
}

impl FocusScope {
    fn admits(self, entry: &FocusEntry) -> bool {
        match self {
            FocusScope::Ring => true,
            FocusScope::Within(dialog) => entry.container == Some(dialog),
        }
    }
}

// =============================================================================
// STATE
// =============================================================================

struct Control {
    id: u64,
    entry: FocusEntry,
    visible: bool,
}

type FocusCallback = Rc<dyn Fn(bool)>;

struct RingState {
    controls: Vec<Control>,
    callbacks: HashMap<u64, Vec<(u64, FocusCallback)>>,
    /// Saved focus frames, one per push.
    stack: Vec<Option<ControlId>>,
    next_id: u64,
}

impl RingState {
    fn control(&self, id: ControlId) -> Option<&Control> {
        self.controls.iter().find(|c| c.id == id.0)
    }

    fn is_focusable(&self, id: ControlId) -> bool {
        self.control(id).is_some_and(|c| c.visible)
    }

    /// Visible controls in (tab_index, registration) order.
    fn ordered(&self, scope: FocusScope) -> Vec<ControlId> {
        let mut ids: Vec<(i32, u64)> = self
            .controls
            .iter()
            .filter(|c| c.visible && scope.admits(&c.entry))
            .map(|c| (c.entry.tab_index, c.id))
            .collect();
        ids.sort_unstable();
        ids.into_iter().map(|(_, id)| ControlId(id)).collect()
    }

    fn callbacks_for(&self, id: ControlId) -> Vec<FocusCallback> {
        self.callbacks
            .get(&id.0)
            .map(|cbs| cbs.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default()
    }
}

// =============================================================================
// FocusRing
// =============================================================================

/// Shared focus registry. Clones observe the same ring.
#[derive(Clone)]
pub struct FocusRing {
    inner: Rc<RefCell<RingState>>,
    focused: Signal<Option<ControlId>>,
}

impl FocusRing {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(RingState {
                controls: Vec::new(),
                callbacks: HashMap::new(),
                stack: Vec::new(),
                next_id: 0,
            })),
            focused: signal(None),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    pub fn register(&self, entry: FocusEntry) -> ControlId {
        let mut st = self.inner.borrow_mut();
        let id = st.next_id;
        st.next_id += 1;
        st.controls.push(Control {
            id,
            entry,
            visible: true,
        });
        ControlId(id)
    }

    /// Remove a control. If it was focused, focus clears first so its blur
    /// callbacks still see the control as registered.
    pub fn unregister(&self, id: ControlId) {
        if peek(|| self.focused.get()) == Some(id) {
            self.set_focus(None);
        }
        let mut st = self.inner.borrow_mut();
        st.controls.retain(|c| c.id != id.0);
        st.callbacks.remove(&id.0);
    }

    pub fn is_registered(&self, id: ControlId) -> bool {
        self.inner.borrow().control(id).is_some()
    }

    pub fn entry(&self, id: ControlId) -> Option<FocusEntry> {
        self.inner.borrow().control(id).map(|c| c.entry.clone())
    }

    /// Hidden controls are skipped by navigation; hiding the focused control
    /// blurs it.
    pub fn set_visible(&self, id: ControlId, visible: bool) {
        {
            let mut st = self.inner.borrow_mut();
            let Some(control) = st.controls.iter_mut().find(|c| c.id == id.0) else {
                return;
            };
            control.visible = visible;
        }
        if !visible && peek(|| self.focused.get()) == Some(id) {
            self.set_focus(None);
        }
    }

    pub fn is_visible(&self, id: ControlId) -> bool {
        self.inner.borrow().is_focusable(id)
    }

    /// First visible control carrying the given flag.
    pub fn find_flagged(&self, flags: EntryFlags, scope: FocusScope) -> Option<ControlId> {
        let st = self.inner.borrow();
        st.ordered(scope)
            .into_iter()
            .find(|&id| st.control(id).is_some_and(|c| c.entry.flags.contains(flags)))
    }

    // =========================================================================
    // Focus
    // =========================================================================

    pub fn focused(&self) -> Option<ControlId> {
        self.focused.get()
    }

    pub fn focused_signal(&self) -> Signal<Option<ControlId>> {
        self.focused.clone()
    }

    /// Focus a control. Returns false for unknown or hidden controls.
    pub fn focus(&self, id: ControlId) -> bool {
        if !self.inner.borrow().is_focusable(id) {
            log::debug!("focus refused for unknown or hidden control {id:?}");
            return false;
        }
        self.set_focus(Some(id));
        true
    }

    pub fn blur(&self) {
        self.set_focus(None);
    }

    fn set_focus(&self, target: Option<ControlId>) {
        let previous = peek(|| self.focused.get());
        if previous == target {
            return;
        }

        let (lost, gained) = {
            let st = self.inner.borrow();
            (
                previous.map(|id| st.callbacks_for(id)).unwrap_or_default(),
                target.map(|id| st.callbacks_for(id)).unwrap_or_default(),
            )
        };

        self.focused.set(target);
        for cb in lost {
            cb(false);
        }
        for cb in gained {
            cb(true);
        }
    }

    /// Per-control focus/blur notification. The callback receives true on
    /// gain and false on loss.
    pub fn on_focus_change<F: Fn(bool) + 'static>(
        &self,
        id: ControlId,
        callback: F,
    ) -> impl FnOnce() + use<F> {
        let cb_id = {
            let mut st = self.inner.borrow_mut();
            let cb_id = st.next_id;
            st.next_id += 1;
            st.callbacks
                .entry(id.0)
                .or_default()
                .push((cb_id, Rc::new(callback)));
            cb_id
        };

        let weak = Rc::downgrade(&self.inner);
        move || {
            if let Some(inner) = weak.upgrade() {
                let mut st = inner.borrow_mut();
                if let Some(cbs) = st.callbacks.get_mut(&id.0) {
                    cbs.retain(|(existing, _)| *existing != cb_id);
                    if cbs.is_empty() {
                        st.callbacks.remove(&id.0);
                    }
                }
            }
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Visible controls in tab order, optionally restricted to a dialog.
    pub fn ordered(&self, scope: FocusScope) -> Vec<ControlId> {
        self.inner.borrow().ordered(scope)
    }

    pub fn focus_first(&self, scope: FocusScope) -> bool {
        let first = self.inner.borrow().ordered(scope).first().copied();
        match first {
            Some(id) => self.focus(id),
            None => false,
        }
    }

    pub fn focus_last(&self, scope: FocusScope) -> bool {
        let last = self.inner.borrow().ordered(scope).last().copied();
        match last {
            Some(id) => self.focus(id),
            None => false,
        }
    }

    /// Advance within the scope, wrapping past the end. When nothing in the
    /// scope is focused, starts at the first control.
    pub fn focus_next(&self, scope: FocusScope) -> bool {
        self.advance(scope, 1)
    }

    /// Step back within the scope, wrapping past the start. When nothing in
    /// the scope is focused, starts at the last control.
    pub fn focus_previous(&self, scope: FocusScope) -> bool {
        self.advance(scope, -1)
    }

    fn advance(&self, scope: FocusScope, direction: isize) -> bool {
        let target = {
            let st = self.inner.borrow();
            let order = st.ordered(scope);
            if order.is_empty() {
                return false;
            }
            let len = order.len() as isize;
            let current = peek(|| self.focused.get())
                .and_then(|id| order.iter().position(|&o| o == id));
            match current {
                Some(pos) => order[(pos as isize + direction).rem_euclid(len) as usize],
                None if direction > 0 => order[0],
                None => order[(len - 1) as usize],
            }
        };
        self.focus(target)
    }

    // =========================================================================
    // Focus stack
    // =========================================================================

    /// Save the current focus. Paired with [`FocusRing::pop_focus`] around a
    /// dialog's lifetime.
    pub fn push_focus(&self) {
        let current = peek(|| self.focused.get());
        self.inner.borrow_mut().stack.push(current);
    }

    /// Restore the most recently saved focus. A saved control that has been
    /// unregistered or hidden in the meantime cannot take focus back, so
    /// focus clears instead.
    pub fn pop_focus(&self) {
        let frame = self.inner.borrow_mut().stack.pop();
        match frame {
            None => {
                log::debug!("pop_focus on empty stack ignored");
            }
            Some(Some(id)) if self.inner.borrow().is_focusable(id) => {
                self.set_focus(Some(id));
            }
            Some(_) => self.set_focus(None),
        }
    }

    pub fn stack_depth(&self) -> usize {
        self.inner.borrow().stack.len()
    }
}

impl Default for FocusRing {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
