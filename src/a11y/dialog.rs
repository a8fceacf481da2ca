//! Dialog Registry - typed dialog lifecycle events.
//!
//! Dialogs register a title and a close action, then mark themselves open
//! or closed. Lifecycle changes go out over [`DialogBus`] as typed
//! [`DialogSignal`] values, so subscribers (focus management, announcements)
//! never string-match event names. Open dialogs form a stack; the topmost
//! one is what Escape closes and Tab traps within.
//!
//! # Example
//!
//! ```ignore
//! use glimmer_tui::a11y::{DialogRegistry, DialogSignal};
//!
//! let dialogs = DialogRegistry::new();
//! let id = dialogs.register("Settings", || { /* hide the dialog UI */ });
//!
//! let cleanup = dialogs.bus().subscribe(|signal| match signal {
//!     DialogSignal::Opened(_) => println!("opened"),
//!     DialogSignal::Closed(_) => println!("closed"),
//! });
//!
//! dialogs.set_open(id);
//! assert_eq!(dialogs.open_dialog(), Some(id));
//! cleanup();
//! ```

use std::cell::RefCell;
use std::rc::Rc;

// =============================================================================
// TYPES
// =============================================================================

/// Identifies one registered dialog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DialogId(u64);

impl DialogId {
    #[cfg(test)]
    pub(crate) fn new_for_tests(raw: u64) -> Self {
        Self(raw)
    }
}

/// A dialog lifecycle event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogSignal {
    Opened(DialogId),
    Closed(DialogId),
}

type DialogListener = Rc<dyn Fn(&DialogSignal)>;

// =============================================================================
// DialogBus
// =============================================================================

struct BusState {
    listeners: Vec<(u64, DialogListener)>,
    next_id: u64,
}

/// Publish/subscribe channel for [`DialogSignal`]s.
#[derive(Clone)]
pub struct DialogBus {
    inner: Rc<RefCell<BusState>>,
}

impl DialogBus {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusState {
                listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Subscribe to all dialog signals. Returns a cleanup function.
    pub fn subscribe<F: Fn(&DialogSignal) + 'static>(&self, listener: F) -> impl FnOnce() + use<F> {
        let id = {
            let mut st = self.inner.borrow_mut();
            let id = st.next_id;
            st.next_id += 1;
            st.listeners.push((id, Rc::new(listener)));
            id
        };

        let weak = Rc::downgrade(&self.inner);
        move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .borrow_mut()
                    .listeners
                    .retain(|(existing, _)| *existing != id);
            }
        }
    }

    /// Deliver a signal to every listener in subscription order. Listeners
    /// may publish or subscribe re-entrantly.
    pub fn publish(&self, signal: &DialogSignal) {
        let listeners: Vec<DialogListener> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(signal);
        }
    }
}

impl Default for DialogBus {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// DialogRegistry
// =============================================================================

struct DialogEntry {
    id: u64,
    title: String,
    close: Rc<dyn Fn()>,
}

struct RegistryState {
    dialogs: Vec<DialogEntry>,
    /// Currently open dialogs, innermost last.
    open: Vec<u64>,
    next_id: u64,
}

/// Shared dialog registry. Clones observe the same dialogs and bus.
#[derive(Clone)]
pub struct DialogRegistry {
    inner: Rc<RefCell<RegistryState>>,
    bus: DialogBus,
}

impl DialogRegistry {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(RegistryState {
                dialogs: Vec::new(),
                open: Vec::new(),
                next_id: 0,
            })),
            bus: DialogBus::new(),
        }
    }

    /// The lifecycle event channel.
    pub fn bus(&self) -> DialogBus {
        self.bus.clone()
    }

    /// Register a dialog with its close action. The action is what Escape
    /// invokes; it should close the dialog's own UI state and then call
    /// [`DialogRegistry::set_closed`].
    pub fn register(&self, title: impl Into<String>, close: impl Fn() + 'static) -> DialogId {
        let mut st = self.inner.borrow_mut();
        let id = st.next_id;
        st.next_id += 1;
        st.dialogs.push(DialogEntry {
            id,
            title: title.into(),
            close: Rc::new(close),
        });
        DialogId(id)
    }

    /// Remove a dialog. An open dialog is closed (with the usual signal)
    /// before removal, so subscribers stay balanced.
    pub fn unregister(&self, id: DialogId) {
        if self.is_open(id) {
            self.set_closed(id);
        }
        self.inner.borrow_mut().dialogs.retain(|d| d.id != id.0);
    }

    pub fn title(&self, id: DialogId) -> Option<String> {
        self.inner
            .borrow()
            .dialogs
            .iter()
            .find(|d| d.id == id.0)
            .map(|d| d.title.clone())
    }

    pub fn is_open(&self, id: DialogId) -> bool {
        self.inner.borrow().open.contains(&id.0)
    }

    /// The topmost open dialog, if any.
    pub fn open_dialog(&self) -> Option<DialogId> {
        self.inner.borrow().open.last().copied().map(DialogId)
    }

    /// Mark a dialog open and publish [`DialogSignal::Opened`]. Opening an
    /// unknown dialog is refused; re-opening an open one is a no-op.
    pub fn set_open(&self, id: DialogId) {
        {
            let mut st = self.inner.borrow_mut();
            if !st.dialogs.iter().any(|d| d.id == id.0) {
                log::warn!("set_open for unregistered dialog {id:?}");
                return;
            }
            if st.open.contains(&id.0) {
                log::debug!("dialog {id:?} already open");
                return;
            }
            st.open.push(id.0);
        }
        self.bus.publish(&DialogSignal::Opened(id));
    }

    /// Mark a dialog closed and publish [`DialogSignal::Closed`]. Closing a
    /// dialog that is not open is a no-op.
    pub fn set_closed(&self, id: DialogId) {
        {
            let mut st = self.inner.borrow_mut();
            let Some(pos) = st.open.iter().position(|&open| open == id.0) else {
                log::debug!("dialog {id:?} is not open");
                return;
            };
            st.open.remove(pos);
        }
        self.bus.publish(&DialogSignal::Closed(id));
    }

    /// Invoke a dialog's registered close action. Returns false when the
    /// dialog is unknown.
    pub fn request_close(&self, id: DialogId) -> bool {
        let action = {
            let st = self.inner.borrow();
            st.dialogs
                .iter()
                .find(|d| d.id == id.0)
                .map(|d| Rc::clone(&d.close))
        };
        match action {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }
}

impl Default for DialogRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_close_publishes_typed_signals() {
        let dialogs = DialogRegistry::new();
        let id = dialogs.register("Settings", || {});

        let seen: Rc<RefCell<Vec<DialogSignal>>> = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let _cleanup = dialogs.bus().subscribe(move |signal| {
            log.borrow_mut().push(*signal);
        });

        dialogs.set_open(id);
        assert!(dialogs.is_open(id));
        dialogs.set_closed(id);
        assert!(!dialogs.is_open(id));

        assert_eq!(
            seen.borrow().as_slice(),
            &[DialogSignal::Opened(id), DialogSignal::Closed(id)]
        );
    }

    #[test]
    fn test_topmost_open_dialog() {
        let dialogs = DialogRegistry::new();
        let outer = dialogs.register("Outer", || {});
        let inner = dialogs.register("Inner", || {});

        assert_eq!(dialogs.open_dialog(), None);
        dialogs.set_open(outer);
        dialogs.set_open(inner);
        assert_eq!(dialogs.open_dialog(), Some(inner));

        dialogs.set_closed(inner);
        assert_eq!(dialogs.open_dialog(), Some(outer));
    }

    #[test]
    fn test_reopen_and_stray_close_are_noops() {
        let dialogs = DialogRegistry::new();
        let id = dialogs.register("Settings", || {});

        let count = Rc::new(RefCell::new(0));
        let n = count.clone();
        let _cleanup = dialogs.bus().subscribe(move |_| *n.borrow_mut() += 1);

        dialogs.set_open(id);
        dialogs.set_open(id);
        dialogs.set_closed(id);
        dialogs.set_closed(id);
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_open_unregistered_refused() {
        let dialogs = DialogRegistry::new();
        let id = dialogs.register("Settings", || {});
        dialogs.unregister(id);

        dialogs.set_open(id);
        assert_eq!(dialogs.open_dialog(), None);
    }

    #[test]
    fn test_unregister_open_dialog_closes_it() {
        let dialogs = DialogRegistry::new();
        let id = dialogs.register("Settings", || {});

        let seen: Rc<RefCell<Vec<DialogSignal>>> = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let _cleanup = dialogs.bus().subscribe(move |signal| {
            log.borrow_mut().push(*signal);
        });

        dialogs.set_open(id);
        dialogs.unregister(id);
        assert_eq!(dialogs.open_dialog(), None);
        assert_eq!(dialogs.title(id), None);
        assert_eq!(
            seen.borrow().as_slice(),
            &[DialogSignal::Opened(id), DialogSignal::Closed(id)]
        );
    }

    #[test]
    fn test_request_close_runs_registered_action() {
        let dialogs = DialogRegistry::new();
        let registry = dialogs.clone();
        let id_holder: Rc<RefCell<Option<DialogId>>> = Rc::new(RefCell::new(None));
        let slot = id_holder.clone();
        let id = dialogs.register("Settings", move || {
            if let Some(id) = *slot.borrow() {
                registry.set_closed(id);
            }
        });
        *id_holder.borrow_mut() = Some(id);

        dialogs.set_open(id);
        assert!(dialogs.request_close(id));
        assert!(!dialogs.is_open(id));

        dialogs.unregister(id);
        assert!(!dialogs.request_close(id));
    }

    #[test]
    fn test_subscribe_cleanup_stops_delivery() {
        let dialogs = DialogRegistry::new();
        let id = dialogs.register("Settings", || {});

        let count = Rc::new(RefCell::new(0));
        let n = count.clone();
        let cleanup = dialogs.bus().subscribe(move |_| *n.borrow_mut() += 1);

        dialogs.set_open(id);
        cleanup();
        dialogs.set_closed(id);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_title_lookup() {
        let dialogs = DialogRegistry::new();
        let id = dialogs.register("Contact form", || {});
        assert_eq!(dialogs.title(id), Some("Contact form".to_string()));
    }
}
