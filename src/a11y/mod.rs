//! Accessibility Module - Focus, dialogs, announcements, contrast
//!
//! The pieces that make a page navigable without a pointer:
//!
//! - **Focus ring** - explicit registry of focusable controls with a
//!   save/restore stack
//! - **Dialog registry** - typed open/close lifecycle on a publish/subscribe
//!   bus
//! - **Announcer** - a live status region with timed clearing
//! - **Contrast** - WCAG ratio checks for color pairs
//!
//! [`Accessibility::install`] wires them to a runtime once at startup: it
//! registers the skip link, takes over Escape and Tab, and follows dialog
//! lifecycle signals with focus moves and announcements. The returned handle
//! unwinds all of it.
//!
//! # Example
//!
//! ```ignore
//! use glimmer_tui::a11y::{Accessibility, AccessibilityOptions};
//! use glimmer_tui::runtime::Runtime;
//!
//! let runtime = Runtime::default();
//! let main = runtime.viewport().insert_region(/* main content rect */);
//!
//! let a11y = Accessibility::install(&runtime, AccessibilityOptions {
//!     main_region: Some(main),
//!     ..AccessibilityOptions::default()
//! });
//! // Escape, Tab and the skip link now work; drop `a11y` to uninstall.
//! ```

use spark_signals::{signal, Signal};

use crate::runtime::Runtime;
use crate::types::KeyState;
use crate::viewport::RegionId;

mod announcer;
pub mod contrast;
mod dialog;
mod focus;

pub use announcer::*;
pub use dialog::*;
pub use focus::*;

// =============================================================================
// CONSTANTS
// =============================================================================

/// The skip link sorts ahead of every application control.
const SKIP_LINK_TAB_INDEX: i32 = i32::MIN;

/// Default label for the skip link.
pub const SKIP_LINK_LABEL: &str = "Skip to main content";

// =============================================================================
// OPTIONS
// =============================================================================

/// Configuration for [`Accessibility::install`].
#[derive(Clone, Debug)]
pub struct AccessibilityOptions {
    /// Label announced for the skip link.
    pub skip_link_label: String,
    /// Region the skip link scrolls to. Without one, Enter on the skip link
    /// only moves focus on.
    pub main_region: Option<RegionId>,
}

impl Default for AccessibilityOptions {
    fn default() -> Self {
        Self {
            skip_link_label: SKIP_LINK_LABEL.to_string(),
            main_region: None,
        }
    }
}

// =============================================================================
// INSTALL
// =============================================================================

/// Entry point for wiring the accessibility layer to a runtime.
pub struct Accessibility;

impl Accessibility {
    /// Install the skip link, global key handling and dialog-lifecycle
    /// reactions. Call once at startup; the handle removes everything.
    pub fn install(runtime: &Runtime, options: AccessibilityOptions) -> AccessibilityHandle {
        let ring = runtime.focus();
        let dialogs = runtime.dialogs();
        let announcer = runtime.announcer();
        let viewport = runtime.viewport();

        // Skip link first: it must be the first Tab stop on the page. It is
        // rendered only while focused, which the signal below tracks.
        let skip_id = ring.register(
            FocusEntry::new(options.skip_link_label.clone())
                .with_tab_index(SKIP_LINK_TAB_INDEX)
                .with_flags(EntryFlags::SKIP_LINK),
        );
        let skip_visible = signal(false);
        let visible = skip_visible.clone();
        let skip_cleanup = ring.on_focus_change(skip_id, move |gained| {
            visible.set(gained);
        });

        // Global keys: Enter activates the skip link, Escape closes the
        // topmost dialog, Tab walks the ring (trapped inside an open dialog).
        let key_ring = ring.clone();
        let key_dialogs = dialogs.clone();
        let key_cleanup = runtime.on_key_capture(move |event| {
            if event.state == KeyState::Release {
                return false;
            }
            match event.key.as_str() {
                "Enter" if key_ring.focused() == Some(skip_id) => {
                    if let Some(region) = options.main_region {
                        viewport.scroll_to_region(region);
                    }
                    key_ring.blur();
                    true
                }
                "Escape" => match key_dialogs.open_dialog() {
                    Some(top) => {
                        key_dialogs.request_close(top);
                        true
                    }
                    None => false,
                },
                "Tab" => {
                    let scope = match key_dialogs.open_dialog() {
                        Some(top) => FocusScope::Within(top),
                        None => FocusScope::Ring,
                    };
                    if event.modifiers.shift {
                        key_ring.focus_previous(scope);
                    } else {
                        key_ring.focus_next(scope);
                    }
                    true
                }
                _ => false,
            }
        });

        // Dialog lifecycle: save focus and move it into the dialog on open,
        // restore and announce on close.
        let bus_ring = ring.clone();
        let bus_dialogs = dialogs.clone();
        let bus_announcer = announcer.clone();
        let bus_cleanup = dialogs.bus().subscribe(move |signal| match *signal {
            DialogSignal::Opened(id) => {
                bus_ring.push_focus();
                bus_ring.focus_first(FocusScope::Within(id));
                let title = bus_dialogs.title(id).unwrap_or_default();
                bus_announcer.announce(format!("Dialog opened: {title}"));
            }
            DialogSignal::Closed(_) => {
                bus_ring.pop_focus();
                bus_announcer.announce("Dialog closed");
            }
        });

        log::debug!("accessibility layer installed");

        AccessibilityHandle {
            ring,
            skip_id,
            skip_visible,
            cleanups: vec![
                Box::new(skip_cleanup),
                Box::new(key_cleanup),
                Box::new(bus_cleanup),
            ],
        }
    }
}

/// Keeps the accessibility layer alive; uninstalls on drop.
pub struct AccessibilityHandle {
    ring: FocusRing,
    skip_id: ControlId,
    skip_visible: Signal<bool>,
    cleanups: Vec<Box<dyn FnOnce()>>,
}

impl AccessibilityHandle {
    /// The skip link's control id.
    pub fn skip_link(&self) -> ControlId {
        self.skip_id
    }

    /// True while the skip link has focus (the only time it is rendered).
    pub fn skip_link_visible(&self) -> bool {
        self.skip_visible.get()
    }

    pub fn skip_link_visible_signal(&self) -> Signal<bool> {
        self.skip_visible.clone()
    }

    /// Remove the key handler, bus subscription and skip link now.
    pub fn uninstall(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.cleanups.is_empty() {
            return;
        }
        for cleanup in self.cleanups.drain(..) {
            cleanup();
        }
        self.ring.unregister(self.skip_id);
        log::debug!("accessibility layer removed");
    }
}

impl Drop for AccessibilityHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

// =============================================================================
// Tests
// =============================================================================
