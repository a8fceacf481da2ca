//! Viewport Module - Document geometry and scroll state
//!
//! The viewport is the crate's stand-in for a browser window over a long
//! page: a terminal-sized window (cols x rows) sliding over a taller
//! document. Applications register page regions as document-space rects;
//! the visibility observer and reveal triggers read their intersection with
//! the visible window.
//!
//! - **Size / scroll** - clamped scrolling over the document height
//! - **Regions** - id-keyed rects for page sections
//! - **Change feed** - ordered listeners for scroll/resize/layout
//! - **Derived reads** - scroll progress, parallax offsets, narrow check
//!
//! # Example
//!
//! ```ignore
//! use glimmer_tui::types::Rect;
//! use glimmer_tui::viewport::Viewport;
//!
//! let viewport = Viewport::new(80, 24);
//! viewport.set_doc_height(200.0);
//! let hero = viewport.insert_region(Rect::new(0.0, 0.0, 80.0, 30.0));
//!
//! let cleanup = viewport.on_change(|change| {
//!     // react to scroll/resize
//! });
//! viewport.scroll_by(3.0);
//! cleanup();
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

use crate::types::Rect;

mod observer;
mod reveal;

pub use observer::*;
pub use reveal::*;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Width below which the viewport counts as narrow (small-screen policy).
pub const NARROW_BREAKPOINT: u16 = 80;

/// Default scroll amount for arrow keys (lines).
pub const LINE_SCROLL: f32 = 1.0;

/// Default scroll amount for mouse wheel.
pub const WHEEL_SCROLL: f32 = 3.0;

/// Default scroll amount for Page Up/Down (fraction of viewport).
pub const PAGE_SCROLL_FACTOR: f32 = 0.9;

// =============================================================================
// TYPES
// =============================================================================

/// Identifies a registered page region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegionId(u64);

/// A change to the viewport, delivered to `on_change` listeners in
/// registration order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewportChange {
    /// The scroll offset moved.
    Scroll { offset: f32 },
    /// The terminal was resized.
    Resize { cols: u16, rows: u16 },
    /// Region geometry or document height changed.
    Layout,
}

type ChangeListener = Rc<dyn Fn(&ViewportChange)>;

struct ViewportState {
    cols: u16,
    rows: u16,
    scroll_y: f32,
    doc_height: f32,
    narrow_breakpoint: u16,
    regions: Vec<(u64, Rect)>,
    listeners: Vec<(u64, ChangeListener)>,
    next_region_id: u64,
    next_listener_id: u64,
}

impl ViewportState {
    fn max_scroll(&self) -> f32 {
        (self.doc_height - self.rows as f32).max(0.0)
    }

    fn clamp_scroll(&mut self) -> bool {
        let clamped = self.scroll_y.clamp(0.0, self.max_scroll());
        if clamped != self.scroll_y {
            self.scroll_y = clamped;
            return true;
        }
        false
    }
}

// =============================================================================
// VIEWPORT
// =============================================================================

/// Shared viewport service.
///
/// Cheap to clone; all clones share the same state. Scroll offset and size
/// are mirrored into signals for reactive consumers.
#[derive(Clone)]
pub struct Viewport {
    inner: Rc<RefCell<ViewportState>>,
    scroll_signal: Signal<f32>,
    size_signal: Signal<(u16, u16)>,
}

impl Viewport {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ViewportState {
                cols,
                rows,
                scroll_y: 0.0,
                doc_height: rows as f32,
                narrow_breakpoint: NARROW_BREAKPOINT,
                regions: Vec::new(),
                listeners: Vec::new(),
                next_region_id: 0,
                next_listener_id: 0,
            })),
            scroll_signal: signal(0.0),
            size_signal: signal((cols, rows)),
        }
    }

    /// Override the narrow-viewport breakpoint (columns).
    pub fn set_narrow_breakpoint(&self, cols: u16) {
        self.inner.borrow_mut().narrow_breakpoint = cols;
    }

    // =========================================================================
    // SIZE / DOCUMENT
    // =========================================================================

    /// Current viewport size as (cols, rows).
    pub fn size(&self) -> (u16, u16) {
        let state = self.inner.borrow();
        (state.cols, state.rows)
    }

    /// Reactive mirror of the viewport size.
    pub fn size_signal(&self) -> Signal<(u16, u16)> {
        self.size_signal.clone()
    }

    /// Resize the viewport. Scroll is re-clamped to the new window.
    pub fn set_size(&self, cols: u16, rows: u16) {
        let scroll_after = {
            let mut state = self.inner.borrow_mut();
            if state.cols == cols && state.rows == rows {
                return;
            }
            state.cols = cols;
            state.rows = rows;
            state.clamp_scroll().then_some(state.scroll_y)
        };
        self.size_signal.set((cols, rows));
        if let Some(offset) = scroll_after {
            self.scroll_signal.set(offset);
        }
        self.publish(ViewportChange::Resize { cols, rows });
    }

    /// Total document height in rows.
    pub fn doc_height(&self) -> f32 {
        self.inner.borrow().doc_height
    }

    /// Set the document height. Scroll is re-clamped.
    pub fn set_doc_height(&self, height: f32) {
        let scroll_after = {
            let mut state = self.inner.borrow_mut();
            let height = height.max(0.0);
            if state.doc_height == height {
                return;
            }
            state.doc_height = height;
            state.clamp_scroll().then_some(state.scroll_y)
        };
        if let Some(offset) = scroll_after {
            self.scroll_signal.set(offset);
        }
        self.publish(ViewportChange::Layout);
    }

    /// True when the viewport is narrower than the breakpoint.
    pub fn is_narrow(&self) -> bool {
        let state = self.inner.borrow();
        state.cols < state.narrow_breakpoint
    }

    // =========================================================================
    // SCROLL
    // =========================================================================

    /// Current scroll offset.
    pub fn scroll_y(&self) -> f32 {
        self.inner.borrow().scroll_y
    }

    /// Reactive mirror of the scroll offset.
    pub fn scroll_signal(&self) -> Signal<f32> {
        self.scroll_signal.clone()
    }

    /// Maximum scroll offset for the current document and window.
    pub fn max_scroll(&self) -> f32 {
        self.inner.borrow().max_scroll()
    }

    /// Scroll to an absolute offset (clamped).
    ///
    /// Returns `true` if the offset changed.
    pub fn scroll_to(&self, offset: f32) -> bool {
        let changed = {
            let mut state = self.inner.borrow_mut();
            let clamped = offset.clamp(0.0, state.max_scroll());
            if clamped == state.scroll_y {
                return false;
            }
            state.scroll_y = clamped;
            clamped
        };
        self.scroll_signal.set(changed);
        self.publish(ViewportChange::Scroll { offset: changed });
        true
    }

    /// Scroll by a delta amount.
    ///
    /// Returns `true` if scrolling occurred, `false` if already at boundary.
    pub fn scroll_by(&self, delta: f32) -> bool {
        let current = self.scroll_y();
        self.scroll_to(current + delta)
    }

    /// Scroll so the region's top edge sits at the top of the window.
    ///
    /// Unknown regions are a no-op. Returns `true` if the offset changed.
    pub fn scroll_to_region(&self, region: RegionId) -> bool {
        match self.region_rect(region) {
            Some(rect) => self.scroll_to(rect.y),
            None => false,
        }
    }

    /// Fraction of the document scrolled through, 0.0 at the top and 1.0 at
    /// the bottom. Documents that fit the window report 0.0.
    pub fn progress(&self) -> f32 {
        let state = self.inner.borrow();
        let max = state.max_scroll();
        if max <= 0.0 {
            return 0.0;
        }
        (state.scroll_y / max).clamp(0.0, 1.0)
    }

    /// Scroll offset scaled for a parallax layer. Speed 1.0 tracks the
    /// scroll exactly; smaller values lag behind it.
    pub fn parallax_offset(&self, speed: f32) -> f32 {
        self.scroll_y() * speed
    }

    /// Page scroll amount for the current window height.
    pub fn page_scroll(&self) -> f32 {
        let (_, rows) = self.size();
        (rows as f32 * PAGE_SCROLL_FACTOR).max(1.0)
    }

    // =========================================================================
    // REGIONS
    // =========================================================================

    /// Register a page region at a document-space rect.
    pub fn insert_region(&self, rect: Rect) -> RegionId {
        let id = {
            let mut state = self.inner.borrow_mut();
            let id = state.next_region_id;
            state.next_region_id += 1;
            state.regions.push((id, rect));
            id
        };
        self.publish(ViewportChange::Layout);
        RegionId(id)
    }

    /// Remove a region. Unknown ids are a no-op.
    pub fn remove_region(&self, region: RegionId) {
        let removed = {
            let mut state = self.inner.borrow_mut();
            let before = state.regions.len();
            state.regions.retain(|(id, _)| *id != region.0);
            state.regions.len() != before
        };
        if removed {
            self.publish(ViewportChange::Layout);
        }
    }

    /// Move or resize a region. Unknown ids are a no-op.
    pub fn move_region(&self, region: RegionId, rect: Rect) {
        let moved = {
            let mut state = self.inner.borrow_mut();
            match state.regions.iter_mut().find(|(id, _)| *id == region.0) {
                Some(entry) => {
                    entry.1 = rect;
                    true
                }
                None => false,
            }
        };
        if moved {
            self.publish(ViewportChange::Layout);
        }
    }

    /// Document-space rect of a region.
    pub fn region_rect(&self, region: RegionId) -> Option<Rect> {
        self.inner
            .borrow()
            .regions
            .iter()
            .find(|(id, _)| *id == region.0)
            .map(|(_, rect)| *rect)
    }

    /// The window currently visible, as a document-space rect.
    pub fn visible_rect(&self) -> Rect {
        let state = self.inner.borrow();
        Rect::new(0.0, state.scroll_y, state.cols as f32, state.rows as f32)
    }

    /// Fraction of a region inside the visible window expanded by
    /// `root_margin` rows. Unknown and degenerate regions report 0.0.
    pub fn intersection_ratio(&self, region: RegionId, root_margin: f32) -> f32 {
        match self.region_rect(region) {
            Some(rect) => rect.coverage_within(&self.visible_rect().expand(root_margin)),
            None => 0.0,
        }
    }

    // =========================================================================
    // CHANGE FEED
    // =========================================================================

    /// Subscribe to viewport changes. Listeners are invoked in registration
    /// order. Returns a cleanup closure that unsubscribes.
    pub fn on_change(&self, listener: impl Fn(&ViewportChange) + 'static) -> impl FnOnce() {
        let id = {
            let mut state = self.inner.borrow_mut();
            let id = state.next_listener_id;
            state.next_listener_id += 1;
            state.listeners.push((id, Rc::new(listener)));
            id
        };

        let weak: Weak<RefCell<ViewportState>> = Rc::downgrade(&self.inner);
        move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().listeners.retain(|(i, _)| *i != id);
            }
        }
    }

    /// Notify listeners of a change.
    ///
    /// Listeners run outside the state borrow, so they may freely call back
    /// into the viewport. The listener list is snapshotted first: listeners
    /// added during a publish see only later changes.
    fn publish(&self, change: ViewportChange) {
        let snapshot: Vec<ChangeListener> = {
            let state = self.inner.borrow();
            state.listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in snapshot {
            listener(&change);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
