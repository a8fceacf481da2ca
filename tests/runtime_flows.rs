//! End-to-end flows through the public runtime API.
//!
//! Each test builds a full `Runtime`, feeds it dispatched events and manual
//! clock ticks, and checks behavior that crosses service boundaries:
//! - rate-limited callbacks riding the runtime clock
//! - scroll-driven reveals firing exactly once
//! - the dialog focus cycle with announcements
//! - the skip link jump
//! - teardown leaving no pending timers or frames
//!
//! Run with: cargo test --test runtime_flows

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use glimmer_tui::{
    Accessibility, AccessibilityOptions, Debounced, DialogId, DialogRegistry, FocusEntry,
    KeyboardEvent, Modifiers, ParticleField, Rect, RevealOptions, Runtime, RuntimeOptions,
    Throttled,
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// A dialog whose close action marks it closed, the way a close button
/// in the page would.
fn closable_dialog(dialogs: &DialogRegistry, title: &str) -> DialogId {
    let slot: Rc<RefCell<Option<DialogId>>> = Rc::new(RefCell::new(None));
    let id = dialogs.register(title, {
        let slot = slot.clone();
        let dialogs = dialogs.clone();
        move || {
            if let Some(id) = *slot.borrow() {
                dialogs.set_closed(id);
            }
        }
    });
    *slot.borrow_mut() = Some(id);
    id
}

#[test]
fn test_throttled_burst_runs_leading_and_trailing() {
    let runtime = Runtime::new(RuntimeOptions::default());
    let t0 = runtime.now();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let s = seen.clone();
    let timers = runtime.timers();
    let th = Throttled::new(&timers, ms(200), move |v: u32| s.borrow_mut().push(v));

    // 10 calls in 50ms.
    for i in 0..10 {
        runtime.tick(t0 + ms(u64::from(i) * 5));
        th.call(i);
    }
    assert_eq!(*seen.borrow(), vec![0], "only the leading call ran");

    runtime.tick(t0 + ms(300));
    assert_eq!(*seen.borrow(), vec![0, 9], "trailing run with last args");

    runtime.tick(t0 + ms(600));
    assert_eq!(seen.borrow().len(), 2, "burst is fully drained");
}

#[test]
fn test_debounced_burst_settles_once() {
    let runtime = Runtime::new(RuntimeOptions::default());
    let t0 = runtime.now();
    let count = Rc::new(Cell::new(0));

    let c = count.clone();
    let timers = runtime.timers();
    let db = Debounced::new(&timers, ms(200), move |_: ()| c.set(c.get() + 1));

    for i in 0..10 {
        runtime.tick(t0 + ms(i * 5));
        db.call(());
    }
    runtime.tick(t0 + ms(150));
    assert_eq!(count.get(), 0, "quiet window not yet elapsed");

    // 200ms after the last call at t0+45.
    runtime.tick(t0 + ms(245));
    assert_eq!(count.get(), 1);

    runtime.tick(t0 + ms(1000));
    assert_eq!(count.get(), 1);
}

#[test]
fn test_reveal_fires_once_per_region() {
    let runtime = Runtime::new(RuntimeOptions::default());
    let viewport = runtime.viewport();
    viewport.set_doc_height(300.0);
    let region = viewport.insert_region(Rect::new(0.0, 150.0, 80.0, 30.0));

    let reveal = runtime.reveal(region, RevealOptions::default());
    assert!(!reveal.is_visible(), "below the fold at attach");
    assert!(runtime.observer().is_observing(region));

    assert!(runtime.dispatch_scroll(140.0));
    assert!(reveal.is_visible());
    assert!(
        !runtime.observer().is_observing(region),
        "trigger-once registration removed after firing"
    );

    // Scrolling away never lowers the flag.
    runtime.dispatch_scroll(-140.0);
    assert!(reveal.is_visible());
    assert!(reveal.visible_signal().get());
}

#[test]
fn test_skip_link_jumps_to_main_region() {
    let runtime = Runtime::new(RuntimeOptions::default());
    let viewport = runtime.viewport();
    viewport.set_doc_height(300.0);
    let main = viewport.insert_region(Rect::new(0.0, 150.0, 80.0, 100.0));

    let a11y = Accessibility::install(
        &runtime,
        AccessibilityOptions {
            main_region: Some(main),
            ..AccessibilityOptions::default()
        },
    );
    let section = runtime.focus().register(FocusEntry::new("Section"));

    // First Tab lands on the skip link, which becomes visible.
    assert!(runtime.dispatch_key(&KeyboardEvent::new("Tab")));
    assert_eq!(runtime.focus().focused(), Some(a11y.skip_link()));
    assert!(a11y.skip_link_visible());

    // Enter jumps to the main region and dismisses the link.
    assert!(runtime.dispatch_key(&KeyboardEvent::new("Enter")));
    assert_eq!(viewport.scroll_y(), 150.0);
    assert_eq!(runtime.focus().focused(), None);
    assert!(!a11y.skip_link_visible());

    // The ring still cycles: skip link first, then the page control.
    runtime.dispatch_key(&KeyboardEvent::new("Tab"));
    runtime.dispatch_key(&KeyboardEvent::new("Tab"));
    assert_eq!(runtime.focus().focused(), Some(section));
}

#[test]
fn test_dialog_cycle_traps_focus_and_announces() {
    let runtime = Runtime::new(RuntimeOptions::default());
    let a11y = Accessibility::install(&runtime, AccessibilityOptions::default());
    let focus = runtime.focus();
    let dialogs = runtime.dialogs();

    let page = focus.register(FocusEntry::new("Page button"));
    focus.focus(page);

    let dialog = closable_dialog(&dialogs, "Settings");
    let ok = focus.register(FocusEntry::new("OK").in_container(dialog));
    let cancel = focus.register(FocusEntry::new("Cancel").in_container(dialog));

    dialogs.set_open(dialog);
    assert_eq!(focus.focused(), Some(ok), "focus moved into the dialog");
    assert_eq!(focus.stack_depth(), 1);
    assert_eq!(runtime.announcer().message(), "Dialog opened: Settings");

    // Tab cycles the two dialog controls and never escapes them.
    runtime.dispatch_key(&KeyboardEvent::new("Tab"));
    assert_eq!(focus.focused(), Some(cancel));
    runtime.dispatch_key(&KeyboardEvent::new("Tab"));
    assert_eq!(focus.focused(), Some(ok));
    runtime.dispatch_key(&KeyboardEvent::with_modifiers("Tab", Modifiers::shift()));
    assert_eq!(focus.focused(), Some(cancel));

    // Escape closes and unwinds.
    assert!(runtime.dispatch_key(&KeyboardEvent::new("Escape")));
    assert!(!dialogs.is_open(dialog));
    assert_eq!(focus.focused(), Some(page), "focus restored to the opener");
    assert_eq!(focus.stack_depth(), 0);
    assert_eq!(runtime.announcer().message(), "Dialog closed");

    drop(a11y);
}

#[test]
fn test_escape_without_open_dialog_passes_through() {
    let runtime = Runtime::new(RuntimeOptions::default());
    let _a11y = Accessibility::install(&runtime, AccessibilityOptions::default());

    assert!(!runtime.dispatch_key(&KeyboardEvent::new("Escape")));
}

#[test]
fn test_announcement_clears_on_schedule() {
    let runtime = Runtime::new(RuntimeOptions::default());
    let t0 = runtime.now();

    runtime.announcer().announce("Section loaded");
    assert_eq!(runtime.announcer().message(), "Section loaded");

    runtime.tick(t0 + ms(999));
    assert_eq!(runtime.announcer().message(), "Section loaded");

    runtime.tick(t0 + ms(1000));
    assert_eq!(runtime.announcer().message(), "");
}

#[test]
fn test_teardown_leaves_no_pending_work() {
    let runtime = Runtime::new(RuntimeOptions::default());
    let viewport = runtime.viewport();
    viewport.set_doc_height(300.0);
    let region = viewport.insert_region(Rect::new(0.0, 150.0, 80.0, 30.0));

    let reveal = runtime.reveal(region, RevealOptions::default());
    let mut sim = runtime.simulation();
    sim.add_effect(ParticleField::new());
    sim.start();
    let a11y = Accessibility::install(&runtime, AccessibilityOptions::default());
    runtime.announcer().announce("hello");

    assert!(runtime.frames().has_pending(), "simulation frame scheduled");
    assert!(runtime.timers().has_pending(), "announcement clear scheduled");

    runtime.announcer().clear();
    drop(reveal);
    drop(sim);
    a11y.uninstall();

    assert!(!runtime.frames().has_pending());
    assert!(!runtime.timers().has_pending());
    assert!(!runtime.observer().is_observing(region));
    assert!(
        !runtime.dispatch_key(&KeyboardEvent::new("Tab")),
        "no handler left to consume keys"
    );
}
