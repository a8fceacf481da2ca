//! Reveal Example - Scroll-driven sections with keyboard accessibility
//!
//! A tall document of color bands, each gated behind a reveal trigger:
//! bands light up the first time they scroll into view and stay lit.
//! The full accessibility layer is installed:
//! - Tab / Shift+Tab move focus; the focused band brightens
//! - The skip link is the first tab stop (shown as a top bar while
//!   focused); Enter on it jumps to the first section
//! - 'd' opens a dialog drawn as a centered panel; Tab is trapped on its
//!   two buttons and Escape or Enter closes it
//! - Arrow keys / PageUp / PageDown / Home / End scroll, Ctrl+C exits
//!
//! Run with: cargo run --example reveal

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use glimmer_tui::runtime::driver::{self, Flow};
use glimmer_tui::{
    Accessibility, AccessibilityOptions, Blend, ControlId, DialogId, EntryFlags, FocusEntry,
    KeyState, Presenter, Rect, Reveal, RevealOptions, Rgba, Runtime, RuntimeOptions, Surface,
    ThemeProvider, Viewport,
};
use spark_signals::effect;

const SECTION_ROWS: f32 = 12.0;
const SECTION_GAP: f32 = 30.0;
const FIRST_SECTION_Y: f32 = 6.0;

const SECTION_LABELS: [&str; 5] = ["Intro", "Particles", "Gradient", "Shimmer", "Contact"];
const SECTION_COLORS: [Rgba; 5] = [
    Rgba::rgb(99, 102, 241),
    Rgba::rgb(20, 184, 166),
    Rgba::rgb(244, 114, 182),
    Rgba::rgb(250, 204, 21),
    Rgba::rgb(96, 165, 250),
];

struct Section {
    reveal: Reveal,
    control: ControlId,
    rect: Rect,
    color: Rgba,
}

fn main() -> io::Result<()> {
    env_logger::init();

    let runtime = Runtime::new(RuntimeOptions {
        theme: ThemeProvider::system().mode(),
        ..RuntimeOptions::default()
    });

    // Lay the document out at the real terminal size before attaching
    // anything that reads region geometry.
    let (cols, rows) = crossterm::terminal::size()?;
    runtime.dispatch_resize(cols, rows);

    let viewport = runtime.viewport();
    let focus = runtime.focus();

    let mut sections = Vec::new();
    for (i, label) in SECTION_LABELS.iter().enumerate() {
        let y = FIRST_SECTION_Y + i as f32 * (SECTION_ROWS + SECTION_GAP);
        let rect = Rect::new(0.0, y, cols as f32, SECTION_ROWS);
        let region = viewport.insert_region(rect);
        let reveal = runtime.reveal(
            region,
            RevealOptions {
                threshold: 0.3,
                ..RevealOptions::default()
            },
        );
        let control = focus.register(FocusEntry::new(*label));
        sections.push(Section {
            reveal,
            control,
            rect,
            color: SECTION_COLORS[i],
        });
    }
    let doc_bottom = FIRST_SECTION_Y + SECTION_LABELS.len() as f32 * (SECTION_ROWS + SECTION_GAP);
    viewport.set_doc_height(doc_bottom + 4.0);

    let a11y = Accessibility::install(
        &runtime,
        AccessibilityOptions {
            main_region: Some(sections[0].reveal.region()),
            ..AccessibilityOptions::default()
        },
    );

    // Log every announcement as it lands.
    let _announce_log = effect({
        let message = runtime.announcer().message_signal();
        move || {
            let text = message.get();
            if !text.is_empty() {
                log::info!("announce: {text}");
            }
        }
    });

    // One dialog, opened on demand. Its close action mirrors a close
    // button: it marks the dialog closed in the registry.
    let dialogs = runtime.dialogs();
    let dialog: DialogId = {
        let slot: Rc<RefCell<Option<DialogId>>> = Rc::new(RefCell::new(None));
        let id = dialogs.register("Settings", {
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
    };
    let ok = focus.register(FocusEntry::new("OK").in_container(dialog));
    let cancel = focus.register(
        FocusEntry::new("Cancel")
            .in_container(dialog)
            .with_flags(EntryFlags::CLOSE_CONTROL),
    );

    let _open = runtime.on_key({
        let dialogs = dialogs.clone();
        move |event| {
            if event.key == "d"
                && event.state != KeyState::Release
                && dialogs.open_dialog().is_none()
            {
                dialogs.set_open(dialog);
                true
            } else {
                false
            }
        }
    });

    let _buttons = runtime.on_key({
        let dialogs = dialogs.clone();
        let focus = focus.clone();
        move |event| {
            if event.key != "Enter" || event.state == KeyState::Release {
                return false;
            }
            match focus.focused() {
                Some(c) if c == ok || c == cancel => dialogs.request_close(dialog),
                _ => false,
            }
        }
    });

    let mut presenter = Presenter::new();
    let mut surface = Surface::new(cols, rows.saturating_mul(2));
    driver::run(&runtime, |rt| {
        let viewport = rt.viewport();
        let (cols, rows) = viewport.size();
        if surface.width() != cols || surface.height() != rows.saturating_mul(2) {
            surface.resize(cols, rows.saturating_mul(2));
        }

        paint_page(
            &mut surface,
            &viewport,
            &sections,
            rt.focus().focused(),
            a11y.skip_link_visible(),
        );
        if dialogs.is_open(dialog) {
            paint_dialog(&mut surface, rt.focus().focused() == Some(ok));
        }

        let background = rt.theme().palette().background;
        match presenter.present(&surface, background) {
            Ok(_) => Flow::Continue,
            Err(err) => {
                log::error!("present failed: {err}");
                Flow::Exit
            }
        }
    })
}

/// Paint the visible slice of the document: one band per section, faint
/// until revealed, brightened while focused, plus the skip link bar.
fn paint_page(
    surface: &mut Surface,
    viewport: &Viewport,
    sections: &[Section],
    focused: Option<ControlId>,
    skip_visible: bool,
) {
    surface.clear();
    let scroll = viewport.scroll_y();
    let width = surface.width() as i32;
    let height = surface.height() as i32;

    for section in sections {
        let mut color = if section.reveal.is_visible() {
            section.color.with_alpha(215)
        } else {
            section.color.with_alpha(30)
        };
        if focused == Some(section.control) {
            color = Rgba::lerp(color.with_alpha(255), Rgba::WHITE, 0.25);
        }

        let y0 = ((section.rect.y - scroll) * 2.0).round() as i32;
        let y1 = y0 + (section.rect.height * 2.0) as i32;
        for y in y0.max(0)..y1.min(height) {
            for x in 2..width - 2 {
                surface.plot(x, y, color, Blend::Alpha);
            }
        }
    }

    if skip_visible {
        let bar = Rgba::rgb(250, 204, 21);
        for y in 0..2.min(height) {
            for x in 0..width {
                surface.plot(x, y, bar, Blend::Alpha);
            }
        }
    }
}

/// Dim the page and draw a centered panel with two button blocks; the
/// focused button is the bright one.
fn paint_dialog(surface: &mut Surface, ok_focused: bool) {
    let width = surface.width() as i32;
    let height = surface.height() as i32;

    let scrim = Rgba::new(0, 0, 0, 140);
    for y in 0..height {
        for x in 0..width {
            surface.plot(x, y, scrim, Blend::Alpha);
        }
    }

    let pw = (width / 2).max(24).min(width);
    let ph = (height / 2).max(12).min(height);
    let px = (width - pw) / 2;
    let py = (height - ph) / 2;
    let panel = Rgba::rgb(226, 232, 240);
    for y in py..py + ph {
        for x in px..px + pw {
            surface.plot(x, y, panel, Blend::Alpha);
        }
    }

    // Two buttons along the bottom edge of the panel.
    let bw = (pw / 3).max(4);
    let bh = 4.min(ph);
    let by = py + ph - bh - 2;
    let idle = Rgba::rgb(148, 163, 184);
    let active = Rgba::rgb(37, 99, 235);
    let (ok_color, cancel_color) = if ok_focused {
        (active, idle)
    } else {
        (idle, active)
    };
    for y in by..by + bh {
        for x in px + 2..px + 2 + bw {
            surface.plot(x, y, ok_color, Blend::Alpha);
        }
        for x in px + pw - 2 - bw..px + pw - 2 {
            surface.plot(x, y, cancel_color, Blend::Alpha);
        }
    }
}
