//! Render Module - Half-block presenter
//!
//! Writes a [`Surface`] to the terminal as `▀` half-block cells: each cell's
//! foreground carries the upper pixel and its background the lower pixel, so
//! one terminal row shows two pixel rows. Cells are diffed against the
//! previous frame and only changed runs are emitted, which keeps a 60 Hz
//! ambient animation from flooding the terminal.
//!
//! The escape-sequence path takes any `io::Write`, so rendering is tested
//! against byte buffers without a TTY.
//!
//! # Example
//!
//! ```ignore
//! use glimmer_tui::effects::Surface;
//! use glimmer_tui::render::Presenter;
//! use glimmer_tui::types::Rgba;
//!
//! let mut presenter = Presenter::new();
//! let surface = Surface::new(80, 48); // 80x24 cells
//! presenter.present(&surface, Rgba::rgb(15, 23, 42))?;
//! ```

use std::io::{self, stdout, Write};

use crossterm::style::{Color, Print, SetBackgroundColor, SetForegroundColor};
use crossterm::{cursor, queue};

use crate::effects::Surface;
use crate::types::Rgba;

/// Upper half block: foreground paints the top pixel, background the bottom.
pub const HALF_BLOCK: char = '\u{2580}';

/// One terminal cell worth of composed pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CellPair {
    top: Rgba,
    bottom: Rgba,
}

/// Diffing half-block renderer.
pub struct Presenter {
    previous: Vec<CellPair>,
    cols: u16,
    rows: u16,
}

impl Presenter {
    pub fn new() -> Self {
        Self {
            previous: Vec::new(),
            cols: 0,
            rows: 0,
        }
    }

    /// Compose and write the surface to stdout, diffed against the previous
    /// frame. Returns whether anything was emitted.
    pub fn present(&mut self, surface: &Surface, background: Rgba) -> io::Result<bool> {
        let mut out = stdout();
        let changed = self.render_to(&mut out, surface, background)?;
        if changed {
            out.flush()?;
        }
        Ok(changed)
    }

    /// Forget the previous frame; the next render repaints every cell.
    ///
    /// Use after anything else wrote to the screen.
    pub fn invalidate(&mut self) {
        self.previous.clear();
        self.cols = 0;
        self.rows = 0;
    }

    /// Write changed cells as escape sequences. A size change repaints in
    /// full. Returns whether anything was emitted.
    pub fn render_to(
        &mut self,
        out: &mut impl Write,
        surface: &Surface,
        background: Rgba,
    ) -> io::Result<bool> {
        let cols = surface.width();
        let rows = surface.height().div_ceil(2);
        let cells = compose(surface, background);

        let full = cols != self.cols || rows != self.rows;
        let mut emitted = false;
        // Colors persist across cursor moves, so the dedup state spans runs.
        let mut fg: Option<Rgba> = None;
        let mut bg: Option<Rgba> = None;

        for y in 0..rows {
            let row_base = y as usize * cols as usize;
            let mut x: u16 = 0;
            while x < cols {
                let i = row_base + x as usize;
                if !full && self.previous[i] == cells[i] {
                    x += 1;
                    continue;
                }

                // Emit a run of changed cells without re-addressing each one.
                queue!(out, cursor::MoveTo(x, y))?;
                while x < cols {
                    let i = row_base + x as usize;
                    let cell = cells[i];
                    if !full && self.previous[i] == cell {
                        break;
                    }
                    if fg != Some(cell.top) {
                        queue!(out, SetForegroundColor(to_color(cell.top)))?;
                        fg = Some(cell.top);
                    }
                    if bg != Some(cell.bottom) {
                        queue!(out, SetBackgroundColor(to_color(cell.bottom)))?;
                        bg = Some(cell.bottom);
                    }
                    queue!(out, Print(HALF_BLOCK))?;
                    emitted = true;
                    x += 1;
                }
            }
        }

        self.previous = cells;
        self.cols = cols;
        self.rows = rows;
        Ok(emitted)
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse pixel rows into cell pairs, blending translucent pixels over
/// the page background. Rows past the surface bottom read as background.
fn compose(surface: &Surface, background: Rgba) -> Vec<CellPair> {
    let cols = surface.width() as usize;
    let rows = (surface.height() as usize).div_ceil(2);
    let mut cells = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            cells.push(CellPair {
                top: pixel_over(surface, col, row * 2, background),
                bottom: pixel_over(surface, col, row * 2 + 1, background),
            });
        }
    }
    cells
}

fn pixel_over(surface: &Surface, x: usize, y: usize, background: Rgba) -> Rgba {
    match surface.pixel(x as i32, y as i32) {
        Some(px) => Rgba::blend(px, background),
        None => background,
    }
}

fn to_color(c: Rgba) -> Color {
    Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Blend;

    const BG: Rgba = Rgba::rgb(15, 23, 42);

    fn render_bytes(presenter: &mut Presenter, surface: &Surface) -> Vec<u8> {
        let mut out = Vec::new();
        presenter
            .render_to(&mut out, surface, BG)
            .expect("Vec<u8> writes cannot fail");
        out
    }

    #[test]
    fn test_first_frame_paints_everything() {
        let mut presenter = Presenter::new();
        let surface = Surface::new(4, 4);

        let out = render_bytes(&mut presenter, &surface);
        assert!(!out.is_empty());

        let text = String::from_utf8_lossy(&out);
        // 4 cols x 2 cell rows of half blocks
        assert_eq!(text.matches(HALF_BLOCK).count(), 8);
    }

    #[test]
    fn test_unchanged_frame_emits_nothing() {
        let mut presenter = Presenter::new();
        let surface = Surface::new(4, 4);

        render_bytes(&mut presenter, &surface);
        let out = render_bytes(&mut presenter, &surface);
        assert!(out.is_empty());
    }

    #[test]
    fn test_changed_pixel_repaints_only_its_cell() {
        let mut presenter = Presenter::new();
        let mut surface = Surface::new(4, 4);
        render_bytes(&mut presenter, &surface);

        surface.plot(2, 1, Rgba::rgb(255, 0, 0), Blend::Alpha);
        let out = render_bytes(&mut presenter, &surface);

        let text = String::from_utf8_lossy(&out);
        assert_eq!(text.matches(HALF_BLOCK).count(), 1);
    }

    #[test]
    fn test_resize_forces_full_repaint() {
        let mut presenter = Presenter::new();
        render_bytes(&mut presenter, &Surface::new(4, 4));

        let out = render_bytes(&mut presenter, &Surface::new(6, 4));
        let text = String::from_utf8_lossy(&out);
        assert_eq!(text.matches(HALF_BLOCK).count(), 12);
    }

    #[test]
    fn test_invalidate_forces_full_repaint() {
        let mut presenter = Presenter::new();
        let surface = Surface::new(4, 4);
        render_bytes(&mut presenter, &surface);

        presenter.invalidate();
        let out = render_bytes(&mut presenter, &surface);
        let text = String::from_utf8_lossy(&out);
        assert_eq!(text.matches(HALF_BLOCK).count(), 8);
    }

    #[test]
    fn test_compose_splits_pixel_rows() {
        let mut surface = Surface::new(1, 2);
        surface.plot(0, 0, Rgba::rgb(255, 0, 0), Blend::Alpha);
        surface.plot(0, 1, Rgba::rgb(0, 255, 0), Blend::Alpha);

        let cells = compose(&surface, BG);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].top, Rgba::rgb(255, 0, 0));
        assert_eq!(cells[0].bottom, Rgba::rgb(0, 255, 0));
    }

    #[test]
    fn test_compose_blends_alpha_over_background() {
        let mut surface = Surface::new(1, 1);
        surface.plot(0, 0, Rgba::new(255, 255, 255, 128), Blend::Alpha);

        let cells = compose(&surface, Rgba::BLACK);
        let top = cells[0].top;
        assert!(top.r > 120 && top.r < 135, "half-white over black, got {top:?}");
        assert_eq!(top.a, 255);
    }

    #[test]
    fn test_compose_odd_height_pads_with_background() {
        let surface = Surface::new(2, 3);
        let cells = compose(&surface, BG);
        // 2 cell rows; the second row's bottom pixel is off-surface.
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[2].bottom, BG);
        assert_eq!(cells[3].bottom, BG);
    }
}
