//! Terminal surface — shows RGB frames in a terminal via crossterm.
//!
//! Each cell shows two vertically stacked pixels using the upper-half block:
//! the foreground color is the top pixel, the background color the bottom.
//! Frames are resampled to fill the terminal. Only the topmost window is
//! visible; closing it reveals the one below on its next present.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEventKind};
use crossterm::{cursor, execute, queue, style, terminal};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use tracing::debug;

use crate::error::SurfaceError;
use crate::surface::{InputEvent, Surface, Window};
use crate::types::{Point, Size};

const HALF_BLOCK: char = '\u{2580}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    top: Rgb<u8>,
    bottom: Rgb<u8>,
}

type Grid = Vec<Vec<Cell>>;

pub struct TerminalSurface {
    stdout: io::Stdout,
    /// Open windows, bottom first, with the size of their last frame.
    windows: Vec<(Window, Size)>,
    /// What the terminal currently shows. `None` forces a full redraw.
    grid: Option<Grid>,
}

impl TerminalSurface {
    /// Take over the terminal. Everything is restored when the surface drops.
    pub fn enter() -> Result<Self, SurfaceError> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            event::EnableMouseCapture,
            terminal::Clear(terminal::ClearType::All),
        )?;
        Ok(TerminalSurface {
            stdout,
            windows: Vec::new(),
            grid: None,
        })
    }

    fn top(&self) -> Option<&(Window, Size)> {
        self.windows.last()
    }

    fn draw(&mut self, next: Grid) -> Result<(), SurfaceError> {
        let changes = match &self.grid {
            Some(prev) => diff(prev, &next),
            None => everything(&next),
        };
        for (x, y, cell) in changes {
            queue!(
                self.stdout,
                cursor::MoveTo(x, y),
                style::SetForegroundColor(to_ct_color(cell.top)),
                style::SetBackgroundColor(to_ct_color(cell.bottom)),
                style::Print(HALF_BLOCK),
            )?;
        }
        queue!(self.stdout, style::ResetColor)?;
        self.stdout.flush()?;
        self.grid = Some(next);
        Ok(())
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = execute!(
            self.stdout,
            style::ResetColor,
            event::DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen,
        );
        let _ = terminal::disable_raw_mode();
    }
}

impl Surface for TerminalSurface {
    fn open_window(&mut self, window: Window, size: Size) -> Result<(), SurfaceError> {
        debug!(?window, width = size.width, height = size.height, "window opened");
        self.windows.retain(|(w, _)| *w != window);
        self.windows.push((window, size));
        self.grid = None;
        Ok(())
    }

    fn close_window(&mut self, window: Window) -> Result<(), SurfaceError> {
        debug!(?window, "window closed");
        self.windows.retain(|(w, _)| *w != window);
        self.grid = None;
        Ok(())
    }

    fn present(&mut self, window: Window, frame: &RgbImage) -> Result<(), SurfaceError> {
        match self.windows.last_mut() {
            Some((top, size)) if *top == window => *size = Size::of(frame),
            _ => return Ok(()),
        }
        let (cols, rows) = terminal::size()?;
        self.draw(cells_for(frame, cols, rows))
    }

    fn poll(&mut self, timeout: Duration) -> Result<Vec<InputEvent>, SurfaceError> {
        let mut events = Vec::new();
        let mut wait = timeout;
        while event::poll(wait)? {
            wait = Duration::ZERO;
            if let Some(e) = self.translate(event::read()?)? {
                events.push(e);
            }
        }
        Ok(events)
    }
}

impl TerminalSurface {
    fn translate(&mut self, event: Event) -> Result<Option<InputEvent>, SurfaceError> {
        let translated = match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(InputEvent::Key(key)),
            Event::Mouse(mouse) => {
                let Some(&(_, size)) = self.top() else {
                    return Ok(None);
                };
                let (cols, rows) = terminal::size()?;
                let p = cell_to_pixel(mouse.column, mouse.row, cols, rows, size);
                match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::PointerPressed(p)),
                    MouseEventKind::Moved | MouseEventKind::Drag(_) => Some(InputEvent::PointerMoved(p)),
                    _ => None,
                }
            }
            Event::Resize(..) => {
                self.grid = None;
                Some(InputEvent::Resized)
            }
            _ => None,
        };
        Ok(translated)
    }
}

/// Resample `frame` onto a `cols` x `rows` cell grid.
fn cells_for(frame: &RgbImage, cols: u16, rows: u16) -> Grid {
    let (cols, rows) = (u32::from(cols.max(1)), u32::from(rows.max(1)));
    let scaled = imageops::resize(frame, cols, rows * 2, FilterType::Triangle);
    (0..rows)
        .map(|row| {
            (0..cols)
                .map(|col| Cell {
                    top: *scaled.get_pixel(col, row * 2),
                    bottom: *scaled.get_pixel(col, row * 2 + 1),
                })
                .collect()
        })
        .collect()
}

/// Cells that differ between two grids of the same shape. A shape change
/// redraws everything.
fn diff(prev: &Grid, next: &Grid) -> Vec<(u16, u16, Cell)> {
    let same_shape = prev.len() == next.len() && prev.iter().zip(next).all(|(a, b)| a.len() == b.len());
    if !same_shape {
        return everything(next);
    }
    let mut changes = Vec::new();
    for (y, (prev_row, next_row)) in prev.iter().zip(next).enumerate() {
        for (x, (a, b)) in prev_row.iter().zip(next_row).enumerate() {
            if a != b {
                changes.push((x as u16, y as u16, *b));
            }
        }
    }
    changes
}

fn everything(grid: &Grid) -> Vec<(u16, u16, Cell)> {
    grid.iter()
        .enumerate()
        .flat_map(|(y, row)| row.iter().enumerate().map(move |(x, c)| (x as u16, y as u16, *c)))
        .collect()
}

/// Centre of the cell's upper half, in the window's pixel space.
fn cell_to_pixel(col: u16, row: u16, cols: u16, rows: u16, size: Size) -> Point {
    let (cols, rows) = (i64::from(cols.max(1)), i64::from(rows.max(1)));
    let x = (2 * i64::from(col) + 1) * i64::from(size.width) / (2 * cols);
    let y = (4 * i64::from(row) + 1) * i64::from(size.height) / (4 * rows);
    Point::new(x as i32, y as i32)
}

fn to_ct_color(c: Rgb<u8>) -> style::Color {
    let [r, g, b] = c.0;
    style::Color::Rgb { r, g, b }
}
