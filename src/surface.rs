//! The display/input contract the viewer core drives.
//!
//! A surface owns the primary map window, can open and close a second
//! window for video, shows frames and reports input. The core never talks
//! to a windowing or terminal API directly.

use std::time::Duration;

use crossterm::event::KeyEvent;
use image::RgbImage;

use crate::error::SurfaceError;
use crate::types::{Point, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    Map,
    Explore,
}

/// Pointer coordinates are in the pixel space of the window they hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    PointerMoved(Point),
    PointerPressed(Point),
    Key(KeyEvent),
    Resized,
}

pub trait Surface {
    fn open_window(&mut self, window: Window, size: Size) -> Result<(), SurfaceError>;

    fn close_window(&mut self, window: Window) -> Result<(), SurfaceError>;

    fn present(&mut self, window: Window, frame: &RgbImage) -> Result<(), SurfaceError>;

    /// Wait up to `timeout` for input; returns every event that arrived, in
    /// arrival order. An empty vector means the wait timed out.
    fn poll(&mut self, timeout: Duration) -> Result<Vec<InputEvent>, SurfaceError>;
}
