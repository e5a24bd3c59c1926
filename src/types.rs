//! Shared geometry and color primitives.
//!
//! Every coordinate lives in background-image pixel space. Rectangles are
//! inclusive on both corners, so a click exactly on an edge counts as inside.

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Point {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Squared Euclidean distance; hit tests compare this against a squared
    /// radius so no square root is ever taken. Saturates for points at
    /// opposite ends of the `i32` range.
    pub fn distance_sq(self, other: Point) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point { x, y }
    }
}

impl From<Point> for (i32, i32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Size { width, height }
    }

    pub fn of(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Size { width, height }
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Size { width, height }
    }
}

impl From<Size> for (u32, u32) {
    fn from(s: Size) -> Self {
        (s.width, s.height)
    }
}

/// Axis-aligned rectangle with inclusive corners `(x1, y1)` and `(x2, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    /// Contains no point at all.
    pub const EMPTY: Rect = Rect {
        x1: 0,
        y1: 0,
        x2: -1,
        y2: -1,
    };

    /// Build from any two opposite corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Rect {
            x1: a.x.min(b.x),
            y1: a.y.min(b.y),
            x2: a.x.max(b.x),
            y2: a.y.max(b.y),
        }
    }

    pub const fn from_origin_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        self.x1 <= p.x && p.x <= self.x2 && self.y1 <= p.y && p.y <= self.y2
    }

    pub fn is_empty(&self) -> bool {
        self.x1 > self.x2 || self.y1 > self.y2
    }

    pub const fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub const fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Grow outward by `dx` horizontally and `dy` vertically on every side.
    pub const fn inflate(&self, dx: i32, dy: i32) -> Self {
        Rect {
            x1: self.x1 - dx,
            y1: self.y1 - dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    Named(NamedColor),
    Rgb { r: u8, g: u8, b: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb { r, g, b }
    }

    pub fn to_pixel(&self) -> Rgb<u8> {
        match self {
            Color::Rgb { r, g, b } => Rgb([*r, *g, *b]),
            Color::Named(n) => Rgb(match n {
                NamedColor::Black => [0, 0, 0],
                NamedColor::Red => [255, 0, 0],
                NamedColor::Green => [0, 255, 0],
                NamedColor::Yellow => [255, 255, 0],
                NamedColor::Blue => [0, 0, 255],
                NamedColor::Magenta => [255, 0, 255],
                NamedColor::Cyan => [0, 255, 255],
                NamedColor::White => [255, 255, 255],
            }),
        }
    }
}
