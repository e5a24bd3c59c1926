//! Text measurement and drawing.
//!
//! The viewer only needs two things from a font: how big a string is at a
//! given size, and a way to paint it. `TextRenderer` is that seam; a real
//! font rasterizer can be plugged in behind it. `BlockFont` is the built-in
//! fallback that scales the bitmap glyphs in `font`.

pub mod font;

use image::{Rgb, RgbImage};

use crate::types::Point;

pub trait TextRenderer {
    /// Width and height of `text` at `size`, in pixels.
    fn measure(&self, text: &str, size: u32) -> (u32, u32);

    /// Paint `text` with its top-left corner at `origin`.
    fn draw(&self, canvas: &mut RgbImage, text: &str, origin: Point, size: u32, color: Rgb<u8>);
}

/// Scaled bitmap font. One glyph dot is `size / 7` pixels square.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFont;

impl BlockFont {
    fn dot(size: u32) -> u32 {
        (size / 7).max(1)
    }
}

impl TextRenderer for BlockFont {
    fn measure(&self, text: &str, size: u32) -> (u32, u32) {
        let dot = Self::dot(size);
        (font::text_width(text) * dot, font::GLYPH_HEIGHT * dot)
    }

    fn draw(&self, canvas: &mut RgbImage, text: &str, origin: Point, size: u32, color: Rgb<u8>) {
        let dot = Self::dot(size) as i32;
        let (w, h) = (canvas.width() as i32, canvas.height() as i32);
        let mut cursor_x = origin.x;

        for ch in text.chars() {
            let Some(glyph) = font::glyph(ch) else {
                continue;
            };
            for (row, line) in glyph.iter().enumerate() {
                for (col, c) in line.chars().enumerate() {
                    if c == ' ' {
                        continue;
                    }
                    let x0 = cursor_x + col as i32 * dot;
                    let y0 = origin.y + row as i32 * dot;
                    for y in y0.max(0)..(y0 + dot).min(h) {
                        for x in x0.max(0)..(x0 + dot).min(w) {
                            canvas.put_pixel(x as u32, y as u32, color);
                        }
                    }
                }
            }
            cursor_x += (glyph[0].len() as i32 + 1) * dot;
        }
    }
}
