//! Compositor — pixel-level assembly of a frame.
//!
//! Images are pasted or alpha-blended onto an opaque RGB canvas at an
//! integer offset. Placements are clipped to the canvas: any part of the
//! foreground that falls outside is dropped, the rest is drawn normally.
//! Nothing here knows about locations, cards or modes.

mod raster;

use image::{DynamicImage, Rgb, RgbImage, RgbaImage};

pub use raster::{draw_line, fill_circle, fill_rect, stroke_circle};

use crate::types::Size;

/// A foreground image, with or without a transparency channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Sprite {
    Opaque(RgbImage),
    Translucent(RgbaImage),
}

impl Sprite {
    /// Keep the alpha channel only if the decoded image has one.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        if image.color().has_alpha() {
            Sprite::Translucent(image.into_rgba8())
        } else {
            Sprite::Opaque(image.into_rgb8())
        }
    }

    pub fn size(&self) -> Size {
        let (width, height) = match self {
            Sprite::Opaque(img) => img.dimensions(),
            Sprite::Translucent(img) => img.dimensions(),
        };
        Size { width, height }
    }
}

/// Composite `fg` onto `bg` with its top-left corner at `(x, y)`.
///
/// Opaque sprites overwrite the destination rectangle. Translucent sprites
/// blend each pixel as `fg * a + bg * (1 - a)` with `a = alpha / 255`,
/// rounded to the nearest integer.
pub fn overlay(bg: &mut RgbImage, fg: &Sprite, x: i32, y: i32) {
    match fg {
        Sprite::Opaque(img) => {
            for_each_overlap(bg, img.dimensions(), x, y, |bg, (fx, fy), (bx, by)| {
                bg.put_pixel(bx, by, *img.get_pixel(fx, fy));
            });
        }
        Sprite::Translucent(img) => {
            for_each_overlap(bg, img.dimensions(), x, y, |bg, (fx, fy), (bx, by)| {
                let [r, g, b, a] = img.get_pixel(fx, fy).0;
                let dst = bg.get_pixel_mut(bx, by);
                dst.0 = [
                    mix(r, dst.0[0], a),
                    mix(g, dst.0[1], a),
                    mix(b, dst.0[2], a),
                ];
            });
        }
    }
}

/// Visit every foreground pixel that lands inside `bg`, with its source and
/// destination coordinates.
fn for_each_overlap(
    bg: &mut RgbImage,
    (fw, fh): (u32, u32),
    x: i32,
    y: i32,
    mut f: impl FnMut(&mut RgbImage, (u32, u32), (u32, u32)),
) {
    let (bw, bh) = bg.dimensions();
    let fx0 = (-x).max(0) as i64;
    let fy0 = (-y).max(0) as i64;
    let fx1 = (fw as i64).min(bw as i64 - x as i64);
    let fy1 = (fh as i64).min(bh as i64 - y as i64);

    for fy in fy0..fy1.max(fy0) {
        for fx in fx0..fx1.max(fx0) {
            let bx = (fx + x as i64) as u32;
            let by = (fy + y as i64) as u32;
            f(bg, (fx as u32, fy as u32), (bx, by));
        }
    }
}

fn mix(fg: u8, bg: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((fg as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8
}

/// Blend `panel` over `frame` in place: `panel * weight + frame * (1 - weight)`.
///
/// Both images must share dimensions; the overlapping area is used otherwise.
pub fn blend(frame: &mut RgbImage, panel: &RgbImage, weight: f32) {
    let weight = weight.clamp(0.0, 1.0);
    let (w, h) = frame.dimensions();
    let (pw, ph) = panel.dimensions();
    for y in 0..h.min(ph) {
        for x in 0..w.min(pw) {
            let p = panel.get_pixel(x, y).0;
            let dst = frame.get_pixel_mut(x, y);
            for c in 0..3 {
                let v = p[c] as f32 * weight + dst.0[c] as f32 * (1.0 - weight);
                dst.0[c] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Draw translucent chrome: `draw` paints onto a copy of the frame, and the
/// copy is blended back with `weight`. Crisp content goes on afterwards.
pub fn with_translucent_panel(frame: &mut RgbImage, weight: f32, draw: impl FnOnce(&mut RgbImage)) {
    let mut panel = frame.clone();
    draw(&mut panel);
    blend(frame, &panel, weight);
}

/// A canvas of `size` filled with `color`.
pub fn solid(size: Size, color: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(size.width, size.height, color)
}
