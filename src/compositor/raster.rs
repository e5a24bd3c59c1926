//! Raster primitives used for UI chrome. All of them clip to the canvas.

use image::{Rgb, RgbImage};

use crate::types::{Point, Rect};

fn put(canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

/// Fill `rect`, corners included.
pub fn fill_rect(canvas: &mut RgbImage, rect: Rect, color: Rgb<u8>) {
    let x1 = rect.x1.max(0);
    let y1 = rect.y1.max(0);
    let x2 = rect.x2.min(canvas.width() as i32 - 1);
    let y2 = rect.y2.min(canvas.height() as i32 - 1);
    for y in y1..=y2 {
        for x in x1..=x2 {
            canvas.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Whether a square of half-size `extent` around `center` misses the canvas.
fn off_canvas(canvas: &RgbImage, center: Point, extent: i32) -> bool {
    let (cx, cy, e) = (i64::from(center.x), i64::from(center.y), i64::from(extent));
    cx + e < 0 || cy + e < 0 || cx - e >= i64::from(canvas.width()) || cy - e >= i64::from(canvas.height())
}

pub fn fill_circle(canvas: &mut RgbImage, center: Point, radius: i32, color: Rgb<u8>) {
    if off_canvas(canvas, center, radius) {
        return;
    }
    let r_sq = (radius as i64) * (radius as i64);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if (dx as i64) * (dx as i64) + (dy as i64) * (dy as i64) <= r_sq {
                put(canvas, center.x + dx, center.y + dy, color);
            }
        }
    }
}

/// A ring of the given thickness centred on `radius`.
pub fn stroke_circle(canvas: &mut RgbImage, center: Point, radius: i32, thickness: u32, color: Rgb<u8>) {
    let half = thickness.max(1) as f32 / 2.0;
    let outer = (radius as f32 + half).ceil() as i32;
    if off_canvas(canvas, center, outer) {
        return;
    }
    for dy in -outer..=outer {
        for dx in -outer..=outer {
            let d = ((dx * dx + dy * dy) as f32).sqrt();
            if (d - radius as f32).abs() <= half {
                put(canvas, center.x + dx, center.y + dy, color);
            }
        }
    }
}

/// Bresenham line, stamped with a disc when thicker than one pixel.
pub fn draw_line(canvas: &mut RgbImage, from: Point, to: Point, thickness: u32, color: Rgb<u8>) {
    let stamp = (thickness as i32 - 1) / 2;
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (from.x, from.y);

    loop {
        if stamp > 0 {
            fill_circle(canvas, Point::new(x, y), stamp, color);
        } else {
            put(canvas, x, y, color);
        }
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
