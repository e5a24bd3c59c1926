//! Renderer — composes the map view and the references overlay.
//!
//! Rendering is pure: a frame is a function of the static scene, the UI
//! state and the already-computed `Regions`. The renderer never decides
//! where something is; it draws what geometry placed.

use image::{Rgb, RgbImage};

use crate::atlas::Atlas;
use crate::compositor::{self, Sprite};
use crate::config::ViewerConfig;
use crate::geometry::{Marker, Regions};
use crate::navigation::UiState;
use crate::text::TextRenderer;
use crate::types::{Point, Rect, Size};

const MISSING_REFERENCES: &str = "References unavailable";

/// Everything that stays the same from frame to frame.
pub struct Scene<'a> {
    pub atlas: &'a Atlas,
    pub config: &'a ViewerConfig,
    pub background: &'a RgbImage,
    pub text: &'a dyn TextRenderer,
}

impl Scene<'_> {
    pub fn map_size(&self) -> Size {
        Size::of(self.background)
    }

    fn text_at(&self, canvas: &mut RgbImage, text: &str, origin: Point, size: u32, color: Rgb<u8>) {
        self.text.draw(canvas, text, origin, size, color);
    }
}

/// The map with markers and chrome, then the intro text, the selected card
/// and finally the references label, which stays visible over the card.
pub fn render_map(scene: &Scene<'_>, state: &UiState, regions: &Regions, card: Option<&Sprite>) -> RgbImage {
    let mut frame = scene.background.clone();

    for marker in &regions.markers {
        draw_marker(scene, &mut frame, marker);
        if marker.hovered {
            draw_hover_label(scene, &mut frame, marker);
        }
    }
    draw_toggle(scene, &mut frame, state, regions.toggle);
    draw_intro(scene, &mut frame);

    if let (Some(placement), Some(card)) = (regions.card, card) {
        compositor::overlay(&mut frame, card, placement.bounds.x1, placement.bounds.y1);
    }

    let refs = &scene.config.references;
    scene.text_at(
        &mut frame,
        &refs.label,
        regions.references.label_origin,
        refs.label_size,
        scene.config.palette.text.to_pixel(),
    );

    frame
}

/// The bare map with the reference panel centred over it.
pub fn render_references(scene: &Scene<'_>, panel: Option<&Sprite>) -> RgbImage {
    let mut frame = scene.background.clone();
    let map = scene.map_size();

    match panel {
        Some(panel) => {
            let size = panel.size();
            let x = (map.width as i32 - size.width as i32).div_euclid(2);
            let y = (map.height as i32 - size.height as i32).div_euclid(2);
            compositor::overlay(&mut frame, panel, x, y);
        }
        None => {
            let size = scene.config.references.label_size;
            let (w, h) = scene.text.measure(MISSING_REFERENCES, size);
            let origin = Point::new(
                (map.width as i32 - w as i32).div_euclid(2),
                (map.height as i32 - h as i32).div_euclid(2),
            );
            backdrop(scene, &mut frame, Rect::from_origin_size(origin.x, origin.y, w as i32, h as i32));
            scene.text_at(&mut frame, MISSING_REFERENCES, origin, size, scene.config.palette.text.to_pixel());
        }
    }

    frame
}

fn draw_intro(scene: &Scene<'_>, frame: &mut RgbImage) {
    let intro = &scene.config.intro;
    let color = scene.config.palette.text.to_pixel();
    let x = scene.config.toggle.origin.x;
    let mut y = intro.title_y;

    if !scene.atlas.title.is_empty() {
        scene.text_at(frame, &scene.atlas.title, Point::new(x, y), intro.title_size, color);
        let (_, h) = scene.text.measure(&scene.atlas.title, intro.title_size);
        y += h as i32 + intro.title_gap;
    }

    for line in textwrap::wrap(&scene.atlas.blurb, intro.wrap_width) {
        scene.text_at(frame, &line, Point::new(x, y), intro.body_size, color);
        let (_, h) = scene.text.measure(&line, intro.body_size);
        y += h as i32 + intro.line_gap;
    }
}

fn draw_marker(scene: &Scene<'_>, frame: &mut RgbImage, marker: &Marker) {
    let cfg = &scene.config.markers;
    let color = scene.config.palette.marker.to_pixel();
    let thickness = if marker.hovered { cfg.hover_ring_thickness } else { cfg.ring_thickness };
    compositor::stroke_circle(frame, marker.anchor, marker.radius, thickness, color);
    compositor::fill_circle(frame, marker.anchor, cfg.dot_radius, color);
}

/// Leader line from the anchor, then the location name on a dimmed panel.
fn draw_hover_label(scene: &Scene<'_>, frame: &mut RgbImage, marker: &Marker) {
    let cfg = &scene.config.label;
    let color = scene.config.palette.text.to_pixel();
    let name = &scene.atlas.location(marker.location).name;

    let end = marker.anchor.offset(cfg.leader.x, cfg.leader.y);
    compositor::draw_line(frame, marker.anchor, end, cfg.leader_thickness, color);

    let origin = end.offset(cfg.text_offset.x, cfg.text_offset.y);
    let (w, h) = scene.text.measure(name, cfg.text_size);
    backdrop(scene, frame, Rect::from_origin_size(origin.x, origin.y, w as i32, h as i32));
    scene.text_at(frame, name, origin, cfg.text_size, color);
}

fn draw_toggle(scene: &Scene<'_>, frame: &mut RgbImage, state: &UiState, bounds: Rect) {
    let cfg = &scene.config.toggle;
    let palette = &scene.config.palette;
    compositor::fill_rect(frame, bounds, palette.button_bg.to_pixel());

    let label = scene.atlas.label(state.time());
    let (w, h) = scene.text.measure(label, cfg.label_size);
    let origin = Point::new(
        bounds.x1 + (bounds.width() - w as i32).div_euclid(2),
        bounds.y1 + (bounds.height() - h as i32).div_euclid(2),
    );
    scene.text_at(frame, label, origin, cfg.label_size, palette.button_text.to_pixel());
}

/// Translucent panel behind `text_bounds`, grown by the label padding.
fn backdrop(scene: &Scene<'_>, frame: &mut RgbImage, text_bounds: Rect) {
    let cfg = &scene.config.label;
    let panel = text_bounds.inflate(cfg.panel_padding, cfg.panel_padding);
    let color = scene.config.palette.label_panel.to_pixel();
    compositor::with_translucent_panel(frame, cfg.panel_weight, |p| compositor::fill_rect(p, panel, color));
}
