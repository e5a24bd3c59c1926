//! Geometry — every interactive region of the map view, derived from state.
//!
//! `compute` is a pure function of the UI state and static inputs. The
//! renderer draws from the same `Regions` value the click handler tests
//! against, so what is drawn and what is clickable cannot drift apart.

use crate::atlas::{Atlas, LocationId};
use crate::config::ViewerConfig;
use crate::navigation::UiState;
use crate::text::TextRenderer;
use crate::types::{Point, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Circle { center: Point, radius: i32 },
    Rect(Rect),
    /// Everything outside the rectangle.
    Outside(Rect),
}

impl Shape {
    pub fn contains(&self, p: Point) -> bool {
        match *self {
            Shape::Circle { center, radius } => {
                center.distance_sq(p) <= (radius as i64) * (radius as i64)
            }
            Shape::Rect(r) => r.contains(p),
            Shape::Outside(r) => !r.contains(p),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    SelectLocation(LocationId),
    ToggleTime,
    OpenReferences,
    OpenVideo,
    DismissCard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractiveRegion {
    pub shape: Shape,
    pub target: Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub location: LocationId,
    pub anchor: Point,
    /// Current radius, enlarged while hovered.
    pub radius: i32,
    pub hovered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardPlacement {
    pub bounds: Rect,
    pub explore: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelButton {
    pub bounds: Rect,
    pub label_origin: Point,
}

/// Static inputs the geometry depends on besides the UI state.
pub struct LayoutInput<'a> {
    pub atlas: &'a Atlas,
    pub config: &'a ViewerConfig,
    pub map_size: Size,
    /// Size of the selected card, if one is selected and could be loaded.
    pub card_size: Option<Size>,
    pub text: &'a dyn TextRenderer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regions {
    pub toggle: Rect,
    pub references: LabelButton,
    pub selection: Option<LocationId>,
    pub card: Option<CardPlacement>,
    /// Active markers, in precedence order.
    pub markers: Vec<Marker>,
}

pub fn compute(state: &UiState, input: &LayoutInput<'_>) -> Regions {
    let config = input.config;
    let map_w = input.map_size.width as i32;
    let map_h = input.map_size.height as i32;

    let toggle = Rect::from_origin_size(
        config.toggle.origin.x,
        config.toggle.origin.y,
        config.toggle.size.width as i32,
        config.toggle.size.height as i32,
    );

    let refs = &config.references;
    let ref_x = map_w - refs.size.width as i32 - refs.margin - refs.shift;
    let ref_y = map_h - refs.size.height as i32 - refs.margin;
    let (tw, th) = input.text.measure(&refs.label, refs.label_size);
    let references = LabelButton {
        bounds: Rect::from_origin_size(ref_x, ref_y, tw as i32, th as i32)
            .inflate(refs.padding.x, refs.padding.y),
        label_origin: Point::new(ref_x, ref_y),
    };

    let selection = state.selected();
    let card = selection
        .and(input.card_size)
        .map(|size| place_card(input.map_size, size, config));

    let base = config.markers.radius;
    let markers = input
        .atlas
        .active(state.time())
        .iter()
        .map(|&location| {
            let anchor = input.atlas.location(location).anchor;
            let hovered = anchor.distance_sq(state.pointer) <= (base as i64) * (base as i64);
            Marker {
                location,
                anchor,
                radius: if hovered { base + config.markers.hover_increment } else { base },
                hovered,
            }
        })
        .collect();

    Regions {
        toggle,
        references,
        selection,
        card,
        markers,
    }
}

/// Card centred on the map; the explore band is centred horizontally under
/// it, ending `explore_margin_bottom` above the card's bottom edge.
fn place_card(map: Size, card: Size, config: &ViewerConfig) -> CardPlacement {
    let (cw, ch) = (card.width as i32, card.height as i32);
    let card_x = (map.width as i32 - cw).div_euclid(2);
    let card_y = (map.height as i32 - ch).div_euclid(2);

    let ew = config.card.explore_size.width as i32;
    let eh = config.card.explore_size.height as i32;
    let ex1 = card_x + (cw - ew).div_euclid(2);
    let ex2 = card_x + (cw + ew).div_euclid(2);
    let ey2 = card_y + ch - config.card.explore_margin_bottom;
    let ey1 = ey2 - eh;

    CardPlacement {
        bounds: Rect::from_origin_size(card_x, card_y, cw, ch),
        explore: Rect::from_corners(Point::new(ex1, ey1), Point::new(ex2, ey2)),
    }
}

impl Regions {
    /// All regions in precedence order: toggle, references, explore band,
    /// markers in active-list order, then the outside-the-card dismissal.
    pub fn interactive(&self) -> Vec<InteractiveRegion> {
        let mut regions = vec![
            InteractiveRegion {
                shape: Shape::Rect(self.toggle),
                target: Target::ToggleTime,
            },
            InteractiveRegion {
                shape: Shape::Rect(self.references.bounds),
                target: Target::OpenReferences,
            },
        ];

        if let Some(card) = &self.card {
            regions.push(InteractiveRegion {
                shape: Shape::Rect(card.explore),
                target: Target::OpenVideo,
            });
        }

        regions.extend(self.markers.iter().map(|m| InteractiveRegion {
            shape: Shape::Circle {
                center: m.anchor,
                radius: m.radius,
            },
            target: Target::SelectLocation(m.location),
        }));

        if self.selection.is_some() {
            // Without a loaded card, anywhere off a marker dismisses.
            let card = self.card.map_or(Rect::EMPTY, |c| c.bounds);
            regions.push(InteractiveRegion {
                shape: Shape::Outside(card),
                target: Target::DismissCard,
            });
        }

        regions
    }

    /// First region containing `p`, if any.
    pub fn hit(&self, p: Point) -> Option<Target> {
        self.interactive()
            .into_iter()
            .find(|r| r.shape.contains(p))
            .map(|r| r.target)
    }
}
