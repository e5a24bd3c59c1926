use crossterm::event::KeyEvent;
use tracing::info;

use crate::atlas::LocationId;
use crate::config::{matches_binding, KeyBindings};
use crate::geometry::{Regions, Target};
use crate::surface::InputEvent;
use crate::types::Point;

use super::{Mode, UiState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Continue,
    Redraw,
    Quit,
    /// The explore band was clicked; the caller opens the video and, on
    /// success, moves the state into playback.
    StartPlayback { location: LocationId },
}

/// Apply one input event to `state`.
///
/// `regions` is only called for pointer presses, after the pointer position
/// has been updated, so hover-dependent geometry reflects the click itself.
pub fn handle_event(
    state: &mut UiState,
    event: &InputEvent,
    bindings: &KeyBindings,
    regions: impl FnOnce(&UiState) -> Regions,
) -> Action {
    match event {
        InputEvent::PointerMoved(p) => {
            state.pointer = *p;
            Action::Redraw
        }
        InputEvent::PointerPressed(p) => handle_press(state, *p, regions),
        InputEvent::Key(key) => handle_key(state, key, bindings),
        InputEvent::Resized => Action::Redraw,
    }
}

fn handle_key(state: &mut UiState, key: &KeyEvent, bindings: &KeyBindings) -> Action {
    // Global: works from any mode
    if matches_binding(&bindings.quit, key) {
        return Action::Quit;
    }

    if matches_binding(&bindings.cancel, key) && matches!(state.mode(), Mode::References { .. }) {
        state.close_references();
        info!(mode = ?state.mode(), "references closed");
        return Action::Redraw;
    }

    Action::Continue
}

fn handle_press(state: &mut UiState, p: Point, regions: impl FnOnce(&UiState) -> Regions) -> Action {
    state.pointer = p;

    // Overlays own the pointer while they are up.
    if matches!(state.mode(), Mode::References { .. } | Mode::Playback { .. }) {
        return Action::Continue;
    }

    match regions(state).hit(p) {
        Some(Target::ToggleTime) => {
            state.toggle_time();
            info!(time = %state.time(), "time state toggled");
        }
        Some(Target::OpenReferences) => {
            state.open_references();
            info!("references opened");
        }
        Some(Target::OpenVideo) => {
            if let Mode::CardOpen { location } = *state.mode() {
                return Action::StartPlayback { location };
            }
        }
        Some(Target::SelectLocation(location)) => {
            state.select(location);
            info!(location = location.index(), "location selected");
        }
        Some(Target::DismissCard) => {
            state.dismiss();
            info!("card dismissed");
        }
        None => {}
    }
    Action::Redraw
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crossterm::event::{KeyCode, KeyModifiers};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::atlas::{Atlas, AtlasSource, TimeState};
    use crate::config::ViewerConfig;
    use crate::geometry::{compute, LayoutInput};
    use crate::text::BlockFont;
    use crate::types::Size;

    struct Fixture {
        atlas: Atlas,
        config: ViewerConfig,
        state: UiState,
    }

    impl Fixture {
        fn new() -> Self {
            let source: AtlasSource = serde_json::from_str(
                r#"{
                    "background": "map.png",
                    "locations": [
                        { "name": "A", "anchor": [100, 100], "video": "a" },
                        { "name": "B", "anchor": [400, 100], "video": "b" }
                    ],
                    "states": {
                        "dawn": { "label": "5AM", "active": ["A", "B"] },
                        "dusk": { "label": "8PM", "active": ["B"] }
                    }
                }"#,
            )
            .unwrap();
            Fixture {
                atlas: Atlas::from_source(source, Path::new(".")).unwrap(),
                config: ViewerConfig::default(),
                state: UiState::new(),
            }
        }

        fn send(&mut self, event: InputEvent) -> Action {
            let Fixture { atlas, config, state } = self;
            let (atlas, config) = (&*atlas, &*config);
            handle_event(state, &event, &config.key_bindings, |s| {
                compute(
                    s,
                    &LayoutInput {
                        atlas,
                        config,
                        map_size: Size::new(1000, 800),
                        card_size: Some(Size::new(300, 300)),
                        text: &BlockFont,
                    },
                )
            })
        }

        fn click(&mut self, x: i32, y: i32) -> Action {
            self.send(InputEvent::PointerPressed(Point::new(x, y)))
        }

        fn key(&mut self, code: KeyCode) -> Action {
            self.send(InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
        }

        fn id(&self, name: &str) -> LocationId {
            self.atlas.find(name).unwrap()
        }
    }

    #[test]
    fn select_then_dismiss_then_toggle() {
        let mut f = Fixture::new();
        let a = f.id("A");

        f.click(100, 100);
        assert_eq!(f.state.mode(), &Mode::CardOpen { location: a });

        f.click(250, 250);
        assert_eq!(f.state.mode(), &Mode::MapIdle);

        f.click(80, 430);
        assert_eq!(f.state.time(), TimeState::Dusk);
        assert_eq!(f.state.selected(), None);
    }

    #[test]
    fn toggling_twice_round_trips() {
        let mut f = Fixture::new();
        f.click(100, 450);
        f.click(100, 450);
        assert_eq!(f.state.time(), TimeState::Dawn);
        assert_eq!(f.state.mode(), &Mode::MapIdle);
    }

    #[test]
    fn clicking_another_marker_replaces_the_selection() {
        let mut f = Fixture::new();
        f.click(100, 100);
        f.click(400, 100);
        assert_eq!(f.state.mode(), &Mode::CardOpen { location: f.id("B") });
    }

    #[test]
    fn toggle_from_card_clears_selection() {
        let mut f = Fixture::new();
        f.click(100, 100);
        f.click(80, 430);
        assert_eq!(f.state.mode(), &Mode::MapIdle);
        assert_eq!(f.state.time(), TimeState::Dusk);
    }

    #[test]
    fn explore_band_requests_playback_without_changing_mode() {
        let mut f = Fixture::new();
        let a = f.id("A");
        f.click(100, 100);
        // 300x300 card on 1000x800: band spans x 400..600, y 400..460.
        let action = f.click(500, 430);
        assert_eq!(action, Action::StartPlayback { location: a });
        assert_eq!(f.state.mode(), &Mode::CardOpen { location: a });
    }

    #[test]
    fn references_overlay_swallows_clicks_and_cancels_back() {
        let mut f = Fixture::new();
        let a = f.id("A");
        f.click(100, 100);

        let refs = f.state.clone();
        let origin = {
            let Fixture { atlas, config, .. } = &f;
            compute(
                &refs,
                &LayoutInput {
                    atlas,
                    config,
                    map_size: Size::new(1000, 800),
                    card_size: Some(Size::new(300, 300)),
                    text: &BlockFont,
                },
            )
            .references
            .label_origin
        };
        f.click(origin.x, origin.y);
        assert!(matches!(f.state.mode(), Mode::References { .. }));

        assert_eq!(f.click(400, 100), Action::Continue);
        assert!(matches!(f.state.mode(), Mode::References { .. }));

        assert_eq!(f.key(KeyCode::Char('q')), Action::Redraw);
        assert_eq!(f.state.mode(), &Mode::CardOpen { location: a });
    }

    #[test]
    fn quit_works_from_any_mode_and_cancel_is_inert_on_the_map() {
        let mut f = Fixture::new();
        assert_eq!(f.key(KeyCode::Char('q')), Action::Continue);
        assert_eq!(f.key(KeyCode::Esc), Action::Quit);

        f.state.open_references();
        assert_eq!(f.key(KeyCode::Esc), Action::Quit);
    }

    #[test]
    fn pointer_moves_update_hover_position() {
        let mut f = Fixture::new();
        assert_eq!(f.send(InputEvent::PointerMoved(Point::new(7, 9))), Action::Redraw);
        assert_eq!(f.state.pointer, Point::new(7, 9));
        assert_eq!(f.state.mode(), &Mode::MapIdle);
    }
}
