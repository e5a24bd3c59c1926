use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use image::{Rgb, RgbImage};
use pretty_assertions::assert_eq;

use map_explorer::app::Viewer;
use map_explorer::assets::AssetStore;
use map_explorer::atlas::{Atlas, AtlasSource, LocationId, SourceRef, TimeState};
use map_explorer::compositor::Sprite;
use map_explorer::config::ViewerConfig;
use map_explorer::error::{AssetLoadError, DecodeError, SourceUnavailable, SurfaceError};
use map_explorer::navigation::Mode;
use map_explorer::playback::{VideoDecoder, VideoOpener};
use map_explorer::surface::{InputEvent, Surface, Window};
use map_explorer::types::{Point, Size};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Records everything the viewer shows and replays scripted input, one
/// batch per poll. Once the script runs out every poll returns the quit key.
#[derive(Default)]
struct ScriptedSurface {
    log: Vec<String>,
    script: VecDeque<Vec<InputEvent>>,
}

impl ScriptedSurface {
    fn explore_events(&self) -> Vec<&str> {
        self.log
            .iter()
            .filter(|l| l.contains("Explore"))
            .map(String::as_str)
            .collect()
    }
}

impl Surface for ScriptedSurface {
    fn open_window(&mut self, window: Window, size: Size) -> Result<(), SurfaceError> {
        self.log.push(format!("open {window:?} {}x{}", size.width, size.height));
        Ok(())
    }

    fn close_window(&mut self, window: Window) -> Result<(), SurfaceError> {
        self.log.push(format!("close {window:?}"));
        Ok(())
    }

    fn present(&mut self, window: Window, _: &RgbImage) -> Result<(), SurfaceError> {
        self.log.push(format!("present {window:?}"));
        Ok(())
    }

    /// Each batch arrives at the end of the wait, as a real terminal would
    /// deliver it after an idle poll.
    fn poll(&mut self, timeout: Duration) -> Result<Vec<InputEvent>, SurfaceError> {
        std::thread::sleep(timeout);
        Ok(self.script.pop_front().unwrap_or_else(|| vec![key(KeyCode::Esc)]))
    }
}

#[derive(Clone, Default)]
struct CountingStore {
    loads: Rc<RefCell<Vec<(LocationId, TimeState)>>>,
    missing: bool,
}

impl AssetStore for CountingStore {
    fn load_card(&self, location: LocationId, time: TimeState) -> Result<Sprite, AssetLoadError> {
        self.loads.borrow_mut().push((location, time));
        if self.missing {
            return Err(AssetLoadError::Missing {
                path: PathBuf::from("card.png"),
            });
        }
        Ok(Sprite::Opaque(RgbImage::from_pixel(300, 300, Rgb([200, 180, 150]))))
    }
}

struct Frames {
    left: usize,
    released: Rc<Cell<usize>>,
}

impl VideoDecoder for Frames {
    fn frame_rate(&self) -> Option<f64> {
        Some(1000.0)
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, DecodeError> {
        if self.left == 0 {
            return Ok(None);
        }
        self.left -= 1;
        Ok(Some(RgbImage::new(64, 48)))
    }
}

impl Drop for Frames {
    fn drop(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}

/// Sources are looked up by path; unknown paths cannot be opened.
#[derive(Clone, Default)]
struct FakeOpener {
    frames: HashMap<PathBuf, usize>,
    opened: Rc<RefCell<Vec<PathBuf>>>,
    released: Rc<Cell<usize>>,
}

impl VideoOpener for FakeOpener {
    fn open(&self, source: &SourceRef) -> Result<Box<dyn VideoDecoder>, SourceUnavailable> {
        let left = *self.frames.get(&source.path).ok_or_else(|| SourceUnavailable {
            path: source.path.clone(),
            reason: "no such source".into(),
        })?;
        self.opened.borrow_mut().push(source.path.clone());
        Ok(Box::new(Frames {
            left,
            released: Rc::clone(&self.released),
        }))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn atlas() -> Atlas {
    let source: AtlasSource = serde_json::from_str(
        r#"{
            "background": "map.png",
            "locations": [
                { "name": "A", "anchor": [100, 100], "video": { "dawn": "a-day", "dusk": "a-night" } },
                { "name": "B", "anchor": [400, 100], "video": "b" }
            ],
            "states": {
                "dawn": { "label": "5AM", "active": ["A", "B"] },
                "dusk": { "label": "8PM", "active": ["A"] }
            }
        }"#,
    )
    .unwrap();
    Atlas::from_source(source, Path::new("")).unwrap()
}

fn viewer(store: CountingStore, opener: FakeOpener) -> Viewer<CountingStore, FakeOpener> {
    let map = Sprite::Opaque(RgbImage::from_pixel(1000, 800, Rgb([40, 90, 60])));
    let mut config = ViewerConfig::default();
    config.playback.map_poll_ms = 1;
    Viewer::new(atlas(), config, store, opener).with_background(&map)
}

fn click(x: i32, y: i32) -> InputEvent {
    InputEvent::PointerPressed(Point::new(x, y))
}

fn key(code: KeyCode) -> InputEvent {
    InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

/// Run one tick with `events` as the result of its poll.
fn step(
    viewer: &mut Viewer<CountingStore, FakeOpener>,
    surface: &mut ScriptedSurface,
    events: Vec<InputEvent>,
) {
    surface.script.push_back(events);
    let flow = viewer.tick(surface).unwrap();
    assert!(flow.is_continue());
}

const EXPLORE: (i32, i32) = (500, 430);

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn select_dismiss_and_toggle() {
    let mut v = viewer(CountingStore::default(), FakeOpener::default());
    let mut surface = ScriptedSurface::default();
    let a = atlas().find("A").unwrap();

    step(&mut v, &mut surface, vec![click(100, 100)]);
    assert_eq!(v.state().mode(), &Mode::CardOpen { location: a });

    step(&mut v, &mut surface, vec![click(250, 250)]);
    assert_eq!(v.state().mode(), &Mode::MapIdle);

    step(&mut v, &mut surface, vec![click(100, 450)]);
    assert_eq!(v.state().time(), TimeState::Dusk);
    assert_eq!(v.state().selected(), None);
}

#[test]
fn events_in_one_poll_apply_in_order() {
    let mut v = viewer(CountingStore::default(), FakeOpener::default());
    let mut surface = ScriptedSurface::default();
    let b = atlas().find("B").unwrap();

    step(&mut v, &mut surface, vec![click(100, 100), click(250, 250), click(400, 100)]);
    assert_eq!(v.state().mode(), &Mode::CardOpen { location: b });
}

#[test]
fn each_card_is_loaded_once() {
    let store = CountingStore::default();
    let mut v = viewer(store.clone(), FakeOpener::default());
    let mut surface = ScriptedSurface::default();
    let a = atlas().find("A").unwrap();

    step(&mut v, &mut surface, vec![click(100, 100)]);
    step(&mut v, &mut surface, vec![]);
    step(&mut v, &mut surface, vec![click(250, 250)]);
    step(&mut v, &mut surface, vec![click(100, 100)]);
    step(&mut v, &mut surface, vec![]);

    assert_eq!(*store.loads.borrow(), vec![(a, TimeState::Dawn)]);
}

#[test]
fn missing_card_is_tried_once_and_any_click_dismisses() {
    let store = CountingStore {
        missing: true,
        ..Default::default()
    };
    let mut v = viewer(store.clone(), FakeOpener::default());
    let mut surface = ScriptedSurface::default();

    step(&mut v, &mut surface, vec![click(100, 100)]);
    step(&mut v, &mut surface, vec![]);
    assert!(matches!(v.state().mode(), Mode::CardOpen { .. }));

    // Where the explore band would be: without a card it just dismisses.
    step(&mut v, &mut surface, vec![click(EXPLORE.0, EXPLORE.1)]);
    assert_eq!(v.state().mode(), &Mode::MapIdle);
    assert!(!v.is_playing());
    assert_eq!(store.loads.borrow().len(), 1);
}

#[test]
fn zero_frame_source_returns_to_the_card_without_showing_anything() {
    let opener = FakeOpener {
        frames: HashMap::from([(PathBuf::from("a-day"), 0)]),
        ..Default::default()
    };
    let mut v = viewer(CountingStore::default(), opener.clone());
    let mut surface = ScriptedSurface::default();
    let a = atlas().find("A").unwrap();

    step(&mut v, &mut surface, vec![click(100, 100)]);
    step(&mut v, &mut surface, vec![click(EXPLORE.0, EXPLORE.1)]);
    assert!(v.is_playing());

    step(&mut v, &mut surface, vec![]);
    assert!(!v.is_playing());
    assert_eq!(v.state().mode(), &Mode::CardOpen { location: a });
    assert!(surface.explore_events().is_empty());
    assert_eq!(opener.released.get(), 1);
}

#[test]
fn unavailable_source_keeps_the_card_open() {
    let mut v = viewer(CountingStore::default(), FakeOpener::default());
    let mut surface = ScriptedSurface::default();
    let a = atlas().find("A").unwrap();

    step(&mut v, &mut surface, vec![click(100, 100)]);
    step(&mut v, &mut surface, vec![click(EXPLORE.0, EXPLORE.1)]);

    assert!(!v.is_playing());
    assert_eq!(v.state().mode(), &Mode::CardOpen { location: a });
}

#[test]
fn cancel_during_playback_returns_to_the_card() {
    let opener = FakeOpener {
        frames: HashMap::from([(PathBuf::from("a-day"), 10)]),
        ..Default::default()
    };
    let mut v = viewer(CountingStore::default(), opener.clone());
    let mut surface = ScriptedSurface::default();
    let a = atlas().find("A").unwrap();

    step(&mut v, &mut surface, vec![click(100, 100)]);
    step(&mut v, &mut surface, vec![click(EXPLORE.0, EXPLORE.1)]);
    // Clicks during playback never reach the map.
    step(&mut v, &mut surface, vec![click(400, 100)]);
    step(&mut v, &mut surface, vec![key(KeyCode::Char('q'))]);

    assert!(!v.is_playing());
    assert_eq!(v.state().mode(), &Mode::CardOpen { location: a });
    assert_eq!(
        surface.explore_events(),
        vec!["open Explore 64x48", "present Explore", "present Explore", "close Explore"],
    );
    assert_eq!(opener.released.get(), 1);
}

#[test]
fn video_follows_the_time_state() {
    let opener = FakeOpener {
        frames: HashMap::from([(PathBuf::from("a-day"), 1), (PathBuf::from("a-night"), 1)]),
        ..Default::default()
    };
    let mut v = viewer(CountingStore::default(), opener.clone());
    let mut surface = ScriptedSurface::default();

    step(&mut v, &mut surface, vec![click(100, 450)]);
    step(&mut v, &mut surface, vec![click(100, 100)]);
    step(&mut v, &mut surface, vec![click(EXPLORE.0, EXPLORE.1)]);

    assert_eq!(*opener.opened.borrow(), vec![PathBuf::from("a-night")]);
}

#[test]
fn references_overlay_opens_and_cancels_back() {
    let mut v = viewer(CountingStore::default(), FakeOpener::default());
    let mut surface = ScriptedSurface::default();
    let a = atlas().find("A").unwrap();

    step(&mut v, &mut surface, vec![click(100, 100)]);
    // Label anchored at (1000 - 180 - 20 - 20, 800 - 60 - 20).
    step(&mut v, &mut surface, vec![click(780, 720)]);
    assert!(matches!(v.state().mode(), Mode::References { .. }));

    step(&mut v, &mut surface, vec![click(100, 100)]);
    assert!(matches!(v.state().mode(), Mode::References { .. }));

    step(&mut v, &mut surface, vec![key(KeyCode::Char('q'))]);
    assert_eq!(v.state().mode(), &Mode::CardOpen { location: a });
}

#[test]
fn quit_during_playback_ends_the_run() {
    let opener = FakeOpener {
        frames: HashMap::from([(PathBuf::from("b"), 100)]),
        ..Default::default()
    };
    let mut v = viewer(CountingStore::default(), opener.clone());
    let mut surface = ScriptedSurface {
        script: VecDeque::from(vec![vec![click(400, 100)], vec![click(EXPLORE.0, EXPLORE.1)], vec![]]),
        ..Default::default()
    };

    v.run(&mut surface).unwrap();

    assert_eq!(surface.log.first().map(String::as_str), Some("open Map 1000x800"));
    assert_eq!(surface.log.last().map(String::as_str), Some("close Map"));
    assert!(surface.log.contains(&"close Explore".to_string()));
    assert_eq!(opener.released.get(), 1);
}
