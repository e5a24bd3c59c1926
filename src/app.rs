//! Viewer — the single-threaded scheduler.
//!
//! Each tick advances exactly one of two things: the playback session if
//! one is running, otherwise the map view (draw, present, poll, dispatch).
//! No input reaches the map while a session is alive.

use std::ops::ControlFlow;
use std::rc::Rc;
use std::time::Duration;

use image::RgbImage;
use tracing::{info, warn};

use crate::assets::{AssetCache, AssetStore};
use crate::atlas::{Atlas, LocationId};
use crate::compositor::{self, Sprite};
use crate::config::ViewerConfig;
use crate::error::SurfaceError;
use crate::geometry::{self, LayoutInput, Regions};
use crate::navigation::{self, Action, Mode, UiState};
use crate::playback::{PlaybackSession, SessionEnd, Step, VideoOpener};
use crate::renderer::{self, Scene};
use crate::surface::{InputEvent, Surface, Window};
use crate::text::{BlockFont, TextRenderer};
use crate::types::Size;

pub struct Viewer<S, O> {
    atlas: Atlas,
    config: ViewerConfig,
    text: Box<dyn TextRenderer>,
    background: RgbImage,
    references: Option<Sprite>,
    cache: AssetCache<S>,
    opener: O,
    state: UiState,
    session: Option<PlaybackSession>,
}

impl<S: AssetStore, O: VideoOpener> Viewer<S, O> {
    /// A viewer over a plain fallback canvas, with no reference panel and
    /// the built-in block font.
    pub fn new(atlas: Atlas, config: ViewerConfig, store: S, opener: O) -> Self {
        let background = compositor::solid(config.fallback_size, config.palette.background.to_pixel());
        Viewer {
            atlas,
            config,
            text: Box::new(BlockFont),
            background,
            references: None,
            cache: AssetCache::new(store),
            opener,
            state: UiState::new(),
            session: None,
        }
    }

    /// Use `image` as the map. Transparent areas show the background color.
    pub fn with_background(mut self, image: &Sprite) -> Self {
        let mut canvas = compositor::solid(image.size(), self.config.palette.background.to_pixel());
        compositor::overlay(&mut canvas, image, 0, 0);
        self.background = canvas;
        self
    }

    pub fn with_references(mut self, panel: Sprite) -> Self {
        self.references = Some(panel);
        self
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    pub fn map_size(&self) -> Size {
        Size::of(&self.background)
    }

    /// Drive the viewer until the user quits. Only surface failures end it
    /// with an error.
    pub fn run(&mut self, surface: &mut dyn Surface) -> Result<(), SurfaceError> {
        surface.open_window(Window::Map, self.map_size())?;
        info!(locations = self.atlas.locations().count(), "viewer started");

        while self.tick(surface)?.is_continue() {}

        if let Some(session) = self.session.take() {
            session.close(surface)?;
        }
        surface.close_window(Window::Map)?;
        info!("viewer stopped");
        Ok(())
    }

    pub fn tick(&mut self, surface: &mut dyn Surface) -> Result<ControlFlow<()>, SurfaceError> {
        if let Some(session) = self.session.as_mut() {
            let end = match session.tick(surface, &self.config.key_bindings)? {
                Step::Running => return Ok(ControlFlow::Continue(())),
                Step::Finished(end) => end,
            };
            if let Some(session) = self.session.take() {
                info!(?end, frames = session.frames_shown(), "playback finished");
                session.close(surface)?;
            }
            self.state.leave_playback();
            return Ok(match end {
                SessionEnd::Quit => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            });
        }

        let frame = self.render();
        surface.present(Window::Map, &frame)?;

        let timeout = Duration::from_millis(self.config.playback.map_poll_ms);
        for event in surface.poll(timeout)? {
            match self.handle(&event) {
                Action::Quit => return Ok(ControlFlow::Break(())),
                Action::StartPlayback { location } => self.start_playback(location),
                Action::Continue | Action::Redraw => {}
            }
            // The map stops listening once a video is up.
            if self.session.is_some() {
                break;
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn render(&mut self) -> RgbImage {
        let Viewer {
            atlas,
            config,
            text,
            background,
            references,
            cache,
            state,
            ..
        } = self;
        let scene = Scene {
            atlas,
            config,
            background,
            text: &**text,
        };

        if let Mode::References { .. } = state.mode() {
            return renderer::render_references(&scene, references.as_ref());
        }
        let (regions, card) = layout(&scene, cache, state);
        renderer::render_map(&scene, state, &regions, card.as_deref())
    }

    fn handle(&mut self, event: &InputEvent) -> Action {
        let Viewer {
            atlas,
            config,
            text,
            background,
            cache,
            state,
            ..
        } = self;
        let scene = Scene {
            atlas,
            config,
            background,
            text: &**text,
        };
        navigation::handle_event(state, event, &config.key_bindings, |s| layout(&scene, cache, s).0)
    }

    fn start_playback(&mut self, location: LocationId) {
        let source = self.atlas.source_for(location, self.state.time());
        match self.opener.open(source) {
            Ok(decoder) => {
                let session = PlaybackSession::new(decoder, self.config.playback.default_fps);
                info!(
                    location = location.index(),
                    path = %source.path.display(),
                    interval_ms = session.interval().as_millis() as u64,
                    "playback started"
                );
                self.session = Some(session);
                self.state.enter_playback();
            }
            Err(e) => warn!("{e}"),
        }
    }
}

/// Regions for `state`, plus the selected card if it could be loaded.
fn layout<S: AssetStore>(
    scene: &Scene<'_>,
    cache: &mut AssetCache<S>,
    state: &UiState,
) -> (Regions, Option<Rc<Sprite>>) {
    let card = state
        .selected()
        .and_then(|location| cache.get(location, state.time()).ok());
    let regions = geometry::compute(
        state,
        &LayoutInput {
            atlas: scene.atlas,
            config: scene.config,
            map_size: scene.map_size(),
            card_size: card.as_deref().map(Sprite::size),
            text: scene.text,
        },
    );
    (regions, card)
}
