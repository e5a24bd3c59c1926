//! Playback — the modal video session.
//!
//! A session is a nested mode with its own `tick`: decode one frame, show
//! it, then keep polling input until one frame interval has passed. Only
//! the cancel and quit keys cut the wait short. The viewer loop
//! calls `tick` instead of drawing the map while a session exists, so the
//! map is never interactive during playback.

mod sequence;

use std::time::{Duration, Instant};

use image::RgbImage;
use tracing::{debug, warn};

pub use sequence::{ImageSequence, SequenceOpener};

use crate::atlas::SourceRef;
use crate::config::{matches_binding, KeyBindings};
use crate::error::{DecodeError, SourceUnavailable, SurfaceError};
use crate::surface::{InputEvent, Surface, Window};
use crate::types::Size;

/// Frame source for one playback. Decoding resources are released on drop.
pub trait VideoDecoder {
    /// Rate reported by the source, if it knows one.
    fn frame_rate(&self) -> Option<f64>;

    /// `Ok(None)` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<RgbImage>, DecodeError>;
}

pub trait VideoOpener {
    fn open(&self, source: &SourceRef) -> Result<Box<dyn VideoDecoder>, SourceUnavailable>;
}

/// Reported rate if it is usable, `default` otherwise.
pub fn effective_fps(reported: Option<f64>, default: f64) -> f64 {
    match reported {
        Some(fps) if fps.is_finite() && fps > 0.0 => fps,
        _ => default,
    }
}

/// `1000 / fps` milliseconds, truncated, never below 1 ms.
pub fn frame_interval(fps: f64) -> Duration {
    let ms = (1000.0 / fps) as u64;
    Duration::from_millis(ms.max(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Exhausted,
    DecodeFailed,
    Cancelled,
    /// The quit key was pressed; the whole application should stop.
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Running,
    Finished(SessionEnd),
}

pub struct PlaybackSession {
    decoder: Option<Box<dyn VideoDecoder>>,
    interval: Duration,
    window_open: bool,
    frames_shown: usize,
}

impl PlaybackSession {
    pub fn new(decoder: Box<dyn VideoDecoder>, default_fps: f64) -> Self {
        let fps = effective_fps(decoder.frame_rate(), default_fps);
        debug!(fps, "playback session created");
        PlaybackSession {
            decoder: Some(decoder),
            interval: frame_interval(fps),
            window_open: false,
            frames_shown: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn frames_shown(&self) -> usize {
        self.frames_shown
    }

    /// Advance by one frame. The explore window is opened lazily, sized to
    /// the first frame, so an empty source never shows anything.
    pub fn tick(&mut self, surface: &mut dyn Surface, bindings: &KeyBindings) -> Result<Step, SurfaceError> {
        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(Step::Finished(SessionEnd::Exhausted));
        };

        let frame = match decoder.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(self.finish(SessionEnd::Exhausted)),
            Err(e) => {
                warn!("ending playback early: {e}");
                return Ok(self.finish(SessionEnd::DecodeFailed));
            }
        };

        if !self.window_open {
            surface.open_window(Window::Explore, Size::of(&frame))?;
            self.window_open = true;
        }
        surface.present(Window::Explore, &frame)?;
        self.frames_shown += 1;

        let deadline = Instant::now() + self.interval;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            for event in surface.poll(remaining)? {
                let InputEvent::Key(key) = event else {
                    continue;
                };
                if matches_binding(&bindings.quit, &key) {
                    return Ok(self.finish(SessionEnd::Quit));
                }
                if matches_binding(&bindings.cancel, &key) {
                    return Ok(self.finish(SessionEnd::Cancelled));
                }
            }
            if Instant::now() >= deadline {
                return Ok(Step::Running);
            }
        }
    }

    fn finish(&mut self, end: SessionEnd) -> Step {
        self.decoder = None;
        Step::Finished(end)
    }

    /// Release the decoder and close the explore window if it was opened.
    pub fn close(mut self, surface: &mut dyn Surface) -> Result<(), SurfaceError> {
        self.decoder = None;
        if self.window_open {
            self.window_open = false;
            surface.close_window(Window::Explore)?;
        }
        Ok(())
    }
}
