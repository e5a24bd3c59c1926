//! Directory-of-frames video source.
//!
//! A source path names a directory; every png/jpg/jpeg file in it is one
//! frame, played in file-name order. A directory with no frames cannot be
//! opened. Frames are decoded lazily, one per
//! `next_frame` call, so nothing is held after the session drops it.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::debug;

use super::{VideoDecoder, VideoOpener};
use crate::atlas::SourceRef;
use crate::error::{DecodeError, SourceUnavailable};

const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

pub struct ImageSequence {
    frames: Vec<PathBuf>,
    next: usize,
    fps: Option<f64>,
}

impl ImageSequence {
    pub fn open(source: &SourceRef) -> Result<Self, SourceUnavailable> {
        let unavailable = |reason: String| SourceUnavailable {
            path: source.path.clone(),
            reason,
        };

        let entries = fs::read_dir(&source.path).map_err(|e| unavailable(e.to_string()))?;
        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_frame(path))
            .collect();
        frames.sort();
        if frames.is_empty() {
            return Err(unavailable("no frames".into()));
        }

        debug!(path = %source.path.display(), frames = frames.len(), "image sequence opened");
        Ok(ImageSequence {
            frames,
            next: 0,
            fps: source.fps,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn is_frame(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FRAME_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

impl VideoDecoder for ImageSequence {
    fn frame_rate(&self) -> Option<f64> {
        self.fps
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, DecodeError> {
        let Some(path) = self.frames.get(self.next) else {
            return Ok(None);
        };
        let index = self.next;
        self.next += 1;
        let image = image::open(path).map_err(|e| DecodeError {
            index,
            reason: e.to_string(),
        })?;
        Ok(Some(image.into_rgb8()))
    }
}

/// Opens every source as an [`ImageSequence`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceOpener;

impl VideoOpener for SequenceOpener {
    fn open(&self, source: &SourceRef) -> Result<Box<dyn VideoDecoder>, SourceUnavailable> {
        Ok(Box::new(ImageSequence::open(source)?))
    }
}
