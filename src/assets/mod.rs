//! Raster assets: the file-backed store and the per-card memo cache.

mod cache;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use cache::AssetCache;

use crate::atlas::{Atlas, LocationId, TimeState};
use crate::compositor::Sprite;
use crate::error::AssetLoadError;

/// Where card images come from.
pub trait AssetStore {
    fn load_card(&self, location: LocationId, time: TimeState) -> Result<Sprite, AssetLoadError>;
}

/// Cards read from the atlas's card directory.
#[derive(Debug, Clone)]
pub struct FileAssetStore {
    cards: HashMap<(LocationId, TimeState), PathBuf>,
}

impl FileAssetStore {
    pub fn for_atlas(atlas: &Atlas) -> Self {
        let cards = atlas
            .locations()
            .flat_map(|(id, _)| TimeState::ALL.map(|t| ((id, t), atlas.card_path(id, t))))
            .collect();
        FileAssetStore { cards }
    }

    pub fn card_path(&self, location: LocationId, time: TimeState) -> Option<&Path> {
        self.cards.get(&(location, time)).map(PathBuf::as_path)
    }
}

impl AssetStore for FileAssetStore {
    fn load_card(&self, location: LocationId, time: TimeState) -> Result<Sprite, AssetLoadError> {
        let path = self
            .card_path(location, time)
            .ok_or_else(|| AssetLoadError::Unregistered {
                location: format!("#{} ({time})", location.index()),
            })?;
        load_image(path)
    }
}

/// Decode an image file, keeping its alpha channel if it has one.
pub fn load_image(path: &Path) -> Result<Sprite, AssetLoadError> {
    if !path.is_file() {
        return Err(AssetLoadError::Missing {
            path: path.to_path_buf(),
        });
    }
    let image = image::open(path).map_err(|e| AssetLoadError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Sprite::from_dynamic(image))
}
