use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::atlas::{LocationId, TimeState};
use crate::compositor::Sprite;
use crate::error::AssetLoadError;

use super::AssetStore;

/// Memoizes card loads for the whole session.
///
/// Each (location, state) pair reaches the store at most once. Failures are
/// remembered too, so a missing card is reported once instead of every tick.
/// Nothing is ever evicted.
pub struct AssetCache<S> {
    store: S,
    cards: HashMap<(LocationId, TimeState), Result<Rc<Sprite>, AssetLoadError>>,
}

impl<S: AssetStore> AssetCache<S> {
    pub fn new(store: S) -> Self {
        AssetCache {
            store,
            cards: HashMap::new(),
        }
    }

    pub fn get(&mut self, location: LocationId, time: TimeState) -> Result<Rc<Sprite>, AssetLoadError> {
        if let Some(entry) = self.cards.get(&(location, time)) {
            return entry.clone();
        }

        debug!(location = location.index(), %time, "loading card");
        let entry = self.store.load_card(location, time).map(Rc::new);
        if let Err(e) = &entry {
            warn!("card unavailable, it will not be drawn: {e}");
        }
        self.cards.insert((location, time), entry.clone());
        entry
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
