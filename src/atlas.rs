//! Atlas — the static table of locations, time states and their media.
//!
//! The JSON source names locations by string. Loading resolves every name
//! into a `LocationId` once, so the rest of the viewer works with typed,
//! already-validated references.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AtlasError;
use crate::types::Point;

// ---------------------------------------------------------------------------
// Time states
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeState {
    #[default]
    Dawn,
    Dusk,
}

impl TimeState {
    pub const ALL: [TimeState; 2] = [TimeState::Dawn, TimeState::Dusk];

    pub const fn toggled(self) -> Self {
        match self {
            TimeState::Dawn => TimeState::Dusk,
            TimeState::Dusk => TimeState::Dawn,
        }
    }

    /// Suffix used in card file names.
    pub const fn card_variant(self) -> &'static str {
        match self {
            TimeState::Dawn => "day",
            TimeState::Dusk => "night",
        }
    }
}

impl fmt::Display for TimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeState::Dawn => "dawn",
            TimeState::Dusk => "dusk",
        })
    }
}

/// One value per `TimeState`. Exhaustive by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerState<T> {
    pub dawn: T,
    pub dusk: T,
}

impl<T> PerState<T> {
    pub fn get(&self, time: TimeState) -> &T {
        match time {
            TimeState::Dawn => &self.dawn,
            TimeState::Dusk => &self.dusk,
        }
    }

    fn try_map<U, E>(self, mut f: impl FnMut(TimeState, T) -> Result<U, E>) -> Result<PerState<U>, E> {
        Ok(PerState {
            dawn: f(TimeState::Dawn, self.dawn)?,
            dusk: f(TimeState::Dusk, self.dusk)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Video sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SourceRefRepr")]
pub struct SourceRef {
    pub path: PathBuf,
    /// Frame rate override; decoders that know their own rate may ignore it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
}

/// Accepts either a bare path string or `{ "path": ..., "fps": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SourceRefRepr {
    Path(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default)]
        fps: Option<f64>,
    },
}

impl From<SourceRefRepr> for SourceRef {
    fn from(repr: SourceRefRepr) -> Self {
        match repr {
            SourceRefRepr::Path(path) => SourceRef { path, fps: None },
            SourceRefRepr::Detailed { path, fps } => SourceRef { path, fps },
        }
    }
}

/// A location either shares one video across both states or has one per state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VideoBinding {
    Shared(SourceRef),
    PerState(PerState<SourceRef>),
}

impl VideoBinding {
    pub fn source(&self, time: TimeState) -> &SourceRef {
        match self {
            VideoBinding::Shared(source) => source,
            VideoBinding::PerState(sources) => sources.get(time),
        }
    }

    fn rebase(&mut self, root: &Path) {
        match self {
            VideoBinding::Shared(source) => source.path = root.join(&source.path),
            VideoBinding::PerState(sources) => {
                sources.dawn.path = root.join(&sources.dawn.path);
                sources.dusk.path = root.join(&sources.dusk.path);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Source format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub anchor: Point,
    pub video: VideoBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSource {
    pub label: String,
    pub active: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasSource {
    pub background: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<PathBuf>,
    #[serde(default = "default_cards_dir")]
    pub cards: PathBuf,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub blurb: String,
    pub locations: Vec<Location>,
    pub states: PerState<StateSource>,
}

fn default_cards_dir() -> PathBuf {
    PathBuf::from("cards")
}

// ---------------------------------------------------------------------------
// Resolved atlas
// ---------------------------------------------------------------------------

/// Index of a location in the atlas table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(usize);

impl LocationId {
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSet {
    pub label: String,
    /// Hit-test precedence follows this order.
    pub locations: Vec<LocationId>,
}

#[derive(Debug, Clone)]
pub struct Atlas {
    pub background: PathBuf,
    pub references: Option<PathBuf>,
    pub cards: PathBuf,
    pub title: String,
    pub blurb: String,
    locations: Vec<Location>,
    states: PerState<ActiveSet>,
}

impl Atlas {
    /// Read and validate an atlas file. Relative paths inside it are
    /// resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, AtlasError> {
        let json = std::fs::read_to_string(path).map_err(|source| AtlasError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let source: AtlasSource = serde_json::from_str(&json).map_err(|source| AtlasError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_source(source, root)
    }

    pub fn from_source(source: AtlasSource, root: &Path) -> Result<Self, AtlasError> {
        if source.locations.is_empty() {
            return Err(AtlasError::NoLocations);
        }

        let mut ids = HashMap::with_capacity(source.locations.len());
        for (i, loc) in source.locations.iter().enumerate() {
            if ids.insert(loc.name.clone(), LocationId(i)).is_some() {
                return Err(AtlasError::DuplicateLocation(loc.name.clone()));
            }
        }

        let states = source.states.try_map(|time, state| {
            let mut seen = HashSet::with_capacity(state.active.len());
            let mut locations = Vec::with_capacity(state.active.len());
            for name in &state.active {
                let id = ids.get(name).copied().ok_or_else(|| AtlasError::UnknownLocation {
                    state: time.to_string(),
                    name: name.clone(),
                })?;
                if !seen.insert(id) {
                    return Err(AtlasError::DuplicateActive {
                        state: time.to_string(),
                        name: name.clone(),
                    });
                }
                locations.push(id);
            }
            Ok(ActiveSet {
                label: state.label,
                locations,
            })
        })?;

        let mut locations = source.locations;
        for loc in &mut locations {
            loc.video.rebase(root);
        }

        Ok(Atlas {
            background: root.join(source.background),
            references: source.references.map(|p| root.join(p)),
            cards: root.join(source.cards),
            title: source.title,
            blurb: source.blurb,
            locations,
            states,
        })
    }

    pub fn location(&self, id: LocationId) -> &Location {
        &self.locations[id.0]
    }

    pub fn locations(&self) -> impl Iterator<Item = (LocationId, &Location)> {
        self.locations.iter().enumerate().map(|(i, loc)| (LocationId(i), loc))
    }

    pub fn find(&self, name: &str) -> Option<LocationId> {
        self.locations.iter().position(|l| l.name == name).map(LocationId)
    }

    /// Locations visible and clickable in `time`, in precedence order.
    pub fn active(&self, time: TimeState) -> &[LocationId] {
        &self.states.get(time).locations
    }

    pub fn label(&self, time: TimeState) -> &str {
        &self.states.get(time).label
    }

    pub fn source_for(&self, id: LocationId, time: TimeState) -> &SourceRef {
        self.location(id).video.source(time)
    }

    /// `<cards>/<Name>-card-<variant>.png`, with the name capitalized.
    pub fn card_path(&self, id: LocationId, time: TimeState) -> PathBuf {
        let name = capitalize(&self.location(id).name);
        self.cards
            .join(format!("{name}-card-{}.png", time.card_variant()))
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
