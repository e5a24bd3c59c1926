//! Navigation — the viewer's interaction mode and selection.
//!
//! `UiState` is the single authoritative record of what the user is looking
//! at. It is owned by the viewer loop, mutated only through the transitions
//! below, and read by geometry and rendering each tick.

mod input;

pub use input::{handle_event, Action};

use crate::atlas::{LocationId, TimeState};
use crate::types::Point;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    MapIdle,
    CardOpen {
        location: LocationId,
    },
    References {
        /// Mode to restore when the overlay is cancelled.
        return_mode: Box<Mode>,
    },
    Playback {
        location: LocationId,
    },
}

impl Mode {
    fn selection(&self) -> Option<LocationId> {
        match self {
            Mode::MapIdle => None,
            Mode::CardOpen { location } | Mode::Playback { location } => Some(*location),
            Mode::References { return_mode } => return_mode.selection(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    time: TimeState,
    mode: Mode,
    /// Last observed pointer position in map coordinates.
    pub pointer: Point,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        UiState {
            time: TimeState::default(),
            mode: Mode::MapIdle,
            pointer: Point::default(),
        }
    }

    pub fn time(&self) -> TimeState {
        self.time
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn selected(&self) -> Option<LocationId> {
        self.mode.selection()
    }

    /// Flip the time state. Any selection is dropped with it, so a card is
    /// never shown against the other state.
    pub fn toggle_time(&mut self) {
        self.time = self.time.toggled();
        self.mode = Mode::MapIdle;
    }

    pub fn select(&mut self, location: LocationId) {
        self.mode = Mode::CardOpen { location };
    }

    pub fn dismiss(&mut self) {
        self.mode = Mode::MapIdle;
    }

    pub fn open_references(&mut self) {
        if matches!(self.mode, Mode::References { .. }) {
            return;
        }
        let previous = std::mem::replace(&mut self.mode, Mode::MapIdle);
        self.mode = Mode::References {
            return_mode: Box::new(previous),
        };
    }

    pub fn close_references(&mut self) {
        if let Mode::References { return_mode } = &mut self.mode {
            self.mode = std::mem::replace(return_mode.as_mut(), Mode::MapIdle);
        }
    }

    /// Only a card can launch playback; returns whether it did.
    pub fn enter_playback(&mut self) -> bool {
        match self.mode {
            Mode::CardOpen { location } => {
                self.mode = Mode::Playback { location };
                true
            }
            _ => false,
        }
    }

    /// Back to the card that launched playback, selection retained.
    pub fn leave_playback(&mut self) {
        if let Mode::Playback { location } = self.mode {
            self.mode = Mode::CardOpen { location };
        }
    }
}
