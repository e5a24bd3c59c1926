use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};

use crate::types::{Color, NamedColor, Point, Size};

/// Static viewer constants. Read once at startup, never reloaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub markers: MarkerConfig,
    pub toggle: ToggleConfig,
    pub references: ReferencesConfig,
    pub card: CardConfig,
    pub label: LabelConfig,
    pub intro: IntroConfig,
    pub palette: Palette,
    pub playback: PlaybackConfig,
    /// Canvas size used when the background image cannot be loaded.
    pub fallback_size: Size,
    pub key_bindings: KeyBindings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            markers: MarkerConfig::default(),
            toggle: ToggleConfig::default(),
            references: ReferencesConfig::default(),
            card: CardConfig::default(),
            label: LabelConfig::default(),
            intro: IntroConfig::default(),
            palette: Palette::default(),
            playback: PlaybackConfig::default(),
            fallback_size: Size::new(1280, 720),
            key_bindings: KeyBindings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub radius: i32,
    pub hover_increment: i32,
    pub ring_thickness: u32,
    pub hover_ring_thickness: u32,
    pub dot_radius: i32,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        MarkerConfig {
            radius: 32,
            hover_increment: 8,
            ring_thickness: 2,
            hover_ring_thickness: 3,
            dot_radius: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleConfig {
    pub origin: Point,
    pub size: Size,
    pub label_size: u32,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        ToggleConfig {
            origin: Point::new(70, 420),
            size: Size::new(160, 60),
            label_size: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferencesConfig {
    pub label: String,
    pub label_size: u32,
    /// Nominal button size, used only to anchor the label near the corner.
    pub size: Size,
    pub margin: i32,
    /// Extra leftward shift of the label from its nominal anchor.
    pub shift: i32,
    /// Hit padding around the measured label.
    pub padding: Point,
}

impl Default for ReferencesConfig {
    fn default() -> Self {
        ReferencesConfig {
            label: "References".into(),
            label_size: 32,
            size: Size::new(180, 60),
            margin: 20,
            shift: 20,
            padding: Point::new(20, 10),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    pub explore_size: Size,
    /// Distance from the card's bottom edge to the explore band's bottom edge.
    pub explore_margin_bottom: i32,
}

impl Default for CardConfig {
    fn default() -> Self {
        CardConfig {
            explore_size: Size::new(200, 60),
            explore_margin_bottom: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// End of the leader line relative to the marker anchor.
    pub leader: Point,
    pub leader_thickness: u32,
    /// Text origin relative to the leader line's end.
    pub text_offset: Point,
    pub text_size: u32,
    pub panel_padding: i32,
    /// Weight of the backdrop panel when blended over the frame.
    pub panel_weight: f32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        LabelConfig {
            leader: Point::new(120, -60),
            leader_thickness: 2,
            text_offset: Point::new(18, -26),
            text_size: 34,
            panel_padding: 8,
            panel_weight: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroConfig {
    pub title_y: i32,
    pub title_size: u32,
    pub title_gap: i32,
    pub body_size: u32,
    pub wrap_width: usize,
    pub line_gap: i32,
}

impl Default for IntroConfig {
    fn default() -> Self {
        IntroConfig {
            title_y: 120,
            title_size: 36,
            title_gap: 40,
            body_size: 30,
            wrap_width: 46,
            line_gap: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub marker: Color,
    pub button_bg: Color,
    pub button_text: Color,
    pub label_panel: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            background: Color::rgb(50, 50, 50),
            text: Color::Named(NamedColor::White),
            marker: Color::Named(NamedColor::White),
            button_bg: Color::Named(NamedColor::White),
            button_text: Color::Named(NamedColor::Black),
            label_panel: Color::Named(NamedColor::Black),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Used when a source reports no usable frame rate.
    pub default_fps: f64,
    /// Input poll interval of the map view, in milliseconds.
    pub map_poll_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            default_fps: 30.0,
            map_poll_ms: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    /// Closes the current modal (references overlay, video).
    pub cancel: String,
    /// Exits the application from any screen.
    pub quit: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        KeyBindings {
            cancel: "q".into(),
            quit: "Esc".into(),
        }
    }
}

impl ViewerConfig {
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// A missing file yields the defaults; an invalid one is reported and
    /// also yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("invalid viewer config {} ({e}), using defaults", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let mut path = PathBuf::from(home);
        path.push(".config");
        path.push("map-explorer");
        path.push("viewer.json");
        path
    }
}

/// Check whether a crossterm `KeyEvent` matches a binding string from config.
pub fn matches_binding(binding: &str, event: &KeyEvent) -> bool {
    if let Some(rest) = binding.strip_prefix("Alt-") {
        return event.modifiers.contains(KeyModifiers::ALT) && matches_key(rest, event.code);
    }
    if let Some(rest) = binding.strip_prefix("Ctrl-") {
        return event.modifiers.contains(KeyModifiers::CONTROL) && matches_key(rest, event.code);
    }

    // Plain bindings must not fire on Ctrl/Alt chords.
    if event.modifiers.contains(KeyModifiers::CONTROL)
        || event.modifiers.contains(KeyModifiers::ALT)
    {
        return false;
    }
    matches_key(binding, event.code)
}

fn matches_key(name: &str, code: KeyCode) -> bool {
    match name {
        "Right" => code == KeyCode::Right,
        "Left" => code == KeyCode::Left,
        "Up" => code == KeyCode::Up,
        "Down" => code == KeyCode::Down,
        "Enter" => code == KeyCode::Enter,
        "Esc" => code == KeyCode::Esc,
        "Space" => code == KeyCode::Char(' '),
        "Tab" => code == KeyCode::Tab,
        "Backspace" => code == KeyCode::Backspace,
        "Home" => code == KeyCode::Home,
        "End" => code == KeyCode::End,
        s => {
            if let Some(n) = s.strip_prefix('F').and_then(|rest| rest.parse::<u8>().ok()) {
                return code == KeyCode::F(n);
            }
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => {
                    code == KeyCode::Char(c) || code == KeyCode::Char(c.to_ascii_uppercase())
                }
                _ => false,
            }
        }
    }
}
