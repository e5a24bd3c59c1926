pub mod app;
pub mod assets;
pub mod atlas;
pub mod compositor;
pub mod config;
pub mod error;
pub mod geometry;
pub mod navigation;
pub mod playback;
pub mod renderer;
pub mod surface;
pub mod terminal;
pub mod text;
pub mod types;
