//! Minigolf physics - geometry and collision response for a mini-golf game
//!
//! Core modules:
//! - `math`: Immutable vectors, angle units and Bezier flattening
//! - `sim`: Shapes, colliders, the detector boundary, entities and the world
//! - `settings`: Physics tuning (JSON, LocalStorage on web)
//! - `web`: wasm-bindgen wrapper for the browser

pub mod error;
pub mod math;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{Error, Result};
pub use settings::Settings;

/// Simulation constants
pub mod consts {
    /// One frame at 60 Hz, in milliseconds
    pub const FRAME_DT: f64 = 1000.0 / 60.0;

    /// Collider tags
    pub const TAG_BALL: &str = "ball";
    pub const TAG_WALL: &str = "wall";
    pub const TAG_BREAKABLE: &str = "breakable";
    pub const TAG_HOLE: &str = "hole";

    /// Hole defaults
    pub const HOLE_RADIUS: f64 = 30.0;
}
