//! Flappy - A side-scrolling gap-dodging arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (kinematics, obstacle stream, collisions, session state)
//! - `config`: Data-driven game tuning with eager validation
//! - `renderer`: WebGPU rendering pipeline
//! - `terminal`: Half-block terminal renderer (native builds)
//! - `settings`: Player preferences
//! - `audio`: Procedural sound effects (Web Audio)

pub mod audio;
pub mod config;
pub mod error;
pub mod renderer;
pub mod settings;
pub mod sim;
#[cfg(not(target_arch = "wasm32"))]
pub mod terminal;

pub use config::{GameConfig, SpawnPolicy};
pub use error::ConfigError;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Simulation rate. One tick is one rendered frame.
    pub const FPS: u32 = 60;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Playfield dimensions (world units). The floor is `WORLD_HEIGHT`.
    pub const WORLD_WIDTH: f32 = 600.0;
    pub const WORLD_HEIGHT: f32 = 500.0;
    /// Decorative ground strip drawn below the floor line
    pub const GROUND_HEIGHT: f32 = 60.0;

    /// Downward acceleration (units/frame²)
    pub const GRAVITY: f32 = 0.25;
    /// Velocity set by a flap (negative = upward, units/frame)
    pub const FLAP_POWER: f32 = -5.5;

    /// Bird defaults - fixed column, never moves horizontally
    pub const BIRD_X: f32 = 120.0;
    pub const BIRD_WIDTH: f32 = 34.0;
    pub const BIRD_HEIGHT: f32 = 24.0;

    /// Pipe defaults
    pub const PIPE_WIDTH: f32 = 80.0;
    pub const PIPE_SPEED: f32 = 2.5;
    pub const GAP_HEIGHT: f32 = 160.0;
    /// Minimum distance between a gap and the top / floor
    pub const GAP_MARGIN: f32 = 80.0;
    /// Spawn line, just past the right edge
    pub const SPAWN_X: f32 = 610.0;
    /// Horizontal distance between consecutive pairs
    pub const PIPE_SPACING: f32 = 250.0;

    /// Frames after a crash during which flaps are ignored
    pub const GAME_OVER_COOLDOWN_FRAMES: u32 = 30;

    /// Bird color schemes the player can cycle through
    pub const BIRD_SKINS: u8 = 3;
}

/// Fixed frame duration in seconds for a given rate
#[inline]
pub fn frame_dt(fps: u32) -> f32 {
    1.0 / fps.max(1) as f32
}
