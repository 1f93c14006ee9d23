//! Sky Invaders - a fixed-resolution arcade shooter simulation
//!
//! Core modules:
//! - `world`: layered spatial world (object lifecycle, movement, AABB collision)
//! - `engine`: named-state machine and frame loop
//! - `game`: the splash screen and the in-game simulation states
//! - `platform`: renderer/mixer/clock/input seams plus headless backends
//! - `config`: bootstrap configuration

pub mod config;
pub mod engine;
pub mod game;
pub mod platform;
pub mod world;

pub use config::GameInfo;
pub use engine::{Context, Engine, State};
pub use world::{Object, ObjectId, World};

/// Game tuning constants
pub mod consts {
    /// Ship sprite dimensions (player and enemies share them)
    pub const SHIP_WIDTH: f32 = 72.0;
    pub const SHIP_HEIGHT: f32 = 72.0;

    /// Projectile sprite dimensions
    pub const PROJECTILE_WIDTH: f32 = 8.0;
    pub const PROJECTILE_HEIGHT: f32 = 16.0;

    /// Play-area paddings, applied on all four sides
    pub const HORIZONTAL_PADDING: f32 = 56.0;
    pub const VERTICAL_PADDING: f32 = 56.0;

    /// Base speeds in pixels per simulation unit
    pub const PLAYER_SPEED: f32 = 20.0;
    pub const PROJECTILE_SPEED: f32 = 25.0;
    pub const ENEMY_SPEED: f32 = 10.0;

    /// Enemy spawn scheduling (milliseconds of wall-clock ticks)
    pub const ENEMY_SPAWN_INTERVAL_MS: u64 = 3280;
    /// Spawns past this count shrink the interval and reset the counter
    pub const ENEMY_SPAWN_THRESHOLD: u32 = 2;
    /// Base enemy shot interval; actual intervals are randomized around it
    pub const ENEMY_SHOT_INTERVAL_MS: u64 = 1200;

    /// Cloud decoration defaults
    pub const CLOUD_COUNT: usize = 32;
    pub const CLOUD_WIDTH: f32 = 256.0;
    pub const CLOUD_HEIGHT: f32 = 256.0;
    pub const CLOUD_SPEED: f32 = 20.0;

    /// HUD
    pub const LIFEBAR_HEIGHT: f32 = 32.0;
    pub const SCORE_PADDING: f32 = 8.0;

    /// Player health at scene start
    pub const MAX_HEALTH: i32 = 100;
}
