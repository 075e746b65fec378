//! Skyraid - simulation core for an isometric scrolling arcade shooter
//!
//! Core modules:
//! - `sim`: Entity lifecycle, depth ordering, collisions, movement patterns,
//!   and the level/game state machine
//! - `platform`: Rendering/clock collaborator interface and a headless implementation
//! - `settings`: Persisted difficulty preference

pub mod platform;
pub mod settings;
pub mod sim;

pub use platform::{Canvas, HeadlessPlatform, Platform};
pub use settings::{Difficulty, Settings};

/// Game configuration constants
pub mod consts {
    /// Nominal frame length used by the headless clock (~60 Hz)
    pub const FRAME_MS: u64 = 16;

    /// Hard cap on live entities; exceeding it means runaway spawning
    pub const MAX_LIVE_OBJECTS: usize = 500;

    /// Play field dimensions
    pub const PLAYFIELD_WIDTH: f32 = 960.0;
    pub const PLAYFIELD_HEIGHT: f32 = 540.0;

    /// Altitude bands are 0..=MAX_ALTITUDE
    pub const MAX_ALTITUDE: u8 = 3;
    /// Depth offset per altitude band (one band outweighs the whole field)
    pub const ALTITUDE_DEPTH_STEP: f32 = PLAYFIELD_HEIGHT;

    /// State machine delays (milliseconds of game time)
    pub const LEVEL_TRANSITION_DELAY_MS: u64 = 2_000;
    pub const END_OF_GAME_DELAY_MS: u64 = 3_000;
    pub const MESSAGE_DURATION_MS: u64 = 2_000;

    /// Fighter
    pub const FIGHTER_SPEED: f32 = 5.0;
    pub const FIGHTER_ALTITUDE: u8 = 2;
    pub const FIRE_COOLDOWN_FRAMES: u32 = 8;
    /// Collision-exempt frames after (re)spawn
    pub const RESPAWN_GRACE_FRAMES: u32 = 90;

    /// Projectiles (pixels per frame / pixels)
    pub const LASER_SPEED: f32 = 12.0;
    pub const LASER_RANGE: f32 = 420.0;
    pub const SHOT_SPEED: f32 = 6.0;
    pub const SHOT_RANGE: f32 = 300.0;

    /// Enemies
    pub const ENEMY_SPEED: f32 = 1.5;
    pub const SPAWN_STAGGER_FRAMES: u32 = 45;
    pub const TANK_FIRE_INTERVAL: u32 = 150;
    pub const TOWER_FIRE_INTERVAL: u32 = 110;
    pub const DRONE_ORBIT_RADIUS: f32 = 48.0;
    /// Radians per frame
    pub const DRONE_ORBIT_SPEED: f32 = 0.04;

    /// Explosion lifetime
    pub const EXPLOSION_FRAMES: u32 = 20;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}
