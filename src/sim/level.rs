//! Level descriptors and level population
//!
//! A `Level` is static data. `populate_level` turns one into entities: the
//! fighter, lane-bound tanks and a fuel tank, static barriers and towers,
//! drones orbiting the towers, and random-wandering saucers.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::manager::GameObjectManager;
use super::movement::{Follower, PathGeometry, RandomWander, StationaryInterpolated};
use super::object::{Behavior, GameObject, ObjectKind};
use super::vector::{Position, Vector2d};
use crate::consts::*;
use crate::settings::Difficulty;

/// Where the fighter appears on every (re)spawn
pub const FIGHTER_SPAWN: Position = Position::new(PLAYFIELD_WIDTH * 0.2, PLAYFIELD_HEIGHT * 0.8);

/// Static level descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// 1-based ordinal shown to the player
    pub number: u32,
    pub name: String,
    /// Time the player must survive to clear the level
    pub duration_ms: u64,
    /// Tanks at standard difficulty
    pub base_enemies: u32,
    /// Fuel tank lane on easy difficulty
    pub fuel_fraction: f32,
    pub barriers: u32,
    pub towers: u32,
}

/// Difficulty-adjusted level parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelParameters {
    pub enemy_count: u32,
    /// Fixed fuel lane, or `None` for a random lane
    pub fuel_fraction: Option<f32>,
    pub saucers: u32,
}

impl Level {
    pub fn parameters(&self, difficulty: Difficulty) -> LevelParameters {
        let scaled = (self.base_enemies * difficulty.enemy_percent()).div_ceil(100);
        LevelParameters {
            enemy_count: scaled.max(1),
            fuel_fraction: difficulty.fixed_fuel_lane().then_some(self.fuel_fraction),
            saucers: difficulty.saucers(),
        }
    }
}

/// Ordered levels of one game
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LevelSequence {
    levels: Vec<Level>,
}

impl LevelSequence {
    pub fn new(levels: Vec<Level>) -> Self {
        Self { levels }
    }

    /// The built-in campaign
    pub fn standard() -> Self {
        let level = |number, name: &str, duration_ms, base_enemies, fuel_fraction, barriers, towers| Level {
            number,
            name: name.to_string(),
            duration_ms,
            base_enemies,
            fuel_fraction,
            barriers,
            towers,
        };
        Self::new(vec![
            level(1, "Outpost", 45_000, 4, 0.5, 1, 0),
            level(2, "Canyon Run", 60_000, 6, 0.3, 2, 1),
            level(3, "Fortress", 75_000, 8, 0.7, 2, 2),
        ])
    }

    pub fn get(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Whether `index` is the final level
    pub fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.levels.len()
    }
}

/// Queue the full population of `level` on `manager`. Returns how many
/// entities were queued.
pub fn populate_level(
    manager: &mut GameObjectManager,
    level: &Level,
    difficulty: Difficulty,
    geometry: &PathGeometry,
    rng: &mut Pcg32,
) -> usize {
    let params = level.parameters(difficulty);
    let before = manager.pending_additions();

    manager.add(GameObject::fighter(FIGHTER_SPAWN));

    // Barriers first so they are live before the first laser can be fired
    for i in 0..level.barriers {
        let fraction = (i + 1) as f32 / (level.barriers + 1) as f32;
        let at = lane_point(geometry, fraction, 0.4);
        let barrier = GameObject::new(ObjectKind::Barrier, StationaryInterpolated::from_points(at, at))
            .with_position(at)
            .with_behavior(Behavior::Barrier {
                notified: 0,
                intercepts: 0,
            });
        manager.add(barrier);
    }

    for i in 0..params.enemy_count {
        let countdown = TANK_FIRE_INTERVAL + i * 7;
        let tank = GameObject::new(ObjectKind::Tank, StationaryInterpolated::new(geometry, None, rng))
            .with_spawn_delay(i * SPAWN_STAGGER_FRAMES)
            .with_behavior(Behavior::Shooter {
                interval: TANK_FIRE_INTERVAL,
                countdown,
            });
        manager.add(tank);
    }

    let fuel = GameObject::new(
        ObjectKind::FuelTank,
        StationaryInterpolated::new(geometry, params.fuel_fraction, rng),
    )
    .with_spawn_delay(SPAWN_STAGGER_FRAMES / 2);
    manager.add(fuel);

    for i in 0..level.towers {
        let fraction = (i as f32 + 0.5) / level.towers as f32;
        let at = lane_point(geometry, fraction, 0.6);
        let tower = GameObject::new(ObjectKind::Tower, StationaryInterpolated::from_points(at, at))
            .with_position(at)
            .with_behavior(Behavior::Shooter {
                interval: TOWER_FIRE_INTERVAL,
                countdown: TOWER_FIRE_INTERVAL,
            });
        let tower_id = manager.add(tower);

        // Two drones on opposite sides of the tower
        for side in [0.0, std::f32::consts::PI] {
            let offset = Vector2d::new(DRONE_ORBIT_RADIUS, 0.0).rotate(side);
            let drone = GameObject::new(
                ObjectKind::Drone,
                Follower::new(tower_id, offset, 1.0, DRONE_ORBIT_SPEED),
            )
            .with_position(at.offset(offset));
            manager.add(drone);
        }
    }

    for _ in 0..params.saucers {
        let wander = RandomWander::new(
            Position::new(PLAYFIELD_WIDTH * 0.3, PLAYFIELD_HEIGHT * 0.05),
            Position::new(PLAYFIELD_WIDTH * 0.95, PLAYFIELD_HEIGHT * 0.5),
            rng.random::<u64>(),
        );
        let saucer = GameObject::new(ObjectKind::Saucer, wander)
            .with_speed(ENEMY_SPEED * 1.6)
            .with_spawn_delay(SPAWN_STAGGER_FRAMES * 2);
        manager.add(saucer);
    }

    let queued = manager.pending_additions() - before;
    log::info!(
        "Level {} ({}): queued {} entities, {} tanks",
        level.number,
        level.name,
        queued,
        params.enemy_count
    );
    queued
}

/// Point `along` of the way down the lane at `fraction`
fn lane_point(geometry: &PathGeometry, fraction: f32, along: f32) -> Position {
    let (entry, exit) = geometry.lane(fraction);
    entry.interpolate(exit, along)
}
