//! Game entities
//!
//! A `GameObject` is one live simulated thing. What it *is* lives in two
//! places: `ObjectKind` is the plain tag used for lookups (collision table,
//! path-decision observers, sprites) and `Behavior` carries the per-kind
//! mutable data (cooldowns, lifetimes, counters).

use serde::{Deserialize, Serialize};

use super::collision::Bounds;
use super::movement::{MovementContext, MovementPattern, PositionGenerator, StationaryInterpolated};
use super::vector::{Position, Vector2d};
use crate::consts::*;
use crate::normalize_angle;
use crate::platform::Canvas;

/// Entity identifier, unique for the lifetime of a `GameObjectManager`
pub type ObjectId = u32;

/// Distance under which an entity counts as standing on its waypoint
const ARRIVAL_EPSILON: f32 = 0.001;

/// Entity kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    Fighter,
    Laser,
    EnemyShot,
    Tank,
    FuelTank,
    Barrier,
    Tower,
    Drone,
    Saucer,
    Explosion,
}

impl ObjectKind {
    /// Whether this kind takes part in collision checks at all
    pub fn is_colliding(self) -> bool {
        self != ObjectKind::Explosion
    }

    /// Static kinds never change depth once placed
    pub fn is_dynamic(self) -> bool {
        !matches!(self, ObjectKind::Barrier | ObjectKind::Tower)
    }

    /// Counted on the HUD enemy display
    pub fn is_enemy(self) -> bool {
        matches!(
            self,
            ObjectKind::Tank | ObjectKind::Tower | ObjectKind::Drone | ObjectKind::Saucer
        )
    }

    /// Points awarded when this kind is destroyed or collected
    pub fn points(self) -> u32 {
        match self {
            ObjectKind::Tank => 100,
            ObjectKind::Drone => 150,
            ObjectKind::Saucer => 200,
            ObjectKind::Tower => 300,
            ObjectKind::FuelTank => 50,
            _ => 0,
        }
    }

    /// Symmetric collision table
    pub fn collides_with(self, other: ObjectKind) -> bool {
        self.hits(other) || other.hits(self)
    }

    fn hits(self, other: ObjectKind) -> bool {
        use ObjectKind::*;
        match self {
            Fighter => matches!(
                other,
                EnemyShot | Tank | FuelTank | Barrier | Tower | Drone | Saucer
            ),
            // Laser vs Barrier goes through path decisions instead
            Laser => matches!(other, Tank | FuelTank | Tower | Drone | Saucer),
            _ => false,
        }
    }

    /// Kind whose every spawn this kind wants to hear about
    pub fn watches(self) -> Option<ObjectKind> {
        match self {
            ObjectKind::Barrier => Some(ObjectKind::Laser),
            _ => None,
        }
    }

    pub fn sprite(self) -> &'static str {
        match self {
            ObjectKind::Fighter => "fighter",
            ObjectKind::Laser => "laser",
            ObjectKind::EnemyShot => "enemy_shot",
            ObjectKind::Tank => "tank",
            ObjectKind::FuelTank => "fuel_tank",
            ObjectKind::Barrier => "barrier",
            ObjectKind::Tower => "tower",
            ObjectKind::Drone => "drone",
            ObjectKind::Saucer => "saucer",
            ObjectKind::Explosion => "explosion",
        }
    }

    /// Base (width, height) before scaling
    fn dimensions(self) -> (f32, f32) {
        match self {
            ObjectKind::Fighter => (40.0, 24.0),
            ObjectKind::Laser => (12.0, 4.0),
            ObjectKind::EnemyShot => (6.0, 6.0),
            ObjectKind::Tank => (36.0, 28.0),
            ObjectKind::FuelTank => (30.0, 30.0),
            ObjectKind::Barrier => (24.0, 80.0),
            ObjectKind::Tower => (40.0, 60.0),
            ObjectKind::Drone => (16.0, 16.0),
            ObjectKind::Saucer => (32.0, 16.0),
            ObjectKind::Explosion => (32.0, 32.0),
        }
    }

    fn default_altitude(self) -> u8 {
        match self {
            ObjectKind::Fighter | ObjectKind::Drone => 2,
            ObjectKind::Saucer => 3,
            ObjectKind::Tank => 0,
            _ => 1,
        }
    }
}

/// Per-kind mutable state
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    /// Player ship: fire cooldown and post-spawn grace period (frames)
    Fighter { cooldown: u32, grace: u32 },
    /// Removed when `ttl` frames run out
    Projectile { ttl: u32 },
    /// Fires an aimed shot at the fighter every `interval` frames
    Shooter { interval: u32, countdown: u32 },
    /// Path-decision observer: counts spawn notifications and intercepts
    Barrier { notified: u32, intercepts: u32 },
    /// Purely visual, removed when `ttl` frames run out
    Expiring { ttl: u32 },
    Inert,
}

/// Something that happened to the player's run during a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    FighterDestroyed,
    Scored { kind: ObjectKind, points: u32 },
}

/// Structural requests and events produced while iterating live entities.
/// Drained by the manager once the phase that produced them is over.
#[derive(Debug, Default)]
pub struct Outbox {
    pub spawned: Vec<GameObject>,
    pub removed: Vec<ObjectId>,
    pub events: Vec<GameEvent>,
}

impl Outbox {
    pub fn spawn(&mut self, object: GameObject) {
        self.spawned.push(object);
    }

    pub fn remove(&mut self, id: ObjectId) {
        if !self.removed.contains(&id) {
            self.removed.push(id);
        }
    }

    pub fn is_removing(&self, id: ObjectId) -> bool {
        self.removed.contains(&id)
    }

    pub fn event(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

/// Frame inputs for the update phase
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext<'a> {
    pub movement: MovementContext<'a>,
    /// Fire button held this frame
    pub fire: bool,
    /// Fighter position, if one is live
    pub player: Option<Position>,
}

/// Snapshot of the other party in a collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub position: Position,
    pub altitude: u8,
}

/// Collision-reaction capability
pub trait CollisionReaction {
    /// React to touching `other`. Structural consequences go to `outbox`.
    fn react(&mut self, other: &Contact, outbox: &mut Outbox);
}

/// A live simulated entity
#[derive(Debug, Clone)]
pub struct GameObject {
    /// Assigned by the manager on `add`
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub behavior: Behavior,
    pub position: Position,
    /// Current waypoint for waypoint-driven patterns
    pub target: Position,
    /// Pixels per frame toward `target`
    pub speed: f32,
    pub width: f32,
    pub height: f32,
    /// Render/bounds scale
    pub size: f32,
    /// Heading in radians
    pub rotation: f32,
    /// Frames left before the entity becomes active
    pub spawn_delay: u32,
    /// Altitude band, 0..=MAX_ALTITUDE
    pub altitude: u8,
    /// Skip collision checks while set
    pub collision_exempt: bool,
    movement: MovementPattern,
    started: bool,
    pub(crate) depth: f32,
    pub(crate) seq: u64,
}

impl GameObject {
    pub fn new(kind: ObjectKind, movement: impl Into<MovementPattern>) -> Self {
        let (width, height) = kind.dimensions();
        Self {
            id: 0,
            kind,
            behavior: Behavior::Inert,
            position: Position::default(),
            target: Position::default(),
            speed: ENEMY_SPEED,
            width,
            height,
            size: 1.0,
            rotation: 0.0,
            spawn_delay: 0,
            altitude: kind.default_altitude(),
            collision_exempt: false,
            movement: movement.into(),
            started: false,
            depth: 0.0,
            seq: 0,
        }
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Provisional position until the movement pattern starts
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self.target = position;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_spawn_delay(mut self, frames: u32) -> Self {
        self.spawn_delay = frames;
        self
    }

    pub fn with_altitude(mut self, altitude: u8) -> Self {
        self.altitude = altitude.min(MAX_ALTITUDE);
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn exempt_from_collisions(mut self) -> Self {
        self.collision_exempt = true;
        self
    }

    // === Factories ===

    /// Player ship, starting with a collision grace period
    pub fn fighter(spawn: Position) -> Self {
        use super::movement::PlayerControlled;
        GameObject::new(ObjectKind::Fighter, PlayerControlled::new(spawn, FIGHTER_SPEED))
            .with_position(spawn)
            .with_behavior(Behavior::Fighter {
                cooldown: 0,
                grace: RESPAWN_GRACE_FRAMES,
            })
            .exempt_from_collisions()
    }

    /// Laser fired from `muzzle` up the lanes
    pub fn laser(muzzle: Position) -> Self {
        let end = muzzle.offset(forward() * LASER_RANGE);
        GameObject::new(ObjectKind::Laser, StationaryInterpolated::from_points(muzzle, end))
            .with_position(muzzle)
            .with_speed(LASER_SPEED)
            .with_behavior(Behavior::Projectile {
                ttl: travel_frames(LASER_RANGE, LASER_SPEED),
            })
    }

    /// Enemy shot from `muzzle` toward `aim`
    pub fn enemy_shot(muzzle: Position, aim: Position, altitude: u8) -> Self {
        let heading = muzzle.vector_to(aim).scale_to_magnitude(SHOT_RANGE);
        let end = muzzle.offset(heading);
        GameObject::new(ObjectKind::EnemyShot, StationaryInterpolated::from_points(muzzle, end))
            .with_position(muzzle)
            .with_speed(SHOT_SPEED)
            .with_altitude(altitude)
            .with_behavior(Behavior::Projectile {
                ttl: travel_frames(SHOT_RANGE, SHOT_SPEED),
            })
    }

    pub fn explosion(at: Position, altitude: u8) -> Self {
        GameObject::new(ObjectKind::Explosion, StationaryInterpolated::from_points(at, at))
            .with_position(at)
            .with_altitude(altitude)
            .with_behavior(Behavior::Expiring {
                ttl: EXPLOSION_FRAMES,
            })
    }

    // === Queries ===

    pub fn movement(&self) -> &MovementPattern {
        &self.movement
    }

    /// Past its spawn delay
    pub fn is_active(&self) -> bool {
        self.spawn_delay == 0
    }

    /// Takes part in collision checks this frame
    pub fn is_colliding(&self) -> bool {
        self.kind.is_colliding() && !self.collision_exempt && self.is_active()
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::around(self.position, self.width * self.size, self.height * self.size)
    }

    /// Depth key: later (higher/nearer) entities are drawn on top
    pub fn depth_key(&self) -> f32 {
        self.position.y + self.altitude as f32 * ALTITUDE_DEPTH_STEP
    }

    /// Straight-line path of a two-point pattern, used for path decisions
    pub fn trajectory(&self) -> Option<(Position, Position)> {
        match &self.movement {
            MovementPattern::StationaryInterpolated(p) => {
                let [from, to] = *p.path();
                Some((from, to))
            }
            _ => None,
        }
    }

    pub fn contact(&self) -> Contact {
        Contact {
            id: self.id,
            kind: self.kind,
            position: self.position,
            altitude: self.altitude,
        }
    }

    // === Frame hooks ===

    /// Advance status and position by one frame
    pub fn update(&mut self, ctx: &UpdateContext, outbox: &mut Outbox) {
        if self.spawn_delay > 0 {
            self.spawn_delay -= 1;
            return;
        }
        self.update_status(ctx, outbox);
        self.update_position(&ctx.movement);
    }

    fn update_status(&mut self, ctx: &UpdateContext, outbox: &mut Outbox) {
        match &mut self.behavior {
            Behavior::Fighter { cooldown, grace } => {
                *cooldown = cooldown.saturating_sub(1);
                *grace = grace.saturating_sub(1);
                self.collision_exempt = *grace > 0;
                if ctx.fire && *cooldown == 0 {
                    *cooldown = FIRE_COOLDOWN_FRAMES;
                    let altitude = self.altitude.saturating_sub(1);
                    outbox.spawn(GameObject::laser(self.position).with_altitude(altitude));
                }
            }
            Behavior::Projectile { ttl } | Behavior::Expiring { ttl } => {
                *ttl = ttl.saturating_sub(1);
                if *ttl == 0 {
                    outbox.remove(self.id);
                }
            }
            Behavior::Shooter { interval, countdown } => {
                *countdown = countdown.saturating_sub(1);
                if *countdown == 0 {
                    *countdown = *interval;
                    if let Some(player) = ctx.player {
                        let altitude = (self.altitude + 1).min(MAX_ALTITUDE);
                        outbox.spawn(GameObject::enemy_shot(self.position, player, altitude));
                    }
                }
            }
            Behavior::Barrier { .. } | Behavior::Inert => {}
        }
    }

    fn update_position(&mut self, ctx: &MovementContext) {
        if !self.started {
            self.started = true;
            self.position = self.movement.start_position(ctx);
            self.target = self.position;
            return;
        }

        if self.movement.steers_directly() {
            let next = self.movement.next_position(ctx);
            let heading = self.position.vector_to(next);
            if heading.length() > ARRIVAL_EPSILON {
                self.rotation = normalize_angle(heading.angle());
            }
            self.position = next;
            return;
        }

        // Skip waypoints we are already standing on (a two-point path yields
        // its start again right after starting)
        let mut hops = 0;
        while self.position.distance(self.target) <= ARRIVAL_EPSILON && hops < 2 {
            self.target = self.movement.next_position(ctx);
            hops += 1;
        }

        let to_target = self.position.vector_to(self.target);
        if to_target.length() <= self.speed {
            self.position = self.target;
        } else {
            self.position.translate(to_target.scale_to_magnitude(self.speed));
        }
        if to_target.length() > ARRIVAL_EPSILON {
            self.rotation = normalize_angle(to_target.angle());
        }
    }

    /// Path-decision hook: told about a newly spawned projectile of the
    /// watched kind. Returns true if its path crosses this entity.
    pub fn decide_path(&mut self, projectile: &GameObject) -> bool {
        let bounds = self.bounds();
        let altitude = self.altitude;
        let Behavior::Barrier { notified, intercepts } = &mut self.behavior else {
            return false;
        };
        *notified += 1;

        let crosses = altitude.abs_diff(projectile.altitude) <= 1
            && projectile
                .trajectory()
                .is_some_and(|(from, to)| bounds.intersects_segment(from, to));
        if crosses {
            *intercepts += 1;
        }
        crosses
    }

    /// Draw this entity; inactive entities are invisible
    pub fn render(&self, canvas: &mut dyn Canvas) {
        if !self.is_active() {
            return;
        }
        match self.kind {
            ObjectKind::Laser | ObjectKind::EnemyShot => {
                let color = if self.kind == ObjectKind::Laser {
                    colors::LASER
                } else {
                    colors::ENEMY_SHOT
                };
                canvas.draw_rectangle(
                    self.bounds().min,
                    self.width * self.size,
                    self.height * self.size,
                    true,
                    color,
                );
            }
            ObjectKind::Barrier | ObjectKind::Explosion => {
                canvas.draw_block_image(self.kind.sprite(), self.position, self.size, self.rotation);
            }
            _ => canvas.draw_image(self.kind.sprite(), self.position, self.size, self.rotation),
        }
    }

    fn destroyed(&self, outbox: &mut Outbox) {
        outbox.remove(self.id);
        outbox.spawn(GameObject::explosion(self.position, self.altitude));
    }
}

impl CollisionReaction for GameObject {
    fn react(&mut self, other: &Contact, outbox: &mut Outbox) {
        use ObjectKind::*;
        match (self.kind, other.kind) {
            // Flying over a fuel tank collects it; the tank does the scoring
            (Fighter, FuelTank) => {}
            (Fighter, _) => {
                self.destroyed(outbox);
                outbox.event(GameEvent::FighterDestroyed);
            }
            (Laser | EnemyShot, _) => outbox.remove(self.id),
            (FuelTank, Fighter) => {
                outbox.remove(self.id);
                outbox.event(GameEvent::Scored {
                    kind: self.kind,
                    points: self.kind.points(),
                });
            }
            (kind, Laser) if kind.points() > 0 => {
                self.destroyed(outbox);
                outbox.event(GameEvent::Scored {
                    kind,
                    points: kind.points(),
                });
            }
            (Tank | Tower | Drone | Saucer, Fighter) => self.destroyed(outbox),
            // Barriers are indestructible
            _ => {}
        }
    }
}

/// Unit heading from the exit side of the lanes toward the entry side
pub fn forward() -> Vector2d {
    Vector2d::new(16.0, -9.0).scale_to_magnitude(1.0)
}

/// Frames needed to cover `range` at `speed`, plus the start frame
fn travel_frames(range: f32, speed: f32) -> u32 {
    (range / speed).ceil() as u32 + 2
}

/// Draw colors (0xRRGGBB)
pub mod colors {
    pub const LASER: u32 = 0xFF3030;
    pub const ENEMY_SHOT: u32 = 0xFFD040;
    pub const HUD: u32 = 0xFFFFFF;
    pub const MESSAGE: u32 = 0x40FF80;
}
