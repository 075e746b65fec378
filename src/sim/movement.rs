//! Movement patterns
//!
//! Every entity owns exactly one pattern. A pattern is a position generator:
//! `start_position` resets it and yields where the entity appears,
//! `next_position` yields the next point it should head for.
//!
//! Lanes: entities travel between the spawn line and the despawn line. A lane
//! is chosen by an interpolation fraction along both lines, which is what
//! gives the scene its pseudo-3D diagonal lanes.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::object::ObjectId;
use super::vector::{Position, Vector2d};
use crate::consts::*;

/// A reference line segment on the play field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Position,
    pub end: Position,
}

impl Line {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Point at `fraction` along the line
    pub fn at(&self, fraction: f32) -> Position {
        self.start.interpolate(self.end, fraction)
    }
}

/// Spawn/despawn reference lines of the play field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathGeometry {
    pub spawn_line: Line,
    pub despawn_line: Line,
}

impl Default for PathGeometry {
    /// Entities enter along the top-right edge and leave along the bottom-left
    fn default() -> Self {
        Self {
            spawn_line: Line::new(
                Position::new(PLAYFIELD_WIDTH * 0.55, 0.0),
                Position::new(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT * 0.45),
            ),
            despawn_line: Line::new(
                Position::new(0.0, PLAYFIELD_HEIGHT * 0.55),
                Position::new(PLAYFIELD_WIDTH * 0.45, PLAYFIELD_HEIGHT),
            ),
        }
    }
}

impl PathGeometry {
    /// Entry and exit point of the lane at `fraction`
    pub fn lane(&self, fraction: f32) -> (Position, Position) {
        (self.spawn_line.at(fraction), self.despawn_line.at(fraction))
    }
}

/// Per-frame inputs a pattern may read
#[derive(Debug, Clone, Copy)]
pub struct MovementContext<'a> {
    /// Positions of live entities at the start of the update phase
    pub positions: &'a HashMap<ObjectId, Position>,
    /// Player steering direction (length <= 1)
    pub steer: Vector2d,
}

impl<'a> MovementContext<'a> {
    pub fn new(positions: &'a HashMap<ObjectId, Position>, steer: Vector2d) -> Self {
        Self { positions, steer }
    }
}

/// Pattern lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternState {
    #[default]
    Unstarted,
    Started,
}

/// Position generation capability shared by all patterns
pub trait PositionGenerator {
    /// Reset the pattern and return the initial position
    fn start_position(&mut self, ctx: &MovementContext) -> Position;
    /// Advance the pattern and return the next position.
    /// Calling this on an unstarted pattern starts it first.
    fn next_position(&mut self, ctx: &MovementContext) -> Position;
}

/// Bounces between a fixed entry point and a fixed exit point
#[derive(Debug, Clone)]
pub struct StationaryInterpolated {
    path: [Position; 2],
    fraction: f32,
    cursor: usize,
    state: PatternState,
}

impl StationaryInterpolated {
    /// Lane at `fraction` on `geometry`; a uniformly random lane when `None`
    pub fn new<R: Rng>(geometry: &PathGeometry, fraction: Option<f32>, rng: &mut R) -> Self {
        let fraction = fraction
            .map(|f| f.clamp(0.0, 1.0))
            .unwrap_or_else(|| rng.random::<f32>());
        let (entry, exit) = geometry.lane(fraction);
        Self {
            path: [entry, exit],
            fraction,
            cursor: 0,
            state: PatternState::Unstarted,
        }
    }

    /// Explicit two-point path (fraction is meaningless here and reported as 0)
    pub fn from_points(first: Position, second: Position) -> Self {
        Self {
            path: [first, second],
            fraction: 0.0,
            cursor: 0,
            state: PatternState::Unstarted,
        }
    }

    pub fn fraction(&self) -> f32 {
        self.fraction
    }

    pub fn path(&self) -> &[Position; 2] {
        &self.path
    }
}

impl PositionGenerator for StationaryInterpolated {
    fn start_position(&mut self, _ctx: &MovementContext) -> Position {
        self.state = PatternState::Started;
        self.cursor = 0;
        self.path[0]
    }

    fn next_position(&mut self, ctx: &MovementContext) -> Position {
        if self.state == PatternState::Unstarted {
            self.start_position(ctx);
        }
        let position = self.path[self.cursor];
        self.cursor = (self.cursor + 1) % self.path.len();
        position
    }
}

/// Trails another entity at an offset, closing a fraction of the gap each step.
/// A non-zero `spin` rotates the offset every step, which turns the follow
/// into an orbit around the target.
#[derive(Debug, Clone)]
pub struct Follower {
    target: ObjectId,
    base_offset: Vector2d,
    offset: Vector2d,
    lag: f32,
    spin: f32,
    current: Position,
    state: PatternState,
}

impl Follower {
    /// `lag` is clamped to (0, 1]; 1 snaps onto the goal every step
    pub fn new(target: ObjectId, offset: Vector2d, lag: f32, spin: f32) -> Self {
        Self {
            target,
            base_offset: offset,
            offset,
            lag: lag.clamp(f32::EPSILON, 1.0),
            spin,
            current: Position::default(),
            state: PatternState::Unstarted,
        }
    }

    pub fn target(&self) -> ObjectId {
        self.target
    }

    pub fn offset(&self) -> Vector2d {
        self.offset
    }
}

impl PositionGenerator for Follower {
    fn start_position(&mut self, ctx: &MovementContext) -> Position {
        self.state = PatternState::Started;
        self.offset = self.base_offset;
        if let Some(anchor) = ctx.positions.get(&self.target) {
            self.current = anchor.offset(self.offset);
        }
        self.current
    }

    fn next_position(&mut self, ctx: &MovementContext) -> Position {
        if self.state == PatternState::Unstarted {
            return self.start_position(ctx);
        }
        // A vanished target leaves the follower where it is
        let Some(anchor) = ctx.positions.get(&self.target) else {
            return self.current;
        };
        self.offset = self.offset.rotate(self.spin);
        let goal = anchor.offset(self.offset);
        self.current = self.current.interpolate(goal, self.lag);
        self.current
    }
}

/// Picks a fresh uniform point inside its box on every call
#[derive(Debug, Clone)]
pub struct RandomWander {
    min: Position,
    max: Position,
    rng: Pcg32,
    state: PatternState,
}

impl RandomWander {
    /// Box spanned by two opposite corners, in any order
    pub fn new(corner: Position, opposite: Position, seed: u64) -> Self {
        Self {
            min: Position::new(corner.x.min(opposite.x), corner.y.min(opposite.y)),
            max: Position::new(corner.x.max(opposite.x), corner.y.max(opposite.y)),
            rng: Pcg32::seed_from_u64(seed),
            state: PatternState::Unstarted,
        }
    }

    fn sample(&mut self) -> Position {
        let x = self.rng.random_range(self.min.x..=self.max.x);
        let y = self.rng.random_range(self.min.y..=self.max.y);
        Position::new(x, y)
    }
}

impl PositionGenerator for RandomWander {
    fn start_position(&mut self, _ctx: &MovementContext) -> Position {
        self.state = PatternState::Started;
        self.sample()
    }

    fn next_position(&mut self, _ctx: &MovementContext) -> Position {
        self.state = PatternState::Started;
        self.sample()
    }
}

/// Follows the player's steering input, kept inside the play field
#[derive(Debug, Clone)]
pub struct PlayerControlled {
    spawn: Position,
    current: Position,
    speed: f32,
    state: PatternState,
}

impl PlayerControlled {
    pub fn new(spawn: Position, speed: f32) -> Self {
        Self {
            spawn,
            current: spawn,
            speed,
            state: PatternState::Unstarted,
        }
    }
}

impl PositionGenerator for PlayerControlled {
    fn start_position(&mut self, _ctx: &MovementContext) -> Position {
        self.state = PatternState::Started;
        self.current = self.spawn;
        self.current
    }

    fn next_position(&mut self, ctx: &MovementContext) -> Position {
        if self.state == PatternState::Unstarted {
            self.start_position(ctx);
        }
        let steer = Vector2d(ctx.steer.0.clamp_length_max(1.0));
        self.current = self
            .current
            .offset(steer * self.speed)
            .clamp(Position::new(0.0, 0.0), Position::new(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT));
        self.current
    }
}

/// The closed set of movement patterns
#[derive(Debug, Clone)]
pub enum MovementPattern {
    StationaryInterpolated(StationaryInterpolated),
    Follower(Follower),
    Random(RandomWander),
    PlayerControlled(PlayerControlled),
}

impl MovementPattern {
    /// Direct patterns place the entity on the generated position every frame;
    /// the others hand out waypoints the entity travels toward at its own speed.
    pub fn steers_directly(&self) -> bool {
        matches!(
            self,
            MovementPattern::Follower(_) | MovementPattern::PlayerControlled(_)
        )
    }

    pub fn state(&self) -> PatternState {
        match self {
            MovementPattern::StationaryInterpolated(p) => p.state,
            MovementPattern::Follower(p) => p.state,
            MovementPattern::Random(p) => p.state,
            MovementPattern::PlayerControlled(p) => p.state,
        }
    }
}

impl PositionGenerator for MovementPattern {
    fn start_position(&mut self, ctx: &MovementContext) -> Position {
        match self {
            MovementPattern::StationaryInterpolated(p) => p.start_position(ctx),
            MovementPattern::Follower(p) => p.start_position(ctx),
            MovementPattern::Random(p) => p.start_position(ctx),
            MovementPattern::PlayerControlled(p) => p.start_position(ctx),
        }
    }

    fn next_position(&mut self, ctx: &MovementContext) -> Position {
        match self {
            MovementPattern::StationaryInterpolated(p) => p.next_position(ctx),
            MovementPattern::Follower(p) => p.next_position(ctx),
            MovementPattern::Random(p) => p.next_position(ctx),
            MovementPattern::PlayerControlled(p) => p.next_position(ctx),
        }
    }
}

impl From<StationaryInterpolated> for MovementPattern {
    fn from(p: StationaryInterpolated) -> Self {
        MovementPattern::StationaryInterpolated(p)
    }
}

impl From<Follower> for MovementPattern {
    fn from(p: Follower) -> Self {
        MovementPattern::Follower(p)
    }
}

impl From<RandomWander> for MovementPattern {
    fn from(p: RandomWander) -> Self {
        MovementPattern::Random(p)
    }
}

impl From<PlayerControlled> for MovementPattern {
    fn from(p: PlayerControlled) -> Self {
        MovementPattern::PlayerControlled(p)
    }
}
