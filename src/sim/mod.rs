//! Simulation core
//!
//! Everything that happens in a frame lives here. The module is deterministic
//! for a given seed and input sequence:
//! - Structural changes are queued and applied between frames
//! - Seeded RNG only
//! - Stable ordering (depth, then insertion order)
//! - Drawing and timekeeping go through the `platform` traits

pub mod collision;
pub mod error;
pub mod level;
pub mod manager;
pub mod movement;
pub mod object;
pub mod sorted;
pub mod state;
pub mod tick;
pub mod vector;

pub use collision::{Bounds, CollisionManager};
pub use error::SimError;
pub use level::{Level, LevelSequence, populate_level};
pub use manager::{FrameReport, GameObjectManager};
pub use movement::{MovementPattern, PathGeometry, PositionGenerator};
pub use object::{Behavior, GameEvent, GameObject, ObjectId, ObjectKind};
pub use sorted::SortedGameObjectsList;
pub use state::{Effect, GamePhase, GameState, Summary, Transition, evaluate};
pub use tick::{GameManager, TickInput};
pub use vector::{Position, Vector2d};
