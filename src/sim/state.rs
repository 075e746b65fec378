//! Level/game state machine
//!
//! `GameState` is a small copyable struct. The transition functions take it
//! by value together with the current game time and return the next state
//! plus the side effects the host must carry out, so the machine runs without
//! any entities or platform attached.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::error::SimError;
use super::level::LevelSequence;
use super::object::GameEvent;
use crate::consts::*;
use crate::settings::Difficulty;

pub const GAME_OVER_TEXT: &str = "GAME OVER";
pub const GAME_COMPLETED_TEXT: &str = "MISSION COMPLETE";

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Nothing set up yet; the first evaluation starts a game
    Uninitialized,
    InLevel,
    /// Level cleared, waiting to load the next one
    LevelTransition { advance_at_ms: u64 },
    /// Out of lives, waiting to restart
    GameOver { restart_at_ms: u64 },
    /// Last level cleared, waiting to restart
    GameCompleted { restart_at_ms: u64 },
}

/// End-of-game summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub points: u64,
    pub level_number: u32,
    pub completed: bool,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.completed {
            write!(f, "All levels cleared with {} points", self.points)
        } else {
            write!(f, "Reached level {} with {} points", self.level_number, self.points)
        }
    }
}

/// Side effect requested by a transition, applied by the host in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Drop every entity and populate the level at `level_index`
    ResetLevel { level_index: usize },
    ShowMessage { text: String },
    ShowSummary(Summary),
}

/// Player run state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub difficulty: Difficulty,
    pub lives: u8,
    pub points: u64,
    pub level_index: usize,
    /// Game time at which the current level was (re)initialized
    pub level_started_ms: u64,
    /// Lives at the last level (re)initialization
    pub lives_at_last_check: u8,
    pub phase: GamePhase,
}

impl GameState {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            lives: 0,
            points: 0,
            level_index: 0,
            level_started_ms: 0,
            lives_at_last_check: 0,
            phase: GamePhase::Uninitialized,
        }
    }

    /// Fold a frame event into the run
    pub fn apply_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::FighterDestroyed => {
                self.lives = self.lives.saturating_sub(1);
                log::debug!("Fighter destroyed, {} lives left", self.lives);
            }
            GameEvent::Scored { points, .. } => self.points += u64::from(points),
        }
    }

    pub fn elapsed_in_level(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.level_started_ms)
    }

    fn summary(&self, levels: &LevelSequence, completed: bool) -> Summary {
        Summary {
            points: self.points,
            level_number: levels.get(self.level_index).map_or(0, |l| l.number),
            completed,
        }
    }
}

/// Next state plus the effects to apply
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: GameState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: GameState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

/// Fresh run: lives by difficulty, no points, first level
pub fn initialize_game(
    difficulty: Difficulty,
    levels: &LevelSequence,
    now_ms: u64,
) -> Result<Transition, SimError> {
    let mut state = GameState::new(difficulty);
    state.lives = difficulty.starting_lives();
    log::info!("New game on {} with {} lives", difficulty.as_str(), state.lives);
    initialize_level(state, levels, now_ms)
}

/// (Re)load the current level: reset entities, stamp the start time,
/// snapshot lives and announce the level
pub fn initialize_level(
    mut state: GameState,
    levels: &LevelSequence,
    now_ms: u64,
) -> Result<Transition, SimError> {
    let level = levels
        .get(state.level_index)
        .ok_or(SimError::LevelSequenceExhausted {
            index: state.level_index,
            len: levels.len(),
        })?;

    state.level_started_ms = now_ms;
    state.lives_at_last_check = state.lives;
    state.phase = GamePhase::InLevel;
    log::info!("Level {} ({}) started at {}ms", level.number, level.name, now_ms);

    Ok(Transition {
        state,
        effects: vec![
            Effect::ResetLevel {
                level_index: state.level_index,
            },
            Effect::ShowMessage {
                text: format!("Level {}: {}", level.number, level.name),
            },
        ],
    })
}

/// Per-frame transition check
pub fn evaluate(state: GameState, levels: &LevelSequence, now_ms: u64) -> Result<Transition, SimError> {
    match state.phase {
        GamePhase::Uninitialized => initialize_game(state.difficulty, levels, now_ms),
        GamePhase::InLevel => evaluate_in_level(state, levels, now_ms),
        GamePhase::LevelTransition { advance_at_ms } => {
            // Lives can still run out while the cleared level winds down
            if state.lives == 0 {
                return Ok(end_game(state, levels, false, now_ms));
            }
            if now_ms < advance_at_ms {
                return Ok(Transition::unchanged(state));
            }
            let mut next = state;
            next.level_index += 1;
            initialize_level(next, levels, now_ms)
        }
        GamePhase::GameOver { restart_at_ms } | GamePhase::GameCompleted { restart_at_ms } => {
            if now_ms < restart_at_ms {
                return Ok(Transition::unchanged(state));
            }
            let completed = matches!(state.phase, GamePhase::GameCompleted { .. });
            let summary = state.summary(levels, completed);
            log::info!("Game ended: {summary}");

            let mut restart = initialize_game(state.difficulty, levels, now_ms)?;
            restart.effects.insert(0, Effect::ShowSummary(summary));
            Ok(restart)
        }
    }
}

fn evaluate_in_level(mut state: GameState, levels: &LevelSequence, now_ms: u64) -> Result<Transition, SimError> {
    let level = levels
        .get(state.level_index)
        .ok_or(SimError::LevelSequenceExhausted {
            index: state.level_index,
            len: levels.len(),
        })?;
    let level_done = state.elapsed_in_level(now_ms) >= level.duration_ms;

    // End of game is checked first, so advancing never runs off the end
    if state.lives == 0 || (level_done && levels.is_last(state.level_index)) {
        return Ok(end_game(state, levels, state.lives > 0, now_ms));
    }

    if level_done {
        state.phase = GamePhase::LevelTransition {
            advance_at_ms: now_ms + LEVEL_TRANSITION_DELAY_MS,
        };
        log::info!("Level {} cleared", level.number);
        return Ok(Transition {
            state,
            effects: vec![Effect::ShowMessage {
                text: format!("{} cleared", level.name),
            }],
        });
    }

    if state.lives < state.lives_at_last_check {
        log::info!("Life lost, restarting level {}", level.number);
        return initialize_level(state, levels, now_ms);
    }

    Ok(Transition::unchanged(state))
}

/// Enter the terminal phase and announce it
fn end_game(mut state: GameState, levels: &LevelSequence, completed: bool, now_ms: u64) -> Transition {
    let restart_at_ms = now_ms + END_OF_GAME_DELAY_MS;
    let text = if completed {
        state.phase = GamePhase::GameCompleted { restart_at_ms };
        GAME_COMPLETED_TEXT
    } else {
        state.phase = GamePhase::GameOver { restart_at_ms };
        GAME_OVER_TEXT
    };
    let level_number = levels.get(state.level_index).map_or(0, |l| l.number);
    log::info!("{text} at level {level_number} with {} points", state.points);
    Transition {
        state,
        effects: vec![Effect::ShowMessage {
            text: text.to_string(),
        }],
    }
}
