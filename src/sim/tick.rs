//! Per-frame driver
//!
//! `GameManager` owns the run state, the level sequence and the entity
//! manager, and advances all of them once per rendered frame.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::error::SimError;
use super::level::{LevelSequence, populate_level};
use super::manager::GameObjectManager;
use super::movement::PathGeometry;
use super::object::colors;
use super::state::{Effect, GamePhase, GameState, Summary, Transition, evaluate};
use super::vector::{Position, Vector2d};
use crate::consts::*;
use crate::platform::Platform;
use crate::settings::Difficulty;

/// Input commands for a single frame
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Fighter direction; clamped to unit length by the movement pattern
    pub steer: Vector2d,
    /// Fire button held
    pub fire: bool,
}

/// Transient on-screen text. The generation keys its alarm; replacing a
/// message cancels the old deadline.
#[derive(Debug, Clone)]
struct Message {
    text: String,
    generation: u64,
}

/// Host-facing game driver
#[derive(Debug)]
pub struct GameManager {
    state: GameState,
    levels: LevelSequence,
    objects: GameObjectManager,
    geometry: PathGeometry,
    rng: Pcg32,
    message: Option<Message>,
    summary: Option<Message>,
    generation: u64,
    last_summary: Option<Summary>,
}

impl GameManager {
    /// Game over the built-in levels. `seed` fixes every random choice.
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        Self::with_levels(difficulty, seed, LevelSequence::standard())
    }

    pub fn with_levels(difficulty: Difficulty, seed: u64, levels: LevelSequence) -> Self {
        Self {
            state: GameState::new(difficulty),
            levels,
            objects: GameObjectManager::new(),
            geometry: PathGeometry::default(),
            rng: Pcg32::seed_from_u64(seed),
            message: None,
            summary: None,
            generation: 0,
            last_summary: None,
        }
    }

    /// Advance one frame. A no-op while the platform is not running.
    pub fn tick<P: Platform>(&mut self, platform: &mut P, input: &TickInput) -> Result<(), SimError> {
        if !platform.is_running() {
            return Ok(());
        }
        let now = platform.game_time_ms();

        let Transition { state, effects } = evaluate(self.state, &self.levels, now)?;
        self.state = state;

        // Entities torn down this frame must not score or cost lives
        let mut suppress_collision_effects = false;
        for effect in effects {
            match effect {
                Effect::ResetLevel { level_index } => {
                    self.reset_level(level_index)?;
                    suppress_collision_effects = true;
                }
                Effect::ShowMessage { text } => {
                    let message = self.next_message(text);
                    if let Some(old) = self.message.replace(message) {
                        platform.cancel_alarm("message", old.generation);
                    }
                }
                Effect::ShowSummary(summary) => {
                    log::info!("Summary: {summary}");
                    let message = self.next_message(summary.to_string());
                    if let Some(old) = self.summary.replace(message) {
                        platform.cancel_alarm("summary", old.generation);
                    }
                    self.last_summary = Some(summary);
                }
            }
        }

        let report = self
            .objects
            .frame_step(input, suppress_collision_effects, &mut *platform)?;
        for event in report.events {
            self.state.apply_event(event);
        }

        self.render_hud(platform);
        Ok(())
    }

    fn reset_level(&mut self, level_index: usize) -> Result<(), SimError> {
        let level = self
            .levels
            .get(level_index)
            .ok_or(SimError::LevelSequenceExhausted {
                index: level_index,
                len: self.levels.len(),
            })?;
        self.objects.remove_all();
        populate_level(
            &mut self.objects,
            level,
            self.state.difficulty,
            &self.geometry,
            &mut self.rng,
        );
        Ok(())
    }

    fn next_message(&mut self, text: String) -> Message {
        self.generation += 1;
        Message {
            text,
            generation: self.generation,
        }
    }

    /// HUD line, then the summary and the message on top
    fn render_hud<P: Platform>(&mut self, platform: &mut P) {
        let hud = format!(
            "LIVES {}   POINTS {}   LEVEL {}   ENEMIES {}",
            self.lives(),
            self.points(),
            self.level_number(),
            self.enemy_count()
        );
        platform.draw_text(&hud, Position::new(12.0, 12.0), 16.0, colors::HUD);

        let center = Position::new(PLAYFIELD_WIDTH * 0.5, PLAYFIELD_HEIGHT * 0.4);
        let below = center.offset(Vector2d::new(0.0, 48.0));
        Self::render_timed(platform, &mut self.summary, "summary", below, 20.0);
        Self::render_timed(platform, &mut self.message, "message", center, 32.0);
    }

    /// Draw `slot` until its alarm fires, then clear it
    fn render_timed<P: Platform>(
        platform: &mut P,
        slot: &mut Option<Message>,
        id: &str,
        at: Position,
        font_size: f32,
    ) {
        let Some(message) = slot else {
            return;
        };
        if platform.alarm(MESSAGE_DURATION_MS, id, message.generation) {
            *slot = None;
            return;
        }
        platform.draw_text(&message.text, at, font_size, colors::MESSAGE);
    }

    // === Accessors ===

    pub fn lives(&self) -> u8 {
        self.state.lives
    }

    pub fn points(&self) -> u64 {
        self.state.points
    }

    /// 1-based number of the current level, 0 before the first tick
    pub fn level_number(&self) -> u32 {
        match self.state.phase {
            GamePhase::Uninitialized => 0,
            _ => self.levels.get(self.state.level_index).map_or(0, |l| l.number),
        }
    }

    pub fn enemy_count(&self) -> usize {
        self.objects.enemy_count()
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn objects(&self) -> &GameObjectManager {
        &self.objects
    }

    /// Message currently on screen
    pub fn message(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.text.as_str())
    }

    /// Summary of the most recently finished game
    pub fn last_summary(&self) -> Option<Summary> {
        self.last_summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::HeadlessPlatform;
    use crate::sim::level::{FIGHTER_SPAWN, Level};
    use crate::sim::movement::StationaryInterpolated;
    use crate::sim::object::{GameObject, ObjectKind};
    use crate::sim::state::GAME_COMPLETED_TEXT;

    fn quick_levels(durations: &[u64]) -> LevelSequence {
        LevelSequence::new(
            durations
                .iter()
                .enumerate()
                .map(|(i, &duration_ms)| Level {
                    number: i as u32 + 1,
                    name: format!("Test {}", i + 1),
                    duration_ms,
                    base_enemies: 2,
                    fuel_fraction: 0.5,
                    barriers: 1,
                    towers: 0,
                })
                .collect(),
        )
    }

    fn frame(game: &mut GameManager, platform: &mut HeadlessPlatform, input: &TickInput) {
        platform.take_draw_calls();
        game.tick(platform, input).unwrap();
        platform.advance(FRAME_MS);
    }

    #[test]
    fn test_first_tick_starts_game() {
        let mut game = GameManager::new(Difficulty::Standard, 1);
        let mut platform = HeadlessPlatform::new();
        assert_eq!(game.level_number(), 0);

        game.tick(&mut platform, &TickInput::default()).unwrap();

        assert_eq!(game.phase(), GamePhase::InLevel);
        assert_eq!(game.lives(), 2);
        assert_eq!(game.points(), 0);
        assert_eq!(game.level_number(), 1);
        assert_eq!(game.objects().count_kind(ObjectKind::Fighter), 1);
        assert!(game.enemy_count() > 0);
        assert_eq!(game.message(), Some("Level 1: Outpost"));

        let texts = platform.texts();
        assert!(texts[0].starts_with("LIVES 2"));
        assert_eq!(*texts.last().unwrap(), "Level 1: Outpost");
    }

    #[test]
    fn test_paused_platform_freezes_game() {
        let mut game = GameManager::new(Difficulty::Standard, 1);
        let mut platform = HeadlessPlatform::new();
        platform.set_running(false);

        game.tick(&mut platform, &TickInput::default()).unwrap();
        assert_eq!(game.phase(), GamePhase::Uninitialized);
        assert!(platform.draw_calls().is_empty());
    }

    #[test]
    fn test_message_expires_after_duration() {
        let mut game = GameManager::new(Difficulty::Easy, 3);
        let mut platform = HeadlessPlatform::new();
        frame(&mut game, &mut platform, &TickInput::default());
        assert!(game.message().is_some());

        platform.advance(MESSAGE_DURATION_MS);
        frame(&mut game, &mut platform, &TickInput::default());
        assert_eq!(game.message(), None);
        assert_eq!(platform.texts().len(), 1);
    }

    #[test]
    fn test_level_transition_loads_next_level() {
        let mut game = GameManager::with_levels(Difficulty::Standard, 7, quick_levels(&[100, 100]));
        let mut platform = HeadlessPlatform::new();
        frame(&mut game, &mut platform, &TickInput::default());

        platform.advance(100);
        frame(&mut game, &mut platform, &TickInput::default());
        assert!(matches!(game.phase(), GamePhase::LevelTransition { .. }));
        assert_eq!(game.message(), Some("Test 1 cleared"));

        platform.advance(LEVEL_TRANSITION_DELAY_MS);
        frame(&mut game, &mut platform, &TickInput::default());
        assert_eq!(game.phase(), GamePhase::InLevel);
        assert_eq!(game.level_number(), 2);
        assert_eq!(game.objects().count_kind(ObjectKind::Fighter), 1);
        assert_eq!(game.state().level_started_ms, platform.game_time_ms() - FRAME_MS);
    }

    #[test]
    fn test_replaced_message_cancels_its_alarm() {
        let mut game = GameManager::with_levels(Difficulty::Standard, 7, quick_levels(&[100, 100]));
        let mut platform = HeadlessPlatform::new();
        frame(&mut game, &mut platform, &TickInput::default());
        assert_eq!(platform.armed_alarms(), 1);

        // "cleared" replaces the level banner before the banner expires
        platform.advance(100);
        frame(&mut game, &mut platform, &TickInput::default());
        assert_eq!(game.message(), Some("Test 1 cleared"));
        assert_eq!(platform.armed_alarms(), 1);

        platform.advance(LEVEL_TRANSITION_DELAY_MS);
        frame(&mut game, &mut platform, &TickInput::default());
        assert_eq!(game.message(), Some("Level 2: Test 2"));
        assert_eq!(platform.armed_alarms(), 1);
    }

    #[test]
    fn test_collision_costs_a_life_and_restarts_level_once() {
        let mut game = GameManager::with_levels(Difficulty::Easy, 5, quick_levels(&[60_000]));
        let mut platform = HeadlessPlatform::new();
        let idle = TickInput::default();

        // Sit still until the spawn grace period is over
        for _ in 0..=RESPAWN_GRACE_FRAMES + 1 {
            frame(&mut game, &mut platform, &idle);
        }
        assert_eq!(game.lives(), 3);
        let started = game.state().level_started_ms;

        let rammer = GameObject::new(
            ObjectKind::Tank,
            StationaryInterpolated::from_points(FIGHTER_SPAWN, FIGHTER_SPAWN),
        )
        .with_position(FIGHTER_SPAWN)
        .with_altitude(FIGHTER_ALTITUDE);
        game.objects.add(rammer);
        frame(&mut game, &mut platform, &idle);
        assert_eq!(game.lives(), 2);
        assert_eq!(game.state().lives_at_last_check, 3);
        assert_eq!(game.state().level_started_ms, started);

        // The next frame notices the loss and restarts the level
        let restarted_at = platform.game_time_ms();
        frame(&mut game, &mut platform, &idle);
        assert_eq!(game.state().level_started_ms, restarted_at);
        assert_eq!(game.state().lives_at_last_check, 2);
        assert_eq!(game.objects().count_kind(ObjectKind::Fighter), 1);

        for _ in 0..10 {
            frame(&mut game, &mut platform, &idle);
        }
        assert_eq!(game.state().level_started_ms, restarted_at);
        assert_eq!(game.lives(), 2);
    }

    #[test]
    fn test_completed_game_restarts_with_summary() {
        let mut game = GameManager::with_levels(Difficulty::Easy, 9, quick_levels(&[50]));
        let mut platform = HeadlessPlatform::new();
        frame(&mut game, &mut platform, &TickInput::default());

        platform.advance(50);
        frame(&mut game, &mut platform, &TickInput::default());
        assert!(matches!(game.phase(), GamePhase::GameCompleted { .. }));
        assert_eq!(game.message(), Some(GAME_COMPLETED_TEXT));

        platform.advance(END_OF_GAME_DELAY_MS);
        frame(&mut game, &mut platform, &TickInput::default());
        let summary = game.last_summary().unwrap();
        assert!(summary.completed);
        assert_eq!(summary.level_number, 1);
        assert_eq!(game.phase(), GamePhase::InLevel);
        assert_eq!(game.lives(), 3);
        assert!(platform.texts().contains(&summary.to_string().as_str()));
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed| {
            let mut game = GameManager::new(Difficulty::Hard, seed);
            let mut platform = HeadlessPlatform::new();
            for i in 0..240u32 {
                let input = TickInput {
                    steer: Vector2d::new(1.0, if i % 60 < 30 { -1.0 } else { 1.0 }),
                    fire: i % 3 == 0,
                };
                frame(&mut game, &mut platform, &input);
            }
            let positions: Vec<(u32, f32, f32)> = game
                .objects()
                .live()
                .iter()
                .map(|o| (o.id, o.position.x, o.position.y))
                .collect();
            (game.lives(), game.points(), positions)
        };
        assert_eq!(run(42), run(42));
    }
}
