//! Skyraid headless runner
//!
//! Plays a scripted session against the in-memory platform and logs the
//! outcome. Set `RUST_LOG=info` to follow level and game transitions.

use skyraid::consts::FRAME_MS;
use skyraid::sim::{GameManager, TickInput, Vector2d};
use skyraid::{HeadlessPlatform, Settings};

/// Three minutes of game time
const DEMO_FRAMES: u64 = 3 * 60 * 1000 / FRAME_MS;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let path = std::env::var("SKYRAID_SETTINGS").unwrap_or_else(|_| Settings::DEFAULT_PATH.to_string());
    let settings = Settings::load_from(&path);
    let seed = std::env::var("SKYRAID_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0x5EED);
    log::info!(
        "Skyraid (headless) starting on {} with seed {seed}",
        settings.difficulty.as_str()
    );

    let mut game = GameManager::new(settings.difficulty, seed);
    let mut platform = HeadlessPlatform::new();

    for frame in 0..DEMO_FRAMES {
        let input = autopilot(frame);
        if let Err(e) = game.tick(&mut platform, &input) {
            log::error!("Fatal simulation error at frame {frame}: {e}");
            std::process::exit(1);
        }
        platform.take_draw_calls();
        platform.advance(FRAME_MS);
    }

    match game.last_summary() {
        Some(summary) => log::info!("Last finished game: {summary}"),
        None => log::info!("No game finished in {DEMO_FRAMES} frames"),
    }
    log::info!(
        "Stopped on level {} with {} points and {} lives",
        game.level_number(),
        game.points(),
        game.lives()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation core is driven by its host on the web; nothing to run here
}

/// Weave up and down while holding fire
fn autopilot(frame: u64) -> TickInput {
    let phase = (frame % 240) as f32 / 240.0 * std::f32::consts::TAU;
    TickInput {
        steer: Vector2d::new(0.3 * phase.cos(), phase.sin()),
        fire: true,
    }
}
