//! Platform abstraction layer
//!
//! The simulation core talks to its host through two traits:
//! - `Canvas`: draw primitives, called during the render phase. Calls are
//!   fire-and-forget and order matters (later calls draw on top).
//! - `Platform`: the monotonic game clock, the running flag, and deadline
//!   alarms, on top of `Canvas`.
//!
//! `HeadlessPlatform` implements both in memory: a manually advanced clock and
//! a log of draw calls. The native runner and the tests use it.

use std::collections::HashMap;

use crate::sim::Position;

/// Draw primitives
pub trait Canvas {
    fn draw_rectangle(&mut self, top_left: Position, width: f32, height: f32, filled: bool, color: u32);
    fn draw_text(&mut self, text: &str, at: Position, font_size: f32, color: u32);
    fn draw_image(&mut self, image: &str, at: Position, scale: f32, rotation: f32);
    /// Tiled image built from block art, scaled per block
    fn draw_block_image(&mut self, block_image: &str, at: Position, block_size: f32, rotation: f32);
}

/// Host services the simulation needs besides drawing
pub trait Platform: Canvas {
    /// Milliseconds of game time since start, never decreasing
    fn game_time_ms(&self) -> u64;
    /// False while the game is hidden or paused
    fn is_running(&self) -> bool;
    /// Deadline keyed by `(id, owner)`. The first call arms it; it returns
    /// true exactly once, on the first call at or after the deadline, and is
    /// then disarmed.
    fn alarm(&mut self, duration_ms: u64, id: &str, owner: u64) -> bool;
    /// Disarm `(id, owner)` without firing it. No-op if it is not armed.
    fn cancel_alarm(&mut self, id: &str, owner: u64);
}

/// A recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Rectangle {
        top_left: Position,
        width: f32,
        height: f32,
        filled: bool,
        color: u32,
    },
    Text {
        text: String,
        at: Position,
    },
    Image {
        image: String,
        at: Position,
    },
    BlockImage {
        block_image: String,
        at: Position,
    },
}

/// In-memory platform with a manual clock
#[derive(Debug)]
pub struct HeadlessPlatform {
    now_ms: u64,
    running: bool,
    alarms: HashMap<(String, u64), u64>,
    calls: Vec<DrawCall>,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            running: true,
            alarms: HashMap::new(),
            calls: Vec::new(),
        }
    }

    /// Move the game clock forward
    pub fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Drain the draw log (one frame's worth, typically)
    pub fn take_draw_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    /// Alarms armed and not yet fired or cancelled
    pub fn armed_alarms(&self) -> usize {
        self.alarms.len()
    }

    /// Texts drawn since the last drain, in draw order
    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for HeadlessPlatform {
    fn draw_rectangle(&mut self, top_left: Position, width: f32, height: f32, filled: bool, color: u32) {
        self.calls.push(DrawCall::Rectangle {
            top_left,
            width,
            height,
            filled,
            color,
        });
    }

    fn draw_text(&mut self, text: &str, at: Position, _font_size: f32, _color: u32) {
        self.calls.push(DrawCall::Text {
            text: text.to_string(),
            at,
        });
    }

    fn draw_image(&mut self, image: &str, at: Position, _scale: f32, _rotation: f32) {
        self.calls.push(DrawCall::Image {
            image: image.to_string(),
            at,
        });
    }

    fn draw_block_image(&mut self, block_image: &str, at: Position, _block_size: f32, _rotation: f32) {
        self.calls.push(DrawCall::BlockImage {
            block_image: block_image.to_string(),
            at,
        });
    }
}

impl Platform for HeadlessPlatform {
    fn game_time_ms(&self) -> u64 {
        self.now_ms
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn alarm(&mut self, duration_ms: u64, id: &str, owner: u64) -> bool {
        let key = (id.to_string(), owner);
        match self.alarms.get(&key) {
            None => {
                self.alarms.insert(key, self.now_ms + duration_ms);
                false
            }
            Some(&deadline) if self.now_ms >= deadline => {
                self.alarms.remove(&key);
                true
            }
            Some(_) => false,
        }
    }

    fn cancel_alarm(&mut self, id: &str, owner: u64) {
        self.alarms.remove(&(id.to_string(), owner));
    }
}
