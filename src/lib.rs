//! Crunch Time - a block-formation arcade shooter with interrupt encounters
//!
//! Core modules:
//! - `sim`: Deterministic simulation (formation, encounters, game state)
//! - `settings`: Session configuration (quiz mode, probabilities, grid)
//!
//! Rendering, audio and input devices are the host's problem; the sim is
//! driven one tick per frame through `sim::tick` and observed through the
//! `GameEvent` queue.

pub mod settings;
pub mod sim;

pub use settings::{QuizMode, Settings};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate (ticks per second)
    pub const TICKS_PER_SEC: u32 = 60;

    /// Playfield dimensions
    pub const FIELD_WIDTH: f32 = 640.0;
    pub const FIELD_HEIGHT: f32 = 480.0;

    /// Horizontal playable boundaries (block edges may not cross these)
    pub const LEFT_BOUND: f32 = 8.0;
    pub const RIGHT_BOUND: f32 = FIELD_WIDTH - 8.0;
    /// A block whose lower edge reaches this line is lost to the player
    pub const BOTTOM_BOUND: f32 = 430.0;

    /// Grid layout
    pub const CELL_PITCH_X: f32 = 56.0;
    pub const CELL_PITCH_Y: f32 = 44.0;
    pub const TOP_MARGIN: f32 = 48.0;
    pub const BLOCK_HEIGHT: f32 = 24.0;
    /// Block width = BLOCK_WIDTH_BASE + size * BLOCK_WIDTH_PER_SIZE
    pub const BLOCK_WIDTH_BASE: f32 = 16.0;
    pub const BLOCK_WIDTH_PER_SIZE: f32 = 8.0;

    /// Formation sweep
    pub const BASE_SPEED: f32 = 0.6;
    pub const SPEED_PER_SPRINT: f32 = 0.15;
    pub const DROP_AMOUNT: f32 = 20.0;

    /// Score per category size unit
    pub const SCORE_PER_SIZE: u64 = 25;

    /// Encounter effect durations (ticks)
    pub const LOCK_WEAPON_TICKS: u32 = 8 * TICKS_PER_SEC;
    pub const XXL_SPAWN_DELAY_TICKS: u32 = 4 * TICKS_PER_SEC;
    /// Guard window after an Xxl spawn during which re-triggers are ignored
    pub const SPAWN_GUARD_TICKS: u32 = 30;

    /// Attention blink cue
    pub const BLINK_TOTAL_TICKS: u32 = 90;
    pub const BLINK_INTERVAL_TICKS: u32 = 15;

    /// Pause between quiz answer feedback and the next question
    /// (repeat-until-correct mode)
    pub const FEEDBACK_PAUSE_TICKS: u32 = 45;

    /// Initial lives
    pub const INITIAL_LIVES: u8 = 3;
}
