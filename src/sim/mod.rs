//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only, one tick per frame
//! - Seeded RNG only
//! - No rendering or platform dependencies
//!
//! Within one tick, formation movement resolves before encounter side
//! effects; the host drains `GameEvent`s after each tick.

pub mod block;
pub mod cast;
pub mod encounter;
pub mod formation;
pub mod state;
pub mod tick;
pub mod timer;

pub use block::{Block, BlockCategory, BlockId, ChainDir};
pub use cast::{Character, Effect, Message, Question, QuizOption};
pub use encounter::{ActivationTrigger, Encounter, EncounterPhase, QuizChoice};
pub use formation::{Formation, HitOutcome};
pub use state::{GameEvent, GamePhase, GameState};
pub use tick::{TickInput, tick};
pub use timer::{Blinker, Countdown};
