//! Game state and coordinator types
//!
//! `GameState` is the coordinator: it owns the formation and the encounter
//! controller, the life/score counters, and the player-capability flag the
//! lock-weapon effect toggles. Everything needed to reproduce a run lives
//! here and serializes, RNG included.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::block::{BlockCategory, BlockId};
use super::cast::Character;
use super::encounter::Encounter;
use super::formation::{Formation, HitOutcome};
use crate::consts::*;
use crate::settings::Settings;

/// Overall game state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Normal play: formation sweeps, player shoots
    Playing,
    /// Meeting mode: quiz on screen, play suspended
    Meeting,
    /// Run ended
    Over,
}

/// Everything the host might want to present, drained once per frame
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    // Formation
    BlockDestroyed { id: BlockId, category: BlockCategory },
    HitDeflected { id: BlockId },
    EdgeContact { id: BlockId },
    BlockReachedBottom { id: BlockId },
    BlockSpawned { id: BlockId, category: BlockCategory },
    BatchSpawned { category: BlockCategory, count: u32 },
    SprintCleared { sprint: u32 },
    GameOver,
    // Encounter presentation
    CallIncoming { character: String },
    MessageShown { text: String },
    SpawnArmed,
    WeaponLocked { seconds: u32 },
    LockNotice { seconds_left: u32 },
    WeaponUnlocked,
    MeetingStarted,
    QuestionShown { prompt: String, options: [String; 2] },
    AnswerFeedback { text: String, correct: bool },
    MeetingEnded,
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// The one RNG every random decision flows through
    pub rng: Pcg32,
    /// Session configuration
    pub settings: Settings,
    /// Completed-formation counter (0-based)
    pub sprint: u32,
    pub lives: u8,
    pub score: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    /// Player capability toggled by the lock-weapon effect
    pub can_shoot: bool,
    pub formation: Formation,
    pub encounter: Encounter,
    /// This frame's events for the host
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new run: seeded RNG, first formation built, encounter idle
    pub fn new(seed: u64, settings: Settings, character: Character) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut formation = Formation::new();
        formation.build(settings.rows, settings.cols, &settings, &mut rng);

        Self {
            seed,
            rng,
            settings,
            sprint: 0,
            lives: INITIAL_LIVES,
            score: 0,
            time_ticks: 0,
            phase: GamePhase::Playing,
            can_shoot: true,
            formation,
            encounter: Encounter::new(character),
            events: Vec::new(),
        }
    }

    /// Single hit entry point for the host's projectile collisions.
    /// Destruction/deflection events surface on the next tick.
    pub fn register_hit(&mut self, id: BlockId) -> Option<HitOutcome> {
        self.formation.hit(id)
    }

    /// Take this frame's events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(seed: u64) -> GameState {
        GameState::new(seed, Settings::default(), Character::project_lead())
    }

    #[test]
    fn test_new_run_shape() {
        let s = state(42);
        assert_eq!(s.phase, GamePhase::Playing);
        assert_eq!(s.lives, INITIAL_LIVES);
        assert!(s.can_shoot);
        assert_eq!(s.formation.blocks.len(), 32);
        assert!(!s.encounter.is_active());
    }

    #[test]
    fn test_register_hit_flows_through_formation() {
        let mut s = state(43);
        // Find a vulnerable S block so one hit destroys it
        let target = s
            .formation
            .blocks
            .iter()
            .find(|b| b.category == BlockCategory::S && !s.formation.is_invulnerable(b.id))
            .map(|b| b.id);
        if let Some(id) = target {
            assert_eq!(s.register_hit(id), Some(HitOutcome::Destroyed));
            assert!(!s.formation.contains(id));
        }
        // Hitting a removed/unknown block is a no-op
        assert_eq!(s.register_hit(BlockId(9999)), None);
    }

    #[test]
    fn test_state_serializes_roundtrip() {
        let s = state(44);
        let json = serde_json::to_string(&s).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.seed, s.seed);
        assert_eq!(back.formation.blocks.len(), s.formation.blocks.len());
        assert_eq!(back.phase, s.phase);
        assert_eq!(back.rng, s.rng);
    }
}
