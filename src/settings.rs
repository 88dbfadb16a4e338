//! Session configuration
//!
//! Everything tunable about a run that isn't a hard constant: grid shape,
//! dependency-chain odds, quiz behavior, idle-call cadence, and the
//! diagnostic message override. Passed to `GameState::new` at construction;
//! nothing in the sim reads global state.

use serde::{Deserialize, Serialize};

use crate::consts::TICKS_PER_SEC;

/// How the meeting quiz treats answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QuizMode {
    /// Any answer yields feedback; an advance input moves on (or ends the
    /// meeting after the last drawn question)
    #[default]
    SingleAnswer,
    /// After a fixed feedback pause, a wrong answer repeats the same
    /// question and a correct one auto-advances
    RepeatUntilCorrect,
}

impl QuizMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizMode::SingleAnswer => "single-answer",
            QuizMode::RepeatUntilCorrect => "repeat-until-correct",
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // === Formation ===
    /// Grid rows for each sprint's formation
    pub rows: usize,
    /// Grid columns for each sprint's formation
    pub cols: usize,
    /// Probability that a block links dependencies to its row predecessors
    pub dependency_chance: f64,
    /// Maximum predecessors linked per block
    pub max_chain_links: usize,
    /// Horizontal gap within which a predecessor counts as adjacent
    pub link_gap: f32,

    // === Encounter ===
    /// Ticks until the idle timer triggers a call (uniform in min..=max)
    pub idle_call_min_ticks: u32,
    pub idle_call_max_ticks: u32,
    /// Force a specific message index on activation (diagnostics)
    pub override_message: Option<usize>,

    // === Quiz ===
    pub quiz_mode: QuizMode,
    /// Questions drawn per meeting (capped at the character's pool size)
    pub quiz_pool_size: usize,
    /// Chance a correct answer still spawns a batch of L blocks
    pub correct_spawn_chance: f64,
    /// Chance a wrong answer spawns a batch of M blocks
    pub wrong_spawn_chance: f64,
    /// Blocks per penalty batch
    pub penalty_batch: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rows: 4,
            cols: 8,
            dependency_chance: 0.4,
            max_chain_links: 2,
            link_gap: 90.0,

            idle_call_min_ticks: 15 * TICKS_PER_SEC,
            idle_call_max_ticks: 30 * TICKS_PER_SEC,
            override_message: None,

            quiz_mode: QuizMode::SingleAnswer,
            quiz_pool_size: 3,
            correct_spawn_chance: 0.2,
            wrong_spawn_chance: 0.8,
            penalty_batch: 3,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, falling back to defaults on any error
    pub fn load(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Bad settings file {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No settings file at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Save settings as JSON
    pub fn save(&self, path: &std::path::Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let s = Settings::default();
        assert!(s.rows > 0 && s.cols > 1);
        assert!(s.dependency_chance > 0.0 && s.dependency_chance < 1.0);
        assert!(s.max_chain_links >= 1);
        assert!(s.idle_call_min_ticks <= s.idle_call_max_ticks);
        assert!(s.quiz_pool_size >= 1);
    }

    #[test]
    fn test_quiz_mode_labels() {
        assert_eq!(QuizMode::SingleAnswer.as_str(), "single-answer");
        assert_eq!(QuizMode::RepeatUntilCorrect.as_str(), "repeat-until-correct");
    }

    #[test]
    fn test_settings_roundtrip_json() {
        let mut s = Settings::default();
        s.quiz_mode = QuizMode::RepeatUntilCorrect;
        s.override_message = Some(2);
        let json = serde_json::to_string(&s).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.quiz_mode, QuizMode::RepeatUntilCorrect);
        assert_eq!(back.override_message, Some(2));
    }
}
