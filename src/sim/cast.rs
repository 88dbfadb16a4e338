//! Characters and their dialogue
//!
//! A character is whoever is on the other end of an incoming call: a list
//! of messages (each optionally paired with an effect on gameplay) and a
//! pool of meeting questions. The stock cast below feeds the demo binary
//! and the tests; hosts can build their own.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Gameplay effect paired with a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Arm a delayed spawn of a single Xxl block
    AddXxlBlock { delay_ticks: u32 },
    /// Disable the player's weapon for the duration
    LockWeapon { duration_ticks: u32 },
    /// Pull the player into a meeting (quiz mini-game)
    Meeting,
}

/// One rotating message a character can open a call with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub effect: Option<Effect>,
}

impl Message {
    pub fn new(text: &str, effect: Option<Effect>) -> Self {
        Self {
            text: text.to_string(),
            effect,
        }
    }
}

/// One of the two answers to a quiz question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizOption {
    pub label: String,
    pub response: String,
    pub correct: bool,
}

/// A meeting question: prompt plus exactly two options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: [QuizOption; 2],
}

impl Question {
    pub fn new(prompt: &str, a: (&str, &str, bool), b: (&str, &str, bool)) -> Self {
        Self {
            prompt: prompt.to_string(),
            options: [
                QuizOption {
                    label: a.0.to_string(),
                    response: a.1.to_string(),
                    correct: a.2,
                },
                QuizOption {
                    label: b.0.to_string(),
                    response: b.1.to_string(),
                    correct: b.2,
                },
            ],
        }
    }
}

/// A caller: name, message rotation, question pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub messages: Vec<Message>,
    pub questions: Vec<Question>,
}

impl Character {
    pub fn new(name: &str, messages: Vec<Message>, questions: Vec<Question>) -> Self {
        Self {
            name: name.to_string(),
            messages,
            questions,
        }
    }

    /// The stock caller: a project lead with a full message rotation and a
    /// five-question pool
    pub fn project_lead() -> Self {
        Self::new(
            "Deirdre (Project Lead)",
            vec![
                Message::new(
                    "Scope change! Shipping you one more deliverable.",
                    Some(Effect::AddXxlBlock {
                        delay_ticks: XXL_SPAWN_DELAY_TICKS,
                    }),
                ),
                Message::new(
                    "Compliance review - tools down until it passes.",
                    Some(Effect::LockWeapon {
                        duration_ticks: LOCK_WEAPON_TICKS,
                    }),
                ),
                Message::new("Got a sec? This meeting could not be an email.", Some(Effect::Meeting)),
                Message::new("Just checking in. Keep it up!", None),
            ],
            vec![
                Question::new(
                    "The demo is in an hour and the build is red. You:",
                    ("Fix the build", "Correct. Red demos end careers.", true),
                    ("Demo the slides", "The client noticed. They always notice.", false),
                ),
                Question::new(
                    "A blocker bug needs an owner. Who takes it?",
                    ("Whoever broke it", "Ownership! Love to see it.", true),
                    ("Triage to next sprint", "It shipped. It's everyone's bug now.", false),
                ),
                Question::new(
                    "Standup is running 40 minutes. The move is:",
                    ("Park it, take it offline", "Correct. Standups stand up.", true),
                    ("Let it play out", "Three engineers just fell asleep.", false),
                ),
                Question::new(
                    "The estimate doubled overnight. You tell the client:",
                    ("Today, with the new number", "Painful and correct.", true),
                    ("After we catch up", "We did not catch up.", false),
                ),
                Question::new(
                    "Feature freeze is Friday. A 'tiny' refactor lands Thursday. You:",
                    ("Revert it", "Correct. Freezes freeze.", true),
                    ("Wave it through", "It was not tiny.", false),
                ),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_cast_shape() {
        let c = Character::project_lead();
        assert!(c.messages.len() >= 3);
        assert_eq!(c.questions.len(), 5);
        // Every message effect is one of the closed variants; every question
        // has exactly one correct option
        for q in &c.questions {
            let correct = q.options.iter().filter(|o| o.correct).count();
            assert_eq!(correct, 1, "question {:?}", q.prompt);
        }
        // The rotation covers all three effects
        assert!(c.messages.iter().any(|m| matches!(m.effect, Some(Effect::Meeting))));
        assert!(c
            .messages
            .iter()
            .any(|m| matches!(m.effect, Some(Effect::AddXxlBlock { .. }))));
        assert!(c
            .messages
            .iter()
            .any(|m| matches!(m.effect, Some(Effect::LockWeapon { .. }))));
    }
}
