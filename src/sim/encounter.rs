//! Encounter controller
//!
//! The interrupt state machine. An encounter starts from an incoming-call
//! collision or from the idle random timer, shows one of the character's
//! rotating messages, and applies its paired effect: a delayed Xxl block
//! spawn, a timed weapon lock, or meeting mode (the quiz mini-game).
//!
//! The controller never touches the coordinator or the formation directly:
//! every transition returns `EncounterAction`s that the coordinator applies,
//! which keeps the formation's single spawn entry point honest and the
//! borrows disjoint.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::block::BlockCategory;
use super::cast::{Character, Effect};
use super::state::GameEvent;
use super::timer::{Blinker, Countdown};
use crate::consts::*;
use crate::settings::{QuizMode, Settings};

/// Controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EncounterPhase {
    #[default]
    Idle,
    MessageShown,
    EffectRunning,
    MeetingActive,
    AwaitingAnswerFeedback,
}

/// What started the encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationTrigger {
    /// An incoming-call object reached the player
    Collision,
    /// The internal random timer fired
    IdleTimer,
}

/// The two legal quiz inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizChoice {
    OptionA,
    OptionB,
}

impl QuizChoice {
    fn index(self) -> usize {
        match self {
            QuizChoice::OptionA => 0,
            QuizChoice::OptionB => 1,
        }
    }
}

/// Side effects for the coordinator to apply, in order
#[derive(Debug, Clone, PartialEq)]
pub enum EncounterAction {
    SetCanShoot(bool),
    EnterMeeting,
    EndMeeting,
    /// Spawn exactly one block through the formation's spawn entry point
    SpawnBlock(BlockCategory),
    /// Spawn a penalty batch
    SpawnBatch { category: BlockCategory, count: u32 },
    /// Presentation event for the host
    Notify(GameEvent),
}

/// Quiz sub-state: the drawn question indices and where we are in them
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuizState {
    drawn: Vec<usize>,
    cursor: usize,
    awaiting: bool,
    last_correct: bool,
}

/// The interrupt state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encounter {
    pub character: Character,
    phase: EncounterPhase,
    /// Host-confirmed visibility; `false` while active means desync
    presented: bool,
    /// Sequential rotation cursor for idle-triggered messages
    message_cursor: usize,
    current_effect: Option<Effect>,
    /// Weapon-lock duration
    effect_timer: Countdown,
    /// Armed delayed spawn
    pending_spawn: bool,
    spawn_timer: Countdown,
    /// Short window after a spawn during which re-triggers are ignored
    spawn_guard: Countdown,
    /// Random idle activation; ticks only while Idle and Playing
    idle_timer: Countdown,
    /// Repeat-until-correct feedback pause
    feedback_pause: Countdown,
    /// Attention cue
    blinker: Blinker,
    quiz: Option<QuizState>,
}

impl Encounter {
    pub fn new(character: Character) -> Self {
        Self {
            character,
            phase: EncounterPhase::Idle,
            presented: false,
            message_cursor: 0,
            current_effect: None,
            effect_timer: Countdown::idle(),
            pending_spawn: false,
            spawn_timer: Countdown::idle(),
            spawn_guard: Countdown::idle(),
            idle_timer: Countdown::idle(),
            feedback_pause: Countdown::idle(),
            blinker: Blinker::idle(),
            quiz: None,
        }
    }

    pub fn phase(&self) -> EncounterPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != EncounterPhase::Idle
    }

    pub fn is_spawn_pending(&self) -> bool {
        self.pending_spawn
    }

    /// The host calls this once the encounter UI is actually on screen
    pub fn mark_presented(&mut self) {
        if self.is_active() {
            self.presented = true;
        }
    }

    /// Attention-cue highlight state for the host
    pub fn blink_on(&self) -> bool {
        self.blinker.is_on()
    }

    /// Try to activate. Returns false (state untouched) on genuine reentry
    /// or when the character has nothing to say; an active-but-never-presented
    /// desync is force-reset first and the new activation proceeds.
    pub fn activate(
        &mut self,
        trigger: ActivationTrigger,
        settings: &Settings,
        rng: &mut Pcg32,
    ) -> (bool, Vec<EncounterAction>) {
        if self.character.messages.is_empty() {
            log::warn!("{} has no messages; encounter skipped", self.character.name);
            return (false, Vec::new());
        }
        if self.is_active() {
            if self.presented {
                log::debug!("encounter already active; activation rejected");
                return (false, Vec::new());
            }
            log::warn!("encounter flagged active but never presented; forcing reset");
            let mut actions = self.force_deactivate();
            actions.extend(self.begin(trigger, settings, rng));
            return (true, actions);
        }
        (true, self.begin(trigger, settings, rng))
    }

    fn begin(
        &mut self,
        trigger: ActivationTrigger,
        settings: &Settings,
        rng: &mut Pcg32,
    ) -> Vec<EncounterAction> {
        let len = self.character.messages.len();
        let idx = if let Some(forced) = settings.override_message {
            forced % len
        } else {
            match trigger {
                ActivationTrigger::Collision => rng.random_range(0..len),
                ActivationTrigger::IdleTimer => {
                    let i = self.message_cursor % len;
                    self.message_cursor = (i + 1) % len;
                    i
                }
            }
        };

        let message = self.character.messages[idx].clone();
        self.current_effect = message.effect;
        self.phase = EncounterPhase::MessageShown;
        self.presented = false;
        self.blinker.start(BLINK_TOTAL_TICKS, BLINK_INTERVAL_TICKS);
        log::info!("{}: {}", self.character.name, message.text);

        let mut actions = vec![
            EncounterAction::Notify(GameEvent::CallIncoming {
                character: self.character.name.clone(),
            }),
            EncounterAction::Notify(GameEvent::MessageShown { text: message.text }),
        ];
        // Collision-triggered encounters apply their effect immediately
        if trigger == ActivationTrigger::Collision {
            actions.extend(self.trigger_effect(settings, rng));
        }
        actions
    }

    /// Player continuation input
    pub fn advance(&mut self, settings: &Settings, rng: &mut Pcg32) -> Vec<EncounterAction> {
        match self.phase {
            EncounterPhase::Idle => Vec::new(),
            EncounterPhase::MessageShown => self.trigger_effect(settings, rng),
            EncounterPhase::EffectRunning => match self.current_effect {
                // Early advance fires the pending spawn now
                Some(Effect::AddXxlBlock { .. }) if self.pending_spawn => self.fire_spawn(),
                // Early dismissal cancels the lock and restores shooting
                Some(Effect::LockWeapon { .. }) if self.effect_timer.is_running() => {
                    self.effect_timer.cancel();
                    let mut actions = vec![
                        EncounterAction::SetCanShoot(true),
                        EncounterAction::Notify(GameEvent::WeaponUnlocked),
                    ];
                    actions.extend(self.deactivate());
                    actions
                }
                _ => Vec::new(),
            },
            EncounterPhase::MeetingActive => Vec::new(),
            EncounterPhase::AwaitingAnswerFeedback => match settings.quiz_mode {
                QuizMode::SingleAnswer => self.next_question_or_end(),
                // Repeat mode advances on its own after the feedback pause
                QuizMode::RepeatUntilCorrect => Vec::new(),
            },
        }
    }

    /// Answer the current meeting question
    pub fn choose(
        &mut self,
        pick: QuizChoice,
        settings: &Settings,
        rng: &mut Pcg32,
    ) -> Vec<EncounterAction> {
        if self.phase != EncounterPhase::MeetingActive {
            return Vec::new();
        }
        let Some(quiz) = &mut self.quiz else {
            return Vec::new();
        };
        if !quiz.awaiting {
            return Vec::new();
        }

        let question = &self.character.questions[quiz.drawn[quiz.cursor]];
        let option = &question.options[pick.index()];
        quiz.awaiting = false;
        quiz.last_correct = option.correct;
        self.phase = EncounterPhase::AwaitingAnswerFeedback;

        let mut actions = vec![EncounterAction::Notify(GameEvent::AnswerFeedback {
            text: option.response.clone(),
            correct: option.correct,
        })];

        // Probabilistic formation penalty
        if option.correct {
            if rng.random_bool(settings.correct_spawn_chance) {
                actions.push(EncounterAction::SpawnBatch {
                    category: BlockCategory::L,
                    count: settings.penalty_batch,
                });
            }
        } else if rng.random_bool(settings.wrong_spawn_chance) {
            actions.push(EncounterAction::SpawnBatch {
                category: BlockCategory::M,
                count: settings.penalty_batch,
            });
        }

        if settings.quiz_mode == QuizMode::RepeatUntilCorrect {
            self.feedback_pause.start(FEEDBACK_PAUSE_TICKS);
        }
        actions
    }

    /// Advance the controller one frame
    pub fn tick(
        &mut self,
        playing: bool,
        settings: &Settings,
        rng: &mut Pcg32,
    ) -> Vec<EncounterAction> {
        let mut actions = Vec::new();
        self.blinker.tick();
        self.spawn_guard.tick();

        match self.phase {
            EncounterPhase::Idle => {
                // The idle call timer runs only during normal play and
                // pauses (stays armed) while an encounter is active
                if playing {
                    if !self.idle_timer.is_running() {
                        // Settings come from user-editable JSON; an inverted
                        // span collapses to its lower bound instead of
                        // panicking in random_range
                        let lo = settings.idle_call_min_ticks.max(1);
                        let hi = settings.idle_call_max_ticks.max(lo);
                        self.idle_timer.start(rng.random_range(lo..=hi));
                    }
                    if self.idle_timer.tick() {
                        let (_, a) = self.activate(ActivationTrigger::IdleTimer, settings, rng);
                        actions.extend(a);
                    }
                }
            }
            EncounterPhase::EffectRunning => match self.current_effect {
                Some(Effect::LockWeapon { .. }) => {
                    if self.effect_timer.tick() {
                        actions.push(EncounterAction::SetCanShoot(true));
                        actions.push(EncounterAction::Notify(GameEvent::WeaponUnlocked));
                        actions.extend(self.deactivate());
                    } else if self.effect_timer.is_running()
                        && self.effect_timer.remaining() % TICKS_PER_SEC == 0
                    {
                        actions.push(EncounterAction::Notify(GameEvent::LockNotice {
                            seconds_left: self.effect_timer.remaining() / TICKS_PER_SEC,
                        }));
                    }
                }
                Some(Effect::AddXxlBlock { .. }) => {
                    if self.spawn_timer.tick() {
                        actions.extend(self.fire_spawn());
                    }
                }
                _ => {}
            },
            EncounterPhase::AwaitingAnswerFeedback => {
                if self.feedback_pause.tick() {
                    let correct = self.quiz.as_ref().map(|q| q.last_correct).unwrap_or(true);
                    if correct {
                        actions.extend(self.next_question_or_end());
                    } else {
                        // Same question again
                        if let Some(quiz) = &mut self.quiz {
                            quiz.awaiting = true;
                        }
                        self.phase = EncounterPhase::MeetingActive;
                        actions.extend(self.question_notify());
                    }
                }
            }
            _ => {}
        }
        actions
    }

    /// Apply the current message's paired effect
    fn trigger_effect(&mut self, settings: &Settings, rng: &mut Pcg32) -> Vec<EncounterAction> {
        match self.current_effect {
            None => self.deactivate(),
            Some(Effect::AddXxlBlock { delay_ticks }) => {
                if self.pending_spawn || self.spawn_guard.is_running() {
                    log::debug!("block spawn already pending; re-trigger suppressed");
                    return self.deactivate();
                }
                self.pending_spawn = true;
                self.spawn_timer.start(delay_ticks);
                self.phase = EncounterPhase::EffectRunning;
                vec![EncounterAction::Notify(GameEvent::SpawnArmed)]
            }
            Some(Effect::LockWeapon { duration_ticks }) => {
                self.effect_timer.start(duration_ticks);
                self.phase = EncounterPhase::EffectRunning;
                vec![
                    EncounterAction::SetCanShoot(false),
                    EncounterAction::Notify(GameEvent::WeaponLocked {
                        seconds: duration_ticks / TICKS_PER_SEC,
                    }),
                ]
            }
            Some(Effect::Meeting) => self.start_meeting(settings, rng),
        }
    }

    fn start_meeting(&mut self, settings: &Settings, rng: &mut Pcg32) -> Vec<EncounterAction> {
        let pool = self.character.questions.len();
        if pool == 0 {
            log::warn!(
                "{} has no questions; meeting ended immediately",
                self.character.name
            );
            return self.deactivate();
        }
        let amount = settings.quiz_pool_size.clamp(1, pool);
        let drawn = rand::seq::index::sample(rng, pool, amount).into_vec();
        self.quiz = Some(QuizState {
            drawn,
            cursor: 0,
            awaiting: true,
            last_correct: false,
        });
        self.phase = EncounterPhase::MeetingActive;

        let mut actions = vec![
            EncounterAction::EnterMeeting,
            EncounterAction::SetCanShoot(false),
            EncounterAction::Notify(GameEvent::MeetingStarted),
        ];
        actions.extend(self.question_notify());
        actions
    }

    /// Fire the armed spawn exactly once; concurrent early-advance and
    /// expiry paths are absorbed by the pending flag plus the guard window
    fn fire_spawn(&mut self) -> Vec<EncounterAction> {
        if !self.pending_spawn || self.spawn_guard.is_running() {
            return Vec::new();
        }
        self.pending_spawn = false;
        self.spawn_timer.cancel();
        self.spawn_guard.start(SPAWN_GUARD_TICKS);
        let mut actions = vec![EncounterAction::SpawnBlock(BlockCategory::Xxl)];
        actions.extend(self.deactivate());
        actions
    }

    fn next_question_or_end(&mut self) -> Vec<EncounterAction> {
        let finished = match &mut self.quiz {
            None => true,
            Some(quiz) => {
                quiz.cursor += 1;
                quiz.cursor >= quiz.drawn.len()
            }
        };
        if finished {
            return self.end_meeting();
        }
        if let Some(quiz) = &mut self.quiz {
            quiz.awaiting = true;
        }
        self.phase = EncounterPhase::MeetingActive;
        self.question_notify()
    }

    fn question_notify(&self) -> Vec<EncounterAction> {
        let Some(quiz) = &self.quiz else {
            return Vec::new();
        };
        let Some(&qi) = quiz.drawn.get(quiz.cursor) else {
            return Vec::new();
        };
        let question = &self.character.questions[qi];
        vec![EncounterAction::Notify(GameEvent::QuestionShown {
            prompt: question.prompt.clone(),
            options: [
                question.options[0].label.clone(),
                question.options[1].label.clone(),
            ],
        })]
    }

    fn end_meeting(&mut self) -> Vec<EncounterAction> {
        self.quiz = None;
        let mut actions = vec![
            EncounterAction::EndMeeting,
            EncounterAction::SetCanShoot(true),
            EncounterAction::Notify(GameEvent::MeetingEnded),
        ];
        actions.extend(self.deactivate());
        actions
    }

    /// Normal return to Idle; rotation cursor survives, session timers stop
    fn deactivate(&mut self) -> Vec<EncounterAction> {
        self.phase = EncounterPhase::Idle;
        self.presented = false;
        self.current_effect = None;
        self.effect_timer.cancel();
        self.feedback_pause.cancel();
        self.blinker.stop();
        Vec::new()
    }

    /// Hard reset: cancels every outstanding session timer so nothing can
    /// fire for the torn-down session, and restores player capability
    pub fn force_deactivate(&mut self) -> Vec<EncounterAction> {
        let was_meeting = matches!(
            self.phase,
            EncounterPhase::MeetingActive | EncounterPhase::AwaitingAnswerFeedback
        );
        self.pending_spawn = false;
        self.spawn_timer.cancel();
        self.quiz = None;
        self.deactivate();

        let mut actions = Vec::new();
        if was_meeting {
            actions.push(EncounterAction::EndMeeting);
        }
        actions.push(EncounterAction::SetCanShoot(true));
        actions
    }

    /// Session reset (new sprint): same teardown as a forced deactivation
    pub fn reset_session(&mut self) -> Vec<EncounterAction> {
        if !self.is_active() && !self.pending_spawn {
            return Vec::new();
        }
        self.force_deactivate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng(seed: u64) -> Pcg32 {
        Pcg32::seed_from_u64(seed)
    }

    fn enc() -> Encounter {
        Encounter::new(Character::project_lead())
    }

    /// Message indices in the stock rotation
    const MSG_XXL: usize = 0;
    const MSG_LOCK: usize = 1;
    const MSG_MEETING: usize = 2;
    const MSG_PLAIN: usize = 3;

    fn settings_with(msg: usize) -> Settings {
        Settings {
            override_message: Some(msg),
            ..Settings::default()
        }
    }

    /// Minimal stand-in for the coordinator side of the action stream
    #[derive(Default)]
    struct Applied {
        can_shoot: Option<bool>,
        spawned_blocks: u32,
        batches: u32,
        entered_meeting: bool,
        ended_meeting: bool,
    }

    fn apply(applied: &mut Applied, actions: &[EncounterAction]) {
        for a in actions {
            match a {
                EncounterAction::SetCanShoot(v) => applied.can_shoot = Some(*v),
                EncounterAction::SpawnBlock(_) => applied.spawned_blocks += 1,
                EncounterAction::SpawnBatch { .. } => applied.batches += 1,
                EncounterAction::EnterMeeting => applied.entered_meeting = true,
                EncounterAction::EndMeeting => applied.ended_meeting = true,
                EncounterAction::Notify(_) => {}
            }
        }
    }

    #[test]
    fn test_reentry_while_active_is_rejected() {
        let mut e = enc();
        let s = settings_with(MSG_PLAIN);
        let mut r = rng(1);

        let (ok, _) = e.activate(ActivationTrigger::Collision, &s, &mut r);
        assert!(ok);
        e.mark_presented();
        let phase = e.phase();

        let (ok2, actions) = e.activate(ActivationTrigger::Collision, &s, &mut r);
        assert!(!ok2);
        assert!(actions.is_empty());
        assert_eq!(e.phase(), phase);
    }

    #[test]
    fn test_desync_forces_reset_then_activates() {
        let mut e = enc();
        let s = settings_with(MSG_PLAIN);
        let mut r = rng(2);

        let (ok, _) = e.activate(ActivationTrigger::Collision, &s, &mut r);
        assert!(ok);
        // Host never presented the UI: second activation must succeed via
        // forced reset
        let (ok2, _) = e.activate(ActivationTrigger::Collision, &s, &mut r);
        assert!(ok2);
        assert!(e.is_active());
    }

    #[test]
    fn test_idle_rotation_cycles_messages() {
        let mut e = enc();
        let s = Settings::default();
        let mut r = rng(3);
        let n = e.character.messages.len();

        let mut seen = Vec::new();
        for _ in 0..n {
            let (ok, actions) = e.activate(ActivationTrigger::IdleTimer, &s, &mut r);
            assert!(ok);
            for a in &actions {
                if let EncounterAction::Notify(GameEvent::MessageShown { text }) = a {
                    seen.push(text.clone());
                }
            }
            e.force_deactivate();
        }
        // Sequential rotation: all messages shown once, in order
        let expected: Vec<String> =
            e.character.messages.iter().map(|m| m.text.clone()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_lock_weapon_full_duration_then_restore() {
        let mut e = enc();
        let s = settings_with(MSG_LOCK);
        let mut r = rng(4);
        let mut applied = Applied::default();

        let (_, actions) = e.activate(ActivationTrigger::IdleTimer, &s, &mut r);
        apply(&mut applied, &actions);
        e.mark_presented();
        // Advance applies the lock
        let actions = e.advance(&s, &mut r);
        apply(&mut applied, &actions);
        assert_eq!(applied.can_shoot, Some(false));

        // Locked for the whole duration, with per-second notices
        let mut notices = 0;
        for t in 0..LOCK_WEAPON_TICKS {
            let actions = e.tick(true, &s, &mut r);
            for a in &actions {
                if matches!(a, EncounterAction::Notify(GameEvent::LockNotice { .. })) {
                    notices += 1;
                }
            }
            apply(&mut applied, &actions);
            if t < LOCK_WEAPON_TICKS - 1 {
                assert_eq!(applied.can_shoot, Some(false), "unlocked early at {t}");
            }
        }
        assert_eq!(applied.can_shoot, Some(true));
        assert!(!e.is_active());
        assert_eq!(notices, LOCK_WEAPON_TICKS / TICKS_PER_SEC - 1);
    }

    #[test]
    fn test_lock_weapon_early_dismissal_restores_immediately() {
        let mut e = enc();
        let s = settings_with(MSG_LOCK);
        let mut r = rng(5);
        let mut applied = Applied::default();

        let (_, actions) = e.activate(ActivationTrigger::IdleTimer, &s, &mut r);
        apply(&mut applied, &actions);
        e.mark_presented();
        apply(&mut applied, &e.advance(&s, &mut r));
        assert_eq!(applied.can_shoot, Some(false));

        for _ in 0..10 {
            apply(&mut applied, &e.tick(true, &s, &mut r));
        }
        // Dismiss early
        apply(&mut applied, &e.advance(&s, &mut r));
        assert_eq!(applied.can_shoot, Some(true));
        assert!(!e.is_active());
    }

    #[test]
    fn test_xxl_spawn_on_countdown_expiry() {
        let mut e = enc();
        let s = settings_with(MSG_XXL);
        let mut r = rng(6);
        let mut applied = Applied::default();

        let (_, a) = e.activate(ActivationTrigger::IdleTimer, &s, &mut r);
        apply(&mut applied, &a);
        e.mark_presented();
        apply(&mut applied, &e.advance(&s, &mut r));
        assert!(e.is_spawn_pending());

        for _ in 0..XXL_SPAWN_DELAY_TICKS {
            apply(&mut applied, &e.tick(true, &s, &mut r));
        }
        assert_eq!(applied.spawned_blocks, 1);
        assert!(!e.is_spawn_pending());
        assert!(!e.is_active());
    }

    #[test]
    fn test_xxl_spawn_guard_never_doubles() {
        let mut e = enc();
        let s = settings_with(MSG_XXL);
        let mut r = rng(7);
        let mut applied = Applied::default();

        let (_, a) = e.activate(ActivationTrigger::IdleTimer, &s, &mut r);
        apply(&mut applied, &a);
        e.mark_presented();
        apply(&mut applied, &e.advance(&s, &mut r));

        // Expiry tick and an early-advance request landing together
        for _ in 0..XXL_SPAWN_DELAY_TICKS {
            apply(&mut applied, &e.tick(true, &s, &mut r));
        }
        apply(&mut applied, &e.advance(&s, &mut r));
        assert_eq!(applied.spawned_blocks, 1);

        // Early advance first, then the (cancelled) countdown window
        let mut e = enc();
        let (_, a) = e.activate(ActivationTrigger::IdleTimer, &s, &mut r);
        apply(&mut applied, &a);
        e.mark_presented();
        apply(&mut applied, &e.advance(&s, &mut r));
        apply(&mut applied, &e.advance(&s, &mut r)); // early fire
        for _ in 0..XXL_SPAWN_DELAY_TICKS {
            apply(&mut applied, &e.tick(true, &s, &mut r));
        }
        assert_eq!(applied.spawned_blocks, 2, "one per armed countdown");
    }

    #[test]
    fn test_spawn_retrigger_during_guard_window_is_suppressed() {
        let mut e = enc();
        let s = settings_with(MSG_XXL);
        let mut r = rng(15);
        let mut applied = Applied::default();

        let (_, a) = e.activate(ActivationTrigger::IdleTimer, &s, &mut r);
        apply(&mut applied, &a);
        e.mark_presented();
        apply(&mut applied, &e.advance(&s, &mut r)); // arm
        apply(&mut applied, &e.advance(&s, &mut r)); // early fire, guard opens
        assert_eq!(applied.spawned_blocks, 1);

        // A fresh activation landing inside the guard window must not be
        // able to double-spawn, and must not wedge the controller
        let (ok, a) = e.activate(ActivationTrigger::IdleTimer, &s, &mut r);
        assert!(ok);
        apply(&mut applied, &a);
        e.mark_presented();
        apply(&mut applied, &e.advance(&s, &mut r));
        assert!(!e.is_active());
        for _ in 0..(XXL_SPAWN_DELAY_TICKS * 2) {
            apply(&mut applied, &e.tick(false, &s, &mut r));
        }
        assert_eq!(applied.spawned_blocks, 1);
    }

    #[test]
    fn test_meeting_draws_distinct_questions_and_restores_state() {
        let mut e = enc();
        let mut s = settings_with(MSG_MEETING);
        s.quiz_pool_size = 3;
        s.correct_spawn_chance = 0.0;
        s.wrong_spawn_chance = 0.0;
        let mut r = rng(8);
        let mut applied = Applied::default();

        let (_, a) = e.activate(ActivationTrigger::IdleTimer, &s, &mut r);
        apply(&mut applied, &a);
        e.mark_presented();
        apply(&mut applied, &e.advance(&s, &mut r));
        assert!(applied.entered_meeting);
        assert_eq!(applied.can_shoot, Some(false));

        // Answer the correct option for each drawn question
        let mut prompts = Vec::new();
        for _ in 0..3 {
            assert_eq!(e.phase(), EncounterPhase::MeetingActive);
            // Figure out which option is correct from the question data
            let quiz = e.quiz.as_ref().unwrap();
            let q = &e.character.questions[quiz.drawn[quiz.cursor]];
            prompts.push(q.prompt.clone());
            let pick = if q.options[0].correct {
                QuizChoice::OptionA
            } else {
                QuizChoice::OptionB
            };
            apply(&mut applied, &e.choose(pick, &s, &mut r));
            assert_eq!(e.phase(), EncounterPhase::AwaitingAnswerFeedback);
            apply(&mut applied, &e.advance(&s, &mut r));
        }

        // No repetition among drawn questions
        let mut unique = prompts.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), prompts.len());

        assert!(applied.ended_meeting);
        assert_eq!(applied.can_shoot, Some(true));
        assert!(!e.is_active());
    }

    #[test]
    fn test_meeting_single_question_pool_of_one() {
        let mut e = enc();
        let mut s = settings_with(MSG_MEETING);
        s.quiz_pool_size = 1;
        s.correct_spawn_chance = 0.0;
        let mut r = rng(9);
        let mut applied = Applied::default();

        let (_, a) = e.activate(ActivationTrigger::Collision, &s, &mut r);
        apply(&mut applied, &a);
        e.mark_presented();
        // Collision trigger entered the meeting immediately
        assert_eq!(e.phase(), EncounterPhase::MeetingActive);

        let quiz = e.quiz.as_ref().unwrap();
        let q = &e.character.questions[quiz.drawn[0]];
        let pick = if q.options[0].correct {
            QuizChoice::OptionA
        } else {
            QuizChoice::OptionB
        };
        apply(&mut applied, &e.choose(pick, &s, &mut r));
        apply(&mut applied, &e.advance(&s, &mut r));

        assert!(applied.ended_meeting);
        assert_eq!(applied.can_shoot, Some(true));
        assert!(!e.is_active());
    }

    #[test]
    fn test_repeat_mode_repeats_wrong_answers() {
        let mut e = enc();
        let mut s = settings_with(MSG_MEETING);
        s.quiz_mode = QuizMode::RepeatUntilCorrect;
        s.quiz_pool_size = 1;
        s.wrong_spawn_chance = 0.0;
        s.correct_spawn_chance = 0.0;
        let mut r = rng(10);
        let mut applied = Applied::default();

        let (_, a) = e.activate(ActivationTrigger::IdleTimer, &s, &mut r);
        apply(&mut applied, &a);
        e.mark_presented();
        apply(&mut applied, &e.advance(&s, &mut r));

        let quiz = e.quiz.as_ref().unwrap();
        let q = &e.character.questions[quiz.drawn[0]];
        let wrong = if q.options[0].correct {
            QuizChoice::OptionB
        } else {
            QuizChoice::OptionA
        };
        let right = if q.options[0].correct {
            QuizChoice::OptionA
        } else {
            QuizChoice::OptionB
        };

        apply(&mut applied, &e.choose(wrong, &s, &mut r));
        // Feedback pause, then the same question comes back
        for _ in 0..FEEDBACK_PAUSE_TICKS {
            apply(&mut applied, &e.tick(false, &s, &mut r));
        }
        assert_eq!(e.phase(), EncounterPhase::MeetingActive);

        apply(&mut applied, &e.choose(right, &s, &mut r));
        for _ in 0..FEEDBACK_PAUSE_TICKS {
            apply(&mut applied, &e.tick(false, &s, &mut r));
        }
        assert!(applied.ended_meeting);
        assert!(!e.is_active());
    }

    #[test]
    fn test_empty_question_pool_ends_meeting_immediately() {
        let mut character = Character::project_lead();
        character.questions.clear();
        let mut e = Encounter::new(character);
        let s = settings_with(MSG_MEETING);
        let mut r = rng(11);

        let (ok, _) = e.activate(ActivationTrigger::Collision, &s, &mut r);
        assert!(ok);
        assert!(!e.is_active());
    }

    #[test]
    fn test_stale_spawn_timer_is_noop_after_force_reset() {
        let mut e = enc();
        let s = settings_with(MSG_XXL);
        let mut r = rng(12);
        let mut applied = Applied::default();

        let (_, a) = e.activate(ActivationTrigger::IdleTimer, &s, &mut r);
        apply(&mut applied, &a);
        e.mark_presented();
        apply(&mut applied, &e.advance(&s, &mut r));
        assert!(e.is_spawn_pending());

        e.force_deactivate();
        // Idle-timer reactivation is possible here, so tick with playing=false
        for _ in 0..(XXL_SPAWN_DELAY_TICKS * 2) {
            apply(&mut applied, &e.tick(false, &s, &mut r));
        }
        assert_eq!(applied.spawned_blocks, 0);
    }

    #[test]
    fn test_idle_timer_triggers_activation_during_play() {
        let mut e = enc();
        let mut s = Settings::default();
        s.idle_call_min_ticks = 5;
        s.idle_call_max_ticks = 5;
        let mut r = rng(13);

        for _ in 0..5 {
            assert!(!e.is_active());
            e.tick(true, &s, &mut r);
        }
        assert!(e.is_active());
    }

    #[test]
    fn test_inverted_idle_range_collapses_to_min() {
        let mut e = enc();
        // A hand-edited settings file can invert the span
        let mut s = Settings::default();
        s.idle_call_min_ticks = 100;
        s.idle_call_max_ticks = 10;
        let mut r = rng(16);

        for _ in 0..100 {
            assert!(!e.is_active());
            e.tick(true, &s, &mut r);
        }
        assert!(e.is_active());
    }

    #[test]
    fn test_empty_message_list_reports_activation_failure() {
        let mut character = Character::project_lead();
        character.messages.clear();
        let mut e = Encounter::new(character);
        let s = Settings::default();
        let mut r = rng(17);

        let (ok, actions) = e.activate(ActivationTrigger::Collision, &s, &mut r);
        assert!(!ok);
        assert!(actions.is_empty());
        assert!(!e.is_active());
    }

    #[test]
    fn test_blinker_runs_on_activation_then_stops() {
        let mut e = enc();
        let s = settings_with(MSG_PLAIN);
        let mut r = rng(14);

        e.activate(ActivationTrigger::IdleTimer, &s, &mut r);
        assert!(e.blink_on());
        let mut toggles = 0;
        let mut last = e.blink_on();
        for _ in 0..(BLINK_TOTAL_TICKS + 10) {
            e.tick(false, &s, &mut r);
            if e.blink_on() != last {
                toggles += 1;
                last = e.blink_on();
            }
        }
        assert!(toggles >= 2);
        assert!(!e.blink_on());
    }
}
