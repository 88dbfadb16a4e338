//! Per-frame simulation driver
//!
//! One `tick` per rendered frame, all transitions synchronous. Ordering
//! contract: formation movement resolves before encounter side effects, so
//! an effect that mutates the formation observes the already-moved state.

use super::encounter::{ActivationTrigger, EncounterAction, QuizChoice};
use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Player continuation input (dismiss message / next question)
    pub advance: bool,
    /// Quiz answer selection
    pub answer: Option<QuizChoice>,
    /// An incoming-call object collided with the player this frame
    pub incoming_call: bool,
    /// Host confirms the encounter UI is on screen
    pub mark_presented: bool,
}

/// Advance the game by one tick
pub fn tick(state: &mut GameState, input: &TickInput) {
    if state.phase == GamePhase::Over {
        return;
    }
    state.time_ticks += 1;

    // Formation movement first; it pauses during meetings
    if state.phase == GamePhase::Playing {
        state.formation.tick();
    }
    process_formation_events(state);
    if state.phase == GamePhase::Over {
        return;
    }

    if state.formation.is_cleared() {
        start_sprint(state);
    }

    // Player / host inputs
    if input.mark_presented {
        state.encounter.mark_presented();
    }
    if input.incoming_call {
        let (_, actions) =
            state
                .encounter
                .activate(ActivationTrigger::Collision, &state.settings, &mut state.rng);
        apply_encounter_actions(state, actions);
    }
    if input.advance {
        let actions = state.encounter.advance(&state.settings, &mut state.rng);
        apply_encounter_actions(state, actions);
    }
    if let Some(choice) = input.answer {
        let actions = state
            .encounter
            .choose(choice, &state.settings, &mut state.rng);
        apply_encounter_actions(state, actions);
    }

    // Encounter timers run after the formation has moved
    let playing = state.phase == GamePhase::Playing;
    let actions = state.encounter.tick(playing, &state.settings, &mut state.rng);
    apply_encounter_actions(state, actions);
}

/// Consume this tick's formation events: score, life loss, game over
fn process_formation_events(state: &mut GameState) {
    for event in state.formation.drain_events() {
        match &event {
            GameEvent::BlockDestroyed { category, .. } => {
                state.score += category.score();
            }
            GameEvent::BlockReachedBottom { id } => {
                state.lives = state.lives.saturating_sub(1);
                log::info!("Block {id:?} reached the bottom; lives left: {}", state.lives);
                if state.lives == 0 {
                    state.phase = GamePhase::Over;
                    let teardown = state.encounter.force_deactivate();
                    apply_encounter_actions(state, teardown);
                    state.events.push(GameEvent::GameOver);
                }
            }
            _ => {}
        }
        state.events.push(event);
    }
}

/// Rebuild the formation for the next sprint and reset the encounter session
fn start_sprint(state: &mut GameState) {
    state.sprint += 1;
    let teardown = state.encounter.reset_session();
    apply_encounter_actions(state, teardown);

    state.formation.speed = BASE_SPEED + state.sprint as f32 * SPEED_PER_SPRINT;
    state.formation.build(
        state.settings.rows,
        state.settings.cols,
        &state.settings,
        &mut state.rng,
    );
    state.events.push(GameEvent::SprintCleared {
        sprint: state.sprint,
    });
    log::info!("Sprint {} cleared; formation rebuilt", state.sprint);
}

/// Apply the encounter's deferred side effects, in order
fn apply_encounter_actions(state: &mut GameState, actions: Vec<EncounterAction>) {
    for action in actions {
        match action {
            EncounterAction::SetCanShoot(v) => state.can_shoot = v,
            EncounterAction::EnterMeeting => {
                if state.phase == GamePhase::Playing {
                    state.phase = GamePhase::Meeting;
                }
            }
            EncounterAction::EndMeeting => {
                if state.phase == GamePhase::Meeting {
                    state.phase = GamePhase::Playing;
                }
            }
            EncounterAction::SpawnBlock(category) => {
                let id = state.formation.spawn_block(category, &mut state.rng);
                state.events.push(GameEvent::BlockSpawned { id, category });
            }
            EncounterAction::SpawnBatch { category, count } => {
                state.formation.spawn_batch(category, count, &mut state.rng);
                state.events.push(GameEvent::BatchSpawned { category, count });
            }
            EncounterAction::Notify(event) => state.events.push(event),
        }
    }
}
