//! Crunch Time entry point
//!
//! Headless demo driver: runs the sim with a simple auto-player that shoots
//! at vulnerable blocks, answers calls and survives meetings, logging the
//! event stream. Useful for soak-testing the core and for reproducing runs
//! from a seed.
//!
//! Usage: crunch-time [seed] [--ticks N] [--dump]

use crunch_time::settings::Settings;
use crunch_time::sim::{
    Character, GameEvent, GamePhase, GameState, QuizChoice, TickInput, tick,
};

struct Args {
    seed: u64,
    ticks: u64,
    dump: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        seed: 0xC0FFEE,
        ticks: 60 * 60 * 5, // five minutes of sim time
        dump: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--dump" => args.dump = true,
            "--ticks" => {
                if let Some(n) = it.next().and_then(|v| v.parse().ok()) {
                    args.ticks = n;
                }
            }
            other => {
                if let Ok(seed) = other.parse() {
                    args.seed = seed;
                }
            }
        }
    }
    args
}

/// Pick a target the auto-player can actually damage: the lowest block
/// without a living shield
fn pick_target(state: &GameState) -> Option<crunch_time::sim::BlockId> {
    state
        .formation
        .blocks
        .iter()
        .filter(|b| !state.formation.is_invulnerable(b.id))
        .max_by(|a, b| {
            a.pos
                .y
                .partial_cmp(&b.pos.y)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|b| b.id)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args();
    let settings = Settings::load(std::path::Path::new("crunch-time.json"));
    let quiz_mode = settings.quiz_mode.as_str();
    let mut state = GameState::new(args.seed, settings, Character::project_lead());
    log::info!(
        "Run started: seed {}, {} ticks budget, {quiz_mode} quiz",
        args.seed,
        args.ticks
    );

    // One shot every 20 ticks, human-ish
    const SHOT_INTERVAL: u64 = 20;

    for _ in 0..args.ticks {
        if state.phase == GamePhase::Over {
            break;
        }

        let mut input = TickInput::default();
        if state.encounter.is_active() {
            input.mark_presented = true;
            // Answer whatever is on screen; dismiss everything else.
            // Alternating choices keeps both quiz branches exercised.
            if state.phase == GamePhase::Meeting {
                if state.time_ticks % 30 == 0 {
                    input.answer = Some(if state.time_ticks % 60 == 0 {
                        QuizChoice::OptionA
                    } else {
                        QuizChoice::OptionB
                    });
                } else if state.time_ticks % 45 == 0 {
                    input.advance = true;
                }
            } else if state.time_ticks % 90 == 0 {
                input.advance = true;
            }
        }

        if state.phase == GamePhase::Playing
            && state.can_shoot
            && state.time_ticks % SHOT_INTERVAL == 0
        {
            if let Some(target) = pick_target(&state) {
                let _ = state.register_hit(target);
            }
        }

        tick(&mut state, &input);

        for event in state.drain_events() {
            match event {
                GameEvent::MessageShown { text } => log::info!("call: {text}"),
                GameEvent::QuestionShown { prompt, options } => {
                    log::info!("meeting: {prompt} [{}] / [{}]", options[0], options[1]);
                }
                GameEvent::AnswerFeedback { text, correct } => {
                    log::info!("answer ({}): {text}", if correct { "right" } else { "wrong" });
                }
                GameEvent::LockNotice { seconds_left } => {
                    log::info!("weapon locked: {seconds_left}s left");
                }
                GameEvent::SprintCleared { sprint } => log::info!("sprint {sprint} cleared"),
                GameEvent::GameOver => log::info!("game over"),
                _ => log::debug!("{event:?}"),
            }
        }
    }

    log::info!(
        "Run finished: {} ticks, sprint {}, score {}, lives {}",
        state.time_ticks,
        state.sprint,
        state.score,
        state.lives
    );

    if args.dump {
        match serde_json::to_string_pretty(&state) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("state dump failed: {e}"),
        }
    }
}
