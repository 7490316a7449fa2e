//! Brickfall entry point
//!
//! Headless soak run: seeds a session, lets auto-follow play it, and logs
//! milestones. The graphical shell is an external collaborator; this binary
//! exercises the full simulation loop without one.

use brickfall::consts::TICKS_PER_SECOND;
use brickfall::sim::{GamePhase, GameState, TickInput, tick};

fn main() {
    env_logger::init();

    let seed: u64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or_else(|| rand::random());

    log::info!("Brickfall headless soak starting (seed {seed})");

    let mut state = GameState::new(seed);
    state.set_auto_follow(true);
    let input = TickInput::default();

    let report_every = 60 * TICKS_PER_SECOND as u64;
    let max_ticks = 10 * report_every;

    while state.phase == GamePhase::Running && state.time_ticks < max_ticks {
        tick(&mut state, &input);
        if state.time_ticks % report_every == 0 {
            log::info!(
                "t={}s score={} speed={:.1} bricks={}",
                state.playtime_ticks() / TICKS_PER_SECOND as u64,
                state.score,
                state.ball.speed,
                state.bricks.alive_count()
            );
        }
    }

    log::info!(
        "soak finished: score {} after {} ticks ({:?})",
        state.score,
        state.time_ticks,
        state.phase
    );
}
