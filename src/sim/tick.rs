//! Per-frame simulation step
//!
//! An external scheduler calls [`tick`] once per frame and renders from the
//! state afterwards; the step itself never suspends and performs no I/O.
//! The stage order below is fixed - each stage depends on the previous one
//! having committed its state.

use super::collision::{resolve_bricks, resolve_paddle, resolve_walls};
use super::guards::{ensure_non_horizontal, sanity_check_ball_position};
use super::state::{GamePhase, GameState};
use crate::consts::SCREEN_HEIGHT;

/// Held-state input for a single tick, sampled by the host at frame start
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Move the paddle left (ignored in auto-follow mode)
    pub left: bool,
    /// Move the paddle right (ignored in auto-follow mode)
    pub right: bool,
    /// Ramp ball speed up
    pub speed_up: bool,
    /// Ramp ball speed down
    pub speed_down: bool,
}

/// Advance the simulation by one frame.
///
/// Stage order: input, integration, wall resolver, guards, loss check,
/// auto-follow, paddle resolver, brick resolver, regeneration countdown.
/// A tick on an [`GamePhase::Ended`] state is a no-op; the host restarts
/// via [`GameState::reset`].
pub fn tick(state: &mut GameState, input: &TickInput) {
    if state.phase == GamePhase::Ended {
        return;
    }
    state.time_ticks += 1;

    // 1. Apply continuous input: speed ramp, then manual paddle movement
    let step = state.tuning.speed_step;
    let (min_speed, max_speed) = (state.tuning.min_ball_speed(), state.tuning.max_ball_speed());
    if input.speed_up {
        state.adjust_ball_speed(step, min_speed, max_speed);
    }
    if input.speed_down {
        state.adjust_ball_speed(-step, min_speed, max_speed);
    }
    if !state.auto_follow {
        let paddle_speed = state.paddle.speed;
        if input.left {
            state.paddle.move_by(-paddle_speed);
        }
        if input.right {
            state.paddle.move_by(paddle_speed);
        }
    }

    // 2. Integrate position (explicit Euler, one sub-step per frame). The
    // pre-displacement position feeds the swept paddle and brick tests.
    let prev_pos = state.ball.pos;
    state.ball.pos += state.ball.vel;

    // 3. Walls (left/right/top; bottom is the loss condition, not a wall)
    resolve_walls(
        &mut state.ball,
        &mut state.counters,
        state.tuning.ball_speed,
        &mut state.rng,
    );

    // 4. Guards. The sanity guard's stall detector needs to see the
    // post-wall-resolution position delta, so it runs second.
    ensure_non_horizontal(&mut state.ball, state.tuning.ball_speed, &mut state.rng);
    sanity_check_ball_position(&mut state.ball, &mut state.counters, &mut state.rng);

    // 5. Loss check: ball past the bottom ends the round, state freezes
    if state.ball.bottom() > SCREEN_HEIGHT {
        state.phase = GamePhase::Ended;
        log::info!(
            "game over: final score {} after {} ticks",
            state.score,
            state.playtime_ticks()
        );
        return;
    }

    // 6. Auto-follow slaves the paddle to the ball
    if state.auto_follow {
        state.paddle.center_under(state.ball.pos.x);
    }

    // 7. Paddle
    resolve_paddle(
        &mut state.ball,
        prev_pos,
        &state.paddle,
        state.auto_follow,
        state.tuning.auto_follow_nudge,
        &mut state.counters,
        state.tuning.ball_speed,
        &mut state.rng,
    );

    // 8. Bricks (at most one per frame)
    if resolve_bricks(
        &mut state.ball,
        prev_pos,
        &mut state.bricks,
        &mut state.counters,
        state.tuning.ball_speed,
        &mut state.rng,
    )
    .is_some()
    {
        state.score += state.tuning.brick_score;
        if state.bricks.all_cleared() && state.pending_regen.is_none() {
            state.pending_regen = Some(state.tuning.regen_delay_ticks);
            log::info!(
                "grid cleared at score {}, regenerating in {} ticks",
                state.score,
                state.tuning.regen_delay_ticks
            );
        }
    }

    // 9. Scheduled regeneration: the win-condition pause-then-continue
    if let Some(remaining) = state.pending_regen {
        if remaining <= 1 {
            let speed = state.ball.speed;
            state.reset(true, Some(speed));
        } else {
            state.pending_regen = Some(remaining - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::state::BrickGrid;
    use crate::tuning::Tuning;
    use glam::Vec2;

    fn quiet_corner(state: &mut GameState) {
        // Park the ball away from bricks and paddle, moving gently
        state.ball.pos = Vec2::new(400.0, 400.0);
        state.ball.set_velocity(Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_manual_paddle_movement_clamps() {
        let mut state = GameState::new(1);
        quiet_corner(&mut state);
        state.paddle.x = 2.0;
        tick(
            &mut state,
            &TickInput {
                left: true,
                ..Default::default()
            },
        );
        assert_eq!(state.paddle.x, 0.0);

        tick(
            &mut state,
            &TickInput {
                right: true,
                ..Default::default()
            },
        );
        assert_eq!(state.paddle.x, state.paddle.speed);
    }

    #[test]
    fn test_auto_follow_ignores_manual_input_and_tracks_ball() {
        let mut state = GameState::new(2);
        quiet_corner(&mut state);
        state.set_auto_follow(true);
        let input = TickInput {
            left: true,
            ..Default::default()
        };
        tick(&mut state, &input);
        assert_eq!(state.paddle.center_x(), state.ball.pos.x);
    }

    #[test]
    fn test_speed_ramp_clamps_at_bounds() {
        let mut state = GameState::new(3);
        quiet_corner(&mut state);
        let max = state.tuning.max_ball_speed();
        let input = TickInput {
            speed_up: true,
            ..Default::default()
        };
        for _ in 0..200 {
            tick(&mut state, &input);
            if state.phase == GamePhase::Ended {
                break;
            }
        }
        assert!(state.ball.speed <= max + 1e-4);
        assert!((state.ball.speed - state.ball.vel.length()).abs() < 1e-3);
    }

    #[test]
    fn test_game_over_freezes_state() {
        let mut state = GameState::new(4);
        // Below the paddle, heading out the bottom, far from the paddle's x
        state.paddle.x = 0.0;
        state.ball.pos = Vec2::new(700.0, SCREEN_HEIGHT - 4.0);
        state.ball.set_velocity(Vec2::new(0.5, 5.0));
        tick(&mut state, &TickInput::default());
        assert_eq!(state.phase, GamePhase::Ended);

        let pos = state.ball.pos;
        let vel = state.ball.vel;
        let ticks = state.time_ticks;
        tick(&mut state, &TickInput::default());
        assert_eq!(state.ball.pos, pos);
        assert_eq!(state.ball.vel, vel);
        assert_eq!(state.time_ticks, ticks);

        state.reset(false, None);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_brick_hit_scores_once() {
        let mut state = GameState::new(5);
        let brick = BrickGrid::rect(4, 0);
        state.ball.pos = Vec2::new(brick.center_x(), brick.bottom() + BALL_RADIUS + 2.0);
        state.ball.set_velocity(Vec2::new(0.0, -4.0));
        tick(&mut state, &TickInput::default());
        assert_eq!(state.score, state.tuning.brick_score);
        assert!(!state.bricks.is_alive(4, 0));
        assert!(state.ball.vel.y > 0.0);
    }

    #[test]
    fn test_last_brick_arms_exactly_one_regeneration() {
        let tuning = Tuning {
            regen_delay_ticks: 3,
            ..Default::default()
        };
        let mut state = GameState::with_tuning(6, tuning);
        // Kill everything but (0, 0)
        for row in 0..BRICK_ROWS {
            for col in 0..BRICK_COLS {
                if (row, col) != (0, 0) {
                    state.bricks.destroy(row, col);
                }
            }
        }
        let brick = BrickGrid::rect(0, 0);
        state.ball.pos = Vec2::new(brick.center_x(), brick.bottom() + BALL_RADIUS + 2.0);
        state.ball.set_velocity(Vec2::new(0.0, -4.0));
        state.score = 490;

        tick(&mut state, &TickInput::default());
        assert!(state.bricks.all_cleared());
        assert_eq!(state.score, 500);
        assert_eq!(state.pending_regen, Some(2)); // armed at 3, one tick elapsed

        // Countdown runs; expiry regenerates, keeping score and speed
        let speed = state.ball.speed;
        tick(&mut state, &TickInput::default());
        tick(&mut state, &TickInput::default());
        assert!(state.pending_regen.is_none());
        assert_eq!(state.bricks.alive_count(), BRICK_ROWS * BRICK_COLS);
        assert_eq!(state.score, 500);
        assert!((state.ball.speed - speed).abs() < 1e-4);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_manual_reset_cancels_regeneration_timer() {
        let mut state = GameState::new(7);
        state.pending_regen = Some(100);
        state.reset(false, None);
        assert!(state.pending_regen.is_none());
        // And ticking afterwards does not resurrect it
        quiet_corner(&mut state);
        tick(&mut state, &TickInput::default());
        assert!(state.pending_regen.is_none());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            /// Across seeds and many frames: the cached speed always equals
            /// the velocity magnitude, and a running ball is never left
            /// travelling near-horizontally at frame end.
            #[test]
            fn tick_preserves_core_invariants(seed in 0u64..10_000) {
                let mut state = GameState::new(seed);
                state.set_auto_follow(true);
                let input = TickInput::default();
                for _ in 0..1000 {
                    tick(&mut state, &input);
                    prop_assert!(
                        (state.ball.speed - state.ball.vel.length()).abs() < 1e-3
                    );
                    if state.phase == GamePhase::Ended {
                        break;
                    }
                    prop_assert!(
                        state.ball.vel.y.abs() / state.ball.speed
                            >= crate::sim::guards::MIN_VERTICAL_RATIO - 1e-3
                    );
                    // Resolvers always reposition before returning
                    prop_assert!(state.ball.left() >= -1e-3);
                    prop_assert!(state.ball.right() <= SCREEN_WIDTH + 1e-3);
                    prop_assert!(state.ball.top() >= -1e-3);
                }
            }
        }
    }
}
