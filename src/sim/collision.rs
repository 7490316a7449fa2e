//! Collision detection and response
//!
//! The tricky part of Brickfall: resolving the ball against walls, paddle,
//! and the brick grid without tunneling, double-hits, or the degenerate
//! trajectories the guards exist to break. Resolvers always reposition the
//! ball out of penetration before returning.

use glam::Vec2;
use rand::Rng;

use super::guards::ensure_non_horizontal;
use super::state::{Ball, BrickGrid, DegeneracyCounters, Paddle};
use crate::consts::{BRICK_COLS, BRICK_ROWS, SCREEN_WIDTH};
use crate::vel_from_angle;

/// Wall bounces within this height window count as "same height"
const SAME_HEIGHT_WINDOW: f32 = 5.0;

/// Same-height wall bounces tolerated before a direction perturbation
const SAME_HEIGHT_LIMIT: u32 = 3;

/// Clearance left between ball and brick when repositioning after a hit
const BRICK_CLEARANCE: f32 = 0.1;

/// Half-width of the paddle's center band in relative strike coordinates
const CENTER_BAND: f32 = 0.05;

/// Resolve the left/right/top playfield boundaries.
///
/// The bottom boundary is deliberately not handled here; crossing it is the
/// loss condition, checked after all resolvers have run. Left/right bounces
/// feed the same-height counter: a ball ping-ponging horizontally at one
/// height gets its direction perturbed after three such bounces.
pub fn resolve_walls(
    ball: &mut Ball,
    counters: &mut DegeneracyCounters,
    fallback_speed: f32,
    rng: &mut impl Rng,
) {
    if ball.left() < 0.0 || ball.right() > SCREEN_WIDTH {
        ball.vel.x = -ball.vel.x;
        ball.pos.x = if ball.left() < 0.0 {
            ball.radius
        } else {
            SCREEN_WIDTH - ball.radius
        };

        let same_height = counters
            .last_bounce_y
            .is_some_and(|last| (ball.pos.y - last).abs() < SAME_HEIGHT_WINDOW);
        counters.same_height_bounces = if same_height {
            counters.same_height_bounces + 1
        } else {
            1
        };
        counters.last_bounce_y = Some(ball.pos.y);

        if counters.same_height_bounces >= SAME_HEIGHT_LIMIT {
            log::debug!(
                "same-height wall bounces at y {:.1}, perturbing direction",
                ball.pos.y
            );
            ensure_non_horizontal(ball, fallback_speed, rng);
            counters.same_height_bounces = 0;
        }
    }

    if ball.top() < 0.0 {
        ball.vel.y = ball.vel.y.abs();
        ball.pos.y = ball.radius;
        // A top bounce changes height; the horizontal ping-pong streak is over
        counters.same_height_bounces = 0;
        counters.last_bounce_y = None;
    }
}

/// Bounce angle (radians) for a paddle hit, from the relative strike position.
///
/// This is a game-feel function, not a reflection law: center hits go back
/// near-vertical with a small random lean continuing the incoming horizontal
/// sense; edge hits sweep out to 30-70 degrees (right) or 110-150 (left).
pub fn calculate_bounce_angle(ball: &Ball, paddle: &Paddle, rng: &mut impl Rng) -> f32 {
    let u = (ball.pos.x - paddle.x) / paddle.width - 0.5;

    let angle_deg = if u.abs() < CENTER_BAND {
        let base = if ball.vel.x > 0.0 { 65.0 } else { 115.0 };
        base + rng.random_range(-7.0..7.0)
    } else if u < 0.0 {
        130.0 + (u + 0.5) * 40.0
    } else {
        50.0 + (u - 0.5) * 40.0
    };

    angle_deg.to_radians()
}

/// Resolve a ball/paddle contact. Returns true if a bounce happened.
///
/// Triggers only on downward travel with horizontal overlap, using a swept
/// test (did the ball's bottom cross the paddle's top surface between
/// frames?) so a fast ball cannot tunnel through the thin paddle. A
/// currently-overlapping check remains as fallback for balls that entered
/// the paddle band some other way.
///
/// Contact never changes speed, only direction. The ball is repositioned
/// exactly onto the paddle surface; in auto-follow mode it is nudged a few
/// units further out, since the paddle will be recentered under it next
/// frame and would otherwise re-trigger immediately.
#[allow(clippy::too_many_arguments)]
pub fn resolve_paddle(
    ball: &mut Ball,
    prev_pos: Vec2,
    paddle: &Paddle,
    auto_follow: bool,
    auto_follow_nudge: f32,
    counters: &mut DegeneracyCounters,
    fallback_speed: f32,
    rng: &mut impl Rng,
) -> bool {
    if ball.vel.y <= 0.0 {
        return false;
    }

    let overlaps_x = ball.right() >= paddle.x && ball.left() <= paddle.x + paddle.width;
    if !overlaps_x {
        return false;
    }

    let prev_bottom = prev_pos.y + ball.radius;
    let crossed_top = prev_bottom <= paddle.y && ball.bottom() >= paddle.y;
    let inside_band = ball.bottom() >= paddle.y && ball.top() <= paddle.y + paddle.height;
    if !crossed_top && !inside_band {
        return false;
    }

    let angle = calculate_bounce_angle(ball, paddle, rng);
    let speed = ball.speed;
    let v = vel_from_angle(speed, angle);
    // Up is -y in screen coordinates
    ball.set_velocity(Vec2::new(v.x, -v.y));
    ensure_non_horizontal(ball, fallback_speed, rng);

    ball.pos.y = paddle.y - ball.radius;
    if auto_follow {
        ball.pos.y -= auto_follow_nudge;
    }

    // A paddle hit is healthy play; all degeneracy streaks start over
    counters.reset(ball.pos.y);
    true
}

/// Resolve at most one brick collision, scanning the grid row-major.
///
/// The first alive brick overlapping the ball wins and the scan stops, so
/// adjacent bricks can never double-score or double-bounce in one frame.
/// Returns the destroyed brick's (row, col).
///
/// The bounce axis comes from comparing the ball's pre-displacement bounding
/// box against the brick's edges; if the ball is already deeply overlapping
/// (fast frame), the axis with the smaller overlap is the one it crossed.
pub fn resolve_bricks(
    ball: &mut Ball,
    prev_pos: Vec2,
    grid: &mut BrickGrid,
    counters: &mut DegeneracyCounters,
    fallback_speed: f32,
    rng: &mut impl Rng,
) -> Option<(usize, usize)> {
    for row in 0..BRICK_ROWS {
        for col in 0..BRICK_COLS {
            if !grid.is_alive(row, col) {
                continue;
            }
            let brick = BrickGrid::rect(row, col);

            let overlapping = ball.right() > brick.left()
                && ball.left() < brick.right()
                && ball.bottom() > brick.top()
                && ball.top() < brick.bottom();
            if !overlapping {
                continue;
            }

            grid.destroy(row, col);

            let prev_left = prev_pos.x - ball.radius;
            let prev_right = prev_pos.x + ball.radius;
            let prev_top = prev_pos.y - ball.radius;
            let prev_bottom = prev_pos.y + ball.radius;

            let from_left = prev_right <= brick.left() && ball.right() > brick.left();
            let from_right = prev_left >= brick.right() && ball.left() < brick.right();
            let from_top = prev_bottom <= brick.top() && ball.bottom() > brick.top();
            let from_bottom = prev_top >= brick.bottom() && ball.top() < brick.bottom();

            if from_left || from_right {
                ball.vel.x = -ball.vel.x;
                ball.pos.x = if from_left {
                    brick.left() - ball.radius - BRICK_CLEARANCE
                } else {
                    brick.right() + ball.radius + BRICK_CLEARANCE
                };
            } else if from_top || from_bottom {
                ball.vel.y = -ball.vel.y;
                ball.pos.y = if from_top {
                    brick.top() - ball.radius - BRICK_CLEARANCE
                } else {
                    brick.bottom() + ball.radius + BRICK_CLEARANCE
                };
            } else {
                // Deep overlap: the axis with less penetration is the one
                // the ball just crossed
                let overlap_x =
                    (ball.radius + brick.width / 2.0) - (ball.pos.x - brick.center_x()).abs();
                let overlap_y =
                    (ball.radius + brick.height / 2.0) - (ball.pos.y - brick.center_y()).abs();
                if overlap_x < overlap_y {
                    ball.vel.x = -ball.vel.x;
                    ball.pos.x += overlap_x.copysign(ball.pos.x - brick.center_x());
                } else {
                    ball.vel.y = -ball.vel.y;
                    ball.pos.y += overlap_y.copysign(ball.pos.y - brick.center_y());
                }
            }

            // A brick bounce must not leave the ball moving purely sideways
            ensure_non_horizontal(ball, fallback_speed, rng);
            counters.same_height_bounces = 0;

            log::debug!("brick ({row}, {col}) destroyed, {} left", grid.alive_count());
            return Some((row, col));
        }
    }
    None
}
