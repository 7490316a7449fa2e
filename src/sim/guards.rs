//! Degeneracy guards
//!
//! Naive reflection produces two classes of gameplay-broken states: a ball
//! travelling (almost) perfectly horizontally, which never falls, and a ball
//! oscillating between the same two points. These guards detect both and
//! nudge the velocity just enough to break the pattern, always preserving
//! total speed.

use glam::Vec2;
use rand::Rng;

use super::state::{Ball, DegeneracyCounters};
use crate::consts::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::random_direction;

/// Minimum |dy|/speed after the non-horizontal guard runs (~5.7 degrees
/// from horizontal)
pub const MIN_VERTICAL_RATIO: f32 = 0.10;

/// Forced vertical fraction is drawn from this range when the guard fires
const FORCED_VERTICAL_RANGE: std::ops::Range<f32> = 0.10..0.15;

/// Inward clamp margin so a corrected ball does not re-trigger next frame
const EDGE_MARGIN: f32 = 10.0;

/// Frames of sub-unit vertical movement before the stall breaker fires
const STALL_FRAMES: u32 = 4;

/// Vertical fraction assigned by the stall breaker
const STALL_VERTICAL_FRACTION: f32 = 0.30;

fn random_sign(rng: &mut impl Rng) -> f32 {
    if rng.random_bool(0.5) { 1.0 } else { -1.0 }
}

/// Force the ball's direction away from horizontal.
///
/// A zero-length velocity is fully replaced by a random non-axis direction
/// at `fallback_speed`. Otherwise, if the vertical component carries less
/// than [`MIN_VERTICAL_RATIO`] of the total speed, dy is reassigned to a
/// randomized 10-15% of it and dx recomputed from the Pythagorean remainder,
/// keeping both signs (dy's sign falls back to a half-field bias: downward
/// in the upper half, upward in the lower half).
pub fn ensure_non_horizontal(ball: &mut Ball, fallback_speed: f32, rng: &mut impl Rng) {
    let speed = ball.vel.length();
    if speed < f32::EPSILON {
        ball.set_velocity(random_direction(rng) * fallback_speed);
        log::debug!("non-horizontal guard: zero velocity replaced");
        return;
    }

    if ball.vel.y.abs() / speed >= MIN_VERTICAL_RATIO {
        return;
    }

    let dy_sign = if ball.vel.y != 0.0 {
        ball.vel.y.signum()
    } else if ball.pos.y < SCREEN_HEIGHT / 2.0 {
        1.0 // upper half: bias downward, back toward the paddle
    } else {
        -1.0
    };
    let dy = dy_sign * speed * rng.random_range(FORCED_VERTICAL_RANGE);

    let dx_sign = if ball.vel.x != 0.0 {
        ball.vel.x.signum()
    } else {
        random_sign(rng)
    };
    let dx = dx_sign * (speed * speed - dy * dy).sqrt();

    ball.set_velocity(Vec2::new(dx, dy));
    log::debug!(
        "non-horizontal guard: forced dy to {:.0}% of speed",
        100.0 * dy.abs() / speed
    );
}

/// Defensive per-frame position check, independent of the wall resolver.
///
/// Re-clamps the ball inside the playfield with an inward margin, and tracks
/// consecutive frames of sub-unit vertical movement; four in a row means the
/// ball is stuck in a near-horizontal pattern the angle test missed (it can
/// happen right after a reflection), so dy is forcibly reassigned to ±30% of
/// the current speed.
pub fn sanity_check_ball_position(
    ball: &mut Ball,
    counters: &mut DegeneracyCounters,
    rng: &mut impl Rng,
) {
    if ball.left() < 0.0 {
        ball.pos.x = ball.radius + EDGE_MARGIN;
        ball.vel.x = ball.vel.x.abs();
    } else if ball.right() > SCREEN_WIDTH {
        ball.pos.x = SCREEN_WIDTH - ball.radius - EDGE_MARGIN;
        ball.vel.x = -ball.vel.x.abs();
    }
    if ball.top() < 0.0 {
        ball.pos.y = ball.radius + EDGE_MARGIN;
        ball.vel.y = ball.vel.y.abs();
    }

    if (ball.pos.y - counters.prev_ball_y).abs() < 1.0 {
        counters.small_dy_frames += 1;
    } else {
        counters.small_dy_frames = 0;
    }
    counters.prev_ball_y = ball.pos.y;

    if counters.small_dy_frames >= STALL_FRAMES {
        let speed = ball.vel.length();
        let mut dy = speed * STALL_VERTICAL_FRACTION * random_sign(rng);
        let dx_sign = if ball.vel.x >= 0.0 { 1.0 } else { -1.0 };
        let mut dx = dx_sign * (speed * speed - dy * dy).max(0.0).sqrt();
        if dx.abs() < 0.1 && dy.abs() < 0.1 {
            // Degenerate near-zero speed: fall back to a 45-degree split
            dx = speed * std::f32::consts::FRAC_1_SQRT_2 * random_sign(rng);
            dy = speed * std::f32::consts::FRAC_1_SQRT_2 * random_sign(rng);
        }
        ball.set_velocity(Vec2::new(dx, dy));
        counters.small_dy_frames = 0;
        log::debug!("stall breaker: vertical movement forced at y {:.1}", ball.pos.y);
    }
}
