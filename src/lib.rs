//! Brickfall - a Breakout-style arcade core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, degeneracy guards)
//! - `tuning`: Data-driven game balance
//!
//! Rendering and input capture are external collaborators: a host calls
//! [`sim::tick`] once per frame, reads the state back, and draws it.

pub mod sim;
pub mod tuning;

pub use tuning::Tuning;

use glam::Vec2;
use rand::Rng;

/// Playfield and entity geometry constants
pub mod consts {
    /// Playfield dimensions
    pub const SCREEN_WIDTH: f32 = 800.0;
    pub const SCREEN_HEIGHT: f32 = 600.0;

    /// Brick grid layout
    pub const BRICK_WIDTH: f32 = 60.0;
    pub const BRICK_HEIGHT: f32 = 20.0;
    pub const BRICK_ROWS: usize = 5;
    pub const BRICK_COLS: usize = 10;
    /// Space between bricks
    pub const BRICK_PADDING: f32 = 10.0;
    /// Offset of the first row from the top edge
    pub const BRICK_OFFSET_TOP: f32 = 35.0;
    /// Offset of the first column from the left edge
    pub const BRICK_OFFSET_LEFT: f32 = 35.0;

    /// Paddle defaults - paddle slides along a fixed height near the bottom
    pub const PADDLE_WIDTH: f32 = 100.0;
    pub const PADDLE_HEIGHT: f32 = 10.0;
    /// Distance of the paddle's top surface from the bottom edge
    pub const PADDLE_BOTTOM_MARGIN: f32 = 50.0;

    /// Ball defaults (speeds are in playfield units per tick)
    pub const BALL_RADIUS: f32 = 10.0;
    pub const BALL_DEFAULT_SPEED: f32 = 3.0;

    /// Nominal tick rate, used only to convert wall-clock delays to ticks
    pub const TICKS_PER_SECOND: u32 = 60;
}

/// Decompose a speed and angle into velocity components.
///
/// Screen coordinates: y grows downward, so callers that want an upward
/// bounce negate the y component themselves.
#[inline]
pub fn vel_from_angle(speed: f32, angle: f32) -> Vec2 {
    Vec2::new(speed * angle.cos(), speed * angle.sin())
}

/// Rescale a velocity to a new magnitude, preserving its direction.
///
/// A (near-)zero vector has no direction to preserve; it is replaced by a
/// random non-axis-aligned one instead of dividing by zero.
pub fn rescale(v: Vec2, new_speed: f32, rng: &mut impl Rng) -> Vec2 {
    let speed = v.length();
    if speed < f32::EPSILON {
        return random_direction(rng) * new_speed;
    }
    v * (new_speed / speed)
}

/// A uniformly random unit vector, excluding directions within ~10 degrees
/// of either axis (rejection sampling).
///
/// Axis-aligned directions are exactly the degenerate states the guards
/// exist to break, so the fallback must never produce one.
pub fn random_direction(rng: &mut impl Rng) -> Vec2 {
    use std::f32::consts::TAU;
    let min_component = (10.0_f32).to_radians().sin();
    loop {
        let angle = rng.random_range(0.0..TAU);
        let dir = Vec2::new(angle.cos(), angle.sin());
        if dir.x.abs() >= min_component && dir.y.abs() >= min_component {
            return dir;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_vel_from_angle_cardinal() {
        let v = vel_from_angle(5.0, 0.0);
        assert!((v.x - 5.0).abs() < 1e-6);
        assert!(v.y.abs() < 1e-6);

        let v = vel_from_angle(5.0, std::f32::consts::FRAC_PI_2);
        assert!(v.x.abs() < 1e-5);
        assert!((v.y - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_rescale_preserves_direction() {
        let mut rng = Pcg32::seed_from_u64(7);
        let v = Vec2::new(3.0, -4.0);
        let scaled = rescale(v, 10.0, &mut rng);
        assert!((scaled.length() - 10.0).abs() < 1e-5);
        // Same direction: cross product near zero, dot positive
        assert!((v.x * scaled.y - v.y * scaled.x).abs() < 1e-4);
        assert!(v.dot(scaled) > 0.0);
    }

    #[test]
    fn test_rescale_zero_vector_fallback() {
        let mut rng = Pcg32::seed_from_u64(11);
        let scaled = rescale(Vec2::ZERO, 3.0, &mut rng);
        assert!((scaled.length() - 3.0).abs() < 1e-5);
        assert!(scaled.x.abs() > 0.0 && scaled.y.abs() > 0.0);
    }

    #[test]
    fn test_random_direction_avoids_axes() {
        let mut rng = Pcg32::seed_from_u64(42);
        let min_component = (10.0_f32).to_radians().sin();
        for _ in 0..200 {
            let dir = random_direction(&mut rng);
            assert!((dir.length() - 1.0).abs() < 1e-5);
            assert!(dir.x.abs() >= min_component);
            assert!(dir.y.abs() >= min_component);
        }
    }
}
