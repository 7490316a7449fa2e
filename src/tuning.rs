//! Data-driven game balance
//!
//! Playfield geometry is fixed in [`crate::consts`]; everything a designer
//! might want to retune without a rebuild lives here. Missing fields in a
//! tuning file fall back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::consts::{BALL_DEFAULT_SPEED, TICKS_PER_SECOND};

/// Balance parameters for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Initial ball speed (units per tick)
    pub ball_speed: f32,
    /// Lower speed bound as a multiple of `ball_speed`
    pub min_speed_factor: f32,
    /// Upper speed bound as a multiple of `ball_speed`
    pub max_speed_factor: f32,
    /// Speed change per tick while a speed key is held
    pub speed_step: f32,
    /// Paddle speed as a multiple of ball speed
    pub paddle_speed_ratio: f32,
    /// Floor for paddle speed so it stays controllable at low ball speeds
    pub paddle_min_speed: f32,
    /// Points awarded per destroyed brick
    pub brick_score: u64,
    /// Delay before a cleared grid regenerates, in ticks
    pub regen_delay_ticks: u32,
    /// Extra separation after a paddle bounce in auto-follow mode
    pub auto_follow_nudge: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            ball_speed: BALL_DEFAULT_SPEED,
            min_speed_factor: 0.5,
            max_speed_factor: 3.0,
            speed_step: 0.1,
            paddle_speed_ratio: 2.0,
            paddle_min_speed: 4.0,
            brick_score: 10,
            regen_delay_ticks: 5 * TICKS_PER_SECOND,
            auto_follow_nudge: 3.0,
        }
    }
}

impl Tuning {
    /// Parse tuning overrides from JSON; absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Lowest speed the ball may be slowed to.
    pub fn min_ball_speed(&self) -> f32 {
        self.ball_speed * self.min_speed_factor
    }

    /// Highest speed the ball may be pushed to.
    pub fn max_ball_speed(&self) -> f32 {
        self.ball_speed * self.max_speed_factor
    }

    /// Paddle speed derived from the current ball speed, floor-clamped.
    pub fn paddle_speed_for(&self, ball_speed: f32) -> f32 {
        (ball_speed * self.paddle_speed_ratio).max(self.paddle_min_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let t = Tuning::default();
        assert_eq!(t.ball_speed, 3.0);
        assert_eq!(t.min_ball_speed(), 1.5);
        assert_eq!(t.max_ball_speed(), 9.0);
        assert_eq!(t.regen_delay_ticks, 300);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let t = Tuning::from_json(r#"{"ball_speed": 4.5, "brick_score": 25}"#).unwrap();
        assert_eq!(t.ball_speed, 4.5);
        assert_eq!(t.brick_score, 25);
        assert_eq!(t.paddle_speed_ratio, 2.0);
    }

    #[test]
    fn test_paddle_speed_floor() {
        let t = Tuning::default();
        // At minimum ball speed the ratio alone would give 3.0; floor wins
        assert_eq!(t.paddle_speed_for(t.min_ball_speed()), 4.0);
        assert_eq!(t.paddle_speed_for(9.0), 18.0);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(Tuning::from_json("not json").is_err());
    }
}
