//! Game state and core simulation types
//!
//! The whole session lives in one [`GameState`] aggregate so the tick loop
//! can be driven headlessly; nothing in here touches a graphical surface.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::guards::ensure_non_horizontal;
use crate::consts::*;
use crate::tuning::Tuning;
use crate::{rescale, vel_from_angle};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Active gameplay
    Running,
    /// Ball crossed the bottom boundary; state is frozen until a reset
    Ended,
}

/// Axis-aligned rectangle, used for bricks and the paddle's extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    #[inline]
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// The ball entity
///
/// Invariant: `speed == vel.length()` after every mutator. Direction changes
/// preserve magnitude; magnitude changes preserve direction.
#[derive(Debug, Clone)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Cached scalar speed, kept equal to `vel.length()`
    pub speed: f32,
}

impl Ball {
    fn new() -> Self {
        Self {
            pos: Vec2::new(SCREEN_WIDTH / 2.0, SCREEN_HEIGHT / 2.0),
            vel: Vec2::ZERO,
            radius: BALL_RADIUS,
            speed: 0.0,
        }
    }

    /// Replace the velocity outright, recomputing the cached speed.
    pub fn set_velocity(&mut self, vel: Vec2) {
        self.vel = vel;
        self.speed = vel.length();
    }

    /// Change speed while preserving direction.
    pub fn set_speed(&mut self, speed: f32, rng: &mut impl Rng) {
        self.vel = rescale(self.vel, speed, rng);
        self.speed = speed;
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x - self.radius
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.radius
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y - self.radius
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.radius
    }
}

/// The player's paddle
#[derive(Debug, Clone)]
pub struct Paddle {
    /// Left edge; the only coordinate that moves during a session
    pub x: f32,
    /// Top surface height, fixed per session
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Movement per tick while a direction key is held
    pub speed: f32,
}

impl Paddle {
    fn new(speed: f32) -> Self {
        Self {
            x: (SCREEN_WIDTH - PADDLE_WIDTH) / 2.0,
            y: SCREEN_HEIGHT - PADDLE_BOTTOM_MARGIN,
            width: PADDLE_WIDTH,
            height: PADDLE_HEIGHT,
            speed,
        }
    }

    /// Keep the paddle fully inside the playfield. Idempotent.
    pub fn clamp_x(&mut self) {
        self.x = self.x.clamp(0.0, SCREEN_WIDTH - self.width);
    }

    /// Move left (negative) or right (positive) by `dx`, clamped to bounds.
    pub fn move_by(&mut self, dx: f32) {
        self.x += dx;
        self.clamp_x();
    }

    /// Snap the paddle center to `x` (auto-follow), clamped to bounds.
    pub fn center_under(&mut self, x: f32) {
        self.x = x - self.width / 2.0;
        self.clamp_x();
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// The brick grid
///
/// Only liveness is stored; each brick's rectangle is a pure function of its
/// row/column and the layout constants.
#[derive(Debug, Clone)]
pub struct BrickGrid {
    alive: Vec<bool>,
}

impl BrickGrid {
    pub fn new() -> Self {
        Self {
            alive: vec![true; BRICK_ROWS * BRICK_COLS],
        }
    }

    /// Rectangle of the brick at (row, col), computed from layout constants.
    pub fn rect(row: usize, col: usize) -> Rect {
        Rect {
            x: col as f32 * (BRICK_WIDTH + BRICK_PADDING) + BRICK_OFFSET_LEFT,
            y: row as f32 * (BRICK_HEIGHT + BRICK_PADDING) + BRICK_OFFSET_TOP,
            width: BRICK_WIDTH,
            height: BRICK_HEIGHT,
        }
    }

    #[inline]
    pub fn is_alive(&self, row: usize, col: usize) -> bool {
        self.alive[row * BRICK_COLS + col]
    }

    /// Mark a brick dead. Dead is terminal until [`BrickGrid::regenerate`].
    pub fn destroy(&mut self, row: usize, col: usize) {
        self.alive[row * BRICK_COLS + col] = false;
    }

    pub fn all_cleared(&self) -> bool {
        self.alive.iter().all(|a| !a)
    }

    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    /// Bring every brick back (new round or scheduled regeneration).
    pub fn regenerate(&mut self) {
        self.alive.fill(true);
    }
}

impl Default for BrickGrid {
    fn default() -> Self {
        Self::new()
    }
}

/// Session-scoped counters used by the degeneracy guards
#[derive(Debug, Clone, Default)]
pub struct DegeneracyCounters {
    /// Ball height at the previous left/right wall bounce
    pub last_bounce_y: Option<f32>,
    /// Consecutive wall bounces within 5 units of the previous one's height
    pub same_height_bounces: u32,
    /// Consecutive frames where the ball's y moved by less than 1 unit
    pub small_dy_frames: u32,
    /// Ball y at the end of the previous frame, for the stall detector
    pub prev_ball_y: f32,
}

impl DegeneracyCounters {
    /// Zero every counter. A paddle hit or reset is evidence of healthy play.
    pub fn reset(&mut self, ball_y: f32) {
        self.last_bounce_y = None;
        self.same_height_bounces = 0;
        self.small_dy_frames = 0;
        self.prev_ball_y = ball_y;
    }
}

/// Complete game state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Single RNG stream feeding all jitter and degeneracy nudges
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Monotonically non-decreasing while running
    pub score: u64,
    /// Simulation tick counter, monotone across keep-score resets
    pub time_ticks: u64,
    /// Tick at which the current scoring run began
    start_tick: u64,
    /// Paddle x slaved to the ball every frame when set
    pub auto_follow: bool,
    pub ball: Ball,
    pub paddle: Paddle,
    pub bricks: BrickGrid,
    pub counters: DegeneracyCounters,
    /// Ticks until a cleared grid regenerates; `None` when nothing is armed
    pub pending_regen: Option<u32>,
    pub tuning: Tuning,
}

impl GameState {
    /// Create a new session with default tuning.
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let paddle_speed = tuning.paddle_speed_for(tuning.ball_speed);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Running,
            score: 0,
            time_ticks: 0,
            start_tick: 0,
            auto_follow: false,
            ball: Ball::new(),
            paddle: Paddle::new(paddle_speed),
            bricks: BrickGrid::new(),
            counters: DegeneracyCounters::default(),
            tuning,
            pending_regen: None,
        };
        state.reset(false, None);
        state
    }

    /// (Re)initialize for a new round.
    ///
    /// `keep_score` carries the score and elapsed-time origin across the
    /// reset (restart after a cleared grid); `retain_speed` keeps the ball
    /// at a caller-chosen speed instead of the tuned default. Any pending
    /// grid regeneration is cancelled before state is rebuilt so a stale
    /// timer can never clobber the fresh round.
    pub fn reset(&mut self, keep_score: bool, retain_speed: Option<f32>) {
        self.pending_regen = None;

        self.bricks.regenerate();

        let speed = retain_speed.unwrap_or(self.tuning.ball_speed);
        self.paddle = Paddle::new(self.tuning.paddle_speed_for(speed));

        self.ball.pos = Vec2::new(SCREEN_WIDTH / 2.0, SCREEN_HEIGHT / 2.0);
        // Serve diagonally, up or down at random: 30-90 or 240-300 degrees
        let angle_deg: f32 = if self.rng.random_bool(0.5) {
            self.rng.random_range(30.0..90.0)
        } else {
            self.rng.random_range(240.0..300.0)
        };
        self.ball
            .set_velocity(vel_from_angle(speed, angle_deg.to_radians()));
        ensure_non_horizontal(&mut self.ball, self.tuning.ball_speed, &mut self.rng);

        if !keep_score {
            self.score = 0;
            self.start_tick = self.time_ticks;
        }

        self.counters.reset(self.ball.pos.y);
        self.phase = GamePhase::Running;

        log::info!(
            "round start: speed {:.1}, score {} ({})",
            self.ball.speed,
            self.score,
            if keep_score { "kept" } else { "fresh" }
        );
    }

    /// Park the ball just above the paddle center and relaunch straight up.
    pub fn teleport_ball_to_paddle(&mut self) {
        self.ball.pos = Vec2::new(
            self.paddle.center_x(),
            self.paddle.y - self.ball.radius - 5.0,
        );
        let speed = self.ball.speed;
        self.ball.set_velocity(Vec2::new(0.0, -speed));
    }

    pub fn set_auto_follow(&mut self, enabled: bool) {
        self.auto_follow = enabled;
    }

    pub fn toggle_auto_follow(&mut self) {
        self.auto_follow = !self.auto_follow;
    }

    /// Nudge ball speed by `delta`, clamped to `[min, max]`. Direction is
    /// preserved and the paddle speed is re-derived from the ratio.
    pub fn adjust_ball_speed(&mut self, delta: f32, min: f32, max: f32) {
        let new_speed = (self.ball.speed + delta).clamp(min, max);
        self.ball.set_speed(new_speed, &mut self.rng);
        self.paddle.speed = self.tuning.paddle_speed_for(new_speed);
    }

    /// Ticks elapsed since the current scoring run began.
    pub fn playtime_ticks(&self) -> u64 {
        self.time_ticks - self.start_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_invariant_after_reset() {
        let state = GameState::new(1);
        let ball = &state.ball;
        assert!((ball.speed - ball.vel.length()).abs() < 1e-5);
        assert!((ball.speed - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_paddle_clamp_is_idempotent() {
        let mut paddle = Paddle::new(6.0);
        paddle.x = -40.0;
        paddle.clamp_x();
        let once = paddle.x;
        paddle.clamp_x();
        assert_eq!(once, paddle.x);
        assert_eq!(once, 0.0);

        paddle.x = SCREEN_WIDTH;
        paddle.clamp_x();
        assert_eq!(paddle.x, SCREEN_WIDTH - paddle.width);
    }

    #[test]
    fn test_brick_layout_from_indices() {
        let r = BrickGrid::rect(0, 0);
        assert_eq!(r.x, BRICK_OFFSET_LEFT);
        assert_eq!(r.y, BRICK_OFFSET_TOP);

        let r = BrickGrid::rect(2, 3);
        assert_eq!(r.x, 3.0 * (BRICK_WIDTH + BRICK_PADDING) + BRICK_OFFSET_LEFT);
        assert_eq!(r.y, 2.0 * (BRICK_HEIGHT + BRICK_PADDING) + BRICK_OFFSET_TOP);
    }

    #[test]
    fn test_brick_destroy_is_terminal_until_regenerate() {
        let mut grid = BrickGrid::new();
        assert_eq!(grid.alive_count(), BRICK_ROWS * BRICK_COLS);
        grid.destroy(1, 4);
        assert!(!grid.is_alive(1, 4));
        assert_eq!(grid.alive_count(), BRICK_ROWS * BRICK_COLS - 1);
        grid.regenerate();
        assert!(grid.is_alive(1, 4));
    }

    #[test]
    fn test_adjust_ball_speed_clamps_and_scales_paddle() {
        let mut state = GameState::new(2);
        state.adjust_ball_speed(100.0, 1.5, 9.0);
        assert!((state.ball.speed - 9.0).abs() < 1e-5);
        assert!((state.ball.vel.length() - 9.0).abs() < 1e-4);
        assert_eq!(state.paddle.speed, 18.0);

        state.adjust_ball_speed(-100.0, 1.5, 9.0);
        assert!((state.ball.speed - 1.5).abs() < 1e-5);
        // Ratio would give 3.0; the floor keeps the paddle controllable
        assert_eq!(state.paddle.speed, 4.0);
    }

    #[test]
    fn test_reset_keep_score_preserves_run() {
        let mut state = GameState::new(3);
        state.score = 120;
        state.time_ticks = 500;
        state.reset(true, Some(7.0));
        assert_eq!(state.score, 120);
        assert_eq!(state.playtime_ticks(), 500);
        assert!((state.ball.speed - 7.0).abs() < 1e-5);

        state.reset(false, None);
        assert_eq!(state.score, 0);
        assert_eq!(state.playtime_ticks(), 0);
        assert!((state.ball.speed - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_reset_cancels_pending_regeneration() {
        let mut state = GameState::new(4);
        state.pending_regen = Some(120);
        state.reset(false, None);
        assert!(state.pending_regen.is_none());
    }

    #[test]
    fn test_teleport_parks_ball_above_paddle() {
        let mut state = GameState::new(5);
        state.paddle.x = 200.0;
        state.teleport_ball_to_paddle();
        assert_eq!(state.ball.pos.x, state.paddle.center_x());
        assert_eq!(state.ball.pos.y, state.paddle.y - state.ball.radius - 5.0);
        assert!(state.ball.vel.x == 0.0 && state.ball.vel.y < 0.0);
        assert!((state.ball.speed - state.ball.vel.length()).abs() < 1e-5);
    }
}
