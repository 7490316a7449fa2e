//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure and
//! deterministic:
//! - One frame per [`tick`] call, driven by the external scheduler
//! - Seeded RNG only (the single stream owned by [`GameState`])
//! - Fixed resolver order within a frame
//! - No rendering or platform dependencies

pub mod collision;
pub mod guards;
pub mod state;
pub mod tick;

pub use collision::{calculate_bounce_angle, resolve_bricks, resolve_paddle, resolve_walls};
pub use guards::{MIN_VERTICAL_RATIO, ensure_non_horizontal, sanity_check_ball_position};
pub use state::{Ball, BrickGrid, DegeneracyCounters, GamePhase, GameState, Paddle, Rect};
pub use tick::{TickInput, tick};
