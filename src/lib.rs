//! Cue Sim - event-driven pool shot simulation
//!
//! Core modules:
//! - `sim`: Deterministic shot physics (root solving, trajectories, collisions, event loop)
//! - `rules`: Rotation ("9-ball") rule adjudication over a shot's event log
//! - `game`: Match driver (turns, frames, re-racks)
//! - `strategy`: Shot-selection strategies
//! - `stats`: Per-player statistics over frame history
//! - `settings`: Physical coefficients, rule and rack configuration

pub mod error;
pub mod game;
pub mod rules;
pub mod settings;
pub mod sim;
pub mod stats;
pub mod strategy;

pub use error::{ConfigError, SimError};
pub use game::Game;
pub use settings::{ClothPreset, Settings};

use glam::DVec3;

/// Simulation constants
pub mod consts {
    use glam::DVec3;

    /// Lower-bound push applied when a candidate repeats the most recent event
    pub const REPEAT_COLLISION_TOLERANCE: f64 = 1e-3;
    /// Time added after the last real segment start when computing a shot's end
    pub const SHOT_END_BUFFER: f64 = 1.0;
    /// Upper bound on resolved events per shot (guards against solver edge cases)
    pub const MAX_EVENTS_PER_SHOT: usize = 10_000;

    /// Where pocketed balls are parked, offset by `POCKET_HOLDING_STEP * id`
    pub const POCKET_HOLDING_ORIGIN: DVec3 = DVec3::new(1000.0, 200.0, 0.0);
    pub const POCKET_HOLDING_STEP: DVec3 = DVec3::new(0.0, 50.0, 0.0);

    /// Newton-Raphson iteration cap
    pub const NEWTON_MAX_ITERATIONS: usize = 100;
    /// Relative step size at which Newton-Raphson is considered converged
    pub const NEWTON_TOLERANCE: f64 = 1e-12;
    /// Leading coefficients smaller than this (relative to the largest) are dropped
    pub const DEGENERATE_COEFFICIENT: f64 = 1e-12;

    /// Id of the cue ball
    pub const CUE_BALL: u32 = 0;
}

/// Table-surface up axis
pub const UP: DVec3 = DVec3::Z;

/// Project a vector onto the table plane
#[inline]
pub fn planar(v: DVec3) -> DVec3 {
    DVec3::new(v.x, v.y, 0.0)
}

/// Deterministic parking spot for a pocketed ball
#[inline]
pub fn holding_position(id: u32) -> DVec3 {
    consts::POCKET_HOLDING_ORIGIN + consts::POCKET_HOLDING_STEP * id as f64
}
