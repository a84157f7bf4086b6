//! Error types
//!
//! Numerical trouble inside collision detection is never an error: detectors
//! return `None` and the candidate is skipped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected scene, table or settings values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("ball {id}: radius must be positive, got {value}")]
    BallRadius { id: u32, value: f64 },

    #[error("ball {id}: mass must be positive, got {value}")]
    BallMass { id: u32, value: f64 },

    #[error("ball {id}: position is not finite")]
    BallPosition { id: u32 },

    #[error("ball at index {index} has id {id}; ids must run 0..n in order")]
    BallId { index: usize, id: u32 },

    #[error("scene needs at least a cue ball")]
    NoBalls,

    #[error("coefficient {name} must be positive, got {value}")]
    NonPositiveCoefficient { name: &'static str, value: f64 },

    #[error("restitution {name} must lie in [0, 1], got {value}")]
    Restitution { name: &'static str, value: f64 },

    #[error("cushion {index} has zero length or a non-finite endpoint")]
    DegenerateCushion { index: usize },

    #[error("pocket {index}: position is not finite")]
    PocketPosition { index: usize },

    #[error("table must be finite and positive, got {width} x {length}")]
    TableSize { width: f64, length: f64 },

    #[error("pocket {index}: capture radius must be positive, got {value}")]
    PocketRadius { index: usize, value: f64 },

    #[error("rule setting {name} must be at least 1")]
    RuleLimit { name: &'static str },

    #[error("rack needs at least {needed} balls, got {count}")]
    RackSize { count: usize, needed: usize },

    #[error("rack x-range is empty: {min} > {max}")]
    RackRange { min: f64, max: f64 },

    #[error("{what} at ({x}, {y}) lies off the table")]
    RackOffTable { what: &'static str, x: f64, y: f64 },

    #[error("rack spacing {spacing} is closer than a ball diameter ({diameter})")]
    RackSpacing { spacing: f64, diameter: f64 },

    #[error("a game needs at least one player")]
    NoPlayers,
}

/// Errors surfaced by the simulation and game driver
#[derive(Error, Debug)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("no ball with id {0}")]
    UnknownBall(u32),

    #[error("ball {0} is pocketed and cannot be struck")]
    BallPocketed(u32),

    #[error("strike velocity or spin is not finite")]
    NonFiniteStrike,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An event resolved earlier than the one before it
///
/// Recorded on the shot and logged; the event is kept in the log at `previous`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[error("event at t={time} precedes previous event at t={previous}")]
pub struct InvariantViolation {
    pub time: f64,
    pub previous: f64,
}
