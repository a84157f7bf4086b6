//! Scene, ball and shot-record types
//!
//! Everything the simulator reads or produces lives here: the scene it mutates
//! (balls and their paths), and the immutable records it hands back (events,
//! shots) for playback and rule adjudication.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::path::{Path, PathSegment};
use super::table::Table;
use crate::consts::CUE_BALL;
use crate::error::{ConfigError, InvariantViolation, SimError};

/// Physical coefficients, fixed for the duration of a shot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    /// Sliding friction between ball and cloth
    pub mu_slide: f64,
    /// Rolling resistance
    pub mu_roll: f64,
    /// Gravitational acceleration
    pub g: f64,
    /// Ball-ball restitution
    pub e_ball_ball: f64,
    /// Ball-cushion restitution
    pub e_ball_cushion: f64,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            mu_slide: 15.5,
            mu_roll: 2.6,
            g: 9.8,
            e_ball_ball: 1.0,
            e_ball_cushion: 1.0,
        }
    }
}

impl Coefficients {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("mu_slide", self.mu_slide), ("mu_roll", self.mu_roll), ("g", self.g)] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ConfigError::NonPositiveCoefficient { name, value });
            }
        }
        for (name, value) in [("e_ball_ball", self.e_ball_ball), ("e_ball_cushion", self.e_ball_cushion)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Restitution { name, value });
            }
        }
        Ok(())
    }
}

/// A ball on the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    /// 0 is the cue ball
    pub id: u32,
    /// Resting position between shots
    pub position: DVec3,
    pub radius: f64,
    pub mass: f64,
    pub pocketed: bool,
    /// Trajectory for the current shot, replaced wholesale when a shot starts
    pub path: Path,
}

impl Ball {
    pub fn new(id: u32, position: DVec3, radius: f64, mass: f64) -> Self {
        Self {
            id,
            position,
            radius,
            mass,
            pocketed: false,
            path: Path::at_rest(position),
        }
    }

    /// Last segment of the current path
    ///
    /// An empty path reads as a ball at rest where it stands.
    pub fn current_segment(&self) -> PathSegment {
        self.path
            .last()
            .copied()
            .unwrap_or_else(|| PathSegment::stationary(self.position, 0.0))
    }

    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if self.id as usize != index {
            return Err(ConfigError::BallId { index, id: self.id });
        }
        if !(self.radius > 0.0) || !self.radius.is_finite() {
            return Err(ConfigError::BallRadius {
                id: self.id,
                value: self.radius,
            });
        }
        if !(self.mass > 0.0) || !self.mass.is_finite() {
            return Err(ConfigError::BallMass {
                id: self.id,
                value: self.mass,
            });
        }
        if !self.position.is_finite() {
            return Err(ConfigError::BallPosition { id: self.id });
        }
        Ok(())
    }
}

/// Balls, table and coefficients for one table session
///
/// Only the simulator mutates ball paths, and only inside `simulate`. Fields
/// are closed to outside callers so every scene has passed [`Scene::new`]:
/// it holds at least the cue ball and ids run `0..n`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SceneParts")]
pub struct Scene {
    pub(crate) table: Table,
    pub(crate) balls: Vec<Ball>,
    pub(crate) coefficients: Coefficients,
}

/// Unvalidated wire form of a [`Scene`]
#[derive(Deserialize)]
struct SceneParts {
    table: Table,
    balls: Vec<Ball>,
    coefficients: Coefficients,
}

impl TryFrom<SceneParts> for Scene {
    type Error = ConfigError;

    fn try_from(parts: SceneParts) -> Result<Self, Self::Error> {
        Scene::new(parts.table, parts.balls, parts.coefficients)
    }
}

impl Scene {
    /// Validate and assemble a scene
    ///
    /// Ball ids must run `0..n` in order so an id doubles as an index.
    pub fn new(table: Table, balls: Vec<Ball>, coefficients: Coefficients) -> Result<Self, ConfigError> {
        if balls.is_empty() {
            return Err(ConfigError::NoBalls);
        }
        for (index, ball) in balls.iter().enumerate() {
            ball.validate(index)?;
        }
        coefficients.validate()?;
        Ok(Self {
            table,
            balls,
            coefficients,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Every ball, indexed by id
    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    pub fn ball(&self, id: u32) -> Option<&Ball> {
        self.balls.get(id as usize)
    }

    pub fn cue_ball(&self) -> &Ball {
        // Non-empty by construction
        &self.balls[CUE_BALL as usize]
    }

    /// Move a ball to a new resting position and put it back in play
    pub fn place_ball(&mut self, id: u32, position: DVec3) -> Result<(), SimError> {
        let ball = self.balls.get_mut(id as usize).ok_or(SimError::UnknownBall(id))?;
        if !position.is_finite() {
            return Err(ConfigError::BallPosition { id }.into());
        }
        ball.position = position;
        ball.pocketed = false;
        ball.path = Path::at_rest(position);
        Ok(())
    }

    /// Pocketed flag of every ball, indexed by id
    pub fn pocketed_flags(&self) -> Vec<bool> {
        self.balls.iter().map(|b| b.pocketed).collect()
    }

    /// Drop every ball's path, leaving each at rest where it stands
    pub fn clear_paths(&mut self) {
        for ball in &mut self.balls {
            ball.path = Path::at_rest(ball.position);
        }
    }

    /// Move every ball to where its current path comes to rest
    pub fn freeze_positions(&mut self) {
        for ball in &mut self.balls {
            if let Some(position) = ball.path.final_position() {
                ball.position = position;
            }
        }
    }
}

/// Cue strike: linear velocity and spin imparted to the struck ball
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Strike {
    pub velocity: DVec3,
    pub spin: DVec3,
}

impl Strike {
    pub fn new(velocity: DVec3, spin: DVec3) -> Self {
        Self { velocity, spin }
    }

    pub fn is_finite(&self) -> bool {
        self.velocity.is_finite() && self.spin.is_finite()
    }
}

/// What happened at an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotEventKind {
    BallBallCollision { first: u32, second: u32 },
    BallCushionCollision { ball: u32, cushion: usize },
    BallPocketed { ball: u32, pocket: usize },
    /// Sliding ended, rolling begins
    RollTransition { ball: u32 },
    /// Rolling ended, ball at rest
    Stop { ball: u32 },
}

impl ShotEventKind {
    /// Whether this event involves `id`
    pub fn involves(&self, id: u32) -> bool {
        match *self {
            ShotEventKind::BallBallCollision { first, second } => first == id || second == id,
            ShotEventKind::BallCushionCollision { ball, .. }
            | ShotEventKind::BallPocketed { ball, .. }
            | ShotEventKind::RollTransition { ball }
            | ShotEventKind::Stop { ball } => ball == id,
        }
    }

    /// Whether this is a ball-ball contact between exactly `a` and `b` (either order)
    pub fn is_contact_between(&self, a: u32, b: u32) -> bool {
        matches!(*self, ShotEventKind::BallBallCollision { first, second }
            if (first == a && second == b) || (first == b && second == a))
    }
}

/// A timestamped event of one shot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotEvent {
    pub time: f64,
    pub kind: ShotEventKind,
}

/// Rule verdict attached to a shot once adjudicated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotVerdict {
    /// Legal shot that pocketed a ball; shooter continues
    Pot,
    /// Legal shot, nothing pocketed
    Miss,
    Foul,
}

/// Result of one cue strike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    /// Index of the shooting player, set by the game driver
    pub player: Option<usize>,
    pub struck_ball: u32,
    pub strike: Strike,
    /// Chronological event log
    pub events: Vec<ShotEvent>,
    /// Snapshot of every ball's path, indexed by ball id
    pub ball_paths: Vec<Path>,
    /// Latest start of any ball's final segment plus a fixed buffer
    pub end_time: f64,
    /// Events that came out earlier than their predecessor and were clamped to its time
    pub violations: Vec<InvariantViolation>,
    /// Set when the event cap stopped the simulation early
    pub truncated: bool,
    pub verdict: Option<ShotVerdict>,
}

impl Shot {
    /// Positions of every ball at `time`, indexed by id
    pub fn positions_at(&self, time: f64) -> Vec<Option<DVec3>> {
        self.ball_paths.iter().map(|p| p.position_at(time)).collect()
    }

    /// Ids of balls pocketed during this shot, in event order
    pub fn pocketed_balls(&self) -> impl Iterator<Item = u32> + '_ {
        self.events.iter().filter_map(|e| match e.kind {
            ShotEventKind::BallPocketed { ball, .. } => Some(ball),
            _ => None,
        })
    }

    /// First ball-ball contact of the shot
    pub fn first_contact(&self) -> Option<(u32, u32)> {
        self.events.iter().find_map(|e| match e.kind {
            ShotEventKind::BallBallCollision { first, second } => Some((first, second)),
            _ => None,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// One rack: its shots and, once decided, the winner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub shots: Vec<Shot>,
    pub winner: Option<usize>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }
}
