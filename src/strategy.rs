//! Shot selection
//!
//! A strategy sees the table through a read-only [`TableView`] and answers
//! with a cue strike. It is called once per turn and must not keep state
//! that changes its answer for the same view.

use glam::DVec3;

use crate::UP;
use crate::consts::CUE_BALL;
use crate::sim::{Ball, Scene, Strike, plan_rolling_shot};

/// What a strategy may look at when choosing a shot
#[derive(Debug, Clone, Copy)]
pub struct TableView<'a> {
    pub scene: &'a Scene,
    /// Ball that must be contacted first, if any remains
    pub target: Option<u32>,
}

impl<'a> TableView<'a> {
    pub fn new(scene: &'a Scene, target: Option<u32>) -> Self {
        Self { scene, target }
    }

    pub fn cue_ball(&self) -> &'a Ball {
        self.scene.cue_ball()
    }

    pub fn target_ball(&self) -> Option<&'a Ball> {
        self.target.and_then(|id| self.scene.ball(id))
    }

    /// Balls still on the table
    pub fn balls_in_play(&self) -> impl Iterator<Item = &'a Ball> + 'a {
        self.scene.balls.iter().filter(|b| !b.pocketed)
    }

    /// Whether a ball travelling `from -> to` would touch any other ball on the way
    ///
    /// Balls listed in `ignore` are skipped.
    pub fn line_is_blocked(&self, from: DVec3, to: DVec3, radius: f64, ignore: &[u32]) -> bool {
        let line = to - from;
        let length = line.length();
        let tangent = line.normalize_or_zero();
        let normal = tangent.cross(UP);
        self.balls_in_play()
            .filter(|b| !ignore.contains(&b.id))
            .any(|b| {
                let offset = b.position - from;
                let along = offset.dot(tangent);
                offset.dot(normal).abs() < 2.0 * radius && along > 0.0 && along < length
            })
    }
}

/// A player's shot-selection policy
pub trait ShotStrategy {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn decide_shot(&self, view: &TableView) -> Strike;
}

/// Drive the cue ball straight at the target ball
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectStrategy {
    pub speed: f64,
}

impl Default for DirectStrategy {
    fn default() -> Self {
        Self { speed: 12.0 }
    }
}

impl DirectStrategy {
    pub fn new(speed: f64) -> Self {
        Self { speed }
    }

    fn strike_towards(&self, view: &TableView) -> Strike {
        let cue = view.cue_ball().position;
        let direction = view
            .target_ball()
            .map(|b| (b.position - cue).normalize_or_zero())
            .filter(|d| *d != DVec3::ZERO)
            .unwrap_or(DVec3::X);
        Strike::new(direction * self.speed, DVec3::ZERO)
    }
}

impl ShotStrategy for DirectStrategy {
    fn name(&self) -> &str {
        "Direct"
    }

    fn description(&self) -> &str {
        "Hits the cue ball straight at the target ball with a fixed speed."
    }

    fn decide_shot(&self, view: &TableView) -> Strike {
        self.strike_towards(view)
    }
}

/// Object-ball speed that carries it `distance` against sliding friction alone
///
/// Overestimates what is needed, since the ball soon rolls and rolling
/// resistance is much weaker.
fn pot_speed(friction: f64, distance: f64) -> f64 {
    (2.0 * friction * distance).sqrt()
}

/// Strike that brings the cue ball to `ghost` rolling at `impact_speed`
///
/// The cue ball is planned to start rolling `roll_fraction` of the way to the
/// ghost ball. Without a rolling plan it gets a spinless strike sized for
/// sliding friction the whole way.
fn strike_to_ghost(view: &TableView, ghost: DVec3, impact_speed: f64, roll_fraction: f64) -> Strike {
    let cue = view.cue_ball();
    let coefficients = &view.scene.coefficients;
    let aim_line = ghost - cue.position;
    let direction = aim_line.normalize_or_zero();

    let deceleration = coefficients.mu_roll * coefficients.g;
    let rest = ghost + direction * (impact_speed * impact_speed / (2.0 * deceleration));
    let roll_from = cue.position + aim_line * roll_fraction;
    let roll_velocity = direction * (2.0 * deceleration * (rest - roll_from).length()).sqrt();

    plan_rolling_shot(cue.position, rest, roll_velocity, cue.radius, coefficients).unwrap_or_else(|| {
        let friction = coefficients.mu_slide * coefficients.g;
        let speed = (impact_speed * impact_speed + 2.0 * friction * aim_line.length()).sqrt();
        Strike::new(direction * speed, DVec3::ZERO)
    })
}

/// Ghost-ball potting
///
/// Tries each pocket in turn and plays the first one whose cut is not too
/// thin and whose cue-ball and object-ball lines are clear. The cue ball is
/// struck so it arrives at the ghost ball rolling, fast enough for the object
/// ball to cover its distance against sliding friction alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PotStrategy {
    /// Smallest cosine between aim line and pot line worth attempting
    pub min_cut: f64,
    /// Share of the way to the ghost ball, in `(0, 1]`, by which the cue ball should be rolling
    pub roll_fraction: f64,
    /// Played when no pocket is makeable
    pub fallback: DirectStrategy,
}

impl Default for PotStrategy {
    fn default() -> Self {
        Self {
            min_cut: 0.2,
            roll_fraction: 0.5,
            fallback: DirectStrategy::default(),
        }
    }
}

impl PotStrategy {
    fn plan(&self, view: &TableView, target: &Ball) -> Option<Strike> {
        let cue = view.cue_ball();
        let friction = view.scene.coefficients.mu_slide * view.scene.coefficients.g;

        view.scene.table.pockets().iter().find_map(|pocket| {
            let shot_line = pocket.position - target.position;
            let ghost = target.position - shot_line.normalize_or_zero() * (2.0 * target.radius);
            let aim_line = ghost - cue.position;
            let cut = aim_line.normalize_or_zero().dot(shot_line.normalize_or_zero());
            if cut < self.min_cut {
                return None;
            }
            if view.line_is_blocked(target.position, pocket.position, target.radius, &[target.id])
                || view.line_is_blocked(cue.position, ghost, cue.radius, &[CUE_BALL, target.id])
            {
                return None;
            }

            let impact_speed = pot_speed(friction, shot_line.length()) / cut;
            Some(strike_to_ghost(view, ghost, impact_speed, self.roll_fraction))
        })
    }
}

impl ShotStrategy for PotStrategy {
    fn name(&self) -> &str {
        "Potter"
    }

    fn description(&self) -> &str {
        "Plays the first makeable pot on the target ball; otherwise hits it directly."
    }

    fn decide_shot(&self, view: &TableView) -> Strike {
        match view.target_ball() {
            Some(target) => self.plan(view, target).unwrap_or_else(|| {
                log::debug!("No makeable pot on ball {}; playing direct", target.id);
                self.fallback.decide_shot(view)
            }),
            None => self.fallback.decide_shot(view),
        }
    }
}

/// Direct pots when the cut is full enough, one-cushion banks otherwise
///
/// A bank aims the object ball at the pocket's mirror image across a cushion
/// line. Of all clear banks the one with the fullest cut is played.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BankStrategy {
    /// Tried first; its `min_cut` decides how thin a direct pot may be
    pub direct: PotStrategy,
    /// Smallest cut worth attempting on a bank
    pub min_cut: f64,
}

impl Default for BankStrategy {
    fn default() -> Self {
        Self {
            direct: PotStrategy {
                min_cut: 0.7,
                ..PotStrategy::default()
            },
            min_cut: 0.7,
        }
    }
}

impl BankStrategy {
    fn plan_bank(&self, view: &TableView, target: &Ball) -> Option<Strike> {
        let cue = view.cue_ball();
        let table = &view.scene.table;
        let friction = view.scene.coefficients.mu_slide * view.scene.coefficients.g;

        // (cut, ghost, impact speed) of the fullest bank so far
        let mut best: Option<(f64, DVec3, f64)> = None;
        for cushion in table.cushions() {
            let normal = cushion.normal();
            let span = cushion.p2 - cushion.p1;
            for pocket in table.pockets() {
                let offset = cushion.signed_distance(pocket.position);
                if offset.abs() <= f64::EPSILON {
                    continue;
                }
                let image = pocket.position - normal * (2.0 * offset);
                let shot_line = image - target.position;
                let toward = shot_line.dot(normal);
                if toward <= 0.0 {
                    continue;
                }

                let bounce = target.position + shot_line * (-cushion.signed_distance(target.position) / toward);
                let along = (bounce - cushion.p1).dot(span) / span.length_squared();
                if !(0.0..=1.0).contains(&along) {
                    continue;
                }

                let direction = shot_line.normalize_or_zero();
                let ghost = target.position - direction * (2.0 * target.radius);
                let cut = (ghost - cue.position).normalize_or_zero().dot(direction);
                if cut < self.min_cut || best.is_some_and(|(fullest, ..)| cut <= fullest) {
                    continue;
                }
                if view.line_is_blocked(cue.position, ghost, cue.radius, &[CUE_BALL, target.id])
                    || view.line_is_blocked(target.position, bounce, target.radius, &[target.id])
                    || view.line_is_blocked(bounce, pocket.position, target.radius, &[target.id])
                {
                    continue;
                }

                let travel = (bounce - target.position).length() + (pocket.position - bounce).length();
                best = Some((cut, ghost, pot_speed(friction, travel) / cut));
            }
        }

        best.map(|(_, ghost, impact_speed)| strike_to_ghost(view, ghost, impact_speed, self.direct.roll_fraction))
    }
}

impl ShotStrategy for BankStrategy {
    fn name(&self) -> &str {
        "Banker"
    }

    fn description(&self) -> &str {
        "Pots directly when the cut is full; otherwise banks the target off one cushion."
    }

    fn decide_shot(&self, view: &TableView) -> Strike {
        let Some(target) = view.target_ball() else {
            return self.direct.fallback.decide_shot(view);
        };
        self.direct
            .plan(view, target)
            .or_else(|| self.plan_bank(view, target))
            .unwrap_or_else(|| {
                log::debug!("No pot or bank on ball {}; playing direct", target.id);
                self.direct.fallback.decide_shot(view)
            })
    }
}
