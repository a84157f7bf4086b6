//! Inverse shot planning
//!
//! Finds the cue strike that makes a ball start rolling with a chosen velocity
//! at a chosen point. Over the sliding phase the acceleration has the fixed
//! magnitude `mu_slide * g`, so the phase length `t` satisfies
//!
//! `|d + v_roll * t| = mu_slide * g * t^2 / 2`, with `d = start - roll_start`
//!
//! which squares to a quartic in `t`. Velocity and spin at the strike then
//! follow by running the slide backwards from the roll state.

use glam::DVec3;

use super::poly::solve_polynomial;
use super::state::{Coefficients, Strike};
use crate::{UP, planar};

/// Where a ball rolling at `roll_velocity` must start rolling to come to rest at `rest`
pub fn roll_start(rest: DVec3, roll_velocity: DVec3, coefficients: &Coefficients) -> DVec3 {
    let deceleration = coefficients.mu_roll * coefficients.g;
    rest - roll_velocity * (roll_velocity.length() / (2.0 * deceleration))
}

/// Strike for a ball at `start` that ends up rolling at `roll_velocity` and stops at `rest`
///
/// Uses the shortest sliding phase that works. Returns `None` when no such
/// phase exists, which only happens when the ball already sits at the roll
/// start with no rolling speed asked for.
pub fn plan_rolling_shot(
    start: DVec3,
    rest: DVec3,
    roll_velocity: DVec3,
    radius: f64,
    coefficients: &Coefficients,
) -> Option<Strike> {
    let (start, rest, roll_velocity) = (planar(start), planar(rest), planar(roll_velocity));
    let friction = coefficients.mu_slide * coefficients.g;
    let offset = start - roll_start(rest, roll_velocity, coefficients);

    let time = solve_polynomial(&[
        0.25 * friction * friction,
        0.0,
        -roll_velocity.length_squared(),
        -2.0 * roll_velocity.dot(offset),
        -offset.length_squared(),
    ])
    .iter()
    .filter(|&t| t > 0.0)
    .min_by(f64::total_cmp)?;

    let acceleration = (offset + roll_velocity * time).normalize_or_zero() * friction;
    if acceleration == DVec3::ZERO {
        return None;
    }
    let angular_acceleration = acceleration.cross(-UP) * (-2.5 / radius);
    let rolling_spin = roll_velocity.cross(-UP / radius);

    Some(Strike::new(
        roll_velocity - acceleration * time,
        rolling_spin - angular_acceleration * time,
    ))
}
