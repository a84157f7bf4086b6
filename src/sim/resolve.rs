//! Event resolution
//!
//! Each resolver reads the involved balls' state at the event time from their
//! current segment and appends the segment that follows. Appending closes the
//! old segment at the event time, so resolvers never edit segments in place.

use glam::DVec3;

use super::path::PathSegment;
use super::state::{Ball, Coefficients};
use super::table::Cushion;
use crate::{UP, holding_position, planar};

/// Mutable borrows of two distinct balls
pub(crate) fn pair_mut(balls: &mut [Ball], i: usize, j: usize) -> Option<(&mut Ball, &mut Ball)> {
    if i == j || i >= balls.len() || j >= balls.len() {
        return None;
    }
    if i < j {
        let (head, tail) = balls.split_at_mut(j);
        Some((&mut head[i], &mut tail[0]))
    } else {
        let (head, tail) = balls.split_at_mut(i);
        Some((&mut tail[0], &mut head[j]))
    }
}

/// Restitution along the line of centres
///
/// Tangential velocity and spin carry through unchanged; no friction acts
/// between the balls during contact.
pub fn resolve_ball_ball(first: &mut Ball, second: &mut Ball, time: f64, coefficients: &Coefficients) {
    let k1 = first.current_segment().kinematics_at(time);
    let k2 = second.current_segment().kinematics_at(time);

    let normal = planar(k2.position - k1.position).normalize_or_zero();
    let tangent = normal.cross(UP);
    let (m1, m2) = (first.mass, second.mass);
    let e = coefficients.e_ball_ball;

    let v1n = k1.velocity.dot(normal);
    let v2n = k2.velocity.dot(normal);
    let momentum = m1 * v1n + m2 * v2n;
    let v1n_after = (momentum + m2 * e * (v2n - v1n)) / (m1 + m2);
    let v2n_after = (momentum + m1 * e * (v1n - v2n)) / (m1 + m2);

    let v1 = normal * v1n_after + tangent * k1.velocity.dot(tangent);
    let v2 = normal * v2n_after + tangent * k2.velocity.dot(tangent);

    first.path.push(PathSegment::sliding(
        k1.position,
        v1,
        k1.angular_velocity,
        time,
        first.radius,
        coefficients,
    ));
    second.path.push(PathSegment::sliding(
        k2.position,
        v2,
        k2.angular_velocity,
        time,
        second.radius,
        coefficients,
    ));
}

/// Reflect the normal velocity component, scaled by cushion restitution
pub fn resolve_ball_cushion(ball: &mut Ball, cushion: &Cushion, time: f64, coefficients: &Coefficients) {
    let k = ball.current_segment().kinematics_at(time);
    let normal = cushion.normal();
    let tangent = cushion.tangent();
    let velocity =
        normal * (-coefficients.e_ball_cushion * k.velocity.dot(normal)) + tangent * k.velocity.dot(tangent);

    ball.path.push(PathSegment::sliding(
        k.position,
        velocity,
        k.angular_velocity,
        time,
        ball.radius,
        coefficients,
    ));
}

/// Park the ball at its holding position with no motion
///
/// The appended slide has zero length, so the ball passes straight through a
/// roll transition and a stop at the same instant.
pub fn resolve_pocket(ball: &mut Ball, time: f64, coefficients: &Coefficients) {
    ball.path.push(PathSegment::sliding(
        holding_position(ball.id),
        DVec3::ZERO,
        DVec3::ZERO,
        time,
        ball.radius,
        coefficients,
    ));
}

pub fn resolve_roll(ball: &mut Ball, time: f64, coefficients: &Coefficients) {
    let k = ball.current_segment().kinematics_at(time);
    ball.path
        .push(PathSegment::rolling(k.position, k.velocity, time, ball.radius, coefficients));
}

pub fn resolve_stop(ball: &mut Ball, time: f64) {
    let position = ball.current_segment().position_at(time);
    ball.path.push(PathSegment::stationary(position, time));
}
