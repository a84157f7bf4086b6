//! Exact-time collision detection
//!
//! Each detector looks only at the current last segment of each party and
//! returns the earliest valid contact time, or `None`. Positions are expanded
//! as quadratics about a shared time origin so that a ball-ball or
//! ball-pocket contact becomes a quartic in elapsed time, and a cushion
//! crossing a quadratic.
//!
//! A candidate must be approaching: balls closing in on each other, a ball
//! moving outward through a cushion line or into a pocket's capture circle.
//! Contacts that are separating at the root are residue of a resolution that
//! already happened.

use glam::DVec3;

use super::path::{Motion, PathSegment};
use super::poly::{self, Roots};
use super::state::{Ball, ShotEvent, ShotEventKind};
use super::table::{Cushion, Pocket};
use crate::consts::REPEAT_COLLISION_TOLERANCE;
use crate::planar;

/// Lower time bound for new candidates, taken from the most recent event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventHorizon {
    min_time: f64,
    last: Option<ShotEventKind>,
}

impl EventHorizon {
    /// Horizon for a shot with no events yet
    pub const OPEN: EventHorizon = EventHorizon {
        min_time: f64::NEG_INFINITY,
        last: None,
    };

    pub fn new(last: Option<&ShotEvent>) -> Self {
        match last {
            Some(event) => Self {
                min_time: event.time,
                last: Some(event.kind),
            },
            None => Self::OPEN,
        }
    }

    pub fn min_time(&self) -> f64 {
        self.min_time
    }

    /// Extra lower-bound push when the last event matches `repeats`
    fn tolerance(&self, repeats: impl FnOnce(ShotEventKind) -> bool) -> f64 {
        match self.last {
            Some(kind) if repeats(kind) => REPEAT_COLLISION_TOLERANCE,
            _ => 0.0,
        }
    }
}

/// Relative motion `p + v*tau + a*tau^2` in the table plane
#[derive(Debug, Clone, Copy)]
struct Relative {
    p: DVec3,
    v: DVec3,
    a: DVec3,
}

impl Relative {
    fn between(first: &PathSegment, second: &PathSegment, origin: f64) -> Self {
        let [p1, v1, a1] = first.expand_about(origin);
        let [p2, v2, a2] = second.expand_about(origin);
        Self {
            p: planar(p2 - p1),
            v: planar(v2 - v1),
            a: planar(a2 - a1),
        }
    }

    fn to_point(segment: &PathSegment, point: DVec3, origin: f64) -> Self {
        let [p, v, a] = segment.expand_about(origin);
        Self {
            p: planar(point - p),
            v: planar(-v),
            a: planar(-a),
        }
    }

    /// Roots of `|d(tau)|^2 = reach^2`
    fn contact_roots(&self, reach: f64) -> Roots {
        let Relative { p, v, a } = *self;
        poly::solve_polynomial(&[
            a.dot(a),
            2.0 * a.dot(v),
            v.dot(v) + 2.0 * a.dot(p),
            2.0 * v.dot(p),
            p.dot(p) - reach * reach,
        ])
    }

    /// Separation shrinking at `tau`
    fn closing_at(&self, tau: f64) -> bool {
        let d = self.p + self.v * tau + self.a * (tau * tau);
        let rate = self.v + self.a * (2.0 * tau);
        d.dot(rate) < 0.0
    }
}

/// Earliest `origin + tau` that passes `accept`
fn earliest(roots: Roots, origin: f64, accept: impl Fn(f64, f64) -> bool) -> Option<f64> {
    roots
        .iter()
        .map(|tau| (tau, origin + tau))
        .filter(|&(tau, t)| accept(tau, t))
        .map(|(_, t)| t)
        .min_by(f64::total_cmp)
}

#[inline]
fn within(segment: &PathSegment, t: f64, tolerance: f64) -> bool {
    t > segment.start_time + tolerance && t < segment.end_time
}

/// Earliest contact between two balls' current segments
pub fn ball_ball_time(first: &Ball, second: &Ball, horizon: &EventHorizon) -> Option<f64> {
    let s1 = first.current_segment();
    let s2 = second.current_segment();
    if s1.motion == Motion::Stationary && s2.motion == Motion::Stationary {
        return None;
    }

    let origin = s1.start_time.max(s2.start_time);
    let relative = Relative::between(&s1, &s2, origin);
    let reach = first.radius + second.radius;
    let tolerance = horizon.tolerance(|kind| kind.is_contact_between(first.id, second.id));

    earliest(relative.contact_roots(reach), origin, |tau, t| {
        within(&s1, t, tolerance)
            && within(&s2, t, tolerance)
            && t > horizon.min_time
            && relative.closing_at(tau)
    })
}

/// Earliest outward crossing of a cushion line by the ball centre
pub fn ball_cushion_time(ball: &Ball, index: usize, cushion: &Cushion, horizon: &EventHorizon) -> Option<f64> {
    let segment = ball.current_segment();
    if segment.motion == Motion::Stationary {
        return None;
    }

    let normal = cushion.normal();
    let origin = segment.start_time;
    let [p, v, a] = segment.expand_about(origin);
    let sn = (p - cushion.p1).dot(normal);
    let vn = v.dot(normal);
    let an = a.dot(normal);
    let tolerance = horizon.tolerance(|kind| {
        matches!(kind, ShotEventKind::BallCushionCollision { ball: b, cushion: c } if b == ball.id && c == index)
    });

    // an * tau^2 + vn * tau + sn = 0; linear when the normal acceleration vanishes
    earliest(poly::solve_quadratic(an, vn, sn), origin, |tau, t| {
        within(&segment, t, tolerance) && t > horizon.min_time && vn + 2.0 * an * tau > 0.0
    })
}

/// Earliest entry of the ball centre into a pocket's capture circle
///
/// A sliding ball is solved exactly. A rolling ball is intersected along the
/// straight chord from its segment's start to its end position, and the
/// travel time to the crossing is recovered from its scalar deceleration.
pub fn ball_pocket_time(ball: &Ball, pocket: &Pocket, horizon: &EventHorizon) -> Option<f64> {
    let segment = ball.current_segment();
    let tolerance = horizon.tolerance(|kind| matches!(kind, ShotEventKind::BallPocketed { ball: b, .. } if b == ball.id));
    let accept = |t: f64| within(&segment, t, tolerance) && t > horizon.min_time;

    match segment.motion {
        Motion::Stationary => None,
        Motion::Sliding => {
            let origin = segment.start_time;
            let relative = Relative::to_point(&segment, pocket.position, origin);
            earliest(relative.contact_roots(pocket.radius), origin, |tau, t| {
                accept(t) && relative.closing_at(tau)
            })
        }
        Motion::Rolling => {
            let distance = rolling_entry_distance(&segment, pocket)?;
            let speed = segment.velocity.length();
            let deceleration = segment.acceleration.length();
            let tau = poly::solve_quadratic(-0.5 * deceleration, speed, -distance)
                .iter()
                .filter(|&tau| tau > 0.0)
                .min_by(f64::total_cmp)?;
            let t = segment.start_time + tau;
            accept(t).then_some(t)
        }
    }
}

/// Distance along a rolling segment's chord to the capture circle, if it enters
fn rolling_entry_distance(segment: &PathSegment, pocket: &Pocket) -> Option<f64> {
    let start = segment.position;
    let chord = planar(segment.position_at(segment.end_time) - start);
    let offset = planar(start - pocket.position);
    let c = offset.dot(offset) - pocket.radius * pocket.radius;
    if c <= 0.0 {
        return None;
    }
    let x = poly::solve_quadratic(chord.dot(chord), 2.0 * chord.dot(offset), c)
        .iter()
        .filter(|&x| x > 0.0 && x < 1.0)
        .min_by(f64::total_cmp)?;
    Some(x * chord.length())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::path::Path;
    use crate::sim::state::Coefficients;
    use crate::sim::table::Table;

    const R: f64 = 0.05;

    fn sliding_ball(id: u32, position: DVec3, velocity: DVec3, start: f64) -> Ball {
        let mut ball = Ball::new(id, position, R, 0.16);
        ball.path = Path::new(PathSegment::sliding(
            position,
            velocity,
            DVec3::ZERO,
            start,
            R,
            &Coefficients::default(),
        ));
        ball
    }

    fn resting_ball(id: u32, position: DVec3) -> Ball {
        Ball::new(id, position, R, 0.16)
    }

    #[test]
    fn test_head_on_contact_at_touching_distance() {
        let cue = sliding_ball(0, DVec3::new(0.5, 2.0, 0.0), DVec3::new(20.0, 0.0, 0.0), 0.0);
        let object = resting_ball(1, DVec3::new(1.0, 2.0, 0.0));

        let t = ball_ball_time(&cue, &object, &EventHorizon::OPEN).expect("contact");
        let gap = (object.position - cue.current_segment().position_at(t)).length();
        assert!((gap - 2.0 * R).abs() < 1e-9, "gap {gap}");
        assert!(t > 0.0 && t < cue.current_segment().end_time);
    }

    #[test]
    fn test_order_of_arguments_does_not_matter() {
        let cue = sliding_ball(0, DVec3::new(0.5, 2.0, 0.0), DVec3::new(20.0, 1.0, 0.0), 0.0);
        let object = resting_ball(1, DVec3::new(1.0, 2.05, 0.0));
        let a = ball_ball_time(&cue, &object, &EventHorizon::OPEN).unwrap();
        let b = ball_ball_time(&object, &cue, &EventHorizon::OPEN).unwrap();
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn test_separating_balls_do_not_collide() {
        let cue = sliding_ball(0, DVec3::new(0.9, 2.0, 0.0), DVec3::new(-20.0, 0.0, 0.0), 0.0);
        let object = resting_ball(1, DVec3::new(1.0, 2.0, 0.0));
        assert_eq!(ball_ball_time(&cue, &object, &EventHorizon::OPEN), None);
    }

    #[test]
    fn test_resting_pair_never_collides() {
        let a = resting_ball(0, DVec3::new(1.0, 1.0, 0.0));
        let b = resting_ball(1, DVec3::new(1.05, 1.0, 0.0));
        assert_eq!(ball_ball_time(&a, &b, &EventHorizon::OPEN), None);
    }

    #[test]
    fn test_repeat_contact_is_pushed_past_tolerance() {
        // Just short of touching right after a resolution between the same pair
        let start = 0.5;
        let cue = sliding_ball(0, DVec3::new(0.9 - 1e-6, 2.0, 0.0), DVec3::new(2.0, 0.0, 0.0), start);
        let object = sliding_ball(1, DVec3::new(1.0, 2.0, 0.0), DVec3::new(1.0, 0.0, 0.0), start);

        let same_pair = ShotEvent {
            time: start,
            kind: ShotEventKind::BallBallCollision { first: 1, second: 0 },
        };
        let other_pair = ShotEvent {
            time: start,
            kind: ShotEventKind::BallBallCollision { first: 1, second: 2 },
        };
        assert_eq!(ball_ball_time(&cue, &object, &EventHorizon::new(Some(&same_pair))), None);
        assert!(ball_ball_time(&cue, &object, &EventHorizon::new(Some(&other_pair))).is_some());
    }

    #[test]
    fn test_repeat_cushion_contact_is_pushed_past_tolerance() {
        let table = Table::standard();
        let right = 1;
        let cushion = table.cushions()[right];
        // Residue of a bounce: a hair inside the line and still heading out
        let start = 0.5;
        let ball = sliding_ball(0, DVec3::new(2.0 - 1e-6, 2.0, 0.0), DVec3::new(2.0, 0.5, 0.0), start);

        let same_cushion = ShotEvent {
            time: start,
            kind: ShotEventKind::BallCushionCollision { ball: 0, cushion: right },
        };
        let other_cushion = ShotEvent {
            time: start,
            kind: ShotEventKind::BallCushionCollision { ball: 0, cushion: 2 },
        };
        assert_eq!(
            ball_cushion_time(&ball, right, &cushion, &EventHorizon::new(Some(&same_cushion))),
            None
        );
        let t = ball_cushion_time(&ball, right, &cushion, &EventHorizon::new(Some(&other_cushion))).unwrap();
        assert!(t > start && t < start + REPEAT_COLLISION_TOLERANCE);
    }

    #[test]
    fn test_repeat_pocketing_is_pushed_past_tolerance() {
        let pocket = Pocket::new(DVec3::new(2.0, 4.0, 0.0), 0.15);
        let start = 0.5;
        let ball = sliding_ball(
            3,
            pocket.position - DVec3::new(0.15 + 1e-6, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            start,
        );

        let same_ball = ShotEvent {
            time: start,
            kind: ShotEventKind::BallPocketed { ball: 3, pocket: 0 },
        };
        let other_ball = ShotEvent {
            time: start,
            kind: ShotEventKind::BallPocketed { ball: 4, pocket: 2 },
        };
        assert_eq!(ball_pocket_time(&ball, &pocket, &EventHorizon::new(Some(&same_ball))), None);
        assert!(ball_pocket_time(&ball, &pocket, &EventHorizon::new(Some(&other_ball))).is_some());
    }

    #[test]
    fn test_horizon_rejects_candidates_before_last_event() {
        let cue = sliding_ball(0, DVec3::new(0.5, 2.0, 0.0), DVec3::new(20.0, 0.0, 0.0), 0.0);
        let object = resting_ball(1, DVec3::new(1.0, 2.0, 0.0));
        let t = ball_ball_time(&cue, &object, &EventHorizon::OPEN).unwrap();
        let later = ShotEvent {
            time: t + 1e-6,
            kind: ShotEventKind::Stop { ball: 2 },
        };
        assert_eq!(ball_ball_time(&cue, &object, &EventHorizon::new(Some(&later))), None);
    }

    #[test]
    fn test_cushion_crossing() {
        let table = Table::standard();
        let right = 1;
        let cushion = table.cushions()[right];
        let ball = sliding_ball(0, DVec3::new(1.5, 2.0, 0.0), DVec3::new(20.0, 0.0, 0.0), 0.0);

        let t = ball_cushion_time(&ball, right, &cushion, &EventHorizon::OPEN).expect("crossing");
        let x = ball.current_segment().position_at(t).x;
        assert!((x - 2.0).abs() < 1e-9, "x {x}");

        for (index, other) in table.cushions().iter().enumerate().filter(|(i, _)| *i != right) {
            assert_eq!(ball_cushion_time(&ball, index, other, &EventHorizon::OPEN), None);
        }
    }

    #[test]
    fn test_cushion_ignores_ball_leaving_the_line() {
        let table = Table::standard();
        let cushion = table.cushions()[1];
        let ball = sliding_ball(0, DVec3::new(2.0, 2.0, 0.0), DVec3::new(-20.0, 3.0, 0.0), 0.2);
        assert_eq!(ball_cushion_time(&ball, 1, &cushion, &EventHorizon::OPEN), None);
    }

    #[test]
    fn test_cushion_with_constant_normal_velocity() {
        // Rolling parallel to a cushion never reaches it
        let cushion = Cushion::new(DVec3::new(0.0, 0.0, 0.0), DVec3::new(2.0, 0.0, 0.0));
        let mut ball = resting_ball(0, DVec3::new(0.5, 1.0, 0.0));
        ball.path = Path::new(PathSegment::rolling(
            ball.position,
            DVec3::new(3.0, 0.0, 0.0),
            0.0,
            R,
            &Coefficients::default(),
        ));
        assert_eq!(ball_cushion_time(&ball, 0, &cushion, &EventHorizon::OPEN), None);
    }

    #[test]
    fn test_sliding_ball_enters_pocket() {
        let pocket = Pocket::new(DVec3::new(2.0, 4.0, 0.0), 0.15);
        let speed = 20.0 / 2.0_f64.sqrt();
        let ball = sliding_ball(0, DVec3::new(1.5, 3.5, 0.0), DVec3::new(speed, speed, 0.0), 0.0);

        let t = ball_pocket_time(&ball, &pocket, &EventHorizon::OPEN).expect("pocketed");
        let d = (ball.current_segment().position_at(t) - pocket.position).length();
        assert!((d - pocket.radius).abs() < 1e-7, "d {d}");
    }

    #[test]
    fn test_rolling_ball_enters_pocket() {
        let pocket = Pocket::new(DVec3::new(2.0, 4.0, 0.0), 0.15);
        let speed = 10.0 / 2.0_f64.sqrt();
        let mut ball = resting_ball(0, DVec3::new(1.0, 3.0, 0.0));
        ball.path = Path::new(PathSegment::rolling(
            ball.position,
            DVec3::new(speed, speed, 0.0),
            0.3,
            R,
            &Coefficients::default(),
        ));

        let t = ball_pocket_time(&ball, &pocket, &EventHorizon::OPEN).expect("pocketed");
        assert!(t > 0.3);
        let d = (ball.current_segment().position_at(t) - pocket.position).length();
        assert!((d - pocket.radius).abs() < 1e-6, "d {d}");
    }

    #[test]
    fn test_rolling_ball_short_of_pocket() {
        let pocket = Pocket::new(DVec3::new(2.0, 4.0, 0.0), 0.15);
        let mut ball = resting_ball(0, DVec3::new(1.0, 3.0, 0.0));
        ball.path = Path::new(PathSegment::rolling(
            ball.position,
            DVec3::new(1.0, 1.0, 0.0),
            0.0,
            R,
            &Coefficients::default(),
        ));
        assert_eq!(ball_pocket_time(&ball, &pocket, &EventHorizon::OPEN), None);
    }

    #[test]
    fn test_resting_ball_is_never_pocketed() {
        let pocket = Pocket::new(DVec3::new(0.0, 0.0, 0.0), 0.15);
        let ball = resting_ball(3, DVec3::new(0.1, 0.1, 0.0));
        assert_eq!(ball_pocket_time(&ball, &pocket, &EventHorizon::OPEN), None);
    }
}
