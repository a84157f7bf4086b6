//! Piecewise constant-acceleration trajectories
//!
//! A ball's motion during a shot is a [`Path`]: a time-contiguous list of
//! [`PathSegment`]s, each with fixed linear and angular acceleration. The
//! acceleration of a sliding segment is frozen at the value computed when the
//! segment starts; with spin present it need not be parallel to the velocity,
//! which is what makes sliding balls curve.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::state::Coefficients;
use crate::UP;

/// Kinematic regime of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Motion {
    /// Contact point slips over the cloth; sliding friction acts against the slip
    Sliding,
    /// No slip; rolling friction decelerates the ball
    Rolling,
    /// At rest
    Stationary,
}

/// Position, velocity and spin at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: DVec3,
    pub velocity: DVec3,
    pub angular_velocity: DVec3,
}

/// One phase of motion, valid over `[start_time, end_time)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    pub motion: Motion,
    pub start_time: f64,
    /// `f64::INFINITY` for an open-ended stationary segment
    #[serde(with = "open_end")]
    pub end_time: f64,
    pub position: DVec3,
    pub velocity: DVec3,
    pub acceleration: DVec3,
    pub angular_velocity: DVec3,
    pub angular_acceleration: DVec3,
}

impl PathSegment {
    /// A ball at rest from `start_time` onward
    pub fn stationary(position: DVec3, start_time: f64) -> Self {
        Self {
            motion: Motion::Stationary,
            start_time,
            end_time: f64::INFINITY,
            position,
            velocity: DVec3::ZERO,
            acceleration: DVec3::ZERO,
            angular_velocity: DVec3::ZERO,
            angular_acceleration: DVec3::ZERO,
        }
    }

    /// A sliding phase
    ///
    /// Friction opposes the contact-point velocity `v - (w x up) * R`. The
    /// same force spins the ball up through the solid-sphere inertia
    /// `I = 2/5 m R^2`, and the slip decays to zero after exactly
    /// `2|u| / (7 mu_slide g)`, which becomes the segment's natural end.
    pub fn sliding(
        position: DVec3,
        velocity: DVec3,
        angular_velocity: DVec3,
        start_time: f64,
        radius: f64,
        coefficients: &Coefficients,
    ) -> Self {
        let friction = coefficients.mu_slide * coefficients.g;
        let contact_velocity = velocity - angular_velocity.cross(UP) * radius;
        let acceleration = contact_velocity.normalize_or_zero() * -friction;
        let angular_acceleration = acceleration.cross(-UP) * (-2.5 / radius);
        let duration = 2.0 * contact_velocity.length() / (7.0 * friction);

        Self {
            motion: Motion::Sliding,
            start_time,
            end_time: start_time + duration,
            position,
            velocity,
            acceleration,
            angular_velocity,
            angular_acceleration,
        }
    }

    /// A rolling phase; spin is fixed by the no-slip condition
    pub fn rolling(
        position: DVec3,
        velocity: DVec3,
        start_time: f64,
        radius: f64,
        coefficients: &Coefficients,
    ) -> Self {
        let deceleration = coefficients.mu_roll * coefficients.g;
        let acceleration = velocity.normalize_or_zero() * -deceleration;

        Self {
            motion: Motion::Rolling,
            start_time,
            end_time: start_time + velocity.length() / deceleration,
            position,
            velocity,
            acceleration,
            angular_velocity: velocity.cross(-UP / radius),
            angular_acceleration: acceleration.cross(-UP) / radius,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_infinite()
    }

    /// Elapsed time into the segment, clamped to its validity window
    #[inline]
    fn elapsed(&self, time: f64) -> f64 {
        if time <= self.start_time {
            0.0
        } else if time >= self.end_time {
            // Only reachable with an open end when time itself is infinite
            if self.is_open() { 0.0 } else { self.duration() }
        } else {
            time - self.start_time
        }
    }

    /// Position at `time`; never extrapolates outside the segment
    pub fn position_at(&self, time: f64) -> DVec3 {
        let dt = self.elapsed(time);
        self.position + self.velocity * dt + self.acceleration * (0.5 * dt * dt)
    }

    pub fn velocity_at(&self, time: f64) -> DVec3 {
        self.velocity + self.acceleration * self.elapsed(time)
    }

    pub fn angular_velocity_at(&self, time: f64) -> DVec3 {
        self.angular_velocity + self.angular_acceleration * self.elapsed(time)
    }

    pub fn kinematics_at(&self, time: f64) -> Kinematics {
        Kinematics {
            position: self.position_at(time),
            velocity: self.velocity_at(time),
            angular_velocity: self.angular_velocity_at(time),
        }
    }

    /// Position as `c0 + c1*tau + c2*tau^2` with `tau = t - origin`
    ///
    /// Unclamped: this is the segment's motion law, used to set up collision
    /// polynomials around a common time origin.
    pub(crate) fn expand_about(&self, origin: f64) -> [DVec3; 3] {
        let dt = origin - self.start_time;
        [
            self.position + self.velocity * dt + self.acceleration * (0.5 * dt * dt),
            self.velocity + self.acceleration * dt,
            self.acceleration * 0.5,
        ]
    }
}

/// Ordered, time-contiguous segments owned by one ball
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn new(first: PathSegment) -> Self {
        Self {
            segments: vec![first],
        }
    }

    /// A path that is stationary at `position` for the whole shot
    pub fn at_rest(position: DVec3) -> Self {
        Self::new(PathSegment::stationary(position, 0.0))
    }

    /// Append a segment, closing the current last one at its start time
    ///
    /// This overrides any natural end time the previous segment had, which is
    /// how a collision truncates a still-open phase of motion.
    pub fn push(&mut self, segment: PathSegment) {
        if let Some(last) = self.segments.last_mut() {
            last.end_time = segment.start_time;
        }
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// True once the path ends in an open stationary segment
    pub fn is_at_rest(&self) -> bool {
        self.last()
            .is_some_and(|s| s.motion == Motion::Stationary && s.is_open())
    }

    /// Segment covering `time` (`start <= time < end`)
    ///
    /// Times before the first segment map to the first, times past the last
    /// segment's end map to the last.
    pub fn segment_at(&self, time: f64) -> Option<&PathSegment> {
        let index = self.segments.partition_point(|s| s.end_time <= time);
        self.segments
            .get(index)
            .or_else(|| self.segments.last())
    }

    /// Sample the path at `time` for playback
    pub fn position_at(&self, time: f64) -> Option<DVec3> {
        self.segment_at(time).map(|s| s.position_at(time))
    }

    pub fn velocity_at(&self, time: f64) -> Option<DVec3> {
        self.segment_at(time).map(|s| s.velocity_at(time))
    }

    /// Where the ball comes to rest
    pub fn final_position(&self) -> Option<DVec3> {
        self.last().map(|s| {
            if s.is_open() {
                s.position
            } else {
                s.position_at(s.end_time)
            }
        })
    }

    /// Largest gap in time or position between consecutive segments
    ///
    /// Zero for a well-formed path; used by tests and diagnostics.
    pub fn max_discontinuity(&self) -> (f64, f64) {
        self.segments
            .windows(2)
            .fold((0.0_f64, 0.0_f64), |(dt, dp), pair| {
                let time_gap = (pair[0].end_time - pair[1].start_time).abs();
                let position_gap = (pair[0].position_at(pair[0].end_time) - pair[1].position).length();
                (dt.max(time_gap), dp.max(position_gap))
            })
    }
}

/// Serde adapter mapping an infinite end time to `null`
mod open_end {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coefficients() -> Coefficients {
        Coefficients::default()
    }

    #[test]
    fn test_sliding_segment_friction_opposes_slip() {
        let c = coefficients();
        let segment = PathSegment::sliding(DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0), DVec3::ZERO, 0.0, 0.05, &c);
        assert_eq!(segment.motion, Motion::Sliding);
        assert!(segment.acceleration.x < 0.0);
        assert!((segment.acceleration.length() - c.mu_slide * c.g).abs() < 1e-12);
        let expected = 2.0 * 2.0 / (7.0 * c.mu_slide * c.g);
        assert!((segment.duration() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_sliding_ends_in_pure_roll() {
        let c = coefficients();
        let radius = 0.05;
        let segment = PathSegment::sliding(
            DVec3::ZERO,
            DVec3::new(1.5, -0.5, 0.0),
            DVec3::new(3.0, 4.0, 0.0),
            0.25,
            radius,
            &c,
        );
        let end = segment.kinematics_at(segment.end_time);
        let slip = end.velocity - end.angular_velocity.cross(UP) * radius;
        assert!(slip.length() < 1e-9, "slip {slip:?}");
    }

    #[test]
    fn test_rolling_segment_has_no_slip_and_stops() {
        let c = coefficients();
        let radius = 0.05;
        let segment = PathSegment::rolling(DVec3::ZERO, DVec3::new(0.0, 3.0, 0.0), 1.0, radius, &c);
        let slip = segment.velocity - segment.angular_velocity.cross(UP) * radius;
        assert!(slip.length() < 1e-12);
        assert!(segment.velocity_at(segment.end_time).length() < 1e-9);
        assert!((segment.duration() - 3.0 / (c.mu_roll * c.g)).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_clamps_to_window() {
        let c = coefficients();
        let segment = PathSegment::rolling(DVec3::new(1.0, 1.0, 0.0), DVec3::new(1.0, 0.0, 0.0), 2.0, 0.05, &c);
        assert_eq!(segment.position_at(0.0), segment.position);
        assert_eq!(segment.velocity_at(-5.0), segment.velocity);
        let at_end = segment.position_at(segment.end_time);
        assert_eq!(segment.position_at(segment.end_time + 100.0), at_end);
    }

    #[test]
    fn test_push_truncates_previous_segment() {
        let c = coefficients();
        let first = PathSegment::sliding(DVec3::ZERO, DVec3::new(3.0, 0.0, 0.0), DVec3::ZERO, 0.0, 0.05, &c);
        let mut path = Path::new(first);
        let cut = first.end_time * 0.5;
        let state = first.kinematics_at(cut);
        path.push(PathSegment::sliding(state.position, -state.velocity, state.angular_velocity, cut, 0.05, &c));

        assert_eq!(path.segments()[0].end_time, cut);
        let (time_gap, position_gap) = path.max_discontinuity();
        assert_eq!(time_gap, 0.0);
        assert!(position_gap < 1e-12);
    }

    #[test]
    fn test_segment_lookup_for_playback() {
        let c = coefficients();
        let first = PathSegment::rolling(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0), 0.0, 0.05, &c);
        let mut path = Path::new(first);
        let rest = first.position_at(first.end_time);
        path.push(PathSegment::stationary(rest, first.end_time));

        assert!(path.is_at_rest());
        assert_eq!(path.segment_at(-1.0).map(|s| s.motion), Some(Motion::Rolling));
        assert_eq!(path.segment_at(first.end_time).map(|s| s.motion), Some(Motion::Stationary));
        assert_eq!(path.position_at(1e9), Some(rest));
        assert_eq!(path.final_position(), Some(rest));
    }

    #[test]
    fn test_open_end_round_trips_through_json() {
        let path = Path::at_rest(DVec3::new(0.5, 0.5, 0.0));
        let json = serde_json::to_string(&path).unwrap();
        assert!(json.contains("null"));
        let back: Path = serde_json::from_str(&json).unwrap();
        assert!(back.segments()[0].end_time.is_infinite());
    }
}
