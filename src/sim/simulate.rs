//! Event-driven shot simulation
//!
//! A shot is computed eagerly to completion: every iteration scans all
//! candidate collisions and natural segment ends, resolves the single
//! earliest one and records it. The loop ends when no ball has a finite
//! segment end left, meaning every ball is at rest.

use glam::DVec3;

use super::collision::{EventHorizon, ball_ball_time, ball_cushion_time, ball_pocket_time};
use super::path::{Motion, Path, PathSegment};
use super::resolve::{pair_mut, resolve_ball_ball, resolve_ball_cushion, resolve_pocket, resolve_roll, resolve_stop};
use super::state::{Scene, Shot, ShotEvent, ShotEventKind, Strike};
use crate::consts::{MAX_EVENTS_PER_SHOT, SHOT_END_BUFFER};
use crate::error::{InvariantViolation, SimError};

/// Strike `ball_id` and simulate until the table is at rest
///
/// Every ball's path is replaced. Balls already pocketed stay where they are
/// and take no part in the shot. Resting positions and pocketed flags are left
/// for the caller to update from the returned [`Shot`].
pub fn simulate(scene: &mut Scene, ball_id: u32, velocity: DVec3, spin: DVec3) -> Result<Shot, SimError> {
    simulate_capped(scene, ball_id, Strike::new(velocity, spin), MAX_EVENTS_PER_SHOT)
}

pub(crate) fn simulate_capped(
    scene: &mut Scene,
    ball_id: u32,
    strike: Strike,
    max_events: usize,
) -> Result<Shot, SimError> {
    run_shot(scene, ball_id, strike, max_events, next_event)
}

/// Event loop over a candidate source
///
/// `next` returns the earliest pending event given the balls still in play
/// and the last recorded event.
fn run_shot(
    scene: &mut Scene,
    ball_id: u32,
    strike: Strike,
    max_events: usize,
    mut next: impl FnMut(&Scene, &[bool], Option<&ShotEvent>) -> Option<ShotEvent>,
) -> Result<Shot, SimError> {
    let struck = scene.ball(ball_id).ok_or(SimError::UnknownBall(ball_id))?;
    if struck.pocketed {
        return Err(SimError::BallPocketed(ball_id));
    }
    if !strike.is_finite() {
        return Err(SimError::NonFiniteStrike);
    }

    scene.clear_paths();
    let coefficients = scene.coefficients;
    let ball = &mut scene.balls[ball_id as usize];
    ball.path = Path::new(PathSegment::sliding(
        ball.position,
        strike.velocity,
        strike.spin,
        0.0,
        ball.radius,
        &coefficients,
    ));

    let mut in_play: Vec<bool> = scene.balls.iter().map(|b| !b.pocketed).collect();
    let mut events: Vec<ShotEvent> = Vec::new();
    let mut violations = Vec::new();
    let mut resolved = 0;
    let mut truncated = false;

    while let Some(candidate) = next(scene, &in_play, events.last()) {
        if resolved >= max_events {
            let time = events.last().map_or(0.0, |e| e.time);
            log::warn!("Shot hit the {max_events} event cap at t={time:.6}; halting all balls");
            halt(scene, time);
            truncated = true;
            break;
        }
        resolved += 1;

        let violation = events
            .last()
            .filter(|last| candidate.time < last.time)
            .map(|last| InvariantViolation {
                time: candidate.time,
                previous: last.time,
            });
        let time = violation.map_or(candidate.time, |v| v.previous);

        apply(scene, candidate.kind, time);
        if let ShotEventKind::BallPocketed { ball, .. } = candidate.kind {
            in_play[ball as usize] = false;
        }

        match violation {
            Some(v) => {
                log::error!("{:?} clamped to t={time:.6}: {v}", candidate.kind);
                violations.push(v);
            }
            None => log::debug!("t={:.6} {:?}", time, candidate.kind),
        }
        events.push(ShotEvent { time, ..candidate });
    }

    let end_time = scene
        .balls
        .iter()
        .filter_map(|b| b.path.last().map(|s| s.start_time))
        .fold(0.0_f64, f64::max)
        + SHOT_END_BUFFER;

    log::debug!(
        "Ball {ball_id} struck: {} events, settled by t={:.3}",
        events.len(),
        end_time - SHOT_END_BUFFER
    );

    Ok(Shot {
        player: None,
        struck_ball: ball_id,
        strike,
        events,
        ball_paths: scene.balls.iter().map(|b| b.path.clone()).collect(),
        end_time,
        violations,
        truncated,
        verdict: None,
    })
}

/// Globally earliest candidate event
///
/// Ties keep the first candidate found: ball pairs, cushions, then pockets per
/// ball in id order, then natural segment ends.
fn next_event(scene: &Scene, in_play: &[bool], last: Option<&ShotEvent>) -> Option<ShotEvent> {
    let horizon = EventHorizon::new(last);
    let mut best: Option<ShotEvent> = None;
    let mut offer = |time: Option<f64>, kind: ShotEventKind| {
        if let Some(time) = time
            && best.is_none_or(|b| time < b.time)
        {
            best = Some(ShotEvent { time, kind });
        }
    };

    let balls = &scene.balls;
    for (i, ball) in balls.iter().enumerate().filter(|&(i, _)| in_play[i]) {
        for (j, other) in balls.iter().enumerate().skip(i + 1).filter(|&(j, _)| in_play[j]) {
            offer(
                ball_ball_time(ball, other, &horizon),
                ShotEventKind::BallBallCollision {
                    first: i as u32,
                    second: j as u32,
                },
            );
        }
        for (index, cushion) in scene.table.cushions().iter().enumerate() {
            offer(
                ball_cushion_time(ball, index, cushion, &horizon),
                ShotEventKind::BallCushionCollision {
                    ball: ball.id,
                    cushion: index,
                },
            );
        }
        for (index, pocket) in scene.table.pockets().iter().enumerate() {
            offer(
                ball_pocket_time(ball, pocket, &horizon),
                ShotEventKind::BallPocketed {
                    ball: ball.id,
                    pocket: index,
                },
            );
        }
    }

    for ball in balls {
        let Some(segment) = ball.path.last() else {
            continue;
        };
        let kind = match segment.motion {
            Motion::Sliding => ShotEventKind::RollTransition { ball: ball.id },
            Motion::Rolling => ShotEventKind::Stop { ball: ball.id },
            Motion::Stationary => continue,
        };
        offer(Some(segment.end_time).filter(|t| t.is_finite()), kind);
    }

    best
}

fn apply(scene: &mut Scene, kind: ShotEventKind, time: f64) {
    let coefficients = scene.coefficients;
    match kind {
        ShotEventKind::BallBallCollision { first, second } => {
            if let Some((a, b)) = pair_mut(&mut scene.balls, first as usize, second as usize) {
                resolve_ball_ball(a, b, time, &coefficients);
            }
        }
        ShotEventKind::BallCushionCollision { ball, cushion } => {
            if let Some(cushion) = scene.table.cushions().get(cushion).copied() {
                resolve_ball_cushion(&mut scene.balls[ball as usize], &cushion, time, &coefficients);
            }
        }
        ShotEventKind::BallPocketed { ball, .. } => {
            resolve_pocket(&mut scene.balls[ball as usize], time, &coefficients);
        }
        ShotEventKind::RollTransition { ball } => {
            resolve_roll(&mut scene.balls[ball as usize], time, &coefficients);
        }
        ShotEventKind::Stop { ball } => resolve_stop(&mut scene.balls[ball as usize], time),
    }
}

/// Bring every moving ball to rest where it is at `time`
fn halt(scene: &mut Scene, time: f64) {
    for ball in &mut scene.balls {
        if !ball.path.is_at_rest() {
            let position = ball.current_segment().position_at(time);
            ball.path.push(PathSegment::stationary(position, time));
        }
    }
}

/// Checks every path is time-contiguous and ends at rest
///
/// Position continuity is checked except across a pocketing, where the ball
/// jumps to its holding position.
#[cfg(test)]
pub(crate) fn assert_well_formed(shot: &Shot) {
    for (id, path) in shot.ball_paths.iter().enumerate() {
        assert!(path.is_at_rest(), "ball {id} not at rest");
        for pair in path.segments().windows(2) {
            assert_eq!(pair[0].end_time, pair[1].start_time, "ball {id} time gap");
            if pair[1].position != crate::holding_position(id as u32) {
                let gap = (pair[0].position_at(pair[0].end_time) - pair[1].position).length();
                assert!(gap < 1e-9, "ball {id} jumps {gap}");
            }
        }
    }
    for pair in shot.events.windows(2) {
        assert!(pair[0].time <= pair[1].time, "events out of order: {pair:?}");
    }
}
