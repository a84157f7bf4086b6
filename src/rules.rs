//! Rotation ("9-ball") rules
//!
//! [`evaluate_shot`] is a pure function of the frame counters, the target
//! order, the shot's event log and the pocketed flags going into the shot. It
//! never touches the scene; the game driver applies the outcome.
//!
//! Checks run in fixed precedence:
//! 1. shot cap reached: the opponent takes the frame
//! 2. foul limit reached: the opponent takes the frame
//! 3. no ball left to target: turn passes, counted as a foul
//! 4. final ball potted: the shooter wins if the first contact was legal and
//!    the cue ball stayed up, otherwise the opponent does
//! 5. illegal first contact: turn passes, foul
//! 6. nothing potted: turn passes
//! 7. cue ball potted: turn passes, foul
//! 8. otherwise the shooter continues and the foul count clears

use serde::{Deserialize, Serialize};

use crate::consts::CUE_BALL;
use crate::settings::RuleSettings;
use crate::sim::{Shot, ShotVerdict};

/// Turn state carried between shots of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameCounters {
    /// Index of the player who just shot
    pub current_player: usize,
    pub num_players: usize,
    pub consecutive_fouls: u32,
    /// Shots already played in this frame, including the one being judged
    pub shots_taken: usize,
}

impl FrameCounters {
    pub fn new(current_player: usize, num_players: usize) -> Self {
        Self {
            current_player,
            num_players,
            consecutive_fouls: 0,
            shots_taken: 0,
        }
    }

    pub fn opponent(&self) -> usize {
        (self.current_player + 1) % self.num_players.max(1)
    }
}

/// What the rules decided about one shot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// Pocketed flags after the shot, indexed by ball id; the cue ball is never left pocketed
    pub pocketed: Vec<bool>,
    pub next_player: usize,
    pub winner: Option<usize>,
    pub consecutive_fouls: u32,
    /// The frame is over and the table must be re-racked
    pub frame_over: bool,
    pub verdict: ShotVerdict,
    /// Whether the cue ball went down and must be re-spotted
    pub cue_ball_potted: bool,
}

impl RuleOutcome {
    fn frame_awarded(pocketed: &[bool], winner: usize, verdict: ShotVerdict) -> Self {
        Self {
            pocketed: pocketed.to_vec(),
            next_player: winner,
            winner: Some(winner),
            consecutive_fouls: 0,
            frame_over: true,
            verdict,
            cue_ball_potted: false,
        }
    }
}

/// Lowest-numbered ball in `target_order` still on the table
pub fn target_ball(target_order: &[u32], pocketed: &[bool]) -> Option<u32> {
    target_order
        .iter()
        .copied()
        .find(|&id| !pocketed.get(id as usize).copied().unwrap_or(true))
}

/// Adjudicate `shot` played by `counters.current_player`
///
/// `pocketed` holds the flags as they were before the shot.
pub fn evaluate_shot(
    counters: &FrameCounters,
    rules: &RuleSettings,
    target_order: &[u32],
    shot: &Shot,
    pocketed: &[bool],
) -> RuleOutcome {
    let shooter = counters.current_player;
    let opponent = counters.opponent();

    if counters.shots_taken >= rules.max_shots {
        log::info!("Shot cap of {} reached; player {opponent} takes the frame", rules.max_shots);
        return RuleOutcome::frame_awarded(pocketed, opponent, ShotVerdict::Foul);
    }
    if counters.consecutive_fouls >= rules.foul_limit {
        log::info!(
            "{} consecutive fouls; player {opponent} takes the frame",
            counters.consecutive_fouls
        );
        return RuleOutcome::frame_awarded(pocketed, opponent, ShotVerdict::Foul);
    }

    let Some(target) = target_ball(target_order, pocketed) else {
        return RuleOutcome {
            pocketed: pocketed.to_vec(),
            next_player: opponent,
            winner: None,
            consecutive_fouls: counters.consecutive_fouls + 1,
            frame_over: false,
            verdict: ShotVerdict::Foul,
            cue_ball_potted: false,
        };
    };

    let legal_first_hit = shot
        .first_contact()
        .is_some_and(|(a, b)| (a == CUE_BALL && b == target) || (a == target && b == CUE_BALL));

    let final_ball = rules.final_ball.or_else(|| target_order.last().copied());
    let mut flags = pocketed.to_vec();
    let mut ball_potted = false;
    let mut final_potted = false;
    let mut cue_potted = false;
    for id in shot.pocketed_balls() {
        if let Some(flag) = flags.get_mut(id as usize) {
            *flag = true;
        }
        ball_potted = true;
        final_potted |= Some(id) == final_ball;
        cue_potted |= id == CUE_BALL;
    }
    if let Some(cue) = flags.get_mut(CUE_BALL as usize) {
        *cue = false;
    }

    if final_potted {
        let (winner, verdict) = if legal_first_hit && !cue_potted {
            (shooter, ShotVerdict::Pot)
        } else {
            (opponent, ShotVerdict::Foul)
        };
        log::info!("Final ball down; player {winner} takes the frame");
        return RuleOutcome {
            pocketed: flags,
            cue_ball_potted: cue_potted,
            ..RuleOutcome::frame_awarded(pocketed, winner, verdict)
        };
    }

    let (next_player, consecutive_fouls, verdict) = if !legal_first_hit || cue_potted {
        (opponent, counters.consecutive_fouls + 1, ShotVerdict::Foul)
    } else if !ball_potted {
        (opponent, counters.consecutive_fouls, ShotVerdict::Miss)
    } else {
        (shooter, 0, ShotVerdict::Pot)
    };

    RuleOutcome {
        pocketed: flags,
        next_player,
        winner: None,
        consecutive_fouls,
        frame_over: false,
        verdict,
        cue_ball_potted: cue_potted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ShotEvent, ShotEventKind, Strike};

    fn shot(kinds: &[ShotEventKind]) -> Shot {
        Shot {
            player: None,
            struck_ball: 0,
            strike: Strike::default(),
            events: kinds
                .iter()
                .enumerate()
                .map(|(i, &kind)| ShotEvent {
                    time: 0.1 * i as f64,
                    kind,
                })
                .collect(),
            ball_paths: Vec::new(),
            end_time: 1.0,
            violations: Vec::new(),
            truncated: false,
            verdict: None,
        }
    }

    fn hit(a: u32, b: u32) -> ShotEventKind {
        ShotEventKind::BallBallCollision { first: a, second: b }
    }

    fn potted(ball: u32) -> ShotEventKind {
        ShotEventKind::BallPocketed { ball, pocket: 0 }
    }

    fn order() -> Vec<u32> {
        (1..10).collect()
    }

    fn counters(player: usize, fouls: u32) -> FrameCounters {
        FrameCounters {
            consecutive_fouls: fouls,
            shots_taken: 1,
            ..FrameCounters::new(player, 2)
        }
    }

    #[test]
    fn test_final_ball_wins_frame() {
        let mut flags = vec![false; 10];
        for id in 1..9 {
            flags[id] = true;
        }
        let shot = shot(&[hit(0, 9), potted(9), ShotEventKind::Stop { ball: 0 }]);
        let outcome = evaluate_shot(&counters(1, 2), &RuleSettings::default(), &order(), &shot, &flags);

        assert_eq!(outcome.winner, Some(1));
        assert!(outcome.frame_over);
        assert_eq!(outcome.consecutive_fouls, 0);
        assert_eq!(outcome.next_player, 1);
        assert_eq!(outcome.verdict, ShotVerdict::Pot);
        assert!(outcome.pocketed[9]);
    }

    #[test]
    fn test_combination_on_final_ball_counts() {
        let flags = vec![false; 10];
        let shot = shot(&[hit(1, 0), hit(1, 9), potted(9)]);
        let outcome = evaluate_shot(&counters(0, 0), &RuleSettings::default(), &order(), &shot, &flags);
        assert_eq!(outcome.winner, Some(0));
    }

    #[test]
    fn test_final_ball_with_scratch_loses_frame() {
        let flags = vec![false; 10];
        let shot = shot(&[hit(0, 1), potted(9), potted(0)]);
        let outcome = evaluate_shot(&counters(0, 0), &RuleSettings::default(), &order(), &shot, &flags);
        assert_eq!(outcome.winner, Some(1));
        assert_eq!(outcome.verdict, ShotVerdict::Foul);
        assert!(!outcome.pocketed[0]);
        assert!(outcome.cue_ball_potted);
    }

    #[test]
    fn test_final_ball_after_illegal_hit_loses_frame() {
        let flags = vec![false; 10];
        let shot = shot(&[hit(0, 9), potted(9)]);
        let outcome = evaluate_shot(&counters(1, 0), &RuleSettings::default(), &order(), &shot, &flags);
        assert_eq!(outcome.winner, Some(0));
        assert_eq!(outcome.next_player, 0);
    }

    #[test]
    fn test_three_fouls_forfeit_the_frame() {
        let rules = RuleSettings::default();
        let flags = vec![false; 10];
        let illegal = shot(&[hit(0, 4)]);

        let mut state = counters(0, 0);
        for expected in 1..=3 {
            let outcome = evaluate_shot(&state, &rules, &order(), &illegal, &flags);
            assert_eq!(outcome.verdict, ShotVerdict::Foul);
            assert_eq!(outcome.consecutive_fouls, expected);
            assert_eq!(outcome.winner, None);
            assert_eq!(outcome.next_player, state.opponent());
            state = FrameCounters {
                current_player: outcome.next_player,
                consecutive_fouls: outcome.consecutive_fouls,
                shots_taken: state.shots_taken + 1,
                ..state
            };
        }

        let legal = shot(&[hit(0, 1)]);
        let outcome = evaluate_shot(&state, &rules, &order(), &legal, &flags);
        assert_eq!(outcome.winner, Some(state.opponent()));
        assert_eq!(outcome.consecutive_fouls, 0);
        assert!(outcome.frame_over);
    }

    #[test]
    fn test_shot_cap_awards_opponent() {
        let rules = RuleSettings {
            max_shots: 5,
            ..RuleSettings::default()
        };
        let state = FrameCounters {
            shots_taken: 5,
            ..counters(1, 0)
        };
        let outcome = evaluate_shot(&state, &rules, &order(), &shot(&[hit(0, 1), potted(1)]), &[false; 10]);
        assert_eq!(outcome.winner, Some(0));
        assert!(outcome.frame_over);
        assert!(!outcome.pocketed[1]);
    }

    #[test]
    fn test_legal_pot_keeps_the_table() {
        let outcome = evaluate_shot(
            &counters(0, 2),
            &RuleSettings::default(),
            &order(),
            &shot(&[hit(0, 1), potted(3)]),
            &[false; 10],
        );
        assert_eq!(outcome.next_player, 0);
        assert_eq!(outcome.consecutive_fouls, 0);
        assert_eq!(outcome.verdict, ShotVerdict::Pot);
        assert!(outcome.pocketed[3]);
    }

    #[test]
    fn test_miss_passes_turn_without_foul() {
        let outcome = evaluate_shot(
            &counters(0, 1),
            &RuleSettings::default(),
            &order(),
            &shot(&[hit(0, 1), ShotEventKind::Stop { ball: 1 }]),
            &[false; 10],
        );
        assert_eq!(outcome.next_player, 1);
        assert_eq!(outcome.consecutive_fouls, 1);
        assert_eq!(outcome.verdict, ShotVerdict::Miss);
    }

    #[test]
    fn test_scratch_is_a_foul() {
        let outcome = evaluate_shot(
            &counters(1, 0),
            &RuleSettings::default(),
            &order(),
            &shot(&[hit(0, 1), potted(1), potted(0)]),
            &[false; 10],
        );
        assert_eq!(outcome.next_player, 0);
        assert_eq!(outcome.consecutive_fouls, 1);
        assert!(outcome.pocketed[1]);
        assert!(!outcome.pocketed[0]);
        assert!(outcome.cue_ball_potted);
    }

    #[test]
    fn test_target_skips_pocketed_balls() {
        let mut flags = vec![false; 10];
        flags[1] = true;
        flags[2] = true;
        assert_eq!(target_ball(&order(), &flags), Some(3));

        let outcome = evaluate_shot(
            &counters(0, 0),
            &RuleSettings::default(),
            &order(),
            &shot(&[hit(0, 1)]),
            &flags,
        );
        assert_eq!(outcome.verdict, ShotVerdict::Foul);
    }

    #[test]
    fn test_no_target_left_is_a_foul() {
        let mut flags = vec![true; 10];
        flags[0] = false;
        let outcome = evaluate_shot(&counters(0, 0), &RuleSettings::default(), &order(), &shot(&[]), &flags);
        assert_eq!(outcome.next_player, 1);
        assert_eq!(outcome.consecutive_fouls, 1);
        assert_eq!(outcome.winner, None);
    }

    #[test]
    fn test_designated_final_ball() {
        let rules = RuleSettings {
            final_ball: Some(8),
            ..RuleSettings::default()
        };
        let outcome = evaluate_shot(
            &counters(0, 0),
            &rules,
            &order(),
            &shot(&[hit(0, 1), potted(8)]),
            &[false; 10],
        );
        assert_eq!(outcome.winner, Some(0));
    }
}
