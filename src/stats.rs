//! Per-player match statistics

use serde::{Deserialize, Serialize};

use crate::consts::CUE_BALL;
use crate::sim::{Frame, ShotVerdict};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub shots: usize,
    /// Object balls potted, legally or not
    pub pots: usize,
    pub fouls: usize,
    pub frames_won: usize,
}

impl PlayerStats {
    /// Object balls potted per shot
    pub fn pot_rate(&self) -> f64 {
        if self.shots == 0 {
            0.0
        } else {
            self.pots as f64 / self.shots as f64
        }
    }
}

/// Tally shots, pots, fouls and frame wins from recorded frames
///
/// Shots without a recorded player are skipped.
pub fn collect_stats(frames: &[Frame], num_players: usize) -> Vec<PlayerStats> {
    let mut stats = vec![PlayerStats::default(); num_players];

    for frame in frames {
        for shot in &frame.shots {
            let Some(entry) = shot.player.and_then(|p| stats.get_mut(p)) else {
                continue;
            };
            entry.shots += 1;
            entry.pots += shot.pocketed_balls().filter(|&id| id != CUE_BALL).count();
            if shot.verdict == Some(ShotVerdict::Foul) {
                entry.fouls += 1;
            }
        }
        if let Some(entry) = frame.winner.and_then(|w| stats.get_mut(w)) {
            entry.frames_won += 1;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Shot, ShotEvent, ShotEventKind, Strike};

    fn shot(player: Option<usize>, verdict: ShotVerdict, potted: &[u32]) -> Shot {
        Shot {
            player,
            struck_ball: CUE_BALL,
            strike: Strike::default(),
            events: potted
                .iter()
                .map(|&ball| ShotEvent {
                    time: 0.5,
                    kind: ShotEventKind::BallPocketed { ball, pocket: 1 },
                })
                .collect(),
            ball_paths: Vec::new(),
            end_time: 1.5,
            violations: Vec::new(),
            truncated: false,
            verdict: Some(verdict),
        }
    }

    #[test]
    fn test_tallies_per_player() {
        let frames = vec![
            Frame {
                shots: vec![
                    shot(Some(0), ShotVerdict::Pot, &[2, 3]),
                    shot(Some(0), ShotVerdict::Foul, &[4, 0]),
                    shot(Some(1), ShotVerdict::Miss, &[]),
                    shot(None, ShotVerdict::Pot, &[5]),
                ],
                winner: Some(1),
            },
            Frame {
                shots: vec![shot(Some(1), ShotVerdict::Foul, &[])],
                winner: None,
            },
        ];

        let stats = collect_stats(&frames, 2);
        assert_eq!(
            stats[0],
            PlayerStats {
                shots: 2,
                pots: 3,
                fouls: 1,
                frames_won: 0
            }
        );
        assert_eq!(
            stats[1],
            PlayerStats {
                shots: 2,
                pots: 0,
                fouls: 1,
                frames_won: 1
            }
        );
        assert!((stats[0].pot_rate() - 1.5).abs() < 1e-12);
        assert_eq!(PlayerStats::default().pot_rate(), 0.0);
    }

    #[test]
    fn test_unknown_players_are_ignored() {
        let frames = vec![Frame {
            shots: vec![shot(Some(7), ShotVerdict::Pot, &[1])],
            winner: Some(7),
        }];
        assert_eq!(collect_stats(&frames, 2), vec![PlayerStats::default(); 2]);
    }
}
