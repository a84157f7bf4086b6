//! Match driver
//!
//! Owns the scene and the players and runs turns: ask the shooter's strategy
//! for a strike, simulate it, judge it, then leave the table ready for the
//! next shot. Re-racks come from a seeded RNG so a whole match replays
//! exactly from its seed.

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::CUE_BALL;
use crate::error::{ConfigError, SimError};
use crate::rules::{self, FrameCounters, RuleOutcome};
use crate::settings::Settings;
use crate::sim::{Frame, Scene, simulate};
use crate::strategy::{ShotStrategy, TableView};

/// Tries along the cue spot row before giving up on finding a clear spot
const RESPOT_ATTEMPTS: usize = 64;

/// A named seat at the table
pub struct Player {
    pub name: String,
    pub strategy: Box<dyn ShotStrategy>,
}

impl Player {
    pub fn new(name: impl Into<String>, strategy: impl ShotStrategy + 'static) -> Self {
        Self {
            name: name.into(),
            strategy: Box::new(strategy),
        }
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("name", &self.name)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

/// Result of one turn
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub shooter: usize,
    pub outcome: RuleOutcome,
}

#[derive(Debug)]
pub struct Game {
    settings: Settings,
    scene: Scene,
    players: Vec<Player>,
    current_player: usize,
    consecutive_fouls: u32,
    frames: Vec<Frame>,
    target_order: Vec<u32>,
    seed: u64,
    rng: Pcg32,
}

impl Game {
    /// Validate the settings and rack the first frame
    pub fn new(settings: Settings, players: Vec<Player>, seed: u64) -> Result<Self, SimError> {
        if players.is_empty() {
            return Err(ConfigError::NoPlayers.into());
        }
        let scene = settings.build_scene()?;
        let target_order = settings.target_order();
        let mut game = Self {
            settings,
            scene,
            players,
            current_player: 0,
            consecutive_fouls: 0,
            frames: Vec::new(),
            target_order,
            seed,
            rng: Pcg32::seed_from_u64(seed),
        };
        game.setup_new_frame();
        Ok(game)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Direct access for arranging practice positions
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn current_player(&self) -> usize {
        self.current_player
    }

    pub fn consecutive_fouls(&self) -> u32 {
        self.consecutive_fouls
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// All frames, the one in progress last
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Ball the shooter must contact first
    pub fn target(&self) -> Option<u32> {
        rules::target_ball(&self.target_order, &self.scene.pocketed_flags())
    }

    /// Start a fresh frame: clear flags and paths, re-rack every ball
    ///
    /// Ball `i` goes to `x ~ U(x_min, x_max)`, `y = y_start + spacing * i`.
    pub fn setup_new_frame(&mut self) {
        let rack = self.settings.rack;
        for ball in &mut self.scene.balls {
            let x = self.rng.random_range(rack.x_min..=rack.x_max);
            ball.position = DVec3::new(x, rack.y_start + rack.spacing * ball.id as f64, 0.0);
            ball.pocketed = false;
        }
        self.scene.clear_paths();
        self.frames.push(Frame::new());
        log::debug!("Frame {} racked", self.frames.len());
    }

    /// Play one shot for the current player and apply the rules
    pub fn play_turn(&mut self) -> Result<Turn, SimError> {
        let shooter = self.current_player;
        let before = self.scene.pocketed_flags();
        let target = self.target();

        let strike = self.players[shooter]
            .strategy
            .decide_shot(&TableView::new(&self.scene, target));
        let mut shot = simulate(&mut self.scene, CUE_BALL, strike.velocity, strike.spin)?;
        shot.player = Some(shooter);

        let shots_taken = self.frames.last().map_or(0, |f| f.shots.len()) + 1;
        let counters = FrameCounters {
            current_player: shooter,
            num_players: self.players.len(),
            consecutive_fouls: self.consecutive_fouls,
            shots_taken,
        };
        let outcome = rules::evaluate_shot(&counters, &self.settings.rules, &self.target_order, &shot, &before);
        shot.verdict = Some(outcome.verdict);

        log::info!(
            "{} shot {}: {:?}, {} events, potted {:?}",
            self.players[shooter].name,
            shots_taken,
            outcome.verdict,
            shot.events.len(),
            shot.pocketed_balls().collect::<Vec<_>>()
        );

        if self.frames.is_empty() {
            self.frames.push(Frame::new());
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.shots.push(shot);
            frame.winner = outcome.winner;
        }

        self.current_player = outcome.next_player;
        self.consecutive_fouls = outcome.consecutive_fouls;

        if outcome.frame_over {
            let winner = outcome.winner.map_or("nobody", |w| self.players[w].name.as_str());
            log::info!("Frame {} won by {winner}", self.frames.len());
            self.setup_new_frame();
        } else {
            self.scene.freeze_positions();
            for (ball, &pocketed) in self.scene.balls.iter_mut().zip(&outcome.pocketed) {
                ball.pocketed = pocketed;
            }
            if outcome.cue_ball_potted {
                self.respot_cue_ball();
            }
            self.scene.clear_paths();
        }

        Ok(Turn { shooter, outcome })
    }

    /// Play turns until the current frame is decided; returns the winner
    pub fn play_frame(&mut self) -> Result<Option<usize>, SimError> {
        loop {
            let turn = self.play_turn()?;
            if turn.outcome.frame_over {
                return Ok(turn.outcome.winner);
            }
        }
    }

    /// Frames won by each player
    pub fn frames_won(&self) -> Vec<usize> {
        let mut won = vec![0; self.players.len()];
        for winner in self.frames.iter().filter_map(|f| f.winner) {
            if let Some(count) = won.get_mut(winner) {
                *count += 1;
            }
        }
        won
    }

    /// Put the cue ball back on the cue spot, sliding along x until it is clear
    fn respot_cue_ball(&mut self) {
        let spot = self.settings.rack.cue_spot;
        let radius = self.scene.cue_ball().radius;
        let step = DVec3::X * (2.5 * radius);
        let clear = |p: DVec3| {
            self.scene
                .balls
                .iter()
                .filter(|b| b.id != CUE_BALL && !b.pocketed)
                .all(|b| (b.position - p).length() >= b.radius + radius)
        };
        let position = (0..RESPOT_ATTEMPTS)
            .map(|i| spot + step * i as f64)
            .find(|&p| clear(p))
            .unwrap_or(spot);

        let cue = &mut self.scene.balls[CUE_BALL as usize];
        cue.position = position;
        cue.pocketed = false;
    }
}
