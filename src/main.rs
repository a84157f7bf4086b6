//! Cue Sim entry point
//!
//! Plays a short match between the built-in strategies and logs the result.

use std::path::PathBuf;

use clap::Parser;

use cue_sim::game::Player;
use cue_sim::stats::collect_stats;
use cue_sim::strategy::{BankStrategy, PotStrategy};
use cue_sim::{Game, Settings, SimError};

#[derive(Parser, Debug)]
#[command(name = "cue-sim")]
#[command(about = "Play a rotation match between the built-in shot strategies", long_about = None)]
struct Cli {
    /// Settings JSON file; built-in defaults when omitted
    settings: Option<PathBuf>,

    /// Frames to play
    #[arg(long, default_value_t = 5)]
    frames: usize,

    /// Re-rack seed; taken from the clock when omitted
    #[arg(long)]
    seed: Option<u64>,
}

fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn run(cli: Cli) -> Result<(), SimError> {
    let settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let seed = cli.seed.unwrap_or_else(clock_seed);

    let players = vec![
        Player::new("Potter", PotStrategy::default()),
        Player::new("Banker", BankStrategy::default()),
    ];
    let mut game = Game::new(settings, players, seed)?;
    log::info!("Playing {} frames with seed {seed}", cli.frames);

    for _ in 0..cli.frames {
        game.play_frame()?;
    }

    let stats = collect_stats(game.frames(), game.players().len());
    for (player, s) in game.players().iter().zip(&stats) {
        log::info!(
            "{}: {} frames, {} shots, {} pots ({:.2}/shot), {} fouls",
            player.name,
            s.frames_won,
            s.shots,
            s.pots,
            s.pot_rate(),
            s.fouls
        );
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Cue Sim starting...");

    if let Err(e) = run(cli) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["cue-sim"]).unwrap();
        assert_eq!(cli.settings, None);
        assert_eq!(cli.frames, 5);
        assert_eq!(cli.seed, None);
    }

    #[test]
    fn test_all_arguments() {
        let cli = Cli::try_parse_from(["cue-sim", "table.json", "--frames", "3", "--seed", "42"]).unwrap();
        assert_eq!(cli.settings, Some(PathBuf::from("table.json")));
        assert_eq!(cli.frames, 3);
        assert_eq!(cli.seed, Some(42));
    }

    #[test]
    fn test_malformed_numbers_are_rejected() {
        assert!(Cli::try_parse_from(["cue-sim", "--frames", "5x"]).is_err());
        assert!(Cli::try_parse_from(["cue-sim", "--frames", "-1"]).is_err());
        assert!(Cli::try_parse_from(["cue-sim", "--seed", "abc"]).is_err());
        assert!(Cli::try_parse_from(["cue-sim", "a.json", "b.json"]).is_err());
    }
}
