//! RX Ball headless runner
//!
//! Plays the built-in campaign with the autopilot at full speed, then prints
//! a summary. Useful for balance checks and replay determinism.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use rx_ball::sim::{GamePhase, GameState, RoundCarry, TickInput};
use rx_ball::{
    EffectsBridge, HighScoreStore, JsonFileStore, LogSink, Tuning, submit_at_boundary, submit_score,
};

#[derive(Parser, Debug)]
#[command(name = "rx-ball")]
#[command(about = "Run a deterministic breakout campaign with the autopilot")]
struct Cli {
    /// Run seed
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Starting level (1-based)
    #[arg(long, default_value_t = 1)]
    level: u32,
    /// Simulation tick budget across the whole campaign (120 ticks per second)
    #[arg(long, default_value_t = 120 * 60 * 30)]
    max_ticks: u64,
    /// Tuning overrides as a JSON file
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// High score JSON file
    #[arg(long)]
    highscore: Option<PathBuf>,
}

fn load_tuning(path: Option<&PathBuf>) -> Result<Tuning> {
    let Some(path) = path else {
        return Ok(Tuning::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read tuning file {}", path.display()))?;
    Tuning::from_json(&json).with_context(|| format!("invalid tuning file {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::info!("RX Ball starting with seed {}", cli.seed);

    let tuning = load_tuning(cli.tuning.as_ref())?;
    let start_level = cli.level.saturating_sub(1);
    let mut state = GameState::new(cli.seed, start_level, RoundCarry::fresh(&tuning), tuning);

    let mut effects = EffectsBridge::new();
    effects.register(Box::new(LogSink::default()));

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    let mut store = cli.highscore.as_ref().map(JsonFileStore::open);
    let mut new_best = false;

    let mut total_ticks = 0u64;
    let mut levels_cleared = 0u32;
    let mut campaign_complete = false;

    while total_ticks < cli.max_ticks {
        let result = state.advance(&input);
        total_ticks += 1;
        effects.dispatch(&result.events);
        if let Some(store) = store.as_mut() {
            for event in &result.events {
                new_best |= submit_at_boundary(store, event);
            }
        }

        match result.snapshot.phase {
            GamePhase::LevelWon => {
                levels_cleared += 1;
                match state.next_level() {
                    Some(next) => state = next,
                    None => {
                        campaign_complete = true;
                        break;
                    }
                }
            }
            GamePhase::GameOver => break,
            _ => {}
        }
    }

    // Tick budget can end a run between boundaries
    let best = store.as_mut().map(|store| {
        new_best |= submit_score(store, state.score);
        store.best()
    });

    let outcome = if campaign_complete {
        "campaign complete"
    } else if state.phase == GamePhase::GameOver {
        "game over"
    } else {
        "tick budget exhausted"
    };

    println!("RX Ball run (seed {})", cli.seed);
    println!("  outcome:        {}", outcome);
    println!("  final level:    {} '{}'", state.level_index + 1, state.level_name);
    println!("  levels cleared: {}", levels_cleared);
    println!("  score:          {}", state.score);
    println!("  lives left:     {}", state.lives);
    println!(
        "  sim time:       {:.1}s ({} ticks)",
        rx_ball::ticks_to_secs(total_ticks),
        total_ticks
    );
    if let Some(best) = best {
        let marker = if new_best { " (new!)" } else { "" };
        println!("  high score:     {}{}", best, marker);
    }

    Ok(())
}
