//! Terminal front-end for the Set card game.
//!
//! Keyboard players type their keys and press enter; every key in the line
//! is one selection. Display callbacks are rendered as log lines.

mod config;
mod keymap;
mod logging;

use std::{
    io::{self, BufRead},
    path::PathBuf,
    sync::Arc,
    thread,
};

use anyhow::Error;
use config::CliOverrides;
use ctrlc::set_handler;
use log::{info, warn};
use pico_args::Arguments;
use set_game::{FeatureValidator, Game, GameHandle, LogDisplay, Submission};

const HELP: &str = "\
Play Set against the clock, and against each other

USAGE:
  set_runner [OPTIONS]

OPTIONS:
  --config     PATH        JSON game configuration   [default: env SET_CONFIG]
  --humans     N           Keyboard players (0-2)    [default: env SET_HUMAN_PLAYERS or 2]
  --computers  N           Random players            [default: env SET_COMPUTER_PLAYERS or 0]
  --timeout    SECS        Round length              [default: env SET_TURN_TIMEOUT_SECS or 60]
  --seed       N           Fixed shuffle seed        [default: env SET_SEED]

FLAGS:
  --hints                  Log the sets on the table each round
  -h, --help               Print help information

KEYS:
  Player 1                 q w e r / a s d f / z x c v
  Player 2                 u i o p / j k l ; / m , . /
  quit                     End the game

ENVIRONMENT:
  RUST_LOG                 Log level (e.g., debug)
  SET_*                    See the options above; also SET_TABLE_SIZE,
                           SET_POINT_FREEZE_MILLIS, SET_PENALTY_FREEZE_MILLIS,
                           SET_TURN_TIMEOUT_WARNING_SECS, SET_PLAYER_NAMES
";

fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = CliOverrides {
        config_path: pargs.opt_value_from_str::<_, PathBuf>("--config")?,
        human_players: pargs.opt_value_from_str("--humans")?,
        computer_players: pargs.opt_value_from_str("--computers")?,
        turn_timeout_secs: pargs.opt_value_from_str("--timeout")?,
        seed: pargs.opt_value_from_str("--seed")?,
        hints: pargs.contains("--hints"),
    };

    logging::init();

    let leftover = pargs.finish();
    if !leftover.is_empty() {
        warn!("Ignoring unknown arguments: {leftover:?}");
    }

    let config = config::load(overrides)?;
    let humans = config.human_players;
    let names = (0..config.players()).map(|id| config.player_name(id)).collect();
    let display = Arc::new(LogDisplay::new(names));
    let validator = Arc::new(FeatureValidator::from_config(&config));

    let mut game = Game::start(config, display, validator)?;

    // Catching signals for exit.
    let handle = game.handle();
    set_handler(move || handle.request_terminate())?;

    if humans > 0 {
        spawn_keyboard(game.handle(), humans)?;
    }

    let summary = game.join()?;
    info!("Game over after {} rounds", summary.rounds);
    for (player, score) in summary.scores.iter().enumerate() {
        let marker = if summary.winners.contains(&player) { " (winner)" } else { "" };
        println!("Player {}: {score}{marker}", player + 1);
    }

    Ok(())
}

/// Feed stdin lines to the keyboard players. The thread is detached; it
/// ends with the process.
fn spawn_keyboard(handle: GameHandle, humans: usize) -> io::Result<()> {
    thread::Builder::new()
        .name("keyboard".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim() == "quit" {
                    handle.request_terminate();
                    break;
                }
                for key in keymap::parse_line(&line) {
                    match key {
                        Ok((player, slot)) if player < humans => {
                            if handle.submit_selection(player, slot) == Submission::Dropped {
                                warn!("Player {} is typing faster than they play", player + 1);
                            }
                        }
                        Ok((player, _)) => warn!("Player {} is not at the keyboard", player + 1),
                        Err(e) => warn!("{e}"),
                    }
                }
            }
            info!("Keyboard input closed");
        })?;
    Ok(())
}
