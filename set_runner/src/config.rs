//! Runner configuration management.
//!
//! Layers a [`GameConfig`] from, in increasing priority: built-in defaults,
//! an optional JSON file, `SET_*` environment variables, and command line
//! flags.

use crate::keymap;
use set_game::{GameConfig, GameError};
use std::path::PathBuf;

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// JSON configuration file
    pub config_path: Option<PathBuf>,
    /// Keyboard-driven players
    pub human_players: Option<usize>,
    /// Randomly playing players
    pub computer_players: Option<usize>,
    /// Round length in seconds
    pub turn_timeout_secs: Option<u64>,
    /// Fixed shuffle seed
    pub seed: Option<u64>,
    /// Log the sets on the table each round
    pub hints: bool,
}

/// Build and validate the game configuration.
///
/// # Errors
///
/// Returns error if the configuration file cannot be loaded, or if the
/// merged configuration is rejected by the engine or the keyboard layout
pub fn load(overrides: CliOverrides) -> Result<GameConfig, ConfigError> {
    let path = overrides
        .config_path
        .clone()
        .or_else(|| std::env::var("SET_CONFIG").ok().map(PathBuf::from));

    let mut config = match path {
        Some(path) => GameConfig::from_json_file(path)?,
        None => GameConfig::default(),
    };

    apply_env(&mut config);
    apply_overrides(&mut config, &overrides);
    validate(&config)?;
    Ok(config)
}

fn apply_env(config: &mut GameConfig) {
    config.human_players = parse_env_or("SET_HUMAN_PLAYERS", config.human_players);
    config.computer_players = parse_env_or("SET_COMPUTER_PLAYERS", config.computer_players);
    config.table_size = parse_env_or("SET_TABLE_SIZE", config.table_size);
    if let Some(secs) = parse_env::<u64>("SET_TURN_TIMEOUT_SECS") {
        config.turn_timeout_millis = secs.saturating_mul(1000);
    }
    if let Some(secs) = parse_env::<u64>("SET_TURN_TIMEOUT_WARNING_SECS") {
        config.turn_timeout_warning_millis = secs.saturating_mul(1000);
    }
    config.point_freeze_millis = parse_env_or("SET_POINT_FREEZE_MILLIS", config.point_freeze_millis);
    config.penalty_freeze_millis =
        parse_env_or("SET_PENALTY_FREEZE_MILLIS", config.penalty_freeze_millis);
    config.hints = parse_env_or("SET_HINTS", config.hints);
    config.seed = parse_env("SET_SEED").or(config.seed);

    if let Ok(names) = std::env::var("SET_PLAYER_NAMES") {
        config.player_names = names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();
    }
}

fn apply_overrides(config: &mut GameConfig, overrides: &CliOverrides) {
    if let Some(humans) = overrides.human_players {
        config.human_players = humans;
    }
    if let Some(computers) = overrides.computer_players {
        config.computer_players = computers;
    }
    if let Some(secs) = overrides.turn_timeout_secs {
        config.turn_timeout_millis = secs.saturating_mul(1000);
    }
    if overrides.seed.is_some() {
        config.seed = overrides.seed;
    }
    config.hints |= overrides.hints;
}

/// Engine rules plus the limits of the keyboard layout.
fn validate(config: &GameConfig) -> Result<(), ConfigError> {
    config.validate()?;

    if config.human_players > keymap::PLAYERS {
        return Err(ConfigError::Invalid {
            var: "SET_HUMAN_PLAYERS".to_string(),
            reason: format!(
                "The keyboard layout has room for at most {} players",
                keymap::PLAYERS
            ),
        });
    }

    if config.human_players > 0 && config.table_size != keymap::SLOTS {
        return Err(ConfigError::Invalid {
            var: "SET_TABLE_SIZE".to_string(),
            reason: format!(
                "Keyboard players need a table of exactly {} slots",
                keymap::SLOTS
            ),
        });
    }

    Ok(())
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error(transparent)]
    Game(#[from] GameError),
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    parse_env(key).unwrap_or(default)
}
