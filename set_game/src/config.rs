//! Game configuration models.

use crate::errors::{GameError, GameResult};
use crate::game::entities::PlayerId;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Game configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of slots on the table (default: 12)
    pub table_size: usize,

    /// Number of cards in a full deck (default: 81)
    pub deck_size: usize,

    /// Number of features printed on each card
    pub feature_count: u32,

    /// Number of values each feature can take
    pub feature_size: usize,

    /// Players fed by keyboard input. They take the lowest ids.
    pub human_players: usize,

    /// Players fed by a random key press generator
    pub computer_players: usize,

    /// Display names, indexed by player id. Missing names fall back to "Player N".
    pub player_names: Vec<String>,

    /// Round length before the dealer reshuffles the table
    pub turn_timeout_millis: u64,

    /// Remaining time below which the countdown is shown as a warning
    pub turn_timeout_warning_millis: u64,

    /// Freeze after a legal claim
    pub point_freeze_millis: u64,

    /// Freeze after an illegal claim
    pub penalty_freeze_millis: u64,

    /// Dealer loop period. At most one claim is resolved per tick.
    pub dealer_tick_millis: u64,

    /// How often a frozen player refreshes its freeze display
    pub freeze_report_millis: u64,

    /// Log every legal set on the table at the start of a round
    pub hints: bool,

    /// Fixed shuffle seed, for reproducible games
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            table_size: 12,
            deck_size: 81,
            feature_count: 4,
            feature_size: 3,
            human_players: 2,
            computer_players: 0,
            player_names: vec!["Player 1".to_string(), "Player 2".to_string()],
            turn_timeout_millis: 60_000,
            turn_timeout_warning_millis: 5_000,
            point_freeze_millis: 1_000,
            penalty_freeze_millis: 3_000,
            dealer_tick_millis: 10,
            freeze_report_millis: 1_000,
            hints: false,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Parse a configuration from JSON. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> GameResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> GameResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| GameError::ConfigFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Validate configuration
    pub fn validate(&self) -> GameResult<()> {
        if self.table_size < 3 {
            return Err(GameError::invalid("table_size", "Must be at least 3"));
        }

        if self.deck_size < 3 {
            return Err(GameError::invalid("deck_size", "Must be at least 3"));
        }

        if self.feature_size < 2 || self.feature_count == 0 {
            return Err(GameError::invalid(
                "feature_size",
                "Need at least one feature with two or more values",
            ));
        }

        let distinct_cards = self
            .feature_size
            .checked_pow(self.feature_count)
            .unwrap_or(usize::MAX);
        if self.deck_size > distinct_cards {
            return Err(GameError::invalid(
                "deck_size",
                format!(
                    "Cannot exceed {distinct_cards} distinct cards ({}^{})",
                    self.feature_size, self.feature_count
                ),
            ));
        }

        if self.players() == 0 {
            return Err(GameError::invalid(
                "human_players",
                "Need at least one human or computer player",
            ));
        }

        if self.turn_timeout_millis == 0 {
            return Err(GameError::invalid("turn_timeout_millis", "Must be greater than 0"));
        }

        if self.turn_timeout_warning_millis > self.turn_timeout_millis {
            return Err(GameError::invalid(
                "turn_timeout_warning_millis",
                format!(
                    "Must not exceed the turn timeout ({}ms)",
                    self.turn_timeout_millis
                ),
            ));
        }

        if self.dealer_tick_millis == 0 {
            return Err(GameError::invalid("dealer_tick_millis", "Must be greater than 0"));
        }

        if self.freeze_report_millis == 0 {
            return Err(GameError::invalid(
                "freeze_report_millis",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Total number of players
    pub fn players(&self) -> usize {
        self.human_players + self.computer_players
    }

    pub fn is_human(&self, player: PlayerId) -> bool {
        player < self.human_players
    }

    pub fn player_name(&self, player: PlayerId) -> String {
        self.player_names
            .get(player)
            .cloned()
            .unwrap_or_else(|| format!("Player {}", player + 1))
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_millis)
    }

    pub fn turn_timeout_warning(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_warning_millis)
    }

    pub fn point_freeze(&self) -> Duration {
        Duration::from_millis(self.point_freeze_millis)
    }

    pub fn penalty_freeze(&self) -> Duration {
        Duration::from_millis(self.penalty_freeze_millis)
    }

    pub fn dealer_tick(&self) -> Duration {
        Duration::from_millis(self.dealer_tick_millis)
    }

    pub fn freeze_report_interval(&self) -> Duration {
        Duration::from_millis(self.freeze_report_millis)
    }
}
