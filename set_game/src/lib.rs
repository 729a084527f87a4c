//! # Set Game
//!
//! A multi-threaded engine for the card game Set: a shared table of face-up
//! cards, one dealer thread and one thread per player racing to claim legal
//! triples.
//!
//! ## Architecture
//!
//! - **Table**: slot/card mapping and per-player tokens under one lock
//! - **Claim queue**: FIFO of claims, drained by the dealer one per tick
//! - **Players**: a thread each (plus a random input thread for computer
//!   players), cycling through `Waiting`, `Running`, `Point` and `Penalty`
//! - **Dealer**: deals, runs the turn timer, judges claims, reshuffles, and
//!   announces the winners once no legal set remains
//!
//! Players and dealer meet on a single game-wide monitor; each player's input
//! queue has its own lock, and the two lock domains never nest.
//!
//! ## Example
//!
//! ```no_run
//! use set_game::{FeatureValidator, Game, GameConfig, LogDisplay};
//! use std::sync::Arc;
//!
//! let config = GameConfig {
//!     human_players: 0,
//!     computer_players: 2,
//!     ..GameConfig::default()
//! };
//! let display = Arc::new(LogDisplay::new(config.player_names.clone()));
//! let validator = Arc::new(FeatureValidator::from_config(&config));
//! let mut game = Game::start(config, display, validator).unwrap();
//! let summary = game.join().unwrap();
//! println!("winners: {:?}", summary.winners);
//! ```

/// Game configuration.
pub mod config;
pub use config::GameConfig;

/// Display callback surface.
pub mod display;
pub use display::{GameDisplay, LogDisplay, NullDisplay};

pub mod errors;
pub use errors::{GameError, GameResult};

/// Core game logic: table, players, dealer.
pub mod game;
pub use game::{
    Game, GameHandle, GameSummary,
    claims::{ClaimOutcome, ClaimRequest},
    entities::{Card, PlayerId, PlayerState, Slot},
    player::{SELECTION_CAPACITY, Submission},
    table::{MAX_TOKENS, TokenToggle},
};

/// Set legality oracle.
pub mod validator;
pub use validator::{FeatureValidator, SetValidator};
