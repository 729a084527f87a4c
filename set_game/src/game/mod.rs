//! Set game engine - table, players, dealer and their threads.
//!
//! This module provides:
//! - The shared table with its card and token bookkeeping
//! - The claim queue and the game-wide monitor players and dealer meet on
//! - Player threads with their freeze/run state machine
//! - The dealer thread driving rounds, the turn timer and claim validation
//! - [`Game`], which starts all of the above and shuts it down again

pub mod claims;
pub mod dealer;
pub mod entities;
pub mod monitor;
pub mod player;
pub mod table;

use crate::{
    config::GameConfig,
    display::GameDisplay,
    errors::{GameError, GameResult},
    validator::SetValidator,
};
use dealer::Dealer;
use entities::{PlayerId, PlayerState, Slot};
use log::{info, warn};
use monitor::GameMonitor;
use player::{Player, Submission};
use serde::{Deserialize, Serialize};
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};
use table::Table;

/// Final result of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Score per player id
    pub scores: Vec<u32>,
    /// Every player sharing the top score
    pub winners: Vec<PlayerId>,
    /// Rounds dealt
    pub rounds: usize,
    /// Cards won by legal claims
    pub discarded: usize,
}

/// Cheap, cloneable access to a running game: feed input, request shutdown,
/// and observe scores and table state.
#[derive(Clone)]
pub struct GameHandle {
    monitor: Arc<GameMonitor>,
    table: Arc<Table>,
    players: Arc<[Arc<Player>]>,
}

impl GameHandle {
    /// Queue a key press for `player`. Dropped when the player's inbox is
    /// full or the player does not exist.
    pub fn submit_selection(&self, player: PlayerId, slot: Slot) -> Submission {
        match self.players.get(player) {
            Some(p) => p.submit_selection(slot),
            None => {
                warn!("Selection for unknown player {player} dropped");
                Submission::Dropped
            }
        }
    }

    /// Ask every game thread to stop. Does not block, so it is safe to call
    /// from a signal handler.
    pub fn request_terminate(&self) {
        self.monitor.terminate();
        for player in self.players.iter() {
            player.wake();
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.monitor.is_terminated()
    }

    pub fn scores(&self) -> Vec<u32> {
        self.players.iter().map(|p| p.score()).collect()
    }

    pub fn player_state(&self, player: PlayerId) -> Option<PlayerState> {
        (player < self.players.len()).then(|| self.monitor.state(player))
    }

    pub fn pending_selections(&self, player: PlayerId) -> usize {
        self.players
            .get(player)
            .map_or(0, |p| p.pending_selections())
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}

/// A running game.
pub struct Game {
    handle: GameHandle,
    dealer: Option<JoinHandle<GameResult<GameSummary>>>,
}

impl Game {
    /// Validate `config`, then launch the dealer thread, which in turn starts
    /// every player (and computer input) thread.
    pub fn start(
        config: GameConfig,
        display: Arc<dyn GameDisplay>,
        validator: Arc<dyn SetValidator>,
    ) -> GameResult<Self> {
        config.validate()?;

        let table = Arc::new(Table::new(
            config.table_size,
            config.deck_size,
            config.players(),
            Arc::clone(&display),
        ));
        let monitor = Arc::new(GameMonitor::new(config.players()));
        let players: Vec<Arc<Player>> = (0..config.players())
            .map(|id| {
                Arc::new(Player::new(
                    id,
                    config.player_name(id),
                    config.is_human(id),
                    config.table_size,
                ))
            })
            .collect();

        info!(
            "Starting game: {} human and {} computer players, {} slots, {} cards",
            config.human_players, config.computer_players, config.table_size, config.deck_size
        );

        let handle = GameHandle {
            monitor: Arc::clone(&monitor),
            table: Arc::clone(&table),
            players: players.clone().into(),
        };
        let dealer = Dealer::new(config, table, monitor, players, display, validator);
        let dealer = thread::Builder::new()
            .name("dealer".to_string())
            .spawn(move || dealer.run())?;

        Ok(Self {
            handle,
            dealer: Some(dealer),
        })
    }

    pub fn handle(&self) -> GameHandle {
        self.handle.clone()
    }

    pub fn submit_selection(&self, player: PlayerId, slot: Slot) -> Submission {
        self.handle.submit_selection(player, slot)
    }

    /// Whether the dealer thread has exited.
    pub fn is_finished(&self) -> bool {
        self.dealer.as_ref().is_none_or(|d| d.is_finished())
    }

    /// Request shutdown and block until every thread has exited.
    pub fn terminate(&mut self) -> GameResult<GameSummary> {
        self.handle.request_terminate();
        self.join()
    }

    /// Block until the game ends on its own (or is terminated elsewhere).
    pub fn join(&mut self) -> GameResult<GameSummary> {
        let dealer = self.dealer.take().ok_or(GameError::NotRunning)?;
        dealer
            .join()
            .map_err(|_| GameError::ThreadPanicked("dealer".to_string()))?
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        if self.dealer.is_some() {
            let _ = self.terminate();
        }
    }
}
