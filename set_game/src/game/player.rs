//! Player threads.
//!
//! Each player owns a bounded inbox of pending slot selections guarded by its
//! own lock. The player thread drains the inbox while `Running`, parks on the
//! game-wide monitor while `Waiting`, and sits out its freeze after the dealer
//! rules on a claim. Computer players get a second thread that feeds random
//! selections into the inbox.

use super::{
    entities::{PlayerId, PlayerState, Slot},
    monitor::GameMonitor,
    table::{MAX_TOKENS, Table, TokenToggle},
};
use crate::display::GameDisplay;
use log::{debug, error, info};
use parking_lot::{Condvar, Mutex};
use rand::Rng;
use std::{
    collections::VecDeque,
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// Pending selections a player may have queued at once.
pub const SELECTION_CAPACITY: usize = 3;

/// How long a computer player backs off when its inbox is full.
const AI_BACKOFF: Duration = Duration::from_millis(50);

/// Result of handing a key press to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Queued,
    /// Inbox full, or the slot is off the table. Not an error.
    Dropped,
}

#[derive(Debug, Default)]
struct Pending {
    slots: VecDeque<Slot>,
    /// Set by [`Inbox::nudge`] so a wake-up sent before the player parks is
    /// not lost.
    nudged: bool,
}

/// Per-player monitor around the pending-selection queue.
#[derive(Debug, Default)]
struct Inbox {
    pending: Mutex<Pending>,
    signal: Condvar,
}

impl Inbox {
    fn submit(&self, slot: Slot) -> Submission {
        let mut pending = self.pending.lock();
        if pending.slots.len() >= SELECTION_CAPACITY {
            return Submission::Dropped;
        }
        pending.slots.push_back(slot);
        self.signal.notify_all();
        Submission::Queued
    }

    fn pop(&self) -> Option<Slot> {
        let mut pending = self.pending.lock();
        let slot = pending.slots.pop_front();
        if slot.is_some() {
            // Room for the input generator again.
            self.signal.notify_all();
        }
        slot
    }

    fn clear(&self) {
        let mut pending = self.pending.lock();
        pending.slots.clear();
        self.signal.notify_all();
    }

    fn len(&self) -> usize {
        self.pending.lock().slots.len()
    }

    /// Park until input arrives, a nudge comes in, or the game terminates.
    /// A single wait; the caller re-checks its own state afterwards.
    fn wait_for_input(&self, terminated: &AtomicBool) {
        let mut pending = self.pending.lock();
        if pending.slots.is_empty() && !pending.nudged && !terminated.load(Ordering::Acquire) {
            self.signal.wait(&mut pending);
        }
        pending.nudged = false;
    }

    fn wait_for_space(&self, terminated: &AtomicBool, timeout: Duration) {
        let mut pending = self.pending.lock();
        if pending.slots.len() >= SELECTION_CAPACITY && !terminated.load(Ordering::Acquire) {
            self.signal.wait_for(&mut pending, timeout);
        }
    }

    fn nudge(&self) {
        let mut pending = self.pending.lock();
        pending.nudged = true;
        self.signal.notify_all();
    }
}

/// The shared side of a player: identity, score and inbox.
#[derive(Debug)]
pub struct Player {
    id: PlayerId,
    name: String,
    human: bool,
    table_size: usize,
    score: AtomicU32,
    inbox: Inbox,
}

impl Player {
    pub fn new(id: PlayerId, name: String, human: bool, table_size: usize) -> Self {
        Self {
            id,
            name,
            human,
            table_size,
            score: AtomicU32::new(0),
            inbox: Inbox::default(),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_human(&self) -> bool {
        self.human
    }

    pub fn score(&self) -> u32 {
        self.score.load(Ordering::Acquire)
    }

    /// Queue a key press for this player. Silently dropped when the inbox
    /// already holds [`SELECTION_CAPACITY`] selections.
    pub fn submit_selection(&self, slot: Slot) -> Submission {
        if slot >= self.table_size {
            debug!("{}: ignoring selection of slot {slot}", self.name);
            return Submission::Dropped;
        }
        self.inbox.submit(slot)
    }

    pub fn pending_selections(&self) -> usize {
        self.inbox.len()
    }

    /// Dealer only. Returns the new score.
    pub(crate) fn award_point(&self) -> u32 {
        self.score.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn clear_selections(&self) {
        self.inbox.clear();
    }

    /// Kick the player out of an idle wait so it re-reads its state.
    pub(crate) fn wake(&self) {
        self.inbox.nudge();
    }
}

/// Freeze lengths and reporting cadence a player thread needs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FreezeTimings {
    pub point: Duration,
    pub penalty: Duration,
    pub report_interval: Duration,
}

/// The thread body of a player.
pub(crate) struct PlayerWorker {
    player: Arc<Player>,
    table: Arc<Table>,
    monitor: Arc<GameMonitor>,
    display: Arc<dyn GameDisplay>,
    timings: FreezeTimings,
}

impl PlayerWorker {
    pub(crate) fn new(
        player: Arc<Player>,
        table: Arc<Table>,
        monitor: Arc<GameMonitor>,
        display: Arc<dyn GameDisplay>,
        timings: FreezeTimings,
    ) -> Self {
        Self {
            player,
            table,
            monitor,
            display,
            timings,
        }
    }

    pub(crate) fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("player-{}", self.player.id))
            .spawn(move || self.run())
    }

    fn run(self) {
        info!("{} thread starting", self.player.name);
        let generator = if self.player.human {
            None
        } else {
            match spawn_input_generator(Arc::clone(&self.player), Arc::clone(&self.monitor)) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    error!("{}: failed to start input generator: {e}", self.player.name);
                    None
                }
            }
        };

        while !self.monitor.is_terminated() {
            match self.monitor.await_turn(self.player.id) {
                PlayerState::Waiting => {}
                PlayerState::Running => self.step(),
                PlayerState::Point => self.freeze(PlayerState::Point, self.timings.point),
                PlayerState::Penalty => self.freeze(PlayerState::Penalty, self.timings.penalty),
            }
        }

        if let Some(handle) = generator {
            if handle.join().is_err() {
                error!("{}: input generator panicked", self.player.name);
            }
        }
        info!("{} thread terminated", self.player.name);
    }

    /// Handle one pending selection, or idle until there is one.
    fn step(&self) {
        match self.player.inbox.pop() {
            Some(slot) => {
                self.select(slot);
            }
            None => self
                .player
                .inbox
                .wait_for_input(self.monitor.terminated_flag()),
        }
    }

    /// Toggle the player's token on `slot`. Placing the third token queues a
    /// claim and parks the player until the dealer rules on it.
    pub(crate) fn select(&self, slot: Slot) -> TokenToggle {
        let toggle = self.table.toggle_token(self.player.id, slot);
        if toggle == (TokenToggle::Placed { tokens: MAX_TOKENS }) {
            let request = self.monitor.submit_claim(self.player.id);
            debug!(
                "{} claims a set (ticket {})",
                self.player.name, request.ticket
            );
        }
        toggle
    }

    fn freeze(&self, frozen: PlayerState, duration: Duration) {
        let started = Instant::now();
        self.display.set_freeze(self.player.id, duration);
        loop {
            let elapsed = started.elapsed();
            if elapsed >= duration || self.monitor.is_terminated() {
                break;
            }
            thread::sleep((duration - elapsed).min(self.timings.report_interval));
            self.display
                .set_freeze(self.player.id, duration.saturating_sub(started.elapsed()));
        }
        self.display.set_freeze(self.player.id, Duration::ZERO);
        if self.monitor.finish_freeze(self.player.id, frozen) {
            self.player.clear_selections();
        }
    }
}

/// Random key presses for a computer player, as fast as its inbox accepts them.
fn spawn_input_generator(
    player: Arc<Player>,
    monitor: Arc<GameMonitor>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("computer-{}", player.id))
        .spawn(move || {
            info!("{} input generator starting", player.name);
            let mut rng = rand::rng();
            while !monitor.is_terminated() {
                let slot = rng.random_range(0..player.table_size);
                if player.submit_selection(slot) == Submission::Dropped {
                    player
                        .inbox
                        .wait_for_space(monitor.terminated_flag(), AI_BACKOFF);
                }
            }
            info!("{} input generator terminated", player.name);
        })
}
