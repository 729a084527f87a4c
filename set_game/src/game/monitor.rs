//! Game-wide monitor.
//!
//! One lock guards every player's run state together with the claim queue,
//! and one condition variable carries every state change. The dealer
//! broadcasts through it; players park on it while `Waiting`; a player that
//! queues a claim wakes the dealer through it. Per-player input locks are a
//! separate domain and are never taken while this lock is held.

use super::{
    claims::{ClaimQueue, ClaimRequest},
    entities::{PlayerId, PlayerState},
};
use parking_lot::{Condvar, Mutex};
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

#[derive(Debug)]
struct Shared {
    states: Vec<PlayerState>,
    claims: ClaimQueue,
}

#[derive(Debug)]
pub struct GameMonitor {
    shared: Mutex<Shared>,
    changed: Condvar,
    terminated: AtomicBool,
}

impl GameMonitor {
    pub fn new(players: usize) -> Self {
        Self {
            shared: Mutex::new(Shared {
                states: vec![PlayerState::Waiting; players],
                claims: ClaimQueue::new(),
            }),
            changed: Condvar::new(),
            terminated: AtomicBool::new(false),
        }
    }

    pub fn state(&self, player: PlayerId) -> PlayerState {
        self.shared.lock().states[player]
    }

    pub fn states(&self) -> Vec<PlayerState> {
        self.shared.lock().states.clone()
    }

    pub fn set_state(&self, player: PlayerId, state: PlayerState) {
        let mut shared = self.shared.lock();
        shared.states[player] = state;
        self.changed.notify_all();
    }

    /// Move every player to `state` in one step.
    pub fn broadcast(&self, state: PlayerState) {
        let mut shared = self.shared.lock();
        shared.states.fill(state);
        self.changed.notify_all();
    }

    /// Queue a claim for `player` and park it, atomically.
    pub fn submit_claim(&self, player: PlayerId) -> ClaimRequest {
        let mut shared = self.shared.lock();
        shared.states[player] = PlayerState::Waiting;
        let request = shared.claims.push(player);
        self.changed.notify_all();
        request
    }

    pub fn take_claim(&self) -> Option<ClaimRequest> {
        self.shared.lock().claims.pop()
    }

    pub fn pending_claims(&self) -> usize {
        self.shared.lock().claims.len()
    }

    /// Park every player and drop claims left over from the round.
    pub fn reset_round(&self) -> Vec<ClaimRequest> {
        let mut shared = self.shared.lock();
        shared.states.fill(PlayerState::Waiting);
        let dropped = shared.claims.drain();
        self.changed.notify_all();
        dropped
    }

    /// Leave a freeze. Only applies if the dealer has not moved the player
    /// elsewhere in the meantime.
    pub fn finish_freeze(&self, player: PlayerId, frozen: PlayerState) -> bool {
        self.resume_from(player, frozen)
    }

    /// Resume a player whose claim turned out obsolete. A player the dealer
    /// has since frozen stays frozen.
    pub fn resume_claimant(&self, player: PlayerId) -> bool {
        self.resume_from(player, PlayerState::Waiting)
    }

    fn resume_from(&self, player: PlayerId, expected: PlayerState) -> bool {
        let mut shared = self.shared.lock();
        if shared.states[player] != expected {
            return false;
        }
        shared.states[player] = PlayerState::Running;
        self.changed.notify_all();
        true
    }

    /// Block while `player` is `Waiting`, then report its state.
    /// Returns `Waiting` only once the game is terminating.
    pub fn await_turn(&self, player: PlayerId) -> PlayerState {
        let mut shared = self.shared.lock();
        while shared.states[player] == PlayerState::Waiting && !self.is_terminated() {
            self.changed.wait(&mut shared);
        }
        shared.states[player]
    }

    /// Dealer tick: sleep up to `tick`, waking early on any state change or
    /// new claim.
    pub fn wait_tick(&self, tick: Duration) {
        let mut shared = self.shared.lock();
        if !self.is_terminated() {
            self.changed.wait_for(&mut shared, tick);
        }
    }

    /// One-way. Wakes everything parked on the monitor.
    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::Release);
        let _shared = self.shared.lock();
        self.changed.notify_all();
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    pub(crate) fn terminated_flag(&self) -> &AtomicBool {
        &self.terminated
    }
}
