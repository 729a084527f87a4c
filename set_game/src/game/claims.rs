//! Pending claims, in submission order.

use super::entities::{Card, PlayerId};
use std::collections::VecDeque;

/// A player asking the dealer to judge its three tokens.
///
/// The request carries no cards. The dealer re-reads the player's tokens when
/// it gets to the request, which may be long after it was queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimRequest {
    pub player: PlayerId,
    /// Submission order, increasing across the whole game.
    pub ticket: u64,
}

/// How the dealer settled a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Legal set: one point, cards discarded.
    Point {
        request: ClaimRequest,
        cards: [Card; 3],
    },
    /// Three tokens on occupied slots, but not a set.
    Penalty {
        request: ClaimRequest,
        cards: [Card; 3],
    },
    /// The tokens no longer describe a claim. The player just resumes.
    Stale { request: ClaimRequest },
}

impl ClaimOutcome {
    pub fn request(&self) -> ClaimRequest {
        match *self {
            Self::Point { request, .. } | Self::Penalty { request, .. } => request,
            Self::Stale { request } => request,
        }
    }
}

/// Unbounded FIFO of claims. Players push, only the dealer pops.
///
/// The queue itself is not synchronised; it lives inside the game-wide
/// monitor so that queueing a claim and parking the claimant happen
/// atomically.
#[derive(Debug, Default)]
pub struct ClaimQueue {
    pending: VecDeque<ClaimRequest>,
    next_ticket: u64,
}

impl ClaimQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, player: PlayerId) -> ClaimRequest {
        let request = ClaimRequest {
            player,
            ticket: self.next_ticket,
        };
        self.next_ticket += 1;
        self.pending.push_back(request);
        request
    }

    pub fn pop(&mut self) -> Option<ClaimRequest> {
        self.pending.pop_front()
    }

    /// Drop every pending claim, oldest first.
    pub fn drain(&mut self) -> Vec<ClaimRequest> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
