//! Display callback surface.
//!
//! The engine never renders anything itself. It reports countdowns, freezes,
//! scores, table movement and the final result through [`GameDisplay`], and
//! the front-end decides what to do with them. Callbacks may be invoked from
//! any game thread, sometimes while the table lock is held, so an
//! implementation must not call back into the engine.

use crate::game::{
    claims::ClaimOutcome,
    entities::{Card, PlayerId, Slot},
};
use log::{debug, info};
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

pub trait GameDisplay: Send + Sync {
    /// Remaining round time; `warn` is set once the warning threshold is crossed.
    fn set_countdown(&self, remaining: Duration, warn: bool);

    /// Remaining freeze time of a player. Zero clears the freeze.
    fn set_freeze(&self, player: PlayerId, remaining: Duration);

    fn set_score(&self, player: PlayerId, score: u32);

    fn announce_winners(&self, winners: &[PlayerId]);

    fn place_card(&self, _card: Card, _slot: Slot) {}

    fn remove_card(&self, _slot: Slot) {}

    fn place_token(&self, _player: PlayerId, _slot: Slot) {}

    fn remove_token(&self, _player: PlayerId, _slot: Slot) {}

    /// The dealer finished judging a claim.
    fn claim_settled(&self, _outcome: &ClaimOutcome) {}
}

/// Discards every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl GameDisplay for NullDisplay {
    fn set_countdown(&self, _remaining: Duration, _warn: bool) {}

    fn set_freeze(&self, _player: PlayerId, _remaining: Duration) {}

    fn set_score(&self, _player: PlayerId, _score: u32) {}

    fn announce_winners(&self, _winners: &[PlayerId]) {}
}

/// Renders the game as log lines.
///
/// The countdown is reported once per whole second so the dealer tick does not
/// flood the log.
#[derive(Debug)]
pub struct LogDisplay {
    names: Vec<String>,
    last_countdown_secs: AtomicU64,
}

impl LogDisplay {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            last_countdown_secs: AtomicU64::new(u64::MAX),
        }
    }

    fn name(&self, player: PlayerId) -> String {
        self.names
            .get(player)
            .cloned()
            .unwrap_or_else(|| format!("Player {}", player + 1))
    }
}

impl GameDisplay for LogDisplay {
    fn set_countdown(&self, remaining: Duration, warn: bool) {
        let secs = remaining.as_secs();
        if self.last_countdown_secs.swap(secs, Ordering::Relaxed) == secs {
            return;
        }
        if warn {
            info!("!! {}.{:01}s left", secs, remaining.subsec_millis() / 100);
        } else {
            info!("{secs}s left");
        }
    }

    fn set_freeze(&self, player: PlayerId, remaining: Duration) {
        if remaining.is_zero() {
            debug!("{} unfrozen", self.name(player));
        } else {
            info!(
                "{} frozen for {:.1}s",
                self.name(player),
                remaining.as_secs_f32()
            );
        }
    }

    fn set_score(&self, player: PlayerId, score: u32) {
        info!("{} scored, now at {score}", self.name(player));
    }

    fn announce_winners(&self, winners: &[PlayerId]) {
        let names: Vec<String> = winners.iter().map(|&p| self.name(p)).collect();
        match names.len() {
            0 => info!("Game over, no winner"),
            1 => info!("Game over, {} wins", names[0]),
            _ => info!("Game over, tie between {}", names.join(", ")),
        }
    }

    fn place_card(&self, card: Card, slot: Slot) {
        debug!("card {card} dealt to slot {slot}");
    }

    fn remove_card(&self, slot: Slot) {
        debug!("slot {slot} cleared");
    }

    fn place_token(&self, player: PlayerId, slot: Slot) {
        debug!("{} marked slot {slot}", self.name(player));
    }

    fn remove_token(&self, player: PlayerId, slot: Slot) {
        debug!("{} unmarked slot {slot}", self.name(player));
    }

    fn claim_settled(&self, outcome: &ClaimOutcome) {
        let request = outcome.request();
        let verdict = match outcome {
            ClaimOutcome::Point { .. } => "point",
            ClaimOutcome::Penalty { .. } => "penalty",
            ClaimOutcome::Stale { .. } => "obsolete",
        };
        debug!(
            "{} claim #{}: {verdict}",
            self.name(request.player),
            request.ticket
        );
    }
}
