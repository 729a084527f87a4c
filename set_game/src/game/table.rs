//! Shared table state: which card sits in which slot, and which player has
//! marked which slot.
//!
//! All mutations go through one lock, so removing a card and touching a
//! token on the same slot can never interleave. Display callbacks fire while
//! that lock is held, which keeps their order consistent with the table.

use super::entities::{Card, PlayerId, Slot};
use crate::display::GameDisplay;
use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;

/// Maximum number of tokens a player may have on the table.
pub const MAX_TOKENS: usize = 3;

/// Result of a key press applied to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenToggle {
    /// A token was placed; `tokens` is the player's new token count.
    Placed { tokens: usize },
    /// The player's existing token was lifted.
    Removed { tokens: usize },
    /// The slot is empty, or the player already has [`MAX_TOKENS`] tokens.
    Rejected,
}

/// Whether a player's tokens still describe a claim the dealer can judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimCheck {
    /// Exactly three tokens, each on an occupied slot.
    Valid([Card; 3]),
    /// Tokens were lifted or their cards removed since the claim was queued.
    Stale,
}

/// One boolean per (player, slot). Both traversal orders read the same cells.
#[derive(Debug, Clone)]
struct TokenMatrix {
    slots: usize,
    marks: Vec<bool>,
}

impl TokenMatrix {
    fn new(players: usize, slots: usize) -> Self {
        Self {
            slots,
            marks: vec![false; players * slots],
        }
    }

    fn index(&self, player: PlayerId, slot: Slot) -> usize {
        player * self.slots + slot
    }

    fn get(&self, player: PlayerId, slot: Slot) -> bool {
        self.marks[self.index(player, slot)]
    }

    fn set(&mut self, player: PlayerId, slot: Slot, marked: bool) {
        let idx = self.index(player, slot);
        self.marks[idx] = marked;
    }

    fn players(&self) -> usize {
        self.marks.len() / self.slots
    }

    /// Slots marked by `player`, in slot order.
    fn by_player(&self, player: PlayerId) -> impl Iterator<Item = Slot> + '_ {
        (0..self.slots).filter(move |&slot| self.get(player, slot))
    }

    /// Players with a token on `slot`, in id order.
    fn by_slot(&self, slot: Slot) -> impl Iterator<Item = PlayerId> + '_ {
        (0..self.players()).filter(move |&player| self.get(player, slot))
    }

    fn count(&self, player: PlayerId) -> usize {
        self.by_player(player).count()
    }
}

#[derive(Debug)]
struct Grid {
    slot_to_card: Vec<Option<Card>>,
    card_to_slot: Vec<Option<Slot>>,
    tokens: TokenMatrix,
}

impl Grid {
    fn check_invariants(&self) {
        for slot in 0..self.slot_to_card.len() {
            debug_assert!(
                self.slot_to_card[slot].is_some() || self.tokens.by_slot(slot).next().is_none(),
                "token left on empty slot {slot}"
            );
        }
        for player in 0..self.tokens.players() {
            debug_assert!(
                self.tokens.count(player) <= MAX_TOKENS,
                "player {player} holds more than {MAX_TOKENS} tokens"
            );
        }
    }
}

pub struct Table {
    grid: Mutex<Grid>,
    display: Arc<dyn GameDisplay>,
}

impl Table {
    pub fn new(
        table_size: usize,
        deck_size: usize,
        players: usize,
        display: Arc<dyn GameDisplay>,
    ) -> Self {
        Self {
            grid: Mutex::new(Grid {
                slot_to_card: vec![None; table_size],
                card_to_slot: vec![None; deck_size],
                tokens: TokenMatrix::new(players, table_size),
            }),
            display,
        }
    }

    pub fn size(&self) -> usize {
        self.grid.lock().slot_to_card.len()
    }

    /// Put `card` on an empty slot.
    pub fn place_card(&self, card: Card, slot: Slot) {
        let mut grid = self.grid.lock();
        debug_assert!(grid.slot_to_card[slot].is_none(), "slot {slot} is occupied");
        debug_assert!(grid.card_to_slot[card.id()].is_none(), "{card} already dealt");

        grid.slot_to_card[slot] = Some(card);
        grid.card_to_slot[card.id()] = Some(slot);
        self.display.place_card(card, slot);
    }

    /// Take the card off `slot`, lifting every player's token on it.
    pub fn remove_card(&self, slot: Slot) -> Option<Card> {
        let mut grid = self.grid.lock();
        let card = grid.slot_to_card[slot].take()?;
        grid.card_to_slot[card.id()] = None;

        let holders: Vec<PlayerId> = grid.tokens.by_slot(slot).collect();
        for player in holders {
            grid.tokens.set(player, slot, false);
            self.display.remove_token(player, slot);
        }
        self.display.remove_card(slot);
        grid.check_invariants();
        debug!("{card} removed from slot {slot}");
        Some(card)
    }

    /// Mark `slot` for `player`. The caller checks that the slot holds a
    /// card and that the player has fewer than [`MAX_TOKENS`] tokens.
    pub fn place_token(&self, player: PlayerId, slot: Slot) {
        let mut grid = self.grid.lock();
        grid.tokens.set(player, slot, true);
        self.display.place_token(player, slot);
        grid.check_invariants();
    }

    /// Returns whether a token was actually lifted.
    pub fn remove_token(&self, player: PlayerId, slot: Slot) -> bool {
        let mut grid = self.grid.lock();
        if !grid.tokens.get(player, slot) {
            return false;
        }
        grid.tokens.set(player, slot, false);
        self.display.remove_token(player, slot);
        true
    }

    /// Apply a key press: lift the player's token on `slot` if there is one,
    /// otherwise place one if the slot is occupied and the player has room.
    /// The check and the mutation happen under the same lock.
    pub fn toggle_token(&self, player: PlayerId, slot: Slot) -> TokenToggle {
        let mut grid = self.grid.lock();
        if grid.tokens.get(player, slot) {
            grid.tokens.set(player, slot, false);
            self.display.remove_token(player, slot);
            return TokenToggle::Removed {
                tokens: grid.tokens.count(player),
            };
        }

        let tokens = grid.tokens.count(player);
        if grid.slot_to_card[slot].is_none() || tokens >= MAX_TOKENS {
            return TokenToggle::Rejected;
        }

        grid.tokens.set(player, slot, true);
        self.display.place_token(player, slot);
        grid.check_invariants();
        TokenToggle::Placed { tokens: tokens + 1 }
    }

    /// Lift every token `player` has on the table.
    pub fn clear_tokens(&self, player: PlayerId) -> usize {
        let mut grid = self.grid.lock();
        let slots: Vec<Slot> = grid.tokens.by_player(player).collect();
        for &slot in &slots {
            grid.tokens.set(player, slot, false);
            self.display.remove_token(player, slot);
        }
        slots.len()
    }

    pub fn count_tokens(&self, player: PlayerId) -> usize {
        self.grid.lock().tokens.count(player)
    }

    pub fn has_token(&self, player: PlayerId, slot: Slot) -> bool {
        self.grid.lock().tokens.get(player, slot)
    }

    /// Slots marked by `player`.
    pub fn token_slots(&self, player: PlayerId) -> Vec<Slot> {
        self.grid.lock().tokens.by_player(player).collect()
    }

    /// Players with a token on `slot`.
    pub fn token_holders(&self, slot: Slot) -> Vec<PlayerId> {
        self.grid.lock().tokens.by_slot(slot).collect()
    }

    pub fn count_cards(&self) -> usize {
        self.grid
            .lock()
            .slot_to_card
            .iter()
            .filter(|c| c.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.count_cards() == 0
    }

    pub fn card_at(&self, slot: Slot) -> Option<Card> {
        self.grid.lock().slot_to_card.get(slot).copied().flatten()
    }

    pub fn slot_of(&self, card: Card) -> Option<Slot> {
        self.grid.lock().card_to_slot.get(card.id()).copied().flatten()
    }

    pub fn empty_slots(&self) -> Vec<Slot> {
        let grid = self.grid.lock();
        (0..grid.slot_to_card.len())
            .filter(|&slot| grid.slot_to_card[slot].is_none())
            .collect()
    }

    /// Cards currently dealt, in slot order.
    pub fn cards(&self) -> Vec<Card> {
        self.grid.lock().slot_to_card.iter().flatten().copied().collect()
    }

    /// Re-read `player`'s tokens and decide whether they still form a claim.
    pub fn claimed_cards(&self, player: PlayerId) -> ClaimCheck {
        let grid = self.grid.lock();
        let cards: Vec<Card> = grid
            .tokens
            .by_player(player)
            .filter_map(|slot| grid.slot_to_card[slot])
            .collect();
        let tokens = grid.tokens.count(player);

        match <[Card; 3]>::try_from(cards) {
            Ok(cards) if tokens == MAX_TOKENS => ClaimCheck::Valid(cards),
            _ => ClaimCheck::Stale,
        }
    }
}
