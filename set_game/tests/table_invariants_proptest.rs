/// Property-based tests for the shared table using proptest
///
/// Random sequences of deals, removals and key presses are applied to a
/// `Table` and to a plain model of it; after every step both must agree and
/// the token rules must hold.
use proptest::prelude::*;
use set_game::{Card, MAX_TOKENS, NullDisplay, PlayerId, Slot, TokenToggle, game::table::Table};
use std::{collections::BTreeSet, sync::Arc};

const SLOTS: usize = 12;
const PLAYERS: usize = 3;
const DECK: usize = 81;

#[derive(Debug, Clone)]
enum Op {
    Deal(Slot),
    Remove(Slot),
    Toggle(PlayerId, Slot),
    Clear(PlayerId),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..SLOTS).prop_map(Op::Deal),
        1 => (0..SLOTS).prop_map(Op::Remove),
        6 => (0..PLAYERS, 0..SLOTS).prop_map(|(p, s)| Op::Toggle(p, s)),
        1 => (0..PLAYERS).prop_map(Op::Clear),
    ]
}

#[derive(Default)]
struct Model {
    cards: [Option<Card>; SLOTS],
    tokens: [BTreeSet<Slot>; PLAYERS],
    next_card: usize,
}

impl Model {
    fn apply(&mut self, table: &Table, op: &Op) -> Result<(), TestCaseError> {
        match *op {
            Op::Deal(slot) => {
                if self.cards[slot].is_none() && self.next_card < DECK {
                    let card = Card(self.next_card);
                    self.next_card += 1;
                    table.place_card(card, slot);
                    self.cards[slot] = Some(card);
                }
            }
            Op::Remove(slot) => {
                let removed = table.remove_card(slot);
                prop_assert_eq!(removed, self.cards[slot].take());
                for tokens in &mut self.tokens {
                    tokens.remove(&slot);
                }
            }
            Op::Toggle(player, slot) => {
                let expected = if self.tokens[player].remove(&slot) {
                    TokenToggle::Removed {
                        tokens: self.tokens[player].len(),
                    }
                } else if self.cards[slot].is_some() && self.tokens[player].len() < MAX_TOKENS {
                    self.tokens[player].insert(slot);
                    TokenToggle::Placed {
                        tokens: self.tokens[player].len(),
                    }
                } else {
                    TokenToggle::Rejected
                };
                prop_assert_eq!(table.toggle_token(player, slot), expected);
            }
            Op::Clear(player) => {
                let cleared = table.clear_tokens(player);
                prop_assert_eq!(cleared, self.tokens[player].len());
                self.tokens[player].clear();
            }
        }
        Ok(())
    }

    fn check(&self, table: &Table) -> Result<(), TestCaseError> {
        for slot in 0..SLOTS {
            prop_assert_eq!(table.card_at(slot), self.cards[slot]);
            if let Some(card) = self.cards[slot] {
                prop_assert_eq!(table.slot_of(card), Some(slot));
            } else {
                prop_assert!(table.token_holders(slot).is_empty(), "token on empty slot {}", slot);
            }
        }
        for player in 0..PLAYERS {
            let slots: Vec<Slot> = self.tokens[player].iter().copied().collect();
            prop_assert_eq!(table.token_slots(player), slots);
            prop_assert!(table.count_tokens(player) <= MAX_TOKENS);
        }
        prop_assert_eq!(
            table.count_cards(),
            self.cards.iter().filter(|c| c.is_some()).count()
        );
        Ok(())
    }
}

proptest! {
    #[test]
    fn test_table_matches_model(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let table = Table::new(SLOTS, DECK, PLAYERS, Arc::new(NullDisplay));
        let mut model = Model::default();
        for op in &ops {
            model.apply(&table, op)?;
            model.check(&table)?;
        }
    }

    #[test]
    fn test_toggle_twice_restores_tokens(
        setup in prop::collection::vec(0..SLOTS, 0..3),
        slot in 0..SLOTS,
    ) {
        let table = Table::new(SLOTS, DECK, 1, Arc::new(NullDisplay));
        for s in 0..SLOTS {
            table.place_card(Card(s), s);
        }
        for s in setup {
            table.toggle_token(0, s);
        }

        let before = table.token_slots(0);
        let first = table.toggle_token(0, slot);
        let second = table.toggle_token(0, slot);
        if first != TokenToggle::Rejected {
            prop_assert_eq!(table.token_slots(0), before);
            prop_assert_ne!(second, TokenToggle::Rejected);
        } else {
            prop_assert_eq!(second, TokenToggle::Rejected);
        }
    }

    #[test]
    fn test_removing_a_card_lifts_every_token_on_it(
        presses in prop::collection::vec((0..PLAYERS, 0..SLOTS), 0..30),
        slot in 0..SLOTS,
    ) {
        let table = Table::new(SLOTS, DECK, PLAYERS, Arc::new(NullDisplay));
        for s in 0..SLOTS {
            table.place_card(Card(s), s);
        }
        for (player, s) in presses {
            table.toggle_token(player, s);
        }

        let counts: Vec<usize> = (0..PLAYERS).map(|p| table.count_tokens(p)).collect();
        let holders = table.token_holders(slot);
        prop_assert_eq!(table.remove_card(slot), Some(Card(slot)));
        prop_assert!(table.token_holders(slot).is_empty());
        for player in 0..PLAYERS {
            let lifted = usize::from(holders.contains(&player));
            prop_assert_eq!(table.count_tokens(player), counts[player] - lifted);
        }
    }
}
