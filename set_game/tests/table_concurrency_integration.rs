//! Concurrent access to the shared table.
//!
//! Several threads hammer the same slots with key presses while another
//! removes and re-deals cards; afterwards the table must still be consistent.

use set_game::{Card, MAX_TOKENS, NullDisplay, game::table::Table};
use std::{sync::Arc, thread};

const SLOTS: usize = 12;
const PLAYERS: usize = 4;

#[test]
fn test_concurrent_toggles_respect_token_limit() {
    let table = Arc::new(Table::new(SLOTS, 81, PLAYERS, Arc::new(NullDisplay)));
    for slot in 0..SLOTS {
        table.place_card(Card(slot), slot);
    }

    let workers: Vec<_> = (0..PLAYERS)
        .map(|player| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for i in 0..5_000 {
                    table.toggle_token(player, (i * 7 + player) % SLOTS);
                    assert!(table.count_tokens(player) <= MAX_TOKENS);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    for player in 0..PLAYERS {
        assert!(table.count_tokens(player) <= MAX_TOKENS);
    }
}

#[test]
fn test_removals_race_with_toggles() {
    let table = Arc::new(Table::new(SLOTS, 81, PLAYERS, Arc::new(NullDisplay)));
    for slot in 0..SLOTS {
        table.place_card(Card(slot), slot);
    }

    let dealer = {
        let table = Arc::clone(&table);
        thread::spawn(move || {
            for i in 0..2_000 {
                let slot = i % SLOTS;
                if let Some(card) = table.remove_card(slot) {
                    table.place_card(card, slot);
                }
            }
        })
    };
    let players: Vec<_> = (0..PLAYERS)
        .map(|player| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for i in 0..5_000 {
                    table.toggle_token(player, (i + player * 3) % SLOTS);
                }
            })
        })
        .collect();

    dealer.join().unwrap();
    for player in players {
        player.join().unwrap();
    }

    assert_eq!(table.count_cards(), SLOTS);
    for slot in 0..SLOTS {
        assert_eq!(table.card_at(slot), Some(Card(slot)));
    }
    for player in 0..PLAYERS {
        assert!(table.count_tokens(player) <= MAX_TOKENS);
        for slot in table.token_slots(player) {
            assert!(table.card_at(slot).is_some());
        }
    }
}
