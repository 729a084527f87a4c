//! Keyboard layout for players sharing one keyboard.
//!
//! Each player owns a 4x3 block of keys mirroring the 12 table slots,
//! read row by row.

use set_game::{PlayerId, Slot};
use std::fmt;

/// Table slots covered by one player's block.
pub const SLOTS: usize = 12;

/// Players the layout has room for.
pub const PLAYERS: usize = LAYOUT.len();

const LAYOUT: [[char; SLOTS]; 2] = [
    ['q', 'w', 'e', 'r', 'a', 's', 'd', 'f', 'z', 'x', 'c', 'v'],
    ['u', 'i', 'o', 'p', 'j', 'k', 'l', ';', 'm', ',', '.', '/'],
];

/// Errors that can occur during key parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The key belongs to no player's block.
    Unmapped(char),
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unmapped(key) => write!(
                f,
                "Key '{}' is not bound. Player 1 uses qwer/asdf/zxcv, player 2 uses uiop/jkl;/m,./",
                key.escape_default()
            ),
        }
    }
}

impl std::error::Error for KeyError {}

/// Map one key press to the player and slot it selects. Letters are
/// case-insensitive.
pub fn key_to_selection(key: char) -> Result<(PlayerId, Slot), KeyError> {
    let lower = key.to_ascii_lowercase();
    LAYOUT
        .iter()
        .enumerate()
        .find_map(|(player, keys)| {
            keys.iter()
                .position(|&k| k == lower)
                .map(|slot| (player, slot))
        })
        .ok_or(KeyError::Unmapped(key))
}

/// Map every non-whitespace key of an input line, in order.
pub fn parse_line(line: &str) -> impl Iterator<Item = Result<(PlayerId, Slot), KeyError>> + '_ {
    line.chars()
        .filter(|c| !c.is_whitespace())
        .map(key_to_selection)
}
