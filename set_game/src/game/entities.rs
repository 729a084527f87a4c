use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type alias for table positions.
pub type Slot = usize;

/// Type alias for player identities. Players are numbered from zero and
/// keep their id for the whole game.
pub type PlayerId = usize;

/// A card is an immutable identifier in `0..deck_size`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub usize);

impl Card {
    pub fn id(self) -> usize {
        self.0
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:02}", self.0)
    }
}

/// Run state of a player thread.
///
/// Every player starts out `Waiting`. Only the dealer moves a player into
/// `Point` or `Penalty`; the player moves itself back to `Running` once its
/// freeze elapses.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum PlayerState {
    #[default]
    Waiting,
    Running,
    Point,
    Penalty,
}

impl PlayerState {
    pub fn is_frozen(self) -> bool {
        matches!(self, Self::Point | Self::Penalty)
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::Running => "running",
            Self::Point => "point",
            Self::Penalty => "penalty",
        };
        write!(f, "{repr}")
    }
}

/// The dealer's private stock of cards that are not on the table.
///
/// Cards won by a legal claim go to the discard pile and never come back.
#[derive(Debug)]
pub struct Deck {
    cards: Vec<Card>,
    discarded: Vec<Card>,
}

impl Deck {
    pub fn new(deck_size: usize) -> Self {
        Self {
            cards: (0..deck_size).map(Card).collect(),
            discarded: Vec::new(),
        }
    }

    /// Build a deck holding exactly the given cards, in order.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self {
            cards,
            discarded: Vec::new(),
        }
    }

    pub fn deal_card(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn return_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn discard(&mut self, card: Card) {
        self.discarded.push(card);
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn discarded(&self) -> &[Card] {
        &self.discarded
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
