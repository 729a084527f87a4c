//! Set legality oracle.
//!
//! Three cards form a Set when, for every feature, their values are either
//! all the same or all different. Card ids encode their features as digits in
//! base `feature_size`, least significant feature first.

use crate::config::GameConfig;
use crate::game::entities::Card;

pub trait SetValidator: Send + Sync {
    fn is_legal_set(&self, cards: &[Card; 3]) -> bool;

    /// Every legal triple among `cards`, stopping after `limit` are found.
    fn find_sets(&self, cards: &[Card], limit: usize) -> Vec<[Card; 3]> {
        let mut found = Vec::new();
        if limit == 0 {
            return found;
        }
        for i in 0..cards.len() {
            for j in i + 1..cards.len() {
                for k in j + 1..cards.len() {
                    let triple = [cards[i], cards[j], cards[k]];
                    if self.is_legal_set(&triple) {
                        found.push(triple);
                        if found.len() == limit {
                            return found;
                        }
                    }
                }
            }
        }
        found
    }

    fn any_legal_set_exists(&self, cards: &[Card]) -> bool {
        !self.find_sets(cards, 1).is_empty()
    }
}

impl<F> SetValidator for F
where
    F: Fn(&[Card; 3]) -> bool + Send + Sync,
{
    fn is_legal_set(&self, cards: &[Card; 3]) -> bool {
        self(cards)
    }
}

/// The classic rule over `feature_count` features of `feature_size` values each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureValidator {
    feature_count: u32,
    feature_size: usize,
}

impl FeatureValidator {
    pub fn new(feature_count: u32, feature_size: usize) -> Self {
        Self {
            feature_count,
            feature_size,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.feature_count, config.feature_size)
    }

    /// Decode a card id into its feature values.
    pub fn card_features(&self, card: Card) -> Vec<usize> {
        let mut id = card.id();
        (0..self.feature_count)
            .map(|_| {
                let value = id % self.feature_size;
                id /= self.feature_size;
                value
            })
            .collect()
    }
}

impl Default for FeatureValidator {
    fn default() -> Self {
        Self::new(4, 3)
    }
}

impl SetValidator for FeatureValidator {
    fn is_legal_set(&self, cards: &[Card; 3]) -> bool {
        let [a, b, c] = *cards;
        if a == b || b == c || a == c {
            return false;
        }
        let (fa, fb, fc) = (
            self.card_features(a),
            self.card_features(b),
            self.card_features(c),
        );
        fa.iter().zip(&fb).zip(&fc).all(|((x, y), z)| {
            let all_same = x == y && y == z;
            let all_different = x != y && y != z && x != z;
            all_same || all_different
        })
    }
}
