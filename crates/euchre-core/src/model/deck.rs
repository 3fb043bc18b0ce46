use crate::model::card::Card;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

pub const DECK_SIZE: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeckError {
    #[error("deck holds {0} cards, expected 24")]
    WrongSize(usize),
    #[error("{0} appears more than once")]
    Duplicate(Card),
}

#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::ALL.iter().copied() {
            for rank in Rank::ORDERED.iter().copied() {
                cards.push(Card::new(rank, suit));
            }
        }
        Self { cards }
    }

    /// Stacked deck in the given order, used for scripted deals.
    ///
    /// The cards must be the full 24-card deck with no repeats.
    pub fn from_cards(cards: Vec<Card>) -> Result<Self, DeckError> {
        if cards.len() != DECK_SIZE {
            return Err(DeckError::WrongSize(cards.len()));
        }
        let mut seen = Vec::with_capacity(DECK_SIZE);
        for card in cards.iter().copied() {
            if seen.contains(&card) {
                return Err(DeckError::Duplicate(card));
            }
            seen.push(card);
        }
        Ok(Self { cards })
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    pub fn shuffle_in_place<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

#[cfg(test)]
mod tests {
    use super::{DECK_SIZE, Deck, DeckError};
    use crate::model::card::Card;
    use std::collections::HashSet;

    #[test]
    fn standard_deck_has_24_unique_cards() {
        let deck = Deck::standard();
        assert_eq!(deck.cards().len(), DECK_SIZE);
        let unique: HashSet<_> = deck.cards().iter().copied().collect();
        assert_eq!(unique.len(), DECK_SIZE);
    }

    #[test]
    fn shuffle_with_seed_is_deterministic() {
        let deck_a = Deck::shuffled_with_seed(42);
        let deck_b = Deck::shuffled_with_seed(42);
        assert_eq!(deck_a.cards(), deck_b.cards());
    }

    #[test]
    fn shuffle_with_different_seeds_differs() {
        let deck_a = Deck::shuffled_with_seed(1);
        let deck_b = Deck::shuffled_with_seed(2);
        assert_ne!(deck_a.cards(), deck_b.cards());
    }

    #[test]
    fn stacked_deck_must_hold_every_card_once() {
        let mut cards = Deck::standard().cards().to_vec();
        cards.reverse();
        let stacked = Deck::from_cards(cards.clone()).expect("full deck accepted");
        assert_eq!(stacked.cards(), cards.as_slice());

        let short: Vec<Card> = cards.iter().copied().take(20).collect();
        assert_eq!(
            Deck::from_cards(short).unwrap_err(),
            DeckError::WrongSize(20)
        );

        let mut repeated = cards.clone();
        repeated[23] = repeated[0];
        assert_eq!(
            Deck::from_cards(repeated).unwrap_err(),
            DeckError::Duplicate(cards[0])
        );
    }
}
