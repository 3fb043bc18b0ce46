use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A playing card. Identity is the `(rank, suit)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub const fn is_right_bower(self, trump: Suit) -> bool {
        matches!(self.rank, Rank::Jack) && self.suit as u8 == trump as u8
    }

    pub const fn is_left_bower(self, trump: Suit) -> bool {
        matches!(self.rank, Rank::Jack) && self.suit as u8 == trump.same_color() as u8
    }

    /// Dense index in `0..24`, suit-major.
    pub const fn to_id(self) -> u8 {
        self.suit as u8 * 6 + self.rank.strength() - 1
    }

    pub const fn from_id(id: u8) -> Option<Self> {
        if id >= 24 {
            return None;
        }
        let suit = match Suit::from_index((id / 6) as usize) {
            Some(suit) => suit,
            None => return None,
        };
        match Rank::from_value(id % 6 + 9) {
            Some(rank) => Some(Card::new(rank, suit)),
            None => None,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse card from {0:?}")]
pub struct ParseCardError(pub String);

impl FromStr for Card {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let suit_char = chars
            .next_back()
            .ok_or_else(|| ParseCardError(s.to_string()))?;
        let suit = Suit::from_letter(suit_char).ok_or_else(|| ParseCardError(s.to_string()))?;
        let rank = Rank::parse(chars.as_str()).ok_or_else(|| ParseCardError(s.to_string()))?;
        Ok(Card::new(rank, suit))
    }
}

#[cfg(test)]
mod tests {
    use super::{Card, Rank, Suit};

    #[test]
    fn bowers_follow_trump_colour() {
        let jack_hearts = Card::new(Rank::Jack, Suit::Hearts);
        let jack_diamonds = Card::new(Rank::Jack, Suit::Diamonds);
        assert!(jack_hearts.is_right_bower(Suit::Hearts));
        assert!(jack_diamonds.is_left_bower(Suit::Hearts));
        assert!(!jack_diamonds.is_right_bower(Suit::Hearts));
        assert!(!jack_hearts.is_left_bower(Suit::Clubs));
    }

    #[test]
    fn ids_cover_the_deck() {
        for id in 0..24u8 {
            let card = Card::from_id(id).expect("valid id");
            assert_eq!(card.to_id(), id);
        }
        assert_eq!(Card::from_id(24), None);
    }

    #[test]
    fn parses_display_form() {
        let ten: Card = "10S".parse().unwrap();
        assert_eq!(ten, Card::new(Rank::Ten, Suit::Spades));
        assert_eq!(ten.to_string(), "10S");
        assert_eq!("J♦".parse::<Card>().unwrap(), Card::new(Rank::Jack, Suit::Diamonds));
        assert!("1X".parse::<Card>().is_err());
        assert!("".parse::<Card>().is_err());
    }
}
