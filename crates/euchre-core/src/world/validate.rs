use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::player::PlayerPosition;
use crate::model::round::{CARDS_IN_PLAY, HAND_SIZE};
use core::fmt;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardLocation {
    Hand(PlayerPosition),
    Played,
    Trick,
}

impl fmt::Display for CardLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardLocation::Hand(seat) => write!(f, "hand {seat}"),
            CardLocation::Played => f.write_str("played"),
            CardLocation::Trick => f.write_str("trick"),
        }
    }
}

/// A world that breaks card conservation. Always a defect in the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("hand of {seat} holds {size} cards")]
    HandTooLarge { seat: PlayerPosition, size: usize },
    #[error("trick holds {0} cards")]
    TrickTooLarge(usize),
    #[error("card {card} duplicated: first at {first}, again at {again}")]
    Duplicate {
        card: Card,
        first: CardLocation,
        again: CardLocation,
    },
    #[error("card count is {0}, expected 20")]
    CardCount(usize),
}

/// Checks that hands, played pile and open trick partition exactly twenty distinct cards.
pub fn validate_world(
    hands: &[Hand; 4],
    played: &[Card],
    trick: &[Card],
) -> Result<(), InvariantViolation> {
    let mut seen: HashMap<Card, CardLocation> = HashMap::with_capacity(CARDS_IN_PLAY);
    let mut add = |card: Card, location: CardLocation| match seen.insert(card, location) {
        Some(first) => Err(InvariantViolation::Duplicate {
            card,
            first,
            again: location,
        }),
        None => Ok(()),
    };

    for seat in PlayerPosition::LOOP {
        let hand = &hands[seat.index()];
        if hand.len() > HAND_SIZE {
            return Err(InvariantViolation::HandTooLarge {
                seat,
                size: hand.len(),
            });
        }
        for card in hand.iter() {
            add(*card, CardLocation::Hand(seat))?;
        }
    }
    for card in played {
        add(*card, CardLocation::Played)?;
    }
    if trick.len() > 4 {
        return Err(InvariantViolation::TrickTooLarge(trick.len()));
    }
    for card in trick {
        add(*card, CardLocation::Trick)?;
    }

    let total = hands.iter().map(Hand::len).sum::<usize>() + played.len() + trick.len();
    if total != CARDS_IN_PLAY {
        return Err(InvariantViolation::CardCount(total));
    }
    Ok(())
}
