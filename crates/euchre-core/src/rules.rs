//! Trump-aware card primitives shared by the live rules engine and every simulation.

use crate::model::card::Card;
use crate::model::rank::Rank;
use crate::model::suit::Suit;

pub const RIGHT_BOWER_POWER: u8 = 100;
pub const LEFT_BOWER_POWER: u8 = 99;
const TRUMP_BASE: u8 = 80;
const LEAD_BASE: u8 = 40;

/// Suit a card belongs to once trump is known. Both bowers count as trump.
pub fn effective_suit(card: Card, trump: Suit) -> Suit {
    if card.rank == Rank::Jack && card.suit.same_color() == trump {
        trump
    } else {
        card.suit
    }
}

/// Trick-taking power of `card`. Off-suit, non-trump cards score 0.
pub fn power(card: Card, lead: Suit, trump: Suit) -> u8 {
    if card.is_right_bower(trump) {
        return RIGHT_BOWER_POWER;
    }
    if card.is_left_bower(trump) {
        return LEFT_BOWER_POWER;
    }
    let strength = card.rank.strength();
    let suit = effective_suit(card, trump);
    if suit == trump {
        TRUMP_BASE + strength
    } else if suit == lead {
        LEAD_BASE + strength
    } else {
        0
    }
}

/// Index of the winning card, or `None` for an empty trick. Ties keep the earliest play.
pub fn trick_winner(cards: &[Card], lead: Suit, trump: Suit) -> Option<usize> {
    let mut best: Option<(usize, u8)> = None;
    for (idx, card) in cards.iter().enumerate() {
        let value = power(*card, lead, trump);
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Cards a seat may play. `lead` is the effective suit led, `None` when leading.
pub fn legal_cards(hand: &[Card], lead: Option<Suit>, trump: Suit) -> Vec<Card> {
    if let Some(lead) = lead {
        let following: Vec<Card> = hand
            .iter()
            .copied()
            .filter(|card| effective_suit(*card, trump) == lead)
            .collect();
        if !following.is_empty() {
            return following;
        }
    }
    hand.to_vec()
}

pub fn is_trump(card: Card, trump: Suit) -> bool {
    effective_suit(card, trump) == trump
}
