//! Observed state handed to a deciding seat.
//!
//! A [`RoundContext`] is what one seat can legitimately know: its own seat,
//! the public bidding outcome, every card already played, the trick in
//! progress, and which seats have shown out of a suit. Hands of other seats
//! never appear here; samplers fill them in.

use crate::model::card::Card;
use crate::model::player::{PlayerPosition, Team};
use crate::model::suit::Suit;
use crate::model::trick::Play;
use crate::rules;
use serde::{Deserialize, Serialize};

/// Bit set over the four suits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuitMask(u8);

impl SuitMask {
    pub const EMPTY: SuitMask = SuitMask(0);

    pub const fn contains(self, suit: Suit) -> bool {
        self.0 & (1 << suit as u8) != 0
    }

    pub const fn with(self, suit: Suit) -> SuitMask {
        SuitMask(self.0 | (1 << suit as u8))
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn suits(self) -> impl Iterator<Item = Suit> {
        Suit::ALL.into_iter().filter(move |suit| self.contains(*suit))
    }
}

/// Effective suits each seat is known to be void in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoidInfo {
    masks: [SuitMask; 4],
}

impl VoidInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, seat: PlayerPosition, suit: Suit) {
        let mask = &mut self.masks[seat.index()];
        *mask = mask.with(suit);
    }

    pub fn is_void(&self, seat: PlayerPosition, suit: Suit) -> bool {
        self.masks[seat.index()].contains(suit)
    }

    pub fn mask(&self, seat: PlayerPosition) -> SuitMask {
        self.masks[seat.index()]
    }

    /// Whether `card`'s effective suit under `trump` is one `seat` cannot hold.
    pub fn excludes(&self, seat: PlayerPosition, card: Card, trump: Option<Suit>) -> bool {
        let suit = match trump {
            Some(trump) => rules::effective_suit(card, trump),
            None => card.suit,
        };
        self.is_void(seat, suit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentTrick {
    pub leader: PlayerPosition,
    pub plays: Vec<Play>,
}

impl CurrentTrick {
    pub fn new(leader: PlayerPosition) -> Self {
        Self {
            leader,
            plays: Vec::new(),
        }
    }

    pub fn cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.plays.iter().map(|play| play.card)
    }

    pub fn lead_suit(&self, trump: Suit) -> Option<Suit> {
        self.plays
            .first()
            .map(|play| rules::effective_suit(play.card, trump))
    }

    /// Play currently holding the trick.
    pub fn winning_play(&self, trump: Suit) -> Option<Play> {
        let lead = self.lead_suit(trump)?;
        let cards: Vec<Card> = self.cards().collect();
        rules::trick_winner(&cards, lead, trump).map(|idx| self.plays[idx])
    }
}

/// Snapshot of one seat's knowledge of the round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundContext {
    pub seat: PlayerPosition,
    pub dealer: PlayerPosition,
    pub upcard: Card,
    pub trump: Option<Suit>,
    pub maker: Option<PlayerPosition>,
    pub alone: bool,
    pub dealer_picked_up: bool,
    /// Known only to the dealer.
    pub discard: Option<Card>,
    pub played_cards: Vec<Card>,
    pub current_trick: CurrentTrick,
    pub void_info: VoidInfo,
    pub cards_remaining: [u8; 4],
    pub tricks_won: [u8; 2],
}

impl RoundContext {
    /// Partner of a lone maker, who holds cards but never plays.
    pub fn sitting_out(&self) -> Option<PlayerPosition> {
        match (self.alone, self.maker) {
            (true, Some(maker)) => Some(maker.partner()),
            _ => None,
        }
    }

    pub fn maker_team(&self) -> Option<Team> {
        self.maker.map(|seat| seat.team())
    }

    pub fn lead_suit(&self) -> Option<Suit> {
        self.current_trick.lead_suit(self.trump?)
    }

    pub fn is_leading(&self) -> bool {
        self.current_trick.plays.is_empty()
    }

    /// Completed tricks so far.
    pub fn tricks_played(&self) -> u8 {
        self.tricks_won[0] + self.tricks_won[1]
    }

    /// Whether the upcard has appeared in play. Once it has, it is no longer hidden in the dealer's hand.
    pub fn upcard_seen(&self) -> bool {
        self.played_cards.contains(&self.upcard) || self.current_trick.cards().any(|c| c == self.upcard)
    }

    pub fn legal_plays(&self, hand: &[Card]) -> Vec<Card> {
        match self.trump {
            Some(trump) => rules::legal_cards(hand, self.lead_suit(), trump),
            None => hand.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CurrentTrick, SuitMask, VoidInfo};
    use crate::model::card::Card;
    use crate::model::player::PlayerPosition;
    use crate::model::suit::Suit;
    use crate::model::trick::Play;

    #[test]
    fn suit_mask_tracks_members() {
        let mask = SuitMask::EMPTY.with(Suit::Clubs).with(Suit::Hearts);
        assert!(mask.contains(Suit::Clubs));
        assert!(!mask.contains(Suit::Spades));
        assert_eq!(mask.suits().collect::<Vec<_>>(), vec![Suit::Hearts, Suit::Clubs]);
    }

    #[test]
    fn void_in_trump_excludes_left_bower() {
        let mut voids = VoidInfo::new();
        voids.mark(PlayerPosition::East, Suit::Hearts);
        let left: Card = "JD".parse().unwrap();
        assert!(voids.excludes(PlayerPosition::East, left, Some(Suit::Hearts)));
        assert!(!voids.excludes(PlayerPosition::East, left, Some(Suit::Spades)));
        assert!(!voids.excludes(PlayerPosition::West, left, Some(Suit::Hearts)));
    }

    #[test]
    fn current_trick_reports_winner_so_far() {
        let mut trick = CurrentTrick::new(PlayerPosition::North);
        trick.plays.push(Play {
            seat: PlayerPosition::North,
            card: "AS".parse().unwrap(),
        });
        trick.plays.push(Play {
            seat: PlayerPosition::East,
            card: "9H".parse().unwrap(),
        });
        let best = trick.winning_play(Suit::Hearts).unwrap();
        assert_eq!(best.seat, PlayerPosition::East);
        assert_eq!(trick.lead_suit(Suit::Hearts), Some(Suit::Spades));
    }

    #[test]
    fn context_serializes_to_json() {
        let context = super::RoundContext {
            seat: PlayerPosition::South,
            dealer: PlayerPosition::West,
            upcard: "JC".parse().unwrap(),
            trump: Some(Suit::Clubs),
            maker: Some(PlayerPosition::North),
            alone: true,
            dealer_picked_up: true,
            discard: None,
            played_cards: Vec::new(),
            current_trick: CurrentTrick::new(PlayerPosition::North),
            void_info: VoidInfo::new(),
            cards_remaining: [5, 5, 5, 5],
            tricks_won: [0, 0],
        };
        let json = serde_json::to_string(&context).unwrap();
        let back: super::RoundContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, context);
        assert_eq!(back.sitting_out(), Some(PlayerPosition::South));
    }
}
