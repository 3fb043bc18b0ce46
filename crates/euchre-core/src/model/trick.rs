use crate::model::card::Card;
use crate::model::player::PlayerPosition;
use crate::model::suit::Suit;
use crate::rules;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trick {
    leader: PlayerPosition,
    trump: Suit,
    sitting_out: Option<PlayerPosition>,
    plays: Vec<Play>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Play {
    pub seat: PlayerPosition,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrickError {
    #[error("trick already complete")]
    TrickComplete,
    #[error("expected {expected} to play next but got {actual}")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("{0} is sitting out this round")]
    SittingOut(PlayerPosition),
}

impl Trick {
    pub fn new(leader: PlayerPosition, trump: Suit, sitting_out: Option<PlayerPosition>) -> Self {
        Self {
            leader,
            trump,
            sitting_out,
            plays: Vec::with_capacity(4),
        }
    }

    pub fn leader(&self) -> PlayerPosition {
        self.leader
    }

    pub fn trump(&self) -> Suit {
        self.trump
    }

    pub fn sitting_out(&self) -> Option<PlayerPosition> {
        self.sitting_out
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    /// Plays needed to finish: three when a partner sits out, else four.
    pub fn expected_plays(&self) -> usize {
        if self.sitting_out.is_some() { 3 } else { 4 }
    }

    pub fn is_complete(&self) -> bool {
        self.plays.len() == self.expected_plays()
    }

    /// Effective suit of the first card played.
    pub fn lead_suit(&self) -> Option<Suit> {
        self.plays
            .first()
            .map(|play| rules::effective_suit(play.card, self.trump))
    }

    /// Seat due to play next, skipping a partner who sits out.
    pub fn next_to_play(&self) -> Option<PlayerPosition> {
        if self.is_complete() {
            return None;
        }
        let mut seat = self
            .plays
            .last()
            .map(|play| play.seat.next())
            .unwrap_or(self.leader);
        if Some(seat) == self.sitting_out {
            seat = seat.next();
        }
        Some(seat)
    }

    pub fn play(&mut self, seat: PlayerPosition, card: Card) -> Result<(), TrickError> {
        if Some(seat) == self.sitting_out {
            return Err(TrickError::SittingOut(seat));
        }
        let expected = self.next_to_play().ok_or(TrickError::TrickComplete)?;
        if expected != seat {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: seat,
            });
        }
        self.plays.push(Play { seat, card });
        Ok(())
    }

    /// Current leader of the trick, whether or not it is complete.
    pub fn winning_play(&self) -> Option<Play> {
        let lead = self.lead_suit()?;
        let cards: Vec<Card> = self.plays.iter().map(|play| play.card).collect();
        rules::trick_winner(&cards, lead, self.trump).map(|idx| self.plays[idx])
    }

    pub fn winner(&self) -> Option<PlayerPosition> {
        if !self.is_complete() {
            return None;
        }
        self.winning_play().map(|play| play.seat)
    }

    pub fn cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.plays.iter().map(|play| play.card)
    }
}
