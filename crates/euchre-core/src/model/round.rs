use crate::model::card::Card;
use crate::model::context::{CurrentTrick, RoundContext, VoidInfo};
use crate::model::deck::Deck;
use crate::model::hand::Hand;
use crate::model::player::{PlayerPosition, Team};
use crate::model::score::{RoundScore, score_round};
use crate::model::suit::Suit;
use crate::model::trick::{Trick, TrickError};
use crate::rules;
use thiserror::Error;

pub const HAND_SIZE: usize = 5;
pub const TRICKS_PER_ROUND: u8 = 5;
/// Cards in the four hands, the played pile and the open trick once the dealer has discarded.
pub const CARDS_IN_PLAY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// First bidding round: seats order the dealer to pick up the upcard.
    OrderUp,
    /// Dealer holds six cards and must discard one.
    Discard,
    /// Second bidding round: seats name any suit but the upcard's.
    CallTrump,
    Playing,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidOutcome {
    Passed,
    /// Every seat passed the first round; bidding moves to round two.
    UpcardTurnedDown,
    Called {
        maker: PlayerPosition,
        trump: Suit,
        alone: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Played,
    TrickCompleted {
        winner: PlayerPosition,
    },
    RoundCompleted {
        winner: PlayerPosition,
        score: RoundScore,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BidError {
    #[error("bid submitted during {0:?}")]
    WrongPhase(RoundPhase),
    #[error("expected {expected} to bid but got {actual}")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("{0} was turned down and cannot be named trump")]
    UpcardSuit(Suit),
    #[error("dealer must name trump after three passes")]
    DealerMustCall,
    #[error("only the dealer ({0}) discards")]
    NotDealer(PlayerPosition),
    #[error("{0} is not in hand")]
    CardNotInHand(Card),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    #[error("card played during {0:?}")]
    NotInPlayPhase(RoundPhase),
    #[error("{0} is not in hand")]
    CardNotInHand(Card),
    #[error("expected {expected} to play but got {actual}")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("must follow {0}")]
    MustFollowSuit(Suit),
    #[error(transparent)]
    Trick(#[from] TrickError),
}

/// Contract and position needed to resume a round mid-play.
#[derive(Debug, Clone)]
pub struct PlaySetup {
    pub dealer: PlayerPosition,
    pub upcard: Card,
    pub hands: [Hand; 4],
    pub trump: Suit,
    pub maker: PlayerPosition,
    pub alone: bool,
    pub dealer_picked_up: bool,
    pub played: Vec<Card>,
    pub current_trick: CurrentTrick,
    pub tricks_won: [u8; 2],
    pub voids: VoidInfo,
}

#[derive(Debug, Clone)]
pub struct RoundState {
    dealer: PlayerPosition,
    hands: [Hand; 4],
    upcard: Card,
    kitty: Vec<Card>,
    phase: RoundPhase,
    turn: PlayerPosition,
    trump: Option<Suit>,
    maker: Option<PlayerPosition>,
    alone: bool,
    dealer_picked_up: bool,
    discard: Option<Card>,
    current_trick: Option<Trick>,
    trick_history: Vec<Trick>,
    played: Vec<Card>,
    tricks_won: [u8; 2],
    voids: VoidInfo,
}

impl RoundState {
    /// Deals five cards to each seat one at a time, starting left of the dealer, then turns the upcard.
    pub fn deal(deck: &Deck, dealer: PlayerPosition) -> Self {
        // A `Deck` always holds all 24 cards, so the upcard and kitty follow the dealt hands.
        let (dealt, rest) = deck.cards().split_at(HAND_SIZE * 4);
        let mut hands: [Hand; 4] = Default::default();
        for (i, card) in dealt.iter().copied().enumerate() {
            let seat = dealer.offset(1 + i % 4);
            hands[seat.index()].add(card);
        }
        let mut round = Self::from_hands(dealer, hands, rest[0]);
        round.kitty = rest[1..].to_vec();
        round
    }

    /// Starts the bidding with hands already dealt, as simulations do with sampled worlds.
    pub fn from_hands(dealer: PlayerPosition, hands: [Hand; 4], upcard: Card) -> Self {
        Self {
            dealer,
            hands,
            upcard,
            kitty: Vec::new(),
            phase: RoundPhase::OrderUp,
            turn: dealer.next(),
            trump: None,
            maker: None,
            alone: false,
            dealer_picked_up: false,
            discard: None,
            current_trick: None,
            trick_history: Vec::new(),
            played: Vec::new(),
            tricks_won: [0; 2],
            voids: VoidInfo::new(),
        }
    }

    /// Resumes a round at the trick-play stage, typically from a sampled world.
    pub fn resume_play(setup: PlaySetup) -> Result<Self, PlayError> {
        let sitting_out = setup.alone.then(|| setup.maker.partner());
        let mut trick = Trick::new(setup.current_trick.leader, setup.trump, sitting_out);
        for play in &setup.current_trick.plays {
            trick.play(play.seat, play.card)?;
        }
        let tricks_played = setup.tricks_won[0] + setup.tricks_won[1];
        let phase = if tricks_played >= TRICKS_PER_ROUND {
            RoundPhase::Complete
        } else {
            RoundPhase::Playing
        };
        Ok(Self {
            dealer: setup.dealer,
            hands: setup.hands,
            upcard: setup.upcard,
            kitty: Vec::new(),
            phase,
            turn: trick.next_to_play().unwrap_or(setup.current_trick.leader),
            trump: Some(setup.trump),
            maker: Some(setup.maker),
            alone: setup.alone,
            dealer_picked_up: setup.dealer_picked_up,
            discard: None,
            current_trick: Some(trick),
            trick_history: Vec::new(),
            played: setup.played,
            tricks_won: setup.tricks_won,
            voids: setup.voids,
        })
    }

    pub fn dealer(&self) -> PlayerPosition {
        self.dealer
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn upcard(&self) -> Card {
        self.upcard
    }

    pub fn kitty(&self) -> &[Card] {
        &self.kitty
    }

    pub fn hand(&self, seat: PlayerPosition) -> &Hand {
        &self.hands[seat.index()]
    }

    pub fn hands(&self) -> &[Hand; 4] {
        &self.hands
    }

    pub fn trump(&self) -> Option<Suit> {
        self.trump
    }

    pub fn maker(&self) -> Option<PlayerPosition> {
        self.maker
    }

    pub fn alone(&self) -> bool {
        self.alone
    }

    pub fn dealer_picked_up(&self) -> bool {
        self.dealer_picked_up
    }

    pub fn discarded(&self) -> Option<Card> {
        self.discard
    }

    pub fn sitting_out(&self) -> Option<PlayerPosition> {
        match (self.alone, self.maker) {
            (true, Some(maker)) => Some(maker.partner()),
            _ => None,
        }
    }

    pub fn current_trick(&self) -> Option<&Trick> {
        self.current_trick.as_ref()
    }

    pub fn trick_history(&self) -> &[Trick] {
        &self.trick_history
    }

    pub fn played_cards(&self) -> &[Card] {
        &self.played
    }

    pub fn tricks_won(&self, team: Team) -> u8 {
        self.tricks_won[team.index()]
    }

    pub fn voids(&self) -> &VoidInfo {
        &self.voids
    }

    pub fn tricks_completed(&self) -> u8 {
        self.tricks_won[0] + self.tricks_won[1]
    }

    /// Seat expected to act next, if the round is still live.
    pub fn to_act(&self) -> Option<PlayerPosition> {
        match self.phase {
            RoundPhase::OrderUp | RoundPhase::CallTrump => Some(self.turn),
            RoundPhase::Discard => Some(self.dealer),
            RoundPhase::Playing => self.current_trick.as_ref().and_then(Trick::next_to_play),
            RoundPhase::Complete => None,
        }
    }

    /// Total of hand sizes, played cards and cards in the open trick.
    pub fn card_total(&self) -> usize {
        let in_hands: usize = self.hands.iter().map(Hand::len).sum();
        let in_trick = self.current_trick.as_ref().map_or(0, |t| t.plays().len());
        in_hands + self.played.len() + in_trick
    }

    pub fn order_up(
        &mut self,
        seat: PlayerPosition,
        call: bool,
        alone: bool,
    ) -> Result<BidOutcome, BidError> {
        self.expect_bid(RoundPhase::OrderUp, seat)?;
        if !call {
            if seat == self.dealer {
                self.phase = RoundPhase::CallTrump;
                self.turn = self.dealer.next();
                return Ok(BidOutcome::UpcardTurnedDown);
            }
            self.turn = seat.next();
            return Ok(BidOutcome::Passed);
        }

        let trump = self.upcard.suit;
        self.trump = Some(trump);
        self.maker = Some(seat);
        self.alone = alone;
        self.hands[self.dealer.index()].add(self.upcard);
        self.dealer_picked_up = true;
        self.phase = RoundPhase::Discard;
        Ok(BidOutcome::Called {
            maker: seat,
            trump,
            alone,
        })
    }

    pub fn discard(&mut self, seat: PlayerPosition, card: Card) -> Result<(), BidError> {
        if self.phase != RoundPhase::Discard {
            return Err(BidError::WrongPhase(self.phase));
        }
        if seat != self.dealer {
            return Err(BidError::NotDealer(self.dealer));
        }
        if !self.hands[seat.index()].remove(card) {
            return Err(BidError::CardNotInHand(card));
        }
        self.discard = Some(card);
        self.start_play();
        Ok(())
    }

    pub fn call_trump(
        &mut self,
        seat: PlayerPosition,
        suit: Option<Suit>,
        alone: bool,
    ) -> Result<BidOutcome, BidError> {
        self.expect_bid(RoundPhase::CallTrump, seat)?;
        let Some(trump) = suit else {
            if seat == self.dealer {
                return Err(BidError::DealerMustCall);
            }
            self.turn = seat.next();
            return Ok(BidOutcome::Passed);
        };
        if trump == self.upcard.suit {
            return Err(BidError::UpcardSuit(trump));
        }
        self.trump = Some(trump);
        self.maker = Some(seat);
        self.alone = alone;
        self.start_play();
        Ok(BidOutcome::Called {
            maker: seat,
            trump,
            alone,
        })
    }

    /// Cards `seat` may legally play or discard right now.
    pub fn legal_cards(&self, seat: PlayerPosition) -> Vec<Card> {
        let hand = self.hands[seat.index()].cards();
        match (self.phase, self.trump, self.current_trick.as_ref()) {
            (RoundPhase::Discard, _, _) if seat == self.dealer => hand.to_vec(),
            (RoundPhase::Playing, Some(trump), Some(trick)) => {
                if trick.next_to_play() != Some(seat) {
                    return Vec::new();
                }
                rules::legal_cards(hand, trick.lead_suit(), trump)
            }
            _ => Vec::new(),
        }
    }

    pub fn play_card(
        &mut self,
        seat: PlayerPosition,
        card: Card,
    ) -> Result<PlayOutcome, PlayError> {
        if self.phase != RoundPhase::Playing {
            return Err(PlayError::NotInPlayPhase(self.phase));
        }
        let sitting_out = self.sitting_out();
        let (Some(trump), Some(trick)) = (self.trump, self.current_trick.as_mut()) else {
            return Err(PlayError::NotInPlayPhase(self.phase));
        };
        if let Some(expected) = trick.next_to_play() {
            if expected != seat {
                return Err(PlayError::OutOfTurn {
                    expected,
                    actual: seat,
                });
            }
        }
        let hand = &mut self.hands[seat.index()];
        if !hand.contains(card) {
            return Err(PlayError::CardNotInHand(card));
        }

        if let Some(lead) = trick.lead_suit() {
            if rules::effective_suit(card, trump) != lead {
                if hand.count_effective(lead, trump) > 0 {
                    return Err(PlayError::MustFollowSuit(lead));
                }
                self.voids.mark(seat, lead);
            }
        }

        trick.play(seat, card)?;
        hand.remove(card);

        if !trick.is_complete() {
            return Ok(PlayOutcome::Played);
        }

        let winner = trick.winner().unwrap_or(trick.leader());
        self.tricks_won[winner.team().index()] += 1;
        self.played.extend(trick.cards());
        let finished = std::mem::replace(trick, Trick::new(winner, trump, sitting_out));
        self.trick_history.push(finished);

        if self.tricks_completed() < TRICKS_PER_ROUND {
            return Ok(PlayOutcome::TrickCompleted { winner });
        }
        self.phase = RoundPhase::Complete;
        match self.score() {
            Some(score) => Ok(PlayOutcome::RoundCompleted { winner, score }),
            None => Ok(PlayOutcome::TrickCompleted { winner }),
        }
    }

    /// Round result once all five tricks are in.
    pub fn score(&self) -> Option<RoundScore> {
        if self.phase != RoundPhase::Complete {
            return None;
        }
        let makers = self.maker?.team();
        Some(score_round(makers, self.tricks_won(makers), self.alone))
    }

    /// Everything `seat` can see right now.
    pub fn context_for(&self, seat: PlayerPosition) -> RoundContext {
        let current_trick = match &self.current_trick {
            Some(trick) => CurrentTrick {
                leader: trick.leader(),
                plays: trick.plays().to_vec(),
            },
            None => CurrentTrick::new(self.dealer.next()),
        };
        let mut cards_remaining = [0u8; 4];
        for seat in PlayerPosition::LOOP {
            cards_remaining[seat.index()] = self.hands[seat.index()].len() as u8;
        }
        RoundContext {
            seat,
            dealer: self.dealer,
            upcard: self.upcard,
            trump: self.trump,
            maker: self.maker,
            alone: self.alone,
            dealer_picked_up: self.dealer_picked_up,
            discard: if seat == self.dealer { self.discard } else { None },
            played_cards: self.played.clone(),
            current_trick,
            void_info: self.voids,
            cards_remaining,
            tricks_won: self.tricks_won,
        }
    }

    fn expect_bid(&self, phase: RoundPhase, seat: PlayerPosition) -> Result<(), BidError> {
        if self.phase != phase {
            return Err(BidError::WrongPhase(self.phase));
        }
        if self.turn != seat {
            return Err(BidError::OutOfTurn {
                expected: self.turn,
                actual: seat,
            });
        }
        Ok(())
    }

    fn start_play(&mut self) {
        let sitting_out = self.sitting_out();
        let mut leader = self.dealer.next();
        if Some(leader) == sitting_out {
            leader = leader.next();
        }
        if let Some(trump) = self.trump {
            self.current_trick = Some(Trick::new(leader, trump, sitting_out));
        }
        self.turn = leader;
        self.phase = RoundPhase::Playing;
    }
}
