//! Deals the cards one seat cannot see into a complete, constraint-consistent world.

use super::validate::{InvariantViolation, validate_world};
use crate::model::card::Card;
use crate::model::context::RoundContext;
use crate::model::deck::Deck;
use crate::model::hand::Hand;
use crate::model::player::PlayerPosition;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// Hands for all four seats plus whether any void constraint had to be broken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledWorld {
    hands: [Hand; 4],
    degraded: bool,
}

impl SampledWorld {
    pub fn hand(&self, seat: PlayerPosition) -> &Hand {
        &self.hands[seat.index()]
    }

    pub fn hands(&self) -> &[Hand; 4] {
        &self.hands
    }

    pub fn into_hands(self) -> [Hand; 4] {
        self.hands
    }

    /// True when at least one card was dealt into a seat known to be void in its suit.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SamplingError {
    #[error("{seat} holds {actual} cards but the context says {expected}")]
    HandSizeMismatch {
        seat: PlayerPosition,
        expected: u8,
        actual: usize,
    },
    #[error("own hand lists {0} twice")]
    DuplicateInHand(Card),
    #[error("ran out of unseen cards while dealing to {seat}")]
    PoolExhausted { seat: PlayerPosition },
    #[error("sampled world is inconsistent: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Counters accumulated across many sampling calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplingStats {
    pub samples: usize,
    pub degraded_samples: usize,
    pub degraded_draws: usize,
}

impl SamplingStats {
    pub fn merge(&mut self, other: &SamplingStats) {
        self.samples += other.samples;
        self.degraded_samples += other.degraded_samples;
        self.degraded_draws += other.degraded_draws;
    }
}

#[derive(Debug, Default)]
pub struct WorldSampler;

impl WorldSampler {
    /// Samples one world consistent with `context` as seen by `context.seat` holding `hand`.
    pub fn sample_world<R: Rng + ?Sized>(
        context: &RoundContext,
        hand: &Hand,
        rng: &mut R,
        stats: Option<&mut SamplingStats>,
    ) -> Result<SampledWorld, SamplingError> {
        let me = context.seat;
        let expected = context.cards_remaining[me.index()];
        if hand.len() != expected as usize {
            return Err(SamplingError::HandSizeMismatch {
                seat: me,
                expected,
                actual: hand.len(),
            });
        }

        let mut known: HashSet<Card> = HashSet::with_capacity(24);
        for card in hand.iter() {
            if !known.insert(*card) {
                return Err(SamplingError::DuplicateInHand(*card));
            }
        }
        known.extend(context.played_cards.iter().copied());
        known.extend(context.current_trick.cards());
        known.insert(context.upcard);
        if let Some(discard) = context.discard {
            known.insert(discard);
        }

        let mut pool: Vec<Card> = Deck::standard()
            .cards()
            .iter()
            .copied()
            .filter(|card| !known.contains(card))
            .collect();
        pool.shuffle(rng);

        let mut hands: [Hand; 4] = Default::default();
        hands[me.index()] = hand.clone();

        // A dealer who has shown out of the upcard's suit must have discarded it.
        if context.dealer_picked_up
            && me != context.dealer
            && !context.upcard_seen()
            && !context
                .void_info
                .excludes(context.dealer, context.upcard, context.trump)
        {
            hands[context.dealer.index()].add(context.upcard);
        }

        let mut degraded_draws = 0usize;
        for seat in PlayerPosition::LOOP {
            if seat == me {
                continue;
            }
            let target = context.cards_remaining[seat.index()] as usize;
            while hands[seat.index()].len() < target {
                if pool.is_empty() {
                    return Err(SamplingError::PoolExhausted { seat });
                }
                let idx = match pool
                    .iter()
                    .position(|card| !context.void_info.excludes(seat, *card, context.trump))
                {
                    Some(idx) => idx,
                    None => {
                        degraded_draws += 1;
                        debug!(
                            seat = %seat,
                            voids = ?context.void_info.mask(seat),
                            "no void-consistent card left; drawing arbitrarily"
                        );
                        0
                    }
                };
                hands[seat.index()].add(pool.remove(idx));
            }
        }

        let trick: Vec<Card> = context.current_trick.cards().collect();
        validate_world(&hands, &context.played_cards, &trick)?;

        if let Some(stats) = stats {
            stats.samples += 1;
            stats.degraded_draws += degraded_draws;
            if degraded_draws > 0 {
                stats.degraded_samples += 1;
            }
        }

        Ok(SampledWorld {
            hands,
            degraded: degraded_draws > 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{SamplingError, SamplingStats, WorldSampler};
    use crate::model::card::Card;
    use crate::model::context::{CurrentTrick, RoundContext, VoidInfo};
    use crate::model::hand::Hand;
    use crate::model::player::PlayerPosition;
    use crate::model::suit::Suit;
    use crate::model::trick::Play;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn card(text: &str) -> Card {
        text.parse().unwrap()
    }

    fn hand(cards: &[&str]) -> Hand {
        Hand::with_cards(cards.iter().map(|c| card(c)).collect())
    }

    fn bidding_context() -> (RoundContext, Hand) {
        let context = RoundContext {
            seat: PlayerPosition::South,
            dealer: PlayerPosition::West,
            upcard: card("9H"),
            trump: None,
            maker: None,
            alone: false,
            dealer_picked_up: false,
            discard: None,
            played_cards: Vec::new(),
            current_trick: CurrentTrick::new(PlayerPosition::North),
            void_info: VoidInfo::new(),
            cards_remaining: [5, 5, 5, 5],
            tricks_won: [0, 0],
        };
        (context, hand(&["JH", "JD", "AS", "KC", "10D"]))
    }

    #[test]
    fn bidding_world_conserves_cards_and_hides_upcard() {
        let (context, own) = bidding_context();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut stats = SamplingStats::default();
        for _ in 0..200 {
            let world =
                WorldSampler::sample_world(&context, &own, &mut rng, Some(&mut stats)).unwrap();
            assert_eq!(world.hand(PlayerPosition::South), &own);
            for seat in PlayerPosition::LOOP {
                assert_eq!(world.hand(seat).len(), 5);
                assert!(!world.hand(seat).contains(card("9H")));
            }
            assert!(!world.is_degraded());
        }
        assert_eq!(stats.samples, 200);
        assert_eq!(stats.degraded_samples, 0);
    }

    #[test]
    fn hand_size_mismatch_is_rejected() {
        let (mut context, own) = bidding_context();
        context.cards_remaining[PlayerPosition::South.index()] = 4;
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(matches!(
            WorldSampler::sample_world(&context, &own, &mut rng, None),
            Err(SamplingError::HandSizeMismatch { .. })
        ));
    }

    #[test]
    fn dealer_keeps_unplayed_upcard() {
        let mut context = bidding_context().0;
        context.trump = Some(Suit::Hearts);
        context.maker = Some(PlayerPosition::North);
        context.dealer_picked_up = true;
        context.current_trick = CurrentTrick::new(PlayerPosition::North);
        let own = hand(&["JH", "JD", "AS", "KC", "10D"]);
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..50 {
            let world = WorldSampler::sample_world(&context, &own, &mut rng, None).unwrap();
            assert!(world.hand(PlayerPosition::West).contains(card("9H")));
        }
    }

    #[test]
    fn dealer_void_in_trump_never_holds_upcard() {
        let mut context = bidding_context().0;
        context.trump = Some(Suit::Hearts);
        context.maker = Some(PlayerPosition::North);
        context.dealer_picked_up = true;
        context.void_info.mark(PlayerPosition::West, Suit::Hearts);
        let own = hand(&["JH", "JD", "AH", "KH", "QH"]);
        let mut rng = SmallRng::seed_from_u64(13);
        for _ in 0..200 {
            let world = WorldSampler::sample_world(&context, &own, &mut rng, None).unwrap();
            let west = world.hand(PlayerPosition::West);
            assert!(!west.contains(card("9H")));
            assert_eq!(west.count_effective(Suit::Hearts, Suit::Hearts), 0);
            assert_eq!(west.len(), 5);
            assert!(!world.is_degraded());
        }
    }

    #[test]
    fn voids_are_respected_when_possible() {
        let mut voids = VoidInfo::new();
        voids.mark(PlayerPosition::East, Suit::Hearts);
        let context = RoundContext {
            seat: PlayerPosition::South,
            dealer: PlayerPosition::West,
            upcard: card("9S"),
            trump: Some(Suit::Hearts),
            maker: Some(PlayerPosition::North),
            alone: false,
            dealer_picked_up: false,
            discard: None,
            played_cards: vec![card("AC"), card("9H"), card("KC"), card("QC")],
            current_trick: CurrentTrick {
                leader: PlayerPosition::North,
                plays: vec![Play {
                    seat: PlayerPosition::North,
                    card: card("10C"),
                }],
            },
            void_info: voids,
            cards_remaining: [3, 4, 4, 4],
            tricks_won: [1, 0],
        };
        let own = hand(&["JH", "AS", "KS", "10D"]);
        let mut rng = SmallRng::seed_from_u64(21);
        for _ in 0..300 {
            let world = WorldSampler::sample_world(&context, &own, &mut rng, None).unwrap();
            let east = world.hand(PlayerPosition::East);
            assert_eq!(east.count_effective(Suit::Hearts, Suit::Hearts), 0);
            assert!(!east.contains(card("JD")));
        }
    }

    #[test]
    fn impossible_voids_degrade_instead_of_failing() {
        let mut voids = VoidInfo::new();
        for suit in Suit::ALL {
            voids.mark(PlayerPosition::North, suit);
        }
        let mut context = bidding_context().0;
        context.trump = Some(Suit::Clubs);
        context.void_info = voids;
        let own = hand(&["JH", "JD", "AS", "KC", "10D"]);
        let mut rng = SmallRng::seed_from_u64(2);
        let mut stats = SamplingStats::default();
        let world = WorldSampler::sample_world(&context, &own, &mut rng, Some(&mut stats)).unwrap();
        assert!(world.is_degraded());
        assert_eq!(world.hand(PlayerPosition::North).len(), 5);
        assert_eq!(stats.degraded_samples, 1);
        assert_eq!(stats.degraded_draws, 5);
    }
}
