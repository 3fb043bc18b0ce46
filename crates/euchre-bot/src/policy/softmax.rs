use super::{Action, DecisionPhase, Policy, PolicyContext, PolicyError};
use crate::config::default_temperature;
use euchre_core::model::card::Card;
use euchre_core::model::hand::Hand;
use euchre_core::model::rank::Rank;
use euchre_core::model::suit::Suit;
use euchre_core::rules;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Hand value above which calling starts to beat passing.
const CALL_THRESHOLD: f64 = 95.0;
/// Hand value above which the policy may go alone.
const ALONE_SCORE: f64 = 125.0;
const ORDER_UP_ALONE_RATE: f64 = 0.7;
const CALL_ALONE_RATE: f64 = 0.6;

/// Samples actions from a Boltzmann distribution over hand-crafted scores.
#[derive(Debug, Clone)]
pub struct SoftmaxPolicy {
    temperature: f64,
    rng: SmallRng,
}

impl SoftmaxPolicy {
    pub fn new(temperature: f64, seed: u64) -> Self {
        Self {
            temperature,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(default_temperature(), seed)
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    fn order_up(&mut self, ctx: &PolicyContext) -> Action {
        let score = evaluate_hand(ctx.hand, ctx.round.upcard.suit);
        let scores = [score - CALL_THRESHOLD, 0.0];
        let call = softmax_sample(&scores, self.temperature, &mut self.rng) == 0;
        let alone = call && score > ALONE_SCORE && self.rng.gen_bool(ORDER_UP_ALONE_RATE);
        Action::OrderUp { call, alone }
    }

    fn call_trump(&mut self, ctx: &PolicyContext, forced: bool) -> Action {
        let options: Vec<(Suit, f64)> = Suit::ALL
            .into_iter()
            .filter(|suit| *suit != ctx.round.upcard.suit)
            .map(|suit| (suit, evaluate_hand(ctx.hand, suit)))
            .collect();

        if forced {
            let mut best = options.first().copied();
            for option in &options {
                if best.is_some_and(|(_, score)| option.1 > score) {
                    best = Some(*option);
                }
            }
            return Action::CallTrump {
                suit: best.map(|(suit, _)| suit),
                alone: false,
            };
        }

        let mut scores: Vec<f64> = options.iter().map(|(_, s)| s - CALL_THRESHOLD).collect();
        scores.push(0.0);
        let pick = softmax_sample(&scores, self.temperature, &mut self.rng);
        match options.get(pick) {
            Some(&(suit, score)) => Action::CallTrump {
                suit: Some(suit),
                alone: score > ALONE_SCORE && self.rng.gen_bool(CALL_ALONE_RATE),
            },
            None => Action::CallTrump {
                suit: None,
                alone: false,
            },
        }
    }

    fn discard(&mut self, ctx: &PolicyContext) -> Result<Card, PolicyError> {
        let trump = ctx.trump()?;
        let cards = ctx.hand.cards();
        let scores: Vec<f64> = cards
            .iter()
            .map(|card| {
                let effective = rules::effective_suit(*card, trump);
                let mut score = 0.0;
                if effective == trump {
                    score -= 10.0;
                }
                if card.rank == Rank::Ace {
                    score -= 8.0;
                }
                score - f64::from(rules::power(*card, effective, trump))
            })
            .collect();
        pick(cards, &scores, self.temperature, &mut self.rng)
    }

    fn play(&mut self, ctx: &PolicyContext) -> Result<Card, PolicyError> {
        let trump = ctx.trump()?;
        let legal = ctx.legal_plays();
        let lead = ctx.round.lead_suit();
        let to_beat = lead.and_then(|lead| {
            ctx.round
                .current_trick
                .cards()
                .map(|card| rules::power(card, lead, trump))
                .max()
        });
        let scores: Vec<f64> = legal
            .iter()
            .map(|card| {
                let effective = rules::effective_suit(*card, trump);
                let power = rules::power(*card, lead.unwrap_or(effective), trump);
                let mut score = f64::from(power);
                match (lead, to_beat) {
                    (None, _) if effective == trump => score -= 3.0,
                    (Some(_), Some(best)) if power > best => score += 8.0,
                    _ => {}
                }
                score
            })
            .collect();
        pick(&legal, &scores, self.temperature, &mut self.rng)
    }
}

impl Policy for SoftmaxPolicy {
    fn name(&self) -> &'static str {
        "softmax"
    }

    fn decide(&mut self, ctx: &PolicyContext) -> Result<Action, PolicyError> {
        Ok(match ctx.phase {
            DecisionPhase::OrderUp => self.order_up(ctx),
            DecisionPhase::CallTrump => self.call_trump(ctx, false),
            DecisionPhase::CallTrumpForced => self.call_trump(ctx, true),
            DecisionPhase::Discard => Action::Discard {
                card: self.discard(ctx)?,
            },
            DecisionPhase::PlayCard => Action::Play {
                card: self.play(ctx)?,
            },
        })
    }
}

/// Bidding value of a hand if `trump` were named.
pub fn evaluate_hand(hand: &Hand, trump: Suit) -> f64 {
    let mut score = 0u32;
    let mut trump_count = 0u32;
    for card in hand.iter() {
        let is_trump = rules::is_trump(*card, trump);
        score += if card.is_right_bower(trump) {
            35
        } else if card.is_left_bower(trump) {
            30
        } else if is_trump {
            18 + u32::from(card.rank.strength())
        } else if card.rank == Rank::Ace {
            14
        } else if card.rank == Rank::King {
            7
        } else {
            2
        };
        if is_trump {
            trump_count += 1;
        }
    }
    score += trump_count * 5;
    for suit in Suit::ALL {
        if suit != trump && hand.count_effective(suit, trump) == 0 {
            score += 6;
        }
    }
    f64::from(score)
}

fn pick<R: Rng + ?Sized>(
    cards: &[Card],
    scores: &[f64],
    temperature: f64,
    rng: &mut R,
) -> Result<Card, PolicyError> {
    if cards.is_empty() {
        return Err(PolicyError::NoLegalCard(0));
    }
    Ok(cards[softmax_sample(scores, temperature, rng).min(cards.len() - 1)])
}

/// Index drawn with probability proportional to `exp(score / temperature)`.
pub fn softmax_sample<R: Rng + ?Sized>(scores: &[f64], temperature: f64, rng: &mut R) -> usize {
    if scores.len() <= 1 {
        return 0;
    }
    let top = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = scores
        .iter()
        .map(|score| ((score - top) / temperature).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return 0;
    }
    let mut remaining = rng.gen_range(0.0..total);
    for (idx, weight) in weights.iter().enumerate() {
        if remaining < *weight {
            return idx;
        }
        remaining -= weight;
    }
    scores.len() - 1
}
