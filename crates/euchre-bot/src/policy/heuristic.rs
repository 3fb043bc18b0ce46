use super::{Action, DecisionPhase, Policy, PolicyContext, PolicyError};
use euchre_core::model::card::Card;
use euchre_core::model::hand::Hand;
use euchre_core::model::rank::Rank;
use euchre_core::model::suit::Suit;
use euchre_core::rules;
use tracing::{Level, event};

/// Trump holdings in one suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrumpStrength {
    pub count: usize,
    pub right: bool,
    pub left: bool,
    pub ace: bool,
}

impl TrumpStrength {
    pub fn of(hand: &Hand, trump: Suit) -> Self {
        let mut strength = Self::default();
        for card in hand.iter() {
            if card.is_right_bower(trump) {
                strength.right = true;
            } else if card.is_left_bower(trump) {
                strength.left = true;
            } else if card.suit != trump {
                continue;
            } else if card.rank == Rank::Ace {
                strength.ace = true;
            }
            strength.count += 1;
        }
        strength
    }

    /// Four trump, or both bowers with the ace.
    pub fn goes_alone(self) -> bool {
        self.count >= 4 || (self.right && self.left && self.ace)
    }
}

/// Rule-based player: counts trump to bid, plays cheap when it cannot win.
///
/// Deterministic for a given context, which makes it the default rollout driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPolicy;

impl HeuristicPolicy {
    pub fn new() -> Self {
        Self
    }

    fn order_up(ctx: &PolicyContext) -> Action {
        let strength = TrumpStrength::of(ctx.hand, ctx.round.upcard.suit);
        if strength.count >= 2 {
            Action::OrderUp {
                call: true,
                alone: strength.goes_alone(),
            }
        } else {
            Action::OrderUp {
                call: false,
                alone: false,
            }
        }
    }

    fn call_trump(ctx: &PolicyContext, forced: bool) -> Action {
        let (suit, strength) = best_suit(ctx.hand, ctx.round.upcard.suit);
        if forced || strength.count >= 3 {
            Action::CallTrump {
                suit: Some(suit),
                alone: strength.goes_alone(),
            }
        } else {
            Action::CallTrump {
                suit: None,
                alone: false,
            }
        }
    }

    fn play(ctx: &PolicyContext) -> Result<Card, PolicyError> {
        let trump = ctx.trump()?;
        let round = ctx.round;
        let me = round.seat;
        let legal = ctx.legal_plays();
        if legal.is_empty() {
            return Err(PolicyError::NoLegalCard(ctx.hand.len()));
        }

        let lone_maker = if round.alone { round.maker } else { None };
        let trump_in = |cards: &[Card]| -> Vec<Card> {
            cards
                .iter()
                .copied()
                .filter(|card| rules::is_trump(*card, trump))
                .collect()
        };

        if lone_maker == Some(me) {
            let trumps = trump_in(&legal);
            let pool = if trumps.is_empty() { &legal } else { &trumps };
            return highest(pool, trump);
        }

        let Some(lead) = round.lead_suit() else {
            if round.tricks_played() == 0 {
                let off: Vec<Card> = legal
                    .iter()
                    .copied()
                    .filter(|card| !rules::is_trump(*card, trump))
                    .collect();
                if !off.is_empty() {
                    return highest(&off, trump);
                }
            }
            return lowest(&legal, trump);
        };

        let best = round.current_trick.winning_play(trump);
        let to_beat = best.map_or(0, |play| rules::power(play.card, lead, trump));
        let winners: Vec<Card> = legal
            .iter()
            .copied()
            .filter(|card| rules::power(*card, lead, trump) > to_beat)
            .collect();

        if lone_maker.is_some() {
            if !winners.is_empty() {
                return lowest(&winners, trump);
            }
            let trumps = trump_in(ctx.hand.cards());
            if ctx.hand.count_effective(lead, trump) == 0 && !trumps.is_empty() {
                return lowest(&trumps, trump);
            }
            return highest(&legal, trump);
        }

        if best.map(|play| play.seat) == Some(me.partner()) {
            return lowest(&legal, trump);
        }
        if !winners.is_empty() {
            return lowest(&winners, trump);
        }
        lowest(&legal, trump)
    }
}

impl Policy for HeuristicPolicy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn decide(&mut self, ctx: &PolicyContext) -> Result<Action, PolicyError> {
        let action = match ctx.phase {
            DecisionPhase::OrderUp => Self::order_up(ctx),
            DecisionPhase::CallTrump => Self::call_trump(ctx, false),
            DecisionPhase::CallTrumpForced => Self::call_trump(ctx, true),
            DecisionPhase::Discard => {
                let trump = ctx.trump()?;
                Action::Discard {
                    card: lowest(ctx.hand.cards(), trump)?,
                }
            }
            DecisionPhase::PlayCard => Action::Play {
                card: Self::play(ctx)?,
            },
        };
        log_decision(ctx, &action);
        Ok(action)
    }
}

/// Strongest non-upcard suit by trump count; ties keep the earlier suit.
pub(crate) fn best_suit(hand: &Hand, upcard_suit: Suit) -> (Suit, TrumpStrength) {
    let mut best: Option<(Suit, TrumpStrength)> = None;
    for suit in Suit::ALL {
        if suit == upcard_suit {
            continue;
        }
        let strength = TrumpStrength::of(hand, suit);
        match best {
            Some((_, top)) if strength.count <= top.count => {}
            _ => best = Some((suit, strength)),
        }
    }
    best.unwrap_or((upcard_suit.same_color(), TrumpStrength::default()))
}

/// Power of a card in its own effective suit.
pub(crate) fn raw_power(card: Card, trump: Suit) -> u8 {
    rules::power(card, rules::effective_suit(card, trump), trump)
}

pub(crate) fn lowest(cards: &[Card], trump: Suit) -> Result<Card, PolicyError> {
    let mut iter = cards.iter().copied();
    let first = iter.next().ok_or(PolicyError::NoLegalCard(0))?;
    Ok(iter.fold(first, |low, card| {
        if raw_power(card, trump) < raw_power(low, trump) {
            card
        } else {
            low
        }
    }))
}

pub(crate) fn highest(cards: &[Card], trump: Suit) -> Result<Card, PolicyError> {
    let mut iter = cards.iter().copied();
    let first = iter.next().ok_or(PolicyError::NoLegalCard(0))?;
    Ok(iter.fold(first, |high, card| {
        if raw_power(card, trump) > raw_power(high, trump) {
            card
        } else {
            high
        }
    }))
}

fn log_decision(ctx: &PolicyContext, action: &Action) {
    if !tracing::enabled!(target: "euchre_bot::heuristic", Level::TRACE) {
        return;
    }
    event!(
        target: "euchre_bot::heuristic",
        Level::TRACE,
        seat = %ctx.round.seat,
        phase = ?ctx.phase,
        hand = ctx.hand.len(),
        action = ?action,
    );
}

#[cfg(test)]
mod tests {
    use super::{HeuristicPolicy, TrumpStrength, best_suit};
    use crate::policy::{Action, DecisionPhase, Policy, PolicyContext};
    use euchre_core::model::card::Card;
    use euchre_core::model::context::{CurrentTrick, RoundContext, VoidInfo};
    use euchre_core::model::hand::Hand;
    use euchre_core::model::player::PlayerPosition;
    use euchre_core::model::suit::Suit;
    use euchre_core::model::trick::Play;

    fn card(text: &str) -> Card {
        text.parse().unwrap()
    }

    fn hand(cards: &[&str]) -> Hand {
        Hand::with_cards(cards.iter().map(|c| card(c)).collect())
    }

    fn bidding(seat: PlayerPosition, upcard: &str) -> RoundContext {
        RoundContext {
            seat,
            dealer: PlayerPosition::North,
            upcard: card(upcard),
            trump: None,
            maker: None,
            alone: false,
            dealer_picked_up: false,
            discard: None,
            played_cards: Vec::new(),
            current_trick: CurrentTrick::new(PlayerPosition::East),
            void_info: VoidInfo::new(),
            cards_remaining: [5; 4],
            tricks_won: [0; 2],
        }
    }

    fn playing(seat: PlayerPosition, plays: &[(PlayerPosition, &str)]) -> RoundContext {
        let mut context = bidding(seat, "9H");
        context.trump = Some(Suit::Hearts);
        context.maker = Some(PlayerPosition::East);
        context.dealer_picked_up = true;
        let leader = plays.first().map_or(seat, |(s, _)| *s);
        context.current_trick = CurrentTrick {
            leader,
            plays: plays
                .iter()
                .map(|(s, c)| Play {
                    seat: *s,
                    card: card(c),
                })
                .collect(),
        };
        for (s, _) in plays {
            context.cards_remaining[s.index()] -= 1;
        }
        context
    }

    fn decide(context: &RoundContext, phase: DecisionPhase, own: &Hand) -> Action {
        HeuristicPolicy
            .decide(&PolicyContext::new(phase, context, own))
            .unwrap()
    }

    #[test]
    fn trump_strength_counts_bowers() {
        let strength = TrumpStrength::of(&hand(&["JH", "JD", "AH", "9S", "KC"]), Suit::Hearts);
        assert_eq!(strength.count, 3);
        assert!(strength.goes_alone());
        let strength = TrumpStrength::of(&hand(&["JH", "9D", "AH", "9S", "KC"]), Suit::Diamonds);
        assert_eq!(strength.count, 2);
        assert!(!strength.goes_alone());
    }

    #[test]
    fn orders_up_with_two_trump() {
        let context = bidding(PlayerPosition::East, "QS");
        let own = hand(&["JS", "AS", "9H", "10D", "KC"]);
        assert_eq!(
            decide(&context, DecisionPhase::OrderUp, &own),
            Action::OrderUp {
                call: true,
                alone: false
            }
        );
        let weak = hand(&["JS", "9H", "10H", "10D", "KC"]);
        assert_eq!(
            decide(&context, DecisionPhase::OrderUp, &weak),
            Action::OrderUp {
                call: false,
                alone: false
            }
        );
    }

    #[test]
    fn second_round_skips_upcard_suit() {
        let context = bidding(PlayerPosition::South, "QS");
        let own = hand(&["JS", "JC", "AS", "KS", "9H"]);
        // Clubs holds JC and JS as bowers; spades is off the table.
        let (suit, strength) = best_suit(&own, Suit::Spades);
        assert_eq!(suit, Suit::Clubs);
        assert_eq!(strength.count, 2);
        assert_eq!(
            decide(&context, DecisionPhase::CallTrump, &own),
            Action::CallTrump {
                suit: None,
                alone: false
            }
        );
        assert_eq!(
            decide(&context, DecisionPhase::CallTrumpForced, &own),
            Action::CallTrump {
                suit: Some(Suit::Clubs),
                alone: false
            }
        );
    }

    #[test]
    fn discards_weakest_card() {
        let mut context = bidding(PlayerPosition::North, "9H");
        context.trump = Some(Suit::Hearts);
        let own = hand(&["9H", "JD", "AS", "9C", "KC", "AH"]);
        assert_eq!(
            decide(&context, DecisionPhase::Discard, &own),
            Action::Discard { card: card("9C") }
        );
    }

    #[test]
    fn ducks_when_partner_is_winning() {
        let context = playing(
            PlayerPosition::West,
            &[
                (PlayerPosition::North, "9S"),
                (PlayerPosition::East, "AS"),
                (PlayerPosition::South, "10S"),
            ],
        );
        let own = hand(&["KS", "QS", "JH", "9D"]);
        assert_eq!(
            decide(&context, DecisionPhase::PlayCard, &own),
            Action::Play { card: card("QS") }
        );
    }

    #[test]
    fn wins_cheaply_when_opponent_is_winning() {
        let context = playing(
            PlayerPosition::South,
            &[(PlayerPosition::East, "QS")],
        );
        let own = hand(&["KS", "AS", "JH", "9D"]);
        assert_eq!(
            decide(&context, DecisionPhase::PlayCard, &own),
            Action::Play { card: card("KS") }
        );
    }

    #[test]
    fn lone_maker_pulls_top_trump() {
        let mut context = playing(PlayerPosition::East, &[]);
        context.alone = true;
        let own = hand(&["JD", "AH", "AS", "9C", "KC"]);
        assert_eq!(
            decide(&context, DecisionPhase::PlayCard, &own),
            Action::Play { card: card("JD") }
        );
    }

    #[test]
    fn defender_trumps_a_lone_maker_when_void() {
        let mut context = playing(
            PlayerPosition::South,
            &[(PlayerPosition::East, "AS")],
        );
        context.alone = true;
        let own = hand(&["10H", "KH", "AD", "9C", "KC"]);
        assert_eq!(
            decide(&context, DecisionPhase::PlayCard, &own),
            Action::Play { card: card("10H") }
        );
    }

    #[test]
    fn opening_lead_is_best_off_suit() {
        let context = playing(PlayerPosition::East, &[]);
        let own = hand(&["JH", "AS", "10C", "KH", "9D"]);
        assert_eq!(
            decide(&context, DecisionPhase::PlayCard, &own),
            Action::Play { card: card("AS") }
        );
    }

    #[test]
    fn play_without_trump_is_missing_context() {
        let context = bidding(PlayerPosition::East, "9H");
        let own = hand(&["JH"]);
        assert!(
            HeuristicPolicy
                .decide(&PolicyContext::new(DecisionPhase::PlayCard, &context, &own))
                .is_err()
        );
    }
}
