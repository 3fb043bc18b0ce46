use super::{SimError, SimStats};
use crate::config::ValueMeasure;
use crate::policy::{Action, DecisionPhase, PolicyContext, PolicySet, best_suit, lowest};
use euchre_core::model::card::Card;
use euchre_core::model::player::{PlayerPosition, Team};
use euchre_core::model::round::{PlayOutcome, RoundPhase, RoundState};
use euchre_core::world::validate_world;
use serde::Serialize;
use tracing::{debug, trace};

/// Result of one simulated round, signed from the perspective team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RolloutOutcome {
    /// Own tricks minus opponent tricks.
    pub tricks: i8,
    /// Round points, negative when the opponents scored.
    pub points: i8,
}

impl RolloutOutcome {
    pub fn from_round(round: &RoundState, perspective: Team) -> Option<Self> {
        let score = round.score()?;
        let own = round.tricks_won(perspective) as i8;
        let theirs = round.tricks_won(perspective.opponent()) as i8;
        let points = score.points as i8;
        Some(Self {
            tricks: own - theirs,
            points: if score.team == perspective { points } else { -points },
        })
    }

    pub fn value(&self, measure: ValueMeasure) -> f64 {
        match measure {
            ValueMeasure::Tricks => f64::from(self.tricks),
            ValueMeasure::Points => f64::from(self.points),
        }
    }
}

/// Plays the remaining tricks of `round` with `policies` and scores it for `perspective`.
///
/// A proposal that is not a legal card is replaced by the first legal card.
/// Card conservation is checked after every completed trick.
pub fn rollout(
    round: &mut RoundState,
    perspective: PlayerPosition,
    policies: &mut PolicySet,
    stats: &mut SimStats,
) -> Result<RolloutOutcome, SimError> {
    while round.phase() == RoundPhase::Playing {
        let seat = round
            .to_act()
            .ok_or(SimError::MissingContext("seat to act"))?;
        let legal = round.legal_cards(seat);
        let first = *legal.first().ok_or(SimError::NoLegalCard(seat))?;

        let action = {
            let context = round.context_for(seat);
            let ctx = PolicyContext::new(DecisionPhase::PlayCard, &context, round.hand(seat));
            policies.decide(seat, &ctx)?
        };
        let card = match action {
            Action::Play { card } if legal.contains(&card) => card,
            other => {
                stats.illegal_corrections += 1;
                debug!(
                    seat = %seat,
                    policy = policies.name(seat),
                    proposed = ?other,
                    substitute = %first,
                    "rollout proposal was not a legal play"
                );
                first
            }
        };

        match round.play_card(seat, card)? {
            PlayOutcome::Played => {}
            PlayOutcome::TrickCompleted { .. } | PlayOutcome::RoundCompleted { .. } => {
                let open: Vec<Card> = round
                    .current_trick()
                    .map(|trick| trick.cards().collect())
                    .unwrap_or_default();
                validate_world(round.hands(), round.played_cards(), &open)?;
            }
        }
    }

    let outcome = RolloutOutcome::from_round(round, perspective.team())
        .ok_or(SimError::MissingContext("finished round score"))?;
    trace!(
        perspective = %perspective,
        tricks = outcome.tricks,
        points = outcome.points,
        "rollout finished"
    );
    Ok(outcome)
}

/// Runs the remaining bidding and the dealer's discard with `policies`.
///
/// Returns once the round reaches the playing phase.
pub fn bid_out(
    round: &mut RoundState,
    policies: &mut PolicySet,
    stats: &mut SimStats,
) -> Result<(), SimError> {
    loop {
        let phase = round.phase();
        let Some(seat) = round.to_act() else {
            return Ok(());
        };
        let decision = match phase {
            RoundPhase::OrderUp => DecisionPhase::OrderUp,
            RoundPhase::CallTrump if seat == round.dealer() => DecisionPhase::CallTrumpForced,
            RoundPhase::CallTrump => DecisionPhase::CallTrump,
            RoundPhase::Discard => DecisionPhase::Discard,
            RoundPhase::Playing | RoundPhase::Complete => return Ok(()),
        };

        let action = {
            let context = round.context_for(seat);
            let ctx = PolicyContext::new(decision, &context, round.hand(seat));
            policies.decide(seat, &ctx)?
        };
        let upcard_suit = round.upcard().suit;

        match (decision, action) {
            (DecisionPhase::OrderUp, Action::OrderUp { call, alone }) => {
                round.order_up(seat, call, call && alone)?;
            }
            (
                DecisionPhase::CallTrump | DecisionPhase::CallTrumpForced,
                Action::CallTrump { suit, alone },
            ) if action.fits(decision) && suit != Some(upcard_suit) => {
                round.call_trump(seat, suit, suit.is_some() && alone)?;
            }
            (DecisionPhase::Discard, Action::Discard { card }) if round.hand(seat).contains(card) => {
                round.discard(seat, card)?;
            }
            (_, proposed) => {
                stats.illegal_corrections += 1;
                debug!(
                    seat = %seat,
                    phase = ?decision,
                    proposed = ?proposed,
                    "rollout bid did not fit the phase; using the fallback"
                );
                fallback_bid(round, seat, decision)?;
            }
        }
    }
}

fn fallback_bid(
    round: &mut RoundState,
    seat: PlayerPosition,
    phase: DecisionPhase,
) -> Result<(), SimError> {
    match phase {
        DecisionPhase::OrderUp => {
            round.order_up(seat, false, false)?;
        }
        DecisionPhase::CallTrump => {
            round.call_trump(seat, None, false)?;
        }
        DecisionPhase::CallTrumpForced => {
            let (suit, _) = best_suit(round.hand(seat), round.upcard().suit);
            round.call_trump(seat, Some(suit), false)?;
        }
        DecisionPhase::Discard => {
            let trump = round.trump().ok_or(SimError::MissingContext("trump"))?;
            let card = lowest(round.hand(seat).cards(), trump)?;
            round.discard(seat, card)?;
        }
        DecisionPhase::PlayCard => return Err(SimError::MissingContext("bidding phase")),
    }
    Ok(())
}
