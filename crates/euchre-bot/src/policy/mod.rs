mod factory;
mod heuristic;
mod monte;
mod softmax;

pub use factory::{PolicyKind, PolicySet, build_policy};
pub use heuristic::{HeuristicPolicy, TrumpStrength};
pub(crate) use heuristic::{best_suit, lowest};
pub use monte::MonteCarloPolicy;
pub use softmax::SoftmaxPolicy;

use crate::sim::SimError;
use euchre_core::model::card::Card;
use euchre_core::model::context::RoundContext;
use euchre_core::model::hand::Hand;
use euchre_core::model::suit::Suit;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which decision a seat is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPhase {
    OrderUp,
    CallTrump,
    /// Dealer in the second round after three passes; passing is not allowed.
    CallTrumpForced,
    Discard,
    PlayCard,
}

impl DecisionPhase {
    pub fn is_bid(self) -> bool {
        matches!(
            self,
            Self::OrderUp | Self::CallTrump | Self::CallTrumpForced
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    OrderUp { call: bool, alone: bool },
    CallTrump { suit: Option<Suit>, alone: bool },
    Discard { card: Card },
    Play { card: Card },
}

impl Action {
    /// Whether this action answers a request for `phase`.
    pub fn fits(&self, phase: DecisionPhase) -> bool {
        match (self, phase) {
            (Action::OrderUp { .. }, DecisionPhase::OrderUp) => true,
            (Action::CallTrump { .. }, DecisionPhase::CallTrump) => true,
            (Action::CallTrump { suit: Some(_), .. }, DecisionPhase::CallTrumpForced) => true,
            (Action::Discard { .. }, DecisionPhase::Discard) => true,
            (Action::Play { .. }, DecisionPhase::PlayCard) => true,
            _ => false,
        }
    }
}

/// Context provided to policies for decision-making
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub phase: DecisionPhase,
    pub round: &'a RoundContext,
    pub hand: &'a Hand,
}

impl<'a> PolicyContext<'a> {
    pub fn new(phase: DecisionPhase, round: &'a RoundContext, hand: &'a Hand) -> Self {
        Self { phase, round, hand }
    }

    /// Trump for phases that require it.
    pub fn trump(&self) -> Result<Suit, PolicyError> {
        self.round
            .trump
            .ok_or(PolicyError::MissingContext("trump"))
    }

    pub fn legal_plays(&self) -> Vec<Card> {
        self.round.legal_plays(self.hand.cards())
    }
}

/// Owned decision request as it arrives from the surrounding system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub phase: DecisionPhase,
    pub context: RoundContext,
    pub hand: Hand,
}

impl DecisionRequest {
    pub fn as_policy_context(&self) -> PolicyContext<'_> {
        PolicyContext::new(self.phase, &self.context, &self.hand)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("decision context is missing {0}")]
    MissingContext(&'static str),
    #[error("no legal card in a hand of {0}")]
    NoLegalCard(usize),
    #[error("simulation failed: {0}")]
    Simulation(Box<SimError>),
}

impl From<SimError> for PolicyError {
    fn from(err: SimError) -> Self {
        PolicyError::Simulation(Box::new(err))
    }
}

/// Unified interface for bidding and card-play decisions.
pub trait Policy: Send {
    fn name(&self) -> &'static str;

    fn decide(&mut self, ctx: &PolicyContext) -> Result<Action, PolicyError>;
}
