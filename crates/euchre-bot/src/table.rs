//! Live turn loop: asks each seat's policy for the action the round expects and applies it.

use crate::policy::{Action, DecisionPhase, Policy, PolicyContext, PolicyError};
use euchre_core::model::player::{PlayerPosition, Team};
use euchre_core::model::round::{BidError, PlayError, RoundPhase, RoundState};
use euchre_core::model::score::RoundScore;
use euchre_core::model::suit::Suit;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{Level, event, warn};

pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum RuleViolation {
    #[error(transparent)]
    Bid(#[from] BidError),
    #[error(transparent)]
    Play(#[from] PlayError),
    #[error("{action:?} does not answer a {phase:?} request")]
    WrongAction { phase: DecisionPhase, action: Action },
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("{seat}'s policy failed: {source}")]
    Policy {
        seat: PlayerPosition,
        #[source]
        source: PolicyError,
    },
    #[error("{seat} made an illegal move: {source}")]
    IllegalAction {
        seat: PlayerPosition,
        #[source]
        source: RuleViolation,
    },
    #[error("{seat} gave no legal action in {attempts} attempts")]
    AttemptsExhausted { seat: PlayerPosition, attempts: usize },
    #[error("round stopped in {0:?} without a result")]
    Unfinished(RoundPhase),
}

/// A seat's decision maker plus whether its mistakes are bugs or input errors.
pub struct SeatActor {
    policy: Box<dyn Policy>,
    automated: bool,
}

impl SeatActor {
    /// Bot seat: an illegal action is a hard error.
    pub fn automated(policy: Box<dyn Policy>) -> Self {
        Self {
            policy,
            automated: true,
        }
    }

    /// Human or remote seat: illegal actions are re-asked up to the attempt limit.
    pub fn untrusted(policy: Box<dyn Policy>) -> Self {
        Self {
            policy,
            automated: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn is_automated(&self) -> bool {
        self.automated
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionMetrics {
    pub decisions: u32,
    /// Order-up and call-trump decisions among `decisions`.
    pub bids: u32,
    pub total: Duration,
}

impl DecisionMetrics {
    fn record(&mut self, phase: DecisionPhase, duration: Duration) {
        self.total += duration;
        self.decisions += 1;
        if phase.is_bid() {
            self.bids += 1;
        }
    }

    pub fn avg_ms(&self) -> f64 {
        if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        }
    }
}

/// Result of one round played at the table.
#[derive(Debug, Clone)]
pub struct RoundReport {
    pub score: RoundScore,
    pub maker: PlayerPosition,
    pub trump: Suit,
    pub alone: bool,
    pub tricks: [u8; 2],
    /// Illegal actions that were re-asked.
    pub retries: usize,
    pub metrics: [DecisionMetrics; 4],
}

impl RoundReport {
    pub fn maker_team(&self) -> Team {
        self.maker.team()
    }

    pub fn euchred(&self) -> bool {
        self.score.team != self.maker.team()
    }
}

pub struct Table {
    seats: [SeatActor; 4],
    max_attempts: usize,
}

impl Table {
    pub fn new(seats: [SeatActor; 4]) -> Self {
        Self {
            seats,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn seat(&self, seat: PlayerPosition) -> &SeatActor {
        &self.seats[seat.index()]
    }

    /// Drives `round` from bidding to the final trick.
    pub fn play_round(&mut self, round: &mut RoundState) -> Result<RoundReport, TableError> {
        let mut metrics = [DecisionMetrics::default(); 4];
        let mut retries = 0usize;

        while let Some(seat) = round.to_act() {
            let phase = match round.phase() {
                RoundPhase::OrderUp => DecisionPhase::OrderUp,
                RoundPhase::CallTrump if seat == round.dealer() => DecisionPhase::CallTrumpForced,
                RoundPhase::CallTrump => DecisionPhase::CallTrump,
                RoundPhase::Discard => DecisionPhase::Discard,
                RoundPhase::Playing => DecisionPhase::PlayCard,
                RoundPhase::Complete => break,
            };

            let mut attempts = 0usize;
            loop {
                attempts += 1;
                let actor = &mut self.seats[seat.index()];
                let action = {
                    let context = round.context_for(seat);
                    let ctx = PolicyContext::new(phase, &context, round.hand(seat));
                    let start = Instant::now();
                    let action = actor
                        .policy
                        .decide(&ctx)
                        .map_err(|source| TableError::Policy { seat, source })?;
                    metrics[seat.index()].record(phase, start.elapsed());
                    action
                };

                let Err(violation) = apply(round, seat, phase, action) else {
                    break;
                };
                if actor.automated {
                    return Err(TableError::IllegalAction {
                        seat,
                        source: violation,
                    });
                }
                warn!(
                    seat = %seat,
                    attempt = attempts,
                    error = %violation,
                    "illegal action; asking again"
                );
                retries += 1;
                if attempts >= self.max_attempts {
                    return Err(TableError::AttemptsExhausted { seat, attempts });
                }
            }
        }

        let (Some(score), Some(maker), Some(trump)) = (round.score(), round.maker(), round.trump())
        else {
            return Err(TableError::Unfinished(round.phase()));
        };
        let report = RoundReport {
            score,
            maker,
            trump,
            alone: round.alone(),
            tricks: [
                round.tricks_won(Team::NorthSouth),
                round.tricks_won(Team::EastWest),
            ],
            retries,
            metrics,
        };
        event!(
            target: "euchre_bot::table",
            Level::INFO,
            dealer = %round.dealer(),
            maker = %maker,
            trump = %trump,
            alone = report.alone,
            ns_tricks = report.tricks[0],
            ew_tricks = report.tricks[1],
            scoring_team = %score.team,
            points = score.points,
            bids = metrics.iter().map(|m| m.bids).sum::<u32>(),
            retries,
        );
        Ok(report)
    }
}

fn apply(
    round: &mut RoundState,
    seat: PlayerPosition,
    phase: DecisionPhase,
    action: Action,
) -> Result<(), RuleViolation> {
    match (phase, action) {
        (DecisionPhase::OrderUp, Action::OrderUp { call, alone }) => {
            round.order_up(seat, call, call && alone)?;
        }
        (DecisionPhase::CallTrump | DecisionPhase::CallTrumpForced, Action::CallTrump { suit, alone }) => {
            round.call_trump(seat, suit, suit.is_some() && alone)?;
        }
        (DecisionPhase::Discard, Action::Discard { card }) => {
            round.discard(seat, card)?;
        }
        (DecisionPhase::PlayCard, Action::Play { card }) => {
            round.play_card(seat, card)?;
        }
        (phase, action) => return Err(RuleViolation::WrongAction { phase, action }),
    }
    Ok(())
}
