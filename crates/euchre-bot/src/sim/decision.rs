use super::rollout::{bid_out, rollout};
use super::stats::{Controller, StopReason};
use super::{SimError, SimStats, mix_seed};
use crate::config::MonteCarloConfig;
use crate::policy::{Action, DecisionPhase, PolicyContext, PolicyKind, PolicySet};
use euchre_core::model::card::Card;
use euchre_core::model::round::{PlaySetup, RoundState};
use euchre_core::model::suit::Suit;
use euchre_core::world::{SampledWorld, WorldSampler};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{Level, event};

/// One action a decision simulator values by rollouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Candidate {
    OrderUp { call: bool },
    CallTrump { suit: Option<Suit> },
    Play { card: Card },
}

/// Per-candidate means and the reason sampling ended.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionReport {
    pub phase: DecisionPhase,
    pub candidates: Vec<Candidate>,
    pub means: Vec<f64>,
    pub samples: Vec<usize>,
    pub chosen: usize,
    pub passes: usize,
    pub stop: StopReason,
}

impl DecisionReport {
    pub fn chosen_candidate(&self) -> Candidate {
        self.candidates[self.chosen]
    }

    pub fn mean_of(&self, candidate: Candidate) -> Option<f64> {
        self.candidates
            .iter()
            .position(|c| *c == candidate)
            .map(|idx| self.means[idx])
    }
}

/// Values candidate actions by sampling worlds and rolling each candidate out.
pub struct Simulator<'a> {
    config: &'a MonteCarloConfig,
}

impl<'a> Simulator<'a> {
    pub fn new(config: &'a MonteCarloConfig) -> Self {
        Self { config }
    }

    /// Samples until the stop rule fires and reports every candidate's mean.
    pub fn evaluate(
        &self,
        ctx: &PolicyContext,
        stats: &mut SimStats,
    ) -> Result<DecisionReport, SimError> {
        let candidates = candidates(ctx)?;
        let mut controller = Controller::new(candidates.len(), self.config);

        let stop = loop {
            let pass_seed = mix_seed(self.config.seed, controller.passes() as u64);
            let mut rng = SmallRng::seed_from_u64(pass_seed);
            let world =
                WorldSampler::sample_world(ctx.round, ctx.hand, &mut rng, Some(&mut stats.sampling))?;

            let live = controller.live();
            let run = |idx: &usize| {
                let seed = mix_seed(pass_seed, *idx as u64 + 1);
                (*idx, self.run_candidate(ctx, &world, candidates[*idx], seed))
            };
            let results: Vec<(usize, Result<(f64, SimStats), SimError>)> = if self.config.parallel {
                live.par_iter().map(run).collect()
            } else {
                live.iter().map(run).collect()
            };

            for (idx, result) in results {
                let (value, local) = result?;
                controller.record(idx, value);
                stats.merge(&local);
            }
            if let Some(reason) = controller.end_pass() {
                break reason;
            }
        };

        let chosen = controller.best().ok_or(SimError::NoCandidates(ctx.phase))?;
        let accumulators = controller.accumulators();
        let report = DecisionReport {
            phase: ctx.phase,
            means: accumulators.iter().map(|acc| acc.mean()).collect(),
            samples: accumulators.iter().map(|acc| acc.count()).collect(),
            candidates,
            chosen,
            passes: controller.passes(),
            stop,
        };
        log_report(ctx, &report);
        Ok(report)
    }

    /// Turns a report into an action using the call margin and the alone threshold.
    pub fn action_for(&self, report: &DecisionReport) -> Result<Action, SimError> {
        let margin = self.config.call_margin;
        let alone_at = self.config.alone_threshold;
        match report.phase {
            DecisionPhase::OrderUp => {
                let call = report.mean_of(Candidate::OrderUp { call: true });
                let pass = report.mean_of(Candidate::OrderUp { call: false });
                let (Some(call), Some(pass)) = (call, pass) else {
                    return Err(SimError::NoCandidates(report.phase));
                };
                let make = call > pass + margin;
                Ok(Action::OrderUp {
                    call: make,
                    alone: make && call >= alone_at,
                })
            }
            DecisionPhase::CallTrump | DecisionPhase::CallTrumpForced => {
                let mut best: Option<(Suit, f64)> = None;
                for (candidate, mean) in report.candidates.iter().zip(&report.means) {
                    if let Candidate::CallTrump { suit: Some(suit) } = candidate {
                        if best.is_none_or(|(_, top)| *mean > top) {
                            best = Some((*suit, *mean));
                        }
                    }
                }
                let Some((suit, call)) = best else {
                    return Err(SimError::NoCandidates(report.phase));
                };
                let make = match report.mean_of(Candidate::CallTrump { suit: None }) {
                    Some(pass) => call > pass + margin,
                    None => true,
                };
                Ok(Action::CallTrump {
                    suit: make.then_some(suit),
                    alone: make && call >= alone_at,
                })
            }
            DecisionPhase::PlayCard => match report.chosen_candidate() {
                Candidate::Play { card } => Ok(Action::Play { card }),
                _ => Err(SimError::NoCandidates(report.phase)),
            },
            DecisionPhase::Discard => Err(SimError::NoCandidates(report.phase)),
        }
    }

    fn run_candidate(
        &self,
        ctx: &PolicyContext,
        world: &SampledWorld,
        candidate: Candidate,
        seed: u64,
    ) -> Result<(f64, SimStats), SimError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let driver = PolicyKind::from(self.config.rollout_driver);
        let mut policies = PolicySet::uniform(&driver, rng.gen_range(0..u64::MAX))?;
        let mut local = SimStats::new();
        let me = ctx.round.seat;

        let mut round = match candidate {
            Candidate::OrderUp { call } => {
                let mut round = bidding_round(ctx, world)?;
                round.order_up(me, call, false)?;
                bid_out(&mut round, &mut policies, &mut local)?;
                round
            }
            Candidate::CallTrump { suit } => {
                let mut round = bidding_round(ctx, world)?;
                round.call_trump(me, suit, false)?;
                bid_out(&mut round, &mut policies, &mut local)?;
                round
            }
            Candidate::Play { card } => {
                let mut round = playing_round(ctx, world)?;
                round.play_card(me, card)?;
                round
            }
        };

        let outcome = rollout(&mut round, me, &mut policies, &mut local)?;
        local.rollouts += 1;
        Ok((outcome.value(self.config.value), local))
    }
}

fn candidates(ctx: &PolicyContext) -> Result<Vec<Candidate>, SimError> {
    let round = ctx.round;
    let list = match ctx.phase {
        DecisionPhase::OrderUp => vec![
            Candidate::OrderUp { call: true },
            Candidate::OrderUp { call: false },
        ],
        DecisionPhase::CallTrump | DecisionPhase::CallTrumpForced => {
            let mut list: Vec<Candidate> = Suit::ALL
                .into_iter()
                .filter(|suit| *suit != round.upcard.suit)
                .map(|suit| Candidate::CallTrump { suit: Some(suit) })
                .collect();
            if ctx.phase == DecisionPhase::CallTrump && round.seat != round.dealer {
                list.push(Candidate::CallTrump { suit: None });
            }
            list
        }
        DecisionPhase::PlayCard => {
            if round.trump.is_none() {
                return Err(SimError::MissingContext("trump"));
            }
            ctx.legal_plays()
                .into_iter()
                .map(|card| Candidate::Play { card })
                .collect()
        }
        DecisionPhase::Discard => Vec::new(),
    };
    if list.is_empty() {
        return Err(SimError::NoCandidates(ctx.phase));
    }
    Ok(list)
}

/// Fresh round on the sampled hands with every bid before `ctx.round.seat` replayed as a pass.
fn bidding_round(ctx: &PolicyContext, world: &SampledWorld) -> Result<RoundState, SimError> {
    let context = ctx.round;
    let dealer = context.dealer;
    let me = context.seat;
    let mut round = RoundState::from_hands(dealer, world.hands().clone(), context.upcard);

    if ctx.phase != DecisionPhase::OrderUp {
        for offset in 1..=4 {
            round.order_up(dealer.offset(offset), false, false)?;
        }
    }
    let mut seat = dealer.next();
    while seat != me {
        if ctx.phase == DecisionPhase::OrderUp {
            round.order_up(seat, false, false)?;
        } else {
            round.call_trump(seat, None, false)?;
        }
        seat = seat.next();
    }
    Ok(round)
}

fn playing_round(ctx: &PolicyContext, world: &SampledWorld) -> Result<RoundState, SimError> {
    let context = ctx.round;
    let trump = context.trump.ok_or(SimError::MissingContext("trump"))?;
    let maker = context.maker.ok_or(SimError::MissingContext("maker"))?;
    Ok(RoundState::resume_play(PlaySetup {
        dealer: context.dealer,
        upcard: context.upcard,
        hands: world.hands().clone(),
        trump,
        maker,
        alone: context.alone,
        dealer_picked_up: context.dealer_picked_up,
        played: context.played_cards.clone(),
        current_trick: context.current_trick.clone(),
        tricks_won: context.tricks_won,
        voids: context.void_info,
    })?)
}

fn log_report(ctx: &PolicyContext, report: &DecisionReport) {
    if !tracing::enabled!(target: "euchre_bot::monte_carlo", Level::INFO) {
        return;
    }
    let summary = report
        .candidates
        .iter()
        .zip(&report.means)
        .zip(&report.samples)
        .map(|((candidate, mean), n)| format!("{}={mean:.3}/{n}", candidate_label(candidate)))
        .collect::<Vec<_>>()
        .join(",");
    event!(
        target: "euchre_bot::monte_carlo",
        Level::INFO,
        seat = %ctx.round.seat,
        phase = ?report.phase,
        candidates = %summary,
        chosen = %candidate_label(&report.chosen_candidate()),
        passes = report.passes,
        stop = ?report.stop,
    );
}

fn candidate_label(candidate: &Candidate) -> String {
    match candidate {
        Candidate::OrderUp { call: true } => "call".to_string(),
        Candidate::OrderUp { call: false } => "pass".to_string(),
        Candidate::CallTrump { suit: Some(suit) } => suit.to_string(),
        Candidate::CallTrump { suit: None } => "pass".to_string(),
        Candidate::Play { card } => card.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Candidate, DecisionReport, Simulator, candidates};
    use crate::config::MonteCarloConfig;
    use crate::policy::{Action, DecisionPhase, PolicyContext};
    use crate::sim::{SimStats, StopReason};
    use euchre_core::model::card::Card;
    use euchre_core::model::deck::Deck;
    use euchre_core::model::player::PlayerPosition;
    use euchre_core::model::round::RoundState;
    use euchre_core::model::suit::Suit;

    fn report(phase: DecisionPhase, candidates: Vec<Candidate>, means: Vec<f64>) -> DecisionReport {
        let samples = vec![10; candidates.len()];
        DecisionReport {
            phase,
            candidates,
            means,
            samples,
            chosen: 0,
            passes: 10,
            stop: StopReason::MaxSims,
        }
    }

    #[test]
    fn order_up_needs_to_beat_pass_by_margin() {
        let mut config = MonteCarloConfig::default();
        config.call_margin = 0.5;
        let sim = Simulator::new(&config);
        let close = report(
            DecisionPhase::OrderUp,
            vec![
                Candidate::OrderUp { call: true },
                Candidate::OrderUp { call: false },
            ],
            vec![0.4, 0.0],
        );
        assert_eq!(
            sim.action_for(&close).unwrap(),
            Action::OrderUp {
                call: false,
                alone: false
            }
        );
        let strong = report(
            DecisionPhase::OrderUp,
            vec![
                Candidate::OrderUp { call: true },
                Candidate::OrderUp { call: false },
            ],
            vec![3.2, -1.0],
        );
        assert_eq!(
            sim.action_for(&strong).unwrap(),
            Action::OrderUp {
                call: true,
                alone: true
            }
        );
    }

    #[test]
    fn forced_call_always_names_best_suit() {
        let config = MonteCarloConfig::default();
        let sim = Simulator::new(&config);
        let forced = report(
            DecisionPhase::CallTrumpForced,
            vec![
                Candidate::CallTrump {
                    suit: Some(Suit::Hearts),
                },
                Candidate::CallTrump {
                    suit: Some(Suit::Clubs),
                },
                Candidate::CallTrump {
                    suit: Some(Suit::Spades),
                },
            ],
            vec![-2.0, -1.0, -1.0],
        );
        assert_eq!(
            sim.action_for(&forced).unwrap(),
            Action::CallTrump {
                suit: Some(Suit::Clubs),
                alone: false
            }
        );
    }

    #[test]
    fn dealer_has_no_pass_candidate_in_round_two() {
        let mut round = RoundState::deal(&Deck::shuffled_with_seed(5), PlayerPosition::South);
        for seat in [
            PlayerPosition::West,
            PlayerPosition::North,
            PlayerPosition::East,
            PlayerPosition::South,
        ] {
            round.order_up(seat, false, false).unwrap();
        }
        let context = round.context_for(PlayerPosition::West);
        let ctx = PolicyContext::new(
            DecisionPhase::CallTrump,
            &context,
            round.hand(PlayerPosition::West),
        );
        assert_eq!(candidates(&ctx).unwrap().len(), 4);

        let context = round.context_for(PlayerPosition::South);
        let ctx = PolicyContext::new(
            DecisionPhase::CallTrumpForced,
            &context,
            round.hand(PlayerPosition::South),
        );
        let list = candidates(&ctx).unwrap();
        assert_eq!(list.len(), 3);
        assert!(!list.contains(&Candidate::CallTrump { suit: None }));
    }

    #[test]
    fn evaluation_is_reproducible_and_parallel_safe() {
        let mut round = RoundState::deal(&Deck::shuffled_with_seed(17), PlayerPosition::North);
        round.order_up(PlayerPosition::East, true, false).unwrap();
        let discard: Card = round.legal_cards(PlayerPosition::North)[0];
        round.discard(PlayerPosition::North, discard).unwrap();
        let context = round.context_for(PlayerPosition::East);
        let hand = round.hand(PlayerPosition::East).clone();
        let ctx = PolicyContext::new(DecisionPhase::PlayCard, &context, &hand);

        let sequential = MonteCarloConfig::fast().with_seed(99);
        let parallel = sequential.clone().with_parallel(true);
        let a = Simulator::new(&sequential)
            .evaluate(&ctx, &mut SimStats::new())
            .unwrap();
        let b = Simulator::new(&sequential)
            .evaluate(&ctx, &mut SimStats::new())
            .unwrap();
        let c = Simulator::new(&parallel)
            .evaluate(&ctx, &mut SimStats::new())
            .unwrap();
        assert_eq!(a.means, b.means);
        assert_eq!(a.means, c.means);
        assert_eq!(a.chosen, c.chosen);
        assert!(hand.contains(match a.chosen_candidate() {
            Candidate::Play { card } => card,
            other => panic!("unexpected {other:?}"),
        }));
    }

    #[test]
    fn order_up_evaluation_runs_both_candidates() {
        let round = RoundState::deal(&Deck::shuffled_with_seed(23), PlayerPosition::West);
        let seat = PlayerPosition::North;
        let context = round.context_for(seat);
        let ctx = PolicyContext::new(DecisionPhase::OrderUp, &context, round.hand(seat));
        let config = MonteCarloConfig::fast().with_seed(4);
        let mut stats = SimStats::new();
        let report = Simulator::new(&config).evaluate(&ctx, &mut stats).unwrap();
        assert_eq!(report.candidates.len(), 2);
        assert!(report.samples.iter().all(|n| *n >= 1));
        assert!(stats.rollouts >= 2);
        assert_eq!(stats.sampling.samples, report.passes);
        assert!(Simulator::new(&config).action_for(&report).is_ok());
    }
}
