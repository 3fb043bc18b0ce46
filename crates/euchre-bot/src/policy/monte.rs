use super::{Action, DecisionPhase, HeuristicPolicy, Policy, PolicyContext, PolicyError};
use crate::config::MonteCarloConfig;
use crate::sim::{DecisionReport, SimStats, Simulator, mix_seed};

/// Chooses bids and plays by rolling out sampled worlds for every candidate.
///
/// Discards are left to the heuristic. Each decision draws a fresh seed from
/// the configured seed and a decision counter, so a policy replays the same
/// choices when fed the same sequence of requests.
pub struct MonteCarloPolicy {
    config: MonteCarloConfig,
    stats: SimStats,
    decisions: u64,
    last_report: Option<DecisionReport>,
}

impl MonteCarloPolicy {
    pub fn new(config: MonteCarloConfig) -> Self {
        Self {
            config,
            stats: SimStats::new(),
            decisions: 0,
            last_report: None,
        }
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Report for the most recent simulated decision.
    pub fn last_report(&self) -> Option<&DecisionReport> {
        self.last_report.as_ref()
    }

    fn simulate(&mut self, ctx: &PolicyContext) -> Result<Action, PolicyError> {
        let config = self
            .config
            .clone()
            .with_seed(mix_seed(self.config.seed, self.decisions));
        self.decisions += 1;
        let simulator = Simulator::new(&config);
        let report = simulator.evaluate(ctx, &mut self.stats)?;
        let action = simulator.action_for(&report)?;
        self.stats.decisions += 1;
        self.last_report = Some(report);
        Ok(action)
    }
}

impl Policy for MonteCarloPolicy {
    fn name(&self) -> &'static str {
        "monte_carlo"
    }

    fn decide(&mut self, ctx: &PolicyContext) -> Result<Action, PolicyError> {
        match ctx.phase {
            DecisionPhase::Discard => HeuristicPolicy::new().decide(ctx),
            DecisionPhase::PlayCard => {
                ctx.trump()?;
                match ctx.legal_plays().as_slice() {
                    [] => Err(PolicyError::NoLegalCard(ctx.hand.len())),
                    [only] => Ok(Action::Play { card: *only }),
                    _ => self.simulate(ctx),
                }
            }
            DecisionPhase::OrderUp | DecisionPhase::CallTrump | DecisionPhase::CallTrumpForced => {
                self.simulate(ctx)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MonteCarloPolicy;
    use crate::config::MonteCarloConfig;
    use crate::policy::{Action, DecisionPhase, Policy, PolicyContext};
    use euchre_core::model::deck::Deck;
    use euchre_core::model::player::PlayerPosition;
    use euchre_core::model::round::RoundState;

    #[test]
    fn discard_is_delegated_without_simulating() {
        let mut round = RoundState::deal(&Deck::shuffled_with_seed(2), PlayerPosition::East);
        round.order_up(PlayerPosition::South, true, false).unwrap();
        let dealer = PlayerPosition::East;
        let context = round.context_for(dealer);
        let mut policy = MonteCarloPolicy::new(MonteCarloConfig::fast());
        let action = policy
            .decide(&PolicyContext::new(
                DecisionPhase::Discard,
                &context,
                round.hand(dealer),
            ))
            .unwrap();
        match action {
            Action::Discard { card } => assert!(round.hand(dealer).contains(card)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(policy.stats().rollouts, 0);
        assert!(policy.last_report().is_none());
    }

    #[test]
    fn bids_are_simulated_and_recorded() {
        let round = RoundState::deal(&Deck::shuffled_with_seed(8), PlayerPosition::East);
        let seat = PlayerPosition::South;
        let context = round.context_for(seat);
        let mut policy = MonteCarloPolicy::new(MonteCarloConfig::fast().with_seed(3));
        let action = policy
            .decide(&PolicyContext::new(
                DecisionPhase::OrderUp,
                &context,
                round.hand(seat),
            ))
            .unwrap();
        assert!(matches!(action, Action::OrderUp { .. }));
        assert_eq!(policy.stats().decisions, 1);
        assert!(policy.stats().rollouts >= 2);
        assert!(policy.last_report().is_some());
    }

    #[test]
    fn play_without_trump_is_missing_context() {
        let round = RoundState::deal(&Deck::shuffled_with_seed(8), PlayerPosition::East);
        let seat = PlayerPosition::South;
        let context = round.context_for(seat);
        let mut policy = MonteCarloPolicy::new(MonteCarloConfig::fast());
        assert!(
            policy
                .decide(&PolicyContext::new(
                    DecisionPhase::PlayCard,
                    &context,
                    round.hand(seat),
                ))
                .is_err()
        );
    }
}
