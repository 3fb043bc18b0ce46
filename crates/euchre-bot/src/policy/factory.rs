use super::{Action, HeuristicPolicy, MonteCarloPolicy, Policy, PolicyContext, PolicyError, SoftmaxPolicy};
use crate::config::{ConfigError, MonteCarloConfig, RolloutDriver, default_temperature};
use crate::sim::mix_seed;
use euchre_core::model::player::PlayerPosition;
use serde::{Deserialize, Serialize};

/// Serializable description of a policy, used by configs and rollouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyKind {
    Heuristic,
    Softmax {
        #[serde(default = "default_temperature")]
        temperature: f64,
    },
    MonteCarlo {
        #[serde(default)]
        config: Box<MonteCarloConfig>,
    },
}

impl From<RolloutDriver> for PolicyKind {
    fn from(driver: RolloutDriver) -> Self {
        match driver {
            RolloutDriver::Heuristic => PolicyKind::Heuristic,
            RolloutDriver::Softmax { temperature } => PolicyKind::Softmax { temperature },
        }
    }
}

/// Builds the policy `kind` describes, rejecting settings it cannot run with.
pub fn build_policy(kind: &PolicyKind, seed: u64) -> Result<Box<dyn Policy>, ConfigError> {
    match kind {
        PolicyKind::Heuristic => Ok(Box::new(HeuristicPolicy::new())),
        PolicyKind::Softmax { temperature } => {
            if !(temperature.is_finite() && *temperature > 0.0) {
                return Err(ConfigError::Temperature(*temperature));
            }
            Ok(Box::new(SoftmaxPolicy::new(*temperature, seed)))
        }
        PolicyKind::MonteCarlo { config } => {
            config.validate()?;
            let config = config.as_ref().clone();
            let seed = mix_seed(config.seed, seed);
            Ok(Box::new(MonteCarloPolicy::new(config.with_seed(seed))))
        }
    }
}

/// One policy per seat, indexed by [`PlayerPosition::index`].
pub struct PolicySet {
    seats: [Box<dyn Policy>; 4],
}

impl PolicySet {
    pub fn new(seats: [Box<dyn Policy>; 4]) -> Self {
        Self { seats }
    }

    /// Same kind at every seat, each with its own seed.
    pub fn uniform(kind: &PolicyKind, seed: u64) -> Result<Self, ConfigError> {
        Self::from_kinds(&[kind.clone(), kind.clone(), kind.clone(), kind.clone()], seed)
    }

    pub fn from_kinds(kinds: &[PolicyKind; 4], seed: u64) -> Result<Self, ConfigError> {
        let [north, east, south, west] = PlayerPosition::LOOP
            .map(|seat| build_policy(&kinds[seat.index()], mix_seed(seed, seat.index() as u64)));
        Ok(Self::new([north?, east?, south?, west?]))
    }

    pub fn policy_mut(&mut self, seat: PlayerPosition) -> &mut dyn Policy {
        self.seats[seat.index()].as_mut()
    }

    pub fn name(&self, seat: PlayerPosition) -> &'static str {
        self.seats[seat.index()].name()
    }

    pub fn decide(
        &mut self,
        seat: PlayerPosition,
        ctx: &PolicyContext,
    ) -> Result<Action, PolicyError> {
        self.seats[seat.index()].decide(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::{PolicyKind, PolicySet, build_policy};
    use crate::config::{ConfigError, MonteCarloConfig, RolloutDriver};
    use euchre_core::model::player::PlayerPosition;

    #[test]
    fn kinds_deserialize_from_tagged_json() {
        let kind: PolicyKind = serde_json::from_str(r#"{"kind":"softmax"}"#).unwrap();
        assert_eq!(kind, PolicyKind::Softmax { temperature: 0.35 });
        let kind: PolicyKind =
            serde_json::from_str(r#"{"kind":"monte_carlo","config":{"max_sims":30}}"#).unwrap();
        match kind {
            PolicyKind::MonteCarlo { config } => assert_eq!(config.max_sims, 30),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn driver_converts_to_kind() {
        assert_eq!(
            PolicyKind::from(RolloutDriver::Softmax { temperature: 1.0 }),
            PolicyKind::Softmax { temperature: 1.0 }
        );
    }

    #[test]
    fn set_reports_seat_policies() {
        let kinds = [
            PolicyKind::Heuristic,
            PolicyKind::Softmax { temperature: 0.5 },
            PolicyKind::Heuristic,
            PolicyKind::Softmax { temperature: 0.5 },
        ];
        let set = PolicySet::from_kinds(&kinds, 3).unwrap();
        assert_eq!(set.name(PlayerPosition::North), "heuristic");
        assert_eq!(set.name(PlayerPosition::East), "softmax");
    }

    #[test]
    fn unrunnable_settings_are_rejected() {
        let kind: PolicyKind =
            serde_json::from_str(r#"{"kind":"monte_carlo","config":{"min_sims":0}}"#).unwrap();
        assert_eq!(
            build_policy(&kind, 1).err(),
            Some(ConfigError::MinSimsTooSmall(0))
        );
        assert!(matches!(
            PolicySet::uniform(&PolicyKind::Softmax { temperature: 0.0 }, 1),
            Err(ConfigError::Temperature(_))
        ));

        let fast = PolicyKind::MonteCarlo {
            config: Box::new(MonteCarloConfig::fast()),
        };
        let policy = build_policy(&fast, 1).unwrap();
        assert_eq!(policy.name(), "monte_carlo");
    }
}
