pub mod config;
pub mod policy;
pub mod sim;
pub mod table;

pub use config::{ConfigError, MonteCarloConfig, RolloutDriver, ValueMeasure};
pub use policy::{
    Action, DecisionPhase, DecisionRequest, HeuristicPolicy, MonteCarloPolicy, Policy,
    PolicyContext, PolicyError, PolicyKind, PolicySet, SoftmaxPolicy, build_policy,
};
pub use sim::{RolloutOutcome, SimError, SimStats};
pub use table::{RoundReport, SeatActor, Table, TableError};
