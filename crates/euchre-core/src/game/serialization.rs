use super::match_state::MatchState;
use crate::model::player::PlayerPosition;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchSnapshot {
    pub seed: u64,
    pub round_number: u32,
    pub scores: [u32; 2],
    pub dealer: PlayerPosition,
    #[serde(default = "default_winning_score")]
    pub winning_score: u32,
}

fn default_winning_score() -> u32 {
    super::match_state::DEFAULT_WINNING_SCORE
}

impl MatchSnapshot {
    pub fn capture(state: &MatchState) -> Self {
        MatchSnapshot {
            seed: state.seed(),
            round_number: state.round_number(),
            scores: *state.scores().standings(),
            dealer: state.dealer(),
            winning_score: state.winning_score(),
        }
    }

    /// Restores the match at the start of the captured round.
    pub fn restore(self) -> MatchState {
        let mut state = MatchState::with_seed_round_dealer(self.seed, self.round_number, self.dealer)
            .with_winning_score(self.winning_score);
        state.scores_mut().set_totals(self.scores);
        state
    }

    pub fn to_json(state: &MatchState) -> serde_json::Result<String> {
        let snapshot = Self::capture(state);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
