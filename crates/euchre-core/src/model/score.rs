use crate::model::player::Team;
use serde::{Deserialize, Serialize};

/// How a finished round was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundResultKind {
    /// Makers took fewer than three tricks.
    Euchre,
    /// Makers took three or four tricks.
    Made,
    /// Makers took all five.
    March,
    /// A lone maker took all five.
    LoneMarch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundScore {
    pub team: Team,
    pub points: u32,
    pub kind: RoundResultKind,
}

/// Points for a finished round given the makers and their trick count.
pub fn score_round(makers: Team, maker_tricks: u8, alone: bool) -> RoundScore {
    match maker_tricks {
        0..=2 => RoundScore {
            team: makers.opponent(),
            points: 2,
            kind: RoundResultKind::Euchre,
        },
        3 | 4 => RoundScore {
            team: makers,
            points: 1,
            kind: RoundResultKind::Made,
        },
        _ if alone => RoundScore {
            team: makers,
            points: 4,
            kind: RoundResultKind::LoneMarch,
        },
        _ => RoundScore {
            team: makers,
            points: 2,
            kind: RoundResultKind::March,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreBoard {
    totals: [u32; 2],
}

impl ScoreBoard {
    pub const fn new() -> Self {
        Self { totals: [0; 2] }
    }

    pub fn add(&mut self, team: Team, points: u32) {
        self.totals[team.index()] += points;
    }

    pub fn apply(&mut self, round: RoundScore) {
        self.add(round.team, round.points);
    }

    pub fn set_totals(&mut self, totals: [u32; 2]) {
        self.totals = totals;
    }

    pub fn score(&self, team: Team) -> u32 {
        self.totals[team.index()]
    }

    pub fn standings(&self) -> &[u32; 2] {
        &self.totals
    }

    /// First team at or past `target`, if any.
    pub fn winner(&self, target: u32) -> Option<Team> {
        Team::BOTH
            .iter()
            .copied()
            .filter(|team| self.score(*team) >= target)
            .max_by_key(|team| self.score(*team))
    }
}
