use std::fs;
use std::path::Path;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::{AgentKind, BenchmarkConfig};
use crate::tournament::{GameOutcome, TeamTally};

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Folds game outcomes into per-team results.
pub struct AnalyticsCollector {
    agents: Vec<AgentAccumulator>,
    games: usize,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Self {
        Self {
            agents: config
                .teams
                .iter()
                .map(|team| AgentAccumulator::new(team.name.clone(), team.kind, team.params.clone()))
                .collect(),
            games: 0,
        }
    }

    pub fn record_game(&mut self, outcome: &GameOutcome) {
        self.games += 1;
        for (idx, acc) in self.agents.iter_mut().enumerate() {
            acc.record_game(
                outcome.winner == idx,
                outcome.margin(idx) as f64,
                &outcome.teams[idx].tally,
            );
        }
    }

    pub fn finalize(self) -> AnalyticsSummary {
        let games = self.games;
        let first_wins = self.agents.first().map_or(0, |acc| acc.wins);
        AnalyticsSummary {
            games,
            p_value: two_sided_p_value(first_wins, games),
            agents: self
                .agents
                .into_iter()
                .map(AgentAccumulator::into_report)
                .collect(),
        }
    }
}

struct AgentAccumulator {
    name: String,
    kind: AgentKind,
    params: serde_yaml::Value,
    games: usize,
    wins: usize,
    margins: Vec<f64>,
    totals: TeamTally,
}

impl AgentAccumulator {
    fn new(name: String, kind: AgentKind, params: serde_yaml::Value) -> Self {
        Self {
            name,
            kind,
            params,
            games: 0,
            wins: 0,
            margins: Vec::new(),
            totals: TeamTally::default(),
        }
    }

    fn record_game(&mut self, won: bool, margin: f64, tally: &TeamTally) {
        self.games += 1;
        if won {
            self.wins += 1;
        }
        self.margins.push(margin);

        let totals = &mut self.totals;
        totals.calls += tally.calls;
        totals.alone_calls += tally.alone_calls;
        totals.made += tally.made;
        totals.marches += tally.marches;
        totals.lone_marches += tally.lone_marches;
        totals.euchred += tally.euchred;
        totals.euchres += tally.euchres;
        totals.decisions += tally.decisions;
        totals.decision_time += tally.decision_time;
    }

    fn into_report(self) -> AgentReport {
        let win_rate = if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        };
        let avg_margin = if self.margins.is_empty() {
            0.0
        } else {
            self.margins.iter().sum::<f64>() / self.margins.len() as f64
        };

        AgentReport {
            win_ci95: win_rate_interval(self.wins, self.games),
            margin_ci95: confidence_interval(&self.margins),
            average_ms_per_decision: self.totals.avg_ms_per_decision(),
            name: self.name,
            kind: self.kind,
            params: self.params,
            games: self.games,
            wins: self.wins,
            win_rate,
            avg_margin,
            calls: self.totals.calls,
            alone_calls: self.totals.alone_calls,
            marches: self.totals.marches,
            lone_marches: self.totals.lone_marches,
            euchred: self.totals.euchred,
            euchres: self.totals.euchres,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub params: serde_yaml::Value,
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub win_ci95: (f64, f64),
    /// Average final score margin over the opponent.
    pub avg_margin: f64,
    pub margin_ci95: (f64, f64),
    pub calls: u32,
    pub alone_calls: u32,
    pub marches: u32,
    pub lone_marches: u32,
    pub euchred: u32,
    pub euchres: u32,
    pub average_ms_per_decision: f64,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub games: usize,
    pub agents: Vec<AgentReport>,
    /// Two-sided p-value against both teams being equally strong.
    pub p_value: f64,
}

impl AnalyticsSummary {
    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Tournament Summary\n\n");
        rows.push_str(&format!(
            "Games: {}; two-sided p-value (equal strength): {:.4}\n\n",
            self.games, self.p_value
        ));
        rows.push_str("| Team | Kind | Games | Win % | 95% CI | Avg margin | Margin CI | Calls | Alone | Marches | Lone marches | Euchred | Euchres | Avg ms/decision |\n");
        rows.push_str("|------|------|-------|-------|--------|------------|-----------|-------|-------|---------|--------------|---------|---------|-----------------|\n");

        for agent in &self.agents {
            rows.push_str(&format!(
                "| {name} | {kind:?} | {games} | {win:.1}% | [{win_low:.1}%, {win_high:.1}%] | {margin:+.2} | [{m_low:+.2}, {m_high:+.2}] | {calls} | {alone} | {marches} | {lone} | {euchred} | {euchres} | {latency:.2} |\n",
                name = agent.name,
                kind = agent.kind,
                games = agent.games,
                win = agent.win_rate * 100.0,
                win_low = agent.win_ci95.0 * 100.0,
                win_high = agent.win_ci95.1 * 100.0,
                margin = agent.avg_margin,
                m_low = agent.margin_ci95.0,
                m_high = agent.margin_ci95.1,
                calls = agent.calls,
                alone = agent.alone_calls,
                marches = agent.marches,
                lone = agent.lone_marches,
                euchred = agent.euchred,
                euchres = agent.euchres,
                latency = agent.average_ms_per_decision,
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }
}

/// Normal-approximation interval for a win rate, clamped to `[0, 1]`.
pub fn win_rate_interval(wins: usize, games: usize) -> (f64, f64) {
    if games == 0 {
        return (0.0, 0.0);
    }
    let n = games as f64;
    let p = wins as f64 / n;
    let margin = CONFIDENCE_Z * (p * (1.0 - p) / n).sqrt();
    ((p - margin).max(0.0), (p + margin).min(1.0))
}

/// Two-sided p-value of `wins` out of `games` under a fair coin.
pub fn two_sided_p_value(wins: usize, games: usize) -> f64 {
    if games == 0 {
        return 1.0;
    }
    let n = games as f64;
    let z = (wins as f64 - n / 2.0) / (n / 4.0).sqrt();
    match Normal::new(0.0, 1.0) {
        Ok(normal) => (2.0 * (1.0 - normal.cdf(z.abs()))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = points.iter().sum::<f64>() / points.len() as f64;
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}
