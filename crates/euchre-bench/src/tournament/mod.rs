mod seating;

pub use seating::Seating;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analytics::{AnalyticsCollector, AnalyticsError, AnalyticsSummary};
use crate::config::{AgentConfig, BenchmarkConfig, ResolvedOutputs, ValidationError};
use euchre_bot::policy::{PolicyKind, build_policy};
use euchre_bot::sim::mix_seed;
use euchre_bot::table::{RoundReport, SeatActor, Table, TableError};
use euchre_core::game::match_state::MatchState;
use euchre_core::model::player::{PlayerPosition, Team};
use euchre_core::model::score::RoundResultKind;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

/// Games that run past this many rounds are treated as stuck.
const MAX_ROUNDS_PER_GAME: u32 = 500;

/// Primary entry point for orchestrating tournaments.
pub struct TournamentRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<TeamAgent>,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub analytics: AnalyticsSummary,
}

impl TournamentRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let agents = config
            .teams
            .iter()
            .map(TeamAgent::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        if agents.len() != 2 {
            return Err(RunnerError::TeamCount {
                found: agents.len(),
            });
        }

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            agents,
        })
    }

    /// Execute the tournament, streaming one JSONL row per game to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.matches.seed.unwrap_or(0));
        let mut analytics = AnalyticsCollector::new(&self.config);
        let swap = self.config.matches.swap_seats;
        let mut rows_written = 0usize;
        let mut deal_seed = 0u64;

        for game_index in 0..self.config.matches.games {
            if Seating::fresh_deal(game_index, swap) {
                deal_seed = rng.next_u64();
            }
            let seating = Seating::for_game(game_index, swap);
            let outcome = self.play_game(game_index, deal_seed, seating)?;
            analytics.record_game(&outcome);
            write_game_row(&mut writer, &self.config.run_id, &outcome)?;
            rows_written += 1;
        }

        writer.flush()?;

        let summary = analytics.finalize();
        summary.write_markdown(&self.outputs.summary_md)?;

        Ok(RunSummary {
            games_played: self.config.matches.games,
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            analytics: summary,
        })
    }

    fn play_game(
        &self,
        game_index: usize,
        deal_seed: u64,
        seating: Seating,
    ) -> Result<GameOutcome, RunnerError> {
        let [north, east, south, west] = PlayerPosition::LOOP.map(|seat| {
            let agent = &self.agents[seating.agent_at(seat)];
            build_policy(&agent.kind, mix_seed(deal_seed, seat.index() as u64))
                .map(SeatActor::automated)
        });
        let mut table = Table::new([north?, east?, south?, west?]);
        let mut match_state = MatchState::with_seed(seating.first_dealer, deal_seed)
            .with_winning_score(self.config.matches.winning_score);
        let mut tallies = [TeamTally::default(); 2];

        while !match_state.is_over() {
            let round_number = match_state.round_number();
            if round_number > MAX_ROUNDS_PER_GAME {
                return Err(RunnerError::RoundLimit {
                    game_index,
                    limit: MAX_ROUNDS_PER_GAME,
                });
            }

            let report = table
                .play_round(match_state.round_mut())
                .map_err(|source| RunnerError::Table {
                    game_index,
                    round: round_number,
                    source,
                })?;
            for (agent, tally) in tallies.iter_mut().enumerate() {
                tally.record(&report, seating.side_of(agent));
            }

            match_state.finish_round_and_start_next().ok_or_else(|| {
                RunnerError::game(format!(
                    "round {round_number} of game {game_index} finished without a score"
                ))
            })?;
        }

        let winning_side = match_state
            .winner()
            .ok_or_else(|| RunnerError::game(format!("game {game_index} ended without a winner")))?;
        let rounds = match_state.round_number().saturating_sub(1);
        let teams = std::array::from_fn(|agent| {
            let side = seating.side_of(agent);
            TeamResult {
                agent_name: self.agents[agent].name.clone(),
                side,
                score: match_state.scores().score(side),
                tally: tallies[agent],
            }
        });
        let outcome = GameOutcome {
            game_index,
            deal_seed,
            seating,
            rounds,
            winner: seating.agent_on(winning_side),
            teams,
        };

        if self.logging_enabled && tracing::enabled!(Level::INFO) {
            event!(
                target: "euchre_bench::game",
                Level::INFO,
                run_id = %self.config.run_id,
                game_index = game_index as u32,
                swapped = seating.swapped,
                rounds,
                winner = %outcome.teams[outcome.winner].agent_name,
                ns_score = match_state.scores().score(Team::NorthSouth),
                ew_score = match_state.scores().score(Team::EastWest),
            );
        }

        Ok(outcome)
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_game_row(
    writer: &mut BufWriter<File>,
    run_id: &str,
    outcome: &GameOutcome,
) -> Result<(), RunnerError> {
    let row = GameLogRow {
        run_id: run_id.to_string(),
        game_id: format!("G{:05}", outcome.game_index),
        game_index: outcome.game_index,
        deal_seed: outcome.deal_seed,
        swapped: outcome.seating.swapped,
        first_dealer: seat_label(outcome.seating.first_dealer),
        rounds: outcome.rounds,
        winner: outcome.teams[outcome.winner].agent_name.clone(),
        teams: outcome.teams.iter().map(TeamLogRow::from).collect(),
    };

    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

fn seat_label(position: PlayerPosition) -> &'static str {
    match position {
        PlayerPosition::North => "north",
        PlayerPosition::East => "east",
        PlayerPosition::South => "south",
        PlayerPosition::West => "west",
    }
}

fn side_label(side: Team) -> &'static str {
    match side {
        Team::NorthSouth => "north_south",
        Team::EastWest => "east_west",
    }
}

/// A configured team resolved to the policy its seats run.
struct TeamAgent {
    name: String,
    kind: PolicyKind,
}

impl TeamAgent {
    fn from_config(config: &AgentConfig) -> Result<Self, ValidationError> {
        Ok(Self {
            name: config.name.clone(),
            kind: config.policy_kind()?,
        })
    }
}

/// Per-team round counters for one game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamTally {
    pub calls: u32,
    pub alone_calls: u32,
    pub made: u32,
    pub marches: u32,
    pub lone_marches: u32,
    /// Rounds this team called and lost.
    pub euchred: u32,
    /// Rounds this team defended and won.
    pub euchres: u32,
    pub decisions: u32,
    pub decision_time: Duration,
}

impl TeamTally {
    fn record(&mut self, report: &RoundReport, side: Team) {
        if report.maker_team() == side {
            self.calls += 1;
            if report.alone {
                self.alone_calls += 1;
            }
            match report.score.kind {
                RoundResultKind::Euchre => self.euchred += 1,
                RoundResultKind::Made => self.made += 1,
                RoundResultKind::March => self.marches += 1,
                RoundResultKind::LoneMarch => self.lone_marches += 1,
            }
        } else if report.euchred() {
            self.euchres += 1;
        }

        for seat in PlayerPosition::LOOP {
            if seat.team() == side {
                let metrics = report.metrics[seat.index()];
                self.decisions += metrics.decisions;
                self.decision_time += metrics.total;
            }
        }
    }

    pub fn avg_ms_per_decision(&self) -> f64 {
        if self.decisions == 0 {
            0.0
        } else {
            self.decision_time.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        }
    }
}

pub struct GameOutcome {
    pub game_index: usize,
    pub deal_seed: u64,
    pub seating: Seating,
    pub rounds: u32,
    /// Index of the winning team in config order.
    pub winner: usize,
    /// Indexed by config order, not by side.
    pub teams: [TeamResult; 2],
}

impl GameOutcome {
    /// Final score of team `agent` minus its opponent's.
    pub fn margin(&self, agent: usize) -> i64 {
        i64::from(self.teams[agent].score) - i64::from(self.teams[1 - agent].score)
    }
}

pub struct TeamResult {
    pub agent_name: String,
    pub side: Team,
    pub score: u32,
    pub tally: TeamTally,
}

#[derive(Serialize)]
struct GameLogRow {
    run_id: String,
    game_id: String,
    game_index: usize,
    deal_seed: u64,
    swapped: bool,
    first_dealer: &'static str,
    rounds: u32,
    winner: String,
    teams: Vec<TeamLogRow>,
}

#[derive(Serialize)]
struct TeamLogRow {
    agent: String,
    side: &'static str,
    score: u32,
    calls: u32,
    alone_calls: u32,
    made: u32,
    marches: u32,
    lone_marches: u32,
    euchred: u32,
    euchres: u32,
    decisions: u32,
    avg_ms_per_decision: f64,
}

impl From<&TeamResult> for TeamLogRow {
    fn from(result: &TeamResult) -> Self {
        let tally = &result.tally;
        Self {
            agent: result.agent_name.clone(),
            side: side_label(result.side),
            score: result.score,
            calls: tally.calls,
            alone_calls: tally.alone_calls,
            made: tally.made,
            marches: tally.marches,
            lone_marches: tally.lone_marches,
            euchred: tally.euchred,
            euchres: tally.euchres,
            decisions: tally.decisions,
            avg_ms_per_decision: tally.avg_ms_per_decision(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Agent(#[from] ValidationError),
    #[error("agent policy rejected: {0}")]
    Policy(#[from] euchre_bot::config::ConfigError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("game {game_index}, round {round}: {source}")]
    Table {
        game_index: usize,
        round: u32,
        #[source]
        source: TableError,
    },
    #[error("game execution failed: {message}")]
    Game { message: String },
    #[error("game {game_index} did not finish within {limit} rounds")]
    RoundLimit { game_index: usize, limit: u32 },
    #[error("configuration requires exactly 2 teams but found {found}")]
    TeamCount { found: usize },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

impl RunnerError {
    fn game(message: String) -> Self {
        RunnerError::Game { message }
    }
}
