use std::path::PathBuf;

use clap::Parser;

use euchre_bench::config::{BenchmarkConfig, ResolvedOutputs};
use euchre_bench::logging::init_logging;
use euchre_bench::tournament::TournamentRunner;
use euchre_core::AppInfo;

/// Head-to-head match harness for Euchre bots.
#[derive(Debug, Parser)]
#[command(
    name = "euchre-bench",
    author,
    version,
    about = "Deterministic Euchre team-versus-team harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the RNG seed for deal generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the score that ends a game.
    #[arg(long, value_name = "POINTS")]
    winning_score: Option<u32>,

    /// Keep each team on the same side for every game.
    #[arg(long)]
    no_swap: bool,

    /// Override the tracing level for structured logs.
    #[arg(long, value_name = "LEVEL")]
    tracing_level: Option<String>,

    /// Exit after validating the configuration (no games are played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = cli.games {
        config.matches.games = games;
    }

    if let Some(seed) = cli.seed {
        config.matches.seed = Some(seed);
    }

    if let Some(points) = cli.winning_score {
        config.matches.winning_score = points;
    }

    if cli.no_swap {
        config.matches.swap_seats = false;
    }

    if let Some(level) = cli.tracing_level {
        config.logging.enable_structured = true;
        config.logging.tracing_level = level;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let games = config.matches.games;
    let teams = config
        .teams
        .iter()
        .map(|team| format!("{} ({:?})", team.name, team.kind))
        .collect::<Vec<_>>()
        .join(" vs ");

    println!(
        "{} {} ({})",
        AppInfo::name(),
        AppInfo::version(),
        AppInfo::codename()
    );
    println!(
        "Loaded configuration '{run_id}': {teams}, {games} game{} to {} points",
        if games == 1 { "" } else { "s" },
        config.matches.winning_score
    );

    let logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let runner = TournamentRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: no games played.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Tournament complete for '{run_id}': {} games → {} rows at {}",
        summary.games_played,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    for agent in &summary.analytics.agents {
        println!(
            "  {}: {}/{} wins ({:.1}%), avg margin {:+.2}, {:.2} ms/decision",
            agent.name,
            agent.wins,
            agent.games,
            agent.win_rate * 100.0,
            agent.avg_margin,
            agent.average_ms_per_decision
        );
    }
    println!("  p-value (equal strength): {:.4}", summary.analytics.p_value);
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(guard) = logging_guard.as_ref() {
        println!("Telemetry log: {}", guard.telemetry_path.display());
    }

    Ok(())
}
