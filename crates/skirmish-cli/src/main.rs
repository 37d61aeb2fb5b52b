//! Headless Skirmish runner.
//!
//! Runs a built-in or file-based scenario for one or more seeds and prints
//! the outcome, window averages and soldier grades. Optionally writes the
//! first run's event log as JSON Lines.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use skirmish_core::batch::{run_batch, run_single, RunSummary};
use skirmish_core::{scenario, ScenarioConfig, Team};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Skirmish - deterministic small-unit battle runs
#[derive(Parser, Debug)]
#[command(name = "skirmish", version)]
#[command(about = "Run deterministic small-unit battles and report outcomes and grades")]
struct Args {
    /// Built-in scenario name (mutual_advance, ambush)
    #[arg(long, default_value = "mutual_advance")]
    scenario: String,

    /// Scenario JSON file; overrides --scenario
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticks per run
    #[arg(long, default_value_t = 3600)]
    ticks: u64,

    /// Seed of the first run; later runs use consecutive seeds
    #[arg(long)]
    seed: Option<u64>,

    /// Number of runs (at least 1)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    runs: u64,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write the first run's event log here as JSON Lines
    #[arg(long)]
    events: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<ScenarioConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ScenarioConfig::from_json_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => scenario::builtin(&args.scenario, 42)?,
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn write_events(config: &ScenarioConfig, ticks: u64, path: &Path) -> Result<()> {
    // Runs are deterministic, so replaying the first seed reproduces its log.
    let sim = run_single(config.clone(), ticks)?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    sim.log()
        .write_jsonl(BufWriter::new(file))
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), entries = sim.log().len(), "event log written");
    Ok(())
}

fn joined(traits: &BTreeSet<String>) -> String {
    traits.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn print_text(summary: &RunSummary) {
    let outcome = &summary.outcome;
    println!(
        "=== {} seed={} ticks={} ===",
        summary.scenario, summary.seed, summary.ticks
    );
    println!("outcome: {} ({})", outcome.outcome, outcome.description);
    println!(
        "squads broken: red {}/{}, blue {}/{}",
        outcome.red_squads_broken,
        outcome.red_squads_total,
        outcome.blue_squads_broken,
        outcome.blue_squads_total
    );
    let tick = |t: Option<u64>| t.map_or_else(|| "-".to_owned(), |t| t.to_string());
    println!(
        "first contact: {}  first death: {}  log entries: {}",
        tick(summary.first_contact_tick),
        tick(summary.first_death_tick),
        summary.entries
    );

    let window = &summary.window;
    println!("window: {} samples", window.samples);
    for team in Team::ALL {
        let s = window.team(team);
        println!(
            "  {team} alive {:.2} stress {:.3} stalled {:.2} detached {:.2} \
             disobeying {:.2} panicking {:.2} surrendered {:.2} broken {:.2}",
            s.avg_alive,
            s.avg_stress,
            s.avg_stalled,
            s.avg_detached,
            s.avg_disobeying,
            s.avg_panicking,
            s.avg_surrendered,
            s.avg_broken_squad_members
        );
    }

    println!("grades:");
    for grade in &summary.grades {
        println!(
            "  {:<4} {} {:>6.1} {:<5} +[{}] -[{}]",
            grade.label,
            grade.letter,
            grade.score,
            if grade.survived { "alive" } else { "dead" },
            joined(&grade.good_traits),
            joined(&grade.bad_traits)
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let seeds: Vec<u64> = (0..args.runs).map(|i| config.seed.wrapping_add(i)).collect();

    let summaries = run_batch(&config, &seeds, args.ticks)?;

    if let Some(path) = &args.events {
        write_events(&config, args.ticks, path)?;
    }

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        Format::Text => {
            for summary in &summaries {
                print_text(summary);
            }
        }
    }
    Ok(())
}
