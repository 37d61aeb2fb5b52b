//! Parallel batch runs over many seeds.
//!
//! Each seed gets its own [`Simulation`] on a rayon worker. Runs share
//! nothing, so the summaries are identical to sequential runs and come
//! back in seed order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{ConfigError, ScenarioConfig};
use crate::event_log::Category;
use crate::grading::SoldierGrade;
use crate::outcome::BattleOutcomeReason;
use crate::simulation::Simulation;
use crate::window::WindowReport;

/// Result of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Scenario name
    pub scenario: String,
    /// RNG seed
    pub seed: u64,
    /// Ticks executed
    pub ticks: u64,
    /// Battle outcome at the final tick
    pub outcome: BattleOutcomeReason,
    /// Window averages at the final tick
    pub window: WindowReport,
    /// Per-soldier grades
    pub grades: Vec<SoldierGrade>,
    /// Event log length
    pub entries: usize,
    /// Tick of the first contact, if any
    pub first_contact_tick: Option<u64>,
    /// Tick of the first death, if any
    pub first_death_tick: Option<u64>,
}

impl RunSummary {
    /// Summarizes a simulation in its current state.
    #[must_use]
    pub fn from_simulation(sim: &Simulation) -> Self {
        let log = sim.log();
        Self {
            scenario: sim.name().to_owned(),
            seed: sim.seed(),
            ticks: sim.tick(),
            outcome: sim.outcome(),
            window: sim.window_summary(),
            grades: sim.grades(),
            entries: log.len(),
            first_contact_tick: log.first_tick(Category::Vision, "contact_new"),
            first_death_tick: log.first_death_tick(),
        }
    }
}

/// Builds and runs one simulation for `ticks` ticks.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the configuration is invalid or `ticks` is
/// zero.
pub fn run_single(config: ScenarioConfig, ticks: u64) -> Result<Simulation, ConfigError> {
    let mut sim = Simulation::new(config)?;
    sim.run(ticks)?;
    Ok(sim)
}

/// Runs `config` once per seed, in parallel.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the configuration is invalid or `ticks` is
/// zero. Validation happens before any run starts.
///
/// # Example
///
/// ```
/// use skirmish_core::batch::run_batch;
/// use skirmish_core::scenario;
///
/// let config = scenario::builtin("mutual_advance", 0).unwrap();
/// let runs = run_batch(&config, &[1, 2], 50).unwrap();
/// assert_eq!(runs.len(), 2);
/// assert_eq!(runs[0].seed, 1);
/// assert_eq!(runs[1].ticks, 50);
/// ```
pub fn run_batch(
    config: &ScenarioConfig,
    seeds: &[u64],
    ticks: u64,
) -> Result<Vec<RunSummary>, ConfigError> {
    if ticks == 0 {
        return Err(ConfigError::ZeroTicks);
    }
    config.validate()?;

    let summaries = seeds
        .par_iter()
        .map(|&seed| {
            run_single(config.with_seed(seed), ticks).map(|sim| RunSummary::from_simulation(&sim))
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        scenario = %config.name,
        runs = summaries.len(),
        ticks,
        "batch complete"
    );
    Ok(summaries)
}
