//! Simulation module with the fixed four-phase tick.
//!
//! The `Simulation` struct owns all state of a run and advances it in
//! discrete ticks. Each tick runs the resolvers in a fixed order:
//!
//! 1. **VISION**: recompute contacts
//! 2. **PSYCHOLOGY**: update stress and refusal flags
//! 3. **COHESION**: squad cohesion, intent and member goals
//! 4. **COMBAT**: movement, fire, deaths and effectiveness flags
//!
//! then samples the window reporter and advances the tick counter.
//!
//! # Determinism
//!
//! Given the same configuration (seed included), two simulations produce
//! byte-identical event logs:
//! - The engine's `ChaCha8Rng` is seeded once from the configured seed and
//!   is never shared
//! - Soldiers and squads are iterated in ascending id order (via `BTreeMap`)
//! - Only the psychology and combat phases draw random numbers
//!
//! # Example
//!
//! ```
//! use skirmish_core::scenario;
//! use skirmish_core::simulation::Simulation;
//!
//! let config = scenario::builtin("mutual_advance", 42).unwrap();
//! let mut sim = Simulation::new(config).unwrap();
//!
//! for _ in 0..10 {
//!     sim.step();
//! }
//!
//! assert_eq!(sim.tick(), 10);
//! ```

use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

use crate::arena::Arena;
use crate::config::{ConfigError, MapConfig, ScenarioConfig, Tuning};
use crate::entity::{Soldier, SoldierId, SquadId, Team};
use crate::event_log::EventLog;
use crate::grading::{grade_soldiers, SoldierGrade};
use crate::outcome::{resolve_outcome, BattleOutcomeReason};
use crate::resolver::{
    CohesionResolver, CombatResolver, PsychologyResolver, Resolver, TickContext, VisionResolver,
};
use crate::squad::Squad;
use crate::window::{TickSample, WindowReport, WindowReporter};

// =============================================================================
// Simulation
// =============================================================================

/// The battle engine.
///
/// `Simulation` manages:
/// - The arena (soldiers, squads, map)
/// - The append-only event log
/// - The private RNG
/// - The ordered resolver list
/// - The sliding-window reporter
///
/// A `Simulation` is `Send`, so independent runs can be moved to worker
/// threads (see [`crate::batch`]). A single run is strictly sequential.
pub struct Simulation {
    config: ScenarioConfig,
    arena: Arena,
    log: EventLog,
    rng: ChaCha8Rng,
    tick: u64,
    resolvers: Vec<Box<dyn Resolver>>,
    window: WindowReporter,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("scenario", &self.config.name)
            .field("seed", &self.config.seed)
            .field("tick", &self.tick)
            .field("soldiers", &self.arena.soldier_count())
            .field("log_entries", &self.log.len())
            .field("resolvers", &format!("[{} resolvers]", self.resolvers.len()))
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates a simulation at tick 0.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found by
    /// [`ScenarioConfig::validate`]. No simulation is built from an invalid
    /// configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use skirmish_core::scenario;
    /// use skirmish_core::simulation::Simulation;
    ///
    /// let sim = Simulation::new(scenario::builtin("ambush", 12345).unwrap()).unwrap();
    /// assert_eq!(sim.tick(), 0);
    /// assert_eq!(sim.seed(), 12345);
    /// assert!(sim.log().is_empty());
    /// ```
    pub fn new(config: ScenarioConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let arena = Arena::from_config(&config);
        info!(
            scenario = %config.name,
            seed = config.seed,
            soldiers = arena.soldier_count(),
            squads = arena.squads().count(),
            "simulation created"
        );
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            window: WindowReporter::new(config.tuning.window.size),
            arena,
            log: EventLog::new(),
            tick: 0,
            resolvers: vec![
                Box::new(VisionResolver::new()),
                Box::new(PsychologyResolver::new()),
                Box::new(CohesionResolver::new()),
                Box::new(CombatResolver::new()),
            ],
            config,
        })
    }

    /// Executes one tick: all phases in order, then the window sample.
    ///
    /// # Panics
    ///
    /// Panics if a squad roster, contact or target names a soldier missing
    /// from the arena. Construction validates rosters, so this only happens
    /// when the arena was corrupted.
    pub fn step(&mut self) {
        let tick = self.tick;
        trace!(tick, "tick start");
        {
            let mut ctx = TickContext {
                tick,
                arena: &mut self.arena,
                log: &mut self.log,
                rng: &mut self.rng,
                tuning: &self.config.tuning,
            };
            for resolver in &self.resolvers {
                trace!(tick, phase = resolver.name(), "phase");
                resolver.resolve(&mut ctx);
            }
        }
        self.window.push(TickSample::capture(tick, &self.arena));
        self.tick += 1;
    }

    /// Executes `ticks` ticks.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroTicks`] if `ticks` is zero.
    pub fn run(&mut self, ticks: u64) -> Result<(), ConfigError> {
        if ticks == 0 {
            return Err(ConfigError::ZeroTicks);
        }
        for _ in 0..ticks {
            self.step();
        }
        debug!(
            tick = self.tick,
            entries = self.log.len(),
            outcome = %self.outcome().outcome,
            "run finished"
        );
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Number of ticks executed so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The configured RNG seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.config.seed
    }

    /// The scenario name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The configuration this run was built from.
    #[must_use]
    pub const fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// The tuning in force.
    #[must_use]
    pub const fn tuning(&self) -> &Tuning {
        &self.config.tuning
    }

    /// The map.
    #[must_use]
    pub const fn map(&self) -> &MapConfig {
        self.arena.map()
    }

    /// The world state.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// One team's soldiers, ascending id, dead included.
    pub fn soldiers(&self, team: Team) -> impl Iterator<Item = &Soldier> + Clone + '_ {
        self.arena.team_soldiers(team)
    }

    /// All soldiers, ascending id, dead included.
    pub fn all_soldiers(&self) -> impl Iterator<Item = &Soldier> + Clone + '_ {
        self.arena.soldiers()
    }

    /// One soldier by id.
    #[must_use]
    pub fn soldier(&self, id: SoldierId) -> Option<&Soldier> {
        self.arena.soldier(id)
    }

    /// All squads, ascending id.
    pub fn squads(&self) -> impl Iterator<Item = &Squad> + Clone + '_ {
        self.arena.squads()
    }

    /// One squad by id.
    #[must_use]
    pub fn squad(&self, id: SquadId) -> Option<&Squad> {
        self.arena.squad(id)
    }

    /// The event log.
    #[must_use]
    pub const fn log(&self) -> &EventLog {
        &self.log
    }

    /// Averages over the trailing window.
    #[must_use]
    pub fn window_summary(&self) -> WindowReport {
        self.window.summary()
    }

    /// Grades for every soldier, ascending id.
    #[must_use]
    pub fn grades(&self) -> Vec<SoldierGrade> {
        grade_soldiers(&self.log, self.arena.soldiers(), &self.config.tuning.grading)
    }

    /// The battle outcome as of the current tick.
    #[must_use]
    pub fn outcome(&self) -> BattleOutcomeReason {
        resolve_outcome(self.arena.soldiers(), self.arena.squads())
    }
}
