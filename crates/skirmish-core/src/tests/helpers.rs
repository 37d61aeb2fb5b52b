//! Test helper functions for setting up scenarios and driving single phases.
//!
//! The [`TestHarness`] owns the same pieces a [`Simulation`] does but lets a
//! test run one resolver at a time and poke soldier state in between.
//!
//! [`Simulation`]: crate::simulation::Simulation

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::arena::Arena;
use crate::config::{MapConfig, ScenarioConfig, SoldierPlacement, SquadRoster, Tuning};
use crate::entity::{Intent, LifeState, RefusalKind, Soldier, SoldierId, Team};
use crate::event_log::EventLog;
use crate::resolver::{set_life_state, Resolver, TickContext};

// =============================================================================
// Scenario Factories
// =============================================================================

/// One red soldier against one blue soldier, `distance` apart on a line.
///
/// - R0 at (10, 50), objective (290, 50)
/// - B1 at (10 + distance, 50), objective (10, 50)
///
/// Each soldier is alone in its squad.
pub fn duel_config(distance: f32) -> ScenarioConfig {
    ScenarioConfig {
        name: "duel".to_owned(),
        seed: 42,
        map: MapConfig::new(300.0, 100.0),
        soldiers: vec![
            SoldierPlacement::new(0, Team::Red, (10.0, 50.0), (290.0, 50.0)),
            SoldierPlacement::new(1, Team::Blue, (10.0 + distance, 50.0), (10.0, 50.0)),
        ],
        squads: vec![
            SquadRoster::new(Team::Red, vec![0]),
            SquadRoster::new(Team::Blue, vec![1]),
        ],
        tuning: Tuning::default(),
    }
}

/// Two squads of three facing each other 50 units apart.
///
/// - Red squad 0: R0, R1, R2 at x = 10
/// - Blue squad 1: B3, B4, B5 at x = 60
pub fn squad_config() -> ScenarioConfig {
    let rows = [45.0, 50.0, 55.0];
    let mut soldiers = Vec::new();
    for (i, &y) in rows.iter().enumerate() {
        let id = u32::try_from(i).unwrap();
        soldiers.push(SoldierPlacement::new(id, Team::Red, (10.0, y), (290.0, y)));
    }
    for (i, &y) in rows.iter().enumerate() {
        let id = u32::try_from(i + 3).unwrap();
        soldiers.push(SoldierPlacement::new(id, Team::Blue, (60.0, y), (10.0, y)));
    }
    ScenarioConfig {
        name: "squads".to_owned(),
        seed: 7,
        map: MapConfig::new(300.0, 100.0),
        soldiers,
        squads: vec![
            SquadRoster::new(Team::Red, vec![0, 1, 2]),
            SquadRoster::new(Team::Blue, vec![3, 4, 5]),
        ],
        tuning: Tuning::default(),
    }
}

// =============================================================================
// Harness
// =============================================================================

/// Drives resolvers one phase at a time.
pub struct TestHarness {
    pub arena: Arena,
    pub log: EventLog,
    pub rng: ChaCha8Rng,
    pub config: ScenarioConfig,
    pub tick: u64,
}

impl TestHarness {
    /// Builds a harness at tick 0. Panics on an invalid configuration.
    pub fn new(config: ScenarioConfig) -> Self {
        config.validate().expect("test config must validate");
        Self {
            arena: Arena::from_config(&config),
            log: EventLog::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            tick: 0,
        }
    }

    fn ctx(&mut self) -> TickContext<'_> {
        TickContext {
            tick: self.tick,
            arena: &mut self.arena,
            log: &mut self.log,
            rng: &mut self.rng,
            tuning: &self.config.tuning,
        }
    }

    /// Runs one resolver at the current tick without advancing it.
    pub fn run_phase(&mut self, resolver: &dyn Resolver) {
        let mut ctx = self.ctx();
        resolver.resolve(&mut ctx);
    }

    /// Runs the given resolvers in order, then advances the tick.
    pub fn advance(&mut self, resolvers: &[&dyn Resolver]) {
        for resolver in resolvers {
            self.run_phase(*resolver);
        }
        self.tick += 1;
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    pub fn soldier(&self, id: u32) -> &Soldier {
        self.arena
            .soldier(SoldierId::new(id))
            .expect("soldier exists")
    }

    fn soldier_mut(&mut self, id: u32) -> &mut Soldier {
        self.arena
            .soldier_mut(SoldierId::new(id))
            .expect("soldier exists")
    }

    /// Sets raw stress without touching the refusal flags.
    pub fn set_stress(&mut self, id: u32, stress: f32) {
        self.soldier_mut(id).psych.stress = stress;
    }

    /// Sets stress and re-evaluates every refusal flag against it, silently.
    pub fn force_stress(&mut self, id: u32, stress: f32) {
        let psych = &mut self.soldier_mut(id).psych;
        psych.stress = stress;
        for kind in RefusalKind::ALL {
            let _ = psych.flag_mut(kind).evaluate(stress);
        }
    }

    /// Kills a soldier at the current tick, logging the state change.
    pub fn kill(&mut self, id: u32) {
        let soldier = SoldierId::new(id);
        let mut ctx = self.ctx();
        set_life_state(&mut ctx, soldier, LifeState::Dead);
        self.arena.remove_spatial(soldier);
    }

    pub fn set_intent(&mut self, id: u32, intent: Intent) {
        self.soldier_mut(id).intent = intent;
    }

    /// Next value the RNG would produce, without consuming it.
    pub fn next_rng_value(&self) -> u64 {
        self.rng.clone().next_u64()
    }
}
