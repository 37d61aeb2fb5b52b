//! # Skirmish Core
//!
//! Deterministic small-unit battle simulation.
//!
//! Two teams of soldiers, organized into squads, advance on objectives,
//! spot each other, trade fire and crack under stress. Every discrete state
//! change lands in an append-only event log that reporting and grading read
//! back after the run.
//!
//! ## Architecture
//!
//! - **Entities**: soldiers with psychology, contacts and combat records
//! - **Squads**: roster, cohesion state and the squad-wide intent
//! - **Resolvers**: one per tick phase, run in the fixed order
//!   vision, psychology, cohesion, combat
//! - **Reports**: sliding-window averages, per-soldier grades and the
//!   battle outcome
//!
//! Same configuration and seed in, byte-identical event log out.
//!
//! ## Usage
//!
//! ```
//! use skirmish_core::{scenario, Simulation};
//!
//! let config = scenario::builtin("mutual_advance", 42).unwrap();
//! let mut sim = Simulation::new(config).unwrap();
//! sim.run(200).unwrap();
//!
//! let outcome = sim.outcome();
//! println!("{}: {}", outcome.outcome, outcome.description);
//! for grade in sim.grades() {
//!     println!("{} {} {:.1}", grade.label, grade.letter, grade.score);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod batch;
pub mod config;
pub mod entity;
pub mod event_log;
pub mod grading;
pub mod outcome;
pub mod resolver;
pub mod scenario;
pub mod simulation;
pub mod squad;
pub mod window;

#[cfg(test)]
mod tests;

pub use arena::Arena;
pub use batch::{run_batch, RunSummary};
pub use config::{ConfigError, ScenarioConfig, Tuning};
pub use entity::{Goal, Intent, LifeState, Soldier, SoldierId, SquadId, Team};
pub use event_log::{Category, EventLog, SimLogEntry};
pub use grading::{LetterGrade, SoldierGrade};
pub use outcome::{BattleOutcome, BattleOutcomeReason};
pub use simulation::Simulation;
pub use squad::{Cohesion, Squad};
pub use window::WindowReport;
