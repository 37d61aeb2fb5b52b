//! Entity module for the soldier/squad data model.
//!
//! This module provides the core entity types for Skirmish's battle simulation:
//! - [`SoldierId`] / [`SquadId`]: Unique, ordered identifiers
//! - [`Team`]: The two sides of the battle
//! - [`LifeState`], [`Intent`], [`Goal`]: Explicit state machine variants
//! - [`Soldier`]: The complete per-agent state container
//!
//! # Architecture
//!
//! Soldiers and squads reference each other by index, never by pointer:
//! a soldier stores its [`SquadId`], a squad stores an ordered list of
//! [`SoldierId`]s. The [`Arena`](crate::arena::Arena) owns both.
//!
//! Death is a state, not a removal. Dead soldiers stay addressable for the
//! event log, grading and outcome resolution.
//!
//! # Example
//!
//! ```
//! use skirmish_core::entity::{LifeState, Soldier, SoldierId, SquadId, Team};
//! use glam::Vec2;
//!
//! let soldier = Soldier::new(
//!     SoldierId::new(3),
//!     Team::Red,
//!     SquadId::new(0),
//!     Vec2::new(10.0, 50.0),
//!     Vec2::new(190.0, 50.0),
//!     100.0,
//! );
//!
//! assert_eq!(soldier.label(), "R3");
//! assert_eq!(soldier.life_state(), LifeState::Alive);
//! ```

pub mod components;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub use components::{
    CombatRecord, EffectivenessFlags, EffectivenessState, Exposure, HysteresisFlag, PsychState,
    RefusalKind,
};

// =============================================================================
// Identifiers
// =============================================================================

/// Unique identifier for a soldier.
///
/// `SoldierId` is a newtype wrapper around `u32`. Ids come from the scenario
/// configuration and are unique within a simulation.
///
/// # Ordering
///
/// Soldier ids are ordered by their numeric value. Every subsystem that
/// consumes randomness iterates soldiers in ascending id order, which pins the
/// RNG stream.
///
/// # Example
///
/// ```
/// use skirmish_core::entity::SoldierId;
///
/// let a = SoldierId::new(1);
/// let b = SoldierId::new(2);
///
/// assert!(a < b);
/// assert_eq!(a.as_u32(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SoldierId(u32);

impl SoldierId {
    /// Creates a new `SoldierId` from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value of this identifier.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for SoldierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SoldierId({})", self.0)
    }
}

impl fmt::Display for SoldierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SoldierId {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

/// Unique identifier for a squad.
///
/// Squad ids are assigned in roster order at construction time.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SquadId(u32);

impl SquadId {
    /// Creates a new `SquadId` from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value of this identifier.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for SquadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SquadId({})", self.0)
    }
}

impl fmt::Display for SquadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Team
// =============================================================================

/// One side of the battle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    /// The red side
    Red,
    /// The blue side
    Blue,
}

impl Team {
    /// Both teams, red first.
    pub const ALL: [Team; 2] = [Team::Red, Team::Blue];

    /// Returns the opposing team.
    #[must_use]
    pub const fn enemy(self) -> Self {
        match self {
            Self::Red => Self::Blue,
            Self::Blue => Self::Red,
        }
    }

    /// Single-letter prefix used in soldier and squad labels.
    #[must_use]
    pub const fn prefix(self) -> char {
        match self {
            Self::Red => 'R',
            Self::Blue => 'B',
        }
    }

    /// Lower-case name, as written to the event log.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// State Machine Variants
// =============================================================================

/// Life-cycle state of a soldier.
///
/// `Dead` is terminal: once entered, no subsystem mutates the soldier's
/// position, health or psychological flags again.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifeState {
    /// Alive and not currently exchanging fire
    Alive,
    /// Exchanging fire with an enemy this tick
    Engaging,
    /// Falling back under panic
    Retreating,
    /// Killed; terminal
    Dead,
}

impl LifeState {
    /// Lower-case name, as written to the event log.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alive => "alive",
            Self::Engaging => "engaging",
            Self::Retreating => "retreating",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for LifeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tactical posture, set per squad and handed down to its members.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Move toward the objective
    #[default]
    Advance,
    /// Close with and fire on visible enemies
    Engage,
    /// Fall back on the squad centroid
    Regroup,
    /// Stay in place
    Hold,
}

impl Intent {
    /// Lower-case name, as written to the event log.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Advance => "advance",
            Self::Engage => "engage",
            Self::Regroup => "regroup",
            Self::Hold => "hold",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Soldier-level movement or engagement target.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Goal {
    /// The configured objective position
    Objective {
        /// Target position
        at: Vec2,
    },
    /// A squad rally point
    Rally {
        /// Rally position
        at: Vec2,
    },
    /// A specific enemy soldier
    Engage {
        /// Enemy being engaged
        target: SoldierId,
    },
    /// Hold a fixed position
    Hold {
        /// Position being held
        at: Vec2,
    },
}

impl Goal {
    /// Whether two goals are the same kind with the same target.
    ///
    /// Rally and hold points drift with the squad centroid every tick; only a
    /// change of kind (or of engaged enemy) counts as a new goal.
    #[must_use]
    pub fn same_kind(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Engage { target: a }, Self::Engage { target: b }) => a == b,
            (Self::Objective { .. }, Self::Objective { .. })
            | (Self::Rally { .. }, Self::Rally { .. })
            | (Self::Hold { .. }, Self::Hold { .. }) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Objective { at } => write!(f, "objective({:.1},{:.1})", at.x, at.y),
            Self::Rally { at } => write!(f, "rally({:.1},{:.1})", at.x, at.y),
            Self::Engage { target } => write!(f, "engage({target})"),
            Self::Hold { at } => write!(f, "hold({:.1},{:.1})", at.x, at.y),
        }
    }
}

// =============================================================================
// Soldier
// =============================================================================

/// A single simulated soldier.
///
/// Fields are private; each subsystem mutates only the fields it owns through
/// crate-visible setters, and external callers get read-only accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Soldier {
    id: SoldierId,
    team: Team,
    label: String,
    squad: SquadId,
    pub(crate) position: Vec2,
    pub(crate) start: Vec2,
    pub(crate) objective: Vec2,
    pub(crate) health: f32,
    pub(crate) life: LifeState,
    pub(crate) goal: Goal,
    pub(crate) intent: Intent,
    pub(crate) psych: PsychState,
    pub(crate) contacts: BTreeSet<SoldierId>,
    pub(crate) effectiveness: EffectivenessState,
    pub(crate) combat: CombatRecord,
    pub(crate) exposure: Exposure,
    pub(crate) died_at: Option<u64>,
}

impl Soldier {
    /// Creates a living soldier at `start` with `objective` as its goal.
    #[must_use]
    pub fn new(
        id: SoldierId,
        team: Team,
        squad: SquadId,
        start: Vec2,
        objective: Vec2,
        health: f32,
    ) -> Self {
        Self {
            id,
            team,
            label: format!("{}{}", team.prefix(), id.as_u32()),
            squad,
            position: start,
            start,
            objective,
            health,
            life: LifeState::Alive,
            goal: Goal::Objective { at: objective },
            intent: Intent::Advance,
            psych: PsychState::default(),
            contacts: BTreeSet::new(),
            effectiveness: EffectivenessState::default(),
            combat: CombatRecord::default(),
            exposure: Exposure::default(),
            died_at: None,
        }
    }

    /// Replaces the psychological thresholds (stress is reset to zero).
    #[must_use]
    pub fn with_psych(mut self, psych: PsychState) -> Self {
        self.psych = psych;
        self
    }

    /// Returns the soldier's id.
    #[must_use]
    pub const fn id(&self) -> SoldierId {
        self.id
    }

    /// Returns the soldier's team.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Returns the soldier's log label (`R3`, `B7`, ...).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the squad this soldier belongs to.
    #[must_use]
    pub const fn squad(&self) -> SquadId {
        self.squad
    }

    /// Returns the current position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Returns the starting position.
    #[must_use]
    pub const fn start(&self) -> Vec2 {
        self.start
    }

    /// Returns the configured objective position.
    #[must_use]
    pub const fn objective(&self) -> Vec2 {
        self.objective
    }

    /// Returns the current health.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Returns the life-cycle state.
    #[must_use]
    pub const fn life_state(&self) -> LifeState {
        self.life
    }

    /// Returns `true` unless the soldier is dead.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.life != LifeState::Dead
    }

    /// Returns `true` if alive and not surrendering.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        self.is_alive() && !self.psych.surrender.is_active()
    }

    /// Returns the current goal.
    #[must_use]
    pub const fn goal(&self) -> Goal {
        self.goal
    }

    /// Returns the current intent.
    #[must_use]
    pub const fn intent(&self) -> Intent {
        self.intent
    }

    /// Returns the psychological state.
    #[must_use]
    pub const fn psych(&self) -> &PsychState {
        &self.psych
    }

    /// Returns `true` if any refusal state is active.
    #[must_use]
    pub fn is_refusing(&self) -> bool {
        self.psych.is_refusing()
    }

    /// Returns the enemies currently visible to this soldier, ascending id.
    #[must_use]
    pub fn contacts(&self) -> &BTreeSet<SoldierId> {
        &self.contacts
    }

    /// Returns the effectiveness flags and tallies.
    #[must_use]
    pub const fn effectiveness(&self) -> &EffectivenessState {
        &self.effectiveness
    }

    /// Returns the shots/hits/kills record.
    #[must_use]
    pub const fn combat(&self) -> &CombatRecord {
        &self.combat
    }

    /// Returns the tick the soldier died at, if dead.
    #[must_use]
    pub const fn died_at(&self) -> Option<u64> {
        self.died_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soldier(id: u32, team: Team) -> Soldier {
        Soldier::new(
            SoldierId::new(id),
            team,
            SquadId::new(0),
            Vec2::ZERO,
            Vec2::new(100.0, 0.0),
            100.0,
        )
    }

    #[test]
    fn labels_use_team_prefix() {
        assert_eq!(soldier(0, Team::Red).label(), "R0");
        assert_eq!(soldier(11, Team::Blue).label(), "B11");
    }

    #[test]
    fn enemy_team_is_symmetric() {
        assert_eq!(Team::Red.enemy(), Team::Blue);
        assert_eq!(Team::Blue.enemy(), Team::Red);
    }

    #[test]
    fn new_soldier_targets_objective() {
        let s = soldier(1, Team::Red);
        assert_eq!(s.goal(), Goal::Objective { at: Vec2::new(100.0, 0.0) });
        assert_eq!(s.intent(), Intent::Advance);
        assert!(s.is_alive());
        assert!(s.is_effective());
        assert!(s.contacts().is_empty());
    }

    #[test]
    fn goal_kind_ignores_drifting_points() {
        let a = Goal::Rally { at: Vec2::ZERO };
        let b = Goal::Rally { at: Vec2::new(5.0, 5.0) };
        assert!(a.same_kind(&b));

        let e1 = Goal::Engage { target: SoldierId::new(1) };
        let e2 = Goal::Engage { target: SoldierId::new(2) };
        assert!(!e1.same_kind(&e2));
        assert!(!a.same_kind(&e1));
    }

    #[test]
    fn team_serializes_lowercase() {
        let json = serde_json::to_string(&Team::Blue).unwrap();
        assert_eq!(json, "\"blue\"");
    }
}
