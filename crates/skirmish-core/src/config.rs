//! Scenario configuration, tuning parameters and construction errors.
//!
//! A [`ScenarioConfig`] carries everything the engine needs to build a run:
//! map size and obstacles, the RNG seed, soldier placements, squad rosters
//! and the [`Tuning`] surface. Every numeric threshold the subsystems use
//! lives in `Tuning` with a documented default; nothing is hard-coded in
//! the resolvers.
//!
//! Configurations are validated once, in [`ScenarioConfig::validate`], before
//! any state is built. A simulation is either fully constructed or not at all.
//!
//! # Example
//!
//! ```
//! use skirmish_core::config::{ScenarioConfig, SoldierPlacement, SquadRoster, MapConfig};
//! use skirmish_core::entity::Team;
//!
//! let config = ScenarioConfig {
//!     name: "duel".into(),
//!     seed: 7,
//!     map: MapConfig::new(100.0, 100.0),
//!     soldiers: vec![
//!         SoldierPlacement::new(0, Team::Red, (10.0, 50.0), (90.0, 50.0)),
//!         SoldierPlacement::new(1, Team::Blue, (90.0, 50.0), (10.0, 50.0)),
//!     ],
//!     squads: vec![
//!         SquadRoster::new(Team::Red, vec![0]),
//!         SquadRoster::new(Team::Blue, vec![1]),
//!     ],
//!     tuning: Default::default(),
//! };
//!
//! assert!(config.validate().is_ok());
//! ```

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::Team;

// =============================================================================
// Errors
// =============================================================================

/// Errors detected before a simulation starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A run was requested for zero ticks.
    #[error("tick count must be positive")]
    ZeroTicks,

    /// No built-in scenario has this name.
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),

    /// Map dimensions are not positive and finite.
    #[error("invalid map size {width}x{height}")]
    InvalidMap {
        /// Configured width
        width: f32,
        /// Configured height
        height: f32,
    },

    /// One side has no soldiers.
    #[error("team {0} has no soldiers")]
    EmptyTeam(Team),

    /// Two placements share an id.
    #[error("duplicate soldier id {0}")]
    DuplicateSoldier(u32),

    /// A roster names a soldier that was never placed.
    #[error("squad {squad} references unknown soldier {soldier}")]
    UnknownSoldier {
        /// Roster index
        squad: usize,
        /// Offending soldier id
        soldier: u32,
    },

    /// A soldier appears in more than one roster slot.
    #[error("soldier {0} is listed in more than one squad slot")]
    SoldierInMultipleSquads(u32),

    /// A placed soldier belongs to no squad.
    #[error("soldier {0} is not assigned to any squad")]
    UnassignedSoldier(u32),

    /// A roster mixes teams.
    #[error("squad {squad} contains soldier {soldier} from the other team")]
    SquadTeamMismatch {
        /// Roster index
        squad: usize,
        /// Offending soldier id
        soldier: u32,
    },

    /// A roster has no members.
    #[error("squad {0} has no members")]
    EmptySquad(usize),

    /// A soldier starts or aims outside the map.
    #[error("soldier {0} is placed outside the map")]
    OutOfBounds(u32),

    /// An onset/release pair does not leave a hysteresis band.
    #[error("invalid threshold {name}: {detail}")]
    InvalidThreshold {
        /// Parameter name
        name: &'static str,
        /// What is wrong with it
        detail: String,
    },

    /// A tuning value is out of range.
    #[error("invalid tuning {name}: {detail}")]
    InvalidTuning {
        /// Parameter name
        name: &'static str,
        /// What is wrong with it
        detail: String,
    },

    /// The configuration text could not be parsed.
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
}

// =============================================================================
// Scenario
// =============================================================================

/// A circular sight-blocking obstacle (a building, a treeline).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Centre x
    pub x: f32,
    /// Centre y
    pub y: f32,
    /// Radius
    pub radius: f32,
}

impl Obstacle {
    /// Creates an obstacle.
    #[must_use]
    pub const fn new(x: f32, y: f32, radius: f32) -> Self {
        Self { x, y, radius }
    }

    /// Centre as a vector.
    #[must_use]
    pub const fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Map dimensions and terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Width in map units
    pub width: f32,
    /// Height in map units
    pub height: f32,
    /// Sight-blocking obstacles
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

impl MapConfig {
    /// Creates an open map.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            obstacles: Vec::new(),
        }
    }

    /// Returns `true` if `p` lies on the map.
    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.width && p.y <= self.height
    }

    /// Clamps `p` onto the map.
    #[must_use]
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }
}

/// Initial placement of one soldier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoldierPlacement {
    /// Unique soldier id
    pub id: u32,
    /// Side
    pub team: Team,
    /// Start x
    pub start_x: f32,
    /// Start y
    pub start_y: f32,
    /// Objective x
    pub goal_x: f32,
    /// Objective y
    pub goal_y: f32,
}

impl SoldierPlacement {
    /// Creates a placement from `(x, y)` pairs.
    #[must_use]
    pub const fn new(id: u32, team: Team, start: (f32, f32), goal: (f32, f32)) -> Self {
        Self {
            id,
            team,
            start_x: start.0,
            start_y: start.1,
            goal_x: goal.0,
            goal_y: goal.1,
        }
    }

    /// Start position.
    #[must_use]
    pub const fn start(&self) -> Vec2 {
        Vec2::new(self.start_x, self.start_y)
    }

    /// Objective position.
    #[must_use]
    pub const fn goal(&self) -> Vec2 {
        Vec2::new(self.goal_x, self.goal_y)
    }
}

/// Ordered list of soldier ids forming one squad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadRoster {
    /// Side
    pub team: Team,
    /// Member soldier ids, in roster order
    pub members: Vec<u32>,
}

impl SquadRoster {
    /// Creates a roster.
    #[must_use]
    pub fn new(team: Team, members: Vec<u32>) -> Self {
        Self { team, members }
    }
}

/// Full description of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Scenario name, for reports
    #[serde(default)]
    pub name: String,
    /// Seed for the engine's private RNG
    pub seed: u64,
    /// Map dimensions and obstacles
    pub map: MapConfig,
    /// One entry per soldier
    pub soldiers: Vec<SoldierPlacement>,
    /// Squad rosters; squad ids follow this order
    pub squads: Vec<SquadRoster>,
    /// Tuning surface
    #[serde(default)]
    pub tuning: Tuning,
}

impl ScenarioConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed input. The result is not
    /// validated; [`Simulation::new`](crate::simulation::Simulation::new)
    /// does that.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Returns a copy with a different seed.
    #[must_use]
    pub fn with_seed(&self, seed: u64) -> Self {
        let mut config = self.clone();
        config.seed = seed;
        config
    }

    /// Checks the configuration for structural and numeric errors.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found: bad map size, empty team,
    /// duplicate or misplaced soldiers, malformed rosters, or invalid tuning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let map = &self.map;
        if !(map.width.is_finite() && map.height.is_finite())
            || map.width <= 0.0
            || map.height <= 0.0
        {
            return Err(ConfigError::InvalidMap {
                width: map.width,
                height: map.height,
            });
        }

        let mut teams: BTreeMap<u32, Team> = BTreeMap::new();
        for placement in &self.soldiers {
            if teams.insert(placement.id, placement.team).is_some() {
                return Err(ConfigError::DuplicateSoldier(placement.id));
            }
            if !map.contains(placement.start()) || !map.contains(placement.goal()) {
                return Err(ConfigError::OutOfBounds(placement.id));
            }
        }
        for team in Team::ALL {
            if !teams.values().any(|t| *t == team) {
                return Err(ConfigError::EmptyTeam(team));
            }
        }

        let mut assigned: BTreeSet<u32> = BTreeSet::new();
        for (index, roster) in self.squads.iter().enumerate() {
            if roster.members.is_empty() {
                return Err(ConfigError::EmptySquad(index));
            }
            for &member in &roster.members {
                let Some(team) = teams.get(&member) else {
                    return Err(ConfigError::UnknownSoldier {
                        squad: index,
                        soldier: member,
                    });
                };
                if *team != roster.team {
                    return Err(ConfigError::SquadTeamMismatch {
                        squad: index,
                        soldier: member,
                    });
                }
                if !assigned.insert(member) {
                    return Err(ConfigError::SoldierInMultipleSquads(member));
                }
            }
        }
        if let Some(unassigned) = teams.keys().find(|id| !assigned.contains(id)) {
            return Err(ConfigError::UnassignedSoldier(*unassigned));
        }

        self.tuning.validate()
    }
}

// =============================================================================
// Tuning
// =============================================================================

/// Onset/release pair for one refusal state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Stress at which the state turns on
    pub onset: f32,
    /// Stress at which the state turns off again
    pub release: f32,
}

impl Thresholds {
    /// Creates a threshold pair.
    #[must_use]
    pub const fn new(onset: f32, release: f32) -> Self {
        Self { onset, release }
    }

    fn validate(self, name: &'static str) -> Result<(), ConfigError> {
        if !(self.release >= 0.0 && self.onset <= 1.0) {
            return Err(ConfigError::InvalidThreshold {
                name,
                detail: format!("thresholds must lie in [0, 1], got {self:?}"),
            });
        }
        if self.onset <= self.release {
            return Err(ConfigError::InvalidThreshold {
                name,
                detail: format!(
                    "onset {} must exceed release {}",
                    self.onset, self.release
                ),
            });
        }
        Ok(())
    }
}

/// Vision parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionTuning {
    /// Maximum sighting distance
    pub range: f32,
    /// Range multiplier while panicking
    pub panic_factor: f32,
}

impl Default for VisionTuning {
    fn default() -> Self {
        Self {
            range: 70.0,
            panic_factor: 0.6,
        }
    }
}

/// Stress accumulation and refusal thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsychTuning {
    /// Stress per shot received
    pub fire_stress: f32,
    /// Stress per hit received
    pub hit_stress: f32,
    /// Stress per friendly death nearby
    pub casualty_stress: f32,
    /// Radius for nearby friendly deaths
    pub casualty_radius: f32,
    /// Stress per visible enemy
    pub contact_stress: f32,
    /// Stress per tick with no friend nearby
    pub isolation_stress: f32,
    /// Radius a friend must be within to avoid isolation
    pub isolation_radius: f32,
    /// Stress shed per tick without incoming fire or casualties
    pub recovery: f32,
    /// Half-width of the uniform per-tick stress jitter
    pub jitter: f32,
    /// Disobedience thresholds
    pub disobedience: Thresholds,
    /// Panic thresholds
    pub panic: Thresholds,
    /// Surrender thresholds
    pub surrender: Thresholds,
}

impl Default for PsychTuning {
    fn default() -> Self {
        Self {
            fire_stress: 0.004,
            hit_stress: 0.08,
            casualty_stress: 0.12,
            casualty_radius: 25.0,
            contact_stress: 0.0015,
            isolation_stress: 0.003,
            isolation_radius: 20.0,
            recovery: 0.004,
            jitter: 0.002,
            disobedience: Thresholds::new(0.55, 0.40),
            panic: Thresholds::new(0.75, 0.55),
            surrender: Thresholds::new(0.92, 0.70),
        }
    }
}

/// Squad cohesion and intent parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohesionTuning {
    /// Distance from the centroid beyond which a member counts as dispersed
    pub dispersal_radius: f32,
    /// Bad-member fraction above which the squad breaks
    pub break_fraction: f32,
    /// Bad-member fraction below which a broken squad reforms
    pub reform_fraction: f32,
    /// Casualty rate at which the squad switches to holding
    pub hold_casualty_rate: f32,
}

impl Default for CohesionTuning {
    fn default() -> Self {
        Self {
            dispersal_radius: 30.0,
            break_fraction: 0.5,
            reform_fraction: 0.34,
            hold_casualty_rate: 0.67,
        }
    }
}

/// Weapon and damage parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Starting health
    pub max_health: f32,
    /// Maximum firing distance
    pub weapon_range: f32,
    /// Hit chance at point blank with zero stress
    pub base_hit_chance: f32,
    /// Fractional accuracy lost at full stress
    pub stress_accuracy_penalty: f32,
    /// Fractional accuracy lost at maximum range
    pub range_falloff: f32,
    /// Minimum damage per hit
    pub damage_min: f32,
    /// Maximum damage per hit
    pub damage_max: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            weapon_range: 50.0,
            base_hit_chance: 0.08,
            stress_accuracy_penalty: 0.5,
            range_falloff: 0.5,
            damage_min: 8.0,
            damage_max: 25.0,
        }
    }
}

/// Movement speeds, in map units per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    /// Normal movement speed
    pub move_speed: f32,
    /// Speed while retreating in panic
    pub retreat_speed: f32,
    /// Distance at which an objective counts as reached
    pub arrival_radius: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            move_speed: 0.5,
            retreat_speed: 0.7,
            arrival_radius: 3.0,
        }
    }
}

/// Effectiveness flag parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectivenessTuning {
    /// Consecutive engaged ticks without progress before flagging stalled
    pub stall_ticks: u32,
    /// Minimum objective-distance improvement that counts as progress
    pub progress_epsilon: f32,
    /// Consecutive contactless ticks under an engage order before flagging detached
    pub detach_ticks: u32,
}

impl Default for EffectivenessTuning {
    fn default() -> Self {
        Self {
            stall_ticks: 150,
            progress_epsilon: 0.25,
            detach_ticks: 40,
        }
    }
}

/// Window reporter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowTuning {
    /// Number of trailing tick samples kept
    pub size: usize,
}

impl Default for WindowTuning {
    fn default() -> Self {
        Self { size: 300 }
    }
}

/// Weights of the grading score.
///
/// Positive weights reward, penalty weights are subtracted per occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingWeights {
    /// Awarded for surviving the run
    pub survival: f64,
    /// Per contact spotted before the enemy spotted back
    pub initiative: f64,
    /// Per contact gained
    pub contact: f64,
    /// Per engagement entered
    pub engagement: f64,
    /// Per hit scored
    pub hit: f64,
    /// Per kill
    pub kill: f64,
    /// Penalty per stalled-in-combat flag
    pub stalled: f64,
    /// Penalty per detached-from-engagement flag
    pub detached: f64,
    /// Penalty per disobedience onset
    pub disobedience: f64,
    /// Penalty per panic onset
    pub panic: f64,
    /// Penalty per surrender onset
    pub surrender: f64,
}

impl Default for GradingWeights {
    fn default() -> Self {
        Self {
            survival: 40.0,
            initiative: 4.0,
            contact: 1.0,
            engagement: 3.0,
            hit: 2.0,
            kill: 12.0,
            stalled: 6.0,
            detached: 5.0,
            disobedience: 6.0,
            panic: 8.0,
            surrender: 15.0,
        }
    }
}

/// The complete tuning surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Vision parameters
    pub vision: VisionTuning,
    /// Psychology parameters
    pub psych: PsychTuning,
    /// Cohesion parameters
    pub cohesion: CohesionTuning,
    /// Combat parameters
    pub combat: CombatTuning,
    /// Movement parameters
    pub movement: MovementTuning,
    /// Effectiveness parameters
    pub effectiveness: EffectivenessTuning,
    /// Window reporter parameters
    pub window: WindowTuning,
    /// Grading weights
    pub grading: GradingWeights,
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTuning {
            name,
            detail: format!("must be positive, got {value}"),
        })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTuning {
            name,
            detail: format!("must be finite and non-negative, got {value}"),
        })
    }
}

fn unit_interval(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidTuning {
            name,
            detail: format!("must lie in [0, 1], got {value}"),
        })
    }
}

impl Tuning {
    /// Checks every parameter range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidThreshold`] when a hysteresis pair has
    /// no band, and [`ConfigError::InvalidTuning`] for any other bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("vision.range", self.vision.range)?;
        unit_interval("vision.panic_factor", self.vision.panic_factor)?;

        self.psych.disobedience.validate("psych.disobedience")?;
        self.psych.panic.validate("psych.panic")?;
        self.psych.surrender.validate("psych.surrender")?;
        let psych = &self.psych;
        non_negative("psych.fire_stress", psych.fire_stress)?;
        non_negative("psych.hit_stress", psych.hit_stress)?;
        non_negative("psych.casualty_stress", psych.casualty_stress)?;
        non_negative("psych.contact_stress", psych.contact_stress)?;
        non_negative("psych.isolation_stress", psych.isolation_stress)?;
        non_negative("psych.recovery", psych.recovery)?;
        non_negative("psych.jitter", psych.jitter)?;
        positive("psych.casualty_radius", psych.casualty_radius)?;
        positive("psych.isolation_radius", psych.isolation_radius)?;

        let cohesion = &self.cohesion;
        positive("cohesion.dispersal_radius", cohesion.dispersal_radius)?;
        unit_interval("cohesion.break_fraction", cohesion.break_fraction)?;
        unit_interval("cohesion.reform_fraction", cohesion.reform_fraction)?;
        unit_interval("cohesion.hold_casualty_rate", cohesion.hold_casualty_rate)?;
        if cohesion.reform_fraction >= cohesion.break_fraction {
            return Err(ConfigError::InvalidThreshold {
                name: "cohesion",
                detail: format!(
                    "reform fraction {} must be below break fraction {}",
                    cohesion.reform_fraction, cohesion.break_fraction
                ),
            });
        }

        let combat = &self.combat;
        positive("combat.max_health", combat.max_health)?;
        positive("combat.weapon_range", combat.weapon_range)?;
        unit_interval("combat.base_hit_chance", combat.base_hit_chance)?;
        unit_interval("combat.stress_accuracy_penalty", combat.stress_accuracy_penalty)?;
        unit_interval("combat.range_falloff", combat.range_falloff)?;
        positive("combat.damage_min", combat.damage_min)?;
        positive("combat.damage_max", combat.damage_max)?;
        if combat.damage_max < combat.damage_min {
            return Err(ConfigError::InvalidTuning {
                name: "combat.damage_max",
                detail: format!(
                    "must be at least damage_min {}, got {}",
                    combat.damage_min, combat.damage_max
                ),
            });
        }

        positive("movement.move_speed", self.movement.move_speed)?;
        positive("movement.retreat_speed", self.movement.retreat_speed)?;
        positive("movement.arrival_radius", self.movement.arrival_radius)?;

        non_negative(
            "effectiveness.progress_epsilon",
            self.effectiveness.progress_epsilon,
        )?;
        if self.effectiveness.stall_ticks == 0 {
            return Err(ConfigError::InvalidTuning {
                name: "effectiveness.stall_ticks",
                detail: "must be positive".into(),
            });
        }
        if self.effectiveness.detach_ticks == 0 {
            return Err(ConfigError::InvalidTuning {
                name: "effectiveness.detach_ticks",
                detail: "must be positive".into(),
            });
        }
        if self.window.size == 0 {
            return Err(ConfigError::InvalidTuning {
                name: "window.size",
                detail: "must be positive".into(),
            });
        }
        self.grading.validate()
    }
}

impl GradingWeights {
    fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            self.survival,
            self.initiative,
            self.contact,
            self.engagement,
            self.hit,
            self.kill,
            self.stalled,
            self.detached,
            self.disobedience,
            self.panic,
            self.surrender,
        ];
        if let Some(bad) = weights.iter().find(|w| !w.is_finite()) {
            return Err(ConfigError::InvalidTuning {
                name: "grading",
                detail: format!("weights must be finite, got {bad}"),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
