//! Arena module for the battle simulation.
//!
//! The Arena is the single owned container for a run's mutable world state. It provides:
//! - Soldier and squad storage with deterministic iteration order (`BTreeMap`)
//! - Spatial indexing of living soldiers for proximity queries
//! - Map bounds and obstacle line-of-sight tests
//!
//! # Architecture
//!
//! The Arena uses `BTreeMap` storage so that iterating soldiers always yields
//! ascending [`SoldierId`] order. Every subsystem that draws from the RNG walks
//! soldiers in that order, which is what keeps runs reproducible.
//!
//! # Spatial Index Synchronization
//!
//! The spatial index is NOT automatically synchronized when positions change.
//! After moving a soldier through [`Arena::soldier_mut`], call
//! [`Arena::update_spatial`]. Dead soldiers are removed from the index with
//! [`Arena::remove_spatial`] and never re-enter it.
//!
//! # Example
//!
//! ```
//! use skirmish_core::arena::Arena;
//! use skirmish_core::scenario;
//!
//! let config = scenario::builtin("mutual_advance", 42).unwrap();
//! let arena = Arena::from_config(&config);
//!
//! let ids: Vec<_> = arena.soldier_ids().collect();
//! assert!(ids.windows(2).all(|w| w[0] < w[1]));
//! assert_eq!(arena.squads().count(), 4);
//! ```

use std::collections::{BTreeMap, HashMap};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{MapConfig, ScenarioConfig};
use crate::entity::{PsychState, Soldier, SoldierId, SquadId, Team};
use crate::squad::Squad;

// =============================================================================
// Spatial Index
// =============================================================================

/// Position index over living soldiers.
///
/// Backed by a `HashMap`; every query sorts its result by id, so the map's
/// iteration order never leaks into simulation state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpatialIndex {
    positions: HashMap<SoldierId, Vec2>,
}

impl SpatialIndex {
    /// Creates a new empty spatial index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    /// Inserts or updates a soldier's position.
    pub fn insert(&mut self, id: SoldierId, pos: Vec2) {
        self.positions.insert(id, pos);
    }

    /// Removes a soldier from the index.
    pub fn remove(&mut self, id: SoldierId) {
        self.positions.remove(&id);
    }

    /// Returns the indexed position of a soldier, if present.
    #[must_use]
    pub fn get(&self, id: SoldierId) -> Option<Vec2> {
        self.positions.get(&id).copied()
    }

    /// Queries for soldiers within `radius` of `center`.
    ///
    /// # Returns
    ///
    /// Soldier ids within the radius, sorted ascending.
    #[must_use]
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<SoldierId> {
        let radius_sq = radius * radius;
        let mut results: Vec<SoldierId> = self
            .positions
            .iter()
            .filter(|(_, pos)| center.distance_squared(**pos) <= radius_sq)
            .map(|(id, _)| *id)
            .collect();

        results.sort();
        results
    }

    /// Returns the number of indexed soldiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

// =============================================================================
// Arena
// =============================================================================

/// World state of one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    soldiers: BTreeMap<SoldierId, Soldier>,
    squads: BTreeMap<SquadId, Squad>,
    map: MapConfig,
    spatial: SpatialIndex,
}

impl Arena {
    /// Builds the initial world from a configuration.
    ///
    /// The configuration is assumed valid (see
    /// [`ScenarioConfig::validate`]). Squad ids are assigned in roster order.
    #[must_use]
    pub fn from_config(config: &ScenarioConfig) -> Self {
        let tuning = &config.tuning;

        let mut squad_of: BTreeMap<u32, SquadId> = BTreeMap::new();
        let mut squads = BTreeMap::new();
        for (index, roster) in config.squads.iter().enumerate() {
            let squad_id = SquadId::new(u32::try_from(index).unwrap_or(u32::MAX));
            let members = roster
                .members
                .iter()
                .map(|&m| {
                    squad_of.insert(m, squad_id);
                    SoldierId::new(m)
                })
                .collect();
            squads.insert(squad_id, Squad::new(squad_id, roster.team, members));
        }

        let mut soldiers = BTreeMap::new();
        let mut spatial = SpatialIndex::new();
        for placement in &config.soldiers {
            let id = SoldierId::new(placement.id);
            let squad = squad_of
                .get(&placement.id)
                .copied()
                .unwrap_or(SquadId::new(0));
            let soldier = Soldier::new(
                id,
                placement.team,
                squad,
                placement.start(),
                placement.goal(),
                tuning.combat.max_health,
            )
            .with_psych(PsychState::new(&tuning.psych));
            spatial.insert(id, soldier.position());
            soldiers.insert(id, soldier);
        }

        Self {
            soldiers,
            squads,
            map: config.map.clone(),
            spatial,
        }
    }

    // -------------------------------------------------------------------------
    // Soldiers
    // -------------------------------------------------------------------------

    /// Returns a soldier by id.
    #[must_use]
    pub fn soldier(&self, id: SoldierId) -> Option<&Soldier> {
        self.soldiers.get(&id)
    }

    /// Returns a mutable soldier by id.
    #[must_use]
    pub fn soldier_mut(&mut self, id: SoldierId) -> Option<&mut Soldier> {
        self.soldiers.get_mut(&id)
    }

    /// Iterates soldier ids in ascending order.
    pub fn soldier_ids(&self) -> impl Iterator<Item = SoldierId> + '_ {
        self.soldiers.keys().copied()
    }

    /// Iterates all soldiers in ascending id order, dead included.
    pub fn soldiers(&self) -> impl Iterator<Item = &Soldier> + Clone + '_ {
        self.soldiers.values()
    }

    /// Iterates one team's soldiers in ascending id order.
    pub fn team_soldiers(&self, team: Team) -> impl Iterator<Item = &Soldier> + Clone + '_ {
        self.soldiers.values().filter(move |s| s.team() == team)
    }

    /// Number of soldiers, dead included.
    #[must_use]
    pub fn soldier_count(&self) -> usize {
        self.soldiers.len()
    }

    /// Number of living soldiers on `team`.
    #[must_use]
    pub fn living_count(&self, team: Team) -> usize {
        self.team_soldiers(team).filter(|s| s.is_alive()).count()
    }

    // -------------------------------------------------------------------------
    // Squads
    // -------------------------------------------------------------------------

    /// Returns a squad by id.
    #[must_use]
    pub fn squad(&self, id: SquadId) -> Option<&Squad> {
        self.squads.get(&id)
    }

    /// Returns a mutable squad by id.
    #[must_use]
    pub fn squad_mut(&mut self, id: SquadId) -> Option<&mut Squad> {
        self.squads.get_mut(&id)
    }

    /// Iterates squad ids in ascending order.
    pub fn squad_ids(&self) -> impl Iterator<Item = SquadId> + '_ {
        self.squads.keys().copied()
    }

    /// Iterates squads in ascending id order.
    pub fn squads(&self) -> impl Iterator<Item = &Squad> + Clone + '_ {
        self.squads.values()
    }

    /// Centroid of a squad's living members, or `None` if all are dead.
    #[must_use]
    pub fn living_centroid(&self, squad: SquadId) -> Option<Vec2> {
        let squad = self.squads.get(&squad)?;
        let (sum, count) = squad
            .members()
            .iter()
            .filter_map(|id| self.soldiers.get(id))
            .filter(|s| s.is_alive())
            .fold((Vec2::ZERO, 0_u32), |(sum, n), s| (sum + s.position(), n + 1));
        #[allow(clippy::cast_precision_loss)]
        (count > 0).then(|| sum / count as f32)
    }

    // -------------------------------------------------------------------------
    // Space
    // -------------------------------------------------------------------------

    /// Returns the map.
    #[must_use]
    pub const fn map(&self) -> &MapConfig {
        &self.map
    }

    /// Returns the spatial index of living soldiers.
    #[must_use]
    pub const fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    /// Re-syncs a living soldier's indexed position.
    pub fn update_spatial(&mut self, id: SoldierId) {
        if let Some(soldier) = self.soldiers.get(&id) {
            if soldier.is_alive() {
                self.spatial.insert(id, soldier.position());
            }
        }
    }

    /// Drops a soldier from the spatial index.
    pub fn remove_spatial(&mut self, id: SoldierId) {
        self.spatial.remove(id);
    }

    /// Returns `true` if no obstacle blocks the segment `from -> to`.
    ///
    /// An obstacle blocks when the segment passes strictly inside its radius.
    #[must_use]
    pub fn line_of_sight(&self, from: Vec2, to: Vec2) -> bool {
        self.map
            .obstacles
            .iter()
            .all(|o| segment_distance(from, to, o.center()) >= o.radius)
    }
}

/// Shortest distance from `p` to the segment `a -> b`.
fn segment_distance(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a.distance(p);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t).distance(p)
}
