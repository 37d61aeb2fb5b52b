//! Built-in scenarios.
//!
//! - `mutual_advance`: symmetric 6v6. Two squads of three per side start on
//!   opposite edges and advance on each other's start line.
//! - `ambush`: Blue advances in two squads across open ground toward a
//!   treeline. Red holds in two squads just behind it.

use crate::config::{
    ConfigError, MapConfig, Obstacle, ScenarioConfig, SoldierPlacement, SquadRoster, Tuning,
};
use crate::entity::Team;

/// Names accepted by [`builtin`].
pub const BUILTIN_NAMES: [&str; 2] = ["mutual_advance", "ambush"];

const MAP_WIDTH: f32 = 240.0;
const MAP_HEIGHT: f32 = 120.0;

/// Returns a built-in scenario with the given seed.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownScenario`] for any name not in
/// [`BUILTIN_NAMES`].
///
/// # Example
///
/// ```
/// use skirmish_core::scenario;
///
/// let config = scenario::builtin("mutual_advance", 42).unwrap();
/// assert_eq!(config.soldiers.len(), 12);
/// assert!(config.validate().is_ok());
/// assert!(scenario::builtin("nope", 42).is_err());
/// ```
pub fn builtin(name: &str, seed: u64) -> Result<ScenarioConfig, ConfigError> {
    match name {
        "mutual_advance" => Ok(mutual_advance(seed)),
        "ambush" => Ok(ambush(seed)),
        other => Err(ConfigError::UnknownScenario(other.to_owned())),
    }
}

/// Three soldiers in a column at `x`, starting at `y`, spaced `gap` apart.
fn fireteam(
    first_id: u32,
    team: Team,
    x: f32,
    y: f32,
    gap: f32,
    goal_x: f32,
) -> (Vec<SoldierPlacement>, SquadRoster) {
    let placements: Vec<SoldierPlacement> = (0..3_u8)
        .map(|i| {
            let row = y + f32::from(i) * gap;
            SoldierPlacement::new(first_id + u32::from(i), team, (x, row), (goal_x, row))
        })
        .collect();
    let roster = SquadRoster::new(team, placements.iter().map(|p| p.id).collect());
    (placements, roster)
}

fn assemble(
    name: &str,
    seed: u64,
    obstacles: Vec<Obstacle>,
    teams: Vec<(Vec<SoldierPlacement>, SquadRoster)>,
) -> ScenarioConfig {
    let mut soldiers = Vec::new();
    let mut squads = Vec::new();
    for (placements, roster) in teams {
        soldiers.extend(placements);
        squads.push(roster);
    }
    ScenarioConfig {
        name: name.to_owned(),
        seed,
        map: MapConfig {
            width: MAP_WIDTH,
            height: MAP_HEIGHT,
            obstacles,
        },
        soldiers,
        squads,
        tuning: Tuning::default(),
    }
}

fn mutual_advance(seed: u64) -> ScenarioConfig {
    let (west, east) = (20.0, 220.0);
    assemble(
        "mutual_advance",
        seed,
        Vec::new(),
        vec![
            fireteam(0, Team::Red, west, 35.0, 6.0, east),
            fireteam(3, Team::Red, west, 70.0, 6.0, east),
            fireteam(6, Team::Blue, east, 35.0, 6.0, west),
            fireteam(9, Team::Blue, east, 70.0, 6.0, west),
        ],
    )
}

fn ambush(seed: u64) -> ScenarioConfig {
    let treeline = vec![
        Obstacle::new(125.0, 40.0, 9.0),
        Obstacle::new(125.0, 58.0, 9.0),
        Obstacle::new(125.0, 76.0, 9.0),
    ];
    // Red holds in place: objective equals start.
    assemble(
        "ambush",
        seed,
        treeline,
        vec![
            fireteam(0, Team::Red, 140.0, 42.0, 8.0, 140.0),
            fireteam(3, Team::Red, 146.0, 66.0, 8.0, 146.0),
            fireteam(6, Team::Blue, 20.0, 40.0, 7.0, 225.0),
            fireteam(9, Team::Blue, 20.0, 66.0, 7.0, 225.0),
        ],
    )
}
