//! End-to-end tests of full runs through the public API.

use std::collections::BTreeMap;

use crate::config::{ConfigError, ScenarioConfig};
use crate::entity::{LifeState, RefusalKind, Team};
use crate::event_log::{Category, EventLog};
use crate::grading::letter_grade;
use crate::outcome::BattleOutcome;
use crate::scenario;
use crate::simulation::Simulation;

fn long_run(name: &str) -> Simulation {
    let mut sim = Simulation::new(scenario::builtin(name, 42).unwrap()).unwrap();
    sim.run(3600).unwrap();
    sim
}

/// Groups the values of one category/key set by subject label.
fn values_by_subject<'a>(
    log: &'a EventLog,
    category: Category,
    keys: &[&str],
) -> BTreeMap<&'a str, Vec<&'a str>> {
    let mut map: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for entry in log
        .iter()
        .filter(|e| e.category == category && keys.contains(&e.key.as_str()))
    {
        map.entry(entry.soldier.as_str())
            .or_default()
            .push(entry.key.as_str());
    }
    map
}

fn assert_alternates(sequence: &[&str], on: &str, off: &str) {
    for (i, key) in sequence.iter().enumerate() {
        let expected = if i % 2 == 0 { on } else { off };
        assert_eq!(*key, expected, "sequence {sequence:?} breaks at {i}");
    }
}

// =============================================================================
// Mutual advance
// =============================================================================

#[test]
fn mutual_advance_full_run() {
    let sim = long_run("mutual_advance");
    let log = sim.log();

    assert_eq!(sim.tick(), 3600);
    assert!(!log.is_empty());
    assert!(log.entries().windows(2).all(|w| w[0].tick <= w[1].tick));

    let first_contact = log
        .first_tick(Category::Vision, "contact_new")
        .expect("the lines meet");
    if let Some(first_death) = log.first_death_tick() {
        assert!(first_death >= first_contact);
    }
}

#[test]
fn mutual_advance_dead_stay_dead() {
    let sim = long_run("mutual_advance");
    for soldier in sim.all_soldiers() {
        let changes: Vec<&str> = sim
            .log()
            .matching(Category::State, "state_change")
            .filter(|e| e.soldier == soldier.label())
            .map(|e| e.value.as_str())
            .collect();
        if let Some(pos) = changes.iter().position(|v| v.ends_with("->dead")) {
            assert_eq!(pos, changes.len() - 1, "{} changed after death", soldier.label());
            assert_eq!(soldier.life_state(), LifeState::Dead);
            assert_eq!(soldier.health(), 0.0);
            assert!(!soldier.is_effective());
            // Contacts are dropped on the next vision pass after death.
            if soldier.died_at().is_some_and(|t| t + 1 < sim.tick()) {
                assert!(soldier.contacts().is_empty());
            }
        } else {
            assert!(soldier.is_alive());
        }
    }
}

#[test]
fn mutual_advance_flags_alternate() {
    let sim = long_run("mutual_advance");
    let log = sim.log();

    for kind in RefusalKind::ALL {
        let (on, off) = (kind.on_key(), kind.off_key());
        for sequence in values_by_subject(log, Category::Psych, &[on, off]).values() {
            assert_alternates(sequence, on, off);
        }
    }
    for (on, off) in [
        ("stalled_in_combat", "stalled_in_combat_end"),
        ("detached_from_engagement", "detached_from_engagement_end"),
    ] {
        for sequence in values_by_subject(log, Category::Effectiveness, &[on, off]).values() {
            assert_alternates(sequence, on, off);
        }
    }
}

#[test]
fn mutual_advance_cohesion_alternates() {
    let sim = long_run("mutual_advance");
    let mut by_squad: BTreeMap<&str, Vec<(u64, &str)>> = BTreeMap::new();
    for entry in sim.log().matching(Category::Squad, "cohesion") {
        by_squad
            .entry(entry.soldier.as_str())
            .or_default()
            .push((entry.tick, entry.value.as_str()));
    }
    for changes in by_squad.values() {
        for (i, (_, value)) in changes.iter().enumerate() {
            assert_eq!(*value, if i % 2 == 0 { "broken" } else { "reformed" });
        }
        // Never broken and reformed on the same tick.
        assert!(changes.windows(2).all(|w| w[0].0 < w[1].0));
    }
}

#[test]
fn mutual_advance_reports() {
    let sim = long_run("mutual_advance");

    let outcome = sim.outcome();
    assert!(outcome.red_squads_broken <= outcome.red_squads_total);
    assert!(outcome.blue_squads_broken <= outcome.blue_squads_total);
    assert_eq!(outcome.red_squads_total, 2);
    assert_eq!(
        outcome.red_effective,
        sim.soldiers(Team::Red).filter(|s| s.is_effective()).count()
    );
    match outcome.outcome {
        BattleOutcome::RedVictory => {
            assert!(outcome.blue_effective == 0 || outcome.blue_squads_broken == 2);
        }
        BattleOutcome::BlueVictory => {
            assert!(outcome.red_effective == 0 || outcome.red_squads_broken == 2);
        }
        BattleOutcome::Draw | BattleOutcome::Inconclusive => {}
    }

    let grades = sim.grades();
    assert_eq!(grades.len(), 12);
    assert_eq!(grades, sim.grades());
    for (grade, placement) in grades.iter().zip(&sim.config().soldiers) {
        assert_eq!(grade.team, placement.team);
        assert_eq!(grade.label, format!("{}{}", placement.team.prefix(), placement.id));
        assert_eq!(grade.letter, letter_grade(grade.score));
        assert!(grade.tally.hits <= grade.tally.shots);
    }

    let window = sim.window_summary();
    assert_eq!(window.samples, 300);
    assert_eq!(window.first_tick, Some(3300));
    assert_eq!(window.last_tick, Some(3599));
    for team in Team::ALL {
        let stats = window.team(team);
        assert!((0.0..=1.0).contains(&stats.avg_stress));
        assert!((0.0..=1.0).contains(&stats.avg_casualty_rate));
        assert!(stats.avg_alive <= 6.0);
    }
}

// =============================================================================
// Ambush
// =============================================================================

#[test]
fn ambush_full_run() {
    let sim = long_run("ambush");
    let log = sim.log();

    assert!(log.first_tick(Category::Vision, "contact_new").is_some());
    assert!(sim.outcome().blue_squads_broken <= 2);
    // Red holds: every objective is its own start position.
    for soldier in sim.soldiers(Team::Red) {
        assert!((soldier.objective() - soldier.start()).length() < f32::EPSILON);
    }
}

// =============================================================================
// Configuration files
// =============================================================================

const DUEL_JSON: &str = r#"{
    "name": "file_duel",
    "seed": 5,
    "map": { "width": 200.0, "height": 100.0 },
    "soldiers": [
        { "id": 0, "team": "red",  "start_x": 20.0,  "start_y": 50.0, "goal_x": 180.0, "goal_y": 50.0 },
        { "id": 1, "team": "blue", "start_x": 180.0, "start_y": 50.0, "goal_x": 20.0,  "goal_y": 50.0 }
    ],
    "squads": [
        { "team": "red", "members": [0] },
        { "team": "blue", "members": [1] }
    ],
    "tuning": { "window": { "size": 50 } }
}"#;

#[test]
fn json_config_runs() {
    let config = ScenarioConfig::from_json_str(DUEL_JSON).unwrap();
    assert_eq!(config.tuning.window.size, 50);
    assert_eq!(config.tuning.vision.range, 70.0);

    let mut sim = Simulation::new(config).unwrap();
    sim.run(400).unwrap();
    assert_eq!(sim.name(), "file_duel");
    assert_eq!(sim.window_summary().samples, 50);
    assert!(sim.log().first_tick(Category::Vision, "contact_new").is_some());
}

#[test]
fn malformed_json_is_parse_error() {
    assert!(matches!(
        ScenarioConfig::from_json_str("{ \"seed\": "),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn unknown_roster_member_is_rejected() {
    let mut config = ScenarioConfig::from_json_str(DUEL_JSON).unwrap();
    config.squads[0].members.push(9);
    assert!(matches!(
        Simulation::new(config),
        Err(ConfigError::UnknownSoldier { soldier: 9, .. })
    ));
}
