//! Per-soldier performance grading.
//!
//! Grading is a pure function of the event log, the final soldier states and
//! the [`GradingWeights`]. It never mutates anything, so grading the same run
//! twice gives identical results.
//!
//! # Score
//!
//! ```text
//! score = survival + initiative + contacts + engagements + hits + kills
//!       - stalled - detached - disobedience - panic - surrender
//! ```
//!
//! where each term is the soldier's tally multiplied by its weight. The
//! letter grade maps the score through fixed breakpoints (see
//! [`letter_grade`]).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::GradingWeights;
use crate::entity::{RefusalKind, Soldier, Team};
use crate::event_log::{Category, EventLog};

/// Minimum initiative contacts for `first_to_spot`.
pub const FIRST_TO_SPOT_MIN: u32 = 2;
/// Minimum shots before accuracy is judged.
pub const MARKSMAN_MIN_SHOTS: u32 = 10;
/// Hit ratio required for `marksman`.
pub const MARKSMAN_MIN_RATIO: f64 = 0.15;
/// Kills required for `lethal`.
pub const LETHAL_MIN_KILLS: u32 = 2;
/// Engagements required for `aggressive`.
pub const AGGRESSIVE_MIN_ENGAGEMENTS: u32 = 3;
/// Disobedience onsets required for `insubordinate`.
pub const INSUBORDINATE_MIN: u32 = 2;

// =============================================================================
// Letter Grades
// =============================================================================

/// Letter grade derived from a score.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LetterGrade {
    /// Score of 90 or more
    A,
    /// 75 up to 90
    B,
    /// 60 up to 75
    C,
    /// 40 up to 60
    D,
    /// Below 40
    F,
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        f.write_str(letter)
    }
}

/// Maps a score to a letter grade.
///
/// Monotonic: a higher score never gets a worse letter.
///
/// # Example
///
/// ```
/// use skirmish_core::grading::{letter_grade, LetterGrade};
///
/// assert_eq!(letter_grade(95.0), LetterGrade::A);
/// assert_eq!(letter_grade(75.0), LetterGrade::B);
/// assert_eq!(letter_grade(-10.0), LetterGrade::F);
/// ```
#[must_use]
pub fn letter_grade(score: f64) -> LetterGrade {
    if score >= 90.0 {
        LetterGrade::A
    } else if score >= 75.0 {
        LetterGrade::B
    } else if score >= 60.0 {
        LetterGrade::C
    } else if score >= 40.0 {
        LetterGrade::D
    } else {
        LetterGrade::F
    }
}

// =============================================================================
// Tallies
// =============================================================================

/// Raw counts a grade is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoldierTally {
    /// Contacts gained
    pub contacts: u32,
    /// Enemies spotted strictly before they spotted this soldier
    pub initiative: u32,
    /// Transitions into the engaging state
    pub engagements: u32,
    /// Shots fired
    pub shots: u32,
    /// Hits scored
    pub hits: u32,
    /// Kills
    pub kills: u32,
    /// Stalled-in-combat flags
    pub stalled: u32,
    /// Detached-from-engagement flags
    pub detached: u32,
    /// Disobedience onsets
    pub disobedience: u32,
    /// Panic onsets
    pub panic: u32,
    /// Surrender onsets
    pub surrender: u32,
}

impl SoldierTally {
    /// Total refusal onsets.
    #[must_use]
    pub const fn refusals(&self) -> u32 {
        self.disobedience + self.panic + self.surrender
    }

    #[allow(clippy::cast_precision_loss)]
    fn hit_ratio(&self) -> f64 {
        if self.shots == 0 {
            0.0
        } else {
            f64::from(self.hits) / f64::from(self.shots)
        }
    }
}

/// Grade for one soldier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoldierGrade {
    /// Soldier label
    pub label: String,
    /// Side
    pub team: Team,
    /// Weighted score
    pub score: f64,
    /// Letter grade of `score`
    pub letter: LetterGrade,
    /// Alive at the end of the run
    pub survived: bool,
    /// Positive traits
    pub good_traits: BTreeSet<String>,
    /// Negative traits
    pub bad_traits: BTreeSet<String>,
    /// Counts the grade was computed from
    pub tally: SoldierTally,
}

/// Per-label counts read from the log.
#[derive(Default)]
struct LogTallies {
    by_label: BTreeMap<String, SoldierTally>,
}

impl LogTallies {
    fn read(log: &EventLog) -> Self {
        let mut tallies = Self::default();
        let mut first_sighting: BTreeMap<(&str, &str), u64> = BTreeMap::new();

        for entry in log {
            let label = entry.soldier.as_str();
            match (entry.category, entry.key.as_str()) {
                (Category::Vision, "contact_new") => {
                    tallies.get(label).contacts += 1;
                    first_sighting
                        .entry((label, entry.value.as_str()))
                        .or_insert(entry.tick);
                }
                (Category::State, "state_change") if entry.value.ends_with("->engaging") => {
                    tallies.get(label).engagements += 1;
                }
                (Category::Effectiveness, "stalled_in_combat") => {
                    tallies.get(label).stalled += 1;
                }
                (Category::Effectiveness, "detached_from_engagement") => {
                    tallies.get(label).detached += 1;
                }
                (Category::Psych, key) => {
                    let tally = tallies.get(label);
                    if key == RefusalKind::Disobedience.on_key() {
                        tally.disobedience += 1;
                    } else if key == RefusalKind::Panic.on_key() {
                        tally.panic += 1;
                    } else if key == RefusalKind::Surrender.on_key() {
                        tally.surrender += 1;
                    }
                }
                _ => {}
            }
        }

        for (&(observer, target), &tick) in &first_sighting {
            let seen_back = first_sighting.get(&(target, observer));
            if seen_back.map_or(true, |&back| tick < back) {
                tallies.get(observer).initiative += 1;
            }
        }
        tallies
    }

    fn get(&mut self, label: &str) -> &mut SoldierTally {
        self.by_label.entry(label.to_owned()).or_default()
    }
}

// =============================================================================
// Grading
// =============================================================================

fn score(tally: &SoldierTally, survived: bool, w: &GradingWeights) -> f64 {
    let f = f64::from;
    let mut score = f(tally.initiative) * w.initiative
        + f(tally.contacts) * w.contact
        + f(tally.engagements) * w.engagement
        + f(tally.hits) * w.hit
        + f(tally.kills) * w.kill
        - f(tally.stalled) * w.stalled
        - f(tally.detached) * w.detached
        - f(tally.disobedience) * w.disobedience
        - f(tally.panic) * w.panic
        - f(tally.surrender) * w.surrender;
    if survived {
        score += w.survival;
    }
    score
}

fn traits(tally: &SoldierTally, survived: bool) -> (BTreeSet<String>, BTreeSet<String>) {
    let good = [
        ("steadfast", survived && tally.refusals() == 0),
        ("first_to_spot", tally.initiative >= FIRST_TO_SPOT_MIN),
        (
            "marksman",
            tally.shots >= MARKSMAN_MIN_SHOTS && tally.hit_ratio() >= MARKSMAN_MIN_RATIO,
        ),
        ("lethal", tally.kills >= LETHAL_MIN_KILLS),
        ("aggressive", tally.engagements >= AGGRESSIVE_MIN_ENGAGEMENTS),
    ];
    let bad = [
        ("killed_in_action", !survived),
        ("bogged_down", tally.stalled > 0),
        ("drifted", tally.detached > 0),
        ("insubordinate", tally.disobedience >= INSUBORDINATE_MIN),
        ("panicked", tally.panic > 0),
        ("surrendered", tally.surrender > 0),
    ];
    let pick = |rules: &[(&str, bool)]| {
        rules
            .iter()
            .filter(|(_, on)| *on)
            .map(|(name, _)| (*name).to_owned())
            .collect()
    };
    (pick(&good), pick(&bad))
}

/// Grades every soldier, in the order given.
///
/// Pass soldiers in ascending id order (as [`Arena::soldiers`] yields them)
/// for a stable report order.
///
/// [`Arena::soldiers`]: crate::arena::Arena::soldiers
#[must_use]
pub fn grade_soldiers<'a>(
    log: &EventLog,
    soldiers: impl IntoIterator<Item = &'a Soldier>,
    weights: &GradingWeights,
) -> Vec<SoldierGrade> {
    let mut tallies = LogTallies::read(log);
    soldiers
        .into_iter()
        .map(|soldier| {
            let mut tally = *tallies.get(soldier.label());
            let record = soldier.combat();
            tally.shots = record.shots;
            tally.hits = record.hits;
            tally.kills = record.kills;
            let survived = soldier.is_alive();
            let score = score(&tally, survived, weights);
            let (good_traits, bad_traits) = traits(&tally, survived);
            SoldierGrade {
                label: soldier.label().to_owned(),
                team: soldier.team(),
                score,
                letter: letter_grade(score),
                survived,
                good_traits,
                bad_traits,
                tally,
            }
        })
        .collect()
}
