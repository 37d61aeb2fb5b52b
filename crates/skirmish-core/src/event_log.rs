//! Append-only structured event log.
//!
//! Every discrete state change in a run is recorded as a [`SimLogEntry`]:
//! `{tick, category, key, soldier, team, value}`. Entries are appended in
//! tick order and never removed or edited. Grading and tests read the log
//! back through the query helpers.
//!
//! # Example
//!
//! ```
//! use skirmish_core::entity::Team;
//! use skirmish_core::event_log::{Category, EventLog};
//!
//! let mut log = EventLog::new();
//! log.record(3, Category::Vision, "contact_new", "R0", Team::Red, "B6");
//! log.record(9, Category::State, "state_change", "B6", Team::Blue, "engaging->dead");
//!
//! assert_eq!(log.count(Category::Vision, "contact_new"), 1);
//! assert_eq!(log.first_death_tick(), Some(9));
//! ```

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::entity::Team;

/// Event category, written lower-case.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Contacts gained and lost
    Vision,
    /// Squad cohesion and intent
    Squad,
    /// Refusal onsets and releases
    Psych,
    /// Life-state transitions
    State,
    /// Per-soldier intent and goal changes
    Goal,
    /// Stalled and detached flags
    Effectiveness,
}

impl Category {
    /// Lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vision => "vision",
            Self::Squad => "squad",
            Self::Psych => "psych",
            Self::State => "state",
            Self::Goal => "goal",
            Self::Effectiveness => "effectiveness",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One log record.
///
/// `soldier` holds a soldier label (`R3`) or, for squad entries, a squad
/// label (`RS0`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimLogEntry {
    /// Tick the change happened on
    pub tick: u64,
    /// Category
    pub category: Category,
    /// Event key within the category
    pub key: String,
    /// Subject label
    pub soldier: String,
    /// Subject team
    pub team: Team,
    /// Free-form value
    pub value: String,
}

impl fmt::Display for SimLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:>6}] {}/{} {} ({}) {}",
            self.tick, self.category, self.key, self.soldier, self.team, self.value
        )
    }
}

/// The run's event log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<SimLogEntry>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an entry.
    ///
    /// # Panics
    ///
    /// Panics if `entry.tick` is lower than the last recorded tick. Out of
    /// order appends mean the engine's phase ordering is broken.
    pub fn push(&mut self, entry: SimLogEntry) {
        if let Some(last) = self.entries.last() {
            assert!(
                entry.tick >= last.tick,
                "event log tick regression: {} after {}",
                entry.tick,
                last.tick
            );
        }
        self.entries.push(entry);
    }

    /// Builds and appends an entry.
    ///
    /// # Panics
    ///
    /// See [`EventLog::push`].
    pub fn record(
        &mut self,
        tick: u64,
        category: Category,
        key: &str,
        soldier: &str,
        team: Team,
        value: impl Into<String>,
    ) {
        self.push(SimLogEntry {
            tick,
            category,
            key: key.to_owned(),
            soldier: soldier.to_owned(),
            team,
            value: value.into(),
        });
    }

    /// All entries in append order.
    #[must_use]
    pub fn entries(&self) -> &[SimLogEntry] {
        &self.entries
    }

    /// Iterates entries in append order.
    pub fn iter(&self) -> std::slice::Iter<'_, SimLogEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries with this category and key.
    #[must_use]
    pub fn count(&self, category: Category, key: &str) -> usize {
        self.matching(category, key).count()
    }

    /// Tick of the first entry with this category and key.
    #[must_use]
    pub fn first_tick(&self, category: Category, key: &str) -> Option<u64> {
        self.matching(category, key).next().map(|e| e.tick)
    }

    /// Tick of the first recorded death.
    #[must_use]
    pub fn first_death_tick(&self) -> Option<u64> {
        self.matching(Category::State, "state_change")
            .find(|e| e.value.ends_with("->dead"))
            .map(|e| e.tick)
    }

    /// Iterates entries with this category and key.
    pub fn matching<'a>(
        &'a self,
        category: Category,
        key: &'a str,
    ) -> impl Iterator<Item = &'a SimLogEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.category == category && e.key == key)
    }

    /// Writes the log as JSON Lines, one entry per line.
    ///
    /// # Errors
    ///
    /// Returns any I/O or serialization error from the writer.
    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for entry in &self.entries {
            serde_json::to_writer(&mut writer, entry)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a SimLogEntry;
    type IntoIter = std::slice::Iter<'a, SimLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
