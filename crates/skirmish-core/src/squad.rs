//! Squads: fixed rosters of soldiers sharing a cohesion state and an intent.
//!
//! A squad owns no soldiers. It holds an ordered list of [`SoldierId`]s and
//! the arena resolves them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{Intent, SoldierId, SquadId, Team};

/// Cohesion state of a squad.
///
/// Transitions: `Intact|Reformed -> Broken` and `Broken -> Reformed`. A squad
/// never returns to `Intact`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cohesion {
    /// Never broken
    #[default]
    Intact,
    /// Too many members dead, refusing or dispersed
    Broken,
    /// Broken earlier, since recovered
    Reformed,
}

impl Cohesion {
    /// Lower-case name, as written to the event log.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intact => "intact",
            Self::Broken => "broken",
            Self::Reformed => "reformed",
        }
    }

    /// Returns `true` for [`Cohesion::Broken`].
    #[must_use]
    pub const fn is_broken(self) -> bool {
        matches!(self, Self::Broken)
    }
}

impl fmt::Display for Cohesion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A squad roster with its shared state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Squad {
    id: SquadId,
    team: Team,
    label: String,
    members: Vec<SoldierId>,
    pub(crate) cohesion: Cohesion,
    pub(crate) intent: Intent,
}

impl Squad {
    /// Creates an intact squad advancing on its objective.
    ///
    /// # Example
    ///
    /// ```
    /// use skirmish_core::entity::{SoldierId, SquadId, Team};
    /// use skirmish_core::squad::{Cohesion, Squad};
    ///
    /// let squad = Squad::new(SquadId::new(1), Team::Blue, vec![SoldierId::new(4)]);
    /// assert_eq!(squad.label(), "BS1");
    /// assert_eq!(squad.cohesion(), Cohesion::Intact);
    /// ```
    #[must_use]
    pub fn new(id: SquadId, team: Team, members: Vec<SoldierId>) -> Self {
        Self {
            id,
            team,
            label: format!("{}S{}", team.prefix(), id.as_u32()),
            members,
            cohesion: Cohesion::Intact,
            intent: Intent::Advance,
        }
    }

    /// Returns the squad id.
    #[must_use]
    pub const fn id(&self) -> SquadId {
        self.id
    }

    /// Returns the squad's team.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Returns the log label (`RS0`, `BS3`, ...).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the roster in configuration order.
    #[must_use]
    pub fn members(&self) -> &[SoldierId] {
        &self.members
    }

    /// Returns the roster size, dead members included.
    #[must_use]
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Returns the cohesion state.
    #[must_use]
    pub const fn cohesion(&self) -> Cohesion {
        self.cohesion
    }

    /// Returns `true` while the squad is broken.
    #[must_use]
    pub const fn is_broken(&self) -> bool {
        self.cohesion.is_broken()
    }

    /// Returns the squad-wide intent.
    #[must_use]
    pub const fn intent(&self) -> Intent {
        self.intent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn red_label() {
        let squad = Squad::new(SquadId::new(0), Team::Red, vec![SoldierId::new(0)]);
        assert_eq!(squad.label(), "RS0");
        assert_eq!(squad.intent(), Intent::Advance);
        assert!(!squad.is_broken());
    }

    #[test]
    fn cohesion_names() {
        assert_eq!(Cohesion::Broken.to_string(), "broken");
        assert_eq!(Cohesion::Reformed.as_str(), "reformed");
        assert!(Cohesion::Broken.is_broken());
        assert!(!Cohesion::Reformed.is_broken());
    }
}
