//! Battle outcome resolution.
//!
//! A team is *decisively broken* when it has no living, non-surrendered
//! soldiers left, or when every one of its squads is broken. The outcome is
//! decided by the first matching rule:
//!
//! 1. exactly one team broken: the other team wins
//! 2. both teams broken: draw
//! 3. neither: inconclusive
//!
//! Resolution is a pure read of soldier and squad state and can be called
//! at any tick.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{Soldier, Team};
use crate::squad::Squad;

/// Result of a battle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    /// Blue broke, Red did not
    RedVictory,
    /// Red broke, Blue did not
    BlueVictory,
    /// Both sides broke
    Draw,
    /// Neither side broke
    Inconclusive,
}

impl BattleOutcome {
    /// Returns the winning team, if any.
    #[must_use]
    pub const fn winner(self) -> Option<Team> {
        match self {
            Self::RedVictory => Some(Team::Red),
            Self::BlueVictory => Some(Team::Blue),
            Self::Draw | Self::Inconclusive => None,
        }
    }

    /// Snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RedVictory => "red_victory",
            Self::BlueVictory => "blue_victory",
            Self::Draw => "draw",
            Self::Inconclusive => "inconclusive",
        }
    }
}

impl fmt::Display for BattleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome with the numbers behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleOutcomeReason {
    /// Result
    pub outcome: BattleOutcome,
    /// Human-readable explanation
    pub description: String,
    /// Broken red squads
    pub red_squads_broken: usize,
    /// All red squads
    pub red_squads_total: usize,
    /// Broken blue squads
    pub blue_squads_broken: usize,
    /// All blue squads
    pub blue_squads_total: usize,
    /// Living, non-surrendered red soldiers
    pub red_effective: usize,
    /// Living, non-surrendered blue soldiers
    pub blue_effective: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct TeamStanding {
    squads_broken: usize,
    squads_total: usize,
    effective: usize,
}

impl TeamStanding {
    fn is_broken(self) -> bool {
        self.effective == 0 || (self.squads_total > 0 && self.squads_broken == self.squads_total)
    }

    fn why(self, team: Team) -> String {
        if self.effective == 0 {
            format!("{team} has no effective soldiers")
        } else {
            format!("all {} {team} squads broken", self.squads_total)
        }
    }
}

fn standing<'a>(
    team: Team,
    soldiers: impl IntoIterator<Item = &'a Soldier>,
    squads: impl IntoIterator<Item = &'a Squad>,
) -> TeamStanding {
    let mut standing = TeamStanding {
        effective: soldiers
            .into_iter()
            .filter(|s| s.team() == team && s.is_effective())
            .count(),
        ..TeamStanding::default()
    };
    for squad in squads.into_iter().filter(|s| s.team() == team) {
        standing.squads_total += 1;
        standing.squads_broken += usize::from(squad.is_broken());
    }
    standing
}

/// Determines the battle outcome from soldier and squad state.
///
/// # Example
///
/// ```
/// use skirmish_core::outcome::{resolve_outcome, BattleOutcome};
/// use skirmish_core::simulation::Simulation;
/// use skirmish_core::scenario;
///
/// let sim = Simulation::new(scenario::builtin("mutual_advance", 42).unwrap()).unwrap();
/// let reason = resolve_outcome(sim.all_soldiers(), sim.squads());
/// assert_eq!(reason.outcome, BattleOutcome::Inconclusive);
/// ```
#[must_use]
pub fn resolve_outcome<'a, S, Q>(soldiers: S, squads: Q) -> BattleOutcomeReason
where
    S: IntoIterator<Item = &'a Soldier> + Clone,
    Q: IntoIterator<Item = &'a Squad> + Clone,
{
    let red = standing(Team::Red, soldiers.clone(), squads.clone());
    let blue = standing(Team::Blue, soldiers, squads);

    let (outcome, description) = match (red.is_broken(), blue.is_broken()) {
        (false, true) => (BattleOutcome::RedVictory, blue.why(Team::Blue)),
        (true, false) => (BattleOutcome::BlueVictory, red.why(Team::Red)),
        (true, true) => (
            BattleOutcome::Draw,
            format!("{}; {}", red.why(Team::Red), blue.why(Team::Blue)),
        ),
        (false, false) => (
            BattleOutcome::Inconclusive,
            "neither side is decisively broken".to_owned(),
        ),
    };

    BattleOutcomeReason {
        outcome,
        description,
        red_squads_broken: red.squads_broken,
        red_squads_total: red.squads_total,
        blue_squads_broken: blue.squads_broken,
        blue_squads_total: blue.squads_total,
        red_effective: red.effective,
        blue_effective: blue.effective,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{LifeState, RefusalKind, SoldierId, SquadId};
    use glam::Vec2;

    fn soldier(id: u32, team: Team) -> Soldier {
        Soldier::new(
            SoldierId::new(id),
            team,
            SquadId::new(id / 2),
            Vec2::ZERO,
            Vec2::ONE,
            100.0,
        )
    }

    fn setup() -> (Vec<Soldier>, Vec<Squad>) {
        let soldiers = vec![
            soldier(0, Team::Red),
            soldier(1, Team::Red),
            soldier(2, Team::Blue),
            soldier(3, Team::Blue),
        ];
        let squads = vec![
            Squad::new(SquadId::new(0), Team::Red, vec![SoldierId::new(0), SoldierId::new(1)]),
            Squad::new(SquadId::new(1), Team::Blue, vec![SoldierId::new(2), SoldierId::new(3)]),
        ];
        (soldiers, squads)
    }

    #[test]
    fn fresh_battle_is_inconclusive() {
        let (soldiers, squads) = setup();
        let reason = resolve_outcome(&soldiers, &squads);
        assert_eq!(reason.outcome, BattleOutcome::Inconclusive);
        assert_eq!(reason.red_effective, 2);
        assert_eq!(reason.blue_squads_total, 1);
    }

    #[test]
    fn all_squads_broken_loses() {
        let (soldiers, mut squads) = setup();
        squads[1].cohesion = crate::squad::Cohesion::Broken;
        let reason = resolve_outcome(&soldiers, &squads);
        assert_eq!(reason.outcome, BattleOutcome::RedVictory);
        assert_eq!(reason.outcome.winner(), Some(Team::Red));
        assert_eq!(reason.blue_squads_broken, 1);
    }

    #[test]
    fn dead_or_surrendered_team_loses() {
        let (mut soldiers, squads) = setup();
        soldiers[0].life = LifeState::Dead;
        soldiers[1].psych.flag_mut(RefusalKind::Surrender).evaluate(1.0);
        let reason = resolve_outcome(&soldiers, &squads);
        assert_eq!(reason.outcome, BattleOutcome::BlueVictory);
        assert_eq!(reason.red_effective, 0);
        assert!(reason.description.contains("red"));
    }

    #[test]
    fn both_broken_is_draw() {
        let (soldiers, mut squads) = setup();
        for squad in &mut squads {
            squad.cohesion = crate::squad::Cohesion::Broken;
        }
        let reason = resolve_outcome(&soldiers, &squads);
        assert_eq!(reason.outcome, BattleOutcome::Draw);
        assert!(reason.red_squads_broken <= reason.red_squads_total);
    }

    #[test]
    fn outcome_serializes_snake_case() {
        let json = serde_json::to_string(&BattleOutcome::RedVictory).unwrap();
        assert_eq!(json, "\"red_victory\"");
    }
}
