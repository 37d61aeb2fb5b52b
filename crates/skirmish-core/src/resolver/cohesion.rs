//! Squad cohesion phase: cohesion transitions, squad intent and member goals.
//!
//! A member is *bad* when it is dead, refusing, or farther than the
//! dispersal radius from the centroid of the living members. The bad
//! fraction of the roster drives the cohesion state machine:
//!
//! ```text
//! Intact | Reformed --(fraction > break)--> Broken
//! Broken --(fraction < reform, someone obeying)--> Reformed
//! ```
//!
//! Each squad is evaluated once per tick, so a squad can never break and
//! reform within the same tick.

use glam::Vec2;

use crate::entity::{Goal, Intent, SoldierId, SquadId};
use crate::event_log::Category;
use crate::squad::Cohesion;

use super::{Resolver, TickContext};

/// Resolver for the squad cohesion phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct CohesionResolver;

/// What the phase measured for one squad.
#[derive(Debug, Clone, Copy)]
struct SquadSurvey {
    size: usize,
    dead: usize,
    bad: usize,
    any_obeying: bool,
    any_contact: bool,
    all_arrived: bool,
    centroid: Option<Vec2>,
}

impl CohesionResolver {
    /// Creates the cohesion resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// # Panics
    ///
    /// Panics if a squad member is not in the arena.
    fn survey(ctx: &TickContext<'_>, squad: SquadId) -> Option<SquadSurvey> {
        let arena = &*ctx.arena;
        let members = arena.squad(squad)?.members();
        let centroid = arena.living_centroid(squad);
        let dispersal = ctx.tuning.cohesion.dispersal_radius;
        let arrival = ctx.tuning.movement.arrival_radius;

        let mut survey = SquadSurvey {
            size: members.len(),
            dead: 0,
            bad: 0,
            any_obeying: false,
            any_contact: false,
            all_arrived: true,
            centroid,
        };
        for id in members {
            let soldier = arena
                .soldier(*id)
                .unwrap_or_else(|| panic!("squad member {id} must exist"));
            if !soldier.is_alive() {
                survey.dead += 1;
                survey.bad += 1;
                continue;
            }
            let dispersed = centroid.is_some_and(|c| soldier.position().distance(c) > dispersal);
            if soldier.is_refusing() || dispersed {
                survey.bad += 1;
            }
            survey.any_obeying |= !soldier.is_refusing();
            survey.any_contact |= !soldier.contacts().is_empty();
            survey.all_arrived &= soldier.position().distance(soldier.objective()) <= arrival;
        }
        Some(survey)
    }

    #[allow(clippy::cast_precision_loss)]
    fn fraction(count: usize, size: usize) -> f32 {
        if size == 0 {
            0.0
        } else {
            count as f32 / size as f32
        }
    }

    fn next_cohesion(ctx: &TickContext<'_>, current: Cohesion, s: &SquadSurvey) -> Cohesion {
        let tuning = &ctx.tuning.cohesion;
        let bad = Self::fraction(s.bad, s.size);
        match current {
            Cohesion::Intact | Cohesion::Reformed if bad > tuning.break_fraction => {
                Cohesion::Broken
            }
            Cohesion::Broken if bad < tuning.reform_fraction && s.any_obeying => Cohesion::Reformed,
            other => other,
        }
    }

    fn next_intent(ctx: &TickContext<'_>, cohesion: Cohesion, s: &SquadSurvey) -> Intent {
        if cohesion.is_broken() {
            Intent::Regroup
        } else if Self::fraction(s.dead, s.size) >= ctx.tuning.cohesion.hold_casualty_rate {
            Intent::Hold
        } else if s.any_contact {
            Intent::Engage
        } else if s.all_arrived {
            Intent::Hold
        } else {
            Intent::Advance
        }
    }

    /// Nearest enemy for `id` to engage: its own contacts first, then any
    /// squad-mate's. Ties go to the lower id.
    fn engage_target(ctx: &TickContext<'_>, squad: SquadId, id: SoldierId) -> Option<SoldierId> {
        let arena = &*ctx.arena;
        let me = arena.soldier(id)?;
        let nearest = |candidates: &mut dyn Iterator<Item = SoldierId>| {
            candidates
                .filter_map(|c| arena.soldier(c).filter(|s| s.is_alive()))
                .map(|s| (s.position().distance_squared(me.position()), s.id()))
                .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
                .map(|(_, target)| target)
        };

        nearest(&mut me.contacts().iter().copied()).or_else(|| {
            let members = arena.squad(squad)?.members();
            nearest(
                &mut members
                    .iter()
                    .filter_map(|m| arena.soldier(*m))
                    .filter(|s| s.is_alive())
                    .flat_map(|s| s.contacts().iter().copied()),
            )
        })
    }

    fn member_goal(
        ctx: &TickContext<'_>,
        squad: SquadId,
        id: SoldierId,
        intent: Intent,
        centroid: Option<Vec2>,
    ) -> Option<Goal> {
        let me = ctx.arena.soldier(id)?;
        let goal = match intent {
            Intent::Advance => Goal::Objective { at: me.objective() },
            Intent::Engage => match Self::engage_target(ctx, squad, id) {
                Some(target) => Goal::Engage { target },
                None => Goal::Objective { at: me.objective() },
            },
            Intent::Regroup => Goal::Rally {
                at: centroid.unwrap_or(me.position()),
            },
            Intent::Hold => match me.goal() {
                held @ Goal::Hold { .. } => held,
                _ => Goal::Hold { at: me.position() },
            },
        };
        Some(goal)
    }

    fn resolve_squad(ctx: &mut TickContext<'_>, squad_id: SquadId) {
        let Some(survey) = Self::survey(ctx, squad_id) else {
            return;
        };
        let Some(squad) = ctx.arena.squad(squad_id) else {
            return;
        };
        let (label, team) = (squad.label().to_owned(), squad.team());
        let (old_cohesion, old_intent) = (squad.cohesion(), squad.intent());

        let cohesion = Self::next_cohesion(ctx, old_cohesion, &survey);
        let intent = Self::next_intent(ctx, cohesion, &survey);

        if cohesion != old_cohesion {
            tracing::debug!(tick = ctx.tick, squad = %label, from = %old_cohesion, to = %cohesion, "cohesion change");
            ctx.log
                .record(ctx.tick, Category::Squad, "cohesion", &label, team, cohesion.as_str());
        }
        if intent != old_intent {
            ctx.log.record(
                ctx.tick,
                Category::Squad,
                "intent_change",
                &label,
                team,
                format!("{old_intent}->{intent}"),
            );
        }
        if let Some(squad) = ctx.arena.squad_mut(squad_id) {
            squad.cohesion = cohesion;
            squad.intent = intent;
        }

        let mut members: Vec<SoldierId> = ctx
            .arena
            .squad(squad_id)
            .map(|s| s.members().to_vec())
            .unwrap_or_default();
        members.sort_unstable();

        for id in members {
            if !ctx.arena.soldier(id).is_some_and(|s| s.is_alive()) {
                continue;
            }
            let Some(goal) = Self::member_goal(ctx, squad_id, id, intent, survey.centroid) else {
                continue;
            };
            let Some(soldier) = ctx.arena.soldier_mut(id) else {
                continue;
            };
            let (old_intent, old_goal) = (soldier.intent, soldier.goal);
            soldier.intent = intent;
            soldier.goal = goal;
            let (label, team) = (soldier.label().to_owned(), soldier.team());

            if old_intent != intent {
                ctx.log.record(
                    ctx.tick,
                    Category::Goal,
                    "intent_change",
                    &label,
                    team,
                    format!("{old_intent}->{intent}"),
                );
            }
            if !old_goal.same_kind(&goal) {
                ctx.log.record(
                    ctx.tick,
                    Category::Goal,
                    "goal_change",
                    &label,
                    team,
                    format!("{old_goal}->{goal}"),
                );
            }
        }
    }
}

impl Resolver for CohesionResolver {
    fn name(&self) -> &'static str {
        "cohesion"
    }

    fn resolve(&self, ctx: &mut TickContext<'_>) {
        let squads: Vec<SquadId> = ctx.arena.squad_ids().collect();
        for squad in squads {
            Self::resolve_squad(ctx, squad);
        }
    }
}
