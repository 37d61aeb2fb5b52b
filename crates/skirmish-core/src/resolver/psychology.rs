//! Psychology phase: stress accumulation and refusal flags.
//!
//! Stress rises with incoming fire, hits, nearby friendly deaths, visible
//! enemies and isolation, and falls by a fixed recovery rate on ticks
//! without incoming fire or nearby casualties. Each tick also adds a small
//! uniform jitter drawn from the engine RNG, one draw per living soldier in
//! ascending id order.
//!
//! The disobedience, panic and surrender flags are independent
//! [`HysteresisFlag`](crate::entity::HysteresisFlag)s driven by the new
//! stress value.

use rand::Rng;

use crate::entity::{RefusalKind, SoldierId};
use crate::event_log::Category;

use super::{Resolver, TickContext};

/// Resolver for the psychology phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct PsychologyResolver;

/// Stressors acting on one soldier this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Stressors {
    shots_received: u32,
    hits_received: u32,
    casualties: u32,
    visible_enemies: usize,
    isolated: bool,
}

impl PsychologyResolver {
    /// Creates the psychology resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn stressors(ctx: &TickContext<'_>, id: SoldierId) -> Stressors {
        let arena = &*ctx.arena;
        let psych = &ctx.tuning.psych;
        let Some(me) = arena.soldier(id) else {
            return Stressors::default();
        };
        let pos = me.position();

        let isolated = !arena
            .spatial()
            .query_radius(pos, psych.isolation_radius)
            .into_iter()
            .any(|other| {
                other != id && arena.soldier(other).is_some_and(|s| s.team() == me.team())
            });

        // Deaths happen in the combat phase, so last tick's casualties are
        // the ones this phase has not yet reacted to.
        let casualties = match ctx.tick.checked_sub(1) {
            Some(previous) => arena
                .team_soldiers(me.team())
                .filter(|s| {
                    s.died_at() == Some(previous)
                        && s.position().distance(pos) <= psych.casualty_radius
                })
                .count(),
            None => 0,
        };

        Stressors {
            shots_received: me.exposure.shots_received,
            hits_received: me.exposure.hits_received,
            casualties: u32::try_from(casualties).unwrap_or(u32::MAX),
            visible_enemies: me.contacts().len(),
            isolated,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn stress_delta(ctx: &TickContext<'_>, s: Stressors) -> f32 {
        let psych = &ctx.tuning.psych;
        let mut delta = s.shots_received as f32 * psych.fire_stress
            + s.hits_received as f32 * psych.hit_stress
            + s.casualties as f32 * psych.casualty_stress
            + s.visible_enemies as f32 * psych.contact_stress;
        if s.isolated {
            delta += psych.isolation_stress;
        }
        if s.shots_received == 0 && s.casualties == 0 {
            delta -= psych.recovery;
        }
        delta
    }
}

impl Resolver for PsychologyResolver {
    fn name(&self) -> &'static str {
        "psychology"
    }

    fn resolve(&self, ctx: &mut TickContext<'_>) {
        let ids: Vec<SoldierId> = ctx.arena.soldier_ids().collect();
        for id in ids {
            if !ctx.arena.soldier(id).is_some_and(|s| s.is_alive()) {
                continue;
            }
            let stressors = Self::stressors(ctx, id);
            let jitter = ctx.tuning.psych.jitter * (ctx.rng.gen::<f32>() * 2.0 - 1.0);
            let delta = Self::stress_delta(ctx, stressors) + jitter;

            let Some(soldier) = ctx.arena.soldier_mut(id) else {
                continue;
            };
            let stress = (soldier.psych.stress + delta).clamp(0.0, 1.0);
            soldier.psych.stress = stress;

            let mut transitions = Vec::new();
            for kind in RefusalKind::ALL {
                if let Some(on) = soldier.psych.flag_mut(kind).evaluate(stress) {
                    transitions.push(if on { kind.on_key() } else { kind.off_key() });
                }
            }
            if transitions.is_empty() {
                continue;
            }
            let (label, team) = (soldier.label().to_owned(), soldier.team());
            for key in transitions {
                tracing::trace!(tick = ctx.tick, soldier = %label, key, stress, "refusal transition");
                ctx.log
                    .record(ctx.tick, Category::Psych, key, &label, team, format!("{stress:.3}"));
            }
        }
    }
}
