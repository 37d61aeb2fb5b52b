//! Combat phase: movement, fire, deaths and effectiveness flags.
//!
//! Living soldiers act once per tick in ascending id order:
//!
//! - **Refusing**: a surrendering or disobeying soldier stays put; a
//!   panicking one retreats away from its nearest contact. Refusing soldiers
//!   never fire.
//! - **Obeying, enemy in range**: fires at the nearest non-surrendered
//!   contact within weapon range. One RNG draw decides the hit and one the
//!   damage. A soldier killed earlier in the pass does not act.
//! - **Otherwise**: steps toward its goal.
//!
//! After everyone has acted, each living soldier's stalled and detached
//! flags are updated.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::Rng;

use crate::config::CombatTuning;
use crate::entity::{EffectivenessFlags, Exposure, Goal, Intent, LifeState, SoldierId};
use crate::event_log::Category;

use super::movement::{step_away, step_toward};
use super::{set_life_state, Resolver, TickContext};

/// Resolver for the combat phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombatResolver;

/// What one soldier does this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    /// Surrendered or disobeying: no movement, no fire
    Stand,
    /// Panicking: fall back to this position
    Retreat(Vec2),
    /// Shoot at this enemy
    Fire(SoldierId),
    /// Step to this position
    Move(Vec2),
}

impl CombatResolver {
    /// Creates the combat resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn choose_action(ctx: &TickContext<'_>, id: SoldierId) -> Option<Action> {
        let arena = &*ctx.arena;
        let me = arena.soldier(id)?;
        let pos = me.position();
        let psych = me.psych();
        let movement = &ctx.tuning.movement;

        let nearest_contact = |max_range: f32, shootable_only: bool| {
            me.contacts()
                .iter()
                .filter_map(|c| arena.soldier(*c))
                .filter(|s| s.is_alive() && (!shootable_only || s.is_effective()))
                .map(|s| (s.position().distance(pos), s.id()))
                .filter(|(d, _)| *d <= max_range)
                .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
                .map(|(_, target)| target)
        };

        if psych.is_surrendering() || (psych.is_disobeying() && !psych.is_panicking()) {
            return Some(Action::Stand);
        }
        if psych.is_panicking() {
            let threat = nearest_contact(f32::INFINITY, false)
                .and_then(|t| arena.soldier(t))
                .map(|s| s.position());
            let to = match threat.and_then(|t| step_away(pos, t, movement.retreat_speed)) {
                Some(to) => to,
                None => step_toward(pos, me.start(), movement.retreat_speed),
            };
            return Some(Action::Retreat(arena.map().clamp(to)));
        }

        if let Some(target) = nearest_contact(ctx.tuning.combat.weapon_range, true) {
            return Some(Action::Fire(target));
        }

        let destination = match me.goal() {
            Goal::Objective { at } | Goal::Rally { at } | Goal::Hold { at } => at,
            Goal::Engage { target } => arena
                .soldier(target)
                .filter(|s| s.is_alive())
                .map_or(me.objective(), |s| s.position()),
        };
        let to = step_toward(pos, destination, movement.move_speed);
        Some(Action::Move(arena.map().clamp(to)))
    }

    /// Hit probability for one shot.
    ///
    /// # Example
    ///
    /// ```
    /// use skirmish_core::config::CombatTuning;
    /// use skirmish_core::resolver::CombatResolver;
    ///
    /// let tuning = CombatTuning::default();
    /// let close = CombatResolver::hit_chance(&tuning, 0.0, 1.0);
    /// let far = CombatResolver::hit_chance(&tuning, 0.0, 49.0);
    /// assert!(close > far);
    /// assert!(far >= 0.05);
    /// ```
    #[must_use]
    pub fn hit_chance(tuning: &CombatTuning, stress: f32, distance: f32) -> f32 {
        let stress_factor = 1.0 - stress.clamp(0.0, 1.0) * tuning.stress_accuracy_penalty;
        let range_factor =
            1.0 - tuning.range_falloff * (distance / tuning.weapon_range).clamp(0.0, 1.0);
        (tuning.base_hit_chance * stress_factor * range_factor).clamp(0.05, 0.95)
    }

    /// # Panics
    ///
    /// Panics if `shooter` or `target` is not in the arena.
    fn fire(ctx: &mut TickContext<'_>, shooter: SoldierId, target: SoldierId) {
        let s = ctx
            .arena
            .soldier(shooter)
            .unwrap_or_else(|| panic!("shooter {shooter} must exist"));
        let t = ctx
            .arena
            .soldier(target)
            .unwrap_or_else(|| panic!("target {target} must exist"));
        let tuning = ctx.tuning.combat;
        let chance =
            Self::hit_chance(&tuning, s.psych().stress(), s.position().distance(t.position()));

        let roll: f32 = ctx.rng.gen();
        let damage = ctx.rng.gen_range(tuning.damage_min..=tuning.damage_max);
        let hit = roll < chance;

        if let Some(s) = ctx.arena.soldier_mut(shooter) {
            s.combat.shots += 1;
            if hit {
                s.combat.hits += 1;
            }
        }
        let t = ctx
            .arena
            .soldier_mut(target)
            .unwrap_or_else(|| panic!("target {target} must exist"));
        t.exposure.shots_received += 1;
        if !hit {
            return;
        }
        t.exposure.hits_received += 1;
        t.health -= damage;
        if t.health > 0.0 {
            return;
        }
        t.health = 0.0;

        set_life_state(ctx, target, LifeState::Dead);
        ctx.arena.remove_spatial(target);
        if let Some(s) = ctx.arena.soldier_mut(shooter) {
            s.combat.kills += 1;
        }
        tracing::debug!(tick = ctx.tick, %shooter, %target, "soldier killed");
    }

    fn update_effectiveness(ctx: &mut TickContext<'_>, id: SoldierId, fired: bool) {
        let tuning = ctx.tuning.effectiveness;
        let Some(soldier) = ctx.arena.soldier_mut(id) else {
            return;
        };
        let refusing = soldier.is_refusing();
        let has_contact = !soldier.contacts.is_empty();
        let engage_order = soldier.intent == Intent::Engage;
        let distance = soldier.position.distance(soldier.objective);
        let eff = &mut soldier.effectiveness;
        let mut events: Vec<(&'static str, String)> = Vec::new();

        let engaged = !refusing && (fired || (engage_order && has_contact));
        if engaged {
            let progressed = eff
                .best_objective_distance
                .map_or(true, |best| best - distance >= tuning.progress_epsilon);
            if progressed {
                eff.best_objective_distance = Some(distance);
                eff.stall_streak = 0;
                if eff.flags.contains(EffectivenessFlags::STALLED) {
                    eff.flags.remove(EffectivenessFlags::STALLED);
                    events.push(("stalled_in_combat_end", "progress".into()));
                }
            } else {
                eff.stall_streak += 1;
                if eff.stall_streak >= tuning.stall_ticks
                    && !eff.flags.contains(EffectivenessFlags::STALLED)
                {
                    eff.flags.insert(EffectivenessFlags::STALLED);
                    eff.stalled_count += 1;
                    events.push(("stalled_in_combat", eff.stall_streak.to_string()));
                }
            }
        } else {
            eff.stall_streak = 0;
            eff.best_objective_distance = None;
            if eff.flags.contains(EffectivenessFlags::STALLED) {
                eff.flags.remove(EffectivenessFlags::STALLED);
                events.push(("stalled_in_combat_end", "disengaged".into()));
            }
        }

        if !refusing && engage_order && !has_contact {
            eff.detach_streak += 1;
            if eff.detach_streak >= tuning.detach_ticks
                && !eff.flags.contains(EffectivenessFlags::DETACHED)
            {
                eff.flags.insert(EffectivenessFlags::DETACHED);
                eff.detached_count += 1;
                events.push(("detached_from_engagement", eff.detach_streak.to_string()));
            }
        } else {
            eff.detach_streak = 0;
            if eff.flags.contains(EffectivenessFlags::DETACHED) {
                eff.flags.remove(EffectivenessFlags::DETACHED);
                let reason = if refusing {
                    "refusal"
                } else if !engage_order {
                    "intent_change"
                } else {
                    "contact"
                };
                events.push(("detached_from_engagement_end", reason.into()));
            }
        }

        if events.is_empty() {
            return;
        }
        let (label, team) = (soldier.label().to_owned(), soldier.team());
        for (key, value) in events {
            ctx.log
                .record(ctx.tick, Category::Effectiveness, key, &label, team, value);
        }
    }
}

impl Resolver for CombatResolver {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn resolve(&self, ctx: &mut TickContext<'_>) {
        let ids: Vec<SoldierId> = ctx.arena.soldier_ids().collect();
        for id in &ids {
            if let Some(soldier) = ctx.arena.soldier_mut(*id) {
                soldier.exposure = Exposure::default();
            }
        }

        let mut fired = BTreeSet::new();
        for &id in &ids {
            if !ctx.arena.soldier(id).is_some_and(|s| s.is_alive()) {
                continue;
            }
            let Some(action) = Self::choose_action(ctx, id) else {
                continue;
            };
            match action {
                Action::Stand => set_life_state(ctx, id, LifeState::Alive),
                Action::Retreat(to) => {
                    if let Some(s) = ctx.arena.soldier_mut(id) {
                        s.position = to;
                    }
                    ctx.arena.update_spatial(id);
                    set_life_state(ctx, id, LifeState::Retreating);
                }
                Action::Fire(target) => {
                    Self::fire(ctx, id, target);
                    fired.insert(id);
                    set_life_state(ctx, id, LifeState::Engaging);
                }
                Action::Move(to) => {
                    if let Some(s) = ctx.arena.soldier_mut(id) {
                        s.position = to;
                    }
                    ctx.arena.update_spatial(id);
                    set_life_state(ctx, id, LifeState::Alive);
                }
            }
        }

        for id in ids {
            if ctx.arena.soldier(id).is_some_and(|s| s.is_alive()) {
                Self::update_effectiveness(ctx, id, fired.contains(&id));
            }
        }
    }
}
