//! Vision phase: recomputes each soldier's contact set.
//!
//! A living observer sees a living enemy when the enemy is within the
//! observer's effective range and no obstacle blocks the sight line. The
//! effective range shrinks while the observer panics, so contact is not
//! necessarily mutual.

use std::collections::BTreeSet;

use crate::entity::SoldierId;
use crate::event_log::Category;

use super::{Resolver, TickContext};

/// Resolver for the vision phase.
///
/// Emits `vision/contact_new` and `vision/contact_lost` entries with the
/// target's label as value. Lost contacts for an observer are logged before
/// new ones, each group in ascending target id.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisionResolver;

impl VisionResolver {
    /// Creates the vision resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn visible_from(ctx: &TickContext<'_>, observer: SoldierId) -> BTreeSet<SoldierId> {
        let arena = &*ctx.arena;
        let Some(me) = arena.soldier(observer) else {
            return BTreeSet::new();
        };
        let vision = &ctx.tuning.vision;
        let range = if me.psych().is_panicking() {
            vision.range * vision.panic_factor
        } else {
            vision.range
        };
        let enemy = me.team().enemy();

        arena
            .spatial()
            .query_radius(me.position(), range)
            .into_iter()
            .filter(|id| {
                arena.soldier(*id).is_some_and(|other| {
                    other.team() == enemy
                        && other.is_alive()
                        && arena.line_of_sight(me.position(), other.position())
                })
            })
            .collect()
    }
}

impl Resolver for VisionResolver {
    fn name(&self) -> &'static str {
        "vision"
    }

    fn resolve(&self, ctx: &mut TickContext<'_>) {
        let ids: Vec<SoldierId> = ctx.arena.soldier_ids().collect();
        for id in ids {
            let alive = ctx.arena.soldier(id).is_some_and(|s| s.is_alive());
            let visible = if alive {
                Self::visible_from(ctx, id)
            } else {
                BTreeSet::new()
            };

            let Some(soldier) = ctx.arena.soldier_mut(id) else {
                continue;
            };
            if soldier.contacts == visible {
                continue;
            }
            let lost: Vec<SoldierId> = soldier.contacts.difference(&visible).copied().collect();
            let gained: Vec<SoldierId> = visible.difference(&soldier.contacts).copied().collect();
            soldier.contacts = visible;
            let (label, team) = (soldier.label().to_owned(), soldier.team());

            for (key, targets) in [("contact_lost", lost), ("contact_new", gained)] {
                for target in targets {
                    let target_label = ctx
                        .arena
                        .soldier(target)
                        .map_or_else(|| target.to_string(), |t| t.label().to_owned());
                    ctx.log
                        .record(ctx.tick, Category::Vision, key, &label, team, target_label);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Obstacle;
    use crate::entity::LifeState;
    use crate::tests::helpers::{duel_config, TestHarness};

    #[test]
    fn contact_gained_inside_range() {
        let mut h = TestHarness::new(duel_config(40.0));
        h.run_phase(&VisionResolver::new());

        assert!(h.soldier(0).contacts().contains(&SoldierId::new(1)));
        assert!(h.soldier(1).contacts().contains(&SoldierId::new(0)));
        assert_eq!(h.log.count(Category::Vision, "contact_new"), 2);
        assert_eq!(h.log.entries()[0].value, "B1");
    }

    #[test]
    fn no_contact_beyond_range() {
        let mut h = TestHarness::new(duel_config(200.0));
        h.run_phase(&VisionResolver::new());
        assert!(h.soldier(0).contacts().is_empty());
        assert!(h.log.is_empty());
    }

    #[test]
    fn obstacle_blocks_contact() {
        let mut config = duel_config(40.0);
        config.map.obstacles.push(Obstacle::new(30.0, 50.0, 4.0));
        let mut h = TestHarness::new(config);
        h.run_phase(&VisionResolver::new());
        assert!(h.soldier(0).contacts().is_empty());
    }

    #[test]
    fn panic_shrinks_range_asymmetrically() {
        let mut h = TestHarness::new(duel_config(60.0));
        h.force_stress(0, 0.8);
        h.run_phase(&VisionResolver::new());

        // 60 > 70 * 0.6 for the panicking observer only
        assert!(h.soldier(0).contacts().is_empty());
        assert!(h.soldier(1).contacts().contains(&SoldierId::new(0)));
    }

    #[test]
    fn dead_target_is_lost() {
        let mut h = TestHarness::new(duel_config(40.0));
        h.run_phase(&VisionResolver::new());
        h.kill(1);
        h.tick += 1;
        h.run_phase(&VisionResolver::new());

        assert!(h.soldier(0).contacts().is_empty());
        assert!(h.soldier(1).contacts().is_empty());
        assert_eq!(h.log.count(Category::Vision, "contact_lost"), 2);
        assert_eq!(h.soldier(1).life_state(), LifeState::Dead);
    }
}
