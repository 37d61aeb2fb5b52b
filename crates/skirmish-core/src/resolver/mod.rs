//! Resolver module: the per-tick subsystems.
//!
//! Each subsystem is a [`Resolver`] that reads and mutates the shared
//! [`TickContext`] for one phase of a tick. The simulation owns an ordered
//! list of resolvers and runs them in exactly this order every tick:
//!
//! 1. [`VisionResolver`]: contact sets
//! 2. [`PsychologyResolver`]: stress and refusal flags
//! 3. [`CohesionResolver`]: squad cohesion, intent and member goals
//! 4. [`CombatResolver`]: movement, fire, deaths and effectiveness flags
//!
//! # Invariants
//!
//! - Resolvers iterate soldiers and squads in ascending id order
//! - Only the psychology and combat resolvers draw from the RNG
//! - Every discrete state change is written to the event log in the phase
//!   that makes it

mod cohesion;
mod combat;
mod movement;
mod psychology;
mod vision;

pub use cohesion::CohesionResolver;
pub use combat::CombatResolver;
pub use movement::{step_away, step_toward};
pub use psychology::PsychologyResolver;
pub use vision::VisionResolver;

use rand_chacha::ChaCha8Rng;

use crate::arena::Arena;
use crate::config::Tuning;
use crate::entity::{LifeState, SoldierId};
use crate::event_log::{Category, EventLog};

/// Mutable view of the simulation handed to each resolver.
pub struct TickContext<'a> {
    /// Tick being simulated
    pub tick: u64,
    /// World state
    pub arena: &'a mut Arena,
    /// Event log
    pub log: &'a mut EventLog,
    /// The engine's private RNG
    pub rng: &'a mut ChaCha8Rng,
    /// Tuning parameters
    pub tuning: &'a Tuning,
}

/// One phase of a simulation tick.
///
/// # Implementation Guidelines
///
/// 1. **Determinism**: given the same context, a resolver must make the same
///    changes and the same RNG draws. Iterate by ascending id.
///
/// 2. **Stateless**: anything that must survive between ticks lives on the
///    soldiers or squads in the arena, not in the resolver.
///
/// # Example
///
/// ```
/// use skirmish_core::resolver::{Resolver, TickContext};
///
/// struct Noop;
///
/// impl Resolver for Noop {
///     fn name(&self) -> &'static str {
///         "noop"
///     }
///
///     fn resolve(&self, _ctx: &mut TickContext<'_>) {}
/// }
/// ```
pub trait Resolver: Send + Sync {
    /// Short phase name for tracing.
    fn name(&self) -> &'static str;

    /// Runs this phase for `ctx.tick`.
    fn resolve(&self, ctx: &mut TickContext<'_>);
}

/// Sets a soldier's life state, logging `state/state_change` if it changed.
///
/// Dead soldiers are never changed again.
///
/// # Panics
///
/// Panics if `id` is not in the arena.
pub(crate) fn set_life_state(ctx: &mut TickContext<'_>, id: SoldierId, to: LifeState) {
    let soldier = ctx
        .arena
        .soldier_mut(id)
        .unwrap_or_else(|| panic!("soldier {id} must exist"));
    let from = soldier.life;
    if from == to || from == LifeState::Dead {
        return;
    }
    soldier.life = to;
    if to == LifeState::Dead {
        soldier.died_at = Some(ctx.tick);
    }
    let (label, team) = (soldier.label().to_owned(), soldier.team());
    ctx.log.record(
        ctx.tick,
        Category::State,
        "state_change",
        &label,
        team,
        format!("{from}->{to}"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario;
    use rand::SeedableRng;

    #[test]
    fn resolver_is_object_safe() {
        fn _accepts_boxed(_resolver: Box<dyn Resolver>) {}
        fn _accepts_slice(_resolvers: &[Box<dyn Resolver>]) {}
    }

    #[test]
    fn life_state_change_is_logged_once() {
        let config = scenario::builtin("mutual_advance", 1).unwrap();
        let mut arena = Arena::from_config(&config);
        let mut log = EventLog::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ctx = TickContext {
            tick: 5,
            arena: &mut arena,
            log: &mut log,
            rng: &mut rng,
            tuning: &config.tuning,
        };
        let id = SoldierId::new(0);

        set_life_state(&mut ctx, id, LifeState::Engaging);
        set_life_state(&mut ctx, id, LifeState::Engaging);
        set_life_state(&mut ctx, id, LifeState::Dead);
        set_life_state(&mut ctx, id, LifeState::Alive);

        assert_eq!(log.count(Category::State, "state_change"), 2);
        assert_eq!(log.entries()[1].value, "engaging->dead");
        assert_eq!(arena.soldier(id).unwrap().died_at(), Some(5));
        assert_eq!(arena.soldier(id).unwrap().life_state(), LifeState::Dead);
    }

    #[test]
    #[should_panic(expected = "soldier 77 must exist")]
    fn life_state_of_unknown_soldier_panics() {
        let config = scenario::builtin("mutual_advance", 1).unwrap();
        let mut arena = Arena::from_config(&config);
        let mut log = EventLog::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ctx = TickContext {
            tick: 0,
            arena: &mut arena,
            log: &mut log,
            rng: &mut rng,
            tuning: &config.tuning,
        };
        set_life_state(&mut ctx, SoldierId::new(77), LifeState::Dead);
    }
}
