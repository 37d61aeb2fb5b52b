//! Per-soldier component records.
//!
//! Each record is owned by exactly one subsystem:
//! - [`PsychState`] by the psychology resolver
//! - [`EffectivenessState`], [`CombatRecord`] and [`Exposure`] by the combat resolver

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::config::PsychTuning;

// =============================================================================
// Psychology
// =============================================================================

/// A boolean state with separate onset and release thresholds.
///
/// The flag turns on when the driving value reaches `onset` and turns off
/// only once it falls to `release`. With `onset > release` the band between
/// them keeps the current value, which stops the flag flickering.
///
/// # Example
///
/// ```
/// use skirmish_core::entity::HysteresisFlag;
///
/// let mut flag = HysteresisFlag::new(0.6, 0.4);
/// assert_eq!(flag.evaluate(0.65), Some(true));
/// assert_eq!(flag.evaluate(0.5), None); // inside the band
/// assert_eq!(flag.evaluate(0.4), Some(false));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HysteresisFlag {
    active: bool,
    onset: f32,
    release: f32,
}

impl HysteresisFlag {
    /// Creates an inactive flag.
    #[must_use]
    pub const fn new(onset: f32, release: f32) -> Self {
        Self {
            active: false,
            onset,
            release,
        }
    }

    /// Returns whether the flag is currently on.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the onset threshold.
    #[must_use]
    pub const fn onset(&self) -> f32 {
        self.onset
    }

    /// Returns the release threshold.
    #[must_use]
    pub const fn release(&self) -> f32 {
        self.release
    }

    /// Evaluates one threshold crossing against `value`.
    ///
    /// Returns `Some(new_state)` on a transition and `None` otherwise. Called
    /// once per tick, so a flag can never turn on and off within one tick.
    pub fn evaluate(&mut self, value: f32) -> Option<bool> {
        if self.active {
            if value <= self.release {
                self.active = false;
                return Some(false);
            }
        } else if value >= self.onset {
            self.active = true;
            return Some(true);
        }
        None
    }
}

/// The three independent refusal states.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefusalKind {
    /// Ignores orders but stays put
    Disobedience,
    /// Falls back away from the enemy
    Panic,
    /// Stops fighting entirely
    Surrender,
}

impl RefusalKind {
    /// All refusal kinds in evaluation order.
    pub const ALL: [RefusalKind; 3] = [Self::Disobedience, Self::Panic, Self::Surrender];

    /// Event-log key prefix (`disobedience`, `panic`, `surrender`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disobedience => "disobedience",
            Self::Panic => "panic",
            Self::Surrender => "surrender",
        }
    }

    /// Event-log key for the false→true transition.
    #[must_use]
    pub const fn on_key(self) -> &'static str {
        match self {
            Self::Disobedience => "disobedience_on",
            Self::Panic => "panic_on",
            Self::Surrender => "surrender_on",
        }
    }

    /// Event-log key for the true→false transition.
    #[must_use]
    pub const fn off_key(self) -> &'static str {
        match self {
            Self::Disobedience => "disobedience_off",
            Self::Panic => "panic_off",
            Self::Surrender => "surrender_off",
        }
    }
}

/// Stress level plus the three refusal flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PsychState {
    pub(crate) stress: f32,
    pub(crate) disobedience: HysteresisFlag,
    pub(crate) panic: HysteresisFlag,
    pub(crate) surrender: HysteresisFlag,
}

impl PsychState {
    /// Creates a calm state with thresholds taken from `tuning`.
    #[must_use]
    pub fn new(tuning: &PsychTuning) -> Self {
        Self {
            stress: 0.0,
            disobedience: HysteresisFlag::new(
                tuning.disobedience.onset,
                tuning.disobedience.release,
            ),
            panic: HysteresisFlag::new(tuning.panic.onset, tuning.panic.release),
            surrender: HysteresisFlag::new(tuning.surrender.onset, tuning.surrender.release),
        }
    }

    /// Current stress in `[0, 1]`.
    #[must_use]
    pub const fn stress(&self) -> f32 {
        self.stress
    }

    /// Returns the flag for a refusal kind.
    #[must_use]
    pub const fn flag(&self, kind: RefusalKind) -> &HysteresisFlag {
        match kind {
            RefusalKind::Disobedience => &self.disobedience,
            RefusalKind::Panic => &self.panic,
            RefusalKind::Surrender => &self.surrender,
        }
    }

    pub(crate) fn flag_mut(&mut self, kind: RefusalKind) -> &mut HysteresisFlag {
        match kind {
            RefusalKind::Disobedience => &mut self.disobedience,
            RefusalKind::Panic => &mut self.panic,
            RefusalKind::Surrender => &mut self.surrender,
        }
    }

    /// Whether the soldier is disobeying.
    #[must_use]
    pub const fn is_disobeying(&self) -> bool {
        self.disobedience.is_active()
    }

    /// Whether the soldier is panicking.
    #[must_use]
    pub const fn is_panicking(&self) -> bool {
        self.panic.is_active()
    }

    /// Whether the soldier is surrendering.
    #[must_use]
    pub const fn is_surrendering(&self) -> bool {
        self.surrender.is_active()
    }

    /// Whether any refusal state is active.
    #[must_use]
    pub const fn is_refusing(&self) -> bool {
        self.is_disobeying() || self.is_panicking() || self.is_surrendering()
    }
}

impl Default for PsychState {
    fn default() -> Self {
        Self::new(&PsychTuning::default())
    }
}

// =============================================================================
// Effectiveness
// =============================================================================

bitflags! {
    /// Effectiveness failure conditions currently in force.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct EffectivenessFlags: u8 {
        /// Engaged without progress toward the objective for too long
        const STALLED = 0b0000_0001;
        /// Ordered to engage but without any contact for too long
        const DETACHED = 0b0000_0010;
    }
}

impl Default for EffectivenessFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Current effectiveness flags, streak counters and lifetime tallies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessState {
    pub(crate) flags: EffectivenessFlags,
    pub(crate) stall_streak: u32,
    pub(crate) detach_streak: u32,
    pub(crate) best_objective_distance: Option<f32>,
    pub(crate) stalled_count: u32,
    pub(crate) detached_count: u32,
}

impl EffectivenessState {
    /// Conditions currently in force.
    #[must_use]
    pub const fn flags(&self) -> EffectivenessFlags {
        self.flags
    }

    /// Whether the soldier is currently flagged as stalled in combat.
    #[must_use]
    pub const fn is_stalled(&self) -> bool {
        self.flags.contains(EffectivenessFlags::STALLED)
    }

    /// Whether the soldier is currently flagged as detached from the engagement.
    #[must_use]
    pub const fn is_detached(&self) -> bool {
        self.flags.contains(EffectivenessFlags::DETACHED)
    }

    /// Times this soldier has been flagged stalled.
    #[must_use]
    pub const fn stalled_count(&self) -> u32 {
        self.stalled_count
    }

    /// Times this soldier has been flagged detached.
    #[must_use]
    pub const fn detached_count(&self) -> u32 {
        self.detached_count
    }
}

// =============================================================================
// Combat Bookkeeping
// =============================================================================

/// Lifetime shooting record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRecord {
    /// Shots fired
    pub shots: u32,
    /// Shots that hit
    pub hits: u32,
    /// Enemies killed
    pub kills: u32,
}

/// Fire received during the most recent combat phase.
///
/// Reset at the start of every combat phase and read by the next tick's
/// psychology phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exposure {
    /// Shots aimed at this soldier
    pub shots_received: u32,
    /// Shots that hit this soldier
    pub hits_received: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod hysteresis_tests {
        use super::*;

        #[test]
        fn turns_on_at_onset() {
            let mut flag = HysteresisFlag::new(0.6, 0.4);
            assert_eq!(flag.evaluate(0.59), None);
            assert_eq!(flag.evaluate(0.6), Some(true));
            assert!(flag.is_active());
        }

        #[test]
        fn band_holds_current_value() {
            let mut flag = HysteresisFlag::new(0.6, 0.4);
            flag.evaluate(0.9);
            assert_eq!(flag.evaluate(0.5), None);
            assert!(flag.is_active());
        }

        #[test]
        fn turns_off_at_release() {
            let mut flag = HysteresisFlag::new(0.6, 0.4);
            flag.evaluate(0.9);
            assert_eq!(flag.evaluate(0.4), Some(false));
            assert!(!flag.is_active());
        }

        #[test]
        fn already_on_does_not_retrigger() {
            let mut flag = HysteresisFlag::new(0.6, 0.4);
            flag.evaluate(0.9);
            assert_eq!(flag.evaluate(0.95), None);
        }
    }

    mod psych_state_tests {
        use super::*;

        #[test]
        fn default_is_calm() {
            let psych = PsychState::default();
            assert_eq!(psych.stress(), 0.0);
            assert!(!psych.is_refusing());
        }

        #[test]
        fn flags_are_independent() {
            let mut psych = PsychState::default();
            psych.flag_mut(RefusalKind::Panic).evaluate(1.0);
            assert!(psych.is_panicking());
            assert!(!psych.is_disobeying());
            assert!(!psych.is_surrendering());
            assert!(psych.is_refusing());
        }

        #[test]
        fn keys_pair_up() {
            for kind in RefusalKind::ALL {
                assert!(kind.on_key().starts_with(kind.as_str()));
                assert!(kind.off_key().ends_with("_off"));
            }
        }
    }

    #[test]
    fn effectiveness_flags_default_empty() {
        let state = EffectivenessState::default();
        assert!(!state.is_stalled());
        assert!(!state.is_detached());
        assert_eq!(state.flags(), EffectivenessFlags::empty());
    }

    #[test]
    fn components_are_serializable() {
        let psych = PsychState::default();
        let json = serde_json::to_string(&psych).unwrap();
        let back: PsychState = serde_json::from_str(&json).unwrap();
        assert_eq!(psych, back);
    }
}
