//! Sliding-window statistics over the most recent ticks.
//!
//! The simulation captures one [`TickSample`] at the end of every tick and
//! pushes it into a [`WindowReporter`]. The reporter keeps the trailing
//! `capacity` samples together with running sums, so a push costs O(1) and
//! [`WindowReporter::summary`] never rescans the window.
//!
//! # Example
//!
//! ```
//! use skirmish_core::window::WindowReporter;
//!
//! let reporter = WindowReporter::new(300);
//! let report = reporter.summary();
//! assert_eq!(report.samples, 0);
//! assert_eq!(report.red.avg_alive, 0.0);
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::entity::Team;

// =============================================================================
// Samples
// =============================================================================

/// One team's state at the end of a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamTickSample {
    /// Living soldiers flagged stalled in combat
    pub stalled: u32,
    /// Living soldiers flagged detached from the engagement
    pub detached: u32,
    /// Living soldiers disobeying
    pub disobeying: u32,
    /// Living soldiers panicking
    pub panicking: u32,
    /// Living soldiers surrendering
    pub surrendered: u32,
    /// Roster members of broken squads
    pub broken_squad_members: u32,
    /// Mean stress over living soldiers
    pub avg_stress: f64,
    /// Dead fraction of the team
    pub casualty_rate: f64,
    /// Living soldiers
    pub alive: u32,
}

/// Both teams' state at the end of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickSample {
    /// Tick the sample was taken on
    pub tick: u64,
    /// Red team
    pub red: TeamTickSample,
    /// Blue team
    pub blue: TeamTickSample,
}

impl TickSample {
    /// Captures a sample from the arena.
    #[must_use]
    pub fn capture(tick: u64, arena: &Arena) -> Self {
        Self {
            tick,
            red: Self::capture_team(arena, Team::Red),
            blue: Self::capture_team(arena, Team::Blue),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn capture_team(arena: &Arena, team: Team) -> TeamTickSample {
        let mut sample = TeamTickSample::default();
        let mut total = 0_u32;
        let mut stress = 0.0_f64;
        for soldier in arena.team_soldiers(team) {
            total += 1;
            if !soldier.is_alive() {
                continue;
            }
            let psych = soldier.psych();
            let eff = soldier.effectiveness();
            sample.alive += 1;
            sample.stalled += u32::from(eff.is_stalled());
            sample.detached += u32::from(eff.is_detached());
            sample.disobeying += u32::from(psych.is_disobeying());
            sample.panicking += u32::from(psych.is_panicking());
            sample.surrendered += u32::from(psych.is_surrendering());
            stress += f64::from(psych.stress());
        }
        sample.broken_squad_members = arena
            .squads()
            .filter(|s| s.team() == team && s.is_broken())
            .map(|s| u32::try_from(s.size()).unwrap_or(u32::MAX))
            .sum();
        if sample.alive > 0 {
            sample.avg_stress = stress / f64::from(sample.alive);
        }
        if total > 0 {
            sample.casualty_rate = f64::from(total - sample.alive) / f64::from(total);
        }
        sample
    }

    const fn team(&self, team: Team) -> &TeamTickSample {
        match team {
            Team::Red => &self.red,
            Team::Blue => &self.blue,
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// Window averages for one team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamWindowStats {
    /// Average stalled soldiers per tick
    pub avg_stalled: f64,
    /// Average detached soldiers per tick
    pub avg_detached: f64,
    /// Average disobeying soldiers per tick
    pub avg_disobeying: f64,
    /// Average panicking soldiers per tick
    pub avg_panicking: f64,
    /// Average surrendering soldiers per tick
    pub avg_surrendered: f64,
    /// Average members of broken squads per tick
    pub avg_broken_squad_members: f64,
    /// Average of per-tick mean stress
    pub avg_stress: f64,
    /// Average casualty rate
    pub avg_casualty_rate: f64,
    /// Average living soldiers per tick
    pub avg_alive: f64,
}

/// Summary of the current window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowReport {
    /// Samples in the window
    pub samples: usize,
    /// Oldest tick in the window
    pub first_tick: Option<u64>,
    /// Newest tick in the window
    pub last_tick: Option<u64>,
    /// Red team averages
    pub red: TeamWindowStats,
    /// Blue team averages
    pub blue: TeamWindowStats,
}

impl WindowReport {
    /// Averages for one team.
    #[must_use]
    pub const fn team(&self, team: Team) -> &TeamWindowStats {
        match team {
            Team::Red => &self.red,
            Team::Blue => &self.blue,
        }
    }
}

// =============================================================================
// Reporter
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct TeamSums {
    stalled: u64,
    detached: u64,
    disobeying: u64,
    panicking: u64,
    surrendered: u64,
    broken_squad_members: u64,
    alive: u64,
}

impl TeamSums {
    fn add(&mut self, s: &TeamTickSample) {
        self.stalled += u64::from(s.stalled);
        self.detached += u64::from(s.detached);
        self.disobeying += u64::from(s.disobeying);
        self.panicking += u64::from(s.panicking);
        self.surrendered += u64::from(s.surrendered);
        self.broken_squad_members += u64::from(s.broken_squad_members);
        self.alive += u64::from(s.alive);
    }

    fn sub(&mut self, s: &TeamTickSample) {
        self.stalled -= u64::from(s.stalled);
        self.detached -= u64::from(s.detached);
        self.disobeying -= u64::from(s.disobeying);
        self.panicking -= u64::from(s.panicking);
        self.surrendered -= u64::from(s.surrendered);
        self.broken_squad_members -= u64::from(s.broken_squad_members);
        self.alive -= u64::from(s.alive);
    }

    #[allow(clippy::cast_precision_loss)]
    fn averages<'a>(
        &self,
        samples: impl ExactSizeIterator<Item = &'a TeamTickSample>,
    ) -> TeamWindowStats {
        let n = samples.len();
        if n == 0 {
            return TeamWindowStats::default();
        }
        // Float sums are rebuilt from the samples: add/evict would drift.
        let (stress, casualty_rate) = samples.fold((0.0, 0.0), |(st, cr), s| {
            (st + s.avg_stress, cr + s.casualty_rate)
        });
        let n = n as f64;
        let avg = |v: u64| v as f64 / n;
        TeamWindowStats {
            avg_stalled: avg(self.stalled),
            avg_detached: avg(self.detached),
            avg_disobeying: avg(self.disobeying),
            avg_panicking: avg(self.panicking),
            avg_surrendered: avg(self.surrendered),
            avg_broken_squad_members: avg(self.broken_squad_members),
            avg_stress: stress / n,
            avg_casualty_rate: casualty_rate / n,
            avg_alive: avg(self.alive),
        }
    }
}

/// Trailing window of tick samples with running sums.
#[derive(Debug, Clone)]
pub struct WindowReporter {
    capacity: usize,
    samples: VecDeque<TickSample>,
    red: TeamSums,
    blue: TeamSums,
}

impl WindowReporter {
    /// Creates an empty reporter keeping at most `capacity` samples.
    ///
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            red: TeamSums::default(),
            blue: TeamSums::default(),
        }
    }

    /// Maximum number of samples kept.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples currently in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` before the first push.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Adds a sample, evicting the oldest once the window is full.
    pub fn push(&mut self, sample: TickSample) {
        self.red.add(sample.team(Team::Red));
        self.blue.add(sample.team(Team::Blue));
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            if let Some(old) = self.samples.pop_front() {
                self.red.sub(old.team(Team::Red));
                self.blue.sub(old.team(Team::Blue));
            }
        }
    }

    /// Averages over the current window. All zero when empty.
    #[must_use]
    pub fn summary(&self) -> WindowReport {
        let n = self.samples.len();
        WindowReport {
            samples: n,
            first_tick: self.samples.front().map(|s| s.tick),
            last_tick: self.samples.back().map(|s| s.tick),
            red: self.red.averages(self.samples.iter().map(|s| s.team(Team::Red))),
            blue: self.blue.averages(self.samples.iter().map(|s| s.team(Team::Blue))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(tick: u64, alive: u32, panicking: u32) -> TickSample {
        let team = TeamTickSample {
            alive,
            panicking,
            avg_stress: 0.5,
            ..TeamTickSample::default()
        };
        TickSample {
            tick,
            red: team,
            blue: TeamTickSample::default(),
        }
    }

    #[test]
    fn empty_window_is_all_zero() {
        let report = WindowReporter::new(10).summary();
        assert_eq!(report, WindowReport::default());
    }

    #[test]
    fn averages_over_samples() {
        let mut reporter = WindowReporter::new(10);
        reporter.push(sample(0, 6, 0));
        reporter.push(sample(1, 4, 2));
        let report = reporter.summary();

        assert_eq!(report.samples, 2);
        assert_eq!(report.red.avg_alive, 5.0);
        assert_eq!(report.red.avg_panicking, 1.0);
        assert_eq!(report.red.avg_stress, 0.5);
        assert_eq!(report.blue.avg_alive, 0.0);
    }

    #[test]
    fn oldest_samples_are_evicted() {
        let mut reporter = WindowReporter::new(2);
        reporter.push(sample(0, 6, 6));
        reporter.push(sample(1, 4, 0));
        reporter.push(sample(2, 2, 0));
        let report = reporter.summary();

        assert_eq!(reporter.len(), 2);
        assert_eq!(report.first_tick, Some(1));
        assert_eq!(report.last_tick, Some(2));
        assert_eq!(report.red.avg_alive, 3.0);
        assert_eq!(report.red.avg_panicking, 0.0);
    }

    #[test]
    fn saturated_stress_stays_in_range_across_evictions() {
        let mut reporter = WindowReporter::new(300);
        for tick in 0..3600 {
            // Varying values make add/evict sums round differently.
            let low = 0.1 + f64::from(u32::try_from(tick % 7).unwrap()) * 0.013;
            let high = tick >= 3000;
            let team = TeamTickSample {
                alive: 6,
                avg_stress: if high { 1.0 } else { low },
                casualty_rate: if high { 1.0 } else { low },
                ..TeamTickSample::default()
            };
            reporter.push(TickSample {
                tick,
                red: team,
                blue: team,
            });
        }
        let report = reporter.summary();
        for team in Team::ALL {
            let stats = report.team(team);
            assert_eq!(stats.avg_stress, 1.0);
            assert_eq!(stats.avg_casualty_rate, 1.0);
        }
    }

    #[test]
    fn zero_capacity_keeps_one() {
        let mut reporter = WindowReporter::new(0);
        reporter.push(sample(0, 1, 0));
        reporter.push(sample(1, 3, 0));
        assert_eq!(reporter.capacity(), 1);
        assert_eq!(reporter.summary().red.avg_alive, 3.0);
    }
}
