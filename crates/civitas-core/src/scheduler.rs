//! Fixed-interval cycle scheduling.
//!
//! A [`CycleScheduler`] accumulates elapsed simulated time and reports how
//! many whole cycles are due. It is `Idle` between cycles and `Running`
//! while the caller executes one. When a single advance covers more
//! intervals than `max_catch_up`, the excess is dropped with a warning so
//! a stalled caller cannot trigger an unbounded burst.

use civitas_types::CycleKind;

use crate::clock::ClockError;

/// Whether a cycle is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for enough time to accumulate.
    Idle,
    /// A cycle is executing.
    Running,
}

/// Accumulates time for one kind of cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleScheduler {
    kind: CycleKind,
    interval: f64,
    accumulated: f64,
    max_catch_up: u32,
    state: SchedulerState,
    dropped: u64,
}

impl CycleScheduler {
    /// Create an idle scheduler firing every `interval_seconds`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] for a non-positive interval or
    /// a zero catch-up bound.
    pub fn new(kind: CycleKind, interval_seconds: f64, max_catch_up: u32) -> Result<Self, ClockError> {
        if !(interval_seconds.is_finite() && interval_seconds > 0.0) {
            return Err(ClockError::InvalidConfig {
                reason: format!("{kind:?} interval must be positive, got {interval_seconds}"),
            });
        }
        if max_catch_up == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "max_catch_up_cycles must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            kind,
            interval: interval_seconds,
            accumulated: 0.0,
            max_catch_up,
            state: SchedulerState::Idle,
            dropped: 0,
        })
    }

    /// Cycle length in simulated seconds.
    pub const fn interval(&self) -> f64 {
        self.interval
    }

    /// Current state.
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    /// Time accumulated toward the next cycle.
    pub const fn accumulated(&self) -> f64 {
        self.accumulated
    }

    /// Cycles dropped by the catch-up bound since creation.
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Add elapsed time and return how many cycles are due now.
    pub fn accumulate(&mut self, elapsed_seconds: f64) -> u32 {
        if elapsed_seconds.is_finite() && elapsed_seconds > 0.0 {
            self.accumulated += elapsed_seconds;
        }
        let whole = whole_intervals(self.accumulated, self.interval);
        if whole == 0 {
            return 0;
        }
        self.accumulated = self.accumulated.rem_euclid(self.interval);

        let due = u32::try_from(whole).map_or(self.max_catch_up, |w| w.min(self.max_catch_up));
        let dropped = whole.saturating_sub(u64::from(due));
        if dropped > 0 {
            self.dropped = self.dropped.saturating_add(dropped);
            tracing::warn!(kind = ?self.kind, due, dropped, "catch-up bound reached, dropping cycles");
        }
        due
    }

    /// Idle -> Running.
    pub const fn begin(&mut self) {
        self.state = SchedulerState::Running;
    }

    /// Running -> Idle.
    pub const fn finish(&mut self) {
        self.state = SchedulerState::Idle;
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_intervals(accumulated: f64, interval: f64) -> u64 {
    (accumulated / interval).floor().max(0.0) as u64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn economic(interval: f64, cap: u32) -> CycleScheduler {
        CycleScheduler::new(CycleKind::Economic, interval, cap).unwrap()
    }

    #[test]
    fn fires_when_interval_reached() {
        let mut scheduler = economic(1.0, 5);
        assert_eq!(scheduler.accumulate(0.4), 0);
        assert_eq!(scheduler.accumulate(0.4), 0);
        assert_eq!(scheduler.accumulate(0.4), 1);
        assert!((scheduler.accumulated() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn catch_up_is_bounded() {
        let mut scheduler = economic(1.0, 3);
        assert_eq!(scheduler.accumulate(10.5), 3);
        assert_eq!(scheduler.dropped(), 7);
        assert!((scheduler.accumulated() - 0.5).abs() < 1e-9);
        assert_eq!(scheduler.accumulate(0.0), 0);
    }

    #[test]
    fn state_machine() {
        let mut scheduler = economic(1.0, 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        scheduler.begin();
        assert_eq!(scheduler.state(), SchedulerState::Running);
        scheduler.finish();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn invalid_settings_rejected() {
        assert!(CycleScheduler::new(CycleKind::Diplomatic, 0.0, 1).is_err());
        assert!(CycleScheduler::new(CycleKind::Diplomatic, 1.0, 0).is_err());
    }
}
