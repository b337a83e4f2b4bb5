//! The simulation's single logical clock.
//!
//! Time is measured in simulated seconds. Economic rates are per second;
//! diplomacy works in days, converted through `days_per_second`. The clock
//! also numbers the cycles of each kind so ledger entries and events carry
//! a stable counter.

use civitas_types::CycleKind;

use crate::config::WorldConfig;

/// Errors that can occur when configuring or advancing the clock.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// A cycle counter would exceed `u64::MAX`.
    #[error("{kind:?} cycle counter overflow")]
    CycleOverflow {
        /// Which counter.
        kind: CycleKind,
    },

    /// Invalid clock configuration.
    #[error("invalid clock config: {reason}")]
    InvalidConfig {
        /// Description of the configuration problem.
        reason: String,
    },
}

/// Simulated time and cycle counters.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldClock {
    elapsed_seconds: f64,
    days_per_second: f64,
    economic_cycle: u64,
    diplomacy_cycle: u64,
}

impl WorldClock {
    /// Create a clock at time zero.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `days_per_second` is not a
    /// positive finite number.
    pub fn new(config: &WorldConfig) -> Result<Self, ClockError> {
        let days_per_second = config.days_per_second;
        if !(days_per_second.is_finite() && days_per_second > 0.0) {
            return Err(ClockError::InvalidConfig {
                reason: format!("days_per_second must be positive, got {days_per_second}"),
            });
        }
        Ok(Self {
            elapsed_seconds: 0.0,
            days_per_second,
            economic_cycle: 0,
            diplomacy_cycle: 0,
        })
    }

    /// Simulated seconds since start.
    pub const fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    /// Simulated days since start.
    pub const fn days(&self) -> f64 {
        self.elapsed_seconds * self.days_per_second
    }

    /// Number of completed cycles of one kind.
    pub const fn cycle(&self, kind: CycleKind) -> u64 {
        match kind {
            CycleKind::Economic => self.economic_cycle,
            CycleKind::Diplomatic => self.diplomacy_cycle,
        }
    }

    /// Move time forward. Non-finite or negative steps are ignored.
    pub const fn advance(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.elapsed_seconds += seconds;
        }
    }

    /// Count one more cycle of `kind` and return its 1-based number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::CycleOverflow`] at `u64::MAX`.
    pub fn next_cycle(&mut self, kind: CycleKind) -> Result<u64, ClockError> {
        let counter = match kind {
            CycleKind::Economic => &mut self.economic_cycle,
            CycleKind::Diplomatic => &mut self.diplomacy_cycle,
        };
        *counter = counter.checked_add(1).ok_or(ClockError::CycleOverflow { kind })?;
        Ok(*counter)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn days_follow_seconds() {
        let mut clock = WorldClock::new(&WorldConfig::default()).unwrap();
        clock.advance(5.0);
        assert!((clock.days() - 1.0).abs() < 1e-12);
        clock.advance(-3.0);
        clock.advance(f64::NAN);
        assert!((clock.elapsed_seconds() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn counters_are_independent() {
        let mut clock = WorldClock::new(&WorldConfig::default()).unwrap();
        assert_eq!(clock.next_cycle(CycleKind::Economic).unwrap(), 1);
        assert_eq!(clock.next_cycle(CycleKind::Economic).unwrap(), 2);
        assert_eq!(clock.next_cycle(CycleKind::Diplomatic).unwrap(), 1);
        assert_eq!(clock.cycle(CycleKind::Economic), 2);
    }

    #[test]
    fn counter_overflow_is_an_error() {
        let mut clock = WorldClock::new(&WorldConfig::default()).unwrap();
        clock.economic_cycle = u64::MAX;
        assert_eq!(
            clock.next_cycle(CycleKind::Economic),
            Err(ClockError::CycleOverflow {
                kind: CycleKind::Economic
            })
        );
    }

    #[test]
    fn rejects_zero_day_length() {
        let config = WorldConfig {
            days_per_second: 0.0,
            ..WorldConfig::default()
        };
        assert!(matches!(WorldClock::new(&config), Err(ClockError::InvalidConfig { .. })));
    }
}
