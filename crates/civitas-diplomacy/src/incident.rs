//! Diplomatic incidents.
//!
//! An incident's magnitude only ever shrinks: each elapsed decay period
//! multiplies it by `1 - decay_rate`. Decay is applied per elapsed time,
//! so aging twice with no time in between changes nothing.

use serde::{Deserialize, Serialize};

use civitas_types::{IncidentCategory, IncidentId};

/// A timestamped, decaying event between two civilizations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Unique identifier.
    pub id: IncidentId,
    /// Free-form type tag, usually the action id that caused it.
    pub tag: String,
    /// Category used to route notifications.
    pub category: IncidentCategory,
    /// Signed impact. Positive incidents warm relations.
    pub impact: f64,
    /// Fraction of magnitude lost per decay period, in `[0, 1]`.
    pub decay_rate: f64,
    /// Simulated day the incident happened.
    pub created_at_day: f64,
}

impl Incident {
    /// Create an incident happening on `day`.
    pub fn new(
        tag: impl Into<String>,
        category: IncidentCategory,
        impact: f64,
        decay_rate: f64,
        day: f64,
    ) -> Self {
        Self {
            id: IncidentId::new(),
            tag: tag.into(),
            category,
            impact,
            decay_rate: decay_rate.clamp(0.0, 1.0),
            created_at_day: day,
        }
    }

    /// Age in days as of `now` (never negative).
    pub fn age(&self, now: f64) -> f64 {
        (now - self.created_at_day).max(0.0)
    }

    /// Decay by `periods` decay periods (fractional periods allowed).
    pub fn decay(&mut self, periods: f64) {
        if periods <= 0.0 {
            return;
        }
        self.impact *= (1.0 - self.decay_rate).powf(periods);
    }

    /// This incident's share of the recent aggregate:
    /// `impact * exp(-age / half_life)`.
    pub fn weighted_impact(&self, now: f64, half_life_days: f64) -> f64 {
        if half_life_days <= 0.0 {
            return 0.0;
        }
        self.impact * (-self.age(now) / half_life_days).exp()
    }

    /// Whether the incident should be dropped.
    pub fn is_stale(&self, now: f64, horizon_days: f64, threshold: f64) -> bool {
        self.age(now) > horizon_days || self.impact.abs() < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_periods_of_ten_percent() {
        let mut incident = Incident::new("border_skirmish", IncidentCategory::Diplomatic, 1.0, 0.1, 0.0);
        for _ in 0..3 {
            incident.decay(1.0);
        }
        assert!((incident.impact - 0.729).abs() < 1e-9);
    }

    #[test]
    fn zero_elapsed_time_is_a_no_op() {
        let mut incident = Incident::new("gift", IncidentCategory::Economic, 2.0, 0.1, 0.0);
        incident.decay(0.0);
        assert!((incident.impact - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fractional_periods_compose() {
        let mut split = Incident::new("gift", IncidentCategory::Economic, 1.0, 0.2, 0.0);
        let mut whole = split.clone();
        split.decay(0.5);
        split.decay(0.5);
        whole.decay(1.0);
        assert!((split.impact - whole.impact).abs() < 1e-12);
    }

    #[test]
    fn weighting_fades_with_age() {
        let incident = Incident::new("insult", IncidentCategory::Cultural, -1.0, 0.1, 0.0);
        let fresh = incident.weighted_impact(0.0, 30.0);
        let old = incident.weighted_impact(30.0, 30.0);
        assert!((fresh + 1.0).abs() < 1e-12);
        assert!((old + (-1.0_f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn staleness_by_age_or_magnitude() {
        let incident = Incident::new("gift", IncidentCategory::Economic, 0.05, 0.1, 0.0);
        assert!(incident.is_stale(1.0, 30.0, 0.1));
        let big = Incident::new("war", IncidentCategory::Diplomatic, -5.0, 0.1, 0.0);
        assert!(!big.is_stale(30.0, 30.0, 0.1));
        assert!(big.is_stale(30.5, 30.0, 0.1));
    }
}
