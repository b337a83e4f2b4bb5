//! Natural relationship drift.
//!
//! Between actions, relations slowly move on their own. The default model
//! is a weighted sum, per simulated day, of:
//!
//! ```text
//! trade_weight    * tanh(trade_volume / trade_scale)
//! culture_weight  * (2 * similarity - 1)
//! incident_weight * recent_incident_aggregate
//! modifier_weight * Σ modifiers
//! - reversion     * score / 100
//! ```

use crate::params::DriftWeights;

/// Facts about one relation fed to a [`DriftModel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftInputs {
    /// Lifetime trade between the pair.
    pub trade_volume: f64,
    /// Jaccard similarity of culture traits, in `[0, 1]`.
    pub cultural_similarity: f64,
    /// `Σ impact * exp(-age / half_life)`.
    pub recent_incidents: f64,
    /// Sum of the relation's named modifiers.
    pub modifier_total: f64,
    /// Current score.
    pub score: f64,
}

/// Computes how much a relation drifts per simulated day.
pub trait DriftModel {
    /// Score change per day.
    fn drift_per_day(&self, inputs: &DriftInputs) -> f64;
}

/// The default weighted drift.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeightedDrift {
    /// The term weights.
    pub weights: DriftWeights,
}

impl WeightedDrift {
    /// Build from weights.
    pub const fn new(weights: DriftWeights) -> Self {
        Self { weights }
    }
}

impl DriftModel for WeightedDrift {
    fn drift_per_day(&self, inputs: &DriftInputs) -> f64 {
        let w = &self.weights;
        let trade = if w.trade_scale > 0.0 {
            (inputs.trade_volume.max(0.0) / w.trade_scale).tanh()
        } else {
            0.0
        };
        let culture = 2.0 * inputs.cultural_similarity.clamp(0.0, 1.0) - 1.0;
        w.trade_weight * trade
            + w.culture_weight * culture
            + w.incident_weight * inputs.recent_incidents
            + w.modifier_weight * inputs.modifier_total
            - w.reversion * inputs.score / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neutral() -> DriftInputs {
        DriftInputs {
            trade_volume: 0.0,
            cultural_similarity: 0.5,
            recent_incidents: 0.0,
            modifier_total: 0.0,
            score: 0.0,
        }
    }

    #[test]
    fn balanced_relation_does_not_drift() {
        let model = WeightedDrift::default();
        assert!(model.drift_per_day(&neutral()).abs() < 1e-12);
    }

    #[test]
    fn trade_warms_relations() {
        let model = WeightedDrift::default();
        let trading = DriftInputs {
            trade_volume: 500.0,
            ..neutral()
        };
        assert!(model.drift_per_day(&trading) > 0.0);
        assert!(model.drift_per_day(&trading) <= model.weights.trade_weight);
    }

    #[test]
    fn extreme_scores_revert() {
        let model = WeightedDrift::default();
        let allied = DriftInputs {
            score: 100.0,
            ..neutral()
        };
        let at_war = DriftInputs {
            score: -100.0,
            ..neutral()
        };
        assert!(model.drift_per_day(&allied) < 0.0);
        assert!(model.drift_per_day(&at_war) > 0.0);
    }

    #[test]
    fn hostile_incidents_cool_relations() {
        let model = WeightedDrift::default();
        let tense = DriftInputs {
            recent_incidents: -3.0,
            ..neutral()
        };
        assert!(model.drift_per_day(&tense) < 0.0);
    }
}
