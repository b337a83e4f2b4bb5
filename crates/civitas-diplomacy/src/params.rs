//! Tunable diplomacy constants.
//!
//! Every field carries a serde default so a partial `diplomacy:` section in
//! the configuration file only overrides what it names. Times are in
//! simulated days.

use serde::{Deserialize, Serialize};

use civitas_types::DiplomaticStatus;

/// Score boundaries between diplomatic statuses.
///
/// A score below `war` is War, below `hostile` is Hostile, below `friendly`
/// is Neutral, below `allied` is Friendly, and anything else is Allied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusThresholds {
    /// Upper bound (exclusive) of War.
    #[serde(default = "default_war")]
    pub war: f64,
    /// Upper bound (exclusive) of Hostile.
    #[serde(default = "default_hostile")]
    pub hostile: f64,
    /// Upper bound (exclusive) of Neutral.
    #[serde(default = "default_friendly")]
    pub friendly: f64,
    /// Upper bound (exclusive) of Friendly.
    #[serde(default = "default_allied")]
    pub allied: f64,
}

impl StatusThresholds {
    /// The status a score falls into.
    pub fn status_for(&self, score: f64) -> DiplomaticStatus {
        if score < self.war {
            DiplomaticStatus::War
        } else if score < self.hostile {
            DiplomaticStatus::Hostile
        } else if score < self.friendly {
            DiplomaticStatus::Neutral
        } else if score < self.allied {
            DiplomaticStatus::Friendly
        } else {
            DiplomaticStatus::Allied
        }
    }
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            war: default_war(),
            hostile: default_hostile(),
            friendly: default_friendly(),
            allied: default_allied(),
        }
    }
}

const fn default_war() -> f64 {
    -50.0
}

const fn default_hostile() -> f64 {
    0.0
}

const fn default_friendly() -> f64 {
    30.0
}

const fn default_allied() -> f64 {
    70.0
}

/// Weights of the default natural drift model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftWeights {
    /// Weight of the saturated trade term.
    #[serde(default = "default_trade_weight")]
    pub trade_weight: f64,
    /// Trade volume at which the trade term reaches about 76% of its weight.
    #[serde(default = "default_trade_scale")]
    pub trade_scale: f64,
    /// Weight of the cultural similarity term.
    #[serde(default = "default_culture_weight")]
    pub culture_weight: f64,
    /// Weight of the recent incident aggregate.
    #[serde(default = "default_incident_drift_weight")]
    pub incident_weight: f64,
    /// Weight of the summed named modifiers.
    #[serde(default = "default_modifier_weight")]
    pub modifier_weight: f64,
    /// Pull back toward zero, per 100 points of score.
    #[serde(default = "default_reversion")]
    pub reversion: f64,
}

impl Default for DriftWeights {
    fn default() -> Self {
        Self {
            trade_weight: default_trade_weight(),
            trade_scale: default_trade_scale(),
            culture_weight: default_culture_weight(),
            incident_weight: default_incident_drift_weight(),
            modifier_weight: default_modifier_weight(),
            reversion: default_reversion(),
        }
    }
}

const fn default_trade_weight() -> f64 {
    0.5
}

const fn default_trade_scale() -> f64 {
    100.0
}

const fn default_culture_weight() -> f64 {
    0.2
}

const fn default_incident_drift_weight() -> f64 {
    0.5
}

const fn default_modifier_weight() -> f64 {
    0.01
}

const fn default_reversion() -> f64 {
    0.1
}

/// Weights of the initial relationship score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialScoreWeights {
    /// Multiplier of cultural similarity.
    #[serde(default = "default_similarity_weight")]
    pub similarity: f64,
    /// Multiplier of the proximity factor.
    #[serde(default = "default_proximity_weight")]
    pub proximity: f64,
    /// Multiplier of shared history.
    #[serde(default = "default_history_weight")]
    pub history: f64,
    /// Distance at which proximity bottoms out at -0.5.
    #[serde(default = "default_proximity_range")]
    pub proximity_range: f64,
}

impl Default for InitialScoreWeights {
    fn default() -> Self {
        Self {
            similarity: default_similarity_weight(),
            proximity: default_proximity_weight(),
            history: default_history_weight(),
            proximity_range: default_proximity_range(),
        }
    }
}

const fn default_similarity_weight() -> f64 {
    20.0
}

const fn default_proximity_weight() -> f64 {
    10.0
}

const fn default_history_weight() -> f64 {
    15.0
}

const fn default_proximity_range() -> f64 {
    100.0
}

/// Diplomacy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiplomacyParams {
    /// Days per incident decay step.
    #[serde(default = "default_decay_period")]
    pub decay_period_days: f64,
    /// Incidents older than this are pruned.
    #[serde(default = "default_horizon")]
    pub incident_horizon_days: f64,
    /// Incidents whose magnitude falls below this are pruned.
    #[serde(default = "default_prune_threshold")]
    pub prune_threshold: f64,
    /// Age weighting of the recent incident aggregate.
    #[serde(default = "default_half_life")]
    pub half_life_days: f64,
    /// Impact of the audit incident every proposal records.
    #[serde(default = "default_audit_impact")]
    pub audit_impact: f64,
    /// Decay rate given to new incidents.
    #[serde(default = "default_decay_rate")]
    pub incident_decay_rate: f64,
    /// Score multiplier applied to recorded incident impact.
    #[serde(default = "default_incident_weight")]
    pub incident_weight: f64,
    /// Action chance added per point of relationship score.
    #[serde(default = "default_score_chance_factor")]
    pub score_chance_factor: f64,
    /// Multiplier of the recent incident aggregate in action chance. The
    /// aggregate is added as is by default.
    #[serde(default = "default_incident_chance_weight")]
    pub incident_chance_weight: f64,
    /// Scale applied to an action's cultural impact before it is added to
    /// the relation's `"cultural"` modifier.
    #[serde(default = "default_cultural_modifier_scale")]
    pub cultural_modifier_scale: f64,
    /// Lifetime of a new agreement.
    #[serde(default = "default_agreement_duration")]
    pub agreement_duration_days: f64,
    /// Compliance below this terminates an agreement.
    #[serde(default = "default_breach_threshold")]
    pub breach_threshold: f64,
    /// Impact of the incident recorded on every participant pair of a
    /// breached agreement.
    #[serde(default = "default_breach_impact")]
    pub breach_impact: f64,
    /// Status boundaries.
    #[serde(default)]
    pub status: StatusThresholds,
    /// Natural drift weights.
    #[serde(default)]
    pub drift: DriftWeights,
    /// Initial score weights.
    #[serde(default)]
    pub initial: InitialScoreWeights,
}

impl Default for DiplomacyParams {
    fn default() -> Self {
        Self {
            decay_period_days: default_decay_period(),
            incident_horizon_days: default_horizon(),
            prune_threshold: default_prune_threshold(),
            half_life_days: default_half_life(),
            audit_impact: default_audit_impact(),
            incident_decay_rate: default_decay_rate(),
            incident_weight: default_incident_weight(),
            score_chance_factor: default_score_chance_factor(),
            incident_chance_weight: default_incident_chance_weight(),
            cultural_modifier_scale: default_cultural_modifier_scale(),
            agreement_duration_days: default_agreement_duration(),
            breach_threshold: default_breach_threshold(),
            breach_impact: default_breach_impact(),
            status: StatusThresholds::default(),
            drift: DriftWeights::default(),
            initial: InitialScoreWeights::default(),
        }
    }
}

const fn default_decay_period() -> f64 {
    1.0
}

const fn default_horizon() -> f64 {
    30.0
}

const fn default_prune_threshold() -> f64 {
    0.1
}

const fn default_half_life() -> f64 {
    30.0
}

const fn default_audit_impact() -> f64 {
    1.0
}

const fn default_decay_rate() -> f64 {
    0.1
}

const fn default_incident_weight() -> f64 {
    1.0
}

const fn default_score_chance_factor() -> f64 {
    0.002
}

const fn default_incident_chance_weight() -> f64 {
    1.0
}

const fn default_cultural_modifier_scale() -> f64 {
    0.1
}

const fn default_agreement_duration() -> f64 {
    180.0
}

const fn default_breach_threshold() -> f64 {
    0.3
}

const fn default_breach_impact() -> f64 {
    -10.0
}
