//! Pairwise relation records.
//!
//! Relations are symmetric and stored under a [`RelationKey`], the
//! unordered civilization pair sorted so that `(a, b)` and `(b, a)` map to
//! the same record.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use civitas_types::{AgreementId, CivId, DiplomaticStatus};

use crate::incident::Incident;

/// Lower bound of a relationship score.
pub const MIN_SCORE: f64 = -100.0;

/// Upper bound of a relationship score.
pub const MAX_SCORE: f64 = 100.0;

/// Canonical key of an unordered civilization pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationKey {
    low: CivId,
    high: CivId,
}

impl RelationKey {
    /// Key for the pair, in either order. Returns `None` for `a == b`.
    pub fn new(a: CivId, b: CivId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// The lower-sorted civilization.
    pub const fn low(self) -> CivId {
        self.low
    }

    /// The higher-sorted civilization.
    pub const fn high(self) -> CivId {
        self.high
    }

    /// Whether `civ` is one of the pair.
    pub fn contains(self, civ: CivId) -> bool {
        self.low == civ || self.high == civ
    }
}

/// The diplomatic state between two civilizations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// The pair.
    pub key: RelationKey,
    score: f64,
    /// Last status derived from the score.
    pub status: DiplomaticStatus,
    /// Named contributions (cause to value), e.g. `"cultural"`.
    pub modifiers: BTreeMap<String, f64>,
    /// Active agreements both civilizations take part in.
    pub agreements: BTreeSet<AgreementId>,
    /// Recent incidents, oldest first.
    pub incidents: Vec<Incident>,
    /// Simulated day the relation was last aged.
    pub last_decay_day: f64,
}

impl Relation {
    /// A new relation with a clamped starting score.
    pub fn new(key: RelationKey, score: f64, status: DiplomaticStatus, day: f64) -> Self {
        Self {
            key,
            score: clamp_score(score),
            status,
            modifiers: BTreeMap::new(),
            agreements: BTreeSet::new(),
            incidents: Vec::new(),
            last_decay_day: day,
        }
    }

    /// Current score in `[-100, 100]`.
    pub const fn score(&self) -> f64 {
        self.score
    }

    /// Add `delta` to the score, clamping. Returns the applied change.
    pub fn adjust_score(&mut self, delta: f64) -> f64 {
        let old = self.score;
        self.score = clamp_score(old + delta);
        self.score - old
    }

    /// Add to a named modifier.
    pub fn add_modifier(&mut self, cause: &str, delta: f64) {
        *self.modifiers.entry(cause.to_owned()).or_insert(0.0) += delta;
    }

    /// Value of a named modifier (zero when absent).
    pub fn modifier(&self, cause: &str) -> f64 {
        self.modifiers.get(cause).copied().unwrap_or(0.0)
    }

    /// Sum of all named modifiers.
    pub fn modifier_total(&self) -> f64 {
        self.modifiers.values().sum()
    }

    /// `Σ impact * exp(-age / half_life)` over recent incidents.
    pub fn recent_incident_aggregate(&self, now: f64, half_life_days: f64) -> f64 {
        self.incidents
            .iter()
            .map(|i| i.weighted_impact(now, half_life_days))
            .sum()
    }

    /// Number of recent incidents with negative impact.
    pub fn hostile_incident_count(&self) -> usize {
        self.incidents.iter().filter(|i| i.impact < 0.0).count()
    }

    /// Drop incidents past the horizon or below the threshold.
    pub fn prune_incidents(&mut self, now: f64, horizon_days: f64, threshold: f64) -> usize {
        let before = self.incidents.len();
        self.incidents.retain(|i| !i.is_stale(now, horizon_days, threshold));
        before.saturating_sub(self.incidents.len())
    }
}

/// Clamp a score into `[-100, 100]`. Non-finite scores become 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(MIN_SCORE, MAX_SCORE)
    } else {
        0.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use civitas_types::IncidentCategory;

    use super::*;

    #[test]
    fn key_is_order_independent() {
        let a = CivId::new();
        let b = CivId::new();
        assert_eq!(RelationKey::new(a, b), RelationKey::new(b, a));
        assert!(RelationKey::new(a, a).is_none());
    }

    #[test]
    fn score_stays_in_range() {
        let key = RelationKey::new(CivId::new(), CivId::new()).unwrap();
        let mut relation = Relation::new(key, 95.0, DiplomaticStatus::Allied, 0.0);
        let applied = relation.adjust_score(20.0);
        assert!((relation.score() - MAX_SCORE).abs() < f64::EPSILON);
        assert!((applied - 5.0).abs() < 1e-12);
        relation.adjust_score(-500.0);
        assert!((relation.score() - MIN_SCORE).abs() < f64::EPSILON);
        relation.adjust_score(f64::NAN);
        assert!(relation.score().abs() < f64::EPSILON);
    }

    #[test]
    fn pruning_keeps_fresh_incidents() {
        let key = RelationKey::new(CivId::new(), CivId::new()).unwrap();
        let mut relation = Relation::new(key, 0.0, DiplomaticStatus::Neutral, 0.0);
        relation
            .incidents
            .push(Incident::new("old", IncidentCategory::Diplomatic, 1.0, 0.1, 0.0));
        relation
            .incidents
            .push(Incident::new("new", IncidentCategory::Diplomatic, 1.0, 0.1, 20.0));
        let pruned = relation.prune_incidents(40.0, 30.0, 0.1);
        assert_eq!(pruned, 1);
        assert_eq!(relation.incidents.len(), 1);
        assert_eq!(relation.incidents.first().map(|i| i.tag.as_str()), Some("new"));
    }
}
