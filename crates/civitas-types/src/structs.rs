//! Record structs shared between crates.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{BonusSource, LedgerEntryType};
use crate::ids::{CivId, LedgerEntryId, ResourceId};

// ---------------------------------------------------------------------------
// Civilizations
// ---------------------------------------------------------------------------

/// Map position of a civilization's capital.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Euclidean distance to another position.
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Additive production bonuses for one resource, split by source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProductionBonus {
    /// Bonus from researched technology.
    #[serde(default)]
    pub technology: f64,
    /// Bonus from constructed buildings.
    #[serde(default)]
    pub building: f64,
    /// Civilization-specific bonus.
    #[serde(default)]
    pub civilization: f64,
}

impl ProductionBonus {
    /// Sum of all three sources.
    pub fn total(&self) -> f64 {
        self.technology + self.building + self.civilization
    }

    /// Mutable access to the bonus from one source.
    pub const fn source_mut(&mut self, source: BonusSource) -> &mut f64 {
        match source {
            BonusSource::Technology => &mut self.technology,
            BonusSource::Building => &mut self.building,
            BonusSource::Civilization => &mut self.civilization,
        }
    }
}

/// The economic and cultural profile of a civilization.
///
/// Technology, building, and event collaborators change a profile through
/// economic effects; the economy reads it when computing production and
/// consumption, and diplomacy reads it for cultural similarity and distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CivProfile {
    /// Unique civilization identifier.
    pub id: CivId,
    /// Display name.
    pub name: String,
    /// Current population.
    pub population: u64,
    /// Number of military units fielded.
    pub unit_count: u64,
    /// Capability tags (technologies, buildings) satisfying production
    /// requirements and action prerequisites.
    pub capabilities: BTreeSet<String>,
    /// Culture traits used for cultural similarity.
    pub culture_traits: BTreeSet<String>,
    /// Capital position.
    pub position: Position,
    /// Currency minted into the treasury per simulated second.
    pub income_rate: f64,
    /// Per-resource production bonuses.
    pub bonuses: BTreeMap<ResourceId, ProductionBonus>,
}

impl CivProfile {
    /// Create a profile with no population, capabilities, or bonuses.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CivId::new(),
            name: name.into(),
            population: 0,
            unit_count: 0,
            capabilities: BTreeSet::new(),
            culture_traits: BTreeSet::new(),
            position: Position::default(),
            income_rate: 0.0,
            bonuses: BTreeMap::new(),
        }
    }

    /// Combined production bonus for a resource (zero when none is set).
    pub fn production_bonus(&self, resource: &ResourceId) -> f64 {
        self.bonuses.get(resource).map_or(0.0, ProductionBonus::total)
    }

    /// Whether the civilization holds a capability tag.
    pub fn has_capability(&self, tag: &str) -> bool {
        self.capabilities.contains(tag)
    }

    /// Jaccard index of the two capability sets.
    pub fn shared_technology(&self, other: &Self) -> f64 {
        jaccard(&self.capabilities, &other.capabilities)
    }

    /// Jaccard index of the two culture trait sets.
    pub fn cultural_similarity(&self, other: &Self) -> f64 {
        jaccard(&self.culture_traits, &other.culture_traits)
    }

    /// Distance between the two capitals.
    pub fn distance_to(&self, other: &Self) -> f64 {
        self.position.distance_to(other.position)
    }
}

/// `|a ∩ b| / |a ∪ b|`, zero when both sets are empty.
#[allow(clippy::cast_precision_loss)]
fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

// ---------------------------------------------------------------------------
// Treasury
// ---------------------------------------------------------------------------

/// One append-only treasury ledger record.
///
/// `Mint` entries have no `from`, `Burn` entries have no `to`, and
/// `Payment` entries have both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LedgerEntry {
    /// Unique entry identifier.
    pub id: LedgerEntryId,
    /// Economic cycle during which the entry was recorded.
    pub cycle: u64,
    /// The category of movement.
    pub entry_type: LedgerEntryType,
    /// Paying civilization, if any.
    pub from: Option<CivId>,
    /// Receiving civilization, if any.
    pub to: Option<CivId>,
    /// Amount moved (always positive).
    #[ts(as = "String")]
    pub amount: Decimal,
    /// Reason tag (e.g. `"TRADE"`, `"INCOME"`, `"DIPLOMACY"`).
    pub reason: String,
    /// Real-world timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_bonus_sums_sources() {
        let mut profile = CivProfile::new("Egypt");
        let grain = ResourceId::from("food");
        let bonus = profile.bonuses.entry(grain.clone()).or_default();
        *bonus.source_mut(BonusSource::Technology) += 0.1;
        *bonus.source_mut(BonusSource::Building) += 0.05;

        assert!((profile.production_bonus(&grain) - 0.15).abs() < 1e-12);
        assert!(profile.production_bonus(&ResourceId::from("iron")).abs() < f64::EPSILON);
    }

    #[test]
    fn similarity_is_jaccard() {
        let mut a = CivProfile::new("Athens");
        let mut b = CivProfile::new("Sparta");
        for t in ["greek", "polytheist", "maritime"] {
            a.culture_traits.insert(t.to_owned());
        }
        for t in ["greek", "polytheist", "martial"] {
            b.culture_traits.insert(t.to_owned());
        }
        assert!((a.cultural_similarity(&b) - 0.5).abs() < 1e-12);
        assert!(a.shared_technology(&b).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Position { x: 0.0, y: 0.0 };
        let b = Position { x: 3.0, y: 4.0 };
        assert!((a.distance_to(b) - 5.0).abs() < 1e-12);
    }
}
