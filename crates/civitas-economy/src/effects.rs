//! Economic effects applied to a civilization by technology, building, and
//! event collaborators.

use serde::{Deserialize, Serialize};

use civitas_types::{BonusSource, ResourceId};

/// A change to a civilization's economy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EconomicEffect {
    /// Add to the production bonus of one resource from one source.
    ProductionBonus {
        /// The resource boosted.
        resource: ResourceId,
        /// Where the bonus comes from.
        source: BonusSource,
        /// Additive fraction (0.1 is +10%).
        amount: f64,
    },
    /// Grow or shrink the population.
    PopulationChange {
        /// Signed change.
        delta: i64,
    },
    /// Raise or disband military units.
    UnitChange {
        /// Signed change.
        delta: i64,
    },
    /// Unlock a capability tag.
    GrantCapability {
        /// The tag granted.
        tag: String,
    },
    /// Add (or remove, when negative) stock in the civilization's market.
    StockGrant {
        /// The resource.
        resource: ResourceId,
        /// Signed amount.
        amount: f64,
    },
    /// Shift the market's economic stability.
    StabilityShock {
        /// Signed change, clamped into `[0, 1]` afterwards.
        amount: f64,
    },
}
