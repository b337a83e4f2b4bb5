//! The resource registry and per-civilization production math.
//!
//! Resources are created once from static configuration and mutated every
//! economic cycle; they are never removed. The registry's `supply` is the
//! world aggregate of all market stocks: it starts as the sum of every
//! market's starting stock and then moves with production, consumption,
//! and raids. `demand` is the total consumption of the last cycle. Both are
//! clamped at zero.
//!
//! Rates are per simulated second:
//!
//! ```text
//! production  = base * (1 + tech + building + civ) * missing_eff ^ missing_tags
//! consumption = base + population * per_capita + units * per_unit
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use civitas_types::{CivProfile, ResourceId};

use crate::error::EconomyError;
use crate::params::EconomyParams;

/// Static definition of a resource, as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Unique key (e.g. `"iron"`).
    pub id: ResourceId,
    /// Display name. Defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
    /// Reference price.
    pub base_value: f64,
    /// Stock every market starts with. Defaults to `economy.starting_stock`.
    #[serde(default)]
    pub starting_stock: Option<f64>,
    /// Base production per civilization per second.
    #[serde(default)]
    pub production_rate: f64,
    /// Base consumption per civilization per second.
    #[serde(default)]
    pub consumption_rate: f64,
    /// Extra consumption per inhabitant per second.
    #[serde(default = "default_per_capita")]
    pub per_capita_consumption: f64,
    /// Extra consumption per military unit per second.
    #[serde(default = "default_per_unit")]
    pub per_unit_consumption: f64,
    /// Luxury good.
    #[serde(default)]
    pub luxury: bool,
    /// Strategic good.
    #[serde(default)]
    pub strategic: bool,
    /// Capability tags a civilization needs to produce at full efficiency.
    #[serde(default)]
    pub requirements: BTreeSet<String>,
}

const fn default_per_capita() -> f64 {
    0.01
}

const fn default_per_unit() -> f64 {
    0.05
}

/// A registered resource kind with its live economic figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique key.
    pub id: ResourceId,
    /// Display name.
    pub name: String,
    /// Reference price used by the pricing formula.
    pub base_value: f64,
    /// Mean committed price across all markets.
    pub current_value: f64,
    /// World supply. Never negative.
    pub supply: f64,
    /// Consumption over the last cycle. Never negative.
    pub demand: f64,
    /// Base production per civilization per second.
    pub production_rate: f64,
    /// Base consumption per civilization per second.
    pub consumption_rate: f64,
    /// Extra consumption per inhabitant per second.
    pub per_capita_consumption: f64,
    /// Extra consumption per military unit per second.
    pub per_unit_consumption: f64,
    /// Luxury good.
    pub luxury: bool,
    /// Strategic good.
    pub strategic: bool,
    /// Capability tags needed to produce at full efficiency.
    pub requirements: BTreeSet<String>,
    /// Per-market starting stock, overriding the economy default.
    pub starting_stock: Option<f64>,
}

impl Resource {
    /// A resource with the given reference price and no production or
    /// consumption.
    pub fn new(id: impl Into<ResourceId>, base_value: f64) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            base_value,
            current_value: base_value,
            supply: 0.0,
            demand: 0.0,
            production_rate: 0.0,
            consumption_rate: 0.0,
            per_capita_consumption: default_per_capita(),
            per_unit_consumption: default_per_unit(),
            luxury: false,
            strategic: false,
            requirements: BTreeSet::new(),
            starting_stock: None,
        }
    }

    /// Set base production and consumption rates.
    #[must_use]
    pub const fn with_rates(mut self, production: f64, consumption: f64) -> Self {
        self.production_rate = production;
        self.consumption_rate = consumption;
        self
    }

    /// Set the stock every market starts with.
    #[must_use]
    pub fn with_starting_stock(mut self, stock: f64) -> Self {
        self.starting_stock = Some(stock.max(0.0));
        self
    }

    /// Stock a new market lists this resource with.
    pub fn opening_stock(&self, default: f64) -> f64 {
        self.starting_stock.unwrap_or(default).max(0.0)
    }

    /// Apply one cycle of aggregate production and consumption.
    pub(crate) fn apply_cycle(&mut self, produced: f64, consumed: f64, demanded: f64) {
        self.supply = (self.supply + produced - consumed).max(0.0);
        self.demand = demanded.max(0.0);
    }
}

impl From<ResourceSpec> for Resource {
    fn from(spec: ResourceSpec) -> Self {
        Self {
            name: spec.name.unwrap_or_else(|| spec.id.to_string()),
            id: spec.id,
            base_value: spec.base_value,
            current_value: spec.base_value,
            supply: 0.0,
            demand: 0.0,
            production_rate: spec.production_rate,
            consumption_rate: spec.consumption_rate,
            per_capita_consumption: spec.per_capita_consumption,
            per_unit_consumption: spec.per_unit_consumption,
            luxury: spec.luxury,
            strategic: spec.strategic,
            requirements: spec.requirements,
            starting_stock: spec.starting_stock.map(|stock| stock.max(0.0)),
        }
    }
}

/// All registered resources, keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceRegistry {
    resources: BTreeMap<ResourceId, Resource>,
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            resources: BTreeMap::new(),
        }
    }

    /// Register a resource.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::DuplicateResource`] if the id is taken.
    pub fn register(&mut self, resource: Resource) -> Result<(), EconomyError> {
        if self.resources.contains_key(&resource.id) {
            return Err(EconomyError::DuplicateResource(resource.id));
        }
        tracing::debug!(resource = %resource.id, base_value = resource.base_value, "resource registered");
        self.resources.insert(resource.id.clone(), resource);
        Ok(())
    }

    /// Look up a resource.
    pub fn get(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &ResourceId) -> Option<&mut Resource> {
        self.resources.get_mut(id)
    }

    /// Whether the resource is registered.
    pub fn contains(&self, id: &ResourceId) -> bool {
        self.resources.contains_key(id)
    }

    /// All registered ids in order.
    pub fn ids(&self) -> Vec<ResourceId> {
        self.resources.keys().cloned().collect()
    }

    /// Iterate over all resources.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether no resource is registered.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Production per second of `resource` by the civilization.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::UnknownResource`] for unregistered ids.
    pub fn production_rate(
        &self,
        resource: &ResourceId,
        civ: &CivProfile,
        params: &EconomyParams,
    ) -> Result<f64, EconomyError> {
        let def = self
            .get(resource)
            .ok_or_else(|| EconomyError::UnknownResource(resource.clone()))?;
        let multiplier = (1.0 + civ.production_bonus(resource)).max(0.0);
        let missing = def
            .requirements
            .iter()
            .filter(|tag| !civ.has_capability(tag))
            .count();
        let requirement_efficiency = params
            .missing_requirement_efficiency
            .powi(i32::try_from(missing).unwrap_or(i32::MAX));
        Ok((def.production_rate * multiplier * requirement_efficiency).max(0.0))
    }

    /// Consumption per second of `resource` by the civilization.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::UnknownResource`] for unregistered ids.
    #[allow(clippy::cast_precision_loss)]
    pub fn consumption_rate(
        &self,
        resource: &ResourceId,
        civ: &CivProfile,
    ) -> Result<f64, EconomyError> {
        let def = self
            .get(resource)
            .ok_or_else(|| EconomyError::UnknownResource(resource.clone()))?;
        let rate = def.consumption_rate
            + civ.population as f64 * def.per_capita_consumption
            + civ.unit_count as f64 * def.per_unit_consumption;
        Ok(rate.max(0.0))
    }
}
