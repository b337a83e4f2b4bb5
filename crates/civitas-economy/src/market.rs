//! Per-civilization markets.
//!
//! A [`Market`] holds one price per registered resource, the net trade
//! volume recorded against it, and the civilization's physical stock.
//! Prices are only written by the pricing pass; callers read them through
//! [`Market::price`], which never invents a default.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use civitas_types::{CivId, MarketId, ResourceId};

use crate::pricing::ema;
use crate::resource::ResourceRegistry;

/// A civilization's market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    id: MarketId,
    owner: CivId,
    prices: BTreeMap<ResourceId, f64>,
    trade_volume: BTreeMap<ResourceId, f64>,
    stock: BTreeMap<ResourceId, f64>,
    /// Consumption need of the last cycle, per resource.
    need: BTreeMap<ResourceId, f64>,
    /// Need left unmet after the last consumption step, per resource.
    unmet: BTreeMap<ResourceId, f64>,
    strength: f64,
    stability: f64,
    /// Mean relative price move of the last pricing pass.
    last_price_move: f64,
    connected: BTreeSet<MarketId>,
}

impl Market {
    /// Open a market for `owner` with base prices. Each registered resource
    /// is stocked with its own starting stock, or `starting_stock` when it
    /// has none.
    pub fn new(owner: CivId, registry: &ResourceRegistry, starting_stock: f64) -> Self {
        let mut market = Self {
            id: MarketId::of(owner),
            owner,
            prices: BTreeMap::new(),
            trade_volume: BTreeMap::new(),
            stock: BTreeMap::new(),
            need: BTreeMap::new(),
            unmet: BTreeMap::new(),
            strength: 1.0,
            stability: 1.0,
            last_price_move: 0.0,
            connected: BTreeSet::new(),
        };
        for resource in registry.iter() {
            market.list_resource(&resource.id, resource.base_value, resource.opening_stock(starting_stock));
        }
        market
    }

    /// Market identifier.
    pub const fn id(&self) -> MarketId {
        self.id
    }

    /// Owning civilization.
    pub const fn owner(&self) -> CivId {
        self.owner
    }

    /// Current price, or `None` if the resource is not listed.
    pub fn price(&self, resource: &ResourceId) -> Option<f64> {
        self.prices.get(resource).copied()
    }

    /// All prices keyed by resource.
    pub const fn prices(&self) -> &BTreeMap<ResourceId, f64> {
        &self.prices
    }

    /// Net recorded trade volume (negative means net outflow).
    pub fn trade_volume(&self, resource: &ResourceId) -> f64 {
        self.trade_volume.get(resource).copied().unwrap_or(0.0)
    }

    /// Sum of absolute net volumes across all resources.
    pub fn total_trade_volume(&self) -> f64 {
        self.trade_volume.values().map(|v| v.abs()).sum()
    }

    /// Stock on hand.
    pub fn stock(&self, resource: &ResourceId) -> f64 {
        self.stock.get(resource).copied().unwrap_or(0.0)
    }

    /// All stocks keyed by resource.
    pub const fn stocks(&self) -> &BTreeMap<ResourceId, f64> {
        &self.stock
    }

    /// Need left unmet after the last consumption step.
    pub fn unmet_need(&self, resource: &ResourceId) -> f64 {
        self.unmet.get(resource).copied().unwrap_or(0.0)
    }

    /// Consumption need of the last cycle.
    pub fn need(&self, resource: &ResourceId) -> f64 {
        self.need.get(resource).copied().unwrap_or(0.0)
    }

    /// Market strength in `[0, 1]`.
    pub const fn strength(&self) -> f64 {
        self.strength
    }

    /// Economic stability in `[0, 1]`.
    pub const fn stability(&self) -> f64 {
        self.stability
    }

    /// Strength times stability, the market's pricing multiplier.
    pub fn market_factor(&self) -> f64 {
        self.strength * self.stability
    }

    /// Markets joined to this one by a route.
    pub const fn connected_markets(&self) -> &BTreeSet<MarketId> {
        &self.connected
    }

    /// Accumulate a signed trade volume. Never rejected.
    pub fn record_trade(&mut self, resource: &ResourceId, volume_delta: f64) {
        let entry = self.trade_volume.entry(resource.clone()).or_insert(0.0);
        *entry += volume_delta;
    }

    pub(crate) fn list_resource(&mut self, resource: &ResourceId, price: f64, stock: f64) {
        self.prices.entry(resource.clone()).or_insert(price);
        self.stock.entry(resource.clone()).or_insert(stock.max(0.0));
    }

    pub(crate) fn set_price(&mut self, resource: &ResourceId, price: f64) {
        if let Some(slot) = self.prices.get_mut(resource) {
            *slot = price.max(0.0);
        }
    }

    pub(crate) fn add_stock(&mut self, resource: &ResourceId, amount: f64) {
        let entry = self.stock.entry(resource.clone()).or_insert(0.0);
        *entry = (*entry + amount).max(0.0);
    }

    /// Remove up to `amount`, returning what was actually removed.
    pub(crate) fn take_stock(&mut self, resource: &ResourceId, amount: f64) -> f64 {
        let entry = self.stock.entry(resource.clone()).or_insert(0.0);
        let taken = amount.clamp(0.0, *entry);
        *entry -= taken;
        taken
    }

    pub(crate) fn set_need(&mut self, resource: &ResourceId, need: f64, unmet: f64) {
        self.need.insert(resource.clone(), need.max(0.0));
        self.unmet.insert(resource.clone(), unmet.max(0.0));
    }

    pub(crate) fn reduce_unmet(&mut self, resource: &ResourceId, delivered: f64) {
        if let Some(unmet) = self.unmet.get_mut(resource) {
            *unmet = (*unmet - delivered).max(0.0);
        }
    }

    /// Move strength toward how much of this cycle's need was covered and
    /// stability toward the calm implied by the last price moves.
    pub(crate) fn update_indicators(
        &mut self,
        strength_alpha: f64,
        stability_alpha: f64,
        stability_sensitivity: f64,
    ) {
        let total_need: f64 = self.need.values().sum();
        let total_unmet: f64 = self.unmet.values().sum();
        let coverage = if total_need > 0.0 {
            ((total_need - total_unmet) / total_need).clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.strength = ema(self.strength, coverage, strength_alpha).clamp(0.0, 1.0);

        let calm = 1.0 / (1.0 + stability_sensitivity.max(0.0) * self.last_price_move);
        self.stability = ema(self.stability, calm, stability_alpha).clamp(0.0, 1.0);
    }

    pub(crate) const fn set_last_price_move(&mut self, mean_move: f64) {
        self.last_price_move = mean_move;
    }

    /// Apply a one-off stability shock (negative values destabilize).
    pub(crate) fn shock_stability(&mut self, amount: f64) {
        self.stability = (self.stability + amount).clamp(0.0, 1.0);
    }

    pub(crate) fn connect(&mut self, other: MarketId) {
        if other != self.id {
            self.connected.insert(other);
        }
    }

    pub(crate) fn disconnect(&mut self, other: MarketId) {
        self.connected.remove(&other);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resource::Resource;

    fn market() -> Market {
        let mut registry = ResourceRegistry::new();
        registry.register(Resource::new("iron", 30.0)).unwrap();
        registry.register(Resource::new("silk", 80.0)).unwrap();
        Market::new(CivId::new(), &registry, 50.0)
    }

    #[test]
    fn every_registered_resource_is_priced() {
        let market = market();
        assert_eq!(market.prices().len(), 2);
        assert_eq!(market.price(&ResourceId::from("silk")), Some(80.0));
    }

    #[test]
    fn unknown_resource_has_no_price() {
        let market = market();
        assert_eq!(market.price(&ResourceId::from("spice")), None);
    }

    #[test]
    fn trade_volume_accumulates_signed_deltas() {
        let mut market = market();
        let iron = ResourceId::from("iron");
        market.record_trade(&iron, 10.0);
        market.record_trade(&iron, -25.0);
        assert!((market.trade_volume(&iron) + 15.0).abs() < 1e-12);
    }

    #[test]
    fn take_stock_never_goes_negative() {
        let mut market = market();
        let iron = ResourceId::from("iron");
        let taken = market.take_stock(&iron, 80.0);
        assert!((taken - 50.0).abs() < 1e-12);
        assert!(market.stock(&iron).abs() < f64::EPSILON);
    }

    #[test]
    fn unmet_need_weakens_market() {
        let mut market = market();
        let iron = ResourceId::from("iron");
        market.set_need(&iron, 10.0, 10.0);
        market.update_indicators(0.5, 0.5, 5.0);
        assert!((market.strength() - 0.5).abs() < 1e-12);
        assert!((market.stability() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn market_never_connects_to_itself() {
        let mut market = market();
        market.connect(market.id());
        assert!(market.connected_markets().is_empty());
    }
}
