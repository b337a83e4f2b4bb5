//! Trade routes: condition math, per-route state, and smoothing updates.
//!
//! A route's starting efficiency, risk, cost, and capacity come from its
//! [`RouteConditions`]:
//!
//! ```text
//! reach      = distance / (distance + distance_scale)
//! efficiency = clamp(1 - reach) * (0.75 + 0.25 * shared_technology)
//! risk       = clamp(base_risk + hostility * 0.5 + reach * 0.2)
//! cost       = cost_per_distance * distance
//! capacity   = base_capacity * efficiency
//! ```
//!
//! with `hostility = max(0, -relation_score) / 100`. A route is viable while
//! `efficiency * (1 - risk) >= min_viability`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use civitas_types::{MarketId, ResourceId, RouteId};

use crate::params::RouteParams;
use crate::pricing::ema;

/// Inputs that determine a route's quality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteConditions {
    /// Distance between the two capitals.
    pub distance: f64,
    /// Relationship score between the owners, in `[-100, 100]`.
    pub relation_score: f64,
    /// Fraction of technology the owners share, in `[0, 1]`.
    pub shared_technology: f64,
}

/// Route figures derived from [`RouteConditions`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteProfile {
    /// Fraction of goods that arrive, in `[0, 1]`.
    pub efficiency: f64,
    /// Chance a shipment is raided, in `[0, 1]`.
    pub risk: f64,
    /// Fixed per-unit transport cost.
    pub cost: f64,
    /// Units per second the route can carry.
    pub capacity: f64,
}

impl RouteProfile {
    /// `efficiency * (1 - risk)`.
    pub fn viability(&self) -> f64 {
        self.efficiency * (1.0 - self.risk)
    }
}

impl RouteConditions {
    /// Combine the conditions into a route profile.
    pub fn evaluate(&self, params: &RouteParams) -> RouteProfile {
        let distance = self.distance.max(0.0);
        let reach = if distance + params.distance_scale > 0.0 {
            distance / (distance + params.distance_scale)
        } else {
            0.0
        };
        let shared = self.shared_technology.clamp(0.0, 1.0);
        let efficiency = ((1.0 - reach).clamp(0.0, 1.0) * (0.75 + 0.25 * shared)).clamp(0.0, 1.0);

        let hostility = (-self.relation_score).max(0.0) / 100.0;
        let risk = (params.base_risk + hostility * 0.5 + reach * 0.2).clamp(0.0, 1.0);

        RouteProfile {
            efficiency,
            risk,
            cost: params.cost_per_distance * distance,
            capacity: params.base_capacity * efficiency,
        }
    }
}

/// Per-cycle shipment counters used by the smoothing update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipmentStats {
    /// Shipments attempted.
    pub attempts: u32,
    /// Shipments that arrived unraided.
    pub successes: u32,
    /// Units sent.
    pub shipped: f64,
    /// Units lost to raids.
    pub lost: f64,
}

impl ShipmentStats {
    /// Successful fraction of attempts (1 with no attempts).
    pub fn success_ratio(&self) -> f64 {
        if self.attempts == 0 {
            1.0
        } else {
            f64::from(self.successes) / f64::from(self.attempts)
        }
    }

    /// Fraction of shipped units lost (0 with nothing shipped).
    pub fn loss_ratio(&self) -> f64 {
        if self.shipped > 0.0 {
            (self.lost / self.shipped).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// A trade route between two markets.
///
/// Source and destination are stored as given but flow may run either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRoute {
    /// Unique identifier.
    pub id: RouteId,
    /// First endpoint.
    pub source: MarketId,
    /// Second endpoint.
    pub destination: MarketId,
    /// The conditions the route was last evaluated with.
    pub conditions: RouteConditions,
    /// Condition-derived efficiency the smoothed value tracks.
    pub base_efficiency: f64,
    /// Condition-derived risk the smoothed value tracks.
    pub base_risk: f64,
    /// Smoothed efficiency in `[0, 1]`.
    pub efficiency: f64,
    /// Smoothed risk in `[0, 1]`.
    pub risk: f64,
    /// Fixed per-unit transport cost.
    pub cost: f64,
    /// Units per second.
    pub capacity: f64,
    /// Whether the route carries goods.
    pub active: bool,
    /// Units delivered per resource during the last cycle.
    pub resource_flow: BTreeMap<ResourceId, f64>,
    /// Total units carried per resource over the route's lifetime.
    pub trade_volume: BTreeMap<ResourceId, f64>,
    /// Counters for the current cycle.
    pub stats: ShipmentStats,
}

impl TradeRoute {
    /// Build a route from its conditions.
    pub fn new(
        source: MarketId,
        destination: MarketId,
        conditions: RouteConditions,
        params: &RouteParams,
    ) -> Self {
        let profile = conditions.evaluate(params);
        Self {
            id: RouteId::new(),
            source,
            destination,
            conditions,
            base_efficiency: profile.efficiency,
            base_risk: profile.risk,
            efficiency: profile.efficiency,
            risk: profile.risk,
            cost: profile.cost,
            capacity: profile.capacity,
            active: true,
            resource_flow: BTreeMap::new(),
            trade_volume: BTreeMap::new(),
            stats: ShipmentStats::default(),
        }
    }

    /// Whether this route joins `a` and `b` in either direction.
    pub fn connects(&self, a: MarketId, b: MarketId) -> bool {
        (self.source == a && self.destination == b) || (self.source == b && self.destination == a)
    }

    /// Whether `market` is an endpoint.
    pub fn touches(&self, market: MarketId) -> bool {
        self.source == market || self.destination == market
    }

    /// The endpoint opposite `market`.
    pub fn other_end(&self, market: MarketId) -> Option<MarketId> {
        if self.source == market {
            Some(self.destination)
        } else if self.destination == market {
            Some(self.source)
        } else {
            None
        }
    }

    /// Smoothed `efficiency * (1 - risk)`.
    pub fn viability(&self) -> f64 {
        self.efficiency * (1.0 - self.risk)
    }

    /// Lifetime units carried for a resource.
    pub fn volume(&self, resource: &ResourceId) -> f64 {
        self.trade_volume.get(resource).copied().unwrap_or(0.0)
    }

    /// Total currency for `amount` units at `unit_price`:
    /// `(unit_price + cost * efficiency + unit_price * risk) * amount`.
    pub fn total_cost(&self, unit_price: f64, amount: f64) -> f64 {
        (unit_price + self.cost * self.efficiency + unit_price * self.risk) * amount
    }

    /// Most units this route can move in `dt` seconds.
    pub fn cycle_capacity(&self, dt: f64) -> f64 {
        (self.capacity * dt).max(0.0)
    }

    /// Record units carried by an explicit trade.
    pub(crate) fn record_trade(&mut self, resource: &ResourceId, amount: f64) {
        *self.trade_volume.entry(resource.clone()).or_insert(0.0) += amount;
    }

    /// Record one cycle shipment.
    pub(crate) fn record_shipment(&mut self, resource: &ResourceId, sent: f64, lost: f64) {
        let delivered = (sent - lost).max(0.0);
        *self.resource_flow.entry(resource.clone()).or_insert(0.0) += delivered;
        *self.trade_volume.entry(resource.clone()).or_insert(0.0) += delivered;
        self.stats.attempts = self.stats.attempts.saturating_add(1);
        if lost <= 0.0 {
            self.stats.successes = self.stats.successes.saturating_add(1);
        }
        self.stats.shipped += sent;
        self.stats.lost += lost;
    }

    /// Clear the per-cycle flow and counters.
    pub(crate) fn begin_cycle(&mut self) {
        self.resource_flow.clear();
        self.stats = ShipmentStats::default();
    }

    /// Re-evaluate conditions, keeping the smoothed figures.
    pub(crate) fn refresh_conditions(&mut self, conditions: RouteConditions, params: &RouteParams) {
        let profile = conditions.evaluate(params);
        self.conditions = conditions;
        self.base_efficiency = profile.efficiency;
        self.base_risk = profile.risk;
        self.cost = profile.cost;
        self.capacity = params.base_capacity * self.efficiency;
    }

    /// Move efficiency and risk toward what this cycle's shipments showed.
    pub(crate) fn smooth(&mut self, params: &RouteParams) {
        let target_efficiency = self.base_efficiency * self.stats.success_ratio();
        let target_risk = (self.base_risk + self.stats.loss_ratio()).clamp(0.0, 1.0);
        self.efficiency = ema(self.efficiency, target_efficiency, params.smoothing).clamp(0.0, 1.0);
        self.risk = ema(self.risk, target_risk, params.smoothing).clamp(0.0, 1.0);
        self.capacity = params.base_capacity * self.efficiency;
    }

    /// Reset the smoothed figures to the condition-derived ones and resume.
    pub(crate) fn reactivate(&mut self, params: &RouteParams) {
        self.efficiency = self.base_efficiency;
        self.risk = self.base_risk;
        self.capacity = params.base_capacity * self.efficiency;
        self.active = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditions(distance: f64, relation_score: f64) -> RouteConditions {
        RouteConditions {
            distance,
            relation_score,
            shared_technology: 1.0,
        }
    }

    #[test]
    fn adjacent_friendly_route_is_efficient_and_safe() {
        let profile = conditions(0.0, 50.0).evaluate(&RouteParams::default());
        assert!((profile.efficiency - 1.0).abs() < 1e-12);
        assert!((profile.risk - 0.05).abs() < 1e-12);
        assert!(profile.cost.abs() < f64::EPSILON);
    }

    #[test]
    fn distance_halves_efficiency_at_scale() {
        let params = RouteParams::default();
        let profile = conditions(params.distance_scale, 0.0).evaluate(&params);
        assert!((profile.efficiency - 0.5).abs() < 1e-12);
        assert!((profile.risk - (0.05 + 0.1)).abs() < 1e-12);
    }

    #[test]
    fn hostility_raises_risk() {
        let params = RouteParams::default();
        let calm = conditions(10.0, 0.0).evaluate(&params);
        let tense = conditions(10.0, -80.0).evaluate(&params);
        assert!(tense.risk > calm.risk);
        assert!(tense.viability() < calm.viability());
    }

    #[test]
    fn profile_stays_bounded() {
        let params = RouteParams::default();
        for distance in [0.0, 1.0, 1e3, 1e9] {
            for score in [-100.0, 0.0, 100.0] {
                let p = conditions(distance, score).evaluate(&params);
                assert!((0.0..=1.0).contains(&p.efficiency));
                assert!((0.0..=1.0).contains(&p.risk));
            }
        }
    }

    #[test]
    fn total_cost_includes_transport_and_risk_premium() {
        let mut route = TradeRoute::new(
            MarketId::new(),
            MarketId::new(),
            conditions(0.0, 0.0),
            &RouteParams::default(),
        );
        route.cost = 2.0;
        route.efficiency = 0.5;
        route.risk = 0.1;
        // (10 + 2 * 0.5 + 10 * 0.1) * 3
        assert!((route.total_cost(10.0, 3.0) - 36.0).abs() < 1e-9);
    }

    #[test]
    fn raids_pull_risk_up_and_efficiency_down() {
        let params = RouteParams::default();
        let mut route = TradeRoute::new(MarketId::new(), MarketId::new(), conditions(10.0, 0.0), &params);
        let (eff, risk) = (route.efficiency, route.risk);
        let silk = ResourceId::from("silk");

        route.record_shipment(&silk, 10.0, 5.0);
        route.record_shipment(&silk, 10.0, 0.0);
        route.smooth(&params);

        assert!(route.efficiency < eff);
        assert!(route.risk > risk);
        assert!((route.volume(&silk) - 15.0).abs() < 1e-12);
    }

    #[test]
    fn connects_is_unordered() {
        let a = MarketId::new();
        let b = MarketId::new();
        let route = TradeRoute::new(a, b, conditions(1.0, 0.0), &RouteParams::default());
        assert!(route.connects(b, a));
        assert_eq!(route.other_end(b), Some(a));
        assert_eq!(route.other_end(MarketId::new()), None);
    }
}
