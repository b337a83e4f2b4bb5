//! The trade route network: every route ever opened, indexed by id.
//!
//! Routes are deactivated rather than removed so their history stays
//! queryable. At most one route per unordered market pair is active.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use civitas_types::{MarketId, RouteId};

use crate::error::EconomyError;
use crate::params::RouteParams;
use crate::route::{RouteConditions, TradeRoute};

/// Result of opening a route between two markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOpening {
    /// A brand new route was created.
    Created(RouteId),
    /// A previously deactivated route for the same pair resumed.
    Reactivated(RouteId),
    /// The active route for the pair was re-evaluated.
    Refreshed(RouteId),
}

impl RouteOpening {
    /// The route id in either case.
    pub const fn id(self) -> RouteId {
        match self {
            Self::Created(id) | Self::Reactivated(id) | Self::Refreshed(id) => id,
        }
    }
}

/// All trade routes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteNetwork {
    routes: BTreeMap<RouteId, TradeRoute>,
}

impl RouteNetwork {
    /// Create an empty network.
    pub const fn new() -> Self {
        Self {
            routes: BTreeMap::new(),
        }
    }

    /// Open a route between two markets.
    ///
    /// A deactivated route for the same pair is re-evaluated and resumed
    /// instead of creating a second record.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::SameMarket`] if `a == b`, or
    /// [`EconomyError::RouteAlreadyExists`] if an active route already joins
    /// the pair.
    pub fn create_route(
        &mut self,
        a: MarketId,
        b: MarketId,
        conditions: RouteConditions,
        params: &RouteParams,
    ) -> Result<RouteOpening, EconomyError> {
        if a == b {
            return Err(EconomyError::SameMarket(a));
        }
        if self.active_route_between(a, b).is_some() {
            return Err(EconomyError::RouteAlreadyExists { a, b });
        }
        if let Some(existing) = self.routes.values_mut().find(|r| r.connects(a, b)) {
            existing.refresh_conditions(conditions, params);
            existing.reactivate(params);
            return Ok(RouteOpening::Reactivated(existing.id));
        }

        let route = TradeRoute::new(a, b, conditions, params);
        let id = route.id;
        tracing::info!(route = %id, source = %a, destination = %b, efficiency = route.efficiency, risk = route.risk, "trade route created");
        self.routes.insert(id, route);
        Ok(RouteOpening::Created(id))
    }

    /// Open a route, or re-evaluate the active one for the pair.
    ///
    /// Refreshing resets the smoothed efficiency and risk to the
    /// condition-derived figures.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::SameMarket`] if `a == b`.
    pub fn establish(
        &mut self,
        a: MarketId,
        b: MarketId,
        conditions: RouteConditions,
        params: &RouteParams,
    ) -> Result<RouteOpening, EconomyError> {
        if let Some(active) = self.routes.values_mut().find(|r| r.active && r.connects(a, b)) {
            active.refresh_conditions(conditions, params);
            active.reactivate(params);
            tracing::debug!(route = %active.id, efficiency = active.efficiency, risk = active.risk, "trade route refreshed");
            return Ok(RouteOpening::Refreshed(active.id));
        }
        self.create_route(a, b, conditions, params)
    }

    /// Look up a route.
    pub fn get(&self, id: RouteId) -> Option<&TradeRoute> {
        self.routes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: RouteId) -> Option<&mut TradeRoute> {
        self.routes.get_mut(&id)
    }

    /// The route record for a pair, active or not.
    pub fn route_between(&self, a: MarketId, b: MarketId) -> Option<&TradeRoute> {
        self.routes.values().find(|r| r.connects(a, b))
    }

    /// The active route for a pair.
    pub fn active_route_between(&self, a: MarketId, b: MarketId) -> Option<&TradeRoute> {
        self.routes.values().find(|r| r.active && r.connects(a, b))
    }

    /// All route ids.
    pub fn ids(&self) -> Vec<RouteId> {
        self.routes.keys().copied().collect()
    }

    /// Iterate over all routes.
    pub fn iter(&self) -> impl Iterator<Item = &TradeRoute> {
        self.routes.values()
    }

    /// Number of routes, active or not.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the network has no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Number of active routes.
    pub fn active_count(&self) -> usize {
        self.routes.values().filter(|r| r.active).count()
    }

    /// Deactivate a route. Returns `true` if it was active.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::UnknownRoute`] for unknown ids.
    pub fn deactivate(&mut self, id: RouteId) -> Result<bool, EconomyError> {
        let route = self.routes.get_mut(&id).ok_or(EconomyError::UnknownRoute(id))?;
        let was_active = route.active;
        route.active = false;
        Ok(was_active)
    }

    /// Deactivate every active route touching `market`.
    pub fn deactivate_all_for(&mut self, market: MarketId) -> Vec<RouteId> {
        let mut closed = Vec::new();
        for route in self.routes.values_mut() {
            if route.active && route.touches(market) {
                route.active = false;
                closed.push(route.id);
            }
        }
        closed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn conditions() -> RouteConditions {
        RouteConditions {
            distance: 20.0,
            relation_score: 10.0,
            shared_technology: 0.5,
        }
    }

    #[test]
    fn duplicate_active_route_rejected_either_direction() {
        let params = RouteParams::default();
        let mut network = RouteNetwork::new();
        let a = MarketId::new();
        let b = MarketId::new();
        network.create_route(a, b, conditions(), &params).unwrap();

        let result = network.create_route(b, a, conditions(), &params);
        assert!(matches!(result, Err(EconomyError::RouteAlreadyExists { .. })));
        assert_eq!(network.len(), 1);
    }

    #[test]
    fn self_route_rejected() {
        let mut network = RouteNetwork::new();
        let a = MarketId::new();
        let result = network.create_route(a, a, conditions(), &RouteParams::default());
        assert_eq!(result, Err(EconomyError::SameMarket(a)));
    }

    #[test]
    fn reopening_a_deactivated_route_keeps_history() {
        let params = RouteParams::default();
        let mut network = RouteNetwork::new();
        let a = MarketId::new();
        let b = MarketId::new();
        let id = network.create_route(a, b, conditions(), &params).unwrap().id();
        network.deactivate(id).unwrap();
        assert!(network.active_route_between(a, b).is_none());
        assert!(network.route_between(a, b).is_some());

        let reopened = network.create_route(a, b, conditions(), &params).unwrap();
        assert_eq!(reopened, RouteOpening::Reactivated(id));
        assert_eq!(network.len(), 1);
        assert_eq!(network.active_count(), 1);
    }

    #[test]
    fn removing_a_market_closes_its_routes() {
        let params = RouteParams::default();
        let mut network = RouteNetwork::new();
        let hub = MarketId::new();
        network.create_route(hub, MarketId::new(), conditions(), &params).unwrap();
        network.create_route(hub, MarketId::new(), conditions(), &params).unwrap();
        network.create_route(MarketId::new(), MarketId::new(), conditions(), &params).unwrap();

        let closed = network.deactivate_all_for(hub);
        assert_eq!(closed.len(), 2);
        assert_eq!(network.active_count(), 1);
    }

    #[test]
    fn establishing_an_open_route_refreshes_it() {
        let params = RouteParams::default();
        let mut network = RouteNetwork::new();
        let a = MarketId::new();
        let b = MarketId::new();
        let id = network.establish(a, b, conditions(), &params).unwrap().id();

        let closer = RouteConditions {
            distance: 5.0,
            ..conditions()
        };
        let again = network.establish(b, a, closer, &params).unwrap();
        assert_eq!(again, RouteOpening::Refreshed(id));
        let route = network.get(id).unwrap();
        assert!((route.conditions.distance - 5.0).abs() < f64::EPSILON);
        assert!((route.efficiency - route.base_efficiency).abs() < f64::EPSILON);
        assert_eq!(network.len(), 1);
    }
}
