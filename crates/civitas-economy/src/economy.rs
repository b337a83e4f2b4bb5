//! The [`Economy`] aggregate: registry, markets, and route network.
//!
//! Everything that changes stock, prices, or routes goes through this type
//! so the cross-structure invariants hold: every market lists every
//! registered resource, and a market's connected set matches its active
//! routes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use civitas_treasury::{Treasury, to_currency};
use civitas_types::{CivId, CivProfile, MarketId, ResourceId, RouteId, SimEvent};

use crate::effects::EconomicEffect;
use crate::error::EconomyError;
use crate::market::Market;
use crate::network::{RouteNetwork, RouteOpening};
use crate::params::{EconomyParams, RouteParams};
use crate::resource::{Resource, ResourceRegistry};
use crate::route::RouteConditions;

/// Read access to diplomatic state needed by the route pass.
pub trait RelationView {
    /// Relationship score between two civilizations, if they have a relation.
    fn score(&self, a: CivId, b: CivId) -> Option<f64>;

    /// Whether the two civilizations are at war.
    fn at_war(&self, a: CivId, b: CivId) -> bool;
}

/// An explicit trade proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    /// Receiving market.
    pub buyer: MarketId,
    /// Supplying market.
    pub seller: MarketId,
    /// The resource.
    pub resource: ResourceId,
    /// Units requested.
    pub amount: f64,
    /// Agreed price per unit. The seller's market price when absent.
    #[serde(default)]
    pub unit_price: Option<f64>,
}

impl TradeRequest {
    /// A request at the seller's market price.
    pub fn at_market(buyer: MarketId, seller: MarketId, resource: ResourceId, amount: f64) -> Self {
        Self {
            buyer,
            seller,
            resource,
            amount,
            unit_price: None,
        }
    }
}

/// The record of an executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReceipt {
    /// The route used.
    pub route: RouteId,
    /// Receiving market.
    pub buyer: MarketId,
    /// Supplying market.
    pub seller: MarketId,
    /// The resource.
    pub resource: ResourceId,
    /// Units moved.
    pub amount: f64,
    /// Currency paid by the buyer.
    pub total_cost: f64,
}

impl TradeReceipt {
    /// The matching trade-executed event.
    pub fn to_event(&self) -> SimEvent {
        SimEvent::TradeExecuted {
            route: self.route,
            buyer: self.buyer,
            seller: self.seller,
            resource: self.resource.clone(),
            amount: self.amount,
            total_cost: self.total_cost,
        }
    }
}

/// Resources, markets, and trade routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Economy {
    pub(crate) registry: ResourceRegistry,
    pub(crate) markets: BTreeMap<MarketId, Market>,
    pub(crate) routes: RouteNetwork,
    pub(crate) params: EconomyParams,
    pub(crate) route_params: RouteParams,
    /// Cumulative inflation multiplier.
    pub(crate) price_level: f64,
}

impl Economy {
    /// Create an empty economy.
    pub const fn new(params: EconomyParams, route_params: RouteParams) -> Self {
        Self {
            registry: ResourceRegistry::new(),
            markets: BTreeMap::new(),
            routes: RouteNetwork::new(),
            params,
            route_params,
            price_level: 1.0,
        }
    }

    /// The resource registry.
    pub const fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// All markets keyed by id.
    pub const fn markets(&self) -> &BTreeMap<MarketId, Market> {
        &self.markets
    }

    /// Look up a market.
    pub fn market(&self, id: MarketId) -> Option<&Market> {
        self.markets.get(&id)
    }

    /// The route network.
    pub const fn routes(&self) -> &RouteNetwork {
        &self.routes
    }

    /// Economy parameters.
    pub const fn params(&self) -> &EconomyParams {
        &self.params
    }

    /// Route parameters.
    pub const fn route_params(&self) -> &RouteParams {
        &self.route_params
    }

    /// Cumulative inflation multiplier.
    pub const fn price_level(&self) -> f64 {
        self.price_level
    }

    /// Register a resource and list it in every existing market.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::DuplicateResource`] if the id is taken.
    pub fn register_resource(&mut self, resource: Resource) -> Result<(), EconomyError> {
        let id = resource.id.clone();
        let base = resource.base_value;
        let stock = resource.opening_stock(self.params.starting_stock);
        self.registry.register(resource)?;
        let mut listed = 0.0;
        for market in self.markets.values_mut() {
            market.list_resource(&id, base, stock);
            listed += stock;
        }
        if let Some(def) = self.registry.get_mut(&id) {
            def.supply += listed;
        }
        Ok(())
    }

    /// Open the market of a new civilization.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::DuplicateMarket`] if it already has one.
    pub fn add_market(&mut self, civ: CivId) -> Result<MarketId, EconomyError> {
        let id = MarketId::of(civ);
        if self.markets.contains_key(&id) {
            return Err(EconomyError::DuplicateMarket(civ));
        }
        let market = Market::new(civ, &self.registry, self.params.starting_stock);
        for (resource, stock) in market.stocks() {
            if let Some(def) = self.registry.get_mut(resource) {
                def.supply += *stock;
            }
        }
        self.markets.insert(id, market);
        tracing::info!(market = %id, "market opened");
        Ok(id)
    }

    /// Close a civilization's market, deactivating its routes.
    ///
    /// Returns the routes that were deactivated.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::UnknownMarket`] if there is no such market.
    pub fn remove_market(&mut self, civ: CivId) -> Result<Vec<RouteId>, EconomyError> {
        let id = MarketId::of(civ);
        let market = self.markets.remove(&id).ok_or(EconomyError::UnknownMarket(id))?;
        for (resource, stock) in market.stocks() {
            if let Some(def) = self.registry.get_mut(resource) {
                def.supply = (def.supply - stock).max(0.0);
            }
        }
        for other in self.markets.values_mut() {
            other.disconnect(id);
        }
        let closed = self.routes.deactivate_all_for(id);
        tracing::info!(market = %id, routes_closed = closed.len(), "market closed");
        Ok(closed)
    }

    /// Current price of a resource in a market.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::UnknownMarket`], [`EconomyError::UnknownResource`],
    /// or [`EconomyError::PriceNotFound`].
    pub fn resource_price(&self, market: MarketId, resource: &ResourceId) -> Result<f64, EconomyError> {
        let m = self.markets.get(&market).ok_or(EconomyError::UnknownMarket(market))?;
        if !self.registry.contains(resource) {
            return Err(EconomyError::UnknownResource(resource.clone()));
        }
        m.price(resource).ok_or_else(|| EconomyError::PriceNotFound {
            market,
            resource: resource.clone(),
        })
    }

    /// Route conditions for two civilizations at the given relation score.
    pub fn conditions_for(a: &CivProfile, b: &CivProfile, relation_score: f64) -> RouteConditions {
        RouteConditions {
            distance: a.distance_to(b),
            relation_score,
            shared_technology: a.shared_technology(b),
        }
    }

    /// Open a trade route between two markets.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::UnknownMarket`] for missing endpoints, plus
    /// the errors of [`RouteNetwork::create_route`].
    pub fn create_route(
        &mut self,
        a: MarketId,
        b: MarketId,
        conditions: RouteConditions,
    ) -> Result<RouteOpening, EconomyError> {
        for id in [a, b] {
            if !self.markets.contains_key(&id) {
                return Err(EconomyError::UnknownMarket(id));
            }
        }
        let opening = self.routes.create_route(a, b, conditions, &self.route_params)?;
        self.link(a, b);
        Ok(opening)
    }

    /// Open a trade route between two markets, or re-evaluate the one
    /// already active.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::UnknownMarket`] for missing endpoints, or
    /// [`EconomyError::SameMarket`].
    pub fn establish_route(
        &mut self,
        a: MarketId,
        b: MarketId,
        conditions: RouteConditions,
    ) -> Result<RouteOpening, EconomyError> {
        for id in [a, b] {
            if !self.markets.contains_key(&id) {
                return Err(EconomyError::UnknownMarket(id));
            }
        }
        let opening = self.routes.establish(a, b, conditions, &self.route_params)?;
        self.link(a, b);
        Ok(opening)
    }

    /// Open a route for every pair of markets that has never had one, is
    /// not at war, and whose condition-derived viability reaches
    /// `min_viability`. Returns one `RouteCreated` event per new route.
    ///
    /// Pairs with a deactivated route are left to the reactivation pass of
    /// the economic cycle.
    pub fn discover_routes(
        &mut self,
        profiles: &BTreeMap<CivId, CivProfile>,
        relations: &impl RelationView,
    ) -> Vec<SimEvent> {
        let traders: Vec<&CivProfile> = profiles
            .values()
            .filter(|p| self.markets.contains_key(&MarketId::of(p.id)))
            .collect();
        let mut viable = Vec::new();
        for (i, a) in traders.iter().enumerate() {
            for b in traders.iter().skip(i.saturating_add(1)) {
                let (source, destination) = (MarketId::of(a.id), MarketId::of(b.id));
                if self.routes.route_between(source, destination).is_some() || relations.at_war(a.id, b.id) {
                    continue;
                }
                let score = relations.score(a.id, b.id).unwrap_or(0.0);
                let conditions = Self::conditions_for(a, b, score);
                if conditions.evaluate(&self.route_params).viability() >= self.route_params.min_viability {
                    viable.push((source, destination, conditions));
                }
            }
        }

        let mut events = Vec::new();
        for (source, destination, conditions) in viable {
            match self.create_route(source, destination, conditions) {
                Ok(opening) => events.push(SimEvent::RouteCreated {
                    route: opening.id(),
                    source,
                    destination,
                }),
                Err(e) => tracing::warn!(source = %source, destination = %destination, error = %e, "route discovery failed"),
            }
        }
        events
    }

    /// Deactivate a route and unlink its markets.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::UnknownRoute`] for unknown ids.
    pub fn deactivate_route(&mut self, id: RouteId) -> Result<bool, EconomyError> {
        let was_active = self.routes.deactivate(id)?;
        if let Some(route) = self.routes.get(id) {
            let (a, b) = (route.source, route.destination);
            self.unlink(a, b);
        }
        Ok(was_active)
    }

    /// Execute an explicit trade.
    ///
    /// Validation happens before any mutation; payment is the first
    /// mutation and is itself all-or-nothing, so a failed trade changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::UnknownMarket`], [`EconomyError::SameMarket`],
    /// [`EconomyError::UnknownResource`], [`EconomyError::InvalidAmount`],
    /// [`EconomyError::NoRoute`], [`EconomyError::InsufficientSupply`], or a
    /// treasury error (insufficient funds).
    pub fn propose_trade(
        &mut self,
        treasury: &mut Treasury,
        cycle: u64,
        request: &TradeRequest,
    ) -> Result<TradeReceipt, EconomyError> {
        let TradeRequest {
            buyer,
            seller,
            resource,
            amount,
            unit_price,
        } = request;
        let (buyer, seller, amount) = (*buyer, *seller, *amount);

        if !self.markets.contains_key(&buyer) {
            return Err(EconomyError::UnknownMarket(buyer));
        }
        let seller_market = self
            .markets
            .get(&seller)
            .ok_or(EconomyError::UnknownMarket(seller))?;
        if buyer == seller {
            return Err(EconomyError::SameMarket(buyer));
        }
        if !self.registry.contains(resource) {
            return Err(EconomyError::UnknownResource(resource.clone()));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(EconomyError::InvalidAmount { amount });
        }
        if let Some(price) = *unit_price
            && !(price.is_finite() && price >= 0.0)
        {
            return Err(EconomyError::InvalidAmount { amount: price });
        }
        let route = self
            .routes
            .active_route_between(buyer, seller)
            .ok_or(EconomyError::NoRoute { buyer, seller })?;
        let unit_price = match *unit_price {
            Some(price) => price,
            None => seller_market
                .price(resource)
                .ok_or_else(|| EconomyError::PriceNotFound {
                    market: seller,
                    resource: resource.clone(),
                })?,
        };
        let available = seller_market.stock(resource);
        if available < amount {
            return Err(EconomyError::InsufficientSupply {
                market: seller,
                resource: resource.clone(),
                available,
                required: amount,
            });
        }

        let route_id = route.id;
        let total_cost = route.total_cost(unit_price, amount);
        let currency = to_currency(total_cost)?;
        if currency.is_sign_positive() && !currency.is_zero() {
            treasury.pay(cycle, buyer.owner(), seller.owner(), currency, "TRADE")?;
        }

        if let Some(m) = self.markets.get_mut(&seller) {
            m.take_stock(resource, amount);
            m.record_trade(resource, -amount);
        }
        if let Some(m) = self.markets.get_mut(&buyer) {
            m.add_stock(resource, amount);
            m.record_trade(resource, amount);
        }
        if let Some(r) = self.routes.get_mut(route_id) {
            r.record_trade(resource, amount);
        }

        tracing::debug!(
            route = %route_id,
            buyer = %buyer,
            seller = %seller,
            resource = %resource,
            amount,
            total_cost,
            "trade executed"
        );

        Ok(TradeReceipt {
            route: route_id,
            buyer,
            seller,
            resource: resource.clone(),
            amount,
            total_cost,
        })
    }

    /// Apply an economic effect to a civilization.
    ///
    /// Returns any events produced (stock changes).
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::UnknownResource`] for effects naming an
    /// unregistered resource.
    pub fn apply_effect(
        &mut self,
        profile: &mut CivProfile,
        effect: &EconomicEffect,
    ) -> Result<Vec<SimEvent>, EconomyError> {
        let market_id = MarketId::of(profile.id);
        let mut events = Vec::new();
        match effect {
            EconomicEffect::ProductionBonus {
                resource,
                source,
                amount,
            } => {
                self.require_resource(resource)?;
                let bonus = profile.bonuses.entry(resource.clone()).or_default();
                *bonus.source_mut(*source) += amount;
            }
            EconomicEffect::PopulationChange { delta } => {
                profile.population = profile.population.saturating_add_signed(*delta);
            }
            EconomicEffect::UnitChange { delta } => {
                profile.unit_count = profile.unit_count.saturating_add_signed(*delta);
            }
            EconomicEffect::GrantCapability { tag } => {
                profile.capabilities.insert(tag.clone());
            }
            EconomicEffect::StockGrant { resource, amount } => {
                self.require_resource(resource)?;
                let market = self
                    .markets
                    .get_mut(&market_id)
                    .ok_or(EconomyError::UnknownMarket(market_id))?;
                let moved = if *amount >= 0.0 {
                    market.add_stock(resource, *amount);
                    *amount
                } else {
                    -market.take_stock(resource, -amount)
                };
                let quantity = market.stock(resource);
                if let Some(def) = self.registry.get_mut(resource) {
                    def.supply = (def.supply + moved).max(0.0);
                }
                events.push(SimEvent::ResourceQuantityChanged {
                    market: market_id,
                    resource: resource.clone(),
                    quantity,
                });
            }
            EconomicEffect::StabilityShock { amount } => {
                self.markets
                    .get_mut(&market_id)
                    .ok_or(EconomyError::UnknownMarket(market_id))?
                    .shock_stability(*amount);
            }
        }
        tracing::debug!(civ = %profile.id, ?effect, "economic effect applied");
        Ok(events)
    }

    fn require_resource(&self, resource: &ResourceId) -> Result<(), EconomyError> {
        if self.registry.contains(resource) {
            Ok(())
        } else {
            Err(EconomyError::UnknownResource(resource.clone()))
        }
    }

    pub(crate) fn link(&mut self, a: MarketId, b: MarketId) {
        if let Some(m) = self.markets.get_mut(&a) {
            m.connect(b);
        }
        if let Some(m) = self.markets.get_mut(&b) {
            m.connect(a);
        }
    }

    pub(crate) fn unlink(&mut self, a: MarketId, b: MarketId) {
        if let Some(m) = self.markets.get_mut(&a) {
            m.disconnect(b);
        }
        if let Some(m) = self.markets.get_mut(&b) {
            m.disconnect(a);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use civitas_types::{BonusSource, TradeOutcome};

    use super::*;

    struct Fixture {
        economy: Economy,
        treasury: Treasury,
        rome: CivId,
        carthage: CivId,
    }

    fn fixture() -> Fixture {
        let mut economy = Economy::new(EconomyParams::default(), RouteParams::default());
        economy
            .register_resource(Resource::new("iron", 30.0).with_rates(1.0, 0.5))
            .unwrap();
        let mut treasury = Treasury::new();
        let rome = CivId::new();
        let carthage = CivId::new();
        for civ in [rome, carthage] {
            economy.add_market(civ).unwrap();
            treasury.open_account(0, civ, Decimal::new(10_000, 0)).unwrap();
        }
        Fixture {
            economy,
            treasury,
            rome,
            carthage,
        }
    }

    fn near() -> RouteConditions {
        RouteConditions {
            distance: 0.0,
            relation_score: 50.0,
            shared_technology: 1.0,
        }
    }

    fn buy(f: &Fixture, amount: f64) -> TradeRequest {
        TradeRequest::at_market(
            MarketId::of(f.rome),
            MarketId::of(f.carthage),
            ResourceId::from("iron"),
            amount,
        )
    }

    #[test]
    fn trade_without_route_is_rejected() {
        let mut f = fixture();
        let request = buy(&f, 5.0);
        let err = f.economy.propose_trade(&mut f.treasury, 1, &request).unwrap_err();
        assert_eq!(err.trade_outcome(), TradeOutcome::NoRoute);
    }

    #[test]
    fn zero_amount_is_invalid() {
        let mut f = fixture();
        f.economy
            .create_route(MarketId::of(f.rome), MarketId::of(f.carthage), near())
            .unwrap();
        let request = buy(&f, 0.0);
        let err = f.economy.propose_trade(&mut f.treasury, 1, &request).unwrap_err();
        assert_eq!(err.trade_outcome(), TradeOutcome::InvalidRequest);
    }

    #[test]
    fn trade_moves_stock_and_money() {
        let mut f = fixture();
        f.economy
            .create_route(MarketId::of(f.rome), MarketId::of(f.carthage), near())
            .unwrap();
        let request = buy(&f, 10.0);
        let receipt = f.economy.propose_trade(&mut f.treasury, 1, &request).unwrap();

        let iron = ResourceId::from("iron");
        let rome = f.economy.market(MarketId::of(f.rome)).unwrap();
        let carthage = f.economy.market(MarketId::of(f.carthage)).unwrap();
        assert!((rome.stock(&iron) - 110.0).abs() < 1e-9);
        assert!((carthage.stock(&iron) - 90.0).abs() < 1e-9);
        assert!((rome.trade_volume(&iron) - 10.0).abs() < 1e-9);
        assert!((carthage.trade_volume(&iron) + 10.0).abs() < 1e-9);
        // risk 0.05 at zero distance: (30 + 0 + 30 * 0.05) * 10
        assert!((receipt.total_cost - 315.0).abs() < 1e-9);
        assert_eq!(f.treasury.balance(f.carthage), Some(Decimal::new(10_315, 0)));
        assert!(f.treasury.verify_conservation().is_balanced());
    }

    #[test]
    fn agreed_price_replaces_market_price() {
        let mut f = fixture();
        f.economy
            .create_route(MarketId::of(f.rome), MarketId::of(f.carthage), near())
            .unwrap();
        let request = TradeRequest {
            unit_price: Some(20.0),
            ..buy(&f, 10.0)
        };
        let receipt = f.economy.propose_trade(&mut f.treasury, 1, &request).unwrap();
        // (20 + 0 + 20 * 0.05) * 10
        assert!((receipt.total_cost - 210.0).abs() < 1e-9);

        let negative = TradeRequest {
            unit_price: Some(-1.0),
            ..buy(&f, 10.0)
        };
        let err = f.economy.propose_trade(&mut f.treasury, 1, &negative).unwrap_err();
        assert_eq!(err.trade_outcome(), TradeOutcome::InvalidRequest);
    }

    #[test]
    fn oversized_trade_changes_nothing() {
        let mut f = fixture();
        f.economy
            .create_route(MarketId::of(f.rome), MarketId::of(f.carthage), near())
            .unwrap();
        let request = buy(&f, 500.0);
        let err = f.economy.propose_trade(&mut f.treasury, 1, &request).unwrap_err();

        assert_eq!(err.trade_outcome(), TradeOutcome::InsufficientSupply);
        let iron = ResourceId::from("iron");
        let carthage = f.economy.market(MarketId::of(f.carthage)).unwrap();
        assert!((carthage.stock(&iron) - 100.0).abs() < 1e-9);
        assert_eq!(f.treasury.balance(f.rome), Some(Decimal::new(10_000, 0)));
    }

    #[test]
    fn unaffordable_trade_changes_nothing() {
        let mut f = fixture();
        f.economy
            .create_route(MarketId::of(f.rome), MarketId::of(f.carthage), near())
            .unwrap();
        f.treasury
            .burn(1, f.rome, Decimal::new(9_990, 0), "TEST")
            .unwrap();
        let request = buy(&f, 10.0);
        let err = f.economy.propose_trade(&mut f.treasury, 1, &request).unwrap_err();

        assert_eq!(err.trade_outcome(), TradeOutcome::InsufficientFunds);
        let iron = ResourceId::from("iron");
        assert!(f.economy.market(MarketId::of(f.rome)).unwrap().trade_volume(&iron).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_resource_is_reported() {
        let mut f = fixture();
        let mut request = buy(&f, 1.0);
        request.resource = ResourceId::from("spice");
        let err = f.economy.propose_trade(&mut f.treasury, 1, &request).unwrap_err();
        assert_eq!(err.trade_outcome(), TradeOutcome::InvalidResource);
    }

    #[test]
    fn price_query_never_defaults() {
        let f = fixture();
        let market = MarketId::of(f.rome);
        assert!((f.economy.resource_price(market, &ResourceId::from("iron")).unwrap() - 30.0).abs() < f64::EPSILON);
        assert!(f.economy.resource_price(market, &ResourceId::from("spice")).is_err());
        assert!(f.economy.resource_price(MarketId::new(), &ResourceId::from("iron")).is_err());
    }

    #[test]
    fn late_resource_is_listed_everywhere() {
        let mut f = fixture();
        f.economy.register_resource(Resource::new("silk", 80.0)).unwrap();
        for market in f.economy.markets().values() {
            assert_eq!(market.prices().len(), 2);
        }
    }

    #[test]
    fn world_supply_is_the_sum_of_market_stocks() {
        let mut f = fixture();
        f.economy
            .register_resource(Resource::new("grain", 4.0).with_starting_stock(250.0))
            .unwrap();
        f.economy.add_market(CivId::new()).unwrap();

        for id in ["iron", "grain"] {
            let resource = ResourceId::from(id);
            let stocked: f64 = f.economy.markets().values().map(|m| m.stock(&resource)).sum();
            let supply = f.economy.registry().get(&resource).unwrap().supply;
            assert!((supply - stocked).abs() < 1e-9, "{id}: {supply} vs {stocked}");
        }
        let grain = ResourceId::from("grain");
        assert!((f.economy.registry().get(&grain).unwrap().supply - 750.0).abs() < 1e-9);
    }

    #[test]
    fn removing_market_unlinks_routes() {
        let mut f = fixture();
        let (a, b) = (MarketId::of(f.rome), MarketId::of(f.carthage));
        f.economy.create_route(a, b, near()).unwrap();
        assert!(f.economy.market(a).unwrap().connected_markets().contains(&b));

        let closed = f.economy.remove_market(f.carthage).unwrap();
        assert_eq!(closed.len(), 1);
        assert!(f.economy.market(a).unwrap().connected_markets().is_empty());
        assert_eq!(f.economy.routes().active_count(), 0);
    }

    #[test]
    fn effects_update_profile_and_market() {
        let mut f = fixture();
        let mut profile = CivProfile::new("Rome");
        profile.id = f.rome;
        let iron = ResourceId::from("iron");

        f.economy
            .apply_effect(
                &mut profile,
                &EconomicEffect::ProductionBonus {
                    resource: iron.clone(),
                    source: BonusSource::Technology,
                    amount: 0.1,
                },
            )
            .unwrap();
        f.economy
            .apply_effect(&mut profile, &EconomicEffect::PopulationChange { delta: -5 })
            .unwrap();
        let events = f
            .economy
            .apply_effect(
                &mut profile,
                &EconomicEffect::StockGrant {
                    resource: iron.clone(),
                    amount: -150.0,
                },
            )
            .unwrap();

        assert!((profile.production_bonus(&iron) - 0.1).abs() < 1e-12);
        assert_eq!(profile.population, 0);
        assert_eq!(events.len(), 1);
        assert!(f.economy.market(MarketId::of(f.rome)).unwrap().stock(&iron).abs() < f64::EPSILON);
    }
}
