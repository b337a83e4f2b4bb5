//! The simulation context.
//!
//! A [`Simulation`] owns every piece of world state: the clock and both
//! cycle schedulers, civilization profiles, the economy (registry, markets,
//! routes), the treasury, the relation graph, the action catalog, the
//! seeded random source, and the event bus. Nothing is global; callers
//! hold the context and pass it explicitly.
//!
//! # Cycle Order
//!
//! [`Simulation::advance`] moves the clock and runs whatever cycles became
//! due, economic cycles first:
//!
//! 1. **Income** -- every civilization earns `income_rate * dt`
//! 2. **Economy** -- production, consumption, markets, routes, pricing
//! 3. **Diplomacy** -- drift, incident aging, agreement compliance
//!
//! Each finished cycle publishes a `CycleCompleted` event.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use civitas_diplomacy::{
    ActionCatalog, ActionDef, AgreementTerm, Delivery, Evaluation, Proposal, RelationGraph, Resolution,
    SideEffect, WeightedDrift, WorldView, evaluate, propose_action,
};
use civitas_economy::{
    CycleInputs, EconomicEffect, Economy, Resource, RouteOpening, TradeReceipt, TradeRequest,
};
use civitas_treasury::{ConservationResult, Treasury, to_currency};
use civitas_types::{
    ActionId, AgreementId, AgreementKind, CivId, CivProfile, CycleKind, DiplomaticOutcome, IncidentCategory,
    MarketId, ResourceId, RouteId, SimEvent, TradeOutcome,
};

use crate::clock::WorldClock;
use crate::config::CivitasConfig;
use crate::error::SimulationError;
use crate::events::{EventBus, EventSubscriber};
use crate::scheduler::CycleScheduler;
use crate::snapshot::WorldSnapshot;

/// Ledger reason for per-cycle income.
const INCOME_REASON: &str = "INCOME";

/// Ledger reason for the cost of a diplomatic action.
const DIPLOMACY_REASON: &str = "DIPLOMATIC_ACTION";

/// What one call to [`Simulation::advance`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Economic cycles executed.
    pub economic_cycles: u32,
    /// Diplomacy cycles executed.
    pub diplomacy_cycles: u32,
    /// Events published during the advance.
    pub events: u64,
}

/// The whole simulated world.
#[derive(Debug)]
pub struct Simulation {
    name: String,
    clock: WorldClock,
    economic: CycleScheduler,
    diplomatic: CycleScheduler,
    profiles: BTreeMap<CivId, CivProfile>,
    economy: Economy,
    treasury: Treasury,
    relations: RelationGraph,
    catalog: ActionCatalog,
    drift: WeightedDrift,
    rng: StdRng,
    bus: EventBus,
    starting_balance: Decimal,
}

/// [`WorldView`] over the parts of a [`Simulation`] diplomacy reads.
struct WorldContext<'a> {
    profiles: &'a BTreeMap<CivId, CivProfile>,
    economy: &'a Economy,
    treasury: &'a Treasury,
}

impl WorldView for WorldContext<'_> {
    fn profile(&self, civ: CivId) -> Option<&CivProfile> {
        self.profiles.get(&civ)
    }

    fn trade_volume(&self, a: CivId, b: CivId) -> f64 {
        self.economy
            .routes()
            .route_between(MarketId::of(a), MarketId::of(b))
            .map_or(0.0, |route| route.trade_volume.values().sum())
    }

    fn route_risk(&self, a: CivId, b: CivId) -> Option<f64> {
        self.economy
            .routes()
            .active_route_between(MarketId::of(a), MarketId::of(b))
            .map(|route| route.risk)
    }

    fn can_afford(&self, civ: CivId, amount: f64) -> bool {
        if amount <= 0.0 {
            return self.treasury.has_account(civ);
        }
        to_currency(amount).is_ok_and(|amount| self.treasury.can_afford(civ, amount))
    }
}

impl Simulation {
    /// Build a world from configuration: register resources and actions,
    /// found every configured civilization in order, then open a route
    /// between every viable pair of markets.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Config`] for invalid configuration,
    /// [`SimulationError::UnknownName`] when shared history names a
    /// civilization not founded earlier, or any subsystem error raised
    /// while seeding.
    pub fn new(config: &CivitasConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let world = &config.world;

        let mut economy = Economy::new(config.economy.clone(), config.routes.clone());
        for spec in &config.resources {
            economy.register_resource(Resource::from(spec.clone()))?;
        }
        let mut catalog = ActionCatalog::new();
        for action in &config.actions {
            catalog.register(action.clone())?;
        }

        let mut sim = Self {
            name: world.name.clone(),
            clock: WorldClock::new(world)?,
            economic: CycleScheduler::new(
                CycleKind::Economic,
                millis_to_seconds(world.economic_interval_ms),
                world.max_catch_up_cycles,
            )?,
            diplomatic: CycleScheduler::new(
                CycleKind::Diplomatic,
                millis_to_seconds(world.diplomacy_interval_ms),
                world.max_catch_up_cycles,
            )?,
            profiles: BTreeMap::new(),
            economy,
            treasury: Treasury::new(),
            relations: RelationGraph::new(config.diplomacy.clone()),
            catalog,
            drift: WeightedDrift::new(config.diplomacy.drift),
            rng: StdRng::seed_from_u64(world.seed),
            bus: EventBus::default(),
            starting_balance: to_currency(config.treasury.starting_balance)?,
        };

        let mut founded: BTreeMap<&str, CivId> = BTreeMap::new();
        for spec in &config.civilizations {
            let mut history = BTreeMap::new();
            for (name, value) in &spec.shared_history {
                let other = founded
                    .get(name.as_str())
                    .ok_or_else(|| SimulationError::UnknownName(name.clone()))?;
                history.insert(*other, *value);
            }
            let balance = match spec.starting_balance {
                Some(value) => to_currency(value)?,
                None => sim.starting_balance,
            };
            let civ = sim.found(spec.to_profile(), &history, balance)?;
            founded.insert(spec.name.as_str(), civ);
        }
        let opened = sim.economy.discover_routes(&sim.profiles, &sim.relations);
        let routes = opened.len();
        sim.bus.publish_all(opened);

        info!(
            world = %sim.name,
            seed = world.seed,
            resources = sim.economy.registry().len(),
            actions = sim.catalog.len(),
            civilizations = sim.profiles.len(),
            routes,
            "simulation initialized"
        );
        Ok(sim)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// World name from configuration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The logical clock.
    pub const fn clock(&self) -> &WorldClock {
        &self.clock
    }

    /// Registry, markets, and routes.
    pub const fn economy(&self) -> &Economy {
        &self.economy
    }

    /// Accounts and ledger.
    pub const fn treasury(&self) -> &Treasury {
        &self.treasury
    }

    /// The relation graph.
    pub const fn relations(&self) -> &RelationGraph {
        &self.relations
    }

    /// The action catalog.
    pub const fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    /// Every living civilization.
    pub const fn profiles(&self) -> &BTreeMap<CivId, CivProfile> {
        &self.profiles
    }

    /// One civilization's profile.
    pub fn profile(&self, civ: CivId) -> Option<&CivProfile> {
        self.profiles.get(&civ)
    }

    /// Look a civilization up by display name.
    pub fn civilization_by_name(&self, name: &str) -> Option<CivId> {
        self.profiles.values().find(|p| p.name == name).map(|p| p.id)
    }

    /// Check treasury balances against the ledger.
    pub fn verify_conservation(&self) -> ConservationResult {
        self.treasury.verify_conservation()
    }

    /// A serializable copy of the whole world.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self)
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Register a subscriber that sees every event as it is published.
    pub fn subscribe(&mut self, subscriber: Box<dyn EventSubscriber>) {
        self.bus.subscribe(subscriber);
    }

    /// Take every buffered event, oldest first.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.bus.drain()
    }

    /// Number of buffered events.
    pub fn pending_events(&self) -> usize {
        self.bus.pending()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Current price of a resource in a market.
    ///
    /// # Errors
    ///
    /// Returns an economy error for unknown markets or resources.
    pub fn resource_price(&self, market: MarketId, resource: &ResourceId) -> Result<f64, SimulationError> {
        Ok(self.economy.resource_price(market, resource)?)
    }

    /// Relationship score between two civilizations, in `[-100, 100]`.
    ///
    /// # Errors
    ///
    /// Returns a diplomacy `NoRelation` error when the pair has no relation.
    pub fn relationship_score(&self, a: CivId, b: CivId) -> Result<f64, SimulationError> {
        self.relations
            .score(a, b)
            .ok_or_else(|| civitas_diplomacy::DiplomacyError::NoRelation { a, b }.into())
    }

    /// Success chance of an action without resolving it.
    ///
    /// # Errors
    ///
    /// Returns a diplomacy error for unknown actions or missing relations.
    pub fn evaluate_action(&self, from: CivId, to: CivId, action: &ActionId) -> Result<Evaluation, SimulationError> {
        let proposal = Proposal {
            from,
            to,
            action: action.clone(),
        };
        let world = WorldContext {
            profiles: &self.profiles,
            economy: &self.economy,
            treasury: &self.treasury,
        };
        Ok(evaluate(&self.relations, &self.catalog, &proposal, &world, self.clock.days())?)
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Trade `amount` of `resource` from `seller` to `buyer`.
    pub fn propose_trade(
        &mut self,
        buyer: MarketId,
        seller: MarketId,
        resource: &ResourceId,
        amount: f64,
    ) -> TradeOutcome {
        let request = TradeRequest::at_market(buyer, seller, resource.clone(), amount);
        self.submit_trade(&request)
    }

    pub(crate) fn submit_trade(&mut self, request: &TradeRequest) -> TradeOutcome {
        match self.execute_trade(request) {
            Ok(_) => TradeOutcome::Success,
            Err(e) => {
                debug!(
                    buyer = %request.buyer,
                    seller = %request.seller,
                    resource = %request.resource,
                    amount = request.amount,
                    error = %e,
                    "trade rejected"
                );
                e.trade_outcome()
            }
        }
    }

    /// Execute a trade and return its receipt.
    ///
    /// # Errors
    ///
    /// Returns the economy error that rejected the trade; nothing changes
    /// in that case.
    pub fn execute_trade(&mut self, request: &TradeRequest) -> Result<TradeReceipt, SimulationError> {
        let cycle = self.clock.cycle(CycleKind::Economic);
        let receipt = self.economy.propose_trade(&mut self.treasury, cycle, request)?;
        self.publish_trade(&receipt);
        Ok(receipt)
    }

    fn publish_trade(&mut self, receipt: &TradeReceipt) {
        self.bus.publish(receipt.to_event());
        for market in [receipt.seller, receipt.buyer] {
            if let Some(m) = self.economy.market(market) {
                self.bus.publish(SimEvent::ResourceQuantityChanged {
                    market,
                    resource: receipt.resource.clone(),
                    quantity: m.stock(&receipt.resource),
                });
            }
        }
    }

    /// Sign a trade agreement that ships `delivery.quantity` units from
    /// seller to buyer at the agreed unit price on each of the next
    /// `delivery.cycles` economic cycles. A route between the two markets
    /// is opened if none is active.
    ///
    /// A shipment that cannot be made ends the agreement as breached.
    ///
    /// # Errors
    ///
    /// Returns a diplomacy error for an invalid delivery or a missing
    /// relation, [`SimulationError::UnknownCivilization`] for either side,
    /// or an economy error for an unknown resource.
    pub fn create_trade_agreement(&mut self, delivery: Delivery) -> Result<AgreementId, SimulationError> {
        delivery.validate()?;
        for civ in [delivery.seller, delivery.buyer] {
            if !self.profiles.contains_key(&civ) {
                return Err(SimulationError::UnknownCivilization(civ));
            }
        }
        if !self.economy.registry().contains(&delivery.resource) {
            return Err(civitas_economy::EconomyError::UnknownResource(delivery.resource).into());
        }

        let (seller, buyer) = (delivery.seller, delivery.buyer);
        let (resource, quantity, cycles) = (delivery.resource.clone(), delivery.quantity, delivery.cycles);
        let (agreement, event) = self.relations.create_agreement(
            AgreementKind::Trade,
            &[seller, buyer],
            vec![AgreementTerm::Delivery(delivery)],
            self.clock.days(),
        )?;
        self.bus.publish(event);
        if let Err(e) = self.open_trade_route(seller, buyer) {
            warn!(agreement = %agreement, error = %e, "no route for trade agreement");
        }
        info!(
            agreement = %agreement,
            seller = %seller,
            buyer = %buyer,
            resource = %resource,
            quantity,
            cycles,
            "trade agreement signed"
        );
        Ok(agreement)
    }

    /// Propose a diplomatic action from one civilization to another.
    pub fn propose_diplomatic_action(&mut self, from: CivId, to: CivId, action: &ActionId) -> DiplomaticOutcome {
        match self.resolve_action(from, to, action) {
            Ok(resolution) => resolution.outcome,
            Err(e) => {
                debug!(from = %from, to = %to, action = %action, error = %e, "diplomatic proposal rejected");
                e.diplomatic_outcome()
            }
        }
    }

    /// Resolve a diplomatic action and apply its side effects.
    ///
    /// # Errors
    ///
    /// Returns a diplomacy error for unknown actions or missing relations;
    /// nothing is recorded in that case.
    pub fn resolve_action(&mut self, from: CivId, to: CivId, action: &ActionId) -> Result<Resolution, SimulationError> {
        let proposal = Proposal {
            from,
            to,
            action: action.clone(),
        };
        let world = WorldContext {
            profiles: &self.profiles,
            economy: &self.economy,
            treasury: &self.treasury,
        };
        let resolution = propose_action(
            &mut self.relations,
            &self.catalog,
            &proposal,
            &world,
            &mut self.rng,
            self.clock.days(),
        )?;
        self.bus.publish_all(resolution.events.iter().cloned());
        for effect in &resolution.side_effects {
            if let Err(e) = self.apply_side_effect(effect) {
                warn!(?effect, error = %e, "side effect could not be applied");
            }
        }
        info!(
            from = %from,
            to = %to,
            action = %action,
            outcome = ?resolution.outcome,
            chance = resolution.evaluation.chance,
            "diplomatic action resolved"
        );
        Ok(resolution)
    }

    /// Report an incident between two civilizations.
    ///
    /// # Errors
    ///
    /// Returns a diplomacy error if the pair has no relation.
    pub fn record_incident(
        &mut self,
        a: CivId,
        b: CivId,
        tag: &str,
        category: IncidentCategory,
        impact: f64,
    ) -> Result<(), SimulationError> {
        let events = self
            .relations
            .record_incident(a, b, tag, category, impact, self.clock.days())?;
        self.bus.publish_all(events);
        Ok(())
    }

    /// Add a diplomatic action to the catalog.
    ///
    /// # Errors
    ///
    /// Returns a diplomacy error if the id is taken.
    pub fn register_action(&mut self, action: ActionDef) -> Result<(), SimulationError> {
        Ok(self.catalog.register(action)?)
    }

    /// Open (or re-evaluate) the trade route between two civilizations'
    /// markets.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::UnknownCivilization`] for either side, or
    /// an economy error.
    pub fn open_trade_route(&mut self, a: CivId, b: CivId) -> Result<RouteId, SimulationError> {
        let first = self.profiles.get(&a).ok_or(SimulationError::UnknownCivilization(a))?;
        let second = self.profiles.get(&b).ok_or(SimulationError::UnknownCivilization(b))?;
        let score = self.relations.score(a, b).unwrap_or(0.0);
        let conditions = Economy::conditions_for(first, second, score);

        let (source, destination) = (MarketId::of(a), MarketId::of(b));
        let opening = self.economy.establish_route(source, destination, conditions)?;
        match opening {
            RouteOpening::Created(route) => self.bus.publish(SimEvent::RouteCreated {
                route,
                source,
                destination,
            }),
            RouteOpening::Reactivated(route) => self.bus.publish(SimEvent::RouteReactivated { route }),
            RouteOpening::Refreshed(_) => {}
        }
        Ok(opening.id())
    }

    /// Close a trade route. History stays queryable.
    ///
    /// # Errors
    ///
    /// Returns an economy error for unknown routes.
    pub fn close_trade_route(&mut self, route: RouteId) -> Result<(), SimulationError> {
        if self.economy.deactivate_route(route)? {
            self.bus.publish(SimEvent::RouteDeactivated { route });
        }
        Ok(())
    }

    /// Apply an economic effect to a civilization.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::UnknownCivilization`] or an economy error.
    pub fn apply_effect(&mut self, civ: CivId, effect: &EconomicEffect) -> Result<(), SimulationError> {
        let profile = self
            .profiles
            .get_mut(&civ)
            .ok_or(SimulationError::UnknownCivilization(civ))?;
        let events = self.economy.apply_effect(profile, effect)?;
        self.bus.publish_all(events);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Found a civilization with the configured starting balance and no
    /// shared history.
    ///
    /// # Errors
    ///
    /// See [`Self::add_civilization_with_history`].
    pub fn add_civilization(&mut self, profile: CivProfile) -> Result<CivId, SimulationError> {
        self.add_civilization_with_history(profile, &BTreeMap::new())
    }

    /// Found a civilization: create its market, treasury account, and a
    /// relation with every living civilization. `shared_history` holds a
    /// value in `[-1, 1]` per existing civilization.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::DuplicateName`] or a duplicate error
    /// from a subsystem when the civilization already exists.
    pub fn add_civilization_with_history(
        &mut self,
        profile: CivProfile,
        shared_history: &BTreeMap<CivId, f64>,
    ) -> Result<CivId, SimulationError> {
        let balance = self.starting_balance;
        self.found(profile, shared_history, balance)
    }

    fn found(
        &mut self,
        profile: CivProfile,
        shared_history: &BTreeMap<CivId, f64>,
        balance: Decimal,
    ) -> Result<CivId, SimulationError> {
        let civ = profile.id;
        if self.profiles.contains_key(&civ) || self.relations.contains(civ) {
            return Err(civitas_diplomacy::DiplomacyError::DuplicateCivilization(civ).into());
        }
        if self.profiles.values().any(|p| p.name == profile.name) {
            return Err(SimulationError::DuplicateName(profile.name));
        }

        let cycle = self.clock.cycle(CycleKind::Economic);
        self.economy.add_market(civ)?;
        if let Err(e) = self.treasury.open_account(cycle, civ, balance) {
            if let Err(cleanup) = self.economy.remove_market(civ) {
                warn!(civ = %civ, error = %cleanup, "market rollback failed");
            }
            return Err(e.into());
        }
        let world = WorldContext {
            profiles: &self.profiles,
            economy: &self.economy,
            treasury: &self.treasury,
        };
        let relations = self
            .relations
            .add_civilization(&profile, &world, shared_history, self.clock.days())?;

        let name = profile.name.clone();
        self.profiles.insert(civ, profile);
        info!(civ = %civ, name = %name, relations, balance = %balance, "civilization founded");
        self.bus.publish(SimEvent::CivilizationAdded { civ, name });
        Ok(civ)
    }

    /// Destroy a civilization: remove its market and account, deactivate
    /// its routes, and drop its relations. Agreements it signed end on the
    /// next diplomacy cycle.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::UnknownCivilization`] if not alive.
    pub fn remove_civilization(&mut self, civ: CivId) -> Result<(), SimulationError> {
        let profile = self
            .profiles
            .remove(&civ)
            .ok_or(SimulationError::UnknownCivilization(civ))?;
        let cycle = self.clock.cycle(CycleKind::Economic);

        let closed = self.economy.remove_market(civ)?;
        let burned = self.treasury.close_account(cycle, civ)?;
        let relations = self.relations.remove_civilization(civ)?;

        info!(
            civ = %civ,
            name = %profile.name,
            routes_closed = closed.len(),
            relations_removed = relations,
            burned = %burned,
            "civilization removed"
        );
        self.bus
            .publish_all(closed.into_iter().map(|route| SimEvent::RouteDeactivated { route }));
        self.bus.publish(SimEvent::CivilizationRemoved { civ });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Advance simulated time and run every cycle that became due.
    ///
    /// At most `max_catch_up_cycles` cycles of each kind run per call.
    ///
    /// # Errors
    ///
    /// Returns the first error a cycle raises. Cycles already completed
    /// stay applied.
    pub fn advance(&mut self, elapsed_seconds: f64) -> Result<AdvanceReport, SimulationError> {
        let published_before = self.bus.published();
        self.clock.advance(elapsed_seconds);

        let economic_cycles = self.economic.accumulate(elapsed_seconds);
        for _ in 0..economic_cycles {
            self.run_economic_cycle()?;
        }
        let diplomacy_cycles = self.diplomatic.accumulate(elapsed_seconds);
        for _ in 0..diplomacy_cycles {
            self.run_diplomacy_cycle()?;
        }

        Ok(AdvanceReport {
            economic_cycles,
            diplomacy_cycles,
            events: self.bus.published().saturating_sub(published_before),
        })
    }

    /// Run one economic cycle immediately. Returns its number.
    ///
    /// # Errors
    ///
    /// Returns clock overflow or an economy error.
    pub fn run_economic_cycle(&mut self) -> Result<u64, SimulationError> {
        self.economic.begin();
        let result = self.economic_pass();
        self.economic.finish();
        result
    }

    fn economic_pass(&mut self) -> Result<u64, SimulationError> {
        let cycle = self.clock.next_cycle(CycleKind::Economic)?;
        let dt = self.economic.interval();
        self.collect_income(cycle, dt);

        let inputs = CycleInputs {
            cycle,
            dt,
            profiles: &self.profiles,
        };
        let events = self
            .economy
            .run_cycle(&inputs, &mut self.treasury, &self.relations, &mut self.rng)?;
        let event_count = events.len();
        self.bus.publish_all(events);
        self.run_deliveries(cycle);
        self.bus.publish(SimEvent::CycleCompleted {
            kind: CycleKind::Economic,
            cycle,
        });
        debug!(cycle, events = event_count, "economic cycle published");
        Ok(cycle)
    }

    fn run_deliveries(&mut self, cycle: u64) {
        for (agreement, delivery) in self.relations.pending_deliveries() {
            let request = TradeRequest {
                unit_price: Some(delivery.unit_price),
                ..TradeRequest::at_market(
                    MarketId::of(delivery.buyer),
                    MarketId::of(delivery.seller),
                    delivery.resource.clone(),
                    delivery.quantity,
                )
            };
            match self.economy.propose_trade(&mut self.treasury, cycle, &request) {
                Ok(receipt) => {
                    self.publish_trade(&receipt);
                    match self.relations.record_delivery(agreement) {
                        Ok(ended) => self.bus.publish_all(ended),
                        Err(e) => warn!(agreement = %agreement, error = %e, "delivery not recorded"),
                    }
                }
                Err(e) => {
                    warn!(agreement = %agreement, cycle, error = %e, "delivery failed, agreement breached");
                    match self.relations.breach_agreement(agreement, self.clock.days()) {
                        Ok(events) => self.bus.publish_all(events),
                        Err(e) => warn!(agreement = %agreement, error = %e, "breach not recorded"),
                    }
                }
            }
        }
    }

    fn collect_income(&mut self, cycle: u64, dt: f64) {
        for profile in self.profiles.values() {
            if profile.income_rate <= 0.0 {
                continue;
            }
            let minted = to_currency(profile.income_rate * dt)
                .map_err(SimulationError::from)
                .and_then(|amount| {
                    if amount > Decimal::ZERO {
                        self.treasury.mint(cycle, profile.id, amount, INCOME_REASON)?;
                    }
                    Ok(())
                });
            if let Err(e) = minted {
                warn!(civ = %profile.id, cycle, error = %e, "income not paid");
            }
        }
    }

    /// Run one diplomacy cycle immediately. Returns its number.
    ///
    /// # Errors
    ///
    /// Returns clock overflow.
    pub fn run_diplomacy_cycle(&mut self) -> Result<u64, SimulationError> {
        self.diplomatic.begin();
        let result = self.diplomacy_pass();
        self.diplomatic.finish();
        result
    }

    fn diplomacy_pass(&mut self) -> Result<u64, SimulationError> {
        let cycle = self.clock.next_cycle(CycleKind::Diplomatic)?;
        let now = self.clock.days();
        let world = WorldContext {
            profiles: &self.profiles,
            economy: &self.economy,
            treasury: &self.treasury,
        };
        let events = self.relations.decay_cycle(now, &world, &self.drift);
        let event_count = events.len();
        self.bus.publish_all(events);
        self.bus.publish(SimEvent::CycleCompleted {
            kind: CycleKind::Diplomatic,
            cycle,
        });
        debug!(
            cycle,
            day = now,
            events = event_count,
            active_agreements = self.relations.active_agreement_count(),
            "diplomacy cycle published"
        );
        Ok(cycle)
    }

    fn apply_side_effect(&mut self, effect: &SideEffect) -> Result<(), SimulationError> {
        match effect {
            SideEffect::ChargeCost { civ, amount } => {
                let amount = to_currency(*amount)?;
                if amount > Decimal::ZERO {
                    let cycle = self.clock.cycle(CycleKind::Economic);
                    self.treasury.burn(cycle, *civ, amount, DIPLOMACY_REASON)?;
                }
            }
            SideEffect::OpenTradeRoute { a, b } => {
                self.open_trade_route(*a, *b)?;
            }
        }
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn millis_to_seconds(ms: u64) -> f64 {
    ms as f64 / 1_000.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use civitas_types::Position;

    use super::*;
    use crate::config::CivilizationSpec;

    fn civ(name: &str, x: f64) -> CivilizationSpec {
        CivilizationSpec {
            name: name.to_owned(),
            population: 1_000,
            unit_count: 10,
            capabilities: ["agriculture", "market", "roads"].into_iter().map(str::to_owned).collect(),
            culture_traits: ["river".to_owned()].into_iter().collect(),
            position: Position { x, y: 0.0 },
            income_rate: 1.0,
            starting_balance: None,
            shared_history: BTreeMap::new(),
        }
    }

    fn two_civ_world() -> Simulation {
        let config = CivitasConfig {
            civilizations: vec![civ("Egypt", 0.0), civ("Babylon", 20.0)],
            ..CivitasConfig::default()
        };
        Simulation::new(&config).unwrap()
    }

    #[test]
    fn seeding_creates_markets_accounts_and_relations() {
        let sim = two_civ_world();
        let egypt = sim.civilization_by_name("Egypt").unwrap();
        let babylon = sim.civilization_by_name("Babylon").unwrap();
        assert_eq!(sim.economy().markets().len(), 2);
        assert_eq!(sim.treasury().balance(egypt), Some(Decimal::from(1_000)));
        assert!(sim.relationship_score(egypt, babylon).is_ok());
        assert!(sim.verify_conservation().is_balanced());
    }

    #[test]
    fn unknown_history_name_rejected() {
        let mut later = civ("Assyria", 0.0);
        later.shared_history.insert("Hittites".to_owned(), 0.5);
        let config = CivitasConfig {
            civilizations: vec![later],
            ..CivitasConfig::default()
        };
        assert!(matches!(
            Simulation::new(&config),
            Err(SimulationError::UnknownName(name)) if name == "Hittites"
        ));
    }

    #[test]
    fn duplicate_name_rejected_at_runtime() {
        let mut sim = two_civ_world();
        let result = sim.add_civilization(CivProfile::new("Egypt"));
        assert!(matches!(result, Err(SimulationError::DuplicateName(_))));
        assert_eq!(sim.profiles().len(), 2);
    }

    #[test]
    fn advance_runs_due_cycles_and_pays_income() {
        let mut sim = two_civ_world();
        let egypt = sim.civilization_by_name("Egypt").unwrap();
        sim.drain_events();

        let report = sim.advance(5.0).unwrap();
        assert_eq!(report.economic_cycles, 5);
        assert_eq!(report.diplomacy_cycles, 1);
        assert!(sim.treasury().balance(egypt).unwrap() >= Decimal::from(1_000));
        assert!(sim.verify_conservation().is_balanced());

        let completed = sim
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SimEvent::CycleCompleted { .. }))
            .count();
        assert_eq!(completed, 6);
    }

    /// Two civilizations no route is good enough to open on its own.
    fn isolated_world() -> Simulation {
        let mut config = CivitasConfig {
            civilizations: vec![civ("Egypt", 0.0), civ("Babylon", 20.0)],
            ..CivitasConfig::default()
        };
        config.routes.min_viability = 1.0;
        Simulation::new(&config).unwrap()
    }

    #[test]
    fn seeding_opens_viable_routes() {
        let mut sim = two_civ_world();
        let egypt = sim.civilization_by_name("Egypt").unwrap();
        let babylon = sim.civilization_by_name("Babylon").unwrap();

        assert_eq!(sim.economy().routes().active_count(), 1);
        let route = sim
            .economy()
            .routes()
            .active_route_between(MarketId::of(egypt), MarketId::of(babylon))
            .unwrap()
            .id;
        assert!(sim
            .drain_events()
            .iter()
            .any(|e| matches!(e, SimEvent::RouteCreated { route: r, .. } if *r == route)));

        let isolated = isolated_world();
        assert_eq!(isolated.economy().routes().active_count(), 0);
    }

    #[test]
    fn nan_volatility_is_rejected_before_any_cycle() {
        let mut config = CivitasConfig {
            civilizations: vec![civ("Egypt", 0.0), civ("Babylon", 20.0)],
            ..CivitasConfig::default()
        };
        config.economy.volatility = f64::NAN;
        assert!(matches!(Simulation::new(&config), Err(SimulationError::Config { .. })));
    }

    #[test]
    fn opening_a_route_publishes_creation() {
        let mut sim = isolated_world();
        let egypt = sim.civilization_by_name("Egypt").unwrap();
        let babylon = sim.civilization_by_name("Babylon").unwrap();
        sim.drain_events();

        let route = sim.open_trade_route(egypt, babylon).unwrap();
        assert!(matches!(
            sim.drain_events().first(),
            Some(SimEvent::RouteCreated { route: r, .. }) if *r == route
        ));
        // Opening again only refreshes.
        assert_eq!(sim.open_trade_route(babylon, egypt).unwrap(), route);
        assert_eq!(sim.pending_events(), 0);
    }

    #[test]
    fn removal_cleans_up_everything() {
        let mut sim = two_civ_world();
        let egypt = sim.civilization_by_name("Egypt").unwrap();
        let babylon = sim.civilization_by_name("Babylon").unwrap();
        sim.open_trade_route(egypt, babylon).unwrap();

        sim.remove_civilization(babylon).unwrap();
        assert!(sim.profile(babylon).is_none());
        assert!(sim.economy().market(MarketId::of(babylon)).is_none());
        assert!(sim.treasury().balance(babylon).is_none());
        assert!(sim.relations().relation(egypt, babylon).is_none());
        assert_eq!(sim.economy().routes().active_count(), 0);
        assert!(sim.verify_conservation().is_balanced());
        assert!(matches!(
            sim.remove_civilization(babylon),
            Err(SimulationError::UnknownCivilization(_))
        ));
    }

    #[test]
    fn effects_reach_the_profile() {
        let mut sim = two_civ_world();
        let egypt = sim.civilization_by_name("Egypt").unwrap();
        sim.apply_effect(egypt, &EconomicEffect::GrantCapability { tag: "writing".to_owned() })
            .unwrap();
        assert!(sim.profile(egypt).unwrap().has_capability("writing"));

        let ghost = CivId::new();
        let result = sim.apply_effect(ghost, &EconomicEffect::PopulationChange { delta: 5 });
        assert!(matches!(result, Err(SimulationError::UnknownCivilization(_))));
    }
}
