//! One economic cycle, run in fixed step order:
//!
//! 1. production
//! 2. consumption
//! 3. market update
//! 4. route update (discovery, conditions, flows, smoothing, activation)
//! 5. pricing
//!
//! The cycle is deterministic for a given RNG state.

use std::collections::BTreeMap;

use rand::Rng;

use civitas_treasury::{Treasury, to_currency};
use civitas_types::{CivId, CivProfile, MarketId, ResourceId, SimEvent};

use crate::economy::{Economy, RelationView};
use crate::error::EconomyError;
use crate::market::Market;
use crate::params::{EconomyParams, RouteParams};
use crate::pricing::{PriceInputs, compute_price, draw_volatility, relative_move, should_commit};
use crate::resource::ResourceRegistry;
use crate::route::TradeRoute;

/// Per-cycle inputs owned by the caller.
#[derive(Debug, Clone, Copy)]
pub struct CycleInputs<'a> {
    /// 1-based economic cycle number.
    pub cycle: u64,
    /// Simulated seconds covered by this cycle.
    pub dt: f64,
    /// Every living civilization's profile.
    pub profiles: &'a BTreeMap<CivId, CivProfile>,
}

/// Aggregate flows of one cycle for a single resource.
#[derive(Debug, Clone, Copy, Default)]
struct Flows {
    produced: f64,
    consumed: f64,
    demanded: f64,
}

impl Economy {
    /// Run one economic cycle and return the events it produced.
    ///
    /// # Errors
    ///
    /// Returns an error only if an internal currency conversion or payment
    /// fails unexpectedly; ordinary unaffordable flows are skipped.
    pub fn run_cycle(
        &mut self,
        inputs: &CycleInputs<'_>,
        treasury: &mut Treasury,
        relations: &impl RelationView,
        rng: &mut impl Rng,
    ) -> Result<Vec<SimEvent>, EconomyError> {
        let mut events = Vec::new();
        let before = self.snapshot_stocks();

        let flows = self.produce_and_consume(inputs)?;
        for (resource, f) in &flows {
            if let Some(def) = self.registry.get_mut(resource) {
                def.apply_cycle(f.produced, f.consumed, f.demanded);
            }
        }

        for market in self.markets.values_mut() {
            market.update_indicators(
                self.params.strength_smoothing,
                self.params.stability_smoothing,
                self.params.stability_sensitivity,
            );
        }

        self.update_routes(inputs, treasury, relations, rng, &mut events)?;
        self.emit_stock_changes(&before, &mut events);
        self.reprice(inputs.dt, rng, &mut events);

        tracing::debug!(
            cycle = inputs.cycle,
            events = events.len(),
            active_routes = self.routes.active_count(),
            price_level = self.price_level,
            "economic cycle complete"
        );
        Ok(events)
    }

    fn snapshot_stocks(&self) -> BTreeMap<(MarketId, ResourceId), f64> {
        self.markets
            .iter()
            .flat_map(|(id, m)| m.stocks().iter().map(move |(r, q)| ((*id, r.clone()), *q)))
            .collect()
    }

    /// Steps 1 and 2.
    fn produce_and_consume(
        &mut self,
        inputs: &CycleInputs<'_>,
    ) -> Result<BTreeMap<ResourceId, Flows>, EconomyError> {
        let Self {
            registry,
            markets,
            params,
            ..
        } = self;
        let ids = registry.ids();
        let mut flows: BTreeMap<ResourceId, Flows> = BTreeMap::new();

        for (civ, profile) in inputs.profiles {
            let Some(market) = markets.get_mut(&MarketId::of(*civ)) else {
                continue;
            };
            for resource in &ids {
                let produced = registry.production_rate(resource, profile, params)? * inputs.dt;
                market.add_stock(resource, produced);
                flows.entry(resource.clone()).or_default().produced += produced;
            }
            for resource in &ids {
                let need = registry.consumption_rate(resource, profile)? * inputs.dt;
                let consumed = market.take_stock(resource, need);
                market.set_need(resource, need, need - consumed);
                let f = flows.entry(resource.clone()).or_default();
                f.consumed += consumed;
                f.demanded += need;
            }
        }
        Ok(flows)
    }

    /// Step 4.
    fn update_routes(
        &mut self,
        inputs: &CycleInputs<'_>,
        treasury: &mut Treasury,
        relations: &impl RelationView,
        rng: &mut impl Rng,
        events: &mut Vec<SimEvent>,
    ) -> Result<(), EconomyError> {
        events.extend(self.discover_routes(inputs.profiles, relations));

        let mut links: Vec<(MarketId, MarketId, bool)> = Vec::new();
        {
            let Self {
                registry,
                markets,
                routes,
                route_params,
                ..
            } = self;
            let resources = registry.ids();

            for id in routes.ids() {
                let Some(route) = routes.get_mut(id) else {
                    continue;
                };
                route.begin_cycle();
                let (a, b) = (route.source, route.destination);
                let (civ_a, civ_b) = (a.owner(), b.owner());

                if !markets.contains_key(&a) || !markets.contains_key(&b) {
                    if route.active {
                        route.active = false;
                        tracing::warn!(route = %id, "route endpoint missing, deactivating");
                        events.push(SimEvent::RouteDeactivated { route: id });
                    }
                    continue;
                }

                if let (Some(pa), Some(pb)) = (inputs.profiles.get(&civ_a), inputs.profiles.get(&civ_b)) {
                    let score = relations
                        .score(civ_a, civ_b)
                        .unwrap_or(route.conditions.relation_score);
                    route.refresh_conditions(Economy::conditions_for(pa, pb, score), route_params);
                }
                let at_war = relations.at_war(civ_a, civ_b);

                if !route.active {
                    let resumable = route.base_efficiency * (1.0 - route.base_risk);
                    if !at_war && resumable >= route_params.min_viability {
                        route.reactivate(route_params);
                        links.push((a, b, true));
                        tracing::info!(route = %id, "trade route reactivated");
                        events.push(SimEvent::RouteReactivated { route: id });
                    }
                    continue;
                }

                if at_war {
                    route.active = false;
                    links.push((a, b, false));
                    tracing::info!(route = %id, "trade route closed by war");
                    events.push(SimEvent::RouteDeactivated { route: id });
                    continue;
                }

                for resource in &resources {
                    ship(
                        ShipContext {
                            markets: &mut *markets,
                            registry: &mut *registry,
                            treasury: &mut *treasury,
                            route_params: &*route_params,
                            cycle: inputs.cycle,
                            dt: inputs.dt,
                        },
                        route,
                        resource,
                        rng,
                        events,
                    )?;
                }

                route.smooth(route_params);
                if route.viability() < route_params.min_viability {
                    route.active = false;
                    links.push((a, b, false));
                    tracing::info!(route = %id, viability = route.viability(), "trade route no longer viable");
                    events.push(SimEvent::RouteDeactivated { route: id });
                }
            }
        }

        for (a, b, linked) in links {
            if linked {
                self.link(a, b);
            } else {
                self.unlink(a, b);
            }
        }
        Ok(())
    }

    fn emit_stock_changes(
        &self,
        before: &BTreeMap<(MarketId, ResourceId), f64>,
        events: &mut Vec<SimEvent>,
    ) {
        for (id, market) in &self.markets {
            for (resource, quantity) in market.stocks() {
                let old = before.get(&(*id, resource.clone())).copied().unwrap_or(0.0);
                if (quantity - old).abs() > self.params.epsilon {
                    events.push(SimEvent::ResourceQuantityChanged {
                        market: *id,
                        resource: resource.clone(),
                        quantity: *quantity,
                    });
                }
            }
        }
    }

    /// Step 5.
    fn reprice(&mut self, dt: f64, rng: &mut impl Rng, events: &mut Vec<SimEvent>) {
        let Self {
            registry,
            markets,
            params,
            price_level,
            ..
        } = self;
        *price_level = (*price_level * (1.0 + params.inflation_rate * dt)).max(params.epsilon);

        let mut committed: BTreeMap<ResourceId, (f64, u32)> = BTreeMap::new();
        for (id, market) in markets.iter_mut() {
            let mean_move = reprice_market(
                PriceContext {
                    registry: &*registry,
                    params: &*params,
                    price_level: *price_level,
                    committed: &mut committed,
                },
                *id,
                market,
                rng,
                events,
            );
            market.set_last_price_move(mean_move);
        }

        for (resource, (sum, count)) in committed {
            if count > 0
                && let Some(def) = registry.get_mut(&resource)
            {
                def.current_value = sum / f64::from(count);
            }
        }
    }
}

/// Shared state needed to reprice one market.
struct PriceContext<'a> {
    registry: &'a ResourceRegistry,
    params: &'a EconomyParams,
    price_level: f64,
    /// Sum and count of the prices each resource ends the pass with.
    committed: &'a mut BTreeMap<ResourceId, (f64, u32)>,
}

/// Reprice every resource listed in one market. Returns the mean relative
/// move of the candidate prices.
fn reprice_market(
    ctx: PriceContext<'_>,
    id: MarketId,
    market: &mut Market,
    rng: &mut impl Rng,
    events: &mut Vec<SimEvent>,
) -> f64 {
    let PriceContext {
        registry,
        params,
        price_level,
        committed,
    } = ctx;
    let factor = market.market_factor();
    let mut total_move = 0.0;
    let mut priced: u32 = 0;

    for def in registry.iter() {
        let Some(old) = market.price(&def.id) else {
            continue;
        };
        let inputs = PriceInputs {
            base_value: def.base_value,
            supply: def.supply,
            demand: def.demand,
            market_factor: factor,
            volatility_draw: draw_volatility(rng, params.volatility),
            inflation_factor: price_level,
        };
        let candidate = compute_price(&inputs, params);
        total_move += relative_move(old, candidate, params.epsilon);
        priced = priced.saturating_add(1);

        let price = if should_commit(old, candidate, params.price_change_threshold, params.epsilon) {
            market.set_price(&def.id, candidate);
            events.push(SimEvent::ResourcePriceChanged {
                market: id,
                resource: def.id.clone(),
                old_price: old,
                new_price: candidate,
            });
            candidate
        } else {
            old
        };
        let slot = committed.entry(def.id.clone()).or_insert((0.0, 0));
        slot.0 += price;
        slot.1 = slot.1.saturating_add(1);
    }

    if priced == 0 {
        0.0
    } else {
        total_move / f64::from(priced)
    }
}

/// Shared state needed to move one shipment.
struct ShipContext<'a> {
    markets: &'a mut BTreeMap<MarketId, Market>,
    registry: &'a mut ResourceRegistry,
    treasury: &'a mut Treasury,
    route_params: &'a RouteParams,
    cycle: u64,
    dt: f64,
}

/// Move one resource along one route, from the cheaper market to the
/// pricier one, if the destination has unmet need and the source has
/// surplus. The destination pays the full trade cost before shipping;
/// unaffordable shipments are skipped.
fn ship(
    ctx: ShipContext<'_>,
    route: &mut TradeRoute,
    resource: &ResourceId,
    rng: &mut impl Rng,
    events: &mut Vec<SimEvent>,
) -> Result<(), EconomyError> {
    let (a, b) = (route.source, route.destination);
    let (Some(ma), Some(mb)) = (ctx.markets.get(&a), ctx.markets.get(&b)) else {
        return Ok(());
    };
    let (Some(pa), Some(pb)) = (ma.price(resource), mb.price(resource)) else {
        return Ok(());
    };
    let (from, to, unit_price) = if pa <= pb { (ma, mb, pa) } else { (mb, ma, pb) };

    let surplus = (from.stock(resource) - from.need(resource)).max(0.0);
    let shortfall = to.unmet_need(resource);
    let amount = surplus.min(shortfall).min(route.cycle_capacity(ctx.dt));
    if amount <= 0.0 || !amount.is_finite() {
        return Ok(());
    }

    let (from_id, to_id) = (from.id(), to.id());
    let total_cost = route.total_cost(unit_price, amount);
    let currency = to_currency(total_cost)?;
    if currency.is_zero() || currency.is_sign_negative() {
        return Ok(());
    }
    if !ctx.treasury.can_afford(to_id.owner(), currency) {
        tracing::debug!(route = %route.id, buyer = %to_id, resource = %resource, "route shipment unaffordable, skipped");
        return Ok(());
    }
    ctx.treasury
        .pay(ctx.cycle, to_id.owner(), from_id.owner(), currency, "ROUTE_TRADE")?;

    let raided = rng.random::<f64>() < route.risk;
    let lost = if raided {
        amount * ctx.route_params.raid_severity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let delivered = amount - lost;

    if let Some(m) = ctx.markets.get_mut(&from_id) {
        m.take_stock(resource, amount);
        m.record_trade(resource, -amount);
    }
    if let Some(m) = ctx.markets.get_mut(&to_id) {
        m.add_stock(resource, delivered);
        m.record_trade(resource, delivered);
        m.reduce_unmet(resource, delivered);
    }
    if lost > 0.0
        && let Some(def) = ctx.registry.get_mut(resource)
    {
        def.supply = (def.supply - lost).max(0.0);
    }
    route.record_shipment(resource, amount, lost);

    events.push(SimEvent::TradeExecuted {
        route: route.id,
        buyer: to_id,
        seller: from_id,
        resource: resource.clone(),
        amount: delivered,
        total_cost,
    });
    Ok(())
}
