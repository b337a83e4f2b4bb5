//! Full-world snapshots.
//!
//! A [`WorldSnapshot`] copies every public record of a [`Simulation`] into
//! plain serde types so an external collaborator can persist, diff, or
//! stream it. Collections are flattened to vectors in id order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use civitas_diplomacy::{Agreement, Relation};
use civitas_economy::{Market, Resource, TradeRoute};
use civitas_types::{CivId, CivProfile, CycleKind};

use crate::simulation::Simulation;

/// One treasury account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Account owner.
    pub civ: CivId,
    /// Current balance.
    pub balance: Decimal,
}

/// Everything observable about the world at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// World name.
    pub world: String,
    /// Simulated seconds since start.
    pub elapsed_seconds: f64,
    /// Simulated days since start.
    pub day: f64,
    /// Completed economic cycles.
    pub economic_cycle: u64,
    /// Completed diplomacy cycles.
    pub diplomacy_cycle: u64,
    /// Cumulative inflation multiplier.
    pub price_level: f64,
    /// Living civilizations.
    pub civilizations: Vec<CivProfile>,
    /// Treasury accounts.
    pub balances: Vec<AccountBalance>,
    /// Registered resources with their world figures.
    pub resources: Vec<Resource>,
    /// Markets.
    pub markets: Vec<Market>,
    /// Every route, active or not.
    pub routes: Vec<TradeRoute>,
    /// Every relation.
    pub relations: Vec<Relation>,
    /// Every agreement, active or ended.
    pub agreements: Vec<Agreement>,
}

impl WorldSnapshot {
    /// Copy the state of `sim`.
    pub fn capture(sim: &Simulation) -> Self {
        let clock = sim.clock();
        let economy = sim.economy();
        Self {
            world: sim.name().to_owned(),
            elapsed_seconds: clock.elapsed_seconds(),
            day: clock.days(),
            economic_cycle: clock.cycle(CycleKind::Economic),
            diplomacy_cycle: clock.cycle(CycleKind::Diplomatic),
            price_level: economy.price_level(),
            civilizations: sim.profiles().values().cloned().collect(),
            balances: sim
                .treasury()
                .balances()
                .iter()
                .map(|(civ, balance)| AccountBalance {
                    civ: *civ,
                    balance: *balance,
                })
                .collect(),
            resources: economy.registry().iter().cloned().collect(),
            markets: economy.markets().values().cloned().collect(),
            routes: economy.routes().iter().cloned().collect(),
            relations: sim.relations().relations().cloned().collect(),
            agreements: sim.relations().agreements().cloned().collect(),
        }
    }

    /// Serialize to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns the serializer error for non-finite floats.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Total currency across all accounts.
    pub fn money_supply(&self) -> Decimal {
        self.balances.iter().map(|a| a.balance).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use civitas_types::Position;

    use super::*;
    use crate::config::{CivilizationSpec, CivitasConfig};

    fn world() -> Simulation {
        let spec = |name: &str| CivilizationSpec {
            name: name.to_owned(),
            population: 500,
            unit_count: 5,
            capabilities: ["market".to_owned(), "roads".to_owned()].into_iter().collect(),
            culture_traits: BTreeSet::new(),
            position: Position::default(),
            income_rate: 0.5,
            starting_balance: None,
            shared_history: BTreeMap::new(),
        };
        let config = CivitasConfig {
            civilizations: vec![spec("Athens"), spec("Sparta")],
            ..CivitasConfig::default()
        };
        Simulation::new(&config).unwrap()
    }

    #[test]
    fn snapshot_covers_every_collection() {
        let mut sim = world();
        sim.advance(2.0).unwrap();
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.civilizations.len(), 2);
        assert_eq!(snapshot.balances.len(), 2);
        assert_eq!(snapshot.resources.len(), 3);
        assert_eq!(snapshot.markets.len(), 2);
        assert_eq!(snapshot.relations.len(), 1);
        assert_eq!(snapshot.economic_cycle, 2);
        assert!(snapshot.money_supply() >= Decimal::from(2_000));
    }

    #[test]
    fn snapshot_survives_json() {
        let mut sim = world();
        let athens = sim.civilization_by_name("Athens").unwrap();
        let sparta = sim.civilization_by_name("Sparta").unwrap();
        sim.open_trade_route(athens, sparta).unwrap();
        sim.advance(1.0).unwrap();

        let snapshot = sim.snapshot();
        let json = snapshot.to_json().unwrap();
        let back: WorldSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.routes.len(), 1);
        assert_eq!(back.balances, snapshot.balances);
        assert_eq!(back.world, "Civitas");
    }
}
