//! Read-only view of the rest of the world.
//!
//! Drift, compliance, and action modifiers need facts owned by other
//! subsystems (profiles, trade, treasury). The simulation context
//! implements [`WorldView`] over its own state and passes it in.

use civitas_types::{CivId, CivProfile};

/// What diplomacy may ask about the world.
pub trait WorldView {
    /// A living civilization's profile.
    fn profile(&self, civ: CivId) -> Option<&CivProfile>;

    /// Lifetime units traded along the route between the two
    /// civilizations' markets (zero without a route).
    fn trade_volume(&self, a: CivId, b: CivId) -> f64;

    /// Current risk of the active route between the pair, if any.
    fn route_risk(&self, a: CivId, b: CivId) -> Option<f64>;

    /// Whether `civ` can spend `amount` right now.
    fn can_afford(&self, civ: CivId, amount: f64) -> bool;
}

#[cfg(test)]
pub(crate) mod testing {
    //! A table-backed [`WorldView`] for unit tests.

    use std::collections::BTreeMap;

    use super::*;

    #[derive(Debug, Default)]
    pub(crate) struct TableView {
        pub profiles: BTreeMap<CivId, CivProfile>,
        pub volume: f64,
        pub risk: Option<f64>,
        pub funds: f64,
    }

    impl TableView {
        pub fn with(profiles: &[&CivProfile]) -> Self {
            Self {
                profiles: profiles.iter().map(|p| (p.id, (*p).clone())).collect(),
                funds: f64::MAX,
                ..Self::default()
            }
        }
    }

    impl WorldView for TableView {
        fn profile(&self, civ: CivId) -> Option<&CivProfile> {
            self.profiles.get(&civ)
        }

        fn trade_volume(&self, _a: CivId, _b: CivId) -> f64 {
            self.volume
        }

        fn route_risk(&self, _a: CivId, _b: CivId) -> Option<f64> {
            self.risk
        }

        fn can_afford(&self, _civ: CivId, amount: f64) -> bool {
            self.funds >= amount
        }
    }
}
