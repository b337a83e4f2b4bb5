//! Tunable economy and route parameters.
//!
//! Both structs deserialize from the `economy` and `routes` sections of the
//! engine configuration. Every field has a default so partial YAML works.

use serde::{Deserialize, Serialize};

/// Market, production, and pricing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomyParams {
    /// Maximum relative random price swing per pricing pass.
    #[serde(default = "default_volatility")]
    pub volatility: f64,

    /// Minimum relative price change that gets committed.
    #[serde(default = "default_price_change_threshold")]
    pub price_change_threshold: f64,

    /// Inflation per simulated second, compounded into the price level.
    #[serde(default = "default_inflation_rate")]
    pub inflation_rate: f64,

    /// Floor used in place of zero supply or zero prices in divisions.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Lower clamp for the demand/supply ratio.
    #[serde(default = "default_min_price_ratio")]
    pub min_price_ratio: f64,

    /// Upper clamp for the demand/supply ratio.
    #[serde(default = "default_max_price_ratio")]
    pub max_price_ratio: f64,

    /// Ratio used when supply is exhausted.
    #[serde(default = "default_scarcity_ratio")]
    pub scarcity_ratio: f64,

    /// Production multiplier applied per missing requirement tag.
    #[serde(default = "default_missing_requirement_efficiency")]
    pub missing_requirement_efficiency: f64,

    /// Smoothing factor for market strength.
    #[serde(default = "default_smoothing")]
    pub strength_smoothing: f64,

    /// Smoothing factor for economic stability.
    #[serde(default = "default_smoothing")]
    pub stability_smoothing: f64,

    /// How strongly price movement erodes stability.
    #[serde(default = "default_stability_sensitivity")]
    pub stability_sensitivity: f64,

    /// Stock of every resource a new market starts with.
    #[serde(default = "default_starting_stock")]
    pub starting_stock: f64,
}

impl Default for EconomyParams {
    fn default() -> Self {
        Self {
            volatility: default_volatility(),
            price_change_threshold: default_price_change_threshold(),
            inflation_rate: default_inflation_rate(),
            epsilon: default_epsilon(),
            min_price_ratio: default_min_price_ratio(),
            max_price_ratio: default_max_price_ratio(),
            scarcity_ratio: default_scarcity_ratio(),
            missing_requirement_efficiency: default_missing_requirement_efficiency(),
            strength_smoothing: default_smoothing(),
            stability_smoothing: default_smoothing(),
            stability_sensitivity: default_stability_sensitivity(),
            starting_stock: default_starting_stock(),
        }
    }
}

/// Trade route condition and update parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteParams {
    /// Distance at which route efficiency halves.
    #[serde(default = "default_distance_scale")]
    pub distance_scale: f64,

    /// Risk floor of every route.
    #[serde(default = "default_base_risk")]
    pub base_risk: f64,

    /// Fixed per-unit route cost per unit of distance.
    #[serde(default = "default_cost_per_distance")]
    pub cost_per_distance: f64,

    /// Units per simulated second a fully efficient route carries.
    #[serde(default = "default_base_capacity")]
    pub base_capacity: f64,

    /// Smoothing factor for efficiency and risk.
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,

    /// Fraction of a raided shipment that is lost.
    #[serde(default = "default_raid_severity")]
    pub raid_severity: f64,

    /// Minimum `efficiency * (1 - risk)` for a route to stay active.
    #[serde(default = "default_min_viability")]
    pub min_viability: f64,
}

impl Default for RouteParams {
    fn default() -> Self {
        Self {
            distance_scale: default_distance_scale(),
            base_risk: default_base_risk(),
            cost_per_distance: default_cost_per_distance(),
            base_capacity: default_base_capacity(),
            smoothing: default_smoothing(),
            raid_severity: default_raid_severity(),
            min_viability: default_min_viability(),
        }
    }
}

const fn default_volatility() -> f64 {
    0.1
}

const fn default_price_change_threshold() -> f64 {
    0.01
}

const fn default_inflation_rate() -> f64 {
    0.000_1
}

const fn default_epsilon() -> f64 {
    0.000_001
}

const fn default_min_price_ratio() -> f64 {
    0.5
}

const fn default_max_price_ratio() -> f64 {
    2.0
}

const fn default_scarcity_ratio() -> f64 {
    2.0
}

const fn default_missing_requirement_efficiency() -> f64 {
    0.5
}

const fn default_smoothing() -> f64 {
    0.2
}

const fn default_stability_sensitivity() -> f64 {
    5.0
}

const fn default_starting_stock() -> f64 {
    100.0
}

const fn default_distance_scale() -> f64 {
    50.0
}

const fn default_base_risk() -> f64 {
    0.05
}

const fn default_cost_per_distance() -> f64 {
    0.02
}

const fn default_base_capacity() -> f64 {
    10.0
}

const fn default_raid_severity() -> f64 {
    0.5
}

const fn default_min_viability() -> f64 {
    0.2
}
