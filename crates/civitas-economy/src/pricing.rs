//! The pricing formula and its helpers.
//!
//! ```text
//! ratio    = clamp(demand / max(supply, eps), min_ratio, max_ratio)   (supply > 0)
//!          = scarcity_ratio                                            (supply <= 0)
//! newPrice = base * ratio * marketFactor * (1 + U(-vol, +vol)) * inflation
//! ```
//!
//! A new price is only committed when it moves more than the change
//! threshold relative to the old one.

use rand::Rng;

use crate::params::EconomyParams;

/// Inputs to one price computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceInputs {
    /// Reference price of the resource.
    pub base_value: f64,
    /// World supply.
    pub supply: f64,
    /// World demand.
    pub demand: f64,
    /// Market strength times stability.
    pub market_factor: f64,
    /// Random swing already drawn from `[-volatility, volatility]`.
    pub volatility_draw: f64,
    /// Cumulative price level.
    pub inflation_factor: f64,
}

/// The clamped demand/supply ratio.
pub fn price_ratio(supply: f64, demand: f64, params: &EconomyParams) -> f64 {
    if supply <= 0.0 {
        return params.scarcity_ratio;
    }
    (demand / supply.max(params.epsilon)).clamp(params.min_price_ratio, params.max_price_ratio)
}

/// Compute a candidate price. Never negative.
pub fn compute_price(inputs: &PriceInputs, params: &EconomyParams) -> f64 {
    let ratio = price_ratio(inputs.supply, inputs.demand, params);
    let price = inputs.base_value
        * ratio
        * inputs.market_factor
        * (1.0 + inputs.volatility_draw)
        * inputs.inflation_factor;
    price.max(0.0)
}

/// Draw a uniform swing in `[-volatility, volatility]`.
///
/// Zero, negative, and non-finite volatilities draw no swing.
pub fn draw_volatility(rng: &mut impl Rng, volatility: f64) -> f64 {
    if !volatility.is_finite() || volatility <= 0.0 {
        return 0.0;
    }
    rng.random_range(-volatility..=volatility)
}

/// Whether a candidate price moves enough to be committed.
///
/// A stored price at (or near) zero always accepts a positive candidate.
pub fn should_commit(old: f64, new: f64, threshold: f64, epsilon: f64) -> bool {
    if old <= epsilon {
        return new > epsilon;
    }
    (new - old).abs() / old > threshold
}

/// Relative move between two prices, zero when the old price is negligible.
pub fn relative_move(old: f64, new: f64, epsilon: f64) -> f64 {
    if old <= epsilon {
        return 0.0;
    }
    (new - old).abs() / old
}

/// Exponential moving average step.
pub fn ema(current: f64, target: f64, alpha: f64) -> f64 {
    let alpha = alpha.clamp(0.0, 1.0);
    current + alpha * (target - current)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn inputs(supply: f64, demand: f64) -> PriceInputs {
        PriceInputs {
            base_value: 30.0,
            supply,
            demand,
            market_factor: 1.0,
            volatility_draw: 0.0,
            inflation_factor: 1.0,
        }
    }

    #[test]
    fn iron_shortage_raises_price_by_demand_ratio() {
        let price = compute_price(&inputs(500.0, 600.0), &EconomyParams::default());
        assert!((price - 36.0).abs() < 1e-9);
    }

    #[test]
    fn ratio_is_clamped() {
        let params = EconomyParams::default();
        assert!((price_ratio(100.0, 1000.0, &params) - 2.0).abs() < f64::EPSILON);
        assert!((price_ratio(1000.0, 1.0, &params) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn exhausted_supply_uses_scarcity_ratio() {
        let params = EconomyParams::default();
        assert!((price_ratio(0.0, 0.0, &params) - params.scarcity_ratio).abs() < f64::EPSILON);
        let price = compute_price(&inputs(0.0, 10.0), &params);
        assert!((price - 60.0).abs() < 1e-9);
    }

    #[test]
    fn small_moves_are_not_committed() {
        assert!(!should_commit(36.0, 36.2, 0.01, 1e-6));
        assert!(should_commit(36.0, 37.0, 0.01, 1e-6));
        assert!(should_commit(0.0, 5.0, 0.01, 1e-6));
    }

    #[test]
    fn volatility_draw_stays_in_band() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let draw = draw_volatility(&mut rng, 0.1);
            assert!((-0.1..=0.1).contains(&draw));
        }
        assert!(draw_volatility(&mut rng, 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn non_finite_volatility_draws_nothing() {
        let mut rng = StdRng::seed_from_u64(11);
        for volatility in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.3] {
            assert!(draw_volatility(&mut rng, volatility).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_moves_toward_target() {
        let next = ema(1.0, 0.0, 0.2);
        assert!((next - 0.8).abs() < 1e-12);
    }
}
