//! Economy subsystem for the Civitas engine.
//!
//! Owns the resource registry, one market per civilization, the trade
//! route network, and the pricing model. The [`Economy`] aggregate runs one
//! economic cycle at a time (production, consumption, market update, route
//! update, pricing) and handles explicit trade proposals, settling every
//! payment through the `civitas-treasury` ledger.
//!
//! Diplomacy is consulted through the [`RelationView`] trait so this crate
//! never depends on the diplomacy crate.
//!
//! # Modules
//!
//! - [`resource`] -- Resource definitions and the registry
//! - [`market`] -- Per-civilization prices, stock, and indicators
//! - [`pricing`] -- The price formula and commit threshold
//! - [`route`] -- Route condition math and smoothing
//! - [`network`] -- The set of routes and pair lookups
//! - [`economy`] -- The aggregate, trade proposals, and effects
//! - [`cycle`] -- The economic cycle
//! - [`effects`] -- Effects applied by other subsystems
//! - [`params`] -- Tunable constants
//! - [`error`] -- Error types

pub mod cycle;
pub mod economy;
pub mod effects;
pub mod error;
pub mod market;
pub mod network;
pub mod params;
pub mod pricing;
pub mod resource;
pub mod route;

pub use cycle::CycleInputs;
pub use economy::{Economy, RelationView, TradeReceipt, TradeRequest};
pub use effects::EconomicEffect;
pub use error::EconomyError;
pub use market::Market;
pub use network::{RouteNetwork, RouteOpening};
pub use params::{EconomyParams, RouteParams};
pub use resource::{Resource, ResourceRegistry, ResourceSpec};
pub use route::{RouteConditions, RouteProfile, TradeRoute};
