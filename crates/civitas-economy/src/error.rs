//! Error types for the `civitas-economy` crate.
//!
//! All fallible operations in this crate return [`EconomyError`]. Trade
//! failures map onto the caller-facing [`TradeOutcome`] through
//! [`EconomyError::trade_outcome`].

use civitas_treasury::TreasuryError;
use civitas_types::{CivId, MarketId, ResourceId, RouteId, TradeOutcome};

/// Errors that can occur during economy operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EconomyError {
    /// A resource with this id is already registered.
    #[error("duplicate resource: {0}")]
    DuplicateResource(ResourceId),

    /// The resource is not registered.
    #[error("unknown resource: {0}")]
    UnknownResource(ResourceId),

    /// The market does not exist.
    #[error("unknown market: {0}")]
    UnknownMarket(MarketId),

    /// A market already exists for this civilization.
    #[error("market for civilization {0} already exists")]
    DuplicateMarket(CivId),

    /// The market has no price entry for the resource.
    #[error("market {market} has no price for {resource}")]
    PriceNotFound {
        /// The market queried.
        market: MarketId,
        /// The resource queried.
        resource: ResourceId,
    },

    /// An active route already joins the two markets.
    #[error("an active route already joins {a} and {b}")]
    RouteAlreadyExists {
        /// One endpoint.
        a: MarketId,
        /// The other endpoint.
        b: MarketId,
    },

    /// A route cannot join a market to itself.
    #[error("route endpoints must differ: {0}")]
    SameMarket(MarketId),

    /// The route does not exist.
    #[error("unknown route: {0}")]
    UnknownRoute(RouteId),

    /// No active route joins the two markets.
    #[error("no active route between {buyer} and {seller}")]
    NoRoute {
        /// Buying market.
        buyer: MarketId,
        /// Selling market.
        seller: MarketId,
    },

    /// Trade amounts must be finite and strictly positive.
    #[error("invalid trade amount: {amount}")]
    InvalidAmount {
        /// The rejected amount.
        amount: f64,
    },

    /// The seller does not hold enough of the resource.
    #[error("market {market} holds {available} {resource}, needs {required}")]
    InsufficientSupply {
        /// The selling market.
        market: MarketId,
        /// The resource.
        resource: ResourceId,
        /// Stock on hand.
        available: f64,
        /// Amount requested.
        required: f64,
    },

    /// A treasury operation failed.
    #[error("treasury error: {source}")]
    Treasury {
        /// The underlying treasury error.
        #[from]
        source: TreasuryError,
    },
}

impl EconomyError {
    /// The caller-facing outcome for a failed trade proposal.
    pub const fn trade_outcome(&self) -> TradeOutcome {
        match self {
            Self::UnknownResource(_) | Self::PriceNotFound { .. } => TradeOutcome::InvalidResource,
            Self::NoRoute { .. } => TradeOutcome::NoRoute,
            Self::InsufficientSupply { .. } => TradeOutcome::InsufficientSupply,
            Self::Treasury {
                source: TreasuryError::InsufficientFunds { .. },
            } => TradeOutcome::InsufficientFunds,
            Self::DuplicateResource(_)
            | Self::UnknownMarket(_)
            | Self::DuplicateMarket(_)
            | Self::RouteAlreadyExists { .. }
            | Self::SameMarket(_)
            | Self::UnknownRoute(_)
            | Self::InvalidAmount { .. }
            | Self::Treasury { .. } => TradeOutcome::InvalidRequest,
        }
    }
}
