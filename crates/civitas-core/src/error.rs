//! Error types for the simulation context.
//!
//! [`SimulationError`] wraps the errors of every subsystem so callers of
//! [`crate::Simulation`] handle one type. The outcome-returning command
//! methods map it onto [`TradeOutcome`] and [`DiplomaticOutcome`].

use civitas_diplomacy::DiplomacyError;
use civitas_economy::EconomyError;
use civitas_treasury::TreasuryError;
use civitas_types::{CivId, DiplomaticOutcome, TradeOutcome};

use crate::clock::ClockError;
use crate::config::ConfigError;

/// Errors from simulation operations.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Configuration failed validation.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// Clock or scheduler failure.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// Economy failure.
    #[error("economy error: {source}")]
    Economy {
        /// The underlying economy error.
        #[from]
        source: EconomyError,
    },

    /// Diplomacy failure.
    #[error("diplomacy error: {source}")]
    Diplomacy {
        /// The underlying diplomacy error.
        #[from]
        source: DiplomacyError,
    },

    /// Treasury failure.
    #[error("treasury error: {source}")]
    Treasury {
        /// The underlying treasury error.
        #[from]
        source: TreasuryError,
    },

    /// No living civilization has this id.
    #[error("unknown civilization: {0}")]
    UnknownCivilization(CivId),

    /// Another civilization already uses this name.
    #[error("civilization name {0:?} is taken")]
    DuplicateName(String),

    /// Seed data referred to a civilization name not founded yet.
    #[error("no civilization named {0:?} has been founded")]
    UnknownName(String),
}

impl SimulationError {
    /// The caller-facing outcome for a failed trade proposal.
    pub const fn trade_outcome(&self) -> TradeOutcome {
        match self {
            Self::Economy { source } => source.trade_outcome(),
            Self::Treasury {
                source: TreasuryError::InsufficientFunds { .. },
            } => TradeOutcome::InsufficientFunds,
            _ => TradeOutcome::InvalidRequest,
        }
    }

    /// The caller-facing outcome for a failed diplomatic proposal.
    pub const fn diplomatic_outcome(&self) -> DiplomaticOutcome {
        match self {
            Self::Diplomacy { source } => source.outcome(),
            _ => DiplomaticOutcome::NoRelation,
        }
    }
}

#[cfg(test)]
mod tests {
    use civitas_types::{ActionId, MarketId};

    use super::*;

    #[test]
    fn trade_errors_map_to_outcomes() {
        let market = MarketId::new();
        let err = SimulationError::from(EconomyError::NoRoute {
            buyer: market,
            seller: MarketId::new(),
        });
        assert_eq!(err.trade_outcome(), TradeOutcome::NoRoute);
        let err = SimulationError::UnknownCivilization(CivId::new());
        assert_eq!(err.trade_outcome(), TradeOutcome::InvalidRequest);
    }

    #[test]
    fn diplomatic_errors_map_to_outcomes() {
        let err = SimulationError::from(DiplomacyError::UnknownAction(ActionId::from("feast")));
        assert_eq!(err.diplomatic_outcome(), DiplomaticOutcome::UnknownAction);
    }
}
