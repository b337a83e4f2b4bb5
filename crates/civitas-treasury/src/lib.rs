//! Currency accounts and the append-only payment ledger for Civitas.
//!
//! Every civilization holds a currency balance. Balances only change through
//! ledger entries: currency is minted (income, opening balances), burned
//! (diplomatic costs, closing a destroyed civilization's account), or paid
//! from one civilization to another (trade). Spending is all-or-nothing.
//!
//! # Modules
//!
//! - [`ledger`] -- The [`Ledger`] struct: append-only entry log with queries.
//! - [`transaction`] -- The [`TransactionBuilder`] for validated entry construction.
//! - [`treasury`] -- The [`Treasury`]: per-civilization balances backed by the ledger.
//! - [`conservation`] -- The money supply check.
//!
//! # Conservation Law
//!
//! At any point in time:
//!
//! ```text
//! sum(balances) == sum(minted) - sum(burned)
//! ```
//!
//! Payments move currency between accounts and never change the total.
//! A violation produces a [`TreasuryAnomaly`].
//!
//! # Usage
//!
//! ```
//! use civitas_treasury::{ConservationResult, Treasury};
//! use civitas_types::CivId;
//! use rust_decimal::Decimal;
//!
//! let mut treasury = Treasury::new();
//! let rome = CivId::new();
//! let carthage = CivId::new();
//!
//! treasury.open_account(0, rome, Decimal::new(1000, 0)).ok();
//! treasury.open_account(0, carthage, Decimal::new(1000, 0)).ok();
//! treasury.pay(1, rome, carthage, Decimal::new(250, 0), "TRADE").ok();
//!
//! assert_eq!(treasury.balance(carthage), Some(Decimal::new(1250, 0)));
//! assert_eq!(treasury.verify_conservation(), ConservationResult::Balanced);
//! ```

pub mod conservation;
pub mod ledger;
pub mod transaction;
pub mod treasury;

pub use conservation::ConservationResult;
pub use ledger::Ledger;
pub use transaction::TransactionBuilder;
pub use treasury::{Treasury, to_currency};

use rust_decimal::Decimal;

use civitas_types::{CivId, LedgerEntryType};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when moving currency.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreasuryError {
    /// Amount must be strictly positive.
    #[error("treasury amount must be non-zero")]
    ZeroAmount,

    /// Amount must not be negative.
    #[error("treasury amount must be positive, got {amount}")]
    NegativeAmount {
        /// The invalid amount.
        amount: Decimal,
    },

    /// A floating-point amount could not be represented as currency.
    #[error("amount {value} is not representable as currency")]
    Unrepresentable {
        /// The rejected value.
        value: f64,
    },

    /// A required field was not set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The from/to sides do not match the entry type.
    #[error("invalid {side} side for {entry_type:?} entry")]
    InvalidParties {
        /// The entry type being validated.
        entry_type: LedgerEntryType,
        /// Which side of the entry (`"from"` or `"to"`).
        side: &'static str,
    },

    /// The civilization has no account.
    #[error("no treasury account for civilization {civ}")]
    UnknownAccount {
        /// The civilization that was looked up.
        civ: CivId,
    },

    /// An account already exists for this civilization.
    #[error("treasury account for civilization {civ} already exists")]
    DuplicateAccount {
        /// The civilization.
        civ: CivId,
    },

    /// The paying account cannot cover the amount.
    #[error("civilization {civ} has {available}, needs {required}")]
    InsufficientFunds {
        /// The paying civilization.
        civ: CivId,
        /// Current balance.
        available: Decimal,
        /// Requested amount.
        required: Decimal,
    },

    /// Decimal arithmetic overflowed.
    #[error("treasury arithmetic overflow")]
    Overflow,

    /// An internal error that should not occur in normal operation.
    #[error("internal treasury error: {0}")]
    InternalError(&'static str),
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A money supply violation detected by the conservation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreasuryAnomaly {
    /// Sum of all account balances.
    pub total_balances: Decimal,
    /// Sum of all minted currency minus all burned currency.
    pub expected: Decimal,
    /// Civilizations whose balance differs from a replay of their entries.
    pub mismatched_accounts: Vec<CivId>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for TreasuryAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
