//! Transaction builder and validation for treasury entries.
//!
//! [`TransactionBuilder`] checks that the parties match the entry type
//! (a mint has only a recipient, a burn only a payer, a payment both) and
//! that the amount is strictly positive before producing a [`LedgerEntry`].

use chrono::Utc;
use rust_decimal::Decimal;

use civitas_types::{CivId, LedgerEntry, LedgerEntryId, LedgerEntryType};

use crate::TreasuryError;

/// Builder for constructing validated [`LedgerEntry`] values.
///
/// # Examples
///
/// ```
/// use civitas_treasury::TransactionBuilder;
/// use civitas_types::{CivId, LedgerEntryType};
/// use rust_decimal::Decimal;
///
/// let entry = TransactionBuilder::new(3, LedgerEntryType::Payment)
///     .from(CivId::new())
///     .to(CivId::new())
///     .amount(Decimal::new(40, 0))
///     .reason("TRADE")
///     .build();
///
/// assert!(entry.is_ok());
/// ```
#[derive(Debug)]
pub struct TransactionBuilder {
    cycle: u64,
    entry_type: LedgerEntryType,
    from: Option<CivId>,
    to: Option<CivId>,
    amount: Option<Decimal>,
    reason: Option<String>,
}

impl TransactionBuilder {
    /// Start building an entry for the given economic cycle and type.
    pub const fn new(cycle: u64, entry_type: LedgerEntryType) -> Self {
        Self {
            cycle,
            entry_type,
            from: None,
            to: None,
            amount: None,
            reason: None,
        }
    }

    /// Set the paying civilization.
    #[must_use]
    pub const fn from(mut self, civ: CivId) -> Self {
        self.from = Some(civ);
        self
    }

    /// Set the receiving civilization.
    #[must_use]
    pub const fn to(mut self, civ: CivId) -> Self {
        self.to = Some(civ);
        self
    }

    /// Set the amount moved.
    #[must_use]
    pub const fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the reason tag.
    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Validate inputs and produce a [`LedgerEntry`].
    ///
    /// # Errors
    ///
    /// Returns [`TreasuryError::MissingField`] if amount or reason is unset,
    /// [`TreasuryError::ZeroAmount`] / [`TreasuryError::NegativeAmount`] for
    /// non-positive amounts, and [`TreasuryError::InvalidParties`] when the
    /// parties do not fit the entry type.
    pub fn build(self) -> Result<LedgerEntry, TreasuryError> {
        let amount = self.amount.ok_or(TreasuryError::MissingField("amount"))?;
        let reason = self.reason.ok_or(TreasuryError::MissingField("reason"))?;

        if amount.is_zero() {
            return Err(TreasuryError::ZeroAmount);
        }
        if amount.is_sign_negative() {
            return Err(TreasuryError::NegativeAmount { amount });
        }

        validate_parties(self.entry_type, self.from, self.to)?;

        Ok(LedgerEntry {
            id: LedgerEntryId::new(),
            cycle: self.cycle,
            entry_type: self.entry_type,
            from: self.from,
            to: self.to,
            amount,
            reason,
            created_at: Utc::now(),
        })
    }
}

/// Check the from/to sides against the entry type contract.
fn validate_parties(
    entry_type: LedgerEntryType,
    from: Option<CivId>,
    to: Option<CivId>,
) -> Result<(), TreasuryError> {
    let (needs_from, needs_to) = expected_parties(entry_type);

    if from.is_some() != needs_from {
        return Err(TreasuryError::InvalidParties {
            entry_type,
            side: "from",
        });
    }
    if to.is_some() != needs_to {
        return Err(TreasuryError::InvalidParties {
            entry_type,
            side: "to",
        });
    }
    if entry_type == LedgerEntryType::Payment && from == to {
        return Err(TreasuryError::InvalidParties {
            entry_type,
            side: "to",
        });
    }
    Ok(())
}

/// Whether each [`LedgerEntryType`] requires a (from, to) party.
const fn expected_parties(entry_type: LedgerEntryType) -> (bool, bool) {
    match entry_type {
        LedgerEntryType::Mint => (false, true),
        LedgerEntryType::Burn => (true, false),
        LedgerEntryType::Payment => (true, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_needs_both_sides() {
        let result = TransactionBuilder::new(1, LedgerEntryType::Payment)
            .from(CivId::new())
            .amount(Decimal::new(5, 0))
            .reason("TRADE")
            .build();

        assert!(matches!(
            result,
            Err(TreasuryError::InvalidParties { side: "to", .. })
        ));
    }

    #[test]
    fn mint_rejects_payer() {
        let result = TransactionBuilder::new(1, LedgerEntryType::Mint)
            .from(CivId::new())
            .to(CivId::new())
            .amount(Decimal::new(5, 0))
            .reason("INCOME")
            .build();

        assert!(matches!(
            result,
            Err(TreasuryError::InvalidParties { side: "from", .. })
        ));
    }

    #[test]
    fn self_payment_rejected() {
        let civ = CivId::new();
        let result = TransactionBuilder::new(1, LedgerEntryType::Payment)
            .from(civ)
            .to(civ)
            .amount(Decimal::new(5, 0))
            .reason("TRADE")
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn zero_and_negative_amounts_rejected() {
        let zero = TransactionBuilder::new(1, LedgerEntryType::Mint)
            .to(CivId::new())
            .amount(Decimal::ZERO)
            .reason("INCOME")
            .build();
        assert!(matches!(zero, Err(TreasuryError::ZeroAmount)));

        let negative = TransactionBuilder::new(1, LedgerEntryType::Burn)
            .from(CivId::new())
            .amount(Decimal::new(-3, 0))
            .reason("DIPLOMACY")
            .build();
        assert!(matches!(
            negative,
            Err(TreasuryError::NegativeAmount { .. })
        ));
    }

    #[test]
    fn missing_reason_rejected() {
        let result = TransactionBuilder::new(2, LedgerEntryType::Mint)
            .to(CivId::new())
            .amount(Decimal::ONE)
            .build();

        assert!(matches!(result, Err(TreasuryError::MissingField("reason"))));
    }

    #[test]
    fn built_entry_carries_fields() {
        let to = CivId::new();
        let entry = TransactionBuilder::new(7, LedgerEntryType::Mint)
            .to(to)
            .amount(Decimal::new(15, 1))
            .reason("INCOME")
            .build();

        let Ok(entry) = entry else {
            panic!("mint entry should build");
        };
        assert_eq!(entry.cycle, 7);
        assert_eq!(entry.to, Some(to));
        assert_eq!(entry.from, None);
        assert_eq!(entry.amount, Decimal::new(15, 1));
    }
}
