//! Per-civilization currency balances backed by the [`Ledger`].
//!
//! Every balance change goes through a validated ledger entry first. If
//! validation or the funds check fails, nothing is recorded and no balance
//! moves.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

use civitas_types::{CivId, LedgerEntry, LedgerEntryType};

use crate::conservation::{ConservationResult, verify_conservation};
use crate::ledger::Ledger;
use crate::transaction::TransactionBuilder;
use crate::TreasuryError;

/// Decimal places kept when converting simulation amounts to currency.
const CURRENCY_SCALE: u32 = 4;

/// Convert a floating-point simulation amount (trade cost, action cost)
/// into currency, rounded to four decimal places.
///
/// # Errors
///
/// Returns [`TreasuryError::Unrepresentable`] for NaN, infinite, or
/// out-of-range values.
pub fn to_currency(value: f64) -> Result<Decimal, TreasuryError> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(CURRENCY_SCALE))
        .ok_or(TreasuryError::Unrepresentable { value })
}

/// Civilization accounts and their ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Treasury {
    balances: BTreeMap<CivId, Decimal>,
    ledger: Ledger,
}

impl Treasury {
    /// Create an empty treasury.
    pub const fn new() -> Self {
        Self {
            balances: BTreeMap::new(),
            ledger: Ledger::new(),
        }
    }

    /// Open an account and mint its opening balance.
    pub fn open_account(
        &mut self,
        cycle: u64,
        civ: CivId,
        opening_balance: Decimal,
    ) -> Result<(), TreasuryError> {
        if self.balances.contains_key(&civ) {
            return Err(TreasuryError::DuplicateAccount { civ });
        }
        self.balances.insert(civ, Decimal::ZERO);
        if !opening_balance.is_zero() {
            if let Err(e) = self.mint(cycle, civ, opening_balance, "OPENING") {
                self.balances.remove(&civ);
                return Err(e);
            }
        }
        tracing::info!(civ = %civ, balance = %opening_balance, "treasury account opened");
        Ok(())
    }

    /// Close an account, burning whatever it still holds.
    ///
    /// Returns the amount burned.
    pub fn close_account(&mut self, cycle: u64, civ: CivId) -> Result<Decimal, TreasuryError> {
        let remaining = self.balance(civ).ok_or(TreasuryError::UnknownAccount { civ })?;
        if remaining > Decimal::ZERO {
            self.burn(cycle, civ, remaining, "ACCOUNT_CLOSED")?;
        }
        self.balances.remove(&civ);
        tracing::info!(civ = %civ, burned = %remaining, "treasury account closed");
        Ok(remaining)
    }

    /// Whether the civilization has an account.
    pub fn has_account(&self, civ: CivId) -> bool {
        self.balances.contains_key(&civ)
    }

    /// Current balance, or `None` without an account.
    pub fn balance(&self, civ: CivId) -> Option<Decimal> {
        self.balances.get(&civ).copied()
    }

    /// All balances keyed by civilization.
    pub const fn balances(&self) -> &BTreeMap<CivId, Decimal> {
        &self.balances
    }

    /// The underlying ledger.
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Whether the civilization holds at least `amount`.
    pub fn can_afford(&self, civ: CivId, amount: Decimal) -> bool {
        self.balance(civ).is_some_and(|b| b >= amount)
    }

    /// Create currency in a civilization's account.
    pub fn mint(
        &mut self,
        cycle: u64,
        civ: CivId,
        amount: Decimal,
        reason: &str,
    ) -> Result<&LedgerEntry, TreasuryError> {
        let current = self.balance(civ).ok_or(TreasuryError::UnknownAccount { civ })?;
        let entry = TransactionBuilder::new(cycle, LedgerEntryType::Mint)
            .to(civ)
            .amount(amount)
            .reason(reason)
            .build()?;
        let updated = current.checked_add(amount).ok_or(TreasuryError::Overflow)?;

        self.balances.insert(civ, updated);
        self.push(entry)
    }

    /// Destroy currency from a civilization's account. All-or-nothing.
    pub fn burn(
        &mut self,
        cycle: u64,
        civ: CivId,
        amount: Decimal,
        reason: &str,
    ) -> Result<&LedgerEntry, TreasuryError> {
        let current = self.balance(civ).ok_or(TreasuryError::UnknownAccount { civ })?;
        let entry = TransactionBuilder::new(cycle, LedgerEntryType::Burn)
            .from(civ)
            .amount(amount)
            .reason(reason)
            .build()?;
        if current < amount {
            return Err(TreasuryError::InsufficientFunds {
                civ,
                available: current,
                required: amount,
            });
        }
        let updated = current.checked_sub(amount).ok_or(TreasuryError::Overflow)?;

        self.balances.insert(civ, updated);
        self.push(entry)
    }

    /// Move currency between two civilizations. All-or-nothing.
    pub fn pay(
        &mut self,
        cycle: u64,
        from: CivId,
        to: CivId,
        amount: Decimal,
        reason: &str,
    ) -> Result<&LedgerEntry, TreasuryError> {
        let payer = self
            .balance(from)
            .ok_or(TreasuryError::UnknownAccount { civ: from })?;
        let payee = self
            .balance(to)
            .ok_or(TreasuryError::UnknownAccount { civ: to })?;
        let entry = TransactionBuilder::new(cycle, LedgerEntryType::Payment)
            .from(from)
            .to(to)
            .amount(amount)
            .reason(reason)
            .build()?;
        if payer < amount {
            return Err(TreasuryError::InsufficientFunds {
                civ: from,
                available: payer,
                required: amount,
            });
        }
        let payer_after = payer.checked_sub(amount).ok_or(TreasuryError::Overflow)?;
        let payee_after = payee.checked_add(amount).ok_or(TreasuryError::Overflow)?;

        self.balances.insert(from, payer_after);
        self.balances.insert(to, payee_after);
        tracing::debug!(from = %from, to = %to, amount = %amount, reason, "payment recorded");
        self.push(entry)
    }

    /// Check balances against the ledger.
    pub fn verify_conservation(&self) -> ConservationResult {
        verify_conservation(&self.ledger, &self.balances)
    }

    fn push(&mut self, entry: LedgerEntry) -> Result<&LedgerEntry, TreasuryError> {
        self.ledger.append(entry);
        self.ledger
            .all_entries()
            .last()
            .ok_or(TreasuryError::InternalError("failed to retrieve entry after append"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn funded(amount: i64) -> (Treasury, CivId, CivId) {
        let mut treasury = Treasury::new();
        let a = CivId::new();
        let b = CivId::new();
        treasury.open_account(0, a, Decimal::new(amount, 0)).unwrap();
        treasury.open_account(0, b, Decimal::new(amount, 0)).unwrap();
        (treasury, a, b)
    }

    #[test]
    fn opening_balance_is_minted() {
        let (treasury, a, _) = funded(1000);
        assert_eq!(treasury.balance(a), Some(Decimal::new(1000, 0)));
        assert_eq!(treasury.ledger().total_minted(), Decimal::new(2000, 0));
    }

    #[test]
    fn duplicate_account_rejected() {
        let (mut treasury, a, _) = funded(10);
        let result = treasury.open_account(1, a, Decimal::ONE);
        assert!(matches!(result, Err(TreasuryError::DuplicateAccount { .. })));
        assert_eq!(treasury.balance(a), Some(Decimal::new(10, 0)));
    }

    #[test]
    fn overspending_is_atomic() {
        let (mut treasury, a, b) = funded(100);
        let entries_before = treasury.ledger().len();

        let result = treasury.pay(1, a, b, Decimal::new(101, 0), "TRADE");

        assert!(matches!(result, Err(TreasuryError::InsufficientFunds { .. })));
        assert_eq!(treasury.balance(a), Some(Decimal::new(100, 0)));
        assert_eq!(treasury.balance(b), Some(Decimal::new(100, 0)));
        assert_eq!(treasury.ledger().len(), entries_before);
    }

    #[test]
    fn payment_conserves_money_supply() {
        let (mut treasury, a, b) = funded(100);
        treasury.pay(1, a, b, Decimal::new(40, 0), "TRADE").unwrap();
        treasury.burn(1, b, Decimal::new(5, 0), "DIPLOMACY").unwrap();
        treasury.mint(2, a, Decimal::new(3, 0), "INCOME").unwrap();

        assert_eq!(treasury.balance(a), Some(Decimal::new(63, 0)));
        assert_eq!(treasury.balance(b), Some(Decimal::new(135, 0)));
        assert!(treasury.verify_conservation().is_balanced());
    }

    #[test]
    fn closing_burns_remaining_balance() {
        let (mut treasury, a, _) = funded(100);
        let burned = treasury.close_account(3, a).unwrap();

        assert_eq!(burned, Decimal::new(100, 0));
        assert!(!treasury.has_account(a));
        assert!(treasury.verify_conservation().is_balanced());
    }

    #[test]
    fn currency_conversion_rounds_to_four_places() {
        assert_eq!(to_currency(36.123_456).unwrap(), Decimal::new(361_235, 4));
        assert!(to_currency(f64::NAN).is_err());
    }

    #[test]
    fn can_afford_requires_account() {
        let (treasury, a, _) = funded(50);
        assert!(treasury.can_afford(a, Decimal::new(50, 0)));
        assert!(!treasury.can_afford(a, Decimal::new(51, 0)));
        assert!(!treasury.can_afford(CivId::new(), Decimal::ONE));
    }
}
