//! Money supply verification.
//!
//! Currency enters only through `Mint` entries and leaves only through
//! `Burn` entries, so the sum of all balances must equal minted minus burned.
//! Each account is also compared against a replay of its own entries, which
//! catches a balance that was changed without a matching ledger record.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use civitas_types::CivId;

use crate::ledger::Ledger;
use crate::TreasuryAnomaly;

/// The result of a conservation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// Balances agree with the ledger.
    Balanced,
    /// Balances and ledger disagree.
    Anomaly(TreasuryAnomaly),
}

impl ConservationResult {
    /// Whether the check passed.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// Verify account balances against the ledger.
///
/// Closed accounts are absent from `balances`; their closing burn brings
/// their replayed balance to zero, so they are checked implicitly through
/// the totals.
pub fn verify_conservation(
    ledger: &Ledger,
    balances: &BTreeMap<CivId, Decimal>,
) -> ConservationResult {
    let Some(total_balances) = balances
        .values()
        .try_fold(Decimal::ZERO, |acc, b| acc.checked_add(*b))
    else {
        return overflow_anomaly();
    };

    let Some(expected) = ledger.total_minted().checked_sub(ledger.total_burned()) else {
        return overflow_anomaly();
    };

    let mismatched_accounts: Vec<CivId> = balances
        .iter()
        .filter(|(civ, balance)| ledger.replayed_balance(**civ) != **balance)
        .map(|(civ, _)| *civ)
        .collect();

    if total_balances == expected && mismatched_accounts.is_empty() {
        return ConservationResult::Balanced;
    }

    let count = mismatched_accounts.len();
    ConservationResult::Anomaly(TreasuryAnomaly {
        total_balances,
        expected,
        mismatched_accounts,
        message: format!(
            "TREASURY_ANOMALY: balances total {total_balances}, ledger expects {expected}, \
             {count} account(s) disagree with their entries",
        ),
    })
}

fn overflow_anomaly() -> ConservationResult {
    ConservationResult::Anomaly(TreasuryAnomaly {
        total_balances: Decimal::ZERO,
        expected: Decimal::ZERO,
        mismatched_accounts: Vec::new(),
        message: "TREASURY_ANOMALY: arithmetic overflow while summing balances".to_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::TransactionBuilder;
    use civitas_types::LedgerEntryType;

    #[test]
    fn empty_is_balanced() {
        let result = verify_conservation(&Ledger::new(), &BTreeMap::new());
        assert!(result.is_balanced());
    }

    #[test]
    fn unrecorded_balance_change_is_flagged() {
        let civ = CivId::new();
        let mut ledger = Ledger::new();
        ledger.append(
            TransactionBuilder::new(0, LedgerEntryType::Mint)
                .to(civ)
                .amount(Decimal::new(100, 0))
                .reason("OPENING")
                .build()
                .unwrap(),
        );

        let mut balances = BTreeMap::new();
        balances.insert(civ, Decimal::new(150, 0));

        match verify_conservation(&ledger, &balances) {
            ConservationResult::Anomaly(anomaly) => {
                assert_eq!(anomaly.mismatched_accounts, vec![civ]);
                assert_eq!(anomaly.expected, Decimal::new(100, 0));
                assert_eq!(anomaly.total_balances, Decimal::new(150, 0));
            }
            ConservationResult::Balanced => panic!("expected anomaly"),
        }
    }
}
