//! The append-only log of every currency movement.
//!
//! Entries are never modified or deleted. Amounts use [`Decimal`] so that
//! replaying the log reproduces balances exactly.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use civitas_types::{CivId, LedgerEntry, LedgerEntryType};

/// Append-only ledger of treasury entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// All entries, in insertion order.
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Create a new empty ledger.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Return the number of entries in the ledger.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the ledger has no entries.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a validated entry.
    pub(crate) fn append(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    /// Return all entries, in insertion order.
    pub fn all_entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Return all entries recorded during a given economic cycle.
    pub fn entries_for_cycle(&self, cycle: u64) -> Vec<&LedgerEntry> {
        self.entries.iter().filter(|e| e.cycle == cycle).collect()
    }

    /// Return every entry a civilization took part in.
    pub fn entries_for(&self, civ: CivId) -> Vec<&LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| e.from == Some(civ) || e.to == Some(civ))
            .collect()
    }

    /// Total amount ever minted.
    pub fn total_minted(&self) -> Decimal {
        self.total_of(LedgerEntryType::Mint)
    }

    /// Total amount ever burned.
    pub fn total_burned(&self) -> Decimal {
        self.total_of(LedgerEntryType::Burn)
    }

    fn total_of(&self, entry_type: LedgerEntryType) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.entry_type == entry_type)
            .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.amount))
    }

    /// Net balance of a civilization reconstructed from the log.
    pub fn replayed_balance(&self, civ: CivId) -> Decimal {
        let mut balance = Decimal::ZERO;
        for entry in &self.entries {
            if entry.to == Some(civ) {
                balance = balance.saturating_add(entry.amount);
            }
            if entry.from == Some(civ) {
                balance = balance.saturating_sub(entry.amount);
            }
        }
        balance
    }

    /// Net currency change per civilization during one cycle.
    pub fn net_flow_for_cycle(&self, cycle: u64) -> BTreeMap<CivId, Decimal> {
        let mut flows: BTreeMap<CivId, Decimal> = BTreeMap::new();
        for entry in self.entries.iter().filter(|e| e.cycle == cycle) {
            if let Some(to) = entry.to {
                let v = flows.entry(to).or_insert(Decimal::ZERO);
                *v = v.saturating_add(entry.amount);
            }
            if let Some(from) = entry.from {
                let v = flows.entry(from).or_insert(Decimal::ZERO);
                *v = v.saturating_sub(entry.amount);
            }
        }
        flows
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::TransactionBuilder;

    fn mint(cycle: u64, to: CivId, amount: i64) -> LedgerEntry {
        TransactionBuilder::new(cycle, LedgerEntryType::Mint)
            .to(to)
            .amount(Decimal::new(amount, 0))
            .reason("INCOME")
            .build()
            .unwrap()
    }

    fn pay(cycle: u64, from: CivId, to: CivId, amount: i64) -> LedgerEntry {
        TransactionBuilder::new(cycle, LedgerEntryType::Payment)
            .from(from)
            .to(to)
            .amount(Decimal::new(amount, 0))
            .reason("TRADE")
            .build()
            .unwrap()
    }

    #[test]
    fn new_ledger_is_empty() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.total_minted(), Decimal::ZERO);
    }

    #[test]
    fn replay_follows_payments() {
        let a = CivId::new();
        let b = CivId::new();
        let mut ledger = Ledger::new();
        ledger.append(mint(1, a, 100));
        ledger.append(pay(2, a, b, 30));

        assert_eq!(ledger.replayed_balance(a), Decimal::new(70, 0));
        assert_eq!(ledger.replayed_balance(b), Decimal::new(30, 0));
        assert_eq!(ledger.entries_for(b).len(), 1);
    }

    #[test]
    fn net_flow_is_per_cycle() {
        let a = CivId::new();
        let b = CivId::new();
        let mut ledger = Ledger::new();
        ledger.append(mint(1, a, 100));
        ledger.append(pay(2, a, b, 30));

        let flows = ledger.net_flow_for_cycle(2);
        assert_eq!(flows.get(&a), Some(&Decimal::new(-30, 0)));
        assert_eq!(flows.get(&b), Some(&Decimal::new(30, 0)));
        assert_eq!(ledger.entries_for_cycle(1).len(), 1);
    }
}
