//! Event logging.
//!
//! [`LogSubscriber`] is registered on the simulation's event bus and writes
//! each event to the log as it is published: lifecycle and diplomatic
//! changes at `info`, market and cycle chatter at `trace`. The runner
//! drains the bus buffer every tick and feeds it to an [`EventTally`] so
//! the shutdown summary can report totals per event kind.

use std::collections::BTreeMap;

use civitas_core::EventSubscriber;
use civitas_types::SimEvent;
use tracing::{info, trace};

/// Bus subscriber that writes events to the log.
#[derive(Debug, Default)]
pub struct LogSubscriber;

impl EventSubscriber for LogSubscriber {
    fn on_event(&mut self, event: &SimEvent) {
        match event {
            SimEvent::CivilizationAdded { civ, name } => {
                info!(civ = %civ, name = %name, "civilization added");
            }
            SimEvent::CivilizationRemoved { civ } => info!(civ = %civ, "civilization removed"),
            SimEvent::TradeAgreementCreated {
                agreement,
                kind,
                participants,
            } => {
                info!(agreement = %agreement, ?kind, participants = participants.len(), "agreement signed");
            }
            SimEvent::AgreementEnded { agreement, reason } => {
                info!(agreement = %agreement, ?reason, "agreement ended");
            }
            SimEvent::DiplomaticStatusChanged {
                civ_a,
                civ_b,
                old_status,
                new_status,
            } => {
                info!(civ_a = %civ_a, civ_b = %civ_b, ?old_status, ?new_status, "status changed");
            }
            SimEvent::RouteCreated {
                route,
                source,
                destination,
            } => {
                info!(route = %route, source = %source, destination = %destination, "route opened");
            }
            SimEvent::RouteDeactivated { route } => info!(route = %route, "route closed"),
            other => trace!(event = other.name(), ?other, "event"),
        }
    }
}

/// Running count of drained events per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTally {
    counts: BTreeMap<&'static str, u64>,
    total: u64,
}

impl EventTally {
    /// Count a batch of drained events.
    pub fn record(&mut self, events: &[SimEvent]) {
        for event in events {
            let count = self.counts.entry(event.name()).or_insert(0);
            *count = count.saturating_add(1);
            self.total = self.total.saturating_add(1);
        }
    }

    /// Events counted so far.
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Count for one event kind.
    pub fn count(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Write one line per event kind.
    pub fn log_summary(&self) {
        for (name, count) in &self.counts {
            info!(event = name, count, "event totals");
        }
    }
}

#[cfg(test)]
mod tests {
    use civitas_types::{CivId, CycleKind};

    use super::*;

    #[test]
    fn tally_counts_by_kind() {
        let mut tally = EventTally::default();
        let civ = CivId::new();
        tally.record(&[
            SimEvent::CycleCompleted {
                kind: CycleKind::Economic,
                cycle: 1,
            },
            SimEvent::CycleCompleted {
                kind: CycleKind::Diplomatic,
                cycle: 1,
            },
            SimEvent::CivilizationRemoved { civ },
        ]);
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.count("cycle_completed"), 2);
        assert_eq!(tally.count("civilization_removed"), 1);
        assert_eq!(tally.count("trade_executed"), 0);
    }
}
