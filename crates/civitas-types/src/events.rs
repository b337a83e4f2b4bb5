//! Notifications emitted by the engine for UI and AI subscribers.
//!
//! Events are buffered while a cycle or command runs and delivered to
//! subscribers when it completes, so every event is delivered at least once
//! per cycle and never mid-mutation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{
    AgreementEndReason, AgreementKind, CycleKind, DiplomaticStatus, IncidentCategory,
};
use crate::ids::{AgreementId, CivId, IncidentId, MarketId, ResourceId, RouteId};

/// A single engine notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SimEvent {
    /// A market committed a new price for a resource.
    ResourcePriceChanged {
        /// The market whose price changed.
        market: MarketId,
        /// The resource repriced.
        resource: ResourceId,
        /// Previous committed price.
        old_price: f64,
        /// Newly committed price.
        new_price: f64,
    },
    /// A market's stock of a resource changed during production or consumption.
    ResourceQuantityChanged {
        /// The market whose stock changed.
        market: MarketId,
        /// The resource.
        resource: ResourceId,
        /// Stock after the change.
        quantity: f64,
    },
    /// Goods moved between two markets, by explicit trade or route flow.
    TradeExecuted {
        /// Route that carried the goods.
        route: RouteId,
        /// Receiving market.
        buyer: MarketId,
        /// Supplying market.
        seller: MarketId,
        /// The resource traded.
        resource: ResourceId,
        /// Amount delivered.
        amount: f64,
        /// Total currency paid by the buyer.
        total_cost: f64,
    },
    /// A dynamic agreement was signed.
    TradeAgreementCreated {
        /// The new agreement.
        agreement: AgreementId,
        /// The agreement kind.
        kind: AgreementKind,
        /// All participants.
        participants: Vec<CivId>,
    },
    /// A dynamic agreement ended and was removed from every relation.
    AgreementEnded {
        /// The agreement that ended.
        agreement: AgreementId,
        /// Why it ended.
        reason: AgreementEndReason,
    },
    /// The coarse status between two civilizations changed.
    DiplomaticStatusChanged {
        /// First civilization of the canonical pair.
        civ_a: CivId,
        /// Second civilization of the canonical pair.
        civ_b: CivId,
        /// Status before the change.
        old_status: DiplomaticStatus,
        /// Status after the change.
        new_status: DiplomaticStatus,
    },
    /// A diplomatic incident was appended to a relation.
    IncidentRecorded {
        /// First civilization of the canonical pair.
        civ_a: CivId,
        /// Second civilization of the canonical pair.
        civ_b: CivId,
        /// The incident.
        incident: IncidentId,
        /// Incident category.
        category: IncidentCategory,
        /// Free-form type tag (usually the action id).
        tag: String,
        /// Signed initial impact.
        impact: f64,
    },
    /// A new trade route opened.
    RouteCreated {
        /// The new route.
        route: RouteId,
        /// One endpoint.
        source: MarketId,
        /// The other endpoint.
        destination: MarketId,
    },
    /// A route stopped carrying goods. History is preserved.
    RouteDeactivated {
        /// The route.
        route: RouteId,
    },
    /// A previously deactivated route resumed.
    RouteReactivated {
        /// The route.
        route: RouteId,
    },
    /// A civilization joined the simulation.
    CivilizationAdded {
        /// The civilization.
        civ: CivId,
        /// Display name.
        name: String,
    },
    /// A civilization was destroyed.
    CivilizationRemoved {
        /// The civilization.
        civ: CivId,
    },
    /// A scheduled cycle finished.
    CycleCompleted {
        /// Which cycle.
        kind: CycleKind,
        /// 1-based cycle counter for that kind.
        cycle: u64,
    },
}

impl SimEvent {
    /// Short machine-readable name of the event variant.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ResourcePriceChanged { .. } => "resource_price_changed",
            Self::ResourceQuantityChanged { .. } => "resource_quantity_changed",
            Self::TradeExecuted { .. } => "trade_executed",
            Self::TradeAgreementCreated { .. } => "trade_agreement_created",
            Self::AgreementEnded { .. } => "agreement_ended",
            Self::DiplomaticStatusChanged { .. } => "diplomatic_status_changed",
            Self::IncidentRecorded { .. } => "incident_recorded",
            Self::RouteCreated { .. } => "route_created",
            Self::RouteDeactivated { .. } => "route_deactivated",
            Self::RouteReactivated { .. } => "route_reactivated",
            Self::CivilizationAdded { .. } => "civilization_added",
            Self::CivilizationRemoved { .. } => "civilization_removed",
            Self::CycleCompleted { .. } => "cycle_completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_type_tag() {
        let event = SimEvent::RouteDeactivated {
            route: RouteId::new(),
        };
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(
            json.get("type").and_then(serde_json::Value::as_str),
            Some(event.name())
        );
    }
}
