//! Shared type definitions for the Civitas economy and diplomacy engine.
//!
//! This crate holds the identifiers, enumerations, and event payloads that
//! flow between the economy, diplomacy, treasury, and core crates, and out
//! to UI consumers via `ts-rs` bindings.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifiers (UUID v7 ids and configured string keys)
//! - [`enums`] -- Statuses, outcomes, categories
//! - [`events`] -- [`SimEvent`] notifications for subscribers
//! - [`structs`] -- Shared records ([`CivProfile`], [`LedgerEntry`])

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

pub use enums::{
    AgreementEndReason, AgreementKind, BonusSource, CycleKind, DiplomaticOutcome,
    DiplomaticStatus, IncidentCategory, LedgerEntryType, TradeOutcome,
};
pub use events::SimEvent;
pub use ids::{ActionId, AgreementId, CivId, IncidentId, LedgerEntryId, MarketId, ResourceId, RouteId};
pub use structs::{CivProfile, LedgerEntry, Position, ProductionBonus};

#[cfg(test)]
mod tests {
    //! Binding generation for UI consumers.

    #[test]
    fn export_bindings() {
        // ts-rs writes `.ts` files for every `#[ts(export)]` type when
        // `export_all` is called.
        use ts_rs::TS;

        let _ = crate::ids::CivId::export_all();
        let _ = crate::ids::MarketId::export_all();
        let _ = crate::ids::RouteId::export_all();
        let _ = crate::ids::IncidentId::export_all();
        let _ = crate::ids::AgreementId::export_all();
        let _ = crate::ids::LedgerEntryId::export_all();
        let _ = crate::ids::ResourceId::export_all();
        let _ = crate::ids::ActionId::export_all();

        let _ = crate::enums::DiplomaticStatus::export_all();
        let _ = crate::enums::IncidentCategory::export_all();
        let _ = crate::enums::AgreementKind::export_all();
        let _ = crate::enums::AgreementEndReason::export_all();
        let _ = crate::enums::DiplomaticOutcome::export_all();
        let _ = crate::enums::TradeOutcome::export_all();
        let _ = crate::enums::BonusSource::export_all();
        let _ = crate::enums::CycleKind::export_all();
        let _ = crate::enums::LedgerEntryType::export_all();

        let _ = crate::events::SimEvent::export_all();
        let _ = crate::structs::LedgerEntry::export_all();
        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::ProductionBonus::export_all();
        let _ = crate::structs::CivProfile::export_all();
    }
}
