//! Enumeration types shared across the Civitas workspace.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Diplomacy
// ---------------------------------------------------------------------------

/// Coarse diplomatic status derived from a relationship score.
///
/// Ordered from most hostile to most friendly so that comparisons such as
/// `status >= DiplomaticStatus::Friendly` read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum DiplomaticStatus {
    /// Open conflict. Trade routes between the pair are suspended.
    War,
    /// Tense relations short of war.
    Hostile,
    /// No strong feelings either way.
    Neutral,
    /// Warm relations.
    Friendly,
    /// Close partnership.
    Allied,
}

/// Category of a diplomatic incident, used by subscribers to route
/// notifications (cultural incidents to culture panels, and so on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum IncidentCategory {
    /// Outcome of a proposed diplomatic action.
    Diplomatic,
    /// Cultural friction or exchange.
    Cultural,
    /// Trade dispute, embargo, or economic favor.
    Economic,
    /// Breach of a dynamic agreement.
    Breach,
}

/// The kind of a dynamic agreement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum AgreementKind {
    /// Formal trade partnership.
    Trade,
    /// Cultural exchange program.
    CulturalExchange,
    /// Promise not to attack each other.
    NonAggression,
    /// Promise to defend each other.
    DefensivePact,
    /// Caller-defined agreement type.
    Custom(String),
}

/// Why a dynamic agreement stopped being active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum AgreementEndReason {
    /// The end time passed.
    Expired,
    /// Compliance fell below the breach threshold.
    Breached,
    /// A participant civilization no longer exists.
    ParticipantRemoved,
    /// Explicitly terminated by a caller.
    Terminated,
}

/// Outcome of a diplomatic action proposal, as reported to external callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum DiplomaticOutcome {
    /// The action was evaluated and succeeded.
    Succeeded,
    /// The action was evaluated and failed.
    Failed,
    /// No action with the given id is registered.
    UnknownAction,
    /// No relation exists between the two civilizations.
    NoRelation,
}

// ---------------------------------------------------------------------------
// Economy
// ---------------------------------------------------------------------------

/// Outcome of a trade proposal, as reported to external callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum TradeOutcome {
    /// Goods and payment changed hands.
    Success,
    /// The buyer cannot cover the total cost.
    InsufficientFunds,
    /// The seller does not hold the requested amount.
    InsufficientSupply,
    /// No active route connects the two markets.
    NoRoute,
    /// The resource is not registered.
    InvalidResource,
    /// Unknown market or a non-positive amount.
    InvalidRequest,
}

/// Where a production bonus comes from.
///
/// The three sources are summed additively into the production multiplier
/// `1 + technology + building + civilization`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BonusSource {
    /// Researched technology.
    Technology,
    /// Constructed buildings.
    Building,
    /// Civilization-specific trait.
    Civilization,
}

/// Which scheduled cycle ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum CycleKind {
    /// Production, consumption, market, route, pricing pass.
    Economic,
    /// Relation drift, incident aging, agreement compliance pass.
    Diplomatic,
}

// ---------------------------------------------------------------------------
// Treasury
// ---------------------------------------------------------------------------

/// The category of a treasury ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum LedgerEntryType {
    /// Currency created from nothing (income, opening balance).
    Mint,
    /// Currency destroyed (diplomatic costs, upkeep).
    Burn,
    /// Currency moved from one civilization to another.
    Payment,
}
