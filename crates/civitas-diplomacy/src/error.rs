//! Error types for the civitas-diplomacy crate.

use civitas_types::{ActionId, AgreementId, CivId, DiplomaticOutcome};

/// Errors that can occur during relation and action operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiplomacyError {
    /// The action id is not in the catalog.
    #[error("unknown diplomatic action: {0}")]
    UnknownAction(ActionId),

    /// An action with the same id is already registered.
    #[error("duplicate diplomatic action: {0}")]
    DuplicateAction(ActionId),

    /// No relation record exists for the pair.
    #[error("no relation between {a} and {b}")]
    NoRelation {
        /// First civilization.
        a: CivId,
        /// Second civilization.
        b: CivId,
    },

    /// A civilization cannot have a relation with itself.
    #[error("civilization {0} cannot relate to itself")]
    SelfRelation(CivId),

    /// The civilization is already part of the graph.
    #[error("civilization already known: {0}")]
    DuplicateCivilization(CivId),

    /// The civilization is not part of the graph.
    #[error("unknown civilization: {0}")]
    UnknownCivilization(CivId),

    /// The agreement does not exist or is no longer active.
    #[error("agreement not found: {0}")]
    UnknownAgreement(AgreementId),

    /// An agreement needs at least two distinct participants.
    #[error("agreement needs at least two distinct participants")]
    TooFewParticipants,

    /// A delivery term has impossible figures.
    #[error("invalid delivery: {reason}")]
    InvalidDelivery {
        /// What is wrong.
        reason: String,
    },
}

impl DiplomacyError {
    /// The outcome reported to callers of the public command surface.
    pub const fn outcome(&self) -> DiplomaticOutcome {
        match self {
            Self::UnknownAction(_) => DiplomaticOutcome::UnknownAction,
            Self::DuplicateAction(_)
            | Self::NoRelation { .. }
            | Self::SelfRelation(_)
            | Self::DuplicateCivilization(_)
            | Self::UnknownCivilization(_)
            | Self::UnknownAgreement(_)
            | Self::TooFewParticipants => DiplomaticOutcome::NoRelation,
            Self::InvalidDelivery { .. } => DiplomaticOutcome::Failed,
        }
    }
}
