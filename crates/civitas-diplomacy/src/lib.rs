//! Diplomacy subsystem for the Civitas engine.
//!
//! Tracks one relation per unordered pair of civilizations: a score in
//! `[-100, 100]`, named modifiers, decaying incidents, and the agreements
//! both sides take part in. The [`RelationGraph`] is aged once per
//! diplomacy cycle; the [`resolver`] evaluates and applies diplomatic
//! actions on demand.
//!
//! The rest of the world is read through [`WorldView`], and the graph is
//! exposed to the economy through `civitas_economy::RelationView`.
//!
//! # Modules
//!
//! - [`relation`] -- Canonical pair keys and relation records
//! - [`incident`] -- Decaying incidents
//! - [`agreement`] -- Agreements, terms, and compliance
//! - [`drift`] -- Natural score drift
//! - [`graph`] -- The relation graph and its cycle
//! - [`action`] -- The action catalog
//! - [`resolver`] -- Proposal evaluation and resolution
//! - [`view`] -- The world seam
//! - [`params`] -- Tunable constants
//! - [`error`] -- Error types

pub mod action;
pub mod agreement;
pub mod drift;
pub mod error;
pub mod graph;
pub mod incident;
pub mod params;
pub mod relation;
pub mod resolver;
pub mod view;

pub use action::{ActionCatalog, ActionDef, ActionModifier, ModifierKind};
pub use agreement::{Agreement, AgreementTerm, Delivery};
pub use drift::{DriftInputs, DriftModel, WeightedDrift};
pub use error::DiplomacyError;
pub use graph::{RelationGraph, initial_score};
pub use incident::Incident;
pub use params::{DiplomacyParams, DriftWeights, InitialScoreWeights, StatusThresholds};
pub use relation::{Relation, RelationKey};
pub use resolver::{Blocker, Evaluation, Proposal, Resolution, SideEffect, evaluate, propose_action};
pub use view::WorldView;
