//! The catalog of diplomatic actions.
//!
//! Actions are data: each [`ActionDef`] names its base success chance,
//! relationship and cultural impact, economic cost, prerequisite
//! capabilities, and a table of weighted [`ModifierKind`]s that adjust the
//! chance for a particular pair.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use civitas_types::{ActionId, AgreementKind};

use crate::agreement::AgreementTerm;
use crate::error::DiplomacyError;

/// A fact about a civilization pair that shifts an action's chance.
///
/// Every kind evaluates to a value in `[-1, 1]` (see
/// [`crate::resolver::modifier_value`]) which is multiplied by its weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    /// Saturated lifetime trade between the pair.
    ExistingTrade,
    /// Jaccard similarity of culture traits.
    CulturalSimilarity,
    /// Jaccard similarity of capabilities.
    SharedTechnology,
    /// Proposer's military advantage, `(mine - theirs) / (mine + theirs)`.
    MilitaryStrength,
    /// Saturated count of the proposer's culture traits.
    CulturalDevelopment,
    /// 1 when both share a `religion:` culture trait.
    SharedReligion,
    /// Saturated count of recent hostile incidents.
    RecentConflicts,
    /// A named modifier of the relation, divided by 100.
    Named(String),
}

/// One weighted entry of an action's modifier table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionModifier {
    /// What is measured.
    pub kind: ModifierKind,
    /// Chance added per unit of the measured value.
    pub weight: f64,
}

/// A diplomatic action definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    /// Catalog key.
    pub id: ActionId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Display description.
    #[serde(default)]
    pub description: String,
    /// Chance before any adjustment.
    pub base_success: f64,
    /// Score change on success.
    #[serde(default)]
    pub relationship_impact: f64,
    /// Cultural influence on success.
    #[serde(default)]
    pub cultural_impact: f64,
    /// Currency the proposer pays on success.
    #[serde(default)]
    pub economic_cost: f64,
    /// Capabilities the proposer must have.
    #[serde(default)]
    pub prerequisites: BTreeSet<String>,
    /// Chance adjustments.
    #[serde(default)]
    pub modifiers: Vec<ActionModifier>,
    /// Agreement signed on success, if any.
    #[serde(default)]
    pub agreement: Option<AgreementKind>,
    /// Terms of that agreement.
    #[serde(default)]
    pub terms: Vec<AgreementTerm>,
}

impl ActionDef {
    /// Prerequisites `capabilities` lacks.
    pub fn missing_prerequisites<'a>(&'a self, capabilities: &BTreeSet<String>) -> Vec<&'a str> {
        self.prerequisites
            .iter()
            .filter(|tag| !capabilities.contains(*tag))
            .map(String::as_str)
            .collect()
    }
}

/// Registered actions keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionCatalog {
    actions: BTreeMap<ActionId, ActionDef>,
}

impl ActionCatalog {
    /// An empty catalog.
    pub const fn new() -> Self {
        Self {
            actions: BTreeMap::new(),
        }
    }

    /// A catalog holding the standard `trade_agreement` and
    /// `cultural_exchange` actions.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        for action in standard_actions() {
            catalog.actions.insert(action.id.clone(), action);
        }
        catalog
    }

    /// Register an action.
    ///
    /// # Errors
    ///
    /// Returns [`DiplomacyError::DuplicateAction`] if the id is taken.
    pub fn register(&mut self, action: ActionDef) -> Result<(), DiplomacyError> {
        if self.actions.contains_key(&action.id) {
            return Err(DiplomacyError::DuplicateAction(action.id));
        }
        self.actions.insert(action.id.clone(), action);
        Ok(())
    }

    /// Look up an action.
    pub fn get(&self, id: &ActionId) -> Option<&ActionDef> {
        self.actions.get(id)
    }

    /// All action ids.
    pub fn ids(&self) -> impl Iterator<Item = &ActionId> {
        self.actions.keys()
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// The standard action set.
pub fn standard_actions() -> Vec<ActionDef> {
    vec![
        ActionDef {
            id: ActionId::from("trade_agreement"),
            name: "Establish Trade Route".to_owned(),
            description: "Propose a formal trade agreement".to_owned(),
            base_success: 0.7,
            relationship_impact: 10.0,
            cultural_impact: 5.0,
            economic_cost: 100.0,
            prerequisites: ["market", "roads"].into_iter().map(str::to_owned).collect(),
            modifiers: vec![
                ActionModifier {
                    kind: ModifierKind::ExistingTrade,
                    weight: 0.2,
                },
                ActionModifier {
                    kind: ModifierKind::CulturalSimilarity,
                    weight: 0.1,
                },
                ActionModifier {
                    kind: ModifierKind::MilitaryStrength,
                    weight: -0.05,
                },
            ],
            agreement: Some(AgreementKind::Trade),
            terms: vec![AgreementTerm::MinRelationScore { score: -20.0 }],
        },
        ActionDef {
            id: ActionId::from("cultural_exchange"),
            name: "Cultural Exchange Program".to_owned(),
            description: "Establish cultural exchange between civilizations".to_owned(),
            base_success: 0.8,
            relationship_impact: 15.0,
            cultural_impact: 20.0,
            economic_cost: 150.0,
            prerequisites: ["writing", "cultural_center"].into_iter().map(str::to_owned).collect(),
            modifiers: vec![
                ActionModifier {
                    kind: ModifierKind::CulturalDevelopment,
                    weight: 0.3,
                },
                ActionModifier {
                    kind: ModifierKind::SharedReligion,
                    weight: 0.2,
                },
                ActionModifier {
                    kind: ModifierKind::RecentConflicts,
                    weight: -0.4,
                },
            ],
            agreement: None,
            terms: Vec::new(),
        },
    ]
}
