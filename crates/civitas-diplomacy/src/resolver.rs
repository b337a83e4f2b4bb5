//! Diplomatic action resolution.
//!
//! A proposal moves through three stages:
//!
//! ```text
//! Proposed --evaluate--> Evaluated --draw--> Succeeded | Failed
//! ```
//!
//! [`evaluate`] is a pure query returning the success chance, so callers
//! can preview an action. [`propose_action`] evaluates, draws, and applies
//! the outcome. Every proposal that reaches a draw records exactly one
//! audit incident on the relation, `+audit_impact` on success and
//! `-audit_impact` on failure.

use rand::Rng;

use civitas_types::{ActionId, AgreementId, CivId, DiplomaticOutcome, IncidentId, SimEvent};

use crate::action::{ActionCatalog, ActionDef, ModifierKind};
use crate::error::DiplomacyError;
use crate::graph::RelationGraph;
use crate::relation::{Relation, RelationKey};
use crate::view::WorldView;

/// A proposed action from one civilization to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    /// The proposing civilization.
    pub from: CivId,
    /// The target civilization.
    pub to: CivId,
    /// The action.
    pub action: ActionId,
}

/// Why an evaluated proposal cannot succeed.
#[derive(Debug, Clone, PartialEq)]
pub enum Blocker {
    /// The proposer lacks these capabilities.
    MissingPrerequisites(Vec<String>),
    /// The proposer cannot pay the economic cost.
    Unaffordable {
        /// The cost.
        cost: f64,
    },
}

/// Result of evaluating a proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Chance in `[0, 1]`; zero when blocked.
    pub chance: f64,
    /// Chance before clamping and blockers.
    pub raw_chance: f64,
    /// What forces the chance to zero, if anything.
    pub blocker: Option<Blocker>,
}

/// A consequence the rest of the simulation must apply.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    /// Burn the economic cost from the proposer's treasury.
    ChargeCost {
        /// Who pays.
        civ: CivId,
        /// How much.
        amount: f64,
    },
    /// Open, or resume, the trade route between the two markets.
    OpenTradeRoute {
        /// First civilization.
        a: CivId,
        /// Second civilization.
        b: CivId,
    },
}

/// Everything that happened when a proposal was resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// `Succeeded` or `Failed`.
    pub outcome: DiplomaticOutcome,
    /// The evaluation the draw was compared against.
    pub evaluation: Evaluation,
    /// The uniform draw in `[0, 1)`.
    pub draw: f64,
    /// The audit incident recorded.
    pub incident: IncidentId,
    /// Agreement signed on success, if the action signs one.
    pub agreement: Option<AgreementId>,
    /// Effects for the caller to apply.
    pub side_effects: Vec<SideEffect>,
    /// Events produced.
    pub events: Vec<SimEvent>,
}

/// Value of one modifier for a pair, in `[-1, 1]`.
pub fn modifier_value(
    kind: &ModifierKind,
    proposal: &Proposal,
    relation: &Relation,
    world: &impl WorldView,
    trade_scale: f64,
) -> f64 {
    let from = world.profile(proposal.from);
    let to = world.profile(proposal.to);
    match kind {
        ModifierKind::ExistingTrade => {
            if trade_scale > 0.0 {
                (world.trade_volume(proposal.from, proposal.to).max(0.0) / trade_scale).tanh()
            } else {
                0.0
            }
        }
        ModifierKind::CulturalSimilarity => match (from, to) {
            (Some(a), Some(b)) => a.cultural_similarity(b),
            _ => 0.0,
        },
        ModifierKind::SharedTechnology => match (from, to) {
            (Some(a), Some(b)) => a.shared_technology(b),
            _ => 0.0,
        },
        ModifierKind::MilitaryStrength => match (from, to) {
            (Some(a), Some(b)) => military_advantage(a.unit_count, b.unit_count),
            _ => 0.0,
        },
        ModifierKind::CulturalDevelopment => from.map_or(0.0, |a| {
            let traits = u32::try_from(a.culture_traits.len()).unwrap_or(u32::MAX);
            (f64::from(traits) / 5.0).tanh()
        }),
        ModifierKind::SharedReligion => match (from, to) {
            (Some(a), Some(b)) => {
                let shared = a
                    .culture_traits
                    .intersection(&b.culture_traits)
                    .any(|t| t.starts_with("religion:"));
                if shared { 1.0 } else { 0.0 }
            }
            _ => 0.0,
        },
        ModifierKind::RecentConflicts => {
            let hostile = u32::try_from(relation.hostile_incident_count()).unwrap_or(u32::MAX);
            (f64::from(hostile) / 3.0).tanh()
        }
        ModifierKind::Named(cause) => (relation.modifier(cause) / 100.0).clamp(-1.0, 1.0),
    }
}

#[allow(clippy::cast_precision_loss)]
fn military_advantage(mine: u64, theirs: u64) -> f64 {
    let total = mine.saturating_add(theirs);
    if total == 0 {
        return 0.0;
    }
    (mine as f64 - theirs as f64) / total as f64
}

/// Compute the success chance of a proposal without changing anything:
///
/// ```text
/// chance = base_success + score * score_chance_factor
///        + Σ modifier_value * weight
///        + recent_incident_aggregate * incident_chance_weight
/// ```
///
/// clamped to `[0, 1]`, and forced to 0 when the proposer lacks a
/// prerequisite or cannot afford the cost.
///
/// # Errors
///
/// Returns [`DiplomacyError::UnknownAction`] or
/// [`DiplomacyError::NoRelation`].
pub fn evaluate(
    graph: &RelationGraph,
    catalog: &ActionCatalog,
    proposal: &Proposal,
    world: &impl WorldView,
    now: f64,
) -> Result<Evaluation, DiplomacyError> {
    let action = lookup(catalog, proposal)?;
    let relation = graph
        .relation(proposal.from, proposal.to)
        .ok_or(DiplomacyError::NoRelation {
            a: proposal.from,
            b: proposal.to,
        })?;
    Ok(evaluate_with(graph, action, relation, proposal, world, now))
}

fn lookup<'a>(catalog: &'a ActionCatalog, proposal: &Proposal) -> Result<&'a ActionDef, DiplomacyError> {
    catalog
        .get(&proposal.action)
        .ok_or_else(|| DiplomacyError::UnknownAction(proposal.action.clone()))
}

fn evaluate_with(
    graph: &RelationGraph,
    action: &ActionDef,
    relation: &Relation,
    proposal: &Proposal,
    world: &impl WorldView,
    now: f64,
) -> Evaluation {
    let params = graph.params();
    let modifiers: f64 = action
        .modifiers
        .iter()
        .map(|m| modifier_value(&m.kind, proposal, relation, world, params.drift.trade_scale) * m.weight)
        .sum();
    let raw_chance = action.base_success
        + relation.score() * params.score_chance_factor
        + modifiers
        + relation.recent_incident_aggregate(now, params.half_life_days) * params.incident_chance_weight;

    let blocker = match world.profile(proposal.from) {
        Some(profile) => {
            let missing = action.missing_prerequisites(&profile.capabilities);
            if missing.is_empty() {
                None
            } else {
                Some(Blocker::MissingPrerequisites(
                    missing.into_iter().map(str::to_owned).collect(),
                ))
            }
        }
        None if action.prerequisites.is_empty() => None,
        None => Some(Blocker::MissingPrerequisites(
            action.prerequisites.iter().cloned().collect(),
        )),
    };
    let blocker = blocker.or_else(|| {
        (action.economic_cost > 0.0 && !world.can_afford(proposal.from, action.economic_cost))
            .then_some(Blocker::Unaffordable {
                cost: action.economic_cost,
            })
    });

    let chance = if blocker.is_some() || !raw_chance.is_finite() {
        0.0
    } else {
        raw_chance.clamp(0.0, 1.0)
    };
    Evaluation {
        chance,
        raw_chance,
        blocker,
    }
}

/// Evaluate, draw, and apply a proposal.
///
/// On success the score moves by the action's impact, the cultural impact
/// is added to the relation's `"cultural"` modifier, an agreement is signed
/// if the action defines one, and the cost and route side effects are
/// returned for the caller to apply.
///
/// # Errors
///
/// Returns [`DiplomacyError::UnknownAction`] or
/// [`DiplomacyError::NoRelation`]; nothing is recorded in that case.
pub fn propose_action(
    graph: &mut RelationGraph,
    catalog: &ActionCatalog,
    proposal: &Proposal,
    world: &impl WorldView,
    rng: &mut impl Rng,
    now: f64,
) -> Result<Resolution, DiplomacyError> {
    let action = lookup(catalog, proposal)?;
    let relation = graph
        .relation(proposal.from, proposal.to)
        .ok_or(DiplomacyError::NoRelation {
            a: proposal.from,
            b: proposal.to,
        })?;
    let key = relation.key;
    let evaluation = evaluate_with(graph, action, relation, proposal, world, now);

    let draw: f64 = rng.random();
    let succeeded = draw < evaluation.chance;
    let mut events = Vec::new();
    let mut side_effects = Vec::new();
    let mut agreement = None;

    if succeeded {
        apply_success(graph, action, proposal, key)?;
        if let Some(kind) = &action.agreement {
            let (id, event) =
                graph.create_agreement(kind.clone(), &[proposal.from, proposal.to], action.terms.clone(), now)?;
            agreement = Some(id);
            events.push(event);
            side_effects.push(SideEffect::OpenTradeRoute {
                a: proposal.from,
                b: proposal.to,
            });
        }
        if action.economic_cost > 0.0 {
            side_effects.push(SideEffect::ChargeCost {
                civ: proposal.from,
                amount: action.economic_cost,
            });
        }
    }

    let audit = if succeeded {
        graph.params().audit_impact
    } else {
        -graph.params().audit_impact
    };
    let (incident, event) = graph
        .record_audit(key, proposal.action.as_str(), audit, now)
        .ok_or(DiplomacyError::NoRelation {
            a: proposal.from,
            b: proposal.to,
        })?;
    events.push(event);
    events.extend(graph.refresh_status(key));

    let outcome = if succeeded {
        DiplomaticOutcome::Succeeded
    } else {
        DiplomaticOutcome::Failed
    };
    tracing::info!(
        from = %proposal.from,
        to = %proposal.to,
        action = %proposal.action,
        chance = evaluation.chance,
        draw,
        ?outcome,
        blocked = evaluation.blocker.is_some(),
        "diplomatic action resolved"
    );

    Ok(Resolution {
        outcome,
        evaluation,
        draw,
        incident,
        agreement,
        side_effects,
        events,
    })
}

fn apply_success(
    graph: &mut RelationGraph,
    action: &ActionDef,
    proposal: &Proposal,
    key: RelationKey,
) -> Result<(), DiplomacyError> {
    let scale = graph.params().cultural_modifier_scale;
    let relation = graph.relation_mut(key.low(), key.high())?;
    relation.adjust_score(action.relationship_impact);
    if action.cultural_impact.abs() > 0.0 {
        relation.add_modifier("cultural", action.cultural_impact * scale);
    }
    tracing::debug!(from = %proposal.from, to = %proposal.to, score = relation.score(), "action succeeded");
    Ok(())
}
