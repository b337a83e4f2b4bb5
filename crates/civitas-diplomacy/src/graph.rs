//! The diplomatic relation graph.
//!
//! One [`Relation`] per unordered pair of known civilizations, plus every
//! agreement ever signed. The graph is aged once per diplomacy cycle by
//! [`RelationGraph::decay_cycle`]: incidents decay and are pruned, scores
//! drift, agreements are checked for expiry, missing participants, and
//! breach, and status changes are reported as events.
//!
//! # Invariants
//!
//! - Every score stays in `[-100, 100]` after every mutation.
//! - Aging is proportional to elapsed simulated time, so a second
//!   `decay_cycle` at the same `now` changes nothing.
//! - An ended agreement is removed from every participant relation in the
//!   same call that ends it.

use std::collections::{BTreeMap, BTreeSet};

use civitas_economy::RelationView;
use civitas_types::{
    AgreementEndReason, AgreementId, AgreementKind, CivId, CivProfile, DiplomaticStatus,
    IncidentCategory, IncidentId, SimEvent,
};

use crate::agreement::{Agreement, AgreementTerm, Delivery};
use crate::drift::{DriftInputs, DriftModel};
use crate::error::DiplomacyError;
use crate::incident::Incident;
use crate::params::{DiplomacyParams, InitialScoreWeights};
use crate::relation::{Relation, RelationKey, clamp_score};
use crate::view::WorldView;

/// Initial score between two civilizations:
/// `similarity * 20 + proximity * 10 + history * 15`, clamped, where
/// proximity falls linearly from 1 (adjacent) to -0.5 at the proximity range.
pub fn initial_score(a: &CivProfile, b: &CivProfile, history: f64, weights: &InitialScoreWeights) -> f64 {
    let t = if weights.proximity_range > 0.0 {
        (a.distance_to(b) / weights.proximity_range).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let proximity = 1.0 + (-0.5 - 1.0) * t;
    clamp_score(
        a.cultural_similarity(b) * weights.similarity
            + proximity * weights.proximity
            + history * weights.history,
    )
}

/// All relations and agreements.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    civs: BTreeSet<CivId>,
    relations: BTreeMap<RelationKey, Relation>,
    agreements: BTreeMap<AgreementId, Agreement>,
    params: DiplomacyParams,
}

impl RelationGraph {
    /// An empty graph.
    pub fn new(params: DiplomacyParams) -> Self {
        Self {
            civs: BTreeSet::new(),
            relations: BTreeMap::new(),
            agreements: BTreeMap::new(),
            params,
        }
    }

    /// The parameters in use.
    pub const fn params(&self) -> &DiplomacyParams {
        &self.params
    }

    /// Known civilizations.
    pub const fn civilizations(&self) -> &BTreeSet<CivId> {
        &self.civs
    }

    /// Whether `civ` is known.
    pub fn contains(&self, civ: CivId) -> bool {
        self.civs.contains(&civ)
    }

    /// Add a civilization and a relation with every known one.
    ///
    /// `shared_history` holds a value in `[-1, 1]` per existing civilization;
    /// missing entries count as 0. Civilizations the world has no profile
    /// for start at a neutral score.
    ///
    /// Returns the number of relations created.
    ///
    /// # Errors
    ///
    /// Returns [`DiplomacyError::DuplicateCivilization`] if already known.
    pub fn add_civilization(
        &mut self,
        profile: &CivProfile,
        world: &impl WorldView,
        shared_history: &BTreeMap<CivId, f64>,
        now: f64,
    ) -> Result<usize, DiplomacyError> {
        if self.civs.contains(&profile.id) {
            return Err(DiplomacyError::DuplicateCivilization(profile.id));
        }
        let mut created: usize = 0;
        for other in &self.civs {
            let Some(key) = RelationKey::new(profile.id, *other) else {
                continue;
            };
            let history = shared_history.get(other).copied().unwrap_or(0.0).clamp(-1.0, 1.0);
            let score = world
                .profile(*other)
                .map_or(0.0, |o| initial_score(profile, o, history, &self.params.initial));
            let status = self.params.status.status_for(score);
            self.relations.insert(key, Relation::new(key, score, status, now));
            created = created.saturating_add(1);
        }
        self.civs.insert(profile.id);
        tracing::info!(civ = %profile.id, name = %profile.name, relations = created, "civilization joined relation graph");
        Ok(created)
    }

    /// Remove a civilization and every relation it takes part in.
    ///
    /// Agreements it signed are ended by the next [`Self::decay_cycle`].
    ///
    /// # Errors
    ///
    /// Returns [`DiplomacyError::UnknownCivilization`] if not known.
    pub fn remove_civilization(&mut self, civ: CivId) -> Result<usize, DiplomacyError> {
        if !self.civs.remove(&civ) {
            return Err(DiplomacyError::UnknownCivilization(civ));
        }
        let before = self.relations.len();
        self.relations.retain(|key, _| !key.contains(civ));
        let removed = before.saturating_sub(self.relations.len());
        tracing::info!(civ = %civ, relations_removed = removed, "civilization left relation graph");
        Ok(removed)
    }

    /// The relation for a pair, in either order.
    pub fn relation(&self, a: CivId, b: CivId) -> Option<&Relation> {
        RelationKey::new(a, b).and_then(|key| self.relations.get(&key))
    }

    pub(crate) fn relation_mut(&mut self, a: CivId, b: CivId) -> Result<&mut Relation, DiplomacyError> {
        let key = RelationKey::new(a, b).ok_or(DiplomacyError::SelfRelation(a))?;
        self.relations.get_mut(&key).ok_or(DiplomacyError::NoRelation { a, b })
    }

    /// Iterate over all relations.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    /// Score for a pair.
    pub fn score(&self, a: CivId, b: CivId) -> Option<f64> {
        self.relation(a, b).map(Relation::score)
    }

    /// Status for a pair.
    pub fn status(&self, a: CivId, b: CivId) -> Option<DiplomaticStatus> {
        self.relation(a, b).map(|r| r.status)
    }

    /// Look up an agreement, active or ended.
    pub fn agreement(&self, id: AgreementId) -> Option<&Agreement> {
        self.agreements.get(&id)
    }

    /// Iterate over all agreements.
    pub fn agreements(&self) -> impl Iterator<Item = &Agreement> {
        self.agreements.values()
    }

    /// Number of agreements still in force.
    pub fn active_agreement_count(&self) -> usize {
        self.agreements.values().filter(|a| a.active).count()
    }

    /// Record an externally reported incident and apply
    /// `impact * incident_weight` to the score.
    ///
    /// # Errors
    ///
    /// Returns [`DiplomacyError::NoRelation`] if the pair has no relation.
    pub fn record_incident(
        &mut self,
        a: CivId,
        b: CivId,
        tag: &str,
        category: IncidentCategory,
        impact: f64,
        now: f64,
    ) -> Result<Vec<SimEvent>, DiplomacyError> {
        let weight = self.params.incident_weight;
        let decay_rate = self.params.incident_decay_rate;
        let relation = self.relation_mut(a, b)?;
        let incident = Incident::new(tag, category, impact, decay_rate, now);
        let mut events = vec![incident_event(relation.key, &incident)];
        relation.incidents.push(incident);
        relation.adjust_score(impact * weight);
        let key = relation.key;
        tracing::debug!(civ_a = %a, civ_b = %b, tag, impact, "incident recorded");
        events.extend(self.refresh_status(key));
        Ok(events)
    }

    /// Append an incident without moving the score.
    pub(crate) fn record_audit(
        &mut self,
        key: RelationKey,
        tag: &str,
        impact: f64,
        now: f64,
    ) -> Option<(IncidentId, SimEvent)> {
        let decay_rate = self.params.incident_decay_rate;
        let relation = self.relations.get_mut(&key)?;
        let incident = Incident::new(tag, IncidentCategory::Diplomatic, impact, decay_rate, now);
        let out = (incident.id, incident_event(key, &incident));
        relation.incidents.push(incident);
        Some(out)
    }

    /// Re-derive a relation's status, reporting a change.
    pub(crate) fn refresh_status(&mut self, key: RelationKey) -> Option<SimEvent> {
        let thresholds = self.params.status;
        let relation = self.relations.get_mut(&key)?;
        let new_status = thresholds.status_for(relation.score());
        if new_status == relation.status {
            return None;
        }
        let old_status = relation.status;
        relation.status = new_status;
        tracing::info!(civ_a = %key.low(), civ_b = %key.high(), ?old_status, ?new_status, "diplomatic status changed");
        Some(SimEvent::DiplomaticStatusChanged {
            civ_a: key.low(),
            civ_b: key.high(),
            old_status,
            new_status,
        })
    }

    /// Sign a new agreement lasting the default duration.
    ///
    /// # Errors
    ///
    /// Returns [`DiplomacyError::TooFewParticipants`] for fewer than two
    /// distinct participants, [`DiplomacyError::UnknownCivilization`] for an
    /// unknown one, or [`DiplomacyError::NoRelation`] for a pair without a
    /// relation. Nothing is changed on error.
    pub fn create_agreement(
        &mut self,
        kind: AgreementKind,
        participants: &[CivId],
        terms: Vec<AgreementTerm>,
        now: f64,
    ) -> Result<(AgreementId, SimEvent), DiplomacyError> {
        let mut unique: Vec<CivId> = Vec::new();
        for civ in participants {
            if !self.civs.contains(civ) {
                return Err(DiplomacyError::UnknownCivilization(*civ));
            }
            if !unique.contains(civ) {
                unique.push(*civ);
            }
        }
        if unique.len() < 2 {
            return Err(DiplomacyError::TooFewParticipants);
        }

        let agreement = Agreement {
            id: AgreementId::new(),
            kind,
            participants: unique,
            terms,
            start_day: now,
            end_day: now + self.params.agreement_duration_days,
            active: true,
            compliance: 1.0,
            deliveries_made: 0,
        };
        let pairs = agreement.pairs();
        for key in &pairs {
            if !self.relations.contains_key(key) {
                return Err(DiplomacyError::NoRelation {
                    a: key.low(),
                    b: key.high(),
                });
            }
        }
        for key in &pairs {
            if let Some(relation) = self.relations.get_mut(key) {
                relation.agreements.insert(agreement.id);
            }
        }

        let event = SimEvent::TradeAgreementCreated {
            agreement: agreement.id,
            kind: agreement.kind.clone(),
            participants: agreement.participants.clone(),
        };
        let id = agreement.id;
        tracing::info!(agreement = %id, kind = ?agreement.kind, participants = agreement.participants.len(), "agreement created");
        self.agreements.insert(id, agreement);
        Ok((id, event))
    }

    /// End an active agreement, removing it from every participant relation.
    ///
    /// # Errors
    ///
    /// Returns [`DiplomacyError::UnknownAgreement`] if the id is unknown or
    /// already ended.
    pub fn end_agreement(
        &mut self,
        id: AgreementId,
        reason: AgreementEndReason,
    ) -> Result<SimEvent, DiplomacyError> {
        let agreement = self
            .agreements
            .get_mut(&id)
            .filter(|a| a.active)
            .ok_or(DiplomacyError::UnknownAgreement(id))?;
        agreement.active = false;
        for key in agreement.pairs() {
            if let Some(relation) = self.relations.get_mut(&key) {
                relation.agreements.remove(&id);
            }
        }
        tracing::info!(agreement = %id, ?reason, "agreement ended");
        Ok(SimEvent::AgreementEnded { agreement: id, reason })
    }

    /// End an active agreement as breached and record a breach incident on
    /// every participant pair.
    ///
    /// # Errors
    ///
    /// Returns [`DiplomacyError::UnknownAgreement`] if the id is unknown or
    /// already ended.
    pub fn breach_agreement(&mut self, id: AgreementId, now: f64) -> Result<Vec<SimEvent>, DiplomacyError> {
        let pairs = self
            .agreements
            .get(&id)
            .filter(|a| a.active)
            .map(Agreement::pairs)
            .ok_or(DiplomacyError::UnknownAgreement(id))?;
        let mut events = vec![self.end_agreement(id, AgreementEndReason::Breached)?];
        let impact = self.params.breach_impact;
        for key in pairs {
            if let Ok(more) = self.record_incident(
                key.low(),
                key.high(),
                "agreement_breach",
                IncidentCategory::Breach,
                impact,
                now,
            ) {
                events.extend(more);
            }
        }
        Ok(events)
    }

    /// Active agreements that still owe a delivery, in id order.
    pub fn pending_deliveries(&self) -> Vec<(AgreementId, Delivery)> {
        self.agreements
            .values()
            .filter_map(|a| a.pending_delivery().map(|d| (a.id, d.clone())))
            .collect()
    }

    /// Count one completed delivery. The agreement ends as expired once
    /// every shipment is made; its end event is returned.
    ///
    /// # Errors
    ///
    /// Returns [`DiplomacyError::UnknownAgreement`] if the id is unknown or
    /// already ended.
    pub fn record_delivery(&mut self, id: AgreementId) -> Result<Option<SimEvent>, DiplomacyError> {
        let agreement = self
            .agreements
            .get_mut(&id)
            .filter(|a| a.active)
            .ok_or(DiplomacyError::UnknownAgreement(id))?;
        agreement.deliveries_made = agreement.deliveries_made.saturating_add(1);
        let complete = agreement
            .delivery()
            .is_some_and(|d| agreement.deliveries_made >= d.cycles);
        if complete {
            return self.end_agreement(id, AgreementEndReason::Expired).map(Some);
        }
        Ok(None)
    }

    /// Age the whole graph to `now` (in simulated days).
    ///
    /// For every relation: decay incidents by the elapsed decay periods,
    /// prune stale ones, and apply `drift_per_day * elapsed_days`. Then end
    /// agreements with removed participants, expired agreements, and
    /// agreements whose compliance falls below the breach threshold (which
    /// also records a breach incident on every participant pair).
    pub fn decay_cycle(
        &mut self,
        now: f64,
        world: &impl WorldView,
        drift: &impl DriftModel,
    ) -> Vec<SimEvent> {
        let mut events = Vec::new();
        let keys: Vec<RelationKey> = self.relations.keys().copied().collect();
        for key in keys {
            if self.age_relation(key, now, world, drift) {
                events.extend(self.refresh_status(key));
            }
        }
        self.check_agreements(now, world, &mut events);
        events
    }

    /// Returns whether any time elapsed for the relation.
    fn age_relation(
        &mut self,
        key: RelationKey,
        now: f64,
        world: &impl WorldView,
        drift: &impl DriftModel,
    ) -> bool {
        let params = &self.params;
        let Some(relation) = self.relations.get_mut(&key) else {
            return false;
        };
        let elapsed = now - relation.last_decay_day;
        if elapsed <= 0.0 {
            return false;
        }
        let periods = if params.decay_period_days > 0.0 {
            elapsed / params.decay_period_days
        } else {
            0.0
        };
        for incident in &mut relation.incidents {
            incident.decay(periods);
        }
        let pruned = relation.prune_incidents(now, params.incident_horizon_days, params.prune_threshold);

        let (a, b) = (key.low(), key.high());
        let similarity = match (world.profile(a), world.profile(b)) {
            (Some(pa), Some(pb)) => pa.cultural_similarity(pb),
            _ => 0.5,
        };
        let inputs = DriftInputs {
            trade_volume: world.trade_volume(a, b),
            cultural_similarity: similarity,
            recent_incidents: relation.recent_incident_aggregate(now, params.half_life_days),
            modifier_total: relation.modifier_total(),
            score: relation.score(),
        };
        let delta = relation.adjust_score(drift.drift_per_day(&inputs) * elapsed);
        relation.last_decay_day = now;
        tracing::debug!(civ_a = %a, civ_b = %b, elapsed, pruned, drift = delta, score = relation.score(), "relation aged");
        true
    }

    fn check_agreements(&mut self, now: f64, world: &impl WorldView, events: &mut Vec<SimEvent>) {
        let mut ending: Vec<(AgreementId, AgreementEndReason)> = Vec::new();
        let mut breached: Vec<AgreementId> = Vec::new();

        for agreement in self.agreements.values_mut().filter(|a| a.active) {
            if agreement.participants.iter().any(|c| !self.civs.contains(c)) {
                tracing::warn!(agreement = %agreement.id, "agreement references a removed civilization, ending");
                ending.push((agreement.id, AgreementEndReason::ParticipantRemoved));
                continue;
            }
            if agreement.is_expired(now) {
                ending.push((agreement.id, AgreementEndReason::Expired));
                continue;
            }
            let pairs = agreement.pairs();
            let records: Vec<Option<&Relation>> = pairs.iter().map(|k| self.relations.get(k)).collect();
            agreement.compliance = agreement.compute_compliance(&records, world);
            if agreement.compliance < self.params.breach_threshold {
                breached.push(agreement.id);
            }
        }

        for (id, reason) in ending {
            if let Ok(event) = self.end_agreement(id, reason) {
                events.push(event);
            }
        }
        for id in breached {
            if let Ok(more) = self.breach_agreement(id, now) {
                events.extend(more);
            }
        }
    }
}

impl RelationView for RelationGraph {
    fn score(&self, a: CivId, b: CivId) -> Option<f64> {
        Self::score(self, a, b)
    }

    fn at_war(&self, a: CivId, b: CivId) -> bool {
        self.status(a, b) == Some(DiplomaticStatus::War)
    }
}

fn incident_event(key: RelationKey, incident: &Incident) -> SimEvent {
    SimEvent::IncidentRecorded {
        civ_a: key.low(),
        civ_b: key.high(),
        incident: incident.id,
        category: incident.category,
        tag: incident.tag.clone(),
        impact: incident.impact,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::drift::WeightedDrift;
    use crate::view::testing::TableView;

    /// A drift model that never moves scores.
    struct Still;

    impl DriftModel for Still {
        fn drift_per_day(&self, _inputs: &DriftInputs) -> f64 {
            0.0
        }
    }

    fn pair() -> (RelationGraph, CivProfile, CivProfile, TableView) {
        let rome = CivProfile::new("Rome");
        let mut greece = CivProfile::new("Greece");
        greece.position.x = 100.0;
        let view = TableView::with(&[&rome, &greece]);
        let mut graph = RelationGraph::new(DiplomacyParams::default());
        graph.add_civilization(&rome, &view, &BTreeMap::new(), 0.0).unwrap();
        graph.add_civilization(&greece, &view, &BTreeMap::new(), 0.0).unwrap();
        (graph, rome, greece, view)
    }

    #[test]
    fn joining_creates_one_relation_per_pair() {
        let (mut graph, rome, greece, mut view) = pair();
        let egypt = CivProfile::new("Egypt");
        view.profiles.insert(egypt.id, egypt.clone());
        let created = graph.add_civilization(&egypt, &view, &BTreeMap::new(), 0.0).unwrap();
        assert_eq!(created, 2);
        assert_eq!(graph.relations().count(), 3);
        assert!(graph.relation(greece.id, rome.id).is_some());
        assert!(graph.relation(rome.id, rome.id).is_none());
    }

    #[test]
    fn initial_score_uses_similarity_proximity_and_history() {
        let weights = InitialScoreWeights::default();
        let mut a = CivProfile::new("Athens");
        let mut b = CivProfile::new("Sparta");
        a.culture_traits.insert("hellenic".to_owned());
        b.culture_traits.insert("hellenic".to_owned());
        // similarity 1, adjacent, no history: 20 + 10
        assert!((initial_score(&a, &b, 0.0, &weights) - 30.0).abs() < 1e-9);
        // far apart, bitter history: 20 - 5 - 15
        b.position.x = 500.0;
        assert!((initial_score(&a, &b, -1.0, &weights) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn incident_moves_score_within_bounds() {
        let (mut graph, rome, greece, _) = pair();
        for _ in 0..10 {
            graph
                .record_incident(rome.id, greece.id, "sack", IncidentCategory::Diplomatic, -40.0, 0.0)
                .unwrap();
            let score = graph.score(rome.id, greece.id).unwrap();
            assert!((-100.0..=100.0).contains(&score));
        }
        assert!((graph.score(rome.id, greece.id).unwrap() + 100.0).abs() < f64::EPSILON);
        assert_eq!(graph.status(rome.id, greece.id), Some(DiplomaticStatus::War));
        assert!(RelationView::at_war(&graph, greece.id, rome.id));
    }

    #[test]
    fn status_change_is_reported_once() {
        let (mut graph, rome, greece, _) = pair();
        let before = graph.status(rome.id, greece.id).unwrap();
        let events = graph
            .record_incident(rome.id, greece.id, "sack", IncidentCategory::Diplomatic, -80.0, 0.0)
            .unwrap();
        let changes = events
            .iter()
            .filter(|e| matches!(e, SimEvent::DiplomaticStatusChanged { .. }))
            .count();
        assert_ne!(before, DiplomaticStatus::War);
        assert_eq!(changes, 1);
    }

    #[test]
    fn missing_relation_is_an_error() {
        let (mut graph, rome, _, _) = pair();
        let stranger = CivId::new();
        let result = graph.record_incident(rome.id, stranger, "x", IncidentCategory::Economic, 1.0, 0.0);
        assert_eq!(result, Err(DiplomacyError::NoRelation { a: rome.id, b: stranger }));
    }

    #[test]
    fn three_decay_cycles() {
        let (mut graph, rome, greece, view) = pair();
        graph
            .record_incident(rome.id, greece.id, "gift", IncidentCategory::Economic, 1.0, 0.0)
            .unwrap();
        for day in 1..=3 {
            graph.decay_cycle(f64::from(day), &view, &Still);
        }
        let relation = graph.relation(rome.id, greece.id).unwrap();
        let impact = relation.incidents.first().unwrap().impact;
        assert!((impact - 0.729).abs() < 1e-9);
    }

    #[test]
    fn decay_is_time_proportional() {
        let (mut graph, rome, greece, view) = pair();
        graph
            .record_incident(rome.id, greece.id, "gift", IncidentCategory::Economic, 5.0, 0.0)
            .unwrap();
        let drift = WeightedDrift::default();
        graph.decay_cycle(2.0, &view, &drift);
        let once = graph.relation(rome.id, greece.id).unwrap().clone();
        let events = graph.decay_cycle(2.0, &view, &drift);
        let twice = graph.relation(rome.id, greece.id).unwrap();
        assert_eq!(&once, twice);
        assert!(events.is_empty());
    }

    #[test]
    fn expired_agreement_leaves_every_relation() {
        let (mut graph, rome, greece, view) = pair();
        let (id, _) = graph
            .create_agreement(AgreementKind::Trade, &[rome.id, greece.id], Vec::new(), 0.0)
            .unwrap();
        assert!(graph.relation(rome.id, greece.id).unwrap().agreements.contains(&id));

        let events = graph.decay_cycle(181.0, &view, &Still);
        assert!(events.iter().any(|e| matches!(
            e,
            SimEvent::AgreementEnded { reason: AgreementEndReason::Expired, .. }
        )));
        assert!(graph.relation(rome.id, greece.id).unwrap().agreements.is_empty());
        assert!(!graph.agreement(id).unwrap().active);
    }

    #[test]
    fn breach_ends_agreement_and_sours_relations() {
        let (mut graph, rome, greece, view) = pair();
        let before = graph.score(rome.id, greece.id).unwrap();
        graph
            .create_agreement(
                AgreementKind::Trade,
                &[rome.id, greece.id],
                vec![AgreementTerm::MinTradeVolume { volume: 1_000.0 }],
                0.0,
            )
            .unwrap();
        let events = graph.decay_cycle(1.0, &view, &Still);
        assert!(events.iter().any(|e| matches!(
            e,
            SimEvent::AgreementEnded { reason: AgreementEndReason::Breached, .. }
        )));
        assert!(graph.score(rome.id, greece.id).unwrap() < before);
        assert_eq!(graph.active_agreement_count(), 0);
    }

    #[test]
    fn removed_participant_ends_agreement_next_cycle() {
        let (mut graph, rome, greece, view) = pair();
        graph
            .create_agreement(AgreementKind::NonAggression, &[rome.id, greece.id], Vec::new(), 0.0)
            .unwrap();
        graph.remove_civilization(greece.id).unwrap();
        assert_eq!(graph.relations().count(), 0);

        let events = graph.decay_cycle(1.0, &view, &Still);
        assert!(events.iter().any(|e| matches!(
            e,
            SimEvent::AgreementEnded { reason: AgreementEndReason::ParticipantRemoved, .. }
        )));
    }

    #[test]
    fn agreement_needs_two_parties() {
        let (mut graph, rome, _, _) = pair();
        let result = graph.create_agreement(AgreementKind::Trade, &[rome.id, rome.id], Vec::new(), 0.0);
        assert_eq!(result.map(|(id, _)| id), Err(DiplomacyError::TooFewParticipants));
    }

    fn grain_delivery(graph: &mut RelationGraph, seller: CivId, buyer: CivId, cycles: u32) -> AgreementId {
        let delivery = Delivery {
            seller,
            buyer,
            resource: civitas_types::ResourceId::from("grain"),
            quantity: 10.0,
            unit_price: 3.0,
            cycles,
        };
        graph
            .create_agreement(
                AgreementKind::Trade,
                &[seller, buyer],
                vec![AgreementTerm::Delivery(delivery)],
                0.0,
            )
            .unwrap()
            .0
    }

    #[test]
    fn deliveries_run_out_and_end_the_agreement() {
        let (mut graph, rome, greece, _) = pair();
        let id = grain_delivery(&mut graph, greece.id, rome.id, 2);
        assert_eq!(graph.pending_deliveries().len(), 1);

        assert_eq!(graph.record_delivery(id).unwrap(), None);
        assert_eq!(graph.agreement(id).unwrap().deliveries_made, 1);
        let ended = graph.record_delivery(id).unwrap();
        assert!(matches!(
            ended,
            Some(SimEvent::AgreementEnded { reason: AgreementEndReason::Expired, .. })
        ));
        assert!(graph.pending_deliveries().is_empty());
        assert_eq!(graph.record_delivery(id), Err(DiplomacyError::UnknownAgreement(id)));
    }

    #[test]
    fn breaching_a_delivery_records_an_incident() {
        let (mut graph, rome, greece, _) = pair();
        let id = grain_delivery(&mut graph, greece.id, rome.id, 5);
        let before = graph.score(rome.id, greece.id).unwrap();

        let events = graph.breach_agreement(id, 2.0).unwrap();
        assert!(matches!(
            events.first(),
            Some(SimEvent::AgreementEnded { reason: AgreementEndReason::Breached, .. })
        ));
        assert!(events.iter().any(|e| matches!(
            e,
            SimEvent::IncidentRecorded { category: IncidentCategory::Breach, .. }
        )));
        assert!(graph.score(rome.id, greece.id).unwrap() < before);
        assert!(graph.pending_deliveries().is_empty());
        assert!(graph.breach_agreement(id, 2.0).is_err());
    }
}
