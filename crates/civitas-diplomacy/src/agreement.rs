//! Dynamic agreements and their compliance terms.
//!
//! Compliance is the fraction of an agreement's terms currently satisfied
//! by every participant pair, or 1.0 for an agreement with no terms.
//!
//! A [`Delivery`] term is not part of compliance. The economic cycle
//! executes it and breaches the agreement the first time a shipment fails.

use serde::{Deserialize, Serialize};

use civitas_types::{AgreementId, AgreementKind, CivId, ResourceId};

use crate::error::DiplomacyError;
use crate::relation::{Relation, RelationKey};
use crate::view::WorldView;

/// A recurring shipment at an agreed price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    /// Supplying civilization.
    pub seller: CivId,
    /// Receiving civilization.
    pub buyer: CivId,
    /// The resource shipped.
    pub resource: ResourceId,
    /// Units per economic cycle.
    pub quantity: f64,
    /// Agreed price per unit, before transport.
    pub unit_price: f64,
    /// Economic cycles the shipments run for.
    pub cycles: u32,
}

impl Delivery {
    /// Check the figures.
    ///
    /// # Errors
    ///
    /// Returns [`DiplomacyError::InvalidDelivery`] for a self-delivery, a
    /// non-positive quantity, a negative price, or zero cycles.
    pub fn validate(&self) -> Result<(), DiplomacyError> {
        let reason = if self.seller == self.buyer {
            "seller and buyer are the same civilization".to_owned()
        } else if !(self.quantity.is_finite() && self.quantity > 0.0) {
            format!("quantity must be positive, got {}", self.quantity)
        } else if !(self.unit_price.is_finite() && self.unit_price >= 0.0) {
            format!("unit price must be non-negative, got {}", self.unit_price)
        } else if self.cycles == 0 {
            "at least one cycle is required".to_owned()
        } else {
            return Ok(());
        };
        Err(DiplomacyError::InvalidDelivery { reason })
    }
}

/// A condition the participants promise to keep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "term", rename_all = "snake_case")]
pub enum AgreementTerm {
    /// Lifetime trade between each pair reaches at least this many units.
    MinTradeVolume {
        /// Units.
        volume: f64,
    },
    /// Each pair's score stays at or above this value.
    MinRelationScore {
        /// Score.
        score: f64,
    },
    /// No pair has a recent incident with negative impact.
    NoHostileIncidents,
    /// The route between each pair stays at or below this risk.
    MaxRouteRisk {
        /// Risk in `[0, 1]`.
        risk: f64,
    },
    /// The seller ships a fixed quantity to the buyer every economic cycle.
    Delivery(Delivery),
}

impl AgreementTerm {
    /// Whether the term holds for one participant pair.
    pub fn holds(&self, relation: &Relation, world: &impl WorldView) -> bool {
        let (a, b) = (relation.key.low(), relation.key.high());
        match self {
            Self::MinTradeVolume { volume } => world.trade_volume(a, b) >= *volume,
            Self::MinRelationScore { score } => relation.score() >= *score,
            Self::NoHostileIncidents => relation.hostile_incident_count() == 0,
            Self::MaxRouteRisk { risk } => world.route_risk(a, b).is_some_and(|r| r <= *risk),
            Self::Delivery(_) => true,
        }
    }
}

/// A time-bounded contract between two or more civilizations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    /// Unique identifier.
    pub id: AgreementId,
    /// Agreement type.
    pub kind: AgreementKind,
    /// Participating civilizations (two or more, distinct).
    pub participants: Vec<CivId>,
    /// Promised conditions.
    pub terms: Vec<AgreementTerm>,
    /// Simulated day the agreement started.
    pub start_day: f64,
    /// Simulated day the agreement ends.
    pub end_day: f64,
    /// Whether the agreement is in force.
    pub active: bool,
    /// Last computed compliance in `[0, 1]`.
    pub compliance: f64,
    /// Shipments of the delivery term completed so far.
    #[serde(default)]
    pub deliveries_made: u32,
}

impl Agreement {
    /// Every unordered participant pair.
    pub fn pairs(&self) -> Vec<RelationKey> {
        let mut keys = Vec::new();
        for (i, a) in self.participants.iter().enumerate() {
            for b in self.participants.iter().skip(i.saturating_add(1)) {
                if let Some(key) = RelationKey::new(*a, *b) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// The delivery term, if the agreement has one.
    pub fn delivery(&self) -> Option<&Delivery> {
        self.terms.iter().find_map(|term| match term {
            AgreementTerm::Delivery(delivery) => Some(delivery),
            _ => None,
        })
    }

    /// The delivery still owed, if the agreement is active and has
    /// shipments left.
    pub fn pending_delivery(&self) -> Option<&Delivery> {
        self.delivery()
            .filter(|delivery| self.active && self.deliveries_made < delivery.cycles)
    }

    /// Whether the agreement has run past its end day.
    pub fn is_expired(&self, now: f64) -> bool {
        now > self.end_day
    }

    /// Fraction of terms satisfied across all pairs.
    ///
    /// `relations` holds one record per pair; a missing record counts as
    /// failing every term.
    pub fn compute_compliance(&self, relations: &[Option<&Relation>], world: &impl WorldView) -> f64 {
        if self.terms.is_empty() {
            return 1.0;
        }
        let mut checks: u32 = 0;
        let mut kept: u32 = 0;
        for relation in relations {
            for term in &self.terms {
                checks = checks.saturating_add(1);
                if relation.is_some_and(|r| term.holds(r, world)) {
                    kept = kept.saturating_add(1);
                }
            }
        }
        if checks == 0 {
            return 1.0;
        }
        f64::from(kept) / f64::from(checks)
    }
}
