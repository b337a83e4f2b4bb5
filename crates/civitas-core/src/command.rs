//! The command queue.
//!
//! The simulation has a single owner. Other tasks talk to it through a
//! [`SimulationHandle`], which sends [`Command`]s over a bounded tokio
//! channel and awaits the reply on a oneshot. The owner drains the
//! [`CommandQueue`] between cycles, so commands against the same relation
//! or market are applied one at a time.

use tokio::sync::{mpsc, oneshot};

use civitas_diplomacy::Delivery;
use civitas_economy::{EconomicEffect, TradeRequest};
use civitas_types::{
    ActionId, AgreementId, CivId, CivProfile, DiplomaticOutcome, IncidentCategory, MarketId, ResourceId, TradeOutcome,
};

use crate::error::SimulationError;
use crate::simulation::Simulation;
use crate::snapshot::WorldSnapshot;

/// Errors seen by a [`SimulationHandle`].
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The simulation owner has shut down.
    #[error("simulation is no longer accepting commands")]
    Closed,

    /// The owner dropped the command without replying.
    #[error("simulation dropped the command without a reply")]
    NoReply,

    /// The simulation rejected the command.
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// One request to the simulation owner, with its reply channel.
#[derive(Debug)]
pub enum Command {
    /// Query a resource price.
    ResourcePrice {
        /// Market.
        market: MarketId,
        /// Resource.
        resource: ResourceId,
        /// Reply.
        reply: oneshot::Sender<Result<f64, SimulationError>>,
    },
    /// Query a relationship score.
    RelationshipScore {
        /// One side.
        a: CivId,
        /// The other side.
        b: CivId,
        /// Reply.
        reply: oneshot::Sender<Result<f64, SimulationError>>,
    },
    /// Propose a trade.
    ProposeTrade {
        /// The trade.
        request: TradeRequest,
        /// Reply.
        reply: oneshot::Sender<TradeOutcome>,
    },
    /// Sign a recurring delivery agreement.
    CreateTradeAgreement {
        /// The delivery terms.
        delivery: Delivery,
        /// Reply.
        reply: oneshot::Sender<Result<AgreementId, SimulationError>>,
    },
    /// Propose a diplomatic action.
    ProposeDiplomaticAction {
        /// Proposer.
        from: CivId,
        /// Target.
        to: CivId,
        /// Action id.
        action: ActionId,
        /// Reply.
        reply: oneshot::Sender<DiplomaticOutcome>,
    },
    /// Report an incident.
    RecordIncident {
        /// One side.
        a: CivId,
        /// The other side.
        b: CivId,
        /// Type tag.
        tag: String,
        /// Category.
        category: IncidentCategory,
        /// Signed impact.
        impact: f64,
        /// Reply.
        reply: oneshot::Sender<Result<(), SimulationError>>,
    },
    /// Found a civilization.
    AddCivilization {
        /// Its profile.
        profile: Box<CivProfile>,
        /// Reply.
        reply: oneshot::Sender<Result<CivId, SimulationError>>,
    },
    /// Destroy a civilization.
    RemoveCivilization {
        /// The civilization.
        civ: CivId,
        /// Reply.
        reply: oneshot::Sender<Result<(), SimulationError>>,
    },
    /// Apply an economic effect.
    ApplyEffect {
        /// The civilization.
        civ: CivId,
        /// The effect.
        effect: EconomicEffect,
        /// Reply.
        reply: oneshot::Sender<Result<(), SimulationError>>,
    },
    /// Take a snapshot.
    Snapshot {
        /// Reply.
        reply: oneshot::Sender<Box<WorldSnapshot>>,
    },
}

/// Create a handle and the queue it feeds.
pub fn command_channel(capacity: usize) -> (SimulationHandle, CommandQueue) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (SimulationHandle { sender }, CommandQueue { receiver })
}

/// Cloneable sender side of the queue.
#[derive(Debug, Clone)]
pub struct SimulationHandle {
    sender: mpsc::Sender<Command>,
}

impl SimulationHandle {
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, CommandError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_closed| CommandError::Closed)?;
        response.await.map_err(|_dropped| CommandError::NoReply)
    }

    /// Current price of a resource in a market.
    pub async fn resource_price(&self, market: MarketId, resource: ResourceId) -> Result<f64, CommandError> {
        Ok(self
            .request(|reply| Command::ResourcePrice {
                market,
                resource,
                reply,
            })
            .await??)
    }

    /// Relationship score between two civilizations.
    pub async fn relationship_score(&self, a: CivId, b: CivId) -> Result<f64, CommandError> {
        Ok(self
            .request(|reply| Command::RelationshipScore { a, b, reply })
            .await??)
    }

    /// Propose a trade.
    pub async fn propose_trade(&self, request: TradeRequest) -> Result<TradeOutcome, CommandError> {
        self.request(|reply| Command::ProposeTrade { request, reply }).await
    }

    /// Sign a recurring delivery agreement.
    pub async fn create_trade_agreement(&self, delivery: Delivery) -> Result<AgreementId, CommandError> {
        Ok(self
            .request(|reply| Command::CreateTradeAgreement { delivery, reply })
            .await??)
    }

    /// Propose a diplomatic action.
    pub async fn propose_diplomatic_action(
        &self,
        from: CivId,
        to: CivId,
        action: ActionId,
    ) -> Result<DiplomaticOutcome, CommandError> {
        self.request(|reply| Command::ProposeDiplomaticAction {
            from,
            to,
            action,
            reply,
        })
        .await
    }

    /// Report an incident.
    pub async fn record_incident(
        &self,
        a: CivId,
        b: CivId,
        tag: String,
        category: IncidentCategory,
        impact: f64,
    ) -> Result<(), CommandError> {
        Ok(self
            .request(|reply| Command::RecordIncident {
                a,
                b,
                tag,
                category,
                impact,
                reply,
            })
            .await??)
    }

    /// Found a civilization.
    pub async fn add_civilization(&self, profile: CivProfile) -> Result<CivId, CommandError> {
        Ok(self
            .request(|reply| Command::AddCivilization {
                profile: Box::new(profile),
                reply,
            })
            .await??)
    }

    /// Destroy a civilization.
    pub async fn remove_civilization(&self, civ: CivId) -> Result<(), CommandError> {
        Ok(self
            .request(|reply| Command::RemoveCivilization { civ, reply })
            .await??)
    }

    /// Apply an economic effect.
    pub async fn apply_effect(&self, civ: CivId, effect: EconomicEffect) -> Result<(), CommandError> {
        Ok(self
            .request(|reply| Command::ApplyEffect { civ, effect, reply })
            .await??)
    }

    /// A snapshot of the whole world.
    pub async fn snapshot(&self) -> Result<WorldSnapshot, CommandError> {
        let snapshot = self.request(|reply| Command::Snapshot { reply }).await?;
        Ok(*snapshot)
    }
}

/// Receiver side of the queue, held by the simulation owner.
#[derive(Debug)]
pub struct CommandQueue {
    receiver: mpsc::Receiver<Command>,
}

impl CommandQueue {
    /// Apply every command already queued without waiting. Returns how
    /// many were applied.
    pub fn serve(&mut self, sim: &mut Simulation) -> usize {
        let mut served: usize = 0;
        while let Ok(command) = self.receiver.try_recv() {
            sim.apply_command(command);
            served = served.saturating_add(1);
        }
        served
    }

    /// Wait for the next command. `None` once every handle is dropped.
    pub async fn recv(&mut self) -> Option<Command> {
        self.receiver.recv().await
    }
}

fn respond<T>(reply: oneshot::Sender<T>, value: T) {
    if reply.send(value).is_err() {
        tracing::debug!("command caller went away before the reply");
    }
}

impl Simulation {
    /// Apply one command and send its reply.
    pub fn apply_command(&mut self, command: Command) {
        match command {
            Command::ResourcePrice {
                market,
                resource,
                reply,
            } => respond(reply, self.resource_price(market, &resource)),
            Command::RelationshipScore { a, b, reply } => respond(reply, self.relationship_score(a, b)),
            Command::ProposeTrade { request, reply } => respond(reply, self.submit_trade(&request)),
            Command::CreateTradeAgreement { delivery, reply } => {
                let result = self.create_trade_agreement(delivery);
                respond(reply, result);
            }
            Command::ProposeDiplomaticAction {
                from,
                to,
                action,
                reply,
            } => {
                let outcome = self.propose_diplomatic_action(from, to, &action);
                respond(reply, outcome);
            }
            Command::RecordIncident {
                a,
                b,
                tag,
                category,
                impact,
                reply,
            } => {
                let result = self.record_incident(a, b, &tag, category, impact);
                respond(reply, result);
            }
            Command::AddCivilization { profile, reply } => {
                let result = self.add_civilization(*profile);
                respond(reply, result);
            }
            Command::RemoveCivilization { civ, reply } => respond(reply, self.remove_civilization(civ)),
            Command::ApplyEffect { civ, effect, reply } => {
                let result = self.apply_effect(civ, &effect);
                respond(reply, result);
            }
            Command::Snapshot { reply } => respond(reply, Box::new(self.snapshot())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::CivitasConfig;

    #[tokio::test]
    async fn handle_round_trips_through_owner_task() {
        let mut sim = Simulation::new(&CivitasConfig::default()).unwrap();
        let (handle, mut queue) = command_channel(8);

        let owner = tokio::spawn(async move {
            while let Some(command) = queue.recv().await {
                sim.apply_command(command);
            }
            sim
        });

        let rome = handle.add_civilization(CivProfile::new("Rome")).await.unwrap();
        let gaul = handle.add_civilization(CivProfile::new("Gaul")).await.unwrap();
        let score = handle.relationship_score(rome, gaul).await.unwrap();
        assert!((-100.0..=100.0).contains(&score));

        let price = handle
            .resource_price(MarketId::of(rome), ResourceId::from("food"))
            .await
            .unwrap();
        assert!(price > 0.0);

        let delivery = Delivery {
            seller: gaul,
            buyer: rome,
            resource: ResourceId::from("food"),
            quantity: 1.0,
            unit_price: 2.0,
            cycles: 3,
        };
        handle.create_trade_agreement(delivery).await.unwrap();

        let outcome = handle
            .propose_diplomatic_action(rome, gaul, ActionId::from("bribe"))
            .await
            .unwrap();
        assert_eq!(outcome, DiplomaticOutcome::UnknownAction);

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.civilizations.len(), 2);

        drop(handle);
        let sim = owner.await.unwrap();
        assert_eq!(sim.profiles().len(), 2);
    }

    #[tokio::test]
    async fn rejected_commands_surface_the_error() {
        let mut sim = Simulation::new(&CivitasConfig::default()).unwrap();
        let (handle, mut queue) = command_channel(4);

        let pending = tokio::spawn({
            let handle = handle.clone();
            async move { handle.remove_civilization(CivId::new()).await }
        });
        tokio::task::yield_now().await;
        while queue.serve(&mut sim) == 0 {
            tokio::task::yield_now().await;
        }

        let result = pending.await.unwrap();
        assert!(matches!(
            result,
            Err(CommandError::Simulation(SimulationError::UnknownCivilization(_)))
        ));
    }

    #[tokio::test]
    async fn closed_queue_is_reported() {
        let (handle, queue) = command_channel(1);
        drop(queue);
        let result = handle.relationship_score(CivId::new(), CivId::new()).await;
        assert!(matches!(result, Err(CommandError::Closed)));
    }
}
