//! Orchestration for the Civitas economy and diplomacy engine.
//!
//! This crate owns the simulation context and everything that drives it:
//! configuration loading, the logical clock, the two fixed-interval cycle
//! schedulers, event delivery, snapshots, and the command queue used by
//! asynchronous callers.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration and seed data
//! - [`clock`] -- Simulated time and cycle counters
//! - [`scheduler`] -- Idle/Running cycle scheduling with a catch-up bound
//! - [`events`] -- Subscriber list and pollable event buffer
//! - [`simulation`] -- The [`Simulation`] context and its public operations
//! - [`snapshot`] -- Serializable world snapshots
//! - [`command`] -- Command queue with oneshot replies
//! - [`error`] -- Error types

pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod simulation;
pub mod snapshot;

pub use clock::{ClockError, WorldClock};
pub use command::{Command, CommandError, CommandQueue, SimulationHandle, command_channel};
pub use config::{CivilizationSpec, CivitasConfig, ConfigError, LogFormat, LoggingConfig, WorldConfig};
pub use error::SimulationError;
pub use events::{EventBus, EventSubscriber};
pub use scheduler::{CycleScheduler, SchedulerState};
pub use simulation::{AdvanceReport, Simulation};
pub use snapshot::{AccountBalance, WorldSnapshot};
