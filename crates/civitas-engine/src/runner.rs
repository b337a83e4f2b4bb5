//! Real-time loop driving the simulation.
//!
//! The loop wakes on a fixed tokio interval. On every tick it:
//!
//! 1. Applies the commands queued since the last tick
//! 2. Advances the simulation by the real time that passed
//! 3. Drains the event buffer into the run's [`EventTally`]
//!
//! It stops when the shutdown future resolves (Ctrl-C in the binary) or
//! when the configured real-time limit is reached.

use std::future::Future;
use std::time::Duration;

use civitas_core::{CommandQueue, Simulation, WorldConfig};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::event_log::EventTally;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The real-time limit was reached.
    TimeLimit,
    /// Shutdown was requested.
    Shutdown,
}

/// Loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Real time between loop ticks.
    pub tick: Duration,
    /// Stop after this much real time.
    pub time_limit: Option<Duration>,
}

impl RunOptions {
    /// Tick at the shorter cycle interval and honour the world's real-time
    /// limit.
    pub fn from_world(world: &WorldConfig) -> Self {
        let tick_ms = world
            .economic_interval_ms
            .min(world.diplomacy_interval_ms)
            .max(1);
        Self {
            tick: Duration::from_millis(tick_ms),
            time_limit: (world.max_real_time_seconds > 0).then_some(Duration::from_secs(world.max_real_time_seconds)),
        }
    }
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Why the loop stopped.
    pub end_reason: EndReason,
    /// Loop ticks executed.
    pub ticks: u64,
    /// Economic cycles executed.
    pub economic_cycles: u64,
    /// Diplomacy cycles executed.
    pub diplomacy_cycles: u64,
    /// Commands applied.
    pub commands: u64,
    /// Drained events by kind.
    pub events: EventTally,
}

#[derive(Debug, Default)]
struct Counters {
    ticks: u64,
    economic_cycles: u64,
    diplomacy_cycles: u64,
    commands: u64,
    events: EventTally,
}

impl Counters {
    fn finish(self, end_reason: EndReason) -> RunSummary {
        RunSummary {
            end_reason,
            ticks: self.ticks,
            economic_cycles: self.economic_cycles,
            diplomacy_cycles: self.diplomacy_cycles,
            commands: self.commands,
            events: self.events,
        }
    }
}

/// Run the loop until `shutdown` resolves or the time limit is reached.
///
/// # Errors
///
/// Returns [`EngineError::Simulation`] if a cycle fails. Cycles completed
/// before the failure stay applied.
pub async fn run(
    sim: &mut Simulation,
    queue: &mut CommandQueue,
    options: RunOptions,
    shutdown: impl Future<Output = ()>,
) -> Result<RunSummary, EngineError> {
    let started = Instant::now();
    let mut last = started;
    let mut ticker = tokio::time::interval(options.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut counters = Counters::default();
    info!(
        tick_ms = options.tick.as_millis(),
        time_limit_seconds = options.time_limit.map(|d| d.as_secs()),
        civilizations = sim.profiles().len(),
        "engine loop starting"
    );

    loop {
        let stop = tokio::select! {
            biased;
            () = &mut shutdown => true,
            _ = ticker.tick() => false,
        };
        if stop {
            info!(ticks = counters.ticks, "shutdown requested");
            return Ok(counters.finish(EndReason::Shutdown));
        }

        let now = Instant::now();
        let served = queue.serve(sim);
        let report = sim.advance(now.duration_since(last).as_secs_f64())?;
        last = now;

        let events = sim.drain_events();
        counters.events.record(&events);
        counters.ticks = counters.ticks.saturating_add(1);
        counters.commands = counters
            .commands
            .saturating_add(u64::try_from(served).unwrap_or(u64::MAX));
        counters.economic_cycles = counters
            .economic_cycles
            .saturating_add(u64::from(report.economic_cycles));
        counters.diplomacy_cycles = counters
            .diplomacy_cycles
            .saturating_add(u64::from(report.diplomacy_cycles));
        debug!(
            tick = counters.ticks,
            commands = served,
            economic_cycles = report.economic_cycles,
            diplomacy_cycles = report.diplomacy_cycles,
            events = events.len(),
            "tick complete"
        );

        if let Some(limit) = options.time_limit {
            let elapsed = now.duration_since(started);
            if elapsed >= limit {
                info!(
                    max_seconds = limit.as_secs(),
                    elapsed_seconds = elapsed.as_secs_f64(),
                    "real-time limit reached"
                );
                return Ok(counters.finish(EndReason::TimeLimit));
            }
        }
    }
}

/// Log the end of a run.
pub fn log_run_end(summary: &RunSummary, sim: &Simulation) {
    info!(
        reason = ?summary.end_reason,
        ticks = summary.ticks,
        economic_cycles = summary.economic_cycles,
        diplomacy_cycles = summary.diplomacy_cycles,
        commands = summary.commands,
        events = summary.events.total(),
        trades = summary.events.count("trade_executed"),
        day = sim.clock().days(),
        "engine loop ended"
    );
    summary.events.log_summary();

    let conservation = sim.verify_conservation();
    if conservation.is_balanced() {
        info!(money_supply = %sim.snapshot().money_supply(), "treasury balanced");
    } else {
        warn!(?conservation, "treasury does not match its ledger");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use civitas_core::{CivitasConfig, command_channel};
    use civitas_types::CivProfile;

    use super::*;

    fn fast_world() -> Simulation {
        let config = CivitasConfig {
            world: WorldConfig {
                economic_interval_ms: 10,
                diplomacy_interval_ms: 50,
                ..WorldConfig::default()
            },
            ..CivitasConfig::default()
        };
        let mut sim = Simulation::new(&config).unwrap();
        sim.add_civilization(CivProfile::new("Ur")).unwrap();
        sim.add_civilization(CivProfile::new("Uruk")).unwrap();
        sim
    }

    #[test]
    fn options_follow_the_world_config() {
        let world = WorldConfig {
            economic_interval_ms: 250,
            diplomacy_interval_ms: 2_000,
            max_real_time_seconds: 90,
            ..WorldConfig::default()
        };
        let options = RunOptions::from_world(&world);
        assert_eq!(options.tick, Duration::from_millis(250));
        assert_eq!(options.time_limit, Some(Duration::from_secs(90)));
        assert_eq!(RunOptions::from_world(&WorldConfig::default()).time_limit, None);
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let mut sim = fast_world();
        let (_handle, mut queue) = command_channel(8);
        let options = RunOptions {
            tick: Duration::from_millis(10),
            time_limit: None,
        };

        let summary = run(
            &mut sim,
            &mut queue,
            options,
            tokio::time::sleep(Duration::from_millis(80)),
        )
        .await
        .unwrap();

        assert_eq!(summary.end_reason, EndReason::Shutdown);
        assert!(summary.ticks >= 1);
        assert_eq!(sim.pending_events(), 0);
        assert!(sim.verify_conservation().is_balanced());
    }

    #[tokio::test]
    async fn time_limit_ends_the_run() {
        let mut sim = fast_world();
        let (_handle, mut queue) = command_channel(8);
        let options = RunOptions {
            tick: Duration::from_millis(5),
            time_limit: Some(Duration::from_millis(30)),
        };

        let summary = run(&mut sim, &mut queue, options, std::future::pending())
            .await
            .unwrap();

        assert_eq!(summary.end_reason, EndReason::TimeLimit);
        assert!(sim.clock().elapsed_seconds() >= 0.029);
        assert!(summary.economic_cycles >= 1);
        assert!(summary.events.count("cycle_completed") >= 1);
    }

    #[tokio::test]
    async fn commands_are_served_between_ticks() {
        let mut sim = fast_world();
        let (handle, mut queue) = command_channel(8);
        let (done, finished) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            let snapshot = handle.snapshot().await;
            let _sent = done.send(snapshot.map(|s| s.civilizations.len()));
        });
        let (counted_tx, counted_rx) = tokio::sync::oneshot::channel();
        let shutdown = async move {
            let _sent = counted_tx.send(finished.await.ok());
        };

        let options = RunOptions {
            tick: Duration::from_millis(5),
            time_limit: Some(Duration::from_secs(5)),
        };
        let summary = run(&mut sim, &mut queue, options, shutdown).await.unwrap();

        assert_eq!(summary.end_reason, EndReason::Shutdown);
        assert!(summary.commands >= 1);
        let civilizations = counted_rx.await.unwrap().unwrap().unwrap();
        assert_eq!(civilizations, 2);
    }
}
