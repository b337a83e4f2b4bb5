//! Periodic world summary.
//!
//! The reporter is an ordinary command-queue client: it asks the engine
//! loop for a snapshot on a fixed real-time period and writes one summary
//! line per snapshot. It exits once the loop stops accepting commands.

use std::time::Duration;

use civitas_core::{CommandError, SimulationHandle, WorldSnapshot};
use civitas_diplomacy::Relation;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Spawn the reporter task.
pub fn spawn_reporter(handle: SimulationHandle, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick fires immediately; skip it so the first summary
        // covers a full period.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match handle.snapshot().await {
                Ok(snapshot) => log_summary(&snapshot),
                Err(CommandError::Closed | CommandError::NoReply) => {
                    debug!("engine loop stopped, reporter exiting");
                    break;
                }
                Err(e) => warn!(error = %e, "snapshot request failed"),
            }
        }
    })
}

fn log_summary(snapshot: &WorldSnapshot) {
    let active_routes = snapshot.routes.iter().filter(|r| r.active).count();
    let active_agreements = snapshot.agreements.iter().filter(|a| a.active).count();
    let mean_score = mean(snapshot.relations.iter().map(Relation::score));
    info!(
        world = %snapshot.world,
        day = snapshot.day,
        economic_cycle = snapshot.economic_cycle,
        diplomacy_cycle = snapshot.diplomacy_cycle,
        civilizations = snapshot.civilizations.len(),
        active_routes,
        active_agreements,
        mean_score,
        price_level = snapshot.price_level,
        money_supply = %snapshot.money_supply(),
        "world summary"
    );
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0_usize), |(sum, count), v| (sum + v, count.saturating_add(1)));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_nothing_is_zero() {
        assert!(mean(std::iter::empty()).abs() < f64::EPSILON);
        assert!((mean([10.0, -4.0, 3.0].into_iter()) - 3.0).abs() < 1e-12);
    }
}
