use std::sync::Arc;
use std::time::Duration;

use notevault_core::config::VaultConfig;
use notevault_core::{ChangeMonitor, Error};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::commands::common::{format_summary, open_monitor, open_store};
use crate::error::CliError;

/// Check on a fixed interval until Ctrl-C
///
/// Each check runs on the blocking pool. A tick that fires while the
/// previous check is still running is skipped, never queued.
pub async fn run_watch(config: &VaultConfig, interval_secs: Option<u64>) -> Result<(), CliError> {
    let store = open_store(config)?;
    let monitor = Arc::new(open_monitor(config, store)?);
    let period = Duration::from_secs(interval_secs.unwrap_or_else(|| config.poll_interval_secs()).max(1));

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight: Option<JoinHandle<()>> = None;

    tracing::info!("Watching for note changes every {}s", period.as_secs());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if in_flight.as_ref().is_some_and(|handle| !handle.is_finished()) {
                    tracing::debug!("Previous check still running, skipping this tick");
                    continue;
                }
                if let Some(handle) = in_flight.take() {
                    handle.await.map_err(|e| CliError::Task(e.to_string()))?;
                }
                let monitor = Arc::clone(&monitor);
                in_flight = Some(tokio::task::spawn_blocking(move || run_one_check(&monitor)));
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping watcher");
                break;
            }
        }
    }

    if let Some(handle) = in_flight {
        handle.await.map_err(|e| CliError::Task(e.to_string()))?;
    }
    Ok(())
}

fn run_one_check(monitor: &ChangeMonitor) {
    match monitor.check_once() {
        Ok(summary) if summary.has_changes() || summary.failed > 0 => {
            tracing::info!("{}", format_summary(&summary));
        }
        Ok(summary) => tracing::debug!("{}", format_summary(&summary)),
        Err(Error::CheckInProgress) => {
            tracing::debug!("Previous check still running, skipping this tick");
        }
        Err(error) => tracing::warn!("Change check failed: {error}"),
    }
}
