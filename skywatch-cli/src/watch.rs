//! Foreground notification loop: keeps the weather snapshot fresh and
//! feeds it to the scheduler until Ctrl-C.

use anyhow::Context;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

use skywatch_core::{
    Notifier, Permission, SchedulerHandle, SchedulerInputs, Settings, SnapshotCell,
    WeatherProvider, provider_from_env,
};

/// Terminal-backed notification surface. Permission is always granted
/// here; the permission flow matters for surfaces that can refuse.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    fn show(&self, title: &str, body: &str) {
        println!("[notification] {title}: {body}");
    }
}

/// Refresh cadence, clamped to at least one minute and saturating for
/// absurdly large values.
fn refresh_interval(refresh_mins: u64) -> Duration {
    Duration::from_secs(refresh_mins.max(1).saturating_mul(60))
}

pub async fn run(city: String, refresh_mins: u64) -> anyhow::Result<()> {
    let settings = Settings::load()?;
    if !settings.notifications.enabled {
        println!(
            "Daily notifications are disabled. Enable them with `skywatch notify enable` \
             or `skywatch configure`."
        );
        return Ok(());
    }

    let provider = provider_from_env()?;
    let mut cell = SnapshotCell::new();

    let handle = SchedulerHandle::spawn(
        Arc::new(TerminalNotifier),
        SchedulerInputs::from_settings(&settings.notifications, None),
    );

    println!(
        "Watching weather for {city}; daily notification at {}. Press Ctrl-C to stop.",
        settings.notifications.time_of_day
    );

    let mut ticker = tokio::time::interval(refresh_interval(refresh_mins));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let seq = cell.begin();
                match provider.current(&city).await {
                    Ok(snapshot) => {
                        if cell.commit(seq, snapshot) {
                            info!("refreshed weather for {city}");
                            handle.update(SchedulerInputs::from_settings(
                                &settings.notifications,
                                cell.snapshot().cloned(),
                            ));
                        }
                    }
                    Err(err) => {
                        if cell.fail(seq, format!("{err:#}")) {
                            // One message per failed attempt, replacing the
                            // previous one; the loop keeps running and the
                            // scheduler skips days without data.
                            warn!("weather refresh failed: {err:#}");
                            if let Some(message) = cell.error() {
                                eprintln!("{message}");
                            }
                            handle.update(SchedulerInputs::from_settings(
                                &settings.notifications,
                                None,
                            ));
                        }
                    }
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                handle.shutdown().await;
                println!("Stopped; pending notification timer cancelled.");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_interval_clamps_to_a_minute() {
        assert_eq!(refresh_interval(0), Duration::from_secs(60));
        assert_eq!(refresh_interval(30), Duration::from_secs(1800));
    }

    #[test]
    fn refresh_interval_saturates_instead_of_overflowing() {
        assert_eq!(refresh_interval(u64::MAX), Duration::from_secs(u64::MAX));
    }
}
