//! Daily local-notification scheduling.
//!
//! The scheduler is an explicit state machine ([`NotificationScheduler`])
//! driven by plain method calls with the current local time passed in, so
//! its arming, cancellation and re-entry rules are testable without a
//! runtime. [`SchedulerHandle`] wraps it in a tokio task that owns the
//! single pending timer and reacts to input changes and shutdown.

use chrono::{Duration as ChronoDuration, NaiveDateTime, NaiveTime};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::model::WeatherSnapshot;

/// Persisted notification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub enabled: bool,
    /// Local wall-clock firing time, 24-hour "HH:MM".
    pub time_of_day: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            time_of_day: "08:00".to_string(),
        }
    }
}

/// Invalid `time_of_day` configuration. The scheduler refuses to arm on
/// this; it never panics across the timer boundary.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid notification time '{0}': expected 24-hour HH:MM")]
pub struct TimeOfDayError(pub String);

/// Parse a 24-hour "HH:MM" string.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, TimeOfDayError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| TimeOfDayError(value.to_string()))
}

/// Next occurrence of `time_of_day` strictly after `now`, in local time.
/// If today's occurrence has already passed (or is exactly now), the
/// result is tomorrow's.
pub fn next_occurrence(now: NaiveDateTime, time_of_day: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(time_of_day);
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

/// Outcome of a platform notification-permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Local notification collaborator, injectable so the scheduler is
/// testable without a real notification surface.
pub trait Notifier: Send + Sync {
    fn request_permission(&self) -> Permission;
    fn show(&self, title: &str, body: &str);
}

/// Everything the scheduler reacts to. Any change re-evaluates the state
/// machine from the top.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerInputs {
    pub enabled: bool,
    pub time_of_day: String,
    pub snapshot: Option<WeatherSnapshot>,
}

impl SchedulerInputs {
    pub fn from_settings(settings: &NotificationSettings, snapshot: Option<WeatherSnapshot>) -> Self {
        Self {
            enabled: settings.enabled,
            time_of_day: settings.time_of_day.clone(),
            snapshot,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerState {
    /// Notifications off; no timer pending.
    Disabled,
    /// Enabled, but the platform has not granted permission. A denial is
    /// never treated as permanent: the next input change re-requests.
    RequestingPermission,
    /// One single-shot timer pending for `fire_at` (local time).
    Armed { fire_at: NaiveDateTime },
    /// `time_of_day` does not parse; arming refused.
    InvalidTime,
}

/// The notification state machine. Owns no timer itself; whoever drives
/// it (see [`SchedulerHandle`]) holds at most one pending sleep matching
/// the current `Armed` state, so replacing the state is cancelling the
/// timer.
pub struct NotificationScheduler {
    notifier: Arc<dyn Notifier>,
    state: SchedulerState,
    permission_granted: bool,
}

impl NotificationScheduler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            state: SchedulerState::Disabled,
            permission_granted: false,
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn fire_at(&self) -> Option<NaiveDateTime> {
        match self.state {
            SchedulerState::Armed { fire_at } => Some(fire_at),
            _ => None,
        }
    }

    /// Re-evaluate from the top with fresh inputs. Called on every input
    /// change and after every firing; the previous `Armed` state (and
    /// with it the pending timer) is always discarded first.
    pub fn apply(&mut self, inputs: &SchedulerInputs, now: NaiveDateTime) -> &SchedulerState {
        self.state = self.evaluate(inputs, now);
        debug!("scheduler state: {:?}", self.state);
        &self.state
    }

    fn evaluate(&mut self, inputs: &SchedulerInputs, now: NaiveDateTime) -> SchedulerState {
        if !inputs.enabled {
            return SchedulerState::Disabled;
        }

        let time_of_day = match parse_time_of_day(&inputs.time_of_day) {
            Ok(time) => time,
            Err(err) => {
                warn!("{err}");
                return SchedulerState::InvalidTime;
            }
        };

        if !self.permission_granted {
            match self.notifier.request_permission() {
                Permission::Granted => self.permission_granted = true,
                Permission::Denied => return SchedulerState::RequestingPermission,
            }
        }

        SchedulerState::Armed {
            fire_at: next_occurrence(now, time_of_day),
        }
    }

    /// The pending timer elapsed: emit at most one notification, then
    /// immediately re-arm for the next occurrence. With no snapshot the
    /// day's notification is skipped silently.
    pub fn on_elapsed(&mut self, inputs: &SchedulerInputs, now: NaiveDateTime) {
        if !matches!(self.state, SchedulerState::Armed { .. }) {
            return;
        }

        if inputs.enabled {
            match &inputs.snapshot {
                Some(snapshot) => {
                    info!("firing daily notification for {}", snapshot.city);
                    self.notifier.show(
                        &format!("Weather in {}", snapshot.city),
                        &format!(
                            "{}, {:.1}°C, humidity {}%",
                            snapshot.description, snapshot.temperature_c, snapshot.humidity_pct
                        ),
                    );
                }
                None => warn!("skipping today's notification: no weather data available"),
            }
        }

        self.apply(inputs, now);
    }
}

/// Handle to the running scheduler task.
///
/// The task holds the one pending sleep; pushing new inputs or shutting
/// down (or dropping the handle) wakes it and discards that sleep, so no
/// notification can fire after cancellation.
pub struct SchedulerHandle {
    inputs_tx: watch::Sender<SchedulerInputs>,
    shutdown_tx: mpsc::Sender<()>,
}

impl SchedulerHandle {
    /// Spawn the scheduler task on the current tokio runtime.
    pub fn spawn(notifier: Arc<dyn Notifier>, initial: SchedulerInputs) -> Self {
        let (inputs_tx, mut inputs_rx) = watch::channel(initial);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            let mut scheduler = NotificationScheduler::new(notifier);

            loop {
                let inputs = inputs_rx.borrow_and_update().clone();
                let now = chrono::Local::now().naive_local();
                scheduler.apply(&inputs, now);

                if let Some(fire_at) = scheduler.fire_at() {
                    // Recomputed from the wall clock on every (re-)arm, so
                    // drift does not accumulate across days.
                    let wait = (fire_at - now).to_std().unwrap_or(std::time::Duration::ZERO);
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {
                            // Re-read: an update racing the elapse (e.g. a
                            // disable) must win over the inputs captured at
                            // arm time.
                            let inputs = inputs_rx.borrow().clone();
                            scheduler.on_elapsed(&inputs, chrono::Local::now().naive_local());
                        }
                        changed = inputs_rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                        _ = shutdown_rx.recv() => break,
                    }
                } else {
                    tokio::select! {
                        changed = inputs_rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                        _ = shutdown_rx.recv() => break,
                    }
                }
            }
        });

        Self {
            inputs_tx,
            shutdown_tx,
        }
    }

    /// Push new inputs; the task cancels its pending timer and
    /// re-evaluates.
    pub fn update(&self, inputs: SchedulerInputs) {
        let _ = self.inputs_tx.send(inputs);
    }

    /// Tear the task down; deterministic cancellation of any pending
    /// timer.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}
