//! Core library for the `skywatch` CLI.
//!
//! This crate defines:
//! - Settings persistence (theme preference, notification settings)
//! - Abstraction over the weather provider and location collaborators
//! - The day/night + weather-condition theme classifier
//! - The daily notification scheduler
//!
//! It is used by `skywatch-cli`, but can also be reused by other binaries
//! or services.

pub mod config;
pub mod model;
pub mod places;
pub mod provider;
pub mod schedule;
pub mod theme;

pub use config::{API_KEY_ENV, Settings, api_key_from_env};
pub use model::{Coordinates, Place, SnapshotCell, WeatherSnapshot};
pub use places::{Geolocator, IpGeolocator, PlaceKind, PlacesClient};
pub use provider::{WeatherProvider, provider_from_env};
pub use schedule::{
    NotificationScheduler, NotificationSettings, Notifier, Permission, SchedulerHandle,
    SchedulerInputs, SchedulerState,
};
pub use theme::{Theme, ThemePreference, classify};
