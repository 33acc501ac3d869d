use anyhow::Context;
use chrono::{DateTime, FixedOffset, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Confirm, Select, Text, validator::Validation};
use std::convert::TryFrom;

use skywatch_core::{
    Coordinates, IpGeolocator, PlaceKind, PlacesClient, Settings, ThemePreference, WeatherProvider,
    classify, places::Geolocator, provider_from_env, schedule::parse_time_of_day,
};

use crate::watch;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skywatch", version, about = "Weather lookup with themes and daily notifications")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current weather, sunrise/sunset and the display theme for a city.
    Show {
        /// City name, e.g. "Kyiv".
        city: String,
    },

    /// Interactively configure theme preference and notifications.
    Configure,

    /// Manage and run daily weather notifications.
    Notify {
        #[command(subcommand)]
        action: NotifyAction,
    },

    /// Look up nearby police stations and rescue places.
    Nearby {
        /// Which kind of place to look up.
        #[arg(long, value_enum, default_value = "all")]
        kind: NearbyKind,
    },
}

#[derive(Debug, Subcommand)]
pub enum NotifyAction {
    /// Enable daily notifications.
    Enable,

    /// Disable daily notifications.
    Disable,

    /// Set the daily notification time (24-hour HH:MM).
    At { time: String },

    /// Run the notification loop in the foreground for a city.
    Run {
        /// City to keep fetching weather for.
        city: String,

        /// Minutes between weather refreshes.
        #[arg(long, default_value_t = 30)]
        refresh_mins: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NearbyKind {
    Police,
    Rescue,
    All,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Show { city } => show(&city).await,
            Command::Configure => configure(),
            Command::Notify { action } => match action {
                NotifyAction::Enable => set_enabled(true),
                NotifyAction::Disable => set_enabled(false),
                NotifyAction::At { time } => set_time(&time),
                NotifyAction::Run { city, refresh_mins } => watch::run(city, refresh_mins).await,
            },
            Command::Nearby { kind } => nearby(kind).await,
        }
    }
}

async fn show(city: &str) -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let provider = provider_from_env()?;

    let snapshot = provider.current(city).await?;
    let theme = classify(settings.theme, Some(&snapshot), Utc::now().timestamp());

    println!("Weather in {}", snapshot.city);
    println!("  Conditions:  {}", snapshot.description);
    println!("  Temperature: {:.1} °C", snapshot.temperature_c);
    println!("  Humidity:    {} %", snapshot.humidity_pct);
    println!("  Wind speed:  {:.1} m/s", snapshot.wind_speed_mps);
    println!(
        "  Sunrise:     {} local",
        local_time(snapshot.sunrise_epoch, snapshot.utc_offset_secs)
    );
    println!(
        "  Sunset:      {} local",
        local_time(snapshot.sunset_epoch, snapshot.utc_offset_secs)
    );
    println!("  Theme:       {theme}");

    Ok(())
}

/// Render a UTC timestamp in the city's local time.
fn local_time(epoch: i64, offset_secs: i32) -> String {
    match (
        DateTime::<Utc>::from_timestamp(epoch, 0),
        FixedOffset::east_opt(offset_secs),
    ) {
        (Some(instant), Some(offset)) => {
            instant.with_timezone(&offset).format("%H:%M").to_string()
        }
        _ => "--:--".to_string(),
    }
}

fn configure() -> anyhow::Result<()> {
    let mut settings = Settings::load()?;

    let theme_choice = Select::new(
        "Theme preference:",
        ThemePreference::all()
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>(),
    )
    .with_starting_cursor(
        ThemePreference::all()
            .iter()
            .position(|p| *p == settings.theme)
            .unwrap_or(0),
    )
    .prompt()
    .context("Theme selection aborted")?;
    settings.theme = ThemePreference::try_from(theme_choice)?;

    settings.notifications.enabled = Confirm::new("Enable daily weather notifications?")
        .with_default(settings.notifications.enabled)
        .prompt()
        .context("Notification toggle aborted")?;

    if settings.notifications.enabled {
        settings.notifications.time_of_day = Text::new("Notification time (24-hour HH:MM):")
            .with_initial_value(&settings.notifications.time_of_day)
            .with_validator(|input: &str| match parse_time_of_day(input) {
                Ok(_) => Ok(Validation::Valid),
                Err(err) => Ok(Validation::Invalid(err.to_string().into())),
            })
            .prompt()
            .context("Notification time prompt aborted")?;
    }

    settings.save()?;
    println!("Settings saved to {}", Settings::settings_file_path()?.display());

    Ok(())
}

fn set_enabled(enabled: bool) -> anyhow::Result<()> {
    let mut settings = Settings::load()?;
    settings.notifications.enabled = enabled;
    settings.save()?;

    if enabled {
        println!(
            "Daily notifications enabled at {}. Start them with `skywatch notify run <city>`.",
            settings.notifications.time_of_day
        );
    } else {
        println!("Daily notifications disabled.");
    }

    Ok(())
}

fn set_time(time: &str) -> anyhow::Result<()> {
    parse_time_of_day(time)?;

    let mut settings = Settings::load()?;
    settings.notifications.time_of_day = time.to_string();
    settings.save()?;

    println!("Daily notification time set to {time}.");
    Ok(())
}

async fn nearby(kind: NearbyKind) -> anyhow::Result<()> {
    let geolocator = IpGeolocator::new();
    let Some(coords) = geolocator.locate().await else {
        println!("Current location unavailable; nearby lookups skipped.");
        return Ok(());
    };

    let client = PlacesClient::from_env();

    match kind {
        NearbyKind::Police => print_places(&client, PlaceKind::Police, coords).await,
        NearbyKind::Rescue => print_places(&client, PlaceKind::Rescue, coords).await,
        NearbyKind::All => {
            // Independent lookups, run concurrently; one failing does not
            // block the other.
            let (police, rescue) = tokio::join!(
                print_places(&client, PlaceKind::Police, coords),
                print_places(&client, PlaceKind::Rescue, coords),
            );
            police.and(rescue)
        }
    }
}

async fn print_places(
    client: &PlacesClient,
    kind: PlaceKind,
    coords: Coordinates,
) -> anyhow::Result<()> {
    match client.nearby(kind, coords).await {
        Ok(places) if places.is_empty() => {
            println!("No {} found nearby.", kind.label());
            Ok(())
        }
        Ok(places) => {
            println!("Nearby {}:", kind.label());
            for place in places {
                let mut line = format!("  {} ({:.1} km)", place.name, place.distance);
                if let Some(address) = &place.address {
                    line.push_str(&format!(" - {address}"));
                }
                if let Some(description) = &place.description {
                    line.push_str(&format!(" [{description}]"));
                }
                println!("{line}");
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("Could not fetch {}: {err:#}", kind.label());
            Ok(())
        }
    }
}
