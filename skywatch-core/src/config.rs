use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

use crate::{schedule::NotificationSettings, theme::ThemePreference};

/// Environment variable holding the OpenWeather API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// User settings stored on disk.
///
/// Example TOML:
/// ```toml
/// theme = "auto"
///
/// [notifications]
/// enabled = true
/// time_of_day = "08:00"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: ThemePreference,
    pub notifications: NotificationSettings,
}

impl Settings {
    /// Load settings from the platform config directory.
    ///
    /// A missing or malformed file degrades to the defaults (theme `auto`,
    /// notifications disabled at 08:00) rather than erroring, so a broken
    /// file never blocks the app from starting.
    pub fn load() -> Result<Self> {
        Ok(Self::load_from(&Self::settings_file_path()?))
    }

    /// Load settings from an explicit path. Used directly by tests.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                warn!("failed to read settings file {}: {err}", path.display());
                return Self::default();
            }
        };

        match toml::from_str(&contents) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(
                    "ignoring malformed settings file {}: {err}",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Save settings to the platform config directory, creating parent
    /// directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize settings to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the settings file.
    pub fn settings_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skywatch", "skywatch")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Read the OpenWeather API key from the environment.
///
/// A missing key is an ordinary error with a hint, never a panic, so a
/// fetch attempted without credentials fails cleanly.
pub fn api_key_from_env() -> Result<String> {
    env::var(API_KEY_ENV).map_err(|_| {
        anyhow!(
            "No OpenWeather API key found.\n\
             Hint: export {API_KEY_ENV}=<your key> and retry."
        )
    })
}
