//! Day/night + weather-condition theme classification.
//!
//! [`classify`] is a pure function: no clock reads, no I/O, same output
//! for the same inputs. The host passes the current time in explicitly,
//! which also keeps the pre-interactive default stable (no snapshot yet
//! always renders as `theme-default`).

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

use crate::model::WeatherSnapshot;

/// Persisted user preference for the visual theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Auto,
    Light,
    Dark,
}

impl ThemePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Auto => "auto",
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
        }
    }

    pub const fn all() -> &'static [ThemePreference] {
        &[
            ThemePreference::Auto,
            ThemePreference::Light,
            ThemePreference::Dark,
        ]
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ThemePreference {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "auto" => Ok(ThemePreference::Auto),
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            _ => Err(anyhow::anyhow!(
                "Unknown theme preference '{value}'. Supported values: auto, light, dark."
            )),
        }
    }
}

/// Weather-condition half of a dynamic theme tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionTag {
    Rain,
    Snow,
    Clouds,
    Clear,
    Default,
}

impl ConditionTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionTag::Rain => "rain",
            ConditionTag::Snow => "snow",
            ConditionTag::Clouds => "clouds",
            ConditionTag::Clear => "clear",
            ConditionTag::Default => "default",
        }
    }
}

/// Time-of-day half of a dynamic theme tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeTag {
    Day,
    Night,
}

impl TimeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeTag::Day => "day",
            TimeTag::Night => "night",
        }
    }
}

/// The computed theme: either a fixed override or a condition/time pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
    Default,
    Dynamic { condition: ConditionTag, time: TimeTag },
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => f.write_str("theme-light"),
            Theme::Dark => f.write_str("theme-dark"),
            Theme::Default => f.write_str("theme-default"),
            Theme::Dynamic { condition, time } => {
                write!(f, "{} {}", condition.as_str(), time.as_str())
            }
        }
    }
}

/// Compute the display theme for a preference, an optional snapshot and
/// the current UTC unix time.
///
/// An explicit light/dark preference always wins and performs no weather
/// lookup. With `auto` and no snapshot the fixed neutral `theme-default`
/// is returned.
pub fn classify(
    pref: ThemePreference,
    snapshot: Option<&WeatherSnapshot>,
    now_epoch: i64,
) -> Theme {
    match pref {
        ThemePreference::Light => Theme::Light,
        ThemePreference::Dark => Theme::Dark,
        ThemePreference::Auto => match snapshot {
            None => Theme::Default,
            Some(snapshot) => Theme::Dynamic {
                condition: condition_tag(&snapshot.description),
                time: time_tag(snapshot, now_epoch),
            },
        },
    }
}

/// First match wins: rain before snow before cloud before clear.
fn condition_tag(description: &str) -> ConditionTag {
    let lower = description.to_lowercase();

    if lower.contains("rain") {
        ConditionTag::Rain
    } else if lower.contains("snow") {
        ConditionTag::Snow
    } else if lower.contains("cloud") {
        ConditionTag::Clouds
    } else if lower.contains("clear") {
        ConditionTag::Clear
    } else {
        ConditionTag::Default
    }
}

/// Day iff `sunrise <= now < sunset` in the city's local time. Half-open:
/// the sunrise instant is day, the sunset instant is already night. A
/// snapshot with `sunrise >= sunset` simply yields night for every
/// instant; it never panics.
fn time_tag(snapshot: &WeatherSnapshot, now_epoch: i64) -> TimeTag {
    let offset = i64::from(snapshot.utc_offset_secs);
    let local_now = now_epoch + offset;
    let local_sunrise = snapshot.sunrise_epoch + offset;
    let local_sunset = snapshot.sunset_epoch + offset;

    if local_sunrise <= local_now && local_now < local_sunset {
        TimeTag::Day
    } else {
        TimeTag::Night
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(description: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            city: "Testville".to_string(),
            temperature_c: 18.5,
            description: description.to_string(),
            humidity_pct: 55,
            wind_speed_mps: 2.0,
            utc_offset_secs: 0,
            sunrise_epoch: 21_600,
            sunset_epoch: 64_800,
        }
    }

    #[test]
    fn explicit_preference_always_wins() {
        let snap = snapshot("heavy snow");
        for (pref, expected) in [
            (ThemePreference::Light, "theme-light"),
            (ThemePreference::Dark, "theme-dark"),
        ] {
            assert_eq!(classify(pref, Some(&snap), 43_200).to_string(), expected);
            assert_eq!(classify(pref, None, 0).to_string(), expected);
        }
    }

    #[test]
    fn auto_without_snapshot_is_neutral_default() {
        assert_eq!(
            classify(ThemePreference::Auto, None, 43_200).to_string(),
            "theme-default"
        );
    }

    #[test]
    fn light_rain_at_noon_is_rain_day() {
        let snap = snapshot("light rain");
        let theme = classify(ThemePreference::Auto, Some(&snap), 43_200);
        assert_eq!(theme.to_string(), "rain day");
    }

    #[test]
    fn snow_between_sunrise_and_sunset_is_snow_day() {
        let snap = snapshot("Snow showers");
        let theme = classify(ThemePreference::Auto, Some(&snap), 30_000);
        assert_eq!(theme.to_string(), "snow day");
    }

    #[test]
    fn rain_takes_precedence_over_cloud_and_clear() {
        let snap = snapshot("cloudy with clearing rain");
        let theme = classify(ThemePreference::Auto, Some(&snap), 43_200);
        assert_eq!(theme.to_string(), "rain day");
    }

    #[test]
    fn unmatched_description_is_default_condition() {
        let snap = snapshot("haze");
        let theme = classify(ThemePreference::Auto, Some(&snap), 43_200);
        assert_eq!(theme.to_string(), "default day");
    }

    #[test]
    fn sunrise_instant_is_day_sunset_instant_is_night() {
        let snap = snapshot("clear sky");
        assert_eq!(
            classify(ThemePreference::Auto, Some(&snap), snap.sunrise_epoch).to_string(),
            "clear day"
        );
        assert_eq!(
            classify(ThemePreference::Auto, Some(&snap), snap.sunset_epoch).to_string(),
            "clear night"
        );
    }

    #[test]
    fn offset_shifts_the_day_window() {
        let mut snap = snapshot("clear sky");
        snap.utc_offset_secs = 7_200;
        // Offsets apply to now and sunrise/sunset alike, so the window in
        // UTC terms is unchanged.
        assert_eq!(
            classify(ThemePreference::Auto, Some(&snap), 43_200).to_string(),
            "clear day"
        );
        assert_eq!(
            classify(ThemePreference::Auto, Some(&snap), 70_000).to_string(),
            "clear night"
        );
    }

    #[test]
    fn inverted_sunrise_sunset_does_not_panic() {
        let mut snap = snapshot("clear sky");
        snap.sunrise_epoch = 64_800;
        snap.sunset_epoch = 21_600;
        let theme = classify(ThemePreference::Auto, Some(&snap), 43_200);
        assert_eq!(theme.to_string(), "clear night");
    }

    #[test]
    fn classify_is_idempotent() {
        let snap = snapshot("scattered clouds");
        let first = classify(ThemePreference::Auto, Some(&snap), 43_200);
        let second = classify(ThemePreference::Auto, Some(&snap), 43_200);
        assert_eq!(first, second);
        assert_eq!(first.to_string(), "clouds day");
    }

    #[test]
    fn preference_round_trips_through_str() {
        for pref in ThemePreference::all() {
            let parsed = ThemePreference::try_from(pref.as_str()).expect("round trip");
            assert_eq!(*pref, parsed);
        }
        assert!(ThemePreference::try_from("sepia").is_err());
    }
}
