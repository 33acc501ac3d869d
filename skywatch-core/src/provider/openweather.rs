use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::model::WeatherSnapshot;

use super::WeatherProvider;

const CURRENT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            http: Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    /// Offset of the city's time zone from UTC, in seconds.
    timezone: i32,
    sys: OwSys,
}

fn snapshot_from(parsed: OwCurrentResponse) -> Result<WeatherSnapshot> {
    let description = parsed
        .weather
        .first()
        .map(|w| w.description.clone())
        .ok_or_else(|| anyhow!("OpenWeather response contained no weather conditions"))?;

    Ok(WeatherSnapshot {
        city: parsed.name,
        temperature_c: parsed.main.temp,
        description,
        humidity_pct: parsed.main.humidity,
        wind_speed_mps: parsed.wind.speed,
        utc_offset_secs: parsed.timezone,
        sunrise_epoch: parsed.sys.sunrise,
        sunset_epoch: parsed.sys.sunset,
    })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, city: &str) -> Result<WeatherSnapshot> {
        let res = self
            .http
            .get(CURRENT_WEATHER_URL)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: OwCurrentResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather JSON")?;

        snapshot_from(parsed)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    // Back off to a char boundary so multibyte bodies cannot split.
    let mut cut = MAX;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &body[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "Kyiv",
        "main": {"temp": 17.4, "feels_like": 16.9, "humidity": 63, "pressure": 1016},
        "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
        "wind": {"speed": 3.6, "deg": 250},
        "timezone": 10800,
        "sys": {"country": "UA", "sunrise": 1756093200, "sunset": 1756142400},
        "dt": 1756120000
    }"#;

    #[test]
    fn maps_current_response_to_snapshot() {
        let parsed: OwCurrentResponse = serde_json::from_str(SAMPLE).expect("parse");
        let snapshot = snapshot_from(parsed).expect("map");

        assert_eq!(snapshot.city, "Kyiv");
        assert_eq!(snapshot.temperature_c, 17.4);
        assert_eq!(snapshot.description, "light rain");
        assert_eq!(snapshot.humidity_pct, 63);
        assert_eq!(snapshot.wind_speed_mps, 3.6);
        assert_eq!(snapshot.utc_offset_secs, 10_800);
        assert_eq!(snapshot.sunrise_epoch, 1_756_093_200);
        assert_eq!(snapshot.sunset_epoch, 1_756_142_400);
    }

    #[test]
    fn missing_required_field_is_a_parse_error() {
        // No sys.sunrise/sunset: malformed, treated as a fetch failure by
        // the caller rather than a panic.
        let body = r#"{
            "name": "Kyiv",
            "main": {"temp": 17.4, "humidity": 63},
            "weather": [{"description": "light rain"}],
            "wind": {"speed": 3.6},
            "timezone": 10800
        }"#;
        assert!(serde_json::from_str::<OwCurrentResponse>(body).is_err());
    }

    #[test]
    fn empty_conditions_array_is_an_error() {
        let body = r#"{
            "name": "Kyiv",
            "main": {"temp": 17.4, "humidity": 63},
            "weather": [],
            "wind": {"speed": 3.6},
            "timezone": 10800,
            "sys": {"sunrise": 1, "sunset": 2}
        }"#;
        let parsed: OwCurrentResponse = serde_json::from_str(body).expect("parse");
        let err = snapshot_from(parsed).unwrap_err();
        assert!(err.to_string().contains("no weather conditions"));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(500);
        let truncated = truncate_body(&body);
        assert!(truncated.len() <= 203);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn truncation_respects_multibyte_char_boundaries() {
        // 3 bytes per char, so byte 200 falls inside a character; an
        // error body echoing a non-ASCII city name must not panic.
        let body = "€".repeat(100);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 203);
        assert!(truncated.strip_suffix("...").unwrap().chars().all(|c| c == '€'));

        let mixed = format!("city not found: Łódź{}", "й".repeat(200));
        let truncated = truncate_body(&mixed);
        assert!(truncated.ends_with("..."));
    }
}
