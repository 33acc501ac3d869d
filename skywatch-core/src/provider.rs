use crate::{config, model::WeatherSnapshot, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Abstraction over the weather service, kept as a seam so the CLI and
/// the tests can swap in fakes.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch current conditions for a city. Non-2xx responses and
    /// malformed bodies are both ordinary errors, never panics.
    async fn current(&self, city: &str) -> anyhow::Result<WeatherSnapshot>;
}

/// Construct the OpenWeather provider with the API key from the
/// environment. A missing key fails here with a hint instead of failing
/// deep inside a fetch.
pub fn provider_from_env() -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config::api_key_from_env()?;
    Ok(Box::new(OpenWeatherProvider::new(api_key)))
}
