//! Geolocation and nearby-places lookups (police stations, rescue/safe
//! places).
//!
//! Both lookups are independent one-shot calls with no ordering
//! relationship; geolocation failure is silent (the feature just stays
//! unavailable).

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::env;

use crate::model::{Coordinates, Place};

/// Base URL of the nearby-places service; override with this variable.
pub const PLACES_URL_ENV: &str = "SKYWATCH_PLACES_URL";

const DEFAULT_PLACES_URL: &str = "http://127.0.0.1:8001";
const IP_GEOLOCATION_URL: &str = "http://ip-api.com/json";

/// One-shot geolocation collaborator. Injectable so the CLI paths are
/// testable without network access.
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Resolve the current position, or `None` if unavailable. Never
    /// errors: denial or failure silently disables the feature.
    async fn locate(&self) -> Option<Coordinates>;
}

/// IP-address based geolocation.
#[derive(Debug, Clone, Default)]
pub struct IpGeolocator {
    http: Client,
}

impl IpGeolocator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    lat: f64,
    lon: f64,
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Option<Coordinates> {
        let result: std::result::Result<IpApiResponse, _> = async {
            self.http
                .get(IP_GEOLOCATION_URL)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await
        }
        .await;

        match result {
            Ok(parsed) => Some(Coordinates {
                latitude: parsed.lat,
                longitude: parsed.lon,
            }),
            Err(err) => {
                debug!("geolocation unavailable: {err}");
                None
            }
        }
    }
}

/// Kind of nearby place to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceKind {
    Police,
    Rescue,
}

impl PlaceKind {
    fn path(self) -> &'static str {
        match self {
            PlaceKind::Police => "nearby/police",
            PlaceKind::Rescue => "nearby/rescue",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaceKind::Police => "police stations",
            PlaceKind::Rescue => "rescue places",
        }
    }
}

/// Client for the nearby-places endpoints.
#[derive(Debug, Clone)]
pub struct PlacesClient {
    http: Client,
    base_url: String,
}

impl PlacesClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Build a client from `SKYWATCH_PLACES_URL`, falling back to the
    /// default local service.
    pub fn from_env() -> Self {
        let base_url =
            env::var(PLACES_URL_ENV).unwrap_or_else(|_| DEFAULT_PLACES_URL.to_string());
        Self::new(base_url)
    }

    /// Places of `kind` near `coords`, sorted by the service.
    pub async fn nearby(&self, kind: PlaceKind, coords: Coordinates) -> Result<Vec<Place>> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), kind.path());

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", kind.label()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read {} response body", kind.label()))?;

        if !status.is_success() {
            return Err(anyhow!(
                "{} request failed with status {status}",
                kind.label()
            ));
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse {} JSON", kind.label()))
    }
}
