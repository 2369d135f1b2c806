use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{GeoService, Throttle};
use crate::config::NominatimConfig;
use crate::domain::Coordinate;
use crate::error::GeoError;

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResult {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Nominatim geocoder.
///
/// Every request, forward or reverse, goes through one shared throttle so the
/// client never exceeds Nominatim's one-request-per-second policy.
pub struct NominatimClient {
    client: reqwest::blocking::Client,
    search_url: String,
    reverse_url: String,
    throttle: Throttle,
}

impl NominatimClient {
    pub fn new(config: &NominatimConfig) -> Result<Self, GeoError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            search_url: config.url.clone(),
            reverse_url: config.reverse_url.clone(),
            throttle: Throttle::new(Duration::from_millis(config.min_interval_ms)),
        })
    }

    fn get(&self, url: &str, params: &[(&str, String)]) -> Result<String, GeoError> {
        self.throttle.wait();

        let response = self.client.get(url).query(params).send()?;
        if !response.status().is_success() {
            return Err(GeoError::UnexpectedStatus {
                status: response.status().as_u16(),
            });
        }
        Ok(response.text()?)
    }
}

impl GeoService for NominatimClient {
    fn geocode(&self, text: &str) -> Result<Option<Coordinate>, GeoError> {
        debug!(query = text, "geocoding place");
        let body = self.get(
            &self.search_url,
            &[
                ("q", text.to_string()),
                ("format", "json".to_string()),
                ("limit", "1".to_string()),
            ],
        )?;
        parse_search(&body)
    }

    fn reverse_geocode(&self, at: Coordinate) -> Result<Option<String>, GeoError> {
        debug!(lat = at.lat, lon = at.lon, "reverse geocoding");
        let body = self.get(
            &self.reverse_url,
            &[
                ("lat", at.lat.to_string()),
                ("lon", at.lon.to_string()),
                ("format", "json".to_string()),
            ],
        )?;
        parse_reverse(&body)
    }
}

fn parse_search(body: &str) -> Result<Option<Coordinate>, GeoError> {
    let results: Vec<SearchResult> =
        serde_json::from_str(body).map_err(|e| GeoError::Malformed(e.to_string()))?;

    let Some(first) = results.into_iter().next() else {
        return Ok(None);
    };

    let lat: f64 = first
        .lat
        .parse()
        .map_err(|_| GeoError::Malformed(format!("bad latitude {:?}", first.lat)))?;
    let lon: f64 = first
        .lon
        .parse()
        .map_err(|_| GeoError::Malformed(format!("bad longitude {:?}", first.lon)))?;

    let coord = Coordinate::new(lat, lon);
    if !coord.is_usable() {
        return Err(GeoError::Malformed(format!("unusable coordinate {lat}, {lon}")));
    }
    Ok(Some(coord))
}

fn parse_reverse(body: &str) -> Result<Option<String>, GeoError> {
    let result: ReverseResult =
        serde_json::from_str(body).map_err(|e| GeoError::Malformed(e.to_string()))?;

    if result.error.is_some() {
        return Ok(None);
    }
    Ok(result
        .display_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty()))
}
