use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::{PlaceIndex, PlaceQuery};
use crate::config::{OverpassConfig, USER_AGENT};
use crate::domain::{Coordinate, ElementKind, ElementLocation, RawElement};
use crate::error::FetchError;

/// Raw Overpass API response
#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Set by Overpass when the query hit a runtime error (data is partial)
    #[serde(default)]
    pub remark: Option<String>,
}

/// A single element from Overpass (node, way or relation)
#[derive(Debug, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: u64,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// Present on ways/relations fetched with `out center`
    #[serde(default)]
    pub center: Option<Center>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

impl Element {
    /// `None` for element types other than node/way/relation
    pub fn into_raw(self) -> Option<RawElement> {
        let kind = ElementKind::from_osm_type(&self.type_)?;

        let location = match (self.lat, self.lon, self.center) {
            (Some(lat), Some(lon), _) => ElementLocation::Direct(Coordinate::new(lat, lon)),
            (_, _, Some(c)) => ElementLocation::Center(Coordinate::new(c.lat, c.lon)),
            _ => ElementLocation::Absent,
        };

        Some(RawElement::new(
            kind,
            self.id,
            self.tags.unwrap_or_default(),
            location,
        ))
    }
}

impl OverpassResponse {
    pub fn into_raw_elements(self) -> Vec<RawElement> {
        self.elements
            .into_iter()
            .filter_map(Element::into_raw)
            .collect()
    }
}

/// Overpass QL for every node/way/relation matching `filter` within the radius
pub fn build_query(query: &PlaceQuery<'_>, server_timeout_secs: u64) -> String {
    let radius_m = (query.radius_km * 1000.0).round() as u64;
    let limit = query
        .max_results
        .map(|n| format!(" {}", n))
        .unwrap_or_default();

    format!(
        "[out:json][timeout:{timeout}];\nnwr(around:{radius},{lat},{lon}){filter};\nout center{limit};",
        timeout = server_timeout_secs,
        radius = radius_m,
        lat = query.center.lat,
        lon = query.center.lon,
        filter = query.filter,
        limit = limit,
    )
}

/// PlaceIndex backed by one or more Overpass API mirrors
pub struct OverpassClient {
    client: reqwest::blocking::Client,
    config: OverpassConfig,
}

impl OverpassClient {
    pub fn new(config: OverpassConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            // Client timeout slightly higher than the server-side one
            .timeout(Duration::from_secs(config.timeout_secs + 5))
            .build()?;

        Ok(Self { client, config })
    }

    /// POST `query` with retries on 429/504/timeouts, rotating through mirrors
    fn execute(&self, query: &str) -> Result<OverpassResponse, FetchError> {
        if self.config.urls.is_empty() {
            return Err(FetchError::Malformed("no Overpass URLs configured".to_string()));
        }

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let attempts = self.config.max_retries.max(1);
        let mut last_error = String::new();

        for attempt in 0..attempts {
            let url = &self.config.urls[attempt as usize % self.config.urls.len()];

            if attempt > 0 {
                let wait_secs = self.config.retry_backoff_secs * attempt as u64;
                warn!(
                    url = %url,
                    attempt = attempt + 1,
                    max = attempts,
                    wait_secs,
                    "retrying Overpass query"
                );
                std::thread::sleep(Duration::from_secs(wait_secs));
            }

            // Overpass expects form-encoded POST data: data=<query>
            let response = match self.client.post(url).form(&[("data", query)]).send() {
                Ok(r) => r,
                Err(e) if e.is_timeout() || e.is_connect() => {
                    last_error = FetchError::from_reqwest(e, timeout).to_string();
                    continue;
                }
                Err(e) => return Err(FetchError::from_reqwest(e, timeout)),
            };

            match response.status().as_u16() {
                200 => {
                    let body = response
                        .text()
                        .map_err(|e| FetchError::from_reqwest(e, timeout))?;
                    return parse_response(&body);
                }
                429 | 504 => {
                    last_error = format!("status {} from {}", response.status(), url);
                    continue;
                }
                status => {
                    return Err(FetchError::UnexpectedStatus {
                        status,
                        url: url.clone(),
                    });
                }
            }
        }

        Err(FetchError::Exhausted {
            attempts,
            last: last_error,
        })
    }
}

impl PlaceIndex for OverpassClient {
    fn query(&self, query: &PlaceQuery<'_>) -> Result<Vec<RawElement>, FetchError> {
        let ql = build_query(query, self.config.timeout_secs);
        debug!(filter = query.filter, radius_km = query.radius_km, "querying Overpass");

        let response = self.execute(&ql)?;
        Ok(response.into_raw_elements())
    }
}

fn parse_response(body: &str) -> Result<OverpassResponse, FetchError> {
    let response: OverpassResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    // Overpass reports server-side timeouts as a 200 with a remark
    if let Some(remark) = response.remark.as_deref()
        && remark.contains("error")
    {
        return Err(FetchError::Malformed(remark.to_string()));
    }

    Ok(response)
}
