use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::{Aggregation, AggregationStatus, Aggregator, CancelToken, Warning};
use crate::api::GeoService;
use crate::domain::{Coordinate, Resource};
use crate::error::SearchError;

/// A place-name search as the user phrased it
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub place: String,
    pub radius_km: f64,
    pub categories: Vec<String>,
    /// 0 means no cap
    pub max_per_category: usize,
}

/// Everything the presentation layer needs to draw a result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub place: String,
    pub center: Coordinate,
    pub radius_km: f64,
    pub status: AggregationStatus,
    pub resources: Vec<Resource>,
    pub warnings: Vec<Warning>,
}

impl SearchReport {
    pub fn new(
        place: impl Into<String>,
        center: Coordinate,
        radius_km: f64,
        aggregation: Aggregation,
    ) -> Self {
        Self {
            place: place.into(),
            center,
            radius_km,
            status: aggregation.status(),
            resources: aggregation.resources,
            warnings: aggregation.warnings,
        }
    }
}

/// Geocode `request.place`, then aggregate around it.
///
/// Request parameters are checked before the geocoder is touched; a failed or
/// empty geocode ends the search before any category is queried.
pub fn search(
    geocoder: &dyn GeoService,
    aggregator: &Aggregator<'_>,
    request: &SearchRequest,
    cancel: &CancelToken,
) -> Result<SearchReport, SearchError> {
    let place = request.place.trim();
    if place.is_empty() {
        return Err(SearchError::InvalidInput("place name is empty".to_string()));
    }
    if !request.radius_km.is_finite() || request.radius_km <= 0.0 {
        return Err(SearchError::InvalidInput(format!(
            "radius must be a positive number of kilometers, got {}",
            request.radius_km
        )));
    }
    if request.categories.is_empty() {
        return Err(SearchError::InvalidInput("no categories selected".to_string()));
    }

    let center = match geocoder.geocode(place) {
        Ok(Some(center)) => center,
        Ok(None) => {
            return Err(SearchError::LocationNotFound {
                query: place.to_string(),
                reason: "no match".to_string(),
            });
        }
        Err(err) => {
            debug!(place, error = %err, "geocoding failed");
            return Err(SearchError::LocationNotFound {
                query: place.to_string(),
                reason: err.to_string(),
            });
        }
    };
    info!(place, lat = center.lat, lon = center.lon, "geocoded");

    if cancel.is_cancelled() {
        return Err(SearchError::Cancelled);
    }

    let aggregation = aggregator.aggregate_with_cancel(
        center,
        request.radius_km,
        request.categories.as_slice(),
        request.max_per_category,
        cancel,
    )?;

    Ok(SearchReport::new(
        place,
        center,
        request.radius_km,
        aggregation,
    ))
}
