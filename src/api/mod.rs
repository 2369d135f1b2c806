pub mod nominatim;
pub mod overpass;
pub mod throttle;

pub use nominatim::NominatimClient;
pub use overpass::{OverpassClient, OverpassResponse, build_query};
pub use throttle::Throttle;

use crate::domain::{Coordinate, RawElement};
use crate::error::{FetchError, GeoError};

/// Forward and reverse geocoding
pub trait GeoService: Send + Sync {
    /// `Ok(None)` when nothing matches `text`
    fn geocode(&self, text: &str) -> Result<Option<Coordinate>, GeoError>;

    /// `Ok(None)` when the service has no address for `at`
    fn reverse_geocode(&self, at: Coordinate) -> Result<Option<String>, GeoError>;
}

/// One proximity query against a PlaceIndex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceQuery<'a> {
    pub center: Coordinate,
    pub radius_km: f64,
    /// Opaque tag filter understood by the data source
    pub filter: &'a str,
    /// Upper bound hint; the index may return fewer or ignore it
    pub max_results: Option<usize>,
}

/// Tag-filtered proximity search over geographic elements
pub trait PlaceIndex: Send + Sync {
    fn query(&self, query: &PlaceQuery<'_>) -> Result<Vec<RawElement>, FetchError>;
}
