//! nearaid - Find emergency and civic resources near a place from OpenStreetMap data

pub mod aggregate;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod resolve;
pub mod search;

pub use aggregate::{
    AggregateOptions, Aggregation, AggregationStatus, Aggregator, CancelToken, Warning,
    WarningKind,
};
pub use api::{GeoService, PlaceIndex, PlaceQuery};
pub use domain::{Catalog, CategorySpec, Coordinate, RawElement, Resource};
pub use error::{FetchError, GeoError, SearchError};
pub use search::{SearchReport, SearchRequest, search};
