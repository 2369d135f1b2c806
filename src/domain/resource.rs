use serde::Serialize;

use super::{Coordinate, ElementKind};

/// Placeholder for missing phone / opening hours
pub const NOT_AVAILABLE: &str = "N/A";

/// A normalized point of interest, ready for presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub name: String,
    pub category: String,
    pub coordinate: Coordinate,
    pub distance_km: f64,
    pub address: String,
    pub phone: String,
    pub hours: String,
    /// OSM element this record came from
    pub source: ElementRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElementRef {
    pub kind: ElementKind,
    pub id: u64,
}

impl Resource {
    /// Dedupe key: name plus exact coordinate
    pub fn identity_key(&self) -> (String, (u64, u64)) {
        (self.name.clone(), self.coordinate.key())
    }
}
