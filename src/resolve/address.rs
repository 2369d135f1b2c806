use crate::domain::{Coordinate, Tags, tag_value};

/// Address tags tried in order; the first non-empty one wins
pub const ADDRESS_TAGS: [&str; 5] = [
    "addr:full",
    "addr:street",
    "addr:city",
    "addr:suburb",
    "addr:state",
];

/// Reverse geocoding failed or found nothing
pub const ADDRESS_UNKNOWN: &str = "Unknown";
/// Reverse geocoding was not attempted (disabled or out of budget)
pub const ADDRESS_NOT_AVAILABLE: &str = "Address not available";

/// Outcome of tag-only address resolution
#[derive(Debug, Clone, PartialEq)]
pub enum AddressSource {
    Tagged(String),
    /// No structured tag matched; only a reverse geocode of this point can help
    NeedsLookup(Coordinate),
}

impl AddressSource {
    pub fn requires_remote_lookup(&self) -> bool {
        matches!(self, AddressSource::NeedsLookup(_))
    }

    /// `(address, requires_remote_lookup)`; the address is a placeholder when a lookup is needed
    pub fn into_parts(self) -> (String, bool) {
        match self {
            AddressSource::Tagged(address) => (address, false),
            AddressSource::NeedsLookup(_) => (ADDRESS_NOT_AVAILABLE.to_string(), true),
        }
    }
}

pub fn resolve_address(tags: &Tags, coordinate: Coordinate) -> AddressSource {
    ADDRESS_TAGS
        .iter()
        .find_map(|key| tag_value(tags, key))
        .map(|value| AddressSource::Tagged(value.to_string()))
        .unwrap_or(AddressSource::NeedsLookup(coordinate))
}
