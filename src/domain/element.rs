use std::collections::HashMap;

use serde::Serialize;

use super::Coordinate;

pub type Tags = HashMap<String, String>;

/// OSM element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn from_osm_type(value: &str) -> Option<ElementKind> {
        match value {
            "node" => Some(ElementKind::Node),
            "way" => Some(ElementKind::Way),
            "relation" => Some(ElementKind::Relation),
            _ => None,
        }
    }
}

/// Where the PlaceIndex put an element.
///
/// Nodes carry their own position; ways and relations only come back with a
/// computed center (`out center`), and some come back with neither.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementLocation {
    Direct(Coordinate),
    Center(Coordinate),
    Absent,
}

/// A geographic element as returned by the PlaceIndex
#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    pub kind: ElementKind,
    pub id: u64,
    pub tags: Tags,
    pub location: ElementLocation,
}

impl RawElement {
    pub fn new(kind: ElementKind, id: u64, tags: Tags, location: ElementLocation) -> Self {
        Self {
            kind,
            id,
            tags,
            location,
        }
    }

    /// Direct position, else center. `None` when absent or not a usable point.
    pub fn coordinate(&self) -> Option<Coordinate> {
        let coord = match self.location {
            ElementLocation::Direct(c) | ElementLocation::Center(c) => c,
            ElementLocation::Absent => return None,
        };
        coord.is_usable().then_some(coord)
    }

    /// Non-empty, trimmed tag value
    pub fn tag(&self, key: &str) -> Option<&str> {
        tag_value(&self.tags, key)
    }
}

/// Look up a tag, treating blank values as missing
pub fn tag_value<'a>(tags: &'a Tags, key: &str) -> Option<&'a str> {
    tags.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}
