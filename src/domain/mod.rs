pub mod category;
pub mod coordinate;
pub mod element;
pub mod resource;

pub use category::{Catalog, CategorySpec, Classifier, DEFAULT_SELECTION};
pub use coordinate::{Coordinate, round2};
pub use element::{ElementKind, ElementLocation, RawElement, Tags, tag_value};
pub use resource::{ElementRef, NOT_AVAILABLE, Resource};
