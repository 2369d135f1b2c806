//! Tag-level normalization: names, addresses and category refinement.

pub mod address;
pub mod classify;
pub mod name;

pub use address::{ADDRESS_NOT_AVAILABLE, ADDRESS_UNKNOWN, AddressSource, resolve_address};
pub use classify::{MissingOperatorDefault, classify, classify_hospital};
pub use name::{NamePolicy, UNKNOWN_NAME, name_with_policy, resolve_name};
