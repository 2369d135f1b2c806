use serde::Deserialize;

use crate::domain::{Tags, tag_value};

const NAME_TAGS: [&str; 4] = ["name", "name:en", "brand", "operator"];
const LOCALITY_TAGS: [&str; 2] = ["addr:suburb", "addr:city"];

pub const UNKNOWN_NAME: &str = "Unknown";

/// What to do with an element whose name cannot be derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NamePolicy {
    /// Skip the element
    Drop,
    /// Keep it, named "Unknown"
    #[default]
    SubstituteUnknown,
}

/// Name from tags, else "<category> in <locality>", else `None`.
pub fn resolve_name(tags: &Tags, category: &str) -> Option<String> {
    if let Some(name) = NAME_TAGS.iter().find_map(|key| tag_value(tags, key)) {
        return Some(name.to_string());
    }

    LOCALITY_TAGS
        .iter()
        .find_map(|key| tag_value(tags, key))
        .map(|locality| format!("{} in {}", category, locality))
}

/// Apply `policy` to the result of [`resolve_name`]
pub fn name_with_policy(tags: &Tags, category: &str, policy: NamePolicy) -> Option<String> {
    match (resolve_name(tags, category), policy) {
        (Some(name), _) => Some(name),
        (None, NamePolicy::Drop) => None,
        (None, NamePolicy::SubstituteUnknown) => Some(UNKNOWN_NAME.to_string()),
    }
}
