use serde::Deserialize;

use crate::domain::{CategorySpec, Classifier, Tags};

pub const GOVERNMENT_HOSPITAL: &str = "Government Hospital";
pub const PRIVATE_HOSPITAL: &str = "Private Hospital";
pub const UNKNOWN_TYPE_HOSPITAL: &str = "Hospital (Unknown Type)";

/// Category given to a hospital whose operator says neither "government" nor "private"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MissingOperatorDefault {
    #[default]
    UnknownType,
    Government,
}

/// Final category for an element matched under `spec`
pub fn classify(spec: &CategorySpec, tags: &Tags, missing: MissingOperatorDefault) -> String {
    match spec.classifier {
        Some(Classifier::Hospital) => classify_hospital(tags, missing).to_string(),
        None => spec.name.clone(),
    }
}

pub fn classify_hospital(tags: &Tags, missing: MissingOperatorDefault) -> &'static str {
    let operator = tags
        .get("operator")
        .map(|op| op.to_lowercase())
        .unwrap_or_default();

    if operator.contains("government") || operator.contains("govt") {
        GOVERNMENT_HOSPITAL
    } else if operator.contains("private") {
        PRIVATE_HOSPITAL
    } else {
        match missing {
            MissingOperatorDefault::UnknownType => UNKNOWN_TYPE_HOSPITAL,
            MissingOperatorDefault::Government => GOVERNMENT_HOSPITAL,
        }
    }
}
