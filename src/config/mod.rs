use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregate::AggregateOptions;
use crate::domain::{Catalog, CategorySpec};
use crate::resolve::{MissingOperatorDefault, NamePolicy};

pub const USER_AGENT: &str = "nearaid/0.1.0 (emergency resource finder)";

fn default_radius_km() -> f64 {
    5.0
}
fn default_reverse_geocode() -> bool {
    true
}
fn default_workers() -> usize {
    1
}

#[derive(Debug, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
    /// Category names to search; empty means the default selection
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub max_per_category: usize,
    #[serde(default)]
    pub name_policy: NamePolicy,
    #[serde(default)]
    pub missing_operator: MissingOperatorDefault,
    #[serde(default = "default_reverse_geocode")]
    pub reverse_geocode: bool,
    #[serde(default)]
    pub reverse_geocode_budget: Option<usize>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Extra or replacement category definitions
    #[serde(default, rename = "category")]
    pub extra_categories: Vec<CategorySpec>,
    #[serde(default)]
    pub overpass: Option<OverpassConfig>,
    #[serde(default)]
    pub nominatim: Option<NominatimConfig>,
}

fn default_overpass_urls() -> Vec<String> {
    vec![
        "https://overpass-api.de/api/interpreter".to_string(),
        "https://overpass.private.coffee/api/interpreter".to_string(),
        "https://maps.mail.ru/osm/tools/overpass/api/interpreter".to_string(),
    ]
}

fn default_overpass_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_secs() -> u64 {
    5
}

fn default_politeness_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverpassConfig {
    #[serde(default = "default_overpass_urls")]
    pub urls: Vec<String>,
    #[serde(default = "default_overpass_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
    /// Minimum spacing between Overpass calls
    #[serde(default = "default_politeness_ms")]
    pub politeness_ms: u64,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            urls: default_overpass_urls(),
            timeout_secs: default_overpass_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_secs: default_retry_backoff_secs(),
            politeness_ms: default_politeness_ms(),
        }
    }
}

fn default_search_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_reverse_url() -> String {
    "https://nominatim.openstreetmap.org/reverse".to_string()
}

fn default_nominatim_timeout_secs() -> u64 {
    10
}

fn default_min_interval_ms() -> u64 {
    1000
}

fn default_user_agent() -> String {
    USER_AGENT.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct NominatimConfig {
    #[serde(default = "default_search_url")]
    pub url: String,
    #[serde(default = "default_reverse_url")]
    pub reverse_url: String,
    #[serde(default = "default_nominatim_timeout_secs")]
    pub timeout_secs: u64,
    /// Nominatim usage policy: at most one request per second
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            url: default_search_url(),
            reverse_url: default_reverse_url(),
            timeout_secs: default_nominatim_timeout_secs(),
            min_interval_ms: default_min_interval_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl FileConfig {
    /// First config file found in the standard locations
    pub fn load() -> Option<Self> {
        for path in get_config_paths() {
            if !path.exists() {
                continue;
            }
            match Self::from_path(&path) {
                Ok(config) => return Some(config),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load config file");
                }
            }
        }
        None
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Default catalog with this file's category definitions applied
    pub fn catalog(&self) -> Catalog {
        let mut catalog = Catalog::default();
        for spec in &self.extra_categories {
            catalog.upsert(spec.clone());
        }
        catalog
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        let overpass = self.overpass.clone().unwrap_or_default();
        AggregateOptions {
            name_policy: self.name_policy,
            missing_operator: self.missing_operator,
            reverse_geocode: self.reverse_geocode,
            reverse_geocode_budget: self.reverse_geocode_budget,
            workers: self.workers,
            politeness_delay: Duration::from_millis(overpass.politeness_ms),
        }
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("nearaid.toml"));
    paths.push(PathBuf::from(".nearaid.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("nearaid").join("config.toml"));
        paths.push(config_dir.join("nearaid.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".nearaid.toml"));
        paths.push(home.join(".config").join("nearaid").join("config.toml"));
    }

    paths
}
