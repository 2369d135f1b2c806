//! Multi-category resource aggregation.
//!
//! One PlaceIndex query per selected category, normalized into [`Resource`]
//! records, merged in category-declaration order, deduplicated by
//! `(name, coordinate)` and stably sorted by distance. A failing category only
//! produces a [`Warning`]; the other categories still contribute.

mod normalize;

use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

use crate::api::{GeoService, PlaceIndex, PlaceQuery, Throttle};
use crate::domain::{Catalog, CategorySpec, Coordinate, Resource};
use crate::error::{FetchError, SearchError};
use crate::resolve::{ADDRESS_NOT_AVAILABLE, ADDRESS_UNKNOWN, MissingOperatorDefault, NamePolicy};

use normalize::{Draft, Normalizer};

pub const MAX_WORKERS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    pub name_policy: NamePolicy,
    pub missing_operator: MissingOperatorDefault,
    /// Fall back to reverse geocoding when no address tag is present
    pub reverse_geocode: bool,
    /// Max reverse geocode calls per search; `None` is unlimited
    pub reverse_geocode_budget: Option<usize>,
    /// Concurrent category queries, clamped to 1..=MAX_WORKERS
    pub workers: usize,
    /// Minimum spacing between PlaceIndex calls
    pub politeness_delay: Duration,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            name_policy: NamePolicy::default(),
            missing_operator: MissingOperatorDefault::default(),
            reverse_geocode: true,
            reverse_geocode_budget: None,
            workers: 1,
            politeness_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    UnknownCategory,
    CategoryFetch,
    AddressResolution,
}

/// A non-fatal problem, reported next to the results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub category: String,
    pub kind: WarningKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStatus {
    Found,
    /// Every query succeeded but nothing matched
    NoResources,
    AllCategoriesFailed,
    /// None of the selected names is in the catalog, so nothing was queried
    NoKnownCategories,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub resources: Vec<Resource>,
    pub warnings: Vec<Warning>,
    pub categories_queried: usize,
    pub categories_failed: usize,
}

impl Aggregation {
    pub fn status(&self) -> AggregationStatus {
        if !self.resources.is_empty() {
            AggregationStatus::Found
        } else if self.categories_queried == 0 {
            AggregationStatus::NoKnownCategories
        } else if self.categories_failed == self.categories_queried {
            AggregationStatus::AllCategoriesFailed
        } else {
            AggregationStatus::NoResources
        }
    }

    pub fn category_warnings(&self) -> impl Iterator<Item = &Warning> {
        self.warnings
            .iter()
            .filter(|w| w.kind == WarningKind::CategoryFetch)
    }
}

/// Cooperative cancellation, checked between categories and between reverse lookups
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

enum CategoryOutcome {
    Fetched(Vec<Draft>),
    Failed(FetchError),
}

pub struct Aggregator<'a> {
    catalog: &'a Catalog,
    index: &'a dyn PlaceIndex,
    geocoder: Option<&'a dyn GeoService>,
    options: AggregateOptions,
    throttle: Throttle,
}

impl<'a> Aggregator<'a> {
    pub fn new(catalog: &'a Catalog, index: &'a dyn PlaceIndex, options: AggregateOptions) -> Self {
        let throttle = Throttle::new(options.politeness_delay);
        Self {
            catalog,
            index,
            geocoder: None,
            options,
            throttle,
        }
    }

    /// Geocoder used for the reverse lookup address fallback
    pub fn with_geocoder(mut self, geocoder: &'a dyn GeoService) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Query, merge and rank resources around `user`.
    ///
    /// `max_per_category` of 0 means no cap. Unknown category names are skipped
    /// and reported as [`WarningKind::UnknownCategory`] warnings.
    pub fn aggregate<S: AsRef<str>>(
        &self,
        user: Coordinate,
        radius_km: f64,
        selected: &[S],
        max_per_category: usize,
    ) -> Result<Aggregation, SearchError> {
        self.aggregate_with_cancel(user, radius_km, selected, max_per_category, &CancelToken::new())
    }

    pub fn aggregate_with_cancel<S: AsRef<str>>(
        &self,
        user: Coordinate,
        radius_km: f64,
        selected: &[S],
        max_per_category: usize,
        cancel: &CancelToken,
    ) -> Result<Aggregation, SearchError> {
        validate(user, radius_km, selected)?;

        let specs = self.catalog.select(selected);
        let mut warnings: Vec<Warning> = self
            .catalog
            .unknown(selected)
            .into_iter()
            .map(|name| {
                debug!(category = name, "skipping unknown category");
                Warning {
                    category: name.to_string(),
                    kind: WarningKind::UnknownCategory,
                    message: "unknown category".to_string(),
                }
            })
            .collect();

        let outcomes = self.fetch_all(&specs, user, radius_km, max_per_category, cancel);
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        let mut drafts = Vec::new();
        let mut failed = 0;

        for (spec, outcome) in specs.iter().zip(outcomes) {
            match outcome {
                Some(CategoryOutcome::Fetched(category_drafts)) => drafts.extend(category_drafts),
                Some(CategoryOutcome::Failed(err)) => {
                    debug!(category = %spec.name, error = %err, "category query failed");
                    failed += 1;
                    warnings.push(Warning {
                        category: spec.name.clone(),
                        kind: WarningKind::CategoryFetch,
                        message: err.to_string(),
                    });
                }
                // Only reachable when cancelled, handled above
                None => return Err(SearchError::Cancelled),
            }
        }

        let mut drafts = dedupe(drafts);
        drafts.sort_by(|a, b| a.resource.distance_km.total_cmp(&b.resource.distance_km));

        let resources = self.resolve_addresses(drafts, &mut warnings, cancel)?;

        info!(
            resources = resources.len(),
            categories = specs.len(),
            failed,
            "aggregation complete"
        );

        Ok(Aggregation {
            resources,
            warnings,
            categories_queried: specs.len(),
            categories_failed: failed,
        })
    }

    /// One outcome per spec, in spec order. `None` marks a category skipped by cancellation.
    fn fetch_all(
        &self,
        specs: &[&CategorySpec],
        user: Coordinate,
        radius_km: f64,
        max_per_category: usize,
        cancel: &CancelToken,
    ) -> Vec<Option<CategoryOutcome>> {
        let workers = self.options.workers.clamp(1, MAX_WORKERS).min(specs.len().max(1));
        let run = |spec: &CategorySpec| -> Option<CategoryOutcome> {
            if cancel.is_cancelled() {
                return None;
            }
            Some(self.fetch_category(spec, user, radius_km, max_per_category))
        };

        if workers == 1 {
            return specs.iter().map(|spec| run(*spec)).collect();
        }

        let next = AtomicUsize::new(0);
        let slots: Mutex<Vec<Option<CategoryOutcome>>> =
            Mutex::new(specs.iter().map(|_| None).collect());

        thread::scope(|s| {
            for _ in 0..workers {
                s.spawn(|| {
                    loop {
                        let i = next.fetch_add(1, Ordering::SeqCst);
                        let Some(spec) = specs.get(i) else { break };
                        let outcome = run(*spec);
                        slots.lock().unwrap_or_else(|e| e.into_inner())[i] = outcome;
                    }
                });
            }
        });

        slots.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn fetch_category(
        &self,
        spec: &CategorySpec,
        user: Coordinate,
        radius_km: f64,
        max_per_category: usize,
    ) -> CategoryOutcome {
        let query = PlaceQuery {
            center: user,
            radius_km,
            filter: &spec.filter,
            max_results: (max_per_category > 0).then_some(max_per_category),
        };

        self.throttle.wait();
        let elements = match self.index.query(&query) {
            Ok(elements) => elements,
            Err(err) => return CategoryOutcome::Failed(err),
        };

        let normalizer = Normalizer {
            user,
            radius_km,
            name_policy: self.options.name_policy,
            missing_operator: self.options.missing_operator,
            max_per_category,
            spec,
        };
        let (drafts, dropped) = normalizer.run(&elements);

        debug!(
            category = %spec.name,
            returned = elements.len(),
            kept = drafts.len(),
            no_coordinate = dropped.no_coordinate,
            out_of_range = dropped.out_of_range,
            unnamed = dropped.unnamed,
            "normalized category"
        );

        CategoryOutcome::Fetched(drafts)
    }

    /// Fill in addresses that tags could not provide, one reverse geocode at a time.
    fn resolve_addresses(
        &self,
        drafts: Vec<Draft>,
        warnings: &mut Vec<Warning>,
        cancel: &CancelToken,
    ) -> Result<Vec<Resource>, SearchError> {
        let mut budget = self.options.reverse_geocode_budget;
        let geocoder = self.geocoder.filter(|_| self.options.reverse_geocode);
        let mut resources = Vec::with_capacity(drafts.len());

        for Draft {
            mut resource,
            needs_lookup,
        } in drafts
        {
            if needs_lookup {
                resource.address = match (geocoder, budget) {
                    (Some(_), Some(0)) | (None, _) => ADDRESS_NOT_AVAILABLE.to_string(),
                    (Some(geo), _) => {
                        if cancel.is_cancelled() {
                            return Err(SearchError::Cancelled);
                        }
                        if let Some(left) = budget.as_mut() {
                            *left -= 1;
                        }
                        match geo.reverse_geocode(resource.coordinate) {
                            Ok(Some(address)) => address,
                            Ok(None) => ADDRESS_UNKNOWN.to_string(),
                            Err(err) => {
                                debug!(name = %resource.name, error = %err, "reverse geocode failed");
                                warnings.push(Warning {
                                    category: resource.category.clone(),
                                    kind: WarningKind::AddressResolution,
                                    message: format!("{}: {}", resource.name, err),
                                });
                                ADDRESS_UNKNOWN.to_string()
                            }
                        }
                    }
                };
            }
            resources.push(resource);
        }

        Ok(resources)
    }
}

fn validate<S: AsRef<str>>(user: Coordinate, radius_km: f64, selected: &[S]) -> Result<(), SearchError> {
    if !user.is_usable() {
        return Err(SearchError::InvalidInput(format!(
            "unusable coordinate ({}, {})",
            user.lat, user.lon
        )));
    }
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(SearchError::InvalidInput(format!(
            "radius must be a positive number of kilometers, got {radius_km}"
        )));
    }
    if selected.is_empty() {
        return Err(SearchError::InvalidInput("no categories selected".to_string()));
    }
    Ok(())
}

/// Keep the first draft for each identity key
fn dedupe(drafts: Vec<Draft>) -> Vec<Draft> {
    let mut seen = HashSet::new();
    drafts
        .into_iter()
        .filter(|d| seen.insert(d.resource.identity_key()))
        .collect()
}
