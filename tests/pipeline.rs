use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use nearaid::domain::{ElementKind, ElementLocation, Tags};
use nearaid::{
    AggregateOptions, AggregationStatus, Aggregator, CancelToken, Catalog, Coordinate,
    FetchError, GeoError, GeoService, PlaceIndex, PlaceQuery, RawElement, SearchError,
    SearchRequest, WarningKind, search,
};

const HYDERABAD: Coordinate = Coordinate {
    lat: 17.3850,
    lon: 78.4867,
};

struct FakeGeocoder {
    places: HashMap<String, Coordinate>,
}

impl GeoService for FakeGeocoder {
    fn geocode(&self, text: &str) -> Result<Option<Coordinate>, GeoError> {
        Ok(self.places.get(text).copied())
    }

    fn reverse_geocode(&self, _at: Coordinate) -> Result<Option<String>, GeoError> {
        Ok(Some("Somewhere in Hyderabad".to_string()))
    }
}

/// Returns fixtures by filter; "[amenity=pharmacy]" always times out
struct FakeIndex {
    fixtures: HashMap<String, Vec<RawElement>>,
    seen: Mutex<Vec<String>>,
}

impl PlaceIndex for FakeIndex {
    fn query(&self, query: &PlaceQuery<'_>) -> Result<Vec<RawElement>, FetchError> {
        self.seen.lock().unwrap().push(query.filter.to_string());
        if query.filter == "[amenity=pharmacy]" {
            return Err(FetchError::Timeout(Duration::from_secs(30)));
        }
        Ok(self.fixtures.get(query.filter).cloned().unwrap_or_default())
    }
}

fn element(kind: ElementKind, id: u64, location: ElementLocation, tags: &[(&str, &str)]) -> RawElement {
    let tags: Tags = tags
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    RawElement::new(kind, id, tags, location)
}

fn fixtures() -> FakeIndex {
    let mut fixtures = HashMap::new();
    fixtures.insert(
        "[amenity=hospital]".to_string(),
        vec![
            element(
                ElementKind::Way,
                100,
                ElementLocation::Center(Coordinate::new(17.3870, 78.4880)),
                &[
                    ("name", "Osmania General Hospital"),
                    ("operator", "Govt. of Telangana"),
                    ("addr:full", "Afzal Gunj, Hyderabad"),
                ],
            ),
            element(
                ElementKind::Node,
                101,
                ElementLocation::Direct(Coordinate::new(17.3950, 78.4867)),
                &[("name", "Sunshine Hospital"), ("operator", "Private Healthcare Ltd")],
            ),
            element(
                ElementKind::Relation,
                102,
                ElementLocation::Absent,
                &[("name", "Nowhere Hospital")],
            ),
        ],
    );
    fixtures.insert(
        "[amenity=police]".to_string(),
        vec![element(
            ElementKind::Node,
            200,
            ElementLocation::Direct(Coordinate::new(17.3860, 78.4867)),
            &[("addr:city", "Hyderabad"), ("amenity", "police")],
        )],
    );

    FakeIndex {
        fixtures,
        seen: Mutex::new(Vec::new()),
    }
}

fn geocoder() -> FakeGeocoder {
    let mut places = HashMap::new();
    places.insert("Hyderabad".to_string(), HYDERABAD);
    FakeGeocoder { places }
}

fn request(place: &str) -> SearchRequest {
    SearchRequest {
        place: place.to_string(),
        radius_km: 5.0,
        categories: vec![
            "Hospital".to_string(),
            "Pharmacy".to_string(),
            "Police Station".to_string(),
        ],
        max_per_category: 0,
    }
}

fn options() -> AggregateOptions {
    AggregateOptions {
        politeness_delay: Duration::ZERO,
        ..AggregateOptions::default()
    }
}

#[test]
fn search_merges_categories_and_survives_a_failing_one() {
    let catalog = Catalog::default();
    let index = fixtures();
    let geo = geocoder();
    let aggregator = Aggregator::new(&catalog, &index, options()).with_geocoder(&geo);

    let report = search(&geo, &aggregator, &request("Hyderabad"), &CancelToken::new()).unwrap();

    assert_eq!(report.status, AggregationStatus::Found);
    assert_eq!(report.center, HYDERABAD);

    let rows: Vec<(&str, &str)> = report
        .resources
        .iter()
        .map(|r| (r.name.as_str(), r.category.as_str()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("Police Station in Hyderabad", "Police Station"),
            ("Osmania General Hospital", "Government Hospital"),
            ("Sunshine Hospital", "Private Hospital"),
        ]
    );

    let osmania = &report.resources[1];
    assert!((osmania.distance_km - 0.25).abs() <= 0.05);
    assert_eq!(osmania.address, "Afzal Gunj, Hyderabad");

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].category, "Pharmacy");
    assert_eq!(report.warnings[0].kind, WarningKind::CategoryFetch);
    assert!(report.warnings[0].message.contains("timed out"));

    assert_eq!(
        *index.seen.lock().unwrap(),
        vec!["[amenity=hospital]", "[amenity=police]", "[amenity=pharmacy]"]
    );
}

#[test]
fn unknown_place_fails_before_any_category_query() {
    let catalog = Catalog::default();
    let index = fixtures();
    let geo = geocoder();
    let aggregator = Aggregator::new(&catalog, &index, options());

    let err = search(&geo, &aggregator, &request("Atlantis"), &CancelToken::new()).unwrap_err();

    assert!(matches!(err, SearchError::LocationNotFound { .. }));
    assert!(index.seen.lock().unwrap().is_empty());
}

#[test]
fn report_serializes_for_presentation() {
    let catalog = Catalog::default();
    let index = fixtures();
    let geo = geocoder();
    let aggregator = Aggregator::new(&catalog, &index, options());

    let report = search(&geo, &aggregator, &request("Hyderabad"), &CancelToken::new()).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["status"], "found");
    assert_eq!(json["radius_km"], 5.0);
    assert_eq!(json["resources"][0]["source"]["kind"], "node");
    assert_eq!(json["warnings"][0]["kind"], "category_fetch");
}
