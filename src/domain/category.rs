use serde::{Deserialize, Serialize};

/// Refinement applied to a category's elements after they are fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classifier {
    /// Split hospitals by the `operator` tag into government/private
    Hospital,
}

/// A named resource category and the Overpass tag filter that selects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub name: String,
    pub filter: String,
    #[serde(default)]
    pub classifier: Option<Classifier>,
}

impl CategorySpec {
    pub fn new(name: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter: filter.into(),
            classifier: None,
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = Some(classifier);
        self
    }
}

/// The ordered set of known categories. Order is the query order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    specs: Vec<CategorySpec>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(vec![
            CategorySpec::new("Hospital", "[amenity=hospital]").with_classifier(Classifier::Hospital),
            CategorySpec::new("Medical Camps", "[healthcare=clinic][charity=yes]"),
            CategorySpec::new("Police Station", "[amenity=police]"),
            CategorySpec::new("Fire Station", "[amenity=fire_station]"),
            CategorySpec::new("Pharmacy", "[amenity=pharmacy]"),
            CategorySpec::new("Clinic", "[amenity=clinic]"),
            CategorySpec::new("Blood Bank", "[healthcare=blood_donation]"),
            CategorySpec::new("Shelter", "[social_facility=shelter]"),
        ])
    }
}

/// Categories searched when the caller names none
pub const DEFAULT_SELECTION: [&str; 3] = ["Hospital", "Medical Camps", "Police Station"];

impl Catalog {
    /// Build a catalog; a later spec with a repeated name replaces the earlier one in place.
    pub fn new(specs: Vec<CategorySpec>) -> Self {
        let mut catalog = Self { specs: Vec::new() };
        for spec in specs {
            catalog.upsert(spec);
        }
        catalog
    }

    pub fn upsert(&mut self, spec: CategorySpec) {
        match self.specs.iter_mut().find(|s| s.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.specs.push(spec),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CategorySpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategorySpec> {
        self.specs.iter()
    }

    /// Selected specs in declaration order. Unknown names are ignored.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Vec<&CategorySpec> {
        self.specs
            .iter()
            .filter(|spec| names.iter().any(|n| n.as_ref() == spec.name))
            .collect()
    }

    /// Requested names that match no category, in request order
    pub fn unknown<'n, S: AsRef<str>>(&self, names: &'n [S]) -> Vec<&'n str> {
        names
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| self.get(n).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_keeps_declaration_order() {
        let catalog = Catalog::default();
        let selected = catalog.select(&["Police Station", "Hospital", "Nope"]);

        let names: Vec<&str> = selected.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Hospital", "Police Station"]);
    }

    #[test]
    fn test_unknown_is_case_sensitive() {
        let catalog = Catalog::default();
        let unknown = catalog.unknown(&["pharmacy", "Pharmacy", "Nope"]);
        assert_eq!(unknown, vec!["pharmacy", "Nope"]);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut catalog = Catalog::default();
        catalog.upsert(CategorySpec::new("Hospital", "[amenity=hospital][emergency=yes]"));
        catalog.upsert(CategorySpec::new("Toilets", "[amenity=toilets]"));

        assert_eq!(catalog.names().next(), Some("Hospital"));
        assert_eq!(
            catalog.get("Hospital").map(|s| s.filter.as_str()),
            Some("[amenity=hospital][emergency=yes]")
        );
        assert_eq!(catalog.names().last(), Some("Toilets"));
    }

    #[test]
    fn test_default_hospital_has_classifier() {
        let catalog = Catalog::default();
        assert_eq!(
            catalog.get("Hospital").and_then(|s| s.classifier),
            Some(Classifier::Hospital)
        );
        for name in DEFAULT_SELECTION {
            assert!(catalog.get(name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn test_deserialize_from_toml() {
        let spec: CategorySpec =
            toml::from_str("name = \"Hospital\"\nfilter = \"[amenity=hospital]\"\nclassifier = \"hospital\"\n")
                .unwrap();
        assert_eq!(spec.classifier, Some(Classifier::Hospital));
    }
}
