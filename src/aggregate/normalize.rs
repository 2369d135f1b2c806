use crate::domain::{
    CategorySpec, Coordinate, ElementRef, NOT_AVAILABLE, RawElement, Resource, round2,
};
use crate::resolve::{
    MissingOperatorDefault, NamePolicy, classify, name_with_policy, resolve_address,
};

/// Slack for elements the index placed right on the radius boundary
const RADIUS_TOLERANCE_KM: f64 = 1e-6;

const PHONE_TAGS: [&str; 2] = ["phone", "contact:phone"];
const HOURS_TAGS: [&str; 1] = ["opening_hours"];

/// A resource whose address may still need a reverse geocode
#[derive(Debug, Clone)]
pub(crate) struct Draft {
    pub resource: Resource,
    pub needs_lookup: bool,
}

/// Why an element did not become a resource
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Dropped {
    pub no_coordinate: usize,
    pub out_of_range: usize,
    pub unnamed: usize,
}

pub(crate) struct Normalizer<'a> {
    pub user: Coordinate,
    pub radius_km: f64,
    pub name_policy: NamePolicy,
    pub missing_operator: MissingOperatorDefault,
    /// 0 means no cap
    pub max_per_category: usize,
    pub spec: &'a CategorySpec,
}

impl Normalizer<'_> {
    /// Turn one category's elements into drafts, keeping upstream order.
    ///
    /// The cap counts usable resources, so unusable elements never eat into it.
    pub fn run(&self, elements: &[RawElement]) -> (Vec<Draft>, Dropped) {
        let mut drafts = Vec::new();
        let mut dropped = Dropped::default();

        for element in elements {
            if self.max_per_category > 0 && drafts.len() >= self.max_per_category {
                break;
            }

            let Some(coordinate) = element.coordinate() else {
                dropped.no_coordinate += 1;
                continue;
            };

            let distance = self.user.distance_km(&coordinate);
            if distance > self.radius_km + RADIUS_TOLERANCE_KM {
                dropped.out_of_range += 1;
                continue;
            }

            let Some(name) = name_with_policy(&element.tags, &self.spec.name, self.name_policy)
            else {
                dropped.unnamed += 1;
                continue;
            };

            let (address, needs_lookup) = resolve_address(&element.tags, coordinate).into_parts();

            drafts.push(Draft {
                resource: Resource {
                    name,
                    category: classify(self.spec, &element.tags, self.missing_operator),
                    coordinate,
                    distance_km: round2(distance),
                    address,
                    phone: first_tag(element, &PHONE_TAGS),
                    hours: first_tag(element, &HOURS_TAGS),
                    source: ElementRef {
                        kind: element.kind,
                        id: element.id,
                    },
                },
                needs_lookup,
            });
        }

        (drafts, dropped)
    }
}

fn first_tag(element: &RawElement, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| element.tag(key))
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Classifier, ElementKind, ElementLocation, Tags};
    use crate::resolve::ADDRESS_NOT_AVAILABLE;

    const USER: Coordinate = Coordinate {
        lat: 17.3850,
        lon: 78.4867,
    };

    fn node(id: u64, lat: f64, lon: f64, tags: &[(&str, &str)]) -> RawElement {
        RawElement::new(
            ElementKind::Node,
            id,
            tags.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Tags>(),
            ElementLocation::Direct(Coordinate::new(lat, lon)),
        )
    }

    fn normalizer(spec: &CategorySpec) -> Normalizer<'_> {
        Normalizer {
            user: USER,
            radius_km: 5.0,
            name_policy: NamePolicy::SubstituteUnknown,
            missing_operator: MissingOperatorDefault::UnknownType,
            max_per_category: 0,
            spec,
        }
    }

    #[test]
    fn test_builds_full_record() {
        let spec = CategorySpec::new("Hospital", "[amenity=hospital]")
            .with_classifier(Classifier::Hospital);
        let element = node(
            11,
            17.3870,
            78.4880,
            &[
                ("name", "Osmania General Hospital"),
                ("operator", "Govt. of Telangana"),
                ("addr:street", "Afzal Gunj"),
                ("phone", "+91 40 2460 0146"),
            ],
        );

        let (drafts, dropped) = normalizer(&spec).run(&[element]);
        assert_eq!(dropped, Dropped::default());
        assert_eq!(drafts.len(), 1);

        let r = &drafts[0].resource;
        assert_eq!(r.name, "Osmania General Hospital");
        assert_eq!(r.category, "Government Hospital");
        assert_eq!(r.address, "Afzal Gunj");
        assert_eq!(r.phone, "+91 40 2460 0146");
        assert_eq!(r.hours, "N/A");
        assert_eq!(r.source.id, 11);
        assert!((r.distance_km - 0.25).abs() <= 0.05);
        assert!(!drafts[0].needs_lookup);
    }

    #[test]
    fn test_drops_unlocated_and_out_of_range() {
        let spec = CategorySpec::new("Police Station", "[amenity=police]");
        let nowhere = RawElement::new(
            ElementKind::Relation,
            1,
            Tags::new(),
            ElementLocation::Absent,
        );
        // ~55 km north
        let far = node(2, 17.885, 78.4867, &[("name", "Far Station")]);
        let near = node(3, 17.386, 78.4867, &[("name", "Near Station")]);

        let (drafts, dropped) = normalizer(&spec).run(&[nowhere, far, near]);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].resource.name, "Near Station");
        assert_eq!(dropped.no_coordinate, 1);
        assert_eq!(dropped.out_of_range, 1);
    }

    #[test]
    fn test_name_policy_drop() {
        let spec = CategorySpec::new("Pharmacy", "[amenity=pharmacy]");
        let mut n = normalizer(&spec);
        n.name_policy = NamePolicy::Drop;

        let (drafts, dropped) = n.run(&[
            node(1, 17.386, 78.4867, &[("amenity", "pharmacy")]),
            node(2, 17.386, 78.4868, &[("addr:city", "Hyderabad")]),
        ]);
        assert_eq!(dropped.unnamed, 1);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].resource.name, "Pharmacy in Hyderabad");
        assert_eq!(drafts[0].resource.address, "Hyderabad");
    }

    #[test]
    fn test_missing_address_flags_lookup() {
        let spec = CategorySpec::new("Shelter", "[social_facility=shelter]");
        let (drafts, _) = normalizer(&spec).run(&[node(1, 17.386, 78.4867, &[])]);

        assert_eq!(drafts[0].resource.name, "Unknown");
        assert_eq!(drafts[0].resource.address, ADDRESS_NOT_AVAILABLE);
        assert!(drafts[0].needs_lookup);
    }

    #[test]
    fn test_cap_keeps_source_order() {
        let spec = CategorySpec::new("Pharmacy", "[amenity=pharmacy]");
        let mut n = normalizer(&spec);
        n.max_per_category = 2;

        // Farthest first: the cap must not reorder by distance
        let elements = vec![
            node(1, 17.40, 78.4867, &[("name", "Far")]),
            node(2, 17.39, 78.4867, &[("name", "Middle")]),
            node(3, 17.386, 78.4867, &[("name", "Near")]),
        ];
        let (drafts, _) = n.run(&elements);

        let names: Vec<&str> = drafts.iter().map(|d| d.resource.name.as_str()).collect();
        assert_eq!(names, vec!["Far", "Middle"]);
    }

    #[test]
    fn test_contact_phone_fallback() {
        let spec = CategorySpec::new("Clinic", "[amenity=clinic]");
        let (drafts, _) = normalizer(&spec).run(&[node(
            1,
            17.386,
            78.4867,
            &[
                ("name", "Sai Clinic"),
                ("contact:phone", "040-1234"),
                ("opening_hours", "Mo-Sa 09:00-18:00"),
            ],
        )]);

        assert_eq!(drafts[0].resource.phone, "040-1234");
        assert_eq!(drafts[0].resource.hours, "Mo-Sa 09:00-18:00");
    }
}
