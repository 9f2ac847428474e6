use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::quartz::content::lookup::Geocoder;
use crate::quartz::content::model::Coordinates;
use crate::quartz::content::text::naming::strip_trailing_counter;

/// Hand-maintained coordinates for names the geocoder gets wrong or cannot
/// find. Keys are exact page names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinateOverrides {
    entries: BTreeMap<String, Coordinates>,
}

impl CoordinateOverrides {
    pub fn new(entries: BTreeMap<String, Coordinates>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<Coordinates> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Turns a page name into coordinates: the override table first, then a
/// short list of geocoder queries.
pub struct PlaceResolver<'a> {
    overrides: &'a CoordinateOverrides,
    geocoder: &'a dyn Geocoder,
    qualifiers: &'a [String],
}

/// Result of resolving one name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Override(Coordinates),
    Geocoded(Coordinates),
    NotFound,
    Failed,
}

impl Resolution {
    pub fn coordinates(self) -> Option<Coordinates> {
        match self {
            Resolution::Override(coords) | Resolution::Geocoded(coords) => Some(coords),
            Resolution::NotFound | Resolution::Failed => None,
        }
    }
}

impl<'a> PlaceResolver<'a> {
    pub fn new(overrides: &'a CoordinateOverrides, geocoder: &'a dyn Geocoder, qualifiers: &'a [String]) -> Self {
        Self {
            overrides,
            geocoder,
            qualifiers,
        }
    }

    /// Resolves `name`, trying `hint` as the first geocoder query when given.
    ///
    /// A transport error stops the remaining queries for this name.
    pub fn resolve(&self, name: &str, hint: Option<&str>) -> Resolution {
        if let Some(coords) = self.overrides.get(name) {
            debug!(name, "using coordinate override");
            return Resolution::Override(coords);
        }

        for query in self.queries(name, hint) {
            match self.geocoder.locate(&query) {
                Ok(Some(coords)) => {
                    debug!(name, query = %query, "geocoded");
                    return Resolution::Geocoded(coords);
                }
                Ok(None) => debug!(name, query = %query, "no geocoder result"),
                Err(error) => {
                    warn!(name, %error, "geocoder error");
                    return Resolution::Failed;
                }
            }
        }

        info!(name, "could not geocode");
        Resolution::NotFound
    }

    /// Geocoder queries in the order they are tried, without repeats.
    pub fn queries(&self, name: &str, hint: Option<&str>) -> Vec<String> {
        let base = strip_trailing_counter(name.trim());
        let mut queries: Vec<String> = Vec::new();
        let candidates = hint
            .map(str::trim)
            .filter(|hint| !hint.is_empty())
            .map(str::to_string)
            .into_iter()
            .chain(std::iter::once(base.to_string()))
            .chain(self.qualifiers.iter().map(|suffix| format!("{base}{suffix}")));
        for query in candidates {
            if !queries.contains(&query) {
                queries.push(query);
            }
        }
        queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quartz::content::error::{Result, SyncError};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Geocoder answering from a fixed table and recording its queries.
    #[derive(Default)]
    struct Table {
        answers: HashMap<String, Coordinates>,
        fail_on: Option<String>,
        asked: RefCell<Vec<String>>,
    }

    impl Geocoder for Table {
        fn locate(&self, query: &str) -> Result<Option<Coordinates>> {
            self.asked.borrow_mut().push(query.to_string());
            if self.fail_on.as_deref() == Some(query) {
                return Err(SyncError::Http("timed out".into()));
            }
            Ok(self.answers.get(query).copied())
        }
    }

    fn overrides(name: &str, coords: Coordinates) -> CoordinateOverrides {
        CoordinateOverrides::new(BTreeMap::from([(name.to_string(), coords)]))
    }

    #[test]
    fn override_beats_geocoder() {
        let pinned = Coordinates { lat: 47.633, lng: -52.942 };
        let geocoder = Table {
            answers: HashMap::from([("Bell Island".to_string(), Coordinates { lat: 1.0, lng: 1.0 })]),
            ..Table::default()
        };
        let table = overrides("Bell Island", pinned);
        let resolver = PlaceResolver::new(&table, &geocoder, &[]);
        assert_eq!(resolver.resolve("Bell Island", Some("Bell Island")), Resolution::Override(pinned));
        assert!(geocoder.asked.borrow().is_empty());
    }

    #[test]
    fn falls_back_through_qualifiers() {
        let found = Coordinates { lat: 18.98, lng: 73.27 };
        let geocoder = Table {
            answers: HashMap::from([("Matheran, India".to_string(), found)]),
            ..Table::default()
        };
        let empty = CoordinateOverrides::default();
        let qualifiers = vec![", India".to_string(), ", Newfoundland, Canada".to_string()];
        let resolver = PlaceResolver::new(&empty, &geocoder, &qualifiers);

        assert_eq!(resolver.resolve("Matheran 2", None), Resolution::Geocoded(found));
        assert_eq!(*geocoder.asked.borrow(), vec!["Matheran", "Matheran, India"]);
    }

    #[test]
    fn hint_is_tried_first() {
        let empty = CoordinateOverrides::default();
        let geocoder = Table::default();
        let resolver = PlaceResolver::new(&empty, &geocoder, &[]);
        assert_eq!(
            resolver.queries("Paris", Some("Paris, France")),
            vec!["Paris, France", "Paris"]
        );
        assert_eq!(resolver.queries("Paris", Some("Paris")), vec!["Paris"]);
    }

    #[test]
    fn transport_error_stops_the_lookup() {
        let empty = CoordinateOverrides::default();
        let geocoder = Table {
            fail_on: Some("Goa".to_string()),
            ..Table::default()
        };
        let qualifiers = vec![", India".to_string()];
        let resolver = PlaceResolver::new(&empty, &geocoder, &qualifiers);
        assert_eq!(resolver.resolve("Goa", None), Resolution::Failed);
        assert_eq!(*geocoder.asked.borrow(), vec!["Goa"]);
    }
}
