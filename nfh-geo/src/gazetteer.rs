use crate::{
    coordinate::Coordinate,
    error::{GeoError, Result},
};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Embedded CSV table of the 77 district centers of Nepal.
pub static DISTRICTS_CSV: &str = include_str!("../../fixtures/districts.csv");

/// Embedded CSV table of community forests and protected areas.
pub static COMMUNITY_FORESTS_CSV: &str = include_str!("../../fixtures/community_forests.csv");

/// Which source table a place came from.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum PlaceKind {
    District,
    CommunityForest,
}

/// A named point in the gazetteer.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub coordinate: Coordinate,
    pub kind: PlaceKind,
}

/// How the user picked the analysis location.
#[derive(Debug, PartialEq, Clone)]
pub enum LocationQuery {
    /// Case-insensitive substring of a gazetteer name
    Name(String),
    /// Raw decimal degrees
    Coordinates { lat: f64, lon: f64 },
}

/// A location ready for analysis.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub name: String,
    pub coordinate: Coordinate,
}

/// Outcome of resolving a [`LocationQuery`]. An empty search is not an error.
#[derive(Debug, PartialEq, Clone)]
pub enum Resolution {
    Found(ResolvedLocation),
    NoMatch,
}

/// Read-only name to coordinate table.
///
/// Districts are loaded before community forests; on a name collision the
/// first entry wins.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    places: BTreeMap<String, Place>,
}

impl Gazetteer {
    /// Gazetteer built from the embedded district and forest tables.
    pub fn nepal() -> Result<Gazetteer> {
        let mut gazetteer = Gazetteer::default();
        gazetteer.extend(parse_places_csv(DISTRICTS_CSV, PlaceKind::District)?);
        gazetteer.extend(parse_places_csv(
            COMMUNITY_FORESTS_CSV,
            PlaceKind::CommunityForest,
        )?);
        Ok(gazetteer)
    }

    /// Add places, keeping any existing entry with the same name.
    pub fn extend(&mut self, places: Vec<Place>) {
        for place in places {
            self.places.entry(place.name.clone()).or_insert(place);
        }
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// All place names in alphabetical order.
    pub fn names(&self) -> Vec<&str> {
        self.places.keys().map(String::as_str).collect()
    }

    pub fn places(&self) -> impl Iterator<Item = &Place> {
        self.places.values()
    }

    /// Names containing `query` (case-insensitive), alphabetically sorted.
    /// An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let needle = query.to_lowercase();
        self.places
            .keys()
            .filter(|name| name.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }

    /// Exact-name lookup.
    pub fn coords(&self, name: &str) -> Option<Coordinate> {
        self.places.get(name).map(|place| place.coordinate)
    }

    /// Resolve a name search or a raw coordinate pair to a location.
    ///
    /// Name queries pick the first alphabetical match. Coordinates are
    /// passed through after checking they lie inside Nepal.
    pub fn resolve(&self, query: &LocationQuery) -> Result<Resolution> {
        match query {
            LocationQuery::Name(text) => {
                let resolution = self
                    .search(text)
                    .first()
                    .and_then(|name| {
                        self.coords(name).map(|coordinate| ResolvedLocation {
                            name: name.to_string(),
                            coordinate,
                        })
                    })
                    .map_or(Resolution::NoMatch, Resolution::Found);
                Ok(resolution)
            }
            LocationQuery::Coordinates { lat, lon } => {
                let coordinate = Coordinate::new_in_nepal(*lat, *lon)?;
                Ok(Resolution::Found(ResolvedLocation {
                    name: custom_location_name(&coordinate),
                    coordinate,
                }))
            }
        }
    }
}

/// Display name for a location entered as raw coordinates.
pub fn custom_location_name(coordinate: &Coordinate) -> String {
    format!(
        "Custom Location ({:.4}°N, {:.4}°E)",
        coordinate.lat, coordinate.lon
    )
}

/// Parse a CSV string of places into a vector of Places.
///
/// Expected CSV columns: name, latitude, longitude
pub fn parse_places_csv(csv_object: &str, kind: PlaceKind) -> Result<Vec<Place>> {
    let mut place_list: Vec<Place> = Vec::new();
    let mut rdr = ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .from_reader(csv_object.as_bytes());
    for row in rdr.records() {
        let record = row.map_err(|e| GeoError::GazetteerParse(e.to_string()))?;
        let field = |idx: usize, label: &str| {
            record
                .get(idx)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| GeoError::GazetteerParse(format!("missing {label}")))
        };
        let name = field(0, "name")?.to_string();
        let parse_degrees = |idx: usize, label: &str| -> Result<f64> {
            field(idx, label)?
                .parse::<f64>()
                .map_err(|e| GeoError::GazetteerParse(format!("{name}: bad {label}: {e}")))
        };
        let lat = parse_degrees(1, "latitude")?;
        let lon = parse_degrees(2, "longitude")?;
        place_list.push(Place {
            coordinate: Coordinate::new(lat, lon)?,
            name,
            kind,
        });
    }
    Ok(place_list)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gazetteer() -> Gazetteer {
        Gazetteer::nepal().unwrap()
    }

    #[test]
    fn test_embedded_tables() {
        let districts = parse_places_csv(DISTRICTS_CSV, PlaceKind::District).unwrap();
        let forests = parse_places_csv(COMMUNITY_FORESTS_CSV, PlaceKind::CommunityForest).unwrap();
        assert_eq!(districts.len(), 77);
        assert_eq!(forests.len(), 8);
        assert_eq!(gazetteer().len(), 85);
        assert!(districts.iter().all(|p| p.coordinate.within_nepal()));
    }

    #[test]
    fn test_names_are_sorted() {
        let g = gazetteer();
        let names = g.names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let g = gazetteer();
        assert_eq!(
            g.search("kath"),
            vec!["Kathmandu", "Shivapuri National Park Buffer (Kathmandu)"]
        );
        assert_eq!(g.search("KATHMANDU"), g.search("kathmandu"));
        assert!(g.search("zzz-no-such-place").is_empty());
        assert_eq!(g.search("").len(), g.len());
        assert!(g.search(" kath").is_empty());
    }

    #[test]
    fn test_resolve_by_name_picks_first_sorted_match() {
        let g = gazetteer();
        let resolution = g.resolve(&LocationQuery::Name("kath".into())).unwrap();
        assert_eq!(
            resolution,
            Resolution::Found(ResolvedLocation {
                name: "Kathmandu".into(),
                coordinate: Coordinate { lat: 27.7172, lon: 85.3240 },
            })
        );
    }

    #[test]
    fn test_resolve_no_match_is_not_an_error() {
        let g = gazetteer();
        let resolution = g.resolve(&LocationQuery::Name("atlantis".into())).unwrap();
        assert_eq!(resolution, Resolution::NoMatch);
    }

    #[test]
    fn test_resolve_coordinates_passes_through() {
        let g = gazetteer();
        let query = LocationQuery::Coordinates { lat: 27.5, lon: 84.25 };
        match g.resolve(&query).unwrap() {
            Resolution::Found(location) => {
                assert_eq!(location.coordinate, Coordinate { lat: 27.5, lon: 84.25 });
                assert_eq!(location.name, "Custom Location (27.5000°N, 84.2500°E)");
            }
            Resolution::NoMatch => panic!("coordinates always resolve"),
        }
        let outside = LocationQuery::Coordinates { lat: 35.0, lon: 84.0 };
        assert!(g.resolve(&outside).is_err());
    }

    #[test]
    fn test_earlier_table_wins_on_collision() {
        let mut g = Gazetteer::default();
        let place = |lat: f64, kind| Place {
            name: "Chitwan".into(),
            coordinate: Coordinate { lat, lon: 84.0 },
            kind,
        };
        g.extend(vec![place(27.5, PlaceKind::District)]);
        g.extend(vec![place(27.0, PlaceKind::CommunityForest)]);
        assert_eq!(g.len(), 1);
        assert_eq!(g.coords("Chitwan"), Some(Coordinate { lat: 27.5, lon: 84.0 }));
    }

    #[test]
    fn test_resolved_radius_round_trip() {
        use crate::coordinate::AreaOfInterest;
        let g = gazetteer();
        let coordinate = g.coords("Kathmandu").unwrap();
        let aoi = AreaOfInterest::new(coordinate, 7.0).unwrap();
        assert_eq!(aoi.radius_m(), 7000.0);
    }
}
