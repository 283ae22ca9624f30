use crate::error::{GeoError, Result};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Latitude bounds of the Nepal bounding box (degrees).
pub const NEPAL_LAT_RANGE: (f64, f64) = (26.0, 31.0);

/// Longitude bounds of the Nepal bounding box (degrees).
pub const NEPAL_LON_RANGE: (f64, f64) = (80.0, 89.0);

/// Geographic center of Nepal, the default analysis location.
pub const NEPAL_CENTER: Coordinate = Coordinate {
    lat: 28.3949,
    lon: 84.1240,
};

/// Default map zoom level for a country-wide view.
pub const NEPAL_ZOOM: u8 = 7;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting values outside the valid global range.
    pub fn new(lat: f64, lon: f64) -> Result<Coordinate> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        if !valid {
            return Err(GeoError::InvalidCoordinate { lat, lon });
        }
        Ok(Coordinate { lat, lon })
    }

    /// Build a coordinate that must also fall inside the Nepal bounding box.
    pub fn new_in_nepal(lat: f64, lon: f64) -> Result<Coordinate> {
        let coordinate = Coordinate::new(lat, lon)?;
        if !coordinate.within_nepal() {
            return Err(GeoError::OutsideNepal { lat, lon });
        }
        Ok(coordinate)
    }

    pub fn within_nepal(&self) -> bool {
        (NEPAL_LAT_RANGE.0..=NEPAL_LAT_RANGE.1).contains(&self.lat)
            && (NEPAL_LON_RANGE.0..=NEPAL_LON_RANGE.1).contains(&self.lon)
    }

    /// Haversine distance to another coordinate, in meters.
    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (other.lon - self.lon).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}

/// A circular area of interest around a center point.
///
/// The radius is kept in kilometers; backends receive meters through
/// [`AreaOfInterest::radius_m`].
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct AreaOfInterest {
    pub center: Coordinate,
    pub radius_km: f64,
}

impl AreaOfInterest {
    pub fn new(center: Coordinate, radius_km: f64) -> Result<AreaOfInterest> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(GeoError::InvalidRadius(radius_km));
        }
        Ok(AreaOfInterest { center, radius_km })
    }

    /// Radius in meters, the unit the geospatial backend buffers with.
    pub fn radius_m(&self) -> f64 {
        self.radius_km * 1000.0
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        self.center.distance_m(point) <= self.radius_m()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_range_validation() {
        assert!(Coordinate::new(27.7172, 85.3240).is_ok());
        assert!(Coordinate::new(91.0, 85.0).is_err());
        assert!(Coordinate::new(27.0, -181.0).is_err());
        assert!(Coordinate::new(f64::NAN, 85.0).is_err());
    }

    #[test]
    fn test_nepal_bounding_box() {
        assert!(NEPAL_CENTER.within_nepal());
        assert!(Coordinate::new_in_nepal(27.7172, 85.3240).is_ok());
        assert_eq!(
            Coordinate::new_in_nepal(40.0, 85.0),
            Err(GeoError::OutsideNepal { lat: 40.0, lon: 85.0 })
        );
    }

    #[test]
    fn test_radius_converts_to_meters() {
        let center = Coordinate::new(27.7172, 85.3240).unwrap();
        for radius in [1.0, 5.0, 12.5, 20.0] {
            let aoi = AreaOfInterest::new(center, radius).unwrap();
            assert_eq!(aoi.radius_km, radius);
            assert_eq!(aoi.radius_m(), radius * 1000.0);
        }
    }

    #[test]
    fn test_radius_must_be_positive() {
        assert_eq!(
            AreaOfInterest::new(NEPAL_CENTER, 0.0),
            Err(GeoError::InvalidRadius(0.0))
        );
        assert!(AreaOfInterest::new(NEPAL_CENTER, -3.0).is_err());
    }

    #[test]
    fn test_disk_containment() {
        let aoi = AreaOfInterest::new(NEPAL_CENTER, 5.0).unwrap();
        // 0.01 degrees of latitude is roughly 1.1 km
        let near = Coordinate::new(NEPAL_CENTER.lat + 0.01, NEPAL_CENTER.lon).unwrap();
        let far = Coordinate::new(NEPAL_CENTER.lat + 0.1, NEPAL_CENTER.lon).unwrap();
        assert!(aoi.contains(&NEPAL_CENTER));
        assert!(aoi.contains(&near));
        assert!(!aoi.contains(&far));
    }
}
