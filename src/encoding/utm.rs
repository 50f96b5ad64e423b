//! Universal Transverse Mercator projection (WGS84)
//!
//! Zone and latitude band selection, including the Norway and Svalbard zone
//! exceptions. The projection itself goes through PROJ as EPSG:326zz/327zz.

use serde::{Deserialize, Serialize};

use super::coordinate::Coordinate;
use super::reproject::{transform, Crs};
use super::EncodingScheme;
use crate::error::{Error, Result};

const ZONE_LETTERS: &[u8] = b"CDEFGHJKLMNPQRSTUVWXX";

/// Lowest UTM zone number
pub const MIN_ZONE: u8 = 1;
/// Highest UTM zone number
pub const MAX_ZONE: u8 = 60;

/// Southern limit of the UTM grid
pub const MIN_LATITUDE: f64 = -80.0;
/// Northern limit of the UTM grid
pub const MAX_LATITUDE: f64 = 84.0;

/// A position on the UTM grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtmCoordinate {
    pub easting: f64,
    pub northing: f64,
    pub zone_number: u8,
    pub zone_letter: char,
}

impl UtmCoordinate {
    /// Grid zone designator, e.g. "18T"
    pub fn zone(&self) -> String {
        format!("{}{}", self.zone_number, self.zone_letter)
    }

    pub fn is_northern(&self) -> bool {
        self.zone_letter >= 'N'
    }
}

impl std::fmt::Display for UtmCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{} {:.0} {:.0}",
            self.zone_number, self.zone_letter, self.easting, self.northing
        )
    }
}

/// Project a coordinate into its own UTM zone
pub fn from_latlon(coordinate: &Coordinate) -> Result<UtmCoordinate> {
    check_latitude(coordinate)?;
    let zone_number = zone_number(coordinate.lat(), coordinate.lon());
    from_latlon_in_zone(coordinate, zone_number)
}

/// Project a coordinate into a fixed zone (used by reprojection between EPSG codes)
pub fn from_latlon_in_zone(coordinate: &Coordinate, zone_number: u8) -> Result<UtmCoordinate> {
    check_latitude(coordinate)?;
    if !is_valid_zone(zone_number) {
        return Err(Error::UnsupportedCrs(format!("UTM zone {}", zone_number)));
    }
    let zone_letter = zone_letter(coordinate.lat()).ok_or(Error::InvalidCoordinate {
        lat: coordinate.lat(),
        lon: coordinate.lon(),
    })?;

    let crs = Crs::Utm {
        zone: zone_number,
        north: coordinate.lat() >= 0.0,
    };
    let (easting, northing) = transform(Crs::Wgs84, crs, coordinate.lon(), coordinate.lat())?;

    Ok(UtmCoordinate {
        easting,
        northing,
        zone_number,
        zone_letter,
    })
}

/// Inverse projection back to latitude/longitude
pub fn to_latlon(utm: &UtmCoordinate) -> Result<Coordinate> {
    let letter = utm.zone_letter.to_ascii_uppercase();
    if !is_valid_zone(utm.zone_number) || !ZONE_LETTERS.contains(&(letter as u8)) {
        return Err(Error::InvalidCode {
            scheme: EncodingScheme::Utm,
            code: utm.to_string(),
        });
    }

    let crs = Crs::Utm {
        zone: utm.zone_number,
        north: letter >= 'N',
    };
    let (lon, lat) = transform(crs, Crs::Wgs84, utm.easting, utm.northing)?;
    Coordinate::new(lat, lon)
}

/// UTM zone number for a coordinate, honoring the Norway/Svalbard exceptions
pub fn zone_number(lat: f64, lon: f64) -> u8 {
    // 180° belongs to zone 1
    let lon = if lon >= 180.0 { lon - 360.0 } else { lon };

    if (56.0..64.0).contains(&lat) && (3.0..12.0).contains(&lon) {
        return 32;
    }
    if (72.0..=84.0).contains(&lat) && lon >= 0.0 {
        if lon < 9.0 {
            return 31;
        } else if lon < 21.0 {
            return 33;
        } else if lon < 33.0 {
            return 35;
        } else if lon < 42.0 {
            return 37;
        }
    }

    (((lon + 180.0) / 6.0).floor() as u8 + 1).min(60)
}

/// Latitude band letter, `None` outside [-80, 84]
pub fn zone_letter(lat: f64) -> Option<char> {
    if (MIN_LATITUDE..=MAX_LATITUDE).contains(&lat) {
        let idx = ((lat + 80.0) as usize) >> 3;
        ZONE_LETTERS.get(idx).map(|&b| b as char)
    } else {
        None
    }
}

fn check_latitude(coordinate: &Coordinate) -> Result<()> {
    if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&coordinate.lat()) {
        return Err(Error::InvalidCoordinate {
            lat: coordinate.lat(),
            lon: coordinate.lon(),
        });
    }
    Ok(())
}

/// Whether `zone_number` names one of the 60 zones
pub fn is_valid_zone(zone_number: u8) -> bool {
    (MIN_ZONE..=MAX_ZONE).contains(&zone_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_nyc_projection() {
        let nyc = Coordinate::new(40.7128, -74.0060).unwrap();
        let utm = from_latlon(&nyc).unwrap();

        assert_eq!(utm.zone_number, 18);
        assert_eq!(utm.zone_letter, 'T');
        assert_eq!(utm.zone(), "18T");
        assert_abs_diff_eq!(utm.easting, 583959.37, epsilon = 0.5);
        assert_abs_diff_eq!(utm.northing, 4507350.99, epsilon = 0.5);
    }

    #[test]
    fn test_round_trip() {
        for (lat, lon) in [
            (40.7128, -74.0060),
            (-33.8688, 151.2093),
            (51.5074, -0.1278),
            (0.0, 0.0),
            (-79.5, 179.9),
        ] {
            let original = Coordinate::new(lat, lon).unwrap();
            let back = to_latlon(&from_latlon(&original).unwrap()).unwrap();
            assert_abs_diff_eq!(back.lat(), lat, epsilon = 1e-4);
            assert_abs_diff_eq!(back.lon(), lon, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_southern_hemisphere_false_northing() {
        let sydney = Coordinate::new(-33.8688, 151.2093).unwrap();
        let utm = from_latlon(&sydney).unwrap();
        assert_eq!(utm.zone_number, 56);
        assert_eq!(utm.zone_letter, 'H');
        assert!(!utm.is_northern());
        assert!(utm.northing > 6_000_000.0 && utm.northing < 10_000_000.0);
    }

    #[test]
    fn test_zone_exceptions() {
        assert_eq!(zone_number(60.0, 5.0), 32); // south-western Norway
        assert_eq!(zone_number(78.0, 15.0), 33); // Svalbard
        assert_eq!(zone_number(40.0, 180.0), 1);
        assert_eq!(zone_number(40.0, -180.0), 1);
    }

    #[test]
    fn test_out_of_grid() {
        let pole = Coordinate::new(85.0, 0.0).unwrap();
        assert!(matches!(from_latlon(&pole), Err(Error::InvalidCoordinate { .. })));
        assert_eq!(zone_letter(-81.0), None);
        assert_eq!(zone_letter(84.0), Some('X'));
    }

    #[test]
    fn test_bad_zone() {
        let bad = UtmCoordinate {
            easting: 500_000.0,
            northing: 4_500_000.0,
            zone_number: 0,
            zone_letter: 'T',
        };
        assert!(matches!(to_latlon(&bad), Err(Error::InvalidCode { .. })));
        assert!(matches!(
            to_latlon(&UtmCoordinate { zone_number: 61, ..bad }),
            Err(Error::InvalidCode { .. })
        ));
        assert!(matches!(
            to_latlon(&UtmCoordinate { zone_number: 18, zone_letter: 'I', ..bad }),
            Err(Error::InvalidCode { .. })
        ));

        let nyc = Coordinate::new(40.7128, -74.0060).unwrap();
        assert!(matches!(from_latlon_in_zone(&nyc, 61), Err(Error::UnsupportedCrs(_))));
    }

    #[test]
    fn test_neighbor_zone_projection() {
        // NYC forced into zone 19 still round-trips
        let nyc = Coordinate::new(40.7128, -74.0060).unwrap();
        let utm = from_latlon_in_zone(&nyc, 19).unwrap();
        assert!(utm.easting < 500_000.0);
        let back = to_latlon(&utm).unwrap();
        assert_abs_diff_eq!(back.lat(), 40.7128, epsilon = 1e-6);
        assert_abs_diff_eq!(back.lon(), -74.0060, epsilon = 1e-6);
    }

    #[test]
    fn test_display() {
        let nyc = Coordinate::new(40.7128, -74.0060).unwrap();
        let utm = from_latlon(&nyc).unwrap();
        assert_eq!(utm.to_string(), "18T 583959 4507351");
    }
}
