//! WGS84 coordinates and decoded areas

use geo::{Distance, Haversine, Point, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum absolute latitude in degrees
pub const LAT_MAX: f64 = 90.0;

/// Maximum absolute longitude in degrees
pub const LON_MAX: f64 = 180.0;

/// A latitude/longitude pair in degrees (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    /// Create a validated coordinate
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !lon.is_finite() || lat.abs() > LAT_MAX || lon.abs() > LON_MAX {
            return Err(Error::InvalidCoordinate { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Great-circle distance in meters (haversine, mean Earth radius)
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        Haversine::distance(Point::from(*self), Point::from(*other))
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        Point::new(c.lon, c.lat)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Axis-aligned lat/lon rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        coordinate.lat() >= self.south
            && coordinate.lat() <= self.north
            && coordinate.lon() >= self.west
            && coordinate.lon() <= self.east
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }

    /// Height and width in degrees
    pub fn size(&self) -> (f64, f64) {
        (self.north - self.south, self.east - self.west)
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        let (min, max) = (rect.min(), rect.max());
        Self {
            south: min.y,
            west: min.x,
            north: max.y,
            east: max.x,
        }
    }
}

/// Result of decoding a location code
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedLocation {
    /// Representative point (cell center, or the exact point for UTM)
    pub center: Coordinate,
    /// Cell extent for area-quantizing schemes that expose one
    pub bounds: Option<BoundingBox>,
}

impl DecodedLocation {
    pub fn point(center: Coordinate) -> Self {
        Self {
            center,
            bounds: None,
        }
    }

    pub fn area(center: Coordinate, bounds: BoundingBox) -> Self {
        Self {
            center,
            bounds: Some(bounds),
        }
    }
}
