//! Coordinate reprojection between a small set of EPSG reference systems
//!
//! Supported: EPSG:4326 (WGS84 degrees), EPSG:3857 (Web Mercator meters) and
//! the WGS84 UTM zones EPSG:32601..32660 (north) / EPSG:32701..32760 (south).
//! Every transform pivots through WGS84 and runs on PROJ.

use std::cell::RefCell;
use std::collections::hash_map::{Entry, HashMap};
use std::str::FromStr;

use proj::Proj;
use serde::{Deserialize, Serialize};

use super::coordinate::Coordinate;
use crate::error::{Error, Result};

/// Latitude limit of the square Web Mercator world
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_78;

/// Coordinate reference system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// EPSG:4326, x = longitude, y = latitude
    Wgs84,
    /// EPSG:3857
    WebMercator,
    /// EPSG:326zz / EPSG:327zz
    Utm { zone: u8, north: bool },
}

impl Crs {
    /// Look up a CRS by EPSG code
    pub fn from_epsg(code: u32) -> Result<Self> {
        match code {
            4326 => Ok(Crs::Wgs84),
            3857 | 900913 => Ok(Crs::WebMercator),
            32601..=32660 => Ok(Crs::Utm {
                zone: (code - 32600) as u8,
                north: true,
            }),
            32701..=32760 => Ok(Crs::Utm {
                zone: (code - 32700) as u8,
                north: false,
            }),
            _ => Err(Error::UnsupportedCrs(format!("EPSG:{}", code))),
        }
    }

    pub fn epsg(&self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::WebMercator => 3857,
            Crs::Utm { zone, north: true } => 32600 + *zone as u32,
            Crs::Utm { zone, north: false } => 32700 + *zone as u32,
        }
    }
}

impl FromStr for Crs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("EPSG:")
            .or_else(|| trimmed.strip_prefix("epsg:"))
            .unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .map_err(|_| Error::UnsupportedCrs(s.to_string()))
            .and_then(Crs::from_epsg)
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Transform `(x, y)` from `src` to `dst`
///
/// Geographic systems take x = longitude and y = latitude, projected systems
/// take x = easting and y = northing.
pub fn transform(src: Crs, dst: Crs, x: f64, y: f64) -> Result<(f64, f64)> {
    if src == dst {
        return Ok((x, y));
    }
    let geographic = to_wgs84(src, x, y)?;
    from_wgs84(dst, &geographic)
}

fn to_wgs84(src: Crs, x: f64, y: f64) -> Result<Coordinate> {
    let (lon, lat) = match src {
        Crs::Wgs84 => (x, y),
        _ => convert(src, Crs::Wgs84, x, y)?,
    };
    Coordinate::new(lat, lon)
}

fn from_wgs84(dst: Crs, coordinate: &Coordinate) -> Result<(f64, f64)> {
    match dst {
        Crs::Wgs84 => Ok((coordinate.lon(), coordinate.lat())),
        Crs::WebMercator if coordinate.lat().abs() > WEB_MERCATOR_MAX_LAT => {
            Err(Error::InvalidCoordinate {
                lat: coordinate.lat(),
                lon: coordinate.lon(),
            })
        }
        _ => convert(Crs::Wgs84, dst, coordinate.lon(), coordinate.lat()),
    }
}

thread_local! {
    // one PROJ transformation per CRS pair and thread
    static TRANSFORMS: RefCell<HashMap<(Crs, Crs), Proj>> = RefCell::new(HashMap::new());
}

fn convert(src: Crs, dst: Crs, x: f64, y: f64) -> Result<(f64, f64)> {
    TRANSFORMS.with(|cache| {
        let mut cache = cache.borrow_mut();
        let proj = match cache.entry((src, dst)) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let proj = Proj::new_known_crs(&src.to_string(), &dst.to_string(), None)
                    .map_err(|e| Error::Projection(format!("{} -> {}: {}", src, dst, e)))?;
                entry.insert(proj)
            }
        };

        let (tx, ty): (f64, f64) = proj
            .convert((x, y))
            .map_err(|e| Error::Projection(format!("{} -> {}: {}", src, dst, e)))?;
        if !tx.is_finite() || !ty.is_finite() {
            return Err(Error::Projection(format!(
                "{} -> {}: ({}, {}) has no finite image",
                src, dst, x, y
            )));
        }
        Ok((tx, ty))
    })
}
