//! Geohash encoding
//!
//! Thin wrapper over the `geohash` crate: base-32 strings of a recursively
//! bisected lat/lon rectangle.

use geohash::Coord;

use super::coordinate::{BoundingBox, Coordinate, DecodedLocation, LAT_MAX};
use super::EncodingScheme;
use crate::error::{Error, Result};

/// Shortest supported geohash
pub const MIN_PRECISION: u8 = 1;

/// Longest supported geohash
pub const MAX_PRECISION: u8 = 12;

const BASE32: &str = "0123456789bcdefghjkmnpqrstuvwxyz";

/// Encode a coordinate as a geohash of `precision` characters
pub fn encode(coordinate: &Coordinate, precision: u8) -> Result<String> {
    check_precision(precision)?;

    // the north edge belongs to no cell; the crate wraps it to the south pole
    let lat = if coordinate.lat() >= LAT_MAX {
        LAT_MAX - cell_height(precision) / 2.0
    } else {
        coordinate.lat()
    };

    geohash::encode(
        Coord {
            x: coordinate.lon(),
            y: lat,
        },
        precision as usize,
    )
    .map_err(|_| Error::InvalidCoordinate {
        lat: coordinate.lat(),
        lon: coordinate.lon(),
    })
}

/// Decode a geohash to its cell center and bounding box
pub fn decode(code: &str) -> Result<DecodedLocation> {
    check_code(code)?;
    let bounds = BoundingBox::from(geohash::decode_bbox(code).map_err(|_| invalid(code))?);
    let (lat, lon) = bounds.center();

    Ok(DecodedLocation::area(Coordinate::new(lat, lon)?, bounds))
}

/// The 8 cells surrounding `code`, clockwise from north
pub fn neighbors(code: &str) -> Result<[String; 8]> {
    check_code(code)?;
    let n = geohash::neighbors(code).map_err(|_| invalid(code))?;
    Ok([n.n, n.ne, n.e, n.se, n.s, n.sw, n.w, n.nw])
}

/// Latitude span of one cell; latitude gets the odd bits, `floor(5p / 2)` of them
fn cell_height(precision: u8) -> f64 {
    let lat_bits = (5 * precision as i32) / 2;
    2.0 * LAT_MAX / 2f64.powi(lat_bits)
}

fn check_code(code: &str) -> Result<()> {
    if code.is_empty()
        || code.len() > MAX_PRECISION as usize
        || !code.chars().all(|c| BASE32.contains(c))
    {
        return Err(invalid(code));
    }
    Ok(())
}

fn check_precision(precision: u8) -> Result<()> {
    if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
        return Err(Error::InvalidPrecision {
            scheme: EncodingScheme::Geohash,
            precision,
            reason: format!("expected {}..={} characters", MIN_PRECISION, MAX_PRECISION),
        });
    }
    Ok(())
}

fn invalid(code: &str) -> Error {
    Error::InvalidCode {
        scheme: EncodingScheme::Geohash,
        code: code.to_string(),
    }
}
