//! Open Location Code (Plus Code) encoding
//!
//! Thin wrapper over the `open-location-code` crate. Full codes only: 10 pair
//! digits on a base-20 grid, then up to 5 grid digits.

use super::coordinate::{BoundingBox, Coordinate, DecodedLocation, LAT_MAX};
use super::EncodingScheme;
use crate::error::{Error, Result};

const PAIR_CODE_LENGTH: u8 = 10;
const ENCODING_BASE: f64 = 20.0;
const GRID_ROWS: f64 = 5.0;

/// Minimum code length
pub const MIN_DIGIT_COUNT: u8 = 2;
/// Maximum number of significant digits
pub const MAX_DIGIT_COUNT: u8 = 15;
/// Length used when no precision is configured (~14 m cells)
pub const DEFAULT_CODE_LENGTH: u8 = 10;

/// Check that `code_length` is a length a full code can have
pub fn check_code_length(code_length: u8) -> Result<()> {
    if !(MIN_DIGIT_COUNT..=MAX_DIGIT_COUNT).contains(&code_length)
        || (code_length < PAIR_CODE_LENGTH && code_length % 2 == 1)
    {
        return Err(Error::InvalidPrecision {
            scheme: EncodingScheme::PlusCode,
            precision: code_length,
            reason: "expected 2, 4, 6, 8 or 10..=15 digits".to_string(),
        });
    }
    Ok(())
}

/// Encode a coordinate as a full plus code with `code_length` significant digits
pub fn encode(coordinate: &Coordinate, code_length: u8) -> Result<String> {
    check_code_length(code_length)?;

    // the north edge belongs to the top row of cells
    let lat = if coordinate.lat() >= LAT_MAX {
        LAT_MAX - cell_height(code_length) / 2.0
    } else {
        coordinate.lat()
    };

    Ok(open_location_code::encode(
        (coordinate.lon(), lat).into(),
        code_length as usize,
    ))
}

/// Decode a full plus code to its center and code area
pub fn decode(code: &str) -> Result<DecodedLocation> {
    if !is_full(code) {
        return Err(invalid(code));
    }
    let area =
        open_location_code::decode(&code.to_ascii_uppercase()).map_err(|_| invalid(code))?;

    let bounds = BoundingBox {
        south: area.south,
        west: area.west,
        north: area.north,
        east: area.east,
    };
    let (lat, lon) = bounds.center();

    Ok(DecodedLocation::area(Coordinate::new(lat, lon)?, bounds))
}

/// Whether `code` is a syntactically valid plus code (full or short)
pub fn is_valid(code: &str) -> bool {
    code.is_ascii() && open_location_code::is_valid(&code.to_ascii_uppercase())
}

/// Whether `code` is a valid full (globally unambiguous) plus code
pub fn is_full(code: &str) -> bool {
    code.is_ascii() && open_location_code::is_full(&code.to_ascii_uppercase())
}

/// Height of a code area in degrees
fn cell_height(code_length: u8) -> f64 {
    if code_length <= PAIR_CODE_LENGTH {
        ENCODING_BASE.powi(2 - code_length as i32 / 2)
    } else {
        ENCODING_BASE.powi(-3) / GRID_ROWS.powi((code_length - PAIR_CODE_LENGTH) as i32)
    }
}

fn invalid(code: &str) -> Error {
    Error::InvalidCode {
        scheme: EncodingScheme::PlusCode,
        code: code.to_string(),
    }
}
