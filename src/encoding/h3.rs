//! H3 hexagonal grid encoding via `h3o`

use h3o::{CellIndex, LatLng, Resolution};

use super::coordinate::{Coordinate, DecodedLocation};
use super::EncodingScheme;
use crate::error::{Error, Result};

pub const MIN_RESOLUTION: u8 = 0;
pub const MAX_RESOLUTION: u8 = 15;

/// Encode a coordinate as the hexadecimal id of its H3 cell
pub fn encode(coordinate: &Coordinate, resolution: u8) -> Result<String> {
    let resolution = to_resolution(resolution)?;
    let latlng = LatLng::new(coordinate.lat(), coordinate.lon()).map_err(|_| {
        Error::InvalidCoordinate {
            lat: coordinate.lat(),
            lon: coordinate.lon(),
        }
    })?;
    Ok(latlng.to_cell(resolution).to_string())
}

/// Decode a cell id to its center point
pub fn decode(code: &str) -> Result<DecodedLocation> {
    let cell = parse_cell(code)?;
    let center = LatLng::from(cell);
    Ok(DecodedLocation::point(Coordinate::new(center.lat(), center.lng())?))
}

/// Resolution encoded in a cell id
pub fn resolution_of(code: &str) -> Result<u8> {
    Ok(u8::from(parse_cell(code)?.resolution()))
}

/// Ancestor of `code` at the coarser `resolution`
pub fn parent(code: &str, resolution: u8) -> Result<String> {
    let cell = parse_cell(code)?;
    let target = to_resolution(resolution)?;
    cell.parent(target)
        .map(|p| p.to_string())
        .ok_or_else(|| Error::InvalidPrecision {
            scheme: EncodingScheme::H3,
            precision: resolution,
            reason: format!(
                "parent resolution must not exceed the cell resolution {}",
                u8::from(cell.resolution())
            ),
        })
}

fn to_resolution(resolution: u8) -> Result<Resolution> {
    Resolution::try_from(resolution).map_err(|_| Error::InvalidPrecision {
        scheme: EncodingScheme::H3,
        precision: resolution,
        reason: format!("expected resolution {}..={}", MIN_RESOLUTION, MAX_RESOLUTION),
    })
}

fn parse_cell(code: &str) -> Result<CellIndex> {
    code.parse::<CellIndex>().map_err(|_| Error::InvalidCode {
        scheme: EncodingScheme::H3,
        code: code.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_hex_cell() {
        let nyc = Coordinate::new(40.7128, -74.0060).unwrap();
        let cell = encode(&nyc, 9).unwrap();

        assert_eq!(cell.len(), 15);
        assert!(cell.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(resolution_of(&cell).unwrap(), 9);
    }

    #[test]
    fn test_round_trip_within_cell() {
        let nyc = Coordinate::new(40.7128, -74.0060).unwrap();
        let decoded = decode(&encode(&nyc, 9).unwrap()).unwrap();

        // resolution 9 cells have an edge of roughly 200 m
        assert!(nyc.distance_to(&decoded.center) < 250.0);
    }

    #[test]
    fn test_resolution_range() {
        let nyc = Coordinate::new(40.7128, -74.0060).unwrap();
        assert!(encode(&nyc, 0).is_ok());
        assert!(encode(&nyc, 15).is_ok());
        assert!(matches!(encode(&nyc, 16), Err(Error::InvalidPrecision { .. })));
    }

    #[test]
    fn test_parent() {
        let nyc = Coordinate::new(40.7128, -74.0060).unwrap();
        let fine = encode(&nyc, 9).unwrap();
        let coarse = encode(&nyc, 5).unwrap();

        assert_eq!(parent(&fine, 5).unwrap(), coarse);
        assert!(parent(&coarse, 9).is_err());
    }

    #[test]
    fn test_invalid_code() {
        assert!(matches!(decode("not-a-cell"), Err(Error::InvalidCode { .. })));
    }
}
