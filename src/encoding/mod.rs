//! Coordinate encoders
//!
//! Every scheme is reached through a single [`EncodingScheme`] tag and a static
//! table of codecs, so callers never pick a library function by hand:
//!
//! - `geohash`: base-32 rectangle bisection
//! - `h3`: hexagonal hierarchical cells
//! - `plus_code`: Open Location Code
//! - `utm`: Universal Transverse Mercator
//! - `reproject`: EPSG-to-EPSG coordinate transforms

mod coordinate;
pub mod geohash;
pub mod h3;
pub mod plus_code;
pub mod reproject;
pub mod utm;

use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use coordinate::{BoundingBox, Coordinate, DecodedLocation};
pub use reproject::{transform, Crs};
pub use utm::UtmCoordinate;

use crate::error::{Error, Result};

/// Supported location encoding schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingScheme {
    Geohash,
    H3,
    PlusCode,
    Utm,
}

impl EncodingScheme {
    pub const ALL: [EncodingScheme; 4] = [
        EncodingScheme::Geohash,
        EncodingScheme::H3,
        EncodingScheme::PlusCode,
        EncodingScheme::Utm,
    ];

    /// Stable lowercase tag, also used to namespace tokens
    pub fn tag(&self) -> &'static str {
        match self {
            EncodingScheme::Geohash => "geohash",
            EncodingScheme::H3 => "h3",
            EncodingScheme::PlusCode => "plus_code",
            EncodingScheme::Utm => "utm",
        }
    }

    /// Codec registered for this scheme
    pub fn codec(&self) -> &'static SchemeCodec {
        &CODECS[*self as usize]
    }

    pub fn precision_range(&self) -> RangeInclusive<u8> {
        self.codec().precision_range.clone()
    }

    pub fn default_precision(&self) -> u8 {
        self.codec().default_precision
    }
}

impl FromStr for EncodingScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "geohash" => Ok(EncodingScheme::Geohash),
            "h3" => Ok(EncodingScheme::H3),
            "plus_code" | "pluscode" | "plus-code" | "olc" => Ok(EncodingScheme::PlusCode),
            "utm" => Ok(EncodingScheme::Utm),
            _ => Err(Error::UnsupportedScheme(s.to_string())),
        }
    }
}

impl std::fmt::Display for EncodingScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// The code produced by an encoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocationCode {
    Text(String),
    Utm(UtmCoordinate),
}

impl LocationCode {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            LocationCode::Text(s) => Some(s),
            LocationCode::Utm(_) => None,
        }
    }
}

impl std::fmt::Display for LocationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationCode::Text(s) => f.write_str(s),
            LocationCode::Utm(u) => write!(f, "{}", u),
        }
    }
}

/// A coordinate encoded under one scheme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedLocation {
    pub scheme: EncodingScheme,
    pub code: LocationCode,
    pub precision: u8,
}

impl EncodedLocation {
    /// String form fed to the tokenizer
    pub fn token(&self) -> String {
        self.code.to_string()
    }

    /// Token prefixed with the scheme tag, e.g. `geohash:dr5regw`
    pub fn namespaced_token(&self) -> String {
        format!("{}:{}", self.scheme.tag(), self.code)
    }

    pub fn decode(&self) -> Result<DecodedLocation> {
        (self.scheme.codec().decode)(&self.code)
    }
}

type EncodeFn = fn(&Coordinate, u8) -> Result<LocationCode>;
type DecodeFn = fn(&LocationCode) -> Result<DecodedLocation>;

/// Encode/decode pair plus the precision contract of one scheme
pub struct SchemeCodec {
    pub scheme: EncodingScheme,
    pub encode: EncodeFn,
    pub decode: DecodeFn,
    pub precision_range: RangeInclusive<u8>,
    pub default_precision: u8,
}

/// Indexed by `EncodingScheme as usize`
static CODECS: [SchemeCodec; 4] = [
    SchemeCodec {
        scheme: EncodingScheme::Geohash,
        encode: |c, p| geohash::encode(c, p).map(LocationCode::Text),
        decode: |code| text_code(EncodingScheme::Geohash, code).and_then(geohash::decode),
        precision_range: geohash::MIN_PRECISION..=geohash::MAX_PRECISION,
        default_precision: 7,
    },
    SchemeCodec {
        scheme: EncodingScheme::H3,
        encode: |c, p| h3::encode(c, p).map(LocationCode::Text),
        decode: |code| text_code(EncodingScheme::H3, code).and_then(h3::decode),
        precision_range: h3::MIN_RESOLUTION..=h3::MAX_RESOLUTION,
        default_precision: 9,
    },
    SchemeCodec {
        scheme: EncodingScheme::PlusCode,
        encode: |c, p| plus_code::encode(c, p).map(LocationCode::Text),
        decode: |code| text_code(EncodingScheme::PlusCode, code).and_then(plus_code::decode),
        precision_range: plus_code::MIN_DIGIT_COUNT..=plus_code::MAX_DIGIT_COUNT,
        default_precision: plus_code::DEFAULT_CODE_LENGTH,
    },
    SchemeCodec {
        scheme: EncodingScheme::Utm,
        encode: |c, _| utm::from_latlon(c).map(LocationCode::Utm),
        decode: |code| match code {
            LocationCode::Utm(u) => utm::to_latlon(u).map(DecodedLocation::point),
            LocationCode::Text(s) => parse_utm(s)
                .and_then(|u| utm::to_latlon(&u))
                .map(DecodedLocation::point),
        },
        precision_range: 0..=0,
        default_precision: 0,
    },
];

fn text_code(scheme: EncodingScheme, code: &LocationCode) -> Result<&str> {
    code.as_text().ok_or_else(|| Error::InvalidCode {
        scheme,
        code: code.to_string(),
    })
}

/// Parse the `"18T 583959 4507351"` form produced by `UtmCoordinate`'s Display
fn parse_utm(text: &str) -> Result<UtmCoordinate> {
    let invalid = || Error::InvalidCode {
        scheme: EncodingScheme::Utm,
        code: text.to_string(),
    };

    let mut parts = text.split_whitespace();
    let zone = parts.next().ok_or_else(invalid)?;
    let easting = parts.next().and_then(|s| s.parse::<f64>().ok()).ok_or_else(invalid)?;
    let northing = parts.next().and_then(|s| s.parse::<f64>().ok()).ok_or_else(invalid)?;
    if parts.next().is_some() || zone.len() < 2 || !zone.is_ascii() {
        return Err(invalid());
    }

    let (number, letter) = zone.split_at(zone.len() - 1);
    let zone_number: u8 = number.parse().map_err(|_| invalid())?;
    if !utm::is_valid_zone(zone_number) {
        return Err(invalid());
    }
    Ok(UtmCoordinate {
        easting,
        northing,
        zone_number,
        zone_letter: letter.chars().next().ok_or_else(invalid)?.to_ascii_uppercase(),
    })
}

/// A scheme bound to a precision that has already been validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemeSpec {
    scheme: EncodingScheme,
    precision: u8,
}

impl SchemeSpec {
    pub fn new(scheme: EncodingScheme, precision: u8) -> Result<Self> {
        let codec = scheme.codec();
        if !codec.precision_range.contains(&precision) {
            return Err(Error::InvalidPrecision {
                scheme,
                precision,
                reason: format!(
                    "expected {}..={}",
                    codec.precision_range.start(),
                    codec.precision_range.end()
                ),
            });
        }
        if scheme == EncodingScheme::PlusCode {
            plus_code::check_code_length(precision)?;
        }
        Ok(Self { scheme, precision })
    }

    /// Scheme at its default precision
    pub fn with_default(scheme: EncodingScheme) -> Self {
        Self {
            scheme,
            precision: scheme.default_precision(),
        }
    }

    /// Parse `"geohash:7"` or `"utm"` (default precision)
    pub fn parse(text: &str) -> Result<Self> {
        match text.split_once(':') {
            Some((tag, precision)) => {
                let scheme: EncodingScheme = tag.parse()?;
                let precision = precision.trim().parse::<u8>().map_err(|_| {
                    Error::InvalidPrecision {
                        scheme,
                        precision: u8::MAX,
                        reason: format!("not a number: {}", precision),
                    }
                })?;
                Self::new(scheme, precision)
            }
            None => Ok(Self::with_default(text.parse()?)),
        }
    }

    pub fn scheme(&self) -> EncodingScheme {
        self.scheme
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn encode(&self, coordinate: &Coordinate) -> Result<EncodedLocation> {
        let code = (self.scheme.codec().encode)(coordinate, self.precision)?;
        Ok(EncodedLocation {
            scheme: self.scheme,
            code,
            precision: self.precision,
        })
    }
}

/// Encode one coordinate under one scheme
pub fn encode(coordinate: &Coordinate, scheme: EncodingScheme, precision: u8) -> Result<EncodedLocation> {
    SchemeSpec::new(scheme, precision)?.encode(coordinate)
}

/// Decode a code of the given scheme
pub fn decode(code: &str, scheme: EncodingScheme) -> Result<DecodedLocation> {
    (scheme.codec().decode)(&LocationCode::Text(code.trim().to_string()))
}

/// Encode one coordinate under every configured channel, in order
pub fn encode_all(coordinate: &Coordinate, specs: &[SchemeSpec]) -> Result<Vec<EncodedLocation>> {
    specs.iter().map(|spec| spec.encode(coordinate)).collect()
}
