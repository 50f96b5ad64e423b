//! Error types for the location encoding library

use thiserror::Error;

use crate::encoding::EncodingScheme;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Latitude or longitude outside the valid range
    #[error("Invalid coordinate: lat={lat}, lon={lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    /// Precision / resolution outside the scheme's valid range
    #[error("Invalid precision {precision} for {scheme}: {reason}")]
    InvalidPrecision {
        scheme: EncodingScheme,
        precision: u8,
        reason: String,
    },

    /// Unrecognized scheme tag
    #[error("Unsupported encoding scheme: {0}")]
    UnsupportedScheme(String),

    /// Code that does not belong to the given scheme
    #[error("Invalid {scheme} code: {code}")]
    InvalidCode { scheme: EncodingScheme, code: String },

    /// Unsupported coordinate reference system
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    /// PROJ could not build or run a transformation
    #[error("Projection error: {0}")]
    Projection(String),

    /// Empty input where at least one element is required
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Token channels do not line up
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Model input has the wrong shape
    #[error("Invalid input shape: expected {expected:?}, got {actual:?}")]
    InvalidInputShape {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Token index missing from the vocabulary
    #[error("Unknown token index: {0}")]
    UnknownToken(usize),

    /// Traffic label that is not low/medium/high
    #[error("Invalid traffic label: {0}")]
    InvalidLabel(String),

    /// NaN or Inf loss during training
    #[error("Numerical divergence at epoch {epoch}: loss = {loss}")]
    NumericalDivergence { epoch: usize, loss: f32 },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Tensor data conversion failed
    #[error("Tensor data error: {0}")]
    TensorData(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    /// Errors caused by bad caller input rather than by IO or numerics
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidCoordinate { .. }
                | Error::InvalidPrecision { .. }
                | Error::UnsupportedScheme(_)
                | Error::InvalidCode { .. }
                | Error::UnsupportedCrs(_)
                | Error::EmptyInput(_)
                | Error::ShapeMismatch(_)
                | Error::InvalidInputShape { .. }
                | Error::InvalidLabel(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidCoordinate { lat: 91.0, lon: 0.0 };
        assert_eq!(err.to_string(), "Invalid coordinate: lat=91, lon=0");

        let err = Error::NumericalDivergence {
            epoch: 3,
            loss: f32::NAN,
        };
        assert!(err.to_string().contains("epoch 3"));
    }

    #[test]
    fn test_input_error_classification() {
        assert!(Error::UnsupportedScheme("s2".into()).is_input_error());
        assert!(!Error::NumericalDivergence { epoch: 0, loss: f32::INFINITY }.is_input_error());
        assert!(!Error::Projection("no grid".into()).is_input_error());
    }
}
