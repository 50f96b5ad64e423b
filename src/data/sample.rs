//! Labeled locations and where they come from

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::encoding::{Coordinate, EncodedLocation};
use crate::error::{Error, Result};

/// Toy traffic density class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLabel {
    Low = 0,
    Medium = 1,
    High = 2,
}

impl TrafficLabel {
    pub const NUM_CLASSES: usize = 3;

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Result<Self> {
        match index {
            0 => Ok(TrafficLabel::Low),
            1 => Ok(TrafficLabel::Medium),
            2 => Ok(TrafficLabel::High),
            _ => Err(Error::InvalidLabel(index.to_string())),
        }
    }
}

impl FromStr for TrafficLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "0" => Ok(TrafficLabel::Low),
            "medium" | "1" => Ok(TrafficLabel::Medium),
            "high" | "2" => Ok(TrafficLabel::High),
            _ => Err(Error::InvalidLabel(s.to_string())),
        }
    }
}

impl std::fmt::Display for TrafficLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TrafficLabel::Low => "low",
            TrafficLabel::Medium => "medium",
            TrafficLabel::High => "high",
        };
        f.write_str(name)
    }
}

/// A named coordinate with its label, before encoding
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledLocation {
    pub name: String,
    pub coordinate: Coordinate,
    pub label: TrafficLabel,
}

impl LabeledLocation {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64, label: TrafficLabel) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            coordinate: Coordinate::new(lat, lon)?,
            label,
        })
    }
}

/// A labeled location with one encoding per channel
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSample {
    pub name: String,
    pub coordinate: Coordinate,
    pub encodings: Vec<EncodedLocation>,
    pub label: TrafficLabel,
}

/// Provider of labeled locations
pub trait SampleSource {
    fn load(&self) -> Result<Vec<LabeledLocation>>;

    /// Human-readable origin, used in logs
    fn describe(&self) -> String;
}

/// The five built-in US cities
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoSource;

impl DemoSource {
    const CITIES: [(&'static str, f64, f64, TrafficLabel); 5] = [
        ("New York", 40.7128, -74.0060, TrafficLabel::High),
        ("Los Angeles", 34.0522, -118.2437, TrafficLabel::Medium),
        ("Chicago", 41.8781, -87.6298, TrafficLabel::Medium),
        ("San Francisco", 37.7749, -122.4194, TrafficLabel::High),
        ("Phoenix", 33.4484, -112.0740, TrafficLabel::Low),
    ];
}

impl SampleSource for DemoSource {
    fn load(&self) -> Result<Vec<LabeledLocation>> {
        Self::CITIES
            .iter()
            .map(|&(name, lat, lon, label)| LabeledLocation::new(name, lat, lon, label))
            .collect()
    }

    fn describe(&self) -> String {
        "built-in demo cities".to_string()
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    name: String,
    lat: f64,
    lon: f64,
    label: String,
}

/// Locations read from a `name,lat,lon,label` CSV file
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SampleSource for CsvSource {
    fn load(&self) -> Result<Vec<LabeledLocation>> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut locations = Vec::new();

        for row in reader.deserialize() {
            let row: CsvRow = row?;
            let label = row.label.parse()?;
            locations.push(LabeledLocation::new(row.name, row.lat, row.lon, label)?);
        }

        info!("Loaded {} locations from {}", locations.len(), self.path.display());
        Ok(locations)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_demo_labels() {
        let locations = DemoSource.load().unwrap();
        let labels: Vec<usize> = locations.iter().map(|l| l.label.index()).collect();

        assert_eq!(locations.len(), 5);
        assert_eq!(labels, vec![2, 1, 1, 2, 0]);
        assert_eq!(locations[0].name, "New York");
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!("High".parse::<TrafficLabel>().unwrap(), TrafficLabel::High);
        assert_eq!("0".parse::<TrafficLabel>().unwrap(), TrafficLabel::Low);
        assert!(matches!("jammed".parse::<TrafficLabel>(), Err(Error::InvalidLabel(_))));
        assert!(TrafficLabel::from_index(3).is_err());
        assert_eq!(TrafficLabel::Medium.to_string(), "medium");
    }

    #[test]
    fn test_csv_source() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name,lat,lon,label").unwrap();
        writeln!(file, "Boston,42.3601,-71.0589,high").unwrap();
        writeln!(file, "Tucson,32.2226,-110.9747,0").unwrap();
        file.flush().unwrap();

        let locations = CsvSource::new(file.path()).load().unwrap();

        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].label, TrafficLabel::High);
        assert_eq!(locations[1].label, TrafficLabel::Low);
        assert_eq!(locations[1].coordinate.lat(), 32.2226);
    }

    #[test]
    fn test_csv_rejects_bad_coordinate() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name,lat,lon,label").unwrap();
        writeln!(file, "Nowhere,95.0,0.0,low").unwrap();
        file.flush().unwrap();

        let result = CsvSource::new(file.path()).load();
        assert!(matches!(result, Err(Error::InvalidCoordinate { .. })));
    }
}
