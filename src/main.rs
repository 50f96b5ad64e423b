//! Command-line entry point
//!
//! - `encode`: encode a coordinate under one or all schemes
//! - `decode`: decode a code back to a coordinate
//! - `reproject`: transform a point between EPSG systems
//! - `train`: run the encode-and-train pipeline

use std::path::Path;

use anyhow::Result;
use burn::backend::{Autodiff, NdArray};
use clap::{Parser, Subcommand};
use tracing::info;

use geo_encoding_transformer::{
    encoding::{self, Coordinate, Crs, EncodingScheme, SchemeSpec},
    utils::{setup_logging, Config},
    CsvSource, DemoSource, SampleSource, TrafficLabel, TrafficPipeline,
};

type TrainBackend = Autodiff<NdArray>;

#[derive(Parser)]
#[command(name = "geo-encode")]
#[command(version = "0.1.0")]
#[command(about = "Location encodings and a Transformer traffic classifier", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a coordinate
    Encode {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Scheme with optional precision, e.g. geohash:7 (all configured channels when omitted)
        #[arg(short, long)]
        scheme: Option<String>,
    },

    /// Decode a code to its center point
    Decode {
        /// Scheme tag (geohash, h3, plus_code, utm)
        #[arg(short, long)]
        scheme: String,

        /// The code, e.g. dr5regw or "18T 583959 4507351"
        code: String,
    },

    /// Transform a point between EPSG systems
    Reproject {
        /// Source CRS, e.g. EPSG:4326
        #[arg(long)]
        from: String,

        /// Target CRS, e.g. EPSG:3857
        #[arg(long)]
        to: String,

        /// Longitude or easting
        #[arg(allow_hyphen_values = true)]
        x: f64,

        /// Latitude or northing
        #[arg(allow_hyphen_values = true)]
        y: f64,
    },

    /// Train the classifier
    Train {
        /// CSV with name,lat,lon,label columns (built-in demo cities when omitted)
        #[arg(short, long)]
        data: Option<String>,

        /// Number of epochs
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Write the vocabulary as JSON
        #[arg(long)]
        vocab_out: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let from_file = Path::new(&cli.config).exists();
    let config = if from_file {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    let log_level = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    setup_logging(log_level)?;
    if from_file {
        info!("Loaded configuration from {}", cli.config);
    }

    match cli.command {
        Commands::Encode { lat, lon, scheme } => run_encode(&config, lat, lon, scheme.as_deref())?,
        Commands::Decode { scheme, code } => run_decode(&scheme, &code)?,
        Commands::Reproject { from, to, x, y } => run_reproject(&from, &to, x, y)?,
        Commands::Train {
            data,
            epochs,
            vocab_out,
        } => run_train(config, data, epochs, vocab_out)?,
    }

    Ok(())
}

fn run_encode(config: &Config, lat: f64, lon: f64, scheme: Option<&str>) -> Result<()> {
    let coordinate = Coordinate::new(lat, lon)?;
    let specs = match scheme {
        Some(text) => vec![SchemeSpec::parse(text)?],
        None => config.encoding.specs()?,
    };

    for encoded in encoding::encode_all(&coordinate, &specs)? {
        println!(
            "{:<10} p={:<3} {}",
            encoded.scheme.tag(),
            encoded.precision,
            encoded.code
        );
    }
    Ok(())
}

fn run_decode(scheme: &str, code: &str) -> Result<()> {
    let scheme: EncodingScheme = scheme.parse()?;
    let decoded = encoding::decode(code, scheme)?;

    println!("center: {}", decoded.center);
    if let Some(bounds) = decoded.bounds {
        println!(
            "bounds: lat {:.6}..{:.6}, lon {:.6}..{:.6}",
            bounds.south, bounds.north, bounds.west, bounds.east
        );
    }
    Ok(())
}

fn run_reproject(from: &str, to: &str, x: f64, y: f64) -> Result<()> {
    let src: Crs = from.parse()?;
    let dst: Crs = to.parse()?;
    let (tx, ty) = encoding::transform(src, dst, x, y)?;

    println!("{} ({}, {}) -> {} ({:.6}, {:.6})", src, x, y, dst, tx, ty);
    Ok(())
}

fn run_train(
    mut config: Config,
    data: Option<String>,
    epochs: Option<usize>,
    vocab_out: Option<String>,
) -> Result<()> {
    if let Some(epochs) = epochs {
        config.training.epochs = epochs;
    }

    let source: Box<dyn SampleSource> = match data {
        Some(path) => Box::new(CsvSource::new(path)),
        None => Box::new(DemoSource),
    };

    let device = Default::default();
    let report = TrafficPipeline::new(config).run::<TrainBackend>(source.as_ref(), &device)?;

    println!("{:<16} {:>8} {:>10}", "location", "label", "predicted");
    for ((name, &label), &predicted) in report
        .names
        .iter()
        .zip(&report.labels)
        .zip(report.predictions())
    {
        println!(
            "{:<16} {:>8} {:>10}",
            name,
            TrafficLabel::from_index(label)?.to_string(),
            TrafficLabel::from_index(predicted)?.to_string()
        );
    }
    println!(
        "loss {:.4} -> {:.4}, accuracy {:.2}",
        report.history.initial_loss().unwrap_or(f32::NAN),
        report.evaluation.loss,
        report.evaluation.accuracy
    );

    if let Some(path) = vocab_out {
        report.vocabulary.save(&path)?;
        info!("Saved vocabulary ({} tokens) to {}", report.vocabulary.len(), path);
    }

    Ok(())
}
