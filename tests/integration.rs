//! Integration tests across encoding, tokenization, assembly and training

use approx::assert_abs_diff_eq;
use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;

use geo_encoding_transformer::{
    data::to_int_tensor,
    encoding::{self, utm, Coordinate, Crs, EncodingScheme, LocationCode, SchemeSpec},
    evaluate, tokenize, BatchAssembler, ClassifierConfig, Config, DemoSource, Error,
    LocationDataset, SampleSource, TokenVocabulary, TrafficClassifier, TrafficPipeline, Trainer,
    TrainingConfig,
};

type TrainBackend = Autodiff<NdArray>;

fn nyc() -> Coordinate {
    Coordinate::new(40.7128, -74.0060).unwrap()
}

fn all_channels() -> Vec<SchemeSpec> {
    EncodingScheme::ALL
        .iter()
        .map(|&s| SchemeSpec::with_default(s))
        .collect()
}

#[test]
fn test_geohash_round_trip() {
    let encoded = encoding::encode(&nyc(), EncodingScheme::Geohash, 7).unwrap();
    assert_eq!(encoded.token(), "dr5regw");

    let decoded = encoded.decode().unwrap();
    assert_abs_diff_eq!(decoded.center.lat(), 40.7128, epsilon = 0.001);
    assert_abs_diff_eq!(decoded.center.lon(), -74.0060, epsilon = 0.001);
    assert!(decoded.bounds.unwrap().contains(&nyc()));
}

#[test]
fn test_utm_vector_and_round_trip() {
    let encoded = encoding::encode(&nyc(), EncodingScheme::Utm, 0).unwrap();
    let utm = match encoded.code {
        LocationCode::Utm(u) => u,
        other => panic!("expected UTM code, got {:?}", other),
    };

    assert_abs_diff_eq!(utm.easting, 583959.37, epsilon = 1.0);
    assert_abs_diff_eq!(utm.northing, 4507350.99, epsilon = 1.0);
    assert_eq!(utm.zone(), "18T");

    let back = utm::to_latlon(&utm).unwrap();
    assert_abs_diff_eq!(back.lat(), 40.7128, epsilon = 1e-4);
    assert_abs_diff_eq!(back.lon(), -74.0060, epsilon = 1e-4);
}

#[test]
fn test_every_scheme_decodes_near_the_source() {
    for spec in all_channels() {
        let encoded = spec.encode(&nyc()).unwrap();
        let decoded = encoded.decode().unwrap();
        // default precisions resolve to well under a kilometer
        assert!(
            nyc().distance_to(&decoded.center) < 1000.0,
            "{} decoded too far away",
            spec.scheme()
        );
    }
}

#[test]
fn test_string_decode_matches_encoded_decode() {
    for spec in all_channels() {
        let encoded = spec.encode(&nyc()).unwrap();
        let from_string = encoding::decode(&encoded.token(), spec.scheme()).unwrap();
        let direct = encoded.decode().unwrap();
        assert_abs_diff_eq!(from_string.center.lat(), direct.center.lat(), epsilon = 1e-3);
        assert_abs_diff_eq!(from_string.center.lon(), direct.center.lon(), epsilon = 1e-3);
    }
}

#[test]
fn test_invalid_inputs() {
    assert!(matches!(
        Coordinate::new(90.5, 0.0),
        Err(Error::InvalidCoordinate { .. })
    ));
    assert!(matches!(
        encoding::encode(&nyc(), EncodingScheme::Geohash, 0),
        Err(Error::InvalidPrecision { .. })
    ));
    assert!(matches!(
        "s2".parse::<EncodingScheme>(),
        Err(Error::UnsupportedScheme(_))
    ));
    assert!(matches!(
        encoding::decode("dr5ra!", EncodingScheme::Geohash),
        Err(Error::InvalidCode { .. })
    ));
}

#[test]
fn test_reprojection_round_trip() {
    let (x, y) = encoding::transform(Crs::Wgs84, Crs::WebMercator, -74.0060, 40.7128).unwrap();
    let (lon, lat) = encoding::transform(Crs::WebMercator, Crs::Wgs84, x, y).unwrap();
    assert_abs_diff_eq!(lon, -74.0060, epsilon = 1e-9);
    assert_abs_diff_eq!(lat, 40.7128, epsilon = 1e-9);
}

#[test]
fn test_vocabulary_is_dense_permutation() {
    let dataset = LocationDataset::build(DemoSource.load().unwrap(), &all_channels()).unwrap();
    let codes: Vec<String> = dataset.channel_codes(true).into_iter().flatten().collect();

    let (tokens, vocab) = tokenize(&codes).unwrap();
    let unique: std::collections::HashSet<&String> = codes.iter().collect();

    assert_eq!(vocab.len(), unique.len());
    let mut seen: Vec<usize> = tokens.clone();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen, (0..vocab.len()).collect::<Vec<_>>());
}

#[test]
fn test_ragged_channels_rejected() {
    let assembler = BatchAssembler::new(2);
    let result = assembler.assemble(&[vec![0, 1, 2, 3, 4], vec![5, 6, 7, 8]]);
    assert!(matches!(result, Err(Error::ShapeMismatch(_))));
}

#[test]
fn test_identical_locations_get_identical_logits() {
    let device = Default::default();
    let specs = all_channels();
    let locations = vec![DemoSource.load().unwrap()[0].clone(); 2];
    let dataset = LocationDataset::build(locations, &specs).unwrap();
    let mut vocab = TokenVocabulary::new();
    let batch = dataset.to_batch(&mut vocab, true).unwrap();

    let config = ClassifierConfig::default().for_data(vocab.len(), specs.len());
    let model = TrafficClassifier::<NdArray>::new(&config, &device).unwrap();
    let logits = model
        .forward(to_int_tensor::<NdArray>(&batch.tokens, &device))
        .unwrap();

    let first = logits.clone().slice([0..1, 0..3]);
    let second = logits.slice([1..2, 0..3]);
    first.into_data().assert_approx_eq(&second.into_data(), 5);
}

#[test]
fn test_same_seed_same_weights_across_threads() {
    let device = Default::default();
    let config = ClassifierConfig::default().for_data(20, 4);
    let tokens = to_int_tensor::<NdArray>(
        &BatchAssembler::new(4)
            .assemble(&[vec![0, 1], vec![5, 6], vec![10, 11], vec![15, 19]])
            .unwrap(),
        &device,
    );

    let logits_for = |seed: u64| {
        let config = ClassifierConfig {
            seed,
            ..config.clone()
        };
        TrafficClassifier::<NdArray>::new(&config, &device)
            .unwrap()
            .forward(tokens.clone())
            .unwrap()
            .into_data()
    };

    let expected = logits_for(42);
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = [42u64, 7, 42, 7, 42, 7]
            .into_iter()
            .map(|seed| {
                let logits_for = &logits_for;
                scope.spawn(move || (seed, logits_for(seed)))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (_, logits) in results.iter().filter(|(seed, _)| *seed == 42) {
        logits.assert_approx_eq(&expected, 6);
    }
}

#[test]
fn test_default_config_fits_demo_cities() {
    let device = Default::default();
    let config = Config::default();
    assert_eq!(config.training.epochs, 10);
    assert_abs_diff_eq!(config.training.learning_rate, 0.01);

    let report = TrafficPipeline::new(config)
        .run::<TrainBackend>(&DemoSource, &device)
        .unwrap();

    let losses = &report.history.losses;
    assert_eq!(losses.len(), 10);
    assert!(report.history.is_improving());
    assert!(
        losses.last().unwrap() < &(losses[0] * 0.5),
        "loss barely moved: {:?}",
        losses
    );
    assert_eq!(report.predictions().to_vec(), vec![2, 1, 1, 2, 0]);
    assert!(report.is_fit());
}

#[test]
fn test_training_overfits_demo_cities() {
    let device = Default::default();
    let dataset = LocationDataset::build(DemoSource.load().unwrap(), &all_channels()).unwrap();
    let mut vocab = TokenVocabulary::new();
    let batch = dataset.to_batch(&mut vocab, true).unwrap();
    let (tokens, labels) = batch.to_tensors::<TrainBackend>(&device);

    let config = ClassifierConfig {
        seed: 7,
        ..ClassifierConfig::default().for_data(vocab.len(), dataset.num_channels())
    };
    let model = TrafficClassifier::<TrainBackend>::new(&config, &device).unwrap();

    let mut trainer = Trainer::new(TrainingConfig {
        epochs: 80,
        learning_rate: 0.02,
        log_every: 20,
    })
    .unwrap();
    let (model, history) = trainer
        .train(model, tokens.clone(), labels.clone())
        .unwrap();

    assert!(history.is_improving());
    assert!(history.final_loss().unwrap() < history.initial_loss().unwrap());

    let evaluation = evaluate(&model.valid(), tokens.inner(), labels.inner()).unwrap();
    assert_eq!(evaluation.predictions, vec![2, 1, 1, 2, 0]);
    assert_abs_diff_eq!(evaluation.accuracy, 1.0);
}

#[test]
fn test_pipeline_with_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut config = Config::default();
    config.training.epochs = 80;
    config.training.learning_rate = 0.02;
    config.training.log_every = 20;
    config.save(&path).unwrap();

    let device = Default::default();
    let report = TrafficPipeline::new(Config::load(&path).unwrap())
        .run::<TrainBackend>(&DemoSource, &device)
        .unwrap();

    assert!(report.history.is_improving());
    assert!(report.is_fit());
    assert_eq!(report.vocabulary.len(), 20);
}
