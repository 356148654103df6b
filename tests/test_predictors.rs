use rstest::rstest;
use session_forecast::data::Direction;
use session_forecast::features::{FeatureCatalog, FeatureFamily, FeatureMember, FeatureZPack};
use session_forecast::predictors::{
    CalibratedConfig, CalibratedScorePredictor, Combiner, FeatureVector, SimilarityConfig,
    SimilarityPredictor, UnavailableReason, WeightedSumCombiner,
};

fn vector(score: f64) -> FeatureVector {
    FeatureVector {
        score,
        volume_dev_pct: 0.0,
        sentiment_dev_pct: 0.0,
        ticker_vol_comp: 0.0,
        market_vol_comp: 0.0,
    }
}

/// A one-member pack whose "signal" column is the given series
fn pack_of(series: Vec<f64>) -> FeatureZPack {
    let len = series.len();
    let families = vec![FeatureFamily {
        name: "alpha".to_string(),
        members: vec![FeatureMember {
            key: "signal".to_string(),
            z: series,
        }],
    }];
    FeatureCatalog::new(families, len).unwrap().z_pack()
}

#[test]
fn band_widens_until_enough_candidates() {
    // 30 sessions sit inside band 3, another 30 only inside band 4.
    let mut avg_ts = vec![0.0; 30];
    avg_ts.extend(vec![3.5; 30]);
    let vectors: Vec<FeatureVector> = avg_ts.iter().map(|&v| vector(v)).collect();
    let moves = vec![1.0; 60];

    let predictor = SimilarityPredictor::new(SimilarityConfig::default()).unwrap();
    let prediction = predictor
        .predict(0.0, &vector(0.0), &avg_ts, &vectors, &moves)
        .unwrap();

    assert_eq!(prediction.band_used, Some(4.0));
    assert_eq!(prediction.matches, 60);
    assert_eq!(prediction.label, Direction::Up);
    assert_eq!(prediction.confidence, 1.0);
}

#[test]
fn first_sufficient_band_is_reported() {
    let avg_ts = vec![2.0; 75];
    let vectors: Vec<FeatureVector> = avg_ts.iter().map(|&v| vector(v)).collect();
    let moves = vec![-0.5; 75];

    let predictor = SimilarityPredictor::new(SimilarityConfig::default()).unwrap();
    let prediction = predictor
        .predict(0.0, &vector(0.0), &avg_ts, &vectors, &moves)
        .unwrap();

    assert_eq!(prediction.band_used, Some(3.0));
    assert_eq!(prediction.matches, 75);
    assert_eq!(prediction.label, Direction::Down);
}

#[test]
fn gate_exhausted_returns_unknown() {
    let avg_ts = vec![50.0; 40];
    let vectors: Vec<FeatureVector> = avg_ts.iter().map(|&v| vector(v)).collect();
    let moves = vec![1.0; 40];

    let predictor = SimilarityPredictor::new(SimilarityConfig::default()).unwrap();
    let prediction = predictor
        .predict(0.0, &vector(0.0), &avg_ts, &vectors, &moves)
        .unwrap();

    assert_eq!(prediction.label, Direction::Unknown);
    assert_eq!(prediction.confidence, 0.0);
    assert_eq!(prediction.matches, 0);
    assert_eq!(prediction.band_used, Some(10.0));
    assert_eq!(prediction.reason, Some(UnavailableReason::GateExhausted));
}

#[test]
fn vote_tie_defaults_to_down() {
    let avg_ts = vec![0.0; 60];
    let vectors: Vec<FeatureVector> = avg_ts.iter().map(|&v| vector(v)).collect();
    let moves: Vec<f64> = (0..60).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();

    let predictor = SimilarityPredictor::new(SimilarityConfig::default()).unwrap();
    let prediction = predictor
        .predict(0.0, &vector(0.0), &avg_ts, &vectors, &moves)
        .unwrap();

    assert_eq!(prediction.label, Direction::Down);
    assert_eq!(prediction.confidence, 0.5);
    assert!(prediction.expected_pct_change.abs() < 1e-12);
}

#[test]
fn neighbor_set_is_capped_at_k() {
    let avg_ts = vec![0.0; 250];
    let vectors: Vec<FeatureVector> = avg_ts.iter().map(|&v| vector(v)).collect();
    let moves = vec![2.0; 250];

    let predictor = SimilarityPredictor::new(SimilarityConfig::default()).unwrap();
    let prediction = predictor
        .predict(0.0, &vector(0.0), &avg_ts, &vectors, &moves)
        .unwrap();

    assert_eq!(prediction.matches, 100);
}

#[test]
fn nearest_vectors_dominate_the_vote() {
    // All 60 candidates pass the gate, but the 50 nearest by feature distance
    // are all up days; the 10 distant ones are down days.
    let avg_ts = vec![0.0; 60];
    let mut vectors = Vec::new();
    let mut moves = Vec::new();
    for i in 0..60 {
        if i < 50 {
            vectors.push(vector(0.1));
            moves.push(1.5);
        } else {
            vectors.push(vector(3.0));
            moves.push(-1.5);
        }
    }

    let mut config = SimilarityConfig::default();
    config.k = 50;
    let predictor = SimilarityPredictor::new(config).unwrap();
    let prediction = predictor
        .predict(0.0, &vector(0.0), &avg_ts, &vectors, &moves)
        .unwrap();

    assert_eq!(prediction.label, Direction::Up);
    assert_eq!(prediction.matches, 50);
    assert!((prediction.expected_pct_change - 1.5).abs() < 1e-12);
}

#[test]
fn history_length_mismatch_is_a_programmer_error() {
    let predictor = SimilarityPredictor::new(SimilarityConfig::default()).unwrap();
    let result = predictor.predict(0.0, &vector(0.0), &[0.0; 5], &[vector(0.0); 4], &[1.0; 5]);
    assert!(result.is_err());
}

#[rstest]
#[case(0.0, Direction::Neutral)]
#[case(0.5, Direction::Neutral)]
#[case(-0.5, Direction::Neutral)]
#[case(0.51, Direction::Up)]
#[case(-0.51, Direction::Down)]
#[case(4.0, Direction::Up)]
#[case(-4.0, Direction::Down)]
fn neutral_band_containment(#[case] score: f64, #[case] expected: Direction) {
    let pack = pack_of(vec![0.0; 3]);
    let predictor = CalibratedScorePredictor::new(CalibratedConfig::default()).unwrap();
    let combiner = move |_: &FeatureZPack, _: usize| score;

    let prediction = predictor.predict(&pack, 0, 2.0, &combiner).unwrap();
    assert_eq!(prediction.label, expected);
}

#[test]
fn probability_is_temperature_scaled_and_clamped() {
    let pack = pack_of(vec![0.0; 3]);
    let predictor = CalibratedScorePredictor::new(CalibratedConfig::default()).unwrap();

    let neutral = predictor
        .predict(&pack, 0, 2.0, &|_: &FeatureZPack, _: usize| 0.0)
        .unwrap();
    assert!((neutral.confidence - 0.5).abs() < 1e-12);

    let extreme = predictor
        .predict(&pack, 0, 2.0, &|_: &FeatureZPack, _: usize| 50.0)
        .unwrap();
    assert_eq!(extreme.confidence, 0.95);

    let bearish = predictor
        .predict(&pack, 0, 2.0, &|_: &FeatureZPack, _: usize| -50.0)
        .unwrap();
    assert_eq!(bearish.confidence, 0.05);
}

#[test]
fn magnitude_is_anchored_to_atr() {
    let pack = pack_of(vec![0.0; 3]);
    let predictor = CalibratedScorePredictor::new(CalibratedConfig::default()).unwrap();

    let prediction = predictor
        .predict(&pack, 0, 2.0, &|_: &FeatureZPack, _: usize| 2.0)
        .unwrap();
    // 2.0% ATR * (1 + 0.25 * 2) = 3.0%.
    assert!((prediction.expected_pct_change - 3.0).abs() < 1e-12);

    // A huge score cannot push the estimate past the ceiling.
    let capped = predictor
        .predict(&pack, 0, 9.0, &|_: &FeatureZPack, _: usize| 100.0)
        .unwrap();
    assert_eq!(capped.expected_pct_change, 10.0);

    // Missing ATR floors the estimate instead of poisoning it.
    let floored = predictor
        .predict(&pack, 0, f64::NAN, &|_: &FeatureZPack, _: usize| 2.0)
        .unwrap();
    assert_eq!(floored.expected_pct_change, 0.1);
}

#[test]
fn non_finite_combiner_output_is_neutral() {
    let pack = pack_of(vec![0.0; 3]);
    let predictor = CalibratedScorePredictor::new(CalibratedConfig::default()).unwrap();

    let prediction = predictor
        .predict(&pack, 0, 2.0, &|_: &FeatureZPack, _: usize| f64::NAN)
        .unwrap();

    assert_eq!(prediction.label, Direction::Neutral);
    assert_eq!(prediction.confidence, 0.5);
    assert_eq!(prediction.reason, Some(UnavailableReason::InsufficientData));
}

#[test]
fn weighted_sum_combiner_skips_missing_members() {
    let pack = pack_of(vec![2.0, f64::NAN]);
    let combiner = WeightedSumCombiner::new(vec![
        ("signal".to_string(), 1.5),
        ("absent".to_string(), 100.0),
    ]);

    assert!((combiner.score(&pack, 0) - 3.0).abs() < 1e-12);
    // NaN member contributes zero rather than NaN.
    assert_eq!(combiner.score(&pack, 1), 0.0);
}
