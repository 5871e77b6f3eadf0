use price_predictor::utils::random_walk;
use price_predictor::{BackpropMode, Config, ModelState, PredictionService, PredictorError};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("price_predictor_{}_{}.json", name, std::process::id()))
}

#[test]
fn test_online_loop_over_synthetic_feed() {
    for mode in [BackpropMode::Simple, BackpropMode::Verbose] {
        let mut predictor = PredictionService::new(Config::new(0.05, 200, mode));
        let feed = random_walk(60, 100.0, 9);

        for (idx, record) in feed.iter().enumerate() {
            let step = predictor.ingest(*record).unwrap();
            let n = idx + 1;
            assert_eq!(step.curve.is_some(), n >= 3);
            assert_eq!(step.prediction.is_some(), n >= 2);
            if let Some(curve) = &step.curve {
                assert_eq!(curve.len(), 200);
                assert!(curve.windows(2).all(|w| w[1].epoch == w[0].epoch + 1));
            }
            if let Some(result) = step.prediction {
                assert!((0.0..=1.0).contains(&result.confidence));
                assert!(result.predicted > 0.0 && result.predicted < predictor.scaler().bound());
                assert_eq!(result.actual, record.close);
            }
        }

        let max_high = feed.iter().map(|r| r.high).fold(0.0, f64::max);
        assert_eq!(predictor.scaler().bound(), max_high);

        let stats = predictor.stats();
        assert_eq!(stats.count, 60);
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
    }
}

#[test]
fn test_state_survives_a_file_round_trip() {
    let mut predictor = PredictionService::new(Config::default());
    for record in random_walk(8, 50.0, 3) {
        predictor.ingest(record).unwrap();
    }
    let before = predictor.predict().unwrap().unwrap();

    let path = temp_path("round_trip");
    predictor.get_state().save_to_file(&path).unwrap();
    let loaded = ModelState::load_from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded, predictor.get_state());

    let mut restored = PredictionService::new(Config::default());
    for record in predictor.history() {
        restored.add_data_point(*record);
    }
    restored.set_state(&loaded).unwrap();
    let after = restored.predict().unwrap().unwrap();
    assert_eq!(before.predicted.to_bits(), after.predicted.to_bits());
    assert_eq!(before.confidence.to_bits(), after.confidence.to_bits());
}

#[test]
fn test_loading_malformed_state_file_fails() {
    let path = temp_path("malformed");
    std::fs::write(&path, r#"{"weights1": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]], "weights2": [[0.1, 0.2]], "maxScale": 1.0}"#)
        .unwrap();
    let result = ModelState::load_from_file(&path);
    std::fs::remove_file(&path).ok();
    assert!(matches!(result, Err(PredictorError::InvalidState(_))));

    let missing = temp_path("does_not_exist");
    assert!(matches!(
        ModelState::load_from_file(&missing),
        Err(PredictorError::Io(_))
    ));
}

#[test]
fn test_clear_then_refill_reuses_trained_weights() {
    let mut predictor = PredictionService::new(Config::new(0.1, 100, BackpropMode::Verbose));
    for record in random_walk(10, 20.0, 5) {
        predictor.ingest(record).unwrap();
    }
    let trained = predictor.get_state();
    predictor.clear();
    assert_eq!(predictor.stats().count, 0);
    assert!(predictor.train().unwrap().is_none());
    assert_eq!(predictor.get_state(), trained);
}
