// src/models/predictor.rs

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::network::{Config, ModelState, NetCore};
use crate::models::scaler::Scaler;
use crate::models::trainer::{LossCurve, TrainingController};
use crate::models::OhlcvRecord;

/// Points needed before `train` produces a curve
pub const MIN_TRAIN_HISTORY: usize = 3;
/// Points needed before `predict` produces a result
pub const MIN_PREDICT_HISTORY: usize = 2;
/// Size of the backtest window used for confidence
pub const CONFIDENCE_WINDOW: usize = 5;
/// First window index with two predecessors to predict from
const BACKTEST_START: usize = 2;
/// Confidence reported until the backtest window is full
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Outcome of one `predict` call.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub predicted: f64,
    pub actual: f64,
    pub loss: f64,
    pub confidence: f64,
}

/// Summary of the closes currently held in history.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct PriceStats {
    pub count: usize,
    pub max: f64,
    pub min: f64,
    pub mean: f64,
}

/// What one pass of the online loop produced.
#[derive(Debug, Clone, PartialEq)]
pub struct OnlineStep {
    pub curve: Option<LossCurve>,
    pub prediction: Option<PredictionResult>,
}

impl OnlineStep {
    /// Loss of the final training epoch, if training ran.
    pub fn final_loss(&self) -> Option<f64> {
        self.curve
            .as_ref()
            .and_then(|curve| curve.last())
            .map(|point| point.loss)
    }
}

/// Owns the price history, the scaler and the network, and wires them together
/// into the online train/predict loop.
#[derive(Debug, Clone)]
pub struct PredictionService {
    history: Vec<OhlcvRecord>,
    scaler: Scaler,
    net: NetCore,
}

impl PredictionService {
    pub fn new(config: Config) -> Self {
        PredictionService {
            history: Vec::new(),
            scaler: Scaler::new(),
            net: NetCore::new(config),
        }
    }

    pub fn history(&self) -> &[OhlcvRecord] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    /// Appends a record and widens the scale bound to its high.
    pub fn add_data_point(&mut self, record: OhlcvRecord) {
        self.scaler.update_bound(record.high);
        self.history.push(record);
    }

    /// One step of the online loop: record the candle, retrain, predict.
    pub fn ingest(&mut self, record: OhlcvRecord) -> Result<OnlineStep> {
        self.add_data_point(record);
        let curve = self.train()?;
        let prediction = self.predict()?;
        Ok(OnlineStep { curve, prediction })
    }

    /// Trains on the latest close using the two closes before it as features.
    ///
    /// Returns `Ok(None)` while fewer than three points are known.
    pub fn train(&mut self) -> Result<Option<LossCurve>> {
        let n = self.history.len();
        if n < MIN_TRAIN_HISTORY {
            return Ok(None);
        }
        let features = [
            self.scaler.normalize(self.history[n - 2].close)?,
            self.scaler.normalize(self.history[n - 3].close)?,
        ];
        let label = self.scaler.normalize(self.history[n - 1].close)?;
        let config = *self.net.config();
        let curve = TrainingController::run(&mut self.net, &features, label, &config)?;
        Ok(Some(curve))
    }

    /// Predicts the next close from the two most recent ones.
    ///
    /// Returns `Ok(None)` while fewer than two points are known.
    pub fn predict(&self) -> Result<Option<PredictionResult>> {
        let n = self.history.len();
        if n < MIN_PREDICT_HISTORY {
            return Ok(None);
        }
        let actual = self.history[n - 1].close;
        let predicted = self.predict_from(self.history[n - 1].close, self.history[n - 2].close)?;
        let result = PredictionResult {
            predicted,
            actual,
            loss: (predicted - actual).abs(),
            confidence: self.confidence()?,
        };
        debug!("Prediction {:?}", result);
        Ok(Some(result))
    }

    /// Backtests the network over the last five points: each of the final three
    /// closes is predicted from the two before it and scored by relative error.
    ///
    /// Returns 0.5 until five points are known. A zero close makes its relative
    /// error infinite, which clamps the result to 0.
    pub fn confidence(&self) -> Result<f64> {
        let n = self.history.len();
        if n < CONFIDENCE_WINDOW {
            return Ok(NEUTRAL_CONFIDENCE);
        }
        let window = &self.history[n - CONFIDENCE_WINDOW..];
        let mut total_error = 0.0;
        for i in BACKTEST_START..CONFIDENCE_WINDOW {
            let actual = window[i].close;
            let predicted = self.predict_from(window[i - 1].close, window[i - 2].close)?;
            total_error += (predicted - actual).abs() / actual;
        }
        let avg_error = total_error / (CONFIDENCE_WINDOW - BACKTEST_START) as f64;
        Ok((1.0 - avg_error).clamp(0.0, 1.0))
    }

    /// Count, max, min and mean over every close in history; all zero when empty.
    pub fn stats(&self) -> PriceStats {
        if self.history.is_empty() {
            return PriceStats::default();
        }
        let closes = self.history.iter().map(|r| r.close);
        let max = closes.clone().fold(f64::NEG_INFINITY, f64::max);
        let min = closes.clone().fold(f64::INFINITY, f64::min);
        let mean = closes.sum::<f64>() / self.history.len() as f64;
        PriceStats {
            count: self.history.len(),
            max,
            min,
            mean,
        }
    }

    pub fn get_state(&self) -> ModelState {
        self.net.export_state(self.scaler.bound())
    }

    /// Restores weights and scale bound. A malformed state leaves everything untouched.
    pub fn set_state(&mut self, state: &ModelState) -> Result<()> {
        let bound = self.net.import_state(state)?;
        self.scaler = Scaler::with_bound(bound);
        Ok(())
    }

    /// Parses and restores a JSON state.
    pub fn set_state_json(&mut self, json: &str) -> Result<()> {
        let state = ModelState::from_json(json)?;
        self.set_state(&state)
    }

    /// Empties the history. Weights and scale bound are kept.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    fn predict_from(&self, latest: f64, previous: f64) -> Result<f64> {
        let features = [
            self.scaler.normalize(latest)?,
            self.scaler.normalize(previous)?,
        ];
        let (output, _) = self.net.forward(&features)?;
        Ok(self.scaler.denormalize(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PredictorError;
    use crate::models::network::BackpropMode;

    fn bar(close: f64, high: f64) -> OhlcvRecord {
        OhlcvRecord {
            open: close,
            high,
            low: close,
            close,
            ..Default::default()
        }
    }

    fn service_with(points: &[(f64, f64)]) -> PredictionService {
        let mut service = PredictionService::new(Config::new(0.1, 1000, BackpropMode::Simple));
        for &(close, high) in points {
            service.add_data_point(bar(close, high));
        }
        service
    }

    #[test]
    fn test_predict_needs_two_points() {
        let service = service_with(&[(10.0, 10.0)]);
        assert!(service.predict().unwrap().is_none());

        let service = service_with(&[(10.0, 10.0), (20.0, 20.0)]);
        let result = service.predict().unwrap().unwrap();
        assert_eq!(service.scaler().bound(), 20.0);
        assert_eq!(result.actual, 20.0);
        assert!(result.predicted > 0.0 && result.predicted < 20.0);
        assert_eq!(result.loss, (result.predicted - 20.0).abs());
        assert_eq!(result.confidence, NEUTRAL_CONFIDENCE);
    }

    #[test]
    fn test_train_needs_three_points() {
        let mut service = service_with(&[(10.0, 11.0), (12.0, 12.5)]);
        assert!(service.train().unwrap().is_none());
        assert_eq!(service.get_state(), service_with(&[]).get_state().with_scale(12.5));

        service.add_data_point(bar(11.0, 12.0));
        let curve = service.train().unwrap().unwrap();
        assert_eq!(curve.len(), 1000);
        assert_eq!(curve.first().unwrap().epoch, 1);
        assert_eq!(curve.last().unwrap().epoch, 1000);
    }

    #[test]
    fn test_zero_bound_is_an_error() {
        let mut service = service_with(&[(10.0, 0.0), (11.0, 0.0), (12.0, 0.0)]);
        assert!(matches!(service.train(), Err(PredictorError::DivisionByZero)));
        assert!(matches!(service.predict(), Err(PredictorError::DivisionByZero)));
    }

    #[test]
    fn test_confidence_is_neutral_below_window() {
        let mut service = service_with(&[]);
        for close in [10.0, 11.0, 12.0, 13.0] {
            assert_eq!(service.confidence().unwrap(), 0.5);
            service.add_data_point(bar(close, close));
        }
        assert_eq!(service.confidence().unwrap(), 0.5);
        service.add_data_point(bar(14.0, 14.0));
        let confidence = service.confidence().unwrap();
        assert!((0.0..=1.0).contains(&confidence));
    }

    #[test]
    fn test_confidence_matches_manual_backtest() {
        let service = service_with(&[(5.0, 6.0), (6.0, 7.0), (7.0, 8.0), (8.0, 9.0), (9.0, 10.0), (10.0, 11.0)]);
        let closes: Vec<f64> = service.history()[1..].iter().map(|r| r.close).collect();
        let mut total = 0.0;
        for i in 2..5 {
            let predicted = service.predict_from(closes[i - 1], closes[i - 2]).unwrap();
            total += (predicted - closes[i]).abs() / closes[i];
        }
        let expected = (1.0 - total / 3.0).clamp(0.0, 1.0);
        assert_eq!(service.confidence().unwrap(), expected);
    }

    #[test]
    fn test_identical_closes_reach_full_confidence_once_trained() {
        let mut service = service_with(&[(100.0, 200.0); 5]);
        service.train().unwrap().unwrap();
        let confidence = service.confidence().unwrap();
        assert!((confidence - 1.0).abs() < 1e-6, "confidence {}", confidence);
    }

    #[test]
    fn test_confidence_clamps_at_zero() {
        // predictions sit near half the bound while actual closes are tiny
        let service = service_with(&[(1.0, 1000.0), (1.0, 1.0), (1.0, 1.0), (1.0, 1.0), (1.0, 1.0)]);
        assert_eq!(service.confidence().unwrap(), 0.0);
    }

    #[test]
    fn test_zero_close_in_window_drives_confidence_to_zero() {
        let service = service_with(&[(5.0, 10.0), (5.0, 10.0), (0.0, 10.0), (5.0, 10.0), (5.0, 10.0)]);
        assert_eq!(service.confidence().unwrap(), 0.0);
    }

    #[test]
    fn test_ingest_runs_the_online_loop() {
        let mut service = service_with(&[]);
        let step = service.ingest(bar(10.0, 10.0)).unwrap();
        assert_eq!(step, OnlineStep { curve: None, prediction: None });

        let step = service.ingest(bar(11.0, 11.0)).unwrap();
        assert!(step.curve.is_none());
        assert_eq!(step.prediction.unwrap().actual, 11.0);

        let step = service.ingest(bar(12.0, 12.0)).unwrap();
        assert_eq!(step.curve.as_ref().map(|c| c.len()), Some(1000));
        assert_eq!(step.final_loss(), step.curve.as_ref().unwrap().last().map(|p| p.loss));
        assert_eq!(service.len(), 3);
    }

    #[test]
    fn test_stats() {
        assert_eq!(service_with(&[]).stats(), PriceStats::default());
        let stats = service_with(&[(10.0, 10.0), (30.0, 30.0), (20.0, 20.0)]).stats();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.mean, 20.0);
    }

    #[test]
    fn test_clear_keeps_weights_and_bound() {
        let mut service = service_with(&[(10.0, 10.0), (11.0, 11.0), (12.0, 12.0)]);
        service.train().unwrap();
        let state = service.get_state();
        service.clear();
        assert!(service.is_empty());
        assert_eq!(service.get_state(), state);
        assert!(service.predict().unwrap().is_none());
    }

    #[test]
    fn test_state_round_trip_keeps_predictions_identical() {
        let mut service = service_with(&[(10.0, 10.5), (11.0, 11.5), (10.5, 11.0), (12.0, 12.2), (11.8, 12.1)]);
        service.train().unwrap();
        let before = service.predict().unwrap().unwrap();
        let state = service.get_state();
        service.set_state(&state).unwrap();
        let after = service.predict().unwrap().unwrap();
        assert_eq!(before, after);
        assert_eq!(before.predicted.to_bits(), after.predicted.to_bits());
    }

    #[test]
    fn test_set_state_replaces_bound() {
        let mut trained = service_with(&[(10.0, 50.0), (11.0, 50.0), (12.0, 50.0)]);
        trained.train().unwrap();
        let mut fresh = service_with(&[(10.0, 20.0), (11.0, 20.0)]);
        fresh.set_state(&trained.get_state()).unwrap();
        assert_eq!(fresh.scaler().bound(), 50.0);
        assert_eq!(fresh.get_state(), trained.get_state());
    }

    #[test]
    fn test_set_state_json_rejects_malformed_input() {
        let mut service = service_with(&[(10.0, 10.0)]);
        let original = service.get_state();
        for bad in [
            "not json",
            r#"{"weights1": [[1, 2]], "weights2": [[1, 2]], "maxScale": 1}"#,
            r#"{"weights1": [[1, 2], [3, 4]], "weights2": [[1, 2]]}"#,
            r#"{"weights2": [[1, 2]], "maxScale": 1}"#,
        ] {
            assert!(matches!(
                service.set_state_json(bad),
                Err(PredictorError::InvalidState(_))
            ));
        }
        assert_eq!(service.get_state(), original);
    }

    impl ModelState {
        fn with_scale(mut self, max_scale: f64) -> Self {
            self.max_scale = max_scale;
            self
        }
    }
}
