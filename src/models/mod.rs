// src/models/mod.rs

pub mod market;
pub mod network;
pub mod predictor;
pub mod scaler;
pub mod trainer;

// Re-export model components
pub use market::OhlcvRecord;
pub use network::{BackpropMode, Config, ModelState, NetCore};
pub use predictor::{OnlineStep, PredictionResult, PredictionService, PriceStats};
pub use scaler::Scaler;
pub use trainer::{LossCurve, LossPoint, TrainingController};
