//! Online next-price predictor.
//!
//! A fixed 2-2-1 sigmoid network learns to predict the latest close from the
//! two before it, retraining on every new OHLCV record, and scores itself with
//! a short rolling backtest.
//!
//! - `models` - scaler, network, training loop and the prediction service
//! - `utils` - kline fetching, synthetic feeds, loss-curve plotting
//! - `api`, `server`, `ws` - HTTP and WebSocket surface
//! - `config` - environment-driven process settings

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod utils;
pub mod ws;

pub use config::{AppConfig, DataSource};
pub use error::{PredictorError, Result};
pub use models::{
    BackpropMode, Config, LossCurve, LossPoint, ModelState, NetCore, OhlcvRecord, OnlineStep,
    PredictionResult, PredictionService, PriceStats, Scaler, TrainingController,
};
