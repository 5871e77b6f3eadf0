// src/utils/mod.rs

pub mod data_processing;
pub mod plotting;
pub mod synthetic;

pub use data_processing::{calculate_metrics, fetch_klines, parse_klines};
pub use plotting::plot_loss_curve;
pub use synthetic::random_walk;
