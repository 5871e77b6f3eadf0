// src/api/mod.rs

use std::sync::{Mutex, MutexGuard, PoisonError};

use actix_web::web;

use crate::models::{Config, PredictionService};

/// Application state shared by every handler.
///
/// One lock guards the whole predictor, so writes (`/data`, `/train`,
/// `PUT /state`) are serialized against reads.
pub struct AppState {
    pub predictor: Mutex<PredictionService>,
}

impl AppState {
    pub fn new(predictor: PredictionService) -> Self {
        AppState {
            predictor: Mutex::new(predictor),
        }
    }

    pub fn with_config(config: Config) -> Self {
        Self::new(PredictionService::new(config))
    }

    /// Locks the predictor. Core operations never panic while holding the
    /// lock, so a poisoned guard still holds consistent data.
    pub fn lock(&self) -> MutexGuard<'_, PredictionService> {
        self.predictor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Re-export handlers
pub mod handlers;

pub use handlers::{
    add_data_point, clear_history, get_prediction, get_state, get_stats, put_state, train,
};

/// Registers every HTTP and WebSocket route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/data", web::post().to(add_data_point))
        .route("/train", web::post().to(train))
        .route("/predict", web::get().to(get_prediction))
        .route("/stats", web::get().to(get_stats))
        .route("/state", web::get().to(get_state))
        .route("/state", web::put().to(put_state))
        .route("/history", web::delete().to(clear_history))
        .route("/ws", web::get().to(crate::ws::predictor_ws));
}
