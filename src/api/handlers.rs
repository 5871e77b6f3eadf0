// src/api/handlers.rs

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use log::{debug, info};
use serde::Serialize;

use crate::api::AppState;
use crate::error::PredictorError;
use crate::models::predictor::{MIN_PREDICT_HISTORY, MIN_TRAIN_HISTORY};
use crate::models::{ModelState, OhlcvRecord};

#[derive(Serialize)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ResponseError for PredictorError {
    fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if matches!(self, PredictorError::DivisionByZero) {
            StatusCode::CONFLICT
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

fn not_enough_history(required: usize, actual: usize) -> HttpResponse {
    HttpResponse::Conflict().json(ErrorResponse {
        error: format!(
            "not enough history: need {} data points, have {}",
            required, actual
        ),
    })
}

pub async fn add_data_point(
    data: web::Data<AppState>,
    record: web::Json<OhlcvRecord>,
) -> impl Responder {
    let mut predictor = data.lock();
    predictor.add_data_point(record.into_inner());
    debug!("Added data point, history is now {}", predictor.len());
    HttpResponse::Ok().json(CountResponse {
        count: predictor.len(),
    })
}

/// Training runs on the blocking pool so long epoch counts don't stall a worker.
pub async fn train(data: web::Data<AppState>) -> Result<HttpResponse, actix_web::Error> {
    let state = data.clone();
    let (curve, len) = web::block(move || {
        let mut predictor = state.lock();
        predictor.train().map(|curve| (curve, predictor.len()))
    })
    .await??;
    match curve {
        Some(curve) => Ok(HttpResponse::Ok().json(curve)),
        None => Ok(not_enough_history(MIN_TRAIN_HISTORY, len)),
    }
}

pub async fn get_prediction(data: web::Data<AppState>) -> Result<HttpResponse, PredictorError> {
    let predictor = data.lock();
    match predictor.predict()? {
        Some(result) => Ok(HttpResponse::Ok().json(result)),
        None => Ok(not_enough_history(MIN_PREDICT_HISTORY, predictor.len())),
    }
}

pub async fn get_stats(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(data.lock().stats())
}

pub async fn get_state(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(data.lock().get_state())
}

pub async fn put_state(
    data: web::Data<AppState>,
    state: web::Json<ModelState>,
) -> Result<HttpResponse, PredictorError> {
    data.lock().set_state(&state)?;
    info!("Model state replaced (max scale {})", state.max_scale);
    Ok(HttpResponse::NoContent().finish())
}

pub async fn clear_history(data: web::Data<AppState>) -> impl Responder {
    data.lock().clear();
    HttpResponse::NoContent().finish()
}
