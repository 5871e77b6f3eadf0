// src/main.rs

use std::time::Duration;

use actix_web::web;
use log::{error, info, warn};
use tokio::task;

use price_predictor::api::AppState;
use price_predictor::server::run_server;
use price_predictor::utils::{calculate_metrics, fetch_klines, plot_loss_curve, random_walk};
use price_predictor::{
    AppConfig, DataSource, LossCurve, ModelState, OhlcvRecord, PredictionService, PredictorError,
};

const SYNTHETIC_START_PRICE: f64 = 100.0;
const SYNTHETIC_SEED: u64 = 1337;

fn to_io(err: PredictorError) -> std::io::Error {
    std::io::Error::other(err.to_string())
}

#[actix_web::main]
async fn main() -> Result<(), std::io::Error> {
    // Initialize the logger
    env_logger::init();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        to_io(e)
    })?;
    info!(
        "Starting predictor: lr={} epochs={} mode={:?}",
        config.model.learning_rate, config.model.epochs, config.model.backprop_mode
    );

    let mut predictor = PredictionService::new(config.model);
    if config.model_path.exists() {
        match ModelState::load_from_file(&config.model_path)
            .and_then(|state| predictor.set_state(&state))
        {
            Ok(()) => info!("Restored model state from {}", config.model_path.display()),
            Err(e) => warn!(
                "Ignoring model state at {}: {}",
                config.model_path.display(),
                e
            ),
        }
    }

    // Seed the history and replay the online loop over it
    let seed = load_history(&config).await.map_err(to_io)?;
    info!("Seeding with {} candles", seed.len());
    let last_curve = replay(&mut predictor, seed).map_err(to_io)?;

    if let Err(e) = predictor.get_state().save_to_file(&config.model_path) {
        error!("Failed to save model state: {}", e);
    }
    if let (Some(path), Some(curve)) = (&config.loss_plot_path, &last_curve) {
        match plot_loss_curve(curve, path) {
            Ok(()) => info!("Loss curve written to {}", path.display()),
            Err(e) => error!("Failed to plot loss curve: {}", e),
        }
    }

    let app_state = web::Data::new(AppState::new(predictor));

    if config.poll_interval_secs > 0 && config.data_source == DataSource::Binance {
        actix_web::rt::spawn(poll_latest(app_state.clone(), config.clone()));
    }

    run_server(app_state, &config.bind_addr, config.port).await
}

async fn load_history(config: &AppConfig) -> Result<Vec<OhlcvRecord>, PredictorError> {
    match config.data_source {
        DataSource::Synthetic => Ok(random_walk(
            config.history_limit,
            SYNTHETIC_START_PRICE,
            SYNTHETIC_SEED,
        )),
        DataSource::Binance => {
            let config = config.clone();
            task::spawn_blocking(move || {
                fetch_klines(
                    &config.api_base_url,
                    &config.symbol,
                    &config.interval,
                    config.history_limit,
                )
            })
            .await
            .map_err(|e| PredictorError::Fetch(e.to_string()))?
        }
    }
}

/// Feeds every record through the online loop and logs how the predictions fared.
fn replay(
    predictor: &mut PredictionService,
    records: Vec<OhlcvRecord>,
) -> Result<Option<LossCurve>, PredictorError> {
    let mut predictions = Vec::new();
    let mut actuals = Vec::new();
    let mut last_curve = None;

    for record in records {
        let step = predictor.ingest(record)?;
        if let Some(result) = step.prediction {
            predictions.push(result.predicted);
            actuals.push(result.actual);
        }
        if step.curve.is_some() {
            last_curve = step.curve;
        }
    }

    let (mse, mae) = calculate_metrics(&predictions, &actuals);
    info!(
        "Replay done: {} predictions, MSE {:.6}, MAE {:.6}",
        predictions.len(),
        mse,
        mae
    );
    Ok(last_curve)
}

/// Periodically fetches the latest closed candle and pushes it through the online loop.
async fn poll_latest(app_state: web::Data<AppState>, config: AppConfig) {
    let mut ticker = tokio::time::interval(Duration::from_secs(config.poll_interval_secs));
    // The first tick fires immediately; the seed already covers it
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let fetch_config = config.clone();
        let fetched = task::spawn_blocking(move || {
            // limit=2 so the second-to-last row is the most recent closed candle
            fetch_klines(
                &fetch_config.api_base_url,
                &fetch_config.symbol,
                &fetch_config.interval,
                2,
            )
        })
        .await;

        let candle = match fetched {
            Ok(Ok(records)) => match records.first() {
                Some(candle) => *candle,
                None => continue,
            },
            Ok(Err(e)) => {
                error!("Poll failed: {}", e);
                continue;
            }
            Err(e) => {
                error!("Poll task failed: {}", e);
                continue;
            }
        };

        let mut predictor = app_state.lock();
        if predictor.history().last().map(|r| r.timestamp) == Some(candle.timestamp) {
            continue;
        }

        match predictor.ingest(candle) {
            Ok(step) => {
                let when = candle
                    .datetime()
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_else(|| candle.timestamp.to_string());
                match step.prediction {
                    Some(p) => info!(
                        "{} close {:.4}: predicted {:.4}, error {:.4}, confidence {:.3}, loss {:?}",
                        when,
                        candle.close,
                        p.predicted,
                        p.loss,
                        p.confidence,
                        step.final_loss()
                    ),
                    None => info!("{} close {:.4}: waiting for history", when, candle.close),
                }
                if let Err(e) = predictor.get_state().save_to_file(&config.model_path) {
                    error!("Failed to save model state: {}", e);
                }
            }
            Err(e) => error!("Online step failed: {}", e),
        }
    }
}
