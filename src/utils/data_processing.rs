// src/utils/data_processing.rs

use log::debug;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::error::{PredictorError, Result};
use crate::models::OhlcvRecord;

// Function to fetch klines from a Binance-compatible REST endpoint
pub fn fetch_klines(
    base_url: &str,
    symbol: &str,
    interval: &str,
    limit: usize,
) -> Result<Vec<OhlcvRecord>> {
    let url = format!(
        "{}/api/v3/klines?symbol={}&interval={}&limit={}",
        base_url.trim_end_matches('/'),
        symbol,
        interval,
        limit
    );
    debug!("Fetching klines from {}", url);

    let client = Client::new();
    let response = client.get(&url).send()?.error_for_status()?;
    let response_text = response.text()?;

    parse_klines(&response_text)
}

/// Parses the exchange's array-of-arrays kline payload:
/// `[openTime, "open", "high", "low", "close", "volume", ...]`.
///
/// Numbers may arrive as JSON numbers or numeric strings. Missing or
/// unparseable fields become zero.
pub fn parse_klines(body: &str) -> Result<Vec<OhlcvRecord>> {
    let value: Value = serde_json::from_str(body)?;
    let rows = value.as_array().ok_or_else(|| {
        PredictorError::Fetch(format!("expected a JSON array of klines, got: {}", truncate(body)))
    })?;

    let records = rows
        .iter()
        .map(|row| {
            let field = |idx: usize| row.get(idx).map(as_f64).unwrap_or(0.0);
            OhlcvRecord {
                timestamp: row.get(0).and_then(as_i64).unwrap_or(0),
                open: field(1),
                high: field(2),
                low: field(3),
                close: field(4),
                volume: field(5),
            }
        })
        .collect();

    Ok(records)
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(120) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

// Function to calculate MSE and MAE
pub fn calculate_metrics(predictions: &[f64], targets: &[f64]) -> (f64, f64) {
    let n = predictions.len().min(targets.len());
    if n == 0 {
        return (0.0, 0.0);
    }

    let mse = predictions
        .iter()
        .zip(targets)
        .map(|(pred, target)| (pred - target).powi(2))
        .sum::<f64>()
        / n as f64;

    let mae = predictions
        .iter()
        .zip(targets)
        .map(|(pred, target)| (pred - target).abs())
        .sum::<f64>()
        / n as f64;

    (mse, mae)
}
