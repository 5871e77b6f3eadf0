// src/models/network.rs

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PredictorError, Result};

/// Number of input features (the two most recent closes)
pub const INPUT_SIZE: usize = 2;
/// Number of hidden units
pub const HIDDEN_SIZE: usize = 2;

const SEED_BASE: f64 = 1337.0;

/// Which update rule `NetCore` applies after each forward pass.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackpropMode {
    /// Approximate rule: no output sigmoid slope, hidden updates read the
    /// already-updated output weights.
    #[default]
    Simple,
    /// Chain-rule update through the hidden sigmoid, using pre-update output weights.
    Verbose,
}

/// Training hyperparameters. Fixed for the lifetime of a `NetCore`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub learning_rate: f64,
    pub epochs: usize,
    pub backprop_mode: BackpropMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            learning_rate: 0.1,
            epochs: 1000,
            backprop_mode: BackpropMode::Simple,
        }
    }
}

impl Config {
    pub fn new(learning_rate: f64, epochs: usize, backprop_mode: BackpropMode) -> Self {
        Config {
            learning_rate,
            epochs,
            backprop_mode,
        }
    }

    /// Checks the ranges an embedding caller must enforce before building a network.
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(PredictorError::InvalidConfig(format!(
                "learning rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(1..=10_000).contains(&self.epochs) {
            return Err(PredictorError::InvalidConfig(format!(
                "epochs must be in [1, 10000], got {}",
                self.epochs
            )));
        }
        Ok(())
    }
}

/// Hidden-layer (2x2) and output-layer (1x2) weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub hidden: [[f64; INPUT_SIZE]; HIDDEN_SIZE],
    pub output: [[f64; HIDDEN_SIZE]; 1],
}

impl Weights {
    /// Reproducible initialization: element (i, j) of an r x c matrix is the
    /// fractional part of `sin(1337 + i + j*r) * 10000`.
    pub fn seeded() -> Self {
        Weights {
            hidden: seeded_matrix::<HIDDEN_SIZE, INPUT_SIZE>(),
            output: seeded_matrix::<1, HIDDEN_SIZE>(),
        }
    }
}

fn seeded_matrix<const R: usize, const C: usize>() -> [[f64; C]; R] {
    let mut matrix = [[0.0; C]; R];
    for (i, row) in matrix.iter_mut().enumerate() {
        for (j, weight) in row.iter_mut().enumerate() {
            let seed = SEED_BASE + i as f64 + (j * R) as f64;
            let raw = seed.sin() * 10_000.0;
            *weight = raw - raw.floor();
        }
    }
    matrix
}

impl BackpropMode {
    /// Applies one update step and returns the new weights.
    pub fn apply(
        self,
        features: [f64; INPUT_SIZE],
        label: f64,
        predicted: f64,
        hidden: [f64; HIDDEN_SIZE],
        weights: Weights,
        lr: f64,
    ) -> Weights {
        let mut next = weights;
        let d_loss = 2.0 * (predicted - label);

        for i in 0..HIDDEN_SIZE {
            next.output[0][i] -= lr * d_loss * hidden[i];
        }

        match self {
            BackpropMode::Simple => {
                // Reads next.output, which already holds the updated values.
                for i in 0..HIDDEN_SIZE {
                    for j in 0..INPUT_SIZE {
                        next.hidden[i][j] -= lr * d_loss * next.output[0][i] * features[j];
                    }
                }
            }
            BackpropMode::Verbose => {
                for i in 0..HIDDEN_SIZE {
                    let slope = hidden[i] * (1.0 - hidden[i]);
                    for j in 0..INPUT_SIZE {
                        let grad = d_loss * weights.output[0][i] * slope * features[j];
                        next.hidden[i][j] -= lr * grad;
                    }
                }
            }
        }

        next
    }
}

/// Serializable snapshot of the trained model: both matrices plus the scale bound.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelState {
    pub weights1: Vec<Vec<f64>>,
    pub weights2: Vec<Vec<f64>>,
    #[serde(rename = "maxScale")]
    pub max_scale: f64,
}

impl ModelState {
    /// Checks shapes and the bound, returning the typed weights on success.
    pub fn validate(&self) -> Result<(Weights, f64)> {
        let hidden = to_matrix::<HIDDEN_SIZE, INPUT_SIZE>(&self.weights1, "weights1")?;
        let output = to_matrix::<1, HIDDEN_SIZE>(&self.weights2, "weights2")?;
        if !self.max_scale.is_finite() || self.max_scale < 0.0 {
            return Err(PredictorError::InvalidState(format!(
                "maxScale must be finite and non-negative, got {}",
                self.max_scale
            )));
        }
        Ok((Weights { hidden, output }, self.max_scale))
    }

    /// Parses a state from JSON. Any missing or mistyped field is an invalid state.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PredictorError::InvalidState(e.to_string()))
    }

    /// Saves the state to a file in JSON format.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Loads and validates a state from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let state = Self::from_json(&data)?;
        state.validate()?;
        Ok(state)
    }
}

fn to_matrix<const R: usize, const C: usize>(
    rows: &[Vec<f64>],
    name: &str,
) -> Result<[[f64; C]; R]> {
    if rows.len() != R || rows.iter().any(|row| row.len() != C) {
        return Err(PredictorError::InvalidState(format!(
            "{} must be a {}x{} matrix",
            name, R, C
        )));
    }
    let mut matrix = [[0.0; C]; R];
    for (dst, src) in matrix.iter_mut().zip(rows) {
        dst.copy_from_slice(src);
    }
    Ok(matrix)
}

/// Fixed 2-2-1 feed-forward network with sigmoid activations.
#[derive(Debug, Clone)]
pub struct NetCore {
    config: Config,
    weights: Weights,
}

impl NetCore {
    /// Creates a network with deterministic initial weights.
    pub fn new(config: Config) -> Self {
        NetCore {
            config,
            weights: Weights::seeded(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Runs one forward pass, returning the output and both hidden activations.
    pub fn forward(&self, features: &[f64]) -> Result<(f64, [f64; HIDDEN_SIZE])> {
        let features = to_features(features)?;
        let mut hidden = [0.0; HIDDEN_SIZE];
        for (h, row) in hidden.iter_mut().zip(self.weights.hidden.iter()) {
            let z: f64 = row.iter().zip(features.iter()).map(|(w, x)| w * x).sum();
            *h = sigmoid(z);
        }
        let z: f64 = self.weights.output[0]
            .iter()
            .zip(hidden.iter())
            .map(|(w, h)| w * h)
            .sum();
        Ok((sigmoid(z), hidden))
    }

    /// Approximate update; see `BackpropMode::Simple`.
    pub fn update_simple(
        &mut self,
        features: [f64; INPUT_SIZE],
        label: f64,
        predicted: f64,
        hidden: [f64; HIDDEN_SIZE],
    ) {
        self.weights = BackpropMode::Simple.apply(
            features,
            label,
            predicted,
            hidden,
            self.weights,
            self.config.learning_rate,
        );
    }

    /// Chain-rule update; see `BackpropMode::Verbose`.
    pub fn update_verbose(
        &mut self,
        features: [f64; INPUT_SIZE],
        label: f64,
        predicted: f64,
        hidden: [f64; HIDDEN_SIZE],
    ) {
        self.weights = BackpropMode::Verbose.apply(
            features,
            label,
            predicted,
            hidden,
            self.weights,
            self.config.learning_rate,
        );
    }

    /// Copies both matrices and the given scale bound into a snapshot.
    pub fn export_state(&self, max_scale: f64) -> ModelState {
        ModelState {
            weights1: self.weights.hidden.iter().map(|row| row.to_vec()).collect(),
            weights2: self.weights.output.iter().map(|row| row.to_vec()).collect(),
            max_scale,
        }
    }

    /// Replaces both matrices from a snapshot and returns its scale bound.
    /// Nothing changes if the snapshot is malformed.
    pub fn import_state(&mut self, state: &ModelState) -> Result<f64> {
        let (weights, max_scale) = state.validate()?;
        self.weights = weights;
        debug!("Imported weights {:?}, max scale {}", self.weights, max_scale);
        Ok(max_scale)
    }
}

pub(crate) fn to_features(features: &[f64]) -> Result<[f64; INPUT_SIZE]> {
    features
        .try_into()
        .map_err(|_| PredictorError::InvalidInputShape {
            expected: INPUT_SIZE,
            actual: features.len(),
        })
}

/// Sigmoid activation function
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
