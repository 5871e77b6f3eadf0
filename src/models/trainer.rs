// src/models/trainer.rs

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::network::{to_features, BackpropMode, Config, NetCore};

/// Loss recorded for a single epoch
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct LossPoint {
    pub epoch: usize,
    pub loss: f64,
}

/// Per-epoch losses of one training call, in epoch order starting at 1.
pub type LossCurve = Vec<LossPoint>;

/// Drives a `NetCore` through a fixed number of gradient-descent epochs on one sample.
pub struct TrainingController;

impl TrainingController {
    /// Runs exactly `config.epochs` epochs; there is no early stopping.
    ///
    /// Each epoch records the squared error of the forward pass before the
    /// update is applied.
    pub fn run(
        net: &mut NetCore,
        features: &[f64],
        label: f64,
        config: &Config,
    ) -> Result<LossCurve> {
        let sample = to_features(features)?;
        let mut curve = Vec::with_capacity(config.epochs);

        for epoch in 1..=config.epochs {
            let (predicted, hidden) = net.forward(&sample)?;
            let loss = (predicted - label).powi(2);
            curve.push(LossPoint { epoch, loss });

            match config.backprop_mode {
                BackpropMode::Simple => net.update_simple(sample, label, predicted, hidden),
                BackpropMode::Verbose => net.update_verbose(sample, label, predicted, hidden),
            }
        }

        if let Some(last) = curve.last() {
            debug!(
                "Trained {} epochs ({:?}), final loss {:.8}",
                config.epochs, config.backprop_mode, last.loss
            );
        }
        Ok(curve)
    }
}
