// src/models/scaler.rs

use crate::error::{PredictorError, Result};

/// Maps raw prices into the unit interval using the largest high seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Scaler {
    bound: f64,
}

impl Scaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a scaler from a persisted bound.
    pub fn with_bound(bound: f64) -> Self {
        Scaler { bound }
    }

    pub fn bound(&self) -> f64 {
        self.bound
    }

    /// Raises the bound to `high` if it exceeds the current one. Never lowers it.
    pub fn update_bound(&mut self, high: f64) {
        if high > self.bound {
            self.bound = high;
        }
    }

    /// Divides `price` by the bound; fails until a non-zero bound is known.
    pub fn normalize(&self, price: f64) -> Result<f64> {
        if self.bound == 0.0 {
            return Err(PredictorError::DivisionByZero);
        }
        Ok(price / self.bound)
    }

    /// Multiplies `value` by the bound. A zero bound yields zero.
    pub fn denormalize(&self, value: f64) -> f64 {
        value * self.bound
    }
}
