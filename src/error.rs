// src/error.rs

use thiserror::Error;

/// Errors raised by the predictor and the shell around it.
///
/// Running out of history is not an error: `train` and `predict` return
/// `Ok(None)` for that case.
#[derive(Debug, Error)]
pub enum PredictorError {
    /// A price was normalized before any high price was observed.
    #[error("cannot normalize: scale bound is zero")]
    DivisionByZero,

    /// The feature vector handed to the network has the wrong length.
    #[error("invalid input shape: expected {expected} features, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },

    /// A persisted model state is missing fields or has malformed matrices.
    #[error("invalid model state: {0}")]
    InvalidState(String),

    /// A configuration value is out of range or unparseable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The exchange could not be reached or answered with garbage.
    #[error("fetch error: {0}")]
    Fetch(String),
}

pub type Result<T> = std::result::Result<T, PredictorError>;

impl From<reqwest::Error> for PredictorError {
    fn from(err: reqwest::Error) -> Self {
        PredictorError::Fetch(err.to_string())
    }
}

impl PredictorError {
    /// True for errors caused by the caller's input rather than the environment.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PredictorError::InvalidInputShape { .. }
                | PredictorError::InvalidState(_)
                | PredictorError::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PredictorError::InvalidInputShape {
            expected: 2,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "invalid input shape: expected 2 features, got 3"
        );
        assert_eq!(
            PredictorError::DivisionByZero.to_string(),
            "cannot normalize: scale bound is zero"
        );
    }

    #[test]
    fn test_client_errors() {
        assert!(PredictorError::InvalidState("weights1".into()).is_client_error());
        assert!(PredictorError::InvalidConfig("epochs".into()).is_client_error());
        assert!(!PredictorError::DivisionByZero.is_client_error());
        assert!(!PredictorError::Fetch("timeout".into()).is_client_error());
    }
}
