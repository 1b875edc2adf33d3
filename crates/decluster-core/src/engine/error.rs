use crate::core::models::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Input validation failed: {source}")]
    Input {
        #[from]
        source: ModelError,
    },

    #[error("Decoy set too small: {found} decoys, at least {required} required")]
    TooFewDecoys { found: usize, required: usize },

    #[error("Derived threshold {0} is not a positive finite number")]
    InvalidThreshold(f64),
}
