use serde::Serialize;
use thiserror::Error;

/// Why typed numeric input was not accepted as is.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NumericError {
    #[error("Not a number")]
    NotANumber,
    #[error("Too little (minimum {minimum})")]
    BelowMinimum { minimum: f64 },
    #[error("Too big (maximum {maximum})")]
    AboveMaximum { maximum: f64 },
    #[error("Not right rounded (step {step})")]
    OffStep { step: f64 },
}
