use thiserror::Error;

use crate::math::ShapeError;

/// Fatal failures of the inference core.
///
/// Unusable rows and degenerate protein columns are not errors; they are
/// recorded in [`crate::diagnostics::Diagnostics`] instead.
#[derive(Debug, Error)]
pub enum LassoError {
    #[error("non-finite value {value} in {context}")]
    NonFinite { context: String, value: f64 },

    #[error("negative detectability {value} for peptide '{peptide}' of protein '{protein}'")]
    NegativeDetectability {
        peptide: String,
        protein: String,
        value: f64,
    },

    #[error("lambda must be finite and non-negative, got {0}")]
    InvalidLambda(f64),

    #[error("{what} has length {found}, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("initial coefficient {value} at protein index {index} is outside [0, 1]")]
    InitialCoefficient { index: usize, value: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

pub type Result<T> = std::result::Result<T, LassoError>;

/// Reject NaN and infinities, naming where they came from.
pub(crate) fn ensure_finite(value: f64, context: impl FnOnce() -> String) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LassoError::NonFinite {
            context: context(),
            value,
        })
    }
}
