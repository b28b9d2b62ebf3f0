use std::path::PathBuf;

use geoloop_solve::{SolveError, interpolation::InterpError};
use geoloop_thermo::PropertyError;
use thiserror::Error;

/// Errors raised while building or querying a g-function table.
#[derive(Debug, Error)]
pub enum TableError {
    /// Fewer than two points were supplied.
    #[error("a g-function table needs at least two points, got {0}")]
    TooShort(usize),

    /// The time and value sequences differ in length.
    #[error("table has {times} time points but {values} values")]
    LengthMismatch { times: usize, values: usize },

    /// The time axis is not strictly increasing or holds non-finite values.
    #[error("table time axis is not strictly increasing at index {index}")]
    NotIncreasing { index: usize },

    /// The underlying interpolator failed.
    #[error(transparent)]
    Interpolation(#[from] InterpError),
}

/// Errors raised by the ground heat exchanger models.
#[derive(Debug, Error)]
pub enum GhxError {
    /// A configuration value violates a model invariant.
    #[error("invalid configuration for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// A property object could not be built or evaluated.
    #[error(transparent)]
    Property(#[from] PropertyError),

    /// A linear solve or quadrature failed.
    #[error("numerical failure: {0}")]
    Solve(#[from] SolveError),

    /// A g-function table is malformed.
    #[error(transparent)]
    Table(#[from] TableError),

    /// A configuration document could not be read.
    #[error("failed to read configuration from {path}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration document is not valid JSON for the expected schema.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A configuration could not be serialized for fingerprinting.
    #[error("failed to fingerprint borefield configuration: {0}")]
    Fingerprint(#[source] serde_json::Error),

    /// One-time initialization failed on an earlier step.
    #[error("borefield `{0}` failed to initialize on an earlier step")]
    Failed(String),
}

impl GhxError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Checks that `value` is finite and strictly positive.
pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<f64, GhxError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GhxError::invalid(
            field,
            format!("must be finite and positive, got {value}"),
        ))
    }
}

/// Checks that `value` is finite and not negative.
pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<f64, GhxError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(GhxError::invalid(
            field,
            format!("must be finite and non-negative, got {value}"),
        ))
    }
}
