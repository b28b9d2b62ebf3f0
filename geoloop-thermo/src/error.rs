use geoloop_solve::interpolation::InterpError;
use thiserror::Error;

/// Errors that may occur when constructing or evaluating properties.
#[derive(Debug, Error)]
pub enum PropertyError {
    /// The input values are invalid or inconsistent.
    ///
    /// Indicates that the inputs are physically invalid or outside the model's valid domain.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The calculation failed due to a numerical or internal error.
    #[error("calculation error: {0}")]
    Calculation(String),

    /// A tabulated property could not be interpolated.
    #[error(transparent)]
    Interpolation(#[from] InterpError),
}
