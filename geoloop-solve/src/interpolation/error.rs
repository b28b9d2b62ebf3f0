use ninterp::error::{InterpolateError, ValidateError};
use thiserror::Error;

/// Errors from a tabulated g-function or fluid property.
#[derive(Error, Debug)]
pub enum InterpError {
    /// The table was rejected when built, such as an abscissa that is not
    /// strictly increasing or a value count that does not match it.
    #[error("invalid table: {0}")]
    Table(#[from] ValidateError),

    /// A lookup into a built table failed.
    #[error("table lookup failed: {0}")]
    Lookup(#[from] InterpolateError),
}
