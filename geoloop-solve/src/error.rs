use thiserror::Error;

/// Errors that can occur in the numerical kernels.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SolveError {
    /// The system has no unknowns.
    #[error("system is empty")]
    Empty,

    /// Coefficient sequences do not share the same length.
    #[error("expected {expected} coefficients, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    /// Forward elimination produced a pivot that is zero within tolerance.
    ///
    /// Indicates an invalid physical configuration rather than a transient
    /// condition, so callers should not retry.
    #[error("zero pivot encountered at row {row}")]
    ZeroPivot { row: usize },

    /// No usable pivot exists in a column of a dense system.
    #[error("matrix is singular at column {column}")]
    Singular { column: usize },
}
