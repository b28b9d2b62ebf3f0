//! Numerical kernels shared by the geoloop ground heat exchanger models.
//!
//! - [`tdma`] solves tri-diagonal systems with the Thomas algorithm.
//! - [`solve_dense`] solves small dense systems by Gaussian elimination.
//! - [`simpson_samples`] integrates evenly spaced samples with the composite
//!   1/3 rule.
//! - [`interpolation`] wraps `ninterp` for one-dimensional tables.

mod dense;
mod error;
mod simpson;
mod tdma;

pub mod interpolation;

pub use dense::solve_dense;
pub use error::SolveError;
pub use simpson::simpson_samples;
pub use tdma::tdma;
