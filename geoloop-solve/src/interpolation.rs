//! One-dimensional linear interpolation over tabulated data.
//!
//! Wraps [`ninterp`] so that callers choose an [`Extrapolate`] strategy
//! without depending on `ninterp` directly.

mod error;
mod extrapolate;

use ndarray::Array1;
use ninterp::{
    prelude::{Interp1DOwned, Interpolator},
    strategy::enums::Strategy1DEnum,
};

pub use error::InterpError;
pub use extrapolate::Extrapolate;

/// Linear interpolator over a strictly increasing grid.
pub struct Interp1D(Interp1DOwned<f64, Strategy1DEnum>);

impl Interp1D {
    /// Creates a linear interpolator from grid points `x` and values `f_x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the grid and values differ in length, or if the
    /// grid is not sorted.
    pub fn linear<T: Into<Array1<f64>>>(
        x: T,
        f_x: T,
        extrapolate: Extrapolate,
    ) -> Result<Self, InterpError> {
        Ok(Self(Interp1DOwned::new(
            x.into(),
            f_x.into(),
            ninterp::strategy::Linear.into(),
            extrapolate.into(),
        )?))
    }

    /// Evaluates the interpolant at `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if `ninterp` rejects the lookup.
    pub fn eval(&self, x: f64) -> Result<f64, InterpError> {
        self.0.interpolate(&[x]).map_err(Into::into)
    }
}
