use std::fmt;

use geoloop_solve::interpolation::{Extrapolate, Interp1D};
use serde::{Deserialize, Serialize};

use crate::TableError;

/// Paired log-time and dimensionless response values.
///
/// The time coordinate is whatever logarithmic axis the producing model
/// uses: natural log of t/tₛ for vertical fields, base-10 log of hours for
/// slinky fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GFunctionCurve {
    pub log_time: Vec<f64>,
    pub value: Vec<f64>,
}

impl GFunctionCurve {
    #[must_use]
    pub fn new(log_time: Vec<f64>, value: Vec<f64>) -> Self {
        Self { log_time, value }
    }

    /// Builds a curve from `(log_time, value)` pairs.
    pub fn from_pairs<I: IntoIterator<Item = (f64, f64)>>(pairs: I) -> Self {
        let (log_time, value) = pairs.into_iter().unzip();
        Self { log_time, value }
    }

    pub fn push(&mut self, log_time: f64, value: f64) {
        self.log_time.push(log_time);
        self.value.push(value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.log_time.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log_time.is_empty()
    }

    /// Iterates over `(log_time, value)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.log_time.iter().copied().zip(self.value.iter().copied())
    }

    /// Checks that the curve can back a [`ResponseTable`].
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if the curve has fewer than two points, the
    /// sequences differ in length, or the time axis is not strictly
    /// increasing and finite.
    pub fn validate(&self) -> Result<(), TableError> {
        if self.log_time.len() != self.value.len() {
            return Err(TableError::LengthMismatch {
                times: self.log_time.len(),
                values: self.value.len(),
            });
        }
        if self.len() < 2 {
            return Err(TableError::TooShort(self.len()));
        }
        if let Some(index) = self
            .log_time
            .iter()
            .position(|x| !x.is_finite())
            .or_else(|| {
                self.log_time
                    .windows(2)
                    .position(|pair| pair[1] <= pair[0])
                    .map(|i| i + 1)
            })
        {
            return Err(TableError::NotIncreasing { index });
        }
        Ok(())
    }
}

/// All g-function curves produced for one borefield configuration.
///
/// `table` is the curve used for simulation.
/// For vertical fields it joins the short-timestep and long-timestep segments.
/// Slinky fields and user-supplied tables leave `short_timestep` empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GFunctionData {
    pub table: GFunctionCurve,
    pub short_timestep: GFunctionCurve,
    pub long_timestep: GFunctionCurve,
}

impl GFunctionData {
    /// Wraps a single curve that needs no short/long split.
    #[must_use]
    pub fn single(curve: GFunctionCurve) -> Self {
        Self {
            table: curve.clone(),
            short_timestep: GFunctionCurve::default(),
            long_timestep: curve,
        }
    }
}

/// Read-only, interpolating g-function table.
///
/// Lookups interpolate linearly between bracketing points and extrapolate
/// linearly from the nearest edge segment outside the tabulated domain.
pub struct ResponseTable {
    curve: GFunctionCurve,
    interp: Interp1D,
}

impl ResponseTable {
    /// Creates a table from a validated curve.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if `curve` fails [`GFunctionCurve::validate`].
    pub fn new(curve: GFunctionCurve) -> Result<Self, TableError> {
        curve.validate()?;
        let interp = Interp1D::linear(
            curve.log_time.clone(),
            curve.value.clone(),
            Extrapolate::Enable,
        )?;
        Ok(Self { curve, interp })
    }

    /// Returns the g-function value at `log_time`.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if interpolation fails, which only happens
    /// for a non-finite `log_time`.
    pub fn interpolate(&self, log_time: f64) -> Result<f64, TableError> {
        Ok(self.interp.eval(log_time)?)
    }

    #[must_use]
    pub fn curve(&self) -> &GFunctionCurve {
        &self.curve
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.curve.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.curve.is_empty()
    }
}

impl fmt::Debug for ResponseTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseTable")
            .field("curve", &self.curve)
            .finish_non_exhaustive()
    }
}
