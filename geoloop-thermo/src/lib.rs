//! Thermophysical properties and loop fluids for ground heat exchanger models.

mod error;
mod properties;

pub mod fluid;

pub use error::PropertyError;
pub use properties::{PipeProperties, ThermalProperties};
