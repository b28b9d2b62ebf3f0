//! Ground heat exchanger response models for building energy simulation.
//!
//! A [`Borefield`] produces a g-function table, the dimensionless step
//! response of the ground around it. A [`BorefieldInstance`] couples a field
//! to a loop fluid and a ground temperature model, keeps its load history,
//! and turns each step's inlet temperature and mass flow into an outlet
//! temperature and heat transfer rate by temporal superposition.
//!
//! Two geometries are provided: [`VerticalField`] for vertical U-tube
//! boreholes and [`SlinkyField`] for horizontal trenches of slinky coils.

mod clock;
mod error;

pub mod borefield;
pub mod config;
pub mod ground;
pub mod history;
pub mod instance;
pub mod response;
pub mod slinky;
pub mod vertical;

pub use borefield::{Borefield, DesignConditions};
pub use clock::SimClock;
pub use config::GhxConfig;
pub use error::{GhxError, TableError};
pub use ground::{ConstantGroundTemperature, GroundTemperatureModel, KusudaAchenbach};
pub use history::{AggregationConfig, LoadHistory};
pub use instance::{BorefieldInstance, Lifecycle, StepInput, StepOutput};
pub use response::{Fingerprint, GFunctionCurve, GFunctionData, ResponseCache, ResponseTable};
pub use slinky::SlinkyField;
pub use vertical::VerticalField;
