//! The contract shared by every borefield geometry.

use geoloop_thermo::fluid::FluidProperties;
use serde::Serialize;
use uom::si::f64::{ThermodynamicTemperature, Time};

use crate::{
    GhxError, TableError,
    ground::GroundTemperatureModel,
    response::{Fingerprint, GFunctionData, ResponseTable},
};

/// Flow conditions a borefield's g-functions are computed for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DesignConditions {
    /// Design mass flow rate through the whole field [kg/s].
    pub mass_flow_rate: f64,
    /// Loop fluid properties at the temperature of the first step.
    pub fluid: FluidProperties,
}

/// A ground heat exchanger geometry able to produce and evaluate g-functions.
///
/// Load aggregation and the step solution in
/// [`BorefieldInstance`](crate::BorefieldInstance) only ever see a field
/// through this trait.
pub trait Borefield {
    /// Total length of active tube, the length loads are normalized by [m].
    fn total_tube_length(&self) -> f64;

    /// Soil conductivity [W/m·K].
    fn soil_conductivity(&self) -> f64;

    /// Hours per unit of the field's dimensionless time.
    ///
    /// Elapsed hours are divided by this value before a g-function lookup.
    fn time_scale_hours(&self) -> f64;

    /// Simulation horizon the g-functions must cover [years].
    fn max_sim_years(&self) -> u32;

    /// Whether computed g-functions may be read from and written to a
    /// [`ResponseCache`](crate::ResponseCache).
    ///
    /// Fields built from a supplied table have nothing worth caching.
    fn uses_cache(&self) -> bool {
        true
    }

    /// Identity of everything [`Borefield::compute_g_functions`] depends on.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    fn fingerprint(&self, conditions: &DesignConditions) -> Result<Fingerprint, GhxError>;

    /// Computes the g-function curves for this field.
    ///
    /// # Errors
    ///
    /// Returns an error if a numerical kernel fails.
    fn compute_g_functions(&self, conditions: &DesignConditions)
    -> Result<GFunctionData, GhxError>;

    /// Evaluates the g-function at `scaled_time`, the elapsed time divided by
    /// [`Borefield::time_scale_hours`].
    ///
    /// # Errors
    ///
    /// Returns an error if the table lookup fails.
    fn g_function(&self, table: &ResponseTable, scaled_time: f64) -> Result<f64, TableError>;

    /// Thermal resistance between the loop fluid and the borehole wall or
    /// coil surface [K·m/W].
    fn hx_resistance(&self, fluid: &FluidProperties, mass_flow_rate: f64) -> f64;

    /// Undisturbed ground temperature seen by the field at `time`.
    fn ground_temperature(
        &self,
        model: &dyn GroundTemperatureModel,
        time: Time,
    ) -> ThermodynamicTemperature;
}

impl<B: Borefield + ?Sized> Borefield for Box<B> {
    fn total_tube_length(&self) -> f64 {
        (**self).total_tube_length()
    }

    fn soil_conductivity(&self) -> f64 {
        (**self).soil_conductivity()
    }

    fn time_scale_hours(&self) -> f64 {
        (**self).time_scale_hours()
    }

    fn max_sim_years(&self) -> u32 {
        (**self).max_sim_years()
    }

    fn uses_cache(&self) -> bool {
        (**self).uses_cache()
    }

    fn fingerprint(&self, conditions: &DesignConditions) -> Result<Fingerprint, GhxError> {
        (**self).fingerprint(conditions)
    }

    fn compute_g_functions(
        &self,
        conditions: &DesignConditions,
    ) -> Result<GFunctionData, GhxError> {
        (**self).compute_g_functions(conditions)
    }

    fn g_function(&self, table: &ResponseTable, scaled_time: f64) -> Result<f64, TableError> {
        (**self).g_function(table, scaled_time)
    }

    fn hx_resistance(&self, fluid: &FluidProperties, mass_flow_rate: f64) -> f64 {
        (**self).hx_resistance(fluid, mass_flow_rate)
    }

    fn ground_temperature(
        &self,
        model: &dyn GroundTemperatureModel,
        time: Time,
    ) -> ThermodynamicTemperature {
        (**self).ground_temperature(model, time)
    }
}
