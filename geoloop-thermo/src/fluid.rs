mod constant;
mod water;

pub use constant::ConstantPropertyFluid;
pub use water::Water;

use serde::{Deserialize, Serialize};
use uom::si::{
    dynamic_viscosity::pascal_second,
    f64::{
        DynamicViscosity, MassDensity, SpecificHeatCapacity, ThermalConductivity,
        ThermodynamicTemperature,
    },
    mass_density::kilogram_per_cubic_meter,
    specific_heat_capacity::joule_per_kilogram_kelvin,
    thermal_conductivity::watt_per_meter_kelvin,
};

use crate::PropertyError;

/// A heat transfer fluid circulating through a ground loop.
///
/// Implementations provide the temperature-dependent properties needed for
/// convection and capacity calculations.
/// All getters are evaluated at a single bulk fluid temperature.
pub trait LoopFluid {
    /// Display name used in log messages.
    fn name(&self) -> &str;

    /// Returns the density at `temperature`.
    ///
    /// # Errors
    ///
    /// Returns a [`PropertyError`] if the property cannot be evaluated.
    fn density(&self, temperature: ThermodynamicTemperature)
    -> Result<MassDensity, PropertyError>;

    /// Returns the specific heat capacity at `temperature`.
    ///
    /// # Errors
    ///
    /// Returns a [`PropertyError`] if the property cannot be evaluated.
    fn specific_heat(
        &self,
        temperature: ThermodynamicTemperature,
    ) -> Result<SpecificHeatCapacity, PropertyError>;

    /// Returns the thermal conductivity at `temperature`.
    ///
    /// # Errors
    ///
    /// Returns a [`PropertyError`] if the property cannot be evaluated.
    fn conductivity(
        &self,
        temperature: ThermodynamicTemperature,
    ) -> Result<ThermalConductivity, PropertyError>;

    /// Returns the dynamic viscosity at `temperature`.
    ///
    /// # Errors
    ///
    /// Returns a [`PropertyError`] if the property cannot be evaluated.
    fn viscosity(
        &self,
        temperature: ThermodynamicTemperature,
    ) -> Result<DynamicViscosity, PropertyError>;

    /// Evaluates every property at `temperature`.
    ///
    /// # Errors
    ///
    /// Returns the first [`PropertyError`] encountered.
    fn properties(
        &self,
        temperature: ThermodynamicTemperature,
    ) -> Result<FluidProperties, PropertyError> {
        Ok(FluidProperties {
            density: self.density(temperature)?,
            specific_heat: self.specific_heat(temperature)?,
            conductivity: self.conductivity(temperature)?,
            viscosity: self.viscosity(temperature)?,
        })
    }
}

/// A snapshot of fluid properties at one temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluidProperties {
    pub density: MassDensity,
    pub specific_heat: SpecificHeatCapacity,
    pub conductivity: ThermalConductivity,
    pub viscosity: DynamicViscosity,
}

impl FluidProperties {
    /// Density [kg/m³].
    #[must_use]
    pub fn density_si(&self) -> f64 {
        self.density.get::<kilogram_per_cubic_meter>()
    }

    /// Specific heat [J/kg·K].
    #[must_use]
    pub fn specific_heat_si(&self) -> f64 {
        self.specific_heat.get::<joule_per_kilogram_kelvin>()
    }

    /// Thermal conductivity [W/m·K].
    #[must_use]
    pub fn conductivity_si(&self) -> f64 {
        self.conductivity.get::<watt_per_meter_kelvin>()
    }

    /// Dynamic viscosity [Pa·s].
    #[must_use]
    pub fn viscosity_si(&self) -> f64 {
        self.viscosity.get::<pascal_second>()
    }

    /// Prandtl number, cp·μ/k.
    #[must_use]
    pub fn prandtl(&self) -> f64 {
        self.specific_heat_si() * self.viscosity_si() / self.conductivity_si()
    }
}
