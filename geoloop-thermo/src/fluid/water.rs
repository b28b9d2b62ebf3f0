use std::fmt;

use geoloop_solve::interpolation::{Extrapolate, Interp1D};
use uom::si::{
    dynamic_viscosity::pascal_second,
    f64::{
        DynamicViscosity, MassDensity, SpecificHeatCapacity, ThermalConductivity,
        ThermodynamicTemperature,
    },
    mass_density::kilogram_per_cubic_meter,
    specific_heat_capacity::joule_per_kilogram_kelvin,
    thermal_conductivity::watt_per_meter_kelvin,
    thermodynamic_temperature::degree_celsius,
};

use crate::PropertyError;

use super::LoopFluid;

/// Saturated liquid water properties at 0–100 °C in 5–10 K steps.
const TEMPERATURE_C: [f64; 15] = [
    0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0,
];
const DENSITY: [f64; 15] = [
    999.84, 999.97, 999.70, 999.10, 998.21, 997.05, 995.65, 994.03, 992.22, 988.04, 983.20,
    977.76, 971.79, 965.31, 958.35,
];
const SPECIFIC_HEAT: [f64; 15] = [
    4219.9, 4205.0, 4195.5, 4188.5, 4184.0, 4181.3, 4179.8, 4179.1, 4179.0, 4180.6, 4184.4,
    4189.9, 4196.6, 4205.2, 4215.9,
];
const CONDUCTIVITY: [f64; 15] = [
    0.5610, 0.5705, 0.5800, 0.5893, 0.5984, 0.6072, 0.6155, 0.6233, 0.6306, 0.6436, 0.6544,
    0.6631, 0.6700, 0.6753, 0.6791,
];
const VISCOSITY: [f64; 15] = [
    0.001792, 0.001518, 0.001306, 0.001138, 0.001002, 0.000890, 0.000797, 0.000719, 0.000653,
    0.000547, 0.000466, 0.000404, 0.000354, 0.000315, 0.000282,
];

/// Liquid water with tabulated, temperature-dependent properties.
///
/// Properties are linearly interpolated in temperature.
/// Outside the tabulated 0–100 °C range the nearest endpoint is used.
pub struct Water {
    density: Interp1D,
    specific_heat: Interp1D,
    conductivity: Interp1D,
    viscosity: Interp1D,
}

impl Water {
    /// Builds the property tables.
    ///
    /// # Errors
    ///
    /// Returns a [`PropertyError`] if a table fails validation.
    pub fn new() -> Result<Self, PropertyError> {
        let table = |values: &[f64; 15]| {
            Interp1D::linear(TEMPERATURE_C.to_vec(), values.to_vec(), Extrapolate::Clamp)
        };
        Ok(Self {
            density: table(&DENSITY)?,
            specific_heat: table(&SPECIFIC_HEAT)?,
            conductivity: table(&CONDUCTIVITY)?,
            viscosity: table(&VISCOSITY)?,
        })
    }
}

impl fmt::Debug for Water {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Water").finish_non_exhaustive()
    }
}

fn celsius(temperature: ThermodynamicTemperature) -> Result<f64, PropertyError> {
    let t = temperature.get::<degree_celsius>();
    if t.is_finite() {
        Ok(t)
    } else {
        Err(PropertyError::InvalidInput(format!(
            "water temperature must be finite, got {t} °C"
        )))
    }
}

impl LoopFluid for Water {
    fn name(&self) -> &str {
        "water"
    }

    fn density(
        &self,
        temperature: ThermodynamicTemperature,
    ) -> Result<MassDensity, PropertyError> {
        let value = self.density.eval(celsius(temperature)?)?;
        Ok(MassDensity::new::<kilogram_per_cubic_meter>(value))
    }

    fn specific_heat(
        &self,
        temperature: ThermodynamicTemperature,
    ) -> Result<SpecificHeatCapacity, PropertyError> {
        let value = self.specific_heat.eval(celsius(temperature)?)?;
        Ok(SpecificHeatCapacity::new::<joule_per_kilogram_kelvin>(value))
    }

    fn conductivity(
        &self,
        temperature: ThermodynamicTemperature,
    ) -> Result<ThermalConductivity, PropertyError> {
        let value = self.conductivity.eval(celsius(temperature)?)?;
        Ok(ThermalConductivity::new::<watt_per_meter_kelvin>(value))
    }

    fn viscosity(
        &self,
        temperature: ThermodynamicTemperature,
    ) -> Result<DynamicViscosity, PropertyError> {
        let value = self.viscosity.eval(celsius(temperature)?)?;
        Ok(DynamicViscosity::new::<pascal_second>(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn at(celsius: f64) -> ThermodynamicTemperature {
        ThermodynamicTemperature::new::<degree_celsius>(celsius)
    }

    #[test]
    fn tabulated_points() -> Result<(), PropertyError> {
        let water = Water::new()?;
        let props = water.properties(at(20.0))?;
        assert_relative_eq!(props.density_si(), 998.21, epsilon = 1e-9);
        assert_relative_eq!(props.specific_heat_si(), 4184.0, epsilon = 1e-9);
        assert_relative_eq!(props.conductivity_si(), 0.5984, epsilon = 1e-12);
        assert_relative_eq!(props.viscosity_si(), 0.001002, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn interpolates_between_points() -> Result<(), PropertyError> {
        let water = Water::new()?;
        let props = water.properties(at(45.0))?;
        assert_relative_eq!(props.density_si(), 990.13, epsilon = 1e-9);
        assert_relative_eq!(props.viscosity_si(), 0.0006, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn clamps_outside_table() -> Result<(), PropertyError> {
        let water = Water::new()?;
        let cold = water.properties(at(-5.0))?;
        let hot = water.properties(at(120.0))?;
        assert_relative_eq!(cold.density_si(), 999.84, epsilon = 1e-9);
        assert_relative_eq!(hot.conductivity_si(), 0.6791, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn prandtl_number() -> Result<(), PropertyError> {
        let water = Water::new()?;
        let props = water.properties(at(5.0))?;
        assert_relative_eq!(props.prandtl(), 4205.0 * 0.001518 / 0.5705, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn non_finite_temperature_is_rejected() -> Result<(), PropertyError> {
        let water = Water::new()?;
        assert!(water.density(at(f64::NAN)).is_err());
        Ok(())
    }
}
