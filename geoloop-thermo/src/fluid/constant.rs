use uom::si::f64::{
    DynamicViscosity, MassDensity, SpecificHeatCapacity, ThermalConductivity,
    ThermodynamicTemperature,
};

use crate::PropertyError;

use super::LoopFluid;

/// User-defined fluid with temperature-independent properties.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPropertyFluid {
    /// Name for identification in log messages.
    pub name: String,
    pub density: MassDensity,
    pub specific_heat: SpecificHeatCapacity,
    pub conductivity: ThermalConductivity,
    pub viscosity: DynamicViscosity,
}

impl LoopFluid for ConstantPropertyFluid {
    fn name(&self) -> &str {
        &self.name
    }

    fn density(&self, _: ThermodynamicTemperature) -> Result<MassDensity, PropertyError> {
        Ok(self.density)
    }

    fn specific_heat(
        &self,
        _: ThermodynamicTemperature,
    ) -> Result<SpecificHeatCapacity, PropertyError> {
        Ok(self.specific_heat)
    }

    fn conductivity(
        &self,
        _: ThermodynamicTemperature,
    ) -> Result<ThermalConductivity, PropertyError> {
        Ok(self.conductivity)
    }

    fn viscosity(&self, _: ThermodynamicTemperature) -> Result<DynamicViscosity, PropertyError> {
        Ok(self.viscosity)
    }
}
