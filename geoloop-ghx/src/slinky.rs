//! Horizontal trench fields of slinky coils.

mod geometry;
mod resistance;
mod response;

use geoloop_thermo::{PipeProperties, ThermalProperties, fluid::FluidProperties};
use serde::Serialize;
use tracing::info;
use uom::si::{
    f64::{Length, ThermodynamicTemperature, Time},
    length::meter,
};

use crate::{
    GhxError, TableError,
    borefield::{Borefield, DesignConditions},
    ground::GroundTemperatureModel,
    response::{Fingerprint, GFunctionData, ResponseTable},
};

pub use geometry::{CoilOrientation, SlinkyGeometry};
pub use resistance::coil_resistance;
pub use response::LOG_HOURS_START;

use response::RingField;

/// A slinky ground heat exchanger.
///
/// G-functions are tabulated against log10 of elapsed hours, so the field's
/// time scale is one hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlinkyField {
    name: String,
    geometry: SlinkyGeometry,
    soil: ThermalProperties,
    pipe: PipeProperties,
    max_sim_years: u32,
}

impl SlinkyField {
    /// Creates a slinky field.
    ///
    /// # Errors
    ///
    /// Returns [`GhxError::InvalidConfig`] if the geometry fails
    /// [`SlinkyGeometry::validate`], the pipe does not fit inside the coil,
    /// or `max_sim_years` is zero.
    pub fn new(
        name: impl Into<String>,
        geometry: SlinkyGeometry,
        soil: ThermalProperties,
        pipe: PipeProperties,
        max_sim_years: u32,
    ) -> Result<Self, GhxError> {
        geometry.validate()?;
        if pipe.outer_diameter() >= geometry.coil_diameter {
            return Err(GhxError::invalid(
                "slinky.pipe.outer_diameter",
                format!(
                    "pipe diameter {} m does not fit a {} m coil",
                    pipe.outer_diameter(),
                    geometry.coil_diameter
                ),
            ));
        }
        if max_sim_years == 0 {
            return Err(GhxError::invalid("max_sim_years", "must be at least one"));
        }
        Ok(Self {
            name: name.into(),
            geometry,
            soil,
            pipe,
            max_sim_years,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn geometry(&self) -> &SlinkyGeometry {
        &self.geometry
    }

    #[must_use]
    pub fn soil(&self) -> &ThermalProperties {
        &self.soil
    }

    #[must_use]
    pub fn pipe(&self) -> &PipeProperties {
        &self.pipe
    }

    fn rings(&self) -> RingField {
        RingField::new(
            &self.geometry,
            self.pipe.outer_radius(),
            self.soil.diffusivity(),
        )
    }
}

impl Borefield for SlinkyField {
    fn total_tube_length(&self) -> f64 {
        self.geometry.total_tube_length()
    }

    fn soil_conductivity(&self) -> f64 {
        self.soil.conductivity()
    }

    fn time_scale_hours(&self) -> f64 {
        1.0
    }

    fn max_sim_years(&self) -> u32 {
        self.max_sim_years
    }

    fn fingerprint(&self, _conditions: &DesignConditions) -> Result<Fingerprint, GhxError> {
        #[derive(Serialize)]
        struct Input<'a> {
            geometry: &'a SlinkyGeometry,
            soil: &'a ThermalProperties,
            pipe_outer_radius: f64,
            max_sim_years: u32,
        }

        Fingerprint::of(&Input {
            geometry: &self.geometry,
            soil: &self.soil,
            pipe_outer_radius: self.pipe.outer_radius(),
            max_sim_years: self.max_sim_years,
        })
        .map_err(GhxError::Fingerprint)
    }

    fn compute_g_functions(
        &self,
        _conditions: &DesignConditions,
    ) -> Result<GFunctionData, GhxError> {
        info!(
            field = %self.name,
            trenches = self.geometry.number_of_trenches,
            coils = self.geometry.number_of_coils(),
            orientation = ?self.geometry.orientation,
            "computing slinky g-functions"
        );
        let curve = self.rings().curve(self.max_sim_years);
        info!(field = %self.name, points = curve.len(), "finished slinky g-functions");
        Ok(GFunctionData::single(curve))
    }

    fn g_function(&self, table: &ResponseTable, scaled_time: f64) -> Result<f64, TableError> {
        table.interpolate(scaled_time.log10())
    }

    fn hx_resistance(&self, fluid: &FluidProperties, mass_flow_rate: f64) -> f64 {
        coil_resistance(
            &self.pipe,
            fluid,
            mass_flow_rate / self.geometry.number_of_trenches as f64,
        )
    }

    fn ground_temperature(
        &self,
        model: &dyn GroundTemperatureModel,
        time: Time,
    ) -> ThermodynamicTemperature {
        model.temperature(Length::new::<meter>(self.geometry.coil_depth()), time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use geoloop_thermo::fluid::{LoopFluid, Water};
    use uom::si::{thermodynamic_temperature::degree_celsius, time::second};

    use crate::ground::KusudaAchenbach;

    fn small_field() -> Result<SlinkyField, GhxError> {
        let geometry = SlinkyGeometry {
            orientation: CoilOrientation::Horizontal,
            coil_diameter: 0.8,
            coil_pitch: 0.4,
            trench_depth: 1.5,
            trench_length: 2.0,
            number_of_trenches: 1,
            trench_spacing: 3.0,
        };
        SlinkyField::new(
            "small",
            geometry,
            ThermalProperties::new(0.6, 2.0e6)?,
            PipeProperties::new(ThermalProperties::new(0.4, 1.5e6)?, 0.034, 0.003)?,
            1,
        )
    }

    fn conditions() -> Result<DesignConditions, GhxError> {
        Ok(DesignConditions {
            mass_flow_rate: 0.2,
            fluid: Water::new()?.properties(ThermodynamicTemperature::new::<degree_celsius>(20.0))?,
        })
    }

    #[test]
    fn table_uses_log_hours() -> Result<(), GhxError> {
        let field = small_field()?;
        let data = field.compute_g_functions(&conditions()?)?;
        assert!(data.short_timestep.is_empty());
        assert_relative_eq!(data.table.log_time[0], LOG_HOURS_START);

        let (log_hours, expected) = data.table.points().nth(8).unwrap_or_default();
        let table = ResponseTable::new(data.table)?;
        let g = field.g_function(&table, 10_f64.powf(log_hours))?;
        assert_relative_eq!(g, expected, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn resistance_splits_flow_over_trenches() -> Result<(), GhxError> {
        let field = small_field()?;
        let fluid = conditions()?.fluid;
        let two_trenches = SlinkyField::new(
            "two",
            SlinkyGeometry {
                number_of_trenches: 2,
                ..*field.geometry()
            },
            *field.soil(),
            *field.pipe(),
            1,
        )?;
        assert_relative_eq!(
            two_trenches.hx_resistance(&fluid, 0.2),
            field.hx_resistance(&fluid, 0.1),
            epsilon = 1e-12
        );
        Ok(())
    }

    #[test]
    fn ground_temperature_at_coil_depth() -> Result<(), GhxError> {
        let field = small_field()?;
        let model = KusudaAchenbach::new(12.0, 8.0, 30.0, 3.0e-7)?;
        let time = Time::new::<second>(100.0 * 86_400.0);
        let expected = model.temperature(Length::new::<meter>(1.5), time);
        assert_relative_eq!(
            field.ground_temperature(&model, time).get::<degree_celsius>(),
            expected.get::<degree_celsius>(),
            epsilon = 1e-12
        );
        Ok(())
    }

    #[test]
    fn fingerprint_ignores_name_and_flow() -> Result<(), GhxError> {
        let field = small_field()?;
        let renamed = SlinkyField::new(
            "renamed",
            *field.geometry(),
            *field.soil(),
            *field.pipe(),
            1,
        )?;
        let mut faster = conditions()?;
        faster.mass_flow_rate *= 3.0;
        assert_eq!(
            field.fingerprint(&conditions()?)?,
            renamed.fingerprint(&faster)?
        );

        let longer = SlinkyField::new("longer", *field.geometry(), *field.soil(), *field.pipe(), 2)?;
        assert_ne!(
            field.fingerprint(&conditions()?)?,
            longer.fingerprint(&conditions()?)?
        );
        Ok(())
    }
}
