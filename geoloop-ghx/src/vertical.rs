//! Vertical single U-tube borefields.
//!
//! Long-timestep g-functions come from the finite line source, integrated
//! pairwise between boreholes. Short-timestep g-functions come from a radial
//! model of one representative borehole. The simulation curve joins the two.

mod borehole;
mod line_source;
mod radial;
mod resistance;

use geoloop_thermo::{ThermalProperties, fluid::FluidProperties};
use serde::Serialize;
use tracing::info;
use uom::si::{
    f64::{Length, ThermodynamicTemperature, Time},
    length::meter,
    thermodynamic_temperature::kelvin,
};

use crate::{
    GhxError, TableError,
    borefield::{Borefield, DesignConditions},
    error::ensure_positive,
    ground::GroundTemperatureModel,
    response::{Fingerprint, GFunctionCurve, GFunctionData, ResponseTable},
};

pub use borehole::{Borehole, BoreholeProperties};
pub use line_source::{CalculationMethod, LONG_TIMESTEP_START};
pub use radial::SHORT_TIMESTEP_END;
pub use resistance::{
    Multipole, friction_factor, pipe_conduction_resistance, pipe_convection_resistance,
};

use borehole::Discretization;
use radial::RadialModel;

/// Where a vertical field's g-functions come from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResponseSource {
    /// Computed from the placed boreholes.
    Computed {
        boreholes: Vec<Borehole>,
        method: CalculationMethod,
    },
    /// Supplied as a ln(t/tₛ) table for a field with the given ratio of
    /// borehole radius to length.
    Supplied {
        curve: GFunctionCurve,
        g_ref_ratio: f64,
    },
}

/// A field of vertical boreholes sharing one representative property set.
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalField {
    name: String,
    properties: BoreholeProperties,
    soil: ThermalProperties,
    number_of_boreholes: usize,
    max_sim_years: u32,
    source: ResponseSource,
}

#[derive(Serialize)]
struct FingerprintInput<'a> {
    properties: &'a BoreholeProperties,
    soil: &'a ThermalProperties,
    max_sim_years: u32,
    source: &'a ResponseSource,
    conditions: &'a DesignConditions,
}

impl VerticalField {
    /// Creates a field from individually placed boreholes.
    ///
    /// The field is modeled with the arithmetic mean of the boreholes'
    /// property sets.
    ///
    /// # Errors
    ///
    /// Returns [`GhxError::InvalidConfig`] if `boreholes` is empty, a
    /// borehole fails [`BoreholeProperties::validate`], or `max_sim_years`
    /// is zero.
    pub fn from_boreholes(
        name: impl Into<String>,
        boreholes: Vec<Borehole>,
        soil: ThermalProperties,
        method: CalculationMethod,
        max_sim_years: u32,
    ) -> Result<Self, GhxError> {
        for borehole in &boreholes {
            borehole.properties.validate()?;
        }
        let properties = BoreholeProperties::mean(boreholes.iter().map(|b| &b.properties))
            .ok_or_else(|| GhxError::invalid("boreholes", "at least one borehole is required"))?;
        Self::build(
            name.into(),
            properties,
            soil,
            boreholes.len(),
            max_sim_years,
            ResponseSource::Computed { boreholes, method },
        )
    }

    /// Creates a rectangular array of identical boreholes.
    ///
    /// # Errors
    ///
    /// Returns [`GhxError::InvalidConfig`] if the array is empty, the spacing
    /// is not positive, or the borehole properties are invalid.
    #[allow(clippy::too_many_arguments)]
    pub fn array(
        name: impl Into<String>,
        rows: usize,
        columns: usize,
        spacing: f64,
        properties: BoreholeProperties,
        soil: ThermalProperties,
        method: CalculationMethod,
        max_sim_years: u32,
    ) -> Result<Self, GhxError> {
        ensure_positive("array.spacing", spacing)?;
        Self::from_boreholes(
            name,
            Borehole::grid(columns, rows, spacing, properties),
            soil,
            method,
            max_sim_years,
        )
    }

    /// Creates a field whose g-function table is supplied rather than
    /// computed.
    ///
    /// # Errors
    ///
    /// Returns [`GhxError::InvalidConfig`] if there are no boreholes or the
    /// reference ratio is not positive, and [`GhxError::Table`] if the
    /// curve cannot back a table.
    pub fn from_response_factors(
        name: impl Into<String>,
        properties: BoreholeProperties,
        number_of_boreholes: usize,
        g_ref_ratio: f64,
        curve: GFunctionCurve,
        soil: ThermalProperties,
        max_sim_years: u32,
    ) -> Result<Self, GhxError> {
        properties.validate()?;
        ensure_positive("response_factors.g_ref_ratio", g_ref_ratio)?;
        curve.validate()?;
        Self::build(
            name.into(),
            properties,
            soil,
            number_of_boreholes,
            max_sim_years,
            ResponseSource::Supplied { curve, g_ref_ratio },
        )
    }

    fn build(
        name: String,
        properties: BoreholeProperties,
        soil: ThermalProperties,
        number_of_boreholes: usize,
        max_sim_years: u32,
        source: ResponseSource,
    ) -> Result<Self, GhxError> {
        if number_of_boreholes == 0 {
            return Err(GhxError::invalid(
                "number_of_boreholes",
                "at least one borehole is required",
            ));
        }
        if max_sim_years == 0 {
            return Err(GhxError::invalid("max_sim_years", "must be at least one"));
        }
        Ok(Self {
            name,
            properties,
            soil,
            number_of_boreholes,
            max_sim_years,
            source,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The representative borehole the field is modeled with.
    #[must_use]
    pub fn properties(&self) -> &BoreholeProperties {
        &self.properties
    }

    #[must_use]
    pub fn soil(&self) -> &ThermalProperties {
        &self.soil
    }

    #[must_use]
    pub fn number_of_boreholes(&self) -> usize {
        self.number_of_boreholes
    }

    #[must_use]
    pub fn source(&self) -> &ResponseSource {
        &self.source
    }

    /// tₛ = L²/9α [s].
    #[must_use]
    pub fn time_scale(&self) -> f64 {
        self.properties.length.powi(2) / (9.0 * self.soil.diffusivity())
    }

    /// Ratio of borehole radius to length the table was produced for.
    #[must_use]
    pub fn g_ref_ratio(&self) -> f64 {
        match self.source {
            ResponseSource::Supplied { g_ref_ratio, .. } => g_ref_ratio,
            ResponseSource::Computed { .. } => self.radius_ratio(),
        }
    }

    fn radius_ratio(&self) -> f64 {
        self.properties.radius() / self.properties.length
    }

    fn multipole(&self) -> Multipole {
        Multipole::new(&self.properties, self.soil.conductivity())
    }

    /// Pipe conduction plus convection resistance for the field flow split
    /// evenly over all boreholes [K·m/W].
    fn pipe_resistance(&self, fluid: &FluidProperties, mass_flow_rate: f64) -> f64 {
        pipe_conduction_resistance(&self.properties.pipe)
            + pipe_convection_resistance(
                &self.properties.pipe,
                fluid,
                mass_flow_rate / self.number_of_boreholes as f64,
            )
    }

    /// Fluid to borehole wall resistance at `mass_flow_rate` [K·m/W].
    #[must_use]
    pub fn borehole_resistance(&self, fluid: &FluidProperties, mass_flow_rate: f64) -> f64 {
        self.multipole()
            .average_resistance(self.pipe_resistance(fluid, mass_flow_rate))
    }

    fn short_timestep_curve(
        &self,
        conditions: &DesignConditions,
    ) -> Result<GFunctionCurve, GhxError> {
        let fluid = &conditions.fluid;
        let model = RadialModel {
            borehole_radius: self.properties.radius(),
            pipe: self.properties.pipe,
            grout: self.properties.grout,
            soil: self.soil,
            fluid_heat_capacity: fluid.density_si() * fluid.specific_heat_si(),
            borehole_resistance: self.borehole_resistance(fluid, conditions.mass_flow_rate),
            convection_resistance: pipe_convection_resistance(
                &self.properties.pipe,
                fluid,
                conditions.mass_flow_rate / self.number_of_boreholes as f64,
            ),
            time_scale: self.time_scale(),
        };
        Ok(model.curve()?)
    }
}

/// Every short-timestep point followed by the long-timestep points past it.
fn join(short: &GFunctionCurve, long: &GFunctionCurve) -> GFunctionCurve {
    let handover = short.log_time.last().copied().unwrap_or(f64::NEG_INFINITY);
    let mut table = short.clone();
    for (lntts, g) in long.points().filter(|&(lntts, _)| lntts > handover) {
        table.push(lntts, g);
    }
    table
}

impl Borefield for VerticalField {
    fn total_tube_length(&self) -> f64 {
        self.number_of_boreholes as f64 * self.properties.length
    }

    fn soil_conductivity(&self) -> f64 {
        self.soil.conductivity()
    }

    fn time_scale_hours(&self) -> f64 {
        self.time_scale() / 3600.0
    }

    fn max_sim_years(&self) -> u32 {
        self.max_sim_years
    }

    fn uses_cache(&self) -> bool {
        matches!(self.source, ResponseSource::Computed { .. })
    }

    fn fingerprint(&self, conditions: &DesignConditions) -> Result<Fingerprint, GhxError> {
        Fingerprint::of(&FingerprintInput {
            properties: &self.properties,
            soil: &self.soil,
            max_sim_years: self.max_sim_years,
            source: &self.source,
            conditions,
        })
        .map_err(GhxError::Fingerprint)
    }

    fn compute_g_functions(
        &self,
        conditions: &DesignConditions,
    ) -> Result<GFunctionData, GhxError> {
        let (boreholes, method) = match &self.source {
            ResponseSource::Supplied { curve, .. } => {
                return Ok(GFunctionData::single(curve.clone()));
            }
            ResponseSource::Computed { boreholes, method } => (boreholes, *method),
        };

        info!(
            field = %self.name,
            boreholes = boreholes.len(),
            ?method,
            "computing vertical g-functions"
        );

        let discretized: Vec<Discretization> = boreholes.iter().map(Discretization::new).collect();
        let long_timestep = line_source::long_timestep_curve(
            &discretized,
            self.soil.diffusivity(),
            self.time_scale(),
            self.max_sim_years,
            method,
        )?;
        let short_timestep = self.short_timestep_curve(conditions)?;
        let table = join(&short_timestep, &long_timestep);

        info!(
            field = %self.name,
            points = table.len(),
            "finished vertical g-functions"
        );

        Ok(GFunctionData {
            table,
            short_timestep,
            long_timestep,
        })
    }

    fn g_function(&self, table: &ResponseTable, scaled_time: f64) -> Result<f64, TableError> {
        let g = table.interpolate(scaled_time.ln())?;
        let ratio = self.radius_ratio();
        let reference = self.g_ref_ratio();
        if (ratio / reference - 1.0).abs() > 1e-12 {
            Ok(g - (ratio / reference).ln())
        } else {
            Ok(g)
        }
    }

    fn hx_resistance(&self, fluid: &FluidProperties, mass_flow_rate: f64) -> f64 {
        if mass_flow_rate <= 0.0 {
            return 0.0;
        }
        let rp = self.pipe_resistance(fluid, mass_flow_rate);
        let multipole = self.multipole();
        let capacity_length = self.properties.length / (mass_flow_rate * fluid.specific_heat_si());
        multipole.average_resistance(rp)
            + capacity_length.powi(2) / (3.0 * multipole.total_internal_resistance(rp))
    }

    fn ground_temperature(
        &self,
        model: &dyn GroundTemperatureModel,
        time: Time,
    ) -> ThermodynamicTemperature {
        let top = self.properties.top_depth;
        let length = self.properties.length;
        let sum: f64 = [0.0, 1.0, 0.25, 0.5, 0.75]
            .iter()
            .map(|fraction| {
                model
                    .temperature(Length::new::<meter>(top + fraction * length), time)
                    .get::<kelvin>()
            })
            .sum();
        ThermodynamicTemperature::new::<kelvin>(sum / 5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use geoloop_thermo::{
        PipeProperties,
        fluid::{LoopFluid, Water},
    };
    use uom::si::{thermodynamic_temperature::degree_celsius, time::second};

    use crate::ground::ConstantGroundTemperature;

    fn glhepro_properties() -> Result<BoreholeProperties, GhxError> {
        Ok(BoreholeProperties {
            top_depth: 1.0,
            length: 100.0,
            diameter: 0.109982,
            u_tube_distance: 0.04556,
            grout: ThermalProperties::new(0.744, 3.9e6)?,
            pipe: PipeProperties::new(ThermalProperties::new(0.389, 1.77e6)?, 0.0267, 0.00243)?,
        })
    }

    fn soil() -> Result<ThermalProperties, GhxError> {
        Ok(ThermalProperties::new(2.423, 2.343e6)?)
    }

    fn design_conditions() -> Result<DesignConditions, GhxError> {
        let fluid = Water::new()?.properties(ThermodynamicTemperature::new::<degree_celsius>(20.0))?;
        Ok(DesignConditions {
            mass_flow_rate: 0.00075708 * 998.21,
            fluid,
        })
    }

    fn square(method: CalculationMethod) -> Result<VerticalField, GhxError> {
        let props = glhepro_properties()?;
        let boreholes = [(0.0, 0.0), (5.0, 0.0), (0.0, 5.0), (5.0, 5.0)]
            .into_iter()
            .enumerate()
            .map(|(i, (x, y))| Borehole {
                name: format!("BH {}", i + 1),
                x,
                y,
                properties: props,
            })
            .collect();
        VerticalField::from_boreholes("square", boreholes, soil()?, method, 1)
    }

    #[test]
    fn joined_curve_keeps_short_points_then_later_long_points() {
        let short = GFunctionCurve::from_pairs([(-10.0, 1.0), (-9.0, 1.5), (-8.6, 2.0)]);
        let long = GFunctionCurve::from_pairs([(-9.5, 1.4), (-8.5, 2.1), (-8.0, 2.4)]);
        let joined = join(&short, &long);
        assert_eq!(joined.log_time, vec![-10.0, -9.0, -8.6, -8.5, -8.0]);
        assert_eq!(joined.value, vec![1.0, 1.5, 2.0, 2.1, 2.4]);
    }

    #[test]
    fn array_lays_out_boreholes_and_totals_length() -> Result<(), GhxError> {
        let field = VerticalField::array(
            "array",
            2,
            3,
            6.0,
            glhepro_properties()?,
            soil()?,
            CalculationMethod::UniformHeatFlux,
            10,
        )?;
        assert_eq!(field.number_of_boreholes(), 6);
        assert_relative_eq!(field.total_tube_length(), 600.0);
        assert_relative_eq!(field.time_scale_hours(), field.time_scale() / 3600.0);
        Ok(())
    }

    #[test]
    fn empty_field_is_rejected() -> Result<(), GhxError> {
        let result = VerticalField::from_boreholes(
            "empty",
            Vec::new(),
            soil()?,
            CalculationMethod::UniformHeatFlux,
            1,
        );
        assert!(matches!(
            result,
            Err(GhxError::InvalidConfig {
                field: "boreholes",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn supplied_table_is_corrected_for_radius_ratio() -> Result<(), GhxError> {
        let props = glhepro_properties()?;
        let curve = GFunctionCurve::from_pairs([(-10.0, 1.0), (0.0, 6.0)]);
        let field = VerticalField::from_response_factors(
            "supplied",
            props,
            4,
            0.0005,
            curve.clone(),
            soil()?,
            1,
        )?;
        assert!(!field.uses_cache());

        let data = field.compute_g_functions(&design_conditions()?)?;
        assert_eq!(data.table, curve);

        let table = ResponseTable::new(data.table)?;
        let g = field.g_function(&table, (-5.0_f64).exp())?;
        let correction = (props.radius() / (props.length * 0.0005)).ln();
        assert_relative_eq!(g, 3.5 - correction, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn uniform_heat_flux_pair_end_to_end() -> Result<(), GhxError> {
        let props = glhepro_properties()?;
        let field = VerticalField::array(
            "pair",
            1,
            2,
            5.0,
            props,
            soil()?,
            CalculationMethod::UniformHeatFlux,
            1,
        )?;
        let data = field.compute_g_functions(&design_conditions()?)?;

        assert!(!data.long_timestep.is_empty());
        for curve in [&data.short_timestep, &data.long_timestep] {
            for pair in curve.value.windows(2) {
                assert!(pair[1] > pair[0], "g-function decreased: {pair:?}");
            }
        }
        assert_eq!(
            data.table.len(),
            data.short_timestep.len() + data.long_timestep.len()
        );

        // A computed table is produced at the field's own radius ratio.
        let ratio = props.radius() / props.length;
        assert_relative_eq!(field.g_ref_ratio(), ratio);
        let table = ResponseTable::new(data.table.clone())?;
        let lntts = -5.0_f64;
        let g = field.g_function(&table, lntts.exp())?;
        assert_relative_eq!(g, table.interpolate(lntts)?);

        // The same table supplied for a different ratio is shifted by ln of
        // the ratio of ratios.
        let supplied = VerticalField::from_response_factors(
            "pair",
            props,
            2,
            2.0 * ratio,
            data.table,
            soil()?,
            1,
        )?;
        let shifted = supplied.g_function(&table, lntts.exp())?;
        assert_relative_eq!(shifted, g + 2.0_f64.ln(), epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn hx_resistance_vanishes_without_flow() -> Result<(), GhxError> {
        let field = square(CalculationMethod::UniformHeatFlux)?;
        let fluid = design_conditions()?.fluid;
        assert_relative_eq!(field.hx_resistance(&fluid, 0.0), 0.0);
        let flowing = field.hx_resistance(&fluid, 0.75);
        assert!(flowing > field.borehole_resistance(&fluid, 0.75));
        Ok(())
    }

    #[test]
    fn ground_temperature_averages_five_depths() -> Result<(), GhxError> {
        struct Linear;
        impl GroundTemperatureModel for Linear {
            fn temperature(&self, depth: Length, _time: Time) -> ThermodynamicTemperature {
                ThermodynamicTemperature::new::<degree_celsius>(10.0 + 0.1 * depth.get::<meter>())
            }
        }
        let field = square(CalculationMethod::UniformHeatFlux)?;
        let t = field.ground_temperature(&Linear, Time::new::<second>(0.0));
        assert_relative_eq!(t.get::<degree_celsius>(), 10.0 + 0.1 * 51.0, epsilon = 1e-9);

        let constant = ConstantGroundTemperature(ThermodynamicTemperature::new::<degree_celsius>(13.0));
        let t = field.ground_temperature(&constant, Time::new::<second>(0.0));
        assert_relative_eq!(t.get::<degree_celsius>(), 13.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn fingerprint_tracks_design_conditions() -> Result<(), GhxError> {
        let field = square(CalculationMethod::UniformHeatFlux)?;
        let conditions = design_conditions()?;
        let mut faster = conditions;
        faster.mass_flow_rate *= 2.0;
        assert_eq!(field.fingerprint(&conditions)?, field.fingerprint(&conditions)?);
        assert_ne!(field.fingerprint(&conditions)?, field.fingerprint(&faster)?);

        let other = square(CalculationMethod::UniformBoreholeWallTemperature)?;
        assert_ne!(field.fingerprint(&conditions)?, other.fingerprint(&conditions)?);
        Ok(())
    }

    #[test]
    fn uniform_wall_temperature_matches_glhepro() -> Result<(), GhxError> {
        let field = square(CalculationMethod::UniformBoreholeWallTemperature)?;
        let data = field.compute_g_functions(&design_conditions()?)?;

        let (last_short, _) = data.short_timestep.points().last().unwrap_or_default();
        assert!(last_short >= SHORT_TIMESTEP_END);
        assert_eq!(
            data.table.len(),
            data.short_timestep.len() + data.long_timestep.len()
        );

        let table = ResponseTable::new(data.table)?;
        let reference = [
            (-11.939864, 0.37),
            (-11.802269, 0.48),
            (-11.664675, 0.59),
            (-11.52708, 0.69),
            (-11.389486, 0.79),
            (-11.251891, 0.89),
            (-11.114296, 0.99),
            (-10.976702, 1.09),
            (-10.839107, 1.18),
            (-10.701513, 1.27),
            (-10.563918, 1.36),
            (-10.426324, 1.44),
            (-10.288729, 1.53),
            (-10.151135, 1.61),
            (-10.01354, 1.69),
            (-9.875946, 1.77),
            (-9.738351, 1.85),
            (-9.600756, 1.93),
            (-9.463162, 2.00),
            (-9.325567, 2.08),
            (-9.187973, 2.15),
            (-9.050378, 2.23),
            (-8.912784, 2.30),
            (-8.775189, 2.37),
            (-8.637595, 2.45),
            (-8.5, 2.53),
            (-7.8, 2.90),
            (-7.2, 3.17),
            (-6.5, 3.52),
            (-5.9, 3.85),
            (-5.2, 4.37),
            (-4.5, 5.11),
            (-3.963, 5.82),
        ];
        for (lntts, expected) in reference {
            let lntts: f64 = lntts;
            let g = field.g_function(&table, lntts.exp())?;
            assert_relative_eq!(g, expected, epsilon = 0.1);
        }
        Ok(())
    }
}
