//! JSON configuration documents and their conversion into domain objects.
//!
//! Documents mirror the pre-validated input records a host would supply.
//! Every conversion checks the model invariants, so a document that parses
//! can still be rejected with [`GhxError::InvalidConfig`] or
//! [`GhxError::Property`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use geoloop_thermo::{PipeProperties, ThermalProperties, fluid::LoopFluid};
use serde::Deserialize;
use uom::si::{
    f64::{ThermodynamicTemperature, VolumeRate},
    thermodynamic_temperature::degree_celsius,
    volume_rate::cubic_meter_per_second,
};

use crate::{
    GhxError,
    borefield::Borefield,
    ground::{ConstantGroundTemperature, GroundTemperatureModel, KusudaAchenbach},
    history::AggregationConfig,
    instance::BorefieldInstance,
    response::{GFunctionCurve, ResponseCache},
    slinky::{CoilOrientation, SlinkyField, SlinkyGeometry},
    vertical::{Borehole, BoreholeProperties, CalculationMethod, VerticalField},
};

/// A complete ground heat exchanger description.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GhxConfig {
    pub name: String,
    /// Design volume flow through the whole field [m³/s].
    pub design_flow_rate: f64,
    pub max_sim_years: u32,
    /// File computed g-functions are cached in.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    pub ground_temperature: GroundTemperatureConfig,
    pub borefield: BorefieldConfig,
}

impl GhxConfig {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`GhxError::ConfigParse`] if the document does not match the
    /// schema.
    pub fn from_json_str(json: &str) -> Result<Self, GhxError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON document from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GhxError::ConfigIo`] if the file cannot be read and
    /// [`GhxError::ConfigParse`] if it does not match the schema.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GhxError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| GhxError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Builds the configured borefield.
    ///
    /// # Errors
    ///
    /// Returns an error if a geometry or property invariant is violated.
    pub fn borefield(&self) -> Result<Box<dyn Borefield>, GhxError> {
        Ok(match &self.borefield {
            BorefieldConfig::Vertical(vertical) => {
                Box::new(vertical.field(&self.name, self.max_sim_years)?)
            }
            BorefieldConfig::Slinky(slinky) => Box::new(SlinkyField::new(
                self.name.clone(),
                SlinkyGeometry::try_from(slinky)?,
                ThermalProperties::try_from(&slinky.soil)?,
                PipeProperties::try_from(&slinky.pipe)?,
                self.max_sim_years,
            )?),
        })
    }

    /// Builds a ready-to-step instance circulating `fluid`.
    ///
    /// # Errors
    ///
    /// Returns an error if any part of the configuration is invalid.
    pub fn instance(
        &self,
        fluid: Box<dyn LoopFluid>,
    ) -> Result<BorefieldInstance<Box<dyn Borefield>>, GhxError> {
        let instance = BorefieldInstance::new(
            self.name.clone(),
            self.borefield()?,
            fluid,
            self.ground_temperature.model()?,
            VolumeRate::new::<cubic_meter_per_second>(self.design_flow_rate),
            self.aggregation,
        )?;
        Ok(match &self.cache_path {
            Some(path) => instance.with_cache(ResponseCache::new(path)),
            None => instance,
        })
    }
}

/// Undisturbed ground temperature model.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum GroundTemperatureConfig {
    Constant {
        /// [°C]
        temperature: f64,
    },
    KusudaAchenbach {
        /// Mean annual surface temperature [°C].
        average: f64,
        /// Annual surface temperature amplitude [K].
        amplitude: f64,
        /// Day of year of the minimum surface temperature.
        phase_shift_days: f64,
        /// Soil diffusivity the surface wave is damped with [m²/s].
        depth_diffusivity: f64,
    },
}

impl GroundTemperatureConfig {
    /// Builds the configured model.
    ///
    /// # Errors
    ///
    /// Returns [`GhxError::InvalidConfig`] for non-finite inputs or a
    /// non-positive diffusivity.
    pub fn model(&self) -> Result<Box<dyn GroundTemperatureModel>, GhxError> {
        Ok(match *self {
            Self::Constant { temperature } => {
                if !temperature.is_finite() {
                    return Err(GhxError::invalid(
                        "ground_temperature.temperature",
                        format!("must be finite, got {temperature}"),
                    ));
                }
                Box::new(ConstantGroundTemperature(
                    ThermodynamicTemperature::new::<degree_celsius>(temperature),
                ))
            }
            Self::KusudaAchenbach {
                average,
                amplitude,
                phase_shift_days,
                depth_diffusivity,
            } => Box::new(KusudaAchenbach::new(
                average,
                amplitude,
                phase_shift_days,
                depth_diffusivity,
            )?),
        })
    }
}

/// Borefield geometry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum BorefieldConfig {
    Vertical(VerticalConfig),
    Slinky(SlinkyConfig),
}

/// Material given by conductivity [W/m·K] and volumetric heat capacity
/// [J/m³·K].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumetricMaterial {
    pub conductivity: f64,
    pub heat_capacity: f64,
}

impl TryFrom<&VolumetricMaterial> for ThermalProperties {
    type Error = GhxError;

    fn try_from(material: &VolumetricMaterial) -> Result<Self, Self::Error> {
        Ok(Self::new(material.conductivity, material.heat_capacity)?)
    }
}

/// Material given by conductivity [W/m·K], density [kg/m³] and specific heat
/// [J/kg·K].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DensityMaterial {
    pub conductivity: f64,
    pub density: f64,
    pub specific_heat: f64,
}

impl TryFrom<&DensityMaterial> for ThermalProperties {
    type Error = GhxError;

    fn try_from(material: &DensityMaterial) -> Result<Self, Self::Error> {
        Ok(Self::from_density(
            material.conductivity,
            material.density,
            material.specific_heat,
        )?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerticalPipeConfig {
    pub conductivity: f64,
    pub heat_capacity: f64,
    pub outer_diameter: f64,
    pub thickness: f64,
}

impl TryFrom<&VerticalPipeConfig> for PipeProperties {
    type Error = GhxError;

    fn try_from(pipe: &VerticalPipeConfig) -> Result<Self, Self::Error> {
        let wall = ThermalProperties::new(pipe.conductivity, pipe.heat_capacity)?;
        Ok(Self::new(wall, pipe.outer_diameter, pipe.thickness)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlinkyPipeConfig {
    pub conductivity: f64,
    pub density: f64,
    pub specific_heat: f64,
    pub outer_diameter: f64,
    pub thickness: f64,
}

impl TryFrom<&SlinkyPipeConfig> for PipeProperties {
    type Error = GhxError;

    fn try_from(pipe: &SlinkyPipeConfig) -> Result<Self, Self::Error> {
        let wall =
            ThermalProperties::from_density(pipe.conductivity, pipe.density, pipe.specific_heat)?;
        Ok(Self::new(wall, pipe.outer_diameter, pipe.thickness)?)
    }
}

/// Geometry and materials of one single U-tube borehole.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoreholePropertiesConfig {
    pub top_depth: f64,
    pub length: f64,
    pub diameter: f64,
    pub u_tube_distance: f64,
    pub grout: VolumetricMaterial,
    pub pipe: VerticalPipeConfig,
}

impl TryFrom<&BoreholePropertiesConfig> for BoreholeProperties {
    type Error = GhxError;

    fn try_from(config: &BoreholePropertiesConfig) -> Result<Self, Self::Error> {
        let properties = Self {
            top_depth: config.top_depth,
            length: config.length,
            diameter: config.diameter,
            u_tube_distance: config.u_tube_distance,
            grout: ThermalProperties::try_from(&config.grout)?,
            pipe: PipeProperties::try_from(&config.pipe)?,
        };
        properties.validate()?;
        Ok(properties)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoreholeConfig {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub properties: BoreholePropertiesConfig,
}

/// How the boreholes of a vertical field are described.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum VerticalLayout {
    /// A rectangular grid of identical boreholes.
    Array {
        rows: usize,
        columns: usize,
        spacing: f64,
        properties: BoreholePropertiesConfig,
    },
    /// Individually placed boreholes.
    Boreholes(Vec<BoreholeConfig>),
    /// A precomputed ln(t/tₛ) g-function table.
    ResponseFactors {
        properties: BoreholePropertiesConfig,
        number_of_boreholes: usize,
        g_ref_ratio: f64,
        g_functions: Vec<(f64, f64)>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerticalConfig {
    pub soil: VolumetricMaterial,
    #[serde(default)]
    pub method: CalculationMethod,
    pub layout: VerticalLayout,
}

impl VerticalConfig {
    fn field(&self, name: &str, max_sim_years: u32) -> Result<VerticalField, GhxError> {
        let soil = ThermalProperties::try_from(&self.soil)?;
        match &self.layout {
            VerticalLayout::Array {
                rows,
                columns,
                spacing,
                properties,
            } => VerticalField::array(
                name,
                *rows,
                *columns,
                *spacing,
                BoreholeProperties::try_from(properties)?,
                soil,
                self.method,
                max_sim_years,
            ),
            VerticalLayout::Boreholes(configs) => {
                let boreholes = configs
                    .iter()
                    .map(|config| {
                        Ok(Borehole {
                            name: config.name.clone(),
                            x: config.x,
                            y: config.y,
                            properties: BoreholeProperties::try_from(&config.properties)?,
                        })
                    })
                    .collect::<Result<Vec<_>, GhxError>>()?;
                VerticalField::from_boreholes(name, boreholes, soil, self.method, max_sim_years)
            }
            VerticalLayout::ResponseFactors {
                properties,
                number_of_boreholes,
                g_ref_ratio,
                g_functions,
            } => VerticalField::from_response_factors(
                name,
                BoreholeProperties::try_from(properties)?,
                *number_of_boreholes,
                *g_ref_ratio,
                GFunctionCurve::from_pairs(g_functions.iter().copied()),
                soil,
                max_sim_years,
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlinkyConfig {
    pub soil: DensityMaterial,
    pub pipe: SlinkyPipeConfig,
    pub orientation: CoilOrientation,
    pub coil_diameter: f64,
    pub coil_pitch: f64,
    pub trench_depth: f64,
    pub trench_length: f64,
    pub number_of_trenches: usize,
    pub trench_spacing: f64,
}

impl TryFrom<&SlinkyConfig> for SlinkyGeometry {
    type Error = GhxError;

    fn try_from(config: &SlinkyConfig) -> Result<Self, Self::Error> {
        let geometry = Self {
            orientation: config.orientation,
            coil_diameter: config.coil_diameter,
            coil_pitch: config.coil_pitch,
            trench_depth: config.trench_depth,
            trench_length: config.trench_length,
            number_of_trenches: config.number_of_trenches,
            trench_spacing: config.trench_spacing,
        };
        geometry.validate()?;
        Ok(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::f64::consts::PI;

    use approx::assert_relative_eq;
    use geoloop_thermo::fluid::Water;
    use uom::si::{f64::MassRate, mass_rate::kilogram_per_second};

    use crate::{SimClock, instance::StepInput};

    const BOREHOLE: &str = r#"{
        "top_depth": 1.0,
        "length": 100.0,
        "diameter": 0.15,
        "u_tube_distance": 0.05,
        "grout": { "conductivity": 1.0, "heat_capacity": 3.9e6 },
        "pipe": {
            "conductivity": 0.4,
            "heat_capacity": 1.5e6,
            "outer_diameter": 0.032,
            "thickness": 0.003
        }
    }"#;

    fn vertical(layout: &str) -> String {
        format!(
            r#"{{
                "name": "field",
                "design_flow_rate": 0.0005,
                "max_sim_years": 2,
                "ground_temperature": {{ "constant": {{ "temperature": 12.0 }} }},
                "borefield": {{
                    "vertical": {{
                        "soil": {{ "conductivity": 2.0, "heat_capacity": 2.0e6 }},
                        "layout": {layout}
                    }}
                }}
            }}"#
        )
    }

    fn slinky(orientation: &str, trench_depth: f64) -> String {
        format!(
            r#"{{
                "name": "slinky",
                "design_flow_rate": 0.0003,
                "max_sim_years": 10,
                "ground_temperature": {{
                    "kusuda_achenbach": {{
                        "average": 12.0,
                        "amplitude": 8.0,
                        "phase_shift_days": 30.0,
                        "depth_diffusivity": 3.0e-7
                    }}
                }},
                "borefield": {{
                    "slinky": {{
                        "soil": {{ "conductivity": 0.6, "density": 1500.0, "specific_heat": 1333.0 }},
                        "pipe": {{
                            "conductivity": 0.4,
                            "density": 950.0,
                            "specific_heat": 1900.0,
                            "outer_diameter": 0.034,
                            "thickness": 0.003
                        }},
                        "orientation": "{orientation}",
                        "coil_diameter": 0.8,
                        "coil_pitch": 0.4,
                        "trench_depth": {trench_depth},
                        "trench_length": 40.0,
                        "number_of_trenches": 2,
                        "trench_spacing": 3.0
                    }}
                }}
            }}"#
        )
    }

    #[test]
    fn array_layout() -> Result<(), GhxError> {
        let json = vertical(&format!(
            r#"{{ "array": {{ "rows": 2, "columns": 3, "spacing": 6.0, "properties": {BOREHOLE} }} }}"#
        ));
        let config = GhxConfig::from_json_str(&json)?;
        assert_eq!(config.aggregation, AggregationConfig::default());
        assert_eq!(config.cache_path, None);

        let BorefieldConfig::Vertical(vertical) = &config.borefield else {
            panic!("expected a vertical borefield");
        };
        assert_eq!(vertical.method, CalculationMethod::UniformHeatFlux);
        let field = vertical.field(&config.name, config.max_sim_years)?;
        assert_eq!(field.number_of_boreholes(), 6);
        assert_relative_eq!(config.borefield()?.total_tube_length(), 600.0);
        Ok(())
    }

    #[test]
    fn placed_boreholes_are_averaged() -> Result<(), GhxError> {
        let deeper = BOREHOLE.replace("\"length\": 100.0", "\"length\": 140.0");
        let json = vertical(&format!(
            r#"{{ "boreholes": [
                {{ "name": "a", "x": 0.0, "y": 0.0, "properties": {BOREHOLE} }},
                {{ "name": "b", "x": 5.0, "y": 0.0, "properties": {deeper} }}
            ] }}"#
        ));
        let config = GhxConfig::from_json_str(&json)?;
        let BorefieldConfig::Vertical(vertical) = &config.borefield else {
            panic!("expected a vertical borefield");
        };
        let field = vertical.field(&config.name, config.max_sim_years)?;
        assert_relative_eq!(field.properties().length, 120.0);
        assert_relative_eq!(field.total_tube_length(), 240.0);
        Ok(())
    }

    #[test]
    fn response_factor_field_steps() -> Result<(), GhxError> {
        let json = vertical(&format!(
            r#"{{ "response_factors": {{
                "properties": {BOREHOLE},
                "number_of_boreholes": 1,
                "g_ref_ratio": 0.00075,
                "g_functions": [[-15.0, 0.5], [-5.0, 4.0], [3.0, 7.0]]
            }} }}"#
        ));
        let config = GhxConfig::from_json_str(&json)?;
        let mut ghx = config.instance(Box::new(Water::new()?))?;
        let output = ghx.step(&StepInput {
            clock: SimClock::at_hours(1.0),
            inlet_temperature: ThermodynamicTemperature::new::<degree_celsius>(30.0),
            mass_flow_rate: MassRate::new::<kilogram_per_second>(0.5),
        })?;
        let outlet = output.outlet_temperature.get::<degree_celsius>();
        assert!(outlet < 30.0);
        assert!(outlet > 12.0);
        assert_eq!(ghx.table().map(|table| table.len()), Some(3));
        Ok(())
    }

    #[test]
    fn slinky_layout() -> Result<(), GhxError> {
        let config = GhxConfig::from_json_str(&slinky("horizontal", 1.5))?;
        let field = config.borefield()?;
        assert_relative_eq!(
            field.total_tube_length(),
            PI * 0.8 * 40.0 * 2.0 / 0.4,
            epsilon = 1e-9
        );
        assert_relative_eq!(field.time_scale_hours(), 1.0);
        Ok(())
    }

    #[test]
    fn vertical_coils_must_stay_below_grade() -> Result<(), GhxError> {
        let config = GhxConfig::from_json_str(&slinky("vertical", 0.5))?;
        assert!(matches!(
            config.borefield(),
            Err(GhxError::InvalidConfig {
                field: "slinky.trench_depth",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn invalid_material_is_rejected() -> Result<(), GhxError> {
        let json = vertical(&format!(
            r#"{{ "array": {{ "rows": 1, "columns": 1, "spacing": 6.0, "properties": {BOREHOLE} }} }}"#
        ))
        .replace(
            r#""conductivity": 2.0, "heat_capacity": 2.0e6"#,
            r#""conductivity": -2.0, "heat_capacity": 2.0e6"#,
        );
        let config = GhxConfig::from_json_str(&json)?;
        assert!(matches!(config.borefield(), Err(GhxError::Property(_))));
        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let json = slinky("horizontal", 1.5).replace("\"coil_pitch\"", "\"coil_spacing\"");
        assert!(matches!(
            GhxConfig::from_json_str(&json),
            Err(GhxError::ConfigParse(_))
        ));
    }

    #[test]
    fn missing_file() {
        let path = std::env::temp_dir().join("geoloop-config-missing.json");
        assert!(matches!(
            GhxConfig::from_path(&path),
            Err(GhxError::ConfigIo { path: p, .. }) if p == path
        ));
    }
}
