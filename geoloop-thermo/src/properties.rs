use serde::Serialize;

use crate::PropertyError;

/// Thermophysical properties of a conducting medium such as soil, grout, or a
/// pipe wall.
///
/// Values are in SI units and immutable once constructed.
/// The diffusivity is always derived as conductivity over volumetric heat
/// capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThermalProperties {
    conductivity: f64,
    heat_capacity: f64,
}

impl ThermalProperties {
    /// Creates properties from conductivity [W/m·K] and volumetric heat
    /// capacity [J/m³·K].
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::InvalidInput`] unless both values are finite
    /// and positive.
    pub fn new(conductivity: f64, heat_capacity: f64) -> Result<Self, PropertyError> {
        ensure_positive("conductivity", conductivity)?;
        ensure_positive("volumetric heat capacity", heat_capacity)?;
        Ok(Self {
            conductivity,
            heat_capacity,
        })
    }

    /// Creates properties from conductivity [W/m·K], density [kg/m³], and
    /// specific heat [J/kg·K].
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::InvalidInput`] unless all values are finite
    /// and positive.
    pub fn from_density(
        conductivity: f64,
        density: f64,
        specific_heat: f64,
    ) -> Result<Self, PropertyError> {
        ensure_positive("density", density)?;
        ensure_positive("specific heat", specific_heat)?;
        Self::new(conductivity, density * specific_heat)
    }

    /// Returns the arithmetic mean of a set of property values.
    ///
    /// Returns `None` if `items` is empty.
    pub fn mean<'a, I>(items: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let (count, conductivity, heat_capacity) = items
            .into_iter()
            .fold((0_usize, 0.0, 0.0), |(n, k, c), p| {
                (n + 1, k + p.conductivity, c + p.heat_capacity)
            });
        (count > 0).then(|| Self {
            conductivity: conductivity / count as f64,
            heat_capacity: heat_capacity / count as f64,
        })
    }

    /// Thermal conductivity [W/m·K].
    #[must_use]
    pub fn conductivity(&self) -> f64 {
        self.conductivity
    }

    /// Volumetric heat capacity ρ·cp [J/m³·K].
    #[must_use]
    pub fn heat_capacity(&self) -> f64 {
        self.heat_capacity
    }

    /// Thermal diffusivity [m²/s].
    #[must_use]
    pub fn diffusivity(&self) -> f64 {
        self.conductivity / self.heat_capacity
    }
}

/// Pipe wall properties and cross-section geometry.
///
/// The inner radius is always positive: construction fails when the wall
/// is as thick as the outer radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipeProperties {
    thermal: ThermalProperties,
    outer_diameter: f64,
    thickness: f64,
}

impl PipeProperties {
    /// Creates pipe properties from wall material, outer diameter [m], and
    /// wall thickness [m].
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::InvalidInput`] if either dimension is not
    /// positive or the wall is at least as thick as the outer radius.
    pub fn new(
        thermal: ThermalProperties,
        outer_diameter: f64,
        thickness: f64,
    ) -> Result<Self, PropertyError> {
        ensure_positive("pipe outer diameter", outer_diameter)?;
        ensure_positive("pipe thickness", thickness)?;
        if thickness >= outer_diameter / 2.0 {
            return Err(PropertyError::InvalidInput(format!(
                "pipe thickness {thickness} m leaves no bore in a {outer_diameter} m pipe"
            )));
        }
        Ok(Self {
            thermal,
            outer_diameter,
            thickness,
        })
    }

    /// Returns the mean of a set of pipes, averaging material and geometry.
    ///
    /// Returns `None` if `items` is empty.
    pub fn mean<'a, I>(items: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Self> + Clone,
    {
        let thermal = ThermalProperties::mean(items.clone().into_iter().map(|p| &p.thermal))?;
        let (count, outer_diameter, thickness) = items
            .into_iter()
            .fold((0_usize, 0.0, 0.0), |(n, d, t), p| {
                (n + 1, d + p.outer_diameter, t + p.thickness)
            });
        Some(Self {
            thermal,
            outer_diameter: outer_diameter / count as f64,
            thickness: thickness / count as f64,
        })
    }

    /// Wall material properties.
    #[must_use]
    pub fn thermal(&self) -> &ThermalProperties {
        &self.thermal
    }

    /// Wall thermal conductivity [W/m·K].
    #[must_use]
    pub fn conductivity(&self) -> f64 {
        self.thermal.conductivity
    }

    #[must_use]
    pub fn outer_diameter(&self) -> f64 {
        self.outer_diameter
    }

    #[must_use]
    pub fn inner_diameter(&self) -> f64 {
        self.outer_diameter - 2.0 * self.thickness
    }

    #[must_use]
    pub fn outer_radius(&self) -> f64 {
        self.outer_diameter / 2.0
    }

    #[must_use]
    pub fn inner_radius(&self) -> f64 {
        self.outer_radius() - self.thickness
    }

    #[must_use]
    pub fn thickness(&self) -> f64 {
        self.thickness
    }
}

fn ensure_positive(name: &str, value: f64) -> Result<(), PropertyError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PropertyError::InvalidInput(format!(
            "{name} must be finite and positive, got {value}"
        )))
    }
}
