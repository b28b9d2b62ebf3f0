use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{GhxError, ensure_positive};

/// Plane the coils are wound in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoilOrientation {
    /// Coils lie flat at the trench bottom.
    Horizontal,
    /// Coils stand upright along the trench, centred half a diameter above
    /// the trench bottom.
    Vertical,
}

/// Layout of a slinky field: parallel trenches of overlapping pipe coils.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlinkyGeometry {
    pub orientation: CoilOrientation,
    /// Coil diameter [m].
    pub coil_diameter: f64,
    /// Distance between successive coil centers along a trench [m].
    pub coil_pitch: f64,
    /// Depth of the trench bottom below grade [m].
    pub trench_depth: f64,
    /// Length of each trench [m].
    pub trench_length: f64,
    pub number_of_trenches: usize,
    /// Center-to-center distance between trenches [m].
    pub trench_spacing: f64,
}

impl SlinkyGeometry {
    /// Checks the layout invariants.
    ///
    /// # Errors
    ///
    /// Returns [`GhxError::InvalidConfig`] if a dimension is not positive,
    /// there are no trenches or coils, or a vertical coil would reach above
    /// grade.
    pub fn validate(&self) -> Result<(), GhxError> {
        ensure_positive("slinky.coil_diameter", self.coil_diameter)?;
        ensure_positive("slinky.coil_pitch", self.coil_pitch)?;
        ensure_positive("slinky.trench_depth", self.trench_depth)?;
        ensure_positive("slinky.trench_length", self.trench_length)?;
        ensure_positive("slinky.trench_spacing", self.trench_spacing)?;
        if self.number_of_trenches == 0 {
            return Err(GhxError::invalid(
                "slinky.number_of_trenches",
                "at least one trench is required",
            ));
        }
        if self.number_of_coils() == 0 {
            return Err(GhxError::invalid(
                "slinky.coil_pitch",
                format!(
                    "a {} m trench holds no coils at a {} m pitch",
                    self.trench_length, self.coil_pitch
                ),
            ));
        }
        if self.orientation == CoilOrientation::Vertical && self.trench_depth < self.coil_diameter
        {
            return Err(GhxError::invalid(
                "slinky.trench_depth",
                format!(
                    "a {} m vertical coil in a {} m trench would reach above grade",
                    self.coil_diameter, self.trench_depth
                ),
            ));
        }
        Ok(())
    }

    /// Whole coils that fit along one trench.
    #[must_use]
    pub fn number_of_coils(&self) -> usize {
        (self.trench_length / self.coil_pitch) as usize
    }

    /// Depth of the coil centers below grade [m].
    #[must_use]
    pub fn coil_depth(&self) -> f64 {
        match self.orientation {
            CoilOrientation::Horizontal => self.trench_depth,
            CoilOrientation::Vertical => self.trench_depth - self.coil_radius(),
        }
    }

    #[must_use]
    pub fn coil_radius(&self) -> f64 {
        self.coil_diameter / 2.0
    }

    /// Length of pipe laid in all trenches [m].
    #[must_use]
    pub fn total_tube_length(&self) -> f64 {
        PI * self.coil_diameter * self.trench_length * self.number_of_trenches as f64
            / self.coil_pitch
    }

    /// Coil center coordinates along the trenches [m].
    pub(crate) fn coil_positions(&self) -> Vec<f64> {
        (0..self.number_of_coils())
            .map(|n| n as f64 * self.coil_pitch)
            .collect()
    }

    /// Trench center coordinates across the field [m].
    pub(crate) fn trench_positions(&self) -> Vec<f64> {
        (0..self.number_of_trenches)
            .map(|m| m as f64 * self.trench_spacing)
            .collect()
    }
}
