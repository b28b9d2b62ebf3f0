//! Borehole geometry and the points its line-source integrals are sampled at.

use geoloop_thermo::{PipeProperties, ThermalProperties};
use serde::Serialize;

use crate::error::{GhxError, ensure_non_negative, ensure_positive};

/// Panels along a receiving borehole, for both the offset self-response
/// points and the on-axis points used against other boreholes.
const RECEIVER_PANELS: usize = 50;

/// Panels along a source borehole.
const SOURCE_PANELS: usize = 560;

/// Geometry and materials of one vertical single U-tube borehole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoreholeProperties {
    /// Depth of the top of the borehole below grade [m].
    pub top_depth: f64,
    /// Active length [m].
    pub length: f64,
    /// Drilled diameter [m].
    pub diameter: f64,
    /// Center-to-center distance between the U-tube legs [m].
    pub u_tube_distance: f64,
    pub grout: ThermalProperties,
    pub pipe: PipeProperties,
}

impl BoreholeProperties {
    /// Checks the geometric invariants.
    ///
    /// # Errors
    ///
    /// Returns [`GhxError::InvalidConfig`] if a dimension is not positive, the
    /// top depth is negative, or the U-tube legs do not fit in the bore.
    pub fn validate(&self) -> Result<(), GhxError> {
        ensure_non_negative("borehole.top_depth", self.top_depth)?;
        ensure_positive("borehole.length", self.length)?;
        ensure_positive("borehole.diameter", self.diameter)?;
        ensure_positive("borehole.u_tube_distance", self.u_tube_distance)?;
        if self.u_tube_distance >= self.diameter {
            return Err(GhxError::invalid(
                "borehole.u_tube_distance",
                format!(
                    "shank spacing {} m must be smaller than the bore diameter {} m",
                    self.u_tube_distance, self.diameter
                ),
            ));
        }
        if self.pipe.outer_diameter() >= self.diameter {
            return Err(GhxError::invalid(
                "borehole.pipe.outer_diameter",
                format!(
                    "pipe diameter {} m does not fit a {} m bore",
                    self.pipe.outer_diameter(),
                    self.diameter
                ),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    #[must_use]
    pub fn bottom_depth(&self) -> f64 {
        self.top_depth + self.length
    }

    /// Averages every dimension and material property.
    ///
    /// Returns `None` if `items` is empty.
    pub fn mean<'a, I>(items: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Self> + Clone,
        I::IntoIter: Clone,
    {
        let grout = ThermalProperties::mean(items.clone().into_iter().map(|p| &p.grout))?;
        let pipe = PipeProperties::mean(items.clone().into_iter().map(|p| &p.pipe))?;

        let mut count = 0_usize;
        let mut sums = [0.0; 4];
        for p in items {
            count += 1;
            sums[0] += p.top_depth;
            sums[1] += p.length;
            sums[2] += p.diameter;
            sums[3] += p.u_tube_distance;
        }
        let n = count as f64;
        Some(Self {
            top_depth: sums[0] / n,
            length: sums[1] / n,
            diameter: sums[2] / n,
            u_tube_distance: sums[3] / n,
            grout,
            pipe,
        })
    }
}

/// A borehole placed in the field plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Borehole {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub properties: BoreholeProperties,
}

impl Borehole {
    /// Lays out a rectangular grid of identical boreholes starting at the
    /// origin.
    ///
    /// Boreholes are ordered column by column along x.
    #[must_use]
    pub fn grid(
        columns: usize,
        rows: usize,
        spacing: f64,
        properties: BoreholeProperties,
    ) -> Vec<Self> {
        (0..columns)
            .flat_map(|c| (0..rows).map(move |r| (c, r)))
            .enumerate()
            .map(|(index, (c, r))| {
                let x = c as f64 * spacing;
                let y = r as f64 * spacing;
                Self {
                    name: format!("BH {} loc: ({x}, {y})", index + 1),
                    x,
                    y,
                    properties,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Equally spaced points along a borehole axis, an odd count so Simpson's
/// rule applies.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AxisPoints {
    pub points: Vec<Point>,
    pub spacing: f64,
}

impl AxisPoints {
    fn along(x: f64, y: f64, properties: &BoreholeProperties, panels: usize) -> Self {
        let spacing = properties.length / panels as f64;
        let points = (0..=panels)
            .map(|i| Point {
                x,
                y,
                z: properties.top_depth + i as f64 * spacing,
            })
            .collect();
        Self { points, spacing }
    }
}

/// The three point sets a borehole contributes to the field integrals.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Discretization {
    /// On-axis points where other boreholes' responses are received.
    pub receiver: AxisPoints,
    /// Points on the borehole wall where its own response is received.
    pub wall: AxisPoints,
    /// Finely spaced on-axis points emitting heat.
    pub source: AxisPoints,
    /// Active length [m].
    pub length: f64,
}

impl Discretization {
    pub fn new(borehole: &Borehole) -> Self {
        let props = &borehole.properties;
        let offset = props.radius() / 2.0_f64.sqrt();
        Self {
            receiver: AxisPoints::along(borehole.x, borehole.y, props, RECEIVER_PANELS),
            wall: AxisPoints::along(
                borehole.x + offset,
                borehole.y - offset,
                props,
                RECEIVER_PANELS,
            ),
            source: AxisPoints::along(borehole.x, borehole.y, props, SOURCE_PANELS),
            length: props.length,
        }
    }
}
