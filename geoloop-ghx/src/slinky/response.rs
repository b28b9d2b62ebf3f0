//! Ring-source g-functions for slinky fields.
//!
//! Every coil is a ring source mirrored above grade. Rings close to the
//! receiving ring are integrated around both circumferences; rings further
//! away collapse to point sources at their centers, and distant rings are
//! ignored. Only one quadrant of the field is evaluated as a receiver and
//! the result is scaled by symmetry.

use std::{collections::HashMap, f64::consts::PI};

use geoloop_solve::simpson_samples;
use libm::erfc;
use tracing::debug;

use super::{CoilOrientation, SlinkyGeometry};
use crate::response::GFunctionCurve;

/// First log10(hours) of the time grid.
pub const LOG_HOURS_START: f64 = -2.0;

const LOG_HOURS_STEP: f64 = 0.25;
const HOURS_PER_YEAR: f64 = 365.0 * 24.0;

/// Center distances beyond the coil diameter where the near field ends and
/// where rings stop contributing [m].
const NEAR_FIELD_REACH: f64 = 2.5;
const FAR_FIELD_REACH: f64 = 10.0;

const OUTER_SAMPLES: usize = 33;
const SELF_SAMPLES: usize = 1089;
const NEIGHBOR_SAMPLES: usize = 561;

/// The log10(hours) grid covering `max_sim_years`.
pub(crate) fn time_grid(max_sim_years: u32) -> Vec<f64> {
    let end = (f64::from(max_sim_years) * HOURS_PER_YEAR).log10();
    let count = ((end - LOG_HOURS_START) / LOG_HOURS_STEP + 1.0) as usize;
    (0..count)
        .map(|i| LOG_HOURS_START + LOG_HOURS_STEP * i as f64)
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct RingPair {
    /// Receiving trench and coil.
    m: usize,
    n: usize,
    /// Source trench and coil.
    m1: usize,
    n1: usize,
}

impl RingPair {
    fn is_self(&self) -> bool {
        self.m == self.m1 && self.n == self.n1
    }

    fn offset(&self) -> (usize, usize) {
        (self.m.abs_diff(self.m1), self.n.abs_diff(self.n1))
    }
}

/// A slinky field laid out for ring-source integration.
pub(crate) struct RingField {
    orientation: CoilOrientation,
    radius: f64,
    pipe_radius: f64,
    depth: f64,
    diameter: f64,
    diffusivity: f64,
    coils: Vec<f64>,
    trenches: Vec<f64>,
}

impl RingField {
    pub fn new(geometry: &SlinkyGeometry, pipe_outer_radius: f64, diffusivity: f64) -> Self {
        Self {
            orientation: geometry.orientation,
            radius: geometry.coil_radius(),
            pipe_radius: pipe_outer_radius,
            depth: geometry.coil_depth(),
            diameter: geometry.coil_diameter,
            diffusivity,
            coils: geometry.coil_positions(),
            trenches: geometry.trench_positions(),
        }
    }

    fn center_distance(&self, pair: RingPair) -> f64 {
        let along = self.coils[pair.n] - self.coils[pair.n1];
        let across = self.trenches[pair.m] - self.trenches[pair.m1];
        along.hypot(across)
    }

    /// Mean distance from a point on receiving ring to the inner and outer
    /// edges of the source pipe. `lift` raises the receiving point, placing
    /// it on the image ring when set to twice the coil depth.
    fn ring_distance(&self, pair: RingPair, eta: f64, theta: f64, lift: f64) -> f64 {
        let (sin_theta, cos_theta) = theta.sin_cos();
        let (sin_eta, cos_eta) = eta.sin_cos();
        let inner = self.radius - self.pipe_radius;
        let outer = self.radius + self.pipe_radius;

        let x = self.coils[pair.n] + cos_theta * self.radius;
        let x_in = self.coils[pair.n1] + cos_eta * inner;
        let x_out = self.coils[pair.n1] + cos_eta * outer;

        match self.orientation {
            CoilOrientation::Horizontal => {
                let y = self.trenches[pair.m] + sin_theta * self.radius;
                let y_in = self.trenches[pair.m1] + sin_eta * inner;
                let y_out = self.trenches[pair.m1] + sin_eta * outer;
                0.5 * (x - x_in).hypot(y - y_in) + 0.5 * (x - x_out).hypot(y - y_out)
            }
            CoilOrientation::Vertical => {
                let dy = self.trenches[pair.m1] - self.trenches[pair.m];
                let z = self.depth + sin_theta * self.radius + lift;
                let z_in = self.depth + sin_eta * inner;
                let z_out = self.depth + sin_eta * outer;
                0.5 * ((x - x_in).powi(2) + dy.powi(2) + (z - z_in).powi(2)).sqrt()
                    + 0.5 * ((x - x_out).powi(2) + dy.powi(2) + (z - z_out).powi(2)).sqrt()
            }
        }
    }

    fn near_field(&self, pair: RingPair, eta: f64, theta: f64, spread: f64) -> f64 {
        let direct = self.ring_distance(pair, eta, theta, 0.0);
        let image = match self.orientation {
            CoilOrientation::Horizontal => (direct.powi(2) + 4.0 * self.depth.powi(2)).sqrt(),
            CoilOrientation::Vertical => self.ring_distance(pair, eta, theta, 2.0 * self.depth),
        };
        erfc(0.5 * direct / spread) / direct - erfc(0.5 * image / spread) / image
    }

    fn double_integral(&self, pair: RingPair, spread: f64) -> f64 {
        let samples = if pair.is_self() {
            SELF_SAMPLES
        } else {
            NEIGHBOR_SAMPLES
        };
        let outer_step = 2.0 * PI / (OUTER_SAMPLES - 1) as f64;
        let inner_step = 2.0 * PI / (samples - 1) as f64;
        simpson_samples(
            outer_step,
            (0..OUTER_SAMPLES).map(|i| {
                let eta = i as f64 * outer_step;
                simpson_samples(
                    inner_step,
                    (0..samples).map(|j| self.near_field(pair, eta, j as f64 * inner_step, spread)),
                )
            }),
        )
    }

    fn mid_field(&self, pair: RingPair, spread: f64) -> f64 {
        let direct = self.center_distance(pair);
        let image = (direct.powi(2) + 4.0 * self.depth.powi(2)).sqrt();
        let kernel = erfc(0.5 * direct / spread) / direct - erfc(0.5 * image / spread) / image;
        4.0 * PI.powi(2) * kernel
    }

    /// Field g-value `seconds` after a unit step in load.
    pub fn g_value(&self, seconds: f64) -> f64 {
        let spread = (self.diffusivity * seconds).sqrt();
        let trenches = self.trenches.len();
        let coils = self.coils.len();
        let receiving_trenches = trenches.div_ceil(2);
        let receiving_coils = coils.div_ceil(2);
        let odd_trenches = trenches % 2 == 1;
        let odd_coils = coils % 2 == 1;
        let fraction = if trenches > 1 { 0.25 } else { 0.5 };

        let mut stored: HashMap<(usize, usize), f64> = HashMap::new();
        let mut total = 0.0;

        for m1 in 0..receiving_trenches {
            for n1 in 0..receiving_coils {
                // Receivers on a symmetry line are shared with the mirrored
                // quadrant.
                let on_trench_axis = odd_trenches && trenches > 1 && m1 + 1 == receiving_trenches;
                let on_coil_axis = odd_coils && n1 + 1 == receiving_coils;
                let weight = match (on_trench_axis, on_coil_axis) {
                    (true, true) => 0.25,
                    (true, false) | (false, true) => 0.5,
                    (false, false) => 1.0,
                };

                for m in 0..trenches {
                    for n in 0..coils {
                        let pair = RingPair { m, n, m1, n1 };
                        let distance = self.center_distance(pair);
                        if distance > FAR_FIELD_REACH + self.diameter {
                            continue;
                        }
                        let value = *stored.entry(pair.offset()).or_insert_with(|| {
                            if distance <= NEAR_FIELD_REACH + self.diameter {
                                self.double_integral(pair, spread)
                            } else {
                                self.mid_field(pair, spread)
                            }
                        });
                        total += weight * value;
                    }
                }
            }
        }

        total * self.radius / (4.0 * PI * fraction * (trenches * coils) as f64)
    }

    /// The g-function over the log10(hours) grid.
    pub fn curve(&self, max_sim_years: u32) -> GFunctionCurve {
        let grid = time_grid(max_sim_years);
        let values = self.values(&grid);
        for (index, (log_hours, g)) in grid.iter().zip(&values).enumerate() {
            debug!(
                log_hours,
                g,
                percent = (index + 1) as f64 / grid.len() as f64 * 100.0,
                "slinky g-function point"
            );
        }
        GFunctionCurve::new(grid, values)
    }

    #[cfg(feature = "parallel")]
    fn values(&self, grid: &[f64]) -> Vec<f64> {
        use rayon::prelude::*;

        grid.par_iter()
            .map(|log_hours| self.g_value(10_f64.powf(*log_hours) * 3600.0))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn values(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter()
            .map(|log_hours| self.g_value(10_f64.powf(*log_hours) * 3600.0))
            .collect()
    }
}
