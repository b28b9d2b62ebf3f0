//! Long-timestep g-functions from the finite line source.
//!
//! Each borehole is a line of constant strength between its top and bottom
//! depth, mirrored above grade so the surface stays at the undisturbed
//! temperature. The response of borehole `i` to borehole `j` is the double
//! integral of the point-to-point kernel over both axes.

use geoloop_solve::{SolveError, simpson_samples, solve_dense};
use libm::erfc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::borehole::{AxisPoints, Discretization, Point};
use crate::response::GFunctionCurve;

/// First ln(t/tₛ) of the long-timestep grid.
pub const LONG_TIMESTEP_START: f64 = -8.5;

const LONG_TIMESTEP_STEP: f64 = 0.5;

const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * 3600.0;

/// How borehole loads are distributed when forming the field g-function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    /// Every borehole carries the same load per unit length.
    #[default]
    UniformHeatFlux,
    /// Loads are redistributed so every borehole shares one wall
    /// temperature.
    UniformBoreholeWallTemperature,
}

/// The ln(t/tₛ) grid covering `max_sim_years`.
pub(crate) fn long_timestep_grid(time_scale: f64, max_sim_years: u32) -> Vec<f64> {
    let horizon = f64::from(max_sim_years) * SECONDS_PER_YEAR;
    let mut grid = vec![LONG_TIMESTEP_START];
    let mut last = LONG_TIMESTEP_START;
    while last.exp() * time_scale < horizon {
        last += LONG_TIMESTEP_STEP;
        grid.push(last);
    }
    grid
}

fn kernel(receiver: &Point, source: &Point, spread: f64) -> f64 {
    let horizontal = (receiver.x - source.x).powi(2) + (receiver.y - source.y).powi(2);
    let direct = (horizontal + (receiver.z - source.z).powi(2)).sqrt();
    let mirrored = (horizontal + (receiver.z + source.z).powi(2)).sqrt();
    erfc(direct / spread) / direct - erfc(mirrored / spread) / mirrored
}

fn double_integral(receiver: &AxisPoints, source: &AxisPoints, spread: f64) -> f64 {
    simpson_samples(
        receiver.spacing,
        receiver.points.iter().map(|r| {
            simpson_samples(
                source.spacing,
                source.points.iter().map(|s| kernel(r, s, spread)),
            )
        }),
    )
}

/// Row `i` of the field response matrix: the response of borehole `i` to
/// each borehole, normalized by twice the length of `i`.
fn response_row(field: &[Discretization], i: usize, spread: f64) -> Vec<f64> {
    let receiving = &field[i];
    field
        .iter()
        .enumerate()
        .map(|(j, emitting)| {
            let points = if i == j {
                &receiving.wall
            } else {
                &receiving.receiver
            };
            double_integral(points, &emitting.source, spread) / (2.0 * receiving.length)
        })
        .collect()
}

#[cfg(feature = "parallel")]
fn response_matrix(field: &[Discretization], spread: f64) -> Vec<Vec<f64>> {
    use rayon::prelude::*;

    (0..field.len())
        .into_par_iter()
        .map(|i| response_row(field, i, spread))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn response_matrix(field: &[Discretization], spread: f64) -> Vec<Vec<f64>> {
    (0..field.len())
        .map(|i| response_row(field, i, spread))
        .collect()
}

/// Field g-value when every borehole carries the same unit load.
fn uniform_heat_flux(field: &[Discretization], matrix: &[Vec<f64>]) -> f64 {
    let total_length: f64 = field.iter().map(|b| b.length).sum();
    field
        .iter()
        .zip(matrix)
        .map(|(b, row)| b.length * row.iter().sum::<f64>())
        .sum::<f64>()
        / total_length
}

/// Field g-value when all boreholes share one wall temperature.
///
/// Unknowns are the borehole loads and the shared temperature; the extra
/// row keeps the length-weighted mean load at one.
fn uniform_wall_temperature(
    field: &[Discretization],
    matrix: Vec<Vec<f64>>,
) -> Result<f64, SolveError> {
    let n = field.len();
    let total_length: f64 = field.iter().map(|b| b.length).sum();

    let mut system: Vec<Vec<f64>> = matrix
        .into_iter()
        .map(|mut row| {
            row.push(-1.0);
            row
        })
        .collect();
    let mut energy: Vec<f64> = field.iter().map(|b| b.length).collect();
    energy.push(0.0);
    system.push(energy);

    let mut rhs = vec![0.0; n];
    rhs.push(total_length);

    let solution = solve_dense(system, rhs)?;
    Ok(solution[n])
}

/// Computes the long-timestep curve at every point of the grid.
///
/// `time_scale` is tₛ = L²/9α in seconds.
pub(crate) fn long_timestep_curve(
    field: &[Discretization],
    diffusivity: f64,
    time_scale: f64,
    max_sim_years: u32,
    method: CalculationMethod,
) -> Result<GFunctionCurve, SolveError> {
    let grid = long_timestep_grid(time_scale, max_sim_years);
    let mut curve = GFunctionCurve::default();

    for (index, &lntts) in grid.iter().enumerate() {
        let time = lntts.exp() * time_scale;
        let spread = 2.0 * (diffusivity * time).sqrt();
        let matrix = response_matrix(field, spread);
        let g = match method {
            CalculationMethod::UniformHeatFlux => uniform_heat_flux(field, &matrix),
            CalculationMethod::UniformBoreholeWallTemperature => {
                uniform_wall_temperature(field, matrix)?
            }
        };
        curve.push(lntts, g);
        debug!(
            lntts,
            g,
            percent = (index + 1) as f64 / grid.len() as f64 * 100.0,
            "long-timestep g-function point"
        );
    }

    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::{
        GhxError,
        vertical::borehole::{Borehole, tests::properties},
    };

    const DIFFUSIVITY: f64 = 2.423 / 2.343e6;

    fn field(coordinates: &[(f64, f64)]) -> Result<Vec<Discretization>, GhxError> {
        let props = properties(0.109982, 0.744, 0.0267, 0.00243, 0.04556)?;
        Ok(coordinates
            .iter()
            .map(|&(x, y)| {
                Discretization::new(&Borehole {
                    name: format!("({x}, {y})"),
                    x,
                    y,
                    properties: props,
                })
            })
            .collect())
    }

    fn time_scale() -> f64 {
        100.0_f64.powi(2) / (9.0 * DIFFUSIVITY)
    }

    #[test]
    fn grid_covers_the_horizon() {
        let ts = time_scale();
        let grid = long_timestep_grid(ts, 1);
        assert_eq!(grid.len(), 11);
        assert_relative_eq!(grid[0], -8.5);
        assert_relative_eq!(grid[10], -3.5);
        assert!(grid[10].exp() * ts >= SECONDS_PER_YEAR);
        assert!(grid[9].exp() * ts < SECONDS_PER_YEAR);
    }

    #[test]
    fn single_borehole_methods_agree() -> Result<(), GhxError> {
        let field = field(&[(0.0, 0.0)])?;
        let uhf = long_timestep_curve(
            &field,
            DIFFUSIVITY,
            time_scale(),
            1,
            CalculationMethod::UniformHeatFlux,
        )?;
        let ubwt = long_timestep_curve(
            &field,
            DIFFUSIVITY,
            time_scale(),
            1,
            CalculationMethod::UniformBoreholeWallTemperature,
        )?;
        for ((_, a), (_, b)) in uhf.points().zip(ubwt.points()) {
            assert_relative_eq!(a, b, max_relative = 1e-10);
        }
        Ok(())
    }

    #[test]
    fn symmetric_square_matches_reference() -> Result<(), GhxError> {
        let field = field(&[(0.0, 0.0), (5.0, 0.0), (0.0, 5.0), (5.0, 5.0)])?;
        let curve = long_timestep_curve(
            &field,
            DIFFUSIVITY,
            time_scale(),
            1,
            CalculationMethod::UniformHeatFlux,
        )?;
        let expected = [
            2.5437, 2.7913, 3.0389, 3.2864, 3.5378, 3.8122, 4.1481, 4.5843, 5.1372, 5.7955, 6.5307,
        ];
        assert_eq!(curve.len(), expected.len());
        for ((_, g), e) in curve.points().zip(expected) {
            assert_relative_eq!(g, e, epsilon = 1e-3);
        }
        Ok(())
    }

    #[test]
    fn uniform_wall_temperature_relieves_the_centre_borehole() -> Result<(), GhxError> {
        let field = field(&[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)])?;
        let uhf = long_timestep_curve(
            &field,
            DIFFUSIVITY,
            time_scale(),
            1,
            CalculationMethod::UniformHeatFlux,
        )?;
        let ubwt = long_timestep_curve(
            &field,
            DIFFUSIVITY,
            time_scale(),
            1,
            CalculationMethod::UniformBoreholeWallTemperature,
        )?;
        let (_, late_uhf) = uhf.points().last().unwrap_or_default();
        let (_, late_ubwt) = ubwt.points().last().unwrap_or_default();
        assert!(late_ubwt < late_uhf, "{late_ubwt} should be below {late_uhf}");
        Ok(())
    }
}
