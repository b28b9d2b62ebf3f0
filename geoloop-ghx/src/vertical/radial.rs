//! Short-timestep g-functions from a one-dimensional radial model.
//!
//! The borehole cross-section is collapsed into concentric rings: fluid,
//! convection film, pipe wall, grout and soil out to a fixed far-field
//! radius. The two U-tube legs become one equivalent pipe of radius
//! √2·rₚ, and the film and pipe/grout conductivities are tuned so the ring
//! resistances reproduce the multipole borehole resistance. A unit heat rate
//! is applied to the innermost fluid ring and the implicit conduction
//! equations are stepped with the tri-diagonal solver.

use std::f64::consts::{PI, SQRT_2};

use geoloop_solve::{SolveError, tdma};
use geoloop_thermo::{PipeProperties, ThermalProperties};

use crate::response::GFunctionCurve;

/// ln(t/tₛ) at which the radial model hands over to the line source.
pub const SHORT_TIMESTEP_END: f64 = -8.6;

const TIME_STEP: f64 = 120.0;
const FLUID_CELLS: usize = 3;
const FILM_CELLS: usize = 1;
const PIPE_CELLS: usize = 4;
const GROUT_CELLS: usize = 27;
const SOIL_CELLS: usize = 500;
const FAR_FIELD_RADIUS: f64 = 10.0;
const FLUID_CONDUCTIVITY: f64 = 200.0;

/// Everything the radial model needs about one representative borehole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RadialModel {
    pub borehole_radius: f64,
    pub pipe: PipeProperties,
    pub grout: ThermalProperties,
    pub soil: ThermalProperties,
    /// Volumetric heat capacity of the loop fluid [J/m³·K].
    pub fluid_heat_capacity: f64,
    /// Multipole fluid to wall resistance at design flow [K·m/W].
    pub borehole_resistance: f64,
    /// Convection resistance of one leg at design flow [K·m/W].
    pub convection_resistance: f64,
    /// tₛ = L²/9α [s].
    pub time_scale: f64,
}

#[derive(Debug, Clone, Copy)]
struct Ring {
    inner: f64,
    center: f64,
    outer: f64,
    conductivity: f64,
    heat_capacity: f64,
}

impl Ring {
    fn spanning(inner: f64, thickness: f64, conductivity: f64, heat_capacity: f64) -> Self {
        Self {
            inner,
            center: inner + thickness / 2.0,
            outer: inner + thickness,
            conductivity,
            heat_capacity,
        }
    }

    fn volume(&self) -> f64 {
        PI * (self.outer.powi(2) - self.inner.powi(2))
    }

    /// Resistance from the ring center to its outer face.
    fn outer_resistance(&self) -> f64 {
        (self.outer / self.center).ln() / (2.0 * PI * self.conductivity)
    }

    /// Resistance from the inner face to the ring center.
    fn inner_resistance(&self) -> f64 {
        (self.center / self.inner).ln() / (2.0 * PI * self.conductivity)
    }
}

impl RadialModel {
    fn rings(&self) -> Vec<Ring> {
        let thickness = self.pipe.thickness();
        let cell = thickness / PIPE_CELLS as f64;
        let pipe_outer = SQRT_2 * self.pipe.outer_radius();
        let pipe_inner = pipe_outer - thickness;
        let film = pipe_inner - FILM_CELLS as f64 * cell;
        let fluid = film - (FLUID_CELLS as f64 - 0.5) * cell;

        let tube_grout_resistance = self.borehole_resistance - self.convection_resistance / 2.0;
        let film_resistance = self.borehole_resistance - tube_grout_resistance;
        let tube_grout_conductivity =
            (self.borehole_radius / pipe_inner).ln() / (2.0 * PI * tube_grout_resistance);

        let fluid_heat_capacity = 2.0 * self.fluid_heat_capacity * self.pipe.inner_radius().powi(2)
            / (film.powi(2) - fluid.powi(2));

        let mut rings = Vec::with_capacity(
            FLUID_CELLS + FILM_CELLS + PIPE_CELLS + GROUT_CELLS + SOIL_CELLS,
        );
        rings.extend((0..FLUID_CELLS).map(|i| {
            let center = fluid + i as f64 * cell;
            Ring {
                inner: if i == 0 { center } else { center - cell / 2.0 },
                center,
                outer: center + cell / 2.0,
                conductivity: FLUID_CONDUCTIVITY,
                heat_capacity: fluid_heat_capacity,
            }
        }));
        rings.extend((0..FILM_CELLS).map(|i| {
            Ring::spanning(
                film + i as f64 * cell,
                cell,
                (pipe_inner / film).ln() / (2.0 * PI * film_resistance),
                1.0,
            )
        }));
        rings.extend((0..PIPE_CELLS).map(|i| {
            Ring::spanning(
                pipe_inner + i as f64 * cell,
                cell,
                tube_grout_conductivity,
                self.pipe.thermal().heat_capacity(),
            )
        }));
        let grout_cell = (self.borehole_radius - pipe_outer) / GROUT_CELLS as f64;
        rings.extend((0..GROUT_CELLS).map(|i| {
            Ring::spanning(
                pipe_outer + i as f64 * grout_cell,
                grout_cell,
                tube_grout_conductivity,
                self.grout.heat_capacity(),
            )
        }));
        let soil_cell = (FAR_FIELD_RADIUS - self.borehole_radius) / SOIL_CELLS as f64;
        rings.extend((0..SOIL_CELLS).map(|i| {
            Ring::spanning(
                self.borehole_radius + i as f64 * soil_cell,
                soil_cell,
                self.soil.conductivity(),
                self.soil.heat_capacity(),
            )
        }));
        rings
    }

    /// Steps the model until ln(t/tₛ) reaches [`SHORT_TIMESTEP_END`].
    ///
    /// Temperatures are rises above the initial state, so the g-value is
    /// 2πkₛ·(T_fluid − R_b) for the unit heat rate.
    pub(crate) fn curve(&self) -> Result<GFunctionCurve, SolveError> {
        let rings = self.rings();
        let n = rings.len();
        let storage: Vec<f64> = rings
            .iter()
            .map(|r| r.heat_capacity * r.volume() / TIME_STEP)
            .collect();

        let mut a = vec![0.0; n];
        let mut b = vec![0.0; n];
        let mut c = vec![0.0; n];
        for i in 0..n - 1 {
            let east = 1.0 / (rings[i].outer_resistance() + rings[i + 1].inner_resistance());
            c[i] = east / storage[i];
            b[i] = -east / storage[i] - 1.0;
            if i > 0 {
                let west = 1.0 / (rings[i - 1].outer_resistance() + rings[i].inner_resistance());
                a[i] = west / storage[i];
                b[i] -= west / storage[i];
            }
        }
        b[n - 1] = 1.0;

        let end = SHORT_TIMESTEP_END.exp() * self.time_scale;
        let conductance = 2.0 * PI * self.soil.conductivity();
        let mut temperatures = vec![0.0; n];
        let mut elapsed = 0.0;
        let mut curve = GFunctionCurve::default();

        while elapsed < end {
            let mut d: Vec<f64> = temperatures.iter().map(|t| -t).collect();
            d[0] -= 1.0 / storage[0];
            d[n - 1] = temperatures[n - 1];

            temperatures = tdma(&a, &b, &c, &d)?;
            elapsed += TIME_STEP;
            curve.push(
                (elapsed / self.time_scale).ln(),
                conductance * (temperatures[0] - self.borehole_resistance),
            );
        }

        Ok(curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn model() -> Result<RadialModel, geoloop_thermo::PropertyError> {
        let soil = ThermalProperties::new(2.423, 2.343e6)?;
        Ok(RadialModel {
            borehole_radius: 0.109982 / 2.0,
            pipe: PipeProperties::new(ThermalProperties::new(0.389, 1.77e6)?, 0.0267, 0.00243)?,
            grout: ThermalProperties::new(0.744, 3.9e6)?,
            soil,
            fluid_heat_capacity: 998.21 * 4184.0,
            borehole_resistance: 0.2098,
            convection_resistance: 0.0136,
            time_scale: 100.0_f64.powi(2) / (9.0 * soil.diffusivity()),
        })
    }

    #[test]
    fn rings_are_contiguous() -> Result<(), geoloop_thermo::PropertyError> {
        let rings = model()?.rings();
        assert_eq!(rings.len(), 535);
        for pair in rings.windows(2) {
            assert_relative_eq!(pair[0].outer, pair[1].inner, epsilon = 1e-12);
        }
        assert_relative_eq!(rings[534].outer, FAR_FIELD_RADIUS, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn curve_rises_up_to_the_handover() -> Result<(), Box<dyn std::error::Error>> {
        let curve = model()?.curve()?;
        assert_eq!(curve.len(), 1649);
        let (last_lntts, _) = curve.points().last().unwrap_or_default();
        assert!(last_lntts >= SHORT_TIMESTEP_END);
        assert!(last_lntts < SHORT_TIMESTEP_END + 0.01);
        assert!(curve.value.windows(2).all(|w| w[1] > w[0]));
        Ok(())
    }
}
