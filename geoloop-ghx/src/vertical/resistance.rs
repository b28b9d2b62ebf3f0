//! Borehole thermal resistances.
//!
//! Pipe resistances follow the usual conduction plus convection split, with
//! the convection coefficient blended smoothly across the laminar to
//! turbulent transition. Grout resistances use the first-order multipole
//! expansion for a single U-tube in a circular bore.

use std::f64::consts::PI;

use geoloop_thermo::{PipeProperties, fluid::FluidProperties};
use serde::Serialize;

use super::BoreholeProperties;

const LAMINAR_NUSSELT: f64 = 4.01;

/// Darcy friction factor for smooth pipes.
///
/// Laminar below Re 1500 and Petukhov above Re 5000, blended with a
/// logistic weight centred on Re 3000 in between.
#[must_use]
pub fn friction_factor(reynolds: f64) -> f64 {
    let turbulent = || (0.79 * reynolds.ln() - 1.64).powi(-2);
    if reynolds < 1500.0 {
        64.0 / reynolds
    } else if reynolds < 5000.0 {
        let laminar = 64.0 / reynolds;
        let sf = 1.0 / (1.0 + (-(reynolds - 3000.0) / 450.0).exp());
        (1.0 - sf) * laminar + sf * turbulent()
    } else {
        turbulent()
    }
}

/// Conduction resistance of one pipe wall [K·m/W].
#[must_use]
pub fn pipe_conduction_resistance(pipe: &PipeProperties) -> f64 {
    (pipe.outer_diameter() / pipe.inner_diameter()).ln() / (2.0 * PI * pipe.conductivity())
}

/// Convection resistance inside one pipe leg carrying `mass_flow_rate`
/// [K·m/W].
#[must_use]
pub fn pipe_convection_resistance(
    pipe: &PipeProperties,
    fluid: &FluidProperties,
    mass_flow_rate: f64,
) -> f64 {
    let diameter = pipe.inner_diameter();
    let reynolds = 4.0 * mass_flow_rate / (fluid.viscosity_si() * PI * diameter);

    let gnielinski = || {
        let f = friction_factor(reynolds);
        let pr = fluid.prandtl();
        (f / 8.0) * (reynolds - 1000.0) * pr
            / (1.0 + 12.7 * (f / 8.0).sqrt() * (pr.powf(2.0 / 3.0) - 1.0))
    };

    let nusselt = if reynolds < 2000.0 {
        LAMINAR_NUSSELT
    } else if reynolds < 4000.0 {
        let sf = 1.0 / (1.0 + (-(reynolds - 3000.0) / 150.0).exp());
        (1.0 - sf) * LAMINAR_NUSSELT + sf * gnielinski()
    } else {
        gnielinski()
    };

    let h = nusselt * fluid.conductivity_si() / diameter;
    1.0 / (h * PI * diameter)
}

/// Multipole geometry of a single U-tube borehole in soil.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Multipole {
    theta_1: f64,
    theta_2: f64,
    theta_3: f64,
    sigma: f64,
    grout_conductivity: f64,
}

impl Multipole {
    #[must_use]
    pub fn new(properties: &BoreholeProperties, soil_conductivity: f64) -> Self {
        let radius = properties.radius();
        let grout_conductivity = properties.grout.conductivity();
        let theta_1 = properties.u_tube_distance / (2.0 * radius);
        let theta_2 = radius / properties.pipe.outer_radius();
        Self {
            theta_1,
            theta_2,
            theta_3: 1.0 / (2.0 * theta_1 * theta_2),
            sigma: (grout_conductivity - soil_conductivity)
                / (grout_conductivity + soil_conductivity),
            grout_conductivity,
        }
    }

    fn beta(&self, pipe_resistance: f64) -> f64 {
        2.0 * PI * self.grout_conductivity * pipe_resistance
    }

    /// Fluid to borehole wall resistance with both legs at one temperature
    /// [K·m/W].
    #[must_use]
    pub fn average_resistance(&self, pipe_resistance: f64) -> f64 {
        let Self {
            theta_1: t1,
            theta_2: t2,
            theta_3: t3,
            sigma: s,
            ..
        } = *self;
        let beta = self.beta(pipe_resistance);
        let t1_4 = t1.powi(4);

        let log_term = (t2 / (2.0 * t1 * (1.0 - t1_4).powf(s))).ln();
        let numerator = t3.powi(2) * (1.0 - 4.0 * s * t1_4 / (1.0 - t1_4)).powi(2);
        let denominator = (1.0 + beta) / (1.0 - beta)
            + t3.powi(2) * (1.0 + 16.0 * s * t1_4 / (1.0 - t1_4).powi(2));

        (beta + log_term - numerator / denominator) / (4.0 * PI * self.grout_conductivity)
    }

    /// Leg to leg resistance [K·m/W].
    #[must_use]
    pub fn total_internal_resistance(&self, pipe_resistance: f64) -> f64 {
        let Self {
            theta_1: t1,
            theta_3: t3,
            sigma: s,
            ..
        } = *self;
        let beta = self.beta(pipe_resistance);
        let t1_2 = t1.powi(2);
        let t1_4 = t1.powi(4);

        let log_term = ((1.0 + t1_2).powf(s) / (t3 * (1.0 - t1_2).powf(s))).ln();
        let numerator = t3.powi(2) * (1.0 - t1_4 + 4.0 * s * t1_2).powi(2);
        let denominator = (1.0 + beta) / (1.0 - beta) * (1.0 - t1_4).powi(2)
            - t3.powi(2) * (1.0 - t1_4).powi(2)
            + 8.0 * s * t1_2 * t3.powi(2) * (1.0 + t1_4);

        (beta + log_term - numerator / denominator) / (PI * self.grout_conductivity)
    }

    /// Grout share of the average resistance [K·m/W].
    #[must_use]
    pub fn grout_resistance(&self, pipe_resistance: f64) -> f64 {
        self.average_resistance(pipe_resistance) - pipe_resistance / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use geoloop_thermo::fluid::{LoopFluid, Water};
    use uom::si::{f64::ThermodynamicTemperature, thermodynamic_temperature::degree_celsius};

    use crate::{GhxError, vertical::borehole::tests::properties};

    fn water_at(celsius: f64) -> Result<FluidProperties, GhxError> {
        Ok(Water::new()?.properties(ThermodynamicTemperature::new::<degree_celsius>(celsius))?)
    }

    struct Case {
        diameter: f64,
        grout_conductivity: f64,
        thickness: f64,
        u_tube_distance: f64,
        soil_conductivity: f64,
    }

    fn resistances(case: &Case) -> Result<Multipole, GhxError> {
        let props = properties(
            case.diameter,
            case.grout_conductivity,
            0.032,
            case.thickness,
            case.u_tube_distance,
        )?;
        Ok(Multipole::new(&props, case.soil_conductivity))
    }

    fn pipe_resistance(thickness: f64, fluid: &FluidProperties) -> Result<f64, GhxError> {
        let props = properties(0.096, 0.6, 0.032, thickness, 0.032)?;
        // One kg/s shared by four boreholes.
        Ok(pipe_conduction_resistance(&props.pipe)
            + pipe_convection_resistance(&props.pipe, fluid, 0.25))
    }

    #[test]
    fn friction_factor_across_transition() {
        assert_relative_eq!(friction_factor(2000.0), 0.034003503, epsilon = 1e-8);
        assert_relative_eq!(friction_factor(3000.0), 0.033446219, epsilon = 1e-8);
        assert_relative_eq!(friction_factor(4000.0), 0.03895358, epsilon = 1e-8);
    }

    #[test]
    fn conduction_through_pipe_wall() -> Result<(), GhxError> {
        let props = properties(0.109982, 0.744, 0.0267, 0.00243, 0.04556)?;
        assert_relative_eq!(pipe_conduction_resistance(&props.pipe), 0.082204, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn convection_in_each_flow_regime() -> Result<(), GhxError> {
        let props = properties(0.109982, 0.744, 0.0267, 0.00243, 0.04556)?;
        let fluid = water_at(13.0)?;
        let design = 0.000303 * 4.0 * 999.380058;
        let per_borehole = |mass_flow: f64| mass_flow / 4.0;

        let turbulent = pipe_convection_resistance(&props.pipe, &fluid, per_borehole(design));
        let transitional =
            pipe_convection_resistance(&props.pipe, &fluid, per_borehole(design / 4.0));
        let laminar = pipe_convection_resistance(&props.pipe, &fluid, per_borehole(design / 10.0));

        assert_relative_eq!(turbulent, 0.004453, epsilon = 1e-5);
        assert_relative_eq!(transitional, 0.019185, epsilon = 1e-5);
        assert_relative_eq!(laminar, 0.135556, epsilon = 1e-5);
        Ok(())
    }

    #[test]
    fn grout_resistance_matches_reference() -> Result<(), GhxError> {
        let fluid = water_at(20.0)?;
        let rp = pipe_resistance(0.001627, &fluid)?;
        for (case, expected) in [
            (
                Case {
                    diameter: 0.096,
                    grout_conductivity: 0.6,
                    thickness: 0.001627,
                    u_tube_distance: 0.032,
                    soil_conductivity: 4.0,
                },
                0.17701,
            ),
            (
                Case {
                    diameter: 0.096,
                    grout_conductivity: 0.6,
                    thickness: 0.001627,
                    u_tube_distance: 0.0426666667,
                    soil_conductivity: 1.0,
                },
                0.14724,
            ),
            (
                Case {
                    diameter: 0.288,
                    grout_conductivity: 1.8,
                    thickness: 0.001627,
                    u_tube_distance: 0.10666667,
                    soil_conductivity: 1.0,
                },
                0.11038,
            ),
        ] {
            let grout = resistances(&case)?.grout_resistance(rp);
            assert_relative_eq!(grout, expected, epsilon = 2e-5);
        }
        Ok(())
    }

    #[test]
    fn total_internal_resistance_matches_reference() -> Result<(), GhxError> {
        let fluid = water_at(20.0)?;
        let rp = pipe_resistance(0.0016279, &fluid)?;
        for (case, expected) in [
            (
                Case {
                    diameter: 0.096,
                    grout_conductivity: 0.6,
                    thickness: 0.0016279,
                    u_tube_distance: 0.032,
                    soil_conductivity: 4.0,
                },
                0.32365,
            ),
            (
                Case {
                    diameter: 0.192,
                    grout_conductivity: 3.6,
                    thickness: 0.0016279,
                    u_tube_distance: 0.032,
                    soil_conductivity: 3.0,
                },
                0.16310,
            ),
            (
                Case {
                    diameter: 0.288,
                    grout_conductivity: 3.0,
                    thickness: 0.0016279,
                    u_tube_distance: 0.1066667,
                    soil_conductivity: 1.0,
                },
                0.31582,
            ),
        ] {
            let internal = resistances(&case)?.total_internal_resistance(rp);
            assert_relative_eq!(internal, expected, epsilon = 2e-5);
        }
        Ok(())
    }
}
