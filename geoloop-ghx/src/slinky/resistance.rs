use std::f64::consts::PI;

use geoloop_thermo::{PipeProperties, fluid::FluidProperties};

const LAMINAR_NUSSELT: f64 = 4.364;
const TRANSITION_CENTER: f64 = 3150.0;
const TRANSITION_WIDTH: f64 = 350.0;

/// Dittus–Boelter Nusselt number for turbulent flow in a coiled tube.
fn turbulent_nusselt(reynolds: f64, prandtl: f64) -> f64 {
    0.023 * reynolds.powf(0.8) * prandtl.powf(0.35)
}

/// Fluid to outer tube wall resistance of one trench's coil carrying
/// `mass_flow_rate` [K·m/W].
///
/// The two overlapping pipe runs of a coil act in parallel, halving the wall
/// conduction resistance. Without flow only the conduction term remains.
#[must_use]
pub fn coil_resistance(pipe: &PipeProperties, fluid: &FluidProperties, mass_flow_rate: f64) -> f64 {
    let conduction = (pipe.outer_radius() / pipe.inner_radius()).ln()
        / (2.0 * PI * pipe.conductivity())
        / 2.0;
    if mass_flow_rate <= 0.0 {
        return conduction;
    }

    let diameter = pipe.inner_diameter();
    let reynolds = 4.0 * mass_flow_rate / (PI * diameter * fluid.viscosity_si());
    let nusselt = if reynolds <= 2300.0 {
        LAMINAR_NUSSELT
    } else if reynolds <= 4000.0 {
        let sf = 0.5 + 0.5 * ((reynolds - TRANSITION_CENTER) / TRANSITION_WIDTH).tanh();
        LAMINAR_NUSSELT * (1.0 - sf) + turbulent_nusselt(reynolds, fluid.prandtl()) * sf
    } else {
        turbulent_nusselt(reynolds, fluid.prandtl())
    };

    let h = nusselt * fluid.conductivity_si() / diameter;
    conduction + 1.0 / (2.0 * PI * diameter * h)
}
