//! Undisturbed ground temperature models.

use std::f64::consts::PI;

use uom::si::{
    f64::{Length, ThermodynamicTemperature, Time},
    length::meter,
    thermodynamic_temperature::degree_celsius,
    time::second,
};

use crate::error::{GhxError, ensure_positive};

const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * 3600.0;
const SECONDS_PER_DAY: f64 = 24.0 * 3600.0;

/// Far-field ground temperature as a function of depth and time.
pub trait GroundTemperatureModel {
    /// Returns the undisturbed temperature at `depth` below grade after
    /// `time` has elapsed since the start of the simulation year.
    fn temperature(&self, depth: Length, time: Time) -> ThermodynamicTemperature;
}

/// A ground temperature that never varies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantGroundTemperature(pub ThermodynamicTemperature);

impl GroundTemperatureModel for ConstantGroundTemperature {
    fn temperature(&self, _depth: Length, _time: Time) -> ThermodynamicTemperature {
        self.0
    }
}

/// Kusuda–Achenbach annual surface wave damped with depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KusudaAchenbach {
    average: f64,
    amplitude: f64,
    phase_shift: f64,
    diffusivity: f64,
}

impl KusudaAchenbach {
    /// Creates the model from the mean surface temperature [°C], its annual
    /// amplitude [K], the day of minimum surface temperature, and the soil
    /// diffusivity [m²/s].
    ///
    /// # Errors
    ///
    /// Returns [`GhxError::InvalidConfig`] unless the diffusivity is positive
    /// and the other inputs are finite.
    pub fn new(
        average: f64,
        amplitude: f64,
        phase_shift_days: f64,
        diffusivity: f64,
    ) -> Result<Self, GhxError> {
        for (field, value) in [
            ("ground_temperature.average", average),
            ("ground_temperature.amplitude", amplitude),
            ("ground_temperature.phase_shift_days", phase_shift_days),
        ] {
            if !value.is_finite() {
                return Err(GhxError::invalid(field, format!("must be finite, got {value}")));
            }
        }
        Ok(Self {
            average,
            amplitude,
            phase_shift: phase_shift_days * SECONDS_PER_DAY,
            diffusivity: ensure_positive("ground_temperature.diffusivity", diffusivity)?,
        })
    }
}

impl GroundTemperatureModel for KusudaAchenbach {
    fn temperature(&self, depth: Length, time: Time) -> ThermodynamicTemperature {
        let z = depth.get::<meter>();
        let t = time.get::<second>();

        let damping = -z * (PI / (SECONDS_PER_YEAR * self.diffusivity)).sqrt();
        let lag = z / 2.0 * (SECONDS_PER_YEAR / (PI * self.diffusivity)).sqrt();
        let phase = 2.0 * PI / SECONDS_PER_YEAR * (t - self.phase_shift - lag);

        ThermodynamicTemperature::new::<degree_celsius>(
            self.average - self.amplitude * damping.exp() * phase.cos(),
        )
    }
}
