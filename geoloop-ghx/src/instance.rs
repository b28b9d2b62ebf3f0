//! Per-step simulation of one borefield.

use std::{f64::consts::PI, fmt};

use geoloop_thermo::fluid::LoopFluid;
use tracing::{debug, error, warn};
use uom::si::{
    f64::{MassRate, Power, ThermodynamicTemperature, Time, VolumeRate},
    mass_density::kilogram_per_cubic_meter,
    mass_rate::kilogram_per_second,
    power::watt,
    thermodynamic_temperature::degree_celsius,
    time::second,
    volume_rate::cubic_meter_per_second,
};

use crate::{
    GhxError, SimClock,
    borefield::{Borefield, DesignConditions},
    error::ensure_non_negative,
    ground::GroundTemperatureModel,
    history::{AggregationConfig, LoadHistory, Superposition},
    response::{GFunctionData, ResponseCache, ResponseTable},
};

/// Outlet minus inlet temperature difference that triggers a warning [K].
const DELTA_TEMPERATURE_LIMIT: f64 = 100.0;

/// Fluid temperature the design volume flow is converted to mass flow at.
const DESIGN_FLUID_TEMPERATURE_C: f64 = 20.0;

/// One-time initialization state of a [`BorefieldInstance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// G-functions have not been loaded or computed yet.
    Uninitialized,
    /// The g-function table is available.
    TableReady,
    /// Initialization failed; every later step fails too.
    Failed,
}

/// Boundary conditions supplied by the plant loop for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInput {
    pub clock: SimClock,
    pub inlet_temperature: ThermodynamicTemperature,
    pub mass_flow_rate: MassRate,
}

/// Results of one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    pub outlet_temperature: ThermodynamicTemperature,
    /// Heat added to the loop fluid, negative when heat is rejected to the
    /// ground.
    pub heat_transfer_rate: Power,
    pub borehole_wall_temperature: ThermodynamicTemperature,
    pub average_fluid_temperature: ThermodynamicTemperature,
    pub ground_temperature: ThermodynamicTemperature,
    pub mass_flow_rate: MassRate,
    /// Fluid to wall resistance used for the step [K·m/W].
    pub hx_resistance: f64,
    /// Heat rate per unit tube length [W/m].
    pub normalized_load: f64,
}

impl StepOutput {
    fn idle(temperature: ThermodynamicTemperature) -> Self {
        Self {
            outlet_temperature: temperature,
            heat_transfer_rate: Power::new::<watt>(0.0),
            borehole_wall_temperature: temperature,
            average_fluid_temperature: temperature,
            ground_temperature: temperature,
            mass_flow_rate: MassRate::new::<kilogram_per_second>(0.0),
            hx_resistance: 0.0,
            normalized_load: 0.0,
        }
    }
}

/// A borefield coupled to a loop fluid, a ground temperature model and a
/// load history.
///
/// G-functions are produced lazily on the first step, from the cache when
/// one is attached and holds a matching entry.
pub struct BorefieldInstance<F> {
    name: String,
    field: F,
    fluid: Box<dyn LoopFluid>,
    ground: Box<dyn GroundTemperatureModel>,
    cache: Option<ResponseCache>,
    design_flow_rate: f64,
    design_mass_flow_rate: f64,
    history: LoadHistory,
    lifecycle: Lifecycle,
    table: Option<ResponseTable>,
    environment_pending: bool,
    warned_large_delta: bool,
    last: StepOutput,
}

impl<F: Borefield> BorefieldInstance<F> {
    /// Couples `field` to its collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`GhxError::InvalidConfig`] for a negative design flow and
    /// [`GhxError::Property`] if the fluid density at 20 °C cannot be
    /// evaluated.
    pub fn new(
        name: impl Into<String>,
        field: F,
        fluid: Box<dyn LoopFluid>,
        ground: Box<dyn GroundTemperatureModel>,
        design_flow_rate: VolumeRate,
        aggregation: AggregationConfig,
    ) -> Result<Self, GhxError> {
        let design_flow_rate = ensure_non_negative(
            "design_flow_rate",
            design_flow_rate.get::<cubic_meter_per_second>(),
        )?;
        let density = fluid
            .density(ThermodynamicTemperature::new::<degree_celsius>(
                DESIGN_FLUID_TEMPERATURE_C,
            ))?
            .get::<kilogram_per_cubic_meter>();
        let history = LoadHistory::new(aggregation, field.max_sim_years());

        Ok(Self {
            name: name.into(),
            field,
            fluid,
            ground,
            cache: None,
            design_flow_rate,
            design_mass_flow_rate: design_flow_rate * density,
            history,
            lifecycle: Lifecycle::Uninitialized,
            table: None,
            environment_pending: true,
            warned_large_delta: false,
            last: StepOutput::idle(ThermodynamicTemperature::new::<degree_celsius>(0.0)),
        })
    }

    /// Persists computed g-functions in `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn field(&self) -> &F {
        &self.field
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[must_use]
    pub fn history(&self) -> &LoadHistory {
        &self.history
    }

    /// The g-function table once initialization has succeeded.
    #[must_use]
    pub fn table(&self) -> Option<&ResponseTable> {
        self.table.as_ref()
    }

    #[must_use]
    pub fn design_mass_flow_rate(&self) -> MassRate {
        MassRate::new::<kilogram_per_second>(self.design_mass_flow_rate)
    }

    /// Design volume flow [m³/s].
    #[must_use]
    pub fn design_flow_rate(&self) -> f64 {
        self.design_flow_rate
    }

    /// Loads or computes the g-function table.
    ///
    /// Repeated calls after success do nothing.
    ///
    /// # Errors
    ///
    /// Returns the computation error on the failing call and
    /// [`GhxError::Failed`] on every call after it.
    pub fn initialize(
        &mut self,
        inlet_temperature: ThermodynamicTemperature,
    ) -> Result<(), GhxError> {
        match self.lifecycle {
            Lifecycle::TableReady => return Ok(()),
            Lifecycle::Failed => return Err(GhxError::Failed(self.name.clone())),
            Lifecycle::Uninitialized => {}
        }

        let table = self
            .fluid
            .properties(inlet_temperature)
            .map_err(GhxError::from)
            .and_then(|fluid| {
                self.g_functions(&DesignConditions {
                    mass_flow_rate: self.design_mass_flow_rate,
                    fluid,
                })
            })
            .and_then(|data| ResponseTable::new(data.table).map_err(GhxError::from));

        match table {
            Ok(table) => {
                self.table = Some(table);
                self.lifecycle = Lifecycle::TableReady;
                Ok(())
            }
            Err(err) => {
                error!(instance = %self.name, error = %err, "g-function initialization failed");
                self.lifecycle = Lifecycle::Failed;
                Err(err)
            }
        }
    }

    fn g_functions(&self, conditions: &DesignConditions) -> Result<GFunctionData, GhxError> {
        let Some(cache) = self.cache.as_ref().filter(|_| self.field.uses_cache()) else {
            return self.field.compute_g_functions(conditions);
        };
        let fingerprint = self.field.fingerprint(conditions)?;
        if let Some(data) = cache.load(&fingerprint) {
            return Ok(data);
        }
        let data = self.field.compute_g_functions(conditions)?;
        cache.store(&fingerprint, &data);
        Ok(data)
    }

    fn begin_environment(&mut self, time: Time) {
        debug!(instance = %self.name, "beginning environment");
        self.environment_pending = false;
        self.history.reset();
        let ground = self.field.ground_temperature(self.ground.as_ref(), time);
        self.last = StepOutput::idle(ground);
    }

    /// Advances the borefield by one step.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails or has failed before, or if
    /// a fluid property or g-function lookup fails.
    pub fn step(&mut self, input: &StepInput) -> Result<StepOutput, GhxError> {
        let clock = input.clock;
        let time = Time::new::<second>(clock.elapsed_seconds());
        if clock.begin_environment && self.environment_pending {
            self.begin_environment(time);
        }
        if !clock.begin_environment {
            self.environment_pending = true;
        }

        let ground = self
            .field
            .ground_temperature(self.ground.as_ref(), time)
            .get::<degree_celsius>();
        let mass_flow = input.mass_flow_rate.get::<kilogram_per_second>();
        self.last.ground_temperature = ThermodynamicTemperature::new::<degree_celsius>(ground);
        self.last.mass_flow_rate = input.mass_flow_rate;

        self.initialize(input.inlet_temperature)?;

        let Some(now) = self.history.advance(&clock) else {
            return Ok(self.last);
        };

        let inlet = input.inlet_temperature.get::<degree_celsius>();
        let fluid = self.fluid.properties(input.inlet_temperature)?;
        let hx_resistance = self.field.hx_resistance(&fluid, mass_flow);
        let superposition = self.superpose()?;

        let solution = Solution::solve(&Conditions {
            ground,
            inlet,
            mass_flow,
            specific_heat: fluid.specific_heat_si(),
            tube_length: self.field.total_tube_length(),
            hx_resistance,
            first_step_response: || self.response(now),
            superposition,
        })?;

        self.history.record_load(solution.load);

        let output = StepOutput {
            outlet_temperature: ThermodynamicTemperature::new::<degree_celsius>(solution.outlet),
            heat_transfer_rate: Power::new::<watt>(solution.load * self.field.total_tube_length()),
            borehole_wall_temperature: ThermodynamicTemperature::new::<degree_celsius>(
                ground - superposition.history(),
            ),
            average_fluid_temperature: ThermodynamicTemperature::new::<degree_celsius>(
                solution.average,
            ),
            ground_temperature: ThermodynamicTemperature::new::<degree_celsius>(ground),
            mass_flow_rate: input.mass_flow_rate,
            hx_resistance,
            normalized_load: solution.load,
        };
        self.check_delta(&clock, inlet, &output);
        self.last = output;
        Ok(output)
    }

    /// Thermal response per unit load `elapsed_hours` after a step [K·m/W].
    fn response(&self, elapsed_hours: f64) -> Result<f64, GhxError> {
        let table = self
            .table
            .as_ref()
            .ok_or_else(|| GhxError::Failed(self.name.clone()))?;
        let g = self
            .field
            .g_function(table, elapsed_hours / self.field.time_scale_hours())?;
        Ok(g / (2.0 * PI * self.field.soil_conductivity()))
    }

    fn superpose(&self) -> Result<Superposition, GhxError> {
        self.history.superpose(|elapsed| self.response(elapsed))
    }

    fn check_delta(&mut self, clock: &SimClock, inlet: f64, output: &StepOutput) {
        let delta = (output.outlet_temperature.get::<degree_celsius>() - inlet).abs();
        if delta <= DELTA_TEMPERATURE_LIMIT || clock.warmup || self.warned_large_delta {
            return;
        }
        self.warned_large_delta = true;
        warn!(
            instance = %self.name,
            delta,
            mass_flow_rate = output.mass_flow_rate.get::<kilogram_per_second>(),
            design_mass_flow_rate = self.design_mass_flow_rate,
            "outlet differs from inlet by more than 100 °C; check design inputs and g-functions"
        );
    }
}

impl<F: fmt::Debug> fmt::Debug for BorefieldInstance<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BorefieldInstance")
            .field("name", &self.name)
            .field("field", &self.field)
            .field("fluid", &self.fluid.name())
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

struct Conditions<R> {
    ground: f64,
    inlet: f64,
    mass_flow: f64,
    specific_heat: f64,
    tube_length: f64,
    hx_resistance: f64,
    first_step_response: R,
    superposition: Superposition,
}

/// Normalized load and fluid temperatures of one step.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Solution {
    load: f64,
    average: f64,
    outlet: f64,
}

impl Solution {
    /// Solves the fluid energy balance against the ground response.
    ///
    /// With no flow the fluid passes through unchanged and no heat moves.
    fn solve<R>(c: &Conditions<R>) -> Result<Self, GhxError>
    where
        R: Fn() -> Result<f64, GhxError>,
    {
        let history = c.superposition.history();
        if c.mass_flow <= 0.0 {
            return Ok(Self {
                load: 0.0,
                average: c.ground - history,
                outlet: c.inlet,
            });
        }

        let capacity_rate = c.mass_flow * c.specific_heat;
        let half_length = c.tube_length / (2.0 * capacity_rate);

        match c.superposition {
            Superposition::FirstStep => {
                let ground_resistance = (c.first_step_response)()?;
                let load = (c.ground - c.inlet)
                    / (ground_resistance + c.hx_resistance + half_length);
                Ok(Self {
                    load,
                    average: c.ground - load * c.hx_resistance,
                    outlet: c.ground - load * (ground_resistance + c.hx_resistance - half_length),
                })
            }
            Superposition::Superposed {
                history,
                latest_response,
                latest_load,
            } => {
                let undisturbed = c.ground - (history - latest_load * latest_response);
                let load = (undisturbed - c.inlet)
                    / (c.hx_resistance + latest_response - half_length
                        + c.tube_length / capacity_rate);
                Ok(Self {
                    load,
                    average: undisturbed - (latest_response + c.hx_resistance) * load,
                    outlet: undisturbed + (half_length - latest_response - c.hx_resistance) * load,
                })
            }
        }
    }
}
