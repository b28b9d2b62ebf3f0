//! Multi-resolution load history and temporal superposition.
//!
//! Normalized loads [W/m] are kept at three resolutions. Sub-hourly values
//! cover the most recent steps, hourly averages cover roughly the last month,
//! and monthly averages cover everything older. Each hour boundary folds the
//! sub-hourly steps of the finished hour into one time-weighted hourly value.
//! Each 730-hour boundary folds the last 730 hourly values into one monthly
//! value.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::SimClock;

/// Hours in one aggregation month.
pub const HOURS_PER_MONTH: usize = 730;

/// Upper bound on system steps per hour retained at sub-hourly resolution.
const MAX_STEPS_PER_HOUR: usize = 60;

/// Divisor used when the steps folded into an hour span no time.
const DEGENERATE_SPAN_HOURS: f64 = 0.05;

/// How many hours each resolution keeps before superposition moves on to the
/// coarser one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregationConfig {
    /// Hours superposed at sub-hourly resolution.
    pub sub_hourly_depth: usize,
    /// Hours superposed at hourly resolution before monthly blocks take over.
    pub hourly_depth: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            sub_hourly_depth: 15,
            hourly_depth: 192,
        }
    }
}

/// Outcome of superposing the retained load history at the current time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Superposition {
    /// No earlier step exists; the current load acts alone.
    FirstStep,
    /// Contribution of the retained history.
    Superposed {
        /// Wall temperature depression from every retained load block [K].
        history: f64,
        /// Thermal response to the most recent step's load block [K·m/W].
        latest_response: f64,
        /// Normalized load of the most recent step [W/m].
        latest_load: f64,
    },
}

impl Superposition {
    /// Wall temperature depression from the retained history [K].
    #[must_use]
    pub fn history(&self) -> f64 {
        match self {
            Self::FirstStep => 0.0,
            Self::Superposed { history, .. } => *history,
        }
    }
}

/// Bounded load history for one borefield.
#[derive(Debug, Clone)]
pub struct LoadHistory {
    config: AggregationConfig,
    step_times: Vec<f64>,
    sub_hourly: Vec<f64>,
    hourly: Vec<f64>,
    monthly: Vec<f64>,
    hour_start_steps: Vec<usize>,
    step: usize,
    recorded_step: usize,
    prev_hour: u32,
    pending_load: f64,
    time: f64,
    restart_pending: bool,
    design_day_reset: bool,
}

impl LoadHistory {
    /// Creates an empty history sized for `max_sim_years` of monthly blocks.
    #[must_use]
    pub fn new(config: AggregationConfig, max_sim_years: u32) -> Self {
        let sub_hourly_len = (config.sub_hourly_depth + 1) * MAX_STEPS_PER_HOUR + 1;
        let hourly_len = HOURS_PER_MONTH + config.hourly_depth + config.sub_hourly_depth;
        Self {
            config,
            step_times: vec![0.0; sub_hourly_len],
            sub_hourly: vec![0.0; sub_hourly_len],
            hourly: vec![0.0; hourly_len],
            monthly: vec![0.0; max_sim_years as usize * 12],
            hour_start_steps: vec![0; config.sub_hourly_depth + 1],
            step: 1,
            recorded_step: 1,
            prev_hour: 1,
            pending_load: 0.0,
            time: 0.0,
            restart_pending: true,
            design_day_reset: false,
        }
    }

    #[must_use]
    pub fn config(&self) -> AggregationConfig {
        self.config
    }

    /// Clears all stored loads at the start of an environment period.
    pub fn reset(&mut self) {
        self.step_times.fill(0.0);
        self.sub_hourly.fill(0.0);
        self.hourly.fill(0.0);
        self.monthly.fill(0.0);
        self.hour_start_steps.fill(0);
        self.prev_hour = 1;
        self.pending_load = 0.0;
        self.time = 0.0;
    }

    /// Moves the history to the time of `clock`.
    ///
    /// Applies the warmup and design-day restart rules, records a new step
    /// when the time has moved, folds the previous step's load into the
    /// sub-hourly sequence, and aggregates at hour and month boundaries.
    ///
    /// Returns the elapsed hours, or `None` when the time has not moved past
    /// zero and no response should be computed.
    pub fn advance(&mut self, clock: &SimClock) -> Option<f64> {
        if self.design_day_reset && clock.warmup {
            self.restart_pending = true;
        }
        if clock.day_of_sim == 1 && self.restart_pending {
            trace!("restarting load history");
            self.time = 0.0;
            self.step_times.fill(0.0);
            self.sub_hourly.fill(0.0);
            self.hourly.fill(0.0);
            self.monthly.fill(0.0);
            self.hour_start_steps.fill(1);
            self.step = 1;
            self.restart_pending = false;
            self.design_day_reset = false;
        }

        let time = clock.elapsed_hours();
        self.time = time;
        if clock.day_of_sim > 1 {
            self.restart_pending = true;
        }
        if !clock.warmup {
            self.design_day_reset = true;
        }

        if time <= 0.0 {
            self.step_times.fill(0.0);
            return None;
        }

        if self.step_times[0] != time {
            shift_in(&mut self.step_times, time);
            self.step += 1;
        }
        if self.step != self.recorded_step {
            self.recorded_step = self.step;
            shift_in(&mut self.sub_hourly, self.pending_load);
        }

        self.aggregate();
        Some(time)
    }

    /// Stores the load computed for the current step.
    ///
    /// It enters the sub-hourly sequence when the next step begins.
    pub fn record_load(&mut self, load: f64) {
        self.pending_load = load;
    }

    /// Superposes the retained load blocks at the current time.
    ///
    /// `response` maps hours elapsed since a block began to the thermal
    /// response per unit load [K·m/W].
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `response`.
    pub fn superpose<E, F>(&self, mut response: F) -> Result<Superposition, E>
    where
        F: FnMut(f64) -> Result<f64, E>,
    {
        if self.step <= 1 {
            return Ok(Superposition::FirstStep);
        }

        let t = self.time;
        let sub_depth = self.config.sub_hourly_depth;
        let whole_hours = t as usize;
        let fraction = t - whole_hours as f64;

        let history = if t < self.monthly_threshold() {
            let index = whole_hours.min(sub_depth);
            let sub_limit = self.sub_hourly_limit(index);
            let mut sum = 0.0;
            for i in 1..=sub_limit {
                let r = response(t - self.step_times[i])?;
                let next = if i < sub_limit {
                    self.sub_hourly[i]
                } else if whole_hours >= sub_depth {
                    self.hourly[index]
                } else {
                    0.0
                };
                sum += (self.sub_hourly[i - 1] - next) * r;
            }
            for i in (sub_depth + 1)..=whole_hours {
                if i == whole_hours {
                    sum += self.hourly[i - 1] * response(t)?;
                } else {
                    sum += (self.hourly[i - 1] - self.hourly[i]) * response(fraction + i as f64)?;
                }
            }
            sum
        } else {
            let months = ((t + 1.0) / HOURS_PER_MONTH as f64) as usize;
            let current_month = if t < (months * HOURS_PER_MONTH) as f64 + self.hourly_span() {
                months - 1
            } else {
                months
            };

            let mut sum = 0.0;
            for i in 1..=current_month {
                let previous = if i == 1 { 0.0 } else { self.monthly_load(i - 1) };
                let elapsed = t - ((i - 1) * HOURS_PER_MONTH) as f64;
                sum += (self.monthly_load(i) - previous) * response(elapsed)?;
            }

            let hourly_limit = (t - (current_month * HOURS_PER_MONTH) as f64) as usize;
            for i in (sub_depth + 1)..=hourly_limit {
                let next = if i == hourly_limit {
                    self.monthly_load(current_month)
                } else {
                    self.hourly[i]
                };
                sum += (self.hourly[i - 1] - next) * response(fraction + i as f64)?;
            }

            let sub_limit = self.sub_hourly_limit(sub_depth);
            for i in 1..=sub_limit {
                let next = if i == sub_limit {
                    self.hourly[sub_depth]
                } else {
                    self.sub_hourly[i]
                };
                sum += (self.sub_hourly[i - 1] - next) * response(t - self.step_times[i])?;
            }
            sum
        };

        let latest_response = response(t - self.step_times[1])?;
        Ok(Superposition::Superposed {
            history,
            latest_response,
            latest_load: self.sub_hourly[0],
        })
    }

    /// Elapsed hours at the most recent call to [`LoadHistory::advance`].
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of distinct steps since the last restart, counting the initial
    /// state as one.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.step
    }

    /// Sub-hourly loads, most recent first.
    #[must_use]
    pub fn sub_hourly(&self) -> &[f64] {
        &self.sub_hourly
    }

    /// Hourly averages, most recent first.
    #[must_use]
    pub fn hourly(&self) -> &[f64] {
        &self.hourly
    }

    /// Monthly averages in chronological order.
    #[must_use]
    pub fn monthly(&self) -> &[f64] {
        &self.monthly
    }

    fn hourly_span(&self) -> f64 {
        (self.config.hourly_depth + self.config.sub_hourly_depth) as f64
    }

    fn monthly_threshold(&self) -> f64 {
        HOURS_PER_MONTH as f64 + self.hourly_span()
    }

    /// Number of sub-hourly steps taken since the hour boundary `index` hours
    /// back.
    fn sub_hourly_limit(&self, index: usize) -> usize {
        let start = self.hour_start_steps[index.min(self.hour_start_steps.len() - 1)];
        self.step
            .saturating_sub(start)
            .min(self.step_times.len() - 1)
    }

    /// Load of the 1-based aggregation month, zero if it was never filled.
    fn monthly_load(&self, month: usize) -> f64 {
        month
            .checked_sub(1)
            .and_then(|i| self.monthly.get(i))
            .copied()
            .unwrap_or(0.0)
    }

    fn aggregate(&mut self) {
        if self.time <= 0.0 {
            return;
        }

        let local_hour = (self.time % 24.0) as u32 + 1;
        let local_day = (self.time / 24.0 + 1.0) as u32;
        let hour_changed = self.prev_hour != local_hour;

        if hour_changed {
            let limit = self
                .step
                .saturating_sub(self.hour_start_steps[0])
                .min(self.step_times.len() - 1);
            let energy: f64 = (0..limit)
                .map(|j| self.sub_hourly[j] * (self.step_times[j] - self.step_times[j + 1]).abs())
                .sum();
            let span = (self.step_times[0] - self.step_times[limit]).abs();
            let load = if span > 0.0 {
                energy / span
            } else {
                energy / DEGENERATE_SPAN_HOURS
            };
            shift_in(&mut self.hourly, load);
            shift_in(&mut self.hour_start_steps, self.step);
        }

        let hour_of_run = (local_day - 1) * 24 + local_hour;
        if hour_changed && hour_of_run as usize % HOURS_PER_MONTH == 0 {
            let month = (local_day * 24 + local_hour) as usize / HOURS_PER_MONTH;
            let mean = self.hourly[..HOURS_PER_MONTH].iter().sum::<f64>() / HOURS_PER_MONTH as f64;
            if self.monthly.len() < month {
                self.monthly.resize(month, 0.0);
            }
            self.monthly[month - 1] = mean;
            trace!(month, mean, "promoted hourly loads to monthly block");
        }

        self.prev_hour = local_hour;
    }
}

/// Shifts every element one slot toward the end and stores `value` first.
fn shift_in<T: Copy>(values: &mut [T], value: T) {
    if values.is_empty() {
        return;
    }
    values.rotate_right(1);
    values[0] = value;
}
