/// Position of the current step within the host simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimClock {
    /// Day of the current environment period, starting at 1.
    pub day_of_sim: u32,
    /// Hours elapsed since the start of the current day, including the
    /// fraction reached by sub-hourly steps.
    pub hours_into_day: f64,
    /// True while the host is iterating warmup days.
    pub warmup: bool,
    /// True on the first call of a new environment period.
    pub begin_environment: bool,
}

impl SimClock {
    /// Creates a clock positioned `hours` after the start of a run, outside
    /// warmup.
    #[must_use]
    pub fn at_hours(hours: f64) -> Self {
        let day = (hours / 24.0).floor();
        Self {
            day_of_sim: day as u32 + 1,
            hours_into_day: hours - day * 24.0,
            warmup: false,
            begin_environment: false,
        }
    }

    /// Hours elapsed since the start of the environment period.
    #[must_use]
    pub fn elapsed_hours(&self) -> f64 {
        f64::from(self.day_of_sim.saturating_sub(1)) * 24.0 + self.hours_into_day
    }

    /// Seconds elapsed since the start of the environment period.
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_hours() * 3600.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn round_trips_elapsed_hours() {
        for hours in [0.0, 0.25, 23.75, 24.0, 729.0, 8759.5] {
            assert_relative_eq!(SimClock::at_hours(hours).elapsed_hours(), hours, epsilon = 1e-9);
        }
        let clock = SimClock::at_hours(49.5);
        assert_eq!(clock.day_of_sim, 3);
        assert_relative_eq!(clock.hours_into_day, 1.5);
    }
}
