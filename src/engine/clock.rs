// Fixed timestep accumulator for headless tick loops
//
// The simulation consumes a variable delta per tick, but hosts without a
// frame loop of their own want a steady cadence. Animation data is sampled
// at 30 Hz, so that is the default rate.

use std::time::Duration;

/// Default tick rate matching the animation sample rate.
pub const TICK_RATE: f32 = 30.0;

/// Maximum catch-up steps per advance to prevent spiral of death.
const MAX_STEPS: u32 = 5;

pub struct FixedClock {
    step: Duration,
    accumulator: Duration,
}

impl FixedClock {
    pub fn new() -> Self {
        Self::with_rate(TICK_RATE)
    }

    pub fn with_rate(rate: f32) -> Self {
        Self {
            step: Duration::from_secs_f32(1.0 / rate),
            accumulator: Duration::ZERO,
        }
    }

    /// Feed elapsed wall time; returns the number of fixed steps to run.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;
        let mut steps = 0;
        while self.accumulator >= self.step && steps < MAX_STEPS {
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }

    /// Length of one fixed step in seconds.
    pub fn timestep(&self) -> f32 {
        self.step.as_secs_f32()
    }

    /// Interpolation fraction into the next step, for rendering.
    pub fn alpha(&self) -> f32 {
        self.accumulator.as_secs_f32() / self.step.as_secs_f32()
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::new()
    }
}
