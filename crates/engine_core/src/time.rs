//! Fixed-step frame clock for the simulation loop.

use std::time::Duration;

/// Substeps allowed per host frame before the backlog is discarded.
pub const MAX_SUBSTEPS: u32 = 5;

/// Splits variable host frame times into fixed simulation steps.
#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Fixed simulation step.
    step: Duration,
    /// Unconsumed host time.
    accumulator: Duration,
    /// Total simulated time.
    elapsed: Duration,
    /// Simulation steps taken since start.
    step_count: u64,
    /// Host frames whose backlog exceeded [`MAX_SUBSTEPS`].
    dropped_frames: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(60.0)
    }
}

impl FrameClock {
    /// Create a clock stepping at `hz` updates per second.
    pub fn new(hz: f64) -> Self {
        let hz = if hz > 0.0 { hz } else { 60.0 };
        Self {
            step: Duration::from_secs_f64(1.0 / hz),
            accumulator: Duration::ZERO,
            elapsed: Duration::ZERO,
            step_count: 0,
            dropped_frames: 0,
        }
    }

    /// Fixed step in seconds.
    pub fn step_seconds(&self) -> f32 {
        self.step.as_secs_f32()
    }

    /// Feed one host frame and return how many fixed steps to run.
    pub fn advance(&mut self, frame: Duration) -> u32 {
        self.accumulator += frame;
        let mut steps = 0;
        while self.accumulator >= self.step && steps < MAX_SUBSTEPS {
            self.accumulator -= self.step;
            steps += 1;
        }
        if self.accumulator >= self.step {
            log::trace!("frame clock dropping {:?} of backlog", self.accumulator);
            self.accumulator = Duration::ZERO;
            self.dropped_frames += 1;
        }
        self.step_count += u64::from(steps);
        self.elapsed += self.step * steps;
        steps
    }

    /// Fraction of a step left in the accumulator, for interpolation.
    pub fn alpha(&self) -> f32 {
        self.accumulator.as_secs_f32() / self.step.as_secs_f32()
    }

    /// Total simulated time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }
}
