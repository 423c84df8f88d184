//! Sine oscillators evaluated in closed form.
//!
//! Each sample is computed directly from its index, so an offline render and
//! a block-by-block live stream produce identical values for the same frame.

use std::f64::consts::PI;

/// A sine generator at a fixed frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct Oscillator {
    pub frequency: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(frequency: f64, sample_rate: f64) -> Self {
        Oscillator {
            frequency,
            sample_rate,
        }
    }

    /// Value at an absolute time in seconds.
    pub fn value_at_time(&self, t: f64) -> f64 {
        (2.0 * PI * self.frequency * t).sin()
    }

    /// Value at frame `index` (time `index / sample_rate`).
    pub fn value_at(&self, index: u64) -> f64 {
        self.value_at_time(index as f64 / self.sample_rate)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}
