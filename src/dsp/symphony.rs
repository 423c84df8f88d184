//! Eighteen-gate symphony — the offline mono render the correlation
//! analyzer runs on.
//!
//! Each gate position becomes a Gaussian-enveloped sine centred at
//! `pos / domain_length * duration`. A low "earth" tone is mixed under the
//! gates and the result is peak-normalized to 1.0.

use crate::config::SymphonyConfig;
use crate::constants::{GAMMA, PHI};
use crate::error::EngineResult;

use super::buffer::SampleBuffer;
use super::oscillator::Oscillator;

/// Per-gate tone parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GateVoice {
    /// Envelope centre in seconds.
    pub start_time: f64,
    pub frequency: f64,
    pub weight: f64,
}

/// Frequency, weight and onset of every gate in `config`.
pub fn gate_voices(config: &SymphonyConfig) -> Vec<GateVoice> {
    config
        .gate_positions
        .iter()
        .enumerate()
        .map(|(i, &pos)| GateVoice {
            start_time: pos as f64 / config.domain_length as f64 * config.duration_seconds,
            frequency: config.gate_span * (1.0 + (i as f64 * GAMMA) % 1.0) + config.base_frequency,
            weight: PHI.powi((i % 7) as i32) % 1.0,
        })
        .collect()
}

pub fn render_symphony(config: &SymphonyConfig) -> EngineResult<SampleBuffer> {
    config.validate()?;
    let sr = config.sample_rate as f64;
    let total = (sr * config.duration_seconds).floor() as usize;
    let voices = gate_voices(config);
    let two_sigma_sq = 2.0 * config.envelope_width.powi(2);
    let earth = Oscillator::new(config.earth_frequency, sr);

    log::debug!(
        "rendering symphony: {} gates, {:.1}s at {} Hz",
        voices.len(),
        config.duration_seconds,
        config.sample_rate
    );

    let mut wave: Vec<f64> = (0..total)
        .map(|i| earth.value_at(i as u64) * config.earth_amplitude)
        .collect();
    for voice in &voices {
        let tone = Oscillator::new(voice.frequency, sr);
        let amp = voice.weight * GAMMA;
        for (i, sample) in wave.iter_mut().enumerate() {
            let t = i as f64 / sr;
            let envelope = (-(t - voice.start_time).powi(2) / two_sigma_sq).exp();
            *sample += tone.value_at_time(t) * envelope * amp;
        }
    }

    let max_abs = wave.iter().fold(0.0_f64, |m, &s| m.max(s.abs()));
    if max_abs > 0.0 {
        for s in &mut wave {
            *s /= max_abs;
        }
    }

    SampleBuffer::mono(config.sample_rate, wave)
}
