//! Sample buffer — per-channel f64 audio produced by the synthesizers.

use crate::error::{EngineError, EngineResult, check_sample_rate};

/// Non-interleaved audio: one vector per channel, all the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    samples: Vec<Vec<f64>>,
}

impl SampleBuffer {
    /// Build a buffer, checking the sample rate and channel layout.
    pub fn new(sample_rate: u32, samples: Vec<Vec<f64>>) -> EngineResult<Self> {
        check_sample_rate(sample_rate)?;
        if samples.is_empty() || samples.len() > u8::MAX as usize {
            return Err(EngineError::InvalidChannelCount(samples.len()));
        }
        let expected = samples[0].len();
        if let Some((channel, ch)) = samples.iter().enumerate().find(|(_, ch)| ch.len() != expected) {
            return Err(EngineError::ChannelLengthMismatch {
                channel,
                expected,
                found: ch.len(),
            });
        }
        Ok(SampleBuffer {
            sample_rate,
            samples,
        })
    }

    pub fn mono(sample_rate: u32, samples: Vec<f64>) -> EngineResult<Self> {
        SampleBuffer::new(sample_rate, vec![samples])
    }

    /// A silent buffer of `frames` frames.
    pub fn silence(sample_rate: u32, channels: u8, frames: usize) -> EngineResult<Self> {
        SampleBuffer::new(sample_rate, vec![vec![0.0; frames]; channels as usize])
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u8 {
        // Bounded to 1..=255 by `new`.
        self.samples.len() as u8
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        self.samples[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    pub fn duration_seconds(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.samples.get(index).map(Vec::as_slice)
    }

    pub fn samples(&self) -> &[Vec<f64>] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Vec<f64>> {
        self.samples
    }

    /// Frame-major interleaving: `[ch0[0], ch1[0], ch0[1], ch1[1], ...]`.
    pub fn interleaved(&self) -> Vec<f64> {
        let channels = self.samples.len();
        let mut out = Vec::with_capacity(self.frames() * channels);
        for frame in 0..self.frames() {
            for ch in &self.samples {
                out.push(ch[frame]);
            }
        }
        out
    }

    /// Average all channels into one.
    pub fn mixdown_mono(&self) -> Vec<f64> {
        if self.samples.len() == 1 {
            return self.samples[0].clone();
        }
        let n = self.samples.len() as f64;
        (0..self.frames())
            .map(|i| self.samples.iter().map(|ch| ch[i]).sum::<f64>() / n)
            .collect()
    }

    /// Largest absolute sample value over all channels (0 when empty).
    pub fn peak(&self) -> f64 {
        self.samples
            .iter()
            .flatten()
            .fold(0.0_f64, |acc, &s| acc.max(s.abs()))
    }
}
