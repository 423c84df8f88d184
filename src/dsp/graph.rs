//! Synthesis graph — sine generators feeding gain stages into a mixer.
//!
//! Topology: every output oscillator has a gain stage routed to one or more
//! channels. A modulator oscillator does not reach the channels; it adds
//! `depth * value` to its target's gain parameter, so the target's
//! effective gain at time t is `gain + Σ depth·m(t)`.
//!
//! The offline render and [`super::stream::GraphStream`] both go through
//! [`SynthGraph::render_block`], so what is analysed is what is heard.

use crate::config::{OscillatorRole, SynthConfig};
use crate::error::EngineResult;

use super::buffer::SampleBuffer;
use super::mixer::Mixer;
use super::oscillator::Oscillator;

/// Frames rendered per block.
pub const BLOCK_SIZE: usize = 4096;

/// One output branch: oscillator → gain (+ modulators) → channels.
#[derive(Debug, Clone)]
struct Branch {
    oscillator: Oscillator,
    gain: f64,
    channels: Vec<usize>,
    /// (modulator, depth)
    modulators: Vec<(Oscillator, f64)>,
}

impl Branch {
    fn gain_at(&self, index: u64) -> f64 {
        self.modulators
            .iter()
            .fold(self.gain, |g, (m, depth)| g + depth * m.value_at(index))
    }
}

/// A validated, ready-to-render oscillator graph.
#[derive(Debug, Clone)]
pub struct SynthGraph {
    sample_rate: u32,
    channels: usize,
    master_gain: f64,
    branches: Vec<Branch>,
}

impl SynthGraph {
    pub fn from_config(config: &SynthConfig) -> EngineResult<Self> {
        config.validate()?;
        let sr = config.sample_rate as f64;

        let mut branches: Vec<Option<Branch>> = config
            .oscillators
            .iter()
            .map(|def| match &def.role {
                OscillatorRole::Output { channels } => Some(Branch {
                    oscillator: Oscillator::new(def.frequency, sr),
                    gain: def.gain,
                    channels: channels.iter().map(|&c| c as usize).collect(),
                    modulators: Vec::new(),
                }),
                OscillatorRole::Modulator { .. } => None,
            })
            .collect();

        for def in &config.oscillators {
            if let OscillatorRole::Modulator { target } = def.role {
                // `validate` guarantees the target is an output branch.
                if let Some(Some(branch)) = branches.get_mut(target) {
                    branch
                        .modulators
                        .push((Oscillator::new(def.frequency, sr), def.gain));
                }
            }
        }

        let branches: Vec<Branch> = branches.into_iter().flatten().collect();
        log::debug!(
            "synth graph: {} branches, {} channels, {} Hz",
            branches.len(),
            config.channels,
            config.sample_rate
        );

        Ok(SynthGraph {
            sample_rate: config.sample_rate,
            channels: config.channels as usize,
            master_gain: config.master_gain,
            branches,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `floor(sample_rate * duration)` frames.
    pub fn frame_count(&self, duration_seconds: f64) -> usize {
        (self.sample_rate as f64 * duration_seconds).floor() as usize
    }

    pub fn new_mixer(&self) -> Mixer {
        Mixer::new(self.channels, self.master_gain)
    }

    /// Render frames `start .. start + len` into `mixer` (cleared first).
    pub fn render_block(&self, mixer: &mut Mixer, start: u64, len: usize) {
        mixer.clear(len);
        for branch in &self.branches {
            for i in 0..len {
                let index = start + i as u64;
                let value = branch.oscillator.value_at(index) * branch.gain_at(index);
                for &ch in &branch.channels {
                    mixer.add(ch, i, value);
                }
            }
        }
    }

    /// Offline render of `duration_seconds`.
    pub fn render(&self, duration_seconds: f64) -> EngineResult<SampleBuffer> {
        crate::error::check_duration(duration_seconds)?;
        let total = self.frame_count(duration_seconds);
        let mut out = vec![Vec::with_capacity(total); self.channels];
        let mut mixer = self.new_mixer();

        let mut start = 0;
        while start < total {
            let len = BLOCK_SIZE.min(total - start);
            self.render_block(&mut mixer, start as u64, len);
            for (dst, src) in out.iter_mut().zip(mixer.output()) {
                dst.extend_from_slice(&src);
            }
            start += len;
        }

        SampleBuffer::new(self.sample_rate, out)
    }
}

/// Build the graph described by `config` and render its configured duration.
pub fn render(config: &SynthConfig) -> EngineResult<SampleBuffer> {
    SynthGraph::from_config(config)?.render(config.duration_seconds)
}
