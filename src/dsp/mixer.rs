//! Mixer — sums branch outputs per channel with master gain.

/// A block mixer holding one accumulator per output channel.
#[derive(Debug, Clone)]
pub struct Mixer {
    pub master_gain: f64,
    buffers: Vec<Vec<f64>>,
}

impl Mixer {
    pub fn new(channels: usize, master_gain: f64) -> Self {
        Mixer {
            master_gain,
            buffers: vec![Vec::new(); channels],
        }
    }

    /// Prepare every channel with `num_frames` zeros.
    pub fn clear(&mut self, num_frames: usize) {
        for buf in &mut self.buffers {
            buf.clear();
            buf.resize(num_frames, 0.0);
        }
    }

    /// Add a sample to `channel` at `index`. Out-of-range writes are ignored.
    pub fn add(&mut self, channel: usize, index: usize, sample: f64) {
        if let Some(slot) = self.buffers.get_mut(channel).and_then(|b| b.get_mut(index)) {
            *slot += sample;
        }
    }

    /// Mixed channels with master gain applied.
    pub fn output(&self) -> Vec<Vec<f64>> {
        self.buffers
            .iter()
            .map(|buf| buf.iter().map(|&s| s * self.master_gain).collect())
            .collect()
    }

    pub fn channels(&self) -> usize {
        self.buffers.len()
    }

    /// Frames in the current block.
    pub fn len(&self) -> usize {
        self.buffers.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
