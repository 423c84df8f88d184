//! Live playback adapter — pulls interleaved blocks from a [`SynthGraph`].
//!
//! Realtime backends (AudioWorklet, cpal callbacks) ask for a fixed number
//! of frames at a time. `GraphStream` keeps a frame cursor and renders each
//! request through the same block path as the offline render.

use super::graph::SynthGraph;
use super::mixer::Mixer;

#[derive(Debug, Clone)]
pub struct GraphStream {
    graph: SynthGraph,
    mixer: Mixer,
    cursor: u64,
    /// `None` streams forever.
    total_frames: Option<u64>,
}

impl GraphStream {
    /// Stream `duration_seconds` worth of frames, or forever when `None`.
    pub fn new(graph: SynthGraph, duration_seconds: Option<f64>) -> Self {
        let total_frames = duration_seconds.map(|d| graph.frame_count(d.max(0.0)) as u64);
        let mixer = graph.new_mixer();
        GraphStream {
            graph,
            mixer,
            cursor: 0,
            total_frames,
        }
    }

    pub fn position_frames(&self) -> u64 {
        self.cursor
    }

    pub fn position_seconds(&self) -> f64 {
        self.cursor as f64 / self.graph.sample_rate() as f64
    }

    pub fn is_finished(&self) -> bool {
        self.total_frames.is_some_and(|total| self.cursor >= total)
    }

    pub fn channels(&self) -> usize {
        self.graph.channels()
    }

    /// Jump to an absolute frame.
    pub fn seek(&mut self, frame: u64) {
        self.cursor = match self.total_frames {
            Some(total) => frame.min(total),
            None => frame,
        };
    }

    /// Render up to `frames` frames as interleaved f32. Returns fewer (or
    /// none) once the end of a finite stream is reached.
    pub fn next_block(&mut self, frames: usize) -> Vec<f32> {
        let remaining = match self.total_frames {
            Some(total) => total.saturating_sub(self.cursor) as usize,
            None => frames,
        };
        let len = frames.min(remaining);
        if len == 0 {
            return Vec::new();
        }

        self.graph.render_block(&mut self.mixer, self.cursor, len);
        let mixed = self.mixer.output();
        let mut out = Vec::with_capacity(len * mixed.len());
        for i in 0..len {
            for ch in &mixed {
                out.push(ch[i] as f32);
            }
        }
        self.cursor += len as u64;
        out
    }
}
