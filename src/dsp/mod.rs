//! DSP — synthesis, WAV encoding and peak detection.
//!
//! Everything here is deterministic and sample-index based, so the offline
//! render (WAV export, analysis) and the live stream produce identical
//! samples for the same graph.

pub mod buffer;
pub mod graph;
pub mod mixer;
pub mod oscillator;
pub mod peaks;
pub mod renderer;
pub mod stream;
pub mod symphony;
