//! Shared numeric constants for the resonance engine.
//!
//! The golden-ratio values are written out as literals so they stay
//! `const`; they match `(1 + sqrt(5)) / 2` to the last bit of an f64.

/// Golden ratio φ = (1 + √5) / 2.
pub const PHI: f64 = 1.618_033_988_749_895;

/// γ = φ − 1 = 1/φ ≈ 0.618. Default peak-detection threshold.
pub const GAMMA: f64 = 0.618_033_988_749_894_9;

/// Reduced Planck constant analog used by the energy mapping.
pub const H_BAR: f64 = 1.0545718e-34;

/// Base resonance frequency in Hz.
pub const FREQ_718: f64 = 718.0;

/// Binaural offset (Schumann resonance) in Hz.
pub const BINAURAL_OFFSET: f64 = 7.83;

/// Length of the reference mtDNA sequence (rCRS). Upper bound for gate positions.
pub const MTDNA_LENGTH: u32 = 16569;

/// Default gate positions (1-based, rCRS).
pub const DEFAULT_GATE_POSITIONS: [u32; 18] = [
    1, 740, 951, 1227, 2996, 3424, 4166, 4832, 6393, 7756, 8415, 10059, 11200, 11336, 11915,
    13703, 14784, 16179,
];

/// Onset of each gate within the playback timeline, in seconds.
pub const GATE_TIMES: [f64; 18] = [
    0.0, 7.2, 14.4, 21.6, 28.8, 36.0, 43.2, 50.4, 57.6, 64.8, 72.0, 79.2, 86.4, 93.6, 100.8,
    108.0, 115.2, 122.4,
];

/// Seconds of playback attributed to each gate.
pub const GATE_DURATION: f64 = 7.2;

/// A magnitude below this is "near zero".
pub const NEAR_ZERO_THRESHOLD: f64 = 0.1;

/// A search whose best metric is below this counts as a success.
pub const SEARCH_SUCCESS_THRESHOLD: f64 = 0.5;

/// A magnitude below this is treated as an exact zero.
pub const EXACT_ZERO_THRESHOLD: f64 = 1e-4;

/// Minimum spacing between retained peaks, in seconds.
pub const PEAK_SPACING: f64 = 0.01;

/// Reference synthesis sample rate.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
