//! Engine configuration.
//!
//! Every struct deserializes with `#[serde(default)]`, so a caller only
//! supplies the fields it wants to change. Defaults are the reference
//! constants of the calculators.

use serde::{Deserialize, Serialize};

use crate::constants::{
    BINAURAL_OFFSET, DEFAULT_GATE_POSITIONS, DEFAULT_SAMPLE_RATE, FREQ_718, GAMMA, H_BAR,
    MTDNA_LENGTH, NEAR_ZERO_THRESHOLD, PHI, SEARCH_SUCCESS_THRESHOLD,
};
use crate::error::{EngineError, EngineResult, check_duration, check_sample_rate};
use crate::zeta::{ANALYSIS_TERMS, SEARCH_TERMS};

// ── Top level ───────────────────────────────────────────────

/// All tunables for one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Gate positions fed to the resonance metric.
    pub gate_positions: Vec<u32>,
    pub scan: ScanConfig,
    pub synth: SynthConfig,
    pub symphony: SymphonyConfig,
    pub analysis: AnalysisConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            gate_positions: DEFAULT_GATE_POSITIONS.to_vec(),
            scan: ScanConfig::default(),
            synth: SynthConfig::default(),
            symphony: SymphonyConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.gate_positions.contains(&0) {
            return Err(EngineError::InvalidParameter(
                "gate positions must be positive".to_string(),
            ));
        }
        self.scan.validate()?;
        self.synth.validate()?;
        self.symphony.validate()?;
        self.analysis.validate()
    }
}

// ── Resonance search ────────────────────────────────────────

/// Bounds and resolution of the two-phase resonance search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanConfig {
    pub min_freq: f64,
    pub max_freq: f64,
    /// Step of the coarse pass. Ignored when `min_freq == max_freq`.
    pub coarse_step: f64,
    /// Half-width δ of the fine window around the coarse optimum.
    pub fine_window: f64,
    pub fine_step: f64,
    /// Series terms for the metric, shared by both passes.
    pub terms: u32,
    pub success_threshold: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            min_freq: 717.0,
            max_freq: 719.0,
            coarse_step: 0.01,
            fine_window: 0.05,
            fine_step: 0.0001,
            terms: SEARCH_TERMS,
            success_threshold: SEARCH_SUCCESS_THRESHOLD,
        }
    }
}

impl ScanConfig {
    /// A degenerate search over a single frequency.
    pub fn single(freq: f64) -> Self {
        ScanConfig {
            min_freq: freq,
            max_freq: freq,
            ..ScanConfig::default()
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        check_range(self.min_freq, self.max_freq)?;
        if self.min_freq < self.max_freq {
            sweep_count(self.min_freq, self.max_freq, self.coarse_step)?;
            check_step(self.fine_step)?;
            if !(self.fine_window.is_finite() && self.fine_window >= 0.0) {
                return Err(EngineError::InvalidParameter(format!(
                    "fine window must be finite and non-negative, got {}",
                    self.fine_window
                )));
            }
            sweep_count(-self.fine_window, self.fine_window, self.fine_step)?;
        }
        Ok(())
    }
}

pub(crate) fn check_range(min: f64, max: f64) -> EngineResult<()> {
    if min.is_finite() && max.is_finite() && min <= max {
        Ok(())
    } else {
        Err(EngineError::InvalidScanRange { min, max })
    }
}

pub(crate) fn check_step(step: f64) -> EngineResult<()> {
    if step.is_finite() && step > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidStep(step))
    }
}

/// Upper bound on the frequencies a single sweep may evaluate.
pub const MAX_SWEEP_CANDIDATES: u64 = u32::MAX as u64;

/// Number of frequencies `min + i·step` in `[min, max]`, for `min < max`.
///
/// The epsilon keeps `max` itself when the span is a whole number of steps.
pub(crate) fn sweep_count(min: f64, max: f64, step: f64) -> EngineResult<u64> {
    check_step(step)?;
    let intervals = ((max - min) / step + 1e-9).floor();
    // Also rejects an infinite span.
    if !(intervals < MAX_SWEEP_CANDIDATES as f64) {
        return Err(EngineError::SweepTooLarge { min, max, step });
    }
    Ok(intervals as u64 + 1)
}

// ── Synthesis ───────────────────────────────────────────────

/// What an oscillator does in the mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OscillatorRole {
    /// Feeds its gain stage into the listed output channels.
    Output { channels: Vec<u8> },
    /// Adds `gain * value` to the gain of oscillator `target`.
    Modulator { target: usize },
}

/// A sine generator and its gain stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscillatorDef {
    pub frequency: f64,
    /// Branch gain, or modulation depth for a modulator.
    pub gain: f64,
    pub role: OscillatorRole,
}

impl OscillatorDef {
    pub fn output(frequency: f64, gain: f64, channels: &[u8]) -> Self {
        OscillatorDef {
            frequency,
            gain,
            role: OscillatorRole::Output {
                channels: channels.to_vec(),
            },
        }
    }

    pub fn modulator(frequency: f64, depth: f64, target: usize) -> Self {
        OscillatorDef {
            frequency,
            gain: depth,
            role: OscillatorRole::Modulator { target },
        }
    }
}

/// Oscillator topology plus render parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SynthConfig {
    pub sample_rate: u32,
    pub channels: u8,
    pub duration_seconds: f64,
    pub master_gain: f64,
    pub oscillators: Vec<OscillatorDef>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig::gate_718(60.0)
    }
}

impl SynthConfig {
    /// The 718 Hz gate: earth tone left, γ-modulation right, and a 718 Hz
    /// carrier on both channels amplitude-modulated at 0.1 Hz.
    pub fn gate_718(duration_seconds: f64) -> Self {
        SynthConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 2,
            duration_seconds,
            master_gain: 0.5,
            oscillators: vec![
                OscillatorDef::output(BINAURAL_OFFSET, 0.3, &[0]),
                OscillatorDef::output(18.6, 0.3, &[1]),
                OscillatorDef::output(FREQ_718, 0.2, &[0, 1]),
                OscillatorDef::modulator(0.1, 0.7, 2),
            ],
        }
    }

    /// Binaural pair: `frequency` left, `frequency + 7.83` right.
    pub fn binaural(frequency: f64, volume: f64, duration_seconds: f64) -> Self {
        SynthConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 2,
            duration_seconds,
            master_gain: volume,
            oscillators: vec![
                OscillatorDef::output(frequency, 0.5, &[0]),
                OscillatorDef::output(frequency + BINAURAL_OFFSET, 0.5, &[1]),
            ],
        }
    }

    /// Single 718 Hz tone at 0.3·γ, mono.
    pub fn equation_tone(duration_seconds: f64) -> Self {
        SynthConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            duration_seconds,
            master_gain: 1.0,
            oscillators: vec![OscillatorDef::output(FREQ_718, 0.3 * GAMMA, &[0])],
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        check_sample_rate(self.sample_rate)?;
        check_duration(self.duration_seconds)?;
        if self.channels == 0 {
            return Err(EngineError::InvalidChannelCount(0));
        }
        if !self.master_gain.is_finite() {
            return Err(EngineError::InvalidParameter(format!(
                "master gain must be finite, got {}",
                self.master_gain
            )));
        }

        for (i, osc) in self.oscillators.iter().enumerate() {
            if !osc.frequency.is_finite() || !osc.gain.is_finite() {
                return Err(EngineError::InvalidParameter(format!(
                    "oscillator {i} needs finite frequency and gain"
                )));
            }
            match &osc.role {
                OscillatorRole::Output { channels } => {
                    if let Some(&ch) = channels.iter().find(|&&ch| ch >= self.channels) {
                        return Err(EngineError::InvalidRouting(format!(
                            "oscillator {i} routed to channel {ch}, graph has {}",
                            self.channels
                        )));
                    }
                }
                OscillatorRole::Modulator { target } => {
                    match self.oscillators.get(*target).map(|t| &t.role) {
                        Some(OscillatorRole::Output { .. }) => {}
                        Some(OscillatorRole::Modulator { .. }) => {
                            return Err(EngineError::InvalidRouting(format!(
                                "oscillator {i} modulates {target}, which is itself a modulator"
                            )));
                        }
                        None => {
                            return Err(EngineError::InvalidRouting(format!(
                                "oscillator {i} modulates missing oscillator {target}"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

// ── Symphony ────────────────────────────────────────────────

/// Parameters of the eighteen-gate symphony render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SymphonyConfig {
    pub sample_rate: u32,
    pub duration_seconds: f64,
    pub gate_positions: Vec<u32>,
    /// Positions are mapped onto the timeline as `pos / domain_length * duration`.
    pub domain_length: u32,
    pub base_frequency: f64,
    /// Gate `i` sounds at `gate_span * (1 + (i*γ mod 1)) + base_frequency`.
    pub gate_span: f64,
    /// Standard deviation of each gate's Gaussian envelope, in seconds.
    pub envelope_width: f64,
    pub earth_frequency: f64,
    pub earth_amplitude: f64,
}

impl Default for SymphonyConfig {
    fn default() -> Self {
        SymphonyConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            duration_seconds: 108.0,
            gate_positions: DEFAULT_GATE_POSITIONS.to_vec(),
            domain_length: MTDNA_LENGTH,
            base_frequency: FREQ_718,
            gate_span: 144.0,
            envelope_width: PHI,
            earth_frequency: BINAURAL_OFFSET,
            earth_amplitude: 0.05,
        }
    }
}

impl SymphonyConfig {
    pub fn validate(&self) -> EngineResult<()> {
        check_sample_rate(self.sample_rate)?;
        check_duration(self.duration_seconds)?;
        if self.domain_length == 0 {
            return Err(EngineError::InvalidParameter(
                "domain length must be positive".to_string(),
            ));
        }
        if !(self.envelope_width.is_finite() && self.envelope_width > 0.0) {
            return Err(EngineError::InvalidParameter(format!(
                "envelope width must be positive, got {}",
                self.envelope_width
            )));
        }
        Ok(())
    }
}

// ── Correlation analysis ────────────────────────────────────

/// Constants of the peak → energy → magnitude mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    pub base_frequency: f64,
    pub hbar: f64,
    pub zero_threshold: f64,
    pub terms: u32,
    /// Amplitude a sample must exceed to count as a peak.
    pub peak_threshold: f64,
    /// Maximum records kept in a serialized report.
    pub report_cap: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            base_frequency: FREQ_718,
            hbar: H_BAR,
            zero_threshold: NEAR_ZERO_THRESHOLD,
            terms: ANALYSIS_TERMS,
            peak_threshold: GAMMA,
            report_cap: 100,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.hbar == 0.0 || !self.hbar.is_finite() {
            return Err(EngineError::InvalidParameter(format!(
                "hbar must be finite and non-zero, got {}",
                self.hbar
            )));
        }
        if self.peak_threshold.is_nan() {
            return Err(EngineError::InvalidParameter(
                "peak threshold is NaN".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        EngineConfig::default().validate().expect("default config should validate");
    }

    #[test]
    fn json_round_trip() {
        let config = EngineConfig::default();
        let json = config.to_json().unwrap();
        assert!(json.contains("\"gatePositions\""));
        assert!(json.contains("\"type\": \"modulator\""));
        let back = EngineConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "scan": { "minFreq": 700.0, "maxFreq": 701.0 } }"#)
            .unwrap();
        assert_eq!(config.scan.min_freq, 700.0);
        assert_eq!(config.scan.fine_step, 0.0001);
        assert_eq!(config.gate_positions.len(), 18);
        assert_eq!(config.analysis.report_cap, 100);
    }

    #[test]
    fn inverted_scan_range_rejected() {
        let json = r#"{ "scan": { "minFreq": 720.0, "maxFreq": 710.0 } }"#;
        assert!(matches!(
            EngineConfig::from_json(json),
            Err(EngineError::InvalidScanRange { .. })
        ));
    }

    #[test]
    fn degenerate_range_ignores_step() {
        let mut scan = ScanConfig::single(718.0);
        scan.coarse_step = 0.0;
        scan.fine_step = -1.0;
        assert!(scan.validate().is_ok());
    }

    #[test]
    fn zero_step_rejected_for_real_range() {
        let scan = ScanConfig {
            coarse_step: 0.0,
            ..ScanConfig::default()
        };
        assert!(matches!(scan.validate(), Err(EngineError::InvalidStep(_))));
    }

    #[test]
    fn oversized_sweeps_rejected() {
        let coarse = ScanConfig {
            min_freq: 0.0,
            max_freq: 1e12,
            coarse_step: 1e-9,
            ..ScanConfig::default()
        };
        assert!(matches!(coarse.validate(), Err(EngineError::SweepTooLarge { .. })));

        let fine = ScanConfig {
            fine_window: 1e6,
            fine_step: 1e-9,
            ..ScanConfig::default()
        };
        assert!(matches!(fine.validate(), Err(EngineError::SweepTooLarge { .. })));

        let huge_span = ScanConfig {
            min_freq: -f64::MAX,
            max_freq: f64::MAX,
            coarse_step: 1.0,
            ..ScanConfig::default()
        };
        assert!(huge_span.validate().is_err());
    }

    #[test]
    fn sweep_count_is_inclusive() {
        assert_eq!(sweep_count(0.0, 1.0, 0.1).unwrap(), 11);
        assert_eq!(sweep_count(-0.05, 0.05, 0.0001).unwrap(), 1001);
        assert_eq!(sweep_count(0.0, 0.0, 1.0).unwrap(), 1);
    }

    #[test]
    fn synth_routing_checked() {
        let mut synth = SynthConfig::equation_tone(1.0);
        synth.oscillators.push(OscillatorDef::output(100.0, 1.0, &[1]));
        assert!(matches!(synth.validate(), Err(EngineError::InvalidRouting(_))));

        let mut synth = SynthConfig::gate_718(1.0);
        synth.oscillators.push(OscillatorDef::modulator(1.0, 0.5, 3));
        assert!(matches!(synth.validate(), Err(EngineError::InvalidRouting(_))));

        let mut synth = SynthConfig::gate_718(1.0);
        synth.oscillators.push(OscillatorDef::modulator(1.0, 0.5, 42));
        assert!(matches!(synth.validate(), Err(EngineError::InvalidRouting(_))));
    }

    #[test]
    fn synth_rejects_bad_duration_and_rate() {
        assert!(matches!(
            SynthConfig::gate_718(0.0).validate(),
            Err(EngineError::InvalidDuration(_))
        ));
        let synth = SynthConfig {
            sample_rate: 0,
            ..SynthConfig::default()
        };
        assert!(matches!(synth.validate(), Err(EngineError::InvalidSampleRate(0))));
    }

    #[test]
    fn zero_gate_position_rejected() {
        let config = EngineConfig {
            gate_positions: vec![1, 0, 3],
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
