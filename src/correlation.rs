//! Correlation analyzer: maps peak times onto the critical line and
//! aggregates how many of them land near a zero.
//!
//! A peak at `t` seconds carries energy `E = t · base · ħ`; its magnitude is
//! `|zeta(0.5 + i·E/ħ, terms)|`. Empty input aggregates to zeros, never NaN.

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::constants::GATE_TIMES;
use crate::dsp::buffer::SampleBuffer;
use crate::dsp::peaks::{Peak, PeakDetector, PeakSequence};
use crate::error::{EngineError, EngineResult};
use crate::progress::{CHUNK_SIZE, Progress, Stage};
use crate::zeta;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationRecord {
    pub peak_time: f64,
    pub energy: f64,
    pub magnitude: f64,
    pub is_near_zero: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub records: Vec<CorrelationRecord>,
    pub total_peaks: u64,
    pub near_zero_count: u64,
    /// Percentage in [0, 100].
    pub success_rate: f64,
    pub avg_magnitude: f64,
    pub min_magnitude: f64,
    pub max_magnitude: f64,
}

impl AnalysisResult {
    /// Aggregate per-peak records. Min and max skip NaN magnitudes; they are
    /// NaN only when every magnitude is.
    pub fn from_records(records: Vec<CorrelationRecord>) -> Self {
        if records.is_empty() {
            return AnalysisResult {
                records,
                total_peaks: 0,
                near_zero_count: 0,
                success_rate: 0.0,
                avg_magnitude: 0.0,
                min_magnitude: 0.0,
                max_magnitude: 0.0,
            };
        }

        let total = records.len() as u64;
        let near_zero_count = records.iter().filter(|r| r.is_near_zero).count() as u64;
        let sum: f64 = records.iter().map(|r| r.magnitude).sum();
        let min_magnitude = records.iter().map(|r| r.magnitude).fold(f64::NAN, f64::min);
        let max_magnitude = records.iter().map(|r| r.magnitude).fold(f64::NAN, f64::max);

        AnalysisResult {
            total_peaks: total,
            near_zero_count,
            success_rate: 100.0 * near_zero_count as f64 / total as f64,
            avg_magnitude: sum / total as f64,
            min_magnitude,
            max_magnitude,
            records,
        }
    }

    /// Projection with at most `cap` records, for JSON output.
    pub fn to_report(&self, cap: usize) -> AnalysisReport {
        AnalysisReport {
            records: self.records.iter().take(cap).copied().collect(),
            records_truncated: self.records.len() > cap,
            total_peaks: self.total_peaks,
            near_zero_count: self.near_zero_count,
            success_rate: self.success_rate,
            avg_magnitude: self.avg_magnitude,
            min_magnitude: self.min_magnitude,
            max_magnitude: self.max_magnitude,
        }
    }
}

/// Size-bounded, serializable view of an [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub records: Vec<CorrelationRecord>,
    pub records_truncated: bool,
    pub total_peaks: u64,
    pub near_zero_count: u64,
    pub success_rate: f64,
    pub avg_magnitude: f64,
    pub min_magnitude: f64,
    pub max_magnitude: f64,
}

impl AnalysisReport {
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Correlation reading for a single playback instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeSample {
    pub current_time: f64,
    /// 1-based.
    pub gate_index: usize,
    pub energy: f64,
    pub magnitude: f64,
    pub is_near_zero: bool,
    /// `clamp(1 - magnitude, 0, 1)`.
    pub coherence: f64,
}

/// 1-based gate playing at `time` seconds, from the fixed gate time table.
/// Times before the first gate (and NaN) map to gate 1.
pub fn gate_index_at_time(time: f64) -> usize {
    GATE_TIMES
        .iter()
        .rposition(|&start| time >= start)
        .map_or(1, |i| i + 1)
}

#[derive(Debug, Clone, Default)]
pub struct CorrelationAnalyzer {
    config: AnalysisConfig,
}

impl CorrelationAnalyzer {
    pub fn new(config: AnalysisConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(CorrelationAnalyzer { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Energy and magnitude for one peak time.
    pub fn record(&self, peak_time: f64) -> CorrelationRecord {
        let cfg = &self.config;
        let energy = peak_time * cfg.base_frequency * cfg.hbar;
        let magnitude = zeta::critical_magnitude(energy / cfg.hbar, cfg.terms);
        CorrelationRecord {
            peak_time,
            energy,
            magnitude,
            is_near_zero: magnitude < cfg.zero_threshold,
        }
    }

    pub fn analyze(&self, peaks: &PeakSequence) -> AnalysisResult {
        self.analyze_with_progress(peaks, |_: Progress| {})
    }

    /// Like [`analyze`](Self::analyze), reporting progress after every chunk
    /// of peaks. Records keep the input order.
    pub fn analyze_with_progress<F>(&self, peaks: &PeakSequence, mut on_progress: F) -> AnalysisResult
    where
        F: FnMut(Progress),
    {
        let peaks = peaks.as_slice();
        let total = peaks.len() as u64;
        let mut records = Vec::with_capacity(peaks.len());
        for chunk in peaks.chunks(CHUNK_SIZE as usize) {
            records.extend(self.records_for(chunk));
            on_progress(Progress {
                stage: Stage::Correlation,
                completed: records.len() as u64,
                total,
            });
        }

        let result = AnalysisResult::from_records(records);
        log::info!(
            "correlation: {} peaks, {} near zero ({:.2}%), avg magnitude {:.6}",
            result.total_peaks,
            result.near_zero_count,
            result.success_rate,
            result.avg_magnitude
        );
        result
    }

    #[cfg(feature = "parallel")]
    fn records_for(&self, chunk: &[Peak]) -> Vec<CorrelationRecord> {
        chunk.par_iter().map(|p| self.record(p.time_seconds())).collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn records_for(&self, chunk: &[Peak]) -> Vec<CorrelationRecord> {
        chunk.iter().map(|p| self.record(p.time_seconds())).collect()
    }

    /// Detect peaks in one channel of `buffer` and analyze them.
    pub fn analyze_buffer(&self, buffer: &SampleBuffer, channel: usize) -> EngineResult<AnalysisResult> {
        let samples = buffer.channel(channel).ok_or_else(|| {
            EngineError::InvalidParameter(format!(
                "channel {channel} out of range for a {}-channel buffer",
                buffer.channels()
            ))
        })?;
        self.analyze_samples(samples, buffer.sample_rate())
    }

    /// Analyze the per-frame channel mean of `buffer`.
    pub fn analyze_mixdown(&self, buffer: &SampleBuffer) -> EngineResult<AnalysisResult> {
        self.analyze_samples(&buffer.mixdown_mono(), buffer.sample_rate())
    }

    /// Detect peaks in a mono signal and analyze them.
    pub fn analyze_samples(&self, samples: &[f64], sample_rate: u32) -> EngineResult<AnalysisResult> {
        let detector = PeakDetector::new(sample_rate, self.config.peak_threshold)?;
        Ok(self.analyze(&detector.detect(samples)))
    }

    /// Correlation reading at a playback instant.
    pub fn analyze_at_time(&self, current_time: f64) -> RealtimeSample {
        let record = self.record(current_time);
        RealtimeSample {
            current_time,
            gate_index: gate_index_at_time(current_time),
            energy: record.energy,
            magnitude: record.magnitude,
            is_near_zero: record.is_near_zero,
            coherence: (1.0 - record.magnitude).clamp(0.0, 1.0),
        }
    }
}
