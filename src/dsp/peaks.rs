//! Peak detection — threshold crossings with greedy 10 ms deduplication.

use serde::Serialize;

use crate::constants::{GAMMA, PEAK_SPACING};
use crate::error::{EngineResult, check_sample_rate};

/// A detected peak. Only a [`PeakSequence`] creates them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Peak {
    time_seconds: f64,
}

impl Peak {
    pub fn time_seconds(&self) -> f64 {
        self.time_seconds
    }
}

/// Ascending peak times, consecutive ones more than [`PEAK_SPACING`] apart.
///
/// The spacing is enforced by [`PeakSequence::try_push`]; there is no other
/// way to add a peak.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PeakSequence {
    peaks: Vec<Peak>,
}

impl PeakSequence {
    pub fn new() -> Self {
        PeakSequence::default()
    }

    /// Greedily keep the times that satisfy the spacing rule, in order.
    pub fn from_times<I: IntoIterator<Item = f64>>(times: I) -> Self {
        let mut peaks = PeakSequence::new();
        for t in times {
            peaks.try_push(t);
        }
        peaks
    }

    /// Retain `time_seconds` if it is the first peak or lies more than
    /// [`PEAK_SPACING`] after the last retained one.
    pub fn try_push(&mut self, time_seconds: f64) -> bool {
        let accept = match self.peaks.last() {
            None => true,
            Some(last) => time_seconds - last.time_seconds > PEAK_SPACING,
        };
        if accept {
            self.peaks.push(Peak { time_seconds });
        }
        accept
    }

    pub fn as_slice(&self) -> &[Peak] {
        &self.peaks
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.peaks.iter().map(|p| p.time_seconds)
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn into_vec(self) -> Vec<Peak> {
        self.peaks
    }
}

/// Scans one channel for samples whose magnitude exceeds a threshold.
#[derive(Debug, Clone, Copy)]
pub struct PeakDetector {
    sample_rate: u32,
    threshold: f64,
}

impl PeakDetector {
    pub fn new(sample_rate: u32, threshold: f64) -> EngineResult<Self> {
        check_sample_rate(sample_rate)?;
        Ok(PeakDetector {
            sample_rate,
            threshold,
        })
    }

    /// Detector with the default γ threshold.
    pub fn with_default_threshold(sample_rate: u32) -> EngineResult<Self> {
        PeakDetector::new(sample_rate, GAMMA)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Single linear scan; `|sample| > threshold` at index `i` is a candidate
    /// at `i / sample_rate` seconds.
    pub fn detect(&self, samples: &[f64]) -> PeakSequence {
        let sr = self.sample_rate as f64;
        let mut peaks = PeakSequence::new();
        for (i, &s) in samples.iter().enumerate() {
            if s.abs() > self.threshold {
                peaks.try_push(i as f64 / sr);
            }
        }
        log::debug!(
            "detected {} peaks over {} samples (threshold {})",
            peaks.len(),
            samples.len(),
            self.threshold
        );
        peaks
    }
}

/// One-shot convenience over [`PeakDetector::detect`].
pub fn detect_peaks(samples: &[f64], sample_rate: u32, threshold: f64) -> EngineResult<PeakSequence> {
    Ok(PeakDetector::new(sample_rate, threshold)?.detect(samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_impulse_at_half_second() {
        let mut samples = vec![0.0; 44100];
        samples[22050] = 1.0;
        let peaks = detect_peaks(&samples, 44100, 0.5).unwrap();
        assert_eq!(peaks.len(), 1);
        assert!((peaks.as_slice()[0].time_seconds() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn dense_crossings_collapse() {
        // 1 kHz rate: samples 100..=130 are loud, i.e. 0.100..0.130 s
        let mut samples = vec![0.0; 1000];
        for s in &mut samples[100..=130] {
            *s = -0.9;
        }
        let peaks = detect_peaks(&samples, 1000, 0.5).unwrap();
        let times: Vec<f64> = peaks.times().collect();
        // 0.100 kept, 0.111 is the first > 0.01 later, then 0.122
        assert_eq!(times.len(), 3, "times {times:?}");
        assert!((times[0] - 0.100).abs() < 1e-12);
        assert!((times[1] - 0.111).abs() < 1e-12);
        assert!((times[2] - 0.122).abs() < 1e-12);
    }

    #[test]
    fn spacing_invariant_holds() {
        let samples: Vec<f64> = (0..20_000)
            .map(|i| ((i as f64) * 0.37).sin() * ((i as f64) * 0.0011).cos())
            .collect();
        let peaks = detect_peaks(&samples, 8000, GAMMA).unwrap();
        assert!(!peaks.is_empty());
        let times: Vec<f64> = peaks.times().collect();
        for pair in times.windows(2) {
            assert!(pair[1] > pair[0]);
            assert!(pair[1] - pair[0] > PEAK_SPACING);
        }
    }

    #[test]
    fn threshold_is_strict() {
        let peaks = detect_peaks(&[0.5, -0.5, 0.5], 10, 0.5).unwrap();
        assert!(peaks.is_empty());
    }

    #[test]
    fn empty_and_quiet_inputs() {
        assert!(detect_peaks(&[], 44100, 0.1).unwrap().is_empty());
        assert!(detect_peaks(&[0.01; 100], 44100, 0.1).unwrap().is_empty());
    }

    #[test]
    fn zero_sample_rate_rejected() {
        assert!(detect_peaks(&[1.0], 0, 0.5).is_err());
    }

    #[test]
    fn sequence_refuses_close_times() {
        let mut seq = PeakSequence::new();
        assert!(seq.try_push(1.0));
        assert!(!seq.try_push(1.005));
        assert!(!seq.try_push(1.009));
        assert!(seq.try_push(1.0101));
        assert!(!seq.try_push(0.5));
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn from_times_drops_unspaced_and_unordered() {
        let seq = PeakSequence::from_times([0.3, 0.1, 0.305, 0.5, 0.2, 0.52]);
        let times: Vec<f64> = seq.times().collect();
        assert_eq!(times, vec![0.3, 0.5, 0.52]);
    }

    #[test]
    fn peaks_serialize_as_time_list() {
        let seq = PeakSequence::from_times([0.25, 1.0]);
        let json = serde_json::to_string(&seq).unwrap();
        assert_eq!(json, r#"[{"timeSeconds":0.25},{"timeSeconds":1.0}]"#);
    }
}
