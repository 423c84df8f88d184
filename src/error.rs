//! Error types for the engine's entry points.
//!
//! Numeric edge cases (NaN, infinities, empty inputs) are data, not errors.
//! Only caller contract violations surface here.

use thiserror::Error;

/// Convenience alias for results carrying an [`EngineError`].
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid sample rate {0}: must be greater than zero")]
    InvalidSampleRate(u32),

    #[error("Invalid duration {0}s: must be finite and greater than zero")]
    InvalidDuration(f64),

    /// `min > max`, or a bound that is not finite.
    #[error("Invalid scan range [{min}, {max}]")]
    InvalidScanRange { min: f64, max: f64 },

    #[error("Invalid step {0}: must be finite and greater than zero")]
    InvalidStep(f64),

    #[error("Invalid channel count {0}: expected 1..=255 channels")]
    InvalidChannelCount(usize),

    #[error("Channel {channel} has {found} samples, expected {expected}")]
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        found: usize,
    },

    /// An oscillator routed to a channel or modulation target that doesn't exist.
    #[error("Invalid routing: {0}")]
    InvalidRouting(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A sweep would evaluate more candidates than [`MAX_SWEEP_CANDIDATES`](crate::config::MAX_SWEEP_CANDIDATES).
    #[error("Sweep over [{min}, {max}] at step {step} has too many candidates")]
    SweepTooLarge { min: f64, max: f64, step: f64 },

    #[error("WAV {field} of {value} does not fit a 32-bit header field")]
    WavFieldOverflow { field: &'static str, value: u64 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "native")]
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[cfg(feature = "native")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "native")]
    #[error("Background task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Reject non-positive or non-finite durations.
pub(crate) fn check_duration(duration_seconds: f64) -> EngineResult<()> {
    if duration_seconds.is_finite() && duration_seconds > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidDuration(duration_seconds))
    }
}

pub(crate) fn check_sample_rate(sample_rate: u32) -> EngineResult<()> {
    if sample_rate == 0 {
        Err(EngineError::InvalidSampleRate(sample_rate))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_must_be_positive_and_finite() {
        assert!(check_duration(1.0).is_ok());
        assert!(matches!(check_duration(0.0), Err(EngineError::InvalidDuration(_))));
        assert!(matches!(check_duration(-3.0), Err(EngineError::InvalidDuration(_))));
        assert!(check_duration(f64::NAN).is_err());
        assert!(check_duration(f64::INFINITY).is_err());
    }

    #[test]
    fn zero_sample_rate_rejected() {
        assert!(check_sample_rate(44100).is_ok());
        let err = check_sample_rate(0).unwrap_err();
        assert!(err.to_string().contains("sample rate 0"), "message: {err}");
    }

    #[test]
    fn wav_overflow_message_names_field() {
        let err = EngineError::WavFieldOverflow {
            field: "byte rate",
            value: 6_000_000_000,
        };
        assert_eq!(
            err.to_string(),
            "WAV byte rate of 6000000000 does not fit a 32-bit header field"
        );
    }

    #[test]
    fn scan_range_message_names_bounds() {
        let err = EngineError::InvalidScanRange { min: 2.0, max: 1.0 };
        assert_eq!(err.to_string(), "Invalid scan range [2, 1]");
    }
}
