//! Background execution for long scans (feature `native`).
//!
//! Each helper moves the computation onto tokio's blocking pool and hands
//! back the join handle together with a progress receiver. Must be called
//! from within a tokio runtime.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::correlation::{AnalysisResult, CorrelationAnalyzer};
use crate::dsp::peaks::PeakSequence;
use crate::error::EngineResult;
use crate::progress::Progress;
use crate::tuner::{ResonanceTuner, ScanResult};

pub type ProgressReceiver = mpsc::UnboundedReceiver<Progress>;

pub fn spawn_search(tuner: ResonanceTuner) -> (JoinHandle<ScanResult>, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::task::spawn_blocking(move || {
        // A dropped receiver only means nobody is watching.
        tuner.search_with_progress(|p| {
            let _ = tx.send(p);
        })
    });
    (handle, rx)
}

pub fn spawn_analysis(
    analyzer: CorrelationAnalyzer,
    peaks: PeakSequence,
) -> (JoinHandle<AnalysisResult>, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::task::spawn_blocking(move || {
        analyzer.analyze_with_progress(&peaks, |p| {
            let _ = tx.send(p);
        })
    });
    (handle, rx)
}

/// Run a search in the background and wait for it, ignoring progress.
pub async fn search(tuner: ResonanceTuner) -> EngineResult<ScanResult> {
    let (handle, _progress) = spawn_search(tuner);
    Ok(handle.await?)
}

/// Run an analysis in the background and wait for it, ignoring progress.
pub async fn analyze(analyzer: CorrelationAnalyzer, peaks: PeakSequence) -> EngineResult<AnalysisResult> {
    let (handle, _progress) = spawn_analysis(analyzer, peaks);
    Ok(handle.await?)
}
