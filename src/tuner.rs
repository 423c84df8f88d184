//! Resonance Tuner — coarse-then-fine frequency search.
//!
//! For a candidate frequency `f`, the metric is the mean of
//! `|zeta(0.5 + i·p·f)|` over the gate positions `p`. The tuner sweeps
//! `[min, max]` at the coarse step, then re-sweeps a narrow window around
//! the coarse optimum at the fine step. Both passes use the same term count,
//! so their metrics are directly comparable.
//!
//! Candidates are generated by index (`f = min + i·step`) rather than by
//! repeated addition, which keeps every sweep reproducible. Each sampled
//! frequency is independent; with the `parallel` feature the metric is
//! evaluated as a rayon map followed by an argmin reduction.

use serde::Serialize;

use crate::config::{MAX_SWEEP_CANDIDATES, ScanConfig, check_range, sweep_count};
use crate::constants::{GATE_DURATION, H_BAR, NEAR_ZERO_THRESHOLD};
use crate::error::EngineResult;
use crate::progress::{CHUNK_SIZE, Progress, Stage};
use crate::zeta::{self, ANALYSIS_TERMS, TIMED_TERMS};

/// Outcome of one search call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub optimal_freq: f64,
    pub min_metric_value: f64,
    pub success: bool,
    pub scan_range: (f64, f64),
    pub iterations: u64,
}

/// How close one gate sits to a zero at a tuned frequency.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TunedAnalysis {
    pub is_aligned: bool,
    pub distance_to_zero: f64,
    /// `clamp(1 - distance / 15, 0, 1)`.
    pub coherence: f64,
    pub energy: f64,
    /// 1-based gate number.
    pub gate_index: usize,
}

/// Mean `|zeta(0.5 + i·p·freq, terms)|` over `positions`.
///
/// An empty position set yields 0.
pub fn metric(positions: &[u32], freq: f64, terms: u32) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }
    let sum: f64 = positions
        .iter()
        .map(|&p| zeta::critical_magnitude(p as f64 * freq, terms))
        .sum();
    sum / positions.len() as f64
}

/// Single-pass sweep over `[min_freq, max_freq]`.
///
/// `min_freq == max_freq` evaluates that frequency once, whatever `step` is.
pub fn scan(
    positions: &[u32],
    min_freq: f64,
    max_freq: f64,
    step: f64,
    terms: u32,
) -> EngineResult<ScanResult> {
    check_range(min_freq, max_freq)?;
    let sweep = Sweep::new(min_freq, max_freq, step)?;
    let range = (min_freq, max_freq);
    if positions.is_empty() {
        return Ok(empty_result(range));
    }
    let mut completed = 0;
    let best = sweep.minimize(
        positions,
        terms,
        Stage::Coarse,
        &mut completed,
        &mut |_: Progress| {},
    );
    Ok(best.into_result(range, sweep.count, ScanConfig::default().success_threshold))
}

/// An empty gate set evaluates nothing and never counts as a success.
fn empty_result(scan_range: (f64, f64)) -> ScanResult {
    ScanResult {
        optimal_freq: scan_range.0,
        min_metric_value: 0.0,
        success: false,
        scan_range,
        iterations: 0,
    }
}

/// Two-phase search over a fixed set of gate positions.
#[derive(Debug, Clone)]
pub struct ResonanceTuner {
    positions: Vec<u32>,
    config: ScanConfig,
}

impl ResonanceTuner {
    pub fn new(positions: Vec<u32>, config: ScanConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(ResonanceTuner { positions, config })
    }

    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// The search metric at `freq`, with this tuner's term count.
    pub fn metric(&self, freq: f64) -> f64 {
        metric(&self.positions, freq, self.config.terms)
    }

    pub fn search(&self) -> ScanResult {
        self.search_with_progress(|_| {})
    }

    /// Run both passes, calling `on_progress` between evaluation chunks.
    pub fn search_with_progress<F>(&self, mut on_progress: F) -> ScanResult
    where
        F: FnMut(Progress),
    {
        let cfg = &self.config;
        let range = (cfg.min_freq, cfg.max_freq);

        if self.positions.is_empty() {
            log::debug!("resonance search skipped: no gate positions");
            return empty_result(range);
        }

        // Validated in `new`, so the sweeps are well-formed.
        let coarse = Sweep::unchecked(cfg.min_freq, cfg.max_freq, cfg.coarse_step);
        let mut completed = 0;
        let coarse_best = coarse.minimize(
            &self.positions,
            cfg.terms,
            Stage::Coarse,
            &mut completed,
            &mut on_progress,
        );
        log::debug!(
            "coarse pass: {} candidates, best {:.6} Hz (metric {:.6})",
            coarse.count,
            coarse_best.freq,
            coarse_best.metric
        );

        if cfg.min_freq == cfg.max_freq {
            return coarse_best.into_result(range, coarse.count, cfg.success_threshold);
        }

        let fine = Sweep::unchecked(
            coarse_best.freq - cfg.fine_window,
            coarse_best.freq + cfg.fine_window,
            cfg.fine_step,
        );
        let mut completed = 0;
        let fine_best = fine.minimize(
            &self.positions,
            cfg.terms,
            Stage::Fine,
            &mut completed,
            &mut on_progress,
        );
        log::debug!(
            "fine pass: {} candidates, best {:.6} Hz (metric {:.6})",
            fine.count,
            fine_best.freq,
            fine_best.metric
        );

        // Coarse wins ties: it was evaluated first.
        let fine_wins = fine_best.metric < coarse_best.metric
            || (coarse_best.metric.is_nan() && !fine_best.metric.is_nan());
        let best = if fine_wins { fine_best } else { coarse_best };
        let result = best.into_result(range, coarse.count + fine.count, cfg.success_threshold);
        log::info!(
            "resonance search: optimum {:.6} Hz, metric {:.6}, success {}, {} iterations",
            result.optimal_freq,
            result.min_metric_value,
            result.success,
            result.iterations
        );
        result
    }

    /// Analyse one gate (0-based `gate`) at a tuned frequency.
    ///
    /// Returns `None` if `gate` is out of range.
    pub fn analyze_gate(&self, gate: usize, freq: f64) -> Option<TunedAnalysis> {
        let position = *self.positions.get(gate)?;
        let energy = position as f64 * freq * H_BAR;
        Some(tuned(energy / H_BAR, energy, ANALYSIS_TERMS, gate + 1))
    }

    /// Analyse every gate at a tuned frequency.
    pub fn analyze_all_gates(&self, freq: f64) -> Vec<TunedAnalysis> {
        (0..self.positions.len())
            .filter_map(|gate| self.analyze_gate(gate, freq))
            .collect()
    }

    /// Analyse a playback instant at a tuned frequency.
    ///
    /// The gate is chosen by elapsed time in [`GATE_DURATION`] slots,
    /// clamped to the last gate.
    pub fn analyze_at_time(&self, time: f64, freq: f64) -> TunedAnalysis {
        let last = self.positions.len().saturating_sub(1);
        let slot = (time / GATE_DURATION).floor();
        let gate = if slot > 0.0 { (slot as usize).min(last) } else { 0 };
        let energy = time * freq * H_BAR;
        tuned(energy / H_BAR, energy, TIMED_TERMS, gate + 1)
    }
}

fn tuned(t: f64, energy: f64, terms: u32, gate_index: usize) -> TunedAnalysis {
    let magnitude = zeta::critical_magnitude(t, terms);
    TunedAnalysis {
        is_aligned: magnitude < NEAR_ZERO_THRESHOLD,
        distance_to_zero: magnitude,
        coherence: (1.0 - magnitude / 15.0).clamp(0.0, 1.0),
        energy,
        gate_index,
    }
}

// ── Sweep internals ─────────────────────────────────────────

/// An evaluated frequency. `index` orders candidates within one sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    index: u64,
    freq: f64,
    metric: f64,
}

impl Candidate {
    /// Argmin selection: smaller metric wins, NaN never displaces a number,
    /// ties go to the lower index. Associative and commutative, so any
    /// reduction order gives the same answer.
    fn better(a: Candidate, b: Candidate) -> Candidate {
        match (a.metric.is_nan(), b.metric.is_nan()) {
            (false, true) => a,
            (true, false) => b,
            (true, true) => {
                if a.index <= b.index {
                    a
                } else {
                    b
                }
            }
            (false, false) => {
                if b.metric < a.metric || (b.metric == a.metric && b.index < a.index) {
                    b
                } else {
                    a
                }
            }
        }
    }

    fn into_result(self, scan_range: (f64, f64), iterations: u64, threshold: f64) -> ScanResult {
        ScanResult {
            optimal_freq: self.freq,
            min_metric_value: self.metric,
            success: self.metric < threshold,
            scan_range,
            iterations,
        }
    }
}

/// `count` frequencies `min + i·step`.
#[derive(Debug, Clone, Copy)]
struct Sweep {
    min: f64,
    step: f64,
    count: u64,
}

impl Sweep {
    fn new(min: f64, max: f64, step: f64) -> EngineResult<Self> {
        if min >= max {
            return Ok(Sweep::single(min));
        }
        let count = sweep_count(min, max, step)?;
        Ok(Sweep { min, step, count })
    }

    /// For ranges already checked by [`ScanConfig::validate`]. An oversized
    /// sweep is capped at [`MAX_SWEEP_CANDIDATES`] rather than overflowing.
    fn unchecked(min: f64, max: f64, step: f64) -> Self {
        if min >= max {
            return Sweep::single(min);
        }
        let count = sweep_count(min, max, step).unwrap_or(MAX_SWEEP_CANDIDATES);
        Sweep { min, step, count }
    }

    fn single(min: f64) -> Self {
        Sweep {
            min,
            step: 0.0,
            count: 1,
        }
    }

    fn freq_at(&self, index: u64) -> f64 {
        self.min + index as f64 * self.step
    }

    fn candidate(&self, positions: &[u32], terms: u32, index: u64) -> Candidate {
        let freq = self.freq_at(index);
        Candidate {
            index,
            freq,
            metric: metric(positions, freq, terms),
        }
    }

    fn minimize<F>(
        &self,
        positions: &[u32],
        terms: u32,
        stage: Stage,
        completed: &mut u64,
        on_progress: &mut F,
    ) -> Candidate
    where
        F: FnMut(Progress),
    {
        let mut best: Option<Candidate> = None;
        let mut start = 0;
        while start < self.count {
            let end = (start + CHUNK_SIZE).min(self.count);
            if let Some(chunk_best) = self.minimize_chunk(positions, terms, start, end) {
                best = Some(match best {
                    Some(b) => Candidate::better(b, chunk_best),
                    None => chunk_best,
                });
            }
            *completed += end - start;
            on_progress(Progress {
                stage,
                completed: *completed,
                total: self.count,
            });
            start = end;
        }
        // count >= 1, so at least one candidate was evaluated.
        best.unwrap_or(Candidate {
            index: 0,
            freq: self.min,
            metric: f64::NAN,
        })
    }

    #[cfg(feature = "parallel")]
    fn minimize_chunk(&self, positions: &[u32], terms: u32, start: u64, end: u64) -> Option<Candidate> {
        use rayon::prelude::*;
        (start..end)
            .into_par_iter()
            .map(|i| self.candidate(positions, terms, i))
            .reduce_with(Candidate::better)
    }

    #[cfg(not(feature = "parallel"))]
    fn minimize_chunk(&self, positions: &[u32], terms: u32, start: u64, end: u64) -> Option<Candidate> {
        (start..end)
            .map(|i| self.candidate(positions, terms, i))
            .reduce(Candidate::better)
    }
}
