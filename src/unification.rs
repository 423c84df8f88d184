//! Exit equation Ψ over sequence energies.
//!
//! `Ψ(t, x, E) = e^(i·718·t) · e^(−i·k·x) · zeta(½ + iE/ħ, 50) · γ` with
//! `k = 2π/718`. A sequence of length `n` carries energy `n · 718 · ħ`.
//!
//! Input sequences come from comma-separated text or from
//! [`generate_sequences`], which builds repeats of the `GATCA` motif with a
//! human-like length distribution.

use std::f64::consts::PI;

use rand::Rng;
use rand_distr::StandardNormal;
use serde::Serialize;

use crate::complex::{self, Complex};
use crate::constants::{FREQ_718, GAMMA, H_BAR};
use crate::zeta::{self, PSI_TERMS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sequence {
    pub sequence: String,
    pub length: usize,
}

impl Sequence {
    pub fn new(sequence: impl Into<String>) -> Self {
        let sequence = sequence.into();
        let length = sequence.chars().count();
        Sequence { sequence, length }
    }

    pub fn energy(&self) -> f64 {
        self.length as f64 * FREQ_718 * H_BAR
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PsiValue {
    pub psi: Complex,
    pub magnitude: f64,
    pub phase: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnificationResult {
    pub energy_vector: Vec<f64>,
    pub total_energy: f64,
    pub psi_values: Vec<PsiValue>,
    pub resonance_frequency: f64,
    /// `|mean cos(phase)|` over all Ψ values, 0 when there are none.
    pub quantum_coherence: f64,
}

/// Repeated unit of every generated sequence.
pub const MOTIF: &str = "GATCA";
/// Single-motif variants substituted by mutation.
pub const MUTATIONS: [&str; 4] = ["GATCG", "GATTA", "GATCC", "AATCA"];
/// Sequences generated when the caller does not choose a count.
pub const DEFAULT_SEQUENCE_COUNT: usize = 739;

const MUTATION_RATE: f64 = 0.02;
const REPEAT_MEAN: f64 = 15.0;
const REPEAT_STD_DEV: f64 = 5.0;
const MIN_REPEATS: f64 = 5.0;
const MAX_REPEATS: f64 = 100.0;

/// Generate `count` motif sequences.
///
/// The repeat count is `round(N(15, 5))` clamped to `5..=100`; each repeat
/// is replaced by a uniformly chosen [`MUTATIONS`] entry with probability
/// 0.02. Output depends only on the state of `rng`.
pub fn generate_sequences<R: Rng>(count: usize, rng: &mut R) -> Vec<Sequence> {
    (0..count)
        .map(|_| {
            let z: f64 = rng.sample(StandardNormal);
            let repeats = (z * REPEAT_STD_DEV + REPEAT_MEAN)
                .round()
                .clamp(MIN_REPEATS, MAX_REPEATS) as usize;
            let mut sequence = String::with_capacity(repeats * MOTIF.len());
            for _ in 0..repeats {
                if rng.random::<f64>() < MUTATION_RATE {
                    sequence.push_str(MUTATIONS[rng.random_range(0..MUTATIONS.len())]);
                } else {
                    sequence.push_str(MOTIF);
                }
            }
            Sequence::new(sequence)
        })
        .collect()
}

/// Comma-joined text that [`parse_sequences`] reads back.
pub fn sequences_to_text(sequences: &[Sequence]) -> String {
    sequences
        .iter()
        .map(|s| s.sequence.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Split comma-separated text into trimmed, non-empty sequences.
pub fn parse_sequences(content: &str) -> Vec<Sequence> {
    content
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Sequence::new)
        .collect()
}

/// Ψ for a single energy.
pub fn psi(t: f64, x: f64, energy: f64) -> PsiValue {
    let k = 2.0 * PI / FREQ_718;
    let carrier = complex::exp_i(FREQ_718 * t);
    let spatial = complex::exp_i(-k * x);
    let zeta_component = zeta::zeta(zeta::critical_point(energy / H_BAR), PSI_TERMS);
    let value = complex::scale(
        complex::mul(complex::mul(carrier, spatial), zeta_component),
        GAMMA,
    );
    PsiValue {
        psi: value,
        magnitude: complex::abs(value),
        phase: complex::phase(value),
    }
}

pub fn run_unification(sequences: &[Sequence], t: f64, x: f64) -> UnificationResult {
    let energy_vector: Vec<f64> = sequences.iter().map(Sequence::energy).collect();
    let total_energy: f64 = energy_vector.iter().sum();
    let psi_values: Vec<PsiValue> = energy_vector.iter().map(|&e| psi(t, x, e)).collect();

    let quantum_coherence = if psi_values.is_empty() {
        0.0
    } else {
        let sum: f64 = psi_values.iter().map(|p| p.phase.cos()).sum();
        (sum / psi_values.len() as f64).abs()
    };
    let resonance_frequency = FREQ_718 * (1.0 + total_energy / (H_BAR * 1000.0));

    log::debug!(
        "unification: {} sequences, total energy {:e}, resonance {:.6} Hz",
        sequences.len(),
        total_energy,
        resonance_frequency
    );

    UnificationResult {
        energy_vector,
        total_energy,
        psi_values,
        resonance_frequency,
        quantum_coherence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn motifs(seq: &Sequence) -> Vec<&str> {
        (0..seq.sequence.len())
            .step_by(MOTIF.len())
            .map(|i| &seq.sequence[i..i + MOTIF.len()])
            .collect()
    }

    #[test]
    fn generation_is_seeded() {
        let a = generate_sequences(50, &mut StdRng::seed_from_u64(718));
        let b = generate_sequences(50, &mut StdRng::seed_from_u64(718));
        let c = generate_sequences(50, &mut StdRng::seed_from_u64(719));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(generate_sequences(0, &mut StdRng::seed_from_u64(1)).is_empty());
    }

    #[test]
    fn generated_sequences_are_whole_motifs() {
        let seqs = generate_sequences(DEFAULT_SEQUENCE_COUNT, &mut StdRng::seed_from_u64(42));
        assert_eq!(seqs.len(), DEFAULT_SEQUENCE_COUNT);
        for seq in &seqs {
            assert_eq!(seq.length, seq.sequence.len());
            assert_eq!(seq.length % MOTIF.len(), 0);
            let repeats = seq.length / MOTIF.len();
            assert!((5..=100).contains(&repeats), "{repeats} repeats");
            for m in motifs(seq) {
                assert!(m == MOTIF || MUTATIONS.contains(&m), "unexpected motif {m}");
            }
        }
    }

    #[test]
    fn generated_distribution_is_human_like() {
        let seqs = generate_sequences(4000, &mut StdRng::seed_from_u64(7));
        let repeats: Vec<f64> = seqs.iter().map(|s| (s.length / MOTIF.len()) as f64).collect();
        let mean = repeats.iter().sum::<f64>() / repeats.len() as f64;
        assert!((mean - 15.0).abs() < 0.6, "mean repeats {mean}");

        let all: Vec<&str> = seqs.iter().flat_map(motifs).collect();
        let mutated = all.iter().filter(|&&m| m != MOTIF).count() as f64 / all.len() as f64;
        assert!((0.01..0.03).contains(&mutated), "mutation rate {mutated}");
    }

    #[test]
    fn text_export_reads_back() {
        let seqs = generate_sequences(20, &mut StdRng::seed_from_u64(3));
        let text = sequences_to_text(&seqs);
        assert_eq!(text.matches(',').count(), 19);
        assert_eq!(parse_sequences(&text), seqs);
        assert_eq!(sequences_to_text(&[]), "");
    }

    #[test]
    fn parse_trims_and_skips_empty() {
        let seqs = parse_sequences(" GATCA, GATCAGATCA ,, ,GATTA\n");
        let names: Vec<&str> = seqs.iter().map(|s| s.sequence.as_str()).collect();
        assert_eq!(names, ["GATCA", "GATCAGATCA", "GATTA"]);
        assert_eq!(seqs[1].length, 10);
        assert!(parse_sequences("").is_empty());
        assert!(parse_sequences(" , ,").is_empty());
    }

    #[test]
    fn sequence_energy() {
        let seq = Sequence::new("GATCA");
        assert_eq!(seq.energy(), 5.0 * FREQ_718 * H_BAR);
    }

    #[test]
    fn psi_at_origin_is_scaled_zeta() {
        let e = 5.0 * FREQ_718 * H_BAR;
        let p = psi(0.0, 0.0, e);
        let z = zeta::zeta(zeta::critical_point(e / H_BAR), PSI_TERMS);
        assert!((p.psi.re - z.re * GAMMA).abs() < 1e-12);
        assert!((p.psi.im - z.im * GAMMA).abs() < 1e-12);
        assert!((p.magnitude - complex::abs(z) * GAMMA).abs() < 1e-12);
    }

    #[test]
    fn carrier_only_rotates() {
        let e = 12.0 * FREQ_718 * H_BAR;
        let a = psi(0.0, 0.0, e);
        let b = psi(0.37, 4.0, e);
        assert!((a.magnitude - b.magnitude).abs() < 1e-9);
    }

    #[test]
    fn unification_aggregates() {
        let seqs = parse_sequences("GATCA,GATCAGATCA");
        let result = run_unification(&seqs, 1.0, 0.0);
        assert_eq!(result.energy_vector.len(), 2);
        assert_eq!(result.psi_values.len(), 2);
        let total = 15.0 * FREQ_718 * H_BAR;
        assert!((result.total_energy - total).abs() <= total * 1e-12);
        let expected_freq = FREQ_718 * (1.0 + result.total_energy / (H_BAR * 1000.0));
        assert_eq!(result.resonance_frequency, expected_freq);
        assert!((0.0..=1.0).contains(&result.quantum_coherence));
    }

    #[test]
    fn empty_unification_is_zero() {
        let result = run_unification(&[], 1.0, 0.0);
        assert_eq!(result.total_energy, 0.0);
        assert_eq!(result.quantum_coherence, 0.0);
        assert_eq!(result.resonance_frequency, FREQ_718);
    }
}
