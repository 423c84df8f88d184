pub mod complex;
pub mod config;
pub mod constants;
pub mod correlation;
pub mod dsp;
pub mod error;
pub mod progress;
#[cfg(feature = "native")]
pub mod tasks;
pub mod tuner;
pub mod unification;
pub mod zeta;

use crate::config::{AnalysisConfig, ScanConfig, SymphonyConfig, SynthConfig};
use crate::constants::DEFAULT_SAMPLE_RATE;
use crate::correlation::{AnalysisReport, CorrelationAnalyzer};
use crate::dsp::graph::SynthGraph;
use crate::dsp::stream::GraphStream;
use crate::error::EngineResult;
use crate::tuner::ResonanceTuner;
use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the gate_resonance_core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Run the two-phase resonance search over `positions`.
pub fn find_resonance(positions: &[u32], config: ScanConfig) -> EngineResult<tuner::ScanResult> {
    Ok(ResonanceTuner::new(positions.to_vec(), config)?.search())
}

/// Detect peaks in `samples` and return the capped analysis report.
pub fn analysis_report(
    samples: &[f64],
    sample_rate: u32,
    config: AnalysisConfig,
) -> EngineResult<AnalysisReport> {
    let cap = config.report_cap;
    let analyzer = CorrelationAnalyzer::new(config)?;
    Ok(analyzer.analyze_samples(samples, sample_rate)?.to_report(cap))
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// WASM-exposed: resonance search. `options` is a partial `ScanConfig`
/// (camelCase keys); `undefined` or `null` uses the defaults.
#[wasm_bindgen]
pub fn find_optimal_resonance(positions: Vec<u32>, options: JsValue) -> Result<JsValue, JsValue> {
    let config: ScanConfig = if options.is_undefined() || options.is_null() {
        ScanConfig::default()
    } else {
        serde_wasm_bindgen::from_value(options).map_err(js_err)?
    };
    let result = find_resonance(&positions, config).map_err(js_err)?;
    serde_wasm_bindgen::to_value(&result).map_err(js_err)
}

/// WASM-exposed: render the stereo 718 Hz gate preset to WAV bytes.
#[wasm_bindgen]
pub fn render_gate_wav(duration_seconds: f64) -> Result<Vec<u8>, JsValue> {
    dsp::renderer::render_wav(&SynthConfig::gate_718(duration_seconds)).map_err(js_err)
}

/// WASM-exposed: render the eighteen-gate symphony to WAV bytes.
#[wasm_bindgen]
pub fn render_symphony_wav(duration_seconds: f64) -> Result<Vec<u8>, JsValue> {
    let config = SymphonyConfig {
        duration_seconds,
        ..SymphonyConfig::default()
    };
    dsp::renderer::render_symphony_wav(&config).map_err(js_err)
}

/// WASM-exposed: peak detection + correlation over a mono buffer, as a
/// report capped at 100 records.
#[wasm_bindgen]
pub fn analyze_samples(samples: Vec<f32>, sample_rate: u32) -> Result<JsValue, JsValue> {
    let samples: Vec<f64> = samples.into_iter().map(f64::from).collect();
    let report = analysis_report(&samples, sample_rate, AnalysisConfig::default()).map_err(js_err)?;
    serde_wasm_bindgen::to_value(&report).map_err(js_err)
}

/// WASM-exposed: correlation reading at a playback time.
#[wasm_bindgen]
pub fn analyze_at_time(current_time: f64) -> Result<JsValue, JsValue> {
    let sample = CorrelationAnalyzer::default().analyze_at_time(current_time);
    serde_wasm_bindgen::to_value(&sample).map_err(js_err)
}

/// WASM-exposed: Ψ unification over comma-separated sequences.
#[wasm_bindgen]
pub fn unify_sequences(content: &str, t: f64, x: f64) -> Result<JsValue, JsValue> {
    let sequences = unification::parse_sequences(content);
    serde_wasm_bindgen::to_value(&unification::run_unification(&sequences, t, x)).map_err(js_err)
}

/// WASM-exposed: `count` generated motif sequences as comma-separated
/// text. The same seed always yields the same text.
#[wasm_bindgen]
pub fn generate_sequence_text(count: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    unification::sequences_to_text(&unification::generate_sequences(count, &mut rng))
}

/// WASM-exposed live player for the gate preset. An AudioWorklet pulls
/// interleaved stereo blocks from it; the samples match the offline render.
#[wasm_bindgen]
pub struct GatePlayer {
    stream: GraphStream,
}

#[wasm_bindgen]
impl GatePlayer {
    /// Endless stream at `sample_rate` (0 selects 44100 Hz).
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: u32) -> Result<GatePlayer, JsValue> {
        let mut config = SynthConfig::default();
        config.sample_rate = if sample_rate == 0 {
            DEFAULT_SAMPLE_RATE
        } else {
            sample_rate
        };
        let graph = SynthGraph::from_config(&config).map_err(js_err)?;
        Ok(GatePlayer {
            stream: GraphStream::new(graph, None),
        })
    }

    /// Next `frames` frames, interleaved left/right.
    pub fn next_block(&mut self, frames: usize) -> Vec<f32> {
        self.stream.next_block(frames)
    }

    pub fn seek(&mut self, frame: u64) {
        self.stream.seek(frame);
    }

    pub fn position_seconds(&self) -> f64 {
        self.stream.position_seconds()
    }

    pub fn channels(&self) -> usize {
        self.stream.channels()
    }
}
