use serde::{Deserialize, Serialize};

/// Tuning constants for the extraction pipeline.
///
/// The frequency cutoffs and detection thresholds are empirical; they are
/// exposed here so deployments can calibrate them against a reference
/// vocabulary list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Share of letters each script must exceed for a span to count as mixed.
    pub mixed_threshold: f32,
    /// Lowest Zipf frequency for levels 1 through 4, in descending order.
    /// Anything rarer, or absent from the frequency list, resolves to level 5.
    pub zipf_cutoffs: [f32; 4],
    /// Lowest level an idiom or slang candidate may resolve to.
    pub idiom_floor: u8,
    /// Minimum pointwise mutual information for an adjacent pair to count
    /// as a collocation.
    pub min_collocation_pmi: f64,
    /// Single words are only extracted when their Zipf frequency is below
    /// this.
    pub max_word_zipf: f32,
    /// Characters of surrounding text kept on each side of an expression.
    pub context_window_chars: usize,
    /// Segments longer than this are rejected by the NLP extractor.
    pub max_segment_chars: usize,
    /// Per-call timeout for the translation collaborator.
    pub translation_timeout_ms: u64,
    /// Maximum in-flight translation calls per extraction.
    pub translation_concurrency: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            mixed_threshold: 0.15,
            zipf_cutoffs: [5.0, 4.3, 3.7, 3.0],
            idiom_floor: 2,
            min_collocation_pmi: 0.5,
            max_word_zipf: 4.3,
            context_window_chars: 20,
            max_segment_chars: 10_000,
            translation_timeout_ms: 5_000,
            translation_concurrency: 4,
        }
    }
}
