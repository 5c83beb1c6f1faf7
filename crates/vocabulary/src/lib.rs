pub mod candidate;
pub mod captions;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod extractor;
pub mod language;
pub mod merge;
pub mod nlp;
pub mod patterns;
pub mod pipeline;
pub mod record;
pub mod translate;

pub use candidate::{CandidateExpression, ClassifiedCandidate, DifficultyHint, ExpressionType, ExtractorKind};
pub use captions::{TimedText, parse_srt, parse_srt_file, segments_from_timed};
pub use config::ExtractionConfig;
pub use difficulty::{CefrLevel, Difficulty, DifficultyClassifier, JlptLevel, LevelDataset, level_label};
pub use error::{
    CaptionError, ExtractorError, LevelDatasetError, PatternTableError, PipelineError, TranslationError,
};
pub use language::{Language, LanguageLabel, TranscriptStats, detect};
pub use merge::{DedupKey, merge};
pub use nlp::{EntityKind, ModelProvider, ModelSource, NlpExtractor};
pub use patterns::{PatternMatcher, PatternTable};
pub use pipeline::{ExtractionOutput, ExtractionRequest, VocabularyPipeline};
pub use record::{GlossSource, RecordBuilder, VocabularyRecord};
pub use translate::{StaticTranslator, Translation, Translator};

#[cfg(feature = "gemini")]
pub use translate::GeminiTranslator;

use serde::{Deserialize, Serialize};

/// A contiguous span of transcript text, optionally anchored in a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    /// Seconds into the source recording.
    pub start_seconds: Option<f64>,
    /// Seconds into the source recording.
    pub end_seconds: Option<f64>,
    /// Video id, conversation turn id, or similar.
    pub source_id: Option<String>,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start_seconds: None,
            end_seconds: None,
            source_id: None,
        }
    }

    pub fn with_timing(mut self, start_seconds: f64, end_seconds: f64) -> Self {
        self.start_seconds = Some(start_seconds);
        self.end_seconds = Some(end_seconds);
        self
    }

    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }
}
