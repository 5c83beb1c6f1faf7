use thiserror::Error;

/// Failures of the NLP extractor. Neither variant is fatal to an extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractorError {
    /// Linguistic models are not loaded; the pipeline degrades to patterns.
    #[error("NLP extractor unavailable: {0}")]
    Unavailable(String),
    /// Malformed input or tokenizer failure; only the affected segment loses
    /// its NLP candidates.
    #[error("NLP extraction failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("translation timed out")]
    Timeout,
    #[error("translation request failed: {0}")]
    Request(String),
    #[error("invalid translation response: {0}")]
    InvalidResponse(String),
    #[error("no translation available for {0:?}")]
    NotFound(String),
}

/// Errors loading the pattern table. The built-in table is static data, so
/// these only surface for externally supplied tables.
#[derive(Debug, Error)]
pub enum PatternTableError {
    #[error("failed to read pattern table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse pattern table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Error)]
pub enum LevelDatasetError {
    #[error("failed to read level dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse level dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    PatternTable(#[from] PatternTableError),
    #[error("extraction cancelled")]
    Cancelled,
    #[error("extraction task failed: {0}")]
    Join(String),
}

#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("failed to read captions: {0}")]
    Io(#[from] std::io::Error),
    #[error("no caption cues found")]
    NoCues,
}
