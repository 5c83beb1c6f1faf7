//! Morphological analysis, POS tagging and expression-shape detection.

pub mod english;
pub mod idioms;
pub mod japanese;
pub mod lexicon;
pub mod model;
mod shapes;
pub mod token;

pub use english::EnglishModel;
pub use idioms::IdiomList;
pub use japanese::JapaneseModel;
pub use lexicon::PosLexicon;
pub use model::{LanguageModel, LoadedModels, ModelProvider, ModelSource};
pub use token::{EntityKind, Pos, Token, zipf_of};

use std::sync::Arc;

use tracing::debug;

use crate::candidate::CandidateExpression;
use crate::config::ExtractionConfig;
use crate::error::ExtractorError;
use crate::language::{Language, LanguageLabel, split_script_runs};

use shapes::ShapeContext;

/// The high-recall extractor. Holds its model handle explicitly; it never
/// loads anything behind the caller's back except through the provider.
#[derive(Debug, Clone)]
pub struct NlpExtractor {
    provider: Arc<ModelProvider>,
    min_pmi: f64,
    max_word_zipf: f32,
    max_segment_chars: usize,
}

impl NlpExtractor {
    pub fn new(provider: Arc<ModelProvider>, config: &ExtractionConfig) -> Self {
        Self {
            provider,
            min_pmi: config.min_collocation_pmi,
            max_word_zipf: config.max_word_zipf,
            max_segment_chars: config.max_segment_chars,
        }
    }

    pub fn provider(&self) -> &Arc<ModelProvider> {
        &self.provider
    }

    /// Mixed text is split at script boundaries and each run goes through
    /// its own language's model. Spans in the result are relative to `text`.
    pub fn extract_nlp(
        &self,
        text: &str,
        label: &LanguageLabel,
    ) -> Result<Vec<CandidateExpression>, ExtractorError> {
        let models = self.provider.models()?;
        self.validate(text)?;

        let runs: Vec<(Language, &str, usize)> = match label.language {
            Language::Mixed => split_script_runs(text)
                .into_iter()
                .map(|run| (run.language, run.text, run.offset))
                .collect(),
            language => vec![(language, text, 0)],
        };

        let mut candidates = Vec::new();
        for (language, run, offset) in runs {
            let model = models.model_for(language).ok_or_else(|| {
                ExtractorError::Unavailable(format!("no {} model loaded", language.as_str()))
            })?;
            let tokens = model.analyze(run)?;
            let ctx = ShapeContext {
                text: run,
                tokens: &tokens,
                language,
                idioms: models.idioms.for_language(language),
                min_pmi: self.min_pmi,
                max_word_zipf: self.max_word_zipf,
            };
            let found = shapes::find_all(&ctx);
            debug!(
                model = model.name(),
                tokens = tokens.len(),
                candidates = found.len(),
                "Analysed run"
            );
            candidates.extend(found.into_iter().map(|c| c.offset_by(offset)));
        }

        candidates.sort_by_key(|c| c.span.start);
        Ok(candidates)
    }

    /// Hiragana reading of Japanese `text`, when the analyser knows every
    /// token in it.
    pub fn reading(&self, text: &str) -> Result<Option<String>, ExtractorError> {
        let models = self.provider.models()?;
        let Some(model) = models.model_for(Language::Japanese) else {
            return Ok(None);
        };
        let tokens = model.analyze(text)?;
        if tokens.is_empty() {
            return Ok(None);
        }
        Ok(tokens.iter().map(|t| t.reading.as_deref()).collect())
    }

    fn validate(&self, text: &str) -> Result<(), ExtractorError> {
        if let Some(c) = text
            .chars()
            .find(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        {
            return Err(ExtractorError::Failed(format!(
                "control character U+{:04X} in input",
                c as u32
            )));
        }
        let chars = text.chars().count();
        if chars > self.max_segment_chars {
            return Err(ExtractorError::Failed(format!(
                "segment of {chars} characters exceeds limit of {}",
                self.max_segment_chars
            )));
        }
        Ok(())
    }
}
