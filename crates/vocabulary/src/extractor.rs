use std::sync::Arc;

use tracing::{debug, warn};

use crate::candidate::{CandidateExpression, ExtractorKind};
use crate::error::ExtractorError;
use crate::language::{Language, LanguageLabel, is_kana, katakana_to_hiragana};
use crate::nlp::NlpExtractor;
use crate::patterns::PatternMatcher;

/// The closed set of extractors behind one `extract` interface.
#[derive(Debug, Clone)]
pub enum Extractor {
    Nlp(NlpExtractor),
    Pattern(Arc<PatternMatcher>),
}

impl Extractor {
    pub fn kind(&self) -> ExtractorKind {
        match self {
            Extractor::Nlp(_) => ExtractorKind::Nlp,
            Extractor::Pattern(_) => ExtractorKind::Pattern,
        }
    }

    /// The pattern matcher never fails.
    pub fn extract(
        &self,
        text: &str,
        label: &LanguageLabel,
    ) -> Result<Vec<CandidateExpression>, ExtractorError> {
        match self {
            Extractor::Nlp(nlp) => nlp.extract_nlp(text, label),
            Extractor::Pattern(matcher) => Ok(matcher.extract_patterns(text)),
        }
    }
}

/// How the NLP extractor fared on one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NlpStatus {
    Ok,
    Unavailable,
    Failed,
    Skipped,
}

#[derive(Debug, Clone)]
pub struct ChainOutput {
    pub candidates: Vec<CandidateExpression>,
    pub nlp: NlpStatus,
}

/// Runs the extractors in a fixed order, NLP first. A failing NLP pass
/// leaves the pattern matcher's candidates as the segment's result.
#[derive(Debug, Clone)]
pub struct ExtractorChain {
    extractors: Vec<Extractor>,
}

impl ExtractorChain {
    pub fn new(nlp: NlpExtractor, patterns: Arc<PatternMatcher>) -> Self {
        Self {
            extractors: vec![Extractor::Nlp(nlp), Extractor::Pattern(patterns)],
        }
    }

    pub fn run(&self, segment_index: usize, text: &str, label: &LanguageLabel) -> ChainOutput {
        let mut candidates = Vec::new();
        let mut nlp = NlpStatus::Skipped;

        for extractor in &self.extractors {
            match extractor.extract(text, label) {
                Ok(found) => {
                    if extractor.kind() == ExtractorKind::Nlp {
                        nlp = NlpStatus::Ok;
                    }
                    candidates.extend(found.into_iter().map(|mut c| {
                        c.segment_index = segment_index;
                        c
                    }));
                }
                Err(ExtractorError::Unavailable(reason)) => {
                    debug!(segment = segment_index, reason = %reason, "NLP extractor unavailable");
                    nlp = NlpStatus::Unavailable;
                }
                Err(e @ ExtractorError::Failed(_)) => {
                    warn!(segment = segment_index, error = %e, "Dropping NLP candidates for segment");
                    nlp = NlpStatus::Failed;
                }
            }
        }

        self.fill_readings(&mut candidates, nlp);
        ChainOutput { candidates, nlp }
    }

    /// Japanese candidates without a reading get one from their kana, or
    /// from the analyser when it is working for this segment.
    fn fill_readings(&self, candidates: &mut [CandidateExpression], status: NlpStatus) {
        let analyser = self.extractors.iter().find_map(|e| match e {
            Extractor::Nlp(nlp) if status == NlpStatus::Ok => Some(nlp),
            _ => None,
        });
        for candidate in candidates
            .iter_mut()
            .filter(|c| c.language == Language::Japanese && c.reading.is_none())
        {
            candidate.reading = if is_kana(&candidate.text) {
                Some(katakana_to_hiragana(&candidate.text))
            } else {
                analyser.and_then(|nlp| nlp.reading(&candidate.text).ok().flatten())
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::language::detect;
    use crate::nlp::ModelProvider;

    fn chain(provider: ModelProvider) -> ExtractorChain {
        ExtractorChain::new(
            NlpExtractor::new(Arc::new(provider), &ExtractionConfig::default()),
            Arc::new(PatternMatcher::builtin().unwrap()),
        )
    }

    #[test]
    fn test_unavailable_falls_back_to_patterns() {
        let text = "てぇてぇ good stream";
        let output = chain(ModelProvider::disabled()).run(3, text, &detect(text));
        assert_eq!(output.nlp, NlpStatus::Unavailable);
        assert!(output.candidates.iter().all(|c| c.origin == ExtractorKind::Pattern));
        assert!(output.candidates.iter().any(|c| c.text == "てぇてぇ"));
        assert!(output.candidates.iter().all(|c| c.segment_index == 3));
    }

    #[test]
    fn test_failed_segment_keeps_patterns() {
        let text = "てぇてぇ\u{7}";
        let output = chain(ModelProvider::builtin()).run(0, text, &detect(text));
        assert_eq!(output.nlp, NlpStatus::Failed);
        assert_eq!(output.candidates.len(), 1);
    }

    #[test]
    fn test_both_extractors_contribute() {
        let text = "てぇてぇ good stream";
        let output = chain(ModelProvider::builtin()).run(0, text, &detect(text));
        assert_eq!(output.nlp, NlpStatus::Ok);
        assert!(output.candidates.iter().any(|c| c.origin == ExtractorKind::Nlp));
        assert!(output.candidates.iter().any(|c| c.origin == ExtractorKind::Pattern));
    }

    #[test]
    fn test_pattern_candidates_get_readings() {
        let text = "今日も配信、ポンコツすぎ";
        let output = chain(ModelProvider::builtin()).run(0, text, &detect(text));
        let haishin = output
            .candidates
            .iter()
            .find(|c| c.origin == ExtractorKind::Pattern && c.text == "配信")
            .unwrap();
        assert_eq!(haishin.reading.as_deref(), Some("はいしん"));
        let ponkotsu = output
            .candidates
            .iter()
            .find(|c| c.origin == ExtractorKind::Pattern && c.text == "ポンコツ")
            .unwrap();
        assert_eq!(ponkotsu.reading.as_deref(), Some("ぽんこつ"));
    }

    #[test]
    fn test_kana_readings_without_models() {
        let text = "はいしん楽しい";
        let output = chain(ModelProvider::disabled()).run(0, text, &detect(text));
        let kana = output.candidates.iter().find(|c| c.text == "はいしん").unwrap();
        assert_eq!(kana.reading.as_deref(), Some("はいしん"));
    }
}
