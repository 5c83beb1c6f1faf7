//! End-to-end driver: segments in, vocabulary records out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::TranscriptSegment;
use crate::candidate::ClassifiedCandidate;
use crate::captions::{TimedText, segments_from_timed};
use crate::config::ExtractionConfig;
use crate::difficulty::{DifficultyClassifier, LevelDataset};
use crate::error::{PipelineError, TranslationError};
use crate::extractor::{ExtractorChain, NlpStatus};
use crate::language::{TranscriptStats, detect_with_threshold};
use crate::merge::merge;
use crate::nlp::{ModelProvider, NlpExtractor};
use crate::patterns::PatternMatcher;
use crate::record::{GlossSource, RecordBuilder, VocabularyRecord};
use crate::translate::Translator;

/// One transcript to process. Either `segments` or `transcript` is used;
/// a bare transcript is split into one segment per non-empty line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionRequest {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub segments: Vec<TimedText>,
    #[serde(default)]
    pub source_id: Option<String>,
    /// Stamped on every record; defaults to the time of the call.
    #[serde(skip)]
    pub requested_at: Option<DateTime<Utc>>,
}

impl ExtractionRequest {
    pub fn from_transcript(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            ..Self::default()
        }
    }

    pub fn from_segments(segments: Vec<TimedText>) -> Self {
        Self {
            segments,
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    pub fn with_requested_at(mut self, requested_at: DateTime<Utc>) -> Self {
        self.requested_at = Some(requested_at);
        self
    }

    pub fn to_segments(&self) -> Vec<TranscriptSegment> {
        if !self.segments.is_empty() {
            return segments_from_timed(&self.segments, self.source_id.as_deref());
        }
        self.transcript
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                let segment = TranscriptSegment::new(line);
                match &self.source_id {
                    Some(id) => segment.with_source(id.clone()),
                    None => segment,
                }
            })
            .collect()
    }
}

/// The complete result of one extraction, handed over atomically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub records: Vec<VocabularyRecord>,
    /// False when the run degraded to pattern-only extraction.
    pub nlp_enabled: bool,
    pub stats: TranscriptStats,
}

/// Result of the CPU-bound stage.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub merged: Vec<ClassifiedCandidate>,
    pub nlp_enabled: bool,
}

/// Stateless per call; the pattern table and models are shared read-only.
pub struct VocabularyPipeline {
    config: ExtractionConfig,
    classifier: DifficultyClassifier,
    chain: ExtractorChain,
    provider: Arc<ModelProvider>,
    translator: Option<Arc<dyn Translator>>,
}

impl VocabularyPipeline {
    pub fn new(
        config: ExtractionConfig,
        patterns: Arc<PatternMatcher>,
        provider: Arc<ModelProvider>,
        translator: Option<Arc<dyn Translator>>,
    ) -> Self {
        let nlp = NlpExtractor::new(Arc::clone(&provider), &config);
        Self {
            classifier: DifficultyClassifier::new(&config),
            chain: ExtractorChain::new(nlp, patterns),
            config,
            provider,
            translator,
        }
    }

    /// Pipeline over the built-in pattern table, without a translator.
    pub fn builtin(config: ExtractionConfig, provider: Arc<ModelProvider>) -> Result<Self, PipelineError> {
        let patterns = Arc::new(PatternMatcher::builtin()?);
        Ok(Self::new(config, patterns, provider, None))
    }

    /// Curated CEFR / JLPT levels take precedence over frequency bands.
    pub fn with_levels(mut self, levels: Arc<LevelDataset>) -> Self {
        self.classifier = DifficultyClassifier::new(&self.config).with_levels(levels);
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<ModelProvider> {
        &self.provider
    }

    pub fn translator_name(&self) -> Option<&str> {
        self.translator.as_deref().map(|t| t.name())
    }

    /// Extraction, classification and merge. Checks `cancel` between
    /// segments and stops handing candidates on once it fires.
    pub fn analyze(
        &self,
        segments: &[TranscriptSegment],
        cancel: &CancellationToken,
    ) -> Result<Analysis, PipelineError> {
        let mut nlp_enabled = self.provider.is_available();
        let mut classified = Vec::new();

        for (index, segment) in segments.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            let label = detect_with_threshold(&segment.text, self.config.mixed_threshold);
            let output = self.chain.run(index, &segment.text, &label);
            if output.nlp == NlpStatus::Unavailable {
                nlp_enabled = false;
            }
            debug!(
                segment = index,
                language = label.language.as_str(),
                candidates = output.candidates.len(),
                nlp = ?output.nlp,
                "Segment extracted"
            );
            classified.extend(output.candidates.into_iter().map(|mut candidate| {
                candidate.start_seconds = segment.start_seconds;
                ClassifiedCandidate {
                    difficulty: self.classifier.classify(&candidate),
                    candidate,
                }
            }));
        }

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        Ok(Analysis {
            merged: merge(classified),
            nlp_enabled,
        })
    }

    pub async fn extract(
        self: &Arc<Self>,
        request: ExtractionRequest,
        cancel: CancellationToken,
    ) -> Result<ExtractionOutput, PipelineError> {
        let started = Instant::now();
        let requested_at = request.requested_at.unwrap_or_else(Utc::now);
        let segments = Arc::new(request.to_segments());
        let stats = TranscriptStats::from_segments(&segments, self.config.mixed_threshold);

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let analysis = {
            let pipeline = Arc::clone(self);
            let segments = Arc::clone(&segments);
            let cancel = cancel.clone();
            tokio::task::spawn_blocking(move || pipeline.analyze(&segments, &cancel))
                .await
                .map_err(|e| PipelineError::Join(e.to_string()))??
        };
        if !analysis.nlp_enabled {
            warn!(
                source_id = ?request.source_id,
                "NLP extractor unavailable, returning pattern matcher results only"
            );
        }

        let glosses = self.translate_all(&analysis.merged, &cancel).await?;
        let builder = RecordBuilder::new(&self.config, requested_at);
        let mut records = Vec::with_capacity(analysis.merged.len());
        for (item, gloss) in analysis.merged.iter().zip(glosses) {
            let Some(segment) = segments.get(item.candidate.segment_index) else {
                warn!(
                    segment = item.candidate.segment_index,
                    text = %item.candidate.text,
                    "Candidate refers to a missing segment"
                );
                continue;
            };
            records.push(builder.build(item, segment, gloss));
        }

        info!(
            source_id = ?request.source_id,
            segments = segments.len(),
            records = records.len(),
            nlp_enabled = analysis.nlp_enabled,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Vocabulary extraction complete"
        );

        Ok(ExtractionOutput {
            records,
            nlp_enabled: analysis.nlp_enabled,
            stats,
        })
    }

    /// One call per merged candidate, in order, with bounded concurrency.
    async fn translate_all(
        &self,
        items: &[ClassifiedCandidate],
        cancel: &CancellationToken,
    ) -> Result<Vec<GlossSource>, PipelineError> {
        let Some(translator) = self.translator.clone() else {
            return Ok(vec![GlossSource::NotRequested; items.len()]);
        };
        let timeout = Duration::from_millis(self.config.translation_timeout_ms);

        let calls = items.iter().map(|item| {
            let translator = Arc::clone(&translator);
            let text = item.candidate.text.clone();
            let language = item.candidate.language;
            async move {
                let outcome = match tokio::time::timeout(timeout, translator.translate(&text, language)).await {
                    Ok(result) => result,
                    Err(_) => Err(TranslationError::Timeout),
                };
                match outcome {
                    Ok(translation) => GlossSource::Translated(translation),
                    Err(e) => {
                        warn!(
                            translator = translator.name(),
                            text = %text,
                            error = %e,
                            "Translation failed, emitting record with empty gloss"
                        );
                        GlossSource::Failed
                    }
                }
            }
        });
        let all = futures::stream::iter(calls)
            .buffered(self.config.translation_concurrency.max(1))
            .collect::<Vec<_>>();

        tokio::select! {
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            glosses = all => Ok(glosses),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::candidate::ExtractorKind;
    use crate::error::ExtractorError;
    use crate::language::Language;
    use crate::nlp::model::shared_models;
    use crate::nlp::{IdiomList, LanguageModel, LoadedModels, Token};
    use crate::translate::{StaticTranslator, Translation};

    /// Fires the request's token from inside the analyser, so cancellation
    /// lands while segments are being processed.
    struct CancellingModel {
        cancel: CancellationToken,
        inner: Arc<dyn LanguageModel>,
    }

    impl LanguageModel for CancellingModel {
        fn language(&self) -> Language {
            Language::English
        }

        fn name(&self) -> &str {
            "cancelling"
        }

        fn analyze(&self, text: &str) -> Result<Vec<Token>, ExtractorError> {
            self.cancel.cancel();
            self.inner.analyze(text)
        }
    }

    struct SlowTranslator;

    #[async_trait]
    impl Translator for SlowTranslator {
        async fn translate(&self, _text: &str, _language: Language) -> Result<Translation, TranslationError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Translation::default())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn pipeline(translator: Option<Arc<dyn Translator>>, config: ExtractionConfig) -> Arc<VocabularyPipeline> {
        Arc::new(VocabularyPipeline::new(
            config,
            Arc::new(PatternMatcher::builtin().unwrap()),
            Arc::new(ModelProvider::builtin()),
            translator,
        ))
    }

    #[test]
    fn test_request_segments_from_lines() {
        let request = ExtractionRequest::from_transcript("first line\n\n  second line  \n").with_source("turn-7");
        let segments = request.to_segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].text, "second line");
        assert_eq!(segments[1].source_id.as_deref(), Some("turn-7"));
        assert_eq!(segments[0].start_seconds, None);
    }

    #[test]
    fn test_timed_segments_take_precedence() {
        let request = ExtractionRequest {
            transcript: "ignored".into(),
            segments: vec![TimedText {
                text: "gg".into(),
                start_seconds: 3.0,
                end_seconds: 4.0,
            }],
            ..ExtractionRequest::default()
        };
        let segments = request.to_segments();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "gg");
    }

    #[tokio::test]
    async fn test_pre_cancelled_request() {
        let token = CancellationToken::new();
        token.cancel();
        let result = pipeline(None, ExtractionConfig::default())
            .extract(ExtractionRequest::from_transcript("gg"), token)
            .await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_translation_timeout_keeps_record() {
        let config = ExtractionConfig {
            translation_timeout_ms: 20,
            ..ExtractionConfig::default()
        };
        let output = pipeline(Some(Arc::new(SlowTranslator)), config)
            .extract(ExtractionRequest::from_transcript("てぇてぇ"), CancellationToken::new())
            .await
            .unwrap();
        let teetee = output.records.iter().find(|r| r.text == "てぇてぇ").unwrap();
        assert_eq!(teetee.gloss, "");
    }

    #[tokio::test]
    async fn test_translator_fills_gloss() {
        let translator = StaticTranslator::new().with_entry(
            "てぇてぇ",
            Language::Japanese,
            Translation {
                gloss: "precious".into(),
                reading: Some("てぇてぇ".into()),
            },
        );
        let output = pipeline(Some(Arc::new(translator)), ExtractionConfig::default())
            .extract(ExtractionRequest::from_transcript("てぇてぇ gg"), CancellationToken::new())
            .await
            .unwrap();
        let teetee = output.records.iter().find(|r| r.text == "てぇてぇ").unwrap();
        assert_eq!(teetee.gloss, "precious");
        assert_eq!(teetee.reading.as_deref(), Some("てぇてぇ"));
        // Not in the dictionary: still emitted, gloss left empty.
        let gg = output.records.iter().find(|r| r.text == "gg").unwrap();
        assert_eq!(gg.gloss, "");
    }

    #[tokio::test]
    async fn test_cancel_during_translation() {
        let token = CancellationToken::new();
        let pipeline = pipeline(Some(Arc::new(SlowTranslator)), ExtractionConfig::default());
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });
        let result = pipeline
            .extract(ExtractionRequest::from_transcript("てぇてぇ"), token)
            .await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[tokio::test]
    async fn test_failed_segment_keeps_nlp_for_the_rest() {
        let output = pipeline(None, ExtractionConfig::default())
            .extract(
                ExtractionRequest::from_transcript("good stream\nbad\u{0}stream gg\nwatch out for the stream sniper"),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(output.nlp_enabled);
        let nlp_texts: Vec<&str> = output
            .records
            .iter()
            .filter(|r| r.extractor == ExtractorKind::Nlp)
            .map(|r| r.text.as_str())
            .collect();
        assert!(nlp_texts.contains(&"good stream"), "{nlp_texts:?}");
        assert!(nlp_texts.contains(&"watch out"), "{nlp_texts:?}");
        // The broken segment still contributes its pattern matches.
        let gg = output.records.iter().find(|r| r.text == "gg").unwrap();
        assert_eq!(gg.extractor, ExtractorKind::Pattern);
        assert!(gg.context.contains("stream gg"));
    }

    #[tokio::test]
    async fn test_cancel_during_analysis() {
        let token = CancellationToken::new();
        let provider = ModelProvider::from_models(LoadedModels {
            english: Some(Arc::new(CancellingModel {
                cancel: token.clone(),
                inner: shared_models().english.clone().unwrap(),
            })),
            japanese: None,
            idioms: IdiomList::default(),
        });
        let pipeline = Arc::new(VocabularyPipeline::new(
            ExtractionConfig::default(),
            Arc::new(PatternMatcher::builtin().unwrap()),
            Arc::new(provider),
            None,
        ));

        let result = pipeline
            .extract(
                ExtractionRequest::from_transcript("good stream\ngg everyone\nstream sniper"),
                token.clone(),
            )
            .await;
        assert!(token.is_cancelled());
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[test]
    fn test_curated_levels_reach_records() {
        let levels = LevelDataset::parse(r#"{"english": {"good stream": "C1"}}"#).unwrap();
        let pipeline = VocabularyPipeline::builtin(ExtractionConfig::default(), Arc::new(ModelProvider::builtin()))
            .unwrap()
            .with_levels(Arc::new(levels));
        let segments = vec![TranscriptSegment::new("good stream!")];
        let analysis = pipeline.analyze(&segments, &CancellationToken::new()).unwrap();
        let item = analysis.merged.iter().find(|c| c.candidate.text == "good stream").unwrap();
        assert_eq!(item.difficulty.get(), 5);
    }
}
