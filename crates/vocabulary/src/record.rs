use std::ops::Range;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::TranscriptSegment;
use crate::candidate::{ClassifiedCandidate, DifficultyHint, ExpressionType, ExtractorKind};
use crate::config::ExtractionConfig;
use crate::difficulty::{Difficulty, level_label};
use crate::language::{Language, is_kana, katakana_to_hiragana};
use crate::nlp::EntityKind;
use crate::merge::DedupKey;
use crate::translate::Translation;

/// Keywords that mark an expression as useful for gaming and streaming
/// viewers.
const GAMING_KEYWORDS: &[&str] = &["game", "stream", "play", "boss", "franchise", "customer", "order"];

/// One study item. Built once and never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyRecord {
    /// First 12 hex chars of the SHA-256 of the dedup key.
    pub id: String,
    pub text: String,
    /// Normalized text from the dedup key.
    pub normalized: String,
    pub language: Language,
    /// Target-language gloss; empty when translation failed.
    pub gloss: String,
    pub reading: Option<String>,
    pub difficulty: Difficulty,
    /// CEFR label for English, JLPT label for Japanese.
    pub level: String,
    pub expression_type: ExpressionType,
    pub tags: Vec<String>,
    /// Surrounding segment text.
    pub context: String,
    /// Study notes joined with " | ", ending with the level label.
    pub notes: String,
    pub source_id: Option<String>,
    pub timestamp_seconds: Option<f64>,
    pub extractor: ExtractorKind,
    /// Educational priority, 1 to 10.
    pub priority: u8,
    pub created_at: DateTime<Utc>,
}

/// Outcome of the translation step for one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum GlossSource {
    Translated(Translation),
    /// The translator errored or timed out.
    Failed,
    /// No translator is configured; the pattern table's hint is used.
    NotRequested,
}

#[derive(Debug, Clone)]
pub struct RecordBuilder {
    context_window_chars: usize,
    created_at: DateTime<Utc>,
}

impl RecordBuilder {
    pub fn new(config: &ExtractionConfig, created_at: DateTime<Utc>) -> Self {
        Self {
            context_window_chars: config.context_window_chars,
            created_at,
        }
    }

    /// Builds exactly one record for `item`, whatever the gloss outcome.
    pub fn build(
        &self,
        item: &ClassifiedCandidate,
        segment: &TranscriptSegment,
        gloss: GlossSource,
    ) -> VocabularyRecord {
        let candidate = &item.candidate;
        let key = DedupKey::of(candidate);

        let (gloss, translated_reading) = match gloss {
            GlossSource::Translated(t) => (t.gloss, t.reading),
            GlossSource::Failed => (String::new(), None),
            GlossSource::NotRequested => (candidate.gloss_hint.clone().unwrap_or_default(), None),
        };
        let reading = match candidate.language {
            Language::English => None,
            _ => candidate
                .reading
                .clone()
                .or(translated_reading)
                .or_else(|| is_kana(&candidate.text).then(|| katakana_to_hiragana(&candidate.text))),
        };
        let level = level_label(item.difficulty, candidate.language);

        VocabularyRecord {
            id: record_id(&key),
            text: candidate.text.clone(),
            normalized: key.text,
            language: candidate.language,
            gloss,
            reading,
            difficulty: item.difficulty,
            level: level.to_string(),
            expression_type: candidate.expression_type,
            tags: candidate.tags.iter().cloned().collect(),
            context: context_snippet(&segment.text, &candidate.span, self.context_window_chars),
            notes: learning_notes(&candidate.notes, candidate.language, level),
            source_id: segment.source_id.clone(),
            timestamp_seconds: candidate.start_seconds.or(segment.start_seconds),
            extractor: candidate.origin,
            priority: priority(item),
            created_at: self.created_at,
        }
    }
}

pub fn record_id(key: &DedupKey) -> String {
    let digest = Sha256::digest(format!("{}:{}", key.language.as_str(), key.text).as_bytes());
    hex::encode(digest)[..12].to_string()
}

/// Up to `window` characters either side of `span`. Falls back to the whole
/// text when the span does not fit.
fn context_snippet(text: &str, span: &Range<usize>, window: usize) -> String {
    let (Some(before), Some(matched), Some(after)) =
        (text.get(..span.start), text.get(span.clone()), text.get(span.end..))
    else {
        return text.trim().to_string();
    };
    let skip = before.chars().count().saturating_sub(window);
    let before: String = before.chars().skip(skip).collect();
    let after: String = after.chars().take(window).collect();
    format!("{before}{matched}{after}").trim().to_string()
}

fn learning_notes(notes: &[String], language: Language, level: &str) -> String {
    let scale = match language {
        Language::Japanese => "JLPT",
        _ => "CEFR",
    };
    let mut parts = notes.to_vec();
    parts.push(format!("{scale} Level: {level}"));
    parts.join(" | ")
}

/// Higher for idioms, phrasal verbs and intermediate-level items, lower
/// for beginner vocabulary.
pub fn priority(item: &ClassifiedCandidate) -> u8 {
    let candidate = &item.candidate;
    let mut score: i32 = 5;

    score += match candidate.expression_type {
        ExpressionType::Idiom => 3,
        ExpressionType::PhrasalVerb | ExpressionType::Collocation => 2,
        _ => 0,
    };

    if candidate.language == Language::English {
        score += match item.difficulty.get() {
            1 | 2 => -2,
            3 => 2,
            4 => 3,
            _ => 1,
        };
        if candidate.hint == DifficultyHint::Frequency(None) {
            score += 1;
        }
    }

    if matches!(candidate.entity, Some(EntityKind::Organization | EntityKind::Product)) {
        score += 1;
    }

    let lower = candidate.text.to_lowercase();
    if GAMING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        score += 1;
    }
    if candidate.expression_type.is_multiword() || lower.split_whitespace().count() > 1 {
        score += 1;
    }

    score.clamp(1, 10) as u8
}
