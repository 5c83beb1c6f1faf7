use std::collections::BTreeSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::difficulty::Difficulty;
use crate::language::Language;
use crate::nlp::EntityKind;

/// Which extractor produced a candidate. `Nlp` orders first so that sorted
/// groups see the authoritative member before pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    Nlp,
    Pattern,
}

impl ExtractorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractorKind::Nlp => "nlp",
            ExtractorKind::Pattern => "pattern",
        }
    }
}

/// Why a span was extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpressionType {
    Slang,
    PhrasalVerb,
    Collocation,
    Idiom,
    Compound,
    GrammarPattern,
    #[serde(rename = "named-entity")]
    Entity,
    Common,
}

impl ExpressionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpressionType::Slang => "slang",
            ExpressionType::PhrasalVerb => "phrasal-verb",
            ExpressionType::Collocation => "collocation",
            ExpressionType::Idiom => "idiom",
            ExpressionType::Compound => "compound",
            ExpressionType::GrammarPattern => "grammar-pattern",
            ExpressionType::Entity => "named-entity",
            ExpressionType::Common => "common",
        }
    }

    /// Shapes that always span more than one token.
    pub fn is_multiword(self) -> bool {
        matches!(
            self,
            ExpressionType::PhrasalVerb
                | ExpressionType::Collocation
                | ExpressionType::Idiom
                | ExpressionType::Compound
        )
    }
}

/// Raw difficulty information attached by an extractor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DifficultyHint {
    /// Pre-assigned by the pattern table.
    Static(Difficulty),
    /// Lowest Zipf frequency among the unit's content words. `None` when at
    /// least one of them is absent from the frequency list.
    Frequency(Option<f32>),
}

/// A span believed to be a learnable unit. Lives only for the duration of
/// one extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateExpression {
    pub text: String,
    pub language: Language,
    pub origin: ExtractorKind,
    pub expression_type: ExpressionType,
    pub segment_index: usize,
    /// Byte range of the match inside the segment text.
    pub span: Range<usize>,
    pub start_seconds: Option<f64>,
    pub hint: DifficultyHint,
    pub gloss_hint: Option<String>,
    pub reading: Option<String>,
    pub tags: BTreeSet<String>,
    /// Study hints, in the order they were found.
    pub notes: Vec<String>,
    pub entity: Option<EntityKind>,
}

impl CandidateExpression {
    pub fn new(
        text: impl Into<String>,
        language: Language,
        origin: ExtractorKind,
        expression_type: ExpressionType,
        segment_index: usize,
        span: Range<usize>,
        hint: DifficultyHint,
    ) -> Self {
        let mut tags = BTreeSet::new();
        tags.insert(expression_type.as_str().to_string());
        Self {
            text: text.into(),
            language,
            origin,
            expression_type,
            segment_index,
            span,
            start_seconds: None,
            hint,
            gloss_hint: None,
            reading: None,
            tags,
            notes: Vec::new(),
            entity: None,
        }
    }

    pub fn with_gloss_hint(mut self, gloss: impl Into<String>) -> Self {
        self.gloss_hint = Some(gloss.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Shifts the span by `offset` bytes, for spans found in a sub-slice.
    pub fn offset_by(mut self, offset: usize) -> Self {
        self.span = self.span.start + offset..self.span.end + offset;
        self
    }
}

/// A candidate after the classifier has resolved its level.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedCandidate {
    pub candidate: CandidateExpression,
    pub difficulty: Difficulty,
}
