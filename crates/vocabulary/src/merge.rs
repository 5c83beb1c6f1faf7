//! Deduplication of classified candidates across extractors and segments.

use std::cmp::Reverse;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::candidate::{CandidateExpression, ClassifiedCandidate, ExtractorKind};
use crate::language::{Language, is_kana, katakana_to_hiragana};

/// Normalized (text, language) pair identifying one expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DedupKey {
    pub text: String,
    pub language: Language,
}

impl DedupKey {
    pub fn new(text: &str, language: Language) -> Self {
        Self {
            text: normalize_text(text, language),
            language,
        }
    }

    pub fn of(candidate: &CandidateExpression) -> Self {
        Self::new(&candidate.text, candidate.language)
    }
}

/// NFKC, single spaces, no surrounding punctuation. English is case-folded
/// and Japanese katakana is folded to hiragana; mixed text gets both.
pub fn normalize_text(text: &str, language: Language) -> String {
    let nfkc: String = text.nfkc().collect();
    let collapsed = nfkc.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| !c.is_alphanumeric());
    match language {
        Language::English => trimmed.to_lowercase(),
        Language::Japanese => katakana_to_hiragana(trimmed),
        Language::Mixed => katakana_to_hiragana(&trimmed.to_lowercase()),
    }
}

/// Collapses candidates sharing a [`DedupKey`].
///
/// Input is first put in a canonical order (segment, position, longer span
/// first, NLP before pattern, text), so the result does not depend on the
/// order the extractors ran in. The first member of each group is kept in
/// place. When a group has members from both extractors the NLP difficulty
/// and type win; tags are always unioned and the earliest timestamp kept.
///
/// Japanese groups written only in kana are then folded into the single
/// kanji group whose reading they spell, so はいしん joins 配信.
pub fn merge(candidates: Vec<ClassifiedCandidate>) -> Vec<ClassifiedCandidate> {
    let mut sorted = candidates;
    sorted.sort_by(|a, b| {
        let (a, b) = (&a.candidate, &b.candidate);
        (a.segment_index, a.span.start, Reverse(a.span.len()), a.origin, &a.text).cmp(&(
            b.segment_index,
            b.span.start,
            Reverse(b.span.len()),
            b.origin,
            &b.text,
        ))
    });

    let mut positions: HashMap<DedupKey, usize> = HashMap::new();
    let mut merged: Vec<ClassifiedCandidate> = Vec::with_capacity(sorted.len());
    for item in sorted {
        let key = DedupKey::of(&item.candidate);
        match positions.get(&key) {
            Some(&pos) => absorb(&mut merged[pos], item),
            None => {
                positions.insert(key, merged.len());
                merged.push(item);
            }
        }
    }
    fold_kana_spellings(merged)
}

fn fold_kana_spellings(merged: Vec<ClassifiedCandidate>) -> Vec<ClassifiedCandidate> {
    let mut by_reading: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, item) in merged.iter().enumerate() {
        let c = &item.candidate;
        if c.language != Language::Japanese || is_kana(&DedupKey::of(c).text) {
            continue;
        }
        if let Some(reading) = &c.reading {
            by_reading
                .entry(normalize_text(reading, Language::Japanese))
                .or_default()
                .push(i);
        }
    }

    let mut slots: Vec<Option<ClassifiedCandidate>> = merged.into_iter().map(Some).collect();
    for i in 0..slots.len() {
        let key = match &slots[i] {
            Some(item) if item.candidate.language == Language::Japanese => DedupKey::of(&item.candidate),
            _ => continue,
        };
        if !is_kana(&key.text) {
            continue;
        }
        // Homophones with several kanji spellings stay apart.
        let Some(&[target]) = by_reading.get(&key.text).map(Vec::as_slice) else {
            continue;
        };
        if let Some(kana) = slots[i].take() {
            if let Some(Some(kept)) = slots.get_mut(target) {
                absorb(kept, kana);
            }
        }
    }
    slots.into_iter().flatten().collect()
}

fn absorb(kept: &mut ClassifiedCandidate, other: ClassifiedCandidate) {
    let ClassifiedCandidate {
        candidate: other,
        difficulty,
    } = other;

    if kept.candidate.origin == ExtractorKind::Pattern && other.origin == ExtractorKind::Nlp {
        kept.difficulty = difficulty;
        kept.candidate.expression_type = other.expression_type;
        kept.candidate.hint = other.hint;
        kept.candidate.origin = ExtractorKind::Nlp;
    }

    let target = &mut kept.candidate;
    target.tags.extend(other.tags);
    target.start_seconds = match (target.start_seconds, other.start_seconds) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    if target.reading.is_none() {
        target.reading = other.reading;
    }
    if target.gloss_hint.is_none() {
        target.gloss_hint = other.gloss_hint;
    }
}
