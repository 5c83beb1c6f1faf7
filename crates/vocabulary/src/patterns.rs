//! Static table of known slang, streaming vocabulary and grammar patterns.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::candidate::{CandidateExpression, DifficultyHint, ExpressionType, ExtractorKind};
use crate::difficulty::Difficulty;
use crate::error::PatternTableError;
use crate::language::detect;

const BUILTIN_TABLE: &str = include_str!("../data/patterns.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEntry {
    /// Regular expression in `regex` crate syntax.
    pub pattern: String,
    #[serde(rename = "type")]
    pub expression_type: ExpressionType,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub gloss: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Versioned, externally loadable pattern table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternTable {
    pub version: u32,
    pub entries: Vec<PatternEntry>,
}

impl PatternTable {
    pub fn builtin() -> Result<Self, PatternTableError> {
        Self::from_json_str(BUILTIN_TABLE)
    }

    pub fn from_json_str(json: &str) -> Result<Self, PatternTableError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PatternTableError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }
}

struct CompiledPattern {
    regex: Regex,
    entry: PatternEntry,
}

/// Compiled pattern table. Immutable after construction and shared across
/// extractions behind an `Arc`.
pub struct PatternMatcher {
    version: u32,
    patterns: Vec<CompiledPattern>,
}

impl std::fmt::Debug for PatternMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternMatcher")
            .field("version", &self.version)
            .field("patterns", &self.patterns.len())
            .finish()
    }
}

struct Match<'a> {
    start: usize,
    end: usize,
    order: usize,
    pattern: &'a CompiledPattern,
}

impl PatternMatcher {
    pub fn new(table: PatternTable) -> Result<Self, PatternTableError> {
        let patterns = table
            .entries
            .into_iter()
            .map(|entry| {
                let regex =
                    Regex::new(&entry.pattern).map_err(|source| PatternTableError::InvalidPattern {
                        pattern: entry.pattern.clone(),
                        source,
                    })?;
                Ok(CompiledPattern { regex, entry })
            })
            .collect::<Result<Vec<_>, PatternTableError>>()?;

        debug!(version = table.version, patterns = patterns.len(), "Pattern table compiled");
        Ok(Self {
            version: table.version,
            patterns,
        })
    }

    pub fn builtin() -> Result<Self, PatternTableError> {
        Self::new(PatternTable::builtin()?)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Scans `text` with every pattern. A match fully inside a longer match
    /// that was already kept is dropped; partial overlaps are both kept.
    /// Equal spans go to the earlier table entry.
    ///
    /// Returned candidates carry `segment_index` 0; the caller assigns the
    /// real segment.
    pub fn extract_patterns(&self, text: &str) -> Vec<CandidateExpression> {
        let mut matches: Vec<Match<'_>> = self
            .patterns
            .iter()
            .enumerate()
            .flat_map(|(order, pattern)| {
                pattern
                    .regex
                    .find_iter(text)
                    .filter(|m| !m.is_empty())
                    .map(move |m| Match {
                        start: m.start(),
                        end: m.end(),
                        order,
                        pattern,
                    })
            })
            .collect();

        matches.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then((b.end - b.start).cmp(&(a.end - a.start)))
                .then(a.order.cmp(&b.order))
        });

        let mut kept: Vec<(usize, usize)> = Vec::new();
        let mut candidates = Vec::new();
        for m in matches {
            if kept.iter().any(|&(start, end)| start <= m.start && m.end <= end) {
                continue;
            }
            kept.push((m.start, m.end));
            candidates.push(self.to_candidate(text, &m));
        }
        candidates
    }

    fn to_candidate(&self, text: &str, m: &Match<'_>) -> CandidateExpression {
        let surface = &text[m.start..m.end];
        let entry = &m.pattern.entry;
        let mut candidate = CandidateExpression::new(
            surface,
            detect(surface).language,
            ExtractorKind::Pattern,
            entry.expression_type,
            0,
            m.start..m.end,
            DifficultyHint::Static(entry.difficulty),
        )
        .with_tags(entry.tags.iter().cloned());
        candidate.gloss_hint = entry.gloss.clone();
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    fn table(entries: &[(&str, ExpressionType, u8)]) -> PatternTable {
        PatternTable {
            version: 1,
            entries: entries
                .iter()
                .map(|(pattern, expression_type, difficulty)| PatternEntry {
                    pattern: pattern.to_string(),
                    expression_type: *expression_type,
                    difficulty: Difficulty::new(*difficulty).unwrap(),
                    gloss: None,
                    tags: vec![],
                })
                .collect(),
        }
    }

    #[test]
    fn test_builtin_table_compiles() {
        let matcher = PatternMatcher::builtin().unwrap();
        assert!(!matcher.is_empty());
        assert_eq!(matcher.version(), 1);
    }

    #[test]
    fn test_extracts_slang_with_static_difficulty() {
        let matcher = PatternMatcher::builtin().unwrap();
        let found = matcher.extract_patterns("今日はてぇてぇ配信だったね");
        let teetee = found.iter().find(|c| c.text == "てぇてぇ").unwrap();
        assert_eq!(teetee.expression_type, ExpressionType::Slang);
        assert_eq!(teetee.hint, DifficultyHint::Static(Difficulty::new(2).unwrap()));
        assert_eq!(teetee.language, Language::Japanese);
        assert_eq!(teetee.origin, ExtractorKind::Pattern);
        assert!(teetee.tags.contains("slang"));
        assert!(teetee.tags.contains("vtuber"));
        assert_eq!(teetee.gloss_hint.as_deref(), Some("precious/wholesome"));
        assert!(found.iter().any(|c| c.text == "配信"));
    }

    #[test]
    fn test_longest_match_wins() {
        let matcher = PatternMatcher::new(table(&[
            ("草", ExpressionType::Slang, 2),
            ("草生える", ExpressionType::Slang, 3),
        ]))
        .unwrap();
        let found = matcher.extract_patterns("これは草生える");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "草生える");
    }

    #[test]
    fn test_partial_overlaps_are_both_kept() {
        let matcher = PatternMatcher::new(table(&[
            ("skill issue", ExpressionType::Slang, 2),
            ("issue tracker", ExpressionType::Compound, 3),
            ("skill", ExpressionType::Common, 1),
        ]))
        .unwrap();
        let found = matcher.extract_patterns("a skill issue tracker");
        let texts: Vec<&str> = found.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["skill issue", "issue tracker"]);
    }

    #[test]
    fn test_equal_span_goes_to_table_order() {
        let matcher = PatternMatcher::new(table(&[
            ("(?i)gg", ExpressionType::Slang, 1),
            ("gg", ExpressionType::Common, 3),
        ]))
        .unwrap();
        let found = matcher.extract_patterns("gg");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].expression_type, ExpressionType::Slang);
    }

    #[test]
    fn test_repeated_matches_are_all_reported() {
        let matcher = PatternMatcher::builtin().unwrap();
        let found = matcher.extract_patterns("gg, that was a good game. gg!");
        assert_eq!(found.iter().filter(|c| c.text.eq_ignore_ascii_case("gg")).count(), 2);
        assert!(found.iter().any(|c| c.text == "good game"));
    }

    #[test]
    fn test_no_matches_is_empty() {
        let matcher = PatternMatcher::builtin().unwrap();
        assert!(matcher.extract_patterns("").is_empty());
        assert!(matcher.extract_patterns("the weather report").is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = PatternMatcher::new(table(&[("(unclosed", ExpressionType::Slang, 2)])).unwrap_err();
        assert!(matches!(err, PatternTableError::InvalidPattern { .. }));
    }

    #[test]
    fn test_textual_difficulty_is_rejected() {
        let json = r#"{"version":1,"entries":[{"pattern":"x","type":"slang","difficulty":"B1"}]}"#;
        assert!(matches!(
            PatternTable::from_json_str(json),
            Err(PatternTableError::Parse(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");
        std::fs::write(
            &path,
            r#"{"version":7,"entries":[{"pattern":"ぽよ","type":"slang","difficulty":3,"tags":["custom"]}]}"#,
        )
        .unwrap();
        let matcher = PatternMatcher::new(PatternTable::from_path(&path).unwrap()).unwrap();
        assert_eq!(matcher.version(), 7);
        let found = matcher.extract_patterns("ぽよぽよ");
        assert_eq!(found.len(), 2);
        assert!(found[0].tags.contains("custom"));
    }
}
