//! Script-ratio language detection.

use serde::{Deserialize, Serialize};

use crate::TranscriptSegment;

/// Default share each script must exceed for a span to count as mixed.
pub const DEFAULT_MIXED_THRESHOLD: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Japanese,
    English,
    Mixed,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Japanese => "japanese",
            Language::English => "english",
            Language::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LanguageLabel {
    pub language: Language,
    /// Fraction of letters in the non-dominant script, in `[0, 0.5]`.
    pub mixed_ratio: f32,
    pub japanese_chars: usize,
    pub latin_chars: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Script {
    Japanese,
    Latin,
    Neutral,
}

pub(crate) fn script_of(c: char) -> Script {
    if is_japanese(c) {
        Script::Japanese
    } else if is_latin(c) {
        Script::Latin
    } else {
        Script::Neutral
    }
}

pub fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

pub fn is_katakana(c: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&c) || ('\u{FF66}'..='\u{FF9F}').contains(&c)
}

pub fn is_kanji(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c) || ('\u{3400}'..='\u{4DBF}').contains(&c)
}

pub fn is_japanese(c: char) -> bool {
    is_hiragana(c) || is_katakana(c) || is_kanji(c)
}

pub fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic()
        || (c.is_alphabetic() && ('\u{00C0}'..='\u{024F}').contains(&c))
        || ('\u{FF21}'..='\u{FF3A}').contains(&c)
        || ('\u{FF41}'..='\u{FF5A}').contains(&c)
}

/// Non-empty text made only of kana and the long vowel mark.
pub fn is_kana(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| is_hiragana(c) || is_katakana(c) || c == 'ー')
}

/// Classifies `text` with the default threshold.
pub fn detect(text: &str) -> LanguageLabel {
    detect_with_threshold(text, DEFAULT_MIXED_THRESHOLD)
}

/// Text without any letters is labelled English with a zero ratio.
pub fn detect_with_threshold(text: &str, threshold: f32) -> LanguageLabel {
    let (japanese_chars, latin_chars) =
        text.chars()
            .fold((0usize, 0usize), |(ja, la), c| match script_of(c) {
                Script::Japanese => (ja + 1, la),
                Script::Latin => (ja, la + 1),
                Script::Neutral => (ja, la),
            });
    let total = japanese_chars + latin_chars;
    if total == 0 {
        return LanguageLabel {
            language: Language::English,
            mixed_ratio: 0.0,
            japanese_chars,
            latin_chars,
        };
    }

    let japanese_ratio = japanese_chars as f32 / total as f32;
    let latin_ratio = latin_chars as f32 / total as f32;
    let language = if japanese_ratio > threshold && latin_ratio > threshold {
        Language::Mixed
    } else if japanese_chars > latin_chars {
        Language::Japanese
    } else {
        Language::English
    };

    LanguageLabel {
        language,
        mixed_ratio: japanese_ratio.min(latin_ratio),
        japanese_chars,
        latin_chars,
    }
}

/// A maximal single-script slice of a mixed span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRun<'a> {
    pub language: Language,
    pub text: &'a str,
    /// Byte offset of `text` within the input.
    pub offset: usize,
}

/// Splits `text` at script boundaries. Spaces, digits and punctuation stay
/// with the run they follow; leading ones join the first run. Returns
/// nothing when the text has no letters.
pub fn split_script_runs(text: &str) -> Vec<ScriptRun<'_>> {
    let mut runs = Vec::new();
    let mut current: Option<(Script, usize)> = None;

    for (idx, c) in text.char_indices() {
        let script = script_of(c);
        if script == Script::Neutral {
            continue;
        }
        match current {
            None => current = Some((script, 0)),
            Some((active, start)) if active != script => {
                runs.push(make_run(text, active, start, idx));
                current = Some((script, idx));
            }
            Some(_) => {}
        }
    }

    if let Some((active, start)) = current {
        runs.push(make_run(text, active, start, text.len()));
    }
    runs
}

fn make_run(text: &str, script: Script, start: usize, end: usize) -> ScriptRun<'_> {
    ScriptRun {
        language: if script == Script::Japanese {
            Language::Japanese
        } else {
            Language::English
        },
        text: &text[start..end],
        offset: start,
    }
}

/// Folds full-width katakana onto hiragana; other characters pass through.
pub fn katakana_to_hiragana(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Transcript-level summary returned alongside the records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptStats {
    pub total_segments: usize,
    pub japanese_segments: usize,
    pub english_segments: usize,
    pub mixed_segments: usize,
    pub total_words: usize,
    pub total_duration_seconds: f64,
    pub words_per_minute: f64,
}

impl TranscriptStats {
    pub fn from_segments(segments: &[TranscriptSegment], threshold: f32) -> Self {
        let mut stats = TranscriptStats::default();
        for segment in segments {
            stats.total_segments += 1;
            match detect_with_threshold(&segment.text, threshold).language {
                Language::Japanese => stats.japanese_segments += 1,
                Language::English => stats.english_segments += 1,
                Language::Mixed => stats.mixed_segments += 1,
            }
            stats.total_words += segment.text.split_whitespace().count();
        }

        let start = segments.iter().filter_map(|s| s.start_seconds).reduce(f64::min);
        let end = segments
            .iter()
            .filter_map(|s| s.end_seconds.or(s.start_seconds))
            .reduce(f64::max);
        if let (Some(start), Some(end)) = (start, end) {
            stats.total_duration_seconds = (end - start).max(0.0);
        }
        if stats.total_duration_seconds > 0.0 {
            stats.words_per_minute =
                stats.total_words as f64 / (stats.total_duration_seconds / 60.0);
        }
        stats
    }
}
