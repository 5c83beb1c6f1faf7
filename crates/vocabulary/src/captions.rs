//! Caption ingestion: SRT files and pre-timed text.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::TranscriptSegment;
use crate::error::CaptionError;

/// Caption text with timing, as supplied by a caption fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedText {
    pub text: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

pub fn segments_from_timed(items: &[TimedText], source_id: Option<&str>) -> Vec<TranscriptSegment> {
    items
        .iter()
        .map(|item| {
            let segment = TranscriptSegment::new(item.text.clone())
                .with_timing(item.start_seconds, item.end_seconds);
            match source_id {
                Some(id) => segment.with_source(id),
                None => segment,
            }
        })
        .collect()
}

pub fn parse_srt_file(path: impl AsRef<Path>) -> Result<Vec<TimedText>, CaptionError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_srt(&content)
}

/// Parses SRT cues, drops speaker labels and markup, deduplicates by
/// (start time, text) and sorts by start time.
///
/// Blank input yields no cues; non-blank input without a single valid cue
/// is an error.
pub fn parse_srt(content: &str) -> Result<Vec<TimedText>, CaptionError> {
    let content = content.trim_start_matches('\u{feff}');
    let mut cues = Vec::new();
    let mut lines = content.lines().peekable();

    while lines.peek().is_some() {
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }

        let Some(first) = lines.next() else {
            break;
        };
        // The index line is optional in the wild; accept a bare timestamp.
        let ts_line = if first.trim().parse::<usize>().is_ok() {
            match lines.next() {
                Some(l) => l,
                None => break,
            }
        } else {
            first
        };
        let Some((start_seconds, end_seconds)) = parse_timestamp_line(ts_line.trim()) else {
            continue;
        };

        let mut parts = Vec::new();
        while let Some(line) = lines.next_if(|l| !l.trim().is_empty()) {
            parts.push(strip_markup(line.trim()));
        }
        let text = strip_speaker(&parts.join(" ")).trim().to_string();
        if text.is_empty() {
            continue;
        }
        cues.push(TimedText {
            text,
            start_seconds,
            end_seconds,
        });
    }

    if cues.is_empty() && !content.trim().is_empty() {
        return Err(CaptionError::NoCues);
    }

    let mut seen = HashSet::new();
    cues.retain(|cue| seen.insert(((cue.start_seconds * 1000.0).round() as i64, cue.text.clone())));
    cues.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));
    Ok(cues)
}

/// Removes recognized speaker markup: a ">>" turn marker with an optional
/// "Name:" label, or a leading bracketed name such as "[Pekora]". WebVTT
/// voice tags go with the rest of the markup. A bare "word: text" is caption
/// content and is kept.
fn strip_speaker(text: &str) -> &str {
    if let Some(rest) = text.strip_prefix(">>") {
        let rest = rest.trim_start();
        return match rest.split_once([':', '：']) {
            Some((name, after)) if is_speaker_name(name) => after.trim_start(),
            _ => rest,
        };
    }
    for (open, close) in [('[', ']'), ('(', ')'), ('（', '）'), ('【', '】')] {
        let Some((name, after)) = text.strip_prefix(open).and_then(|inner| inner.split_once(close)) else {
            continue;
        };
        if is_speaker_name(name) {
            return after.trim_start_matches([':', '：']).trim_start();
        }
    }
    text
}

fn is_speaker_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && name.chars().count() < 30 && name.split_whitespace().count() <= 3
}

fn strip_markup(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_tag = false;
    for c in line.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// "00:00:02,965 --> 00:00:04,277"
fn parse_timestamp_line(line: &str) -> Option<(f64, f64)> {
    let (start, end) = line.split_once("-->")?;
    // Cue settings may follow the end time.
    let end = end.split_whitespace().next()?;
    Some((parse_srt_time(start.trim())?, parse_srt_time(end)?))
}

/// "HH:MM:SS,mmm" (or with a dot) to seconds.
fn parse_srt_time(s: &str) -> Option<f64> {
    let s = s.replace(',', ".");
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let hours: f64 = parts[0].parse().ok()?;
    let minutes: f64 = parts[1].parse().ok()?;
    let seconds: f64 = parts[2].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
