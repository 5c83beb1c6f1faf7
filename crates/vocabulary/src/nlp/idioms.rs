use regex::Regex;
use serde::Deserialize;

use crate::error::ExtractorError;
use crate::language::Language;

#[derive(Debug, Deserialize)]
struct IdiomEntry {
    pattern: String,
    gloss: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct IdiomFile {
    #[serde(default)]
    english: Vec<IdiomEntry>,
    #[serde(default)]
    japanese: Vec<IdiomEntry>,
}

#[derive(Debug, Clone)]
pub struct Idiom {
    pub regex: Regex,
    pub gloss: Option<String>,
    pub tags: Vec<String>,
}

/// Curated idiom patterns per language. English patterns match
/// case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct IdiomList {
    english: Vec<Idiom>,
    japanese: Vec<Idiom>,
}

impl IdiomList {
    pub fn parse(json: &str) -> Result<Self, ExtractorError> {
        let file: IdiomFile = serde_json::from_str(json)
            .map_err(|e| ExtractorError::Unavailable(format!("idiom list: {e}")))?;
        Ok(Self {
            english: compile(file.english, true)?,
            japanese: compile(file.japanese, false)?,
        })
    }

    pub fn for_language(&self, language: Language) -> &[Idiom] {
        match language {
            Language::English => &self.english,
            Language::Japanese => &self.japanese,
            Language::Mixed => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.english.len() + self.japanese.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn compile(entries: Vec<IdiomEntry>, case_insensitive: bool) -> Result<Vec<Idiom>, ExtractorError> {
    entries
        .into_iter()
        .map(|entry| {
            let source = if case_insensitive {
                format!("(?i){}", entry.pattern)
            } else {
                entry.pattern.clone()
            };
            let regex = Regex::new(&source).map_err(|e| {
                ExtractorError::Unavailable(format!("idiom {:?}: {e}", entry.pattern))
            })?;
            Ok(Idiom {
                regex,
                gloss: entry.gloss,
                tags: entry.tags,
            })
        })
        .collect()
}
