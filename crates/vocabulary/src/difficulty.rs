use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::candidate::{CandidateExpression, DifficultyHint, ExpressionType};
use crate::config::ExtractionConfig;
use crate::error::LevelDatasetError;
use crate::language::Language;
use crate::merge::normalize_text;

/// A proficiency band in `1..=5`. Serialized as a bare integer; there is no
/// way to construct one from a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: Difficulty = Difficulty(1);
    pub const MAX: Difficulty = Difficulty(5);

    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN.0..=Self::MAX.0)
            .contains(&level)
            .then_some(Self(level))
    }

    /// Saturates any integer into the valid band.
    pub fn clamp(level: i64) -> Self {
        Self(level.clamp(Self::MIN.0 as i64, Self::MAX.0 as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("difficulty must be between 1 and 5, got {0}")]
pub struct InvalidDifficulty(pub u8);

impl TryFrom<u8> for Difficulty {
    type Error = InvalidDifficulty;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level).ok_or(InvalidDifficulty(level))
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> u8 {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// CEFR bands as used by learner vocabulary lists. C1 and C2 share the top
/// level; the top level reads back as C1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }
}

impl From<CefrLevel> for Difficulty {
    fn from(level: CefrLevel) -> Self {
        match level {
            CefrLevel::A1 => Difficulty(1),
            CefrLevel::A2 => Difficulty(2),
            CefrLevel::B1 => Difficulty(3),
            CefrLevel::B2 => Difficulty(4),
            CefrLevel::C1 | CefrLevel::C2 => Difficulty(5),
        }
    }
}

impl From<Difficulty> for CefrLevel {
    fn from(d: Difficulty) -> Self {
        match d.0 {
            1 => CefrLevel::A1,
            2 => CefrLevel::A2,
            3 => CefrLevel::B1,
            4 => CefrLevel::B2,
            _ => CefrLevel::C1,
        }
    }
}

/// JLPT levels, N5 being the easiest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JlptLevel {
    N5,
    N4,
    N3,
    N2,
    N1,
}

impl JlptLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            JlptLevel::N5 => "N5",
            JlptLevel::N4 => "N4",
            JlptLevel::N3 => "N3",
            JlptLevel::N2 => "N2",
            JlptLevel::N1 => "N1",
        }
    }
}

impl From<JlptLevel> for Difficulty {
    fn from(level: JlptLevel) -> Self {
        match level {
            JlptLevel::N5 => Difficulty(1),
            JlptLevel::N4 => Difficulty(2),
            JlptLevel::N3 => Difficulty(3),
            JlptLevel::N2 => Difficulty(4),
            JlptLevel::N1 => Difficulty(5),
        }
    }
}

impl From<Difficulty> for JlptLevel {
    fn from(d: Difficulty) -> Self {
        match d.0 {
            1 => JlptLevel::N5,
            2 => JlptLevel::N4,
            3 => JlptLevel::N3,
            4 => JlptLevel::N2,
            _ => JlptLevel::N1,
        }
    }
}

/// Learner-facing label for a level: JLPT for Japanese, CEFR otherwise.
pub fn level_label(difficulty: Difficulty, language: Language) -> &'static str {
    match language {
        Language::Japanese => JlptLevel::from(difficulty).as_str(),
        _ => CefrLevel::from(difficulty).as_str(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetEntry<L> {
    Level(L),
    Detailed { level: L },
}

impl<L> DatasetEntry<L> {
    fn level(self) -> L {
        match self {
            DatasetEntry::Level(level) | DatasetEntry::Detailed { level } => level,
        }
    }
}

#[derive(Deserialize)]
struct DatasetFile {
    #[serde(default)]
    english: HashMap<String, DatasetEntry<CefrLevel>>,
    #[serde(default)]
    japanese: HashMap<String, DatasetEntry<JlptLevel>>,
}

/// Curated per-word levels that take precedence over frequency banding.
///
/// JSON with `english` (CEFR) and `japanese` (JLPT) maps. A value is either
/// the bare label or an object with a `level` field:
///
/// ```json
/// {"english": {"grind": "B2", "lurk": {"level": "C1", "pos": "VERB"}},
///  "japanese": {"配信": "N2"}}
/// ```
///
/// Keys are normalized like dedup keys, so `Grind` and `ＧＲＩＮＤ` match.
/// Japanese candidates are also looked up by reading.
#[derive(Debug, Clone, Default)]
pub struct LevelDataset {
    english: HashMap<String, Difficulty>,
    japanese: HashMap<String, Difficulty>,
}

impl LevelDataset {
    pub fn parse(json: &str) -> Result<Self, LevelDatasetError> {
        let file: DatasetFile = serde_json::from_str(json)?;
        Ok(Self {
            english: file
                .english
                .into_iter()
                .map(|(word, entry)| (normalize_text(&word, Language::English), entry.level().into()))
                .collect(),
            japanese: file
                .japanese
                .into_iter()
                .map(|(word, entry)| (normalize_text(&word, Language::Japanese), entry.level().into()))
                .collect(),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LevelDatasetError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&json)
    }

    pub fn lookup(&self, candidate: &CandidateExpression) -> Option<Difficulty> {
        match candidate.language {
            Language::English => self
                .english
                .get(&normalize_text(&candidate.text, Language::English))
                .copied(),
            Language::Japanese => std::iter::once(candidate.text.as_str())
                .chain(candidate.reading.as_deref())
                .find_map(|key| self.japanese.get(&normalize_text(key, Language::Japanese)))
                .copied(),
            Language::Mixed => None,
        }
    }

    pub fn len(&self) -> usize {
        self.english.len() + self.japanese.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves candidates to a [`Difficulty`].
#[derive(Debug, Clone)]
pub struct DifficultyClassifier {
    zipf_cutoffs: [f32; 4],
    idiom_floor: Difficulty,
    levels: Arc<LevelDataset>,
}

impl DifficultyClassifier {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            zipf_cutoffs: config.zipf_cutoffs,
            idiom_floor: Difficulty::clamp(config.idiom_floor as i64),
            levels: Arc::new(LevelDataset::default()),
        }
    }

    pub fn with_levels(mut self, levels: Arc<LevelDataset>) -> Self {
        self.levels = levels;
        self
    }

    /// Pattern candidates keep their static level. Frequency hints take the
    /// curated level when there is one and are banded by Zipf frequency
    /// otherwise, then raised to the floor for idioms and slang.
    pub fn classify(&self, candidate: &CandidateExpression) -> Difficulty {
        match candidate.hint {
            DifficultyHint::Static(level) => level,
            DifficultyHint::Frequency(zipf) => {
                let level = self.levels.lookup(candidate).unwrap_or_else(|| self.band(zipf));
                level.max(self.floor_for(candidate.expression_type))
            }
        }
    }

    fn band(&self, zipf: Option<f32>) -> Difficulty {
        let level = zipf
            .and_then(|z| self.zipf_cutoffs.iter().position(|&cutoff| z >= cutoff))
            .map_or(5, |i| i + 1);
        Difficulty::clamp(level as i64)
    }

    fn floor_for(&self, expression_type: ExpressionType) -> Difficulty {
        match expression_type {
            ExpressionType::Idiom | ExpressionType::Slang => self.idiom_floor,
            _ => Difficulty::MIN,
        }
    }
}
