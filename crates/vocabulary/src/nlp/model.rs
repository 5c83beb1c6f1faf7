use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wordfreq::WordFreq;
use wordfreq_model::{ModelKind, load_wordfreq};

use crate::error::ExtractorError;
use crate::language::Language;

use super::english::EnglishModel;
use super::idioms::IdiomList;
use super::japanese::JapaneseModel;
use super::token::Token;

const BUILTIN_POS_EN: &str = include_str!("../../data/pos_en.tsv");
const BUILTIN_IDIOMS: &str = include_str!("../../data/idioms.json");

/// Built-in models are shared by every provider in the process.
static BUILTIN: OnceLock<Result<Arc<LoadedModels>, String>> = OnceLock::new();

/// Tokenizer plus POS tagger for one language.
pub trait LanguageModel: Send + Sync {
    fn language(&self) -> Language;

    /// Human-readable model name.
    fn name(&self) -> &str;

    /// Tokenizes `text`. Token spans are byte ranges into `text`.
    fn analyze(&self, text: &str) -> Result<Vec<Token>, ExtractorError>;
}

/// Where the linguistic models come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelSource {
    /// Embedded IPADIC and frequency lists, with the compiled-in English
    /// lexicon and idiom list.
    Builtin,
    /// Embedded dictionaries, with `pos_en.tsv` and `idioms.json` read from
    /// a directory.
    Directory { path: PathBuf },
    /// Never load; the pipeline runs pattern-only.
    Disabled,
}

/// The loaded model set. Either language may be missing when the provider
/// was assembled by hand.
pub struct LoadedModels {
    pub english: Option<Arc<dyn LanguageModel>>,
    pub japanese: Option<Arc<dyn LanguageModel>>,
    pub idioms: IdiomList,
}

impl LoadedModels {
    pub fn model_for(&self, language: Language) -> Option<&dyn LanguageModel> {
        match language {
            Language::English => self.english.as_deref(),
            Language::Japanese => self.japanese.as_deref(),
            Language::Mixed => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.english.is_some() && self.japanese.is_some()
    }

    fn from_sources(pos_en: &str, idioms: &str) -> Result<Self, ExtractorError> {
        let english = EnglishModel::new(pos_en, frequencies(ModelKind::LargeEn, "en")?)?;
        let japanese = JapaneseModel::new(frequencies(ModelKind::LargeJa, "ja")?)?;
        Ok(Self {
            english: Some(Arc::new(english)),
            japanese: Some(Arc::new(japanese)),
            idioms: IdiomList::parse(idioms)?,
        })
    }
}

impl fmt::Debug for LoadedModels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModels")
            .field("english", &self.english.as_ref().map(|m| m.name().to_string()))
            .field("japanese", &self.japanese.as_ref().map(|m| m.name().to_string()))
            .field("idioms", &self.idioms.len())
            .finish()
    }
}

/// Long-lived owner of the NLP models.
///
/// Models load once, either through an explicit [`ModelProvider::initialize`]
/// at startup or lazily on first use, and are read-only afterwards. A failed
/// load is remembered and reported as [`ExtractorError::Unavailable`] on
/// every later call.
pub struct ModelProvider {
    source: ModelSource,
    models: OnceLock<Result<Arc<LoadedModels>, String>>,
}

impl fmt::Debug for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelProvider")
            .field("source", &self.source)
            .field("loaded", &self.models.get().map(|r| r.is_ok()))
            .finish()
    }
}

impl ModelProvider {
    pub fn new(source: ModelSource) -> Self {
        Self {
            source,
            models: OnceLock::new(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(ModelSource::Builtin)
    }

    pub fn disabled() -> Self {
        Self::new(ModelSource::Disabled)
    }

    /// Wraps an already loaded model set.
    pub fn from_models(models: LoadedModels) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(Arc::new(models)));
        Self {
            source: ModelSource::Builtin,
            models: cell,
        }
    }

    pub fn source(&self) -> &ModelSource {
        &self.source
    }

    /// One-time setup. Calling it again returns the cached outcome.
    pub fn initialize(&self) -> Result<Arc<LoadedModels>, ExtractorError> {
        self.models()
    }

    pub fn models(&self) -> Result<Arc<LoadedModels>, ExtractorError> {
        self.models
            .get_or_init(|| self.load())
            .clone()
            .map_err(ExtractorError::Unavailable)
    }

    /// True when models for both languages are loaded.
    pub fn is_available(&self) -> bool {
        self.models().is_ok_and(|m| m.is_complete())
    }

    fn load(&self) -> Result<Arc<LoadedModels>, String> {
        let result = match &self.source {
            ModelSource::Disabled => Err("NLP models disabled".to_string()),
            ModelSource::Builtin => BUILTIN
                .get_or_init(|| {
                    LoadedModels::from_sources(BUILTIN_POS_EN, BUILTIN_IDIOMS)
                        .map(Arc::new)
                        .map_err(into_message)
                })
                .clone(),
            ModelSource::Directory { path } => load_directory(path).map(Arc::new).map_err(into_message),
        };

        match &result {
            Ok(models) => info!(source = ?self.source, models = ?models, "NLP models loaded"),
            Err(e) => warn!(source = ?self.source, error = %e, "NLP models unavailable, using pattern matcher only"),
        }
        result
    }
}

fn into_message(e: ExtractorError) -> String {
    match e {
        ExtractorError::Unavailable(msg) | ExtractorError::Failed(msg) => msg,
    }
}

fn frequencies(kind: ModelKind, language: &str) -> Result<WordFreq, ExtractorError> {
    load_wordfreq(kind).map_err(|e| ExtractorError::Unavailable(format!("wordfreq {language}: {e:?}")))
}

fn load_directory(dir: &Path) -> Result<LoadedModels, ExtractorError> {
    let read = |name: &str| {
        let path = dir.join(name);
        std::fs::read_to_string(&path)
            .map_err(|e| ExtractorError::Unavailable(format!("{}: {e}", path.display())))
    };
    LoadedModels::from_sources(&read("pos_en.tsv")?, &read("idioms.json")?)
}

/// Built-in models for unit tests.
#[cfg(test)]
pub(crate) fn shared_models() -> Arc<LoadedModels> {
    match ModelProvider::builtin().models() {
        Ok(models) => models,
        Err(e) => panic!("built-in models failed to load: {e}"),
    }
}
