use std::sync::Arc;

use aivlingual_config::Settings;
use aivlingual_vocabulary::{
    LevelDataset, ModelProvider, PatternMatcher, PatternTable, Translator, VocabularyPipeline,
};
use anyhow::Context;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<VocabularyPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<VocabularyPipeline>) -> Self {
        Self { pipeline }
    }

    /// Wires the pipeline from settings. A broken pattern table or level
    /// dataset is fatal; missing NLP models degrade to pattern-only
    /// extraction.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let table = match &settings.patterns.path {
            Some(path) => PatternTable::from_path(path)
                .with_context(|| format!("loading pattern table {}", path.display()))?,
            None => PatternTable::builtin().context("loading builtin pattern table")?,
        };
        let matcher = PatternMatcher::new(table).context("compiling pattern table")?;
        info!(
            version = matcher.version(),
            patterns = matcher.len(),
            "Pattern table loaded"
        );

        let provider = ModelProvider::new(settings.nlp.model_source()?);
        let translator = build_translator(settings)?;

        let mut pipeline = VocabularyPipeline::new(
            settings.extraction.clone(),
            Arc::new(matcher),
            Arc::new(provider),
            translator,
        );
        if let Some(path) = &settings.levels.path {
            let levels = LevelDataset::from_path(path)
                .with_context(|| format!("loading level dataset {}", path.display()))?;
            info!(entries = levels.len(), path = %path.display(), "Level dataset loaded");
            pipeline = pipeline.with_levels(Arc::new(levels));
        }
        Ok(Self::new(Arc::new(pipeline)))
    }
}

fn build_translator(settings: &Settings) -> anyhow::Result<Option<Arc<dyn Translator>>> {
    let translation = &settings.translation;
    match translation.provider.to_ascii_lowercase().as_str() {
        "" | "none" => Ok(None),
        #[cfg(feature = "gemini")]
        "gemini" => {
            let api_key = translation
                .api_key
                .clone()
                .context("translation.api_key is required for the gemini provider")?;
            let mut gemini = aivlingual_vocabulary::GeminiTranslator::new(api_key);
            if let Some(endpoint) = &translation.endpoint {
                gemini = gemini.with_endpoint(endpoint);
            }
            if let Some(model) = &translation.model {
                gemini = gemini.with_model(model);
            }
            Ok(Some(Arc::new(gemini)))
        }
        other => anyhow::bail!("unknown translation provider: {other}"),
    }
}
