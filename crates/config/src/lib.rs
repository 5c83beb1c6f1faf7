//! Layered service settings: `config/default.toml`, then
//! `config/{RUN_MODE}.toml`, then `AIVLINGUAL__SECTION__KEY` variables.

use std::path::{Path, PathBuf};

use aivlingual_vocabulary::{ExtractionConfig, ModelSource};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub log: LogSettings,
    pub extraction: ExtractionConfig,
    pub nlp: NlpSettings,
    pub patterns: PatternSettings,
    pub levels: LevelSettings,
    pub translation: TranslationSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info,aivlingual=debug".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NlpSettings {
    /// `builtin`, `directory` or `disabled`.
    pub source: String,
    /// Required when `source = "directory"`.
    pub model_dir: Option<PathBuf>,
}

impl Default for NlpSettings {
    fn default() -> Self {
        Self {
            source: "builtin".to_string(),
            model_dir: None,
        }
    }
}

impl NlpSettings {
    pub fn model_source(&self) -> Result<ModelSource, ConfigError> {
        match self.source.to_ascii_lowercase().as_str() {
            "builtin" => Ok(ModelSource::Builtin),
            "disabled" | "none" => Ok(ModelSource::Disabled),
            "directory" => match &self.model_dir {
                Some(path) => Ok(ModelSource::Directory { path: path.clone() }),
                None => Err(ConfigError::Message(
                    "nlp.model_dir is required when nlp.source = \"directory\"".to_string(),
                )),
            },
            other => Err(ConfigError::Message(format!("unknown nlp.source: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PatternSettings {
    /// External pattern table; the compiled-in table is used when unset.
    pub path: Option<PathBuf>,
}

/// Curated CEFR / JLPT levels that override frequency banding.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LevelSettings {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    /// `none` or `gemini`.
    pub provider: String,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            provider: "none".to_string(),
            api_key: None,
            endpoint: None,
            model: None,
        }
    }
}

impl Settings {
    /// Loads from `./config` relative to the working directory.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("config"))
    }

    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        Config::builder()
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(&run_mode)).required(false))
            .add_source(
                Environment::with_prefix("AIVLINGUAL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
