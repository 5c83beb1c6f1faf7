//! Translation collaborators that fill in glosses and readings.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TranslationError;
use crate::language::Language;
use crate::merge::normalize_text;

/// A gloss in the other study language, plus a reading when the source is
/// Japanese.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub gloss: String,
    #[serde(default)]
    pub reading: Option<String>,
}

/// Pluggable translation backend. Failures are never fatal to extraction.
#[async_trait]
pub trait Translator: Send + Sync + 'static {
    async fn translate(&self, text: &str, language: Language) -> Result<Translation, TranslationError>;

    /// Human-readable backend name.
    fn name(&self) -> &str;
}

/// In-memory dictionary keyed by normalized text.
#[derive(Debug, Clone, Default)]
pub struct StaticTranslator {
    entries: HashMap<(String, Language), Translation>,
}

impl StaticTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, text: &str, language: Language, translation: Translation) -> Self {
        self.insert(text, language, translation);
        self
    }

    pub fn insert(&mut self, text: &str, language: Language, translation: Translation) {
        self.entries
            .insert((normalize_text(text, language), language), translation);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Translator for StaticTranslator {
    async fn translate(&self, text: &str, language: Language) -> Result<Translation, TranslationError> {
        self.entries
            .get(&(normalize_text(text, language), language))
            .cloned()
            .ok_or_else(|| TranslationError::NotFound(text.to_string()))
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(feature = "gemini")]
pub use gemini::GeminiTranslator;

#[cfg(feature = "gemini")]
mod gemini {
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;
    use tracing::debug;

    use super::{Translation, Translator};
    use crate::error::TranslationError;
    use crate::language::Language;

    pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

    /// Asks a generative-language model for a short gloss and reading,
    /// requesting a JSON response.
    #[derive(Debug, Clone)]
    pub struct GeminiTranslator {
        client: reqwest::Client,
        api_key: String,
        endpoint: String,
        model: String,
    }

    #[derive(Debug, Deserialize)]
    struct GenerateResponse {
        #[serde(default)]
        candidates: Vec<ResponseCandidate>,
    }

    #[derive(Debug, Deserialize)]
    struct ResponseCandidate {
        content: ResponseContent,
    }

    #[derive(Debug, Deserialize)]
    struct ResponseContent {
        #[serde(default)]
        parts: Vec<ResponsePart>,
    }

    #[derive(Debug, Deserialize)]
    struct ResponsePart {
        #[serde(default)]
        text: String,
    }

    impl GeminiTranslator {
        pub fn new(api_key: impl Into<String>) -> Self {
            Self {
                client: reqwest::Client::new(),
                api_key: api_key.into(),
                endpoint: DEFAULT_ENDPOINT.to_string(),
                model: DEFAULT_MODEL.to_string(),
            }
        }

        pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
            self.endpoint = endpoint.into().trim_end_matches('/').to_string();
            self
        }

        pub fn with_model(mut self, model: impl Into<String>) -> Self {
            self.model = model.into();
            self
        }

        fn prompt(text: &str, language: Language) -> String {
            let (from, to) = match language {
                Language::English => ("English", "Japanese"),
                _ => ("Japanese", "English"),
            };
            format!(
                "Translate the {from} expression \"{text}\" into a short {to} gloss for a \
                 vocabulary flashcard. Reply with JSON {{\"gloss\": string, \"reading\": string|null}}; \
                 reading is the hiragana reading when the expression is Japanese, otherwise null."
            )
        }
    }

    pub(super) fn parse_reply(body: &str) -> Result<Translation, TranslationError> {
        let response: GenerateResponse = serde_json::from_str(body)
            .map_err(|e| TranslationError::InvalidResponse(e.to_string()))?;
        let text = response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim())
            .ok_or_else(|| TranslationError::InvalidResponse("no candidates".into()))?;
        let translation: Translation = serde_json::from_str(text)
            .map_err(|e| TranslationError::InvalidResponse(e.to_string()))?;
        if translation.gloss.trim().is_empty() {
            return Err(TranslationError::InvalidResponse("empty gloss".into()));
        }
        Ok(translation)
    }

    #[async_trait]
    impl Translator for GeminiTranslator {
        async fn translate(&self, text: &str, language: Language) -> Result<Translation, TranslationError> {
            let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
            let body = json!({
                "contents": [{ "parts": [{ "text": Self::prompt(text, language) }] }],
                "generationConfig": { "responseMimeType": "application/json", "temperature": 0.2 },
            });

            let resp = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| TranslationError::Request(e.to_string()))?;
            let status = resp.status();
            let payload = resp
                .text()
                .await
                .map_err(|e| TranslationError::Request(e.to_string()))?;
            if !status.is_success() {
                return Err(TranslationError::Request(format!("HTTP {status}")));
            }
            debug!(model = %self.model, bytes = payload.len(), "Translation reply received");
            parse_reply(&payload)
        }

        fn name(&self) -> &str {
            "gemini"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_translator_normalizes_keys() {
        let translator = StaticTranslator::new().with_entry(
            "ポンコツ",
            Language::Japanese,
            Translation {
                gloss: "clumsy".into(),
                reading: Some("ぽんこつ".into()),
            },
        );
        let hit = translator.translate("ぽんこつ", Language::Japanese).await.unwrap();
        assert_eq!(hit.gloss, "clumsy");
        assert!(matches!(
            translator.translate("ぽんこつ", Language::English).await,
            Err(TranslationError::NotFound(_))
        ));
    }

    #[cfg(feature = "gemini")]
    #[test]
    fn test_parse_gemini_reply() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"gloss\":\"precious\",\"reading\":\"てぇてぇ\"}"}]}}]}"#;
        let translation = gemini::parse_reply(body).unwrap();
        assert_eq!(translation.gloss, "precious");
        assert_eq!(translation.reading.as_deref(), Some("てぇてぇ"));

        assert!(matches!(
            gemini::parse_reply(r#"{"candidates":[]}"#),
            Err(TranslationError::InvalidResponse(_))
        ));
        assert!(matches!(
            gemini::parse_reply("not json"),
            Err(TranslationError::InvalidResponse(_))
        ));
    }
}
