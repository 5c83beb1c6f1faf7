use crate::fixtures::test_app::{TestApp, spawn_translation_stub};
use aivlingual_config::Settings;
use axum::http::StatusCode;
use serde_json::{Value, json};

fn gemini_settings(endpoint: String) -> Settings {
    let mut settings = Settings::default();
    settings.translation.provider = "gemini".to_string();
    settings.translation.api_key = Some("test-key".to_string());
    settings.translation.endpoint = Some(endpoint);
    settings.extraction.translation_timeout_ms = 2_000;
    settings
}

#[tokio::test]
async fn glosses_come_from_translator() {
    let endpoint = spawn_translation_stub("from the stub", StatusCode::OK).await;
    let app = TestApp::spawn_with(gemini_settings(endpoint)).await;

    let health: Value = app.get("/health").send().await.unwrap().json().await.unwrap();
    assert_eq!(health["translator"], "gemini");

    let (status, json) = app.extract(json!({ "transcript": "gg, touch grass" })).await;
    assert_eq!(status, 200);
    let records = json["records"].as_array().unwrap();
    assert!(records.iter().any(|r| r["text"] == "touch grass"));
    assert!(records.iter().all(|r| r["gloss"] == "from the stub"));
}

#[tokio::test]
async fn translator_failure_keeps_records() {
    let endpoint = spawn_translation_stub("unused", StatusCode::INTERNAL_SERVER_ERROR).await;
    let app = TestApp::spawn_with(gemini_settings(endpoint)).await;

    let (status, json) = app.extract(json!({ "transcript": "gg, touch grass" })).await;
    assert_eq!(status, 200);
    let records = json["records"].as_array().unwrap();
    assert!(records.iter().any(|r| r["text"] == "touch grass"));
    assert!(records.iter().all(|r| r["gloss"] == ""));
}

#[tokio::test]
async fn gemini_without_api_key_fails_to_start() {
    let mut settings = Settings::default();
    settings.translation.provider = "gemini".to_string();
    assert!(TestApp::try_spawn_with(settings).await.is_err());
}
