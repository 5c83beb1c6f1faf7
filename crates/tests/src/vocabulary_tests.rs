use crate::fixtures::test_app::TestApp;
use aivlingual_config::Settings;
use serde_json::{Value, json};

const STREAM_LINE: &str = "今日はてぇてぇ配信だったね、本当にgood stream!";

fn find<'a>(records: &'a [Value], text: &str) -> &'a Value {
    records
        .iter()
        .find(|r| r["text"] == text)
        .unwrap_or_else(|| panic!("no record for {text}: {records:?}"))
}

#[tokio::test]
async fn health_reports_nlp_enabled() {
    let app = TestApp::spawn().await;
    let resp = app.get("/health").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["nlp_enabled"], true);
    assert_eq!(json["translator"], Value::Null);
}

#[tokio::test]
async fn extract_mixed_language_line() {
    let app = TestApp::spawn().await;
    let (status, json) = app
        .extract(json!({ "transcript": STREAM_LINE, "source_id": "stream-42" }))
        .await;

    assert_eq!(status, 200);
    assert_eq!(json["nlp_enabled"], true);
    let records = json["records"].as_array().unwrap();

    let teetee = find(records, "てぇてぇ");
    assert_eq!(teetee["expression_type"], "slang");
    assert_eq!(teetee["difficulty"], 2);
    assert_eq!(teetee["language"], "japanese");
    assert_eq!(teetee["extractor"], "pattern");
    assert_eq!(teetee["source_id"], "stream-42");

    let good_stream = find(records, "good stream");
    assert_eq!(good_stream["expression_type"], "collocation");
    assert_eq!(good_stream["language"], "english");
    assert_eq!(good_stream["extractor"], "nlp");

    assert_eq!(json["stats"]["total_segments"], 1);
}

#[tokio::test]
async fn extract_timed_segments_keeps_timestamps() {
    let app = TestApp::spawn().await;
    let (status, json) = app
        .extract(json!({
            "segments": [
                { "text": "gg everyone", "start_seconds": 3.0, "end_seconds": 4.5 },
                { "text": "skill issue honestly", "start_seconds": 61.25, "end_seconds": 63.0 }
            ]
        }))
        .await;

    assert_eq!(status, 200);
    let records = json["records"].as_array().unwrap();
    assert_eq!(find(records, "gg")["timestamp_seconds"], 3.0);
    assert_eq!(find(records, "skill issue")["timestamp_seconds"], 61.25);
}

#[tokio::test]
async fn extract_empty_transcript_returns_no_records() {
    let app = TestApp::spawn().await;
    let (status, json) = app.extract(json!({ "transcript": "" })).await;
    assert_eq!(status, 200);
    assert_eq!(json["records"], json!([]));
    assert_eq!(json["nlp_enabled"], true);
}

#[tokio::test]
async fn extract_rejects_transcript_and_segments_together() {
    let app = TestApp::spawn().await;
    let (status, json) = app
        .extract(json!({
            "transcript": "gg",
            "segments": [{ "text": "gg", "start_seconds": 0.0, "end_seconds": 1.0 }]
        }))
        .await;
    assert_eq!(status, 400);
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn disabled_nlp_degrades_to_patterns() {
    let mut settings = Settings::default();
    settings.nlp.source = "disabled".to_string();
    let app = TestApp::spawn_with(settings).await;

    let (status, json) = app.extract(json!({ "transcript": STREAM_LINE })).await;
    assert_eq!(status, 200);
    assert_eq!(json["nlp_enabled"], false);

    let records = json["records"].as_array().unwrap();
    assert!(!records.is_empty());
    assert!(records.iter().all(|r| r["extractor"] == "pattern"));
    assert!(records.iter().any(|r| r["text"] == "てぇてぇ"));
    assert!(records.iter().all(|r| r["text"] != "good stream"));

    let resp = app.get("/health").send().await.unwrap();
    let health: Value = resp.json().await.unwrap();
    assert_eq!(health["nlp_enabled"], false);
}

#[tokio::test]
async fn missing_model_directory_degrades_to_patterns() {
    let mut settings = Settings::default();
    settings.nlp.source = "directory".to_string();
    settings.nlp.model_dir = Some("/nonexistent/aivlingual-models".into());
    let app = TestApp::spawn_with(settings).await;

    let (status, json) = app.extract(json!({ "transcript": "gg, touch grass" })).await;
    assert_eq!(status, 200);
    assert_eq!(json["nlp_enabled"], false);
    assert_eq!(json["records"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn records_are_unique_per_text_and_language() {
    let app = TestApp::spawn().await;
    let transcript = "てぇてぇ\nテェテェ? no, てぇてぇ!\ngg gg GG";
    let (status, json) = app.extract(json!({ "transcript": transcript })).await;
    assert_eq!(status, 200);

    let records = json["records"].as_array().unwrap();
    let mut keys: Vec<(String, String)> = records
        .iter()
        .map(|r| {
            (
                r["normalized"].as_str().unwrap().to_string(),
                r["language"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    let total = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), total);
    assert_eq!(records.iter().filter(|r| r["normalized"] == "gg").count(), 1);
}
