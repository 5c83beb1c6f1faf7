use crate::fixtures::test_app::TestApp;
use serde_json::{Value, json};

const SRT: &str = "1
00:00:01,000 --> 00:00:03,500
<v Streamer>今日もてぇてぇ配信でした</v>

2
00:00:04,000 --> 00:00:06,000
gg everyone

3
00:00:04,000 --> 00:00:06,000
gg everyone
";

#[tokio::test]
async fn extract_from_srt() {
    let app = TestApp::spawn().await;
    let resp = app
        .post("/api/vocabulary/extract/srt")
        .json(&json!({ "srt": SRT, "source_id": "vod-7" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["stats"]["total_segments"], 2);

    let records = json["records"].as_array().unwrap();
    let gg = records.iter().find(|r| r["text"] == "gg").unwrap();
    assert_eq!(gg["timestamp_seconds"], 4.0);
    assert_eq!(gg["source_id"], "vod-7");

    let teetee = records.iter().find(|r| r["text"] == "てぇてぇ").unwrap();
    assert_eq!(teetee["timestamp_seconds"], 1.0);
}

#[tokio::test]
async fn srt_without_cues_is_a_validation_error() {
    let app = TestApp::spawn().await;
    let resp = app
        .post("/api/vocabulary/extract/srt")
        .json(&json!({ "srt": "just some words" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 422);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "validation");
}
