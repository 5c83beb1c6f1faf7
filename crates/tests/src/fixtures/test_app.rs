use aivlingual_api::{build_router, state::AppState};
use aivlingual_config::Settings;
use axum::{Json, Router, http::StatusCode};
use tokio::net::TcpListener;

pub struct TestApp {
    pub addr: String,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Default settings: builtin models, builtin patterns, no translator.
    pub async fn spawn() -> Self {
        Self::spawn_with(Settings::default()).await
    }

    pub async fn spawn_with(settings: Settings) -> Self {
        Self::try_spawn_with(settings)
            .await
            .expect("failed to spawn test app")
    }

    pub async fn try_spawn_with(settings: Settings) -> anyhow::Result<Self> {
        let state = AppState::from_settings(&settings)?;
        let router = build_router(state);
        let addr = serve(router).await?;

        Ok(Self {
            addr,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path))
    }

    pub async fn extract(&self, body: serde_json::Value) -> (u16, serde_json::Value) {
        let resp = self
            .post("/api/vocabulary/extract")
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }
}

/// Stand-in for the generative-language API: every request gets the same
/// reply, or the given error status.
pub async fn spawn_translation_stub(gloss: &str, status: StatusCode) -> String {
    let reply = serde_json::json!({
        "candidates": [{
            "content": { "parts": [{ "text": serde_json::json!({ "gloss": gloss, "reading": null }).to_string() }] }
        }]
    });
    let router = Router::new().fallback(move || {
        let reply = reply.clone();
        async move { (status, Json(reply)) }
    });
    serve(router).await.expect("failed to spawn translation stub")
}

async fn serve(router: Router) -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = format!("http://{}", listener.local_addr()?);
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    Ok(addr)
}
