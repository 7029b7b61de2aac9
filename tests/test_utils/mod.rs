//! Test utilities for integration tests
#![allow(dead_code)]
use std::path::PathBuf;
use std::sync::Arc;

use axum::{Router, body::Body};
use tempfile::TempDir;

use gemchat::api::AppState;
use gemchat::api::app;
use gemchat::chat::{Session, TranscriptStore};
use gemchat::core::{AppConfig, Credential};
use gemchat::gemini::{BoxedGenerate, GeminiClient};

pub const TEST_MODEL: &str = "gemini-2.5-flash";
pub const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

/// A test app whose transcript lives in a fresh temp directory and
/// whose generation calls go to `api_hostname` (usually a mockito
/// server). Keep the returned `TempDir` alive for the whole test.
pub fn test_app(api_hostname: &str, api_key: Option<&str>) -> (Router, TempDir) {
    let generator = GeminiClient::new(api_hostname, TEST_MODEL);
    test_app_with_generator(api_hostname, Box::new(generator), api_key)
}

/// Same as `test_app` but replies come from `generator`
pub fn test_app_with_generator(
    api_hostname: &str,
    generator: BoxedGenerate,
    api_key: Option<&str>,
) -> (Router, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp directory");

    let app_config = AppConfig {
        history_path: history_path(&dir),
        gemini_api_hostname: api_hostname.to_string(),
        gemini_model: TEST_MODEL.to_string(),
        web_ui_path: PathBuf::from("./web-ui"),
    };

    let store = TranscriptStore::new(&app_config.history_path);
    let credential = api_key.and_then(Credential::new);
    let session = Session::open(store, generator, credential);

    let app_state = AppState::new(session, app_config);
    (app(Arc::new(app_state)), dir)
}

pub fn history_path(dir: &TempDir) -> PathBuf {
    dir.path().join("chat_history.json")
}

pub fn gemini_reply(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}
