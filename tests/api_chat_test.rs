//! Integration tests for the chat API endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use gemchat::chat::Turn;
    use gemchat::core::{ChatError, Credential};
    use gemchat::gemini::Generate;
    use tokio::sync::Notify;

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::util::ServiceExt;

    use crate::test_utils::{
        GENERATE_PATH, body_to_string, gemini_reply, history_path, test_app,
        test_app_with_generator,
    };

    /// Replies "Hello!" once `release` is notified. `started` fires
    /// when the call begins.
    struct GatedGenerator {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl Generate for GatedGenerator {
        async fn generate(
            &self,
            _credential: &Credential,
            _prompt: &str,
            _history: &[Turn],
        ) -> Result<String, ChatError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok("Hello!".to_string())
        }
    }

    fn gated_app() -> (Router, tempfile::TempDir, Arc<Notify>, Arc<Notify>) {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let generator = GatedGenerator {
            started: Arc::clone(&started),
            release: Arc::clone(&release),
        };
        let (app, dir) =
            test_app_with_generator("http://127.0.0.1:1", Box::new(generator), Some("test-key"));
        (app, dir, started, release)
    }

    async fn get_chat(app: &Router) -> Value {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/chat").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        serde_json::from_str(&body_to_string(response.into_body()).await).unwrap()
    }

    async fn post_message(app: &Router, message: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/chat")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({ "message": message }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = body_to_string(response.into_body()).await;
        (status, serde_json::from_str(&body).unwrap_or(Value::Null))
    }

    /// Tests getting the transcript returns an empty list initially
    #[tokio::test]
    async fn it_gets_empty_transcript() {
        let (app, _dir) = test_app("http://127.0.0.1:1", Some("test-key"));

        let response = app
            .oneshot(Request::builder().uri("/api/chat").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body: Value =
            serde_json::from_str(&body_to_string(response.into_body()).await).unwrap();
        assert_eq!(body["transcript"], json!([]));
        assert_eq!(body["state"], "idle");
        assert_eq!(body["has_credential"], true);
    }

    /// Tests a prompt produces a user and assistant turn saved to disk
    #[tokio::test]
    async fn it_submits_a_prompt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GENERATE_PATH)
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(gemini_reply("Hello!"))
            .expect(1)
            .create_async()
            .await;

        let (app, dir) = test_app(&server.url(), Some("test-key"));
        let (status, body) = post_message(&app, "Hi").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "completed");
        assert_eq!(body["state"], "idle");

        let transcript = body["transcript"].as_array().unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0]["role"], "user");
        assert_eq!(transcript[0]["content"], "Hi");
        assert_eq!(transcript[1]["role"], "assistant");
        assert_eq!(transcript[1]["content"], "Hello!");

        let on_disk: Value =
            serde_json::from_str(&fs::read_to_string(history_path(&dir)).unwrap()).unwrap();
        assert_eq!(&on_disk, &body["transcript"]);
        mock.assert_async().await;
    }

    /// Tests a failed generation call becomes a visible assistant turn
    /// and the next prompt still works
    #[tokio::test]
    async fn it_records_generation_failure() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", GENERATE_PATH)
            .with_status(429)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"code": 429, "message": "quota exceeded"}}"#)
            .create_async()
            .await;

        let (app, _dir) = test_app(&server.url(), Some("test-key"));
        let (status, body) = post_message(&app, "Hi").await;

        assert_eq!(status, StatusCode::OK);
        let transcript = body["transcript"].as_array().unwrap();
        let last = transcript.last().unwrap();
        assert_eq!(last["role"], "assistant");
        assert!(last["content"].as_str().unwrap().contains("quota exceeded"));

        failing.remove_async().await;
        let _ok = server
            .mock("POST", GENERATE_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(gemini_reply("Working now"))
            .create_async()
            .await;

        let (_, body) = post_message(&app, "Again").await;
        let transcript = body["transcript"].as_array().unwrap();
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript[3]["content"], "Working now");
    }

    /// Tests clearing removes the transcript and the file
    #[tokio::test]
    async fn it_clears_transcript() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", GENERATE_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(gemini_reply("Hello!"))
            .create_async()
            .await;

        let (app, dir) = test_app(&server.url(), Some("test-key"));
        post_message(&app, "Hi").await;
        assert!(history_path(&dir).exists());

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/api/chat")
                        .method("DELETE")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let body: Value =
                serde_json::from_str(&body_to_string(response.into_body()).await).unwrap();
            assert_eq!(body["transcript"], json!([]));
            assert_eq!(body["warnings"], json!([]));
            assert!(!history_path(&dir).exists());
        }
    }

    /// Tests downloading the transcript as a JSON attachment
    #[tokio::test]
    async fn it_downloads_transcript() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", GENERATE_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(gemini_reply("Hello!"))
            .create_async()
            .await;

        let (app, _dir) = test_app(&server.url(), Some("test-key"));
        let (_, chat) = post_message(&app, "Hi").await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/chat/download")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"chat_history_"));
        assert!(disposition.ends_with(".json\""));

        let exported: Value =
            serde_json::from_str(&body_to_string(response.into_body()).await).unwrap();
        assert_eq!(exported, chat["transcript"]);
    }

    /// Tests a blank prompt is ignored and nothing is written
    #[tokio::test]
    async fn it_ignores_blank_prompt() {
        let (app, dir) = test_app("http://127.0.0.1:1", Some("test-key"));
        let (status, body) = post_message(&app, "   ").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "ignored");
        assert_eq!(body["transcript"], json!([]));
        assert!(!history_path(&dir).exists());
    }

    /// Tests posting without a message returns 422
    #[tokio::test]
    async fn it_returns_422_for_missing_message() {
        let (app, _dir) = test_app("http://127.0.0.1:1", Some("test-key"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/chat")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({ "text": "Hi" }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    /// Tests a read during generation returns at once with the pending
    /// user turn and a generating state
    #[tokio::test]
    async fn it_gets_transcript_while_generating() {
        let (app, _dir, started, release) = gated_app();

        let pending = tokio::spawn({
            let app = app.clone();
            async move { post_message(&app, "Hi").await }
        });
        started.notified().await;

        let body = tokio::time::timeout(Duration::from_secs(5), get_chat(&app))
            .await
            .expect("GET waited on the generating turn");
        assert_eq!(body["state"], "generating");
        let transcript = body["transcript"].as_array().unwrap();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0]["role"], "user");
        assert_eq!(transcript[0]["content"], "Hi");

        let (status, _) = post_message(&app, "Again").await;
        assert_eq!(status, StatusCode::CONFLICT);

        release.notify_one();
        let (status, body) = pending.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "idle");
        assert_eq!(body["transcript"].as_array().unwrap().len(), 2);
    }

    /// Tests a request dropped mid-generation still finishes its turn
    /// and the next prompt keeps user and assistant turns alternating
    #[tokio::test]
    async fn it_finishes_turn_after_request_is_dropped() {
        let (app, dir, started, release) = gated_app();

        let request = post_message(&app, "Hi");
        tokio::select! {
            biased;
            _ = request => panic!("Turn completed before it was released"),
            _ = started.notified() => {}
        }
        release.notify_one();

        let mut body = get_chat(&app).await;
        for _ in 0..100 {
            if body["state"] == "idle" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            body = get_chat(&app).await;
        }
        assert_eq!(body["state"], "idle");
        let transcript = body["transcript"].as_array().unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1]["role"], "assistant");
        assert_eq!(transcript[1]["content"], "Hello!");

        let on_disk: Value =
            serde_json::from_str(&fs::read_to_string(history_path(&dir)).unwrap()).unwrap();
        assert_eq!(on_disk, body["transcript"]);

        release.notify_one();
        let (_, body) = post_message(&app, "Again").await;
        let roles: Vec<&str> = body["transcript"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "assistant", "user", "assistant"]);
    }
}
