//! Router for the chat API

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use super::public::{ChatRequest, ChatStateResponse};
use crate::api::public::ApiError;
use crate::api::state::AppState;

type SharedState = Arc<AppState>;

/// Get the current transcript. While a reply is being generated this
/// returns the latest snapshot instead of waiting for the turn.
async fn chat_get(State(state): State<SharedState>) -> Json<ChatStateResponse> {
    match state.session.try_lock() {
        Ok(mut session) => Json(ChatStateResponse::from_session(&mut session, None)),
        Err(_) => Json(ChatStateResponse::from_snapshot(
            state.snapshot.borrow().clone(),
        )),
    }
}

/// Submit a prompt and wait for the assistant's reply
async fn chat_post(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Response {
    // One action at a time. A second prompt while one is generating
    // is rejected rather than queued.
    let Ok(mut session) = Arc::clone(&state.session).try_lock_owned() else {
        return (
            StatusCode::CONFLICT,
            "A response is still being generated",
        )
            .into_response();
    };

    // The turn runs in its own task so it finishes even if the client
    // disconnects and this handler is dropped
    let turn = tokio::spawn(async move {
        let outcome = session.submit(&payload.message).await;
        ChatStateResponse::from_session(&mut session, Some(&outcome))
    });

    match turn.await {
        Ok(resp) => Json(resp).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Clear the transcript in memory and on disk
async fn chat_delete(State(state): State<SharedState>) -> Json<ChatStateResponse> {
    let mut session = state.session.lock().await;
    session.clear();
    Json(ChatStateResponse::from_session(&mut session, None))
}

/// Download the transcript as a JSON attachment
async fn chat_download(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let download = state.session.lock().await.export()?;

    Ok((
        [
            (header::CONTENT_TYPE, download.mime_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download.filename),
            ),
        ],
        download.bytes,
    )
        .into_response())
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(chat_get).post(chat_post).delete(chat_delete))
        .route("/download", get(chat_download))
}
