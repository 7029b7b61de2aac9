//! Router for supplying the API key from the page

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;

use crate::api::public::ApiError;
use crate::api::routes::chat::public::ChatStateResponse;
use crate::api::state::AppState;
use crate::core::Credential;

type SharedState = Arc<AppState>;

#[derive(Deserialize)]
pub struct CredentialRequest {
    pub api_key: String,
}

/// Cache the key for this process and resume any held prompt
async fn credential_post(
    State(state): State<SharedState>,
    Json(payload): Json<CredentialRequest>,
) -> Response {
    let Some(credential) = Credential::new(&payload.api_key) else {
        return (StatusCode::BAD_REQUEST, "API key must not be empty").into_response();
    };

    let mut session = Arc::clone(&state.session).lock_owned().await;

    // A held prompt resumes here, so it gets the same detached task as
    // a chat submit
    let turn = tokio::spawn(async move {
        let outcome = session.supply_credential(credential).await;
        ChatStateResponse::from_session(&mut session, outcome.as_ref())
    });

    match turn.await {
        Ok(resp) => Json(resp).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub fn router() -> Router<SharedState> {
    Router::new().route("/", post(credential_post))
}
