//! Public types for the chat API
use serde::{Deserialize, Serialize};

use crate::chat::{Session, SessionSnapshot, SessionState, Turn, TurnOutcome};

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Ignored,
    CredentialRequired,
    Completed,
}

impl From<&TurnOutcome> for TurnStatus {
    fn from(outcome: &TurnOutcome) -> Self {
        match outcome {
            TurnOutcome::Ignored => TurnStatus::Ignored,
            TurnOutcome::CredentialRequired => TurnStatus::CredentialRequired,
            TurnOutcome::Completed(_) => TurnStatus::Completed,
        }
    }
}

/// Everything the page needs to redraw itself after any action.
#[derive(Serialize)]
pub struct ChatStateResponse {
    pub transcript: Vec<Turn>,
    pub state: SessionState,
    pub has_credential: bool,
    // Store problems since the last response
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TurnStatus>,
}

impl ChatStateResponse {
    pub fn from_session(session: &mut Session, outcome: Option<&TurnOutcome>) -> Self {
        Self {
            transcript: session.turns().to_vec(),
            state: session.state(),
            has_credential: session.has_credential(),
            warnings: session
                .take_warnings()
                .iter()
                .map(ToString::to_string)
                .collect(),
            outcome: outcome.map(TurnStatus::from),
        }
    }

    /// Built from the published snapshot when the session is busy.
    /// Warnings stay queued for the next locked response.
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            transcript: snapshot.transcript,
            state: snapshot.state,
            has_credential: snapshot.has_credential,
            warnings: Vec::new(),
            outcome: None,
        }
    }
}
