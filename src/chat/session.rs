use serde::Serialize;
use tokio::sync::watch;

use super::models::{Transcript, Turn};
use super::store::{Download, TranscriptStore};
use crate::core::{ChatError, Credential};
use crate::gemini::BoxedGenerate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    AwaitingCredential,
    Generating,
}

/// What happened to a submitted prompt.
#[derive(Debug, PartialEq)]
pub enum TurnOutcome {
    /// Blank input, nothing was recorded.
    Ignored,
    /// No credential yet. The prompt is held until one is supplied.
    CredentialRequired,
    /// The assistant turn that was appended. Failed generations are
    /// still completed turns carrying the error text.
    Completed(Turn),
}

/// Read-only copy of the session that can be observed while a turn
/// is being generated.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub transcript: Vec<Turn>,
    pub state: SessionState,
    pub has_credential: bool,
}

/// A single conversation: the in-memory transcript plus everything
/// needed to extend and persist it.
///
/// The in-memory transcript is authoritative. Store failures are
/// collected as warnings (see `take_warnings`) and never roll back a
/// turn.
pub struct Session {
    store: TranscriptStore,
    generator: BoxedGenerate,
    credential: Option<Credential>,
    transcript: Transcript,
    state: SessionState,
    pending_prompt: Option<String>,
    warnings: Vec<ChatError>,
    snapshot: watch::Sender<SessionSnapshot>,
}

impl Session {
    /// Starts a session from whatever the store holds. An unreadable
    /// transcript file starts an empty conversation with a warning.
    pub fn open(
        store: TranscriptStore,
        generator: BoxedGenerate,
        credential: Option<Credential>,
    ) -> Self {
        let mut warnings = Vec::new();
        let turns = store.load().unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            warnings.push(e);
            Vec::new()
        });
        tracing::info!(
            "Loaded {} turns from {}",
            turns.len(),
            store.path().display()
        );

        let state = if credential.is_some() {
            SessionState::Idle
        } else {
            SessionState::AwaitingCredential
        };

        let (snapshot, _) = watch::channel(SessionSnapshot {
            transcript: turns.clone(),
            state,
            has_credential: credential.is_some(),
        });

        Self {
            store,
            generator,
            credential,
            transcript: Transcript::new_with_turns(turns),
            state,
            pending_prompt: None,
            warnings,
            snapshot,
        }
    }

    /// Follows the transcript and state as they change, including
    /// the user turn recorded while a reply is still being generated.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn turns(&self) -> &[Turn] {
        self.transcript.turns()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn pending_prompt(&self) -> Option<&str> {
        self.pending_prompt.as_deref()
    }

    /// Drains warnings accumulated since the last call.
    pub fn take_warnings(&mut self) -> Vec<ChatError> {
        std::mem::take(&mut self.warnings)
    }

    /// Runs one turn of the conversation for `prompt`.
    pub async fn submit(&mut self, prompt: &str) -> TurnOutcome {
        if prompt.trim().is_empty() {
            return TurnOutcome::Ignored;
        }

        let Some(credential) = self.credential.clone() else {
            tracing::info!("Prompt held until a credential is supplied");
            self.state = SessionState::AwaitingCredential;
            self.pending_prompt = Some(prompt.to_string());
            self.warnings.push(ChatError::CredentialMissing);
            self.publish();
            return TurnOutcome::CredentialRequired;
        };

        self.run_turn(&credential, prompt).await
    }

    /// Caches the credential for the rest of the session and resumes
    /// the prompt that was waiting on it, if there is one.
    pub async fn supply_credential(&mut self, credential: Credential) -> Option<TurnOutcome> {
        self.credential = Some(credential.clone());
        if self.state == SessionState::AwaitingCredential {
            self.state = SessionState::Idle;
        }
        self.publish();

        let prompt = self.pending_prompt.take()?;
        Some(self.run_turn(&credential, &prompt).await)
    }

    async fn run_turn(&mut self, credential: &Credential, prompt: &str) -> TurnOutcome {
        self.close_interrupted_turn();
        self.state = SessionState::Generating;

        // Record the prompt before the remote call so it survives a
        // failure or crash mid-generation
        self.transcript.push(Turn::user(prompt));
        self.persist();
        self.publish();

        let turns = self.transcript.turns();
        let history = &turns[..turns.len() - 1];

        let reply = match self.generator.generate(credential, prompt, history).await {
            Ok(text) => Turn::assistant(&text),
            Err(e) => {
                tracing::warn!("Recording failed generation: {}", e);
                Turn::assistant_error(&e.to_string())
            }
        };

        self.transcript.push(reply.clone());
        self.persist();
        self.state = SessionState::Idle;
        self.publish();

        TurnOutcome::Completed(reply)
    }

    /// A turn whose future was dropped mid-generation leaves a user
    /// turn with no reply. Record that as a failed reply so turns keep
    /// alternating.
    fn close_interrupted_turn(&mut self) {
        if self.state != SessionState::Generating {
            return;
        }
        tracing::warn!("Previous response was interrupted before it completed");
        let err = ChatError::Generation(
            "Response was interrupted before it completed".to_string(),
        );
        self.transcript.push(Turn::assistant_error(&err.to_string()));
        self.persist();
        self.state = SessionState::Idle;
    }

    /// Empties the transcript in memory and on disk.
    pub fn clear(&mut self) {
        if self.state == SessionState::Generating {
            self.state = SessionState::Idle;
        }
        self.transcript.clear();
        self.pending_prompt = None;
        if let Err(e) = self.store.clear() {
            tracing::warn!("{}", e);
            self.warnings.push(e);
        }
        tracing::info!("Cleared chat history");
        self.publish();
    }

    pub fn export(&self) -> Result<Download, ChatError> {
        self.store.download(self.transcript.turns())
    }

    fn publish(&self) {
        self.snapshot.send_replace(SessionSnapshot {
            transcript: self.transcript.turns().to_vec(),
            state: self.state,
            has_credential: self.credential.is_some(),
        });
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(self.transcript.turns()) {
            tracing::warn!("{}", e);
            self.warnings.push(e);
        }
    }
}
