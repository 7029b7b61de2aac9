use std::path::PathBuf;

/// Failures the chat session can recover from. None of these end the
/// session; each one is reported to whoever is driving it.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Error loading chat history from {path}: {reason}")]
    StoreRead { path: PathBuf, reason: String },

    #[error("Error saving chat history to {path}: {reason}")]
    StoreWrite { path: PathBuf, reason: String },

    #[error("Please enter your Gemini API key to start chatting")]
    CredentialMissing,

    #[error("{0}")]
    Generation(String),
}

impl ChatError {
    pub fn store_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::StoreRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn store_write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::StoreWrite {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
