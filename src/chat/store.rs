//! JSON file persistence for the transcript.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Local;

use super::models::Turn;
use crate::core::ChatError;

pub const EXPORT_MIME_TYPE: &str = "application/json";

/// A serialized transcript ready to be handed to the user.
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Reads and writes the whole transcript as a JSON array at a single
/// path. There is exactly one writer, so saves simply replace the
/// file.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    path: PathBuf,
}

impl TranscriptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns an empty list when the file doesn't exist yet.
    pub fn load(&self) -> Result<Vec<Turn>, ChatError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ChatError::store_read(&self.path, e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| ChatError::store_read(&self.path, e))
    }

    /// Writes to a sibling temp file first and renames it over the
    /// target so readers never observe a half-written transcript.
    pub fn save(&self, turns: &[Turn]) -> Result<(), ChatError> {
        let bytes = self.export(turns)?;
        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        fs::write(&tmp_path, &bytes).map_err(|e| ChatError::store_write(&self.path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            ChatError::store_write(&self.path, e)
        })?;

        tracing::debug!("Saved {} turns to {}", turns.len(), self.path.display());
        Ok(())
    }

    /// Deletes the backing file. Missing files are not an error.
    pub fn clear(&self) -> Result<(), ChatError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ChatError::store_write(&self.path, e)),
        }
    }

    /// Same bytes `save` would write.
    pub fn export(&self, turns: &[Turn]) -> Result<Vec<u8>, ChatError> {
        serde_json::to_vec_pretty(turns).map_err(|e| ChatError::store_write(&self.path, e))
    }

    pub fn download(&self, turns: &[Turn]) -> Result<Download, ChatError> {
        Ok(Download {
            filename: export_filename(),
            mime_type: EXPORT_MIME_TYPE,
            bytes: self.export(turns)?,
        })
    }
}

/// `chat_history_<YYYYMMDD_HHMMSS>.json` using local time.
pub fn export_filename() -> String {
    format!("chat_history_{}.json", Local::now().format("%Y%m%d_%H%M%S"))
}
