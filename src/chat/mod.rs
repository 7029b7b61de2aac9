mod models;
mod session;
mod store;

pub use models::{Role, TIMESTAMP_FORMAT, Transcript, Turn};
pub use session::{Session, SessionSnapshot, SessionState, TurnOutcome};
pub use store::{Download, EXPORT_MIME_TYPE, TranscriptStore, export_filename};
