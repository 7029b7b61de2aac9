use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use crate::chat::{Session, SessionSnapshot};
use crate::core::AppConfig;

pub struct AppState {
    // Held for the whole turn so only one action mutates the
    // transcript at a time
    pub session: Arc<Mutex<Session>>,
    // Readable while the session lock is held by a generating turn
    pub snapshot: watch::Receiver<SessionSnapshot>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(session: Session, config: AppConfig) -> Self {
        let snapshot = session.subscribe();
        Self {
            session: Arc::new(Mutex::new(session)),
            snapshot,
            config,
        }
    }
}
