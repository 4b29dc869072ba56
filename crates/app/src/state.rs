//! Application state management

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use openhouse_core::{Database, Error, LogMailQueue, MailQueue};
use uuid::Uuid;

use crate::config::{Config, MailDelivery};
use crate::error::Result;
use crate::mail_spool::SpoolMailQueue;

/// Main application state
pub struct AppState {
    pub config: Config,
    pub db: Arc<Mutex<Database>>,
    /// Holds the id of the signed-in session between invocations
    session_path: PathBuf,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        let session_path = session_path_for(&config.database_path);

        Ok(Self {
            config,
            db: Arc::new(Mutex::new(db)),
            session_path,
        })
    }

    pub fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| Error::BackendUnavailable("database lock poisoned".into()).into())
    }

    /// Outbound queue for thank-you emails, as configured
    pub fn mail_queue(&self) -> Box<dyn MailQueue> {
        match self.config.mail_delivery {
            MailDelivery::Spool => Box::new(SpoolMailQueue::new(&self.config.mail_spool_dir)),
            MailDelivery::Log => Box::new(LogMailQueue),
        }
    }

    /// Stored session id, if one was saved and is readable
    pub fn load_session(&self) -> Option<Uuid> {
        let content = std::fs::read_to_string(&self.session_path).ok()?;
        Uuid::parse_str(content.trim()).ok()
    }

    pub fn save_session(&self, session_id: Uuid) -> Result<()> {
        std::fs::write(&self.session_path, session_id.to_string())?;
        Ok(())
    }

    pub fn clear_session(&self) -> Result<()> {
        match std::fs::remove_file(&self.session_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn session_path_for(database_path: &Path) -> PathBuf {
    database_path.with_file_name("session")
}

#[cfg(test)]
pub(crate) fn test_state(dir: &Path) -> AppState {
    AppState::new(Config::defaults(dir)).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        assert_eq!(state.load_session(), None);

        let id = Uuid::new_v4();
        state.save_session(id).unwrap();
        assert_eq!(state.load_session(), Some(id));

        state.clear_session().unwrap();
        assert_eq!(state.load_session(), None);
        // clearing twice is fine
        state.clear_session().unwrap();
    }

    #[test]
    fn test_garbage_session_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        std::fs::write(dir.path().join("session"), "not a uuid").unwrap();
        assert_eq!(state.load_session(), None);
    }
}
