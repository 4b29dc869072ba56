//! Outbound mail spool
//!
//! Each queued message becomes one JSON file in the spool directory. An
//! external mailer picks the files up and deletes them once sent.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use openhouse_core::{MailEntry, MailQueue};
use tracing::debug;
use uuid::Uuid;

pub struct SpoolMailQueue {
    dir: PathBuf,
}

impl SpoolMailQueue {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl MailQueue for SpoolMailQueue {
    async fn enqueue(&self, entry: &MailEntry) -> openhouse_core::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let name = format!(
            "{}-{}.json",
            Utc::now().format("%Y%m%dT%H%M%S%3f"),
            Uuid::new_v4()
        );
        let path = self.dir.join(name);
        tokio::fs::write(&path, serde_json::to_vec_pretty(entry)?).await?;

        debug!(path = %path.display(), "Mail entry spooled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openhouse_core::MailMessage;

    #[tokio::test]
    async fn test_entries_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let queue = SpoolMailQueue::new(dir.path().join("mail"));
        let entry = MailEntry {
            to: vec!["jo@x.com".into()],
            reply_to: "pat@realty.com".into(),
            message: MailMessage {
                subject: "Thank you for visiting 1 A St".into(),
                text: "Hi".into(),
                html: "Hi".into(),
            },
        };

        queue.enqueue(&entry).await.unwrap();
        queue.enqueue(&entry).await.unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path().join("mail"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files.len(), 2);

        let stored: MailEntry =
            serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
        assert_eq!(stored, entry);
    }
}
