//! Owner account and session storage

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{datetime_at, datetime_opt_at, format_datetime, uuid_at, OptionalExt};
use crate::error::Result;
use crate::models::{OwnerAccount, Session};

pub struct OwnerStore<'a> {
    conn: &'a Connection,
}

impl<'a> OwnerStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new owner account
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub fn create(&self, account: &OwnerAccount) -> Result<()> {
        self.conn.execute(
            "INSERT INTO owners (id, email, password_hash, created_at, last_login) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                account.id.to_string(),
                account.email,
                account.password_hash,
                format_datetime(&account.created_at),
                account.last_login.as_ref().map(format_datetime),
            ],
        )?;
        Ok(())
    }

    /// Find account by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<OwnerAccount>> {
        self.find_one("WHERE id = ?1", &id.to_string())
    }

    /// Find account by email (case-insensitive)
    #[instrument(skip(self))]
    pub fn find_by_email(&self, email: &str) -> Result<Option<OwnerAccount>> {
        self.find_one("WHERE email = ?1", &email.trim().to_lowercase())
    }

    fn find_one(&self, filter: &str, value: &str) -> Result<Option<OwnerAccount>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, email, password_hash, created_at, last_login FROM owners {}",
            filter
        ))?;

        let account = stmt
            .query_row(params![value], |row| {
                Ok(OwnerAccount {
                    id: uuid_at(row, 0)?,
                    email: row.get(1)?,
                    password_hash: row.get(2)?,
                    created_at: datetime_at(row, 3)?,
                    last_login: datetime_opt_at(row, 4)?,
                })
            })
            .optional()?;

        Ok(account)
    }

    /// Update last login time
    pub fn update_last_login(&self, owner_id: Uuid) -> Result<()> {
        self.conn.execute(
            "UPDATE owners SET last_login = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), owner_id.to_string()],
        )?;
        Ok(())
    }

    /// Create a session
    #[instrument(skip(self, session), fields(owner_id = %session.owner_id))]
    pub fn create_session(&self, session: &Session) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sessions (id, owner_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                session.id.to_string(),
                session.owner_id.to_string(),
                format_datetime(&session.created_at),
                format_datetime(&session.expires_at),
            ],
        )?;
        Ok(())
    }

    /// Find valid session
    #[instrument(skip(self))]
    pub fn find_valid_session(&self, session_id: Uuid) -> Result<Option<Session>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, created_at, expires_at FROM sessions WHERE id = ?1 AND expires_at > ?2",
        )?;

        let now = format_datetime(&Utc::now());
        let session = stmt
            .query_row(params![session_id.to_string(), now], |row| {
                Ok(Session {
                    id: uuid_at(row, 0)?,
                    owner_id: uuid_at(row, 1)?,
                    created_at: datetime_at(row, 2)?,
                    expires_at: datetime_at(row, 3)?,
                })
            })
            .optional()?;

        Ok(session)
    }

    /// Delete session
    pub fn delete_session(&self, session_id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM sessions WHERE id = ?1",
            params![session_id.to_string()],
        )?;
        Ok(())
    }

    /// Clean up expired sessions
    pub fn cleanup_expired_sessions(&self) -> Result<u64> {
        let count = self.conn.execute(
            "DELETE FROM sessions WHERE expires_at < ?1",
            params![format_datetime(&Utc::now())],
        )?;
        Ok(count as u64)
    }
}
