//! Settings document storage
//!
//! Each scope holds at most one settings document, stored as JSON.

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::instrument;

use super::parse::{format_datetime, OptionalExt};
use super::scope::DocumentScope;
use crate::error::Result;
use crate::models::Settings;

pub struct SettingsStore<'a> {
    conn: &'a Connection,
}

impl<'a> SettingsStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Load the settings document, if one was ever written
    #[instrument(skip(self), fields(scope = %scope))]
    pub fn load(&self, scope: DocumentScope) -> Result<Option<Settings>> {
        let document: Option<String> = self
            .conn
            .query_row(
                &format!(
                    "SELECT document FROM {} WHERE {} = ?1",
                    scope.settings_table(),
                    scope.key_column()
                ),
                params![scope.key()],
                |row| row.get(0),
            )
            .optional()?;

        match document {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Write an already-serialized document in a single statement
    #[instrument(skip(self, document), fields(scope = %scope, bytes = document.len()))]
    pub fn put_serialized(&self, scope: DocumentScope, document: &str) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} ({}, document, updated_at) VALUES (?1, ?2, ?3)",
                scope.settings_table(),
                scope.key_column()
            ),
            params![scope.key(), document, format_datetime(&Utc::now())],
        )?;
        Ok(())
    }

    /// Serialize and write a settings document
    pub fn put(&self, scope: DocumentScope, settings: &Settings) -> Result<()> {
        let document = serde_json::to_string(settings)?;
        self.put_serialized(scope, &document)
    }

    /// Remove the settings document
    #[instrument(skip(self), fields(scope = %scope))]
    pub fn delete(&self, scope: DocumentScope) -> Result<bool> {
        let removed = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1",
                scope.settings_table(),
                scope.key_column()
            ),
            params![scope.key()],
        )?;
        Ok(removed > 0)
    }
}
