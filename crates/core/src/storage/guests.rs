//! Guest storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{datetime_at, format_datetime, uuid_at, yes_no_at};
use super::scope::DocumentScope;
use crate::error::Result;
use crate::models::Guest;

const GUEST_COLUMNS: &str = "id, first_name, last_name, name, email, phone, do_not_call, \
     has_agency_agreement, broker_name, company_name, notes, timestamp";

pub struct GuestStore<'a> {
    conn: &'a Connection,
}

impl<'a> GuestStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a guest, keeping its id
    #[instrument(skip(self, guest), fields(scope = %scope, guest_id = %guest.id))]
    pub fn create(&self, scope: DocumentScope, guest: &Guest) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                scope.guests_table(),
                scope.key_column(),
                GUEST_COLUMNS
            ),
            params![
                scope.key(),
                guest.id.to_string(),
                guest.first_name,
                guest.last_name,
                guest.name,
                guest.email,
                guest.phone,
                guest.do_not_call.map(|v| v.as_str()),
                guest.has_agency_agreement.map(|v| v.as_str()),
                guest.broker_name,
                guest.company_name,
                guest.notes,
                format_datetime(&guest.timestamp),
            ],
        )?;
        Ok(())
    }

    /// List guests in registration order
    #[instrument(skip(self), fields(scope = %scope))]
    pub fn list(&self, scope: DocumentScope) -> Result<Vec<Guest>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {} WHERE {} = ?1 ORDER BY timestamp, rowid",
            GUEST_COLUMNS,
            scope.guests_table(),
            scope.key_column()
        ))?;

        let guests = stmt
            .query_map(params![scope.key()], guest_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(guests)
    }

    /// Overwrite every editable field of a guest. Returns false if it does not exist.
    #[instrument(skip(self, guest), fields(scope = %scope, guest_id = %guest.id))]
    pub fn update(&self, scope: DocumentScope, guest: &Guest) -> Result<bool> {
        let updated = self.conn.execute(
            &format!(
                "UPDATE {} SET first_name = ?1, last_name = ?2, name = ?3, email = ?4, phone = ?5,
                 do_not_call = ?6, has_agency_agreement = ?7, broker_name = ?8, company_name = ?9,
                 notes = ?10
                 WHERE {} = ?11 AND id = ?12",
                scope.guests_table(),
                scope.key_column()
            ),
            params![
                guest.first_name,
                guest.last_name,
                guest.name,
                guest.email,
                guest.phone,
                guest.do_not_call.map(|v| v.as_str()),
                guest.has_agency_agreement.map(|v| v.as_str()),
                guest.broker_name,
                guest.company_name,
                guest.notes,
                scope.key(),
                guest.id.to_string(),
            ],
        )?;
        Ok(updated > 0)
    }

    /// Delete one guest. Returns false if it did not exist.
    #[instrument(skip(self), fields(scope = %scope))]
    pub fn delete(&self, scope: DocumentScope, guest_id: Uuid) -> Result<bool> {
        let removed = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1 AND id = ?2",
                scope.guests_table(),
                scope.key_column()
            ),
            params![scope.key(), guest_id.to_string()],
        )?;
        Ok(removed > 0)
    }

    /// Delete every guest in the scope, returning how many were removed
    #[instrument(skip(self), fields(scope = %scope))]
    pub fn delete_all(&self, scope: DocumentScope) -> Result<usize> {
        let removed = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1",
                scope.guests_table(),
                scope.key_column()
            ),
            params![scope.key()],
        )?;
        Ok(removed)
    }
}

fn guest_from_row(row: &Row<'_>) -> rusqlite::Result<Guest> {
    Ok(Guest {
        id: uuid_at(row, 0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        name: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        do_not_call: yes_no_at(row, 6)?,
        has_agency_agreement: yes_no_at(row, 7)?,
        broker_name: row.get(8)?,
        company_name: row.get(9)?,
        notes: row.get(10)?,
        timestamp: datetime_at(row, 11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::models::YesNo;
    use crate::storage::Database;

    fn sample_guest(email: &str) -> Guest {
        let mut guest = Guest::new("Jo", "Doe", email, "(555) 123-4567");
        guest.do_not_call = Some(YesNo::No);
        guest.has_agency_agreement = Some(YesNo::Yes);
        guest.broker_name = "Bea Broker".into();
        guest.company_name = "Acme Realty".into();
        guest
    }

    #[test]
    fn test_create_list() {
        let db = Database::open_in_memory().unwrap();
        let store = db.guests();
        let scope = DocumentScope::Legacy(Uuid::new_v4());

        let guest = sample_guest("jo@x.com");
        store.create(scope, &guest).unwrap();

        assert_eq!(store.list(scope).unwrap(), vec![guest]);
        assert!(store
            .list(DocumentScope::Legacy(Uuid::new_v4()))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_timestamp_read_back_exactly() {
        let db = Database::open_in_memory().unwrap();
        let store = db.guests();
        let scope = DocumentScope::Property(Uuid::new_v4());

        let mut guest = sample_guest("jo@x.com");
        guest.timestamp = Utc.with_ymd_and_hms(2026, 10, 18, 8, 5, 45).unwrap()
            + chrono::Duration::nanoseconds(858_499_625);
        store.create(scope, &guest).unwrap();

        let stored = store.list(scope).unwrap();
        assert_eq!(stored[0].timestamp, guest.timestamp);
        assert_eq!(stored, vec![guest]);
    }

    #[test]
    fn test_update_keeps_timestamp() {
        let db = Database::open_in_memory().unwrap();
        let store = db.guests();
        let scope = DocumentScope::Legacy(Uuid::new_v4());

        let guest = sample_guest("jo@x.com");
        store.create(scope, &guest).unwrap();

        let mut edited = guest.clone();
        edited.notes = "Wants a second showing".into();
        edited.timestamp = chrono::Utc::now() + chrono::Duration::days(1);
        assert!(store.update(scope, &edited).unwrap());

        let stored = store.list(scope).unwrap().remove(0);
        assert_eq!(stored.notes, "Wants a second showing");
        assert_eq!(stored.timestamp, guest.timestamp);
    }

    #[test]
    fn test_delete_and_delete_all() {
        let db = Database::open_in_memory().unwrap();
        let store = db.guests();
        let scope = DocumentScope::Legacy(Uuid::new_v4());

        let a = sample_guest("a@x.com");
        let b = sample_guest("b@x.com");
        let c = sample_guest("c@x.com");
        for g in [&a, &b, &c] {
            store.create(scope, g).unwrap();
        }

        assert!(store.delete(scope, a.id).unwrap());
        assert!(!store.delete(scope, a.id).unwrap());
        assert_eq!(store.delete_all(scope).unwrap(), 2);
        assert!(store.list(scope).unwrap().is_empty());
    }
}
