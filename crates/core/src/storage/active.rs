//! Which property the dashboard last showed, per owner

use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse::{format_datetime, OptionalExt};
use crate::error::Result;

pub struct ActivePropertyStore<'a> {
    conn: &'a Connection,
}

impl<'a> ActivePropertyStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, owner_id: Uuid) -> Result<Option<Uuid>> {
        let stored: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT last_property_id FROM owner_preferences WHERE owner_id = ?1",
                params![owner_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(stored.flatten().and_then(|s| Uuid::parse_str(&s).ok()))
    }

    pub fn set(&self, owner_id: Uuid, property_id: Uuid) -> Result<()> {
        self.conn.execute(
            "INSERT INTO owner_preferences (owner_id, last_property_id, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(owner_id) DO UPDATE SET
                last_property_id = excluded.last_property_id,
                updated_at = excluded.updated_at",
            params![
                owner_id.to_string(),
                property_id.to_string(),
                format_datetime(&Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// Drop the selection if it points at `property_id`. Returns whether it did.
    pub fn forget(&self, owner_id: Uuid, property_id: Uuid) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE owner_preferences SET last_property_id = NULL, updated_at = ?1
             WHERE owner_id = ?2 AND last_property_id = ?3",
            params![
                format_datetime(&Utc::now()),
                owner_id.to_string(),
                property_id.to_string(),
            ],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Database;
    use uuid::Uuid;

    #[test]
    fn test_set_replaces_selection() {
        let db = Database::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(db.active().get(owner).unwrap(), None);
        db.active().set(owner, first).unwrap();
        db.active().set(owner, second).unwrap();
        assert_eq!(db.active().get(owner).unwrap(), Some(second));
    }

    #[test]
    fn test_forget_only_matching() {
        let db = Database::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        let selected = Uuid::new_v4();
        db.active().set(owner, selected).unwrap();

        assert!(!db.active().forget(owner, Uuid::new_v4()).unwrap());
        assert_eq!(db.active().get(owner).unwrap(), Some(selected));

        assert!(db.active().forget(owner, selected).unwrap());
        assert_eq!(db.active().get(owner).unwrap(), None);
    }
}
