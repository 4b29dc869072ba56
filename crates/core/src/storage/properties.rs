//! Property storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{datetime_at, format_datetime, uuid_at, OptionalExt};
use crate::error::Result;
use crate::models::Property;

pub struct PropertyStore<'a> {
    conn: &'a Connection,
}

impl<'a> PropertyStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a property row
    #[instrument(skip(self, property), fields(property_name = %property.name))]
    pub fn create(&self, property: &Property) -> Result<()> {
        self.conn.execute(
            "INSERT INTO properties (id, owner_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                property.id.to_string(),
                property.owner_id.to_string(),
                property.name,
                format_datetime(&property.created_at),
            ],
        )?;
        Ok(())
    }

    /// Find a property by ID, scoped to its owner
    #[instrument(skip(self))]
    pub fn find_for_owner(&self, owner_id: Uuid, property_id: Uuid) -> Result<Option<Property>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, name, created_at FROM properties
             WHERE id = ?1 AND owner_id = ?2",
        )?;

        let property = stmt
            .query_row(
                params![property_id.to_string(), owner_id.to_string()],
                property_from_row,
            )
            .optional()?;

        Ok(property)
    }

    /// List an owner's properties in creation order
    #[instrument(skip(self))]
    pub fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Property>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, name, created_at FROM properties
             WHERE owner_id = ?1
             ORDER BY created_at, rowid",
        )?;

        let properties = stmt
            .query_map(params![owner_id.to_string()], property_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(properties)
    }

    /// Number of properties an owner has
    pub fn count_for_owner(&self, owner_id: Uuid) -> Result<u64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM properties WHERE owner_id = ?1",
            params![owner_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Change a property's display name
    #[instrument(skip(self))]
    pub fn rename(&self, property_id: Uuid, name: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE properties SET name = ?1 WHERE id = ?2",
            params![name, property_id.to_string()],
        )?;
        Ok(())
    }

    /// Delete the property row only. Settings and guests must be removed first.
    #[instrument(skip(self))]
    pub fn delete(&self, property_id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM properties WHERE id = ?1",
            params![property_id.to_string()],
        )?;
        Ok(())
    }
}

fn property_from_row(row: &Row<'_>) -> rusqlite::Result<Property> {
    Ok(Property {
        id: uuid_at(row, 0)?,
        owner_id: uuid_at(row, 1)?,
        name: row.get(2)?,
        created_at: datetime_at(row, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[test]
    fn test_list_is_creation_ordered_and_scoped() {
        let db = Database::open_in_memory().unwrap();
        let store = db.properties();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let first = Property::new(owner, "Zeta Ln");
        let second = Property::new(owner, "Alpha Ave");
        store.create(&first).unwrap();
        store.create(&second).unwrap();
        store.create(&Property::new(stranger, "Elsewhere")).unwrap();

        let names: Vec<_> = store
            .list_for_owner(owner)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Zeta Ln", "Alpha Ave"]);
        assert_eq!(store.count_for_owner(owner).unwrap(), 2);
    }

    #[test]
    fn test_find_requires_owner() {
        let db = Database::open_in_memory().unwrap();
        let store = db.properties();
        let owner = Uuid::new_v4();

        let property = Property::new(owner, "1 Oak");
        store.create(&property).unwrap();

        assert!(store.find_for_owner(owner, property.id).unwrap().is_some());
        assert!(store
            .find_for_owner(Uuid::new_v4(), property.id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_rename() {
        let db = Database::open_in_memory().unwrap();
        let store = db.properties();
        let owner = Uuid::new_v4();

        let property = Property::new(owner, "1 Oak");
        store.create(&property).unwrap();
        store.rename(property.id, "1 Oak Unit B").unwrap();

        let found = store.find_for_owner(owner, property.id).unwrap().unwrap();
        assert_eq!(found.name, "1 Oak Unit B");
    }
}
