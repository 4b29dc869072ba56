//! SQLite storage layer for openhouse

mod active;
mod guests;
mod migrations;
mod owners;
mod parse;
mod portfolio;
mod properties;
mod scope;
mod settings;
mod traits;

use uuid::Uuid;

use crate::error::Result;
use crate::models::{Guest, OwnerAccount, Property, Session, Settings};
use crate::steps::StepReport;
use rusqlite::Connection;
use std::path::Path;
use tracing::instrument;

pub use active::ActivePropertyStore;
pub use guests::GuestStore;
pub use owners::OwnerStore;
pub use portfolio::{DedupReport, Portfolio};
pub use properties::PropertyStore;
pub use scope::DocumentScope;
pub use settings::SettingsStore;
pub use traits::{
    GuestRepository, LegacyRepository, OwnerRepository, PropertyRepository, Storage,
};

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    pub fn schema_version(&self) -> Result<u32> {
        migrations::current_version(&self.conn)
    }

    pub fn owners(&self) -> OwnerStore<'_> {
        OwnerStore::new(&self.conn)
    }

    pub fn properties(&self) -> PropertyStore<'_> {
        PropertyStore::new(&self.conn)
    }

    /// Settings documents, property or legacy scoped
    pub fn settings(&self) -> SettingsStore<'_> {
        SettingsStore::new(&self.conn)
    }

    pub fn guests(&self) -> GuestStore<'_> {
        GuestStore::new(&self.conn)
    }

    pub fn active(&self) -> ActivePropertyStore<'_> {
        ActivePropertyStore::new(&self.conn)
    }

    /// Owner-scoped property operations
    pub fn portfolio(&self) -> Portfolio<'_> {
        Portfolio::new(&self.conn)
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

// Implement repository traits for Database
// This enables using Database through the trait interface

impl OwnerRepository for Database {
    fn create_owner(&self, account: &OwnerAccount) -> Result<()> {
        self.owners().create(account)
    }

    fn find_owner_by_id(&self, id: Uuid) -> Result<Option<OwnerAccount>> {
        self.owners().find_by_id(id)
    }

    fn find_owner_by_email(&self, email: &str) -> Result<Option<OwnerAccount>> {
        self.owners().find_by_email(email)
    }

    fn update_last_login(&self, owner_id: Uuid) -> Result<()> {
        self.owners().update_last_login(owner_id)
    }

    fn create_session(&self, session: &Session) -> Result<()> {
        self.owners().create_session(session)
    }

    fn find_valid_session(&self, session_id: Uuid) -> Result<Option<Session>> {
        self.owners().find_valid_session(session_id)
    }

    fn delete_session(&self, session_id: Uuid) -> Result<()> {
        self.owners().delete_session(session_id)
    }

    fn cleanup_expired_sessions(&self) -> Result<u64> {
        self.owners().cleanup_expired_sessions()
    }
}

impl PropertyRepository for Database {
    fn list_properties(&self, owner_id: Uuid) -> Result<Vec<Property>> {
        self.portfolio().list_properties(owner_id)
    }

    fn find_property(&self, owner_id: Uuid, property_id: Uuid) -> Result<Option<Property>> {
        self.portfolio().find_property(owner_id, property_id)
    }

    fn create_property(&self, owner_id: Uuid, name: &str) -> Result<Property> {
        self.portfolio().create_property(owner_id, name)
    }

    fn get_settings(&self, owner_id: Uuid, property_id: Uuid) -> Result<Settings> {
        self.portfolio().get_settings(owner_id, property_id)
    }

    fn save_settings(
        &self,
        owner_id: Uuid,
        property_id: Uuid,
        settings: &Settings,
    ) -> Result<Property> {
        self.portfolio()
            .save_settings(owner_id, property_id, settings)
    }

    fn delete_property(&self, owner_id: Uuid, property_id: Uuid) -> Result<StepReport> {
        self.portfolio().delete_property(owner_id, property_id)
    }

    fn delete_duplicate_properties(&self, owner_id: Uuid) -> Result<DedupReport> {
        self.portfolio().delete_duplicate_properties(owner_id)
    }

    fn active_property(&self, owner_id: Uuid) -> Result<Option<Uuid>> {
        self.portfolio().active_property(owner_id)
    }

    fn set_active_property(&self, owner_id: Uuid, property_id: Uuid) -> Result<()> {
        self.portfolio().set_active_property(owner_id, property_id)
    }
}

impl GuestRepository for Database {
    fn get_guests(&self, owner_id: Uuid, property_id: Uuid) -> Result<Vec<Guest>> {
        self.portfolio().get_guests(owner_id, property_id)
    }

    fn add_guest(&self, owner_id: Uuid, property_id: Uuid, guest: &Guest) -> Result<()> {
        self.portfolio().add_guest(owner_id, property_id, guest)
    }

    fn update_guest(&self, owner_id: Uuid, property_id: Uuid, guest: &Guest) -> Result<()> {
        self.portfolio().update_guest(owner_id, property_id, guest)
    }

    fn delete_guest(&self, owner_id: Uuid, property_id: Uuid, guest_id: Uuid) -> Result<()> {
        self.portfolio()
            .delete_guest(owner_id, property_id, guest_id)
    }
}

impl LegacyRepository for Database {
    fn load_legacy_settings(&self, owner_id: Uuid) -> Result<Option<Settings>> {
        self.portfolio().load_legacy_settings(owner_id)
    }

    fn save_legacy_settings(&self, owner_id: Uuid, settings: &Settings) -> Result<()> {
        self.portfolio().save_legacy_settings(owner_id, settings)
    }

    fn list_legacy_guests(&self, owner_id: Uuid) -> Result<Vec<Guest>> {
        self.portfolio().list_legacy_guests(owner_id)
    }

    fn add_legacy_guest(&self, owner_id: Uuid, guest: &Guest) -> Result<()> {
        self.portfolio().add_legacy_guest(owner_id, guest)
    }

    fn import_settings(
        &self,
        owner_id: Uuid,
        property_id: Uuid,
        settings: &Settings,
    ) -> Result<()> {
        self.portfolio()
            .import_settings(owner_id, property_id, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_storage<S: Storage>(_: &S) {}

    #[test]
    fn test_database_is_storage() {
        let db = Database::open_in_memory().unwrap();
        assert_storage(&db);
        assert_eq!(db.schema_version().unwrap(), 4);
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openhouse.db");

        let owner = Uuid::new_v4();
        {
            let db = Database::open(&path).unwrap();
            db.create_property(owner, "7 Persist Way").unwrap();
        }

        let db = Database::open(&path).unwrap();
        let names: Vec<_> = db
            .list_properties(owner)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["7 Persist Way"]);
    }
}
