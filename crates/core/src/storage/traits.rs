//! Storage repository traits
//!
//! These traits define the storage interface, allowing for different
//! implementations (SQLite, mock, hosted document store).

use uuid::Uuid;

use super::portfolio::DedupReport;
use crate::error::Result;
use crate::models::{Guest, OwnerAccount, Property, Session, Settings};
use crate::steps::StepReport;

/// Owner account and session operations
pub trait OwnerRepository {
    /// Create a new owner account
    fn create_owner(&self, account: &OwnerAccount) -> Result<()>;

    /// Find owner by ID
    fn find_owner_by_id(&self, id: Uuid) -> Result<Option<OwnerAccount>>;

    /// Find owner by email, case-insensitively
    fn find_owner_by_email(&self, email: &str) -> Result<Option<OwnerAccount>>;

    /// Update owner's last login time
    fn update_last_login(&self, owner_id: Uuid) -> Result<()>;

    /// Create a session
    fn create_session(&self, session: &Session) -> Result<()>;

    /// Find a valid (non-expired) session
    fn find_valid_session(&self, session_id: Uuid) -> Result<Option<Session>>;

    /// Delete a session
    fn delete_session(&self, session_id: Uuid) -> Result<()>;

    /// Clean up expired sessions
    fn cleanup_expired_sessions(&self) -> Result<u64>;
}

/// Property operations, always scoped to one owner
pub trait PropertyRepository {
    /// Properties in creation order
    fn list_properties(&self, owner_id: Uuid) -> Result<Vec<Property>>;

    fn find_property(&self, owner_id: Uuid, property_id: Uuid) -> Result<Option<Property>>;

    /// Create a property with default settings and no guests
    fn create_property(&self, owner_id: Uuid, name: &str) -> Result<Property>;

    fn get_settings(&self, owner_id: Uuid, property_id: Uuid) -> Result<Settings>;

    /// Save settings; the returned property reflects any name sync
    fn save_settings(
        &self,
        owner_id: Uuid,
        property_id: Uuid,
        settings: &Settings,
    ) -> Result<Property>;

    /// Delete a property with its settings and guests
    fn delete_property(&self, owner_id: Uuid, property_id: Uuid) -> Result<StepReport>;

    /// Remove properties sharing a normalized name, keeping the earliest
    fn delete_duplicate_properties(&self, owner_id: Uuid) -> Result<DedupReport>;

    /// Remembered active property
    fn active_property(&self, owner_id: Uuid) -> Result<Option<Uuid>>;

    fn set_active_property(&self, owner_id: Uuid, property_id: Uuid) -> Result<()>;
}

/// Guest operations for one property
pub trait GuestRepository {
    /// Guests in registration order
    fn get_guests(&self, owner_id: Uuid, property_id: Uuid) -> Result<Vec<Guest>>;

    fn add_guest(&self, owner_id: Uuid, property_id: Uuid, guest: &Guest) -> Result<()>;

    fn update_guest(&self, owner_id: Uuid, property_id: Uuid, guest: &Guest) -> Result<()>;

    fn delete_guest(&self, owner_id: Uuid, property_id: Uuid, guest_id: Uuid) -> Result<()>;
}

/// Single-property layout used before multi-property support
pub trait LegacyRepository {
    fn load_legacy_settings(&self, owner_id: Uuid) -> Result<Option<Settings>>;

    fn save_legacy_settings(&self, owner_id: Uuid, settings: &Settings) -> Result<()>;

    fn list_legacy_guests(&self, owner_id: Uuid) -> Result<Vec<Guest>>;

    fn add_legacy_guest(&self, owner_id: Uuid, guest: &Guest) -> Result<()>;

    /// Copy a settings document into a property as-is
    fn import_settings(&self, owner_id: Uuid, property_id: Uuid, settings: &Settings)
        -> Result<()>;
}

/// Combined storage interface
///
/// Provides access to all repository operations.
/// Implementations may be backed by SQLite, mocks, or a remote store.
pub trait Storage: OwnerRepository + PropertyRepository + GuestRepository + LegacyRepository {}

// Blanket implementation: any type implementing all traits implements Storage
impl<T> Storage for T where
    T: OwnerRepository + PropertyRepository + GuestRepository + LegacyRepository
{
}
