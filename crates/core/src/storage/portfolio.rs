//! Owner-scoped property operations
//!
//! Composes the row-level stores into the owner → property → settings/guests
//! layout: scope checks, defaults on creation, the settings payload ceiling,
//! name sync, and ordered cascades.

use std::collections::HashSet;

use rusqlite::Connection;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::guests::GuestStore;
use super::active::ActivePropertyStore;
use super::properties::PropertyStore;
use super::scope::DocumentScope;
use super::settings::SettingsStore;
use crate::error::{Error, Field, Result, ValidationErrors};
use crate::invariants::assert_property_invariants;
use crate::models::{Guest, Property, Settings, SETTINGS_PAYLOAD_LIMIT};
use crate::steps::{Step, StepReport};

/// Result of a duplicate-property cleanup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupReport {
    pub removed: usize,
    pub removed_ids: Vec<Uuid>,
    pub steps: StepReport,
}

pub struct Portfolio<'a> {
    conn: &'a Connection,
}

impl<'a> Portfolio<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn properties(&self) -> PropertyStore<'a> {
        PropertyStore::new(self.conn)
    }

    fn settings(&self) -> SettingsStore<'a> {
        SettingsStore::new(self.conn)
    }

    fn guests(&self) -> GuestStore<'a> {
        GuestStore::new(self.conn)
    }

    fn active(&self) -> ActivePropertyStore<'a> {
        ActivePropertyStore::new(self.conn)
    }

    pub fn list_properties(&self, owner_id: Uuid) -> Result<Vec<Property>> {
        self.properties().list_for_owner(owner_id)
    }

    pub fn find_property(&self, owner_id: Uuid, property_id: Uuid) -> Result<Option<Property>> {
        self.properties().find_for_owner(owner_id, property_id)
    }

    /// Fetch a property, failing with `NotFound` outside the owner's scope
    pub fn require_property(&self, owner_id: Uuid, property_id: Uuid) -> Result<Property> {
        self.find_property(owner_id, property_id)?
            .ok_or_else(|| Error::NotFound(format!("property {}", property_id)))
    }

    /// Create a property with default settings and an empty guest list
    #[instrument(skip(self))]
    pub fn create_property(&self, owner_id: Uuid, name: &str) -> Result<Property> {
        if name.trim().is_empty() {
            return Err(Error::Validation(ValidationErrors::single(
                Field::PropertyName,
                "Property name is required",
            )));
        }

        let inherited = match self.branding_source(owner_id)? {
            Some(source) => self.settings().load(DocumentScope::Property(source))?,
            None => None,
        };

        let property = Property::new(owner_id, name);
        assert_property_invariants(&property);
        self.properties().create(&property)?;
        self.settings().put(
            DocumentScope::Property(property.id),
            &Settings::for_new_property(&property.name, inherited.as_ref()),
        )?;

        info!(
            property_id = %property.id,
            inherited = inherited.is_some(),
            "Property created"
        );
        Ok(property)
    }

    /// Most recently active property, else the newest one
    fn branding_source(&self, owner_id: Uuid) -> Result<Option<Uuid>> {
        if let Some(active) = self.active_property(owner_id)? {
            return Ok(Some(active));
        }
        Ok(self.list_properties(owner_id)?.last().map(|p| p.id))
    }

    /// Current settings; a property that never saved any gets defaults
    pub fn get_settings(&self, owner_id: Uuid, property_id: Uuid) -> Result<Settings> {
        self.require_property(owner_id, property_id)?;
        Ok(self
            .settings()
            .load(DocumentScope::Property(property_id))?
            .unwrap_or_default())
    }

    /// Persist settings under the payload ceiling and sync the property name.
    ///
    /// Returns the property as it stands after the save.
    #[instrument(skip(self, settings))]
    pub fn save_settings(
        &self,
        owner_id: Uuid,
        property_id: Uuid,
        settings: &Settings,
    ) -> Result<Property> {
        let mut property = self.require_property(owner_id, property_id)?;

        let document = serde_json::to_string(settings)?;
        if document.len() >= SETTINGS_PAYLOAD_LIMIT {
            warn!(
                size = document.len(),
                limit = SETTINGS_PAYLOAD_LIMIT,
                "Settings save blocked: payload too large"
            );
            return Err(Error::PayloadTooLarge {
                size: document.len(),
                limit: SETTINGS_PAYLOAD_LIMIT,
            });
        }

        self.settings()
            .put_serialized(DocumentScope::Property(property_id), &document)?;

        let address = settings.property_address.trim();
        if !address.is_empty() && address != property.name {
            self.properties().rename(property_id, address)?;
            info!(from = %property.name, to = %address, "Property renamed to match address");
            property.name = address.to_string();
        }

        Ok(property)
    }

    /// Delete a property with its guests and settings.
    ///
    /// The owner's last property cannot be deleted.
    #[instrument(skip(self))]
    pub fn delete_property(&self, owner_id: Uuid, property_id: Uuid) -> Result<StepReport> {
        self.require_property(owner_id, property_id)?;

        if self.properties().count_for_owner(owner_id)? <= 1 {
            return Err(Error::InvariantViolation(
                "You must keep at least one property. Create another property before deleting this one."
                    .to_string(),
            ));
        }

        let report = self.cascade_delete(property_id)?;
        self.forget_if_active(owner_id, property_id)?;
        Ok(report)
    }

    /// Remove properties whose trimmed, case-folded names repeat.
    ///
    /// The earliest-created property of each group survives.
    #[instrument(skip(self))]
    pub fn delete_duplicate_properties(&self, owner_id: Uuid) -> Result<DedupReport> {
        let mut seen = HashSet::new();
        let mut report = DedupReport::default();

        for property in self.list_properties(owner_id)? {
            if seen.insert(property.dedup_key()) {
                continue;
            }

            let steps = self.cascade_delete(property.id)?;
            self.forget_if_active(owner_id, property.id)?;
            report.steps.append(steps);
            report.removed_ids.push(property.id);
            report.removed += 1;
        }

        info!(removed = report.removed, "Duplicate property cleanup finished");
        Ok(report)
    }

    /// Guests, then settings, then the property row
    fn cascade_delete(&self, property_id: Uuid) -> Result<StepReport> {
        let scope = DocumentScope::Property(property_id);
        let mut report = StepReport::new();

        let result = report
            .run(Step::DeleteGuests { property_id }, || {
                self.guests().delete_all(scope)
            })
            .and_then(|_| {
                report.run(Step::DeleteSettings { property_id }, || {
                    self.settings().delete(scope).map(usize::from)
                })
            })
            .and_then(|_| {
                report.run(Step::DeleteProperty { property_id }, || {
                    self.properties().delete(property_id).map(|_| 1)
                })
            });

        match result {
            Ok(_) => {
                info!(%property_id, steps = report.completed(), "Property deleted");
                Ok(report)
            }
            Err(e) => {
                error!(
                    %property_id,
                    completed = report.completed(),
                    report = ?report,
                    "Property delete stopped part-way; manual cleanup may be needed"
                );
                let step = report
                    .failed_step()
                    .map(|r| r.step.to_string())
                    .unwrap_or_default();
                Err(Error::BackendUnavailable(format!("{} failed: {}", step, e)))
            }
        }
    }

    fn forget_if_active(&self, owner_id: Uuid, property_id: Uuid) -> Result<()> {
        self.active().forget(owner_id, property_id)?;
        Ok(())
    }

    /// The remembered active property, if it still exists
    pub fn active_property(&self, owner_id: Uuid) -> Result<Option<Uuid>> {
        match self.active().get(owner_id)? {
            Some(id) if self.find_property(owner_id, id)?.is_some() => Ok(Some(id)),
            _ => Ok(None),
        }
    }

    pub fn set_active_property(&self, owner_id: Uuid, property_id: Uuid) -> Result<()> {
        self.require_property(owner_id, property_id)?;
        self.active().set(owner_id, property_id)
    }

    pub fn get_guests(&self, owner_id: Uuid, property_id: Uuid) -> Result<Vec<Guest>> {
        self.require_property(owner_id, property_id)?;
        self.guests().list(DocumentScope::Property(property_id))
    }

    pub fn add_guest(&self, owner_id: Uuid, property_id: Uuid, guest: &Guest) -> Result<()> {
        self.require_property(owner_id, property_id)?;
        self.guests()
            .create(DocumentScope::Property(property_id), guest)
    }

    pub fn update_guest(&self, owner_id: Uuid, property_id: Uuid, guest: &Guest) -> Result<()> {
        self.require_property(owner_id, property_id)?;
        if self
            .guests()
            .update(DocumentScope::Property(property_id), guest)?
        {
            Ok(())
        } else {
            Err(Error::NotFound(format!("guest {}", guest.id)))
        }
    }

    pub fn delete_guest(&self, owner_id: Uuid, property_id: Uuid, guest_id: Uuid) -> Result<()> {
        self.require_property(owner_id, property_id)?;
        if self
            .guests()
            .delete(DocumentScope::Property(property_id), guest_id)?
        {
            Ok(())
        } else {
            Err(Error::NotFound(format!("guest {}", guest_id)))
        }
    }

    pub fn load_legacy_settings(&self, owner_id: Uuid) -> Result<Option<Settings>> {
        self.settings().load(DocumentScope::Legacy(owner_id))
    }

    pub fn save_legacy_settings(&self, owner_id: Uuid, settings: &Settings) -> Result<()> {
        self.settings().put(DocumentScope::Legacy(owner_id), settings)
    }

    pub fn list_legacy_guests(&self, owner_id: Uuid) -> Result<Vec<Guest>> {
        self.guests().list(DocumentScope::Legacy(owner_id))
    }

    pub fn add_legacy_guest(&self, owner_id: Uuid, guest: &Guest) -> Result<()> {
        self.guests().create(DocumentScope::Legacy(owner_id), guest)
    }

    /// Write a settings document verbatim, skipping the ceiling and name sync
    pub fn import_settings(
        &self,
        owner_id: Uuid,
        property_id: Uuid,
        settings: &Settings,
    ) -> Result<()> {
        self.require_property(owner_id, property_id)?;
        self.settings()
            .put(DocumentScope::Property(property_id), settings)
    }
}
