//! One-time conversion of the single-property layout
//!
//! Owners who registered guests before multi-property support have their
//! settings and guests stored directly under the owner. The first dashboard
//! load with zero properties turns that data into a property.

use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Property, DEFAULT_PROPERTY_NAME};
use crate::steps::{Step, StepReport};
use crate::storage::Storage;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOutcome {
    pub properties: Vec<Property>,
    pub active_property_id: Option<Uuid>,
    /// True when this call converted legacy data
    pub migrated: bool,
    pub report: StepReport,
}

pub struct MigrationResolver<'a, S: Storage + ?Sized> {
    store: &'a S,
}

impl<'a, S: Storage + ?Sized> MigrationResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// List the owner's properties, migrating legacy data first if there are none
    #[instrument(skip(self))]
    pub fn resolve(&self, owner_id: Uuid) -> Result<ResolveOutcome> {
        let properties = self.store.list_properties(owner_id)?;
        if !properties.is_empty() {
            let active_property_id = self
                .store
                .active_property(owner_id)?
                .or_else(|| properties.first().map(|p| p.id));
            return Ok(ResolveOutcome {
                properties,
                active_property_id,
                ..ResolveOutcome::default()
            });
        }

        let Some(legacy) = self.store.load_legacy_settings(owner_id)? else {
            info!("No properties and no legacy data");
            return Ok(ResolveOutcome::default());
        };

        let name = match legacy.property_address.trim() {
            "" => DEFAULT_PROPERTY_NAME,
            address => address,
        };

        let mut report = StepReport::new();
        let property = match self.copy_legacy(owner_id, name, &legacy, &mut report) {
            Ok(property) => property,
            Err(e) => {
                error!(
                    completed = report.completed(),
                    report = ?report,
                    "Legacy migration stopped part-way"
                );
                return Err(Error::BackendUnavailable(format!(
                    "legacy migration failed: {}",
                    e
                )));
            }
        };

        self.store.set_active_property(owner_id, property.id)?;
        info!(
            property_id = %property.id,
            guests = report.completed().saturating_sub(2),
            "Legacy data migrated"
        );

        Ok(ResolveOutcome {
            active_property_id: Some(property.id),
            properties: vec![property],
            migrated: true,
            report,
        })
    }

    fn copy_legacy(
        &self,
        owner_id: Uuid,
        name: &str,
        legacy: &crate::models::Settings,
        report: &mut StepReport,
    ) -> Result<Property> {
        let property = report.run_one(Step::CreateProperty { owner_id }, || {
            self.store.create_property(owner_id, name)
        })?;
        let property_id = property.id;

        report.run(Step::CopySettings { property_id }, || {
            self.store
                .import_settings(owner_id, property_id, legacy)
                .map(|_| 1)
        })?;

        for guest in self.store.list_legacy_guests(owner_id)? {
            report.run(Step::CopyGuest { guest_id: guest.id }, || {
                self.store
                    .add_guest(owner_id, property_id, &guest)
                    .map(|_| 1)
            })?;
        }

        Ok(property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Guest, Settings, YesNo, SETTINGS_PAYLOAD_LIMIT};
    use crate::steps::StepOutcome;
    use crate::storage::{
        Database, GuestRepository, LegacyRepository, PropertyRepository,
    };

    fn legacy_settings() -> Settings {
        Settings {
            property_address: "42 Legacy Ln".into(),
            realtor_name: "Sam Seller".into(),
            realtor_email: "sam@realty.com".into(),
            welcome_message: "Come on in".into(),
            ..Settings::default()
        }
    }

    fn seed_legacy(db: &Database, owner: Uuid, settings: &Settings) -> Vec<Guest> {
        db.save_legacy_settings(owner, settings).unwrap();
        let mut first = Guest::new("Ann", "Ames", "ann@x.com", "5551112222");
        first.do_not_call = Some(YesNo::Yes);
        let second = Guest::new("Bo", "Bell", "bo@x.com", "5553334444");
        db.add_legacy_guest(owner, &first).unwrap();
        db.add_legacy_guest(owner, &second).unwrap();
        vec![first, second]
    }

    #[test]
    fn test_migrates_legacy_once() {
        let db = Database::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        let settings = legacy_settings();
        let guests = seed_legacy(&db, owner, &settings);

        let outcome = MigrationResolver::new(&db).resolve(owner).unwrap();
        assert!(outcome.migrated);
        assert_eq!(outcome.properties.len(), 1);

        let property = &outcome.properties[0];
        assert_eq!(property.name, "42 Legacy Ln");
        assert_eq!(outcome.active_property_id, Some(property.id));
        assert_eq!(db.get_settings(owner, property.id).unwrap(), settings);
        assert_eq!(db.get_guests(owner, property.id).unwrap(), guests);
        assert_eq!(
            outcome.report.steps(),
            vec![
                Step::CreateProperty { owner_id: owner },
                Step::CopySettings { property_id: property.id },
                Step::CopyGuest { guest_id: guests[0].id },
                Step::CopyGuest { guest_id: guests[1].id },
            ]
        );

        let again = MigrationResolver::new(&db).resolve(owner).unwrap();
        assert!(!again.migrated);
        assert!(again.report.is_empty());
        assert_eq!(again.properties, outcome.properties);
        assert_eq!(again.active_property_id, Some(property.id));
        assert_eq!(db.get_guests(owner, property.id).unwrap().len(), 2);
    }

    #[test]
    fn test_no_legacy_data() {
        let db = Database::open_in_memory().unwrap();
        let outcome = MigrationResolver::new(&db).resolve(Uuid::new_v4()).unwrap();

        assert!(outcome.properties.is_empty());
        assert_eq!(outcome.active_property_id, None);
        assert!(!outcome.migrated);
    }

    #[test]
    fn test_blank_address_uses_default_name() {
        let db = Database::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        let settings = Settings {
            property_address: "   ".into(),
            ..Settings::default()
        };
        db.save_legacy_settings(owner, &settings).unwrap();

        let outcome = MigrationResolver::new(&db).resolve(owner).unwrap();
        assert_eq!(outcome.properties[0].name, DEFAULT_PROPERTY_NAME);
        assert_eq!(
            db.get_settings(owner, outcome.properties[0].id)
                .unwrap()
                .property_address,
            "   "
        );
    }

    #[test]
    fn test_copy_ignores_payload_ceiling() {
        let db = Database::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        let mut settings = legacy_settings();
        settings.house_photo = "x".repeat(SETTINGS_PAYLOAD_LIMIT);
        db.save_legacy_settings(owner, &settings).unwrap();

        let outcome = MigrationResolver::new(&db).resolve(owner).unwrap();
        let copied = db.get_settings(owner, outcome.properties[0].id).unwrap();
        assert_eq!(copied.house_photo.len(), SETTINGS_PAYLOAD_LIMIT);
    }

    #[test]
    fn test_existing_properties_untouched() {
        let db = Database::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        seed_legacy(&db, owner, &legacy_settings());

        let first = db.create_property(owner, "1 Current St").unwrap();
        let second = db.create_property(owner, "2 Current St").unwrap();

        let outcome = MigrationResolver::new(&db).resolve(owner).unwrap();
        assert!(!outcome.migrated);
        assert_eq!(outcome.properties.len(), 2);
        assert_eq!(outcome.active_property_id, Some(first.id));

        db.set_active_property(owner, second.id).unwrap();
        let outcome = MigrationResolver::new(&db).resolve(owner).unwrap();
        assert_eq!(outcome.active_property_id, Some(second.id));
    }

    #[test]
    fn test_failed_guest_copy_stops_migration() {
        let db = Database::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        let settings = legacy_settings();
        let guests = seed_legacy(&db, owner, &settings);
        db.conn()
            .execute_batch(
                "CREATE TRIGGER reject_bo BEFORE INSERT ON property_guests
                 WHEN NEW.email = 'bo@x.com'
                 BEGIN SELECT RAISE(ABORT, 'guest rejected'); END;",
            )
            .unwrap();

        let mut report = StepReport::new();
        let resolver = MigrationResolver::new(&db);
        assert!(resolver
            .copy_legacy(owner, "42 Legacy Ln", &settings, &mut report)
            .is_err());

        let property_id = db.list_properties(owner).unwrap()[0].id;
        let outcomes: Vec<_> = report
            .records()
            .iter()
            .map(|r| (r.step, matches!(r.outcome, StepOutcome::Done { .. })))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                (Step::CreateProperty { owner_id: owner }, true),
                (Step::CopySettings { property_id }, true),
                (Step::CopyGuest { guest_id: guests[0].id }, true),
                (Step::CopyGuest { guest_id: guests[1].id }, false),
            ]
        );
        assert!(matches!(
            &report.failed_step().unwrap().outcome,
            StepOutcome::Failed(reason) if reason.contains("guest rejected")
        ));

        // legacy data is left in place
        assert_eq!(db.list_legacy_guests(owner).unwrap(), guests);
    }

    #[test]
    fn test_failed_migration_is_backend_error() {
        let db = Database::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        seed_legacy(&db, owner, &legacy_settings());
        db.conn()
            .execute_batch(
                "CREATE TRIGGER reject_settings BEFORE INSERT ON property_settings
                 BEGIN SELECT RAISE(ABORT, 'settings rejected'); END;",
            )
            .unwrap();

        assert!(matches!(
            MigrationResolver::new(&db).resolve(owner),
            Err(Error::BackendUnavailable(_))
        ));
    }
}
