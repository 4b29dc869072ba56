//! Dashboard controller
//!
//! Drives the storage layer for one signed-in owner and keeps the
//! session's [`DashboardState`] in step with what was written. Mutating
//! operations take `&mut self`, so a session cannot overlap two of them.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::compressor::{CompressedImage, ImageBudgetCompressor, RecompressOutcome};
use crate::context::DashboardState;
use crate::error::{Error, Result};
use crate::export::guests_to_csv;
use crate::invariants::{assert_dashboard_invariants, assert_owner_id_valid};
use crate::models::{Guest, ImageField, Property, Settings};
use crate::public_link::PublicLink;
use crate::resolver::{MigrationResolver, ResolveOutcome};
use crate::steps::StepReport;
use crate::storage::{DedupReport, Storage};
use crate::validation::{ensure_unique_email, GuestForm};

pub struct Dashboard<'a, S: Storage + ?Sized> {
    store: &'a S,
    compressor: ImageBudgetCompressor,
    state: &'a mut DashboardState,
}

impl<'a, S: Storage + ?Sized> Dashboard<'a, S> {
    pub fn new(store: &'a S, state: &'a mut DashboardState) -> Self {
        assert_owner_id_valid(state.owner_id, "dashboard");
        Self {
            store,
            compressor: ImageBudgetCompressor::default(),
            state,
        }
    }

    pub fn with_compressor(mut self, compressor: ImageBudgetCompressor) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn state(&self) -> &DashboardState {
        self.state
    }

    fn owner_id(&self) -> Uuid {
        self.state.owner_id
    }

    fn active_id(&self) -> Result<Uuid> {
        self.state
            .active_property_id
            .ok_or_else(|| Error::NotFound("selected property".into()))
    }

    /// List properties (migrating legacy data on first use) and load the active one
    #[instrument(skip(self), fields(owner_id = %self.state.owner_id))]
    pub fn load(&mut self) -> Result<ResolveOutcome> {
        let outcome = MigrationResolver::new(self.store).resolve(self.owner_id())?;
        self.state.properties = outcome.properties.clone();
        self.state.active_property_id = outcome.active_property_id;
        self.load_active()?;
        Ok(outcome)
    }

    fn load_active(&mut self) -> Result<()> {
        self.state.draft = None;
        match self.state.active_property_id {
            Some(id) => {
                self.state.settings = Some(self.store.get_settings(self.owner_id(), id)?);
                self.state.guests = self.store.get_guests(self.owner_id(), id)?;
            }
            None => self.state.clear_active(),
        }
        assert_dashboard_invariants(self.state);
        Ok(())
    }

    fn refresh_properties(&mut self) -> Result<()> {
        self.state.properties = self.store.list_properties(self.owner_id())?;
        Ok(())
    }

    /// Make a property active and load its settings and guests
    pub fn select(&mut self, property_id: Uuid) -> Result<()> {
        self.store
            .set_active_property(self.owner_id(), property_id)?;
        self.state.active_property_id = Some(property_id);
        self.load_active()
    }

    pub fn create_property(&mut self, name: &str) -> Result<Property> {
        let property = self.store.create_property(self.owner_id(), name)?;
        self.refresh_properties()?;
        self.select(property.id)?;
        Ok(property)
    }

    /// Delete a property; the selection moves to the first remaining one if needed
    pub fn delete_property(&mut self, property_id: Uuid) -> Result<StepReport> {
        let report = self.store.delete_property(self.owner_id(), property_id)?;
        self.refresh_properties()?;
        if self.state.active_property_id == Some(property_id) {
            self.select_first()?;
        }
        Ok(report)
    }

    pub fn remove_duplicates(&mut self) -> Result<DedupReport> {
        let report = self.store.delete_duplicate_properties(self.owner_id())?;
        if report.removed > 0 {
            self.refresh_properties()?;
            let active_gone = self
                .state
                .active_property_id
                .is_some_and(|id| report.removed_ids.contains(&id));
            if active_gone {
                self.select_first()?;
            }
        }
        Ok(report)
    }

    fn select_first(&mut self) -> Result<()> {
        match self.state.properties.first().map(|p| p.id) {
            Some(id) => self.select(id),
            None => {
                self.state.clear_active();
                Ok(())
            }
        }
    }

    /// Enter edit mode, shrinking stored images that exceed their budget
    pub fn begin_edit(&mut self) -> Result<RecompressOutcome> {
        let settings = self
            .state
            .settings
            .clone()
            .ok_or_else(|| Error::NotFound("selected property".into()))?;

        let outcome = self.compressor.recompress_if_oversized(&settings);
        self.state.draft = Some(outcome.settings.clone());
        Ok(outcome)
    }

    pub fn cancel_edit(&mut self) {
        self.state.draft = None;
    }

    /// The edit-mode copy, entering edit mode if needed
    pub fn draft_mut(&mut self) -> Result<&mut Settings> {
        if self.state.draft.is_none() {
            self.begin_edit()?;
        }
        self.state
            .draft
            .as_mut()
            .ok_or_else(|| Error::NotFound("settings draft".into()))
    }

    /// Compress an upload into a draft image slot. The draft is untouched on failure.
    pub fn upload_image(&mut self, field: ImageField, bytes: &[u8]) -> Result<CompressedImage> {
        let image = self.compressor.compress_for(bytes, field)?;
        self.draft_mut()?.set_image(field, image.data_url.clone());
        Ok(image)
    }

    /// Persist the draft. Oversized images are shrunk once more first.
    #[instrument(skip(self))]
    pub fn save_settings(&mut self) -> Result<Property> {
        let property_id = self.active_id()?;
        let draft = match self.state.draft.take() {
            Some(draft) => draft,
            None => return Err(Error::NotFound("settings draft".into())),
        };

        let prepared = self.compressor.recompress_if_oversized(&draft).settings;
        let property = match self
            .store
            .save_settings(self.owner_id(), property_id, &prepared)
        {
            Ok(property) => property,
            Err(e) => {
                self.state.draft = Some(draft);
                return Err(e);
            }
        };

        self.state.settings = Some(prepared);
        if let Some(entry) = self
            .state
            .properties
            .iter_mut()
            .find(|p| p.id == property.id)
        {
            entry.name = property.name.clone();
        }
        info!(%property_id, "Settings saved");
        Ok(property)
    }

    /// Add a guest from the dashboard form
    pub fn add_guest(&mut self, form: &GuestForm) -> Result<Guest> {
        let property_id = self.active_id()?;
        form.validate()?;
        ensure_unique_email(&self.state.guests, &form.email, None)?;

        let guest = form.to_new_guest();
        self.store
            .add_guest(self.owner_id(), property_id, &guest)?;
        self.state.guests.push(guest.clone());
        Ok(guest)
    }

    /// Edit a guest; id and registration time are kept
    pub fn update_guest(&mut self, guest_id: Uuid, form: &GuestForm) -> Result<Guest> {
        let property_id = self.active_id()?;
        form.validate()?;
        ensure_unique_email(&self.state.guests, &form.email, Some(guest_id))?;

        let index = self
            .state
            .guests
            .iter()
            .position(|g| g.id == guest_id)
            .ok_or_else(|| Error::NotFound(format!("guest {}", guest_id)))?;

        let mut guest = self.state.guests[index].clone();
        form.apply_to(&mut guest);
        self.store
            .update_guest(self.owner_id(), property_id, &guest)?;
        self.state.guests[index] = guest.clone();
        Ok(guest)
    }

    pub fn delete_guest(&mut self, guest_id: Uuid) -> Result<()> {
        let property_id = self.active_id()?;
        self.store
            .delete_guest(self.owner_id(), property_id, guest_id)?;
        self.state.guests.retain(|g| g.id != guest_id);
        Ok(())
    }

    pub fn export_csv(&self) -> Result<String> {
        guests_to_csv(&self.state.guests)
    }

    /// Visitor link for the active property
    pub fn public_link(&self, base_url: &str) -> Result<String> {
        PublicLink::new(self.owner_id(), Some(self.active_id()?)).to_url(base_url)
    }
}
