//! Public guest registration
//!
//! A visitor's link names an owner and optionally a property. The page is
//! loaded once as a snapshot; duplicate emails are checked against that
//! snapshot, which grows as guests register.

use chrono::Local;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Guest, Property, Settings};
use crate::notify::{thank_you_entry, MailEntry, MailQueue};
use crate::storage::{DocumentScope, Storage};
use crate::validation::{ensure_unique_email, Submission};

/// What a visitor sees, plus the guests used for duplicate checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicPage {
    pub owner_id: Uuid,
    pub scope: DocumentScope,
    /// `None` for owners still on the single-property layout
    pub property: Option<Property>,
    pub settings: Settings,
    pub guests: Vec<Guest>,
}

impl PublicPage {
    pub fn property_name(&self) -> &str {
        self.property.as_ref().map(|p| p.name.as_str()).unwrap_or("")
    }

    /// Address shown in the page header and in emails
    pub fn address(&self) -> &str {
        self.settings.display_address(self.property_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOutcome {
    pub guest: Guest,
    /// Set when the guest was saved but the thank-you email was not queued
    pub email_warning: Option<String>,
}

pub struct RegistrationService<'a, S: Storage + ?Sized, M: MailQueue + ?Sized> {
    store: &'a S,
    mail: &'a M,
}

impl<'a, S: Storage + ?Sized, M: MailQueue + ?Sized> RegistrationService<'a, S, M> {
    pub fn new(store: &'a S, mail: &'a M) -> Self {
        Self { store, mail }
    }

    /// Load the page for a visitor link.
    ///
    /// Without a property id the owner's first property is used, then the
    /// single-property layout. An owner with neither has no page.
    #[instrument(skip(self))]
    pub fn load_page(&self, owner_id: Uuid, property_id: Option<Uuid>) -> Result<PublicPage> {
        let property = match property_id {
            Some(id) => Some(
                self.store
                    .find_property(owner_id, id)?
                    .ok_or_else(|| Error::NotFound(format!("property {}", id)))?,
            ),
            None => self.store.list_properties(owner_id)?.into_iter().next(),
        };

        match property {
            Some(property) => Ok(PublicPage {
                owner_id,
                scope: DocumentScope::Property(property.id),
                settings: self.store.get_settings(owner_id, property.id)?,
                guests: self.store.get_guests(owner_id, property.id)?,
                property: Some(property),
            }),
            None => {
                let settings = self
                    .store
                    .load_legacy_settings(owner_id)?
                    .ok_or_else(|| Error::NotFound(format!("registration page of {}", owner_id)))?;
                Ok(PublicPage {
                    owner_id,
                    scope: DocumentScope::Legacy(owner_id),
                    property: None,
                    settings,
                    guests: self.store.list_legacy_guests(owner_id)?,
                })
            }
        }
    }

    /// Validate and store a visitor. The thank-you email is prepared but not queued.
    #[instrument(skip(self, page, submission), fields(scope = %page.scope))]
    pub fn accept(&self, page: &mut PublicPage, submission: &Submission) -> Result<PendingThankYou> {
        let answers = submission.validate()?;
        ensure_unique_email(&page.guests, &submission.email, None)?;

        let guest = submission.to_guest(answers);
        match page.scope {
            DocumentScope::Property(property_id) => {
                self.store.add_guest(page.owner_id, property_id, &guest)?
            }
            DocumentScope::Legacy(owner_id) => self.store.add_legacy_guest(owner_id, &guest)?,
        }
        page.guests.push(guest.clone());
        info!(guest_id = %guest.id, "Guest registered");

        let registered_at = guest.timestamp.with_timezone(&Local).naive_local();
        let entry = thank_you_entry(&guest, &page.settings, page.property_name(), registered_at);
        Ok(PendingThankYou { guest, entry })
    }

    /// Load the page and accept in one call
    pub fn accept_at(
        &self,
        owner_id: Uuid,
        property_id: Option<Uuid>,
        submission: &Submission,
    ) -> Result<PendingThankYou> {
        let mut page = self.load_page(owner_id, property_id)?;
        self.accept(&mut page, submission)
    }

    /// Validate, store and thank a visitor
    pub async fn register(
        &self,
        page: &mut PublicPage,
        submission: &Submission,
    ) -> Result<RegistrationOutcome> {
        let pending = self.accept(page, submission)?;
        Ok(pending.send(self.mail).await)
    }

    /// Load the page and register in one call
    pub async fn register_at(
        &self,
        owner_id: Uuid,
        property_id: Option<Uuid>,
        submission: &Submission,
    ) -> Result<RegistrationOutcome> {
        let mut page = self.load_page(owner_id, property_id)?;
        self.register(&mut page, submission).await
    }
}

/// A stored registration whose thank-you email is not queued yet.
///
/// Lets callers release the store before waiting on the mail queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingThankYou {
    pub guest: Guest,
    entry: Option<MailEntry>,
}

impl PendingThankYou {
    /// Queue the email. A queue failure is reported as a warning, not an error.
    pub async fn send<M: MailQueue + ?Sized>(self, mail: &M) -> RegistrationOutcome {
        let email_warning = match &self.entry {
            None => None,
            Some(entry) => match mail.enqueue(entry).await {
                Ok(()) => None,
                Err(e) => {
                    warn!(guest_id = %self.guest.id, error = %e, "Thank-you email not queued");
                    Some(
                        "Your registration was saved, but the confirmation email could not be sent."
                            .to_string(),
                    )
                }
            },
        };

        RegistrationOutcome {
            guest: self.guest,
            email_warning,
        }
    }
}
