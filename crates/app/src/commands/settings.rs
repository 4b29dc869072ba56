//! Settings editing for the selected property

use std::path::Path;

use clap::ValueEnum;
use openhouse_core::{ImageField, Settings};

use super::{with_dashboard, Session};
use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageSlot {
    House,
    Logo,
    Realtor,
}

impl From<ImageSlot> for ImageField {
    fn from(slot: ImageSlot) -> Self {
        match slot {
            ImageSlot::House => ImageField::HousePhoto,
            ImageSlot::Logo => ImageField::Logo,
            ImageSlot::Realtor => ImageField::RealtorPhoto,
        }
    }
}

/// Text fields changed by `settings set`; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub welcome_message: Option<String>,
    pub property_address: Option<String>,
    pub realtor_name: Option<String>,
    pub realtor_email: Option<String>,
    pub email_template: Option<String>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.welcome_message.is_none()
            && self.property_address.is_none()
            && self.realtor_name.is_none()
            && self.realtor_email.is_none()
            && self.email_template.is_none()
    }

    fn apply(self, settings: &mut Settings) {
        if let Some(value) = self.welcome_message {
            settings.welcome_message = value;
        }
        if let Some(value) = self.property_address {
            settings.property_address = value;
        }
        if let Some(value) = self.realtor_name {
            settings.realtor_name = value;
        }
        if let Some(value) = self.realtor_email {
            settings.realtor_email = value;
        }
        if let Some(value) = self.email_template {
            settings.email_template = value;
        }
    }
}

fn describe_image(data_url: &str) -> String {
    if data_url.is_empty() {
        "(none)".to_string()
    } else {
        format!("{} KB", data_url.len() / 1024)
    }
}

pub fn show(state: &AppState, session: &mut Session) -> Result<()> {
    with_dashboard(state, session, |dashboard| {
        let dashboard_state = dashboard.state();
        let (Some(property), Some(settings)) =
            (dashboard_state.active_property(), &dashboard_state.settings)
        else {
            println!("No property selected.");
            return Ok(());
        };

        println!("Property:        {}", property.name);
        println!("Address:         {}", settings.display_address(&property.name));
        println!("Welcome message: {}", settings.welcome_message);
        println!("Realtor:         {}", settings.realtor_name);
        println!("Realtor email:   {}", settings.realtor_email);
        for field in ImageField::ALL {
            println!(
                "{:<16} {}",
                format!("{}:", capitalize(field.display_name())),
                describe_image(settings.image(field))
            );
        }
        println!();
        println!("Email template:");
        println!("{}", settings.email_template);
        Ok(())
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn set(state: &AppState, session: &mut Session, update: SettingsUpdate) -> Result<()> {
    with_dashboard(state, session, |dashboard| {
        report_recompression(dashboard.begin_edit()?.recompressed.as_slice());
        update.apply(dashboard.draft_mut()?);
        let property = dashboard.save_settings()?;
        println!("Settings saved for '{}'.", property.name);
        Ok(())
    })
}

pub fn set_image(
    state: &AppState,
    session: &mut Session,
    slot: ImageSlot,
    path: &Path,
) -> Result<()> {
    let bytes = std::fs::read(path)?;
    let field = ImageField::from(slot);

    with_dashboard(state, session, |dashboard| {
        dashboard.begin_edit()?;
        let image = dashboard.upload_image(field, &bytes)?;
        dashboard.save_settings()?;
        println!(
            "Saved {} ({}x{}, {} KB at quality {}).",
            field.display_name(),
            image.width,
            image.height,
            image.encoded_len() / 1024,
            image.quality
        );
        Ok(())
    })
}

pub fn clear_image(state: &AppState, session: &mut Session, slot: ImageSlot) -> Result<()> {
    let field = ImageField::from(slot);
    with_dashboard(state, session, |dashboard| {
        dashboard.draft_mut()?.set_image(field, String::new());
        dashboard.save_settings()?;
        println!("Removed {}.", field.display_name());
        Ok(())
    })
}

/// Shrink stored images that exceed their budget and save the result
pub fn recompress(state: &AppState, session: &mut Session) -> Result<()> {
    with_dashboard(state, session, |dashboard| {
        let outcome = dashboard.begin_edit()?;
        for (field, reason) in &outcome.failures {
            println!("Could not shrink {}: {}", field.display_name(), reason);
        }
        if !outcome.changed() {
            dashboard.cancel_edit();
            println!("All images are within their size budget.");
            return Ok(());
        }

        report_recompression(&outcome.recompressed);
        dashboard.save_settings()?;
        Ok(())
    })
}

fn report_recompression(fields: &[ImageField]) {
    for field in fields {
        println!("Shrank oversized {}.", field.display_name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::auth::sign_up;
    use crate::commands::property;
    use crate::state::test_state;
    use openhouse_core::PropertyRepository;

    #[test]
    fn test_set_updates_name_from_address() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let mut session = Session::restore(&state).unwrap();
        sign_up(&state, &mut session, "pat@realty.com", Some("secret1".into())).unwrap();
        let owner_id = session.owner().unwrap().id;
        property::create(&state, &mut session, "12 Oak St").unwrap();

        let update = SettingsUpdate {
            property_address: Some("12 Oak Street, Springfield".into()),
            realtor_name: Some("Pat Agent".into()),
            ..SettingsUpdate::default()
        };
        set(&state, &mut session, update).unwrap();

        let db = state.db().unwrap();
        let properties = db.list_properties(owner_id).unwrap();
        assert_eq!(properties[0].name, "12 Oak Street, Springfield");
        let settings = db.get_settings(owner_id, properties[0].id).unwrap();
        assert_eq!(settings.realtor_name, "Pat Agent");
    }

    #[test]
    fn test_set_image_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let mut session = Session::restore(&state).unwrap();
        sign_up(&state, &mut session, "pat@realty.com", Some("secret1".into())).unwrap();
        property::create(&state, &mut session, "12 Oak St").unwrap();

        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "not an image").unwrap();
        assert!(set_image(&state, &mut session, ImageSlot::Logo, &path).is_err());
    }

    #[test]
    fn test_slot_mapping() {
        assert_eq!(ImageField::from(ImageSlot::House), ImageField::HousePhoto);
        assert_eq!(ImageField::from(ImageSlot::Realtor), ImageField::RealtorPhoto);
    }
}
