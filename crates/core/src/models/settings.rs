//! Per-property settings document

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Hard ceiling for a serialized settings document
pub const SETTINGS_PAYLOAD_LIMIT: usize = 900 * 1024;

pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome to Our Open House!";

pub const DEFAULT_EMAIL_TEMPLATE: &str = "Thank you for registering for our open house! We look forward to seeing you!

Property Details:
Date: [DATE]
Time: [TIME]
Address: [ADDRESS]

Best regards,
[REALTOR_NAME]";

/// Branding and content shown on a property's public page.
///
/// Photo fields hold self-contained data URLs, not references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub welcome_message: String,
    pub property_address: String,
    pub house_photo: String,
    pub logo: String,
    pub realtor_photo: String,
    pub email_template: String,
    pub realtor_email: String,
    pub realtor_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            property_address: String::new(),
            house_photo: String::new(),
            logo: String::new(),
            realtor_photo: String::new(),
            email_template: DEFAULT_EMAIL_TEMPLATE.to_string(),
            realtor_email: String::new(),
            realtor_name: String::new(),
        }
    }
}

impl Settings {
    /// Initial settings for a freshly created property.
    ///
    /// Branding (logo, realtor photo, realtor contact) carries over from
    /// `inherit_from` when the owner already has an active property.
    pub fn for_new_property(address: &str, inherit_from: Option<&Settings>) -> Self {
        let mut settings = Settings {
            property_address: address.trim().to_string(),
            ..Settings::default()
        };

        if let Some(previous) = inherit_from {
            settings.logo = previous.logo.clone();
            settings.realtor_photo = previous.realtor_photo.clone();
            settings.realtor_email = previous.realtor_email.clone();
            settings.realtor_name = previous.realtor_name.clone();
        }

        settings
    }

    /// Size in bytes of the JSON document that gets persisted
    pub fn serialized_size(&self) -> Result<usize> {
        Ok(serde_json::to_vec(self)?.len())
    }

    pub fn image(&self, field: ImageField) -> &str {
        match field {
            ImageField::HousePhoto => &self.house_photo,
            ImageField::Logo => &self.logo,
            ImageField::RealtorPhoto => &self.realtor_photo,
        }
    }

    pub fn set_image(&mut self, field: ImageField, data_url: String) {
        match field {
            ImageField::HousePhoto => self.house_photo = data_url,
            ImageField::Logo => self.logo = data_url,
            ImageField::RealtorPhoto => self.realtor_photo = data_url,
        }
    }

    /// Address shown to visitors, falling back to the property name
    pub fn display_address<'a>(&'a self, property_name: &'a str) -> &'a str {
        let address = self.property_address.trim();
        if address.is_empty() {
            property_name
        } else {
            address
        }
    }
}

/// The three image slots of a settings document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageField {
    HousePhoto,
    Logo,
    RealtorPhoto,
}

impl ImageField {
    pub const ALL: [ImageField; 3] = [
        ImageField::HousePhoto,
        ImageField::Logo,
        ImageField::RealtorPhoto,
    ];

    /// Encoded-size budget for uploads, also the recompression threshold
    pub fn budget_bytes(&self) -> usize {
        match self {
            ImageField::HousePhoto => 400 * 1024,
            ImageField::Logo | ImageField::RealtorPhoto => 150 * 1024,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ImageField::HousePhoto => "house photo",
            ImageField::Logo => "logo",
            ImageField::RealtorPhoto => "realtor photo",
        }
    }
}

impl std::fmt::Display for ImageField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
