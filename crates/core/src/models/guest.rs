//! Guest model - one visitor's registration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Answer to a yes/no disclosure question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    /// Parse a form answer. Blank or unrecognized input yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(YesNo::Yes),
            "no" => Some(YesNo::No),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        }
    }
}

impl std::fmt::Display for YesNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered visitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: Uuid,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Denormalized "first last" for display
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub do_not_call: Option<YesNo>,
    #[serde(default)]
    pub has_agency_agreement: Option<YesNo>,
    #[serde(default)]
    pub broker_name: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub notes: String,
    pub timestamp: DateTime<Utc>,
}

impl Guest {
    /// New guest with a fresh id and the current time
    pub fn new(first_name: &str, last_name: &str, email: &str, phone: &str) -> Self {
        let first_name = first_name.trim().to_string();
        let last_name = last_name.trim().to_string();
        Self {
            id: Uuid::new_v4(),
            name: Self::full_name(&first_name, &last_name),
            first_name,
            last_name,
            email: email.trim().to_string(),
            phone: phone.trim().to_string(),
            do_not_call: None,
            has_agency_agreement: None,
            broker_name: String::new(),
            company_name: String::new(),
            notes: String::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn full_name(first_name: &str, last_name: &str) -> String {
        format!("{} {}", first_name.trim(), last_name.trim())
            .trim()
            .to_string()
    }

    /// Case-insensitive email comparison used for duplicate detection
    pub fn has_email(&self, email: &str) -> bool {
        self.email.trim().to_lowercase() == email.trim().to_lowercase()
    }

    /// First name, recovered from `name` for records that predate split names
    pub fn display_first_name(&self) -> String {
        if !self.first_name.is_empty() {
            return self.first_name.clone();
        }
        self.name.split(' ').next().unwrap_or_default().to_string()
    }

    /// Last name, recovered from `name` for records that predate split names
    pub fn display_last_name(&self) -> String {
        if !self.last_name.is_empty() {
            return self.last_name.clone();
        }
        self.name.split(' ').skip(1).collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yes_no_parse() {
        assert_eq!(YesNo::parse("Yes"), Some(YesNo::Yes));
        assert_eq!(YesNo::parse(" no "), Some(YesNo::No));
        assert_eq!(YesNo::parse(""), None);
        assert_eq!(YesNo::parse("maybe"), None);
    }

    #[test]
    fn test_guest_name_is_denormalized() {
        let guest = Guest::new(" Ada ", "Lovelace", "ada@x.com", "555-123-4567");
        assert_eq!(guest.name, "Ada Lovelace");
        assert_eq!(guest.first_name, "Ada");
    }

    #[test]
    fn test_email_match_is_case_insensitive() {
        let guest = Guest::new("A", "B", "A@x.com", "5551234567");
        assert!(guest.has_email("a@x.com"));
        assert!(!guest.has_email("b@x.com"));
    }

    #[test]
    fn test_legacy_name_split() {
        let mut guest = Guest::new("", "", "a@x.com", "5551234567");
        guest.name = "Mary Ann Smith".to_string();
        assert_eq!(guest.display_first_name(), "Mary");
        assert_eq!(guest.display_last_name(), "Ann Smith");
    }

    #[test]
    fn test_yes_no_wire_format() {
        let json = serde_json::to_string(&YesNo::Yes).unwrap();
        assert_eq!(json, "\"Yes\"");
    }
}
