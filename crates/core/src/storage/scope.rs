//! Document scoping for the two persisted layouts

use uuid::Uuid;

/// Where a settings document or guest collection lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentScope {
    /// Nested under a property (multi-property layout)
    Property(Uuid),
    /// Directly under the owner (legacy single-property layout)
    Legacy(Uuid),
}

impl DocumentScope {
    pub(crate) fn settings_table(&self) -> &'static str {
        match self {
            DocumentScope::Property(_) => "property_settings",
            DocumentScope::Legacy(_) => "owner_settings",
        }
    }

    pub(crate) fn guests_table(&self) -> &'static str {
        match self {
            DocumentScope::Property(_) => "property_guests",
            DocumentScope::Legacy(_) => "owner_guests",
        }
    }

    pub(crate) fn key_column(&self) -> &'static str {
        match self {
            DocumentScope::Property(_) => "property_id",
            DocumentScope::Legacy(_) => "owner_id",
        }
    }

    pub(crate) fn key(&self) -> String {
        match self {
            DocumentScope::Property(id) | DocumentScope::Legacy(id) => id.to_string(),
        }
    }
}

impl std::fmt::Display for DocumentScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentScope::Property(id) => write!(f, "property:{}", id),
            DocumentScope::Legacy(id) => write!(f, "legacy:{}", id),
        }
    }
}
