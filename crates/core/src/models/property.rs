//! Property model - one open-house listing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name given to a property migrated from a legacy layout without an address
pub const DEFAULT_PROPERTY_NAME: &str = "My Property";

/// A Property owns one settings document and one guest list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Doubles as the display address until settings override it
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Property {
    pub fn new(owner_id: Uuid, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.trim().to_string(),
            created_at: Utc::now(),
        }
    }

    /// Key used to detect duplicate listings: trimmed and case-folded name
    pub fn dedup_key(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_ignores_case_and_padding() {
        let owner = Uuid::new_v4();
        let a = Property::new(owner, "123 Main St");
        let mut b = Property::new(owner, "x");
        b.name = "123 MAIN ST ".to_string();
        assert_eq!(a.dedup_key(), b.dedup_key());
    }
}
