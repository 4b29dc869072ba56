//! Owner identity and locally stored accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated realtor identity driving access scoping
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    pub id: Uuid,
    pub email: String,
}

/// An owner account managed by the local identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerAccount {
    pub id: Uuid,
    /// Stored lowercase
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl OwnerAccount {
    pub fn new(email: &str, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.trim().to_lowercase(),
            password_hash,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    /// The public identity for this account
    pub fn identity(&self) -> Owner {
        Owner {
            id: self.id,
            email: self.email.clone(),
        }
    }
}

/// Active sign-in session for an owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(owner_id: Uuid, duration_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            created_at: now,
            expires_at: now + chrono::Duration::hours(duration_hours),
        }
    }

    pub fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_email_normalized() {
        let account = OwnerAccount::new("  Realtor@Example.COM ", "hash".into());
        assert_eq!(account.email, "realtor@example.com");
        assert_eq!(account.identity().id, account.id);
    }

    #[test]
    fn test_session_validity() {
        let session = Session::new(Uuid::new_v4(), 1);
        assert!(session.is_valid());

        let expired = Session::new(Uuid::new_v4(), -1);
        assert!(!expired.is_valid());
    }
}
