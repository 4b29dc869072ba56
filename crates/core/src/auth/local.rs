//! Email/password identity provider over the local database

use std::sync::{Arc, Mutex, MutexGuard};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{AuthError, IdentityProvider, ProviderFailure, ProviderResult};
use crate::error::{Error, Field, Result, ValidationErrors};
use crate::models::{Owner, OwnerAccount, Session};
use crate::storage::{Database, OwnerRepository};
use crate::validation::is_valid_email;

pub const MIN_PASSWORD_LEN: usize = 6;

/// One week
const SESSION_HOURS: i64 = 24 * 7;

pub struct LocalIdentityProvider {
    db: Arc<Mutex<Database>>,
    session: Mutex<Option<Uuid>>,
}

impl LocalIdentityProvider {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self {
            db,
            session: Mutex::new(None),
        }
    }

    fn db(&self) -> ProviderResult<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| ProviderFailure::new("auth/internal-error", "database lock poisoned"))
    }

    fn set_session(&self, session_id: Option<Uuid>) {
        if let Ok(mut current) = self.session.lock() {
            *current = session_id;
        }
    }

    /// Session id of the signed-in owner, if any
    pub fn current_session(&self) -> Option<Uuid> {
        self.session.lock().ok().and_then(|s| *s)
    }

    /// Create an account and sign it in
    #[instrument(skip(self, password))]
    pub fn sign_up(&self, email: &str, password: &str) -> Result<Owner> {
        let mut errors = ValidationErrors::new();
        if !is_valid_email(email) {
            errors.add(Field::Email, "Please enter a valid email");
        }
        if password.len() < MIN_PASSWORD_LEN {
            errors.add(Field::Password, "Password must be at least 6 characters");
        }
        errors.into_result()?;

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Auth(AuthError::Unknown(format!("hashing failed: {}", e))))?
            .to_string();

        let account = OwnerAccount::new(email, password_hash);
        let session = Session::new(account.id, SESSION_HOURS);
        {
            let db = self
                .db
                .lock()
                .map_err(|_| Error::BackendUnavailable("database lock poisoned".into()))?;

            if db.find_owner_by_email(&account.email)?.is_some() {
                return Err(Error::Validation(ValidationErrors::single(
                    Field::Email,
                    "An account with this email already exists",
                )));
            }
            db.create_owner(&account)?;
            db.create_session(&session)?;
        }

        self.set_session(Some(session.id));
        info!(owner_id = %account.id, "Owner account created");
        Ok(account.identity())
    }

    /// Resume a stored session if it has not expired
    pub fn restore_session(&self, session_id: Uuid) -> Result<Option<Owner>> {
        let owner = {
            let db = self
                .db
                .lock()
                .map_err(|_| Error::BackendUnavailable("database lock poisoned".into()))?;
            let expired = db.cleanup_expired_sessions()?;
            if expired > 0 {
                info!(expired, "Expired sessions removed");
            }
            match db.find_valid_session(session_id)? {
                Some(session) => db.find_owner_by_id(session.owner_id)?,
                None => None,
            }
        };

        if owner.is_some() {
            self.set_session(Some(session_id));
        }
        Ok(owner.map(|account| account.identity()))
    }
}

fn backend(e: Error) -> ProviderFailure {
    ProviderFailure::new("auth/internal-error", e.to_string())
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> ProviderResult<Owner> {
        if !is_valid_email(email) {
            return Err(ProviderFailure::new("auth/invalid-email", "malformed email"));
        }

        let (session_id, owner) = {
            let db = self.db()?;
            let account = db
                .find_owner_by_email(email)
                .map_err(backend)?
                .ok_or_else(|| ProviderFailure::new("auth/user-not-found", "no such account"))?;

            let parsed = PasswordHash::new(&account.password_hash)
                .map_err(|_| ProviderFailure::new("auth/internal-error", "invalid stored hash"))?;
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .map_err(|_| ProviderFailure::new("auth/wrong-password", "password mismatch"))?;

            db.update_last_login(account.id).map_err(backend)?;
            let session = Session::new(account.id, SESSION_HOURS);
            db.create_session(&session).map_err(backend)?;
            (session.id, account.identity())
        };

        self.set_session(Some(session_id));
        Ok(owner)
    }

    async fn sign_in_with_provider(&self, provider: &str) -> ProviderResult<Owner> {
        Err(ProviderFailure::new(
            "auth/operation-not-allowed",
            format!("{} sign-in is not available", provider),
        ))
    }

    async fn sign_out(&self) -> ProviderResult<()> {
        if let Some(session_id) = self.current_session() {
            self.db()?.delete_session(session_id).map_err(backend)?;
        }
        self.set_session(None);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> ProviderResult<()> {
        if !is_valid_email(email) {
            return Err(ProviderFailure::new("auth/invalid-email", "malformed email"));
        }
        // Same answer whether or not the account exists
        info!(email = %email.trim(), "Password reset requested");
        Ok(())
    }
}
