//! Owner sign-in
//!
//! [`SessionGate`] wraps an [`IdentityProvider`] and publishes the signed-in
//! owner as an observable value. Provider failures arrive as error codes and
//! are classified into the few cases the UI distinguishes.

mod local;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::models::Owner;

pub use local::LocalIdentityProvider;

/// Classified sign-in failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("malformed email")]
    MalformedEmail,

    #[error("rate limited")]
    RateLimited,

    #[error("unknown provider failure: {0}")]
    Unknown(String),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Invalid email or password.",
            AuthError::MalformedEmail => "Please enter a valid email address.",
            AuthError::RateLimited => "Too many failed attempts. Please try again later.",
            AuthError::Unknown(_) => "Sign-in failed. Please try again.",
        }
    }
}

/// Raw failure reported by an identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub code: String,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Map a provider failure to what the user sees.
///
/// `None` means the user backed out (closed the popup) and nothing should be shown.
pub fn classify(failure: &ProviderFailure) -> Option<AuthError> {
    match failure.code.as_str() {
        "auth/invalid-credential" | "auth/wrong-password" | "auth/user-not-found" => {
            Some(AuthError::InvalidCredentials)
        }
        "auth/invalid-email" => Some(AuthError::MalformedEmail),
        "auth/too-many-requests" => Some(AuthError::RateLimited),
        "auth/popup-closed-by-user" | "auth/cancelled-popup-request" => None,
        other => Some(AuthError::Unknown(other.to_string())),
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderFailure>;

/// External identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> ProviderResult<Owner>;

    /// Federated sign-in (e.g. "google")
    async fn sign_in_with_provider(&self, provider: &str) -> ProviderResult<Owner>;

    async fn sign_out(&self) -> ProviderResult<()>;

    async fn send_password_reset(&self, email: &str) -> ProviderResult<()>;
}

/// Current owner identity, backed by an identity provider
pub struct SessionGate<P: IdentityProvider> {
    provider: P,
    identity: watch::Sender<Option<Owner>>,
}

impl<P: IdentityProvider> SessionGate<P> {
    pub fn new(provider: P) -> Self {
        Self::with_identity(provider, None)
    }

    /// Start with an identity restored from a stored session
    pub fn with_identity(provider: P, identity: Option<Owner>) -> Self {
        let (identity, _) = watch::channel(identity);
        Self { provider, identity }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn current(&self) -> Option<Owner> {
        self.identity.borrow().clone()
    }

    /// Observe identity changes
    pub fn subscribe(&self) -> watch::Receiver<Option<Owner>> {
        self.identity.subscribe()
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Owner, AuthError> {
        match self.provider.sign_in_with_password(email, password).await {
            Ok(owner) => Ok(self.signed_in(owner)),
            Err(failure) => {
                warn!(code = %failure.code, "Password sign-in failed");
                Err(classify(&failure).unwrap_or(AuthError::Unknown(failure.code)))
            }
        }
    }

    /// Returns `Ok(None)` when the user closed the provider popup
    #[instrument(skip(self))]
    pub async fn sign_in_with_provider(&self, provider: &str) -> Result<Option<Owner>, AuthError> {
        match self.provider.sign_in_with_provider(provider).await {
            Ok(owner) => Ok(Some(self.signed_in(owner))),
            Err(failure) => match classify(&failure) {
                Some(error) => {
                    warn!(code = %failure.code, "Federated sign-in failed");
                    Err(error)
                }
                None => Ok(None),
            },
        }
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.provider
            .sign_out()
            .await
            .map_err(|f| classify(&f).unwrap_or(AuthError::Unknown(f.code)))?;
        self.identity.send_replace(None);
        info!("Signed out");
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.provider
            .send_password_reset(email)
            .await
            .map_err(|f| classify(&f).unwrap_or(AuthError::Unknown(f.code)))
    }

    /// Publish an owner whose account was just created and signed in
    pub fn signed_up(&self, owner: Owner) -> Owner {
        self.signed_in(owner)
    }

    fn signed_in(&self, owner: Owner) -> Owner {
        info!(owner_id = %owner.id, "Signed in");
        self.identity.send_replace(Some(owner.clone()));
        owner
    }
}
