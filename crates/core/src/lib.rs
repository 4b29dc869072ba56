//! Open House Core Library
//!
//! Models, storage, image compression, legacy migration, guest registration
//! and owner sessions for open-house guest registration.

pub mod auth;
pub mod compressor;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod invariants;
pub mod models;
pub mod notify;
pub mod public_link;
pub mod registration;
pub mod resolver;
pub mod steps;
pub mod storage;
pub mod validation;

pub use auth::{AuthError, IdentityProvider, LocalIdentityProvider, SessionGate};
pub use compressor::{CompressedImage, ImageBudgetCompressor, RecompressOutcome};
pub use context::{DashboardState, SessionContext, View};
pub use dashboard::Dashboard;
pub use error::{Error, Field, Result, ValidationErrors};
pub use models::*;
pub use notify::{LogMailQueue, MailEntry, MailMessage, MailQueue};
pub use public_link::PublicLink;
pub use registration::{PendingThankYou, PublicPage, RegistrationOutcome, RegistrationService};
pub use resolver::{MigrationResolver, ResolveOutcome};
pub use steps::{Step, StepOutcome, StepRecord, StepReport};
pub use storage::{
    Database, DedupReport, DocumentScope, GuestRepository, LegacyRepository, OwnerRepository,
    PropertyRepository, Storage,
};
pub use validation::{BrokerInfo, GuestForm, Submission};
