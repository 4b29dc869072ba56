//! Error types for the openhouse CLI

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] openhouse_core::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl AppError {
    /// Message printed for the operator
    pub fn user_message(&self) -> String {
        match self {
            AppError::Core(e) => e.user_message(),
            AppError::Config(e) => format!("Could not read the configuration file: {}", e),
            AppError::Io(e) => format!("File error: {}", e),
            AppError::NotSignedIn => "Please sign in first (openhouse login).".to_string(),
            AppError::Clipboard(e) => format!("Could not copy to the clipboard: {}", e),
            AppError::InvalidArgument(e) => e.clone(),
        }
    }
}

impl From<openhouse_core::AuthError> for AppError {
    fn from(e: openhouse_core::AuthError) -> Self {
        AppError::Core(e.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
