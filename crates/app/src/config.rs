//! Configuration file handling
//!
//! Read from `config.toml` in the platform config directory, or from the
//! path in `OPENHOUSE_CONFIG`. Every key is optional.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::Result;

pub const CONFIG_ENV: &str = "OPENHOUSE_CONFIG";

const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080/";
const DEFAULT_LOG_FILTER: &str = "info";

/// How thank-you emails leave the app
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailDelivery {
    /// One JSON file per message in `mail_spool_dir`
    #[default]
    Spool,
    /// Log the message and drop it
    Log,
}

/// Keys as they appear in the file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    public_base_url: Option<String>,
    mail_delivery: Option<MailDelivery>,
    mail_spool_dir: Option<PathBuf>,
    log_filter: Option<String>,
    export_dir: Option<PathBuf>,
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_path: PathBuf,
    pub public_base_url: String,
    pub mail_delivery: MailDelivery,
    pub mail_spool_dir: PathBuf,
    pub log_filter: String,
    pub export_dir: PathBuf,
}

impl Config {
    /// Defaults rooted at `data_dir`
    pub fn defaults(data_dir: &Path) -> Self {
        Self {
            database_path: data_dir.join("openhouse.db"),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            mail_delivery: MailDelivery::default(),
            mail_spool_dir: data_dir.join("mail"),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            export_dir: data_dir.join("exports"),
        }
    }

    /// Load from the environment override or the platform config dir
    pub fn load() -> Result<Self> {
        let dirs = project_dirs()?;
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) => PathBuf::from(path),
            None => dirs.config_dir().join("config.toml"),
        };
        Self::load_from(&path, dirs.data_dir())
    }

    /// Parse `path` if it exists; missing keys fall back to defaults under `data_dir`
    pub fn load_from(path: &Path, data_dir: &Path) -> Result<Self> {
        let defaults = Self::defaults(data_dir);
        if !path.exists() {
            return Ok(defaults);
        }

        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)?;

        Ok(Self {
            database_path: file.database_path.unwrap_or(defaults.database_path),
            public_base_url: file.public_base_url.unwrap_or(defaults.public_base_url),
            mail_delivery: file.mail_delivery.unwrap_or(defaults.mail_delivery),
            mail_spool_dir: file.mail_spool_dir.unwrap_or(defaults.mail_spool_dir),
            log_filter: file.log_filter.unwrap_or(defaults.log_filter),
            export_dir: file.export_dir.unwrap_or(defaults.export_dir),
        })
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "openhouse", "openhouse").ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine data directory",
        )
        .into()
    })
}
