//! Visitor-facing commands and sharing

use std::path::{Path, PathBuf};

use chrono::Local;
use clap::Args;
use openhouse_core::export::export_filename;
use openhouse_core::{BrokerInfo, PublicLink, RegistrationService, Submission};
use tracing::info;
use uuid::Uuid;

use super::{with_dashboard, Session};
use crate::clipboard::copy_to_clipboard;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Where a visitor's page comes from
#[derive(Debug, Clone)]
pub enum Target {
    Link(String),
    Ids {
        owner_id: Uuid,
        property_id: Option<Uuid>,
    },
}

impl Target {
    fn resolve(&self) -> Result<PublicLink> {
        match self {
            Target::Link(link) => Ok(PublicLink::parse(link)?),
            Target::Ids {
                owner_id,
                property_id,
            } => Ok(PublicLink::new(*owner_id, *property_id)),
        }
    }
}

/// Print what a visitor would see
pub fn show_page(state: &AppState, target: &Target) -> Result<()> {
    let link = target.resolve()?;
    let db = state.db()?;
    let queue = state.mail_queue();
    let page = RegistrationService::new(&*db, &*queue).load_page(link.owner_id, link.property_id)?;

    println!("{}", page.settings.welcome_message);
    println!("{}", page.address());
    if !page.settings.realtor_name.is_empty() {
        println!("Hosted by {}", page.settings.realtor_name);
    }
    Ok(())
}

pub async fn register(state: &AppState, target: &Target, submission: Submission) -> Result<()> {
    let link = target.resolve()?;
    let queue = state.mail_queue();

    // the database lock is released before waiting on the queue
    let pending = {
        let db = state.db()?;
        let service = RegistrationService::new(&*db, &*queue);
        service.accept_at(link.owner_id, link.property_id, &submission)?
    };
    let outcome = pending.send(&*queue).await;

    println!("Thank you for registering, {}!", outcome.guest.first_name);
    if let Some(warning) = outcome.email_warning {
        println!("{}", warning);
    }
    Ok(())
}

/// Registration form answers as command-line options
#[derive(Debug, Clone, Args)]
pub struct VisitorFields {
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: String,
    /// "yes" or "no"
    #[arg(long)]
    pub do_not_call: String,
    /// "yes" or "no"
    #[arg(long)]
    pub agency_agreement: String,
    #[arg(long)]
    pub broker_name: Option<String>,
    #[arg(long)]
    pub company_name: Option<String>,
}

impl From<VisitorFields> for Submission {
    fn from(fields: VisitorFields) -> Self {
        Submission {
            first_name: fields.first_name,
            last_name: fields.last_name,
            email: fields.email,
            phone: fields.phone,
            do_not_call: fields.do_not_call,
            has_agency_agreement: fields.agency_agreement,
            broker: BrokerInfo {
                broker_name: fields.broker_name.unwrap_or_default(),
                company_name: fields.company_name.unwrap_or_default(),
            },
        }
    }
}

/// Write the selected property's guests to CSV. Returns the file written.
pub fn export(state: &AppState, session: &mut Session, output: Option<PathBuf>) -> Result<PathBuf> {
    let path = match output {
        Some(path) => path,
        None => state
            .config
            .export_dir
            .join(export_filename(Local::now().date_naive())),
    };

    let csv = with_dashboard(state, session, |dashboard| {
        if dashboard.state().active_property().is_none() {
            return Err(openhouse_core::Error::NotFound("selected property".into()).into());
        }
        Ok(dashboard.export_csv()?)
    })?;

    write_export(&path, &csv)?;
    info!(path = %path.display(), "Guest list exported");
    println!("Exported guests to {}", path.display());
    Ok(path)
}

fn write_export(path: &Path, csv: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, csv)?;
    Ok(())
}

/// Print (and optionally copy) the visitor link of the selected property
pub fn link(state: &AppState, session: &mut Session, copy: bool) -> Result<String> {
    let url = with_dashboard(state, session, |dashboard| {
        Ok(dashboard.public_link(&state.config.public_base_url)?)
    })?;

    println!("{}", url);
    if copy {
        match copy_to_clipboard(&url) {
            Ok(()) => println!("Link copied to clipboard."),
            Err(AppError::Clipboard(reason)) => {
                println!("Could not copy automatically ({}). Copy the link above.", reason)
            }
            Err(e) => return Err(e),
        }
    }
    Ok(url)
}
