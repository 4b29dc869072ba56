//! Open House - guest registration for open-house showings
//!
//! Realtors manage properties, page settings and guest lists; visitors
//! register through a property's public link.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

mod clipboard;
mod commands;
mod config;
mod error;
mod mail_spool;
mod state;

use commands::guest::GuestFields;
use commands::public::{Target, VisitorFields};
use commands::settings::{ImageSlot, SettingsUpdate};
use commands::Session;
use config::Config;
use error::{AppError, Result};
use state::AppState;

#[derive(Parser)]
#[command(name = "openhouse")]
#[command(about = "Open-house guest registration", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a realtor account and sign in
    Signup {
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign in with email and password, or with an external provider
    Login {
        #[arg(required_unless_present = "with")]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        /// Provider name, e.g. "google"
        #[arg(long, conflicts_with = "password")]
        with: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Request a password reset email
    ResetPassword { email: String },

    /// Manage properties
    #[command(subcommand)]
    Property(PropertyCommand),

    /// View and edit the selected property's page settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Manage the selected property's guest list
    #[command(subcommand)]
    Guest(GuestCommand),

    /// Show a property's public page
    Page {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Register as a visitor through a public link
    Register {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        fields: VisitorFields,
    },

    /// Export the selected property's guests as CSV
    Export {
        /// Defaults to the configured export directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the selected property's public link
    Link {
        /// Also copy it to the clipboard
        #[arg(long)]
        copy: bool,
    },
}

#[derive(Subcommand)]
enum PropertyCommand {
    /// List properties; the selected one is marked with *
    List,
    /// Create a property and select it
    Create { name: String },
    /// Select a property by name or id
    Select { property: String },
    /// Delete a property with its settings and guests
    Delete {
        property: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Remove properties whose names repeat, keeping the oldest
    Dedupe,
}

#[derive(Subcommand)]
enum SettingsCommand {
    Show,
    /// Change text settings
    Set {
        #[arg(long)]
        welcome: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        realtor_name: Option<String>,
        #[arg(long)]
        realtor_email: Option<String>,
        /// File holding the thank-you email template
        #[arg(long)]
        template_file: Option<PathBuf>,
    },
    /// Upload an image; it is compressed to fit its size budget
    Image {
        #[arg(value_enum)]
        slot: ImageSlot,
        path: PathBuf,
    },
    /// Remove an image
    ClearImage {
        #[arg(value_enum)]
        slot: ImageSlot,
    },
    /// Shrink stored images that are over budget
    Recompress,
}

#[derive(Subcommand)]
enum GuestCommand {
    List,
    Add {
        #[command(flatten)]
        fields: GuestFields,
    },
    /// Edit a guest found by email or id
    Edit {
        guest: String,
        #[command(flatten)]
        fields: GuestFields,
    },
    Delete {
        guest: String,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(clap::Args)]
struct TargetArgs {
    /// Public link as shared by the realtor
    #[arg(long, conflicts_with_all = ["owner", "property"])]
    link: Option<String>,
    #[arg(long, required_unless_present = "link")]
    owner: Option<Uuid>,
    #[arg(long)]
    property: Option<Uuid>,
}

impl TargetArgs {
    fn into_target(self) -> Result<Target> {
        match (self.link, self.owner) {
            (Some(link), _) => Ok(Target::Link(link)),
            (None, Some(owner_id)) => Ok(Target::Ids {
                owner_id,
                property_id: self.property,
            }),
            (None, None) => Err(AppError::InvalidArgument(
                "Pass --link or --owner".to_string(),
            )),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(cli, config).await {
        tracing::error!(error = %e, "Command failed");
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let state = AppState::new(config)?;
    let mut session = Session::restore(&state)?;

    match cli.command {
        Commands::Signup { email, password } => {
            commands::auth::sign_up(&state, &mut session, &email, password)?;
        }
        Commands::Login {
            email,
            password,
            with,
        } => match (with, email) {
            (Some(provider), _) => {
                commands::auth::sign_in_with_provider(&state, &mut session, &provider).await?
            }
            (None, Some(email)) => {
                commands::auth::sign_in(&state, &mut session, &email, password).await?
            }
            (None, None) => {
                return Err(AppError::InvalidArgument(
                    "Pass an email or --with <provider>".to_string(),
                ))
            }
        },
        Commands::Logout => commands::auth::sign_out(&state, &mut session).await?,
        Commands::ResetPassword { email } => {
            commands::auth::reset_password(&session, &email).await?
        }

        Commands::Property(command) => match command {
            PropertyCommand::List => commands::property::list(&state, &mut session)?,
            PropertyCommand::Create { name } => {
                commands::property::create(&state, &mut session, &name)?
            }
            PropertyCommand::Select { property } => {
                commands::property::select(&state, &mut session, &property)?
            }
            PropertyCommand::Delete { property, yes } => {
                commands::property::delete(&state, &mut session, &property, yes)?
            }
            PropertyCommand::Dedupe => commands::property::dedupe(&state, &mut session)?,
        },

        Commands::Settings(command) => match command {
            SettingsCommand::Show => commands::settings::show(&state, &mut session)?,
            SettingsCommand::Set {
                welcome,
                address,
                realtor_name,
                realtor_email,
                template_file,
            } => {
                let email_template = match template_file {
                    Some(path) => Some(std::fs::read_to_string(path)?),
                    None => None,
                };
                let update = SettingsUpdate {
                    welcome_message: welcome,
                    property_address: address,
                    realtor_name,
                    realtor_email,
                    email_template,
                };
                if update.is_empty() {
                    return Err(AppError::InvalidArgument(
                        "Nothing to change; see `openhouse settings set --help`".to_string(),
                    ));
                }
                commands::settings::set(&state, &mut session, update)?
            }
            SettingsCommand::Image { slot, path } => {
                commands::settings::set_image(&state, &mut session, slot, &path)?
            }
            SettingsCommand::ClearImage { slot } => {
                commands::settings::clear_image(&state, &mut session, slot)?
            }
            SettingsCommand::Recompress => commands::settings::recompress(&state, &mut session)?,
        },

        Commands::Guest(command) => match command {
            GuestCommand::List => commands::guest::list(&state, &mut session)?,
            GuestCommand::Add { fields } => commands::guest::add(&state, &mut session, fields)?,
            GuestCommand::Edit { guest, fields } => {
                commands::guest::edit(&state, &mut session, &guest, fields)?
            }
            GuestCommand::Delete { guest, yes } => {
                commands::guest::delete(&state, &mut session, &guest, yes)?
            }
        },

        Commands::Page { target } => {
            commands::public::show_page(&state, &target.into_target()?)?
        }
        Commands::Register { target, fields } => {
            commands::public::register(&state, &target.into_target()?, fields.into()).await?
        }
        Commands::Export { output } => {
            commands::public::export(&state, &mut session, output)?;
        }
        Commands::Link { copy } => {
            commands::public::link(&state, &mut session, copy)?;
        }
    }

    Ok(())
}
