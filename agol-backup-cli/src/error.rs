//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use agol_backup::backup::BackupError;
use agol_backup::catalog::CatalogError;
use agol_backup::config::ConfigFileError;
use agol_backup::transport::TransportError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Config file could not be read or written
    ConfigFile(ConfigFileError),
    /// No services root configured
    MissingServicesUrl,
    /// Catalog file could not be loaded
    Catalog { path: PathBuf, error: CatalogError },
    /// Interactive prompt failed
    Prompt(String),
    /// HTTP client could not be created
    Transport(TransportError),
    /// The backup run aborted
    Backup(BackupError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Backup(BackupError::Authentication(_)) => {
                eprintln!();
                eprintln!("Check your username and password.");
                eprintln!("If your organization signs in through its own portal, set");
                eprintln!("portal.token_url and portal.referer in config.ini.");
            }
            CliError::MissingServicesUrl => {
                eprintln!();
                eprintln!("Set portal.services_url in config.ini or pass --services-url, e.g.");
                eprintln!("  https://services1.arcgis.com/<org-id>/ArcGIS/rest/services");
            }
            CliError::Catalog { .. } => {
                eprintln!();
                eprintln!("The catalog lists one [service] section per feature service:");
                eprintln!("  [service]");
                eprintln!("  service_id = <item id>");
                eprintln!("  service_name = Parcels");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "Configuration error: {}", e),
            CliError::MissingServicesUrl => write!(f, "No services URL configured"),
            CliError::Catalog { path, error } => {
                write!(f, "Failed to load catalog '{}': {}", path.display(), error)
            }
            CliError::Prompt(msg) => write!(f, "Prompt failed: {}", msg),
            CliError::Transport(e) => write!(f, "{}", e),
            CliError::Backup(e) => write!(f, "Backup aborted: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Catalog { error, .. } => Some(error),
            CliError::Transport(e) => Some(e),
            CliError::Backup(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<BackupError> for CliError {
    fn from(e: BackupError) -> Self {
        CliError::Backup(e)
    }
}

impl From<TransportError> for CliError {
    fn from(e: TransportError) -> Self {
        CliError::Transport(e)
    }
}
