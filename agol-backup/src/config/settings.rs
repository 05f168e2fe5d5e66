//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Portal endpoints and account
    pub portal: PortalSettings,
    /// Service catalog location
    pub catalog: CatalogSettings,
    /// Archive output location
    pub archive: ArchiveSettings,
    /// Replica status polling
    pub polling: PollingSettings,
    /// Run ledger behavior
    pub ledger: LedgerSettings,
    /// HTTP client settings
    pub http: HttpSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Portal configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalSettings {
    /// Token endpoint (`generateToken`).
    pub token_url: String,
    /// Referer sent with the token request.
    pub referer: String,
    /// Organization services root, e.g.
    /// `https://services1.arcgis.com/<org>/ArcGIS/rest/services`.
    /// Required before a run can start.
    pub services_url: Option<String>,
    /// Account name. Prompted for when unset.
    pub username: Option<String>,
}

/// Catalog configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSettings {
    /// Path to the catalog INI file.
    pub file: PathBuf,
}

/// Archive configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveSettings {
    /// Root directory that receives one dated directory per run.
    pub directory: PathBuf,
}

/// Polling configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PollingSettings {
    /// Seconds between status requests.
    pub interval_secs: u64,
    /// Maximum status requests per job. 0 polls until the job finishes.
    pub max_attempts: u32,
}

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSettings {
    /// Also record skipped services in the ledger.
    pub log_failures: bool,
}

/// HTTP configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpSettings {
    /// Timeout in seconds for JSON requests.
    pub timeout_secs: u64,
    /// Timeout in seconds for archive downloads.
    pub download_timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
