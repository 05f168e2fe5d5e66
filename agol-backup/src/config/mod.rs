//! User configuration stored in `~/.agol-backup/config.ini`.
//!
//! ```ini
//! [portal]
//! services_url = https://services1.arcgis.com/<org-id>/ArcGIS/rest/services
//! username = gis_admin
//!
//! [polling]
//! interval_secs = 5
//! max_attempts = 0
//! ```
//!
//! Missing keys fall back to the values in [`defaults`]; command-line flags
//! override both.

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    default_log_path, DEFAULT_ARCHIVE_DIR, DEFAULT_CATALOG_FILE, DEFAULT_LOG_FAILURES,
    DEFAULT_LOG_FILE, DEFAULT_MAX_POLL_ATTEMPTS,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use parser::expand_tilde;
pub use settings::{
    ArchiveSettings, CatalogSettings, ConfigFile, HttpSettings, LedgerSettings, LoggingSettings,
    PollingSettings, PortalSettings,
};
