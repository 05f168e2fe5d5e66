//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::replica::DEFAULT_POLL_INTERVAL_SECS;
use crate::session::{DEFAULT_REFERER, DEFAULT_TOKEN_URL};
use crate::transport::{DEFAULT_DOWNLOAD_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS};

/// Catalog file name inside the config directory.
pub const DEFAULT_CATALOG_FILE: &str = "catalog.ini";

/// Archive directory name inside the config directory.
pub const DEFAULT_ARCHIVE_DIR: &str = "archives";

/// Log file name inside the config directory.
pub const DEFAULT_LOG_FILE: &str = "agol-backup.log";

/// Unbounded polling.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 0;

pub const DEFAULT_LOG_FAILURES: bool = false;

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = config_directory();
        Self {
            portal: PortalSettings {
                token_url: DEFAULT_TOKEN_URL.to_string(),
                referer: DEFAULT_REFERER.to_string(),
                services_url: None,
                username: None,
            },
            catalog: CatalogSettings {
                file: config_dir.join(DEFAULT_CATALOG_FILE),
            },
            archive: ArchiveSettings {
                directory: config_dir.join(DEFAULT_ARCHIVE_DIR),
            },
            polling: PollingSettings {
                interval_secs: DEFAULT_POLL_INTERVAL_SECS,
                max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            },
            ledger: LedgerSettings {
                log_failures: DEFAULT_LOG_FAILURES,
            },
            http: HttpSettings {
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            },
            logging: LoggingSettings {
                file: default_log_path(),
            },
        }
    }
}

/// Default log file location (~/.agol-backup/agol-backup.log).
pub fn default_log_path() -> PathBuf {
    config_directory().join(DEFAULT_LOG_FILE)
}
