//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and transport
//! creation to reduce duplication across command handlers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use agol_backup::config::{config_file_path, ConfigFile, DEFAULT_LOG_FILE};
use agol_backup::logging::{init_logging_full, LoggingGuard};
use agol_backup::transport::HttpTransport;
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    /// Where the configuration was loaded from
    config_path: PathBuf,
}

impl CliRunner {
    /// Create a runner, loading config from `config_path` (or the default
    /// location) and initializing logging.
    ///
    /// When stdout is a TTY, stdout logging is disabled so log lines do not
    /// interleave with progress output.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Alternate config file
    /// * `debug_mode` - When true, enables debug-level logging regardless of RUST_LOG
    pub fn new(config_path: Option<&Path>, debug_mode: bool) -> Result<Self, CliError> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?;

        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

        let stdout_enabled = !atty::is(atty::Stream::Stdout);

        let logging_guard = init_logging_full(&log_dir, &log_file, stdout_enabled, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("agol-backup v{}", agol_backup::VERSION);
        info!(config = %self.config_path.display(), "agol-backup CLI: {} command", command);
    }

    /// Create the HTTP transport with the configured timeouts.
    pub fn create_transport(&self) -> Result<HttpTransport, CliError> {
        let http = &self.config.http;
        Ok(HttpTransport::with_timeouts(
            Duration::from_secs(http.timeout_secs),
            Duration::from_secs(http.download_timeout_secs),
        )?)
    }
}
