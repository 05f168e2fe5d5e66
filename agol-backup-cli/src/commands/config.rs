//! Configuration management CLI commands.
//!
//! Provides `config init`, `config path` and `config show` for creating and
//! inspecting the configuration file.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use agol_backup::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Create a configuration file with default values
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration file path
    Path,

    /// Show the effective configuration
    Show,
}

/// Run a config subcommand against `config_path` (or the default location).
pub fn run(command: ConfigCommands, config_path: Option<PathBuf>) -> Result<(), CliError> {
    let path = config_path.unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Init { force } => run_init(&path, force),
        ConfigCommands::Path => run_path(&path),
        ConfigCommands::Show => run_show(&path),
    }
}

/// Write a default configuration file.
fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if force {
        ConfigFile::default().save_to(path)?;
        println!("Wrote default configuration to {}", path.display());
    } else if ConfigFile::ensure_exists_at(path)? {
        println!("Created configuration file: {}", path.display());
    } else {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    println!();
    println!("Next steps:");
    println!("  1. Set portal.services_url to your organization's services root");
    println!("  2. Create the catalog file listed under [catalog]");
    Ok(())
}

/// Show the configuration file path.
fn run_path(path: &Path) -> Result<(), CliError> {
    println!("{}", path.display());
    Ok(())
}

/// Print every effective setting, defaults included.
fn run_show(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;

    println!("Configuration: {}", path.display());
    if !path.exists() {
        println!("(file not found, showing defaults)");
    }
    println!();

    for (section, entries) in describe(&config) {
        println!("[{}]", section);
        for (key, value) in entries {
            if value.is_empty() {
                println!("  {} = (not set)", key);
            } else {
                println!("  {} = {}", key, value);
            }
        }
        println!();
    }
    Ok(())
}

type Section = (&'static str, Vec<(&'static str, String)>);

fn describe(config: &ConfigFile) -> Vec<Section> {
    let path = |p: &Path| p.display().to_string();
    vec![
        (
            "portal",
            vec![
                ("token_url", config.portal.token_url.clone()),
                ("referer", config.portal.referer.clone()),
                (
                    "services_url",
                    config.portal.services_url.clone().unwrap_or_default(),
                ),
                ("username", config.portal.username.clone().unwrap_or_default()),
            ],
        ),
        ("catalog", vec![("file", path(&config.catalog.file))]),
        ("archive", vec![("directory", path(&config.archive.directory))]),
        (
            "polling",
            vec![
                ("interval_secs", config.polling.interval_secs.to_string()),
                ("max_attempts", config.polling.max_attempts.to_string()),
            ],
        ),
        (
            "ledger",
            vec![("log_failures", config.ledger.log_failures.to_string())],
        ),
        (
            "http",
            vec![
                ("timeout_secs", config.http.timeout_secs.to_string()),
                (
                    "download_timeout_secs",
                    config.http.download_timeout_secs.to_string(),
                ),
            ],
        ),
        ("logging", vec![("file", path(&config.logging.file))]),
    ]
}
