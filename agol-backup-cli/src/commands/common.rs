//! Common types and utilities shared across CLI commands.

use std::env;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use console::style;
use dialoguer::{Input, Password};

use agol_backup::backup::{RunObserver, RunSummary, SkippedEntry};
use agol_backup::catalog::{Catalog, CatalogEntry};
use agol_backup::config::ConfigFile;
use agol_backup::ledger::{ArchiveRecord, LEDGER_TIME_FORMAT};
use agol_backup::session::Credentials;

use crate::error::CliError;

/// Environment variable consulted before prompting for a password.
pub const PASSWORD_ENV: &str = "AGOL_PASSWORD";

/// Options shared by commands that talk to the portal.
#[derive(Debug, Default, Clone)]
pub struct PortalArgs {
    pub catalog: Option<PathBuf>,
    pub username: Option<String>,
    pub services_url: Option<String>,
}

/// Services root from the command line, falling back to config.ini.
pub fn resolve_services_url(
    cli_value: Option<String>,
    config: &ConfigFile,
) -> Result<String, CliError> {
    cli_value
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| config.portal.services_url.clone())
        .ok_or(CliError::MissingServicesUrl)
}

/// Catalog path from the command line, falling back to config.ini.
pub fn resolve_catalog_path(cli_value: Option<PathBuf>, config: &ConfigFile) -> PathBuf {
    cli_value.unwrap_or_else(|| config.catalog.file.clone())
}

pub fn load_catalog(path: &Path) -> Result<Catalog, CliError> {
    Catalog::load_from(path).map_err(|error| CliError::Catalog {
        path: path.to_path_buf(),
        error,
    })
}

/// Username from the command line, then config.ini, then a prompt. The
/// password comes from `AGOL_PASSWORD` or a hidden prompt.
pub fn resolve_credentials(
    cli_username: Option<String>,
    config: &ConfigFile,
) -> Result<Credentials, CliError> {
    let username = match cli_username.or_else(|| config.portal.username.clone()) {
        Some(username) => username,
        None => {
            println!("Enter your ArcGIS Online username.");
            Input::<String>::new()
                .with_prompt("Username")
                .interact_text()
                .map_err(|e| CliError::Prompt(e.to_string()))?
        }
    };

    let password = match env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => password,
        _ => {
            println!("Enter your ArcGIS Online password for <{}>", username);
            Password::new()
                .with_prompt("Password")
                .interact()
                .map_err(|e| CliError::Prompt(e.to_string()))?
        }
    };
    println!();

    Ok(Credentials::new(username, password))
}

/// Prints per-service progress in the layout operators are used to.
#[derive(Debug, Default)]
pub struct ConsoleObserver;

impl ConsoleObserver {
    fn format_time(time: DateTime<Local>) -> String {
        time.format(LEDGER_TIME_FORMAT).to_string()
    }
}

impl RunObserver for ConsoleObserver {
    fn run_started(&self, run_directory: &Path, entries: usize) {
        println!(
            "Backing up {} service(s) into {}",
            entries,
            run_directory.display()
        );
        println!();
    }

    fn entry_started(&self, entry: &CatalogEntry, start_time: DateTime<Local>) {
        println!("Creating replica for <{}>.", entry.service_name);
        println!("Start Time:  {}", Self::format_time(start_time));
    }

    fn entry_archived(&self, record: &ArchiveRecord) {
        println!("End Time:  {}", Self::format_time(record.end_time));
        println!("Time elapsed (seconds):  {}", record.elapsed_seconds());
        println!();
    }

    fn entry_skipped(&self, skipped: &SkippedEntry) {
        if skipped.error.is_not_found() {
            println!(
                "{}",
                style(format!(
                    "No live service matches <{}> ({})",
                    skipped.entry.service_name, skipped.entry.service_id
                ))
                .yellow()
            );
        } else {
            println!(
                "{}",
                style(format!("Failed request to <{}>", skipped.entry.service_name)).red()
            );
            println!("  {}", skipped.error);
        }
        println!("Skipping feature service.");
        println!();
    }

    fn reauthenticating(&self) {
        println!("Token rejected, signing in again...");
    }

    fn run_finished(&self, summary: &RunSummary) {
        if !summary.skipped.is_empty() {
            println!(
                "{}",
                style(format!(
                    "{} of {} service(s) skipped:",
                    summary.skipped.len(),
                    summary.attempted()
                ))
                .yellow()
            );
            for skipped in &summary.skipped {
                println!("  - {}", skipped.entry.service_name);
            }
            println!();
        }
        println!("Output Directory:  {}", summary.run_directory.display());
        println!("{}", style("Complete").green().bold());
    }
}
