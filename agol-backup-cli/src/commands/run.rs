//! Run command - back up every service in the catalog.

use std::path::PathBuf;
use std::time::Duration;

use agol_backup::backup::{BackupOptions, BackupRunner};
use agol_backup::replica::ThreadSleeper;
use tracing::info;

use super::common::{
    load_catalog, resolve_catalog_path, resolve_credentials, resolve_services_url, ConsoleObserver,
    PortalArgs,
};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the run command.
#[derive(Debug, Default)]
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub portal: PortalArgs,
    pub output: Option<PathBuf>,
    pub poll_interval: Option<u64>,
    pub max_poll_attempts: Option<u32>,
    /// Overrides `ledger.log_failures` from config.ini when set.
    pub log_failures: Option<bool>,
    pub debug: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.as_deref(), args.debug)?;
    runner.log_startup("run");
    let config = runner.config();

    let services_url = resolve_services_url(args.portal.services_url, config)?;
    let catalog_path = resolve_catalog_path(args.portal.catalog, config);
    let catalog = load_catalog(&catalog_path)?;

    let interval_secs = args.poll_interval.unwrap_or(config.polling.interval_secs);
    if interval_secs == 0 {
        return Err(CliError::Config(
            "--poll-interval must be at least 1 second".to_string(),
        ));
    }

    let options = BackupOptions::new(
        services_url,
        args.output
            .unwrap_or_else(|| config.archive.directory.clone()),
    )
    .with_token_url(config.portal.token_url.as_str())
    .with_referer(config.portal.referer.as_str())
    .with_poll_interval(Duration::from_secs(interval_secs))
    .with_max_poll_attempts(args.max_poll_attempts.unwrap_or(config.polling.max_attempts))
    .with_log_failures(args.log_failures.unwrap_or(config.ledger.log_failures));

    info!(
        catalog = %catalog_path.display(),
        entries = catalog.len(),
        archive_root = %options.archive_root.display(),
        "Starting backup"
    );

    let credentials = resolve_credentials(args.portal.username, config)?;
    let transport = runner.create_transport()?;
    let observer = ConsoleObserver;

    let backup = BackupRunner::new(&transport, &ThreadSleeper, options).with_observer(&observer);
    backup.run(&credentials, &catalog)?;

    Ok(())
}
