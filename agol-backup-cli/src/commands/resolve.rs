//! Resolve command - check that every catalog entry matches a live service.

use std::path::PathBuf;

use agol_backup::backup::{BackupOptions, BackupRunner};
use agol_backup::replica::ThreadSleeper;
use console::style;

use super::common::{
    load_catalog, resolve_catalog_path, resolve_credentials, resolve_services_url, PortalArgs,
};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the resolve command.
#[derive(Debug, Default)]
pub struct ResolveArgs {
    pub config: Option<PathBuf>,
    pub portal: PortalArgs,
    pub debug: bool,
}

/// Run the resolve command.
///
/// Signs in and looks up each entry without requesting any replica.
pub fn run(args: ResolveArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.as_deref(), args.debug)?;
    runner.log_startup("resolve");
    let config = runner.config();

    let services_url = resolve_services_url(args.portal.services_url, config)?;
    let catalog = load_catalog(&resolve_catalog_path(args.portal.catalog, config))?;
    let credentials = resolve_credentials(args.portal.username, config)?;
    let transport = runner.create_transport()?;

    let options = BackupOptions::new(services_url, config.archive.directory.clone())
        .with_token_url(config.portal.token_url.as_str())
        .with_referer(config.portal.referer.as_str());
    let backup = BackupRunner::new(&transport, &ThreadSleeper, options);

    let resolutions = backup.resolve_catalog(&credentials, &catalog)?;
    let mut unresolved = 0;
    for resolution in &resolutions {
        match &resolution.result {
            Ok(service) => println!(
                "{} {} -> {} (layers: {})",
                style("OK").green(),
                resolution.entry.service_name,
                service.endpoint_url,
                join_ids(&service.live_layer_ids)
            ),
            Err(e) => {
                unresolved += 1;
                println!(
                    "{} {}: {}",
                    style("--").red(),
                    resolution.entry.service_name,
                    e
                );
            }
        }
    }

    println!();
    println!(
        "{} of {} catalog entries resolved",
        resolutions.len() - unresolved,
        resolutions.len()
    );
    Ok(())
}

fn join_ids(ids: &[u32]) -> String {
    ids.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_ids() {
        assert_eq!(join_ids(&[0, 3, 7]), "0,3,7");
        assert_eq!(join_ids(&[]), "");
    }
}
