//! agol-backup CLI - Command-line interface
//!
//! This binary backs up ArcGIS Online feature services listed in a catalog
//! file to local File Geodatabase archives.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use commands::common::PortalArgs;
use commands::config::ConfigCommands;
use commands::resolve::ResolveArgs;
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "agol-backup")]
#[command(version = agol_backup::VERSION)]
#[command(about = "Back up ArcGIS Online feature services as File Geodatabases", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.agol-backup/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up every service in the catalog
    Run {
        #[command(flatten)]
        portal: PortalFlags,

        /// Archive root directory (a dated run directory is created inside)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Seconds between replica status checks
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Give up on a replica after this many status checks (0 = never)
        #[arg(long)]
        max_poll_attempts: Option<u32>,

        /// Also record skipped services in the run ledger
        #[arg(long, overrides_with = "no_log_failures")]
        log_failures: bool,

        /// Do not record skipped services, even if config.ini enables it
        #[arg(long, overrides_with = "log_failures")]
        no_log_failures: bool,

        /// Enable debug logging
        #[arg(long)]
        debug: bool,
    },

    /// Sign in and match catalog entries to live services without exporting
    Resolve {
        #[command(flatten)]
        portal: PortalFlags,

        /// Enable debug logging
        #[arg(long)]
        debug: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Flags shared by commands that sign in to the portal.
#[derive(Args)]
struct PortalFlags {
    /// Catalog file listing the services to back up
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// ArcGIS Online username (prompted for when not configured)
    #[arg(long)]
    username: Option<String>,

    /// Organization services root URL
    #[arg(long)]
    services_url: Option<String>,
}

impl From<PortalFlags> for PortalArgs {
    fn from(flags: PortalFlags) -> Self {
        PortalArgs {
            catalog: flags.catalog,
            username: flags.username,
            services_url: flags.services_url,
        }
    }
}

/// Collapse a `--flag` / `--no-flag` pair; `None` when neither was given.
fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            portal,
            output,
            poll_interval,
            max_poll_attempts,
            log_failures,
            no_log_failures,
            debug,
        } => commands::run::run(RunArgs {
            config: cli.config,
            portal: portal.into(),
            output,
            poll_interval,
            max_poll_attempts,
            log_failures: flag_pair(log_failures, no_log_failures),
            debug,
        }),
        Commands::Resolve { portal, debug } => commands::resolve::run(ResolveArgs {
            config: cli.config,
            portal: portal.into(),
            debug,
        }),
        Commands::Config { command } => commands::config::run(command, cli.config),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from([
            "agol-backup",
            "run",
            "--catalog",
            "services.ini",
            "--max-poll-attempts",
            "60",
            "--log-failures",
        ]);
        match cli.command {
            Commands::Run {
                portal,
                max_poll_attempts,
                log_failures,
                ..
            } => {
                assert_eq!(portal.catalog, Some(PathBuf::from("services.ini")));
                assert_eq!(max_poll_attempts, Some(60));
                assert!(log_failures);
            }
            _ => panic!("expected run command"),
        }
    }

    fn parsed_log_failures(args: &[&str]) -> Option<bool> {
        let cli = Cli::parse_from(args);
        match cli.command {
            Commands::Run {
                log_failures,
                no_log_failures,
                ..
            } => flag_pair(log_failures, no_log_failures),
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_log_failures_flag_pair() {
        assert_eq!(parsed_log_failures(&["agol-backup", "run"]), None);
        assert_eq!(
            parsed_log_failures(&["agol-backup", "run", "--log-failures"]),
            Some(true)
        );
        assert_eq!(
            parsed_log_failures(&["agol-backup", "run", "--no-log-failures"]),
            Some(false)
        );
        // Last one wins
        assert_eq!(
            parsed_log_failures(&["agol-backup", "run", "--log-failures", "--no-log-failures"]),
            Some(false)
        );
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["agol-backup", "config", "path", "--config", "/tmp/c.ini"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.ini")));
    }
}
