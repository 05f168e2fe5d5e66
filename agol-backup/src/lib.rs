//! agol-backup - File Geodatabase backups of ArcGIS Online feature services
//!
//! This library authenticates against an ArcGIS portal, resolves a catalog of
//! hosted feature services by item id, exports each one as an asynchronous
//! replica, downloads the resulting archive and records the run in a ledger.
//!
//! # High-Level API
//!
//! For most use cases, the [`backup`] module drives a whole run:
//!
//! ```ignore
//! use agol_backup::backup::{BackupOptions, BackupRunner};
//! use agol_backup::catalog::Catalog;
//! use agol_backup::replica::ThreadSleeper;
//! use agol_backup::session::Credentials;
//! use agol_backup::transport::HttpTransport;
//!
//! let transport = HttpTransport::new()?;
//! let options = BackupOptions::new(services_url, "/mnt/backups");
//! let runner = BackupRunner::new(&transport, &ThreadSleeper, options);
//!
//! let summary = runner.run(&Credentials::new(user, password), &Catalog::load_from(path)?)?;
//! println!("Output Directory: {}", summary.run_directory.display());
//! ```

pub mod archive;
pub mod backup;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod ledger;
pub mod logging;
pub mod replica;
pub mod session;
pub mod transport;

/// Version of the agol-backup library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
