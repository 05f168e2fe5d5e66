//! Whole-run orchestration.
//!
//! [`BackupRunner`] ties the pieces together for one run:
//!
//! 1. authenticate (fatal)
//! 2. list services (fatal)
//! 3. create the run directory and ledger
//! 4. for each catalog entry: resolve, submit, poll, download, archive and
//!    record; failures skip the entry, a rejected token triggers one
//!    re-authentication and one retry
//!
//! Progress is reported through [`RunObserver`].

mod error;
mod observer;
mod runner;

pub use error::{BackupError, EntryError, SkippedEntry};
pub use observer::{NoOpObserver, RunObserver};
pub use runner::{BackupOptions, BackupRunner, Resolution, RunSummary};
