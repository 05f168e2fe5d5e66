//! Progress callbacks for a backup run.

use std::path::Path;

use chrono::{DateTime, Local};

use super::{RunSummary, SkippedEntry};
use crate::catalog::CatalogEntry;
use crate::ledger::ArchiveRecord;
use crate::replica::ReplicaJob;

/// Receives progress events from [`super::BackupRunner`].
///
/// Every method has an empty default so implementors only override what
/// they display.
pub trait RunObserver {
    /// The run directory and ledger exist; entries are about to be processed.
    fn run_started(&self, _run_directory: &Path, _entries: usize) {}

    fn entry_started(&self, _entry: &CatalogEntry, _start_time: DateTime<Local>) {}

    /// The replica job was accepted and polling is about to start.
    fn replica_submitted(&self, _entry: &CatalogEntry, _job: &ReplicaJob) {}

    fn entry_archived(&self, _record: &ArchiveRecord) {}

    fn entry_skipped(&self, _skipped: &SkippedEntry) {}

    /// The portal rejected the token and a new one is being requested.
    fn reauthenticating(&self) {}

    fn run_finished(&self, _summary: &RunSummary) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpObserver;

impl RunObserver for NoOpObserver {}
