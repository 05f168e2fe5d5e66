//! Sequential backup of every catalog entry.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use tracing::{info, warn};

use super::{BackupError, EntryError, NoOpObserver, RunObserver, SkippedEntry};
use crate::archive::{create_run_directory, run_timestamp, ArchiveWriter};
use crate::catalog::{Catalog, CatalogEntry};
use crate::directory::{DirectoryError, ResolvedService, ServiceDirectory};
use crate::ledger::{ArchiveRecord, FailureRecord, RunLog};
use crate::replica::{
    tokenized_result_url, PollPolicy, ReplicaJob, ReplicaJobController, Sleeper,
};
use crate::session::{Credentials, Session, SessionManager, DEFAULT_REFERER, DEFAULT_TOKEN_URL};
use crate::transport::Transport;

/// Settings for one backup run.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupOptions {
    pub token_url: String,
    pub referer: String,
    pub services_url: String,
    /// Root that receives the dated run directory.
    pub archive_root: PathBuf,
    pub poll_policy: PollPolicy,
    pub log_failures: bool,
}

impl BackupOptions {
    pub fn new(services_url: impl Into<String>, archive_root: impl Into<PathBuf>) -> Self {
        Self {
            token_url: DEFAULT_TOKEN_URL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            services_url: services_url.into(),
            archive_root: archive_root.into(),
            poll_policy: PollPolicy::default(),
            log_failures: false,
        }
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_policy.interval = interval;
        self
    }

    /// Bound the number of status requests per job. 0 means unbounded.
    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.poll_policy = self.poll_policy.with_max_attempts(attempts);
        self
    }

    pub fn with_log_failures(mut self, log_failures: bool) -> Self {
        self.log_failures = log_failures;
        self
    }
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunSummary {
    pub run_directory: PathBuf,
    pub ledger_path: PathBuf,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub archived: Vec<ArchiveRecord>,
    pub skipped: Vec<SkippedEntry>,
}

impl RunSummary {
    pub fn attempted(&self) -> usize {
        self.archived.len() + self.skipped.len()
    }

    pub fn all_archived(&self) -> bool {
        self.skipped.is_empty()
    }

    /// The archive record for `service_name`, if it was archived.
    pub fn archived_service(&self, service_name: &str) -> Option<&ArchiveRecord> {
        self.archived
            .iter()
            .find(|r| r.service_name == service_name)
    }
}

/// Outcome of resolving one catalog entry without exporting it.
#[derive(Debug)]
pub struct Resolution {
    pub entry: CatalogEntry,
    pub result: Result<ResolvedService, DirectoryError>,
}

/// Drives authentication, lookup, export, archiving and the ledger for a
/// whole catalog, one entry at a time.
///
/// A failing entry is recorded and skipped; only authentication, the
/// service listing, the run directory and the ledger can abort a run.
pub struct BackupRunner<'a, T: Transport, S: Sleeper> {
    transport: &'a T,
    sleeper: &'a S,
    options: BackupOptions,
    observer: &'a dyn RunObserver,
}

impl<'a, T: Transport, S: Sleeper> BackupRunner<'a, T, S> {
    pub fn new(transport: &'a T, sleeper: &'a S, options: BackupOptions) -> Self {
        Self {
            transport,
            sleeper,
            options,
            observer: &NoOpObserver,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn RunObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn options(&self) -> &BackupOptions {
        &self.options
    }

    /// Back up every entry of `catalog`.
    ///
    /// Nothing is written to disk unless authentication and the service
    /// listing succeed.
    pub fn run(
        &self,
        credentials: &Credentials,
        catalog: &Catalog,
    ) -> Result<RunSummary, BackupError> {
        let sessions = self.session_manager(credentials);
        let mut session = sessions.authenticate()?;

        let mut directory = ServiceDirectory::new(self.transport, &self.options.services_url);
        directory
            .list_services(&session)
            .map_err(BackupError::Listing)?;

        let started_at = Local::now();
        let timestamp = run_timestamp(&started_at);
        let run_directory = create_run_directory(&self.options.archive_root, started_at.date_naive())?;
        let writer = ArchiveWriter::new(&run_directory, &timestamp);
        let mut ledger = RunLog::create(&run_directory, &timestamp, self.options.log_failures)?;
        let controller =
            ReplicaJobController::new(self.transport, self.sleeper, self.options.poll_policy);

        info!(
            run_directory = %run_directory.display(),
            entries = catalog.len(),
            "Backup run started"
        );
        self.observer.run_started(&run_directory, catalog.len());

        let mut archived = Vec::new();
        let mut skipped = Vec::new();

        for entry in catalog.iter() {
            if session.is_expired(Utc::now()) {
                info!("Session token expired, re-authenticating");
                session = self.reauthenticate(&sessions)?;
            }

            let start_time = Local::now();
            self.observer.entry_started(entry, start_time);

            let mut in_flight = None;
            let mut outcome = self.export_entry(
                &session,
                &mut directory,
                &controller,
                &writer,
                entry,
                start_time,
                &mut in_flight,
            );
            if matches!(&outcome, Err(e) if e.is_token_expired()) {
                warn!(
                    service = %entry.service_name,
                    resuming = in_flight.is_some(),
                    "Token rejected, re-authenticating and retrying"
                );
                session = self.reauthenticate(&sessions)?;
                outcome = self.export_entry(
                    &session,
                    &mut directory,
                    &controller,
                    &writer,
                    entry,
                    start_time,
                    &mut in_flight,
                );
            }

            match outcome {
                Ok(record) => {
                    ledger.append(&record)?;
                    info!(
                        service = %record.service_name,
                        seconds = record.elapsed_seconds(),
                        path = %record.destination_path.display(),
                        "Service archived"
                    );
                    self.observer.entry_archived(&record);
                    archived.push(record);
                }
                Err(error) => {
                    warn!(service = %entry.service_name, error = %error, "Service skipped");
                    ledger.append_failure(&FailureRecord {
                        service_name: entry.service_name.clone(),
                        start_time,
                        end_time: Local::now(),
                        reason: error.to_string(),
                    })?;
                    let skipped_entry = SkippedEntry {
                        entry: entry.clone(),
                        error,
                    };
                    self.observer.entry_skipped(&skipped_entry);
                    skipped.push(skipped_entry);
                }
            }
        }

        let summary = RunSummary {
            run_directory,
            ledger_path: ledger.path().to_path_buf(),
            started_at,
            finished_at: Local::now(),
            archived,
            skipped,
        };
        info!(
            archived = summary.archived.len(),
            skipped = summary.skipped.len(),
            "Backup run finished"
        );
        self.observer.run_finished(&summary);
        Ok(summary)
    }

    /// Authenticate and resolve every entry without exporting anything.
    pub fn resolve_catalog(
        &self,
        credentials: &Credentials,
        catalog: &Catalog,
    ) -> Result<Vec<Resolution>, BackupError> {
        let sessions = self.session_manager(credentials);
        let mut session = sessions.authenticate()?;

        let mut directory = ServiceDirectory::new(self.transport, &self.options.services_url);
        directory
            .list_services(&session)
            .map_err(BackupError::Listing)?;

        let mut resolutions = Vec::with_capacity(catalog.len());
        for entry in catalog.iter() {
            let mut result = directory.resolve(&session, &entry.service_id);
            if matches!(&result, Err(e) if e.is_token_rejected()) {
                session = self.reauthenticate(&sessions)?;
                result = directory.resolve(&session, &entry.service_id);
            }
            resolutions.push(Resolution {
                entry: entry.clone(),
                result,
            });
        }
        Ok(resolutions)
    }

    fn session_manager(&self, credentials: &Credentials) -> SessionManager<'a, T> {
        SessionManager::new(
            self.transport,
            self.options.token_url.as_str(),
            self.options.referer.as_str(),
            credentials.clone(),
        )
    }

    fn reauthenticate(&self, sessions: &SessionManager<'a, T>) -> Result<Session, BackupError> {
        self.observer.reauthenticating();
        Ok(sessions.authenticate()?)
    }

    /// Export one entry. `in_flight` holds a job accepted by the server
    /// whose polling or download was cut short by a rejected token; when set,
    /// that job is resumed instead of submitting another replica.
    #[allow(clippy::too_many_arguments)]
    fn export_entry(
        &self,
        session: &Session,
        directory: &mut ServiceDirectory<'a, T>,
        controller: &ReplicaJobController<'a, T, S>,
        writer: &ArchiveWriter,
        entry: &CatalogEntry,
        start_time: DateTime<Local>,
        in_flight: &mut Option<ReplicaJob>,
    ) -> Result<ArchiveRecord, EntryError> {
        let mut job = match in_flight.take() {
            Some(job) => job,
            None => {
                let service = directory.resolve(session, &entry.service_id)?;
                let job = controller.submit(session, &service)?;
                self.observer.replica_submitted(entry, &job);
                job
            }
        };

        let result = self.finish_job(session, controller, writer, entry, start_time, &mut job);
        if matches!(&result, Err(e) if e.is_token_expired()) {
            *in_flight = Some(job);
        }
        result
    }

    fn finish_job(
        &self,
        session: &Session,
        controller: &ReplicaJobController<'a, T, S>,
        writer: &ArchiveWriter,
        entry: &CatalogEntry,
        start_time: DateTime<Local>,
        job: &mut ReplicaJob,
    ) -> Result<ArchiveRecord, EntryError> {
        controller.resume(session, job)?;

        let mut stream = controller.fetch(session, job)?;
        let destination_path = writer.write(&entry.service_name, &mut stream)?;

        Ok(ArchiveRecord {
            destination_path,
            service_name: entry.service_name.clone(),
            start_time,
            end_time: Local::now(),
            result_url: tokenized_result_url(job.result_url().unwrap_or_default(), session.token()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let options = BackupOptions::new("https://example.com/rest/services", "/backups");

        assert_eq!(options.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(options.referer, DEFAULT_REFERER);
        assert_eq!(options.poll_policy, PollPolicy::default());
        assert!(!options.log_failures);
    }

    #[test]
    fn test_options_builder() {
        let options = BackupOptions::new("https://example.com/rest/services", "/backups")
            .with_poll_interval(Duration::from_secs(10))
            .with_max_poll_attempts(30)
            .with_log_failures(true);

        assert_eq!(options.poll_policy.interval, Duration::from_secs(10));
        assert_eq!(options.poll_policy.max_attempts, Some(30));
        assert!(options.log_failures);

        let unbounded = options.with_max_poll_attempts(0);
        assert_eq!(unbounded.poll_policy.max_attempts, None);
    }
}
