//! Per-run audit ledger.
//!
//! A plain comma-separated text file in the run directory, one line per
//! archived service:
//!
//! ```text
//! ServiceName, StartTime, EndTime, SecondsElapsed, ReplicaURL
//! Parcels, 05-01-2024 09:30:12 AM, 05-01-2024 09:31:40 AM, 88, https://.../Parcels.zip?token=...
//! ```
//!
//! With failure logging enabled a trailing `Status` column is added and
//! skipped services are recorded too.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::debug;

/// Timestamp format used for the start and end columns.
pub const LEDGER_TIME_FORMAT: &str = "%m-%d-%Y %H:%M:%S %p";

const HEADER: &str = "ServiceName, StartTime, EndTime, SecondsElapsed, ReplicaURL";
const STATUS_HEADER: &str = ", Status";
const STATUS_COMPLETED: &str = "Completed";

/// Ledger file name for a run timestamp, e.g. `log_2024-05-01_0930.txt`.
pub fn ledger_file_name(run_timestamp: &str) -> String {
    format!("log_{}.txt", run_timestamp)
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Failed to create ledger {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to append to ledger {path}: {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A successfully archived service.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveRecord {
    pub destination_path: PathBuf,
    pub service_name: String,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    /// Result URL as written to the ledger, token attached.
    pub result_url: String,
}

impl ArchiveRecord {
    /// Whole seconds between start and end, never negative.
    pub fn elapsed_seconds(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds().max(0)
    }
}

/// A service that was attempted but not archived.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureRecord {
    pub service_name: String,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    pub reason: String,
}

impl FailureRecord {
    pub fn elapsed_seconds(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds().max(0)
    }
}

/// Append-only ledger with a single writer.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    log_failures: bool,
    entries: usize,
}

impl RunLog {
    /// Create the ledger in `directory` and write its header line.
    pub fn create(
        directory: &Path,
        run_timestamp: &str,
        log_failures: bool,
    ) -> Result<Self, LedgerError> {
        let path = directory.join(ledger_file_name(run_timestamp));
        let mut header = HEADER.to_string();
        if log_failures {
            header.push_str(STATUS_HEADER);
        }

        File::create(&path)
            .and_then(|mut file| writeln!(file, "{}", header))
            .map_err(|source| LedgerError::Create {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), log_failures = log_failures, "Created run ledger");
        Ok(Self {
            path,
            log_failures,
            entries: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn logs_failures(&self) -> bool {
        self.log_failures
    }

    /// Number of lines appended after the header.
    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn append(&mut self, record: &ArchiveRecord) -> Result<(), LedgerError> {
        let mut line = format!(
            "{}, {}, {}, {}, {}",
            record.service_name,
            record.start_time.format(LEDGER_TIME_FORMAT),
            record.end_time.format(LEDGER_TIME_FORMAT),
            record.elapsed_seconds(),
            record.result_url
        );
        if self.log_failures {
            line.push_str(", ");
            line.push_str(STATUS_COMPLETED);
        }
        self.write_line(&line)
    }

    /// Record a skipped service. Does nothing unless failure logging is on.
    pub fn append_failure(&mut self, record: &FailureRecord) -> Result<(), LedgerError> {
        if !self.log_failures {
            return Ok(());
        }
        let line = format!(
            "{}, {}, {}, {}, , Failed: {}",
            record.service_name,
            record.start_time.format(LEDGER_TIME_FORMAT),
            record.end_time.format(LEDGER_TIME_FORMAT),
            record.elapsed_seconds(),
            sanitize_reason(&record.reason)
        );
        self.write_line(&line)
    }

    fn write_line(&mut self, line: &str) -> Result<(), LedgerError> {
        OpenOptions::new()
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{}", line))
            .map_err(|source| LedgerError::Append {
                path: self.path.clone(),
                source,
            })?;
        self.entries += 1;
        Ok(())
    }
}

/// Keep a failure reason on one ledger column.
fn sanitize_reason(reason: &str) -> String {
    reason
        .chars()
        .map(|c| match c {
            ',' => ';',
            '\n' | '\r' => ' ',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::fs;
    use tempfile::TempDir;

    fn start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 12).unwrap()
    }

    fn record() -> ArchiveRecord {
        ArchiveRecord {
            destination_path: PathBuf::from("/tmp/Parcels__2024-05-01_0930.zip"),
            service_name: "Parcels".to_string(),
            start_time: start(),
            end_time: start() + Duration::seconds(88),
            result_url: "https://example.com/r.zip?token=tok".to_string(),
        }
    }

    fn failure() -> FailureRecord {
        FailureRecord {
            service_name: "Roads".to_string(),
            start_time: start(),
            end_time: start() + Duration::seconds(3),
            reason: "Replica job failed, status Failed".to_string(),
        }
    }

    fn lines(log: &RunLog) -> Vec<String> {
        fs::read_to_string(log.path())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_ledger_file_name() {
        assert_eq!(ledger_file_name("2024-05-01_0930"), "log_2024-05-01_0930.txt");
    }

    #[test]
    fn test_header_and_success_line() {
        let dir = TempDir::new().unwrap();
        let mut log = RunLog::create(dir.path(), "2024-05-01_0930", false).unwrap();
        log.append(&record()).unwrap();

        let lines = lines(&log);
        assert_eq!(lines[0], HEADER);
        assert_eq!(
            lines[1],
            "Parcels, 05-01-2024 09:30:12 AM, 05-01-2024 09:31:40 AM, 88, https://example.com/r.zip?token=tok"
        );
        assert_eq!(log.entries(), 1);
    }

    #[test]
    fn test_failures_ignored_by_default() {
        let dir = TempDir::new().unwrap();
        let mut log = RunLog::create(dir.path(), "2024-05-01_0930", false).unwrap();
        log.append_failure(&failure()).unwrap();

        assert_eq!(lines(&log).len(), 1);
        assert_eq!(log.entries(), 0);
    }

    #[test]
    fn test_failure_logging_adds_status_column() {
        let dir = TempDir::new().unwrap();
        let mut log = RunLog::create(dir.path(), "2024-05-01_0930", true).unwrap();
        log.append(&record()).unwrap();
        log.append_failure(&failure()).unwrap();

        let lines = lines(&log);
        assert!(lines[0].ends_with(", Status"));
        assert!(lines[1].ends_with(", Completed"));
        assert_eq!(
            lines[2],
            "Roads, 05-01-2024 09:30:12 AM, 05-01-2024 09:30:15 AM, 3, , Failed: Replica job failed; status Failed"
        );
    }

    #[test]
    fn test_elapsed_never_negative() {
        let mut r = record();
        r.end_time = r.start_time - Duration::seconds(5);
        assert_eq!(r.elapsed_seconds(), 0);
    }
}
