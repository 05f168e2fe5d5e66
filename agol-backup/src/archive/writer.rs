//! Filesystem placement of downloaded archives.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::naming::{archive_file_name, next_available_name, run_directory_name};
use super::ArchiveError;

/// Create `<root>/<YYYY-MM-DD>`, or the next free `__N` variant when that
/// directory already exists. Missing parents of `root` are created too.
pub fn create_run_directory(root: &Path, date: NaiveDate) -> Result<PathBuf, ArchiveError> {
    let base = run_directory_name(date);
    let name = next_available_name(&base, |candidate| root.join(candidate).exists());
    let path = root.join(name);

    fs::create_dir_all(&path).map_err(|source| ArchiveError::CreateDirectory {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "Created run directory");
    Ok(path)
}

/// Writes archive streams into one run directory.
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    directory: PathBuf,
    run_timestamp: String,
}

impl ArchiveWriter {
    pub fn new(directory: impl Into<PathBuf>, run_timestamp: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            run_timestamp: run_timestamp.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn run_timestamp(&self) -> &str {
        &self.run_timestamp
    }

    /// `<directory>/<serviceName>__<runTimestamp>.zip`
    pub fn destination(&self, service_name: &str) -> PathBuf {
        self.directory
            .join(archive_file_name(service_name, &self.run_timestamp))
    }

    /// Stream `reader` to the destination for `service_name`.
    ///
    /// An existing file at the destination is deleted first. If the copy
    /// fails the partial file is removed and the error returned.
    pub fn write<R: Read + ?Sized>(
        &self,
        service_name: &str,
        reader: &mut R,
    ) -> Result<PathBuf, ArchiveError> {
        let path = self.destination(service_name);

        if path.exists() {
            debug!(path = %path.display(), "Removing existing archive");
            fs::remove_file(&path).map_err(|source| ArchiveError::RemoveExisting {
                path: path.clone(),
                source,
            })?;
        }

        match copy_to(&path, reader) {
            Ok(bytes) => {
                info!(path = %path.display(), bytes = bytes, "Archive written");
                Ok(path)
            }
            Err(source) => {
                if let Err(e) = fs::remove_file(&path) {
                    if e.kind() != io::ErrorKind::NotFound {
                        warn!(path = %path.display(), error = %e, "Failed to remove partial archive");
                    }
                }
                Err(ArchiveError::Write { path, source })
            }
        }
    }
}

fn copy_to<R: Read + ?Sized>(path: &Path, reader: &mut R) -> io::Result<u64> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let bytes = io::copy(reader, &mut writer)?;
    writer.flush()?;
    Ok(bytes)
}
