//! Run-level and per-entry error types.

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::catalog::CatalogEntry;
use crate::directory::DirectoryError;
use crate::ledger::LedgerError;
use crate::replica::ReplicaError;
use crate::session::AuthenticationError;

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Initial authentication or a mid-run re-authentication failed.
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    /// The services root could not be listed.
    #[error(transparent)]
    Listing(DirectoryError),

    /// The run directory could not be created.
    #[error(transparent)]
    RunDirectory(#[from] ArchiveError),

    /// The ledger could not be created or appended to.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Why one catalog entry was not archived.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Replica(#[from] ReplicaError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl EntryError {
    /// True when the portal rejected the session token.
    pub fn is_token_expired(&self) -> bool {
        match self {
            EntryError::Directory(e) => e.is_token_rejected(),
            EntryError::Replica(e) => e.is_token_expired(),
            EntryError::Archive(_) => false,
        }
    }

    /// True when the entry has no live counterpart.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EntryError::Directory(DirectoryError::NotFound { .. }))
    }
}

/// A catalog entry that was skipped, with its cause.
#[derive(Debug)]
pub struct SkippedEntry {
    pub entry: CatalogEntry,
    pub error: EntryError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{TransportError, INVALID_TOKEN_CODE};

    fn rejected() -> TransportError {
        TransportError::Remote {
            url: "https://example.com".to_string(),
            code: INVALID_TOKEN_CODE,
            message: "Invalid token.".to_string(),
        }
    }

    #[test]
    fn test_token_expiry_detection() {
        let e = EntryError::from(ReplicaError::TokenExpired {
            stage: "polling",
            source: rejected(),
        });
        assert!(e.is_token_expired());

        let e = EntryError::from(DirectoryError::TokenRejected(rejected()));
        assert!(e.is_token_expired());

        let e = EntryError::from(DirectoryError::NotFound {
            service_id: "abc".to_string(),
        });
        assert!(!e.is_token_expired());
        assert!(e.is_not_found());
    }
}
