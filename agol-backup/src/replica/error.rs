//! Replica error types.

use thiserror::Error;

use super::JobState;
use crate::transport::TransportError;

/// Errors that can occur while exporting a replica.
///
/// All variants are per-service: the caller skips the entry and moves on.
#[derive(Debug, Error)]
pub enum ReplicaError {
    /// The `createReplica` call failed.
    #[error("Replica request for {service} failed: {source}")]
    Submission {
        service: String,
        #[source]
        source: TransportError,
    },

    /// `createReplica` answered without a status URL.
    #[error("Replica request for {service} returned no statusUrl")]
    MissingStatusUrl { service: String },

    /// A status request failed.
    #[error("Status check for {replica} failed: {source}")]
    Poll {
        replica: String,
        #[source]
        source: TransportError,
    },

    /// The remote job reported failure.
    #[error("Replica job {replica} reported status '{status}'")]
    JobFailed { replica: String, status: String },

    /// The job did not complete within the configured number of polls.
    #[error("Replica job {replica} did not complete after {attempts} status checks")]
    Timeout { replica: String, attempts: u32 },

    /// A completed job had no result URL.
    #[error("Replica job {replica} completed without a resultUrl")]
    MissingResultUrl { replica: String },

    /// The result download failed.
    #[error("Download of {replica} failed: {source}")]
    Download {
        replica: String,
        #[source]
        source: TransportError,
    },

    /// The portal rejected the session token.
    #[error("Token rejected during replica {stage}: {source}")]
    TokenExpired {
        stage: &'static str,
        #[source]
        source: TransportError,
    },

    /// A state change outside the job lifecycle was attempted.
    #[error("Illegal replica job transition {from} -> {to}")]
    IllegalTransition { from: JobState, to: JobState },
}

impl ReplicaError {
    /// True when re-authenticating and retrying the entry may succeed.
    pub fn is_token_expired(&self) -> bool {
        matches!(self, ReplicaError::TokenExpired { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_timeout() {
        let err = ReplicaError::Timeout {
            replica: "Parcels_replica".to_string(),
            attempts: 12,
        };
        let msg = err.to_string();
        assert!(msg.contains("Parcels_replica"));
        assert!(msg.contains("12"));
    }

    #[test]
    fn test_token_expired_flag() {
        let err = ReplicaError::TokenExpired {
            stage: "polling",
            source: TransportError::Status {
                url: "u".to_string(),
                status: 498,
            },
        };
        assert!(err.is_token_expired());

        let err = ReplicaError::MissingStatusUrl {
            service: "Parcels".to_string(),
        };
        assert!(!err.is_token_expired());
    }

    #[test]
    fn test_display_illegal_transition() {
        let err = ReplicaError::IllegalTransition {
            from: JobState::Completed,
            to: JobState::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Illegal replica job transition Completed -> Pending"
        );
    }
}
