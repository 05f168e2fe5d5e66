//! Replica job state.

use std::fmt;

use super::ReplicaError;

/// Lifecycle state of a replica export job.
///
/// Legal transitions:
///
/// ```text
/// Submitted ──► Pending ──► Completed
///     │            │
///     └────────────┴──────► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    /// Accepted by `createReplica`, not yet polled.
    #[default]
    Submitted,
    /// Being polled.
    Pending,
    /// Remote job finished; a result URL is available.
    Completed,
    /// Remote job failed, timed out, or could not be polled.
    Failed,
}

impl JobState {
    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Submitted, Self::Pending)
                | (Self::Submitted, Self::Failed)
                | (Self::Pending, Self::Completed)
                | (Self::Pending, Self::Failed)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitted => "Submitted",
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// An in-flight replica export.
///
/// Created by [`ReplicaJobController::submit`](super::ReplicaJobController::submit)
/// and mutated only by the polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaJob {
    replica_name: String,
    status_url: String,
    state: JobState,
    result_url: Option<String>,
    polls: u32,
    last_status: Option<String>,
}

impl ReplicaJob {
    pub fn submitted(replica_name: impl Into<String>, status_url: impl Into<String>) -> Self {
        Self {
            replica_name: replica_name.into(),
            status_url: status_url.into(),
            state: JobState::Submitted,
            result_url: None,
            polls: 0,
            last_status: None,
        }
    }

    pub fn replica_name(&self) -> &str {
        &self.replica_name
    }

    pub fn status_url(&self) -> &str {
        &self.status_url
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Result URL, set once the job is `Completed`.
    pub fn result_url(&self) -> Option<&str> {
        self.result_url.as_deref()
    }

    /// Number of status requests issued so far.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Raw `status` value from the most recent status response.
    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    pub(crate) fn transition(&mut self, next: JobState) -> Result<(), ReplicaError> {
        if !self.state.can_transition_to(next) {
            return Err(ReplicaError::IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    pub(crate) fn record_poll(&mut self, status: Option<String>) {
        self.polls += 1;
        self.last_status = status;
    }

    pub(crate) fn complete(&mut self, result_url: String) -> Result<(), ReplicaError> {
        self.transition(JobState::Completed)?;
        self.result_url = Some(result_url);
        Ok(())
    }

    /// Move to `Failed` unless already terminal.
    pub(crate) fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = JobState::Failed;
        }
    }
}
