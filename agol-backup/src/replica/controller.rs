//! Replica job controller: submit, poll, fetch.

use std::io::Read;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::poll::{StatusResponse, STATUS_COMPLETED, STATUS_FAILED};
use super::{JobState, PollPolicy, ReplicaError, ReplicaJob, ReplicaRequest, Sleeper};
use crate::directory::ResolvedService;
use crate::session::Session;
use crate::transport::{FormParams, Transport, TransportError};

/// Result URL with the session token attached, as recorded in the run log.
pub fn tokenized_result_url(result_url: &str, token: &str) -> String {
    format!("{}?token={}", result_url, token)
}

/// Drives one replica export at a time through its lifecycle.
pub struct ReplicaJobController<'a, T: Transport, S: Sleeper> {
    transport: &'a T,
    sleeper: &'a S,
    policy: PollPolicy,
}

impl<'a, T: Transport, S: Sleeper> ReplicaJobController<'a, T, S> {
    pub fn new(transport: &'a T, sleeper: &'a S, policy: PollPolicy) -> Self {
        Self {
            transport,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Request an asynchronous export of every live layer of `service`.
    ///
    /// No retry is attempted on failure.
    pub fn submit(
        &self,
        session: &Session,
        service: &ResolvedService,
    ) -> Result<ReplicaJob, ReplicaError> {
        let request = ReplicaRequest::for_service(service);
        info!(
            service = %service.name,
            replica = request.replica_name(),
            layers = ?request.layers(),
            "Submitting replica request"
        );

        let body = self
            .transport
            .send(&service.replica_url, &request.to_form(session.token()))
            .map_err(|source| {
                if source.is_token_rejected() {
                    ReplicaError::TokenExpired {
                        stage: "submission",
                        source,
                    }
                } else {
                    ReplicaError::Submission {
                        service: service.name.clone(),
                        source,
                    }
                }
            })?;

        let status_url = body
            .get("statusUrl")
            .and_then(Value::as_str)
            .ok_or_else(|| ReplicaError::MissingStatusUrl {
                service: service.name.clone(),
            })?;

        debug!(replica = request.replica_name(), status_url = status_url, "Replica job submitted");
        Ok(ReplicaJob::submitted(request.replica_name(), status_url))
    }

    /// Poll `job` until the remote status is `Completed`.
    ///
    /// The first status request is issued immediately, then one request per
    /// policy interval. Ends early on a remote `Failed` status, a transport
    /// error, or when the policy's attempt bound is reached.
    ///
    /// A rejected token leaves the job `Pending` so that [`Self::resume`]
    /// can pick it up with a fresh session. Any other error fails the job.
    pub fn poll(&self, session: &Session, job: &mut ReplicaJob) -> Result<(), ReplicaError> {
        job.transition(JobState::Pending)?;
        self.poll_pending(session, job)
    }

    /// Continue an interrupted job without submitting a new one.
    ///
    /// A `Submitted` job starts polling, a `Pending` job keeps polling the
    /// same status URL (the attempt count carries over) and a `Completed`
    /// job needs no further requests. A `Failed` job cannot be resumed.
    pub fn resume(&self, session: &Session, job: &mut ReplicaJob) -> Result<(), ReplicaError> {
        match job.state() {
            JobState::Completed => Ok(()),
            JobState::Pending => {
                info!(
                    replica = job.replica_name(),
                    polls = job.polls(),
                    "Resuming replica job"
                );
                self.poll_pending(session, job)
            }
            _ => self.poll(session, job),
        }
    }

    fn poll_pending(&self, session: &Session, job: &mut ReplicaJob) -> Result<(), ReplicaError> {
        let query = session.json_params();

        loop {
            let body = match self.transport.fetch_json(job.status_url(), &query) {
                Ok(body) => body,
                Err(source) => {
                    let error = self.poll_error(job, source);
                    if !error.is_token_expired() {
                        job.fail();
                    }
                    return Err(error);
                }
            };

            let status: StatusResponse = serde_json::from_value(body).unwrap_or_else(|e| {
                warn!(replica = job.replica_name(), error = %e, "Unexpected status response");
                StatusResponse::default()
            });
            job.record_poll(status.status.clone());
            debug!(
                replica = job.replica_name(),
                poll = job.polls(),
                status = ?status.status,
                "Replica status"
            );

            match status.status.as_deref() {
                Some(STATUS_COMPLETED) => {
                    let Some(result_url) = status.result_url else {
                        job.fail();
                        return Err(ReplicaError::MissingResultUrl {
                            replica: job.replica_name().to_string(),
                        });
                    };
                    job.complete(result_url)?;
                    info!(replica = job.replica_name(), polls = job.polls(), "Replica job completed");
                    return Ok(());
                }
                Some(STATUS_FAILED) => {
                    job.fail();
                    return Err(ReplicaError::JobFailed {
                        replica: job.replica_name().to_string(),
                        status: STATUS_FAILED.to_string(),
                    });
                }
                _ => {}
            }

            if !self.policy.allows(job.polls()) {
                job.fail();
                warn!(replica = job.replica_name(), polls = job.polls(), "Replica job timed out");
                return Err(ReplicaError::Timeout {
                    replica: job.replica_name().to_string(),
                    attempts: job.polls(),
                });
            }

            self.sleeper.sleep(self.policy.interval);
        }
    }

    /// Open the result archive of a completed job as a byte stream.
    pub fn fetch(
        &self,
        session: &Session,
        job: &ReplicaJob,
    ) -> Result<Box<dyn Read + Send>, ReplicaError> {
        let result_url = match (job.state(), job.result_url()) {
            (JobState::Completed, Some(url)) => url,
            _ => {
                return Err(ReplicaError::MissingResultUrl {
                    replica: job.replica_name().to_string(),
                })
            }
        };

        info!(replica = job.replica_name(), "Downloading replica result");
        let query = FormParams::new().with("token", session.token());
        self.transport
            .fetch_binary(result_url, &query)
            .map_err(|source| {
                if source.is_token_rejected() {
                    ReplicaError::TokenExpired {
                        stage: "download",
                        source,
                    }
                } else {
                    ReplicaError::Download {
                        replica: job.replica_name().to_string(),
                        source,
                    }
                }
            })
    }

    /// Submit, poll to completion and open the result stream.
    pub fn export(
        &self,
        session: &Session,
        service: &ResolvedService,
    ) -> Result<(ReplicaJob, Box<dyn Read + Send>), ReplicaError> {
        let mut job = self.submit(session, service)?;
        self.poll(session, &mut job)?;
        let stream = self.fetch(session, &job)?;
        Ok((job, stream))
    }

    fn poll_error(&self, job: &ReplicaJob, source: TransportError) -> ReplicaError {
        if source.is_token_rejected() {
            ReplicaError::TokenExpired {
                stage: "polling",
                source,
            }
        } else {
            ReplicaError::Poll {
                replica: job.replica_name().to_string(),
                source,
            }
        }
    }
}
