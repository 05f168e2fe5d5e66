//! Replica export workflow.
//!
//! A replica is an asynchronous export job on the portal. Each job moves
//! through a small state machine:
//!
//! ```text
//! submit ──► Submitted ──► Pending ──► Completed ──► fetch result
//!                               └────► Failed
//! ```
//!
//! - [`ReplicaRequest`] - immutable `createReplica` parameters, one per job
//! - [`ReplicaJob`] - job state, mutated only by the polling loop
//! - [`ReplicaJobController`] - submits, polls at a fixed interval and opens
//!   the result stream
//! - [`PollPolicy`] / [`Sleeper`] - polling interval, optional bound, and the
//!   sleep seam used by tests
//!
//! Only one job is in flight at a time.

mod controller;
mod error;
mod job;
mod poll;
mod request;

pub use controller::{tokenized_result_url, ReplicaJobController};
pub use error::ReplicaError;
pub use job::{JobState, ReplicaJob};
pub use poll::{
    PollPolicy, RecordingSleeper, Sleeper, ThreadSleeper, DEFAULT_POLL_INTERVAL_SECS,
    STATUS_COMPLETED, STATUS_FAILED,
};
pub use request::{ReplicaRequest, DATA_FORMAT, REPLICA_NAME_SUFFIX, SYNC_MODEL};
