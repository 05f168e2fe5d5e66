//! Status polling policy.

use std::sync::Mutex;
use std::time::Duration;

use serde::Deserialize;

/// Default interval between status requests.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Remote status that ends polling successfully.
pub const STATUS_COMPLETED: &str = "Completed";

/// Remote status that ends polling with a failure.
pub const STATUS_FAILED: &str = "Failed";

/// How often and how long to poll a replica job.
///
/// The default polls every 5 seconds with no upper bound, so a job that
/// never completes blocks the run. Set `max_attempts` to bound the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Fixed delay between consecutive status requests
    pub interval: Duration,
    /// Maximum number of status requests; `None` polls until completion
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: None,
        }
    }
}

impl PollPolicy {
    /// Unbounded polling at a fixed interval.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    /// Bound polling to `attempts` status requests. Zero means unbounded.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = (attempts > 0).then_some(attempts);
        self
    }

    /// Whether another status request may be issued after `polls_made`.
    pub fn allows(&self, polls_made: u32) -> bool {
        self.max_attempts.map_or(true, |max| polls_made < max)
    }
}

/// Blocking delay between polls.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Records requested delays without sleeping. Intended for tests.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
    }
}

/// Job status response (`<statusUrl>?f=json`).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusResponse {
    pub status: Option<String>,
    #[serde(rename = "resultUrl")]
    pub result_url: Option<String>,
}
