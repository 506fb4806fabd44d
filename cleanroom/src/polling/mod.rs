//! Bounded status polling.
//!
//! The lifecycle has two waits: workspace provisioning and the notebook run.
//! Both fetch a status at a fixed interval until it is terminal, and both are
//! bounded by an attempt cap and a wall-clock deadline.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::{CleanRoomError, TimeoutError};

/// How often and for how long to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between fetches.
    pub interval: Duration,
    /// Maximum number of fetches, if capped.
    pub max_attempts: Option<usize>,
    /// Wall-clock deadline measured from the first fetch, if any.
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: None,
            timeout: None,
        }
    }
}

impl PollPolicy {
    /// Creates an unbounded policy with the default 10 s interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Caps the number of fetches.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    /// Sets the deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn exhausted(&self, attempts: usize, elapsed: Duration) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
            || self.timeout.is_some_and(|limit| elapsed >= limit)
    }
}

/// A terminal status reached by [`poll_until`].
#[derive(Debug, Clone, PartialEq)]
pub struct Polled<S> {
    /// The successful status.
    pub value: S,
    /// Number of fetches made, including the last.
    pub attempts: usize,
}

/// Why [`poll_until`] stopped without success.
#[derive(Debug)]
pub enum PollError<S> {
    /// A fatal status was observed; no further fetch was made.
    Fatal {
        /// The fatal status.
        status: S,
        /// Number of fetches made.
        attempts: usize,
    },
    /// The attempt cap or deadline ran out.
    TimedOut {
        /// Last status observed.
        last: S,
        /// Number of fetches made.
        attempts: usize,
        /// Time spent polling.
        elapsed: Duration,
    },
    /// Fetching the status failed.
    Fetch(CleanRoomError),
}

impl<S: fmt::Debug> fmt::Display for PollError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal { status, attempts } => {
                write!(f, "fatal status {status:?} after {attempts} attempts")
            }
            Self::TimedOut { last, attempts, .. } => {
                write!(f, "still {last:?} after {attempts} attempts")
            }
            Self::Fetch(err) => write!(f, "{err}"),
        }
    }
}

impl<S> PollError<S> {
    /// Converts into a [`CleanRoomError`], mapping fatal statuses with `on_fatal`.
    pub fn into_error(
        self,
        operation: &str,
        on_fatal: impl FnOnce(S) -> CleanRoomError,
    ) -> CleanRoomError {
        match self {
            Self::Fatal { status, .. } => on_fatal(status),
            Self::TimedOut {
                attempts, elapsed, ..
            } => TimeoutError::new(operation, attempts, elapsed).into(),
            Self::Fetch(err) => err,
        }
    }
}

/// Fetches a status until it is successful, fatal, or the policy runs out.
///
/// Statuses that are neither successful nor fatal are retried after
/// `policy.interval`. Fetch errors are returned immediately.
pub async fn poll_until<S, F, Fut>(
    policy: &PollPolicy,
    label: &str,
    mut fetch: F,
    is_success: impl Fn(&S) -> bool,
    is_fatal: impl Fn(&S) -> bool,
) -> Result<Polled<S>, PollError<S>>
where
    S: fmt::Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S, CleanRoomError>>,
{
    let started = Instant::now();
    let mut attempts = 0usize;

    loop {
        let status = fetch().await.map_err(PollError::Fetch)?;
        attempts += 1;

        if is_success(&status) {
            return Ok(Polled {
                value: status,
                attempts,
            });
        }
        if is_fatal(&status) {
            return Err(PollError::Fatal { status, attempts });
        }

        let elapsed = started.elapsed();
        if policy.exhausted(attempts, elapsed) {
            return Err(PollError::TimedOut {
                last: status,
                attempts,
                elapsed,
            });
        }

        tracing::debug!(
            operation = label,
            attempt = attempts,
            status = ?status,
            delay_ms = u64::try_from(policy.interval.as_millis()).unwrap_or(u64::MAX),
            "Status not terminal, polling again"
        );
        tokio::time::sleep(policy.interval).await;
    }
}
