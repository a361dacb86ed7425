//! Fixed-interval retry policy for image downloads.
//!
//! Only server timeouts are retried. Each image gets at most
//! [`DEFAULT_MAX_ATTEMPTS`] requests, separated by a constant
//! [`DEFAULT_RETRY_DELAY`]. There is no exponential growth and no jitter.
//!
//! # Example
//!
//! ```
//! use guide_scraper::download::{RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//! match policy.should_retry(504, 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("retrying in {delay:?} (attempt {attempt})");
//!     }
//!     RetryDecision::DoNotRetry { reason } => println!("giving up: {reason}"),
//! }
//! ```

use std::time::Duration;

use tracing::debug;

/// Default maximum attempts per image (including the first request).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default pause after a retryable status.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Status codes retried by default (504 Gateway Timeout).
pub const DEFAULT_RETRY_STATUSES: &[u16] = &[504];

/// How a response status is handled by the download loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 200: stop retrying and decode the body.
    Success,
    /// Configured retryable status: close the body, wait, try again.
    Retryable,
    /// Anything else: fail the image immediately.
    Fatal,
}

/// Decision after a retryable status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then make attempt number `attempt`.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// 1-indexed number of the next attempt.
        attempt: u32,
    },

    /// Stop; no further requests for this image.
    DoNotRetry {
        /// Human-readable reason.
        reason: String,
    },
}

/// Retry configuration for image downloads.
///
/// # Default Values
///
/// - `max_attempts`: 5
/// - `delay`: 10 seconds
/// - `retry_statuses`: `[504]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with explicit attempts and delay, retrying 504 only.
    ///
    /// `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            ..Self::default()
        }
    }

    /// Adds extra retryable status codes (e.g. 503). 200 is ignored.
    #[must_use]
    pub fn with_retry_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        for status in statuses {
            if status != 200 && !self.retry_statuses.contains(&status) {
                self.retry_statuses.push(status);
            }
        }
        self
    }

    /// Returns the maximum number of attempts.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the fixed delay between attempts.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns the retryable status codes.
    #[must_use]
    pub fn retry_statuses(&self) -> &[u16] {
        &self.retry_statuses
    }

    /// Classifies a response status.
    #[must_use]
    pub fn classify(&self, status: u16) -> StatusClass {
        if status == 200 {
            StatusClass::Success
        } else if self.retry_statuses.contains(&status) {
            StatusClass::Retryable
        } else {
            StatusClass::Fatal
        }
    }

    /// Decides what to do after `attempt` (1-indexed) returned `status`.
    ///
    /// The last attempt never sleeps: the caller fails with
    /// `RetryExhausted` straight away.
    #[must_use]
    pub fn should_retry(&self, status: u16, attempt: u32) -> RetryDecision {
        if self.classify(status) != StatusClass::Retryable {
            return RetryDecision::DoNotRetry {
                reason: format!("status {status} is not retryable"),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        RetryDecision::Retry {
            delay: self.delay,
            attempt: attempt + 1,
        }
    }
}
