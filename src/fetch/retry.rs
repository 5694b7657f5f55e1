//! Retry decisions for failed fetches.
//!
//! The original tool retried every failure immediately and forever — a
//! busy-loop hazard against a consistently failing endpoint. Retry behavior
//! is therefore a configurable policy here: [`RetryPolicy::should_retry`]
//! takes the failure classification and the attempt count that just failed,
//! and returns either a delay to wait before the next attempt or a give-up.
//! [`RetryPolicy::unbounded`] reproduces the original behavior for callers
//! that want it.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

use super::FetchError;

/// Default maximum attempts (including the initial attempt).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay for exponential backoff.
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default maximum delay cap.
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);

/// Default backoff multiplier.
const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;

/// Maximum jitter added to delays.
const MAX_JITTER: Duration = Duration::from_millis(500);

/// Classification of a fetch failure for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Temporary failure that may succeed on retry (network errors,
    /// timeouts, HTTP error statuses).
    Transient,
    /// Failure that retrying cannot fix (malformed URL, local IO).
    Permanent,
}

/// Decision on whether to retry a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before the next attempt.
        delay: Duration,
        /// The attempt number the retry will be (1-indexed).
        attempt: u32,
    },
    /// Stop retrying this job.
    GiveUp {
        /// Human-readable reason.
        reason: String,
    },
}

/// Configurable retry policy with exponential backoff and jitter.
///
/// Delay formula: `min(base_delay * multiplier^(attempt-1), max_delay) +
/// jitter`. With defaults, delays are approximately 1s, 2s before the
/// attempt cap is reached. An unbounded policy has no cap and no delay.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts including the initial one; `None` means unbounded.
    max_attempts: Option<u32>,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Creates a capped policy with custom backoff settings.
    ///
    /// `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f32,
    ) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            base_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Creates a policy with a custom attempt cap and default backoff.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            ..Self::default()
        }
    }

    /// Creates a policy that retries transient failures immediately and
    /// forever — the original tool's behavior.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Returns the attempt cap, or `None` for an unbounded policy.
    #[must_use]
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Decides whether to retry after a failed attempt.
    ///
    /// `attempt` is the attempt number that just failed (1-indexed).
    #[instrument(skip(self), fields(max_attempts = ?self.max_attempts))]
    pub fn should_retry(&self, kind: FailureKind, attempt: u32) -> RetryDecision {
        if kind == FailureKind::Permanent {
            return RetryDecision::GiveUp {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if let Some(max) = self.max_attempts
            && attempt >= max
        {
            debug!(attempt, max, "max attempts reached");
            return RetryDecision::GiveUp {
                reason: format!("max attempts ({max}) exhausted"),
            };
        }

        let delay = self.calculate_delay(attempt);
        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Calculates the backoff delay for the attempt that just failed.
    fn calculate_delay(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }

        let base_ms = self.base_delay.as_millis() as f64;
        let exponent = f64::from(attempt.saturating_sub(1));
        let delay_ms = base_ms * f64::from(self.backoff_multiplier).powf(exponent);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);

        Duration::from_millis(capped_ms as u64) + self.calculate_jitter()
    }

    /// Generates random jitter between 0 and `MAX_JITTER`.
    ///
    /// Jitter prevents thundering herd when several fetches fail at once and
    /// would otherwise retry in lockstep.
    fn calculate_jitter(&self) -> Duration {
        let mut rng = rand::thread_rng();
        let jitter_ms = rng.gen_range(0..=MAX_JITTER.as_millis() as u64);
        Duration::from_millis(jitter_ms)
    }
}

/// Classifies a fetch error for the retry policy.
///
/// Transport failures — network errors, timeouts and HTTP error statuses —
/// are transient: the export endpoint flaps under load and on session expiry,
/// and the original retried all of them. Malformed URLs and local IO errors
/// cannot be fixed by retrying.
#[instrument]
pub fn classify_error(error: &FetchError) -> FailureKind {
    match error {
        FetchError::Network { .. } | FetchError::Timeout { .. } | FetchError::HttpStatus { .. } => {
            FailureKind::Transient
        }
        FetchError::InvalidUrl { .. } | FetchError::Io { .. } => FailureKind::Permanent,
    }
}
