//! Caller-side retry with exponential backoff for dialogue queries

use std::time::{Duration, SystemTime};

use super::{Dialogue, DialogueError};

/// Retry policy for dialogue queries
///
/// Controls how many times a failed query is retried and how long to wait
/// between attempts. `max_retries = 0` gives single-shot behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay between retries (doubles each attempt)
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}

/// Whether a failure is worth another attempt
///
/// Only transport-level failures are; the service answering "no match" or
/// rejecting credentials will answer the same way again.
#[must_use]
pub const fn is_retryable(error: &DialogueError) -> bool {
    matches!(error, DialogueError::ConnectionFailure(_))
}

/// Compute the delay before the next retry attempt.
///
/// `min(base_delay * 2^attempt + jitter, max_delay)`, jitter being 0-25% of
/// the exponential delay, derived from the system clock.
#[must_use]
pub fn delay_for_attempt(policy: &RetryPolicy, attempt: u32) -> Duration {
    let base = policy
        .base_delay
        .saturating_mul(2u32.saturating_pow(attempt));
    let base = base.min(policy.max_delay);

    let jitter_nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();

    let jitter_fraction = f64::from(jitter_nanos % 250) / 1000.0;
    let jitter = base.mul_f64(jitter_fraction);

    (base + jitter).min(policy.max_delay)
}

/// Query the dialogue service, bounding each attempt by `timeout` and
/// retrying connection failures per `policy`
///
/// A timed-out attempt counts as a connection failure.
///
/// # Errors
///
/// Returns the last attempt's error once retries are exhausted, or the
/// first non-retryable error
pub async fn query_with_retry(
    dialogue: &dyn Dialogue,
    utterance: &str,
    policy: &RetryPolicy,
    timeout: Duration,
) -> Result<String, DialogueError> {
    let mut attempt = 0;
    loop {
        let outcome = match tokio::time::timeout(timeout, dialogue.query(utterance)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(DialogueError::ConnectionFailure(format!(
                "no reply within {}s",
                timeout.as_secs_f32()
            ))),
        };

        match outcome {
            Err(e) if is_retryable(&e) && attempt < policy.max_retries => {
                let delay = delay_for_attempt(policy, attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "dialogue query failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays scripted outcomes, one per call
    struct Scripted(Mutex<Vec<Result<String, DialogueError>>>);

    impl Scripted {
        fn new(mut outcomes: Vec<Result<String, DialogueError>>) -> Self {
            outcomes.reverse();
            Self(Mutex::new(outcomes))
        }

        fn remaining(&self) -> usize {
            self.0.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Dialogue for Scripted {
        async fn query(&self, _utterance: &str) -> Result<String, DialogueError> {
            self.0.lock().unwrap().pop().expect("script exhausted")
        }
    }

    /// Never answers
    struct Silent;

    #[async_trait]
    impl Dialogue for Silent {
        async fn query(&self, _utterance: &str) -> Result<String, DialogueError> {
            std::future::pending().await
        }
    }

    fn refused() -> DialogueError {
        DialogueError::ConnectionFailure("connection refused".to_string())
    }

    // -- is_retryable ---------------------------------------------------------

    #[test]
    fn retryable_only_on_connection_failure() {
        assert!(is_retryable(&refused()));
        assert!(!is_retryable(&DialogueError::NoMatch));
        assert!(!is_retryable(&DialogueError::InvalidCredentials));
        assert!(!is_retryable(&DialogueError::MalformedResponse(String::new())));
        assert!(!is_retryable(&DialogueError::Unknown("HTTP 500".to_string())));
    }

    // -- delay_for_attempt ----------------------------------------------------

    #[test]
    fn exponential_growth() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
            ..RetryPolicy::default()
        };

        assert!(delay_for_attempt(&policy, 0) >= Duration::from_millis(100));
        assert!(delay_for_attempt(&policy, 1) >= Duration::from_millis(200));
        assert!(delay_for_attempt(&policy, 2) >= Duration::from_millis(400));
    }

    #[test]
    fn delay_capped_at_max() {
        let policy = RetryPolicy {
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(15),
            ..RetryPolicy::default()
        };

        assert!(delay_for_attempt(&policy, 3) <= policy.max_delay);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(60),
            ..RetryPolicy::default()
        };

        for _ in 0..50 {
            let d = delay_for_attempt(&policy, 0);
            assert!(d >= Duration::from_millis(1000), "below base: {d:?}");
            assert!(d <= Duration::from_millis(1250), "above 125%: {d:?}");
        }
    }

    // -- query_with_retry -----------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn retries_connection_failure_then_succeeds() {
        let dialogue = Scripted::new(vec![Err(refused()), Ok("Hola".to_string())]);

        let reply = query_with_retry(
            &dialogue,
            "Hola",
            &RetryPolicy::default(),
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(reply, Ok("Hola".to_string()));
        assert_eq!(dialogue.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let dialogue = Scripted::new(vec![Err(refused()), Err(refused()), Ok("late".to_string())]);
        let policy = RetryPolicy {
            max_retries: 1,
            ..RetryPolicy::default()
        };

        let reply = query_with_retry(&dialogue, "Hola", &policy, Duration::from_secs(5)).await;

        assert_eq!(reply, Err(refused()));
        assert_eq!(dialogue.remaining(), 1);
    }

    #[tokio::test]
    async fn does_not_retry_no_match() {
        let dialogue = Scripted::new(vec![Err(DialogueError::NoMatch), Ok("unused".to_string())]);

        let reply = query_with_retry(
            &dialogue,
            "Hola",
            &RetryPolicy::default(),
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(reply, Err(DialogueError::NoMatch));
        assert_eq!(dialogue.remaining(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_becomes_connection_failure() {
        let reply = query_with_retry(
            &Silent,
            "Hola",
            &RetryPolicy::none(),
            Duration::from_secs(2),
        )
        .await;

        assert!(matches!(reply, Err(DialogueError::ConnectionFailure(_))));
    }

    #[test]
    fn default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 1);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(5));
    }
}
