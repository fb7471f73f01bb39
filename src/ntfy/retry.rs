//! Retry-with-backoff for message delivery
//!
//! The retry behavior lives in a policy object plus a per-attempt
//! classification, not in the HTTP call itself, so the loop is testable
//! without a network.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::error::DeliveryError;

/// Retry schedule for message delivery.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
	/// Total number of attempts, including the first one. Must be >= 1.
	pub max_attempts: u32,
	/// Delay before the second attempt; attempt n+1 waits base * 2^n.
	pub base_delay: Duration,
	/// Hard cap on the computed delay to prevent unbounded growth.
	pub max_delay: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_secs(1),
			max_delay: Duration::from_secs(30),
		}
	}
}

impl RetryPolicy {
	/// Compute the delay after a failed attempt (0-indexed).
	fn delay_for_attempt(&self, attempt: u32) -> Duration {
		// 2^attempt via checked shift so large attempt numbers saturate
		// instead of overflowing.
		let multiplier = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
		self.base_delay
			.checked_mul(multiplier)
			.unwrap_or(self.max_delay)
			.min(self.max_delay)
	}
}

/// Outcome of a single delivery attempt.
pub enum RetryAction<T> {
	/// Attempt succeeded.
	Success(T),
	/// Attempt failed transiently; another one may succeed.
	Retry(DeliveryError),
	/// Attempt failed permanently; retrying cannot succeed.
	Fail(DeliveryError),
}

/// Runs `operation` under `policy`, sleeping with exponential backoff
/// between attempts.
///
/// The `operation` closure receives the current attempt number
/// (0-indexed) and classifies its own outcome. A [`RetryAction::Fail`]
/// short-circuits even when attempts remain; when the attempt budget
/// runs out the last error is returned wrapped in
/// [`DeliveryError::RetriesExhausted`].
pub async fn retry_with_backoff<F, Fut, T>(
	policy: &RetryPolicy,
	operation: F,
) -> Result<T, DeliveryError>
where
	F: Fn(u32) -> Fut,
	Fut: Future<Output = RetryAction<T>>,
{
	let max_attempts = policy.max_attempts.max(1);
	let mut attempt: u32 = 0;
	loop {
		match operation(attempt).await {
			| RetryAction::Success(value) => return Ok(value),
			| RetryAction::Fail(err) => return Err(err),
			| RetryAction::Retry(err) => {
				attempt += 1;
				if attempt >= max_attempts {
					return Err(DeliveryError::RetriesExhausted {
						attempts: max_attempts,
						source: Box::new(err),
					});
				}
				let delay = policy.delay_for_attempt(attempt - 1);
				warn!(
					attempt,
					max_attempts,
					delay_ms = delay.as_millis() as u64,
					error = %err,
					"Delivery attempt failed, retrying"
				);
				tokio::time::sleep(delay).await;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicU32, Ordering};

	use super::*;

	fn fast_policy(max_attempts: u32) -> RetryPolicy {
		RetryPolicy {
			max_attempts,
			base_delay: Duration::from_millis(1),
			max_delay: Duration::from_millis(8),
		}
	}

	#[test]
	fn delay_doubles_per_attempt() {
		let policy = RetryPolicy {
			max_attempts: 5,
			base_delay: Duration::from_millis(100),
			max_delay: Duration::from_secs(10),
		};
		assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
		assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
		assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
	}

	#[test]
	fn delay_respects_max_cap() {
		let policy = RetryPolicy {
			max_attempts: 20,
			base_delay: Duration::from_millis(500),
			max_delay: Duration::from_secs(5),
		};
		// attempt 12: 500ms * 2^12 would be ~34 minutes.
		assert_eq!(policy.delay_for_attempt(12), Duration::from_secs(5));
		// Shift overflow saturates instead of wrapping.
		assert_eq!(policy.delay_for_attempt(40), Duration::from_secs(5));
	}

	#[tokio::test]
	async fn succeeds_on_first_attempt() {
		let result = retry_with_backoff(&fast_policy(3), |_| async {
			RetryAction::Success(42u32)
		})
		.await;
		assert_eq!(result.unwrap(), 42);
	}

	#[tokio::test]
	async fn terminal_failure_stops_immediately() {
		let attempts = AtomicU32::new(0);
		let result: Result<(), _> =
			retry_with_backoff(&fast_policy(3), |_| {
				attempts.fetch_add(1, Ordering::Relaxed);
				async { RetryAction::Fail(DeliveryError::Rejected { status: 404 }) }
			})
			.await;
		assert!(matches!(
			result,
			Err(DeliveryError::Rejected { status: 404 })
		));
		assert_eq!(attempts.load(Ordering::Relaxed), 1);
	}

	#[tokio::test]
	async fn transient_failures_exhaust_the_attempt_budget() {
		let attempts = AtomicU32::new(0);
		let result: Result<(), _> =
			retry_with_backoff(&fast_policy(3), |_| {
				attempts.fetch_add(1, Ordering::Relaxed);
				async {
					RetryAction::Retry(DeliveryError::ServerStatus {
						status: 500,
					})
				}
			})
			.await;
		assert_eq!(attempts.load(Ordering::Relaxed), 3);
		match result {
			| Err(DeliveryError::RetriesExhausted { attempts, source }) => {
				assert_eq!(attempts, 3);
				assert!(matches!(
					*source,
					DeliveryError::ServerStatus { status: 500 }
				));
			}
			| other => panic!("expected RetriesExhausted, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn recovers_on_a_later_attempt() {
		let attempts = AtomicU32::new(0);
		let result = retry_with_backoff(&fast_policy(3), |attempt| {
			attempts.fetch_add(1, Ordering::Relaxed);
			async move {
				if attempt == 0 {
					RetryAction::Retry(DeliveryError::ServerStatus {
						status: 503,
					})
				} else {
					RetryAction::Success(99u32)
				}
			}
		})
		.await;
		assert_eq!(result.unwrap(), 99);
		assert_eq!(attempts.load(Ordering::Relaxed), 2);
	}

	#[tokio::test]
	async fn attempt_budget_of_one_never_retries() {
		let attempts = AtomicU32::new(0);
		let result: Result<(), _> =
			retry_with_backoff(&fast_policy(1), |_| {
				attempts.fetch_add(1, Ordering::Relaxed);
				async {
					RetryAction::Retry(DeliveryError::ServerStatus {
						status: 500,
					})
				}
			})
			.await;
		assert!(result.is_err());
		assert_eq!(attempts.load(Ordering::Relaxed), 1);
	}
}
