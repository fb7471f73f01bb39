//! HTTP delivery client
//!
//! One POST per attempt: `Content-Type: text/plain`, the payload as the
//! body, a bearer `Authorization` header when a token is configured and
//! a `Priority` header when a priority applies. Status codes below 400
//! are success, 5xx is transient, 4xx is terminal.

use std::time::Duration;

use tracing::debug;

use super::error::DeliveryError;
use super::retry::{self, RetryAction, RetryPolicy};

/// A fully resolved delivery: one notification, ready to POST.
///
/// Constructed fresh for every message; never cached or reused.
#[derive(Debug, Clone)]
pub struct DeliveryTarget {
	/// Full URL of the destination topic.
	pub url: String,
	/// Notification body.
	pub body: String,
	/// Bearer token, passed through opaquely when present.
	pub auth_token: Option<String>,
	/// Value for the `Priority` header; `None` sends no header.
	pub priority: Option<String>,
}

/// Client for the notification endpoint, wrapping every delivery in the
/// retry policy.
#[derive(Debug, Clone)]
pub struct NtfyClient {
	http: reqwest::Client,
	policy: RetryPolicy,
}

impl NtfyClient {
	/// Creates a client with a per-attempt request timeout.
	pub fn new(
		timeout: Duration,
		policy: RetryPolicy,
	) -> Result<Self, DeliveryError> {
		let http = reqwest::Client::builder().timeout(timeout).build()?;
		Ok(Self { http, policy })
	}

	/// Delivers one message, retrying transient failures per the policy.
	///
	/// Attempts run strictly one after another; the caller awaits this
	/// per message, so a message is never in flight twice concurrently.
	pub async fn send(
		&self,
		target: &DeliveryTarget,
	) -> Result<(), DeliveryError> {
		retry::retry_with_backoff(&self.policy, |attempt| async move {
			debug!(url = %target.url, attempt, "Sending notification");
			match self.send_once(target).await {
				| Ok(()) => RetryAction::Success(()),
				| Err(err) if err.is_retryable() => RetryAction::Retry(err),
				| Err(err) => RetryAction::Fail(err),
			}
		})
		.await
	}

	/// One POST attempt, classified by status code.
	async fn send_once(
		&self,
		target: &DeliveryTarget,
	) -> Result<(), DeliveryError> {
		let mut request = self
			.http
			.post(&target.url)
			.header(reqwest::header::CONTENT_TYPE, "text/plain")
			.body(target.body.clone());
		if let Some(token) = &target.auth_token {
			request = request.header(
				reqwest::header::AUTHORIZATION,
				format!("Bearer {token}"),
			);
		}
		if let Some(priority) = &target.priority {
			request = request.header("Priority", priority.as_str());
		}

		let response = request.send().await?;
		let status = response.status().as_u16();
		if status >= 500 {
			return Err(DeliveryError::ServerStatus { status });
		}
		if status >= 400 {
			return Err(DeliveryError::Rejected { status });
		}
		Ok(())
	}
}
