//! Per-message forwarding pipeline
//!
//! Composes destination extraction, priority parsing, URL construction
//! and delivery for one message. Failures here are logged by the caller
//! and the message is dropped; they never terminate the subscription or
//! affect subsequent messages.

use thiserror::Error;
use tracing::{debug, info};

use crate::ntfy::{
	DeliveryError, DeliveryTarget, NtfyClient, UrlError, build_url,
	parse_priority,
};
use crate::topic::{DestinationError, extract_destination, is_wildcard};

/// Errors from processing a single message. Always message-local.
#[derive(Error, Debug)]
pub enum BridgeError {
	/// The received topic does not yield a destination
	#[error(transparent)]
	Destination(#[from] DestinationError),

	/// The delivery URL could not be composed
	#[error(transparent)]
	Url(#[from] UrlError),

	/// The notification could not be delivered
	#[error(transparent)]
	Delivery(#[from] DeliveryError),
}

/// The assembled forwarding pipeline for one subscription.
pub struct Bridge {
	pattern: String,
	base_url: String,
	auth_token: Option<String>,
	default_priority: Option<String>,
	client: NtfyClient,
}

impl Bridge {
	/// Builds the pipeline for messages arriving under `pattern`,
	/// delivering to `base_url`.
	pub fn new(
		pattern: impl Into<String>,
		base_url: impl Into<String>,
		auth_token: Option<String>,
		default_priority: Option<String>,
		client: NtfyClient,
	) -> Self {
		Self {
			pattern: pattern.into(),
			base_url: base_url.into(),
			auth_token,
			default_priority,
			client,
		}
	}

	/// Resolves the delivery URL for a received topic.
	///
	/// A wildcard subscription derives the destination from the topic's
	/// trailing level; a fixed subscription delivers everything to the
	/// configured URL as-is.
	fn resolve_url(&self, topic: &str) -> Result<String, BridgeError> {
		if !is_wildcard(&self.pattern) {
			return Ok(self.base_url.clone());
		}
		let destination = extract_destination(&self.pattern, topic)?;
		Ok(build_url(&self.base_url, destination)?)
	}

	/// Forwards one message through the pipeline.
	pub async fn handle_message(
		&self,
		topic: &str,
		payload: &[u8],
	) -> Result<(), BridgeError> {
		let url = self.resolve_url(topic)?;

		let body = String::from_utf8_lossy(payload);
		let (message, priority) =
			parse_priority(&body, self.default_priority.as_deref());
		debug!(
			topic,
			url = %url,
			priority = ?priority,
			"Resolved delivery target"
		);

		let target = DeliveryTarget {
			url,
			body: message.to_owned(),
			auth_token: self.auth_token.clone(),
			priority: priority.map(str::to_owned),
		};
		self.client.send(&target).await?;
		info!(topic, url = %target.url, "Message forwarded");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;
	use crate::ntfy::RetryPolicy;

	fn test_bridge(pattern: &str, base_url: &str) -> Bridge {
		let client =
			NtfyClient::new(Duration::from_secs(1), RetryPolicy::default())
				.unwrap();
		Bridge::new(pattern, base_url, None, None, client)
	}

	#[test]
	fn fixed_pattern_uses_the_configured_url_verbatim() {
		let bridge = test_bridge("home/alerts", "https://ntfy.example/alerts");
		assert_eq!(
			bridge.resolve_url("home/alerts").unwrap(),
			"https://ntfy.example/alerts"
		);
		// The received topic does not matter for a fixed subscription.
		assert_eq!(
			bridge.resolve_url("anything/else").unwrap(),
			"https://ntfy.example/alerts"
		);
	}

	#[test]
	fn wildcard_pattern_derives_the_destination() {
		let bridge = test_bridge("home/alerts/#", "https://ntfy.example");
		assert_eq!(
			bridge.resolve_url("home/alerts/backups").unwrap(),
			"https://ntfy.example/backups"
		);
	}

	#[test]
	fn extraction_errors_surface_as_bridge_errors() {
		let bridge = test_bridge("home/alerts/#", "https://ntfy.example");
		let err = bridge.resolve_url("home/alerts/a/b").unwrap_err();
		assert!(matches!(
			err,
			BridgeError::Destination(DestinationError::TooManyLevels { .. })
		));
	}

	#[test]
	fn empty_base_url_surfaces_as_bridge_error() {
		let bridge = test_bridge("home/alerts/#", "");
		let err = bridge.resolve_url("home/alerts/backups").unwrap_err();
		assert!(matches!(err, BridgeError::Url(UrlError::EmptyBase)));
	}
}
