//! Delivery error taxonomy
//!
//! Classification drives the retry loop: transport failures and 5xx
//! statuses are transient, 4xx means the request itself was rejected and
//! will not succeed on repetition.

use thiserror::Error;

/// Errors from delivering one message to the notification endpoint.
#[derive(Error, Debug)]
pub enum DeliveryError {
	/// The request could not be performed (connect refused, DNS failure,
	/// timeout, ...)
	#[error("failed to reach notification endpoint: {0}")]
	Transport(#[from] reqwest::Error),

	/// The endpoint answered with a server-side error status
	#[error("notification endpoint returned status {status} (server error)")]
	ServerStatus {
		/// The HTTP status code, >= 500
		status: u16,
	},

	/// The endpoint rejected the request; retrying cannot succeed
	#[error(
		"notification endpoint rejected request with status {status} \
		 (client error)"
	)]
	Rejected {
		/// The HTTP status code, in 400..500
		status: u16,
	},

	/// Every attempt the retry policy allowed has failed
	#[error("delivery failed after {attempts} attempts: {source}")]
	RetriesExhausted {
		/// Total attempts made
		attempts: u32,
		/// The last attempt's error
		#[source]
		source: Box<DeliveryError>,
	},
}

impl DeliveryError {
	/// Whether another attempt may succeed.
	pub fn is_retryable(&self) -> bool {
		match self {
			| DeliveryError::Transport(e) => is_retryable_reqwest_error(e),
			| DeliveryError::ServerStatus { .. } => true,
			| DeliveryError::Rejected { .. } => false,
			| DeliveryError::RetriesExhausted { .. } => false,
		}
	}
}

/// Classify a reqwest error as retryable or non-retryable.
///
/// Builder and redirect errors describe a malformed request; everything
/// else (connect, timeout, body read) is treated as transient.
fn is_retryable_reqwest_error(e: &reqwest::Error) -> bool {
	!(e.is_builder() || e.is_redirect())
}
