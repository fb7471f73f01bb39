//! Broker session errors

use thiserror::Error;

/// Errors from establishing the broker session.
#[derive(Error, Debug)]
pub enum MqttError {
	/// The broker URL or client options were rejected
	#[error("invalid MQTT options: {0}")]
	Options(#[from] rumqttc::OptionError),

	/// No connection attempt produced a usable session
	#[error(
		"failed to connect to MQTT broker after {attempts} attempts: \
		 {last_error}"
	)]
	ConnectExhausted {
		/// Connection attempts made before giving up
		attempts: u32,
		/// The final attempt's failure
		last_error: String,
	},

	/// The broker refused or failed the subscription
	#[error("failed to subscribe to '{topic}': {reason}")]
	SubscribeFailed {
		/// The subscription topic pattern
		topic: String,
		/// What went wrong
		reason: String,
	},
}
