//! Destination extraction from wildcard subscriptions
//!
//! A subscription like `home/notifications/#` covers every topic below
//! its fixed prefix; the level matched by the `#` names the notification
//! destination. Exactly one level must remain beyond the prefix, so the
//! destination mapping stays unambiguous without a general
//! wildcard-matching engine.

use thiserror::Error;

/// Errors from destination-key extraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DestinationError {
	/// The subscription pattern has no trailing multi-level wildcard
	#[error("subscription pattern '{pattern}' is not a wildcard pattern")]
	NotWildcard {
		/// The offending subscription pattern
		pattern: String,
	},

	/// The received topic does not start with the pattern's fixed prefix
	#[error("topic '{topic}' does not match subscription pattern '{pattern}'")]
	PrefixMismatch {
		/// The subscription pattern the topic was matched against
		pattern: String,
		/// The received topic
		topic: String,
	},

	/// The received topic has no level beyond the pattern's fixed prefix
	#[error(
		"topic '{topic}' has no additional level beyond subscription \
		 pattern '{pattern}'"
	)]
	NoRemainder {
		/// The subscription pattern the topic was matched against
		pattern: String,
		/// The received topic
		topic: String,
	},

	/// The received topic has more than one level beyond the prefix
	#[error(
		"topic '{topic}' has multiple levels beyond subscription pattern \
		 '{pattern}' (one-level wildcard only)"
	)]
	TooManyLevels {
		/// The subscription pattern the topic was matched against
		pattern: String,
		/// The received topic
		topic: String,
	},
}

/// Returns true when `pattern` subscribes with a trailing multi-level
/// wildcard: the bare `#`, or a `<prefix>/#` form.
///
/// No other wildcard forms (`+`, mid-pattern `#`) are recognized.
pub fn is_wildcard(pattern: &str) -> bool {
	pattern == "#" || pattern.ends_with("/#")
}

/// Extracts the single topic level covered by the pattern's trailing `#`.
///
/// `extract_destination("my/notifications/#", "my/notifications/alerts")`
/// yields `alerts`. Zero remaining levels or more than one are errors:
/// the trailing wildcard stands for exactly one destination level.
pub fn extract_destination<'t>(
	pattern: &str,
	topic: &'t str,
) -> Result<&'t str, DestinationError> {
	if !is_wildcard(pattern) {
		return Err(DestinationError::NotWildcard {
			pattern: pattern.to_owned(),
		});
	}

	// Bare `#` subscription: the whole topic is the destination level.
	if pattern == "#" {
		if topic.contains('/') {
			return Err(DestinationError::TooManyLevels {
				pattern: pattern.to_owned(),
				topic: topic.to_owned(),
			});
		}
		if topic.is_empty() {
			return Err(DestinationError::NoRemainder {
				pattern: pattern.to_owned(),
				topic: topic.to_owned(),
			});
		}
		return Ok(topic);
	}

	let base = &pattern[.. pattern.len() - 2];
	let Some(remainder) = topic.strip_prefix(base) else {
		return Err(DestinationError::PrefixMismatch {
			pattern: pattern.to_owned(),
			topic: topic.to_owned(),
		});
	};

	let remainder = remainder.strip_prefix('/').unwrap_or(remainder);
	if remainder.is_empty() {
		return Err(DestinationError::NoRemainder {
			pattern: pattern.to_owned(),
			topic: topic.to_owned(),
		});
	}
	if remainder.contains('/') {
		return Err(DestinationError::TooManyLevels {
			pattern: pattern.to_owned(),
			topic: topic.to_owned(),
		});
	}
	Ok(remainder)
}
