use super::destination::{
	DestinationError, extract_destination, is_wildcard,
};
use crate::ntfy::url::build_url;

#[test]
fn wildcard_detection() {
	assert!(is_wildcard("#"));
	assert!(is_wildcard("my/notifications/#"));
	assert!(is_wildcard("a/#"));

	assert!(!is_wildcard("my/notifications"));
	assert!(!is_wildcard("my/notifications/"));
	// Only the trailing multi-level form counts as a wildcard here.
	assert!(!is_wildcard("my/+/notifications"));
	assert!(!is_wildcard("#/notifications"));
	assert!(!is_wildcard(""));
}

#[test]
fn non_wildcard_patterns_are_rejected() {
	for pattern in ["my/notifications", "alerts", "my/+/x", ""] {
		let result = extract_destination(pattern, "my/notifications/alerts");
		assert!(
			matches!(result, Err(DestinationError::NotWildcard { .. })),
			"pattern '{pattern}' should be rejected as non-wildcard, got \
			 {result:?}"
		);
	}
}

#[test]
fn extracts_single_trailing_level() {
	assert_eq!(
		extract_destination("my/notifications/#", "my/notifications/alerts"),
		Ok("alerts")
	);
	assert_eq!(extract_destination("a/#", "a/b"), Ok("b"));
}

#[test]
fn bare_hash_takes_whole_single_level_topic() {
	assert_eq!(extract_destination("#", "alerts"), Ok("alerts"));

	let result = extract_destination("#", "alerts/critical");
	assert!(matches!(result, Err(DestinationError::TooManyLevels { .. })));

	let result = extract_destination("#", "");
	assert!(matches!(result, Err(DestinationError::NoRemainder { .. })));
}

#[test]
fn multiple_trailing_levels_are_rejected() {
	let result = extract_destination(
		"my/notifications/#",
		"my/notifications/alerts/critical",
	);
	assert!(matches!(result, Err(DestinationError::TooManyLevels { .. })));
}

#[test]
fn empty_remainder_is_rejected() {
	// Prefix alone, with and without the separating slash.
	for topic in ["my/notifications", "my/notifications/"] {
		let result = extract_destination("my/notifications/#", topic);
		assert!(
			matches!(result, Err(DestinationError::NoRemainder { .. })),
			"topic '{topic}' should have no remainder, got {result:?}"
		);
	}
}

#[test]
fn foreign_prefix_is_rejected() {
	let result = extract_destination("my/notifications/#", "other/alerts");
	assert!(matches!(result, Err(DestinationError::PrefixMismatch { .. })));
}

#[test]
fn extraction_composes_with_url_building() {
	let base = "https://ntfy.example";
	let pattern = "home/notifications/#";

	for suffix in ["alerts", "backups", "doorbell"] {
		let topic = format!("home/notifications/{suffix}");
		let destination = extract_destination(pattern, &topic).unwrap();
		assert_eq!(
			build_url(base, destination).unwrap(),
			format!("{base}/{suffix}")
		);
	}
}
