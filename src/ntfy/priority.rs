//! Payload priority prefix
//!
//! Publishers may start a payload with a two-character `<code>|`
//! directive to pick the notification priority per message:
//! `r|disk failing` sends `disk failing` at priority 5.

/// Maps a priority code to the ntfy priority level it selects.
///
/// The table is a fixed contract with the ntfy priority scale: digits
/// pass through, `g` is the general level, `y` and `o` are the two
/// elevated aliases, `r` is critical. Do not generalize it.
fn level_for_code(code: u8) -> Option<&'static str> {
	match code {
		| b'1' => Some("1"),
		| b'2' => Some("2"),
		| b'3' => Some("3"),
		| b'4' => Some("4"),
		| b'5' => Some("5"),
		| b'g' => Some("2"),
		| b'y' | b'o' => Some("4"),
		| b'r' => Some("5"),
		| _ => None,
	}
}

/// Splits an optional `<code>|` prefix off `message` and resolves the
/// effective priority.
///
/// Only the first two bytes are inspected, once. Anything that is not a
/// recognized code followed by exactly `|` — a short message, another
/// separator, an unknown code — leaves the message and the default
/// priority untouched: malformed input degrades to pass-through, never
/// to an error. A recognized prefix on an otherwise empty message yields
/// an empty cleaned message.
pub fn parse_priority<'a>(
	message: &'a str,
	default: Option<&'a str>,
) -> (&'a str, Option<&'a str>) {
	let bytes = message.as_bytes();
	if bytes.len() < 2 || bytes[1] != b'|' {
		return (message, default);
	}
	match level_for_code(bytes[0]) {
		// Both prefix bytes are ASCII, so the slice stays on a char
		// boundary.
		| Some(level) => (&message[2 ..], Some(level)),
		| None => (message, default),
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::parse_priority;

	#[rstest]
	#[case("1|Quiet", Some("3"), "Quiet", Some("1"))]
	#[case("5|Loud", Some("3"), "Loud", Some("5"))]
	#[case("g|msg", Some("2"), "msg", Some("2"))]
	#[case("g|msg", None, "msg", Some("2"))]
	#[case("y|heads up", Some("3"), "heads up", Some("4"))]
	#[case("o|heads up", Some("3"), "heads up", Some("4"))]
	#[case("r|Alert!", Some("3"), "Alert!", Some("5"))]
	#[case("no prefix", Some("3"), "no prefix", Some("3"))]
	#[case("no prefix", None, "no prefix", None)]
	#[case("x|bad", Some("3"), "x|bad", Some("3"))]
	#[case("1-not a prefix", Some("3"), "1-not a prefix", Some("3"))]
	#[case("", Some("3"), "", Some("3"))]
	#[case("r", Some("3"), "r", Some("3"))]
	#[case("6|out of range", Some("3"), "6|out of range", Some("3"))]
	fn parse_cases(
		#[case] message: &str,
		#[case] default: Option<&str>,
		#[case] cleaned: &str,
		#[case] priority: Option<&str>,
	) {
		assert_eq!(parse_priority(message, default), (cleaned, priority));
	}

	#[test]
	fn valid_code_with_empty_remainder_clears_message() {
		assert_eq!(parse_priority("r|", Some("3")), ("", Some("5")));
	}

	#[test]
	fn only_the_first_prefix_is_consumed() {
		assert_eq!(
			parse_priority("1|5|nested", Some("3")),
			("5|nested", Some("1"))
		);
	}

	#[test]
	fn multibyte_first_character_passes_through() {
		assert_eq!(parse_priority("é|x", Some("3")), ("é|x", Some("3")));
	}
}
