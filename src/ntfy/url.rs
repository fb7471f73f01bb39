//! Delivery-URL construction

use thiserror::Error;

/// Errors from composing the delivery URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlError {
	/// The configured base URL is empty
	#[error("notification base URL cannot be empty")]
	EmptyBase,

	/// The destination topic is empty
	#[error("notification topic cannot be empty")]
	EmptyKey,
}

/// Joins the configured base URL and a destination topic:
/// `https://ntfy.example/` + `alerts` yields
/// `https://ntfy.example/alerts`.
///
/// Exactly one trailing `/` is stripped from the base. Destination keys
/// are topic segments and assumed URL-safe; no escaping is applied.
pub fn build_url(base: &str, key: &str) -> Result<String, UrlError> {
	if base.is_empty() {
		return Err(UrlError::EmptyBase);
	}
	if key.is_empty() {
		return Err(UrlError::EmptyKey);
	}
	let base = base.strip_suffix('/').unwrap_or(base);
	Ok(format!("{base}/{key}"))
}
