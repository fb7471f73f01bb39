//! Bridge configuration
//!
//! A TOML file, environment variables and command-line flags merged with
//! flag > environment > file precedence, then validated and normalized.
//! Loading happens once at startup; the result is immutable for the
//! process lifetime.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::ntfy::RetryPolicy;

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
	/// The config file could not be read
	#[error("failed to read config file '{path}': {source}")]
	Read {
		/// Path that was attempted
		path: String,
		/// The underlying I/O error
		#[source]
		source: std::io::Error,
	},

	/// The config file is not valid TOML for this schema
	#[error("failed to parse config file '{path}': {source}")]
	Parse {
		/// Path that was attempted
		path: String,
		/// The underlying TOML error
		#[source]
		source: toml::de::Error,
	},

	/// A required setting is absent after merging file, environment and
	/// flags
	#[error("{setting} is required (use {flag}, the config file, or both)")]
	Missing {
		/// Human name of the setting
		setting: &'static str,
		/// The flag that would provide it
		flag: &'static str,
	},

	/// The broker URL could not be understood
	#[error("invalid MQTT broker URL '{url}': {reason}")]
	InvalidBrokerUrl {
		/// The URL as given
		url: String,
		/// Why it was rejected
		reason: String,
	},
}

fn default_connect_timeout_secs() -> u64 {
	30
}
fn default_keep_alive_secs() -> u64 {
	60
}
fn default_connect_retry_delay_ms() -> u64 {
	1000
}
fn default_ntfy_timeout_secs() -> u64 {
	10
}
fn default_max_attempts() -> u32 {
	3
}
fn default_retry_delay_ms() -> u64 {
	1000
}
fn default_retry_max_delay_secs() -> u64 {
	30
}

/// Broker-side settings, the `[mqtt]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MqttSettings {
	/// Broker address; scheme and default port are filled in when absent.
	#[serde(default)]
	pub broker: String,
	/// Subscription topic pattern.
	#[serde(default)]
	pub topic: String,
	/// Optional username credential.
	#[serde(default)]
	pub username: Option<String>,
	/// Optional password credential.
	#[serde(default)]
	pub password: Option<String>,
	/// Client identifier; generated per process when not set.
	#[serde(default)]
	pub client_id: Option<String>,
	/// Budget for a single connection attempt, in seconds.
	#[serde(default = "default_connect_timeout_secs")]
	pub connect_timeout_secs: u64,
	/// Keep-alive interval, in seconds.
	#[serde(default = "default_keep_alive_secs")]
	pub keep_alive_secs: u64,
	/// Base delay between connection attempts, in milliseconds.
	#[serde(default = "default_connect_retry_delay_ms")]
	pub connect_retry_delay_ms: u64,
}

impl Default for MqttSettings {
	fn default() -> Self {
		Self {
			broker: String::new(),
			topic: String::new(),
			username: None,
			password: None,
			client_id: None,
			connect_timeout_secs: default_connect_timeout_secs(),
			keep_alive_secs: default_keep_alive_secs(),
			connect_retry_delay_ms: default_connect_retry_delay_ms(),
		}
	}
}

impl MqttSettings {
	/// Budget for a single connection attempt.
	pub fn connect_timeout(&self) -> Duration {
		Duration::from_secs(self.connect_timeout_secs)
	}

	/// Keep-alive interval.
	pub fn keep_alive(&self) -> Duration {
		Duration::from_secs(self.keep_alive_secs)
	}

	/// Base delay between connection attempts.
	pub fn connect_retry_delay(&self) -> Duration {
		Duration::from_millis(self.connect_retry_delay_ms)
	}
}

/// Notification-side settings, the `[ntfy]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NtfySettings {
	/// Base URL for wildcard subscriptions, or the full topic URL for a
	/// fixed subscription.
	#[serde(default)]
	pub url: String,
	/// Access token, passed through opaquely as a bearer token.
	#[serde(default)]
	pub auth_token: Option<String>,
	/// Default priority when the payload carries no prefix; absent means
	/// no `Priority` header.
	#[serde(default)]
	pub priority: Option<String>,
	/// Per-attempt HTTP timeout, in seconds.
	#[serde(default = "default_ntfy_timeout_secs")]
	pub timeout_secs: u64,
	/// Total delivery attempts per message.
	#[serde(default = "default_max_attempts")]
	pub max_attempts: u32,
	/// Delay before the second delivery attempt, in milliseconds.
	#[serde(default = "default_retry_delay_ms")]
	pub retry_delay_ms: u64,
	/// Cap on the backoff delay, in seconds.
	#[serde(default = "default_retry_max_delay_secs")]
	pub retry_max_delay_secs: u64,
}

impl Default for NtfySettings {
	fn default() -> Self {
		Self {
			url: String::new(),
			auth_token: None,
			priority: None,
			timeout_secs: default_ntfy_timeout_secs(),
			max_attempts: default_max_attempts(),
			retry_delay_ms: default_retry_delay_ms(),
			retry_max_delay_secs: default_retry_max_delay_secs(),
		}
	}
}

impl NtfySettings {
	/// Per-attempt HTTP timeout.
	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}

	/// The delivery retry schedule.
	pub fn retry_policy(&self) -> RetryPolicy {
		RetryPolicy {
			max_attempts: self.max_attempts.max(1),
			base_delay: Duration::from_millis(self.retry_delay_ms),
			max_delay: Duration::from_secs(self.retry_max_delay_secs),
		}
	}
}

/// Override values collected from flags and environment variables.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
	/// Overrides `mqtt.broker`.
	pub mqtt_broker: Option<String>,
	/// Overrides `mqtt.topic`.
	pub mqtt_topic: Option<String>,
	/// Overrides `mqtt.username`.
	pub mqtt_username: Option<String>,
	/// Overrides `mqtt.password`.
	pub mqtt_password: Option<String>,
	/// Overrides `ntfy.url`.
	pub ntfy_url: Option<String>,
	/// Overrides `ntfy.auth_token`.
	pub ntfy_auth_token: Option<String>,
	/// Overrides `ntfy.priority`.
	pub ntfy_priority: Option<String>,
}

/// Root configuration: the `[mqtt]` and `[ntfy]` tables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
	/// Broker-side settings.
	#[serde(default)]
	pub mqtt: MqttSettings,
	/// Notification-side settings.
	#[serde(default)]
	pub ntfy: NtfySettings,
}

impl BridgeConfig {
	/// Reads and parses a TOML config file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let data = std::fs::read_to_string(path).map_err(|source| {
			ConfigError::Read {
				path: path.display().to_string(),
				source,
			}
		})?;
		toml::from_str(&data).map_err(|source| ConfigError::Parse {
			path: path.display().to_string(),
			source,
		})
	}

	/// Applies override values on top of the loaded config. Flags and
	/// environment variables win over the file.
	pub fn apply_overrides(&mut self, overrides: Overrides) {
		if let Some(broker) = overrides.mqtt_broker {
			self.mqtt.broker = broker;
		}
		if let Some(topic) = overrides.mqtt_topic {
			self.mqtt.topic = topic;
		}
		if let Some(username) = overrides.mqtt_username {
			self.mqtt.username = Some(username);
		}
		if let Some(password) = overrides.mqtt_password {
			self.mqtt.password = Some(password);
		}
		if let Some(url) = overrides.ntfy_url {
			self.ntfy.url = url;
		}
		if let Some(token) = overrides.ntfy_auth_token {
			self.ntfy.auth_token = Some(token);
		}
		if let Some(priority) = overrides.ntfy_priority {
			self.ntfy.priority = Some(priority);
		}
	}

	/// Checks required settings and normalizes the broker URL.
	pub fn finalize(mut self) -> Result<Self, ConfigError> {
		if self.mqtt.broker.is_empty() {
			return Err(ConfigError::Missing {
				setting: "MQTT broker",
				flag: "--mqtt-broker",
			});
		}
		if self.mqtt.topic.is_empty() {
			return Err(ConfigError::Missing {
				setting: "MQTT topic",
				flag: "--mqtt-topic",
			});
		}
		if self.ntfy.url.is_empty() {
			return Err(ConfigError::Missing {
				setting: "ntfy URL",
				flag: "--ntfy-url",
			});
		}
		self.mqtt.broker = normalize_broker_url(&self.mqtt.broker)?;
		Ok(self)
	}
}

/// Fills in the broker URL scheme and default port: `localhost` becomes
/// `mqtt://localhost:1883`.
///
/// Legacy `tcp`/`ssl` schemes map to `mqtt`/`mqtts`; TLS defaults to
/// port 8883.
pub fn normalize_broker_url(broker: &str) -> Result<String, ConfigError> {
	let invalid = |reason: String| ConfigError::InvalidBrokerUrl {
		url: broker.to_owned(),
		reason,
	};

	if broker.is_empty() {
		return Err(invalid("broker URL cannot be empty".to_owned()));
	}

	let with_scheme = if broker.contains("://") {
		broker.to_owned()
	} else {
		format!("mqtt://{broker}")
	};
	let mut parsed =
		Url::parse(&with_scheme).map_err(|e| invalid(e.to_string()))?;

	let scheme = match parsed.scheme() {
		| "mqtt" | "tcp" => "mqtt",
		| "mqtts" | "ssl" => "mqtts",
		| other => {
			return Err(invalid(format!("unsupported scheme '{other}'")));
		}
	};
	if parsed.set_scheme(scheme).is_err() {
		return Err(invalid(format!("unable to apply scheme '{scheme}'")));
	}

	if parsed.host_str().unwrap_or("").is_empty() {
		return Err(invalid("broker URL has no host".to_owned()));
	}
	if parsed.port().is_none() {
		let default_port = if scheme == "mqtts" { 8883 } else { 1883 };
		if parsed.set_port(Some(default_port)).is_err() {
			return Err(invalid("unable to apply default port".to_owned()));
		}
	}

	Ok(parsed.to_string())
}
