//! # mqtt-ntfy-bridge
//!
//! Forwards messages from an MQTT topic subscription to an
//! ntfy-compatible push-notification endpoint.
//!
//! The pipeline, one message at a time:
//!
//! 1. [`topic`] — derive the destination topic from the trailing level of
//!    a wildcard subscription (`home/alerts/#` + `home/alerts/backups`
//!    yields `backups`).
//! 2. [`ntfy::priority`] — split an optional `<code>|` priority prefix
//!    off the payload (`r|disk failing` delivers `disk failing` at
//!    priority 5).
//! 3. [`ntfy::url`] — compose the delivery URL from the configured base
//!    URL and the destination.
//! 4. [`ntfy::client`] — POST the message, retrying transient failures
//!    with exponential backoff.
//!
//! [`mqtt`] owns the broker session (bounded connect retry, subscribe
//! with SUBACK verification, graceful disconnect) and invokes the
//! pipeline inline for every inbound publish: messages are processed in
//! arrival order, and a slow notification endpoint throttles consumption
//! from the broker instead of queueing in memory. A failure while
//! processing one message never affects the subscription or subsequent
//! messages.

#![warn(missing_docs)]

// Core modules
pub mod bridge;
pub mod config;
pub mod mqtt;
pub mod ntfy;
pub mod topic;

// Pipeline composition
pub use bridge::{Bridge, BridgeError};
// Configuration loading and merging
pub use config::{BridgeConfig, ConfigError};
// Broker session lifecycle
pub use mqtt::{MqttConnection, MqttError, SessionOptions};
// Notification delivery
pub use ntfy::{DeliveryError, DeliveryTarget, NtfyClient, RetryPolicy};
// Destination extraction
pub use topic::DestinationError;
