//! MQTT subscription module
//!
//! Owns the broker connection lifecycle: connect with bounded retry,
//! subscribe with SUBACK verification, per-message callback dispatch on
//! the event-loop task, graceful disconnect.

pub mod connection;
pub mod error;
pub mod session;

pub use connection::MqttConnection;
pub use error::MqttError;
pub use session::{SessionOptions, connect_and_subscribe};
