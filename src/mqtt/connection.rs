//! Broker connection handle
//!
//! Lifecycle management separated from session establishment: the handle
//! owns the event-loop task and provides graceful disconnect.

use std::time::Duration;

use rumqttc::AsyncClient;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Handle to an established, subscribed broker session.
///
/// Keep it alive for the duration of the bridge and call
/// [`disconnect`](Self::disconnect) once on shutdown.
pub struct MqttConnection {
	client: AsyncClient,
	event_loop_handle: Option<JoinHandle<()>>,
}

impl MqttConnection {
	pub(crate) fn new(
		client: AsyncClient,
		event_loop_handle: JoinHandle<()>,
	) -> Self {
		Self {
			client,
			event_loop_handle: Some(event_loop_handle),
		}
	}

	/// Gracefully tears down the session:
	/// 1. Sends the MQTT DISCONNECT packet; the event loop terminates on
	///    observing it.
	/// 2. Waits up to `quiesce` for the event loop to drain in-flight
	///    work, then aborts it.
	///
	/// Idempotent: calling it again after disconnection is a no-op.
	pub async fn disconnect(&mut self, quiesce: Duration) {
		let Some(mut handle) = self.event_loop_handle.take() else {
			return;
		};

		if let Err(e) = self.client.disconnect().await {
			// The event loop may already be gone; still await the task.
			warn!(error = %e, "Failed to send MQTT disconnect");
		}

		match tokio::time::timeout(quiesce, &mut handle).await {
			| Ok(Ok(())) => {}
			| Ok(Err(e)) => {
				warn!(error = %e, "MQTT event loop task failed");
			}
			| Err(_) => {
				warn!(
					quiesce_ms = quiesce.as_millis() as u64,
					"MQTT event loop did not drain within the quiesce \
					 budget, aborting"
				);
				handle.abort();
			}
		}
	}
}

impl Drop for MqttConnection {
	fn drop(&mut self) {
		if self.event_loop_handle.is_some() {
			error!(
				"MqttConnection dropped without calling disconnect(). \
				 Please call disconnect() and await its completion before \
				 dropping."
			);
		}
	}
}
