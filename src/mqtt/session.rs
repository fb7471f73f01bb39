//! Session establishment and the event loop
//!
//! Connection attempts are bounded: the session either comes up
//! connected and subscribed, or startup fails. After that, every inbound
//! publish is handed to the message callback inline on the event-loop
//! task, one at a time in arrival order.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use rumqttc::Event::{Incoming, Outgoing};
use rumqttc::{
	AsyncClient, ConnectReturnCode, EventLoop, MqttOptions, Packet, QoS,
	SubscribeReasonCode,
};
use tokio::time;
use tracing::{debug, error, info, warn};

use super::connection::MqttConnection;
use super::error::MqttError;

/// Connection attempts before startup gives up.
const CONNECT_ATTEMPTS: u32 = 3;
/// Request channel capacity between the client handle and the event loop.
const EVENT_LOOP_CAPACITY: usize = 10;
/// Consecutive poll errors tolerated after subscription before the event
/// loop terminates.
const MAX_CONSECUTIVE_ERRORS: u32 = 10;
const INITIAL_POLL_RETRY_DELAY: Duration = Duration::from_millis(100);
const MAX_POLL_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Connection parameters for one bridge session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
	/// Normalized broker URL, scheme and port present.
	pub broker_url: String,
	/// Subscription topic pattern.
	pub topic: String,
	/// Client identifier presented to the broker.
	pub client_id: String,
	/// Optional username credential.
	pub username: Option<String>,
	/// Optional password credential.
	pub password: Option<String>,
	/// MQTT keep-alive interval.
	pub keep_alive: Duration,
	/// Budget for a single connection attempt.
	pub connect_timeout: Duration,
	/// Base delay between connection attempts; the wait after attempt n
	/// is n times this long.
	pub connect_retry_delay: Duration,
}

impl SessionOptions {
	/// Builds the rumqttc options, carrying the client id in the URL.
	fn mqtt_options(&self) -> Result<MqttOptions, MqttError> {
		let url = if self.broker_url.contains('?') {
			format!("{}&client_id={}", self.broker_url, self.client_id)
		} else {
			format!("{}?client_id={}", self.broker_url, self.client_id)
		};
		let mut options = MqttOptions::parse_url(url)?;
		options.set_keep_alive(self.keep_alive);
		if let (Some(user), Some(pass)) = (&self.username, &self.password) {
			options.set_credentials(user.clone(), pass.clone());
		}
		Ok(options)
	}
}

/// Connects, subscribes to the configured pattern, and spawns the event
/// loop that feeds every inbound publish to `on_message`.
///
/// `on_message` is awaited inline on the event-loop task: messages are
/// processed one at a time in arrival order, and a slow handler
/// throttles consumption from the broker instead of queueing in memory.
pub async fn connect_and_subscribe<F, Fut>(
	options: SessionOptions,
	mut on_message: F,
) -> Result<MqttConnection, MqttError>
where
	F: FnMut(String, Bytes) -> Fut + Send + 'static,
	Fut: Future<Output = ()> + Send + 'static,
{
	let mqtt_options = options.mqtt_options()?;
	let (client, mut event_loop) =
		AsyncClient::new(mqtt_options, EVENT_LOOP_CAPACITY);

	wait_for_connack(&mut event_loop, &options).await?;
	info!(broker = %options.broker_url, "Connected to MQTT broker");

	subscribe(&client, &mut event_loop, &options, &mut on_message).await?;
	info!(topic = %options.topic, "Subscribed to topic pattern");

	let event_loop_handle = tokio::spawn(async move {
		run(event_loop, on_message).await;
	});

	Ok(MqttConnection::new(client, event_loop_handle))
}

/// Drives the event loop until a successful CONNACK, retrying failed
/// attempts with linearly increasing delay.
async fn wait_for_connack(
	event_loop: &mut EventLoop,
	options: &SessionOptions,
) -> Result<(), MqttError> {
	let mut attempt: u32 = 1;
	loop {
		let poll = time::timeout(options.connect_timeout, event_loop.poll());
		let failure = match poll.await {
			| Ok(Ok(Incoming(Packet::ConnAck(ack)))) => {
				if ack.code == ConnectReturnCode::Success {
					return Ok(());
				}
				format!("broker refused connection: {:?}", ack.code)
			}
			| Ok(Ok(event)) => {
				debug!(event = ?event, "MQTT event while connecting");
				continue;
			}
			| Ok(Err(err)) => err.to_string(),
			| Err(_) => format!(
				"connection attempt timed out after {:?}",
				options.connect_timeout
			),
		};

		warn!(
			attempt,
			max_attempts = CONNECT_ATTEMPTS,
			error = %failure,
			"MQTT connection attempt failed"
		);
		if attempt >= CONNECT_ATTEMPTS {
			return Err(MqttError::ConnectExhausted {
				attempts: CONNECT_ATTEMPTS,
				last_error: failure,
			});
		}
		time::sleep(options.connect_retry_delay * attempt).await;
		attempt += 1;
	}
}

/// Issues the SUBSCRIBE and waits for the broker's SUBACK.
///
/// A send failure or a SUBACK failure code disconnects immediately: the
/// session never stays connected without its subscription. Retained
/// messages arriving before the SUBACK are dispatched normally.
async fn subscribe<F, Fut>(
	client: &AsyncClient,
	event_loop: &mut EventLoop,
	options: &SessionOptions,
	on_message: &mut F,
) -> Result<(), MqttError>
where
	F: FnMut(String, Bytes) -> Fut + Send,
	Fut: Future<Output = ()> + Send,
{
	if let Err(err) =
		client.subscribe(options.topic.as_str(), QoS::AtMostOnce).await
	{
		disconnect_after_subscribe_failure(client).await;
		return Err(MqttError::SubscribeFailed {
			topic: options.topic.clone(),
			reason: err.to_string(),
		});
	}

	loop {
		match event_loop.poll().await {
			| Ok(Incoming(Packet::SubAck(ack))) => {
				match ack.return_codes.first() {
					| Some(SubscribeReasonCode::Success(_)) => return Ok(()),
					| other => {
						disconnect_after_subscribe_failure(client).await;
						return Err(MqttError::SubscribeFailed {
							topic: options.topic.clone(),
							reason: format!(
								"broker rejected subscription: {other:?}"
							),
						});
					}
				}
			}
			| Ok(Incoming(Packet::Publish(publish))) => {
				on_message(publish.topic, publish.payload).await;
			}
			| Ok(event) => {
				debug!(event = ?event, "MQTT event while awaiting SUBACK");
			}
			| Err(err) => {
				disconnect_after_subscribe_failure(client).await;
				return Err(MqttError::SubscribeFailed {
					topic: options.topic.clone(),
					reason: err.to_string(),
				});
			}
		}
	}
}

/// The session never leaves a connected-but-unsubscribed handle alive.
async fn disconnect_after_subscribe_failure(client: &AsyncClient) {
	if let Err(err) = client.disconnect().await {
		warn!(error = %err, "Failed to disconnect after subscribe failure");
	}
}

/// Main event loop: dispatches publishes until a DISCONNECT packet
/// (incoming or outgoing) terminates the session.
async fn run<F, Fut>(mut event_loop: EventLoop, mut on_message: F)
where
	F: FnMut(String, Bytes) -> Fut + Send,
	Fut: Future<Output = ()> + Send,
{
	let mut error_count: u32 = 0;

	loop {
		match event_loop.poll().await {
			| Ok(Incoming(Packet::Publish(publish))) => {
				error_count = 0;
				debug!(
					topic = %publish.topic,
					payload_size = publish.payload.len(),
					"Received MQTT message"
				);
				// Awaited inline: per-subscription ordering and
				// backpressure toward the broker.
				on_message(publish.topic, publish.payload).await;
			}
			| Ok(Incoming(Packet::Disconnect)) => {
				info!("Received MQTT disconnect from broker");
				break;
			}
			| Ok(Outgoing(rumqttc::Outgoing::Disconnect)) => {
				info!("Sent MQTT disconnect to broker");
				break;
			}
			| Ok(event) => {
				error_count = 0;
				debug!(event = ?event, "MQTT event");
			}
			| Err(err) => {
				error_count += 1;
				error!(error_count, error = %err, "MQTT event loop error");

				if error_count >= MAX_CONSECUTIVE_ERRORS {
					error!(
						error_count,
						max_errors = MAX_CONSECUTIVE_ERRORS,
						"Too many consecutive errors, terminating event loop"
					);
					break;
				}

				let delay = INITIAL_POLL_RETRY_DELAY
					* 2_u32.pow((error_count - 1).min(10));
				let delay = delay.min(MAX_POLL_RETRY_DELAY);

				warn!(delay = ?delay, error_count, "Retrying MQTT connection");
				time::sleep(delay).await;
			}
		}
	}
	info!("MQTT event loop terminated");
}
