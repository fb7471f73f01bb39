//! Connection-establishment failure tests.

use std::time::{Duration, Instant};

use mqtt_ntfy_bridge::mqtt::{self, MqttError, SessionOptions};

fn dead_broker_options() -> SessionOptions {
	SessionOptions {
		// Nothing listens on port 1, so connections are refused
		// immediately.
		broker_url: "mqtt://127.0.0.1:1".to_owned(),
		topic: "alerts/#".to_owned(),
		client_id: "bridge-test".to_owned(),
		username: None,
		password: None,
		keep_alive: Duration::from_secs(5),
		connect_timeout: Duration::from_secs(2),
		connect_retry_delay: Duration::from_millis(10),
	}
}

#[tokio::test]
async fn connect_exhausted_after_bounded_attempts() {
	let result =
		mqtt::connect_and_subscribe(dead_broker_options(), |_topic, _payload| {
			async {}
		})
		.await;

	match result {
		| Err(MqttError::ConnectExhausted { attempts, .. }) => {
			assert_eq!(attempts, 3);
		}
		| Err(other) => panic!("expected ConnectExhausted, got {other:?}"),
		| Ok(_) => panic!("connection to a dead broker must fail"),
	}
}

#[tokio::test]
async fn retry_delays_grow_linearly() {
	let start = Instant::now();
	let _ = mqtt::connect_and_subscribe(
		dead_broker_options(),
		|_topic, _payload| async {},
	)
	.await;

	// Two waits between three attempts: 1x + 2x the base delay.
	assert!(start.elapsed() >= Duration::from_millis(30));
}
