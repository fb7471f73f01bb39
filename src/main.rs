//! mqtt-ntfy-bridge binary: configuration merge, tracing setup, signal
//! handling, and the bridge wiring.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use mqtt_ntfy_bridge::bridge::Bridge;
use mqtt_ntfy_bridge::config::{BridgeConfig, Overrides};
use mqtt_ntfy_bridge::mqtt::{self, SessionOptions};
use mqtt_ntfy_bridge::ntfy::NtfyClient;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Forward MQTT messages to an ntfy push-notification endpoint.
#[derive(Debug, Parser)]
#[command(name = "mqtt-ntfy-bridge", version, about)]
struct Args {
	/// Path to a TOML configuration file
	#[arg(long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// MQTT broker address (host, host:port, or mqtt[s]:// URL)
	#[arg(long)]
	mqtt_broker: Option<String>,

	/// MQTT subscription topic pattern
	#[arg(long)]
	mqtt_topic: Option<String>,

	/// MQTT username
	#[arg(long, env = "MQTT_USERNAME")]
	mqtt_username: Option<String>,

	/// MQTT password
	#[arg(long, env = "MQTT_PASSWORD", hide_env_values = true)]
	mqtt_password: Option<String>,

	/// ntfy base URL (wildcard subscription) or topic URL (fixed)
	#[arg(long)]
	ntfy_url: Option<String>,

	/// ntfy access token
	#[arg(long, env = "NTFY_AUTH_TOKEN", hide_env_values = true)]
	ntfy_auth_token: Option<String>,

	/// Default notification priority when the payload has no prefix
	#[arg(long)]
	ntfy_priority: Option<String>,

	/// Enable debug logging
	#[arg(long, short)]
	verbose: bool,
}

fn init_tracing(verbose: bool) {
	let filter = if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| EnvFilter::new("info"))
	};
	tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Unique client id per process, to avoid broker-side id collisions.
fn generated_client_id() -> String {
	let uuid = uuid::Uuid::new_v4().simple().to_string();
	format!("mqtt-ntfy-bridge-{}", &uuid[.. 8])
}

/// Completes on SIGINT or, on unix, SIGTERM.
async fn wait_for_shutdown() {
	#[cfg(unix)]
	{
		use tokio::signal::unix::{SignalKind, signal};
		let mut sigterm = signal(SignalKind::terminate())
			.expect("failed to install SIGTERM handler");
		tokio::select! {
			_ = tokio::signal::ctrl_c() => {}
			_ = sigterm.recv() => {}
		}
	}
	#[cfg(not(unix))]
	{
		let _ = tokio::signal::ctrl_c().await;
	}
}

async fn run(args: Args) -> anyhow::Result<()> {
	let mut config = match &args.config {
		| Some(path) => BridgeConfig::load(path)?,
		| None => BridgeConfig::default(),
	};
	config.apply_overrides(Overrides {
		mqtt_broker: args.mqtt_broker,
		mqtt_topic: args.mqtt_topic,
		mqtt_username: args.mqtt_username,
		mqtt_password: args.mqtt_password,
		ntfy_url: args.ntfy_url,
		ntfy_auth_token: args.ntfy_auth_token,
		ntfy_priority: args.ntfy_priority,
	});
	let config = config.finalize()?;

	info!(
		broker = %config.mqtt.broker,
		topic = %config.mqtt.topic,
		ntfy_url = %config.ntfy.url,
		"Starting mqtt-ntfy-bridge"
	);

	let client =
		NtfyClient::new(config.ntfy.timeout(), config.ntfy.retry_policy())
			.context("failed to build notification client")?;
	let bridge = Arc::new(Bridge::new(
		config.mqtt.topic.clone(),
		config.ntfy.url.clone(),
		config.ntfy.auth_token.clone(),
		config.ntfy.priority.clone(),
		client,
	));

	let options = SessionOptions {
		broker_url: config.mqtt.broker.clone(),
		topic: config.mqtt.topic.clone(),
		client_id: config
			.mqtt
			.client_id
			.clone()
			.unwrap_or_else(generated_client_id),
		username: config.mqtt.username.clone(),
		password: config.mqtt.password.clone(),
		keep_alive: config.mqtt.keep_alive(),
		connect_timeout: config.mqtt.connect_timeout(),
		connect_retry_delay: config.mqtt.connect_retry_delay(),
	};

	let handler_bridge = Arc::clone(&bridge);
	let mut connection =
		mqtt::connect_and_subscribe(options, move |topic, payload| {
			let bridge = Arc::clone(&handler_bridge);
			async move {
				if let Err(err) =
					bridge.handle_message(&topic, &payload).await
				{
					error!(
						topic = %topic,
						error = %err,
						"Failed to forward message, dropping"
					);
				}
			}
		})
		.await
		.context("failed to establish MQTT session")?;

	wait_for_shutdown().await;
	info!("Shutdown signal received, disconnecting from MQTT");
	connection.disconnect(Duration::from_secs(1)).await;
	info!("Shutdown complete");
	Ok(())
}

#[tokio::main]
async fn main() {
	let args = Args::parse();
	init_tracing(args.verbose);

	if let Err(err) = run(args).await {
		error!(error = %format!("{err:#}"), "Fatal error");
		std::process::exit(1);
	}
}
