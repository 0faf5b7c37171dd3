//! Main entry point for the qtum bridge service.
//!
//! Loads the configuration, builds the bridge engine around the configured
//! node and serves the Ethereum-compatible JSON-RPC API until interrupted.

use bridge_config::Config;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod factory_registry;
mod server;

/// Command-line arguments for the bridge service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started bridge");

	let config_path = args
		.config
		.to_str()
		.ok_or_else(|| format!("Config path is not valid UTF-8: {}", args.config.display()))?;
	let config = Config::from_file(config_path).await?;
	tracing::info!(
		network = %config.bridge.network,
		"Loaded configuration [{}]",
		config.bridge.id
	);

	let engine = Arc::new(factory_registry::build_bridge_from_config(config.clone()).await?);

	match config.api.filter(|api| api.enabled) {
		Some(api_config) => {
			tokio::select! {
				result = server::start_server(api_config, Arc::clone(&engine)) => {
					tracing::info!("API server finished");
					result?;
				}
				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Received shutdown signal");
				}
			}
		},
		None => {
			tracing::warn!("API server disabled, no requests will be served");
			tokio::signal::ctrl_c().await?;
		},
	}

	tracing::info!("Stopped bridge");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn test_args_defaults() {
		let args = Args::parse_from(["bridge"]);
		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_args_custom_values() {
		let args = Args::parse_from(["bridge", "-c", "custom.toml", "--log-level", "debug"]);
		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
	}

	#[tokio::test]
	async fn test_build_bridge_with_file_config() {
		let temp_dir = tempdir().expect("Failed to create temp dir");
		let config_path = temp_dir.path().join("bridge.toml");

		let config_content = r#"
[bridge]
id = "test-file-bridge"
network = "testnet"

[node]
primary = "mock"

[node.implementations.mock]
owned = ["qUbxboqjBRp96j3La8D1RYkyqx5uQbJPoW"]

[account]
keys = ["0x00821d8c8a3627adc68aa4034fea953b2f5da553fab312db3fa274240bd49f35"]

[api]
enabled = true
port = 18545
"#;
		std::fs::write(&config_path, config_content).expect("Failed to write config");

		let config = Config::from_file(config_path.to_str().unwrap())
			.await
			.expect("Failed to load config");
		assert_eq!(config.bridge.id, "test-file-bridge");
		assert_eq!(config.bridge.min_confirmations, 6);

		let engine = factory_registry::build_bridge_from_config(config)
			.await
			.expect("Failed to build bridge");
		assert_eq!(engine.wallets().len().await, 1);
		assert_eq!(engine.config().api.as_ref().map(|api| api.port), Some(18545));
	}
}
