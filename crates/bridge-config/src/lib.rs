//! Configuration for the qtum bridge.
//!
//! Configuration is TOML. It names the UTXO network the bridge targets, the
//! node implementation used to reach it, private keys to import at startup
//! and the JSON-RPC server settings.
//!
//! ## Modular Configuration Support
//!
//! A config may be split across files with `include = ["node.toml", ...]`.
//! Each top-level section may appear in only one file.
//!
//! `${VAR}` and `${VAR:-default}` are substituted from the environment
//! before parsing.

mod loader;

#[cfg(any(test, feature = "testing"))]
pub mod builders;

use bridge_types::{Network, SecretString};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// The full error embeds the whole input; keep only the message.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	pub bridge: BridgeConfig,
	pub node: NodeConfig,
	#[serde(default)]
	pub account: AccountConfig,
	pub api: Option<ApiConfig>,
}

/// Translation engine settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BridgeConfig {
	/// Instance identifier, used in logs.
	pub id: String,
	/// UTXO network whose address encoding is used.
	#[serde(default)]
	pub network: Network,
	/// Outputs with fewer confirmations are never spent.
	#[serde(default = "default_min_confirmations")]
	pub min_confirmations: u64,
	/// Fixed fee paid by every transaction, in satoshis.
	#[serde(default = "default_fee_satoshis")]
	pub fee_satoshis: u64,
}

fn default_min_confirmations() -> u64 {
	6
}

fn default_fee_satoshis() -> u64 {
	100_000
}

/// UTXO-chain node access.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
	/// Which entry of `implementations` the bridge talks to.
	pub primary: String,
	/// Per-call deadline for node RPCs.
	#[serde(default = "default_node_timeout")]
	pub request_timeout_seconds: u64,
	/// Implementation name to its raw TOML table, validated by the
	/// implementation's own schema at startup.
	pub implementations: HashMap<String, toml::Value>,
}

fn default_node_timeout() -> u64 {
	30
}

/// Keys imported into the wallet registry at startup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AccountConfig {
	#[serde(default)]
	pub keys: Vec<SecretString>,
}

/// JSON-RPC server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	#[serde(default)]
	pub enabled: bool,
	#[serde(default = "default_api_host")]
	pub host: String,
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Deadline applied to every JSON-RPC request.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// Backend that `/proxy` forwards to. An empty string disables the proxy.
	#[serde(default = "default_proxy_url")]
	pub proxy_url: Option<String>,
	/// Reported by `net_version`.
	#[serde(default = "default_chain_id")]
	pub chain_id: u64,
	/// Reported by `eth_gasPrice`, hex wei.
	#[serde(default = "default_gas_price")]
	pub gas_price: String,
}

impl ApiConfig {
	/// The proxy backend, if one is configured.
	pub fn proxy_url(&self) -> Option<&str> {
		self.proxy_url.as_deref().filter(|url| !url.is_empty())
	}
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			host: default_api_host(),
			port: default_api_port(),
			timeout_seconds: default_api_timeout(),
			proxy_url: default_proxy_url(),
			chain_id: default_chain_id(),
			gas_price: default_gas_price(),
		}
	}
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	8080
}

fn default_api_timeout() -> u64 {
	30
}

fn default_proxy_url() -> Option<String> {
	Some("http://127.0.0.1:7545".to_string())
}

fn default_chain_id() -> u64 {
	8995
}

fn default_gas_price() -> String {
	"0x9184e72a000".to_string()
}

/// Substitutes `${VAR}` and `${VAR:-default}` from the environment.
///
/// Input is capped at 1 MiB so the regex never runs over unbounded text.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;
	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match (std::env::var(var_name.as_str()), cap.get(2)) {
			(Ok(v), _) => v,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					var_name.as_str()
				)));
			},
		};
		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.bridge.id.is_empty() {
			return Err(ConfigError::Validation("Bridge ID cannot be empty".into()));
		}
		if !(1..=100).contains(&self.bridge.min_confirmations) {
			return Err(ConfigError::Validation(format!(
				"min_confirmations must be between 1 and 100, got {}",
				self.bridge.min_confirmations
			)));
		}
		if self.bridge.fee_satoshis == 0 {
			return Err(ConfigError::Validation(
				"fee_satoshis must be greater than 0".into(),
			));
		}

		if self.node.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Node primary implementation cannot be empty".into(),
			));
		}
		if !self.node.implementations.contains_key(&self.node.primary) {
			return Err(ConfigError::Validation(format!(
				"Primary node '{}' not found in implementations",
				self.node.primary
			)));
		}
		if self.node.request_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"Node request_timeout_seconds must be greater than 0".into(),
			));
		}

		if let Some(api) = &self.api {
			if api.port == 0 {
				return Err(ConfigError::Validation(
					"API port must be greater than 0".into(),
				));
			}
			if api.timeout_seconds == 0 {
				return Err(ConfigError::Validation(
					"API timeout_seconds must be greater than 0".into(),
				));
			}
			if !api.gas_price.starts_with("0x") {
				return Err(ConfigError::Validation(format!(
					"API gas_price must be a 0x-prefixed hex quantity, got '{}'",
					api.gas_price
				)));
			}
		}

		Ok(())
	}
}

/// Parses TOML text, resolving environment variables and validating the
/// result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MINIMAL: &str = r#"
[bridge]
id = "bridge-test"

[node]
primary = "mock"
[node.implementations.mock]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("BRIDGE_TEST_HOST", "localhost");
		std::env::set_var("BRIDGE_TEST_PORT", "3889");

		let input = "url = \"http://${BRIDGE_TEST_HOST}:${BRIDGE_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"http://localhost:3889\"");

		std::env::remove_var("BRIDGE_TEST_HOST");
		std::env::remove_var("BRIDGE_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${BRIDGE_MISSING_VAR:-qtum}\"";
		assert_eq!(resolve_env_vars(input).unwrap(), "value = \"qtum\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("value = \"${BRIDGE_MISSING_VAR}\"");
		assert!(result.unwrap_err().to_string().contains("BRIDGE_MISSING_VAR"));
	}

	#[test]
	fn test_oversized_input_rejected() {
		let input = "#".repeat(1024 * 1024 + 1);
		assert!(matches!(
			resolve_env_vars(&input),
			Err(ConfigError::Validation(_))
		));
	}

	#[test]
	fn test_defaults() {
		let config: Config = MINIMAL.parse().unwrap();
		assert_eq!(config.bridge.network, Network::Regtest);
		assert_eq!(config.bridge.min_confirmations, 6);
		assert_eq!(config.bridge.fee_satoshis, 100_000);
		assert_eq!(config.node.request_timeout_seconds, 30);
		assert!(config.account.keys.is_empty());
		assert!(config.api.is_none());
	}

	#[test]
	fn test_api_defaults_and_proxy_toggle() {
		let config: Config = format!("{}\n[api]\nenabled = true\n", MINIMAL)
			.parse()
			.unwrap();
		let api = config.api.unwrap();
		assert_eq!(api.port, 8080);
		assert_eq!(api.chain_id, 8995);
		assert_eq!(api.gas_price, "0x9184e72a000");
		assert_eq!(api.proxy_url(), Some("http://127.0.0.1:7545"));

		let config: Config = format!("{}\n[api]\nproxy_url = \"\"\n", MINIMAL)
			.parse()
			.unwrap();
		assert_eq!(config.api.unwrap().proxy_url(), None);
	}

	#[test]
	fn test_full_config_with_env_vars() {
		std::env::set_var("BRIDGE_TEST_RPC_PASSWORD", "s3cret");
		let config_str = r#"
[bridge]
id = "bridge-1"
network = "testnet"
min_confirmations = 2
fee_satoshis = 250000

[node]
primary = "qtum"
request_timeout_seconds = 10
[node.implementations.qtum]
rpc_url = "http://127.0.0.1:3889"
rpc_user = "qtum"
rpc_password = "${BRIDGE_TEST_RPC_PASSWORD}"

[account]
keys = ["${BRIDGE_TEST_KEY:-0x00821d8c8a3627adc68aa4034fea953b2f5da553fab312db3fa274240bd49f35}"]
"#;
		let config: Config = config_str.parse().unwrap();
		std::env::remove_var("BRIDGE_TEST_RPC_PASSWORD");

		assert_eq!(config.bridge.network, Network::Testnet);
		assert_eq!(config.bridge.fee_satoshis, 250_000);
		assert_eq!(
			config.node.implementations["qtum"]
				.get("rpc_password")
				.and_then(|v| v.as_str()),
			Some("s3cret")
		);
		assert_eq!(config.account.keys.len(), 1);
		assert!(config.account.keys[0].expose_secret().starts_with("0x0082"));
	}

	#[test]
	fn test_validation_failures() {
		let cases = [
			(MINIMAL.replace("bridge-test", ""), "Bridge ID"),
			(
				MINIMAL.replace("primary = \"mock\"", "primary = \"qtum\""),
				"Primary node 'qtum'",
			),
			(
				MINIMAL.replace("id = \"bridge-test\"", "id = \"b\"\nmin_confirmations = 0"),
				"min_confirmations",
			),
			(
				MINIMAL.replace("id = \"bridge-test\"", "id = \"b\"\nfee_satoshis = 0"),
				"fee_satoshis",
			),
			(
				format!("{}\n[api]\ngas_price = \"100\"\n", MINIMAL),
				"gas_price",
			),
		];
		for (input, expected) in cases {
			let err = input.parse::<Config>().unwrap_err();
			assert!(
				err.to_string().contains(expected),
				"expected '{}' in '{}'",
				expected,
				err
			);
		}
	}

	#[test]
	fn test_unknown_network_is_parse_error() {
		let input = MINIMAL.replace("id = \"bridge-test\"", "id = \"b\"\nnetwork = \"signet\"");
		assert!(matches!(
			input.parse::<Config>(),
			Err(ConfigError::Parse(_))
		));
	}
}
