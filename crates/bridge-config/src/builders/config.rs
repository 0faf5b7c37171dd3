//! Fluent construction of [`Config`] values for tests.
//!
//! The default configuration targets regtest through the in-memory `mock`
//! node with the JSON-RPC server disabled.

use crate::{AccountConfig, ApiConfig, BridgeConfig, Config, NodeConfig};
use bridge_types::{Network, SecretString};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	bridge_id: String,
	network: Network,
	min_confirmations: u64,
	fee_satoshis: u64,
	node_primary: String,
	node_implementation: toml::Value,
	request_timeout_seconds: u64,
	keys: Vec<SecretString>,
	api: Option<ApiConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			bridge_id: "test-bridge".to_string(),
			network: Network::Regtest,
			min_confirmations: 6,
			fee_satoshis: 100_000,
			node_primary: "mock".to_string(),
			node_implementation: toml::Value::Table(toml::Table::new()),
			request_timeout_seconds: 5,
			keys: Vec::new(),
			api: None,
		}
	}

	pub fn bridge_id(mut self, id: impl Into<String>) -> Self {
		self.bridge_id = id.into();
		self
	}

	pub fn network(mut self, network: Network) -> Self {
		self.network = network;
		self
	}

	pub fn min_confirmations(mut self, confirmations: u64) -> Self {
		self.min_confirmations = confirmations;
		self
	}

	pub fn fee_satoshis(mut self, fee: u64) -> Self {
		self.fee_satoshis = fee;
		self
	}

	/// Sets the primary node implementation and its TOML table.
	pub fn node(mut self, primary: impl Into<String>, config: toml::Value) -> Self {
		self.node_primary = primary.into();
		self.node_implementation = config;
		self
	}

	pub fn request_timeout_seconds(mut self, seconds: u64) -> Self {
		self.request_timeout_seconds = seconds;
		self
	}

	pub fn key(mut self, key: impl Into<SecretString>) -> Self {
		self.keys.push(key.into());
		self
	}

	pub fn api(mut self, api: Option<ApiConfig>) -> Self {
		self.api = api;
		self
	}

	pub fn build(self) -> Config {
		let mut implementations = HashMap::new();
		implementations.insert(self.node_primary.clone(), self.node_implementation);
		Config {
			bridge: BridgeConfig {
				id: self.bridge_id,
				network: self.network,
				min_confirmations: self.min_confirmations,
				fee_satoshis: self.fee_satoshis,
			},
			node: NodeConfig {
				primary: self.node_primary,
				request_timeout_seconds: self.request_timeout_seconds,
				implementations,
			},
			account: AccountConfig { keys: self.keys },
			api: self.api,
		}
	}
}
