//! JSON-RPC client for a qtumd node.
//!
//! qtumd speaks bitcoind-style JSON-RPC 1.0 over HTTP with basic auth. Wallet
//! and node errors arrive as HTTP 500 with a regular JSON-RPC body, so the body
//! is parsed whatever the status code.

use crate::{NodeError, NodeInterface};
use async_trait::async_trait;
use bridge_types::{
	AddressInfo, BlockVerbose, ConfigSchema, Field, FieldType, RawTransactionVerbose, Schema,
	SecretString, TxOutInfo, UnspentOutput, ValidationError, WalletInfo,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Configuration schema for the qtumd client.
pub struct QtumNodeSchema;

impl QtumNodeSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for QtumNodeSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("rpc_url", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
						Ok(())
					},
					_ => Err("rpc_url must be an http(s) URL".to_string()),
				}
			})],
			vec![
				Field::new("rpc_user", FieldType::String),
				Field::new("rpc_password", FieldType::String),
			],
		);
		schema.validate(config)
	}
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
	code: i64,
	message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
	#[serde(default)]
	result: Value,
	#[serde(default)]
	error: Option<RpcErrorBody>,
}

/// HTTP JSON-RPC connection to qtumd.
pub struct QtumRpcNode {
	client: reqwest::Client,
	url: String,
	user: Option<String>,
	password: Option<SecretString>,
	next_id: AtomicU64,
}

impl QtumRpcNode {
	pub fn new(
		url: impl Into<String>,
		user: Option<String>,
		password: Option<SecretString>,
	) -> Result<Self, NodeError> {
		let client = reqwest::Client::builder()
			.pool_idle_timeout(Duration::from_secs(90))
			.pool_max_idle_per_host(10)
			.build()
			.map_err(|e| NodeError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
		Ok(Self {
			client,
			url: url.into(),
			user,
			password,
			next_id: AtomicU64::new(1),
		})
	}

	async fn request(&self, method: &str, params: Value) -> Result<Value, NodeError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let body = json!({
			"jsonrpc": "1.0",
			"id": id,
			"method": method,
			"params": params,
		});
		tracing::trace!(method, id, "Sending node request");

		let mut request = self.client.post(&self.url).json(&body);
		if let Some(user) = &self.user {
			let password = self
				.password
				.as_ref()
				.map(|p| p.expose_secret().to_string());
			request = request.basic_auth(user, password);
		}

		let response = request
			.send()
			.await
			.map_err(|e| NodeError::Network(format!("{} request failed: {}", method, e)))?;
		let status = response.status();
		if status == reqwest::StatusCode::UNAUTHORIZED {
			return Err(NodeError::Network(format!(
				"{} rejected: node credentials not accepted",
				method
			)));
		}
		let text = response
			.text()
			.await
			.map_err(|e| NodeError::Network(format!("{} response unreadable: {}", method, e)))?;

		let parsed: RpcResponse = match serde_json::from_str(&text) {
			Ok(parsed) => parsed,
			Err(_) if !status.is_success() => {
				return Err(NodeError::Network(format!(
					"{} failed with HTTP {}: {}",
					method,
					status,
					text.trim()
				)))
			},
			Err(e) => {
				return Err(NodeError::InvalidResponse(format!(
					"{} returned malformed JSON: {}",
					method, e
				)))
			},
		};

		match parsed.error {
			Some(err) => Err(NodeError::Rpc {
				code: err.code,
				message: err.message,
			}),
			None => Ok(parsed.result),
		}
	}

	async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, NodeError> {
		let result = self.request(method, params).await?;
		serde_json::from_value(result).map_err(|e| {
			NodeError::InvalidResponse(format!("{} result did not match: {}", method, e))
		})
	}
}

#[async_trait]
impl NodeInterface for QtumRpcNode {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(QtumNodeSchema)
	}

	async fn list_unspent(
		&self,
		min_conf: u32,
		max_conf: u32,
		addresses: &[String],
	) -> Result<Vec<UnspentOutput>, NodeError> {
		self.call("listunspent", json!([min_conf, max_conf, addresses]))
			.await
	}

	async fn get_address_info(&self, address: &str) -> Result<AddressInfo, NodeError> {
		self.call("getaddressinfo", json!([address])).await
	}

	async fn import_address(
		&self,
		address: &str,
		label: &str,
		rescan: bool,
	) -> Result<(), NodeError> {
		self.request("importaddress", json!([address, label, rescan]))
			.await
			.map(|_| ())
	}

	async fn send_raw_transaction(
		&self,
		tx_hex: &str,
		allow_high_fees: bool,
	) -> Result<String, NodeError> {
		// Newer nodes take a max fee rate instead of a flag; 0 disables the check.
		let max_fee_rate = if allow_high_fees { json!(0) } else { json!(0.1) };
		self.call("sendrawtransaction", json!([tx_hex, max_fee_rate]))
			.await
	}

	async fn decode_raw_transaction(&self, tx_hex: &str) -> Result<Value, NodeError> {
		self.request("decoderawtransaction", json!([tx_hex])).await
	}

	async fn estimate_fee(&self, blocks: u32) -> Result<Decimal, NodeError> {
		let result = self
			.request("estimatesmartfee", json!([blocks]))
			.await?;
		let rate = result
			.get("feerate")
			.ok_or_else(|| NodeError::NotFound(format!("no fee estimate for {} blocks", blocks)))?;
		bridge_types::amount_serde::deserialize(rate.clone())
			.map_err(|e| NodeError::InvalidResponse(format!("estimatesmartfee feerate: {}", e)))
	}

	async fn get_tx_out(
		&self,
		txid: &str,
		vout: u32,
		include_mempool: bool,
	) -> Result<Option<TxOutInfo>, NodeError> {
		self.call("gettxout", json!([txid, vout, include_mempool]))
			.await
	}

	async fn get_raw_transaction_verbose(
		&self,
		txid: &str,
	) -> Result<RawTransactionVerbose, NodeError> {
		self.call("getrawtransaction", json!([txid, true])).await
	}

	async fn get_block_verbose(&self, hash: &str) -> Result<BlockVerbose, NodeError> {
		self.call("getblock", json!([hash, 1])).await
	}

	async fn get_wallet_info(&self) -> Result<WalletInfo, NodeError> {
		self.call("getwalletinfo", json!([])).await
	}

	async fn create_wallet(&self, name: &str) -> Result<(), NodeError> {
		self.request("createwallet", json!([name])).await.map(|_| ())
	}
}

/// Factory function to create a qtumd client from configuration.
///
/// Configuration parameters:
/// - `rpc_url`: node endpoint, e.g. `http://127.0.0.1:3889`
/// - `rpc_user` / `rpc_password`: basic-auth credentials (optional)
pub fn create_qtum_node(config: &toml::Value) -> Result<Box<dyn NodeInterface>, NodeError> {
	QtumNodeSchema::validate_config(config)
		.map_err(|e| NodeError::Configuration(format!("Invalid configuration: {}", e)))?;

	let url = config
		.get("rpc_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| NodeError::Configuration("rpc_url is required".to_string()))?;
	let user = config
		.get("rpc_user")
		.and_then(|v| v.as_str())
		.map(String::from);
	let password = config
		.get("rpc_password")
		.and_then(|v| v.as_str())
		.map(SecretString::from);

	Ok(Box::new(QtumRpcNode::new(url, user, password)?))
}

/// Registry for the qtumd node implementation.
pub struct Registry;

impl bridge_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "qtum";
	type Factory = crate::NodeFactory;

	fn factory() -> Self::Factory {
		create_qtum_node
	}
}

impl crate::NodeRegistry for Registry {}
