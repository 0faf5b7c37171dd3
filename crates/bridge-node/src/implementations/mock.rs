//! In-memory node for tests and local development.
//!
//! Serves `listunspent` from configured fixtures, tracks imported addresses so
//! `getaddressinfo` reflects them, and records every broadcast transaction.
//! Nothing touches the network.

use crate::{NodeError, NodeInterface};
use async_trait::async_trait;
use bridge_types::{
	double_sha256, reverse_hex, AddressInfo, BlockVerbose, ConfigSchema, Field, FieldType,
	RawTransactionVerbose, Schema, TxOutInfo, UnspentOutput, ValidationError, WalletInfo,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Error code qtumd uses for undecodable transactions.
const RPC_DESERIALIZATION_ERROR: i64 = -22;

/// Configuration for the mock node.
#[derive(Debug, Clone, Deserialize)]
pub struct MockNodeConfig {
	/// Outputs returned by `listunspent`, in this order.
	#[serde(default)]
	pub unspent: Vec<UnspentOutput>,
	/// Addresses the node wallet owns outright.
	#[serde(default)]
	pub owned: Vec<String>,
	/// When false, `getwalletinfo` fails until `createwallet` is called.
	#[serde(default = "default_wallet_loaded")]
	pub wallet_loaded: bool,
	/// Artificial delay applied to every call.
	#[serde(default)]
	pub latency_ms: u64,
	#[serde(default = "default_fee_rate", with = "bridge_types::amount_serde")]
	pub fee_rate: Decimal,
}

fn default_wallet_loaded() -> bool {
	true
}

fn default_fee_rate() -> Decimal {
	Decimal::new(4, 3)
}

impl Default for MockNodeConfig {
	fn default() -> Self {
		Self {
			unspent: Vec::new(),
			owned: Vec::new(),
			wallet_loaded: default_wallet_loaded(),
			latency_ms: 0,
			fee_rate: default_fee_rate(),
		}
	}
}

/// Configuration schema for the mock node.
pub struct MockNodeSchema;

impl MockNodeSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for MockNodeSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let unspent_entry = Schema::new(
			vec![
				Field::new("txid", FieldType::String),
				Field::new(
					"vout",
					FieldType::Integer {
						min: Some(0),
						max: Some(u32::MAX as i64),
					},
				),
				Field::new("address", FieldType::String),
				Field::new("scriptPubKey", FieldType::String),
				Field::new(
					"confirmations",
					FieldType::Integer {
						min: Some(0),
						max: None,
					},
				),
			],
			vec![Field::new("spendable", FieldType::Boolean)],
		);
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("unspent", FieldType::Array(Box::new(FieldType::Table(unspent_entry)))),
				Field::new("owned", FieldType::Array(Box::new(FieldType::String))),
				Field::new("wallet_loaded", FieldType::Boolean),
				Field::new(
					"latency_ms",
					FieldType::Integer {
						min: Some(0),
						max: Some(60_000),
					},
				),
			],
		);
		schema.validate(config)
	}
}

#[derive(Debug, Default)]
struct MockState {
	unspent: Vec<UnspentOutput>,
	owned: HashSet<String>,
	watched: HashSet<String>,
	imported: Vec<String>,
	sent: Vec<String>,
	sent_allow_high_fees: Vec<bool>,
	wallet_loaded: bool,
	tx_outs: HashMap<(String, u32), TxOutInfo>,
	raw_transactions: HashMap<String, RawTransactionVerbose>,
	blocks: HashMap<String, BlockVerbose>,
	calls: HashMap<String, usize>,
}

/// Node double backed by shared in-memory state.
///
/// Clones share state, so a test can keep one handle for assertions while the
/// service owns another.
#[derive(Debug, Clone)]
pub struct MockNode {
	state: Arc<Mutex<MockState>>,
	latency: Duration,
	fee_rate: Decimal,
}

impl MockNode {
	pub fn new(config: MockNodeConfig) -> Self {
		let state = MockState {
			unspent: config.unspent,
			owned: config.owned.into_iter().collect(),
			wallet_loaded: config.wallet_loaded,
			..Default::default()
		};
		Self {
			state: Arc::new(Mutex::new(state)),
			latency: Duration::from_millis(config.latency_ms),
			fee_rate: config.fee_rate,
		}
	}

	fn state(&self) -> MutexGuard<'_, MockState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	async fn enter(&self, method: &str) {
		if !self.latency.is_zero() {
			tokio::time::sleep(self.latency).await;
		}
		*self.state().calls.entry(method.to_string()).or_default() += 1;
	}

	pub fn with_tx_out(self, txid: &str, vout: u32, info: TxOutInfo) -> Self {
		self.state().tx_outs.insert((txid.to_string(), vout), info);
		self
	}

	pub fn with_raw_transaction(self, tx: RawTransactionVerbose) -> Self {
		self.state().raw_transactions.insert(tx.txid.clone(), tx);
		self
	}

	pub fn with_block(self, block: BlockVerbose) -> Self {
		self.state().blocks.insert(block.hash.clone(), block);
		self
	}

	/// Replaces the `listunspent` fixtures.
	pub fn set_unspent(&self, unspent: Vec<UnspentOutput>) {
		self.state().unspent = unspent;
	}

	/// Addresses passed to `importaddress`, in call order.
	pub fn imported_addresses(&self) -> Vec<String> {
		self.state().imported.clone()
	}

	/// Raw transactions passed to `sendrawtransaction`, in call order.
	pub fn sent_transactions(&self) -> Vec<String> {
		self.state().sent.clone()
	}

	/// `allow_high_fees` flag of each `sendrawtransaction` call, in call order.
	pub fn sent_allow_high_fees(&self) -> Vec<bool> {
		self.state().sent_allow_high_fees.clone()
	}

	/// How many times `method` has been called.
	pub fn calls(&self, method: &str) -> usize {
		self.state().calls.get(method).copied().unwrap_or(0)
	}
}

#[async_trait]
impl NodeInterface for MockNode {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MockNodeSchema)
	}

	async fn list_unspent(
		&self,
		min_conf: u32,
		max_conf: u32,
		addresses: &[String],
	) -> Result<Vec<UnspentOutput>, NodeError> {
		self.enter("listunspent").await;
		let state = self.state();
		Ok(state
			.unspent
			.iter()
			.filter(|u| addresses.is_empty() || addresses.contains(&u.address))
			.filter(|u| u.confirmations >= i64::from(min_conf))
			.filter(|u| u.confirmations <= i64::from(max_conf))
			.cloned()
			.collect())
	}

	async fn get_address_info(&self, address: &str) -> Result<AddressInfo, NodeError> {
		self.enter("getaddressinfo").await;
		let state = self.state();
		Ok(AddressInfo {
			address: Some(address.to_string()),
			ismine: state.owned.contains(address),
			iswatchonly: state.watched.contains(address),
		})
	}

	async fn import_address(
		&self,
		address: &str,
		_label: &str,
		_rescan: bool,
	) -> Result<(), NodeError> {
		self.enter("importaddress").await;
		let mut state = self.state();
		state.watched.insert(address.to_string());
		state.imported.push(address.to_string());
		Ok(())
	}

	async fn send_raw_transaction(
		&self,
		tx_hex: &str,
		allow_high_fees: bool,
	) -> Result<String, NodeError> {
		self.enter("sendrawtransaction").await;
		let bytes = hex::decode(tx_hex).map_err(|_| NodeError::Rpc {
			code: RPC_DESERIALIZATION_ERROR,
			message: "TX decode failed".to_string(),
		})?;
		let mut state = self.state();
		state.sent.push(tx_hex.to_string());
		state.sent_allow_high_fees.push(allow_high_fees);
		Ok(reverse_hex(&double_sha256(&bytes)))
	}

	async fn decode_raw_transaction(&self, tx_hex: &str) -> Result<Value, NodeError> {
		self.enter("decoderawtransaction").await;
		let bytes = hex::decode(tx_hex).map_err(|_| NodeError::Rpc {
			code: RPC_DESERIALIZATION_ERROR,
			message: "TX decode failed".to_string(),
		})?;
		Ok(json!({
			"txid": reverse_hex(&double_sha256(&bytes)),
			"size": bytes.len(),
			"hex": tx_hex,
		}))
	}

	async fn estimate_fee(&self, _blocks: u32) -> Result<Decimal, NodeError> {
		self.enter("estimatefee").await;
		Ok(self.fee_rate)
	}

	async fn get_tx_out(
		&self,
		txid: &str,
		vout: u32,
		_include_mempool: bool,
	) -> Result<Option<TxOutInfo>, NodeError> {
		self.enter("gettxout").await;
		Ok(self.state().tx_outs.get(&(txid.to_string(), vout)).cloned())
	}

	async fn get_raw_transaction_verbose(
		&self,
		txid: &str,
	) -> Result<RawTransactionVerbose, NodeError> {
		self.enter("getrawtransaction").await;
		self.state()
			.raw_transactions
			.get(txid)
			.cloned()
			.ok_or_else(|| NodeError::NotFound(format!("transaction {}", txid)))
	}

	async fn get_block_verbose(&self, hash: &str) -> Result<BlockVerbose, NodeError> {
		self.enter("getblock").await;
		self.state()
			.blocks
			.get(hash)
			.cloned()
			.ok_or_else(|| NodeError::NotFound(format!("block {}", hash)))
	}

	async fn get_wallet_info(&self) -> Result<WalletInfo, NodeError> {
		self.enter("getwalletinfo").await;
		if !self.state().wallet_loaded {
			return Err(NodeError::Rpc {
				code: crate::RPC_WALLET_NOT_FOUND,
				message: "No wallet is loaded. Load a wallet using loadwallet or create a new one with createwallet.".to_string(),
			});
		}
		Ok(WalletInfo {
			walletname: crate::DEFAULT_WALLET_NAME.to_string(),
			txcount: 0,
		})
	}

	async fn create_wallet(&self, _name: &str) -> Result<(), NodeError> {
		self.enter("createwallet").await;
		self.state().wallet_loaded = true;
		Ok(())
	}
}

/// Factory function to create a mock node from configuration.
pub fn create_mock_node(config: &toml::Value) -> Result<Box<dyn NodeInterface>, NodeError> {
	MockNodeSchema::validate_config(config)
		.map_err(|e| NodeError::Configuration(format!("Invalid configuration: {}", e)))?;
	let config: MockNodeConfig = config
		.clone()
		.try_into()
		.map_err(|e| NodeError::Configuration(format!("Invalid mock node config: {}", e)))?;
	Ok(Box::new(MockNode::new(config)))
}

/// Registry for the mock node implementation.
pub struct Registry;

impl bridge_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "mock";
	type Factory = crate::NodeFactory;

	fn factory() -> Self::Factory {
		create_mock_node
	}
}

impl crate::NodeRegistry for Registry {}
