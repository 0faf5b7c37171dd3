//! UTXO-chain node access for the qtum bridge.
//!
//! The bridge never keeps chain state of its own. Every output it spends,
//! every address check and every broadcast goes through a [`NodeInterface`]
//! implementation. [`NodeService`] wraps the configured implementation and
//! applies per-call deadlines and cancellation from a [`RequestContext`].

use async_trait::async_trait;
use bridge_types::{
	AddressInfo, BlockVerbose, ConfigSchema, ImplementationRegistry, RawTransactionVerbose,
	TxOutInfo, UnspentOutput, WalletInfo,
};
use rust_decimal::Decimal;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;

pub mod accounting;
pub mod context;

pub mod implementations {
	pub mod mock;
	pub mod qtum;
}

pub use context::{CancelHandle, RequestContext};

/// RPC error code the node returns when no wallet is loaded.
pub const RPC_WALLET_NOT_FOUND: i64 = -18;

/// Name of the wallet created on nodes that have none loaded.
pub const DEFAULT_WALLET_NAME: &str = "wallet";

/// Errors that can occur while talking to the node.
#[derive(Debug, Error)]
pub enum NodeError {
	#[error("Network error: {0}")]
	Network(String),
	#[error("Node returned error {code}: {message}")]
	Rpc { code: i64, message: String },
	#[error("Invalid response from node: {0}")]
	InvalidResponse(String),
	#[error("Node call timed out: {0}")]
	Timeout(String),
	#[error("Cancelled: {0}")]
	Cancelled(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// The node RPCs the bridge consumes.
#[async_trait]
pub trait NodeInterface: Send + Sync {
	/// Schema for this implementation's `[node.implementations.<name>]` table.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// `listunspent minconf maxconf [addresses]`, in node order.
	async fn list_unspent(
		&self,
		min_conf: u32,
		max_conf: u32,
		addresses: &[String],
	) -> Result<Vec<UnspentOutput>, NodeError>;

	async fn get_address_info(&self, address: &str) -> Result<AddressInfo, NodeError>;

	/// Adds a watch-only address to the node wallet, optionally rescanning.
	async fn import_address(&self, address: &str, label: &str, rescan: bool)
		-> Result<(), NodeError>;

	/// Broadcasts a signed transaction and returns its txid.
	async fn send_raw_transaction(
		&self,
		tx_hex: &str,
		allow_high_fees: bool,
	) -> Result<String, NodeError>;

	async fn decode_raw_transaction(&self, tx_hex: &str)
		-> Result<serde_json::Value, NodeError>;

	/// Fee rate in QTUM per kilobyte for confirmation within `blocks`.
	async fn estimate_fee(&self, blocks: u32) -> Result<Decimal, NodeError>;

	/// `None` when the output is spent or unknown.
	async fn get_tx_out(
		&self,
		txid: &str,
		vout: u32,
		include_mempool: bool,
	) -> Result<Option<TxOutInfo>, NodeError>;

	async fn get_raw_transaction_verbose(
		&self,
		txid: &str,
	) -> Result<RawTransactionVerbose, NodeError>;

	async fn get_block_verbose(&self, hash: &str) -> Result<BlockVerbose, NodeError>;

	async fn get_wallet_info(&self) -> Result<WalletInfo, NodeError>;

	async fn create_wallet(&self, name: &str) -> Result<(), NodeError>;
}

/// Builds a node implementation from its TOML table.
pub type NodeFactory = fn(&toml::Value) -> Result<Box<dyn NodeInterface>, NodeError>;

/// Registry trait for node implementations.
pub trait NodeRegistry: ImplementationRegistry<Factory = NodeFactory> {}

/// Every built-in node implementation as `(name, factory)`.
pub fn get_all_implementations() -> Vec<(&'static str, NodeFactory)> {
	use implementations::{mock, qtum};

	vec![
		(qtum::Registry::NAME, qtum::Registry::factory()),
		(mock::Registry::NAME, mock::Registry::factory()),
	]
}

/// The configured node, with deadlines applied to every call.
pub struct NodeService {
	implementation: Box<dyn NodeInterface>,
	call_timeout: Duration,
	wallet_ready: OnceCell<()>,
}

impl NodeService {
	pub fn new(implementation: Box<dyn NodeInterface>, call_timeout: Duration) -> Self {
		Self {
			implementation,
			call_timeout,
			wallet_ready: OnceCell::new(),
		}
	}

	async fn call<T, F>(&self, ctx: &RequestContext, method: &str, fut: F) -> Result<T, NodeError>
	where
		F: Future<Output = Result<T, NodeError>>,
	{
		let bounded = async {
			tokio::time::timeout(self.call_timeout, fut)
				.await
				.map_err(|_| {
					NodeError::Timeout(format!(
						"{} did not answer within {:?}",
						method, self.call_timeout
					))
				})?
		};
		let result = ctx.run(method, bounded).await;
		if let Err(e) = &result {
			tracing::debug!(method, error = %e, "Node call failed");
		}
		result
	}

	pub async fn list_unspent(
		&self,
		ctx: &RequestContext,
		min_conf: u32,
		max_conf: u32,
		addresses: &[String],
	) -> Result<Vec<UnspentOutput>, NodeError> {
		self.call(
			ctx,
			"listunspent",
			self.implementation
				.list_unspent(min_conf, max_conf, addresses),
		)
		.await
	}

	pub async fn get_address_info(
		&self,
		ctx: &RequestContext,
		address: &str,
	) -> Result<AddressInfo, NodeError> {
		self.call(
			ctx,
			"getaddressinfo",
			self.implementation.get_address_info(address),
		)
		.await
	}

	pub async fn import_address(
		&self,
		ctx: &RequestContext,
		address: &str,
		label: &str,
		rescan: bool,
	) -> Result<(), NodeError> {
		self.call(
			ctx,
			"importaddress",
			self.implementation.import_address(address, label, rescan),
		)
		.await
	}

	pub async fn send_raw_transaction(
		&self,
		ctx: &RequestContext,
		tx_hex: &str,
		allow_high_fees: bool,
	) -> Result<String, NodeError> {
		self.call(
			ctx,
			"sendrawtransaction",
			self.implementation
				.send_raw_transaction(tx_hex, allow_high_fees),
		)
		.await
	}

	pub async fn decode_raw_transaction(
		&self,
		ctx: &RequestContext,
		tx_hex: &str,
	) -> Result<serde_json::Value, NodeError> {
		self.call(
			ctx,
			"decoderawtransaction",
			self.implementation.decode_raw_transaction(tx_hex),
		)
		.await
	}

	pub async fn estimate_fee(&self, ctx: &RequestContext, blocks: u32) -> Result<Decimal, NodeError> {
		self.call(ctx, "estimatefee", self.implementation.estimate_fee(blocks))
			.await
	}

	pub async fn get_tx_out(
		&self,
		ctx: &RequestContext,
		txid: &str,
		vout: u32,
		include_mempool: bool,
	) -> Result<Option<TxOutInfo>, NodeError> {
		self.call(
			ctx,
			"gettxout",
			self.implementation.get_tx_out(txid, vout, include_mempool),
		)
		.await
	}

	pub async fn get_raw_transaction_verbose(
		&self,
		ctx: &RequestContext,
		txid: &str,
	) -> Result<RawTransactionVerbose, NodeError> {
		self.call(
			ctx,
			"getrawtransaction",
			self.implementation.get_raw_transaction_verbose(txid),
		)
		.await
	}

	pub async fn get_block_verbose(
		&self,
		ctx: &RequestContext,
		hash: &str,
	) -> Result<BlockVerbose, NodeError> {
		self.call(ctx, "getblock", self.implementation.get_block_verbose(hash))
			.await
	}

	/// Makes sure the node has a wallet loaded, creating one if needed.
	///
	/// Runs once per service; later calls return immediately. A failed
	/// attempt is retried on the next call.
	pub async fn ensure_wallet(&self, ctx: &RequestContext) -> Result<(), NodeError> {
		self.wallet_ready
			.get_or_try_init(|| async {
				match self
					.call(ctx, "getwalletinfo", self.implementation.get_wallet_info())
					.await
				{
					Ok(info) => {
						tracing::debug!(wallet = %info.walletname, "Node wallet present");
						Ok(())
					},
					Err(NodeError::Rpc { code, .. }) if code == RPC_WALLET_NOT_FOUND => {
						tracing::info!(wallet = DEFAULT_WALLET_NAME, "Node has no wallet, creating one");
						self.call(
							ctx,
							"createwallet",
							self.implementation.create_wallet(DEFAULT_WALLET_NAME),
						)
						.await
					},
					Err(e) => Err(e),
				}
			})
			.await
			.map(|_| ())
	}

	/// Ensures the node wallet tracks `address`, importing it with a rescan
	/// when it is neither owned nor watched.
	pub async fn verify_address(&self, ctx: &RequestContext, address: &str) -> Result<(), NodeError> {
		self.ensure_wallet(ctx).await?;
		let info = self.get_address_info(ctx, address).await?;
		if !info.ismine && !info.iswatchonly {
			tracing::info!(address, "Address unknown to node wallet, importing with rescan");
			self.import_address(ctx, address, "", true).await?;
		}
		Ok(())
	}
}
