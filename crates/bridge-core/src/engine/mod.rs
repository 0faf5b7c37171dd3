//! Bridge engine.
//!
//! Owns the shared wallet registry and node service, and exposes the
//! operations the JSON-RPC surface needs. Each call is independent: the only
//! state shared between concurrent requests is the wallet registry.

use crate::handlers::{AccountHandler, BalanceError, TranslationError, TranslationHandler};
use alloy_primitives::U256;
use bridge_account::{AccountError, WalletRegistry};
use bridge_config::Config;
use bridge_node::{NodeService, RequestContext};
use bridge_types::{Address, SecretString};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while assembling or starting the engine.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Account error: {0}")]
	Account(#[from] AccountError),
}

/// Entry point for bridge operations.
#[derive(Clone)]
pub struct BridgeEngine {
	config: Config,
	wallets: WalletRegistry,
	node: Arc<NodeService>,
	translation_handler: Arc<TranslationHandler>,
	account_handler: Arc<AccountHandler>,
}

impl BridgeEngine {
	/// Wires the handlers around `node` and an empty wallet registry for the
	/// configured network.
	pub fn new(config: Config, node: Arc<NodeService>) -> Result<Self, EngineError> {
		let params = config.bridge.network.params();
		let min_confirmations = u32::try_from(config.bridge.min_confirmations).map_err(|_| {
			EngineError::Config(format!(
				"min_confirmations {} out of range",
				config.bridge.min_confirmations
			))
		})?;
		let fee_satoshis = i64::try_from(config.bridge.fee_satoshis).map_err(|_| {
			EngineError::Config(format!(
				"fee_satoshis {} out of range",
				config.bridge.fee_satoshis
			))
		})?;

		let wallets = WalletRegistry::new(params);
		let translation_handler = Arc::new(TranslationHandler::new(
			wallets.clone(),
			node.clone(),
			params,
			min_confirmations,
			fee_satoshis,
		));
		let account_handler = Arc::new(AccountHandler::new(wallets.clone(), node.clone()));

		Ok(Self {
			config,
			wallets,
			node,
			translation_handler,
			account_handler,
		})
	}

	/// Imports every key listed under `[account]`.
	///
	/// A key listed twice is skipped with a warning.
	pub async fn import_configured_keys(&self) -> Result<usize, EngineError> {
		let mut imported = 0;
		for key in &self.config.account.keys {
			match self.account_handler.import_key(key).await {
				Ok(_) => imported += 1,
				Err(AccountError::DuplicateWallet(identity)) => {
					tracing::warn!(identity = %identity, "Key listed more than once, skipping");
				},
				Err(e) => return Err(e.into()),
			}
		}
		Ok(imported)
	}

	/// Translates a signed Ethereum transaction, returning the UTXO-chain txid.
	pub async fn send_raw_transaction(
		&self,
		ctx: &RequestContext,
		raw_tx: &str,
	) -> Result<String, TranslationError> {
		self.translation_handler.translate(ctx, raw_tx).await
	}

	pub async fn import_key(&self, private_key: &SecretString) -> Result<Address, AccountError> {
		self.account_handler.import_key(private_key).await
	}

	pub async fn delete_wallet(&self, identity: &Address) -> Result<(), AccountError> {
		self.account_handler.delete_wallet(identity).await
	}

	pub async fn get_balance(
		&self,
		ctx: &RequestContext,
		hex_address: &str,
	) -> Result<U256, BalanceError> {
		self.account_handler.get_balance(ctx, hex_address).await
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn wallets(&self) -> &WalletRegistry {
		&self.wallets
	}

	pub fn node(&self) -> &Arc<NodeService> {
		&self.node
	}
}
