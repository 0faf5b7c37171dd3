//! Wallet management and balance queries.

use alloy_primitives::U256;
use bridge_account::{AccountError, WalletRegistry};
use bridge_node::{NodeError, NodeService, RequestContext};
use bridge_types::address::hex_to_base58;
use bridge_types::{
	qtum_to_satoshis, satoshis_to_wei, Address, AddressError, AmountConversionError, SecretString,
};
use bridge_utxo::selector::MAX_CONFIRMATIONS;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Errors that can occur while computing a balance.
#[derive(Debug, Error)]
pub enum BalanceError {
	#[error("Invalid address: {0}")]
	InvalidAddress(#[from] AddressError),
	#[error("Node error: {0}")]
	Node(#[from] NodeError),
	#[error("Amount conversion failed: {0}")]
	AmountConversion(#[from] AmountConversionError),
}

/// Imports and removes wallets, and reports balances held by the node.
pub struct AccountHandler {
	wallets: WalletRegistry,
	node: Arc<NodeService>,
}

impl AccountHandler {
	pub fn new(wallets: WalletRegistry, node: Arc<NodeService>) -> Self {
		Self { wallets, node }
	}

	/// Registers the wallet derived from `private_key` and returns its
	/// Ethereum-style identity.
	pub async fn import_key(&self, private_key: &SecretString) -> Result<Address, AccountError> {
		let wallet = self.wallets.import(private_key).await?;
		Ok(wallet.identity())
	}

	pub async fn delete_wallet(&self, identity: &Address) -> Result<(), AccountError> {
		self.wallets.delete(identity).await
	}

	/// Sums every unspent output at the base58 form of `hex_address`, in wei.
	///
	/// Unconfirmed outputs count. The address is imported into the node
	/// wallet first if the node does not track it yet.
	#[instrument(skip_all, fields(address = %hex_address))]
	pub async fn get_balance(
		&self,
		ctx: &RequestContext,
		hex_address: &str,
	) -> Result<U256, BalanceError> {
		let address = hex_to_base58(hex_address, self.wallets.params())?;
		self.node.verify_address(ctx, &address).await?;
		let unspent = self
			.node
			.list_unspent(ctx, 0, MAX_CONFIRMATIONS, &[address.clone()])
			.await?;

		let mut satoshis: u64 = 0;
		for utxo in &unspent {
			let value = qtum_to_satoshis(utxo.amount)?;
			// qtum_to_satoshis rejects negatives.
			satoshis = satoshis.saturating_add(value.unsigned_abs());
		}
		tracing::debug!(address = %address, outputs = unspent.len(), satoshis, "Computed balance");
		Ok(satoshis_to_wei(satoshis))
	}
}
