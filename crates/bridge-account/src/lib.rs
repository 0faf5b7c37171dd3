//! Wallet management for the qtum bridge.
//!
//! A wallet pairs one secp256k1 private key with the two addresses derived
//! from it: the Ethereum-style identity that signs inbound transactions, and
//! the base58 address that owns outputs on the UTXO chain. Wallets live in a
//! [`WalletRegistry`] keyed by identity for the lifetime of the process.

use bridge_types::{Address, ChainParams, SecretString};
use secp256k1::{PublicKey, SecretKey};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

pub mod implementations {
	pub mod local;

	#[cfg(any(test, feature = "testing"))]
	pub mod fake;
}

pub use implementations::local::LocalWallet;

#[cfg(any(test, feature = "testing"))]
pub use implementations::fake::FakeWallet;

/// Errors that can occur during wallet operations.
#[derive(Debug, Error)]
pub enum AccountError {
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	#[error("Wallet already exists for address {0}")]
	DuplicateWallet(Address),
	#[error("Wallet not found for address {0}")]
	NotFound(Address),
	#[error("No private key for address {address}: {reason}")]
	KeyNotFound { address: String, reason: String },
}

/// Key access for a single imported identity.
pub trait WalletInterface: Send + Sync {
	/// Returns the private key that controls `address`.
	///
	/// Fails with [`AccountError::KeyNotFound`] if `address` is not this
	/// wallet's UTXO-chain address.
	fn private_key_for(&self, address: &str) -> Result<SecretKey, AccountError>;

	/// Compressed-form public key of the wallet.
	fn public_key(&self) -> PublicKey;

	/// Base58 UTXO-chain address owned by the wallet.
	fn chain_address(&self) -> &str;

	/// Ethereum-style address the wallet is registered under.
	fn identity(&self) -> Address;
}

/// Process-wide map from sender identity to wallet.
///
/// Insert and delete hold the write guard across the existence check and the
/// mutation, so two concurrent imports of the same key cannot both succeed.
#[derive(Clone)]
pub struct WalletRegistry {
	params: ChainParams,
	wallets: Arc<RwLock<HashMap<Address, Arc<dyn WalletInterface>>>>,
}

impl WalletRegistry {
	pub fn new(params: ChainParams) -> Self {
		Self {
			params,
			wallets: Arc::new(RwLock::new(HashMap::new())),
		}
	}

	pub fn params(&self) -> &ChainParams {
		&self.params
	}

	/// Derives a wallet from raw key material and registers it.
	pub async fn import(
		&self,
		private_key: &SecretString,
	) -> Result<Arc<dyn WalletInterface>, AccountError> {
		let wallet: Arc<dyn WalletInterface> =
			Arc::new(LocalWallet::from_secret(private_key, &self.params)?);
		self.insert(wallet.clone()).await?;
		tracing::info!(
			identity = %wallet.identity(),
			address = %wallet.chain_address(),
			"Imported wallet"
		);
		Ok(wallet)
	}

	/// Registers an already-constructed wallet under its identity.
	pub async fn insert(&self, wallet: Arc<dyn WalletInterface>) -> Result<(), AccountError> {
		let identity = wallet.identity();
		let mut wallets = self.wallets.write().await;
		if wallets.contains_key(&identity) {
			return Err(AccountError::DuplicateWallet(identity));
		}
		wallets.insert(identity, wallet);
		Ok(())
	}

	pub async fn lookup(&self, identity: &Address) -> Result<Arc<dyn WalletInterface>, AccountError> {
		self.wallets
			.read()
			.await
			.get(identity)
			.cloned()
			.ok_or(AccountError::NotFound(*identity))
	}

	pub async fn delete(&self, identity: &Address) -> Result<(), AccountError> {
		let removed = self.wallets.write().await.remove(identity);
		match removed {
			Some(_) => {
				tracing::debug!(identity = %identity, "Deleted wallet");
				Ok(())
			},
			None => Err(AccountError::NotFound(*identity)),
		}
	}

	pub async fn len(&self) -> usize {
		self.wallets.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.wallets.read().await.is_empty()
	}
}
