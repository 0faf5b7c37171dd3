//! In-process wallet holding a raw secp256k1 key.

use crate::{AccountError, WalletInterface};
use bridge_types::{ethereum_address, Address, ChainParams, QtumAddress, SecretString};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use std::fmt;

/// Wallet backed by a private key held in memory.
///
/// The UTXO-chain address is the pay-to-pubkey-hash of the compressed public
/// key; the identity is the Ethereum address of the same key.
pub struct LocalWallet {
	secret_key: SecretKey,
	public_key: PublicKey,
	chain_address: String,
	identity: Address,
}

impl LocalWallet {
	/// Builds a wallet from 32 bytes of hex key material, `0x` optional.
	pub fn from_secret(
		private_key: &SecretString,
		params: &ChainParams,
	) -> Result<Self, AccountError> {
		let bytes = private_key
			.decode_hex()
			.map_err(|e| AccountError::InvalidKey(format!("not valid hex: {}", e)))?;
		if bytes.len() != 32 {
			return Err(AccountError::InvalidKey(format!(
				"expected 32 bytes, got {}",
				bytes.len()
			)));
		}
		let secret_key = SecretKey::from_slice(&bytes)
			.map_err(|e| AccountError::InvalidKey(e.to_string()))?;
		Ok(Self::from_secret_key(secret_key, params))
	}

	pub fn from_secret_key(secret_key: SecretKey, params: &ChainParams) -> Self {
		let secp = Secp256k1::signing_only();
		let public_key = PublicKey::from_secret_key(&secp, &secret_key);
		let chain_address = QtumAddress::from_public_key(&public_key.serialize()).encode(params);
		let identity = ethereum_address(&public_key.serialize_uncompressed());
		Self {
			secret_key,
			public_key,
			chain_address,
			identity,
		}
	}
}

impl WalletInterface for LocalWallet {
	fn private_key_for(&self, address: &str) -> Result<SecretKey, AccountError> {
		if address != self.chain_address {
			return Err(AccountError::KeyNotFound {
				address: address.to_string(),
				reason: format!("address mismatch, wallet owns {}", self.chain_address),
			});
		}
		Ok(self.secret_key)
	}

	fn public_key(&self) -> PublicKey {
		self.public_key
	}

	fn chain_address(&self) -> &str {
		&self.chain_address
	}

	fn identity(&self) -> Address {
		self.identity
	}
}

impl fmt::Debug for LocalWallet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LocalWallet")
			.field("identity", &self.identity)
			.field("chain_address", &self.chain_address)
			.finish_non_exhaustive()
	}
}
