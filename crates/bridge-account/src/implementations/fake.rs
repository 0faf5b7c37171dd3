//! Wallet double for tests.

use crate::{AccountError, WalletInterface};
use bridge_types::Address;
use secp256k1::{constants, PublicKey, Secp256k1, SecretKey};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A wallet whose identity and chain address are set directly.
///
/// With a key, it behaves like a real wallet for the configured address.
/// Without one, every key request fails. Key requests are counted so tests
/// can assert how far a signing pass got.
#[derive(Debug)]
pub struct FakeWallet {
	identity: Address,
	chain_address: String,
	secret_key: Option<SecretKey>,
	key_requests: AtomicUsize,
}

impl FakeWallet {
	pub fn new(identity: Address, chain_address: impl Into<String>, secret_key: SecretKey) -> Self {
		Self {
			identity,
			chain_address: chain_address.into(),
			secret_key: Some(secret_key),
			key_requests: AtomicUsize::new(0),
		}
	}

	pub fn without_key(identity: Address, chain_address: impl Into<String>) -> Self {
		Self {
			identity,
			chain_address: chain_address.into(),
			secret_key: None,
			key_requests: AtomicUsize::new(0),
		}
	}

	/// Number of `private_key_for` calls so far.
	pub fn key_requests(&self) -> usize {
		self.key_requests.load(Ordering::SeqCst)
	}
}

impl WalletInterface for FakeWallet {
	fn private_key_for(&self, address: &str) -> Result<SecretKey, AccountError> {
		self.key_requests.fetch_add(1, Ordering::SeqCst);
		match self.secret_key {
			Some(key) if address == self.chain_address => Ok(key),
			Some(_) => Err(AccountError::KeyNotFound {
				address: address.to_string(),
				reason: "address mismatch".to_string(),
			}),
			None => Err(AccountError::KeyNotFound {
				address: address.to_string(),
				reason: "fake wallet holds no key".to_string(),
			}),
		}
	}

	fn public_key(&self) -> PublicKey {
		// Keyless fakes report the generator point.
		let key = self.secret_key.unwrap_or_else(|| {
			SecretKey::from_slice(&constants::ONE).expect("one is a valid secret key")
		});
		PublicKey::from_secret_key(&Secp256k1::signing_only(), &key)
	}

	fn chain_address(&self) -> &str {
		&self.chain_address
	}

	fn identity(&self) -> Address {
		self.identity
	}
}
