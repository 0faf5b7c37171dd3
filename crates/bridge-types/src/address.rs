//! UTXO-chain address encoding.
//!
//! Addresses are base58check strings of `version ‖ hash160`. The version byte
//! selects the script form (pay-to-pubkey-hash or pay-to-script-hash) and the
//! network. Ethereum-style 20-byte hex addresses map onto pay-to-pubkey-hash
//! addresses by reusing the 20 bytes as the key hash.

use crate::chain::ChainParams;
use crate::utils::{hash160, without_0x_prefix};
use std::fmt;
use thiserror::Error;

/// Errors raised while decoding or converting addresses.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
	#[error("Invalid base58 address '{address}': {reason}")]
	Base58 { address: String, reason: String },
	#[error("Invalid address payload length {0}, expected 21 bytes")]
	InvalidLength(usize),
	#[error("Address version 0x{version:02x} is not valid on {network}")]
	WrongNetwork { version: u8, network: &'static str },
	#[error("Invalid hex address '{0}'")]
	InvalidHex(String),
}

/// A decoded UTXO-chain address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QtumAddress {
	/// Pay-to-pubkey-hash, committing to hash160 of a compressed public key.
	PubKeyHash([u8; 20]),
	/// Pay-to-script-hash, committing to hash160 of a redeem script.
	ScriptHash([u8; 20]),
}

impl QtumAddress {
	/// Builds the P2PKH address of a serialized public key.
	pub fn from_public_key(serialized_pubkey: &[u8]) -> Self {
		QtumAddress::PubKeyHash(hash160(serialized_pubkey))
	}

	/// Interprets a 20-byte hex string (with or without `0x`) as a pubkey hash.
	pub fn from_hex(hex_address: &str) -> Result<Self, AddressError> {
		let bytes = hex::decode(without_0x_prefix(hex_address))
			.map_err(|_| AddressError::InvalidHex(hex_address.to_string()))?;
		let hash: [u8; 20] = bytes
			.try_into()
			.map_err(|_| AddressError::InvalidHex(hex_address.to_string()))?;
		Ok(QtumAddress::PubKeyHash(hash))
	}

	/// Decodes a base58check address, checking its version against `params`.
	pub fn decode(address: &str, params: &ChainParams) -> Result<Self, AddressError> {
		let payload = bs58::decode(address)
			.with_check(None)
			.into_vec()
			.map_err(|e| AddressError::Base58 {
				address: address.to_string(),
				reason: e.to_string(),
			})?;
		if payload.len() != 21 {
			return Err(AddressError::InvalidLength(payload.len()));
		}

		let mut hash = [0u8; 20];
		hash.copy_from_slice(&payload[1..]);
		match payload[0] {
			v if v == params.pubkey_hash_addr_id => Ok(QtumAddress::PubKeyHash(hash)),
			v if v == params.script_hash_addr_id => Ok(QtumAddress::ScriptHash(hash)),
			version => Err(AddressError::WrongNetwork {
				version,
				network: params.name,
			}),
		}
	}

	/// Encodes the address as base58check for the given network.
	pub fn encode(&self, params: &ChainParams) -> String {
		let (version, hash) = match self {
			QtumAddress::PubKeyHash(hash) => (params.pubkey_hash_addr_id, hash),
			QtumAddress::ScriptHash(hash) => (params.script_hash_addr_id, hash),
		};
		let mut payload = Vec::with_capacity(21);
		payload.push(version);
		payload.extend_from_slice(hash);
		bs58::encode(payload).with_check().into_string()
	}

	/// The 20-byte hash the address commits to.
	pub fn hash(&self) -> &[u8; 20] {
		match self {
			QtumAddress::PubKeyHash(hash) | QtumAddress::ScriptHash(hash) => hash,
		}
	}

	/// Standard locking script paying to this address.
	pub fn script_pubkey(&self) -> Vec<u8> {
		match self {
			QtumAddress::PubKeyHash(hash) => {
				let mut script = Vec::with_capacity(25);
				script.push(0x76); // OP_DUP
				script.push(0xa9); // OP_HASH160
				script.push(0x14);
				script.extend_from_slice(hash);
				script.push(0x88); // OP_EQUALVERIFY
				script.push(0xac); // OP_CHECKSIG
				script
			},
			QtumAddress::ScriptHash(hash) => {
				let mut script = Vec::with_capacity(23);
				script.push(0xa9); // OP_HASH160
				script.push(0x14);
				script.extend_from_slice(hash);
				script.push(0x87); // OP_EQUAL
				script
			},
		}
	}
}

impl fmt::Display for QtumAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(self.hash()))
	}
}

/// Converts an Ethereum-style hex address into a base58 P2PKH address.
pub fn hex_to_base58(hex_address: &str, params: &ChainParams) -> Result<String, AddressError> {
	QtumAddress::from_hex(hex_address).map(|address| address.encode(params))
}

/// Converts a base58 address back into its 20-byte hash as `0x` hex.
pub fn base58_to_hex(address: &str, params: &ChainParams) -> Result<String, AddressError> {
	QtumAddress::decode(address, params).map(|address| address.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	const TESTNET: ChainParams = ChainParams::QTUM_TESTNET;

	#[test]
	fn test_hex_to_base58_testnet() {
		assert_eq!(
			hex_to_base58("0xe599be870c63d68a00a5019906d258a4ba5d1bac", &TESTNET).unwrap(),
			"qeVQ5JF6idPcrg1u9M3pCryXeebpj3Tbpk"
		);
		assert_eq!(
			hex_to_base58("7926223070547d2d15b2ef5e7383e541c338ffe9", &TESTNET).unwrap(),
			"qUbxboqjBRp96j3La8D1RYkyqx5uQbJPoW"
		);
	}

	#[test]
	fn test_base58_to_hex() {
		assert_eq!(
			base58_to_hex("qUbxboqjBRp96j3La8D1RYkyqx5uQbJPoW", &TESTNET).unwrap(),
			"0x7926223070547d2d15b2ef5e7383e541c338ffe9"
		);
	}

	#[test]
	fn test_from_public_key() {
		let pubkey =
			hex::decode("021dac3ce6613f97afc4e077d0830b16993b7d0d4119b2acc562d11ff893d86071")
				.unwrap();
		let address = QtumAddress::from_public_key(&pubkey);
		assert_eq!(address.encode(&TESTNET), "qTQeBZsvBmmLevSu6cU3wGwyHeZdEp9Tkx");
		assert_eq!(
			address.encode(&ChainParams::QTUM_MAINNET),
			"QWTF8qQ4Ab31x3oXabpHsW5CGNb99q2muW"
		);
	}

	#[test]
	fn test_p2pkh_script_pubkey() {
		let address = QtumAddress::decode("qUbxboqjBRp96j3La8D1RYkyqx5uQbJPoW", &TESTNET).unwrap();
		assert_eq!(
			hex::encode(address.script_pubkey()),
			"76a9147926223070547d2d15b2ef5e7383e541c338ffe988ac"
		);
	}

	#[test]
	fn test_script_hash_round_trip() {
		let address = QtumAddress::ScriptHash([7u8; 20]);
		let encoded = address.encode(&TESTNET);
		assert_eq!(QtumAddress::decode(&encoded, &TESTNET).unwrap(), address);
		let script = address.script_pubkey();
		assert_eq!(script.len(), 23);
		assert_eq!(script[0], 0xa9);
		assert_eq!(script[22], 0x87);
	}

	#[test]
	fn test_decode_rejects_other_network() {
		let err = QtumAddress::decode(
			"QWTF8qQ4Ab31x3oXabpHsW5CGNb99q2muW",
			&ChainParams::QTUM_TESTNET,
		)
		.unwrap_err();
		assert_eq!(
			err,
			AddressError::WrongNetwork {
				version: 0x3a,
				network: "testnet"
			}
		);
	}

	#[test]
	fn test_decode_rejects_bad_checksum() {
		assert!(matches!(
			QtumAddress::decode("qUbxboqjBRp96j3La8D1RYkyqx5uQbJPoX", &TESTNET),
			Err(AddressError::Base58 { .. })
		));
	}

	#[test]
	fn test_from_hex_rejects_wrong_length() {
		assert!(QtumAddress::from_hex("0x1234").is_err());
		assert!(QtumAddress::from_hex("0xzz").is_err());
	}
}
