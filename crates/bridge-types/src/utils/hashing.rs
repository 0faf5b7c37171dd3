//! Hash functions used by UTXO-chain scripts, transaction ids and Ethereum
//! address derivation.

use alloy_primitives::{keccak256, Address};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// RIPEMD160(SHA256(data)), the public key hash committed to by P2PKH scripts.
pub fn hash160(data: &[u8]) -> [u8; 20] {
	let sha = Sha256::digest(data);
	let ripe = Ripemd160::digest(sha);
	let mut out = [0u8; 20];
	out.copy_from_slice(&ripe);
	out
}

/// SHA256(SHA256(data)), used for txids, sighashes and base58 checksums.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
	let first = Sha256::digest(data);
	let second = Sha256::digest(first);
	let mut out = [0u8; 32];
	out.copy_from_slice(&second);
	out
}

/// Ethereum address of an uncompressed (65-byte, `0x04`-tagged) public key:
/// the last 20 bytes of keccak256 over the 64 coordinate bytes.
pub fn ethereum_address(uncompressed_pubkey: &[u8; 65]) -> Address {
	let digest = keccak256(&uncompressed_pubkey[1..]);
	Address::from_slice(&digest[12..])
}
