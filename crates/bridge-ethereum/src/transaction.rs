//! Legacy signed Ethereum transactions.
//!
//! Only the pre-typed format is accepted: a 9-item RLP list
//! `[nonce, gasPrice, gas, to, value, data, v, r, s]`. EIP-2718 envelopes
//! start with a byte below `0xc0` and are rejected up front.

use crate::EthereumError;
use alloy_consensus::{Signed, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::{Address, B256, U256};
use bridge_types::without_0x_prefix;

/// A decoded, signed legacy transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
	signed: Signed<TxLegacy>,
}

impl RawTransaction {
	/// Decodes a `0x`-optional hex string.
	pub fn from_hex(raw: &str) -> Result<Self, EthereumError> {
		let bytes = hex::decode(without_0x_prefix(raw.trim()))
			.map_err(|e| EthereumError::Decode(format!("invalid hex: {}", e)))?;
		Self::decode(&bytes)
	}

	/// Decodes the RLP encoding of a signed legacy transaction.
	///
	/// `v` must be 27/28 or an EIP-155 value; anything else fails here.
	pub fn decode(raw: &[u8]) -> Result<Self, EthereumError> {
		let first = *raw
			.first()
			.ok_or_else(|| EthereumError::Decode("empty input".into()))?;
		if first < 0xc0 {
			return Err(EthereumError::Decode(format!(
				"typed transaction envelope 0x{:02x} is not supported",
				first
			)));
		}

		let mut buf = raw;
		let envelope =
			TxEnvelope::decode_2718(&mut buf).map_err(|e| EthereumError::Decode(e.to_string()))?;
		if !buf.is_empty() {
			return Err(EthereumError::Decode(format!(
				"{} trailing bytes after transaction",
				buf.len()
			)));
		}
		match envelope {
			TxEnvelope::Legacy(signed) => Ok(Self { signed }),
			other => Err(EthereumError::Decode(format!(
				"expected a legacy transaction, got {:?}",
				other.tx_type()
			))),
		}
	}

	pub fn tx(&self) -> &TxLegacy {
		self.signed.tx()
	}

	/// Recipient; `None` for contract creation.
	pub fn to(&self) -> Option<Address> {
		self.signed.tx().to.to().copied()
	}

	/// Amount in wei.
	pub fn value(&self) -> U256 {
		self.signed.tx().value
	}

	/// keccak256 of the raw encoding, the Ethereum transaction hash.
	pub fn hash(&self) -> B256 {
		*self.signed.hash()
	}

	/// Chain id committed to by an EIP-155 signature.
	pub fn chain_id(&self) -> Option<u64> {
		self.signed.tx().chain_id
	}

	/// `(r, s, y_parity)` of the signature.
	pub fn signature_parts(&self) -> (U256, U256, bool) {
		let signature = self.signed.signature();
		(signature.r(), signature.s(), signature.v())
	}

	/// keccak256 of the unsigned fields, the message the sender signed.
	///
	/// EIP-155 transactions append `[chainId, 0, 0]` to the six base fields.
	pub fn signing_hash(&self) -> B256 {
		self.signed.signature_hash()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	const EIP155_TX: &str = "f86d8202b28477359400825208944592d8f8d7b001e72cb26a73e4fa1806a51ac79d880de0b6b3a7640000802ca05924bde7ef10aa88db9c66dd4f5fb16b46dff2319b9968be983118b57bb50562a001b24b31010004f13d9a26b320845257a6cfc2bf819a3d55e3fc86263c5f0772";
	// LEGACY_TX from the recovery tests with v rewritten to 29.
	const BAD_V_TX: &str = "f86780018252089496216849c49358b10257cb55b28ea603c874b05e8806f05b59d3b20000801da0bb50e2d89a4ed70663d080659fe0ad4b9bc3e06c17a227433966cb59ceee020da00c984807b341412d350294dd821dfcaac10074b670884822612b9082acde4117";

	#[test]
	fn test_decode_eip155_transaction() {
		let tx = RawTransaction::from_hex(&format!("0x{}", EIP155_TX)).unwrap();
		assert_eq!(tx.tx().nonce, 0x2b2);
		assert_eq!(tx.tx().gas_price, 0x77359400);
		assert_eq!(tx.tx().gas_limit, 0x5208);
		assert_eq!(
			tx.to(),
			Some(Address::from_str("0x4592d8f8d7b001e72cb26a73e4fa1806a51ac79d").unwrap())
		);
		assert_eq!(tx.value(), U256::from(1_000_000_000_000_000_000u128));
		assert!(tx.tx().input.is_empty());
		assert_eq!(tx.chain_id(), Some(4));
		// v = 0x2c = 35 + 2 * 4 + 1
		assert!(tx.signature_parts().2);
		assert_eq!(
			hex::encode(tx.hash()),
			"c429e5f128387d224ba8bed6885e86525e14bfdc2eb24b5e9c3351a1176fd81f"
		);
	}

	#[test]
	fn test_decode_is_deterministic() {
		let a = RawTransaction::from_hex(EIP155_TX).unwrap();
		let b = RawTransaction::from_hex(EIP155_TX).unwrap();
		assert_eq!(a, b);
		assert_eq!(a.signing_hash(), b.signing_hash());
	}

	#[test]
	fn test_rejects_typed_envelope() {
		let err = RawTransaction::from_hex("02f86c0180").unwrap_err();
		assert!(err.to_string().contains("typed transaction envelope 0x02"));
	}

	#[test]
	fn test_rejects_malformed_input() {
		assert!(matches!(
			RawTransaction::from_hex(""),
			Err(EthereumError::Decode(_))
		));
		assert!(matches!(
			RawTransaction::from_hex("0xzz"),
			Err(EthereumError::Decode(_))
		));
		// Truncated payload.
		assert!(matches!(
			RawTransaction::from_hex(&EIP155_TX[..EIP155_TX.len() - 4]),
			Err(EthereumError::Decode(_))
		));
		// Trailing garbage.
		let err = RawTransaction::from_hex(&format!("{}00", EIP155_TX)).unwrap_err();
		assert!(err.to_string().contains("trailing"));
	}

	#[test]
	fn test_rejects_short_recipient() {
		// Nine fields with a one-byte recipient.
		let raw = hex::decode("c98080800180801b0101").unwrap();
		assert!(matches!(
			RawTransaction::decode(&raw),
			Err(EthereumError::Decode(_))
		));
	}

	#[test]
	fn test_rejects_unsupported_v() {
		assert!(matches!(
			RawTransaction::from_hex(BAD_V_TX),
			Err(EthereumError::Decode(_))
		));
	}
}
