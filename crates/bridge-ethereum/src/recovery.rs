//! Sender recovery from legacy and EIP-155 signatures.

use crate::{EthereumError, RawTransaction};
use alloy_primitives::Address;
use bridge_types::ethereum_address;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1};

/// The signer of a transaction, as recovered from its signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderIdentity {
	pub public_key: PublicKey,
	pub address: Address,
}

/// Recovers the public key that signed `tx`.
pub fn recover_sender(tx: &RawTransaction) -> Result<SenderIdentity, EthereumError> {
	let (r, s, y_parity) = tx.signature_parts();
	let recid = RecoveryId::from_i32(i32::from(y_parity))
		.map_err(|e| EthereumError::Recovery(format!("invalid recovery id: {}", e)))?;

	let mut compact = [0u8; 64];
	compact[..32].copy_from_slice(&r.to_be_bytes::<32>());
	compact[32..].copy_from_slice(&s.to_be_bytes::<32>());
	let signature = RecoverableSignature::from_compact(&compact, recid)
		.map_err(|e| EthereumError::Recovery(format!("invalid signature: {}", e)))?;

	let message = Message::from_digest(tx.signing_hash().0);
	let public_key = Secp256k1::verification_only()
		.recover_ecdsa(&message, &signature)
		.map_err(|e| EthereumError::Recovery(format!("no public key recovered: {}", e)))?;

	Ok(SenderIdentity {
		public_key,
		address: ethereum_address(&public_key.serialize_uncompressed()),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::U256;
	use std::str::FromStr;

	const EIP155_TX: &str = "f86d8202b28477359400825208944592d8f8d7b001e72cb26a73e4fa1806a51ac79d880de0b6b3a7640000802ca05924bde7ef10aa88db9c66dd4f5fb16b46dff2319b9968be983118b57bb50562a001b24b31010004f13d9a26b320845257a6cfc2bf819a3d55e3fc86263c5f0772";
	const LEGACY_TX: &str = "f86780018252089496216849c49358b10257cb55b28ea603c874b05e8806f05b59d3b20000801ba0bb50e2d89a4ed70663d080659fe0ad4b9bc3e06c17a227433966cb59ceee020da00c984807b341412d350294dd821dfcaac10074b670884822612b9082acde4117";
	// LEGACY_TX with r encoded as zero.
	const ZERO_R_TX: &str = "f84780018252089496216849c49358b10257cb55b28ea603c874b05e8806f05b59d3b20000801b80a00c984807b341412d350294dd821dfcaac10074b670884822612b9082acde4117";

	#[test]
	fn test_recover_eip155_sender() {
		let tx = RawTransaction::from_hex(EIP155_TX).unwrap();
		let sender = recover_sender(&tx).unwrap();
		assert_eq!(
			sender.address,
			Address::from_str("0x96216849c49358B10257cb55b28eA603c874b05E").unwrap()
		);
		assert_eq!(
			hex::encode(sender.public_key.serialize()),
			"039a7df67f79246283fdc93af76d4f8cdd62c4886e8cd870944e817dd0b97934fd"
		);
	}

	#[test]
	fn test_recover_legacy_sender() {
		let tx = RawTransaction::from_hex(LEGACY_TX).unwrap();
		assert_eq!(tx.chain_id(), None);
		assert_eq!(tx.value(), U256::from(500_000_000_000_000_000u64));
		assert_eq!(
			hex::encode(tx.hash()),
			"4fc9c9867f9a11234ea540683b3d5f363ae9e12714e118cda3ec0b12bc6664a8"
		);

		let sender = recover_sender(&tx).unwrap();
		assert_eq!(
			hex::encode(sender.address),
			"6fd56e72373a34ba39bf4167af82e7a411bfed47"
		);
	}

	#[test]
	fn test_recovery_is_deterministic() {
		let a = recover_sender(&RawTransaction::from_hex(EIP155_TX).unwrap()).unwrap();
		let b = recover_sender(&RawTransaction::from_hex(EIP155_TX).unwrap()).unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn test_tampered_nonce_changes_sender() {
		let tampered = EIP155_TX.replacen("8202b2", "8202b3", 1);
		let tx = RawTransaction::from_hex(&tampered).unwrap();
		if let Ok(sender) = recover_sender(&tx) {
			assert_ne!(
				sender.address,
				Address::from_str("0x96216849c49358B10257cb55b28eA603c874b05E").unwrap()
			);
		}
	}

	#[test]
	fn test_invalid_signature_values() {
		let tx = RawTransaction::from_hex(ZERO_R_TX).unwrap();
		assert!(matches!(
			recover_sender(&tx),
			Err(EthereumError::Recovery(_))
		));
	}
}
