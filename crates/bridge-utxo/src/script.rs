//! Locking-script classification and unlocking-script construction.

use bitcoin::opcodes::all::{OP_CHECKMULTISIG, OP_PUSHNUM_1, OP_PUSHNUM_16};
use bitcoin::script::{Builder, Instruction};
use bitcoin::{ecdsa, PublicKey, Script, ScriptBuf};
use std::fmt;

/// Standard locking-script forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptClass {
	PubKeyHash,
	PubKey,
	ScriptHash,
	WitnessPubKeyHash,
	WitnessScriptHash,
	WitnessUnknown,
	MultiSig,
	NullData,
	NonStandard,
}

impl ScriptClass {
	/// Classifies a locking script.
	pub fn classify(script: &Script) -> Self {
		if script.is_p2pkh() {
			ScriptClass::PubKeyHash
		} else if script.is_p2pk() {
			ScriptClass::PubKey
		} else if script.is_p2sh() {
			ScriptClass::ScriptHash
		} else if script.is_p2wpkh() {
			ScriptClass::WitnessPubKeyHash
		} else if script.is_p2wsh() {
			ScriptClass::WitnessScriptHash
		} else if script.is_witness_program() {
			ScriptClass::WitnessUnknown
		} else if script.is_op_return() {
			ScriptClass::NullData
		} else if is_multisig(script) {
			ScriptClass::MultiSig
		} else {
			ScriptClass::NonStandard
		}
	}

	/// Name the node uses for this class in `scriptPubKey.type`.
	pub fn name(&self) -> &'static str {
		match self {
			ScriptClass::PubKeyHash => "pubkeyhash",
			ScriptClass::PubKey => "pubkey",
			ScriptClass::ScriptHash => "scripthash",
			ScriptClass::WitnessPubKeyHash => "witness_v0_keyhash",
			ScriptClass::WitnessScriptHash => "witness_v0_scripthash",
			ScriptClass::WitnessUnknown => "witness_unknown",
			ScriptClass::MultiSig => "multisig",
			ScriptClass::NullData => "nulldata",
			ScriptClass::NonStandard => "nonstandard",
		}
	}
}

impl fmt::Display for ScriptClass {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Value of an `OP_1`..`OP_16` opcode.
fn small_int(instruction: &Instruction<'_>) -> Option<u8> {
	let Instruction::Op(op) = instruction else {
		return None;
	};
	let code = op.to_u8();
	(OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8())
		.contains(&code)
		.then(|| code - OP_PUSHNUM_1.to_u8() + 1)
}

/// `OP_m <pubkey>... OP_n OP_CHECKMULTISIG` with 1 <= m <= n.
fn is_multisig(script: &Script) -> bool {
	let Ok(instructions) = script.instructions().collect::<Result<Vec<_>, _>>() else {
		return false;
	};
	let [first, keys @ .., last, Instruction::Op(checkmultisig)] = instructions.as_slice() else {
		return false;
	};
	if *checkmultisig != OP_CHECKMULTISIG {
		return false;
	}
	let (Some(required), Some(total)) = (small_int(first), small_int(last)) else {
		return false;
	};
	required <= total
		&& keys.len() == usize::from(total)
		&& keys.iter().all(|key| {
			matches!(key, Instruction::PushBytes(bytes) if bytes.len() == 33 || bytes.len() == 65)
		})
}

/// `<sig> <pubkey>` unlocking a pay-to-pubkey-hash output.
pub fn pay_to_pubkey_hash_sig(signature: &ecdsa::Signature, public_key: &PublicKey) -> ScriptBuf {
	Builder::new()
		.push_slice(signature.serialize())
		.push_key(public_key)
		.into_script()
}

/// `<sig>` unlocking a pay-to-pubkey output.
pub fn pay_to_pubkey_sig(signature: &ecdsa::Signature) -> ScriptBuf {
	Builder::new().push_slice(signature.serialize()).into_script()
}

#[cfg(test)]
mod tests {
	use super::*;
	use bitcoin::secp256k1::{Message, Secp256k1, SecretKey};
	use bitcoin::sighash::EcdsaSighashType;

	const PUBKEY: &str = "0299d391f528b9edd07284c7e23df8415232a8ce41531cf460a390ce32b4efd112";

	fn script(hex: &str) -> ScriptBuf {
		ScriptBuf::from_bytes(hex::decode(hex).unwrap())
	}

	fn pushes(script: &Script) -> Vec<Vec<u8>> {
		script
			.instructions()
			.map(|instruction| match instruction.unwrap() {
				Instruction::PushBytes(bytes) => bytes.as_bytes().to_vec(),
				Instruction::Op(op) => panic!("unexpected opcode {op}"),
			})
			.collect()
	}

	#[test]
	fn test_classify_standard_forms() {
		let h20 = "e599be870c63d68a00a5019906d258a4ba5d1bac";
		let h32 = "00".repeat(32);
		let cases = [
			(format!("76a914{h20}88ac"), ScriptClass::PubKeyHash),
			(format!("21{PUBKEY}ac"), ScriptClass::PubKey),
			(format!("a914{h20}87"), ScriptClass::ScriptHash),
			(format!("0014{h20}"), ScriptClass::WitnessPubKeyHash),
			(format!("0020{h32}"), ScriptClass::WitnessScriptHash),
			(format!("5120{h32}"), ScriptClass::WitnessUnknown),
			(format!("5121{PUBKEY}21{PUBKEY}52ae"), ScriptClass::MultiSig),
			("6a0568656c6c6f".to_string(), ScriptClass::NullData),
			("6a".to_string(), ScriptClass::NullData),
			(String::new(), ScriptClass::NonStandard),
			(format!("76a913{}88ac", &h20[2..]), ScriptClass::NonStandard),
		];
		for (hex, expected) in cases {
			assert_eq!(ScriptClass::classify(&script(&hex)), expected, "script {hex}");
		}
	}

	#[test]
	fn test_multisig_requires_consistent_counts() {
		// 3-of-2 is not a valid multisig.
		let bad = format!("5321{PUBKEY}21{PUBKEY}52ae");
		assert_eq!(ScriptClass::classify(&script(&bad)), ScriptClass::NonStandard);
		// Declared two keys, supplied one.
		let short = format!("5121{PUBKEY}52ae");
		assert_eq!(ScriptClass::classify(&script(&short)), ScriptClass::NonStandard);
	}

	#[test]
	fn test_unlocking_scripts() {
		let secp = Secp256k1::new();
		let key = SecretKey::from_slice(&[7u8; 32]).unwrap();
		let signature = ecdsa::Signature {
			signature: secp.sign_ecdsa(&Message::from_digest([1u8; 32]), &key),
			sighash_type: EcdsaSighashType::All,
		};
		let public_key = PublicKey::new(key.public_key(&secp));

		let p2pkh = pay_to_pubkey_hash_sig(&signature, &public_key);
		let parts = pushes(&p2pkh);
		assert_eq!(parts.len(), 2);
		assert_eq!(parts[0], signature.to_vec());
		assert_eq!(parts[0].last(), Some(&0x01));
		assert_eq!(parts[1], public_key.to_bytes());

		let p2pk = pay_to_pubkey_sig(&signature);
		assert_eq!(pushes(&p2pk), vec![signature.to_vec()]);
	}

	#[test]
	fn test_display_names() {
		assert_eq!(ScriptClass::ScriptHash.to_string(), "scripthash");
		assert_eq!(ScriptClass::WitnessPubKeyHash.to_string(), "witness_v0_keyhash");
	}
}
