//! Legacy transaction helpers over the `bitcoin` wire types.

use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::hashes::Hash;
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{Script, ScriptBuf, Sequence, Txid, Witness};
use std::str::FromStr;

pub use bitcoin::{OutPoint, Transaction, TxIn, TxOut};

/// Sighash flag committing to every input and output.
pub const SIGHASH_ALL: EcdsaSighashType = EcdsaSighashType::All;

/// A version 1 transaction with no inputs, outputs or lock time.
pub fn empty_transaction() -> Transaction {
	Transaction {
		version: Version::ONE,
		lock_time: LockTime::ZERO,
		input: Vec::new(),
		output: Vec::new(),
	}
}

/// Final-sequence input with an empty unlocking script.
pub fn unsigned_input(previous_output: OutPoint) -> TxIn {
	TxIn {
		previous_output,
		script_sig: ScriptBuf::new(),
		sequence: Sequence::MAX,
		witness: Witness::new(),
	}
}

/// Outpoint for a txid as displayed by the node (big-endian hex).
pub fn outpoint(txid: &str, vout: u32) -> Result<OutPoint, String> {
	let txid = Txid::from_str(txid).map_err(|e| format!("invalid txid: {}", e))?;
	Ok(OutPoint { txid, vout })
}

/// Node-facing views of a legacy transaction.
pub trait TransactionExt {
	/// Consensus serialization as hex, ready for `sendrawtransaction`.
	fn to_hex(&self) -> String;

	/// Transaction id as displayed by the node.
	fn txid_hex(&self) -> String;

	/// True once every input carries an unlocking script.
	fn is_fully_signed(&self) -> bool;

	/// Sum of all output values in satoshis.
	fn output_total(&self) -> u64;

	/// Legacy signature hash for input `index` spending `script_code`.
	fn legacy_sighash(
		&self,
		index: usize,
		script_code: &Script,
		sighash_type: EcdsaSighashType,
	) -> Result<[u8; 32], String>;
}

impl TransactionExt for Transaction {
	fn to_hex(&self) -> String {
		serialize_hex(self)
	}

	fn txid_hex(&self) -> String {
		self.compute_txid().to_string()
	}

	fn is_fully_signed(&self) -> bool {
		!self.input.is_empty() && self.input.iter().all(|input| !input.script_sig.is_empty())
	}

	fn output_total(&self) -> u64 {
		self.output.iter().map(|output| output.value.to_sat()).sum()
	}

	fn legacy_sighash(
		&self,
		index: usize,
		script_code: &Script,
		sighash_type: EcdsaSighashType,
	) -> Result<[u8; 32], String> {
		SighashCache::new(self)
			.legacy_signature_hash(index, script_code, sighash_type.to_u32())
			.map(|hash| hash.to_byte_array())
			.map_err(|e| e.to_string())
	}
}
