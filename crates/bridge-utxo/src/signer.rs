//! Per-input signing dispatched on the spent output's script class.

use crate::script::{pay_to_pubkey_hash_sig, pay_to_pubkey_sig, ScriptClass};
use crate::transaction::{Transaction, TransactionExt, SIGHASH_ALL};
use crate::SignError;
use bitcoin::secp256k1::{All, Message, Secp256k1, SecretKey};
use bitcoin::{ecdsa, PublicKey, Script, ScriptBuf};
use bridge_account::WalletInterface;
use bridge_types::UnspentOutput;

/// Signs pay-to-pubkey-hash and pay-to-pubkey inputs with SIGHASH_ALL.
pub struct MultiSchemeSigner {
	secp: Secp256k1<All>,
}

impl Default for MultiSchemeSigner {
	fn default() -> Self {
		Self::new()
	}
}

impl MultiSchemeSigner {
	pub fn new() -> Self {
		Self {
			secp: Secp256k1::new(),
		}
	}

	/// Fills in the unlocking script of every input of `tx`, in order.
	///
	/// `utxos[i]` must be the output spent by input `i`. On error the
	/// transaction is left partially signed: inputs before the failing index
	/// keep their scripts.
	pub fn sign(
		&self,
		tx: &mut Transaction,
		utxos: &[UnspentOutput],
		wallet: &dyn WalletInterface,
	) -> Result<(), SignError> {
		for index in 0..tx.input.len() {
			let utxo = utxos
				.get(index)
				.filter(|utxo| {
					let prev = &tx.input[index].previous_output;
					prev.vout == utxo.vout && prev.txid.to_string().eq_ignore_ascii_case(&utxo.txid)
				})
				.ok_or(SignError::MissingOutput { index })?;

			let key = wallet
				.private_key_for(&utxo.address)
				.map_err(|source| SignError::KeyNotFound { index, source })?;
			let script = ScriptBuf::from_hex(&utxo.script_pub_key).map_err(|e| {
				SignError::InvalidScript {
					index,
					reason: e.to_string(),
				}
			})?;

			let class = ScriptClass::classify(&script);
			let script_sig = match class {
				ScriptClass::PubKeyHash => {
					let signature = self.signature(tx, index, &script, &key)?;
					let public_key = PublicKey::new(key.public_key(&self.secp));
					pay_to_pubkey_hash_sig(&signature, &public_key)
				},
				ScriptClass::PubKey => pay_to_pubkey_sig(&self.signature(tx, index, &script, &key)?),
				ScriptClass::ScriptHash
				| ScriptClass::WitnessPubKeyHash
				| ScriptClass::WitnessScriptHash
				| ScriptClass::WitnessUnknown
				| ScriptClass::MultiSig
				| ScriptClass::NullData
				| ScriptClass::NonStandard => {
					return Err(SignError::UnsupportedScriptType { index, class });
				},
			};

			tx.input[index].script_sig = script_sig;
			tracing::trace!(index, class = %class, "Signed input");
		}
		Ok(())
	}

	/// Low-S signature over the legacy sighash, tagged SIGHASH_ALL.
	fn signature(
		&self,
		tx: &Transaction,
		index: usize,
		script: &Script,
		key: &SecretKey,
	) -> Result<ecdsa::Signature, SignError> {
		let sighash = tx
			.legacy_sighash(index, script, SIGHASH_ALL)
			.map_err(|reason| SignError::Sighash { index, reason })?;
		let mut signature = self.secp.sign_ecdsa(&Message::from_digest(sighash), key);
		signature.normalize_s();
		Ok(ecdsa::Signature {
			signature,
			sighash_type: SIGHASH_ALL,
		})
	}
}
