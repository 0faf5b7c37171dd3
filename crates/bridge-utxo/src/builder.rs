//! Unsigned transaction assembly.

use crate::transaction::{empty_transaction, outpoint, unsigned_input, Transaction, TxOut};
use crate::BuildError;
use bitcoin::{Amount, ScriptBuf};
use bridge_types::{
	qtum_to_satoshis, satoshis_to_qtum, AmountConversionError, ChainParams, QtumAddress,
	UnspentOutput,
};
use bridge_types::utils::QTUM_DECIMALS;
use rust_decimal::Decimal;

/// Builds payment transactions with a fixed fee.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
	params: ChainParams,
	fee_satoshis: i64,
}

impl TransactionBuilder {
	pub fn new(params: ChainParams, fee_satoshis: i64) -> Self {
		Self {
			params,
			fee_satoshis,
		}
	}

	/// The fee charged on every transaction, in QTUM.
	pub fn fee(&self) -> Decimal {
		satoshis_to_qtum(self.fee_satoshis)
	}

	/// Spends `utxos` to pay `amount` to `receiver`, returning any change to
	/// `sender`.
	///
	/// The payment output comes first. A change output follows only when
	/// change is strictly positive.
	pub fn build(
		&self,
		utxos: &[UnspentOutput],
		sender: &str,
		receiver: &str,
		amount: Decimal,
	) -> Result<Transaction, BuildError> {
		let sender_address = QtumAddress::decode(sender, &self.params).map_err(|source| {
			BuildError::InvalidAddress {
				role: "sender",
				source,
			}
		})?;
		let receiver_address = QtumAddress::decode(receiver, &self.params).map_err(|source| {
			BuildError::InvalidAddress {
				role: "receiver",
				source,
			}
		})?;
		if utxos.is_empty() {
			return Err(BuildError::NoInputs);
		}

		let amount_satoshis = qtum_to_satoshis(amount)?;

		let mut tx = empty_transaction();
		let mut input_total: i64 = 0;
		for utxo in utxos {
			let previous_output = outpoint(&utxo.txid, utxo.vout).map_err(|reason| {
				BuildError::InvalidOutpoint {
					txid: utxo.txid.clone(),
					vout: utxo.vout,
					reason,
				}
			})?;
			input_total = input_total
				.checked_add(qtum_to_satoshis(utxo.amount)?)
				.ok_or_else(|| AmountConversionError::Overflow(utxo.amount.to_string()))?;
			tx.input.push(unsigned_input(previous_output));
		}

		tx.output.push(TxOut {
			value: to_amount(amount_satoshis)?,
			script_pubkey: ScriptBuf::from_bytes(receiver_address.script_pubkey()),
		});

		let change = i128::from(input_total)
			- i128::from(amount_satoshis)
			- i128::from(self.fee_satoshis);
		if change < 0 {
			return Err(BuildError::InsufficientInputs {
				shortfall: Decimal::from_i128_with_scale(-change, QTUM_DECIMALS),
			});
		}
		// Non-negative and at most the input total.
		let change = i64::try_from(change)
			.map_err(|_| AmountConversionError::Overflow(change.to_string()))?;
		if change > 0 {
			tx.output.push(TxOut {
				value: to_amount(change)?,
				script_pubkey: ScriptBuf::from_bytes(sender_address.script_pubkey()),
			});
		}

		tracing::debug!(
			inputs = tx.input.len(),
			outputs = tx.output.len(),
			amount = %amount,
			change = %satoshis_to_qtum(change),
			"Built unsigned transaction"
		);
		Ok(tx)
	}
}

fn to_amount(satoshis: i64) -> Result<Amount, AmountConversionError> {
	u64::try_from(satoshis)
		.map(Amount::from_sat)
		.map_err(|_| AmountConversionError::Negative(satoshis.to_string()))
}
