//! Spending side of the qtum bridge.
//!
//! Picks unspent outputs owned by a wallet, assembles a legacy transaction
//! paying the requested amount and signs each input according to its locking
//! script.

use bridge_account::AccountError;
use bridge_node::NodeError;
use bridge_types::{AddressError, AmountConversionError, UnspentOutput};
use rust_decimal::Decimal;
use thiserror::Error;

pub mod builder;
pub mod script;
pub mod selector;
pub mod signer;
pub mod transaction;

pub use builder::TransactionBuilder;
pub use script::ScriptClass;
pub use selector::UtxoSelector;
pub use signer::MultiSchemeSigner;
pub use transaction::{
	empty_transaction, outpoint, unsigned_input, OutPoint, Transaction, TransactionExt, TxIn, TxOut,
	SIGHASH_ALL,
};

/// Errors raised while choosing outputs to spend.
#[derive(Debug, Error)]
pub enum SelectionError {
	#[error("Amount to select must be positive, got {0}")]
	InvalidAmount(Decimal),
	#[error("Insufficient funds: need {required}, {available} available in {} confirmed outputs", .candidates.len())]
	InsufficientFunds {
		required: Decimal,
		available: Decimal,
		/// Every output that passed the confirmation filter.
		candidates: Vec<UnspentOutput>,
	},
	#[error("Failed to list unspent outputs for {address}: {source}")]
	Node {
		address: String,
		#[source]
		source: NodeError,
	},
}

/// Errors raised while assembling an unsigned transaction.
#[derive(Debug, Error)]
pub enum BuildError {
	#[error("Invalid {role} address: {source}")]
	InvalidAddress {
		role: &'static str,
		#[source]
		source: AddressError,
	},
	#[error("Amount conversion failed: {0}")]
	AmountConversion(#[from] AmountConversionError),
	#[error("Inputs fall short of amount plus fee by {shortfall}")]
	InsufficientInputs { shortfall: Decimal },
	#[error("Invalid outpoint {txid}:{vout}: {reason}")]
	InvalidOutpoint {
		txid: String,
		vout: u32,
		reason: String,
	},
	#[error("No inputs to spend")]
	NoInputs,
}

/// Errors raised while signing inputs. Inputs before `index` stay signed.
#[derive(Debug, Error)]
pub enum SignError {
	#[error("Input {index}: {source}")]
	KeyNotFound {
		index: usize,
		#[source]
		source: AccountError,
	},
	#[error("Input {index}: unsupported script type {class}")]
	UnsupportedScriptType { index: usize, class: ScriptClass },
	#[error("Input {index}: invalid locking script: {reason}")]
	InvalidScript { index: usize, reason: String },
	#[error("Input {index} has no matching unspent output")]
	MissingOutput { index: usize },
	#[error("Input {index}: cannot compute signature hash: {reason}")]
	Sighash { index: usize, reason: String },
}

impl SignError {
	/// Index of the input that failed.
	pub fn index(&self) -> usize {
		match self {
			SignError::KeyNotFound { index, .. }
			| SignError::UnsupportedScriptType { index, .. }
			| SignError::InvalidScript { index, .. }
			| SignError::Sighash { index, .. }
			| SignError::MissingOutput { index } => *index,
		}
	}
}

/// Any failure on the spending path.
#[derive(Debug, Error)]
pub enum UtxoError {
	#[error(transparent)]
	Selection(#[from] SelectionError),
	#[error(transparent)]
	Build(#[from] BuildError),
	#[error(transparent)]
	Sign(#[from] SignError),
}
