//! Ethereum-side transaction handling for the qtum bridge.
//!
//! Decodes legacy RLP-encoded signed transactions and recovers the sender
//! from the signature alone. No node is involved; everything here is a pure
//! function of the input bytes.

use thiserror::Error;

pub mod recovery;
pub mod transaction;

pub use recovery::{recover_sender, SenderIdentity};
pub use transaction::RawTransaction;

/// Errors that can occur while decoding or recovering a transaction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EthereumError {
	#[error("Failed to decode transaction: {0}")]
	Decode(String),
	#[error("Failed to recover sender: {0}")]
	Recovery(String),
}
