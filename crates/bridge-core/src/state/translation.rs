//! Translation state machine.
//!
//! Translations move through: Decoded -> IdentityRecovered -> WalletResolved ->
//! AddressVerified -> UtxosSelected -> Built -> Signed -> Submitted. Any
//! non-terminal stage may move to Failed.

use bridge_types::truncate_id;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during translation state management.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslationStateError {
	#[error("Invalid state transition from {from} to {to}")]
	InvalidTransition {
		from: TranslationStatus,
		to: TranslationStatus,
	},
}

/// Stage a translation has reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationStatus {
	Decoded,
	IdentityRecovered,
	WalletResolved,
	AddressVerified,
	UtxosSelected,
	Built,
	Signed,
	/// Broadcast accepted; carries the UTXO-chain txid.
	Submitted(String),
	/// Carries the message of the error that stopped the translation.
	Failed(String),
}

impl TranslationStatus {
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			TranslationStatus::Submitted(_) | TranslationStatus::Failed(_)
		)
	}
}

impl fmt::Display for TranslationStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TranslationStatus::Decoded => write!(f, "Decoded"),
			TranslationStatus::IdentityRecovered => write!(f, "IdentityRecovered"),
			TranslationStatus::WalletResolved => write!(f, "WalletResolved"),
			TranslationStatus::AddressVerified => write!(f, "AddressVerified"),
			TranslationStatus::UtxosSelected => write!(f, "UTXOsSelected"),
			TranslationStatus::Built => write!(f, "Built"),
			TranslationStatus::Signed => write!(f, "Signed"),
			TranslationStatus::Submitted(_) => write!(f, "Submitted"),
			TranslationStatus::Failed(_) => write!(f, "Failed"),
		}
	}
}

/// Current stage of one translation, keyed by the Ethereum tx hash.
#[derive(Debug, Clone)]
pub struct TranslationState {
	eth_hash: String,
	status: TranslationStatus,
}

impl TranslationState {
	/// Starts a translation whose inbound transaction has just been decoded.
	pub fn decoded(eth_hash: impl Into<String>) -> Self {
		let eth_hash = eth_hash.into();
		tracing::debug!(eth_hash = %truncate_id(&eth_hash), state = "Decoded", "Translation started");
		Self {
			eth_hash,
			status: TranslationStatus::Decoded,
		}
	}

	pub fn status(&self) -> &TranslationStatus {
		&self.status
	}

	pub fn eth_hash(&self) -> &str {
		&self.eth_hash
	}

	/// Moves to `next` if the transition table allows it.
	pub fn advance(&mut self, next: TranslationStatus) -> Result<(), TranslationStateError> {
		if !Self::is_valid_transition(&self.status, &next) {
			return Err(TranslationStateError::InvalidTransition {
				from: self.status.clone(),
				to: next,
			});
		}
		tracing::debug!(
			eth_hash = %truncate_id(&self.eth_hash),
			from = %self.status,
			to = %next,
			"Translation state transition"
		);
		self.status = next;
		Ok(())
	}

	/// Records a failure. Terminal states are left untouched.
	pub fn fail(&mut self, reason: impl fmt::Display) {
		if self.status.is_terminal() {
			return;
		}
		let reason = reason.to_string();
		tracing::debug!(
			eth_hash = %truncate_id(&self.eth_hash),
			from = %self.status,
			reason = %reason,
			"Translation failed"
		);
		self.status = TranslationStatus::Failed(reason);
	}

	fn is_valid_transition(from: &TranslationStatus, to: &TranslationStatus) -> bool {
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
		enum StatusKind {
			Decoded,
			IdentityRecovered,
			WalletResolved,
			AddressVerified,
			UtxosSelected,
			Built,
			Signed,
			Submitted,
			Failed,
		}

		// Static transition table - each state maps to allowed next states
		static TRANSITIONS: Lazy<HashMap<StatusKind, HashSet<StatusKind>>> = Lazy::new(|| {
			let mut m = HashMap::new();
			m.insert(
				StatusKind::Decoded,
				HashSet::from([StatusKind::IdentityRecovered, StatusKind::Failed]),
			);
			m.insert(
				StatusKind::IdentityRecovered,
				HashSet::from([StatusKind::WalletResolved, StatusKind::Failed]),
			);
			m.insert(
				StatusKind::WalletResolved,
				HashSet::from([StatusKind::AddressVerified, StatusKind::Failed]),
			);
			m.insert(
				StatusKind::AddressVerified,
				HashSet::from([StatusKind::UtxosSelected, StatusKind::Failed]),
			);
			m.insert(
				StatusKind::UtxosSelected,
				HashSet::from([StatusKind::Built, StatusKind::Failed]),
			);
			m.insert(
				StatusKind::Built,
				HashSet::from([StatusKind::Signed, StatusKind::Failed]),
			);
			m.insert(
				StatusKind::Signed,
				HashSet::from([StatusKind::Submitted, StatusKind::Failed]),
			);
			m.insert(StatusKind::Submitted, HashSet::new()); // terminal
			m.insert(StatusKind::Failed, HashSet::new()); // terminal
			m
		});

		let kind = |status: &TranslationStatus| -> StatusKind {
			match status {
				TranslationStatus::Decoded => StatusKind::Decoded,
				TranslationStatus::IdentityRecovered => StatusKind::IdentityRecovered,
				TranslationStatus::WalletResolved => StatusKind::WalletResolved,
				TranslationStatus::AddressVerified => StatusKind::AddressVerified,
				TranslationStatus::UtxosSelected => StatusKind::UtxosSelected,
				TranslationStatus::Built => StatusKind::Built,
				TranslationStatus::Signed => StatusKind::Signed,
				TranslationStatus::Submitted(_) => StatusKind::Submitted,
				TranslationStatus::Failed(_) => StatusKind::Failed,
			}
		};

		TRANSITIONS
			.get(&kind(from))
			.is_some_and(|set| set.contains(&kind(to)))
	}
}
