//! First-fit selection of confirmed outputs.

use crate::SelectionError;
use bridge_node::{NodeService, RequestContext};
use bridge_types::UnspentOutput;
use rust_decimal::Decimal;

/// Upper bound passed to `listunspent` so that no output is excluded for
/// being too deep.
pub const MAX_CONFIRMATIONS: u32 = 9_999_999;

/// Chooses which outputs fund a payment.
#[derive(Debug, Clone, Copy)]
pub struct UtxoSelector {
	min_confirmations: u32,
}

impl UtxoSelector {
	pub fn new(min_confirmations: u32) -> Self {
		Self { min_confirmations }
	}

	pub fn min_confirmations(&self) -> u32 {
		self.min_confirmations
	}

	/// Lists outputs at `address` and returns the shortest prefix, in node
	/// order, whose total covers `min_amount`.
	pub async fn select(
		&self,
		node: &NodeService,
		ctx: &RequestContext,
		address: &str,
		min_amount: Decimal,
	) -> Result<Vec<UnspentOutput>, SelectionError> {
		if min_amount <= Decimal::ZERO {
			return Err(SelectionError::InvalidAmount(min_amount));
		}
		let unspent = node
			.list_unspent(ctx, 0, MAX_CONFIRMATIONS, &[address.to_string()])
			.await
			.map_err(|source| SelectionError::Node {
				address: address.to_string(),
				source,
			})?;
		tracing::debug!(
			address = %address,
			listed = unspent.len(),
			"Listed unspent outputs"
		);
		self.covering_prefix(unspent, min_amount)
	}

	/// Selection over an already-fetched output list.
	pub fn covering_prefix(
		&self,
		unspent: Vec<UnspentOutput>,
		min_amount: Decimal,
	) -> Result<Vec<UnspentOutput>, SelectionError> {
		if min_amount <= Decimal::ZERO {
			return Err(SelectionError::InvalidAmount(min_amount));
		}
		let candidates: Vec<UnspentOutput> = unspent
			.into_iter()
			.filter(|u| u.confirmations >= i64::from(self.min_confirmations))
			.collect();

		let mut total = Decimal::ZERO;
		let mut take = None;
		for (i, utxo) in candidates.iter().enumerate() {
			total += utxo.amount;
			if total >= min_amount {
				take = Some(i + 1);
				break;
			}
		}

		match take {
			Some(n) => {
				let mut selected = candidates;
				selected.truncate(n);
				Ok(selected)
			},
			None => Err(SelectionError::InsufficientFunds {
				required: min_amount,
				available: total,
				candidates,
			}),
		}
	}
}
