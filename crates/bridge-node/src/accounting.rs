//! Fee accounting against proof-of-stake blocks.
//!
//! On a PoS chain the transaction fees of a block are collected by the
//! block's coinstake transaction. The effective fee a sender paid can then be
//! read off the coinstake output that pays back to the sender's address.

use crate::{NodeError, NodeService, RequestContext};
use bridge_types::{BlockVerbose, Vin};

/// Returns the id of the first transaction in `block` whose output 0 is
/// flagged coinstake.
pub async fn find_coinstake_tx(
	node: &NodeService,
	ctx: &RequestContext,
	block: &BlockVerbose,
) -> Result<Option<String>, NodeError> {
	for txid in &block.tx {
		if let Some(out) = node.get_tx_out(ctx, txid, 0, true).await? {
			if out.coinstake {
				return Ok(Some(txid.clone()));
			}
		}
	}
	Ok(None)
}

/// Satoshis the block's coinstake pays to the address that funded `vins`.
///
/// Zero when the block has no coinstake or the coinstake has no output for
/// that address.
pub async fn effective_gas_fee(
	node: &NodeService,
	ctx: &RequestContext,
	vins: &[Vin],
	block: &BlockVerbose,
) -> Result<i64, NodeError> {
	let first = vins
		.first()
		.ok_or_else(|| NodeError::NotFound("transaction has no inputs".to_string()))?;
	let Some(to) = first.address.as_deref() else {
		return Ok(0);
	};

	let Some(coinstake) = find_coinstake_tx(node, ctx, block).await? else {
		tracing::debug!(block = %block.hash, "No coinstake transaction in block");
		return Ok(0);
	};

	let tx = node.get_raw_transaction_verbose(ctx, &coinstake).await?;
	let fee = tx
		.vout
		.iter()
		.find(|out| out.script_pub_key.addresses.first().map(String::as_str) == Some(to))
		.map(|out| out.amount_satoshi)
		.unwrap_or(0);
	Ok(fee)
}

/// Position of `txid` within `block.tx`.
pub fn transaction_index(txid: &str, block: &BlockVerbose) -> Result<usize, NodeError> {
	block
		.tx
		.iter()
		.position(|id| id == txid)
		.ok_or_else(|| NodeError::NotFound(format!("tx {} not found in block {}", txid, block.hash)))
}
