//! String formatting utilities.
//!
//! Hex prefix handling for Ethereum-style values and display helpers for
//! transaction ids.

/// Truncates a hex id for log output, keeping the first 8 characters.
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 8 {
		id.to_string()
	} else {
		format!("{}..", &id[..8])
	}
}

/// Adds a `0x` prefix unless one is already present.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.starts_with("0x") || hex_str.starts_with("0X") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Strips a leading `0x`/`0X` if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Hex-encodes `bytes` in reverse order.
///
/// UTXO-chain txids are displayed byte-reversed relative to their hash.
pub fn reverse_hex(bytes: &[u8]) -> String {
	let reversed: Vec<u8> = bytes.iter().rev().copied().collect();
	hex::encode(reversed)
}
