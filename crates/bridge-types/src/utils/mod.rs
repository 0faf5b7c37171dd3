//! Utility functions shared across the bridge.
//!
//! Hashing primitives for the UTXO chain, hex formatting helpers and the
//! fixed-point conversions between wei, QTUM and satoshis.

pub mod conversion;
pub mod formatting;
pub mod hashing;

pub use conversion::{
	qtum_to_satoshis, satoshis_to_qtum, satoshis_to_wei, wei_to_qtum, AmountConversionError,
	QTUM_DECIMALS, SATOSHIS_PER_QTUM, WEI_PER_SATOSHI,
};
pub use formatting::{reverse_hex, truncate_id, with_0x_prefix, without_0x_prefix};
pub use hashing::{double_sha256, ethereum_address, hash160};
