//! Common types module for the qtum bridge.
//!
//! This module defines the data types shared by every bridge component: chain
//! parameters and address encodings for the UTXO side, node RPC payloads,
//! JSON-RPC API envelopes, configuration schemas and unit conversions between
//! wei and satoshis.

/// UTXO-chain address encoding and decoding.
pub mod address;
/// JSON-RPC request/response envelopes and API errors.
pub mod api;
/// Network parameters for the supported UTXO chains.
pub mod chain;
/// Payload types returned by the UTXO-chain node.
pub mod node;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Zeroizing wrapper for key material.
pub mod secret_string;
/// Utility functions for hashing, formatting and unit conversion.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

pub use address::{AddressError, QtumAddress};
pub use alloy_primitives::Address;
pub use api::*;
pub use chain::{ChainParams, Network};
pub use node::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use utils::{
	double_sha256, ethereum_address, hash160, qtum_to_satoshis, satoshis_to_qtum,
	satoshis_to_wei, truncate_id, wei_to_qtum, with_0x_prefix, without_0x_prefix,
	reverse_hex, AmountConversionError, SATOSHIS_PER_QTUM, WEI_PER_SATOSHI,
};
pub use validation::*;
