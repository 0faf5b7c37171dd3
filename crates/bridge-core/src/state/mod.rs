//! State tracking for translations in flight.
//!
//! A translation walks a fixed sequence of stages from decoding the inbound
//! Ethereum transaction to broadcasting its UTXO-chain counterpart. The state
//! machine rejects out-of-order transitions and records the terminal outcome.

pub mod translation;

pub use translation::{TranslationState, TranslationStateError, TranslationStatus};
