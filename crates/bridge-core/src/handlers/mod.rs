//! Request handlers for the bridge engine.
//!
//! The translation handler turns a signed Ethereum transaction into a
//! broadcast UTXO-chain payment. The account handler manages the wallets the
//! bridge signs with and reports their balances.

pub mod account;
pub mod translation;

pub use account::{AccountHandler, BalanceError};
pub use translation::{TranslationError, TranslationHandler};
