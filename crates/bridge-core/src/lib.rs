//! Core engine for the qtum bridge.
//!
//! Accepts signed Ethereum transactions, recovers the sender, and replays the
//! transfer on the UTXO chain from the wallet registered for that sender. The
//! builder assembles an engine from configuration and node factories.

pub mod builder;
pub mod engine;
pub mod handlers;
pub mod state;

pub use builder::{BridgeBuilder, BridgeFactories, BuilderError};
pub use engine::{BridgeEngine, EngineError};
pub use handlers::{AccountHandler, BalanceError, TranslationError, TranslationHandler};
pub use state::{TranslationState, TranslationStateError, TranslationStatus};
