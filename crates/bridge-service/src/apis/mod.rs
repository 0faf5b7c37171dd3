//! API implementations for the bridge service.

pub mod proxy;
pub mod rpc;
