//! Builder for constructing bridge engines.
//!
//! Node implementations are created from factory functions keyed by the
//! implementation name used in `[node.implementations]`.

use crate::engine::BridgeEngine;
use bridge_config::Config;
use bridge_node::{NodeError, NodeInterface, NodeService};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions needed to build a [`BridgeEngine`].
pub struct BridgeFactories<NF> {
	pub node_factories: HashMap<String, NF>,
}

/// Builder for constructing a [`BridgeEngine`] with a pluggable node.
pub struct BridgeBuilder {
	config: Config,
}

impl BridgeBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Creates the configured node implementations, wires the engine around
	/// the primary one and imports the configured keys.
	pub async fn build<NF>(self, factories: BridgeFactories<NF>) -> Result<BridgeEngine, BuilderError>
	where
		NF: Fn(&toml::Value) -> Result<Box<dyn NodeInterface>, NodeError>,
	{
		let mut node_impls = HashMap::new();
		for (name, config) in &self.config.node.implementations {
			if let Some(factory) = factories.node_factories.get(name) {
				match factory(config) {
					Ok(implementation) => {
						node_impls.insert(name.clone(), implementation);
						let is_primary = &self.config.node.primary == name;
						tracing::info!(component = "node", implementation = %name, enabled = %is_primary, "Loaded");
					},
					Err(e) => {
						tracing::error!(
							component = "node",
							implementation = %name,
							error = %e,
							"Failed to create node implementation"
						);
						return Err(BuilderError::Config(format!(
							"Failed to create node implementation '{}': {}",
							name, e
						)));
					},
				}
			}
		}

		let primary_node = &self.config.node.primary;
		let node_backend = node_impls.remove(primary_node).ok_or_else(|| {
			BuilderError::MissingComponent(format!(
				"Primary node '{}' has no registered implementation",
				primary_node
			))
		})?;
		let node = Arc::new(NodeService::new(
			node_backend,
			Duration::from_secs(self.config.node.request_timeout_seconds),
		));

		let engine = BridgeEngine::new(self.config, node)
			.map_err(|e| BuilderError::Config(e.to_string()))?;
		let imported = engine
			.import_configured_keys()
			.await
			.map_err(|e| BuilderError::Config(format!("Failed to import configured keys: {}", e)))?;
		tracing::info!(component = "account", wallets = imported, "Imported configured keys");

		Ok(engine)
	}
}
