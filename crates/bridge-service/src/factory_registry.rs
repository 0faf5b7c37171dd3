//! Dynamic factory registry for bridge implementations.
//!
//! Every node implementation registers itself here, so the config can name
//! any of them under `[node.implementations]`.

use bridge_config::Config;
use bridge_core::{BridgeBuilder, BridgeEngine, BridgeFactories};
use bridge_node::NodeFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Global registry for all implementation factories
pub struct FactoryRegistry {
	pub node: HashMap<String, NodeFactory>,
}

impl Default for FactoryRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			node: HashMap::new(),
		}
	}

	pub fn register_node(&mut self, name: impl Into<String>, factory: NodeFactory) {
		self.node.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Initialize the global registry with all available implementations
pub fn initialize_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in bridge_node::get_all_implementations() {
			tracing::debug!("Registering node implementation: {}", name);
			registry.register_node(name, factory);
		}

		registry
	})
}

pub fn get_registry() -> &'static FactoryRegistry {
	initialize_registry()
}

/// Selects the registered factory for every configured implementation.
fn select_factories(
	registry: &FactoryRegistry,
	config: &Config,
) -> Result<HashMap<String, NodeFactory>, String> {
	let mut factories = HashMap::new();
	for name in config.node.implementations.keys() {
		match registry.node.get(name) {
			Some(factory) => {
				factories.insert(name.clone(), *factory);
			},
			None => {
				let mut available: Vec<_> = registry.node.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown node implementation '{}'. Available: [{}]",
					name,
					available.join(", ")
				));
			},
		}
	}
	Ok(factories)
}

/// Build the bridge engine using the registry and config
pub async fn build_bridge_from_config(
	config: Config,
) -> Result<BridgeEngine, Box<dyn std::error::Error>> {
	let node_factories = select_factories(get_registry(), &config)?;
	let builder = BridgeBuilder::new(config);
	Ok(builder.build(BridgeFactories { node_factories }).await?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use bridge_config::builders::ConfigBuilder;

	#[test]
	fn test_registry_has_builtin_nodes() {
		let registry = get_registry();
		assert!(registry.node.contains_key("qtum"));
		assert!(registry.node.contains_key("mock"));
	}

	#[test]
	fn test_unknown_implementation_lists_available() {
		let config = ConfigBuilder::new()
			.node("electrum", toml::Value::Table(toml::Table::new()))
			.build();
		let err = select_factories(get_registry(), &config).unwrap_err();
		assert_eq!(
			err,
			"Unknown node implementation 'electrum'. Available: [mock, qtum]"
		);
	}

	#[tokio::test]
	async fn test_builds_from_mock_config() {
		let config = ConfigBuilder::new()
			.key("0x00821d8c8a3627adc68aa4034fea953b2f5da553fab312db3fa274240bd49f35")
			.build();
		let engine = build_bridge_from_config(config).await.unwrap();
		assert_eq!(engine.wallets().len().await, 1);
	}
}
