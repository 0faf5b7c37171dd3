//! Registry trait for self-registering implementations.
//!
//! Pluggable components (node clients today) declare the name they are
//! configured under together with the factory that builds them.

/// Base trait for implementation registries.
///
/// Each implementation module provides a `Registry` unit struct implementing
/// this trait, so the service can discover every implementation without a
/// hand-maintained list.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. `"qtum"` for `[node.implementations.qtum]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Returns the factory that builds this implementation from its TOML table.
	fn factory() -> Self::Factory;
}
