//! Schema checks for implementation-specific TOML tables.
//!
//! Each pluggable implementation (node clients, for now) describes the shape
//! of its `[node.implementations.<name>]` table with a [`Schema`]. The loader
//! runs the schema before the factory is invoked, so factories can assume the
//! fields they read are present and well-typed.

use async_trait::async_trait;
use thiserror::Error;

/// Errors produced by schema validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
	#[error("Failed to deserialize config: {0}")]
	DeserializationError(String),
}

impl ValidationError {
	/// Prefixes the field path with `parent`, used when reporting errors from
	/// nested tables and array elements.
	fn nested_under(self, parent: &str) -> Self {
		match self {
			ValidationError::MissingField(f) => {
				ValidationError::MissingField(format!("{}.{}", parent, f))
			},
			ValidationError::InvalidValue { field, message } => ValidationError::InvalidValue {
				field: format!("{}.{}", parent, field),
				message,
			},
			ValidationError::TypeMismatch {
				field,
				expected,
				actual,
			} => ValidationError::TypeMismatch {
				field: format!("{}.{}", parent, field),
				expected,
				actual,
			},
			other => other,
		}
	}
}

/// Expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	/// Integer with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	Boolean,
	/// Homogeneous array.
	Array(Box<FieldType>),
	/// Nested table checked against its own schema.
	Table(Schema),
}

impl FieldType {
	fn name(&self) -> &'static str {
		match self {
			FieldType::String => "string",
			FieldType::Integer { .. } => "integer",
			FieldType::Boolean => "boolean",
			FieldType::Array(_) => "array",
			FieldType::Table(_) => "table",
		}
	}
}

/// Extra check run after the type check passes.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field in a [`Schema`].
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Attaches a custom validator; its error string becomes the
	/// `InvalidValue` message.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		check_type(&self.name, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Required and optional fields of a TOML table.
///
/// Unknown keys are ignored so that implementations can grow new options
/// without breaking older configs.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Checks `config`, which must be a table.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		Ok(())
	}
}

fn mismatch(field_name: &str, expected: &FieldType, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.name().to_string(),
		actual: value.type_str().to_string(),
	}
}

fn check_type(
	field_name: &str,
	value: &toml::Value,
	expected: &FieldType,
) -> Result<(), ValidationError> {
	match expected {
		FieldType::String if value.is_str() => Ok(()),
		FieldType::Boolean if value.is_bool() => Ok(()),
		FieldType::String | FieldType::Boolean => Err(mismatch(field_name, expected, value)),
		FieldType::Integer { min, max } => {
			let n = value
				.as_integer()
				.ok_or_else(|| mismatch(field_name, expected, value))?;
			if let Some(min) = min.filter(|min| n < *min) {
				return Err(ValidationError::InvalidValue {
					field: field_name.to_string(),
					message: format!("Value {} is less than minimum {}", n, min),
				});
			}
			if let Some(max) = max.filter(|max| n > *max) {
				return Err(ValidationError::InvalidValue {
					field: field_name.to_string(),
					message: format!("Value {} is greater than maximum {}", n, max),
				});
			}
			Ok(())
		},
		FieldType::Array(inner) => {
			let items = value
				.as_array()
				.ok_or_else(|| mismatch(field_name, expected, value))?;
			for (i, item) in items.iter().enumerate() {
				check_type(&format!("{}[{}]", field_name, i), item, inner)?;
			}
			Ok(())
		},
		FieldType::Table(schema) => schema
			.validate(value)
			.map_err(|e| e.nested_under(field_name)),
	}
}

/// Implemented by every pluggable implementation to validate its own table.
#[async_trait]
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn rpc_schema() -> Schema {
		Schema::new(
			vec![
				Field::new("rpc_url", FieldType::String).with_validator(|v| {
					match v.as_str() {
						Some(url) if url.starts_with("http") => Ok(()),
						_ => Err("must be an http(s) URL".to_string()),
					}
				}),
				Field::new(
					"timeout",
					FieldType::Integer {
						min: Some(1),
						max: Some(300),
					},
				),
			],
			vec![
				Field::new("verbose", FieldType::Boolean),
				Field::new(
					"auth",
					FieldType::Table(Schema::new(
						vec![Field::new("user", FieldType::String)],
						vec![],
					)),
				),
				Field::new("tags", FieldType::Array(Box::new(FieldType::String))),
			],
		)
	}

	fn parse(s: &str) -> toml::Value {
		toml::from_str(s).unwrap()
	}

	#[test]
	fn test_valid_table() {
		let config = parse(
			r#"
			rpc_url = "http://127.0.0.1:3889"
			timeout = 30
			verbose = true
			tags = ["a", "b"]
			[auth]
			user = "qtum"
			"#,
		);
		assert!(rpc_schema().validate(&config).is_ok());
	}

	#[test]
	fn test_missing_required_field() {
		let config = parse("timeout = 30");
		let err = rpc_schema().validate(&config).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(f) if f == "rpc_url"));
	}

	#[test]
	fn test_integer_bounds() {
		let config = parse(
			r#"
			rpc_url = "http://x"
			timeout = 0
			"#,
		);
		let err = rpc_schema().validate(&config).unwrap_err();
		assert!(err.to_string().contains("less than minimum 1"));
	}

	#[test]
	fn test_custom_validator() {
		let config = parse(
			r#"
			rpc_url = "ftp://x"
			timeout = 5
			"#,
		);
		let err = rpc_schema().validate(&config).unwrap_err();
		assert!(
			matches!(err, ValidationError::InvalidValue { field, .. } if field == "rpc_url")
		);
	}

	#[test]
	fn test_nested_errors_carry_path() {
		let config = parse(
			r#"
			rpc_url = "http://x"
			timeout = 5
			tags = ["a", 1]
			"#,
		);
		let err = rpc_schema().validate(&config).unwrap_err();
		assert!(matches!(err, ValidationError::TypeMismatch { field, .. } if field == "tags[1]"));

		let config = parse(
			r#"
			rpc_url = "http://x"
			timeout = 5
			[auth]
			"#,
		);
		let err = rpc_schema().validate(&config).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(f) if f == "auth.user"));
	}

	#[test]
	fn test_root_must_be_table() {
		let err = rpc_schema()
			.validate(&toml::Value::String("x".into()))
			.unwrap_err();
		assert!(matches!(err, ValidationError::TypeMismatch { field, .. } if field == "root"));
	}
}
