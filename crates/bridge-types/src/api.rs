//! API types for the bridge's Ethereum-compatible JSON-RPC endpoint.
//!
//! Requests follow JSON-RPC 2.0. Failures inside a method are reported as a
//! JSON-RPC error object with HTTP 200; transport-level problems (bad JSON,
//! proxy failures) use [`APIError`] and a real HTTP status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Method does not exist.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid method parameters.
pub const INVALID_PARAMS: i64 = -32602;
/// Request body is not a valid JSON-RPC request.
pub const INVALID_REQUEST: i64 = -32600;
/// Bridge-side failure while executing a valid request.
pub const SERVER_ERROR: i64 = -32000;

/// A single JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
	#[serde(default = "default_jsonrpc")]
	pub jsonrpc: String,
	#[serde(default)]
	pub id: serde_json::Value,
	pub method: String,
	#[serde(default)]
	pub params: serde_json::Value,
}

fn default_jsonrpc() -> String {
	"2.0".to_string()
}

impl JsonRpcRequest {
	pub fn new(id: impl Into<serde_json::Value>, method: &str, params: serde_json::Value) -> Self {
		Self {
			jsonrpc: default_jsonrpc(),
			id: id.into(),
			method: method.to_string(),
			params,
		}
	}
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
	pub code: i64,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
	pub fn new(code: i64, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
			data: None,
		}
	}

	pub fn method_not_found(method: &str) -> Self {
		Self::new(METHOD_NOT_FOUND, format!("Method '{}' not found", method))
	}

	pub fn invalid_params(message: impl Into<String>) -> Self {
		Self::new(INVALID_PARAMS, message)
	}

	pub fn server_error(message: impl Into<String>) -> Self {
		Self::new(SERVER_ERROR, message)
	}
}

impl fmt::Display for JsonRpcError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "JSON-RPC error {}: {}", self.code, self.message)
	}
}

impl std::error::Error for JsonRpcError {}

/// A JSON-RPC 2.0 response carrying exactly one of `result` or `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
	pub jsonrpc: String,
	pub id: serde_json::Value,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<serde_json::Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
	pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
		Self {
			jsonrpc: default_jsonrpc(),
			id,
			result: Some(result),
			error: None,
		}
	}

	pub fn failure(id: serde_json::Value, error: JsonRpcError) -> Self {
		Self {
			jsonrpc: default_jsonrpc(),
			id,
			result: None,
			error: Some(error),
		}
	}
}

/// Result of `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRawTransactionResponse {
	/// UTXO-chain transaction id, `0x`-prefixed.
	pub hash: String,
}

/// HTTP error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
	pub details: Option<serde_json::Value>,
	#[serde(rename = "retryAfter")]
	pub retry_after: Option<u64>,
}

/// Structured HTTP-level error with a status mapping.
#[derive(Debug)]
pub enum APIError {
	/// 400
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// 502, the proxied backend could not be reached
	BadGateway { error_type: String, message: String },
	/// 503
	ServiceUnavailable {
		error_type: String,
		message: String,
		retry_after: Option<u64>,
	},
}

impl APIError {
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::BadGateway { .. } => 502,
			APIError::ServiceUnavailable { .. } => 503,
		}
	}

	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			APIError::BadRequest {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
				retry_after: None,
			},
			APIError::ServiceUnavailable {
				error_type,
				message,
				retry_after,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
				retry_after: *retry_after,
			},
			APIError::BadGateway {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
				retry_after: None,
			},
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::BadGateway { message, .. } => write!(f, "Bad Gateway: {}", message),
			APIError::ServiceUnavailable { message, .. } => {
				write!(f, "Service Unavailable: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}
