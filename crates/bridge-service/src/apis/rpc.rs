//! Ethereum-compatible JSON-RPC methods.
//!
//! Each request is dispatched by method name. Bridge failures become
//! JSON-RPC error objects; the HTTP status stays 200.

use bridge_config::ApiConfig;
use bridge_core::BridgeEngine;
use bridge_node::RequestContext;
use bridge_types::{
	with_0x_prefix, JsonRpcError, JsonRpcRequest, JsonRpcResponse, SecretString,
	SendRawTransactionResponse,
};
use serde_json::{json, Value};

/// Runs one request against the engine.
pub async fn dispatch(
	engine: &BridgeEngine,
	api: &ApiConfig,
	ctx: &RequestContext,
	request: JsonRpcRequest,
) -> JsonRpcResponse {
	let result = match request.method.as_str() {
		"eth_sendRawTransaction" => send_raw_transaction(engine, ctx, &request.params).await,
		"personal_importRawKey" => import_raw_key(engine, &request.params).await,
		"eth_getBalance" => get_balance(engine, ctx, &request.params).await,
		"eth_gasPrice" => Ok(json!(api.gas_price)),
		"net_version" => Ok(json!(api.chain_id.to_string())),
		"eth_getTransactionCount" => string_param(&request.params, 0, "address").map(|_| json!("0x0")),
		other => Err(JsonRpcError::method_not_found(other)),
	};

	match result {
		Ok(value) => JsonRpcResponse::success(request.id, value),
		Err(error) => {
			tracing::debug!(method = %request.method, code = error.code, error = %error.message, "JSON-RPC request failed");
			JsonRpcResponse::failure(request.id, error)
		},
	}
}

async fn send_raw_transaction(
	engine: &BridgeEngine,
	ctx: &RequestContext,
	params: &Value,
) -> Result<Value, JsonRpcError> {
	let raw_tx = string_param(params, 0, "raw transaction")?;
	let txid = engine
		.send_raw_transaction(ctx, raw_tx)
		.await
		.map_err(|e| JsonRpcError::server_error(e.to_string()))?;
	let response = SendRawTransactionResponse {
		hash: with_0x_prefix(&txid),
	};
	serde_json::to_value(response).map_err(|e| JsonRpcError::server_error(e.to_string()))
}

/// `[privateKey, passphrase]`. The passphrase is accepted and ignored.
async fn import_raw_key(engine: &BridgeEngine, params: &Value) -> Result<Value, JsonRpcError> {
	let key = SecretString::from(string_param(params, 0, "private key")?);
	let identity = engine
		.import_key(&key)
		.await
		.map_err(|e| JsonRpcError::server_error(e.to_string()))?;
	Ok(json!(with_0x_prefix(&hex::encode(identity))))
}

async fn get_balance(
	engine: &BridgeEngine,
	ctx: &RequestContext,
	params: &Value,
) -> Result<Value, JsonRpcError> {
	let address = string_param(params, 0, "address")?;
	let balance = engine
		.get_balance(ctx, address)
		.await
		.map_err(|e| JsonRpcError::server_error(e.to_string()))?;
	Ok(json!(format!("0x{:x}", balance)))
}

/// The string at `index` of a positional params array.
fn string_param<'a>(params: &'a Value, index: usize, name: &str) -> Result<&'a str, JsonRpcError> {
	params
		.as_array()
		.and_then(|values| values.get(index))
		.and_then(Value::as_str)
		.ok_or_else(|| {
			JsonRpcError::invalid_params(format!(
				"expected {} as string parameter {}",
				name, index
			))
		})
}
