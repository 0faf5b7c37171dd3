//! HTTP server for the bridge's JSON-RPC endpoint.
//!
//! `POST /rpc` takes single or batched JSON-RPC 2.0 requests. Anything under
//! `/proxy` is forwarded to the configured Ethereum backend.

use crate::apis::{proxy, rpc};
use axum::{
	body::Bytes,
	extract::State,
	http::{HeaderMap, Method, Uri},
	response::{IntoResponse, Json, Response},
	routing::{any, post},
	Router,
};
use bridge_config::ApiConfig;
use bridge_core::BridgeEngine;
use bridge_node::RequestContext;
use bridge_types::{APIError, JsonRpcError, JsonRpcRequest, JsonRpcResponse, INVALID_REQUEST};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<BridgeEngine>,
	pub api: ApiConfig,
	/// HTTP client for the proxy backend.
	pub http_client: reqwest::Client,
}

impl AppState {
	pub fn new(api: ApiConfig, engine: Arc<BridgeEngine>) -> Result<Self, reqwest::Error> {
		// Create a reusable HTTP client with connection pooling
		let http_client = reqwest::Client::builder()
			.pool_idle_timeout(Duration::from_secs(90))
			.pool_max_idle_per_host(10)
			.timeout(Duration::from_secs(api.timeout_seconds))
			.build()?;
		Ok(Self {
			engine,
			api,
			http_client,
		})
	}
}

/// Routes of the API server.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/rpc", post(handle_rpc))
		.route("/proxy", any(handle_proxy))
		.route("/proxy/{*path}", any(handle_proxy))
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(state)
}

/// Starts the HTTP server and serves until the listener fails.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<BridgeEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	match api_config.proxy_url() {
		Some(url) => tracing::info!("Proxy requests will be forwarded to {}", url),
		None => tracing::warn!("No proxy backend configured - /proxy will answer 503"),
	}

	let app = router(AppState::new(api_config, engine)?);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Bridge API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles POST /rpc requests.
async fn handle_rpc(State(state): State<AppState>, body: Bytes) -> Result<Response, APIError> {
	let payload: Value = serde_json::from_slice(&body).map_err(|e| APIError::BadRequest {
		error_type: "PARSE_ERROR".to_string(),
		message: format!("Invalid JSON: {}", e),
		details: None,
	})?;
	let ctx = RequestContext::background().with_timeout(Duration::from_secs(state.api.timeout_seconds));

	match payload {
		Value::Array(items) if items.is_empty() => Ok(Json(JsonRpcResponse::failure(
			Value::Null,
			JsonRpcError::new(INVALID_REQUEST, "Empty batch"),
		))
		.into_response()),
		Value::Array(items) => {
			let responses = join_all(items.into_iter().map(|item| handle_single(&state, &ctx, item))).await;
			Ok(Json(responses).into_response())
		},
		single => Ok(Json(handle_single(&state, &ctx, single).await).into_response()),
	}
}

async fn handle_single(state: &AppState, ctx: &RequestContext, item: Value) -> JsonRpcResponse {
	let id = item.get("id").cloned().unwrap_or(Value::Null);
	match serde_json::from_value::<JsonRpcRequest>(item) {
		Ok(request) => rpc::dispatch(&state.engine, &state.api, ctx, request).await,
		Err(e) => JsonRpcResponse::failure(
			id,
			JsonRpcError::new(INVALID_REQUEST, format!("Invalid request: {}", e)),
		),
	}
}

/// Handles any request under /proxy.
async fn handle_proxy(
	State(state): State<AppState>,
	method: Method,
	uri: Uri,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Response, APIError> {
	let Some(base_url) = state.api.proxy_url() else {
		tracing::warn!("Proxy request received but no backend is configured");
		return Err(APIError::ServiceUnavailable {
			error_type: "PROXY_DISABLED".to_string(),
			message: "No proxy backend configured".to_string(),
			retry_after: None,
		});
	};
	let path = uri.path().strip_prefix("/proxy").unwrap_or_default();
	proxy::forward(
		&state.http_client,
		base_url,
		&method,
		path,
		uri.query(),
		&headers,
		body,
	)
	.await
}
