//! Passthrough to the Ethereum backend behind the bridge.

use axum::{
	body::{Body, Bytes},
	http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method, StatusCode},
	response::Response,
};
use bridge_types::APIError;

/// Forwards one request to `base_url` joined with `path` and returns the
/// backend's status, content type and body unchanged.
pub async fn forward(
	client: &reqwest::Client,
	base_url: &str,
	method: &Method,
	path: &str,
	query: Option<&str>,
	headers: &HeaderMap,
	body: Bytes,
) -> Result<Response, APIError> {
	let mut url = if path.trim_start_matches('/').is_empty() {
		base_url.to_string()
	} else {
		format!(
			"{}/{}",
			base_url.trim_end_matches('/'),
			path.trim_start_matches('/')
		)
	};
	if let Some(query) = query {
		url.push('?');
		url.push_str(query);
	}

	let method = reqwest::Method::from_bytes(method.as_str().as_bytes()).map_err(|e| {
		APIError::BadRequest {
			error_type: "INVALID_METHOD".to_string(),
			message: e.to_string(),
			details: None,
		}
	})?;
	let mut request = client.request(method, &url).body(body);
	if let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
		request = request.header(reqwest::header::CONTENT_TYPE, content_type);
	}

	tracing::debug!(url = %url, "Forwarding request to proxy backend");
	let upstream = request.send().await.map_err(|e| {
		tracing::warn!(url = %url, error = %e, "Proxy backend unreachable");
		APIError::BadGateway {
			error_type: "PROXY_UNREACHABLE".to_string(),
			message: format!("Failed to reach {}: {}", url, e),
		}
	})?;

	let status =
		StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
	let content_type = upstream
		.headers()
		.get(reqwest::header::CONTENT_TYPE)
		.and_then(|v| v.to_str().ok())
		.and_then(|v| HeaderValue::from_str(v).ok());
	let bytes = upstream.bytes().await.map_err(|e| APIError::BadGateway {
		error_type: "PROXY_INVALID_RESPONSE".to_string(),
		message: format!("Failed to read response from {}: {}", url, e),
	})?;

	let mut response = Response::new(Body::from(bytes));
	*response.status_mut() = status;
	if let Some(content_type) = content_type {
		response.headers_mut().insert(CONTENT_TYPE, content_type);
	}
	Ok(response)
}
