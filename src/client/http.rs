//! Request Construction
//!
//! Builds the outbound POST requests for the API endpoints: JSON body, bearer
//! authorization and, on the streaming path, SSE headers.

use crate::client::transport::HttpRequest;
use crate::error::{MinoaiError, Result};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;

/// Build a POST request carrying a JSON payload.
///
/// An empty API key is not rejected here; the server turns it away with an
/// authentication error.
pub(crate) fn build_json_request<T: Serialize>(
    url: &str,
    api_key: &str,
    payload: &T,
    streaming: bool,
) -> Result<HttpRequest> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| MinoaiError::RequestBuild(format!("invalid API key format: {}", e)))?,
    );

    if streaming {
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    }

    let body = serde_json::to_vec(payload)
        .map_err(|e| MinoaiError::RequestBuild(format!("failed to serialize payload: {}", e)))?;

    Ok(HttpRequest {
        method: Method::POST,
        url: url.to_string(),
        headers,
        body: Bytes::from(body),
    })
}
