//! HTTP Transport
//!
//! The client sends every request through the [`HttpTransport`] capability so
//! embedders and tests can substitute their own transport. A stock
//! implementation for [`reqwest::Client`] is provided.

use crate::error::{MinoaiError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use std::pin::Pin;

/// An incrementally readable response body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// An outbound HTTP request
#[derive(Debug)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,

    /// Absolute request URL
    pub url: String,

    /// Request headers
    pub headers: HeaderMap,

    /// Serialized request body
    pub body: Bytes,
}

/// A response with its status and an incrementally readable body
pub struct HttpResponse {
    /// HTTP status code
    pub status: StatusCode,

    /// Response body stream
    pub body: ByteStream,
}

impl HttpResponse {
    /// Read the entire body into memory, consuming the response.
    pub async fn bytes(self) -> Result<Bytes> {
        use futures::StreamExt;

        let mut body = self.body;
        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(Bytes::from(buf))
    }
}

/// Capability for issuing HTTP requests.
///
/// Implementations must tolerate concurrent invocation from multiple client
/// calls.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send the request and return the response headers plus an open body.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[async_trait]
impl HttpTransport for reqwest::Client {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        use async_stream::stream;
        use futures::StreamExt;

        let response = self
            .request(request.method, request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();

        // Convert to our stream type
        let mut byte_stream = response.bytes_stream();
        let body = stream! {
            while let Some(chunk) = byte_stream.next().await {
                yield chunk.map_err(MinoaiError::from);
            }
        };

        Ok(HttpResponse {
            status,
            body: Box::pin(body),
        })
    }
}
