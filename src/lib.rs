//! minoai - Minimal async OpenAI client
//!
//! Chat completions (synchronous and streaming) and image generation over an
//! injectable HTTP transport.
//!
//! ```no_run
//! use minoai::{ChatCompletionRequest, Message, OpenAiClient};
//!
//! # async fn run() -> minoai::Result<()> {
//! let client = OpenAiClient::new("sk-...")?;
//! let request = ChatCompletionRequest::new(minoai::model::GPT_4O, vec![Message::user("hi")]);
//!
//! let mut stream = client.chat_completion_stream(&request).await?;
//! while let Some(chunk) = stream.next().await {
//!     let chunk = chunk?;
//!     if let Some(content) = chunk.choices.first().and_then(|c| c.delta.content.as_deref()) {
//!         print!("{}", content);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod error;

pub use api::completion::{model, ChatCompletion, ChatCompletionRequest, Choice, Message, Usage};
pub use api::image::{GeneratedImage, ImageGenerationResponse};
pub use api::streaming::{ChatCompletionChunk, ChatCompletionStream, ChunkedChoice, Delta};
pub use client::transport::{ByteStream, HttpRequest, HttpResponse, HttpTransport};
pub use error::{MinoaiError, Result};

use api::image::ImageGenerationRequest;
use api::streaming::spawn_decoder;
use client::http::build_json_request;
use std::sync::Arc;
use std::time::Duration;

/// Default API endpoint
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Handle to the OpenAI API.
///
/// Owns the API credential and the transport capability. The handle is
/// immutable after construction and safe to share across concurrent calls.
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl OpenAiClient {
    /// Create a client backed by a stock `reqwest` transport.
    ///
    /// No overall request timeout is set so long-running streams are not cut
    /// off mid-generation.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MinoaiError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self::with_transport(api_key, Arc::new(client)))
    }

    /// Create a client with a custom transport.
    pub fn with_transport(api_key: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            transport,
        }
    }

    /// Override the API base URL (e.g. for a compatible proxy).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Request a complete chat completion.
    ///
    /// The streaming flag is forced off on the wire regardless of how the
    /// request was built.
    pub async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<ChatCompletion> {
        let url = format!("{}/chat/completions", self.base_url);
        let http_request = build_json_request(&url, &self.api_key, &request.wire(false), false)?;

        let response = self.transport.execute(http_request).await?;
        if !response.status.is_success() {
            tracing::warn!(status = %response.status, "chat completion returned non-success status");
        }

        decode_json_body(response).await
    }

    /// Start a streaming chat completion.
    ///
    /// Returns once the response headers arrive; the body is decoded on a
    /// background task and chunks are delivered through the returned stream.
    /// Request construction and connection failures are the `Err` arm here; a
    /// mid-stream failure is delivered once as an `Err` item before the
    /// stream closes.
    pub async fn chat_completion_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionStream> {
        let url = format!("{}/chat/completions", self.base_url);
        let http_request = build_json_request(&url, &self.api_key, &request.wire(true), true)?;

        let response = self.transport.execute(http_request).await?;
        if !response.status.is_success() {
            tracing::warn!(status = %response.status, "streaming chat completion returned non-success status");
        }

        Ok(spawn_decoder(response))
    }

    /// Generate one 1024x1024 image with dall-e-3.
    pub async fn generate_image(&self, prompt: &str) -> Result<ImageGenerationResponse> {
        if prompt.is_empty() {
            return Err(MinoaiError::Validation(
                "prompt must not be empty".to_string(),
            ));
        }

        let url = format!("{}/images/generations", self.base_url);
        let body = ImageGenerationRequest::for_prompt(prompt);
        let http_request = build_json_request(&url, &self.api_key, &body, false)?;

        let response = self.transport.execute(http_request).await?;
        if !response.status.is_success() {
            tracing::warn!(status = %response.status, "image generation returned non-success status");
        }

        decode_json_body(response).await
    }
}

/// Collect a response body and decode it as JSON.
async fn decode_json_body<T: serde::de::DeserializeOwned>(response: HttpResponse) -> Result<T> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| {
        MinoaiError::Decode(format!(
            "failed to parse response: {}. Body: {}",
            e,
            String::from_utf8_lossy(&body[..body.len().min(500)])
        ))
    })
}
