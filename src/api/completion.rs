//! Chat Completion API
//!
//! Request and response types for the chat completions endpoint.

use serde::{Deserialize, Serialize};

/// Well-known chat model identifiers
pub mod model {
    pub const GPT_4O: &str = "gpt-4o";
    pub const GPT_4O_MINI: &str = "gpt-4o-mini";
    pub const GPT_4_TURBO: &str = "gpt-4-turbo";
    /// Continuous model upgrades; points to other models
    pub const GPT_4: &str = "gpt-4";
    pub const GPT_4_32K: &str = "gpt-4-32k";
    pub const GPT_3_5_TURBO: &str = "gpt-3.5-turbo";
}

/// A message in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role: "system", "user" or "assistant"
    pub role: String,

    /// Message content
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request payload.
///
/// The payload carries no streaming flag: the client sets it on the wire
/// according to the operation used to send the request, so the protocol mode
/// always matches the call path.
#[derive(Debug, Clone)]
pub struct ChatCompletionRequest {
    /// Model identifier
    pub model: String,

    /// Messages in the conversation
    pub messages: Vec<Message>,
}

impl ChatCompletionRequest {
    /// Create a new completion request
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
        }
    }

    /// Wire form of the request with the protocol mode applied
    pub(crate) fn wire(&self, stream: bool) -> WireChatCompletionRequest<'_> {
        WireChatCompletionRequest {
            messages: &self.messages,
            model: &self.model,
            stream,
        }
    }
}

/// Serialized request body as sent to the API
#[derive(Debug, Serialize)]
pub(crate) struct WireChatCompletionRequest<'a> {
    messages: &'a [Message],
    model: &'a str,
    stream: bool,
}

/// Chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    /// Response ID
    pub id: String,

    /// Object type
    #[serde(default)]
    pub object: String,

    /// Creation timestamp
    pub created: u64,

    /// Model used
    pub model: String,

    /// Backend configuration fingerprint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,

    /// Response choices
    pub choices: Vec<Choice>,

    /// Token usage
    #[serde(default)]
    pub usage: Usage,
}

/// A choice in the completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Choice index
    pub index: u32,

    /// The message
    pub message: Message,

    /// Finish reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens
    pub prompt_tokens: u32,

    /// Completion tokens
    pub completion_tokens: u32,

    /// Total tokens
    pub total_tokens: u32,
}

impl ChatCompletion {
    /// Get the first choice's message content
    pub fn content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}
