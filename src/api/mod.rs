//! API Module
//!
//! Chat completion, streaming and image generation types.

pub mod completion;
pub mod image;
pub mod streaming;

pub use completion::{model, ChatCompletion, ChatCompletionRequest, Choice, Message, Usage};
pub use image::{GeneratedImage, ImageGenerationRequest, ImageGenerationResponse};
pub use streaming::{
    parse_sse_line, ChatCompletionChunk, ChatCompletionStream, ChunkedChoice, Delta, SseLine,
};
