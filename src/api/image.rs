//! Image Generation API
//!
//! Request and response types for the image generations endpoint.

use serde::{Deserialize, Serialize};

/// Request body for the image generations endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerationRequest {
    /// Model identifier
    pub model: String,

    /// Prompt describing the desired image
    pub prompt: String,

    /// Number of images to generate
    #[serde(rename = "n")]
    pub count: u32,

    /// Image dimensions, e.g. "1024x1024"
    pub size: String,
}

impl ImageGenerationRequest {
    /// Fixed-shape request: one 1024x1024 dall-e-3 image for the prompt.
    pub(crate) fn for_prompt(prompt: &str) -> Self {
        Self {
            model: "dall-e-3".to_string(),
            prompt: prompt.to_string(),
            count: 1,
            size: "1024x1024".to_string(),
        }
    }
}

/// Response from the image generations endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerationResponse {
    /// Creation timestamp
    pub created: u64,

    /// Generated images
    pub data: Vec<GeneratedImage>,
}

/// A single generated image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// The prompt as rewritten by the model
    #[serde(default)]
    pub revised_prompt: String,

    /// Retrieval URL for the image
    pub url: String,
}
