//! AI provider abstractions and implementations.
//!
//! The conversion pipeline talks to two collaborators: a multimodal model
//! that describes an image, and an image model that renders a prompt. Both
//! sit behind traits so the OpenAI backend can be swapped for mocks.

pub mod mock;
pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// An image attached to a description request.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// MIME type detected from the decoded bytes (e.g., image/png).
    pub mime_type: String,

    /// Base64 payload without any data-URL prefix.
    pub data: String,
}

impl ImageInput {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Trait for multimodal description providers (e.g., OpenAI chat with vision).
#[async_trait]
pub trait DescriptionProvider: Send + Sync {
    /// Describe `image` following the `persona` system prompt and `instruction`.
    async fn describe(
        &self,
        persona: &str,
        instruction: &str,
        image: &ImageInput,
    ) -> Result<String, ProviderError>;

    /// Whether a credential is available to make calls at all.
    fn is_configured(&self) -> bool;
}

/// Trait for image generation providers (e.g., OpenAI images).
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate up to `count` images; returns raw encoded image bytes.
    async fn generate(&self, prompt: &str, count: u32) -> Result<Vec<Vec<u8>>, ProviderError>;

    fn is_configured(&self) -> bool;
}
