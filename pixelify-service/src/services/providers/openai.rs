//! OpenAI provider implementation.
//!
//! Descriptions go through the chat completions API with an inline image;
//! generated images come from the images API (`b64_json` or URL payloads).

use super::{DescriptionProvider, ImageInput, ImageProvider, ProviderError};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::observability::inject_trace_context;
use std::time::Duration;

/// OpenAI provider configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// Shared HTTP plumbing for both OpenAI providers.
struct OpenAiHttp {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiHttp {
    fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response, ProviderError> {
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            ProviderError::NotConfigured("OpenAI API key not configured".to_string())
        })?;

        let mut headers = reqwest::header::HeaderMap::new();
        inject_trace_context(&mut headers);

        let response = self
            .client
            .post(self.url(path))
            .headers(headers)
            .bearer_auth(api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "OpenAI API error {}: {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

/// OpenAI multimodal description provider.
pub struct OpenAiDescriptionProvider {
    http: OpenAiHttp,
}

impl OpenAiDescriptionProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            http: OpenAiHttp::new(config)?,
        })
    }
}

#[async_trait]
impl DescriptionProvider for OpenAiDescriptionProvider {
    async fn describe(
        &self,
        persona: &str,
        instruction: &str,
        image: &ImageInput,
    ) -> Result<String, ProviderError> {
        let request = ChatCompletionRequest {
            model: self.http.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: MessageContent::Text(persona.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: instruction.to_string(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: image.data_url(),
                            },
                        },
                    ]),
                },
            ],
        };

        tracing::debug!(
            model = %self.http.config.model,
            mime_type = %image.mime_type,
            image_b64_len = image.data.len(),
            "Sending request to OpenAI chat completions"
        );

        let api_response: ChatCompletionResponse = self
            .http
            .post("/v1/chat/completions", &request)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError("No choices in OpenAI response".to_string()))?;

        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(ProviderError::ContentFiltered);
        }

        match choice.message.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ProviderError::ApiError(
                "Empty description in OpenAI response".to_string(),
            )),
        }
    }

    fn is_configured(&self) -> bool {
        self.http.is_configured()
    }
}

/// OpenAI image generation provider.
pub struct OpenAiImageProvider {
    http: OpenAiHttp,
}

impl OpenAiImageProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            http: OpenAiHttp::new(config)?,
        })
    }

    async fn image_bytes(&self, data: ImageData) -> Result<Vec<u8>, ProviderError> {
        if let Some(b64_json) = data.b64_json {
            return base64::engine::general_purpose::STANDARD
                .decode(b64_json)
                .map_err(|e| ProviderError::ApiError(format!("Failed to decode base64 image: {}", e)));
        }

        let url = data.url.ok_or_else(|| {
            ProviderError::ApiError("No image data (neither base64 nor URL) in response".to_string())
        })?;

        let response = self
            .http
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "Failed to download generated image: {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageProvider {
    async fn generate(&self, prompt: &str, count: u32) -> Result<Vec<Vec<u8>>, ProviderError> {
        let request = ImageGenerationRequest {
            model: self.http.config.model.clone(),
            prompt: prompt.to_string(),
            n: count,
            size: "1024x1024".to_string(),
        };

        tracing::debug!(
            model = %self.http.config.model,
            prompt_len = prompt.len(),
            count,
            "Sending request to OpenAI image generation"
        );

        let api_response: ImageGenerationResponse = self
            .http
            .post("/v1/images/generations", &request)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        let mut images = Vec::with_capacity(api_response.data.len());
        for data in api_response.data {
            images.push(self.image_bytes(data).await?);
        }

        Ok(images)
    }

    fn is_configured(&self) -> bool {
        self.http.is_configured()
    }
}

// ============================================================================
// OpenAI API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest {
    model: String,
    prompt: String,
    n: u32,
    size: String,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}
