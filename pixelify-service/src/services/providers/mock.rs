//! Mock provider implementations for testing and offline runs.

use super::{DescriptionProvider, ImageInput, ImageProvider, ProviderError};
use async_trait::async_trait;
use std::io::Cursor;
use std::sync::Mutex;

const MOCK_DESCRIPTION: &str = "The character keeps its round body, bright eyes and \
original colours, now topped with a classic red Santa hat with white fluffy trim and \
a pom-pom, and a full white beard that frames its cheerful face.";

/// Mock description provider for testing.
pub struct MockDescriptionProvider {
    configured: bool,
    response: Result<String, String>,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl MockDescriptionProvider {
    pub fn new(configured: bool) -> Self {
        Self {
            configured,
            response: Ok(MOCK_DESCRIPTION.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, text: impl Into<String>) -> Self {
        self.response = Ok(text.into());
        self
    }

    /// Make every call fail with an API error carrying `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.response = Err(message.into());
        self
    }

    /// `(persona, instruction, mime_type)` of every call so far.
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl DescriptionProvider for MockDescriptionProvider {
    async fn describe(
        &self,
        persona: &str,
        instruction: &str,
        image: &ImageInput,
    ) -> Result<String, ProviderError> {
        if !self.configured {
            return Err(ProviderError::NotConfigured(
                "Mock description provider not configured".to_string(),
            ));
        }

        if let Ok(mut calls) = self.calls.lock() {
            calls.push((
                persona.to_string(),
                instruction.to_string(),
                image.mime_type.clone(),
            ));
        }

        self.response.clone().map_err(ProviderError::ApiError)
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

/// Mock image provider for testing.
pub struct MockImageProvider {
    configured: bool,
    images: Result<Vec<Vec<u8>>, String>,
    prompts: Mutex<Vec<String>>,
}

impl MockImageProvider {
    /// Returns one small PNG per call.
    pub fn new(configured: bool) -> Self {
        Self {
            configured,
            images: Ok(vec![placeholder_png()]),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_images(mut self, images: Vec<Vec<u8>>) -> Self {
        self.images = Ok(images);
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.images = Err(message.into());
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn generate(&self, prompt: &str, count: u32) -> Result<Vec<Vec<u8>>, ProviderError> {
        if !self.configured {
            return Err(ProviderError::NotConfigured(
                "Mock image provider not configured".to_string(),
            ));
        }

        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        self.images
            .clone()
            .map(|images| images.into_iter().take(count as usize).collect())
            .map_err(ProviderError::ApiError)
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

/// A 4x4 solid red PNG.
fn placeholder_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 30, 30]));
    let mut buf = Cursor::new(Vec::new());
    match img.write_to(&mut buf, image::ImageFormat::Png) {
        Ok(()) => buf.into_inner(),
        Err(e) => {
            tracing::warn!("Failed to encode placeholder PNG: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_a_png() {
        let bytes = placeholder_png();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);
    }

    #[tokio::test]
    async fn image_mock_honours_count() {
        let provider = MockImageProvider::new(true).with_images(vec![vec![1], vec![2]]);
        let images = provider.generate("prompt", 1).await.unwrap();
        assert_eq!(images, vec![vec![1]]);
        assert_eq!(provider.prompts(), vec!["prompt".to_string()]);
    }

    #[tokio::test]
    async fn unconfigured_mock_refuses() {
        let provider = MockDescriptionProvider::new(false);
        let image = ImageInput {
            mime_type: "image/png".into(),
            data: String::new(),
        };
        assert!(provider.describe("p", "i", &image).await.is_err());
        assert!(provider.calls().is_empty());
    }
}
