//! The conversion pipeline: validate, describe, optionally render.

use crate::config::Variant;
use crate::models::ConversionRecord;
use crate::services::image_input::{decode_image, ImageInputError};
use crate::services::prompts::{excerpt, VariantPrompts};
use crate::services::providers::{DescriptionProvider, ImageProvider, ProviderError};
use base64::Engine as _;
use service_core::error::AppError;
use std::sync::Arc;

const GENERATED_IMAGE_PREFIX: &str = "data:image/png;base64,";

#[derive(Clone)]
pub struct Converter {
    variant: Variant,
    generate_images: bool,
    description: Arc<dyn DescriptionProvider>,
    images: Arc<dyn ImageProvider>,
}

impl Converter {
    pub fn new(
        variant: Variant,
        generate_images: bool,
        description: Arc<dyn DescriptionProvider>,
        images: Arc<dyn ImageProvider>,
    ) -> Self {
        Self {
            variant,
            generate_images,
            description,
            images,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Run one conversion and build the record to store. Nothing is
    /// persisted here; a failure at any step leaves no trace.
    pub async fn convert(&self, image_base64: &str) -> Result<ConversionRecord, AppError> {
        let decoded = decode_image(image_base64).map_err(|e| match e {
            ImageInputError::Empty => AppError::bad_request("No image provided"),
            other => {
                tracing::error!("Invalid image format: {}", other);
                AppError::bad_request("Invalid image format")
            }
        })?;

        tracing::debug!(
            format = ?decoded.format,
            width = decoded.width,
            height = decoded.height,
            "Decoded submitted image"
        );

        if !self.description.is_configured()
            || (self.generate_images && !self.images.is_configured())
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "API key not configured"
            )));
        }

        let prompts = VariantPrompts::for_variant(self.variant);

        tracing::info!(variant = ?self.variant, "Sending image for analysis");
        let description = self
            .description
            .describe(prompts.persona, prompts.instruction, &decoded.as_input())
            .await
            .map_err(processing_error)?;
        tracing::info!("Received analysis: {}...", excerpt(&description, 100));

        let generated_image = if self.generate_images {
            Some(self.render(&prompts, &description).await?)
        } else {
            None
        };

        Ok(ConversionRecord::new(
            image_base64.to_string(),
            description,
            generated_image,
        ))
    }

    async fn render(
        &self,
        prompts: &VariantPrompts,
        description: &str,
    ) -> Result<String, AppError> {
        let prompt = prompts.generation_prompt(description);

        tracing::info!("Generating image from analysis");
        let images = self
            .images
            .generate(&prompt, 1)
            .await
            .map_err(processing_error)?;

        let first = images
            .into_iter()
            .next()
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| {
                tracing::error!("Image generation returned no images");
                AppError::upstream("Failed to generate image")
            })?;

        tracing::info!(bytes = first.len(), "Image generated successfully");
        Ok(format!(
            "{}{}",
            GENERATED_IMAGE_PREFIX,
            base64::engine::general_purpose::STANDARD.encode(first)
        ))
    }
}

fn processing_error(err: ProviderError) -> AppError {
    tracing::error!("Error processing image: {}", err);
    AppError::upstream(format!("Failed to process image: {}", err))
}
