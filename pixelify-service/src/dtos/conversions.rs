use crate::models::ConversionRecord;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/pixelify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Raw base64 or a `data:<mime>;base64,` URL.
    #[serde(default)]
    pub image_base64: String,
}

/// A conversion is returned exactly as it was stored.
pub type ImageResponse = ConversionRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}
