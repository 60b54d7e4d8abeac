pub mod conversions;

pub use conversions::{ImageRequest, ImageResponse, RootResponse};
