//! Domain models for the pixelify service.

pub mod conversion;

pub use conversion::{ConversionDocument, ConversionRecord, TimestampError};
