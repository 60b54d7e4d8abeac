//! Conversion record model and its storage representation.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

/// The persisted result of one successful conversion request.
///
/// This is also the response body of `POST /api/pixelify` and the element
/// type of `GET /api/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub id: String,

    /// The image as submitted, data-URL prefix included if it had one.
    pub original_image: String,

    pub result_text: String,

    /// `data:image/png;base64,...`, only for variants that generate images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_image: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl ConversionRecord {
    pub fn new(
        original_image: String,
        result_text: String,
        generated_image: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            original_image,
            result_text,
            generated_image,
            // Storage precision; keeps a stored record equal to the returned one.
            timestamp: Utc::now().trunc_subsecs(6),
        }
    }
}

/// Document shape written to and read from the conversions collection.
///
/// The timestamp is kept as an ISO-8601 string. Fixed microsecond precision
/// keeps lexicographic order equal to chronological order, which the
/// history query relies on when sorting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionDocument {
    pub id: String,
    pub original_image: String,
    pub result_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_image: Option<String>,
    pub timestamp: Bson,
}

impl From<&ConversionRecord> for ConversionDocument {
    fn from(record: &ConversionRecord) -> Self {
        Self {
            id: record.id.clone(),
            original_image: record.original_image.clone(),
            result_text: record.result_text.clone(),
            generated_image: record.generated_image.clone(),
            timestamp: Bson::String(format_timestamp(&record.timestamp)),
        }
    }
}

impl TryFrom<ConversionDocument> for ConversionRecord {
    type Error = TimestampError;

    fn try_from(doc: ConversionDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            timestamp: parse_stored_timestamp(&doc.timestamp)?,
            id: doc.id,
            original_image: doc.original_image,
            result_text: doc.result_text,
            generated_image: doc.generated_image,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimestampError {
    #[error("invalid timestamp string {value:?}: {source}")]
    Invalid {
        value: String,
        source: chrono::ParseError,
    },

    #[error("unsupported timestamp type: {0}")]
    UnsupportedType(String),
}

/// Serialize a timestamp the way it is stored: RFC 3339, microseconds, `Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Turn a stored timestamp back into a structured value.
///
/// Strings are parsed as ISO-8601 with any offset; native BSON datetimes
/// are accepted as-is.
pub fn parse_stored_timestamp(value: &Bson) -> Result<DateTime<Utc>, TimestampError> {
    match value {
        Bson::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|source| TimestampError::Invalid {
                value: s.clone(),
                source,
            }),
        Bson::DateTime(dt) => Ok(dt.to_chrono()),
        other => Err(TimestampError::UnsupportedType(format!(
            "{:?}",
            other.element_type()
        ))),
    }
}
