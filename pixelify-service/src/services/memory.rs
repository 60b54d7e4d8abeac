//! In-process conversion store for tests and local runs without MongoDB.

use super::database::ConversionStore;
use crate::models::ConversionRecord;
use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::{Arc, RwLock};

#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<Vec<ConversionRecord>>>,
    fail_writes: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose inserts always fail, for exercising the error path.
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ConversionStore for InMemoryStore {
    async fn insert(&self, record: &ConversionRecord) -> Result<(), AppError> {
        if self.fail_writes {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "in-memory store rejects writes"
            )));
        }

        let mut records = self
            .records
            .write()
            .map_err(|_| AppError::DatabaseError(anyhow::anyhow!("store lock poisoned")))?;
        records.push(record.clone());
        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<ConversionRecord>, AppError> {
        let records = self
            .records
            .read()
            .map_err(|_| AppError::DatabaseError(anyhow::anyhow!("store lock poisoned")))?;

        let mut sorted = records.clone();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sorted.truncate(limit.max(0) as usize);
        Ok(sorted)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
