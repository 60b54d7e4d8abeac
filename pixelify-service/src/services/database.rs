//! Conversion persistence.
//!
//! Records are append-only: the store can insert and list, nothing else.

use crate::models::{ConversionDocument, ConversionRecord};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

/// Number of records returned by the history endpoint.
pub const HISTORY_LIMIT: i64 = 10;

/// Storage seam for conversion records.
#[async_trait]
pub trait ConversionStore: Send + Sync {
    async fn insert(&self, record: &ConversionRecord) -> Result<(), AppError>;

    /// Up to `limit` records, newest first.
    async fn recent(&self, limit: i64) -> Result<Vec<ConversionRecord>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
    collection_name: String,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, collection = %collection, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self {
            client,
            db,
            collection_name: collection.to_string(),
        })
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn conversions(&self) -> Collection<ConversionDocument> {
        self.db.collection(&self.collection_name)
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!(collection = %self.collection_name, "Creating MongoDB indexes");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .name("id_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.conversions()
            .create_index(id_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create id index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        // History reads sort newest first
        let timestamp_index = IndexModel::builder()
            .keys(doc! { "timestamp": -1 })
            .options(
                IndexOptions::builder()
                    .name("timestamp_idx".to_string())
                    .build(),
            )
            .build();

        self.conversions()
            .create_index(timestamp_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create timestamp index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }
}

#[async_trait]
impl ConversionStore for MongoDb {
    async fn insert(&self, record: &ConversionRecord) -> Result<(), AppError> {
        self.conversions()
            .insert_one(ConversionDocument::from(record), None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert conversion: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<ConversionRecord>, AppError> {
        let options = FindOptions::builder()
            .projection(doc! { "_id": 0 })
            .sort(doc! { "timestamp": -1 })
            .limit(limit)
            .build();

        let cursor = self.conversions().find(doc! {}, options).await.map_err(|e| {
            tracing::error!("Failed to query conversions: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        let documents: Vec<ConversionDocument> = cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect conversions: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        documents
            .into_iter()
            .map(|doc| {
                ConversionRecord::try_from(doc).map_err(|e| {
                    tracing::error!("Stored conversion has a bad timestamp: {}", e);
                    AppError::DatabaseError(anyhow::anyhow!(e))
                })
            })
            .collect()
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }
}
