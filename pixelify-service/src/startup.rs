use crate::config::{CorsConfig, PixelifyConfig, ProviderKind, StoreKind};
use crate::handlers;
use crate::services::providers::mock::{MockDescriptionProvider, MockImageProvider};
use crate::services::providers::openai::{
    OpenAiConfig, OpenAiDescriptionProvider, OpenAiImageProvider,
};
use crate::services::providers::{DescriptionProvider, ImageProvider};
use crate::services::{ConversionStore, Converter, InMemoryStore, MongoDb};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, security_headers_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Base64 inflates uploads by a third; leave room for ~15MB images.
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConversionStore>,
    pub converter: Converter,
}

pub fn build_router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/api", get(handlers::root))
        .route("/api/", get(handlers::root))
        .route("/api/pixelify", post(handlers::pixelify))
        .route("/api/history", get(handlers::history))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(cors))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    if cors.allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin: {}", e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

fn build_converter(config: &PixelifyConfig) -> Result<Converter, AppError> {
    let (description, images): (Arc<dyn DescriptionProvider>, Arc<dyn ImageProvider>) =
        match config.provider {
            ProviderKind::OpenAi => {
                let provider_config = |model: &str| OpenAiConfig {
                    api_key: config.openai.api_key.clone(),
                    base_url: config.openai.base_url.clone(),
                    model: model.to_string(),
                    timeout: Duration::from_secs(config.openai.timeout_secs),
                };

                let description: Arc<dyn DescriptionProvider> = Arc::new(
                    OpenAiDescriptionProvider::new(provider_config(&config.models.chat_model))
                        .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
                );
                let images: Arc<dyn ImageProvider> = Arc::new(
                    OpenAiImageProvider::new(provider_config(&config.models.image_model))
                        .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
                );

                if config.openai.api_key.is_none() {
                    tracing::warn!("EMERGENT_LLM_KEY is not set; conversions will be rejected");
                }

                (description, images)
            }
            ProviderKind::Mock => {
                tracing::warn!("Using mock AI providers");
                let description: Arc<dyn DescriptionProvider> =
                    Arc::new(MockDescriptionProvider::new(true));
                let images: Arc<dyn ImageProvider> = Arc::new(MockImageProvider::new(true));
                (description, images)
            }
        };

    tracing::info!(
        variant = ?config.variant,
        generate_images = config.generate_images,
        chat_model = %config.models.chat_model,
        image_model = %config.models.image_model,
        "Initialized conversion providers"
    );

    Ok(Converter::new(
        config.variant,
        config.generate_images,
        description,
        images,
    ))
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    db: Option<MongoDb>,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: PixelifyConfig) -> Result<Self, AppError> {
        let (store, db): (Arc<dyn ConversionStore>, Option<MongoDb>) = match config.store {
            StoreKind::MongoDb => {
                let db = connect_mongo(&config).await?;
                (Arc::new(db.clone()), Some(db))
            }
            StoreKind::Memory => {
                tracing::warn!("Using in-memory store; history is lost on restart");
                (Arc::new(InMemoryStore::new()), None)
            }
        };

        let state = AppState {
            store,
            converter: build_converter(&config)?,
        };

        let router = build_router(state, &config.cors);

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            "{} listening on port {}",
            config.variant.service_name(),
            port
        );

        Ok(Self {
            port,
            listener,
            router,
            db,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The MongoDB handle, when records are kept in MongoDB.
    pub fn db(&self) -> Option<&MongoDb> {
        self.db.as_ref()
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn connect_mongo(config: &PixelifyConfig) -> Result<MongoDb, AppError> {
    let db = MongoDb::connect(
        &config.mongodb.uri,
        &config.mongodb.database,
        config.variant.collection_name(),
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to connect to MongoDB: {}", e);
        e
    })?;

    db.initialize_indexes().await.map_err(|e| {
        tracing::error!("Failed to initialize database indexes: {}", e);
        e
    })?;

    Ok(db)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
