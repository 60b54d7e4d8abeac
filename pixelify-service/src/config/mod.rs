use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Default timeout applied to outbound provider HTTP clients.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct PixelifyConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub openai: OpenAiSettings,
    pub models: ModelConfig,
    pub variant: Variant,
    /// Whether a second image-generation call follows the description.
    pub generate_images: bool,
    pub provider: ProviderKind,
    pub store: StoreKind,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    /// Absent until a request actually needs it; requests fail with a
    /// configuration error rather than the service refusing to start.
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Multimodal chat model used for the description (e.g., gpt-4o)
    pub chat_model: String,
    /// Image generation model (e.g., gpt-image-1)
    pub image_model: String,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Empty means any origin is allowed.
    pub allowed_origins: Vec<String>,
}

impl PixelifyConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let variant: Variant = get_env("PIXELIFY_VARIANT", Some("santa"), false)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let generate_images = match env::var("PIXELIFY_GENERATE_IMAGES") {
            Ok(raw) => parse_flag(&raw).ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "PIXELIFY_GENERATE_IMAGES must be true or false, got {}",
                    raw
                ))
            })?,
            Err(_) => variant.generates_images(),
        };

        Ok(PixelifyConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("pixelify_db"), is_prod)?,
            },
            openai: OpenAiSettings {
                api_key: env::var("EMERGENT_LLM_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty())
                    .map(Secret::new),
                base_url: get_env("OPENAI_BASE_URL", Some("https://api.openai.com"), false)?,
                timeout_secs: parse_timeout(&get_env(
                    "PIXELIFY_HTTP_TIMEOUT_SECS",
                    Some(&DEFAULT_HTTP_TIMEOUT_SECS.to_string()),
                    false,
                )?)?,
            },
            models: ModelConfig {
                chat_model: get_env("PIXELIFY_CHAT_MODEL", Some("gpt-4o"), false)?,
                image_model: get_env("PIXELIFY_IMAGE_MODEL", Some("gpt-image-1"), false)?,
            },
            variant,
            generate_images,
            provider: get_env("PIXELIFY_PROVIDER", Some("openai"), false)?
                .parse()
                .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            store: get_env("PIXELIFY_STORE", Some("mongodb"), false)?
                .parse()
                .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            cors: CorsConfig {
                allowed_origins: parse_origins(&get_env("CORS_ORIGINS", Some("*"), false)?),
            },
        })
    }
}

/// Deployment mode. Each variant owns its prompts, its collection and
/// whether a second image-generation call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Pokemon,
    Santa,
}

impl Variant {
    pub fn service_name(&self) -> &'static str {
        match self {
            Variant::Pokemon => "Pokemon Pixelizer API",
            Variant::Santa => "Santa Transformer API",
        }
    }

    pub fn collection_name(&self) -> &'static str {
        match self {
            Variant::Pokemon => "pokemon_conversions",
            Variant::Santa => "santa_conversions",
        }
    }

    /// Default for image generation when not configured explicitly.
    pub fn generates_images(&self) -> bool {
        matches!(self, Variant::Santa)
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pokemon" => Ok(Variant::Pokemon),
            "santa" => Ok(Variant::Santa),
            _ => Err(format!("Invalid variant: {}", s)),
        }
    }
}

/// Which provider backend serves the description and image calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Mock,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "mock" => Ok(ProviderKind::Mock),
            _ => Err(format!("Invalid provider: {}", s)),
        }
    }
}

/// Where conversion records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    MongoDb,
    /// Process-local; history is lost on restart.
    Memory,
}

impl std::str::FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreKind::MongoDb),
            "memory" => Ok(StoreKind::Memory),
            _ => Err(format!("Invalid store: {}", s)),
        }
    }
}

/// Split a comma-separated origin list; `*` anywhere means "any origin".
pub fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .map(|o| o.to_string())
        .collect();

    if origins.iter().any(|o| o == "*") {
        Vec::new()
    } else {
        origins
    }
}

fn parse_timeout(raw: &str) -> Result<u64, AppError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(AppError::ConfigError(anyhow::anyhow!(
            "PIXELIFY_HTTP_TIMEOUT_SECS must be a positive number of seconds, got {}",
            raw
        ))),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
