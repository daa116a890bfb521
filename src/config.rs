use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,

    // Durable storage
    pub storage_type: String,
    pub data_dir: PathBuf,
    pub seed_dir: Option<PathBuf>,

    // Identity provider
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,

    // Profile store
    pub profile_store: String,
    pub profile_service_url: Option<String>,
    pub profile_service_key: Option<String>,

    // Content settings
    pub max_title_length: usize,
    pub max_post_length: usize,
    pub max_comment_length: usize,
    pub min_nickname_length: usize,

    // CORS configuration
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "squad_hub=debug,tower_http=debug".to_string()),

            storage_type: env::var("STORAGE_TYPE").unwrap_or_else(|_| "file".to_string()),
            data_dir: env::var("DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string())
                .into(),
            seed_dir: env::var("SEED_DIR").ok().map(PathBuf::from),

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            jwt_audience: env::var("JWT_AUDIENCE").ok(),

            profile_store: env::var("PROFILE_STORE").unwrap_or_else(|_| "memory".to_string()),
            profile_service_url: env::var("PROFILE_SERVICE_URL").ok(),
            profile_service_key: env::var("PROFILE_SERVICE_KEY").ok(),

            max_title_length: env::var("MAX_TITLE_LENGTH")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            max_post_length: env::var("MAX_POST_LENGTH")
                .unwrap_or_else(|_| "20000".to_string())
                .parse()?,
            max_comment_length: env::var("MAX_COMMENT_LENGTH")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()?,
            min_nickname_length: env::var("MIN_NICKNAME_LENGTH")
                .unwrap_or_else(|_| "2".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn uses_memory_storage(&self) -> bool {
        self.storage_type == "memory"
    }

    pub fn content_limits(&self) -> ContentLimits {
        ContentLimits {
            max_title_length: self.max_title_length,
            max_post_length: self.max_post_length,
            max_comment_length: self.max_comment_length,
            min_nickname_length: self.min_nickname_length,
        }
    }
}

/// Ephemeral defaults: in-memory storage, in-memory profiles.
impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            environment: "development".to_string(),
            log_level: "squad_hub=debug".to_string(),
            storage_type: "memory".to_string(),
            data_dir: PathBuf::from("./data"),
            seed_dir: None,
            jwt_secret: "development-secret".to_string(),
            jwt_audience: None,
            profile_store: "memory".to_string(),
            profile_service_url: None,
            profile_service_key: None,
            max_title_length: 100,
            max_post_length: 20000,
            max_comment_length: 2000,
            min_nickname_length: 2,
            cors_allowed_origins: "http://localhost:3001".to_string(),
        }
    }
}

/// Length policy applied by the write paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentLimits {
    pub max_title_length: usize,
    pub max_post_length: usize,
    pub max_comment_length: usize,
    pub min_nickname_length: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Config::default().content_limits()
    }
}
