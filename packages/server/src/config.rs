use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    /// Mark the session cookie `Secure` (only sent over HTTPS).
    pub secure_cookie: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    pub root: PathBuf,
    /// Upper bound on a multipart upload body, in bytes.
    pub max_upload_size: usize,
    pub page_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://photoboard.db?mode=rwc")?
            .set_default("auth.token_ttl_hours", 24 * 14)?
            .set_default("auth.secure_cookie", false)?
            .set_default("media.root", "./media")?
            .set_default("media.max_upload_size", 20 * 1024 * 1024)?
            .set_default("media.page_size", 15)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., PHOTOBOARD__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("PHOTOBOARD").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
