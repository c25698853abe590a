/// Configuration management for Blog Service
///
/// Everything is read from environment variables (a `.env` file is loaded
/// first by the binary).
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Which content store backs the service
    pub store: StoreConfig,
    /// Identity token settings
    pub auth: AuthConfig,
    /// Feed settings
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Apply embedded migrations at startup (postgres only)
    pub run_migrations: bool,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the identity service
    pub jwt_secret: String,
    /// Where anonymous users are sent for protected actions
    pub login_url: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("login_url", &self.login_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// How long a global feed page is served from cache
    pub global_cache_ttl_secs: u64,
    /// Upper bound on cached global feed pages
    pub global_cache_max_pages: u64,
}

impl FeedConfig {
    pub fn global_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.global_cache_ttl_secs)
    }
}

const DEV_JWT_SECRET: &str = "dev-only-insecure-secret";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let backend = match std::env::var("STORE_BACKEND") {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "postgres" => StoreBackend::Postgres,
                "memory" if production => {
                    return Err("STORE_BACKEND=memory is not allowed in production".to_string())
                }
                "memory" => StoreBackend::Memory,
                other => return Err(format!("Unknown STORE_BACKEND '{}'", other)),
            },
            Err(_) => StoreBackend::Postgres,
        };

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(value) if !value.trim().is_empty() => value,
            _ if production => return Err("JWT_SECRET must be set in production".to_string()),
            _ => DEV_JWT_SECRET.to_string(),
        };

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("BLOG_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("BLOG_SERVICE_PORT", 8000)?,
            },
            store: StoreConfig {
                backend,
                run_migrations: parse_env_or_default("RUN_MIGRATIONS", true)?,
            },
            auth: AuthConfig {
                jwt_secret,
                login_url: std::env::var("LOGIN_URL")
                    .unwrap_or_else(|_| "/auth/login/".to_string()),
            },
            feed: FeedConfig {
                global_cache_ttl_secs: parse_env_or_default("FEED_CACHE_TTL_SECS", 20)?,
                global_cache_max_pages: parse_env_or_default("FEED_CACHE_MAX_PAGES", 1_000)?,
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig {
                env: "development".to_string(),
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                run_migrations: false,
            },
            auth: AuthConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                login_url: "/auth/login/".to_string(),
            },
            feed: FeedConfig {
                global_cache_ttl_secs: 20,
                global_cache_max_pages: 1_000,
            },
        }
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
