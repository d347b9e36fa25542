use std::path::PathBuf;

use classiklust_core::session::DEFAULT_SESSION_TTL_DAYS;
use classiklust_core::telegram::DEFAULT_AUTH_MAX_AGE_SECS;

/// Deployment environment, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn is_production(self) -> bool {
        self == AppEnv::Production
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except
/// `DATABASE_URL`, which `main` reads separately.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub app_env: AppEnv,
    /// Root of the JSON game-data tree.
    pub game_data_dir: PathBuf,
    /// Where uploaded media files are written; served under `/uploads`.
    pub uploads_dir: PathBuf,
    /// Telegram bot token. Telegram login is unavailable without it.
    pub telegram_bot_token: Option<String>,
    pub telegram_auth_max_age_secs: i64,
    /// Shared secret accepted in the `x-admin-token` header.
    pub admin_token: Option<String>,
    pub session_ttl_days: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `3000`                  |
    /// | `CORS_ORIGINS`               | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `APP_ENV`                    | `development`           |
    /// | `GAME_DATA_DIR`              | `./game-data`           |
    /// | `UPLOADS_DIR`                | `./uploads`             |
    /// | `TELEGRAM_BOT_TOKEN`         | unset                   |
    /// | `TELEGRAM_AUTH_MAX_AGE_SECS` | `86400`                 |
    /// | `ADMIN_TOKEN`                | unset                   |
    /// | `SESSION_TTL_DAYS`           | `30`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let app_env = match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".into())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => AppEnv::Production,
            _ => AppEnv::Development,
        };

        let telegram_auth_max_age_secs: i64 = std::env::var("TELEGRAM_AUTH_MAX_AGE_SECS")
            .unwrap_or_else(|_| DEFAULT_AUTH_MAX_AGE_SECS.to_string())
            .parse()
            .expect("TELEGRAM_AUTH_MAX_AGE_SECS must be a valid i64");

        let session_ttl_days: i64 = std::env::var("SESSION_TTL_DAYS")
            .unwrap_or_else(|_| DEFAULT_SESSION_TTL_DAYS.to_string())
            .parse()
            .expect("SESSION_TTL_DAYS must be a valid i64");

        let admin_token = non_empty_env("ADMIN_TOKEN");
        if admin_token.is_none() {
            tracing::warn!("ADMIN_TOKEN not set, admin access limited to admin player sessions");
        }

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            app_env,
            game_data_dir: std::env::var("GAME_DATA_DIR")
                .unwrap_or_else(|_| "./game-data".into())
                .into(),
            uploads_dir: std::env::var("UPLOADS_DIR")
                .unwrap_or_else(|_| "./uploads".into())
                .into(),
            telegram_bot_token: non_empty_env("TELEGRAM_BOT_TOKEN"),
            telegram_auth_max_age_secs,
            admin_token,
            session_ttl_days,
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
