use std::path::PathBuf;
use std::str::FromStr;

use cycle_ai::claude::{self, ClaudeConfig};
use cycle_music::getsongbpm;
use cycle_music::spotify::{self, SpotifyConfig};

use crate::auth::jwt::JwtConfig;

/// Default development environment name.
pub const DEVELOPMENT: &str = "development";

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Deployment environment name (default: `development`).
    pub app_env: String,
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`).
    pub request_timeout_secs: u64,
    /// Directory of built frontend assets served at `/static`.
    pub static_dir: Option<PathBuf>,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    pub claude: ClaudeConfig,
    /// `None` disables every Spotify feature.
    pub spotify: Option<SpotifyConfig>,
    /// `None` disables the fallback tempo lookup.
    pub getsongbpm: Option<GetSongBpmConfig>,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct GetSongBpmConfig {
    pub api_url: String,
    pub api_key: String,
}

/// Plan generations allowed per user per sliding window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_hours: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                                      |
    /// |---------------------------|----------------------------------------------|
    /// | `APP_ENV`                 | `development`                                |
    /// | `HOST`                    | `0.0.0.0`                                    |
    /// | `PORT`                    | `8000`                                       |
    /// | `CORS_ORIGINS`            | `http://localhost:8000`                      |
    /// | `REQUEST_TIMEOUT_SECS`    | `120`                                        |
    /// | `STATIC_DIR`              | unset                                        |
    /// | `ANTHROPIC_API_KEY`       | **required**                                 |
    /// | `ANTHROPIC_MODEL`         | `claude-sonnet-4-20250514`                   |
    /// | `ANTHROPIC_API_URL`       | `https://api.anthropic.com`                  |
    /// | `SPOTIFY_CLIENT_ID`       | unset (Spotify disabled)                     |
    /// | `SPOTIFY_CLIENT_SECRET`   | unset (Spotify disabled)                     |
    /// | `SPOTIFY_REDIRECT_URI`    | `http://localhost:8000/api/spotify/callback` |
    /// | `SPOTIFY_ACCOUNTS_URL`    | `https://accounts.spotify.com`               |
    /// | `SPOTIFY_API_URL`         | `https://api.spotify.com/v1`                 |
    /// | `GETSONGBPM_API_KEY`      | unset (fallback disabled)                    |
    /// | `GETSONGBPM_API_URL`      | `https://api.getsongbpm.com`                 |
    /// | `RATE_LIMIT_REQUESTS`     | `10`                                         |
    /// | `RATE_LIMIT_WINDOW_HOURS` | `24`                                         |
    ///
    /// JWT settings are documented on [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:8000")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let static_dir = optional_env("STATIC_DIR").map(PathBuf::from);

        Self {
            app_env: env_or("APP_ENV", DEVELOPMENT),
            host: env_or("HOST", "0.0.0.0"),
            port: parse_env("PORT", 8000),
            cors_origins,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 120),
            static_dir,
            jwt: JwtConfig::from_env(),
            claude: claude_from_env(),
            spotify: spotify_from_env(),
            getsongbpm: getsongbpm_from_env(),
            rate_limit: RateLimitConfig {
                max_requests: parse_env("RATE_LIMIT_REQUESTS", 10),
                window_hours: parse_env("RATE_LIMIT_WINDOW_HOURS", 24),
            },
        }
    }

    pub fn is_development(&self) -> bool {
        self.app_env == DEVELOPMENT
    }
}

fn claude_from_env() -> ClaudeConfig {
    let api_key =
        std::env::var("ANTHROPIC_API_KEY").expect("ANTHROPIC_API_KEY must be set in the environment");
    assert!(!api_key.is_empty(), "ANTHROPIC_API_KEY must not be empty");

    ClaudeConfig {
        api_key,
        model: env_or("ANTHROPIC_MODEL", claude::DEFAULT_MODEL),
        api_url: env_or("ANTHROPIC_API_URL", claude::DEFAULT_API_URL),
        max_tokens: claude::DEFAULT_MAX_TOKENS,
    }
}

fn spotify_from_env() -> Option<SpotifyConfig> {
    let client_id = optional_env("SPOTIFY_CLIENT_ID")?;
    let client_secret = optional_env("SPOTIFY_CLIENT_SECRET")?;

    Some(SpotifyConfig {
        client_id,
        client_secret,
        redirect_uri: env_or(
            "SPOTIFY_REDIRECT_URI",
            "http://localhost:8000/api/spotify/callback",
        ),
        accounts_url: env_or("SPOTIFY_ACCOUNTS_URL", spotify::DEFAULT_ACCOUNTS_URL),
        api_url: env_or("SPOTIFY_API_URL", spotify::DEFAULT_API_URL),
    })
}

fn getsongbpm_from_env() -> Option<GetSongBpmConfig> {
    Some(GetSongBpmConfig {
        api_key: optional_env("GETSONGBPM_API_KEY")?,
        api_url: env_or("GETSONGBPM_API_URL", getsongbpm::DEFAULT_API_URL),
    })
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Set and non-empty.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// # Panics
///
/// Panics if the variable is set but does not parse as `T`.
fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid {}: {e}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
