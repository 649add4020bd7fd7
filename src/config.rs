//! Process configuration.
//!
//! Every externally-supplied setting (secrets, TTLs, store connection,
//! asset-host credentials, listen address) is read here exactly once at
//! startup. The resulting [`AppConfig`] is passed explicitly into the
//! service constructors; nothing else in the crate reads the environment.

use crate::api::auth_service::AuthConfig;
use crate::api::server::ApiServerConfig;
use crate::api::tokens::TokenConfig;
use crate::media::AssetHostConfig;
use crate::{Error, Result};

/// Default access-token lifetime in seconds (15 minutes).
const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 900;

/// Default refresh-token lifetime in seconds (10 days).
const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 864_000;

/// Process-wide immutable configuration, constructed once in `main`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ApiServerConfig,
    pub database_url: String,
    pub tokens: TokenConfig,
    pub auth: AuthConfig,
    pub media: AssetHostConfig,
    /// Directory for rotating log files; console-only logging when unset.
    pub log_dir: Option<String>,
}

impl AppConfig {
    /// Load the configuration from environment variables.
    ///
    /// Required variables:
    /// - `ACCESS_TOKEN_SECRET`, `REFRESH_TOKEN_SECRET`
    /// - `ASSET_HOST_URL`, `ASSET_HOST_KEY`, `ASSET_HOST_SECRET`
    ///
    /// Optional variables (with defaults):
    /// - `ACCESS_TOKEN_TTL_SECS` (900), `REFRESH_TOKEN_TTL_SECS` (864000)
    /// - `MIN_PASSWORD_LENGTH` (8)
    /// - `DATABASE_URL` (`sqlite:vidhive.db?mode=rwc`)
    /// - `API_BIND_ADDRESS` (`0.0.0.0`), `API_PORT` (8000)
    /// - `LOG_DIR` (unset: no file logging)
    pub fn from_env() -> Result<Self> {
        let tokens = TokenConfig {
            access_secret: require("ACCESS_TOKEN_SECRET")?,
            refresh_secret: require("REFRESH_TOKEN_SECRET")?,
            access_ttl_secs: env_parse("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_ttl_secs: env_parse("REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TOKEN_TTL_SECS),
        };

        if tokens.access_secret == tokens.refresh_secret {
            return Err(Error::config(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ",
            ));
        }

        let auth = AuthConfig {
            min_password_length: env_parse("MIN_PASSWORD_LENGTH", 8),
        };

        let media = AssetHostConfig {
            base_url: require("ASSET_HOST_URL")?,
            api_key: require("ASSET_HOST_KEY")?,
            api_secret: require("ASSET_HOST_SECRET")?,
        };

        let mut server = ApiServerConfig::default();
        if let Ok(bind_address) = std::env::var("API_BIND_ADDRESS")
            && !bind_address.trim().is_empty()
        {
            server.bind_address = bind_address;
        }
        server.port = env_parse("API_PORT", server.port);

        Ok(Self {
            server,
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:vidhive.db?mode=rwc".to_string()),
            tokens,
            auth,
            media,
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty()),
        })
    }
}

fn require(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::config(format!("{key} must be set")))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
