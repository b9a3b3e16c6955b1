//! Dashboard configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SLAASH_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SLAASH_BASE_URL` - Public URL of the dashboard, used for the OAuth redirect
//! - `SHOPIFY_CLIENT_ID` - Shopify app client ID
//! - `SHOPIFY_CLIENT_SECRET` - Shopify app client secret (signs OAuth callbacks)
//!
//! ## Optional
//! - `SLAASH_HOST` - Bind address (default: 127.0.0.1)
//! - `SLAASH_PORT` - Listen port (default: 8080)
//! - `SLAASH_STATIC_DIR` - Prebuilt frontend directory (default: crates/dashboard/static)
//! - `SHOPIFY_API_VERSION` - REST Admin API version (default: 2024-10)
//! - `SHOPIFY_SCOPES` - Comma separated OAuth scopes
//! - `CLICKHOUSE_URL` - Clickstream store URL (default: <http://localhost:8123>)
//! - `CLICKHOUSE_DATABASE` - Clickstream database (default: default)
//! - `CLICKHOUSE_USER` / `CLICKHOUSE_PASSWORD` - Clickstream credentials
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_API_VERSION: &str = "2024-10";
const DEFAULT_SCOPES: &str = "read_products,read_orders,read_customers,write_price_rules,read_price_rules,write_discounts,read_discounts,read_themes,write_themes,read_checkouts";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Dashboard application configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the dashboard
    pub base_url: String,
    /// Directory holding the prebuilt frontend
    pub static_dir: PathBuf,
    /// Shopify app credentials
    pub shopify: ShopifyConfig,
    /// Clickstream store connection
    pub clickhouse: ClickhouseConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shopify app configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// REST Admin API version (e.g., 2024-10)
    pub api_version: String,
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret, also the HMAC key for callbacks
    pub client_secret: SecretString,
    /// Scopes requested during install
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("api_version", &self.api_version)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// `ClickHouse` connection settings for the clickstream store.
#[derive(Clone)]
pub struct ClickhouseConfig {
    pub url: String,
    pub database: String,
    pub user: Option<String>,
    pub password: Option<SecretString>,
}

impl std::fmt::Debug for ClickhouseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickhouseConfig")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the Shopify client secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("SLAASH_DATABASE_URL")?;
        let host = get_env_or_default("SLAASH_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SLAASH_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SLAASH_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SLAASH_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("SLAASH_BASE_URL")?;
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SLAASH_BASE_URL".to_string(), e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let static_dir =
            PathBuf::from(get_env_or_default("SLAASH_STATIC_DIR", "crates/dashboard/static"));

        let shopify = ShopifyConfig::from_env()?;
        let clickhouse = ClickhouseConfig::from_env();
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            static_dir,
            shopify,
            clickhouse,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Redirect URI registered with Shopify for the OAuth callback.
    #[must_use]
    pub fn oauth_redirect_uri(&self) -> String {
        format!("{}/callback", self.base_url)
    }
}

/// Database URL alone, for tools that only touch `PostgreSQL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither `SLAASH_DATABASE_URL` nor
/// `DATABASE_URL` is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    get_database_url("SLAASH_DATABASE_URL")
}

impl ShopifyConfig {
    /// Load the Shopify app credentials on their own.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the client id or secret is missing or the
    /// secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            client_id: get_required_env("SHOPIFY_CLIENT_ID")?,
            client_secret: get_validated_secret("SHOPIFY_CLIENT_SECRET")?,
            scopes: parse_scopes(&get_env_or_default("SHOPIFY_SCOPES", DEFAULT_SCOPES)),
        })
    }
}

impl ClickhouseConfig {
    fn from_env() -> Self {
        Self {
            url: get_env_or_default("CLICKHOUSE_URL", "http://localhost:8123"),
            database: get_env_or_default("CLICKHOUSE_DATABASE", "default"),
            user: get_optional_env("CLICKHOUSE_USER"),
            password: get_optional_env("CLICKHOUSE_PASSWORD").map(SecretString::from),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Split a comma separated scope list, dropping empty entries.
fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the value from the Shopify partner dashboard."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
