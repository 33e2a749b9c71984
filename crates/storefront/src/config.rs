//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Identity cookie signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_DATA_DIR` - Directory for the local catalog cache (default: data)
//! - `CATALOG_SYNC_POLICY` - `append-missing` (default) or `last-write-wins`
//! - `CATALOG_WRITE_ATTEMPTS` - Attempts per background catalog write (default: 3)
//! - `CATALOG_WRITE_BACKOFF_MS` - Initial retry backoff in milliseconds (default: 250)
//! - `CHECKOUT_DELAY_MS` - Simulated payment processing delay (default: 2000)
//! - `RESEND_API_KEY` - Resend API key for contact form delivery
//! - `CONTACT_RECIPIENT` - Where contact submissions are sent
//! - `CONTACT_FROM` - Sender shown on contact submissions
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::services::catalog::SyncPolicy;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_CONTACT_RECIPIENT: &str = "dorodango.org@gmail.com";
const DEFAULT_CONTACT_FROM: &str = "Dorodango ReFashion <onboarding@resend.dev>";

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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Identity cookie signing secret
    pub session_secret: SecretString,
    /// Directory holding the local catalog cache
    pub data_dir: PathBuf,
    pub catalog: CatalogConfig,
    /// Simulated payment processing time
    pub checkout_delay: Duration,
    pub mail: MailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

/// Catalog sync and background write tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogConfig {
    pub sync_policy: SyncPolicy,
    pub write_attempts: u32,
    pub write_backoff: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            sync_policy: SyncPolicy::AppendMissing,
            write_attempts: 3,
            write_backoff: Duration::from_millis(250),
        }
    }
}

/// Contact form delivery settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct MailConfig {
    /// Resend API key; contact submissions fail with a configuration error without it
    pub resend_api_key: Option<SecretString>,
    pub recipient: String,
    pub from: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: None,
            recipient: DEFAULT_CONTACT_RECIPIENT.to_owned(),
            from: DEFAULT_CONTACT_FROM.to_owned(),
        }
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field(
                "resend_api_key",
                &self.resend_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("recipient", &self.recipient)
            .field("from", &self.from)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;
        let data_dir = PathBuf::from(get_env_or_default("STOREFRONT_DATA_DIR", "data"));

        let catalog = CatalogConfig::from_env()?;
        let checkout_delay = Duration::from_millis(parse_env("CHECKOUT_DELAY_MS", "2000")?);
        let mail = MailConfig::from_env();

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            data_dir,
            catalog,
            checkout_delay,
            mail,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        Url::parse(&self.base_url).is_ok_and(|url| url.scheme() == "https")
    }
}

/// Settings for offline maintenance jobs.
///
/// Covers the stores only, so jobs run without the HTTP secrets.
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    pub database_url: SecretString,
    pub data_dir: PathBuf,
    pub catalog: CatalogConfig,
}

impl MaintenanceConfig {
    /// Load maintenance settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a catalog
    /// variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: get_database_url("STOREFRONT_DATABASE_URL")?,
            data_dir: PathBuf::from(get_env_or_default("STOREFRONT_DATA_DIR", "data")),
            catalog: CatalogConfig::from_env()?,
        })
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let write_attempts: u32 = parse_env("CATALOG_WRITE_ATTEMPTS", "3")?;
        if write_attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CATALOG_WRITE_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            sync_policy: parse_env("CATALOG_SYNC_POLICY", "append-missing")?,
            write_attempts,
            write_backoff: Duration::from_millis(parse_env("CATALOG_WRITE_BACKOFF_MS", "250")?),
        })
    }
}

impl MailConfig {
    fn from_env() -> Self {
        Self {
            resend_api_key: get_optional_env("RESEND_API_KEY")
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::from),
            recipient: get_env_or_default("CONTACT_RECIPIENT", DEFAULT_CONTACT_RECIPIENT),
            from: get_env_or_default("CONTACT_FROM", DEFAULT_CONTACT_FROM),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
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
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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
    let len = s.len() as f64;
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/dorodango"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: base_url.to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            data_dir: PathBuf::from("data"),
            catalog: CatalogConfig::default(),
            checkout_delay: Duration::ZERO,
            mail: MailConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-session-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let addr = config("http://localhost:3000").socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_secure_cookies_follow_scheme() {
        assert!(!config("http://localhost:3000").secure_cookies());
        assert!(config("https://dorodango.org").secure_cookies());
        assert!(!config("not a url").secure_cookies());
    }

    #[test]
    fn test_mail_config_debug_redacts_key() {
        let mail = MailConfig {
            resend_api_key: Some(SecretString::from("re_live_abcdef")),
            ..MailConfig::default()
        };
        let debug_output = format!("{mail:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("re_live_abcdef"));
        assert!(debug_output.contains(DEFAULT_CONTACT_RECIPIENT));
    }
}
