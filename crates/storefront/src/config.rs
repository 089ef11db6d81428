//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `POCKETSHOP_API_URL` - Base URL of the Remote Store (http or https)
//!
//! ## Optional
//! - `POCKETSHOP_API_TOKEN` - Bearer token sent with every request (high entropy)
//! - `POCKETSHOP_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 15)
//! - `POCKETSHOP_CATALOG_TTL_SECS` - Product cache lifetime (default: 300)
//! - `POCKETSHOP_SESSION_FILE` - Session file path (default: .pocketshop/session.json)
//! - `POCKETSHOP_CURRENCY` - Display currency (default: USD)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use pocketshop_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_CATALOG_TTL_SECS: u64 = 300;
const DEFAULT_SESSION_FILE: &str = ".pocketshop/session.json";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
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

/// PocketShop client configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct ClientConfig {
    /// Remote Store base URL
    pub api_url: Url,
    /// Optional bearer token
    pub api_token: Option<SecretString>,
    /// Upper bound for every Remote Store call
    pub request_timeout: Duration,
    /// Time-to-live for cached catalog entries
    pub catalog_ttl: Duration,
    /// Where the file-backed session store keeps its state
    pub session_file: PathBuf,
    /// Currency used when rendering prices
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout", &self.request_timeout)
            .field("catalog_ttl", &self.catalog_ttl)
            .field("session_file", &self.session_file)
            .field("currency", &self.currency)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl ClientConfig {
    /// Configuration pointing at `api_url` with every optional setting at
    /// its default.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            api_token: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            catalog_ttl: Duration::from_secs(DEFAULT_CATALOG_TTL_SECS),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            currency: CurrencyCode::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        let api_url = parse_api_url(&env.required("POCKETSHOP_API_URL")?)?;
        let api_token = env
            .optional("POCKETSHOP_API_TOKEN")
            .map(|token| validated_secret(token, "POCKETSHOP_API_TOKEN"))
            .transpose()?;

        let request_timeout = Duration::from_secs(env.parse_or(
            "POCKETSHOP_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);
        if request_timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "POCKETSHOP_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let catalog_ttl = Duration::from_secs(
            env.parse_or("POCKETSHOP_CATALOG_TTL_SECS", DEFAULT_CATALOG_TTL_SECS)?,
        );
        let session_file = PathBuf::from(
            env.optional("POCKETSHOP_SESSION_FILE")
                .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_string()),
        );
        let currency = env.parse_or("POCKETSHOP_CURRENCY", CurrencyCode::default())?;

        Ok(Self {
            api_url,
            api_token,
            request_timeout,
            catalog_ttl,
            session_file,
            currency,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

/// Parse the base URL, requiring http(s) and normalising to a trailing slash
/// so relative endpoint paths join below it.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("POCKETSHOP_API_URL".to_string(), msg);
    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("cannot be used as a base URL".to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

fn validated_secret(value: String, key: &str) -> Result<SecretString, ConfigError> {
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("POCKETSHOP_API_URL", "https://api.pocketshop.test/v1")]).unwrap();
        assert_eq!(config.api_url.as_str(), "https://api.pocketshop.test/v1/");
        assert!(config.api_token.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.catalog_ttl, Duration::from_secs(300));
        assert_eq!(config.session_file, PathBuf::from(".pocketshop/session.json"));
        assert_eq!(config.currency, CurrencyCode::USD);
    }

    #[test]
    fn test_missing_api_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "POCKETSHOP_API_URL"));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = load(&[("POCKETSHOP_API_URL", "ftp://files.pocketshop.test")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = load(&[
            ("POCKETSHOP_API_URL", "http://localhost:3000"),
            ("POCKETSHOP_REQUEST_TIMEOUT_SECS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "POCKETSHOP_REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("POCKETSHOP_API_URL", "http://localhost:3000/"),
            ("POCKETSHOP_REQUEST_TIMEOUT_SECS", "3"),
            ("POCKETSHOP_CATALOG_TTL_SECS", "0"),
            ("POCKETSHOP_CURRENCY", "mad"),
            ("POCKETSHOP_SESSION_FILE", "/tmp/ps.json"),
            ("SENTRY_ENVIRONMENT", "staging"),
        ])
        .unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert!(config.catalog_ttl.is_zero());
        assert_eq!(config.currency, CurrencyCode::MAD);
        assert_eq!(config.session_file, PathBuf::from("/tmp/ps.json"));
        assert_eq!(config.sentry_environment.as_deref(), Some("staging"));
    }

    #[test]
    fn test_invalid_currency() {
        let err = load(&[
            ("POCKETSHOP_API_URL", "http://localhost:3000"),
            ("POCKETSHOP_CURRENCY", "DOGE"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_placeholder_token_rejected() {
        let err = load(&[
            ("POCKETSHOP_API_URL", "http://localhost:3000"),
            ("POCKETSHOP_API_TOKEN", "your-api-token-here"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_low_entropy_token_rejected() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = load(&[
            ("POCKETSHOP_API_URL", "http://localhost:3000"),
            ("POCKETSHOP_API_TOKEN", "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6"),
        ])
        .unwrap();
        assert_eq!(
            config.api_token.as_ref().map(|t| t.expose_secret().len()),
            Some(31)
        );
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("aB3$xY9"));
        assert!(debug_output.contains("localhost:3000"));
    }
}
