//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `WHOLESALE_API_URL` - Base URL of the storefront API (e.g., `https://api.example.com/api`)
//!
//! ## Optional
//! - `WHOLESALE_LOGIN_PATH` - Where an expired session is sent (default: `/login`)
//! - `WHOLESALE_SEARCH_DEBOUNCE_MS` - Admin search debounce (default: 400)
//! - `WHOLESALE_PREFETCH_DELAY_MS` - Admin next-page prefetch delay (default: 600)
//! - `WHOLESALE_EMAIL` - Account email used by the CLI to sign in
//! - `WHOLESALE_PASSWORD` - Account password used by the CLI to sign in
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 400;
const DEFAULT_PREFETCH_DELAY_MS: u64 = 600;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API settings
    pub api: ApiConfig,
    /// Admin listing timings
    pub listing: ListingTiming,
    /// Credentials for non-interactive sign-in
    pub credentials: Option<SignInConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Backend API settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every request path is appended to
    pub base_url: Url,
    /// Client-side path a 401 redirects to
    pub login_path: String,
}

impl ApiConfig {
    /// Create API settings with the default login path.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }
}

/// Timing controls for the admin product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingTiming {
    /// Delay before fetching while a search term is present
    pub search_debounce: Duration,
    /// Delay before warming the next page
    pub prefetch_delay: Duration,
}

impl Default for ListingTiming {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            prefetch_delay: Duration::from_millis(DEFAULT_PREFETCH_DELAY_MS),
        }
    }
}

/// Account credentials for non-interactive sign-in.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct SignInConfig {
    pub email: String,
    pub password: SecretString,
}

impl std::fmt::Debug for SignInConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInConfig")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let raw_url = get_required_env("WHOLESALE_API_URL")?;
        let base_url = parse_base_url("WHOLESALE_API_URL", &raw_url)?;
        let login_path = get_env_or_default("WHOLESALE_LOGIN_PATH", DEFAULT_LOGIN_PATH);

        let listing = ListingTiming {
            search_debounce: get_millis(
                "WHOLESALE_SEARCH_DEBOUNCE_MS",
                DEFAULT_SEARCH_DEBOUNCE_MS,
            )?,
            prefetch_delay: get_millis(
                "WHOLESALE_PREFETCH_DELAY_MS",
                DEFAULT_PREFETCH_DELAY_MS,
            )?,
        };

        let credentials = match (
            get_optional_env("WHOLESALE_EMAIL"),
            get_optional_env("WHOLESALE_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(SignInConfig {
                email,
                password: SecretString::from(password),
            }),
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar(
                    "WHOLESALE_PASSWORD".to_string(),
                ));
            }
            _ => None,
        };

        Ok(Self {
            api: ApiConfig {
                base_url,
                login_path,
            },
            listing,
            credentials,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at `base_url` with every optional setting defaulted.
    #[must_use]
    pub fn for_base_url(base_url: Url) -> Self {
        Self {
            api: ApiConfig::new(base_url),
            listing: ListingTiming::default(),
            credentials: None,
            sentry_dsn: None,
            sentry_environment: None,
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

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a millisecond duration with a default value.
fn get_millis(key: &str, default: u64) -> Result<Duration, ConfigError> {
    get_optional_env(key).map_or(Ok(Duration::from_millis(default)), |raw| {
        raw.trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse and check the API base URL.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_accepts_http() {
        let url = parse_base_url("TEST_VAR", "http://127.0.0.1:8080/api").unwrap();
        assert_eq!(url.path(), "/api");
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        let err = parse_base_url("TEST_VAR", "ftp://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_parse_base_url_rejects_relative() {
        assert!(parse_base_url("TEST_VAR", "/api").is_err());
    }

    #[test]
    fn test_default_timings() {
        let timing = ListingTiming::default();
        assert_eq!(timing.search_debounce, Duration::from_millis(400));
        assert_eq!(timing.prefetch_delay, Duration::from_millis(600));
    }

    #[test]
    fn test_for_base_url_defaults_login_path() {
        let config = ClientConfig::for_base_url(Url::parse("https://api.example.com").unwrap());
        assert_eq!(config.api.login_path, "/login");
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_sign_in_debug_redacts_password() {
        let sign_in = SignInConfig {
            email: "buyer@shop.test".to_string(),
            password: SecretString::from("super_secret_password"),
        };

        let debug_output = format!("{sign_in:?}");

        assert!(debug_output.contains("buyer@shop.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_password"));
    }
}
