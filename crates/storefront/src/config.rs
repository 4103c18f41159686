//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `UPI_VPA` - UPI virtual payment address shown on the payment page
//! - `UPI_PAYEE_NAME` - Payee name embedded in the UPI deep link
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `FREE_SHIPPING_THRESHOLD` - Subtotal at which shipping is free (default: 1000)
//! - `SHIPPING_FLAT_FEE` - Flat shipping fee below the threshold (default: 120)
//! - `ORDER_ID_PREFIX` - Prefix for generated order ids (default: TRB)
//! - `WHATSAPP_NUMBER` - Number for the WhatsApp order-confirmation deep link
//! - `EMAILJS_SERVICE_ID` / `EMAILJS_TEMPLATE_ID` / `EMAILJS_PUBLIC_KEY` /
//!   `ORDER_INBOX_EMAIL` - Notification dispatch; all four or none
//! - `CATALOG_DIR` - Catalog JSON directory (default: crates/storefront/catalog)
//! - `CONTENT_DIR` - Markdown content directory (default: crates/storefront/content)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use tabletop_reboxing_core::{ShippingPolicy, types::Rupees};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Free-shipping threshold and flat fee
    pub shipping: ShippingPolicy,
    /// Prefix for generated order ids (e.g. `TRB`)
    pub order_prefix: String,
    /// Manual UPI payment configuration
    pub payment: PaymentConfig,
    /// EmailJS notification dispatch; `None` disables dispatch
    pub emailjs: Option<EmailJsConfig>,
    /// Directory holding `products.json` and `categories.json`
    pub catalog_dir: PathBuf,
    /// Directory holding markdown content pages
    pub content_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Manual UPI payment details shown on the payment page.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// UPI virtual payment address (e.g. `tabletopreboxing@upi`)
    pub upi_vpa: String,
    /// Payee name embedded in the UPI deep link
    pub upi_payee: String,
    /// WhatsApp number (digits with country code) for order confirmations
    pub whatsapp_number: Option<String>,
}

/// EmailJS REST API credentials for order notifications.
///
/// The public key is a browser-safe identifier, not a secret.
#[derive(Debug, Clone)]
pub struct EmailJsConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    /// Address the business receives order notifications at
    pub inbox_email: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the session secret fails validation (placeholder detection,
    /// entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_owned(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_owned(), e.to_string())
            })?;

        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_owned(), e.to_string())
        })?;

        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;

        let shipping = ShippingPolicy {
            free_shipping_threshold: get_rupees_or_default("FREE_SHIPPING_THRESHOLD", 1_000)?,
            flat_fee: get_rupees_or_default("SHIPPING_FLAT_FEE", 120)?,
        };

        Ok(Self {
            host,
            port,
            base_url,
            session_secret,
            shipping,
            order_prefix: get_env_or_default("ORDER_ID_PREFIX", "TRB"),
            payment: PaymentConfig::from_env()?,
            emailjs: EmailJsConfig::from_env()?,
            catalog_dir: PathBuf::from(get_env_or_default(
                "CATALOG_DIR",
                "crates/storefront/catalog",
            )),
            content_dir: PathBuf::from(get_env_or_default(
                "CONTENT_DIR",
                "crates/storefront/content",
            )),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            upi_vpa: get_required_env("UPI_VPA")?,
            upi_payee: get_required_env("UPI_PAYEE_NAME")?,
            whatsapp_number: get_optional_env("WHATSAPP_NUMBER"),
        })
    }
}

impl EmailJsConfig {
    /// Load the EmailJS group: `None` when no variable of the group is set,
    /// an error when only some are.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        const VARS: [&str; 4] = [
            "EMAILJS_SERVICE_ID",
            "EMAILJS_TEMPLATE_ID",
            "EMAILJS_PUBLIC_KEY",
            "ORDER_INBOX_EMAIL",
        ];

        if VARS.iter().all(|var| get_optional_env(var).is_none()) {
            return Ok(None);
        }

        Ok(Some(Self {
            service_id: get_required_env("EMAILJS_SERVICE_ID")?,
            template_id: get_required_env("EMAILJS_TEMPLATE_ID")?,
            public_key: get_required_env("EMAILJS_PUBLIC_KEY")?,
            inbox_email: get_required_env("ORDER_INBOX_EMAIL")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse a whole-rupee amount from the environment, with a default.
fn get_rupees_or_default(key: &str, default: i64) -> Result<Rupees, ConfigError> {
    match std::env::var(key) {
        Err(_) => Ok(Rupees::new(default)),
        Ok(raw) => raw
            .parse::<i64>()
            .map(Rupees::new)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
    }
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
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
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_owned(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
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

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_high() {
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-session-key-here", "TEST_VAR");
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InsecureSecret(_, _)
        ));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InsecureSecret(_, _)
        ));
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
    fn test_validate_session_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_owned(),
            session_secret: SecretString::from("x".repeat(64)),
            shipping: ShippingPolicy::default(),
            order_prefix: "TRB".to_owned(),
            payment: PaymentConfig {
                upi_vpa: "tabletopreboxing@upi".to_owned(),
                upi_payee: "Tabletop Re-Boxing".to_owned(),
                whatsapp_number: None,
            },
            emailjs: None,
            catalog_dir: PathBuf::from("catalog"),
            content_dir: PathBuf::from("content"),
            sentry_dsn: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }
}
