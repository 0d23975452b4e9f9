//! Service configuration.

use std::path::Path;

use serde::Deserialize;

/// Origins allowed to call the `/api` routes from a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// Any origin (`CORS_ORIGINS=*`).
    Any,
    /// An explicit list, stored lowercased.
    List(Vec<String>),
}

impl AllowedOrigins {
    /// Parse `*` or a comma-separated origin list.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let origins: Vec<String> = value
            .split(',')
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        if origins.iter().any(|o| o == "*") {
            Self::Any
        } else {
            Self::List(origins)
        }
    }

    /// Whether `origin` may call the API. Comparison ignores case.
    #[must_use]
    pub fn permits(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(origins) => origins.iter().any(|o| o.eq_ignore_ascii_case(origin)),
        }
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to the `RocksDB` data directory. Only read with the
    /// `rocksdb-backend` feature; unset means in-memory storage.
    pub data_dir: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: AllowedOrigins,

    /// Stripe API key. Unset means the in-memory billing provider is used.
    pub stripe_api_key: Option<String>,

    /// Stripe webhook signing secret.
    pub stripe_webhook_secret: Option<String>,

    /// Pinned Stripe API version.
    pub stripe_api_version: Option<String>,

    /// Stripe API root.
    pub stripe_api_base: String,

    /// Shared secret for routerlimits webhook signatures.
    pub routerlimits_webhook_secret: Option<String>,

    /// HS256 secret for tokens accepted by `/api/authenticate`.
    pub jwt_secret: Option<String>,

    /// Base URL of the upstream users API.
    pub upstream_url: Option<String>,

    /// API key sent to the upstream users API.
    pub upstream_api_key: Option<String>,

    /// JSON file of plans seeded into the catalog at startup.
    pub plans_file: Option<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Stripe secrets file structure.
#[derive(Debug, Deserialize)]
struct StripeSecrets {
    api_key: String,
    #[serde(default)]
    webhook_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let (stripe_api_key, stripe_webhook_secret) = load_stripe_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_dir: env_opt("DATA_DIR"),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|v| AllowedOrigins::parse(&v))
                .unwrap_or(defaults.cors_origins),
            stripe_api_key,
            stripe_webhook_secret,
            stripe_api_version: env_opt("STRIPE_API_VERSION"),
            stripe_api_base: std::env::var("STRIPE_API_BASE").unwrap_or(defaults.stripe_api_base),
            routerlimits_webhook_secret: env_opt("ROUTERLIMITS_WEBHOOK_SECRET"),
            jwt_secret: env_opt("JWT_SECRET"),
            upstream_url: env_opt("UPSTREAM_URL"),
            upstream_api_key: env_opt("UPSTREAM_API_KEY"),
            plans_file: env_opt("PLANS_FILE"),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }
}

/// Read an environment variable, treating empty as unset.
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Load Stripe secrets from file or environment.
fn load_stripe_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [".secrets/stripe.json", "../.secrets/stripe.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<StripeSecrets>(path) {
            tracing::info!(path = %path, "Loaded Stripe secrets from file");
            return (Some(secrets.api_key), secrets.webhook_secret);
        }
    }

    tracing::debug!("Stripe secrets file not found, using environment variables");
    (env_opt("STRIPE_API_KEY"), env_opt("STRIPE_WEBHOOK_SECRET"))
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: None,
            cors_origins: AllowedOrigins::Any,
            stripe_api_key: None,
            stripe_webhook_secret: None,
            stripe_api_version: None,
            stripe_api_base: "https://api.stripe.com/v1".into(),
            routerlimits_webhook_secret: None,
            jwt_secret: None,
            upstream_url: None,
            upstream_api_key: None,
            plans_file: None,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_allows_any_origin() {
        let origins = AllowedOrigins::parse("*");
        assert_eq!(origins, AllowedOrigins::Any);
        assert!(origins.permits("https://anything.example"));
    }

    #[test]
    fn list_is_trimmed_and_case_insensitive() {
        let origins = AllowedOrigins::parse(" https://App.Example.com , https://admin.example.com,");
        assert_eq!(
            origins,
            AllowedOrigins::List(vec![
                "https://app.example.com".into(),
                "https://admin.example.com".into()
            ])
        );
        assert!(origins.permits("HTTPS://APP.EXAMPLE.COM"));
        assert!(!origins.permits("https://evil.example.com"));
    }

    #[test]
    fn empty_list_permits_nothing() {
        assert!(!AllowedOrigins::parse("").permits("https://app.example.com"));
    }

    #[test]
    fn defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.max_body_bytes, 1024 * 1024);
        assert_eq!(config.request_timeout_seconds, 30);
        assert!(config.stripe_api_key.is_none());
    }
}
