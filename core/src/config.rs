//! Client configuration: credential plus base URL composition.

use crate::error::ApiError;

/// Default API endpoint, without scheme or tenant prefix.
pub const DEFAULT_BASE_ENDPOINT: &str = "api.swiftype.com/api/as/v1";

pub const ENV_HOST_IDENTIFIER: &str = "APP_SEARCH_HOST_IDENTIFIER";
pub const ENV_API_KEY: &str = "APP_SEARCH_API_KEY";
pub const ENV_BASE_ENDPOINT: &str = "APP_SEARCH_BASE_ENDPOINT";
pub const ENV_USE_HTTPS: &str = "APP_SEARCH_USE_HTTPS";

/// Settings needed to reach an App Search deployment.
///
/// `base_url()` composes `scheme://[host_identifier.]base_endpoint`.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host_identifier: String,
    pub api_key: String,
    pub base_endpoint: String,
    pub use_https: bool,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host_identifier", &self.host_identifier)
            .field("has_api_key", &!self.api_key.is_empty())
            .field("base_endpoint", &self.base_endpoint)
            .field("use_https", &self.use_https)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host_identifier: String::new(),
            api_key: String::new(),
            base_endpoint: DEFAULT_BASE_ENDPOINT.to_string(),
            use_https: true,
        }
    }
}

impl ClientConfig {
    pub fn new(host_identifier: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host_identifier: host_identifier.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_base_endpoint(mut self, base_endpoint: impl Into<String>) -> Self {
        self.base_endpoint = base_endpoint.into();
        self
    }

    pub fn with_https(mut self, use_https: bool) -> Self {
        self.use_https = use_https;
        self
    }

    /// Legacy name for the host identifier. Ignored when a host identifier
    /// was already given.
    #[deprecated(note = "use `ClientConfig::new` with a host identifier instead")]
    pub fn with_account_host_key(mut self, account_host_key: impl Into<String>) -> Self {
        if self.host_identifier.is_empty() {
            self.host_identifier = account_host_key.into();
        }
        self
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        if self.host_identifier.is_empty() {
            format!("{scheme}://{}", self.base_endpoint)
        } else {
            format!("{scheme}://{}.{}", self.host_identifier, self.base_endpoint)
        }
    }

    /// Read configuration from `APP_SEARCH_*` environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. `APP_SEARCH_API_KEY`
    /// is required; everything else falls back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ApiError::Config(format!("{ENV_API_KEY} is not set")))?;

        let mut config = Self::new(lookup(ENV_HOST_IDENTIFIER).unwrap_or_default(), api_key);
        if let Some(endpoint) = lookup(ENV_BASE_ENDPOINT).filter(|e| !e.is_empty()) {
            config.base_endpoint = endpoint;
        }
        if let Some(raw) = lookup(ENV_USE_HTTPS) {
            config.use_https = parse_bool(&raw).ok_or_else(|| {
                ApiError::Config(format!("{ENV_USE_HTTPS} must be true or false, got {raw:?}"))
            })?;
        }
        Ok(config)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
