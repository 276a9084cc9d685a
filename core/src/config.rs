//! Client configuration.
//!
//! Requests go to `https://{subdomain}.{domain}{path}` unless a base URL
//! override is set, in which case the subdomain is ignored and every path is
//! appended to the override (used to point the client at a local mock).

use crate::error::ConfigError;

pub const DEFAULT_DOMAIN: &str = "route4me.com";
pub const DEFAULT_USER_AGENT: &str = "route4me-rust/0.1";
pub const API_KEY_ENV: &str = "ROUTE4ME_API_KEY";
pub const BASE_URL_ENV: &str = "ROUTE4ME_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub domain: String,
    pub base_url: Option<String>,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            domain: DEFAULT_DOMAIN.to_string(),
            base_url: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Read `ROUTE4ME_API_KEY` and the optional `ROUTE4ME_BASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| ConfigError::MissingApiKey(API_KEY_ENV))?;
        if api_key.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        let config = Self::new(api_key);
        Ok(match std::env::var(BASE_URL_ENV) {
            Ok(base_url) if !base_url.trim().is_empty() => config.with_base_url(base_url),
            _ => config,
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Absolute URL of `path` on `subdomain`, without a query string.
    pub fn endpoint(&self, subdomain: &str, path: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{base}{path}"),
            None => format!("https://{subdomain}.{}{path}", self.domain),
        }
    }
}
