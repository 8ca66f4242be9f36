//! Client configuration: deployment environment, base URL, timeouts, TTL.

use crate::error::ApiError;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Deployment environment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Default API base URL for the environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Development => "http://localhost:5000/api",
            Environment::Staging => "https://staging-api.testflowx.io/api",
            Environment::Production => "https://api.testflowx.io/api",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ApiError::validation(format!(
                "unknown environment: {other}"
            ))),
        }
    }
}

/// Configuration for [`TestFlowClient`](crate::TestFlowClient).
///
/// Keep this surface small and predictable; every knob has an env override
/// so deployments can tune without code changes.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub environment: Environment,
    /// Overrides the environment's base URL (primarily for mock servers).
    pub base_url_override: Option<String>,
    /// Per-request deadline enforced by the transport.
    pub http_timeout: Duration,
    /// Default entry lifetime. `None` means entries live until explicitly
    /// invalidated; project and api-key data changes only via user action,
    /// so invalidation is the primary freshness mechanism.
    pub default_ttl: Option<Duration>,
    /// Upper bound on cached entries before least-recently-accessed eviction.
    pub max_cache_entries: usize,
    /// Disable the response cache entirely (every read hits the network,
    /// still de-duplicated while in flight).
    pub cache_enabled: bool,
    /// Interval for the session liveness ping; `None` disables the task.
    pub liveness_interval: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            base_url_override: None,
            http_timeout: Duration::from_secs(30),
            default_ttl: None,
            max_cache_entries: 1000,
            cache_enabled: true,
            liveness_interval: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from the environment, falling back to defaults.
    ///
    /// Recognized variables: `TESTFLOWX_ENV`, `TESTFLOWX_BASE_URL`,
    /// `TESTFLOWX_HTTP_TIMEOUT_SECS`, `TESTFLOWX_CACHE_TTL_SECS`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(raw) = env::var("TESTFLOWX_ENV") {
            if let Ok(environment) = raw.parse() {
                cfg.environment = environment;
            }
        }
        if let Ok(url) = env::var("TESTFLOWX_BASE_URL") {
            if !url.trim().is_empty() {
                cfg.base_url_override = Some(url);
            }
        }
        if let Some(secs) = env::var("TESTFLOWX_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            cfg.http_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = env::var("TESTFLOWX_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            cfg.default_ttl = Some(Duration::from_secs(secs));
        }
        cfg
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_liveness_interval(mut self, interval: Duration) -> Self {
        self.liveness_interval = Some(interval);
        self
    }

    /// Effective base URL after overrides, validated and with any trailing
    /// slash removed so endpoint paths can be joined verbatim.
    pub fn resolved_base_url(&self) -> Result<String, ApiError> {
        let raw = self
            .base_url_override
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url());
        let parsed = Url::parse(raw)
            .map_err(|e| ApiError::validation(format!("invalid base URL {raw:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::validation(format!(
                "unsupported base URL scheme: {}",
                parsed.scheme()
            )));
        }
        Ok(raw.trim_end_matches('/').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing() {
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!("Dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("stage".parse::<Environment>().unwrap(), Environment::Staging);
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn defaults_are_invalidation_driven() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
        assert!(cfg.default_ttl.is_none());
        assert!(cfg.cache_enabled);
    }

    #[test]
    fn override_beats_environment() {
        let cfg = ClientConfig::new()
            .with_environment(Environment::Production)
            .with_base_url("http://127.0.0.1:9999/api/");
        assert_eq!(cfg.resolved_base_url().unwrap(), "http://127.0.0.1:9999/api");
    }

    #[test]
    fn rejects_non_http_base_url() {
        let cfg = ClientConfig::new().with_base_url("ftp://example.com");
        assert!(cfg.resolved_base_url().is_err());
    }
}
