use crate::config::ClientConfig;
use crate::error::ApiError;
use arc_swap::ArcSwapOption;
use keyring::Entry;
use reqwest::Method;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

const KEYRING_SERVICE: &str = "testflowx";
const KEYRING_USER: &str = "api-token";

/// Thin wrapper around one `reqwest::Client`.
///
/// Performs exactly one HTTP call per invocation and normalizes every
/// failure into a classified [`ApiError`]. De-duplication and caching live
/// above this layer; the transport knows nothing about them.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: Arc<ArcSwapOption<String>>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = config.resolved_base_url()?;

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_max_idle_per_host(
                env::var("TESTFLOWX_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(16),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| ApiError::unknown(format!("failed to build HTTP client: {e}")))?;

        let token = Self::discover_token();
        Ok(Self {
            client,
            base_url,
            token: Arc::new(ArcSwapOption::from(token.map(Arc::new))),
        })
    }

    /// Token lookup order: OS keyring, then `TESTFLOWX_API_TOKEN`.
    fn discover_token() -> Option<String> {
        if let Ok(entry) = Entry::new(KEYRING_SERVICE, KEYRING_USER) {
            if let Ok(token) = entry.get_password() {
                return Some(token);
            }
        }
        env::var("TESTFLOWX_API_TOKEN").ok().filter(|t| !t.is_empty())
    }

    /// Shared handle to the bearer token; the session swaps it on
    /// login/logout without rebuilding the transport.
    pub fn token_handle(&self) -> Arc<ArcSwapOption<String>> {
        Arc::clone(&self.token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a GET and parse the body as JSON.
    pub async fn get_json(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<serde_json::Value, ApiError> {
        self.execute(Method::GET, path, params, None).await
    }

    /// Issue a mutating request with an optional JSON body.
    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError> {
        self.execute(method, path, &[], body).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let request_id = Uuid::new_v4().to_string();

        let mut req = self
            .client
            .request(method.clone(), &url)
            .header("x-request-id", &request_id);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(token) = self.token.load_full() {
            req = req.bearer_auth(token.as_str());
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        debug!(%method, path, request_id = %request_id, "issuing request");
        let response = req.send().await.map_err(ApiError::from)?;
        let status = response.status().as_u16();

        if !response.status().is_success() {
            let excerpt = Self::error_excerpt(response).await;
            let err = ApiError::from_response(status, excerpt);
            warn!(%method, path, status, kind = err.kind.as_str(), "request failed");
            return Err(err);
        }

        let raw = response.bytes().await.map_err(ApiError::from)?;
        let value: serde_json::Value = serde_json::from_slice(&raw)?;
        // A 2xx body can still report failure through the envelope flag;
        // classify it here so it never reaches the cache as a value.
        if value.get("success").and_then(|v| v.as_bool()) == Some(false) {
            let message = value
                .get("error")
                .or_else(|| value.get("message"))
                .and_then(|v| v.as_str())
                .unwrap_or("backend reported failure")
                .to_string();
            warn!(%method, path, status, "envelope reported failure");
            return Err(ApiError::new(crate::error::ErrorKind::Server, message).with_status(status));
        }
        debug!(%method, path, status, "request succeeded");
        Ok(value)
    }

    /// Pull a human-readable message out of an error body. Backends answer
    /// `{ success: false, error: "..." }`; fall back to truncated raw text.
    async fn error_excerpt(response: reqwest::Response) -> String {
        let text = response.text().await.unwrap_or_default();
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
            for field in ["error", "message"] {
                if let Some(msg) = value.get(field).and_then(|v| v.as_str()) {
                    return msg.to_string();
                }
            }
        }
        let mut excerpt = text;
        excerpt.truncate(200);
        excerpt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_failure_maps_to_network() {
        // Nothing listens on this port.
        let config = ClientConfig::new()
            .with_base_url("http://127.0.0.1:59999")
            .with_http_timeout(Duration::from_secs(2));
        let transport = HttpTransport::new(&config).unwrap();
        let err = transport.get_json("/health", &[]).await.unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Network);
    }

    #[test]
    fn token_handle_is_shared() {
        let config = ClientConfig::new().with_base_url("http://127.0.0.1:1");
        let transport = HttpTransport::new(&config).unwrap();
        let handle = transport.token_handle();
        handle.store(Some(Arc::new("tfx_secret".to_string())));
        assert_eq!(
            transport.token.load_full().as_deref().map(String::as_str),
            Some("tfx_secret")
        );
    }
}
