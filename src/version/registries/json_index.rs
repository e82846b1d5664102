//! JSON package index client (PyPI by default)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::{
    Config, DEFAULT_FETCH_ATTEMPTS, DEFAULT_REPOSITORY_URL, DEFAULT_RETRY_DELAY_MS,
    DEFAULT_VERSION_POINTER,
};
use crate::version::error::FetchError;
use crate::version::registry::Registry;
use crate::version::retry::retry;

const USER_AGENT: &str = concat!("outdated-check/", env!("CARGO_PKG_VERSION"));

/// Registry client for indexes that publish per-package JSON metadata
pub struct JsonIndexRegistry {
    client: Client,
    url_template: String,
    version_pointer: String,
    attempts: u32,
    retry_delay: Duration,
}

impl Default for JsonIndexRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REPOSITORY_URL)
    }
}

impl JsonIndexRegistry {
    /// Creates a client for a URL template; `%s` is replaced by the package name
    pub fn new(url_template: &str) -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to create HTTP client"),
            url_template: url_template.to_string(),
            version_pointer: DEFAULT_VERSION_POINTER.to_string(),
            attempts: DEFAULT_FETCH_ATTEMPTS,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.repository_url)
            .with_version_pointer(&config.version_pointer)
            .with_retry(config.fetch_attempts, config.retry_delay())
    }

    /// JSON pointer (RFC 6901) to the latest version string, e.g. `/info/version`
    pub fn with_version_pointer(mut self, pointer: &str) -> Self {
        self.version_pointer = pointer.to_string();
        self
    }

    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.attempts = attempts;
        self.retry_delay = delay;
        self
    }

    pub fn url_for(&self, package_name: &str) -> String {
        self.url_template.replace("%s", package_name)
    }

    async fn get(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(response.text().await?)
    }

    fn extract_version(&self, url: &str, body: &str) -> Result<String, FetchError> {
        let json: Value = serde_json::from_str(body)
            .map_err(|e| FetchError::Parse(format!("{url} did not return JSON: {e}")))?;

        json.pointer(&self.version_pointer)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                FetchError::Parse(format!(
                    "{url} has no string field at {}",
                    self.version_pointer
                ))
            })
    }
}

#[async_trait]
impl Registry for JsonIndexRegistry {
    async fn fetch_latest_version(&self, package_name: &str) -> Result<String, FetchError> {
        let url = self.url_for(package_name);

        let body = retry(self.attempts, self.retry_delay, || self.get(&url)).await?;
        let version = self.extract_version(&url, &body)?;

        debug!("Latest version of {} is {}", package_name, version);
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn registry_for(server: &Server) -> JsonIndexRegistry {
        JsonIndexRegistry::new(&format!("{}/pypi/%s/json", server.url()))
            .with_retry(3, Duration::ZERO)
    }

    #[test]
    fn url_for_substitutes_package_name() {
        let registry = JsonIndexRegistry::default();

        assert_eq!(
            registry.url_for("ask-so"),
            "https://pypi.python.org/pypi/ask-so/json"
        );
    }

    #[tokio::test]
    async fn fetch_latest_version_returns_info_version() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pypi/requests/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "info": {"version": "2.32.5"},
                    "releases": {
                        "2.31.0": [],
                        "2.32.5": []
                    }
                }"#,
            )
            .create_async()
            .await;

        let registry = registry_for(&server);
        let result = registry.fetch_latest_version("requests").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, "2.32.5");
    }

    #[tokio::test]
    async fn fetch_latest_version_follows_custom_pointer() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/crates/serde")
            .with_status(200)
            .with_body(r#"{"crate": {"max_version": "1.0.228"}}"#)
            .create_async()
            .await;

        let registry = JsonIndexRegistry::new(&format!("{}/api/v1/crates/%s", server.url()))
            .with_version_pointer("/crate/max_version");
        let result = registry.fetch_latest_version("serde").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, "1.0.228");
    }

    #[tokio::test]
    async fn fetch_latest_version_retries_failed_status_three_times() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pypi/flaky/json")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let registry = registry_for(&server);
        let result = registry.fetch_latest_version("flaky").await;

        mock.assert_async().await;
        assert!(matches!(
            result,
            Err(FetchError::Status { status, .. }) if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn fetch_latest_version_does_not_retry_parse_errors() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pypi/broken/json")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .expect(1)
            .create_async()
            .await;

        let registry = registry_for(&server);
        let result = registry.fetch_latest_version("broken").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn fetch_latest_version_rejects_missing_field() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/pypi/odd/json")
            .with_status(200)
            .with_body(r#"{"info": {"name": "odd"}}"#)
            .create_async()
            .await;

        let registry = registry_for(&server);
        let result = registry.fetch_latest_version("odd").await;

        assert!(matches!(result, Err(FetchError::Parse(msg)) if msg.contains("/info/version")));
    }

    #[tokio::test]
    async fn fetch_latest_version_handles_network_error() {
        // Use an invalid URL to trigger a network error
        let registry = JsonIndexRegistry::new("http://invalid.localhost.test:99999/%s")
            .with_retry(2, Duration::ZERO);
        let result = registry.fetch_latest_version("requests").await;

        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
