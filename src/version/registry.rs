//! Registry trait for fetching the latest published version of a package

#[cfg(test)]
use mockall::automock;

use crate::version::error::FetchError;

/// Trait for fetching the latest version from a remote package index
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches the latest published version of a package
    ///
    /// # Arguments
    /// * `package_name` - The name of the package in the index (e.g., "requests")
    ///
    /// # Returns
    /// * `Ok(String)` - The latest version string as reported by the index
    /// * `Err(FetchError)` - If the index is unreachable after retries or the response is unusable
    async fn fetch_latest_version(&self, package_name: &str) -> Result<String, FetchError>;
}
