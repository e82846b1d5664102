use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Invalid package name for cache file: {0:?}")]
    InvalidPackageName(String),

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed cache content: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed cache timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Invalid response: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Invalid version {version:?}: {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Version {current} is greater than the latest version on the index: {latest}")]
    VersionAhead { current: String, latest: String },

    #[error("Failed to start async runtime: {0}")]
    Runtime(std::io::Error),
}
