use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;

use crate::version::comparator::VersionScheme;

// =============================================================================
// Environment overrides
// =============================================================================

/// Set to `1` to propagate every internally caught error instead of warning
pub const RAISE_EXCEPTION_ENV: &str = "OUTDATED_RAISE_EXCEPTION";

/// Set to `1` to hide displayed warnings
pub const IGNORE_ENV: &str = "OUTDATED_IGNORE";

/// Tracing filter directive for the binary
pub const LOG_ENV: &str = "OUTDATED_LOG";

// =============================================================================
// Defaults
// =============================================================================

/// Default repository URL template; `%s` is replaced by the package name
pub const DEFAULT_REPOSITORY_URL: &str = "https://pypi.python.org/pypi/%s/json";

/// JSON pointer to the latest version in the index response
pub const DEFAULT_VERSION_POINTER: &str = "/info/version";

/// Default cache file prefix
pub const DEFAULT_CACHE_PREFIX: &str = "outdated_cache";

/// Cache validity window in seconds (24 hours)
pub const DEFAULT_CACHE_TTL_SECS: i64 = 24 * 60 * 60;

/// Total number of GET attempts before giving up
pub const DEFAULT_FETCH_ATTEMPTS: u32 = 3;

/// Fixed delay between GET attempts in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Runtime configuration, read once and threaded through cache, checker and notifier
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Propagate errors instead of downgrading them to warnings
    pub raise_exceptions: bool,
    /// Suppress displayed warnings
    pub ignore_warnings: bool,
    pub repository_url: String,
    pub version_pointer: String,
    pub version_scheme: VersionScheme,
    /// Directory holding cache files. `None` means the OS temp directory.
    pub cache_dir: Option<PathBuf>,
    pub cache_prefix: String,
    pub cache_ttl_secs: i64,
    pub fetch_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            raise_exceptions: false,
            ignore_warnings: false,
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            version_pointer: DEFAULT_VERSION_POINTER.to_string(),
            version_scheme: VersionScheme::default(),
            cache_dir: None,
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            fetch_attempts: DEFAULT_FETCH_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl Config {
    /// Default configuration with the environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env(
            std::env::var(RAISE_EXCEPTION_ENV).ok(),
            std::env::var(IGNORE_ENV).ok(),
        )
    }

    /// Process-wide configuration, read from the environment on first use
    pub fn global() -> &'static Config {
        static CONFIG: OnceLock<Config> = OnceLock::new();
        CONFIG.get_or_init(Self::from_env)
    }

    fn with_env(mut self, raise_exception: Option<String>, ignore: Option<String>) -> Self {
        self.raise_exceptions |= raise_exception.as_deref() == Some("1");
        self.ignore_warnings |= ignore.as_deref() == Some("1");
        self
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Cache validity window; out-of-range values saturate to `Duration::MAX`
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.cache_ttl_secs).unwrap_or(chrono::Duration::MAX)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Returns the path to the data directory for outdated.
/// Uses $XDG_DATA_HOME/outdated if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/outdated,
/// or ./outdated if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the default path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("outdated.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("outdated")
}
