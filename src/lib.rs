//! Check whether an installed package is out of date against a remote index.
//!
//! ```no_run
//! # async fn run() -> Result<(), outdated::CheckError> {
//! let result = outdated::check_outdated("ask-so", "0.1").await?;
//! if result.is_outdated {
//!     println!("latest is {}", result.latest_version);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Hosts that only want a non-fatal heads-up call [`notify_if_outdated`],
//! which runs the check on a background thread by default and reports
//! through warnings instead of errors.

pub mod config;
pub mod logging;
pub mod notifier;
pub mod version;
pub mod warning;

use std::sync::Arc;

pub use config::Config;
pub use notifier::{Notifier, NotifyOptions};
pub use version::checker::{CheckResult, OutdatedChecker};
pub use version::error::{CacheError, CheckError, FetchError};
pub use warning::{Warning, WarningCategory, WarningSink};

use warning::{Reporter, StderrSink};

/// Check `package` against the default index using the environment configuration
pub async fn check_outdated(package: &str, version: &str) -> Result<CheckResult, CheckError> {
    let config = Config::global();
    let reporter = Reporter::new(
        Arc::new(StderrSink::new(config.ignore_warnings)),
        config.raise_exceptions,
    );

    OutdatedChecker::from_config(config, reporter)
        .check_outdated(package, version)
        .await
}

/// Warn on stderr if `package` is outdated on the default index.
///
/// Never returns an error unless `options.raise_exceptions` is set and the
/// check runs synchronously.
pub fn notify_if_outdated(
    package: &str,
    version: &str,
    options: NotifyOptions,
) -> Result<(), CheckError> {
    Arc::new(Notifier::from_env()).notify_if_outdated(package, version, options)
}
