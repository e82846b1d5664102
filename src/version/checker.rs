//! Outdated check: cache lookup, remote fetch and version comparison

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::version::cache::{Cache, CacheRecord, now};
use crate::version::comparator::VersionComparator;
use crate::version::error::CheckError;
use crate::version::registries::JsonIndexRegistry;
use crate::version::registry::Registry;
use crate::version::semver::CompareResult;
use crate::warning::Reporter;

/// Result of an outdated check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// The installed version is strictly older than `latest_version`
    pub is_outdated: bool,
    /// Latest version confirmed by the index (directly or through the cache)
    pub latest_version: String,
}

/// Groups the registry, comparator and cache used to check one index
pub struct OutdatedChecker {
    registry: Arc<dyn Registry>,
    comparator: Arc<dyn VersionComparator>,
    cache: Cache,
}

impl OutdatedChecker {
    pub fn new(
        registry: Arc<dyn Registry>,
        comparator: Arc<dyn VersionComparator>,
        cache: Cache,
    ) -> Self {
        Self {
            registry,
            comparator,
            cache,
        }
    }

    pub fn from_config(config: &Config, reporter: Reporter) -> Self {
        Self::new(
            Arc::new(JsonIndexRegistry::from_config(config)),
            config.version_scheme.comparator(),
            Cache::from_config(config, reporter),
        )
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Check whether `current_version` of `package` is out of date.
    ///
    /// A valid cache record stands in for the remote fetch. If the installed
    /// version looks newer than the candidate, the index is asked once more
    /// before failing with [`CheckError::VersionAhead`]. Every successful
    /// check rewrites the cache record with the current time, cache hits
    /// included.
    pub async fn check_outdated(
        &self,
        package: &str,
        current_version: &str,
    ) -> Result<CheckResult, CheckError> {
        self.comparator.validate(current_version)?;

        let cached = self
            .cache
            .read_valid(package, now(), false)?
            .map(|record| record.latest_version);

        let mut latest = match cached {
            Some(version) => {
                debug!("Cache hit for {}: {}", package, version);
                version
            }
            None => self.registry.fetch_latest_version(package).await?,
        };

        let mut status = self.comparator.compare_to_latest(current_version, &latest)?;

        if status == CompareResult::Newer {
            info!(
                "{} {} is newer than {}, re-fetching from the index",
                package, current_version, latest
            );
            latest = self.registry.fetch_latest_version(package).await?;
            status = self.comparator.compare_to_latest(current_version, &latest)?;

            if status == CompareResult::Newer {
                return Err(CheckError::VersionAhead {
                    current: current_version.to_string(),
                    latest,
                });
            }
        }

        let is_outdated = status == CompareResult::Outdated;

        self.cache
            .write(package, &CacheRecord::new(latest.clone(), now()), false)?;

        Ok(CheckResult {
            is_outdated,
            latest_version: latest,
        })
    }
}
