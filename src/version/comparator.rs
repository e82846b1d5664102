//! Version ordering abstraction for different index schemes

use std::str::FromStr;
use std::sync::Arc;

use pep508_rs::pep440_rs::Version as Pep440Version;
use serde::Deserialize;

use crate::version::error::CheckError;
use crate::version::semver::{CompareResult, parse_version};

/// Trait for parsing and ordering version strings
///
/// Each index speaks a different version dialect:
/// - PyPI: PEP 440 (`1.0.4.0 == 1.0.4`, `5.0a1 < 5.0`)
/// - crates.io and friends: SemVer
pub trait VersionComparator: Send + Sync {
    /// Check that a version string parses under this scheme
    fn validate(&self, version: &str) -> Result<(), CheckError>;

    /// Compare the installed version to the latest published one
    fn compare_to_latest(
        &self,
        current_version: &str,
        latest_version: &str,
    ) -> Result<CompareResult, CheckError>;
}

/// Version scheme used by the remote index
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VersionScheme {
    #[default]
    Pep440,
    Semver,
}

impl VersionScheme {
    pub fn comparator(self) -> Arc<dyn VersionComparator> {
        match self {
            VersionScheme::Pep440 => Arc::new(Pep440Comparator),
            VersionScheme::Semver => Arc::new(SemverComparator),
        }
    }
}

fn invalid(version: &str, reason: impl ToString) -> CheckError {
    CheckError::InvalidVersion {
        version: version.to_string(),
        reason: reason.to_string(),
    }
}

/// Comparator for PEP 440 versions
pub struct Pep440Comparator;

impl Pep440Comparator {
    fn parse(version: &str) -> Result<Pep440Version, CheckError> {
        Pep440Version::from_str(version.trim()).map_err(|e| invalid(version, e))
    }
}

impl VersionComparator for Pep440Comparator {
    fn validate(&self, version: &str) -> Result<(), CheckError> {
        Self::parse(version).map(|_| ())
    }

    fn compare_to_latest(
        &self,
        current_version: &str,
        latest_version: &str,
    ) -> Result<CompareResult, CheckError> {
        let current = Self::parse(current_version)?;
        let latest = Self::parse(latest_version)?;
        Ok(current.cmp(&latest).into())
    }
}

/// Comparator for SemVer versions, accepting partial versions like `1.2`
pub struct SemverComparator;

impl SemverComparator {
    fn parse(version: &str) -> Result<semver::Version, CheckError> {
        parse_version(version).map_err(|e| invalid(version, e))
    }
}

impl VersionComparator for SemverComparator {
    fn validate(&self, version: &str) -> Result<(), CheckError> {
        Self::parse(version).map(|_| ())
    }

    fn compare_to_latest(
        &self,
        current_version: &str,
        latest_version: &str,
    ) -> Result<CompareResult, CheckError> {
        let current = Self::parse(current_version)?;
        let latest = Self::parse(latest_version)?;
        // Build metadata carries no precedence
        Ok(current.cmp_precedence(&latest).into())
    }
}
