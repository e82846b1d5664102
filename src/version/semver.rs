use std::cmp::Ordering;

use semver::Version;

/// Outcome of comparing an installed version against the latest published one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareResult {
    Latest,
    Outdated,
    Newer,
}

impl From<Ordering> for CompareResult {
    /// `ordering` is `current.cmp(&latest)`
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => CompareResult::Outdated,
            Ordering::Equal => CompareResult::Latest,
            Ordering::Greater => CompareResult::Newer,
        }
    }
}

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros,
/// and strips a leading 'v'.
///
/// Examples:
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "v1.2.3" -> Version(1, 2, 3)
pub fn parse_version(version: &str) -> Result<Version, semver::Error> {
    let version = version.trim().trim_start_matches('v');
    let core_len = version.find(['-', '+']).unwrap_or(version.len());
    let (core, suffix) = version.split_at(core_len);
    let normalized = match core.split('.').count() {
        1 => format!("{core}.0.0{suffix}"),
        2 => format!("{core}.0{suffix}"),
        _ => version.to_string(),
    };
    Version::parse(&normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", "1.0.0")]
    #[case("1.2", "1.2.0")]
    #[case("1.2.3", "1.2.3")]
    #[case("v1.2.3", "1.2.3")]
    #[case("1.2-beta.1", "1.2.0-beta.1")]
    #[case("2.0.0+build.5", "2.0.0+build.5")]
    fn parse_version_normalizes_partial_versions(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(parse_version(input).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("invalid")]
    #[case("")]
    #[case("1.2.3.4")]
    fn parse_version_rejects_non_semver(#[case] input: &str) {
        assert!(parse_version(input).is_err());
    }

    #[rstest]
    #[case(Ordering::Less, CompareResult::Outdated)]
    #[case(Ordering::Equal, CompareResult::Latest)]
    #[case(Ordering::Greater, CompareResult::Newer)]
    fn compare_result_from_ordering(#[case] ordering: Ordering, #[case] expected: CompareResult) {
        assert_eq!(CompareResult::from(ordering), expected);
    }
}
