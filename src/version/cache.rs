use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::version::error::CacheError;
use crate::warning::{Reporter, WarningCategory};

/// Fixed-width timestamp format; lexicographic order equals chronological order
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CACHE_FAILURE_DESCRIPTION: &str = "use cache while checking for outdated package";

pub fn format_timestamp(dt: &NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Current local time
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Last confirmed latest version of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub latest_version: String,
    pub checked_at: NaiveDateTime,
}

/// On-disk shape: `["<version>", "<YYYY-MM-DD HH:MM:SS>"]`
#[derive(Serialize, Deserialize)]
struct CacheEntry(String, String);

impl CacheRecord {
    pub fn new(latest_version: impl Into<String>, checked_at: NaiveDateTime) -> Self {
        Self {
            latest_version: latest_version.into(),
            checked_at,
        }
    }

    /// Valid iff `format(now - ttl) < format(checked_at)`.
    /// A window reaching outside the representable range is never valid.
    pub fn is_valid(&self, now: NaiveDateTime, ttl: Duration) -> bool {
        now.checked_sub_signed(ttl)
            .is_some_and(|cutoff| format_timestamp(&cutoff) < format_timestamp(&self.checked_at))
    }

    fn to_json(&self) -> Result<String, CacheError> {
        let entry = CacheEntry(
            self.latest_version.clone(),
            format_timestamp(&self.checked_at),
        );
        Ok(serde_json::to_string(&entry)?)
    }

    fn from_json(content: &str) -> Result<Self, CacheError> {
        let CacheEntry(latest_version, checked_at) = serde_json::from_str(content)?;
        let checked_at = NaiveDateTime::parse_from_str(&checked_at, TIMESTAMP_FORMAT)?;
        Ok(Self {
            latest_version,
            checked_at,
        })
    }
}

/// One file per package under a cache directory.
///
/// Files are never locked: concurrent checks for the same package race and
/// the last writer wins.
#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
    prefix: String,
    ttl: Duration,
    reporter: Reporter,
}

impl Cache {
    pub fn new(dir: &Path, prefix: &str, ttl: Duration, reporter: Reporter) -> Self {
        Self {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
            ttl,
            reporter,
        }
    }

    pub fn from_config(config: &Config, reporter: Reporter) -> Self {
        Self::new(
            &config.cache_dir(),
            &config.cache_prefix,
            config.cache_ttl(),
            reporter,
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolve `<dir>/<prefix>_<package>`
    pub fn cache_path(&self, package: &str) -> Result<PathBuf, CacheError> {
        let is_unsafe = package.is_empty()
            || package.contains(['/', '\\', '\0'])
            || package.contains("..");
        if is_unsafe {
            return Err(CacheError::InvalidPackageName(package.to_string()));
        }

        Ok(self.dir.join(format!("{}_{}", self.prefix, package)))
    }

    /// Read the record without failure isolation. Missing or empty files are `None`.
    pub fn try_read(&self, package: &str) -> Result<Option<CacheRecord>, CacheError> {
        let path = self.cache_path(package)?;

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No cache file at {:?}", path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            debug!("Empty cache file at {:?}", path);
            return Ok(None);
        }

        CacheRecord::from_json(&content).map(Some)
    }

    /// Overwrite the record without failure isolation
    pub fn try_write(&self, package: &str, record: &CacheRecord) -> Result<(), CacheError> {
        let path = self.cache_path(package)?;
        let content = record.to_json()?;

        fs::create_dir_all(&self.dir)?;
        fs::write(&path, content)?;

        debug!(
            "Cached latest version {} for {} at {:?}",
            record.latest_version, package, path
        );
        Ok(())
    }

    /// Read the record; failures become a warning and a cache miss unless raising
    pub fn read(&self, package: &str, always_raise: bool) -> Result<Option<CacheRecord>, CacheError> {
        let record = self.reporter.isolate(
            CACHE_FAILURE_DESCRIPTION,
            WarningCategory::CacheFailed,
            always_raise,
            self.try_read(package),
        )?;
        Ok(record.flatten())
    }

    /// Read the record only if it is still inside the validity window
    pub fn read_valid(
        &self,
        package: &str,
        now: NaiveDateTime,
        always_raise: bool,
    ) -> Result<Option<CacheRecord>, CacheError> {
        let record = self.read(package, always_raise)?;

        Ok(record.filter(|record| {
            let valid = record.is_valid(now, self.ttl);
            if !valid {
                info!(
                    "Cached version {} for {} expired (checked at {})",
                    record.latest_version,
                    package,
                    format_timestamp(&record.checked_at)
                );
            }
            valid
        }))
    }

    /// Overwrite the record; failures become a warning unless raising
    pub fn write(
        &self,
        package: &str,
        record: &CacheRecord,
        always_raise: bool,
    ) -> Result<(), CacheError> {
        self.reporter.isolate(
            CACHE_FAILURE_DESCRIPTION,
            WarningCategory::CacheFailed,
            always_raise,
            self.try_write(package, record),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::warning::RecordingSink;
    use rstest::rstest;
    use tempfile::TempDir;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    fn test_cache(dir: &Path, raise_exceptions: bool) -> (Arc<RecordingSink>, Cache) {
        let sink = Arc::new(RecordingSink::new());
        let reporter = Reporter::new(sink.clone(), raise_exceptions);
        let cache = Cache::new(dir, "outdated_cache", Duration::days(1), reporter);
        (sink, cache)
    }

    #[test]
    fn cache_path_joins_prefix_and_package() {
        let temp_dir = TempDir::new().unwrap();
        let (_, cache) = test_cache(temp_dir.path(), false);

        assert_eq!(
            cache.cache_path("ask-so").unwrap(),
            temp_dir.path().join("outdated_cache_ask-so")
        );
    }

    #[rstest]
    #[case("")]
    #[case("../etc/passwd")]
    #[case("a/b")]
    #[case("a\\b")]
    fn cache_path_rejects_unsafe_package_names(#[case] package: &str) {
        let temp_dir = TempDir::new().unwrap();
        let (_, cache) = test_cache(temp_dir.path(), false);

        assert!(matches!(
            cache.cache_path(package),
            Err(CacheError::InvalidPackageName(_))
        ));
    }

    #[test]
    fn write_then_read_returns_record() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, cache) = test_cache(temp_dir.path(), false);
        let record = CacheRecord::new("1.0.4", ts("2024-05-01 12:30:00"));

        cache.write("ask-so", &record, false).unwrap();

        assert_eq!(cache.read("ask-so", false).unwrap(), Some(record));
        assert!(sink.warnings().is_empty());
    }

    #[test]
    fn write_serializes_two_element_array() {
        let temp_dir = TempDir::new().unwrap();
        let (_, cache) = test_cache(temp_dir.path(), false);
        let record = CacheRecord::new("1.0.4", ts("2024-05-01 12:30:00"));

        cache.write("ask-so", &record, false).unwrap();

        let content = fs::read_to_string(temp_dir.path().join("outdated_cache_ask-so")).unwrap();
        assert_eq!(content, r#"["1.0.4","2024-05-01 12:30:00"]"#);
    }

    #[test]
    fn write_overwrites_previous_record() {
        let temp_dir = TempDir::new().unwrap();
        let (_, cache) = test_cache(temp_dir.path(), false);

        cache
            .write("ask-so", &CacheRecord::new("1.0.10", ts("2024-05-01 12:30:00")), false)
            .unwrap();
        let newer = CacheRecord::new("1.1", ts("2024-05-02 08:00:00"));
        cache.write("ask-so", &newer, false).unwrap();

        assert_eq!(cache.read("ask-so", false).unwrap(), Some(newer));
    }

    #[test]
    fn read_returns_none_for_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, cache) = test_cache(temp_dir.path(), false);

        assert_eq!(cache.read("missing", false).unwrap(), None);
        assert!(sink.warnings().is_empty());
    }

    #[test]
    fn read_returns_none_for_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, cache) = test_cache(temp_dir.path(), false);
        fs::write(temp_dir.path().join("outdated_cache_empty"), "").unwrap();

        assert_eq!(cache.read("empty", false).unwrap(), None);
        assert!(sink.warnings().is_empty());
    }

    #[rstest]
    #[case("not json")]
    #[case(r#"["1.0.4"]"#)]
    #[case(r#"["1.0.4", "yesterday"]"#)]
    fn read_downgrades_malformed_content_to_warning(#[case] content: &str) {
        let temp_dir = TempDir::new().unwrap();
        let (sink, cache) = test_cache(temp_dir.path(), false);
        fs::write(temp_dir.path().join("outdated_cache_broken"), content).unwrap();

        assert_eq!(cache.read("broken", false).unwrap(), None);

        let warnings = sink.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, WarningCategory::CacheFailed);
        assert!(
            warnings[0]
                .message
                .starts_with("Failed to use cache while checking for outdated package:\n")
        );
    }

    #[test]
    fn read_and_write_downgrade_io_errors() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, cache) = test_cache(temp_dir.path(), false);
        // A directory where the file should be makes both open calls fail
        fs::create_dir(temp_dir.path().join("outdated_cache_ask-so")).unwrap();

        assert_eq!(cache.read("ask-so", false).unwrap(), None);
        cache
            .write("ask-so", &CacheRecord::new("1.0.4", now()), false)
            .unwrap();

        let categories: Vec<_> = sink.warnings().iter().map(|w| w.category).collect();
        assert_eq!(
            categories,
            vec![WarningCategory::CacheFailed, WarningCategory::CacheFailed]
        );
    }

    #[test]
    fn read_propagates_when_always_raise() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, cache) = test_cache(temp_dir.path(), false);

        let result = cache.read("../escape", true);

        assert!(matches!(result, Err(CacheError::InvalidPackageName(_))));
        assert!(sink.warnings().is_empty());
    }

    #[test]
    fn write_propagates_when_configured_to_raise() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, cache) = test_cache(temp_dir.path(), true);

        let result = cache.write("", &CacheRecord::new("1.0.4", now()), false);

        assert!(result.is_err());
        assert!(sink.warnings().is_empty());
    }

    #[rstest]
    #[case("2024-05-01 12:00:00", true)] // checked just now
    #[case("2024-04-30 12:00:01", true)] // one second inside the window
    #[case("2024-04-30 12:00:00", false)] // exactly 24h old
    #[case("2024-04-01 00:00:00", false)] // long expired
    fn is_valid_uses_24h_window(#[case] checked_at: &str, #[case] expected: bool) {
        let record = CacheRecord::new("1.0.4", ts(checked_at));

        assert_eq!(
            record.is_valid(ts("2024-05-01 12:00:00"), Duration::days(1)),
            expected
        );
    }

    #[rstest]
    #[case(Duration::MAX)]
    #[case(Duration::MIN)]
    fn is_valid_is_false_when_window_overflows(#[case] ttl: Duration) {
        let record = CacheRecord::new("1.0.4", ts("2024-05-01 12:00:00"));

        assert!(!record.is_valid(ts("2024-05-01 12:00:00"), ttl));
    }

    #[rstest]
    #[case(i64::MAX)]
    #[case(i64::MIN)]
    fn out_of_range_ttl_from_config_never_hits_cache(#[case] cache_ttl_secs: i64) {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            cache_dir: Some(temp_dir.path().to_path_buf()),
            cache_ttl_secs,
            ..Config::default()
        };
        let sink = Arc::new(RecordingSink::new());
        let cache = Cache::from_config(&config, Reporter::new(sink.clone(), false));
        cache
            .write("ask-so", &CacheRecord::new("1.0.4", now()), false)
            .unwrap();

        assert_eq!(cache.read_valid("ask-so", now(), false).unwrap(), None);
        assert!(sink.warnings().is_empty());
    }

    #[test]
    fn read_valid_filters_expired_record() {
        let temp_dir = TempDir::new().unwrap();
        let (_, cache) = test_cache(temp_dir.path(), false);
        let checked_at = ts("2024-05-01 12:00:00");
        cache
            .write("ask-so", &CacheRecord::new("1.0.4", checked_at), false)
            .unwrap();

        let fresh = cache
            .read_valid("ask-so", checked_at + Duration::hours(1), false)
            .unwrap();
        let expired = cache
            .read_valid("ask-so", checked_at + Duration::hours(25), false)
            .unwrap();

        assert_eq!(fresh.map(|r| r.latest_version), Some("1.0.4".to_string()));
        assert_eq!(expired, None);
        // Expired records stay on disk
        assert!(temp_dir.path().join("outdated_cache_ask-so").exists());
    }
}
