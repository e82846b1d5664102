//! Index and configuration test utilities

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use outdated::config::Config;
use outdated::version::cache::{format_timestamp, now};
use outdated::warning::RecordingSink;
use outdated::Notifier;

/// Configuration pointing at a mock index and a private cache directory
pub fn test_config(server_url: &str, cache_dir: &Path) -> Config {
    Config {
        repository_url: format!("{server_url}/pypi/%s/json"),
        cache_dir: Some(cache_dir.to_path_buf()),
        retry_delay_ms: 0,
        ..Config::default()
    }
}

/// Minimal PyPI JSON API body
pub fn pypi_body(latest: &str) -> String {
    format!(r#"{{"info": {{"name": "pkg", "version": "{latest}"}}, "releases": {{"{latest}": []}}}}"#)
}

/// Write a cache file as the checker would, `age_hours` in the past
pub fn prime_cache(cache_dir: &Path, package: &str, latest: &str, age_hours: i64) {
    let checked_at = now() - chrono::Duration::hours(age_hours);
    fs::write(
        cache_dir.join(format!("outdated_cache_{package}")),
        format!(r#"["{latest}", "{}"]"#, format_timestamp(&checked_at)),
    )
    .unwrap();
}

/// Notifier recording its warnings instead of printing them
pub fn recording_notifier(config: &Config) -> (Arc<RecordingSink>, Arc<Notifier>) {
    let sink = Arc::new(RecordingSink::new());
    let notifier = Arc::new(Notifier::from_config(config, sink.clone()));
    (sink, notifier)
}
