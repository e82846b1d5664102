//! User-facing warnings and the error-to-warning boundary
//!
//! Failures that should never halt the host program are downgraded to a
//! [`Warning`] and handed to a [`WarningSink`]. Unless the caller asked for
//! errors to propagate, that is the only trace they leave.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::config::{IGNORE_ENV, RAISE_EXCEPTION_ENV};

/// Category of a warning, used by hosts to filter them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCategory {
    /// Reading or writing the cache file failed
    CacheFailed,
    /// The whole outdated check failed
    CheckFailed,
    /// The installed package is older than the latest published version
    PackageOutdated,
}

impl WarningCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCategory::CacheFailed => "OutdatedCacheFailedWarning",
            WarningCategory::CheckFailed => "OutdatedCheckFailedWarning",
            WarningCategory::PackageOutdated => "OutdatedPackageWarning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub category: WarningCategory,
    pub message: String,
}

impl Warning {
    pub fn new(category: WarningCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    /// Warning for a failure that was downgraded instead of propagated
    pub fn failure(category: WarningCategory, description: &str, error: &dyn fmt::Display) -> Self {
        Self::new(
            category,
            format!(
                "Failed to {description}:\n{error}\n\
                 Set the environment variable {RAISE_EXCEPTION_ENV}=1 for a full traceback."
            ),
        )
    }

    pub fn outdated(package: &str, current_version: &str, latest_version: &str) -> Self {
        Self::new(
            WarningCategory::PackageOutdated,
            format!(
                "The package {package} is out of date. \
                 Your version is {current_version}, the latest is {latest_version}."
            ),
        )
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category.as_str(), self.message)?;
        if self.category == WarningCategory::PackageOutdated {
            write!(
                f,
                "\nSet the environment variable {IGNORE_ENV}=1 to disable these warnings."
            )?;
        }
        Ok(())
    }
}

/// Destination for emitted warnings
pub trait WarningSink: Send + Sync {
    fn emit(&self, warning: &Warning);
}

/// Prints warnings to stderr, or to any other writer
#[derive(Debug)]
pub struct StderrSink<W = io::Stderr> {
    ignore: bool,
    writer: Mutex<W>,
}

impl StderrSink {
    /// `ignore` hides warnings from stderr; they are still logged
    pub fn new(ignore: bool) -> Self {
        Self::with_writer(ignore, io::stderr())
    }
}

impl<W: Write + Send> StderrSink<W> {
    pub fn with_writer(ignore: bool, writer: W) -> Self {
        Self {
            ignore,
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> WarningSink for StderrSink<W> {
    fn emit(&self, warning: &Warning) {
        warn!(category = warning.category.as_str(), "{}", warning.message);
        if self.ignore {
            return;
        }
        if let Ok(mut writer) = self.writer.lock() {
            // Nowhere left to report a failing stderr
            let _ = writeln!(writer, "{warning}");
        }
    }
}

/// Keeps every warning in memory, in emission order
#[derive(Debug, Default)]
pub struct RecordingSink {
    warnings: Mutex<Vec<Warning>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }

    pub fn take(&self) -> Vec<Warning> {
        self.warnings
            .lock()
            .map(|mut w| std::mem::take(&mut *w))
            .unwrap_or_default()
    }
}

impl WarningSink for RecordingSink {
    fn emit(&self, warning: &Warning) {
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(warning.clone());
        }
    }
}

/// Decides whether a failure propagates or becomes a warning
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn WarningSink>,
    raise_exceptions: bool,
}

impl Reporter {
    pub fn new(sink: Arc<dyn WarningSink>, raise_exceptions: bool) -> Self {
        Self {
            sink,
            raise_exceptions,
        }
    }

    pub fn raise_exceptions(&self) -> bool {
        self.raise_exceptions
    }

    pub fn warn(&self, warning: Warning) {
        self.sink.emit(&warning);
    }

    /// Pass `result` through, or downgrade its error to a warning.
    ///
    /// Returns `Ok(None)` when the error was downgraded. The error propagates
    /// when `always_raise` is set or the reporter was built to raise.
    pub fn isolate<T, E: fmt::Display>(
        &self,
        description: &str,
        category: WarningCategory,
        always_raise: bool,
        result: Result<T, E>,
    ) -> Result<Option<T>, E> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if always_raise || self.raise_exceptions => Err(e),
            Err(e) => {
                self.warn(Warning::failure(category, description, &e));
                Ok(None)
            }
        }
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("raise_exceptions", &self.raise_exceptions)
            .finish_non_exhaustive()
    }
}
