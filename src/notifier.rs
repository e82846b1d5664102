//! Outdated notifications with failure isolation and background execution
//!
//! [`Notifier`] wraps [`OutdatedChecker`] so that the host program never
//! halts because of a version check: failures become warnings, and in
//! background mode the whole check runs on its own thread.

use std::io::{self, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use crate::config::Config;
use crate::version::checker::OutdatedChecker;
use crate::version::error::CheckError;
use crate::warning::{Reporter, StderrSink, Warning, WarningCategory, WarningSink};

/// Options for [`Notifier::notify_if_outdated`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyOptions {
    /// Propagate check errors instead of warning about them
    pub raise_exceptions: bool,
    /// Run on a detached thread instead of the caller's
    pub background: bool,
}

impl Default for NotifyOptions {
    fn default() -> Self {
        Self {
            raise_exceptions: false,
            background: true,
        }
    }
}

pub struct Notifier {
    checker: OutdatedChecker,
    reporter: Reporter,
}

impl Notifier {
    pub fn new(checker: OutdatedChecker, reporter: Reporter) -> Self {
        Self { checker, reporter }
    }

    pub fn from_config(config: &Config, sink: Arc<dyn WarningSink>) -> Self {
        let reporter = Reporter::new(sink, config.raise_exceptions);
        Self::new(
            OutdatedChecker::from_config(config, reporter.clone()),
            reporter,
        )
    }

    /// Notifier for the default index, configured from the environment and warning on stderr
    pub fn from_env() -> Self {
        let config = Config::global();
        Self::from_config(config, Arc::new(StderrSink::new(config.ignore_warnings)))
    }

    pub fn checker(&self) -> &OutdatedChecker {
        &self.checker
    }

    /// Check `package` and warn if it is outdated.
    ///
    /// Check failures become a [`WarningCategory::CheckFailed`] warning unless
    /// `raise_exceptions` is set or the reporter was configured to raise.
    pub async fn check_and_warn(
        &self,
        package: &str,
        current_version: &str,
        raise_exceptions: bool,
    ) -> Result<(), CheckError> {
        let result = self.reporter.isolate(
            &check_description(package),
            WarningCategory::CheckFailed,
            raise_exceptions,
            self.checker.check_outdated(package, current_version).await,
        )?;

        match result {
            Some(result) if result.is_outdated => {
                self.reporter.warn(Warning::outdated(
                    package,
                    current_version,
                    &result.latest_version,
                ));
            }
            Some(_) => debug!("{} {} is up to date", package, current_version),
            None => {}
        }

        Ok(())
    }

    /// Run [`Self::check_and_warn`] to completion on a blocking thread.
    ///
    /// Builds a single-threaded runtime for the check. When called from within
    /// an async runtime, that runtime lives on a scoped helper thread so the
    /// caller's runtime is never nested.
    pub fn check_and_warn_blocking(
        &self,
        package: &str,
        current_version: &str,
        raise_exceptions: bool,
    ) -> Result<(), CheckError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return self.run_to_completion(package, current_version, raise_exceptions);
        }

        debug!("Running outdated check for {} off the async runtime", package);
        thread::scope(|scope| {
            let helper = thread::Builder::new()
                .name(format!("outdated-{package}"))
                .spawn_scoped(scope, || {
                    self.run_to_completion(package, current_version, raise_exceptions)
                });

            match helper {
                Ok(helper) => helper.join().unwrap_or_else(|_| {
                    self.isolate_runtime_error(
                        package,
                        raise_exceptions,
                        io::Error::other("outdated check thread panicked"),
                    )
                }),
                Err(e) => self.isolate_runtime_error(package, raise_exceptions, e),
            }
        })
    }

    fn run_to_completion(
        &self,
        package: &str,
        current_version: &str,
        raise_exceptions: bool,
    ) -> Result<(), CheckError> {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => return self.isolate_runtime_error(package, raise_exceptions, e),
        };

        runtime.block_on(self.check_and_warn(package, current_version, raise_exceptions))
    }

    fn isolate_runtime_error(
        &self,
        package: &str,
        raise_exceptions: bool,
        error: io::Error,
    ) -> Result<(), CheckError> {
        self.reporter.isolate::<(), _>(
            &check_description(package),
            WarningCategory::CheckFailed,
            raise_exceptions,
            Err(CheckError::Runtime(error)),
        )?;
        Ok(())
    }

    /// Start the check on a new thread and return its handle.
    ///
    /// Errors that escape the check are logged and printed to stderr, never
    /// returned.
    pub fn spawn(
        self: &Arc<Self>,
        package: &str,
        current_version: &str,
        raise_exceptions: bool,
    ) -> io::Result<JoinHandle<()>> {
        let notifier = Arc::clone(self);
        let package = package.to_string();
        let current_version = current_version.to_string();

        thread::Builder::new()
            .name(format!("outdated-{package}"))
            .spawn(move || {
                if let Err(e) =
                    notifier.check_and_warn_blocking(&package, &current_version, raise_exceptions)
                {
                    report_background_error(&mut io::stderr(), &package, &e);
                }
            })
    }

    /// Check `package` and warn if it is outdated.
    ///
    /// In background mode the check is fire-and-forget and this always
    /// returns `Ok(())`. Otherwise it runs on the caller's thread and errors
    /// propagate only when raising.
    pub fn notify_if_outdated(
        self: &Arc<Self>,
        package: &str,
        current_version: &str,
        options: NotifyOptions,
    ) -> Result<(), CheckError> {
        if !options.background {
            return self.check_and_warn_blocking(package, current_version, options.raise_exceptions);
        }

        if let Err(e) = self.spawn(package, current_version, options.raise_exceptions) {
            error!("Failed to spawn outdated check for {}: {}", package, e);
        }
        Ok(())
    }
}

fn check_description(package: &str) -> String {
    format!("check for latest version of {package}")
}

/// Surface an error escaping a background check, which has no caller to return to
fn report_background_error(out: &mut impl Write, package: &str, error: &CheckError) {
    error!("Outdated check for {} failed: {}", package, error);
    let _ = writeln!(out, "Outdated check for {package} failed: {error}");
}
