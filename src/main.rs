use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use outdated::config::{Config, log_path};
use outdated::logging::init_logging;
use outdated::version::comparator::VersionScheme;
use outdated::warning::{Reporter, StderrSink};
use outdated::{Notifier, NotifyOptions, OutdatedChecker};

#[derive(Parser)]
#[command(name = "outdated")]
#[command(version, about = "Check whether an installed package is out of date")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to a file instead of stderr (defaults to the data directory)
    #[arg(long, value_name = "PATH", num_args = 0..=1, global = true)]
    log_file: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print whether a package version is out of date
    Check {
        #[command(flatten)]
        target: Target,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Warn on stderr if a package version is out of date
    Notify {
        #[command(flatten)]
        target: Target,

        /// Fail instead of warning when the check itself fails
        #[arg(long)]
        raise: bool,
    },
}

#[derive(Args)]
struct Target {
    /// Package name in the index
    package: String,

    /// Installed version
    #[arg(value_name = "VERSION")]
    installed_version: String,

    /// Index URL template; `%s` is replaced by the package name
    #[arg(long)]
    repository_url: Option<String>,

    /// JSON pointer to the latest version in the index response
    #[arg(long)]
    version_pointer: Option<String>,

    /// Version scheme of the index
    #[arg(long, value_enum)]
    scheme: Option<VersionScheme>,
}

impl Target {
    fn config(&self) -> Config {
        let mut config = Config::global().clone();
        if let Some(url) = &self.repository_url {
            config.repository_url = url.clone();
        }
        if let Some(pointer) = &self.version_pointer {
            config.version_pointer = pointer.clone();
        }
        if let Some(scheme) = self.scheme {
            config.version_scheme = scheme;
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = cli.log_file.map(|path| path.unwrap_or_else(log_path));
    let _guard = init_logging(cli.verbose, log_file.as_deref())?;

    match cli.command {
        Command::Check { target, json } => {
            let config = target.config();
            let sink = Arc::new(StderrSink::new(config.ignore_warnings));
            let checker =
                OutdatedChecker::from_config(&config, Reporter::new(sink, config.raise_exceptions));

            let result = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?
                .block_on(checker.check_outdated(&target.package, &target.installed_version))?;

            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "package": target.package,
                        "version": target.installed_version,
                        "isOutdated": result.is_outdated,
                        "latestVersion": result.latest_version,
                    })
                );
            } else if result.is_outdated {
                println!(
                    "{} {} is out of date (latest: {})",
                    target.package, target.installed_version, result.latest_version
                );
            } else {
                println!("{} {} is up to date", target.package, target.installed_version);
            }
            Ok(())
        }
        Command::Notify { target, raise } => {
            let config = target.config();
            let sink = Arc::new(StderrSink::new(config.ignore_warnings));
            let notifier = Arc::new(Notifier::from_config(&config, sink));

            notifier.notify_if_outdated(
                &target.package,
                &target.installed_version,
                NotifyOptions {
                    raise_exceptions: raise,
                    background: false,
                },
            )?;
            Ok(())
        }
    }
}
