mod age;
mod scan;
mod service;
mod watch;

use clap::{CommandFactory, Parser};
use service::SystemdController;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use watch::{WatchConfig, WatchError};

/// Watches a directory for files matching a name filter and restarts a
/// systemd service when the newest matching file is too old. Meant for
/// periodic invocation (cron or a systemd timer) to recover a logging
/// process that has silently stopped writing.
#[derive(Parser, Debug)]
#[command(
    name = "logmon",
    version,
    about,
    after_help = "Example:\n  logmon -d /var/log/myapp -f MyLog -a 1 -s my-logger.service\n\nRestarts my-logger.service if no file in /var/log/myapp matching MyLog\nhas been modified within the last day."
)]
struct Cli {
    /// Directory to scan (top level only)
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    dir: PathBuf,

    /// Case-sensitive substring that matching file paths must contain
    #[arg(short = 'f', long = "filter", value_name = "SUBSTR")]
    filter: String,

    /// Age limit in whole days; a newest write this old or older triggers a restart
    #[arg(short = 'a', long = "age", value_name = "DAYS")]
    age: u32,

    /// Service to restart when the age limit is reached
    #[arg(short = 's', long = "service", value_name = "NAME")]
    service: String,

    /// Bound the wait for service state transitions, in seconds (default: wait indefinitely)
    #[arg(long, value_name = "SECS")]
    wait_timeout: Option<u64>,

    /// Evaluate and report, but never restart the service
    #[arg(long)]
    dry_run: bool,

    /// Extra logging (scan details, service state transitions)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    // Bare `logmon` shows usage instead of a missing-flag error.
    if std::env::args_os().len() <= 1 {
        let _ = Cli::command().print_help();
        return;
    }

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = WatchConfig {
        dir: cli.dir,
        filter: cli.filter,
        age_limit_days: cli.age,
        service: cli.service,
        dry_run: cli.dry_run,
    };
    let controller = SystemdController::new(cli.wait_timeout.map(Duration::from_secs));

    match watch::run(&config, &controller) {
        Ok(outcome) => {
            tracing::debug!(?outcome, "watch run complete");
        }
        Err(err) => {
            // The restart path already logged its coarse diagnostic.
            if let WatchError::Scan(e) = &err {
                tracing::error!(error = %e, "directory scan failed");
            }
            std::process::exit(err.exit_code());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_flags_parse_in_any_order() {
        let a = Cli::try_parse_from([
            "logmon", "-d", "/var/log", "-f", "MyLog", "-a", "1", "-s", "svc",
        ])
        .unwrap();
        let b = Cli::try_parse_from([
            "logmon", "-s", "svc", "-a", "1", "-f", "MyLog", "-d", "/var/log",
        ])
        .unwrap();

        for cli in [a, b] {
            assert_eq!(cli.dir, PathBuf::from("/var/log"));
            assert_eq!(cli.filter, "MyLog");
            assert_eq!(cli.age, 1);
            assert_eq!(cli.service, "svc");
            assert!(!cli.dry_run);
        }
    }

    #[test]
    fn test_missing_required_flag_is_a_usage_error() {
        let err =
            Cli::try_parse_from(["logmon", "-d", "/var/log", "-f", "MyLog", "-a", "1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(err.to_string().contains("--service"));
    }

    #[test]
    fn test_flag_without_a_value_is_a_usage_error() {
        // A trailing flag with no value must be a clean usage error.
        let err = Cli::try_parse_from(["logmon", "-d", "/var/log", "-f", "MyLog", "-a", "1", "-s"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_non_integer_age_is_rejected() {
        let err = Cli::try_parse_from([
            "logmon", "-d", "/var/log", "-f", "MyLog", "-a", "soon", "-s", "svc",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_help_flag_wins_over_other_flags() {
        let err = Cli::try_parse_from(["logmon", "-d", "/var/log", "-h"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_long_flag_aliases() {
        let cli = Cli::try_parse_from([
            "logmon",
            "--dir",
            "/var/log",
            "--filter",
            "MyLog",
            "--age",
            "2",
            "--service",
            "svc",
            "--dry-run",
            "--wait-timeout",
            "30",
        ])
        .unwrap();
        assert_eq!(cli.age, 2);
        assert!(cli.dry_run);
        assert_eq!(cli.wait_timeout, Some(30));
    }
}
