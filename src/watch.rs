/// One watch run: echo the configuration, scan the directory, evaluate the
/// newest write against the age limit, and bounce the service when stale.
use crate::age::{self, WriteAge};
use crate::scan::{self, LogFile, ScanError};
use crate::service::{self, ServiceError, ServiceManager};
use chrono::Local;
use std::path::PathBuf;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Resolved watch settings, built once from the CLI and immutable after.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub dir: PathBuf,
    pub filter: String,
    pub age_limit_days: u32,
    pub service: String,
    pub dry_run: bool,
}

/// How a watch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No file matched the filter; nothing to evaluate.
    NoMatches,
    /// Newest write is within the limit; service left alone.
    RecentWrite,
    /// Threshold reached and the service was restarted.
    Restarted,
    /// Threshold reached but --dry-run suppressed the restart.
    DryRun,
}

/// Errors that end a watch run early.
#[derive(Debug)]
pub enum WatchError {
    Scan(ScanError),
    Restart(ServiceError),
}

impl WatchError {
    /// Process exit code for this failure class (0 is success, 2 is
    /// clap's usage error).
    pub fn exit_code(&self) -> i32 {
        match self {
            WatchError::Scan(_) => 1,
            WatchError::Restart(_) => 3,
        }
    }
}

impl std::fmt::Display for WatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchError::Scan(e) => write!(f, "scan failed: {e}"),
            WatchError::Restart(e) => write!(f, "restart failed: {e}"),
        }
    }
}

impl std::error::Error for WatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WatchError::Scan(e) => Some(e),
            WatchError::Restart(e) => Some(e),
        }
    }
}

impl From<ScanError> for WatchError {
    fn from(e: ScanError) -> Self {
        WatchError::Scan(e)
    }
}

/// Run the pipeline once against the given service manager.
///
/// Report lines go to stdout; failures are logged and returned. The manager
/// is contacted only when the age limit is reached and --dry-run is off.
pub fn run(config: &WatchConfig, manager: &dyn ServiceManager) -> Result<Outcome, WatchError> {
    println!("Dir:     {}", config.dir.display());
    println!("Filter:  {}", config.filter);
    println!("Service: {}", config.service);
    println!("Age:     {} days", config.age_limit_days);
    println!();

    let mut files: Vec<LogFile> = Vec::new();
    for item in scan::matching_files(&config.dir, &config.filter)? {
        let file = item?;
        if files.is_empty() {
            println!("Files found:");
        }
        println!("{}", file.path.display());
        println!("Modified: {}", file.modified.format(TIMESTAMP_FORMAT));
        files.push(file);
    }

    let Some(newest) = age::newest_write(&files) else {
        println!("No files found matching {}. Exiting...", config.filter);
        return Ok(Outcome::NoMatches);
    };

    let now = Local::now();
    println!();
    println!("Newest write: {}", newest.format(TIMESTAMP_FORMAT));
    println!("Current time: {}", now.format(TIMESTAMP_FORMAT));

    let write_age = WriteAge::between(newest, now);
    println!("Write age: {write_age}");

    if !write_age.exceeds(config.age_limit_days) {
        println!("File written to recently.");
        return Ok(Outcome::RecentWrite);
    }

    println!(
        "No writes for {} days, restarting service {}",
        config.age_limit_days, config.service
    );

    if config.dry_run {
        println!("Dry run, service not restarted.");
        return Ok(Outcome::DryRun);
    }

    match service::restart(manager, &config.service) {
        Ok(()) => {
            println!("Service {} restarted.", config.service);
            Ok(Outcome::Restarted)
        }
        Err(err) => {
            tracing::debug!(error = %err, "service restart error detail");
            tracing::warn!("restart failed, service not found?");
            Err(WatchError::Restart(err))
        }
    }
}
