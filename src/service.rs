/// Service controller: queries a systemd unit's run state and bounces it
/// with a stop-then-start cycle, blocking on each state transition.
use std::process::Command;
use std::time::{Duration, Instant};

/// Coarse run-state of a unit, mapped from systemd's ActiveState.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Active,
    Activating,
    Deactivating,
    Inactive,
    Failed,
    Unknown,
}

impl ServiceState {
    /// Map an ActiveState string onto the coarse state.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "active" | "reloading" => ServiceState::Active,
            "activating" => ServiceState::Activating,
            "deactivating" => ServiceState::Deactivating,
            "inactive" => ServiceState::Inactive,
            "failed" => ServiceState::Failed,
            _ => ServiceState::Unknown,
        }
    }

    /// Running or on the way up: a stop must be issued before restarting.
    pub fn needs_stop(self) -> bool {
        matches!(self, ServiceState::Active | ServiceState::Activating)
    }

    /// Settled in a non-running state: safe to issue a start.
    pub fn is_stopped(self) -> bool {
        matches!(self, ServiceState::Inactive | ServiceState::Failed)
    }
}

/// Errors from service-manager operations.
#[derive(Debug)]
pub enum ServiceError {
    /// systemctl itself could not be executed.
    Exec { source: std::io::Error },
    /// systemctl ran but reported failure.
    CommandFailed {
        operation: &'static str,
        service: String,
        stderr: String,
    },
    /// The unit is not known to the service manager.
    NotFound { service: String },
    /// A bounded wait expired before the unit reached the wanted state.
    Timeout { service: String, waited: Duration },
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Exec { source } => {
                write!(f, "failed to run systemctl: {source}")
            }
            ServiceError::CommandFailed {
                operation,
                service,
                stderr,
            } => {
                write!(
                    f,
                    "systemctl {operation} {service} failed: {}",
                    stderr.trim()
                )
            }
            ServiceError::NotFound { service } => {
                write!(f, "service {service} not found")
            }
            ServiceError::Timeout { service, waited } => {
                write!(
                    f,
                    "gave up waiting for {service} after {:.1}s",
                    waited.as_secs_f64()
                )
            }
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Exec { source } => Some(source),
            _ => None,
        }
    }
}

/// The OS service-manager seam. Production code talks to systemd through
/// `systemctl`; tests substitute a recording fake.
pub trait ServiceManager {
    fn status(&self, service: &str) -> Result<ServiceState, ServiceError>;
    fn stop(&self, service: &str) -> Result<(), ServiceError>;
    fn start(&self, service: &str) -> Result<(), ServiceError>;
    /// Block until `done` holds for the unit's state, polling the manager.
    /// With no deadline configured this waits indefinitely.
    fn wait_until(
        &self,
        service: &str,
        done: fn(ServiceState) -> bool,
    ) -> Result<(), ServiceError>;
}

/// Stop-then-start cycle: ensure `service` ends the call running.
///
/// If the unit is running or start-pending it is stopped first; the call
/// then blocks until the unit settles stopped, issues a start, and blocks
/// until it reaches the running state.
pub fn restart(manager: &dyn ServiceManager, service: &str) -> Result<(), ServiceError> {
    let state = manager.status(service)?;
    tracing::debug!(service, ?state, "service state before restart");

    if state.needs_stop() {
        manager.stop(service)?;
    }
    manager.wait_until(service, ServiceState::is_stopped)?;

    manager.start(service)?;
    manager.wait_until(service, |state| state == ServiceState::Active)?;

    tracing::debug!(service, "service restarted");
    Ok(())
}

/// Poll `status` until `done` holds, sleeping `interval` between probes.
/// With `deadline` set, expiry is reported as a timeout error.
fn wait_for(
    mut status: impl FnMut() -> Result<ServiceState, ServiceError>,
    done: fn(ServiceState) -> bool,
    deadline: Option<Duration>,
    interval: Duration,
    service: &str,
) -> Result<(), ServiceError> {
    let started = Instant::now();
    loop {
        if done(status()?) {
            return Ok(());
        }
        if let Some(limit) = deadline {
            if started.elapsed() >= limit {
                return Err(ServiceError::Timeout {
                    service: service.to_string(),
                    waited: started.elapsed(),
                });
            }
        }
        std::thread::sleep(interval);
    }
}

/// Talks to systemd through the `systemctl` binary.
pub struct SystemdController {
    wait_timeout: Option<Duration>,
    poll_interval: Duration,
}

impl SystemdController {
    /// With `wait_timeout` unset, state-transition waits block indefinitely.
    pub fn new(wait_timeout: Option<Duration>) -> Self {
        Self {
            wait_timeout,
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl ServiceManager for SystemdController {
    fn status(&self, service: &str) -> Result<ServiceState, ServiceError> {
        let output = Command::new("systemctl")
            .args([
                "show",
                "--property=LoadState",
                "--property=ActiveState",
                "--value",
                service,
            ])
            .output()
            .map_err(|e| ServiceError::Exec { source: e })?;

        if !output.status.success() {
            return Err(ServiceError::CommandFailed {
                operation: "show",
                service: service.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        // Values come back one per line, in the order requested.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut values = stdout.lines();
        let load_state = values.next().unwrap_or("").trim();
        let active_state = values.next().unwrap_or("");

        if load_state != "loaded" {
            return Err(ServiceError::NotFound {
                service: service.to_string(),
            });
        }
        Ok(ServiceState::parse(active_state))
    }

    fn stop(&self, service: &str) -> Result<(), ServiceError> {
        run_systemctl("stop", service)
    }

    fn start(&self, service: &str) -> Result<(), ServiceError> {
        run_systemctl("start", service)
    }

    fn wait_until(
        &self,
        service: &str,
        done: fn(ServiceState) -> bool,
    ) -> Result<(), ServiceError> {
        wait_for(
            || self.status(service),
            done,
            self.wait_timeout,
            self.poll_interval,
            service,
        )
    }
}

fn run_systemctl(operation: &'static str, service: &str) -> Result<(), ServiceError> {
    let output = Command::new("systemctl")
        .args([operation, service])
        .output()
        .map_err(|e| ServiceError::Exec { source: e })?;

    if !output.status.success() {
        return Err(ServiceError::CommandFailed {
            operation,
            service: service.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}
