//! Init system backends.
//!
//! Each supported process supervisor is probed once at startup by the
//! [`registry::InitRegistry`]. Detected backends resolve a logical
//! service name to a live process id and coarse run state.

pub mod registry;
pub mod runit;
pub mod upstart;


use async_trait::async_trait;
use oxwatch_common::types::{ProcessId, ServiceStatus};

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Init: I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A supervisor control command failed unexpectedly.
    #[error("Init: command failed: {0}")]
    Command(String),

    /// Supervisor state could not be understood.
    #[error("Init: parse error: {0}")]
    Parse(String),
}

/// Process state of a service a backend manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub pid: ProcessId,
    pub status: ServiceStatus,
}

impl Lookup {
    pub fn running(pid: i32) -> Self {
        Self {
            pid: ProcessId(pid),
            status: ServiceStatus::Up,
        }
    }

    pub fn down() -> Self {
        Self {
            pid: ProcessId::NOT_RUNNING,
            status: ServiceStatus::Down,
        }
    }
}

/// A process supervisor present on this host.
#[async_trait]
pub trait InitSystem: Send + Sync {
    /// Name of the init system: `"runit"`, `"upstart"`, ...
    fn name(&self) -> &str;

    /// Looks up the process for `service`.
    ///
    /// Returns `Ok(None)` if this backend does not manage a service with
    /// that name, and a [`Lookup`] with pid 0 if it does but the service is
    /// not running.
    ///
    /// # Errors
    ///
    /// Only unexpected I/O or command failures are errors.
    async fn lookup_service(&self, service: &str) -> Result<Option<Lookup>, InitError>;
}
