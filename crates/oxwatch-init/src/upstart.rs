//! Upstart jobs live in `/etc/init/<job>.conf`; their state comes from
//! `initctl status <job>`, which prints one of:
//!
//! ```text
//! mysql start/running, process 1234
//! mysql stop/waiting
//! ```

use crate::{InitError, InitSystem, Lookup};
use async_trait::async_trait;
use oxwatch_common::types::{ProcessId, ServiceStatus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;

pub const NAME: &str = "upstart";

pub struct Upstart {
    path: PathBuf,
    initctl: PathBuf,
}

impl Upstart {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            initctl: PathBuf::from("initctl"),
        }
    }

    /// Uses `initctl` as the status command instead of the one on `PATH`.
    pub fn with_initctl(mut self, initctl: impl Into<PathBuf>) -> Self {
        self.initctl = initctl.into();
        self
    }
}

/// Present if `/etc/init` holds at least one job file.
pub fn detect(root: &Path) -> Result<Option<Arc<dyn InitSystem>>, InitError> {
    let path = root.join("etc/init");
    if !path.try_exists()? {
        return Ok(None);
    }

    for entry in std::fs::read_dir(&path)? {
        if entry?.path().extension().is_some_and(|ext| ext == "conf") {
            tracing::info!(path = %path.display(), "Detected upstart");
            return Ok(Some(Arc::new(Upstart::new(path))));
        }
    }

    Ok(None)
}

/// Parses one line of `initctl status` output.
pub fn parse_status(output: &str) -> Result<Lookup, InitError> {
    let line = output.lines().next().unwrap_or_default().trim();
    let mut parts = line.splitn(2, ' ');
    let _job = parts.next();
    let rest = parts
        .next()
        .ok_or_else(|| InitError::Parse(format!("unexpected initctl output: {line}")))?;

    let (goal_state, process) = match rest.split_once(',') {
        Some((gs, p)) => (gs.trim(), Some(p.trim())),
        None => (rest.trim(), None),
    };
    let (goal, state) = goal_state
        .split_once('/')
        .ok_or_else(|| InitError::Parse(format!("unexpected initctl output: {line}")))?;

    let pid = match process.and_then(|p| p.strip_prefix("process ")) {
        Some(p) => p
            .trim()
            .parse::<i32>()
            .map_err(|e| InitError::Parse(format!("initctl pid '{p}': {e}")))?,
        None => 0,
    };

    let status = match (goal, state) {
        ("start", "running") if pid > 0 => ServiceStatus::Up,
        ("start", _) => ServiceStatus::Starting,
        ("stop", "waiting") => ServiceStatus::Down,
        ("stop", _) => ServiceStatus::Stopping,
        _ => ServiceStatus::Unknown,
    };

    Ok(Lookup {
        pid: ProcessId(pid),
        status,
    })
}

#[async_trait]
impl InitSystem for Upstart {
    fn name(&self) -> &str {
        NAME
    }

    async fn lookup_service(&self, service: &str) -> Result<Option<Lookup>, InitError> {
        if service.is_empty() || service.contains('/') {
            return Ok(None);
        }
        if !tokio::fs::try_exists(self.path.join(format!("{service}.conf"))).await? {
            return Ok(None);
        }

        // A cancelled lookup must not leave initctl behind.
        let output = Command::new(&self.initctl)
            .arg("status")
            .arg(service)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("Unknown job") {
                return Ok(None);
            }
            return Err(InitError::Command(format!(
                "initctl status {service}: {}",
                stderr.trim()
            )));
        }

        parse_status(&String::from_utf8_lossy(&output.stdout)).map(Some)
    }
}
