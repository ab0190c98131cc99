//! runit manages services usually found in `/etc/service` or `/service`,
//! which are soft links to the actual service directories in `/etc/sv`:
//!
//! ```text
//! <service_name>/
//!     run
//!     log/
//!        run
//!     supervise/
//!        pid  # => 4994
//!        stat # => run / down
//! ```

use crate::{InitError, InitSystem, Lookup};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const NAME: &str = "runit";

pub struct Runit {
    path: PathBuf,
}

impl Runit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Present if the service directory exists and holds at least one
/// `*/run` script.
pub fn detect(root: &Path) -> Result<Option<Arc<dyn InitSystem>>, InitError> {
    let mut path = root.join("etc/service");
    if !path.try_exists()? {
        path = root.join("service");
        if !path.try_exists()? {
            tracing::debug!("runit not detected in /etc/service or /service");
            return Ok(None);
        }
    }

    for entry in std::fs::read_dir(&path)? {
        if entry?.path().join("run").try_exists()? {
            tracing::info!(path = %path.display(), "Detected runit");
            return Ok(Some(Arc::new(Runit::new(path))));
        }
    }

    Ok(None)
}

#[async_trait]
impl InitSystem for Runit {
    fn name(&self) -> &str {
        NAME
    }

    async fn lookup_service(&self, service: &str) -> Result<Option<Lookup>, InitError> {
        if service.is_empty() || service.contains('/') {
            return Ok(None);
        }

        let dir = self.path.join(service);
        if !tokio::fs::try_exists(dir.join("run")).await? {
            return Ok(None);
        }

        let content = match tokio::fs::read_to_string(dir.join("supervise/pid")).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let content = content.trim();
        if content.is_empty() {
            // service exists but is not running
            return Ok(Some(Lookup::down()));
        }

        let pid: i32 = content
            .parse()
            .map_err(|e| InitError::Parse(format!("runit pid for {service} '{content}': {e}")))?;
        Ok(Some(Lookup::running(pid)))
    }
}
