use crate::{runit, upstart, InitError, InitSystem, Lookup};
use std::path::Path;
use std::sync::Arc;

/// Probes `root` for one init system. `Ok(None)` means not present.
pub type DetectFn = fn(&Path) -> Result<Option<Arc<dyn InitSystem>>, InitError>;

#[derive(Clone, Copy)]
pub struct InitProbe {
    pub name: &'static str,
    pub detect: DetectFn,
}

/// Every init system this agent knows how to talk to.
pub const SUPPORTED_INITS: [InitProbe; 2] = [
    InitProbe {
        name: runit::NAME,
        detect: runit::detect,
    },
    InitProbe {
        name: upstart::NAME,
        detect: upstart::detect,
    },
];

/// Init systems detected on this host, in detection order.
pub struct InitRegistry {
    inits: Vec<Arc<dyn InitSystem>>,
}

impl InitRegistry {
    /// Probes the live filesystem for every supported init system.
    pub fn detect() -> Self {
        Self::detect_with(Path::new("/"), &SUPPORTED_INITS)
    }

    /// Runs `probes` against `root`. A probe that fails is logged and skipped.
    pub fn detect_with(root: &Path, probes: &[InitProbe]) -> Self {
        let mut inits = Vec::new();
        for probe in probes {
            match (probe.detect)(root) {
                Ok(Some(init)) => {
                    tracing::info!(init = probe.name, "Detected init system");
                    inits.push(init);
                }
                Ok(None) => tracing::debug!(init = probe.name, "Init system not present"),
                Err(e) => tracing::warn!(init = probe.name, error = %e, "Couldn't detect init system"),
            }
        }
        Self { inits }
    }

    pub fn from_systems(inits: Vec<Arc<dyn InitSystem>>) -> Self {
        Self { inits }
    }

    pub fn systems(&self) -> &[Arc<dyn InitSystem>] {
        &self.inits
    }

    pub fn is_empty(&self) -> bool {
        self.inits.is_empty()
    }

    /// Asks each backend in order and returns the first that manages
    /// `service`, together with its answer.
    pub async fn resolve(&self, service: &str) -> Option<(Arc<dyn InitSystem>, Lookup)> {
        for init in &self.inits {
            match init.lookup_service(service).await {
                Ok(Some(lookup)) => return Some((init.clone(), lookup)),
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    init = init.name(),
                    service,
                    error = %e,
                    "Service lookup failed"
                ),
            }
        }
        None
    }
}
