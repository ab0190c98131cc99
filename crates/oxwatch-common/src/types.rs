use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Operating system process id as reported by an init system.
///
/// `ProcessId(0)` means the service is known but was not running during
/// the cycle. A service no backend knows about has no `ProcessId` at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessId(pub i32);

impl ProcessId {
    pub const NOT_RUNNING: ProcessId = ProcessId(0);

    pub fn is_running(self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse run state of a supervised service.
///
/// # Examples
///
/// ```
/// use oxwatch_common::types::ServiceStatus;
///
/// let status: ServiceStatus = "up".parse().unwrap();
/// assert_eq!(status, ServiceStatus::Up);
/// assert_eq!(status.to_string(), "up");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    #[default]
    Unknown,
    Down,
    Starting,
    Up,
    Stopping,
    /// Failed to start; not retried.
    Broken,
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceStatus::Unknown => write!(f, "unknown"),
            ServiceStatus::Down => write!(f, "down"),
            ServiceStatus::Starting => write!(f, "starting"),
            ServiceStatus::Up => write!(f, "up"),
            ServiceStatus::Stopping => write!(f, "stopping"),
            ServiceStatus::Broken => write!(f, "broken"),
        }
    }
}

impl std::str::FromStr for ServiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unknown" => Ok(ServiceStatus::Unknown),
            "down" => Ok(ServiceStatus::Down),
            "starting" => Ok(ServiceStatus::Starting),
            "up" => Ok(ServiceStatus::Up),
            "stopping" => Ok(ServiceStatus::Stopping),
            "broken" => Ok(ServiceStatus::Broken),
            _ => Err(format!("unknown service status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Point-in-time value.
    Gauge,
    /// Monotonically increasing cumulative value.
    Counter,
}

/// A metric a source is able to produce.
///
/// `display` and `transform` are reserved for output formatting and value
/// post-processing; the engine does not read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub name: &'static str,
    pub kind: MetricKind,
    pub display: Option<&'static str>,
    pub transform: Option<&'static str>,
}

impl Descriptor {
    pub const fn gauge(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Gauge,
            display: None,
            transform: None,
        }
    }

    pub const fn counter(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Counter,
            display: None,
            transform: None,
        }
    }
}

/// Metric name to freshest value, as returned by one capture.
pub type MetricMap = HashMap<String, f64>;

/// History key: metric family plus optional name within the family.
///
/// An empty `name` means the family itself is the scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricKey {
    pub family: String,
    pub name: String,
}

impl MetricKey {
    pub fn new(family: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for MetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.family)
        } else {
            write!(f, "{}({})", self.family, self.name)
        }
    }
}
