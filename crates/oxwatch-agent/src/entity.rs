//! The things being monitored: named services and the host itself.

use oxwatch_alert::rule::Rule;
use oxwatch_alert::EntityKind;
use oxwatch_collector::{MetricSource, SourceError};
use oxwatch_common::history::{CycleBatch, History};
use oxwatch_common::types::{ProcessId, ServiceStatus};
use oxwatch_init::registry::InitRegistry;
use oxwatch_init::InitSystem;
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};

/// One entity's sampling result for a cycle.
#[derive(Debug, Default)]
pub struct Sample {
    pub batch: CycleBatch,
    /// Lookups and captures abandoned at the cycle deadline.
    pub overran: usize,
}

/// Metric sources attached to one entity.
pub struct Sources {
    sources: Vec<Box<dyn MetricSource>>,
}

impl Sources {
    /// Attaches `sources` and registers every rule's metric with the source
    /// whose name matches the rule's family.
    pub fn attach(entity: &str, mut sources: Vec<Box<dyn MetricSource>>, rules: &[Rule]) -> Self {
        for rule in rules {
            match sources.iter_mut().find(|s| s.name() == rule.family) {
                Some(source) => source.watch(&rule.name),
                None => tracing::warn!(
                    entity,
                    metric = %rule.metric(),
                    "No source provides this metric family"
                ),
            }
        }
        Self { sources }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub async fn prepare(&mut self) -> Result<(), SourceError> {
        for source in &mut self.sources {
            source.prepare().await?;
        }
        Ok(())
    }

    /// Captures every source concurrently. A source that fails or misses
    /// `deadline` is logged and contributes nothing to the batch.
    pub async fn capture(&mut self, entity: &str, deadline: Instant) -> Sample {
        let results = futures::future::join_all(self.sources.iter_mut().map(|source| async move {
            let result = timeout_at(deadline, source.capture()).await;
            (source.name().to_string(), result)
        }))
        .await;

        let mut sample = Sample::default();
        for (family, result) in results {
            match result {
                Ok(Ok(values)) => sample.batch.record_all(&family, &values),
                Ok(Err(e)) => tracing::warn!(entity, source = %family, error = %e, "Capture failed"),
                Err(_) => {
                    tracing::warn!(entity, source = %family, "Capture did not finish within one cycle");
                    sample.overran += 1;
                }
            }
        }
        sample
    }
}

pub struct Host {
    pub name: String,
    pub rules: Vec<Rule>,
    pub history: History,
    pub sources: Sources,
}

impl Host {
    pub fn new(
        name: impl Into<String>,
        rules: Vec<Rule>,
        sources: Vec<Box<dyn MetricSource>>,
        slots: usize,
    ) -> Self {
        let name = name.into();
        let sources = Sources::attach(&name, sources, &rules);
        Self {
            name,
            rules,
            history: History::new(slots),
            sources,
        }
    }
}

pub struct Service {
    pub name: String,
    /// `None` until an init system claims the service.
    pub pid: Option<ProcessId>,
    pub status: ServiceStatus,
    pub rules: Vec<Rule>,
    pub history: History,
    pub sources: Sources,
    /// Init system that claimed this service, cached for the process lifetime.
    manager: Option<Arc<dyn InitSystem>>,
}

impl Service {
    pub fn new(
        name: impl Into<String>,
        rules: Vec<Rule>,
        sources: Vec<Box<dyn MetricSource>>,
        slots: usize,
    ) -> Self {
        let name = name.into();
        let sources = Sources::attach(&name, sources, &rules);
        Self {
            name,
            pid: None,
            status: ServiceStatus::Unknown,
            rules,
            history: History::new(slots),
            sources,
            manager: None,
        }
    }

    pub fn manager(&self) -> Option<&str> {
        self.manager.as_ref().map(|m| m.name())
    }

    /// Refreshes pid and status, through the cached manager if one
    /// claimed the service before, otherwise by asking every init system.
    pub async fn resolve(&mut self, inits: &InitRegistry) {
        let lookup = match &self.manager {
            Some(manager) => match manager.lookup_service(&self.name).await {
                Ok(lookup) => lookup,
                Err(e) => {
                    tracing::warn!(
                        service = %self.name,
                        init = manager.name(),
                        error = %e,
                        "Service lookup failed"
                    );
                    None
                }
            },
            None => match inits.resolve(&self.name).await {
                Some((manager, lookup)) => {
                    tracing::info!(service = %self.name, init = manager.name(), "Service managed by init system");
                    self.manager = Some(manager);
                    Some(lookup)
                }
                None => None,
            },
        };

        match lookup {
            Some(lookup) => {
                if self.status != lookup.status {
                    tracing::info!(
                        service = %self.name,
                        pid = %lookup.pid,
                        from = %self.status,
                        to = %lookup.status,
                        "Service status changed"
                    );
                }
                self.pid = Some(lookup.pid);
                self.status = lookup.status;
            }
            None => {
                self.pid = None;
                self.status = ServiceStatus::Unknown;
            }
        }
    }
}

pub enum Entity {
    Host(Host),
    Service(Service),
}

impl Entity {
    pub fn name(&self) -> &str {
        match self {
            Entity::Host(h) => &h.name,
            Entity::Service(s) => &s.name,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Host(_) => EntityKind::Host,
            Entity::Service(_) => EntityKind::Service,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        match self {
            Entity::Host(h) => &h.rules,
            Entity::Service(s) => &s.rules,
        }
    }

    pub fn history(&self) -> &History {
        match self {
            Entity::Host(h) => &h.history,
            Entity::Service(s) => &s.history,
        }
    }

    pub fn as_service(&self) -> Option<&Service> {
        match self {
            Entity::Service(s) => Some(s),
            Entity::Host(_) => None,
        }
    }

    pub async fn prepare(&mut self) -> Result<(), SourceError> {
        match self {
            Entity::Host(h) => h.sources.prepare().await,
            Entity::Service(s) => s.sources.prepare().await,
        }
    }

    /// Resolves process identity (services only) and captures all sources,
    /// abandoning whatever has not finished by `deadline`. Nothing is visible
    /// to readers until the batch is committed.
    pub async fn sample(&mut self, inits: &InitRegistry, deadline: Instant) -> Sample {
        match self {
            Entity::Host(h) => h.sources.capture(&h.name, deadline).await,
            Entity::Service(s) => {
                let resolved = timeout_at(deadline, s.resolve(inits)).await.is_ok();
                if !resolved {
                    tracing::warn!(service = %s.name, "Service lookup did not finish within one cycle");
                }
                let mut sample = s.sources.capture(&s.name, deadline).await;
                sample.overran += usize::from(!resolved);
                sample
            }
        }
    }

    /// Split borrow of the parts rule evaluation needs.
    pub(crate) fn evaluation_parts(&mut self) -> (&str, &mut Vec<Rule>, &mut History) {
        match self {
            Entity::Host(h) => (h.name.as_str(), &mut h.rules, &mut h.history),
            Entity::Service(s) => (s.name.as_str(), &mut s.rules, &mut s.history),
        }
    }
}

impl From<Host> for Entity {
    fn from(host: Host) -> Self {
        Entity::Host(host)
    }
}

impl From<Service> for Entity {
    fn from(service: Service) -> Self {
        Entity::Service(service)
    }
}
