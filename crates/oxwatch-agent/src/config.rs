use crate::entity::{Entity, Host, Service};
use crate::scheduler::Scheduler;
use anyhow::{Context, Result};
use oxwatch_alert::rule::{Operator, Rule};
use oxwatch_collector::registry::SourceRegistry;
use oxwatch_collector::MetricSource;
use oxwatch_common::{slots_for, CYCLE_TIME};
use oxwatch_init::registry::InitRegistry;
use oxwatch_notify::manager::Dispatcher;
use oxwatch_notify::plugin::ActionRegistry;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_cycle_secs")]
    pub cycle_secs: u64,
    /// Name reported for host alerts; defaults to the system host name.
    pub host_name: Option<String>,
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
    pub host: Option<HostConfig>,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ActionConfig {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub options: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    pub kind: String,
    #[serde(default)]
    pub options: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct RuleConfig {
    pub family: String,
    #[serde(default)]
    pub name: String,
    pub op: String,
    pub threshold: i64,
    #[serde(default = "default_cycles")]
    pub cycles: u8,
    #[serde(default)]
    pub actions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

fn default_cycle_secs() -> u64 {
    CYCLE_TIME
}

fn default_cycles() -> u8 {
    1
}

impl RuleConfig {
    pub fn build(&self) -> Result<Rule> {
        let op: Operator = self.op.parse()?;
        let rule = Rule::new(&self.family, &self.name, op, self.threshold, self.cycles)?;
        Ok(rule.with_actions(self.actions.clone()))
    }
}

fn build_rules(rules: &[RuleConfig]) -> Result<Vec<Rule>> {
    rules.iter().map(RuleConfig::build).collect()
}

/// Rules bind to a source by kind, so each kind may appear once per entity.
fn build_sources(sources: &[SourceConfig], registry: &SourceRegistry) -> Result<Vec<Box<dyn MetricSource>>> {
    let mut kinds = HashSet::new();
    for source in sources {
        anyhow::ensure!(
            kinds.insert(source.kind.as_str()),
            "source '{}' configured more than once",
            source.kind
        );
    }
    sources
        .iter()
        .map(|s| {
            registry
                .build(&s.kind, &s.options)
                .with_context(|| format!("source '{}'", s.kind))
        })
        .collect()
}

impl AgentConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
        Self::parse(&content).with_context(|| format!("parsing {path}"))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        anyhow::ensure!(config.cycle_secs > 0, "cycle_secs must be positive");
        Ok(config)
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.cycle_secs)
    }

    pub fn host_name(&self) -> String {
        self.host_name
            .clone()
            .or_else(sysinfo::System::host_name)
            .unwrap_or_else(|| "localhost".to_string())
    }

    /// Builds every configured entity. An entity with a configuration error
    /// is logged and left out.
    pub fn build_entities(&self, registry: &SourceRegistry) -> Vec<Entity> {
        let slots = slots_for(self.cycle_secs);
        let mut entities = Vec::new();

        if let Some(host) = &self.host {
            let name = self.host_name();
            let built = build_rules(&host.rules).and_then(|rules| {
                Ok(Host::new(name.clone(), rules, build_sources(&host.sources, registry)?, slots))
            });
            match built {
                Ok(host) => entities.push(host.into()),
                Err(e) => tracing::error!(host = %name, error = %format!("{e:#}"), "Invalid host configuration"),
            }
        }

        for service in &self.services {
            let built = build_rules(&service.rules).and_then(|rules| {
                Ok(Service::new(
                    service.name.clone(),
                    rules,
                    build_sources(&service.sources, registry)?,
                    slots,
                ))
            });
            match built {
                Ok(svc) => entities.push(svc.into()),
                Err(e) => tracing::error!(
                    service = %service.name,
                    error = %format!("{e:#}"),
                    "Invalid service configuration"
                ),
            }
        }

        entities
    }

    pub fn build_dispatcher(&self, registry: &ActionRegistry) -> Dispatcher {
        let mut dispatcher = Dispatcher::new();
        for action in &self.actions {
            dispatcher.configure(registry, &action.name, &action.kind, &action.options);
        }
        dispatcher
    }

    pub fn build_scheduler(
        &self,
        sources: &SourceRegistry,
        actions: &ActionRegistry,
        inits: InitRegistry,
    ) -> Scheduler {
        let mut scheduler = Scheduler::new(self.period(), inits, self.build_dispatcher(actions));
        for entity in self.build_entities(sources) {
            scheduler.add(entity);
        }
        scheduler
    }
}
