use crate::sources::{cpu, load, memory, nginx};
use crate::{MetricSource, SourceError};
use oxwatch_common::types::Descriptor;
use std::collections::HashMap;

/// Builds a configured source from its string-keyed options.
pub type SourceBuilder = fn(&HashMap<String, String>) -> Result<Box<dyn MetricSource>, SourceError>;

struct SourceEntry {
    build: SourceBuilder,
    metrics: &'static [Descriptor],
}

/// Registry of available metric source types, keyed by source name.
///
/// # Examples
///
/// ```
/// use oxwatch_collector::registry::SourceRegistry;
///
/// let registry = SourceRegistry::default();
/// assert!(registry.has_source("nginx"));
/// assert!(registry.has_source("cpu"));
/// assert!(!registry.has_source("redis"));
/// assert_eq!(registry.valid_metrics("nginx").map(|m| m.len()), Some(7));
/// ```
pub struct SourceRegistry {
    sources: HashMap<String, SourceEntry>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: &str, metrics: &'static [Descriptor], build: SourceBuilder) {
        self.sources
            .insert(name.to_string(), SourceEntry { build, metrics });
    }

    /// Builds a source of type `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnknownSource`] for an unregistered type, or the
    /// builder's own configuration error.
    pub fn build(
        &self,
        name: &str,
        options: &HashMap<String, String>,
    ) -> Result<Box<dyn MetricSource>, SourceError> {
        let entry = self
            .sources
            .get(name)
            .ok_or_else(|| SourceError::UnknownSource(name.to_string()))?;
        (entry.build)(options)
    }

    pub fn valid_metrics(&self, name: &str) -> Option<&'static [Descriptor]> {
        self.sources.get(name).map(|e| e.metrics)
    }

    pub fn has_source(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(nginx::NAME, &nginx::METRICS, nginx::build);
        registry.register(cpu::NAME, &cpu::METRICS, cpu::build);
        registry.register(memory::NAME, &memory::METRICS, memory::build);
        registry.register(load::NAME, &load::METRICS, load::build);
        registry
    }
}
