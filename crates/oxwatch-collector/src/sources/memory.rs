use crate::{retain_watched, MetricSource, SourceError};
use async_trait::async_trait;
use oxwatch_common::types::{Descriptor, MetricMap};
use std::collections::{BTreeSet, HashMap};
use sysinfo::System;

pub const NAME: &str = "memory";

/// Family scalar: used memory in percent. `available` is in bytes,
/// `swap` is used swap in percent.
pub static METRICS: [Descriptor; 3] = [
    Descriptor::gauge(""),
    Descriptor::gauge("available"),
    Descriptor::gauge("swap"),
];

pub struct MemorySource {
    system: System,
    watched: BTreeSet<String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            watched: BTreeSet::new(),
        }
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total > 0 {
        (used as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

#[async_trait]
impl MetricSource for MemorySource {
    fn name(&self) -> &str {
        NAME
    }

    fn valid_metrics(&self) -> &'static [Descriptor] {
        &METRICS
    }

    fn watch(&mut self, metric: &str) {
        self.watched.insert(metric.to_string());
    }

    async fn capture(&mut self) -> Result<MetricMap, SourceError> {
        self.system.refresh_memory();

        let mut all = MetricMap::new();
        all.insert(
            String::new(),
            percent(self.system.used_memory(), self.system.total_memory()),
        );
        all.insert(
            "available".to_string(),
            self.system.available_memory() as f64,
        );
        all.insert(
            "swap".to_string(),
            percent(self.system.used_swap(), self.system.total_swap()),
        );

        Ok(retain_watched(NAME, &self.watched, all))
    }
}

pub fn build(_options: &HashMap<String, String>) -> Result<Box<dyn MetricSource>, SourceError> {
    Ok(Box::new(MemorySource::new()))
}
