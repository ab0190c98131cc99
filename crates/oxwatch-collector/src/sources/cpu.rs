use crate::{retain_watched, MetricSource, SourceError};
use async_trait::async_trait;
use oxwatch_common::types::{Descriptor, MetricMap};
use std::collections::{BTreeSet, HashMap};
use sysinfo::System;

pub const NAME: &str = "cpu";

/// The family scalar is global usage in percent.
pub static METRICS: [Descriptor; 1] = [Descriptor::gauge("")];

pub struct CpuSource {
    system: System,
    watched: BTreeSet<String>,
    prepared: bool,
}

impl CpuSource {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            watched: BTreeSet::new(),
            prepared: false,
        }
    }
}

impl Default for CpuSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricSource for CpuSource {
    fn name(&self) -> &str {
        NAME
    }

    fn valid_metrics(&self) -> &'static [Descriptor] {
        &METRICS
    }

    fn watch(&mut self, metric: &str) {
        self.watched.insert(metric.to_string());
    }

    async fn prepare(&mut self) -> Result<(), SourceError> {
        // usage is computed between two refreshes
        if !self.prepared {
            self.system.refresh_cpu_all();
            self.prepared = true;
        }
        Ok(())
    }

    async fn capture(&mut self) -> Result<MetricMap, SourceError> {
        self.system.refresh_cpu_all();
        let mut all = MetricMap::new();
        all.insert(String::new(), self.system.global_cpu_usage() as f64);
        Ok(retain_watched(NAME, &self.watched, all))
    }
}

pub fn build(_options: &HashMap<String, String>) -> Result<Box<dyn MetricSource>, SourceError> {
    Ok(Box::new(CpuSource::new()))
}
